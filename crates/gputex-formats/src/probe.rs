//! Container format detection
//!
//! Looks only at the minimal magic region of a file, without validating
//! anything past it. Legacy PVR v1 has no magic at all, so its header
//! size doubles as the detection key, the same way the full parser
//! detects it.

use std::io::SeekFrom;

use binrw::io::{Read, Seek};

use crate::astc::ASTC_MAGIC;
use crate::error::TextureResult;
use crate::ktx::KTX_IDENTIFIER;
use crate::ktx2::KTX2_IDENTIFIER;
use crate::pvr3::{PVR_LEGACY_MAGIC, PVR3_VERSION};

/// Container formats recognized by [`probe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    /// Khronos KTX v1
    Ktx,
    /// Khronos KTX2
    Ktx2,
    /// Godot 3 STEX
    Stex3,
    /// Godot 4 compressed texture
    Stex4,
    /// PowerVR 3.0.0 or legacy PVR
    Pvr,
    /// Standalone ASTC
    Astc,
    /// Xbox XPR (XPR0 texture or XPR1/XPR2 archive)
    Xpr,
}

/// Detect the container format from the magic region.
///
/// Returns `Ok(None)` when no known magic matches. A `Some` result only
/// means the magic matched; the corresponding parser may still reject
/// the file.
pub fn probe<R: Read + Seek>(reader: &mut R) -> TextureResult<Option<ContainerFormat>> {
    reader.seek(SeekFrom::Start(0))?;
    let mut magic = [0u8; 12];
    let mut filled = 0usize;
    while filled < magic.len() {
        let n = reader.read(&mut magic[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    if filled < 4 {
        return Ok(None);
    }

    if filled >= 12 {
        if magic == KTX_IDENTIFIER {
            return Ok(Some(ContainerFormat::Ktx));
        }
        if magic == KTX2_IDENTIFIER {
            return Ok(Some(ContainerFormat::Ktx2));
        }
    }

    let first: [u8; 4] = [magic[0], magic[1], magic[2], magic[3]];
    let word = u32::from_le_bytes(first);
    match &first {
        b"GDST" => return Ok(Some(ContainerFormat::Stex3)),
        b"GST2" => return Ok(Some(ContainerFormat::Stex4)),
        b"XPR0" | b"XPR1" | b"XPR2" => return Ok(Some(ContainerFormat::Xpr)),
        _ if first == ASTC_MAGIC => return Ok(Some(ContainerFormat::Astc)),
        _ if word == PVR3_VERSION || word == PVR3_VERSION.swap_bytes() => {
            return Ok(Some(ContainerFormat::Pvr));
        }
        _ => {}
    }

    // Legacy PVR: the first field is the header size. v2 carries a magic
    // at 0x2C; v1 has none, so the size is all there is to go on.
    match word {
        0x2C => return Ok(Some(ContainerFormat::Pvr)),
        0x34 => {
            reader.seek(SeekFrom::Start(0x2C))?;
            let mut legacy = [0u8; 4];
            if reader.read_exact(&mut legacy).is_ok() && legacy == PVR_LEGACY_MAGIC {
                return Ok(Some(ContainerFormat::Pvr));
            }
        }
        _ => {}
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn probe_bytes(buf: &[u8]) -> Option<ContainerFormat> {
        probe(&mut Cursor::new(buf)).unwrap()
    }

    #[test]
    fn detects_each_container_magic() {
        assert_eq!(probe_bytes(&KTX_IDENTIFIER), Some(ContainerFormat::Ktx));
        assert_eq!(probe_bytes(&KTX2_IDENTIFIER), Some(ContainerFormat::Ktx2));
        assert_eq!(probe_bytes(b"GDST\0\0\0\0"), Some(ContainerFormat::Stex3));
        assert_eq!(probe_bytes(b"GST2\0\0\0\0"), Some(ContainerFormat::Stex4));
        assert_eq!(probe_bytes(b"XPR0\0\0\0\0"), Some(ContainerFormat::Xpr));
        assert_eq!(probe_bytes(b"XPR2\0\0\0\0"), Some(ContainerFormat::Xpr));
        assert_eq!(probe_bytes(&ASTC_MAGIC), Some(ContainerFormat::Astc));
        assert_eq!(probe_bytes(b"PVR\x03\0\0\0\0"), Some(ContainerFormat::Pvr));
        assert_eq!(probe_bytes(b"\x03RVP\0\0\0\0"), Some(ContainerFormat::Pvr));
    }

    #[test]
    fn detects_legacy_pvr_by_header_size() {
        let mut v2 = vec![0u8; 0x34];
        v2[0] = 0x34;
        v2[0x2C..0x30].copy_from_slice(&PVR_LEGACY_MAGIC);
        assert_eq!(probe_bytes(&v2), Some(ContainerFormat::Pvr));

        // Same size byte without the magic is not a PVR.
        let mut not_pvr = vec![0u8; 0x34];
        not_pvr[0] = 0x34;
        assert_eq!(probe_bytes(&not_pvr), None);

        let mut v1 = vec![0u8; 0x2C];
        v1[0] = 0x2C;
        assert_eq!(probe_bytes(&v1), Some(ContainerFormat::Pvr));
    }

    #[test]
    fn short_or_unknown_input_matches_nothing() {
        assert_eq!(probe_bytes(b"GD"), None);
        assert_eq!(probe_bytes(b"not a texture at all"), None);
        assert_eq!(probe_bytes(&[0u8; 64]), None);
    }
}
