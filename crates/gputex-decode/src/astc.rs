//! ASTC block decoding (LDR profile, 2D footprints)
//!
//! Every ASTC block is 128 bits regardless of footprint. The header fields
//! (block mode, partition data, color endpoint modes) grow from bit 0 while
//! the weight data grows downward from bit 127 in reversed bit order, with
//! the color endpoint data filling the space between.
//!
//! HDR endpoint modes and reserved encodings decode to the error color
//! (opaque magenta) instead of failing the image, matching the behavior
//! required of LDR-profile decoders.

use crate::error::{DecodeError, DecodeResult};
use crate::image::DecodedImage;
use crate::size::{calc_image_size_astc, is_valid_astc_block};

/// Error color emitted for out-of-profile or malformed blocks.
const ERROR_COLOR: u32 = 0xFFFF_00FF;

/// Quantization range descriptor for an integer sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Quant {
    levels: u32,
    trits: bool,
    quints: bool,
    bits: u32,
}

const fn q(levels: u32, trits: bool, quints: bool, bits: u32) -> Quant {
    Quant {
        levels,
        trits,
        quints,
        bits,
    }
}

/// Weight ranges in block-mode order (index = R - 2 + 6 * H).
const WEIGHT_QUANT: [Quant; 12] = [
    q(2, false, false, 1),
    q(3, true, false, 0),
    q(4, false, false, 2),
    q(5, false, true, 0),
    q(6, true, false, 1),
    q(8, false, false, 3),
    q(10, false, true, 1),
    q(12, true, false, 2),
    q(16, false, false, 4),
    q(20, false, true, 2),
    q(24, true, false, 3),
    q(32, false, false, 5),
];

/// Color endpoint ranges, largest first; the decoder picks the largest
/// range whose sequence fits the bits left over for color data.
const COLOR_QUANT: [Quant; 17] = [
    q(256, false, false, 8),
    q(192, true, false, 6),
    q(160, false, true, 5),
    q(128, false, false, 7),
    q(96, true, false, 5),
    q(80, false, true, 4),
    q(64, false, false, 6),
    q(48, true, false, 4),
    q(40, false, true, 3),
    q(32, false, false, 5),
    q(24, true, false, 3),
    q(20, false, true, 2),
    q(16, false, false, 4),
    q(12, true, false, 2),
    q(10, false, true, 1),
    q(8, false, false, 3),
    q(6, true, false, 1),
];

/// Bits consumed by an integer sequence of `count` values.
const fn ise_bit_count(quant: Quant, count: u32) -> u32 {
    let mut bits = quant.bits * count;
    if quant.trits {
        bits += (8 * count + 4) / 5;
    }
    if quant.quints {
        bits += (7 * count + 2) / 3;
    }
    bits
}

/// Replicate `num` bits of `val` up to `to` bits.
fn replicate(val: u32, num: u32, to: u32) -> u32 {
    if num >= to {
        return val >> (num - to);
    }
    let mut res = 0;
    let mut shift = to as i32 - num as i32;
    while shift > -(num as i32) {
        if shift >= 0 {
            res |= val << shift;
        } else {
            res |= val >> -shift;
        }
        shift -= num as i32;
    }
    res
}

/// Bounded LSB-first bit reader over a 128-bit block region.
///
/// Reads past `end` return zero bits, which matches the truncated final
/// groups of an integer sequence.
struct BitReader {
    data: u128,
    pos: u32,
    end: u32,
}

impl BitReader {
    fn new(data: u128, start: u32, end: u32) -> Self {
        Self {
            data,
            pos: start,
            end,
        }
    }

    fn read(&mut self, count: u32) -> u32 {
        if count == 0 {
            return 0;
        }
        let avail = self.end.saturating_sub(self.pos).min(count);
        let v = if avail == 0 || self.pos >= 128 {
            0
        } else {
            ((self.data >> self.pos) as u32) & ((1u32 << avail) - 1)
        };
        self.pos += count;
        v
    }
}

/// Decode eight packed trit-selector bits into five trit values.
fn decode_trits(t: u32) -> [u32; 5] {
    let c;
    let (t4, t3);
    if (t >> 2) & 0x07 == 0x07 {
        c = (((t >> 5) & 0x07) << 2) | (t & 0x03);
        t4 = 2;
        t3 = 2;
    } else {
        c = t & 0x1F;
        if (t >> 5) & 0x03 == 0x03 {
            t4 = 2;
            t3 = (t >> 7) & 1;
        } else {
            t4 = (t >> 7) & 1;
            t3 = (t >> 5) & 0x03;
        }
    }
    let (t2, t1, t0);
    if c & 0x03 == 0x03 {
        t2 = 2;
        t1 = (c >> 4) & 1;
        t0 = (((c >> 3) & 1) << 1) | ((c >> 2) & 1 & !((c >> 3) & 1));
    } else if (c >> 2) & 0x03 == 0x03 {
        t2 = (c >> 4) & 1;
        t1 = 2;
        t0 = c & 0x03;
    } else {
        t2 = (c >> 4) & 1;
        t1 = (c >> 2) & 0x03;
        t0 = (((c >> 1) & 1) << 1) | (c & 1 & !((c >> 1) & 1));
    }
    [t0, t1, t2, t3, t4]
}

/// Decode seven packed quint-selector bits into three quint values.
fn decode_quints(qv: u32) -> [u32; 3] {
    if (qv >> 1) & 0x03 == 0x03 && (qv >> 5) & 0x03 == 0 {
        let q2 = ((qv & 1) << 2)
            | ((((qv >> 4) & 1) & !(qv & 1)) << 1)
            | (((qv >> 3) & 1) & !(qv & 1));
        [4, 4, q2]
    } else {
        let (q2, c);
        if (qv >> 1) & 0x03 == 0x03 {
            q2 = 4;
            c = (((qv >> 3) & 0x03) << 3) | ((!(qv >> 5) & 0x03) << 1) | (qv & 1);
        } else {
            q2 = (qv >> 5) & 0x03;
            c = qv & 0x1F;
        }
        let (q1, q0);
        if c & 0x07 == 0x05 {
            q1 = 4;
            q0 = (c >> 3) & 0x03;
        } else {
            q1 = (c >> 3) & 0x03;
            q0 = c & 0x07;
        }
        [q0, q1, q2]
    }
}

/// Decode an integer sequence: per value, the raw bit field plus the
/// trit/quint digit (zero when the range has none).
fn ise_decode(reader: &mut BitReader, quant: Quant, count: usize) -> Vec<(u32, u32)> {
    let mut out = Vec::with_capacity(count);
    let n = quant.bits;
    if quant.trits {
        let mut i = 0;
        while i < count {
            let mut m = [0u32; 5];
            let mut t = 0u32;
            m[0] = reader.read(n);
            t |= reader.read(2);
            m[1] = reader.read(n);
            t |= reader.read(2) << 2;
            m[2] = reader.read(n);
            t |= reader.read(1) << 4;
            m[3] = reader.read(n);
            t |= reader.read(2) << 5;
            m[4] = reader.read(n);
            t |= reader.read(1) << 7;
            let trits = decode_trits(t);
            for j in 0..5.min(count - i) {
                out.push((m[j], trits[j]));
            }
            i += 5;
        }
    } else if quant.quints {
        let mut i = 0;
        while i < count {
            let mut m = [0u32; 3];
            let mut qv = 0u32;
            m[0] = reader.read(n);
            qv |= reader.read(3);
            m[1] = reader.read(n);
            qv |= reader.read(2) << 3;
            m[2] = reader.read(n);
            qv |= reader.read(2) << 5;
            let quints = decode_quints(qv);
            for j in 0..3.min(count - i) {
                out.push((m[j], quints[j]));
            }
            i += 3;
        }
    } else {
        for _ in 0..count {
            out.push((reader.read(n), 0));
        }
    }
    out
}

/// Unquantize a weight value to the 0..=64 range.
fn unquant_weight(quant: Quant, m: u32, d: u32) -> u32 {
    let v = if quant.trits || quant.quints {
        match quant.levels {
            // Already exact multiples of the full range; the midpoint
            // adjustment below must not touch them.
            3 => return d * 32,
            5 => return d * 16,
            _ => {
                let a = if m & 1 != 0 { 0x7F } else { 0 };
                let (c, b) = match quant.levels {
                    6 => (50, 0),
                    10 => (28, 0),
                    12 => (23, ((m >> 1) & 1) * 70),
                    20 => (13, ((m >> 1) & 1) * 67),
                    _ => (11, ((m >> 1) & 1) * 33 + ((m >> 2) & 1) * 67),
                };
                let t = (d * c + b) ^ a;
                (a & 0x20) | (t >> 2)
            }
        }
    } else {
        replicate(m, quant.bits, 6)
    };
    if v > 32 { v + 1 } else { v }
}

/// Unquantize a color endpoint value to the 0..=255 range.
fn unquant_color(quant: Quant, m: u32, d: u32) -> u32 {
    if !quant.trits && !quant.quints {
        return replicate(m, quant.bits, 8);
    }
    let a = if m & 1 != 0 { 0x1FF } else { 0 };
    let extras = m >> 1;
    let (c, b_tbl): (u32, &[u32]) = match quant.levels {
        6 => (204, &[]),
        10 => (113, &[]),
        12 => (93, &[278]),
        20 => (54, &[268]),
        24 => (44, &[133, 266]),
        40 => (26, &[131, 262]),
        48 => (22, &[65, 130, 261]),
        80 => (13, &[65, 129, 258]),
        96 => (11, &[32, 64, 129, 258]),
        160 => (6, &[32, 64, 128, 257]),
        _ => (5, &[16, 32, 64, 128, 255]),
    };
    let mut b = 0;
    for (i, mult) in b_tbl.iter().enumerate() {
        b += ((extras >> i) & 1) * mult;
    }
    let t = (d * c + b) ^ a;
    (a & 0x80) | (t >> 2)
}

/// Decoded block mode: weight grid size, dual-plane flag, weight range.
struct BlockModeInfo {
    grid_w: u32,
    grid_h: u32,
    dual_plane: bool,
    quant: Quant,
}

fn decode_block_mode(mode: u32) -> Option<BlockModeInfo> {
    let mut base_quant = (mode >> 4) & 1;
    let mut h = (mode >> 9) & 1;
    let mut dual = (mode >> 10) & 1 != 0;
    let a = (mode >> 5) & 0x03;
    let (w, hgt);
    if mode & 0x03 != 0 {
        base_quant |= (mode & 0x03) << 1;
        let b = (mode >> 7) & 0x03;
        match (mode >> 2) & 0x03 {
            0 => {
                w = b + 4;
                hgt = a + 2;
            }
            1 => {
                w = b + 8;
                hgt = a + 2;
            }
            2 => {
                w = a + 2;
                hgt = b + 8;
            }
            _ => {
                let b = b & 1;
                if mode & 0x100 != 0 {
                    w = b + 2;
                    hgt = a + 2;
                } else {
                    w = a + 2;
                    hgt = b + 6;
                }
            }
        }
    } else {
        base_quant |= ((mode >> 2) & 0x03) << 1;
        if (mode >> 2) & 0x03 == 0 {
            return None;
        }
        let b = (mode >> 9) & 0x03;
        match (mode >> 7) & 0x03 {
            0 => {
                w = 12;
                hgt = a + 2;
            }
            1 => {
                w = a + 2;
                hgt = 12;
            }
            2 => {
                w = a + 6;
                hgt = b + 6;
                dual = false;
                h = 0;
            }
            _ => match (mode >> 5) & 0x03 {
                0 => {
                    w = 6;
                    hgt = 10;
                }
                1 => {
                    w = 10;
                    hgt = 6;
                }
                _ => return None,
            },
        }
    }
    if base_quant < 2 {
        return None;
    }
    Some(BlockModeInfo {
        grid_w: w,
        grid_h: hgt,
        dual_plane: dual,
        quant: WEIGHT_QUANT[(base_quant - 2 + 6 * h) as usize],
    })
}

fn hash52(mut p: u32) -> u32 {
    p ^= p >> 15;
    p = p.wrapping_sub(p << 17);
    p = p.wrapping_add(p << 7);
    p = p.wrapping_add(p << 4);
    p ^= p >> 5;
    p = p.wrapping_add(p << 16);
    p ^= p >> 7;
    p ^= p >> 3;
    p ^= p << 6;
    p ^= p >> 17;
    p
}

/// Partition selection hash from the ASTC specification.
fn select_partition(seed: u32, x: u32, y: u32, partition_count: u32, small_block: bool) -> usize {
    let (mut x, mut y) = (x, y);
    if small_block {
        x <<= 1;
        y <<= 1;
    }
    let seed = seed + (partition_count - 1) * 1024;
    let rnum = hash52(seed);
    let mut s = [0u32; 12];
    for (i, v) in s.iter_mut().enumerate() {
        let n = (rnum >> (4 * i)) & 0x0F;
        *v = n * n;
    }
    let (sh1, sh2) = if seed & 1 != 0 {
        (
            if seed & 2 != 0 { 4 } else { 5 },
            if partition_count == 3 { 6 } else { 5 },
        )
    } else {
        (
            if partition_count == 3 { 6 } else { 5 },
            if seed & 2 != 0 { 4 } else { 5 },
        )
    };
    for (i, v) in s.iter_mut().enumerate() {
        // Odd-indexed seeds use sh2; seeds 9-12 swap the pattern.
        let sh = match i {
            0 | 2 | 4 | 6 | 9 | 11 => sh1,
            _ => sh2,
        };
        *v >>= sh;
    }
    let a = (s[0] * x + s[1] * y + (rnum >> 14)) & 0x3F;
    let mut b = (s[2] * x + s[3] * y + (rnum >> 10)) & 0x3F;
    let mut c = (s[4] * x + s[5] * y + (rnum >> 6)) & 0x3F;
    let mut d = (s[6] * x + s[7] * y + (rnum >> 2)) & 0x3F;
    if partition_count <= 3 {
        d = 0;
    }
    if partition_count <= 2 {
        c = 0;
    }
    if partition_count <= 1 {
        b = 0;
    }
    if a >= b && a >= c && a >= d {
        0
    } else if b >= c && b >= d {
        1
    } else if c >= d {
        2
    } else {
        3
    }
}

fn clamp255(v: i32) -> i32 {
    v.clamp(0, 255)
}

fn blue_contract(r: i32, g: i32, b: i32, a: i32) -> [i32; 4] {
    [(r + b) >> 1, (g + b) >> 1, b, a]
}

fn bit_transfer_signed(a: i32, b: i32) -> (i32, i32) {
    let b = (b >> 1) | (a & 0x80);
    let mut a = (a >> 1) & 0x3F;
    if a & 0x20 != 0 {
        a -= 0x40;
    }
    (a, b)
}

/// Decode one partition's endpoints from unquantized color values.
/// Returns `None` for HDR endpoint modes, which are out of profile here.
fn decode_endpoints(cem: u32, v: &[i32]) -> Option<([i32; 4], [i32; 4])> {
    match cem {
        0 => Some(([v[0], v[0], v[0], 255], [v[1], v[1], v[1], 255])),
        1 => {
            let l0 = (v[0] >> 2) | (v[1] & 0xC0);
            let l1 = (l0 + (v[1] & 0x3F)).min(255);
            Some(([l0, l0, l0, 255], [l1, l1, l1, 255]))
        }
        4 => Some(([v[0], v[0], v[0], v[2]], [v[1], v[1], v[1], v[3]])),
        5 => {
            let (d0, l0) = bit_transfer_signed(v[1], v[0]);
            let (d1, a0) = bit_transfer_signed(v[3], v[2]);
            let e0 = [l0, l0, l0, a0];
            let e1 = [
                clamp255(l0 + d0),
                clamp255(l0 + d0),
                clamp255(l0 + d0),
                clamp255(a0 + d1),
            ];
            Some((e0, e1))
        }
        6 => Some((
            [
                (v[0] * v[3]) >> 8,
                (v[1] * v[3]) >> 8,
                (v[2] * v[3]) >> 8,
                255,
            ],
            [v[0], v[1], v[2], 255],
        )),
        8 => {
            if v[0] + v[2] + v[4] <= v[1] + v[3] + v[5] {
                Some(([v[0], v[2], v[4], 255], [v[1], v[3], v[5], 255]))
            } else {
                Some((
                    blue_contract(v[1], v[3], v[5], 255),
                    blue_contract(v[0], v[2], v[4], 255),
                ))
            }
        }
        9 => {
            let (dr, r) = bit_transfer_signed(v[1], v[0]);
            let (dg, g) = bit_transfer_signed(v[3], v[2]);
            let (db, b) = bit_transfer_signed(v[5], v[4]);
            if dr + dg + db >= 0 {
                Some((
                    [r, g, b, 255],
                    [clamp255(r + dr), clamp255(g + dg), clamp255(b + db), 255],
                ))
            } else {
                Some((
                    blue_contract(clamp255(r + dr), clamp255(g + dg), clamp255(b + db), 255),
                    blue_contract(r, g, b, 255),
                ))
            }
        }
        10 => Some((
            [
                (v[0] * v[3]) >> 8,
                (v[1] * v[3]) >> 8,
                (v[2] * v[3]) >> 8,
                v[4],
            ],
            [v[0], v[1], v[2], v[5]],
        )),
        12 => {
            if v[0] + v[2] + v[4] <= v[1] + v[3] + v[5] {
                Some(([v[0], v[2], v[4], v[6]], [v[1], v[3], v[5], v[7]]))
            } else {
                Some((
                    blue_contract(v[1], v[3], v[5], v[7]),
                    blue_contract(v[0], v[2], v[4], v[6]),
                ))
            }
        }
        13 => {
            let (dr, r) = bit_transfer_signed(v[1], v[0]);
            let (dg, g) = bit_transfer_signed(v[3], v[2]);
            let (db, b) = bit_transfer_signed(v[5], v[4]);
            let (da, a) = bit_transfer_signed(v[7], v[6]);
            if dr + dg + db >= 0 {
                Some((
                    [r, g, b, a],
                    [
                        clamp255(r + dr),
                        clamp255(g + dg),
                        clamp255(b + db),
                        clamp255(a + da),
                    ],
                ))
            } else {
                Some((
                    blue_contract(clamp255(r + dr), clamp255(g + dg), clamp255(b + db), clamp255(a + da)),
                    blue_contract(r, g, b, a),
                ))
            }
        }
        _ => None, // HDR endpoint modes (2, 3, 7, 11, 14, 15)
    }
}

/// Decode a void-extent block: a single color for the whole footprint.
fn decode_void_extent(block: u128, tile: &mut [u32]) {
    if block & 0x200 != 0 {
        // HDR void extent is out of profile.
        tile.fill(ERROR_COLOR);
        return;
    }
    // Four UNORM16 channels at bits 64..128; keep the high bytes.
    let r = ((block >> (64 + 8)) & 0xFF) as u32;
    let g = ((block >> (80 + 8)) & 0xFF) as u32;
    let b = ((block >> (96 + 8)) & 0xFF) as u32;
    let a = ((block >> (112 + 8)) & 0xFF) as u32;
    tile.fill((a << 24) | (r << 16) | (g << 8) | b);
}

fn decode_block(bytes: &[u8], block_w: u32, block_h: u32, tile: &mut [u32]) {
    let mut raw = [0u8; 16];
    raw.copy_from_slice(bytes);
    let block = u128::from_le_bytes(raw);

    let mode_field = (block & 0x7FF) as u32;
    if mode_field & 0x1FF == 0x1FC {
        decode_void_extent(block, tile);
        return;
    }
    let Some(bm) = decode_block_mode(mode_field) else {
        tile.fill(ERROR_COLOR);
        return;
    };
    if bm.grid_w > block_w || bm.grid_h > block_h {
        tile.fill(ERROR_COLOR);
        return;
    }

    let weight_count = bm.grid_w * bm.grid_h * if bm.dual_plane { 2 } else { 1 };
    let weight_bits = ise_bit_count(bm.quant, weight_count);
    if weight_count > 64 || !(24..=96).contains(&weight_bits) {
        tile.fill(ERROR_COLOR);
        return;
    }

    let partition_count = ((block >> 11) & 0x03) as u32 + 1;
    if bm.dual_plane && partition_count == 4 {
        tile.fill(ERROR_COLOR);
        return;
    }

    // Collect the color endpoint mode for each partition.
    let mut cems = [0u32; 4];
    let mut extra_cem_bits = 0u32;
    let mut partition_index = 0u32;
    let color_start;
    if partition_count == 1 {
        cems[0] = ((block >> 13) & 0x0F) as u32;
        color_start = 17;
    } else {
        partition_index = ((block >> 13) & 0x3FF) as u32;
        let cem_field = ((block >> 23) & 0x3F) as u32;
        color_start = 29;
        if cem_field & 0x03 == 0 {
            // All partitions share one mode.
            for cem in cems.iter_mut().take(partition_count as usize) {
                *cem = cem_field >> 2;
            }
        } else {
            // Per-partition class + mode, partially stored below the
            // weight data.
            extra_cem_bits = 3 * partition_count - 4;
            let below = ((block >> (128 - weight_bits - extra_cem_bits))
                & ((1u128 << extra_cem_bits) - 1)) as u32;
            let full = (below << 4) | (cem_field >> 2);
            let base_class = (cem_field & 0x03) - 1;
            for (i, cem) in cems.iter_mut().enumerate().take(partition_count as usize) {
                let class = base_class + ((full >> i) & 1);
                let mode = (full >> (partition_count + 2 * i as u32)) & 0x03;
                *cem = (class << 2) | mode;
            }
        }
    }

    let ccs_bits = if bm.dual_plane { 2 } else { 0 };
    let ccs = if bm.dual_plane {
        ((block >> (128 - weight_bits - extra_cem_bits - 2)) & 0x03) as u32
    } else {
        0
    };

    // Number of unquantized color values needed across all partitions.
    let mut color_count = 0u32;
    for cem in cems.iter().take(partition_count as usize) {
        color_count += ((cem >> 2) + 1) * 2;
    }
    if color_count > 18 {
        tile.fill(ERROR_COLOR);
        return;
    }

    let color_bits_avail = 128u32
        .saturating_sub(weight_bits)
        .saturating_sub(extra_cem_bits)
        .saturating_sub(ccs_bits)
        .saturating_sub(color_start);
    let Some(color_quant) = COLOR_QUANT
        .iter()
        .find(|q| ise_bit_count(**q, color_count) <= color_bits_avail)
        .copied()
    else {
        tile.fill(ERROR_COLOR);
        return;
    };

    // Color endpoint values.
    let mut reader = BitReader::new(block, color_start, color_start + color_bits_avail);
    let color_raw = ise_decode(&mut reader, color_quant, color_count as usize);
    let colors: Vec<i32> = color_raw
        .iter()
        .map(|&(m, d)| unquant_color(color_quant, m, d) as i32)
        .collect();

    // Per-partition endpoints.
    let mut endpoints = [([0i32; 4], [0i32; 4]); 4];
    let mut vi = 0usize;
    for (i, ep) in endpoints.iter_mut().enumerate().take(partition_count as usize) {
        let n = (((cems[i] >> 2) + 1) * 2) as usize;
        match decode_endpoints(cems[i], &colors[vi..vi + n]) {
            Some(pair) => *ep = pair,
            None => {
                tile.fill(ERROR_COLOR);
                return;
            }
        }
        vi += n;
    }

    // Weights are stored from bit 127 downward in reversed bit order.
    let mut wreader = BitReader::new(block.reverse_bits(), 0, weight_bits);
    let weight_raw = ise_decode(&mut wreader, bm.quant, weight_count as usize);
    let weights: Vec<u32> = weight_raw
        .iter()
        .map(|&(m, d)| unquant_weight(bm.quant, m, d))
        .collect();

    let planes = if bm.dual_plane { 2 } else { 1 };
    let grid_weight = |gx: u32, gy: u32, plane: u32| -> i32 {
        let idx = ((gy * bm.grid_w + gx) * planes + plane) as usize;
        weights.get(idx).copied().unwrap_or(0) as i32
    };

    // Weight grid infill factors.
    let ds = (1024 + block_w / 2) / (block_w - 1);
    let dt = (1024 + block_h / 2) / (block_h - 1);
    let small_block = block_w * block_h < 31;

    for ty in 0..block_h {
        for tx in 0..block_w {
            let part = if partition_count > 1 {
                select_partition(partition_index, tx, ty, partition_count, small_block)
            } else {
                0
            };
            let (e0, e1) = endpoints[part];

            // Bilinear infill of the stored weight grid.
            let gs = (ds * tx * (bm.grid_w - 1) + 32) >> 6;
            let gt = (dt * ty * (bm.grid_h - 1) + 32) >> 6;
            let (js, fs) = (gs >> 4, (gs & 0x0F) as i32);
            let (jt, ft) = (gt >> 4, (gt & 0x0F) as i32);
            let js1 = (js + 1).min(bm.grid_w - 1);
            let jt1 = (jt + 1).min(bm.grid_h - 1);
            let w11 = (fs * ft + 8) >> 4;
            let w10 = ft - w11;
            let w01 = fs - w11;
            let w00 = 16 - fs - ft + w11;

            let infill = |plane: u32| -> i32 {
                let p00 = grid_weight(js, jt, plane);
                let p01 = grid_weight(js1, jt, plane);
                let p10 = grid_weight(js, jt1, plane);
                let p11 = grid_weight(js1, jt1, plane);
                (p00 * w00 + p01 * w01 + p10 * w10 + p11 * w11 + 8) >> 4
            };
            let w_plane0 = infill(0);
            let w_plane1 = if bm.dual_plane { infill(1) } else { w_plane0 };

            let mut channels = [0u32; 4];
            for (ch, out) in channels.iter_mut().enumerate() {
                let w = if bm.dual_plane && ch as u32 == ccs {
                    w_plane1
                } else {
                    w_plane0
                };
                // Interpolate in UNORM16, then keep the top byte.
                let c0 = e0[ch] * 0x101;
                let c1 = e1[ch] * 0x101;
                let c = (c0 * (64 - w) + c1 * w + 32) >> 6;
                *out = ((c >> 8) & 0xFF) as u32;
            }
            tile[(ty * block_w + tx) as usize] =
                (channels[3] << 24) | (channels[0] << 16) | (channels[1] << 8) | channels[2];
        }
    }
}

/// Decode an ASTC image with the given block footprint.
pub fn decode_astc(
    width: u32,
    height: u32,
    block_w: u8,
    block_h: u8,
    buf: &[u8],
) -> DecodeResult<DecodedImage> {
    if !is_valid_astc_block(block_w, block_h) {
        return Err(DecodeError::DimensionConstraint {
            codec: "ASTC",
            width: u32::from(block_w),
            height: u32::from(block_h),
        });
    }
    let expected = calc_image_size_astc(width, height, block_w, block_h)
        .ok_or(DecodeError::InvalidDimensions { width, height })?;
    if buf.len() < expected {
        return Err(DecodeError::BufferTooSmall {
            expected,
            actual: buf.len(),
        });
    }

    let (bw, bh) = (u32::from(block_w), u32::from(block_h));
    let mut img = DecodedImage::new(width, height)?;
    let mut tile = vec![0u32; (bw * bh) as usize];
    let blocks_x = width.div_ceil(bw);
    let blocks_y = height.div_ceil(bh);
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block = &buf[((by * blocks_x + bx) * 16) as usize..][..16];
            decode_block(block, bw, bh, &mut tile);
            img.blit_tile(&tile, bw, bh, bx, by);
        }
    }
    Ok(img)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// LDR void-extent block with the given UNORM16 channel values.
    fn void_extent_block(r: u16, g: u16, b: u16, a: u16) -> [u8; 16] {
        let mut block: u128 = 0xDFC; // void extent, LDR, reserved bits set
        // Extent coordinates: all-ones means "no extent".
        block |= ((1u128 << 52) - 1) << 12;
        block |= u128::from(r) << 64;
        block |= u128::from(g) << 80;
        block |= u128::from(b) << 96;
        block |= u128::from(a) << 112;
        block.to_le_bytes()
    }

    #[test]
    fn void_extent_fills_block_color() {
        let block = void_extent_block(0xFFFF, 0x8080, 0x0000, 0xFFFF);
        let img = decode_astc(8, 8, 8, 8, &block).unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFFFF8000));
    }

    #[test]
    fn hdr_void_extent_is_error_color() {
        let mut raw = void_extent_block(0, 0, 0, 0);
        let mut block = u128::from_le_bytes(raw);
        block |= 0x200; // HDR flag
        raw = block.to_le_bytes();
        let img = decode_astc(4, 4, 4, 4, &raw).unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFFFF00FF));
    }

    #[test]
    fn reserved_block_mode_is_error_color() {
        // All-zero block mode is reserved.
        let img = decode_astc(4, 4, 4, 4, &[0u8; 16]).unwrap();
        assert!(img.pixels().iter().all(|&px| px == 0xFFFF00FF));
    }

    #[test]
    fn npot_image_clips_edge_blocks() {
        // 10x6 at 8x8 blocks: 2x1 blocks = 32 bytes.
        let mut buf = [0u8; 32];
        buf[0..16].copy_from_slice(&void_extent_block(0xFF00, 0, 0, 0xFFFF));
        buf[16..32].copy_from_slice(&void_extent_block(0, 0xFF00, 0, 0xFFFF));
        let img = decode_astc(10, 6, 8, 8, &buf).unwrap();
        assert_eq!(img.width(), 10);
        assert_eq!(img.pixel(0, 0), Some(0xFFFF0000));
        assert_eq!(img.pixel(9, 5), Some(0xFF00FF00));
    }

    #[test]
    fn weight_unquantization_range() {
        // Bit-only ranges hit 0 and 64 exactly.
        assert_eq!(unquant_weight(WEIGHT_QUANT[0], 0, 0), 0);
        assert_eq!(unquant_weight(WEIGHT_QUANT[0], 1, 0), 64);
        assert_eq!(unquant_weight(WEIGHT_QUANT[1], 0, 2), 64);
        // Trit range 6: symmetric around 32.
        let w: Vec<u32> = (0..2)
            .flat_map(|m| (0..3).map(move |d| unquant_weight(WEIGHT_QUANT[4], m, d)))
            .collect();
        assert!(w.contains(&0) && w.contains(&64));
    }

    #[test]
    fn color_unquantization_range() {
        assert_eq!(unquant_color(COLOR_QUANT[0], 0xFF, 0), 0xFF);
        assert_eq!(unquant_color(COLOR_QUANT[0], 0, 0), 0);
        // Trit range 6: endpoints are exact.
        let six = q(6, true, false, 1);
        assert_eq!(unquant_color(six, 0, 0), 0);
        assert_eq!(unquant_color(six, 1, 0), 255);
    }

    #[test]
    fn rejects_bad_footprints_and_truncation() {
        assert!(matches!(
            decode_astc(16, 16, 7, 3, &[0u8; 256]),
            Err(DecodeError::DimensionConstraint { .. })
        ));
        assert!(matches!(
            decode_astc(40, 40, 8, 8, &[0u8; 399]),
            Err(DecodeError::BufferTooSmall {
                expected: 400,
                actual: 399
            })
        ));
    }
}
