//! Byte source abstraction for container parsers

use std::io::{Read, Seek};

/// Combined `Read + Seek` bound so parsers can hold a `Box<dyn ReadSeek>`.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}
