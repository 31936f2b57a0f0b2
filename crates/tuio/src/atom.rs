//! OSC atoms: the fixed-width primitives every OSC message is built from.
//!
//! All multi-byte values are big-endian. Strings and blobs are padded with zero
//! bytes to a multiple of 4. [Reader] never reads past the end of its slice; any
//! short read is reported as [DecodeError::Underrun].

use crate::error::DecodeError;
use serde::Serialize;

/// Bytes in one OSC alignment unit.
pub const ALIGN: usize = 4;

/// Rounds `n` up to the next multiple of [ALIGN].
pub fn pad4(n: usize) -> usize {
    (n + ALIGN - 1) / ALIGN * ALIGN
}

/// One decoded OSC argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OscAtom {
    Int32(i32),
    Float32(f32),
    String(String),
    Blob(Vec<u8>),
}

impl OscAtom {
    /// Type tag character used for this atom in an OSC type-tag string.
    pub fn type_tag(&self) -> char {
        match self {
            OscAtom::Int32(_) => 'i',
            OscAtom::Float32(_) => 'f',
            OscAtom::String(_) => 's',
            OscAtom::Blob(_) => 'b',
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OscAtom::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value; integral floats are accepted since some trackers send ids as `f`.
    pub fn to_i32(&self) -> Option<i32> {
        match self {
            OscAtom::Int32(i) => Some(*i),
            OscAtom::Float32(f)
                if f.fract() == 0.0 && *f >= i32::MIN as f32 && *f < i32::MAX as f32 =>
            {
                Some(*f as i32)
            }
            _ => None,
        }
    }

    /// Numeric value as f32 (int32 or float32).
    pub fn to_f32(&self) -> Option<f32> {
        match self {
            OscAtom::Int32(i) => Some(*i as f32),
            OscAtom::Float32(f) => Some(*f),
            _ => None,
        }
    }

    /// Session identifier: any integral number, or a string holding one.
    pub fn to_session_id(&self) -> Option<i32> {
        match self {
            OscAtom::String(s) => s.trim().parse().ok(),
            other => other.to_i32(),
        }
    }
}

/// OSC time tag: NTP-style seconds plus a 32-bit binary fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OscTimestamp {
    pub seconds: u32,
    pub fraction: u32,
}

impl OscTimestamp {
    /// The special "immediately" time tag (0 seconds, fraction 1).
    pub const IMMEDIATE: OscTimestamp = OscTimestamp {
        seconds: 0,
        fraction: 1,
    };

    pub fn new(seconds: u32, fraction: u32) -> Self {
        Self { seconds, fraction }
    }

    /// Fixed-point value as seconds: `seconds + fraction / 2^32`.
    pub fn as_secs_f64(&self) -> f64 {
        self.seconds as f64 + self.fraction as f64 / 4_294_967_296.0
    }
}

/// Cursor over an OSC byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Takes exactly `n` bytes, or fails without moving the cursor.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], DecodeError> {
        if n > self.remaining() {
            return Err(DecodeError::Underrun {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn take4(&mut self) -> Result<[u8; 4], DecodeError> {
        let b = self.take(4)?;
        Ok([b[0], b[1], b[2], b[3]])
    }

    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.take4().map(i32::from_be_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.take4().map(u32::from_be_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.take4().map(f32::from_be_bytes)
    }

    /// Zero-terminated string; the cursor lands on the next multiple of 4 past
    /// the terminator.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let rest = &self.data[self.pos..];
        let end = rest.iter().position(|b| *b == 0).ok_or(DecodeError::Underrun {
            offset: self.pos,
            needed: rest.len() + 1,
            remaining: rest.len(),
        })?;
        let bytes = self.take(pad4(end + 1))?;
        Ok(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }

    /// Int32 length followed by that many payload bytes, padded to 4.
    pub fn read_blob(&mut self) -> Result<Vec<u8>, DecodeError> {
        let start = self.pos;
        let len = self.read_i32()?;
        if len < 0 {
            self.pos = start;
            return Err(DecodeError::InvalidLength(len));
        }
        let len = len as usize;
        match self.take(pad4(len)) {
            Ok(bytes) => Ok(bytes[..len].to_vec()),
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }

    pub fn read_timestamp(&mut self) -> Result<OscTimestamp, DecodeError> {
        if self.remaining() < 8 {
            return Err(DecodeError::Underrun {
                offset: self.pos,
                needed: 8,
                remaining: self.remaining(),
            });
        }
        let seconds = self.read_u32()?;
        let fraction = self.read_u32()?;
        Ok(OscTimestamp { seconds, fraction })
    }

    /// Decodes one atom of the type named by `tag`.
    pub fn read_atom(&mut self, tag: char) -> Result<OscAtom, DecodeError> {
        match tag {
            'i' => self.read_i32().map(OscAtom::Int32),
            'f' => self.read_f32().map(OscAtom::Float32),
            's' => self.read_string().map(OscAtom::String),
            'b' => self.read_blob().map(OscAtom::Blob),
            other => Err(DecodeError::UnknownTypeTag(other)),
        }
    }
}
