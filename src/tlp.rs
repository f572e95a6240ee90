//! # TLP Addressing and Typed Values
//!
//! A TLP (Type-Location-Parameter) triple addresses one scalar or string
//! value inside a ROC device. Each TLP in a request is paired positionally
//! with a [`FormatTag`] describing the wire width and interpretation of the
//! value, and decodes to a [`RocValue`].
//!
//! ## Format Tag Width Table
//!
//! | Tag | Width | Legacy tag |
//! |------|-------|-----------|
//! | Float32 | 4 | `f` |
//! | Int32 | 4 | `l`, `i` |
//! | Uint32 | 4 | `L` |
//! | Int16 | 2 | `h` |
//! | Uint16 | 2 | `H` |
//! | Int8 | 1 | `b` |
//! | Uint8 | 1 | `B` |
//! | FixedString(n) | n | `cN` |

use std::fmt;
use std::str::FromStr;

use crate::error::{RocError, RocResult};

/// Type-Location-Parameter address of one device data point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tlp {
    /// Point type (e.g. 12 = clock)
    pub point_type: u8,
    /// Point location / logical number
    pub location: u8,
    /// Parameter index within the point
    pub parameter: u8,
}

impl Tlp {
    /// Create a TLP address.
    #[inline]
    pub const fn new(point_type: u8, location: u8, parameter: u8) -> Self {
        Self {
            point_type,
            location,
            parameter,
        }
    }

    /// The 3-byte wire form, in transmit order.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 3] {
        [self.point_type, self.location, self.parameter]
    }

    /// Parse the 3-byte wire form.
    #[inline]
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2])
    }
}

impl fmt::Display for Tlp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.point_type, self.location, self.parameter)
    }
}

impl From<(u8, u8, u8)> for Tlp {
    fn from((t, l, p): (u8, u8, u8)) -> Self {
        Self::new(t, l, p)
    }
}

/// Per-field format descriptor selecting wire width and interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    /// IEEE 754 single precision, 4 bytes
    Float32,
    /// Signed 32-bit integer, 4 bytes
    Int32,
    /// Unsigned 32-bit integer, 4 bytes
    Uint32,
    /// Signed 16-bit integer, 2 bytes
    Int16,
    /// Unsigned 16-bit integer, 2 bytes
    Uint16,
    /// Signed 8-bit integer, 1 byte
    Int8,
    /// Unsigned 8-bit integer, 1 byte
    Uint8,
    /// Fixed-length character string of exactly `n` bytes
    FixedString(usize),
}

impl FormatTag {
    /// Number of payload bytes the field occupies after its TLP address.
    #[inline]
    pub fn width(&self) -> usize {
        match self {
            FormatTag::Float32 | FormatTag::Int32 | FormatTag::Uint32 => 4,
            FormatTag::Int16 | FormatTag::Uint16 => 2,
            FormatTag::Int8 | FormatTag::Uint8 => 1,
            FormatTag::FixedString(n) => *n,
        }
    }
}

impl FromStr for FormatTag {
    type Err = RocError;

    /// Parse the legacy single-character tag vocabulary.
    ///
    /// `f` float, `l`/`i` int32, `L` uint32, `h` int16, `H` uint16,
    /// `b` int8, `B` uint8, `cN` string of N bytes.
    fn from_str(s: &str) -> RocResult<Self> {
        match s {
            "f" => Ok(FormatTag::Float32),
            "l" | "i" => Ok(FormatTag::Int32),
            "L" => Ok(FormatTag::Uint32),
            "h" => Ok(FormatTag::Int16),
            "H" => Ok(FormatTag::Uint16),
            "b" => Ok(FormatTag::Int8),
            "B" => Ok(FormatTag::Uint8),
            _ => {
                if let Some(len) = s.strip_prefix('c') {
                    if let Ok(n) = len.parse::<usize>() {
                        if n > 0 {
                            return Ok(FormatTag::FixedString(n));
                        }
                    }
                }
                Err(RocError::UnsupportedFormatTag { tag: s.to_string() })
            }
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatTag::Float32 => write!(f, "f"),
            FormatTag::Int32 => write!(f, "l"),
            FormatTag::Uint32 => write!(f, "L"),
            FormatTag::Int16 => write!(f, "h"),
            FormatTag::Uint16 => write!(f, "H"),
            FormatTag::Int8 => write!(f, "b"),
            FormatTag::Uint8 => write!(f, "B"),
            FormatTag::FixedString(n) => write!(f, "c{}", n),
        }
    }
}

/// Typed value of one TLP field.
#[derive(Debug, Clone, PartialEq)]
pub enum RocValue {
    /// 32-bit floating point
    F32(f32),
    /// Signed 32-bit integer
    I32(i32),
    /// Unsigned 32-bit integer
    U32(u32),
    /// Signed 16-bit integer
    I16(i16),
    /// Unsigned 16-bit integer
    U16(u16),
    /// Signed 8-bit integer
    I8(i8),
    /// Unsigned 8-bit integer
    U8(u8),
    /// Fixed-length character string
    Str(String),
}

impl RocValue {
    /// Convert the value to f64 for uniform numeric handling.
    ///
    /// String values convert to 0.0.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        match self {
            RocValue::F32(v) => f64::from(*v),
            RocValue::I32(v) => f64::from(*v),
            RocValue::U32(v) => f64::from(*v),
            RocValue::I16(v) => f64::from(*v),
            RocValue::U16(v) => f64::from(*v),
            RocValue::I8(v) => f64::from(*v),
            RocValue::U8(v) => f64::from(*v),
            RocValue::Str(_) => 0.0,
        }
    }

    /// Convert the value to i64. Floats are rounded; strings convert to 0.
    #[inline]
    pub fn as_i64(&self) -> i64 {
        match self {
            RocValue::F32(v) => v.round() as i64,
            RocValue::I32(v) => i64::from(*v),
            RocValue::U32(v) => i64::from(*v),
            RocValue::I16(v) => i64::from(*v),
            RocValue::U16(v) => i64::from(*v),
            RocValue::I8(v) => i64::from(*v),
            RocValue::U8(v) => i64::from(*v),
            RocValue::Str(_) => 0,
        }
    }

    /// The format tag matching this value's wire form.
    pub fn format_tag(&self) -> FormatTag {
        match self {
            RocValue::F32(_) => FormatTag::Float32,
            RocValue::I32(_) => FormatTag::Int32,
            RocValue::U32(_) => FormatTag::Uint32,
            RocValue::I16(_) => FormatTag::Int16,
            RocValue::U16(_) => FormatTag::Uint16,
            RocValue::I8(_) => FormatTag::Int8,
            RocValue::U8(_) => FormatTag::Uint8,
            RocValue::Str(s) => FormatTag::FixedString(s.len()),
        }
    }

    /// Returns the type name as a string for logging/debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            RocValue::F32(_) => "f32",
            RocValue::I32(_) => "i32",
            RocValue::U32(_) => "u32",
            RocValue::I16(_) => "i16",
            RocValue::U16(_) => "u16",
            RocValue::I8(_) => "i8",
            RocValue::U8(_) => "u8",
            RocValue::Str(_) => "str",
        }
    }
}

impl fmt::Display for RocValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RocValue::F32(v) => write!(f, "{}", v),
            RocValue::I32(v) => write!(f, "{}", v),
            RocValue::U32(v) => write!(f, "{}", v),
            RocValue::I16(v) => write!(f, "{}", v),
            RocValue::U16(v) => write!(f, "{}", v),
            RocValue::I8(v) => write!(f, "{}", v),
            RocValue::U8(v) => write!(f, "{}", v),
            RocValue::Str(v) => write!(f, "{}", v),
        }
    }
}

// ============================================================================
// From implementations for ergonomic construction
// ============================================================================

impl From<f32> for RocValue {
    fn from(v: f32) -> Self {
        RocValue::F32(v)
    }
}

impl From<i32> for RocValue {
    fn from(v: i32) -> Self {
        RocValue::I32(v)
    }
}

impl From<u32> for RocValue {
    fn from(v: u32) -> Self {
        RocValue::U32(v)
    }
}

impl From<i16> for RocValue {
    fn from(v: i16) -> Self {
        RocValue::I16(v)
    }
}

impl From<u16> for RocValue {
    fn from(v: u16) -> Self {
        RocValue::U16(v)
    }
}

impl From<i8> for RocValue {
    fn from(v: i8) -> Self {
        RocValue::I8(v)
    }
}

impl From<u8> for RocValue {
    fn from(v: u8) -> Self {
        RocValue::U8(v)
    }
}

impl From<String> for RocValue {
    fn from(v: String) -> Self {
        RocValue::Str(v)
    }
}

impl From<&str> for RocValue {
    fn from(v: &str) -> Self {
        RocValue::Str(v.to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tlp_wire_form() {
        let tlp = Tlp::new(12, 0, 5);
        assert_eq!(tlp.to_bytes(), [12, 0, 5]);
        assert_eq!(Tlp::from_bytes([12, 0, 5]), tlp);
        assert_eq!(format!("{}", tlp), "(12,0,5)");
    }

    #[test]
    fn test_format_tag_widths() {
        assert_eq!(FormatTag::Float32.width(), 4);
        assert_eq!(FormatTag::Int32.width(), 4);
        assert_eq!(FormatTag::Uint32.width(), 4);
        assert_eq!(FormatTag::Int16.width(), 2);
        assert_eq!(FormatTag::Uint16.width(), 2);
        assert_eq!(FormatTag::Int8.width(), 1);
        assert_eq!(FormatTag::Uint8.width(), 1);
        assert_eq!(FormatTag::FixedString(10).width(), 10);
    }

    #[test]
    fn test_format_tag_parse_legacy_vocabulary() {
        assert_eq!("f".parse::<FormatTag>().unwrap(), FormatTag::Float32);
        assert_eq!("l".parse::<FormatTag>().unwrap(), FormatTag::Int32);
        assert_eq!("i".parse::<FormatTag>().unwrap(), FormatTag::Int32);
        assert_eq!("L".parse::<FormatTag>().unwrap(), FormatTag::Uint32);
        assert_eq!("h".parse::<FormatTag>().unwrap(), FormatTag::Int16);
        assert_eq!("H".parse::<FormatTag>().unwrap(), FormatTag::Uint16);
        assert_eq!("b".parse::<FormatTag>().unwrap(), FormatTag::Int8);
        assert_eq!("B".parse::<FormatTag>().unwrap(), FormatTag::Uint8);
        assert_eq!(
            "c10".parse::<FormatTag>().unwrap(),
            FormatTag::FixedString(10)
        );
    }

    #[test]
    fn test_format_tag_parse_rejects_unknown() {
        assert!(matches!(
            "x".parse::<FormatTag>(),
            Err(RocError::UnsupportedFormatTag { .. })
        ));
        assert!("c0".parse::<FormatTag>().is_err());
        assert!("c".parse::<FormatTag>().is_err());
        assert!("q".parse::<FormatTag>().is_err());
    }

    #[test]
    fn test_format_tag_display_roundtrip() {
        for tag in [
            FormatTag::Float32,
            FormatTag::Int32,
            FormatTag::Uint32,
            FormatTag::Int16,
            FormatTag::Uint16,
            FormatTag::Int8,
            FormatTag::Uint8,
            FormatTag::FixedString(7),
        ] {
            assert_eq!(tag.to_string().parse::<FormatTag>().unwrap(), tag);
        }
    }

    #[test]
    fn test_value_as_f64() {
        assert_eq!(RocValue::U16(100).as_f64(), 100.0);
        assert_eq!(RocValue::I8(-5).as_f64(), -5.0);
        assert!((RocValue::F32(3.14).as_f64() - 3.14).abs() < 0.001);
        assert_eq!(RocValue::Str("abc".into()).as_f64(), 0.0);
    }

    #[test]
    fn test_value_format_tag() {
        assert_eq!(RocValue::F32(1.0).format_tag(), FormatTag::Float32);
        assert_eq!(
            RocValue::Str("abcd".into()).format_tag(),
            FormatTag::FixedString(4)
        );
    }

    #[test]
    fn test_from_primitives() {
        let _: RocValue = 1.5f32.into();
        let _: RocValue = (-7i32).into();
        let _: RocValue = 7u32.into();
        let _: RocValue = (-3i16).into();
        let _: RocValue = 3u16.into();
        let _: RocValue = (-1i8).into();
        let _: RocValue = 1u8.into();
        let _: RocValue = "name".into();
    }
}
