//! Precision-5 encoded polylines.
//!
//! Wire format (as emitted by common directions providers):
//! - coordinates are scaled by 1e5 and rounded to integers
//! - each vertex stores the delta from the previous one, latitude first
//! - deltas are zigzag encoded (left shift, invert when negative)
//! - values are split into 5-bit groups, least significant first; every group
//!   except the last carries the 0x20 continuation bit
//! - each group is offset by 63 into printable ASCII (`?`..=`~`)

use std::fmt;

use foundation::{Coordinate, validate_degrees};

const PRECISION: f64 = 1e5;
const OFFSET: u8 = 63;
const CONTINUATION: i64 = 0x20;
const GROUP_MASK: i64 = 0x1f;
/// Seven groups (35 bits) covers any in-range delta with headroom.
const MAX_SHIFT: u32 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRoute {
    /// Byte outside the encoding alphabet.
    InvalidByte { offset: usize, byte: u8 },
    /// Input ended inside a value or between a latitude and its longitude.
    Truncated { offset: usize },
    /// A value used more groups than any valid coordinate needs.
    Overflow { offset: usize },
}

impl fmt::Display for MalformedRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedRoute::InvalidByte { offset, byte } => {
                write!(f, "invalid polyline byte 0x{byte:02x} at offset {offset}")
            }
            MalformedRoute::Truncated { offset } => {
                write!(f, "polyline truncated at offset {offset}")
            }
            MalformedRoute::Overflow { offset } => {
                write!(f, "polyline value overflows at offset {offset}")
            }
        }
    }
}

impl std::error::Error for MalformedRoute {}

/// Decodes an encoded polyline into validated coordinates.
///
/// Blank input, and input leaving fewer than two valid vertices, decode to an
/// empty route. Malformed input is an error the caller downgrades to "no route".
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>, MalformedRoute> {
    let bytes = encoded.trim().as_bytes();
    let mut coords = Vec::new();
    let mut idx = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while idx < bytes.len() {
        lat += next_value(bytes, &mut idx)?;
        if idx >= bytes.len() {
            return Err(MalformedRoute::Truncated { offset: idx });
        }
        lng += next_value(bytes, &mut idx)?;

        if let Ok(c) = validate_degrees(lat as f64 / PRECISION, lng as f64 / PRECISION) {
            coords.push(c);
        }
    }

    if coords.len() < 2 {
        coords.clear();
    }
    Ok(coords)
}

fn next_value(bytes: &[u8], idx: &mut usize) -> Result<i64, MalformedRoute> {
    let mut result: i64 = 0;
    let mut shift: u32 = 0;
    loop {
        let offset = *idx;
        let Some(&byte) = bytes.get(offset) else {
            return Err(MalformedRoute::Truncated { offset });
        };
        if !(OFFSET..=b'~').contains(&byte) {
            return Err(MalformedRoute::InvalidByte { offset, byte });
        }
        if shift > MAX_SHIFT {
            return Err(MalformedRoute::Overflow { offset });
        }
        let group = i64::from(byte - OFFSET);
        *idx += 1;
        result |= (group & GROUP_MASK) << shift;
        shift += 5;
        if group < CONTINUATION {
            break;
        }
    }
    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

/// Encodes coordinates as a precision-5 polyline.
pub fn encode(coords: &[Coordinate]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;
    for c in coords {
        let lat = (c.lat * PRECISION).round() as i64;
        let lng = (c.lng * PRECISION).round() as i64;
        push_value(lat - prev_lat, &mut out);
        push_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }
    out
}

fn push_value(delta: i64, out: &mut String) {
    let mut v = if delta < 0 { !(delta << 1) } else { delta << 1 };
    while v >= CONTINUATION {
        out.push(char::from(((CONTINUATION | (v & GROUP_MASK)) as u8) + OFFSET));
        v >>= 5;
    }
    out.push(char::from(v as u8 + OFFSET));
}
