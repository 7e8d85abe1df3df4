//! Base64 variable-length quantities as used by the `mappings` field.
//!
//! A signed value is first turned into a digit whose lowest bit is the sign,
//! then emitted five bits at a time, least significant group first. Every
//! character except the last carries the continuation bit `0x20`.

use crate::{Error, Result};

const BASE64_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const BASE64_VALUES: [i8; 256] = get_base64_map();

const VLQ_BASE_SHIFT: u32 = 5;
const VLQ_BASE_MASK: u128 = (1 << VLQ_BASE_SHIFT) - 1;
const VLQ_CONTINUATION_BIT: u128 = 1 << VLQ_BASE_SHIFT;

const fn get_base64_map() -> [i8; 256] {
    let mut res = [-1i8; 256];
    // `for in` is not allowed in const fn
    let mut idx = 0;
    while idx < 64 {
        res[BASE64_CHARS[idx] as usize] = idx as i8;
        idx += 1;
    }
    res
}

/// Encodes `value` as a base64 VLQ string.
///
/// ```
/// assert_eq!(srcmap::vlq::encode(0), "A");
/// assert_eq!(srcmap::vlq::encode(-1), "D");
/// assert_eq!(srcmap::vlq::encode(16), "gB");
/// ```
pub fn encode(value: i64) -> String {
    let mut out = String::with_capacity(2);
    encode_to(value, &mut out);
    out
}

/// Appends the base64 VLQ form of `value` to `out`.
pub fn encode_to(value: i64, out: &mut String) {
    // the sign bit pushes `i64::MIN` to 65 bits
    let mut digit = (value.unsigned_abs() as u128) << 1;
    if value < 0 {
        digit |= 1;
    }

    loop {
        let mut chunk = digit & VLQ_BASE_MASK;
        digit >>= VLQ_BASE_SHIFT;
        if digit != 0 {
            chunk |= VLQ_CONTINUATION_BIT;
        }
        out.push(BASE64_CHARS[chunk as usize] as char);
        if digit == 0 {
            break;
        }
    }
}

/// Decodes one VLQ starting at byte `start` of `input`.
///
/// Returns the value and the index just past the consumed characters.
pub fn decode(input: &str, start: usize) -> Result<(i64, usize)> {
    let bytes = input.as_bytes();
    let mut digit: u128 = 0;
    let mut shift = 0;
    let mut idx = start;

    loop {
        let Some(&byte) = bytes.get(idx) else {
            return Err(Error::UnterminatedVlq);
        };
        let value = BASE64_VALUES[byte as usize];
        if value < 0 {
            return Err(Error::InvalidBase64(
                input[idx..].chars().next().unwrap_or(byte as char),
            ));
        }
        idx += 1;

        let value = value as u128;
        if shift > 60 {
            return Err(Error::VlqOverflow);
        }
        digit |= (value & VLQ_BASE_MASK) << shift;
        shift += VLQ_BASE_SHIFT;

        if value & VLQ_CONTINUATION_BIT == 0 {
            break;
        }
    }

    let magnitude = (digit >> 1) as i128;
    let value = if digit & 1 == 1 {
        -magnitude
    } else {
        magnitude
    };
    let value = i64::try_from(value).map_err(|_| Error::VlqOverflow)?;
    Ok((value, idx))
}

/// The decoded fields of one `mappings` segment.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Segment {
    buf: [i64; 5],
    len: usize,
}

impl Segment {
    /// Decodes a whole segment, accepting only 1, 4 or 5 fields.
    pub fn parse(segment: &str) -> Result<Self> {
        let mut buf = [0; 5];
        let mut len = 0;
        let mut idx = 0;

        while idx < segment.len() {
            if len == buf.len() {
                return Err(Error::MappingMalformed(segment.to_owned()));
            }
            let (value, next) = decode(segment, idx)?;
            buf[len] = value;
            len += 1;
            idx = next;
        }

        if !matches!(len, 1 | 4 | 5) {
            return Err(Error::MappingMalformed(segment.to_owned()));
        }
        Ok(Self { buf, len })
    }

    #[inline]
    pub fn fields(&self) -> &[i64] {
        &self.buf[..self.len]
    }
}
