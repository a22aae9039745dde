//! Byte-level primitives shared by the per-code payload parsers.

use crate::error::RamsesError;

/// Split a hex payload string into raw bytes.
pub fn bytes_of(code: &str, hex: &str) -> Result<Vec<u8>, RamsesError> {
    hex::decode(hex).map_err(|e| RamsesError::InvalidPayload {
        code: code.to_string(),
        reason: format!("not valid hex: {e}"),
    })
}

fn need(code: &str, bytes: &[u8], at: usize, len: usize) -> Result<&[u8], RamsesError> {
    bytes.get(at..at + len).ok_or_else(|| RamsesError::InvalidPayload {
        code: code.to_string(),
        reason: format!("expected at least {} bytes, got {}", at + len, bytes.len()),
    })
}

/// A big-endian, hundredths-of-a-degree signed temperature (`0x7FFF` means
/// "no reading").
pub fn temp_i16(code: &str, bytes: &[u8], at: usize) -> Result<Option<f32>, RamsesError> {
    let b = need(code, bytes, at, 2)?;
    let raw = i16::from_be_bytes([b[0], b[1]]);
    if raw == 0x7FFFu16 as i16 {
        Ok(None)
    } else {
        Ok(Some(raw as f32 / 100.0))
    }
}

/// A big-endian, hundredths unsigned value (setpoints, thresholds).
pub fn frac_u16(code: &str, bytes: &[u8], at: usize) -> Result<f32, RamsesError> {
    let b = need(code, bytes, at, 2)?;
    Ok(u16::from_be_bytes([b[0], b[1]]) as f32 / 100.0)
}

/// A single byte expressed as a percentage of `0xC8` (200).
pub fn pct_of_c8(code: &str, bytes: &[u8], at: usize) -> Result<f32, RamsesError> {
    let b = need(code, bytes, at, 1)?;
    Ok(b[0] as f32 / 0xC8 as f32 * 100.0)
}

pub fn byte(code: &str, bytes: &[u8], at: usize) -> Result<u8, RamsesError> {
    Ok(need(code, bytes, at, 1)?[0])
}

pub fn hex_id(code: &str, bytes: &[u8], at: usize, len: usize) -> Result<String, RamsesError> {
    Ok(hex::encode_upper(need(code, bytes, at, len)?))
}

/// Decode a 3-byte packed device id at `at` into its colon-text form, per
/// [`crate::address::Address::from_packed`].
pub fn packed_addr(code: &str, bytes: &[u8], at: usize) -> Result<crate::address::Address, RamsesError> {
    let b = need(code, bytes, at, 3)?;
    let raw = u32::from_be_bytes([0, b[0], b[1], b[2]]);
    Ok(crate::address::Address::from_packed(raw))
}

/// Render a 2-digit decimal index byte as the zone-id/domain-id string the
/// rest of the crate expects (e.g. `"00"`, `"FC"`).
pub fn idx_str(byte: u8) -> String {
    format!("{byte:02X}")
}

/// Split `bytes` into fixed-width records, or error if it doesn't divide
/// evenly.
pub fn chunks<'a>(code: &str, bytes: &'a [u8], record_len: usize) -> Result<Vec<&'a [u8]>, RamsesError> {
    if bytes.is_empty() || bytes.len() % record_len != 0 {
        return Err(RamsesError::InvalidPayload {
            code: code.to_string(),
            reason: format!(
                "payload length {} is not a multiple of record length {record_len}",
                bytes.len()
            ),
        });
    }
    Ok(bytes.chunks(record_len).collect())
}
