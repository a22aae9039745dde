//! One parser per supported opcode. Each returns [`Value::Record`] or
//! [`Value::List`] depending on [`crate::registry::CodeInfo::has_array`]
//! for that code.

use super::decode::{byte, bytes_of, chunks, frac_u16, hex_id, idx_str, packed_addr, pct_of_c8, temp_i16};
use super::{Record, Value};
use crate::error::RamsesError;
use serde_json::json;

fn rec(pairs: Vec<(&str, serde_json::Value)>) -> Record {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// Tag a parser's decoded records per the message context: a `List` when
/// the message is known to carry an array, a single `Record` otherwise.
/// Per spec, a parser's result is always one or the other, never an
/// untagged collection.
fn record_or_list(code: &str, mut records: Vec<Record>, has_array: bool) -> Result<Value, RamsesError> {
    if has_array {
        return Ok(Value::List(records));
    }
    if records.len() != 1 {
        return Err(RamsesError::InvalidPayload {
            code: code.to_string(),
            reason: format!("expected exactly one record for a non-array message, got {}", records.len()),
        });
    }
    Ok(Value::Record(records.remove(0)))
}

pub fn parse_0009(payload: &str, has_array: bool) -> Result<Value, RamsesError> {
    let bytes = bytes_of("0009", payload)?;
    let mut out = Vec::new();
    for r in chunks("0009", &bytes, 3)? {
        out.push(rec(vec![
            ("domain_id", json!(idx_str(r[0]))),
            ("state", json!(r[1])),
            ("flag", json!(hex_id("0009", r, 2, 1)?)),
        ]));
    }
    record_or_list("0009", out, has_array)
}

pub fn parse_000a(payload: &str, has_array: bool) -> Result<Value, RamsesError> {
    let bytes = bytes_of("000A", payload)?;
    let mut out = Vec::new();
    for r in chunks("000A", &bytes, 6)? {
        out.push(rec(vec![
            ("zone_idx", json!(idx_str(r[0]))),
            ("min_temp", json!(frac_u16("000A", r, 2)?)),
            ("max_temp", json!(frac_u16("000A", r, 4)?)),
            ("local_override", json!(r[1] & 0x01 == 0)),
            ("multi_room_mode", json!(r[1] & 0x02 == 0)),
        ]));
    }
    record_or_list("000A", out, has_array)
}

pub fn parse_000c(payload: &str) -> Result<Value, RamsesError> {
    let bytes = bytes_of("000C", payload)?;
    if bytes.len() < 2 {
        return Err(RamsesError::InvalidPayload {
            code: "000C".to_string(),
            reason: "payload shorter than the zone_idx/device_role header".to_string(),
        });
    }
    let zone_idx = idx_str(bytes[0]);
    let device_role = byte("000C", &bytes, 1)?;
    let mut actuators = Vec::new();
    for r in chunks("000C", &bytes[2..], 3)? {
        if r == [0xFF, 0xFF, 0xFF] {
            continue;
        }
        actuators.push(packed_addr("000C", r, 0)?.to_string());
    }
    Ok(Value::Record(rec(vec![
        ("zone_idx", json!(zone_idx)),
        ("device_role", json!(idx_str(device_role))),
        ("actuators", json!(actuators)),
    ])))
}

/// Schedule fragment: one slice of a zone's (or the DHW system's) weekly
/// schedule, sent across several `0404` exchanges and reassembled by the
/// caller from `frag_index`/`frag_total`.
pub fn parse_0404(payload: &str) -> Result<Value, RamsesError> {
    let bytes = bytes_of("0404", payload)?;
    if bytes.len() < 7 {
        return Err(RamsesError::InvalidPayload {
            code: "0404".to_string(),
            reason: format!("expected at least 7 bytes, got {}", bytes.len()),
        });
    }
    let zone_idx = if bytes[1] == 0x23 { "HW".to_string() } else { idx_str(bytes[0]) };
    let frag_total = bytes[3];
    let frag_index = bytes[5];
    let frag_len = bytes[6] as usize;
    let frag_bytes = hex::encode_upper(need_tail("0404", &bytes, 7, frag_len)?);
    Ok(Value::Record(rec(vec![
        ("zone_idx", json!(zone_idx)),
        ("frag_index", json!(frag_index)),
        ("frag_total", json!(frag_total)),
        ("frag_bytes", json!(frag_bytes)),
    ])))
}

fn need_tail<'a>(code: &str, bytes: &'a [u8], at: usize, len: usize) -> Result<&'a [u8], RamsesError> {
    bytes.get(at..at + len).ok_or_else(|| RamsesError::InvalidPayload {
        code: code.to_string(),
        reason: format!("declared fragment length {len} overruns the payload"),
    })
}

pub fn parse_1100(payload: &str) -> Result<Value, RamsesError> {
    let bytes = bytes_of("1100", payload)?;
    if bytes.len() < 5 {
        return Err(RamsesError::InvalidPayload {
            code: "1100".to_string(),
            reason: format!("expected at least 5 bytes, got {}", bytes.len()),
        });
    }
    Ok(Value::Record(rec(vec![
        ("domain_id", json!(idx_str(bytes[0]))),
        ("cycle_rate", json!(bytes[1] as f32 / 4.0)),
        ("min_on_time", json!(bytes[2] as f32 / 4.0)),
        ("min_off_time", json!(bytes[3] as f32 / 4.0)),
    ])))
}

pub fn parse_1f09(payload: &str) -> Result<Value, RamsesError> {
    let bytes = bytes_of("1F09", payload)?;
    if bytes.len() < 3 {
        return Err(RamsesError::InvalidPayload {
            code: "1F09".to_string(),
            reason: format!("expected at least 3 bytes, got {}", bytes.len()),
        });
    }
    let remaining_seconds = u16::from_be_bytes([bytes[1], bytes[2]]) as u32 * 10;
    Ok(Value::Record(rec(vec![
        ("status", json!(idx_str(bytes[0]))),
        ("remaining_seconds", json!(remaining_seconds)),
    ])))
}

pub fn parse_1fc9(payload: &str) -> Result<Value, RamsesError> {
    let bytes = bytes_of("1FC9", payload)?;
    let mut out = Vec::new();
    for r in chunks("1FC9", &bytes, 6)? {
        out.push(rec(vec![
            ("code", json!(hex_id("1FC9", r, 1, 2)?)),
            ("dev_id", json!(packed_addr("1FC9", r, 3)?.to_string())),
        ]));
    }
    Ok(Value::List(out))
}

pub fn parse_2249(payload: &str, has_array: bool) -> Result<Value, RamsesError> {
    let bytes = bytes_of("2249", payload)?;
    let mut out = Vec::new();
    for r in chunks("2249", &bytes, 7)? {
        out.push(rec(vec![
            ("zone_idx", json!(idx_str(r[0]))),
            ("setpoint_now", json!(frac_u16("2249", r, 1)?)),
            ("setpoint_next", json!(frac_u16("2249", r, 3)?)),
            ("minutes_to_next", json!(u16::from_be_bytes([r[5], r[6]]))),
        ]));
    }
    record_or_list("2249", out, has_array)
}

pub fn parse_22c9(payload: &str, has_array: bool) -> Result<Value, RamsesError> {
    let bytes = bytes_of("22C9", payload)?;
    let mut out = Vec::new();
    for r in chunks("22C9", &bytes, 6)? {
        out.push(rec(vec![
            ("ufh_idx", json!(idx_str(r[0]))),
            ("setpoint_low", json!(frac_u16("22C9", r, 1)?)),
            ("setpoint_high", json!(frac_u16("22C9", r, 3)?)),
        ]));
    }
    record_or_list("22C9", out, has_array)
}

pub fn parse_2309(payload: &str, has_array: bool) -> Result<Value, RamsesError> {
    let bytes = bytes_of("2309", payload)?;
    let mut out = Vec::new();
    for r in chunks("2309", &bytes, 3)? {
        out.push(rec(vec![
            ("zone_idx", json!(idx_str(r[0]))),
            ("setpoint", json!(temp_i16("2309", r, 1)?)),
        ]));
    }
    record_or_list("2309", out, has_array)
}

pub fn parse_2e04(payload: &str) -> Result<Value, RamsesError> {
    let bytes = bytes_of("2E04", payload)?;
    if bytes.is_empty() {
        return Err(RamsesError::InvalidPayload {
            code: "2E04".to_string(),
            reason: "empty payload".to_string(),
        });
    }
    let until = bytes.get(1..7).filter(|b| *b != [0xFF; 6]).map(hex::encode_upper);
    Ok(Value::Record(rec(vec![
        ("system_mode", json!(idx_str(bytes[0]))),
        ("until", json!(until)),
    ])))
}

pub fn parse_30c9(payload: &str, has_array: bool) -> Result<Value, RamsesError> {
    let bytes = bytes_of("30C9", payload)?;
    let mut out = Vec::new();
    for r in chunks("30C9", &bytes, 3)? {
        out.push(rec(vec![
            ("zone_idx", json!(idx_str(r[0]))),
            ("temperature", json!(temp_i16("30C9", r, 1)?)),
        ]));
    }
    record_or_list("30C9", out, has_array)
}

pub fn parse_3150(payload: &str, has_array: bool) -> Result<Value, RamsesError> {
    let bytes = bytes_of("3150", payload)?;
    let mut out = Vec::new();
    for r in chunks("3150", &bytes, 2)? {
        out.push(rec(vec![
            ("idx", json!(idx_str(r[0]))),
            ("heat_demand", json!(pct_of_c8("3150", r, 1)?)),
        ]));
    }
    record_or_list("3150", out, has_array)
}

pub fn parse_31d9(payload: &str) -> Result<Value, RamsesError> {
    let bytes = bytes_of("31D9", payload)?;
    if bytes.len() < 3 {
        return Err(RamsesError::InvalidPayload {
            code: "31D9".to_string(),
            reason: format!("expected at least 3 bytes, got {}", bytes.len()),
        });
    }
    Ok(Value::Record(rec(vec![
        ("fan_mode", json!(idx_str(bytes[0]))),
        ("fan_rate", json!(pct_of_c8("31D9", &bytes, 1)?)),
    ])))
}

pub fn parse_31da(payload: &str) -> Result<Value, RamsesError> {
    let bytes = bytes_of("31DA", payload)?;
    if bytes.len() < 4 {
        return Err(RamsesError::InvalidPayload {
            code: "31DA".to_string(),
            reason: format!("expected at least 4 bytes, got {}", bytes.len()),
        });
    }
    let co2_level = u16::from_be_bytes([bytes[1], bytes[2]]);
    Ok(Value::Record(rec(vec![
        ("fan_info", json!(idx_str(bytes[0]))),
        ("co2_level", json!(if co2_level == 0x7FFF { None } else { Some(co2_level) })),
        ("indoor_humidity", json!(pct_of_c8("31DA", &bytes, 3)?)),
    ])))
}

pub fn parse_3220(payload: &str) -> Result<Value, RamsesError> {
    let bytes = bytes_of("3220", payload)?;
    if bytes.len() < 4 {
        return Err(RamsesError::InvalidPayload {
            code: "3220".to_string(),
            reason: format!("expected at least 4 bytes, got {}", bytes.len()),
        });
    }
    Ok(Value::Record(rec(vec![
        ("msg_type", json!(idx_str(bytes[0]))),
        ("data_id", json!(idx_str(bytes[1]))),
        ("data_value", json!(hex_id("3220", &bytes, 2, 2)?)),
    ])))
}

pub fn parse_3b00(payload: &str) -> Result<Value, RamsesError> {
    let bytes = bytes_of("3B00", payload)?;
    if bytes.len() != 2 {
        return Err(RamsesError::InvalidPayload {
            code: "3B00".to_string(),
            reason: format!("expected exactly 2 bytes, got {}", bytes.len()),
        });
    }
    Ok(Value::Record(rec(vec![
        ("domain_id", json!(idx_str(bytes[0]))),
        ("actuator_on", json!(bytes[1] == 0xC8)),
    ])))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_params_array() {
        let v = parse_000a("000005140BB8010004B00C80", true).unwrap();
        match v {
            Value::List(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[0]["zone_idx"], "00");
                assert_eq!(records[0]["min_temp"], 13.0);
                assert_eq!(records[0]["max_temp"], 30.0);
            }
            _ => panic!("expected a list"),
        }
    }

    #[test]
    fn zone_params_single_record_is_tagged_record_not_list() {
        let v = parse_000a("000005140BB8", false).unwrap();
        match v {
            Value::Record(r) => assert_eq!(r["zone_idx"], "00"),
            _ => panic!("expected a record"),
        }
    }

    #[test]
    fn temperature_array() {
        let v = parse_30c9("0007D1017FFF", true).unwrap();
        match v {
            Value::List(records) => {
                assert_eq!(records[0]["temperature"], 20.01);
                assert!(records[1]["temperature"].is_null());
            }
            _ => panic!("expected a list"),
        }
    }

    #[test]
    fn temperature_single_record_is_tagged_record_not_list() {
        let v = parse_30c9("0007D1", false).unwrap();
        match v {
            Value::Record(r) => assert_eq!(r["temperature"], 20.01),
            _ => panic!("expected a record"),
        }
    }

    #[test]
    fn zone_devices_skips_empty_slots() {
        // Actuator 1: packed bytes 06 36 8E -> "01:145038"; slot 2 is empty.
        let v = parse_000c("000406368EFFFFFF").unwrap();
        match v {
            Value::Record(r) => {
                assert_eq!(r["zone_idx"], "00");
                assert_eq!(r["device_role"], "04");
                assert_eq!(r["actuators"], json!(["01:145038"]));
            }
            _ => panic!("expected a record"),
        }
    }

    #[test]
    fn domain_array_reports_state_and_flag() {
        let v = parse_0009("FC00FFF900FF", true).unwrap();
        match v {
            Value::List(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[0]["domain_id"], "FC");
                assert_eq!(records[0]["state"], 0);
                assert_eq!(records[0]["flag"], "FF");
                assert_eq!(records[1]["domain_id"], "F9");
            }
            _ => panic!("expected a list"),
        }
    }

    #[test]
    fn bind_offer_decodes_packed_device_id() {
        let v = parse_1fc9("002309063628").unwrap();
        match v {
            Value::List(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0]["code"], "2309");
                assert!(records[0]["dev_id"].as_str().unwrap().contains(':'));
            }
            _ => panic!("expected a list"),
        }
    }

    #[test]
    fn schedule_fragment_reports_zone_and_fragment_position() {
        let v = parse_0404("0023000800010103").unwrap();
        match v {
            Value::Record(r) => {
                assert_eq!(r["zone_idx"], "HW");
                assert_eq!(r["frag_total"], 8);
            }
            _ => panic!("expected a record"),
        }
    }

    #[test]
    fn rejects_misaligned_array() {
        assert!(parse_30c9("00010203", true).is_err());
    }
}
