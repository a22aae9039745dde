//! Payload interpretation: turn a frame's raw hex payload into a tagged,
//! structured value once its opcode is known.
//!
//! Grounded on the teacher's per-message-type dispatch in `pd.rs` and the
//! array-of-records handling in `adcqueue.rs`, generalised to the closed
//! set of RAMSES-II payload shapes named in spec.md §4.3.

mod codes;
mod decode;

use crate::error::RamsesError;
use std::collections::BTreeMap;

/// One decoded record: field name to JSON-ish value.
pub type Record = BTreeMap<String, serde_json::Value>;

/// The result of interpreting a payload. Never an untagged union: callers
/// always know up front, from [`crate::registry::CodeInfo::has_array`],
/// whether to expect [`Value::List`] or [`Value::Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A single structured record.
    Record(Record),
    /// A repeated-record array.
    List(Vec<Record>),
    /// The opcode has no dedicated parser, or an array entry failed to
    /// decode on its own: the hex payload, unchanged.
    Raw(String),
}

/// Interpret `payload` (uppercase hex, no separators) for `code`, given
/// `has_array` — the message context a caller has already derived via
/// [`crate::message::Message::has_array`] — which tells the handful of
/// array-capable codes whether to tag their result `Record` or `List`.
///
/// Unknown opcodes return `Value::Raw` rather than an error: an
/// unrecognised code is routine on this protocol, not a fault.
pub fn parse(code: &str, payload: &str, has_array: bool) -> Result<Value, RamsesError> {
    let code = code.to_uppercase();
    match code.as_str() {
        "0009" => codes::parse_0009(payload, has_array),
        "000A" => codes::parse_000a(payload, has_array),
        "000C" => codes::parse_000c(payload),
        "0404" => codes::parse_0404(payload),
        "1100" => codes::parse_1100(payload),
        "1F09" => codes::parse_1f09(payload),
        "1FC9" => codes::parse_1fc9(payload),
        "2249" => codes::parse_2249(payload, has_array),
        "22C9" => codes::parse_22c9(payload, has_array),
        "2309" => codes::parse_2309(payload, has_array),
        "2E04" => codes::parse_2e04(payload),
        "30C9" => codes::parse_30c9(payload, has_array),
        "3150" => codes::parse_3150(payload, has_array),
        "31D9" => codes::parse_31d9(payload),
        "31DA" => codes::parse_31da(payload),
        "3220" => codes::parse_3220(payload),
        "3B00" => codes::parse_3b00(payload),
        _ => Ok(Value::Raw(payload.to_string())),
    }
}
