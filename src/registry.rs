//! The opcode registry: static per-code metadata used to validate and
//! interpret a frame once its grammar is known to be sound.
//!
//! Grounded on spec.md §2/§4.3 and on the ad-hoc code tables scattered
//! through `original_source/ramses_rf/protocol/const.py` and
//! `command.py`, collapsed here into one table per spec.md's model.

use crate::frame::Verb;

/// Static metadata for one 4-hex opcode.
#[derive(Debug, Clone, Copy)]
pub struct CodeInfo {
    pub code: &'static str,
    pub name: &'static str,
    /// Verbs this code is legitimately seen carrying.
    pub verbs: &'static [Verb],
    /// For codes that may carry a repeated-record array: the width in
    /// bytes of one record. `None` for codes that never do.
    pub array_unit: Option<u8>,
    /// True if this code is only ever sent by/accepted from a controller.
    pub controller_only: bool,
}

impl CodeInfo {
    /// True if this code is ever seen as an array (regardless of the
    /// length of any one particular frame).
    pub fn has_array(&self) -> bool {
        self.array_unit.is_some()
    }
}

macro_rules! code {
    ($code:literal, $name:literal, [$($verb:expr),+ $(,)?], $array:expr, $ctl_only:literal) => {
        CodeInfo {
            code: $code,
            name: $name,
            verbs: &[$($verb),+],
            array_unit: $array,
            controller_only: $ctl_only,
        }
    };
}

use Verb::{I, Rp, Rq, W};

/// The full static registry, ordered by code for readability.
pub static CODES: &[CodeInfo] = &[
    code!("0001", "rf_unknown", [W, Rp], None, false),
    code!("0005", "zone_types", [I, Rp, Rq], None, false),
    code!("0009", "zone_actuator_check", [I, Rp], Some(3), true),
    code!("000A", "zone_params", [I, Rp, Rq, W], Some(6), true),
    code!("000C", "zone_devices", [Rp, Rq], None, false),
    code!("0016", "rf_check", [Rq, Rp], None, false),
    code!("0404", "zone_schedule_fragment", [Rq, W, Rp], None, false),
    code!("0418", "system_fault_log", [I, Rq, Rp], None, false),
    code!("10E0", "device_info", [I, Rp, Rq], None, false),
    code!("1100", "tpi_params", [I, Rp, Rq, W], None, true),
    code!("1F09", "system_sync", [I, Rp, W], None, true),
    code!("1FC9", "rf_bind", [I, Rp, W], Some(6), false),
    code!("2249", "setpoint_now_next", [I], Some(7), false),
    code!("22C9", "ufh_setpoint", [I], Some(6), false),
    code!("2309", "setpoint", [I, Rp], Some(3), true),
    code!("2E04", "system_mode", [I, Rp, W], None, true),
    code!("30C9", "temperature", [I, Rp], Some(3), true),
    code!("31D9", "fan_state", [I, Rp], None, true),
    code!("31DA", "fan_state_extended", [I, Rp], None, true),
    code!("3150", "heat_demand", [I], Some(2), false),
    code!("3220", "opentherm_msg", [Rq, Rp, W], None, false),
    code!("3B00", "actuator_sync", [I], None, true),
    code!("3EF0", "actuator_state", [I, Rp, Rq], None, false),
    code!("3EF1", "actuator_state_poll", [Rq, Rp], None, false),
];

/// Look up the static entry for a code, if this crate knows about it.
pub fn lookup(code: &str) -> Option<&'static CodeInfo> {
    CODES.iter().find(|c| c.code.eq_ignore_ascii_case(code))
}

/// Codes for which an `RQ` carries no payload of its own (the request is
/// a bare poll; the content lives entirely in the `RP`).
pub const RQ_NO_PAYLOAD: &[&str] = &["0016", "10E0", "1FC9", "3EF0", "3EF1"];

/// True if `verb` is an `RQ` that, for `code`, is expected to carry no
/// payload.
pub fn is_rq_no_payload(code: &str, verb: Verb) -> bool {
    verb == Verb::Rq && RQ_NO_PAYLOAD.iter().any(|c| c.eq_ignore_ascii_case(code))
}

/// True if this frame is controller-only traffic: either the code is
/// unconditionally controller-only, or (for `3B00`) the payload's leading
/// domain-id byte is `FC`.
pub fn is_controller_only(code: &str, payload: &str) -> bool {
    match lookup(code) {
        Some(info) if info.controller_only && code.eq_ignore_ascii_case("3B00") => {
            payload.get(0..2).is_some_and(|b| b.eq_ignore_ascii_case("FC"))
        }
        Some(info) => info.controller_only,
        None => false,
    }
}

/// `22C9`/`3150` are seen as arrays only when sourced from a UFH
/// controller talking to itself — the one case the upstream
/// implementation special-cases rather than widening the length rule.
pub fn is_ufh_array_exception(code: &str) -> bool {
    code.eq_ignore_ascii_case("22C9") || code.eq_ignore_ascii_case("3150")
}
