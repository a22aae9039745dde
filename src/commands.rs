//! Command builders: construct an outbound [`Frame`] for the opcodes this
//! crate knows how to both parse and originate.
//!
//! Grounded on the ad-hoc `RQ`/`W` construction sprinkled through
//! `original_source/evohome/client.py` — there is no single builder
//! abstraction upstream, just call sites that assemble a payload by hand
//! for the command they need. This module gives that pattern one home,
//! covering the handful of opcodes (`000A`, `2309`, `2E04`, `0404`) a
//! caller is expected to actually originate, plus a bare-`RQ` helper for
//! the no-payload polls in [`crate::registry::RQ_NO_PAYLOAD`]. It is not
//! a builder per parseable opcode — most of this crate's ~17 parsed
//! codes are only ever received, never originated by this gateway.

use crate::address::{Address, AddressSet};
use crate::frame::{Frame, Verb};

fn addrs(ctl: &Address) -> AddressSet {
    AddressSet { addrs: [ctl.clone(), Address::non(), ctl.clone()], src: ctl.clone(), dst: ctl.clone() }
}

fn temp_bytes(temp: f32) -> [u8; 2] {
    ((temp * 100.0).round() as i16).to_be_bytes()
}

/// A bare `RQ` with no payload, for the codes where the request carries
/// none (see [`crate::registry::RQ_NO_PAYLOAD`]).
pub fn rq_bare(from: Address, to: Address, code: &str) -> Frame {
    Frame::from_parts(
        Verb::Rq,
        AddressSet { addrs: [from.clone(), to.clone(), Address::non()], src: from, dst: to },
        code.to_string(),
        String::new(),
    )
}

/// `RQ 000A`: ask a controller for one zone's parameters.
pub fn rq_zone_params(from: Address, ctl: Address, zone_idx: &str) -> Frame {
    Frame::from_parts(
        Verb::Rq,
        AddressSet { addrs: [from.clone(), ctl.clone(), Address::non()], src: from, dst: ctl },
        "000A".to_string(),
        format!("{zone_idx}00"),
    )
}

/// `W 2309`: set one zone's setpoint.
pub fn w_setpoint(ctl: Address, zone_idx: &str, setpoint: f32) -> Frame {
    let t = temp_bytes(setpoint);
    Frame::from_parts(Verb::W, addrs(&ctl), "2309".to_string(), format!("{zone_idx}{:02X}{:02X}", t[0], t[1]))
}

/// `W 000A`: set one zone's min/max setpoint bounds.
pub fn w_zone_params(ctl: Address, zone_idx: &str, min_temp: f32, max_temp: f32) -> Frame {
    let lo = temp_bytes(min_temp);
    let hi = temp_bytes(max_temp);
    Frame::from_parts(
        Verb::W,
        addrs(&ctl),
        "000A".to_string(),
        format!("{zone_idx}00{:02X}{:02X}{:02X}{:02X}", lo[0], lo[1], hi[0], hi[1]),
    )
}

/// `W 2E04`: set the system mode, with an optional "until" timestamp
/// (raw 6-byte date payload, protocol-encoded by the caller).
pub fn w_system_mode(ctl: Address, mode: u8, until: Option<[u8; 6]>) -> Frame {
    let mut payload = format!("{mode:02X}");
    match until {
        Some(bytes) => payload.push_str(&hex::encode_upper(bytes)),
        None => payload.push_str(&"FF".repeat(6)),
    }
    Frame::from_parts(Verb::W, addrs(&ctl), "2E04".to_string(), payload)
}

/// `RQ 0404`: ask for one fragment of a zone's schedule.
pub fn rq_schedule_fragment(from: Address, ctl: Address, zone_idx: &str, frag_idx: u8, total_frags: u8) -> Frame {
    Frame::from_parts(
        Verb::Rq,
        AddressSet { addrs: [from.clone(), ctl.clone(), Address::non()], src: from, dst: ctl },
        "0404".to_string(),
        format!("{zone_idx}20000{frag_idx:02X}{total_frags:02X}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setpoint_round_trips_through_the_parser() {
        let ctl = Address::parse("01:145038").unwrap();
        let frame = w_setpoint(ctl, "00", 21.5);
        // A `W` can never carry an array per spec.md §4.3's verb rule.
        let decoded = crate::payloads::parse(&frame.code, &frame.payload, false).unwrap();
        match decoded {
            crate::payloads::Value::Record(r) => {
                assert_eq!(r["setpoint"], 21.5);
                assert_eq!(r["zone_idx"], "00");
            }
            _ => panic!("expected a record"),
        }
    }

    #[test]
    fn zone_params_round_trips_through_the_parser() {
        let ctl = Address::parse("01:145038").unwrap();
        let frame = w_zone_params(ctl, "00", 5.0, 30.0);
        let decoded = crate::payloads::parse(&frame.code, &frame.payload, false).unwrap();
        match decoded {
            crate::payloads::Value::Record(r) => {
                assert_eq!(r["min_temp"], 5.0);
                assert_eq!(r["max_temp"], 30.0);
            }
            _ => panic!("expected a record"),
        }
    }

    #[test]
    fn system_mode_round_trips_through_the_parser() {
        let ctl = Address::parse("01:145038").unwrap();
        let frame = w_system_mode(ctl, 0x04, None);
        let decoded = crate::payloads::parse(&frame.code, &frame.payload, false).unwrap();
        match decoded {
            crate::payloads::Value::Record(r) => {
                assert_eq!(r["system_mode"], "04");
                assert!(r["until"].is_null());
            }
            _ => panic!("expected a record"),
        }
    }

    #[test]
    fn rq_bare_has_no_payload() {
        let frame = rq_bare(Address::parse("18:013393").unwrap(), Address::parse("10:050360").unwrap(), "10E0");
        assert!(frame.is_empty_payload());
        assert_eq!(frame.verb, Verb::Rq);
    }
}
