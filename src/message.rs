//! A [`Message`]: a structurally-valid [`Frame`] enriched with the lazy,
//! memoised derived fields used to route and interpret it.
//!
//! Grounded on the `Frame` properties (`_has_array`, `_has_ctl`,
//! `_has_payload`, `_idx`, `_ctx`, `_hdr`) in
//! `original_source/ramses_rf/protocol/frame.py`.

use crate::address::DeviceType;
use crate::frame::{Frame, Verb};
use crate::header;
use crate::registry;
use chrono::{DateTime, Utc};
use std::cell::{Cell, RefCell};

/// The payload's index: absent, an array (no single index), or a 2-or-more
/// character index string (a zone/domain/log index).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Idx {
    Absent,
    Array,
    Value(String),
}

impl Idx {
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Idx::Value(s) => Some(s),
            _ => None,
        }
    }
}

/// Codes whose index can never be determined from the payload alone.
const CODE_IDX_NONE: &[&str] = &["0001", "0016", "10E0", "1F09", "3EF0", "3EF1"];
/// Codes that may legitimately carry a domain id (`F8`..`FC`) as index.
const CODE_IDX_DOMAIN: &[&str] = &["0009", "1100", "3150", "3B00"];
/// Codes only ever emitted by/accepted from a controller, beyond what
/// [`registry::CodeInfo::controller_only`] already encodes.
const CODES_ONLY_FROM_CTL_EXTRA: &[&str] = &["31D9", "31DA"];

/// A parsed frame with memoised derived attributes, the unit this crate
/// routes, stores and timestamps.
pub struct Message {
    pub frame: Frame,
    pub timestamp: DateTime<Utc>,
    has_array: Cell<Option<bool>>,
    has_controller: Cell<Option<bool>>,
    has_payload: Cell<Option<bool>>,
    idx: RefCell<Option<Idx>>,
    ctx: RefCell<Option<Idx>>,
    hdr: RefCell<Option<Option<String>>>,
}

impl Message {
    pub fn new(frame: Frame, timestamp: DateTime<Utc>) -> Message {
        Message {
            frame,
            timestamp,
            has_array: Cell::new(None),
            has_controller: Cell::new(None),
            has_payload: Cell::new(None),
            idx: RefCell::new(None),
            ctx: RefCell::new(None),
            hdr: RefCell::new(None),
        }
    }

    /// True if the payload is (probably) a repeated-record array.
    ///
    /// `0009`, `000A`, and the UFH-addressing-itself case of `22C9`/`3150`
    /// follow the verbatim per-opcode rules below rather than a length
    /// check. Every other array-capable code falls back to a record-width
    /// modulus, which may return a false negative for an array of length
    /// 1: the same compromise the upstream implementation makes, rather
    /// than requiring every code to publish a richer exception list.
    pub fn has_array(&self) -> bool {
        if let Some(v) = self.has_array.get() {
            return v;
        }
        let code = self.frame.code.as_str();
        let src_ty = self.frame.addrs.src.device_type();
        let same_src_dst = self.frame.addrs.dst == self.frame.addrs.src;

        let result = if code == "1FC9" {
            self.frame.verb != Verb::Rq
        } else if self.frame.verb != Verb::I {
            false
        } else if code == "0009" {
            self.frame.payload.starts_with('F') && src_ty.is_controller()
        } else if code == "000A" {
            same_src_dst && src_ty.is_controller()
        } else if registry::is_ufh_array_exception(code) {
            src_ty == DeviceType::Ufc && same_src_dst && !self.frame.payload.starts_with('F')
        } else {
            match registry::lookup(code).and_then(|c| c.array_unit) {
                None => false,
                Some(unit) => {
                    let len = self.frame.declared_len as usize;
                    let unit = unit as usize;
                    len != unit && unit != 0 && len % unit == 0
                }
            }
        };
        self.has_array.set(Some(result));
        result
    }

    /// Force this message to be treated as an array, invalidating the
    /// `idx`/`ctx`/`hdr` caches that depended on the prior determination.
    pub fn force_has_array(&self) {
        self.has_array.set(Some(true));
        *self.ctx.borrow_mut() = None;
        *self.hdr.borrow_mut() = None;
        *self.idx.borrow_mut() = None;
    }

    /// True if this message is to/from a controller (TCS, UFC, or a
    /// programmer unit).
    pub fn has_controller(&self) -> bool {
        if let Some(v) = self.has_controller.get() {
            return v;
        }
        let src_ty = self.frame.addrs.src.device_type();
        let dst_ty = self.frame.addrs.dst.device_type();
        let code = self.frame.code.as_str();

        let result = if src_ty.is_controller() || dst_ty.is_controller() {
            true
        } else if self.frame.addrs.dst == self.frame.addrs.src {
            registry::is_controller_only(code, &self.frame.payload) || CODES_ONLY_FROM_CTL_EXTRA.contains(&code)
        } else if self.frame.addrs.dst.is_non() {
            src_ty != DeviceType::Otb
        } else {
            matches!(dst_ty, DeviceType::Dts | DeviceType::Dt2)
        };

        self.has_controller.set(Some(result));
        result
    }

    /// True if this message carries a non-trivial payload.
    pub fn has_payload(&self) -> bool {
        if let Some(v) = self.has_payload.get() {
            return v;
        }
        let code = self.frame.code.as_str();
        let rq_no_payload = self.frame.verb == Verb::Rq && registry::is_rq_no_payload(code, Verb::Rq);
        let rq_short_unknown = self.frame.verb == Verb::Rq && self.frame.declared_len == 2 && code != "0016";
        let result = !(self.frame.declared_len == 1 || rq_no_payload || rq_short_unknown);
        self.has_payload.set(Some(result));
        result
    }

    /// The payload's routing index (zone/domain/log index), if any.
    pub fn idx(&self) -> Idx {
        if let Some(v) = self.idx.borrow().as_ref() {
            return v.clone();
        }
        let v = self.compute_idx();
        *self.idx.borrow_mut() = Some(v.clone());
        v
    }

    fn compute_idx(&self) -> Idx {
        let code = self.frame.code.as_str();
        let payload = self.frame.payload.as_str();

        if code == "0005" {
            return if self.has_array() { Idx::Array } else { Idx::Absent };
        }
        if code == "0009" && self.frame.addrs.src.device_type() == DeviceType::Otb {
            return Idx::Absent;
        }
        if code == "000C" {
            return idx_000c(payload);
        }
        if code == "0404" {
            return if payload.get(2..4) == Some("23") {
                Idx::Value("HW".to_string())
            } else {
                slice_idx(payload, 0, 2)
            };
        }
        if code == "0418" {
            return slice_idx(payload, 4, 6);
        }
        if code == "1100" {
            return if payload.starts_with('F') { slice_idx(payload, 0, 2) } else { Idx::Absent };
        }
        if code == "3220" {
            return slice_idx(payload, 4, 6);
        }

        if CODE_IDX_NONE.contains(&code) {
            return Idx::Absent;
        }
        if self.has_array() {
            return Idx::Array;
        }
        if let Some(prefix) = payload.get(0..2) {
            if crate::constants::DOMAIN_IDS.contains(&prefix) {
                return if CODE_IDX_DOMAIN.contains(&code) {
                    Idx::Value(prefix.to_string())
                } else {
                    tracing::warn!(code, idx = prefix, "domain-like idx on a non-domain code");
                    Idx::Absent
                };
            }
        }
        if self.has_controller() {
            return slice_idx(payload, 0, 2);
        }
        if payload.get(0..2).is_some_and(|p| p != "00") {
            tracing::warn!(code, "non-zero idx on a code expecting none");
            return Idx::Absent;
        }
        tracing::info!(code, "unable to determine payload index");
        Idx::Absent
    }

    /// The payload's full context (a superset of `idx`, e.g. zone_idx plus
    /// fragment index for `0404`).
    pub fn ctx(&self) -> Idx {
        if let Some(v) = self.ctx.borrow().as_ref() {
            return v.clone();
        }
        let code = self.frame.code.as_str();
        let v = if code == "0005" || code == "000C" {
            self.frame.payload.get(0..4).map(|s| Idx::Value(s.to_string())).unwrap_or(Idx::Absent)
        } else if code == "0404" {
            match (self.idx(), self.frame.payload.get(10..12)) {
                (Idx::Value(idx), Some(frag)) => Idx::Value(format!("{idx}{frag}")),
                (other, _) => other,
            }
        } else {
            self.idx()
        };
        *self.ctx.borrow_mut() = Some(v.clone());
        v
    }

    /// This message's QoS header.
    pub fn hdr(&self) -> Option<String> {
        if let Some(v) = self.hdr.borrow().as_ref() {
            return v.clone();
        }
        let ctx = self.ctx();
        let v = header::pkt_header(&self.frame, ctx.as_value(), false);
        *self.hdr.borrow_mut() = Some(v.clone());
        v
    }

    /// The header of the response this message expects, if any.
    pub fn rx_header(&self) -> Option<String> {
        header::pkt_header(&self.frame, self.ctx().as_value(), true)
    }
}

fn slice_idx(payload: &str, from: usize, to: usize) -> Idx {
    payload.get(from..to).map(|s| Idx::Value(s.to_string())).unwrap_or(Idx::Absent)
}

fn idx_000c(payload: &str) -> Idx {
    use crate::constants::{dev_role, DOMAIN_F9, DOMAIN_FA, DOMAIN_FC};
    if payload.get(2..4) == Some(dev_role::APP) {
        return Idx::Value(DOMAIN_FC.to_string());
    }
    if payload.get(0..4) == Some(&format!("01{}", dev_role::HTG)) {
        return Idx::Value(DOMAIN_F9.to_string());
    }
    if matches!(payload.get(2..4), Some(r) if r == dev_role::DHW || r == dev_role::HTG) {
        return Idx::Value(DOMAIN_FA.to_string());
    }
    slice_idx(payload, 0, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn msg(line: &str) -> Message {
        Message::new(Frame::parse(line).unwrap(), Utc.timestamp_opt(0, 0).unwrap())
    }

    #[test]
    fn array_detection_for_1fc9() {
        let m = msg("I --- 34:021943 --:------ 34:021943 1FC9 006 002309896853");
        assert!(m.has_array());
    }

    #[test]
    fn array_detection_respects_verb_and_registry() {
        let m = msg("RQ --- 01:145038 18:013393 --:------ 000A 001 00");
        assert!(!m.has_array());
    }

    #[test]
    fn zone_idx_via_simple_dispatch() {
        let m = msg("I --- 01:145038 --:------ 01:145038 2309 003 00076C");
        assert_eq!(m.idx(), Idx::Value("00".to_string()));
    }

    #[test]
    fn domain_idx_on_0009_from_otb_is_absent() {
        let m = msg("I --- 10:040239 01:223036 --:------ 0009 003 000000");
        assert_eq!(m.idx(), Idx::Absent);
    }

    #[test]
    fn force_has_array_invalidates_caches() {
        let m = msg("I --- 01:145038 --:------ 01:145038 2309 003 00076C");
        let _ = m.idx();
        m.force_has_array();
        assert!(m.has_array());
        assert_eq!(m.idx(), Idx::Array);
    }

    #[test]
    fn hdr_round_trips_through_ctx() {
        let m = msg("I --- 01:145038 --:------ 01:145038 2309 003 00076C");
        assert_eq!(m.hdr().unwrap(), "2309| I|01:145038|00");
    }

    #[test]
    fn array_detection_0009_requires_f_prefix_and_controller_source() {
        let m = msg("I --- 01:145038 --:------ 01:145038 0009 006 FC00FFF900FF");
        assert!(m.has_array());
    }

    #[test]
    fn array_detection_0009_rejects_non_f_prefix_even_multi_record() {
        let m = msg("I --- 01:145038 --:------ 01:145038 0009 006 000000F9FF00");
        assert!(!m.has_array());
    }

    #[test]
    fn array_detection_000a_rejects_non_controller_source() {
        // Two 000A records from a non-controller device: the generic
        // modulus check alone would (wrongly) call this an array.
        let m = msg("I --- 04:111111 --:------ 04:111111 000A 012 000005140BB8010004B00C80");
        assert!(!m.has_array());
    }

    #[test]
    fn array_detection_000a_requires_src_eq_dst() {
        let m = msg("I --- 01:145038 18:013393 --:------ 000A 006 000005140BB8");
        assert!(!m.has_array());
    }
}
