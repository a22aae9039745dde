//! The message processor: the pipeline a received line runs through,
//! from raw text to an entity-model update.
//!
//! Grounded on `_create_entities`/`_update_entities` in
//! `original_source/evohome/message.py`: harvest the participants,
//! interpret the payload, then fold anything routable into the zone/
//! system it belongs to. Structural and payload faults are logged and
//! dropped here rather than propagated, per the receive-path policy
//! documented on [`crate::error::RamsesError`].

use crate::address::Address;
use crate::constants::{REDUCE_PROCESSING_SUPPRESS, ZONE_IDX_HW};
use crate::frame::Frame;
use crate::gateway::Gateway;
use crate::message::Message;
use crate::payloads::{self, Value};
use crate::registry;
use chrono::{DateTime, Utc};

/// Codes whose array form is a periodic sync cycle: every element gets
/// its own Zone, and the first one seen seeds a TCS's inferred zone
/// count.
const PERIODIC_SYNC_CODES: &[&str] = &["000A", "2309", "30C9"];

/// One message, fully processed: its frame/derived attributes and its
/// decoded payload.
pub struct Processed {
    pub message: Message,
    pub value: Value,
}

/// Drives frames through harvesting and entity update against one
/// [`Gateway`].
pub struct Processor<'g> {
    gateway: &'g mut Gateway,
}

impl<'g> Processor<'g> {
    pub fn new(gateway: &'g mut Gateway) -> Processor<'g> {
        Processor { gateway }
    }

    /// Process one wire line. Returns `None` if the line failed to parse
    /// or was rejected by the known-list — both are logged, not errors
    /// the caller needs to handle.
    pub fn process_line(&mut self, line: &str, timestamp: DateTime<Utc>) -> Option<Processed> {
        let frame = match Frame::parse(line) {
            Ok(f) => f,
            Err(e) => {
                tracing::debug!(error = %e, line, "dropping unparseable frame");
                return None;
            }
        };
        self.process_frame(frame, timestamp)
    }

    /// Process an already-validated frame.
    pub fn process_frame(&mut self, frame: Frame, timestamp: DateTime<Utc>) -> Option<Processed> {
        let message = Message::new(frame, timestamp);

        if registry::lookup(&message.frame.code).is_none() {
            tracing::info!(code = message.frame.code.as_str(), "unknown opcode, routing generically");
        }

        let value = match payloads::parse(&message.frame.code, &message.frame.payload, message.has_array()) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, code = message.frame.code.as_str(), "payload parse failed, keeping raw");
                Value::Raw(message.frame.payload.clone())
            }
        };

        if !self.gateway.harvest(&message, &value) {
            tracing::debug!(
                src = message.frame.addrs.src.id(),
                dst = message.frame.addrs.dst.id(),
                "dropping frame blocked by known-list"
            );
            return None;
        }

        self.update_entities(&message, &value);

        Some(Processed { message, value })
    }

    /// Steps 2–4 of the message processor: create entities the payload
    /// implies, deliver the message to the devices/zones it addresses,
    /// and infer what eavesdropping can about the owning TCS. A no-op
    /// when `reduce_processing` is maxed out.
    fn update_entities(&mut self, message: &Message, value: &Value) {
        if self.gateway.config().reduce_processing >= REDUCE_PROCESSING_SUPPRESS {
            return;
        }

        let code = message.frame.code.to_uppercase();
        let src = message.frame.addrs.src.clone();
        let owner = owning_tcs(self.gateway, &src);

        // 2. Create entities from payloads.
        match value {
            Value::Record(r) => {
                if let (Some(owner), Some(zone_idx)) = (&owner, zone_idx_of(r)) {
                    self.gateway.claim_controller(owner).entry(&zone_idx);
                }
            }
            Value::List(records) if PERIODIC_SYNC_CODES.contains(&code.as_str()) => {
                if let Some(owner) = &owner {
                    for r in records {
                        if let Some(zone_idx) = zone_idx_of(r) {
                            self.gateway.claim_controller(owner).entry(&zone_idx);
                        }
                    }
                }
            }
            _ => {}
        }

        // 3. Update entities: deliver to the source device unconditionally.
        let verb = message.frame.verb.wire();
        let ctx = message.ctx().as_value().unwrap_or_default().to_string();
        self.gateway.device_mut(&src).record_message(&code, verb, &ctx, value.clone());

        // A record with a zone_idx also goes to that Zone, provided it was
        // created in step 2 above; lists addressed to the TCS itself stay
        // with the TCS (not re-distributed per-zone).
        if let (Value::Record(r), Some(owner)) = (value, &owner) {
            if let Some(zone_idx) = zone_idx_of(r) {
                let tcs = self.gateway.claim_controller(owner);
                let zone = tcs.entry(&zone_idx);
                zone.record_sample(&code, value.clone());
                if code == "000C" {
                    if let Some(actuators) = r.get("actuators").and_then(|v| v.as_array()) {
                        for d in actuators.iter().filter_map(|v| v.as_str()) {
                            zone.add_device(d);
                        }
                    }
                }
                if zone_idx == ZONE_IDX_HW {
                    zone.name.get_or_insert_with(|| "Hot Water".to_string());
                }
            }
        }

        // 4. Eavesdropping updates: infer zone count from the first
        // periodic-sync array seen for a TCS that doesn't have one yet.
        if matches!(value, Value::List(_)) && (code == "2309" || code == "30C9") {
            if let Some(ctl) = controller_of(message).cloned() {
                let tcs = self.gateway.claim_controller(&ctl);
                if tcs.zone_count.is_none() {
                    tcs.zone_count = Some(message.frame.payload.len() / 6);
                }
            }
        }
    }
}

fn zone_idx_of(record: &crate::payloads::Record) -> Option<String> {
    record.get("zone_idx").and_then(|v| v.as_str()).map(str::to_string)
}

/// The TCS that owns `addr`: itself, if it is a controller, otherwise
/// whatever parent controller harvesting has already claimed for it.
fn owning_tcs(gateway: &Gateway, addr: &Address) -> Option<Address> {
    if addr.device_type().is_controller() {
        return Some(addr.clone());
    }
    gateway.device(addr).and_then(|d| d.controller.clone())
}

/// The controller address a message's traffic belongs to: whichever of
/// `src`/`dst` is actually the controller type.
fn controller_of(message: &Message) -> Option<&Address> {
    let src = &message.frame.addrs.src;
    let dst = &message.frame.addrs.dst;
    if src.device_type() == crate::address::DeviceType::Ctl {
        Some(src)
    } else if dst.device_type() == crate::address::DeviceType::Ctl {
        Some(dst)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GatewayConfig;

    #[test]
    fn unknown_opcode_still_routes() {
        let mut gw = Gateway::new(GatewayConfig::default()).unwrap();
        let mut proc = Processor::new(&mut gw);
        let out = proc
            .process_line("I --- 01:145038 --:------ 01:145038 FFFF 002 0000", Utc::now())
            .unwrap();
        assert_eq!(out.value, Value::Raw("0000".to_string()));
    }

    #[test]
    fn zone_params_update_tcs_zone_state() {
        let mut gw = Gateway::new(GatewayConfig::default()).unwrap();
        let mut proc = Processor::new(&mut gw);
        proc.process_line("I --- 01:145038 --:------ 01:145038 2309 003 00076C", Utc::now());
        assert!(gw.system(&Address::parse("01:145038").unwrap()).unwrap().zones.contains_key("00"));
    }

    #[test]
    fn invalid_line_is_dropped_not_propagated() {
        let mut gw = Gateway::new(GatewayConfig::default()).unwrap();
        let mut proc = Processor::new(&mut gw);
        assert!(proc.process_line("not a frame", Utc::now()).is_none());
    }

    #[test]
    fn zone_actuators_harvest_as_colon_addresses() {
        let mut gw = Gateway::new(GatewayConfig::default()).unwrap();
        let mut proc = Processor::new(&mut gw);
        proc.process_line(
            "RP --- 01:145038 18:013393 --:------ 000C 008 000406368EFFFFFF",
            Utc::now(),
        );
        let tcs = gw.system(&Address::parse("01:145038").unwrap()).unwrap();
        let zone = tcs.zones.get("00").unwrap();
        assert_eq!(zone.devices, vec!["01:145038".to_string()]);
    }

    #[test]
    fn periodic_sync_array_creates_a_zone_per_element_but_no_per_zone_sample() {
        let mut gw = Gateway::new(GatewayConfig::default()).unwrap();
        let mut proc = Processor::new(&mut gw);
        proc.process_line("I --- 01:145038 --:------ 01:145038 2309 006 00076C01076C", Utc::now());
        let tcs = gw.system(&Address::parse("01:145038").unwrap()).unwrap();
        assert!(tcs.zones.contains_key("00"));
        assert!(tcs.zones.contains_key("01"));
        assert!(tcs.zones["00"].samples.get("2309").is_none());
    }

    #[test]
    fn periodic_sync_array_infers_zone_count_once() {
        let mut gw = Gateway::new(GatewayConfig::default()).unwrap();
        let mut proc = Processor::new(&mut gw);
        proc.process_line("I --- 01:145038 --:------ 01:145038 2309 006 00076C01076C", Utc::now());
        let tcs = gw.system(&Address::parse("01:145038").unwrap()).unwrap();
        assert_eq!(tcs.zone_count, Some(2));
    }

    #[test]
    fn single_record_delivers_to_both_device_and_zone() {
        let mut gw = Gateway::new(GatewayConfig::default()).unwrap();
        let mut proc = Processor::new(&mut gw);
        proc.process_line("I --- 01:145038 --:------ 01:145038 2309 003 00076C", Utc::now());
        let tcs = gw.system(&Address::parse("01:145038").unwrap()).unwrap();
        assert!(tcs.zones["00"].samples.contains_key("2309"));
        let device = gw.devices().find(|d| d.id.id() == "01:145038").unwrap();
        assert!(device.message("2309", " I", "00").is_some());
    }

    #[test]
    fn reduce_processing_at_max_suppresses_entity_updates() {
        let mut cfg = GatewayConfig::default();
        cfg.reduce_processing = 3;
        let mut gw = Gateway::new(cfg).unwrap();
        let mut proc = Processor::new(&mut gw);
        proc.process_line("I --- 01:145038 --:------ 01:145038 2309 003 00076C", Utc::now());
        // harvesting (rule 1) still runs and claims the controller; only
        // the zone/device folding from update_entities is suppressed.
        let tcs = gw.system(&Address::parse("01:145038").unwrap()).unwrap();
        assert!(!tcs.zones.contains_key("00"));
    }
}
