//! The gateway: this process's view of the system, built up entirely by
//! watching traffic go by.

use crate::address::{Address, DeviceType};
use crate::config::GatewayConfig;
use crate::entities::{Device, Tcs};
use crate::error::RamsesError;
use crate::frame::Verb;
use crate::message::Message;
use crate::payloads::Value;
use std::collections::HashMap;

/// The eavesdropped state of one RAMSES-II system: every device seen,
/// every controller (and its zones/domains), and the config this process
/// is applying to incoming traffic.
pub struct Gateway {
    config: GatewayConfig,
    devices: HashMap<Address, Device>,
    systems: HashMap<Address, Tcs>,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Result<Gateway, RamsesError> {
        config.validate()?;
        Ok(Gateway { config, devices: HashMap::new(), systems: HashMap::new() })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    /// The device entry for `id`, if it has been seen.
    pub fn device(&self, id: &Address) -> Option<&Device> {
        self.devices.get(id)
    }

    pub fn systems(&self) -> impl Iterator<Item = &Tcs> {
        self.systems.values()
    }

    pub fn system(&self, ctl: &Address) -> Option<&Tcs> {
        self.systems.get(ctl)
    }

    /// True if `id` is allowed onto this gateway: always true unless
    /// `enforce_known_list` is set, in which case it must appear in
    /// `known_list`.
    pub fn is_allowed(&self, id: &Address) -> bool {
        !self.config.enforce_known_list || self.config.known_list.contains_key(id.id())
    }

    /// The device entry for `id`, creating it (and applying any
    /// known-list alias) the first time it's seen.
    pub fn device_mut(&mut self, id: &Address) -> &mut Device {
        self.devices.entry(id.clone()).or_insert_with(|| {
            let mut device = Device::new(id.clone());
            if let Some(known) = self.config.known_list.get(id.id()) {
                device.set_alias(known.alias.clone());
            }
            device
        })
    }

    /// Claim `id` as a controller, creating its [`Tcs`] entry the first
    /// time it's seen leading a system.
    pub fn claim_controller(&mut self, id: &Address) -> &mut Tcs {
        let max_zones = self.config.max_zones;
        self.systems.entry(id.clone()).or_insert_with(|| Tcs::new(id.clone(), max_zones))
    }

    /// Absorb one message (and its decoded payload) into the entity
    /// model: register the devices involved, resolve parent-controller
    /// claims, and claim a controller's [`Tcs`] when the message is
    /// controller traffic. Returns `false` (and does nothing else) if
    /// either endpoint is blocked by the known-list.
    ///
    /// Three rules take priority over the generic claim-or-orphan
    /// fallback: a `000C RP` unconditionally claims every actuator it
    /// lists under the replying controller; an `I`-verb `1F09`/`31D9`
    /// unconditionally claims its destination under its source.
    pub fn harvest(&mut self, msg: &Message, value: &Value) -> bool {
        let src = msg.frame.addrs.src.clone();
        let dst = msg.frame.addrs.dst.clone();

        if !self.is_allowed(&src) || (!dst.is_non() && !self.is_allowed(&dst)) {
            return false;
        }

        let code = msg.frame.code.as_str();
        let verb = msg.frame.verb;

        if code.eq_ignore_ascii_case("000C") && verb == Verb::Rp {
            self.device_mut(&src);
            if let Value::Record(r) = value {
                let zone_idx = r.get("zone_idx").and_then(|v| v.as_str()).map(str::to_string);
                if let Some(actuators) = r.get("actuators").and_then(|v| v.as_array()) {
                    for a in actuators.iter().filter_map(|v| v.as_str()) {
                        if let Ok(addr) = Address::parse(a) {
                            let dev = self.device_mut(&addr);
                            dev.controller = Some(src.clone());
                            if let Some(zidx) = &zone_idx {
                                dev.zone_idx = Some(zidx.clone());
                            }
                        }
                    }
                }
            }
        } else if (code.eq_ignore_ascii_case("1F09") || code.eq_ignore_ascii_case("31D9")) && verb == Verb::I {
            self.device_mut(&src);
            if !dst.is_non() && !dst.is_nul() {
                self.device_mut(&dst).controller = Some(src.clone());
            }
        } else if src.device_type().is_controller() {
            self.device_mut(&src);
            if !dst.is_non() && !dst.is_nul() && dst != src {
                self.device_mut(&dst).controller = Some(src.clone());
            }
        } else if !dst.is_non() && !dst.is_nul() && dst.device_type().is_controller() {
            self.device_mut(&dst);
            if src != dst {
                self.device_mut(&src).controller = Some(dst.clone());
            }
        } else {
            if !src.is_non() && !src.is_nul() {
                self.device_mut(&src);
            }
            if !dst.is_non() && !dst.is_nul() && dst != src {
                self.device_mut(&dst);
            }
        }

        if msg.has_controller() {
            let ctl = if src.device_type() == DeviceType::Ctl { &src } else { &dst };
            if ctl.device_type() == DeviceType::Ctl {
                self.claim_controller(ctl);
            }
        }

        true
    }
}
