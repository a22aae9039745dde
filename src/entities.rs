//! The entity model: devices, zones and systems, as inferred purely from
//! observed traffic rather than from any configuration the gateway is
//! handed up front.
//!
//! Grounded on the entity shape implied by `_create_entities`/
//! `_update_entities` in `original_source/evohome/message.py` — a
//! controller (TCS) owning zones, zones owning devices, with a
//! `display_name()` convention for friendly rendering.

use crate::address::{Address, DeviceType};
use crate::payloads::Value;
use std::collections::BTreeMap;

/// A single observed device.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: Address,
    pub device_type: DeviceType,
    alias: Option<String>,
    /// The controller that has claimed this device, if any. A weak
    /// lookup, not ownership: if that controller's entry is ever removed
    /// this device is simply orphaned, not freed.
    pub controller: Option<Address>,
    /// Zone index inferred from a `000C` actuator-list reply naming this
    /// device, if any.
    pub zone_idx: Option<String>,
    /// Per-opcode message cache, keyed by `(verb, ctx)` within each code.
    messages: BTreeMap<String, BTreeMap<(String, String), Value>>,
}

impl Device {
    pub fn new(id: Address) -> Device {
        let device_type = id.device_type();
        Device { id, device_type, alias: None, controller: None, zone_idx: None, messages: BTreeMap::new() }
    }

    pub fn set_alias(&mut self, alias: Option<String>) {
        self.alias = alias;
    }

    /// The friendly name to render this device as: its alias when one is
    /// configured and aliasing is enabled, otherwise its bare id.
    pub fn display_name(&self, use_aliases: bool) -> String {
        if use_aliases {
            if let Some(alias) = &self.alias {
                return alias.clone();
            }
        }
        self.id.id().to_string()
    }

    /// Record the most recently decoded value seen from this device for
    /// `code`/`verb`/`ctx`.
    pub fn record_message(&mut self, code: &str, verb: &str, ctx: &str, value: Value) {
        self.messages.entry(code.to_string()).or_default().insert((verb.to_string(), ctx.to_string()), value);
    }

    /// The most recently recorded value for `code`/`verb`/`ctx`, if any.
    pub fn message(&self, code: &str, verb: &str, ctx: &str) -> Option<&Value> {
        self.messages.get(code)?.get(&(verb.to_string(), ctx.to_string()))
    }
}

/// A zone under a [`Tcs`]: a name, a type (inferred from `0005`), the set
/// of devices harvested into it via `000C`, and its most recent decoded
/// sample for each opcode that addresses it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Zone {
    pub zone_type: Option<String>,
    pub name: Option<String>,
    pub devices: Vec<String>,
    pub samples: BTreeMap<String, Value>,
}

impl Zone {
    pub fn add_device(&mut self, device: impl Into<String>) {
        let device = device.into();
        if !self.devices.contains(&device) {
            self.devices.push(device);
        }
    }

    /// Record `value` as this zone's most recent sample for `code`.
    pub fn record_sample(&mut self, code: &str, value: Value) {
        self.samples.insert(code.to_string(), value);
    }
}

/// A controller (TCS) and the zones/domains harvested for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Tcs {
    pub ctl: Address,
    pub max_zones: u8,
    pub zones: BTreeMap<String, Zone>,
    pub domains: BTreeMap<String, Zone>,
    /// The zone count inferred from the first periodic-sync array seen
    /// for this controller (`len(payload_hex) / 6`), once known.
    pub zone_count: Option<usize>,
}

impl Tcs {
    pub fn new(ctl: Address, max_zones: u8) -> Tcs {
        Tcs { ctl, max_zones, zones: BTreeMap::new(), domains: BTreeMap::new(), zone_count: None }
    }

    /// The zone/domain entry for `idx`, creating it if this is the first
    /// time it's been seen. Domain ids (`F8`..`FC`, `HW`) are tracked
    /// separately from numbered zones.
    pub fn entry(&mut self, idx: &str) -> &mut Zone {
        if crate::constants::DOMAIN_IDS.contains(&idx) || idx == crate::constants::ZONE_IDX_HW {
            self.domains.entry(idx.to_string()).or_default()
        } else {
            self.zones.entry(idx.to_string()).or_default()
        }
    }
}
