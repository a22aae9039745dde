//! Gateway configuration: the knobs that shape how traffic is processed,
//! analogous to the schema `ramses_rf` validates with `voluptuous`. Here
//! the shape is enforced by `serde` at deserialize time instead.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::constants::{DEFAULT_MAX_ZONES, MAX_ZONES_RANGE, REDUCE_PROCESSING_RANGE};

/// One entry in the known-devices allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownDevice {
    /// A human-friendly name, used by `Device::display_name()` when
    /// [`GatewayConfig::use_aliases`] is set.
    #[serde(default)]
    pub alias: Option<String>,
    /// True if this gateway should emulate (fake) this device rather than
    /// just eavesdrop on it.
    #[serde(default)]
    pub faked: bool,
}

/// The gateway's runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Never actually transmit; useful for passive monitoring.
    #[serde(default)]
    pub disable_sending: bool,
    /// Never send discovery probes (periodic `RQ`s for schema/params).
    #[serde(default)]
    pub disable_discovery: bool,
    /// Harvest entities/state from traffic this gateway did not request
    /// and is not itself a party to.
    #[serde(default)]
    pub enable_eavesdrop: bool,
    /// Reject frames from devices not present in `known_list`.
    #[serde(default)]
    pub enforce_known_list: bool,
    /// Assumed zone count for a TCS until its schema is known.
    #[serde(default = "default_max_zones")]
    pub max_zones: u8,
    /// Trade completeness for throughput: `0` processes everything, `3`
    /// suppresses eavesdrop-driven entity updates entirely.
    #[serde(default)]
    pub reduce_processing: u8,
    /// Render devices by their `known_list` alias where one is set.
    #[serde(default)]
    pub use_aliases: bool,
    /// Prefer native `3220` OpenTherm framing over the legacy bridge
    /// encoding when both are available.
    #[serde(default)]
    pub use_native_ot: bool,
    /// The allow/alias list, keyed by device id (`TT:SSSSSS`). Duplicate
    /// keys in the source document are a configuration error, not a
    /// silent overwrite.
    #[serde(default, deserialize_with = "deserialize_unique_known_list")]
    pub known_list: HashMap<String, KnownDevice>,
}

fn default_max_zones() -> u8 {
    DEFAULT_MAX_ZONES
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            disable_sending: false,
            disable_discovery: false,
            enable_eavesdrop: false,
            enforce_known_list: false,
            max_zones: DEFAULT_MAX_ZONES,
            reduce_processing: 0,
            use_aliases: false,
            use_native_ot: false,
            known_list: HashMap::new(),
        }
    }
}

impl GatewayConfig {
    /// Validate cross-field constraints that `serde`'s per-field
    /// defaults/types cannot express alone.
    pub fn validate(&self) -> Result<(), crate::error::RamsesError> {
        if !MAX_ZONES_RANGE.contains(&self.max_zones) {
            return Err(crate::error::RamsesError::InvalidPayload {
                code: "config".to_string(),
                reason: format!(
                    "max_zones {} outside allowed range {:?}",
                    self.max_zones, MAX_ZONES_RANGE
                ),
            });
        }
        if !REDUCE_PROCESSING_RANGE.contains(&self.reduce_processing) {
            return Err(crate::error::RamsesError::InvalidPayload {
                code: "config".to_string(),
                reason: format!(
                    "reduce_processing {} outside allowed range {:?}",
                    self.reduce_processing, REDUCE_PROCESSING_RANGE
                ),
            });
        }
        Ok(())
    }
}

fn deserialize_unique_known_list<'de, D>(deserializer: D) -> Result<HashMap<String, KnownDevice>, D::Error>
where
    D: Deserializer<'de>,
{
    struct UniqueMapVisitor;

    impl<'de> serde::de::Visitor<'de> for UniqueMapVisitor {
        type Value = HashMap<String, KnownDevice>;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a map of device id to known-device entry, with no duplicate keys")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::MapAccess<'de>,
        {
            let mut out = HashMap::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((key, value)) = map.next_entry::<String, KnownDevice>()? {
                if out.insert(key.clone(), value).is_some() {
                    return Err(serde::de::Error::custom(format!("duplicate known-list key: {key}")));
                }
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(UniqueMapVisitor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_permissive_but_inert() {
        let cfg = GatewayConfig::default();
        assert!(!cfg.enable_eavesdrop);
        assert_eq!(cfg.max_zones, DEFAULT_MAX_ZONES);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_max_zones_out_of_range() {
        let mut cfg = GatewayConfig::default();
        cfg.max_zones = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_reduce_processing_out_of_range() {
        let mut cfg = GatewayConfig::default();
        cfg.reduce_processing = 4;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn parses_known_list_from_json() {
        let json = r#"{"known_list": {"01:145038": {"alias": "Main Controller"}}}"#;
        let cfg: GatewayConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.known_list["01:145038"].alias.as_deref(), Some("Main Controller"));
    }

    #[test]
    fn rejects_duplicate_known_list_keys() {
        let json = r#"{"known_list": {"01:145038": {}, "01:145038": {"faked": true}}}"#;
        let err = serde_json::from_str::<GatewayConfig>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate known-list key"));
    }
}
