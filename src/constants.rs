//! Protocol constants for RAMSES-II.

/// Width in characters of one address field (`TT:SSSSSS`).
pub const ADDR_FIELD_WIDTH: usize = 9;

/// Largest payload length (in bytes) a frame may declare.
pub const MAX_PAYLOAD_LEN: usize = 48;

/// Default number of zones a TCS is assumed to carry until told otherwise.
pub const DEFAULT_MAX_ZONES: u8 = 12;

/// Valid range for the `max_zones` configuration option.
pub const MAX_ZONES_RANGE: std::ops::RangeInclusive<u8> = 1..=16;

/// Valid range for the `reduce_processing` configuration option (`3`
/// suppresses eavesdrop-driven entity updates entirely).
pub const REDUCE_PROCESSING_RANGE: std::ops::RangeInclusive<u8> = 0..=3;

/// `reduce_processing` value at which eavesdrop-driven entity updates are
/// suppressed entirely.
pub const REDUCE_PROCESSING_SUPPRESS: u8 = 3;

/// Largest RSSI value a frame may carry before it's treated as corrupt.
pub const RSSI_MAX: u16 = 255;

/// Synthetic zone index denoting the domestic hot water zone.
pub const ZONE_IDX_HW: &str = "HW";

/// Domain id: appliance/boiler relay.
pub const DOMAIN_FC: &str = "FC";
/// Domain id: used by `000C` to mean the DHW/heating relay context.
pub const DOMAIN_F9: &str = "F9";
/// Domain id: used by `000C` to mean the DHW/heating relay context.
pub const DOMAIN_FA: &str = "FA";
/// Domain id: ventilation/other system-wide subject.
pub const DOMAIN_F8: &str = "F8";

/// The full set of domain ids recognised as a first-nibble-F index.
pub const DOMAIN_IDS: [&str; 4] = [DOMAIN_F8, DOMAIN_F9, DOMAIN_FA, DOMAIN_FC];

/// `000C` device-role nibbles (payload bytes 2..4).
pub mod dev_role {
    pub const APP: &str = "0F";
    pub const DHW: &str = "0D";
    pub const HTG: &str = "0E";
}
