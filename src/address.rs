//! The device address: a two-digit type prefix plus a six-digit serial,
//! and the sentinel addresses used for "not used" and "broadcast".

use crate::constants::ADDR_FIELD_WIDTH;
use crate::error::RamsesError;
use std::fmt;
use strum_macros::Display;

/// The literal rendering of the "not used" address.
pub const NON_ADDR: &str = "--:------";
/// The literal rendering of the broadcast address.
pub const NUL_ADDR: &str = "63:262143";

/// Device class, inferred from the two-digit type prefix of an [`Address`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum DeviceType {
    /// Controller (TCS).
    Ctl,
    /// Underfloor heating controller.
    Ufc,
    /// Thermostat / room sensor.
    Thm,
    /// Radiator valve (TRV).
    Trv,
    /// Hot water sensor/cylinder stat.
    Dhw,
    /// OpenTherm bridge.
    Otb,
    /// Electrical relay (boiler/zone valve driver).
    Bdr,
    /// Ventilation fan.
    Fan,
    /// Remote control / handset.
    Rem,
    /// CO2 sensor (HVAC).
    Co2,
    /// Humidity sensor (HVAC).
    Hum,
    /// Host gateway interface (e.g. HGI80).
    Hgi,
    /// Internet/radio gateway.
    Rfg,
    /// HVAC-specific sensor, otherwise unclassified.
    Rfs,
    /// Display unit.
    Dis,
    /// Programmer controller.
    Prg,
    /// Direct thermostat variant.
    Dts,
    /// Direct thermostat variant.
    Dt2,
    /// Prefix not in the known table.
    Out,
}

impl DeviceType {
    /// Classify a device by its two-digit decimal type prefix.
    ///
    /// The prefix -> class table below is this crate's resolution of an
    /// Open Question: the distilled spec names the device classes but not
    /// every prefix value, so the mapping is chosen for internal
    /// consistency with the worked examples in spec.md §8 rather than
    /// lifted verbatim from any single upstream source.
    pub fn from_prefix(prefix: &str) -> DeviceType {
        match prefix {
            "01" => DeviceType::Ctl,
            "02" => DeviceType::Ufc,
            "03" => DeviceType::Thm,
            "04" => DeviceType::Trv,
            "07" => DeviceType::Dhw,
            "10" => DeviceType::Otb,
            "12" => DeviceType::Thm,
            "13" => DeviceType::Bdr,
            "18" => DeviceType::Hgi,
            "20" => DeviceType::Fan,
            "22" => DeviceType::Thm,
            "23" => DeviceType::Prg,
            "30" => DeviceType::Rfg,
            "31" => DeviceType::Fan,
            "32" => DeviceType::Co2,
            "33" => DeviceType::Hum,
            "34" => DeviceType::Rem,
            "37" => DeviceType::Fan,
            "39" => DeviceType::Rem,
            "42" => DeviceType::Dts,
            "48" => DeviceType::Dt2,
            "49" => DeviceType::Rfs,
            "40" => DeviceType::Dis,
            "63" => DeviceType::Hgi,
            _ => DeviceType::Out,
        }
    }

    /// True for the device classes that can lead a system: a controller
    /// (TCS), a UFH controller, or a programmer unit.
    pub fn is_controller(&self) -> bool {
        matches!(self, DeviceType::Ctl | DeviceType::Ufc | DeviceType::Prg)
    }
}

/// A device identity: `TT:SSSSSS`, or one of the two sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    id: String,
}

impl Address {
    /// Parse a 9-character address field.
    pub fn parse(field: &str) -> Result<Address, RamsesError> {
        if field.len() != ADDR_FIELD_WIDTH {
            return Err(RamsesError::InvalidAddress(format!(
                "wrong width: {field:?}"
            )));
        }
        if field == NON_ADDR || field == NUL_ADDR {
            return Ok(Address { id: field.to_string() });
        }
        let bytes = field.as_bytes();
        let valid = bytes[2] == b':'
            && bytes[..2].iter().all(u8::is_ascii_digit)
            && bytes[3..].iter().all(u8::is_ascii_digit);
        if !valid {
            return Err(RamsesError::InvalidAddress(format!("bad shape: {field:?}")));
        }
        let type_prefix: u8 = field[..2].parse().unwrap_or(255);
        if type_prefix > 63 {
            return Err(RamsesError::InvalidAddress(format!(
                "type out of range: {field:?}"
            )));
        }
        Ok(Address { id: field.to_string() })
    }

    /// Decode a device id packed as a big-endian 24-bit integer — the form
    /// device ids take inside a payload (e.g. `000C`, `1FC9` records),
    /// as opposed to the colon-text form a frame's header fields use.
    /// `type = raw / 0x40000`, `serial = raw % 0x40000`; `0xFFFFFF`
    /// decodes to the broadcast sentinel (`type == 63`, `serial == 262143`).
    pub fn from_packed(raw: u32) -> Address {
        let type_id = raw / 0x40000;
        let serial = raw % 0x40000;
        Address { id: format!("{type_id:02}:{serial:06}") }
    }

    /// True if `raw` is the reserved "empty slot" marker used in device-id
    /// arrays (e.g. an unfilled `000C` actuator slot).
    pub fn is_empty_slot(raw: u32) -> bool {
        raw == 0xFFFFFF
    }

    /// The inverse of [`Address::from_packed`]. Sentinels round-trip
    /// through their own reserved values.
    pub fn to_packed(&self) -> u32 {
        if self.is_non() {
            return 0xFFFFFF;
        }
        let type_id: u32 = self.prefix().parse().unwrap_or(63);
        let serial: u32 = self.id[3..].parse().unwrap_or(0x3FFFF);
        type_id * 0x40000 + serial
    }

    /// The sentinel meaning "field not used".
    pub fn non() -> Address {
        Address { id: NON_ADDR.to_string() }
    }

    /// The sentinel meaning "broadcast".
    pub fn nul() -> Address {
        Address { id: NUL_ADDR.to_string() }
    }

    /// True if this is the NON (not-used) sentinel.
    pub fn is_non(&self) -> bool {
        self.id == NON_ADDR
    }

    /// True if this is the NUL (broadcast) sentinel.
    pub fn is_nul(&self) -> bool {
        self.id == NUL_ADDR
    }

    /// The 10-character canonical id, e.g. `"01:145038"`.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The two-digit type prefix.
    pub fn prefix(&self) -> &str {
        &self.id[..2]
    }

    /// Classify this address's device type.
    pub fn device_type(&self) -> DeviceType {
        DeviceType::from_prefix(self.prefix())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// The three addresses carried by every frame, plus the derived `(src, dst)`
/// pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressSet {
    pub addrs: [Address; 3],
    pub src: Address,
    pub dst: Address,
}

/// Parse the 29-character, space-separated triplet field and apply the
/// triplet legality table from spec.md §3.
pub fn parse_triplet(field: &str) -> Result<AddressSet, RamsesError> {
    let parts: Vec<&str> = field.split(' ').collect();
    if parts.len() != 3 {
        return Err(RamsesError::InvalidAddrSet(format!(
            "expected 3 space-separated addresses, got {}",
            parts.len()
        )));
    }
    let addrs = [
        Address::parse(parts[0])?,
        Address::parse(parts[1])?,
        Address::parse(parts[2])?,
    ];

    // (a) source, destination, NON
    if !addrs[0].is_non() && !addrs[1].is_non() && addrs[2].is_non() {
        return Ok(AddressSet {
            src: addrs[0].clone(),
            dst: addrs[1].clone(),
            addrs,
        });
    }
    // (b) source, NON, source (loopback broadcast)
    if !addrs[0].is_non() && addrs[1].is_non() && addrs[2] == addrs[0] {
        return Ok(AddressSet {
            src: addrs[0].clone(),
            dst: addrs[0].clone(),
            addrs,
        });
    }
    // (c) NON, NON, broadcaster
    if addrs[0].is_non() && addrs[1].is_non() && !addrs[2].is_non() {
        return Ok(AddressSet {
            src: addrs[2].clone(),
            dst: addrs[2].clone(),
            addrs,
        });
    }

    Err(RamsesError::InvalidAddrSet(format!(
        "illegal address triplet: {} {} {}",
        addrs[0], addrs[1], addrs[2]
    )))
}
