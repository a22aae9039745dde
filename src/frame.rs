//! Frame grammar: tokenise one wire line and enforce its structural
//! invariants. See spec.md §3/§4.2.

use crate::address::{self, AddressSet};
use crate::constants::{MAX_PAYLOAD_LEN, RSSI_MAX};
use crate::error::RamsesError;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use strum_macros::Display;

/// Frame direction/kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Verb {
    /// Information broadcast.
    I,
    /// Write.
    W,
    /// Read-request.
    Rq,
    /// Read-reply.
    Rp,
}

impl Verb {
    /// The two-character wire rendering (`I`/`W` are space-padded).
    pub fn wire(&self) -> &'static str {
        match self {
            Verb::I => " I",
            Verb::W => " W",
            Verb::Rq => "RQ",
            Verb::Rp => "RP",
        }
    }

    fn from_wire(s: &str) -> Option<Verb> {
        match s {
            " I" => Some(Verb::I),
            " W" => Some(Verb::W),
            "RQ" => Some(Verb::Rq),
            "RP" => Some(Verb::Rp),
            _ => None,
        }
    }
}

/// The sequence-number field: either absent (`---`) or a 3-digit counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seqn {
    None,
    Num(u16),
}

impl fmt::Display for Seqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seqn::None => write!(f, "---"),
            Seqn::Num(n) => write!(f, "{n:03}"),
        }
    }
}

const ADDR_PAT: &str = r"(?:--:------|63:262143|\d{2}:\d{6})";

static FRAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?:(?P<rssi>\d{{3}}) )?(?P<verb> I|RQ| W|RP) (?P<seqn>-{{3}}|\d{{3}}) (?P<a0>{ADDR_PAT}) (?P<a1>{ADDR_PAT}) (?P<a2>{ADDR_PAT}) (?P<code>[0-9A-Fa-f]{{4}}) (?P<len>\d{{3}}) (?P<payload>[0-9A-Fa-f]*)$"
    ))
    .expect("static frame grammar is a valid regex")
});

/// A structurally-validated wire frame: verb, optional sequence number,
/// address triplet, opcode, declared length, hex payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub rssi: Option<u16>,
    pub verb: Verb,
    pub seqn: Seqn,
    pub addrs: AddressSet,
    pub code: String,
    pub declared_len: u8,
    pub payload: String,
}

impl Frame {
    /// Tokenise and validate one line of text.
    pub fn parse(line: &str) -> Result<Frame, RamsesError> {
        let line = line.trim_end_matches(['\r', '\n']);

        // The original wire format rejects the deprecated literal seqn
        // "..." explicitly rather than letting it fall out of the grammar.
        if line.len() >= 6 && &line[3..6] == "..." {
            return Err(RamsesError::InvalidPacket(
                "deprecated seqn literal '...' is not accepted".to_string(),
            ));
        }

        let caps = FRAME_REGEX
            .captures(line)
            .ok_or_else(|| RamsesError::InvalidPacket(format!("does not match frame grammar: {line:?}")))?;

        let rssi = caps.name("rssi").map(|m| m.as_str().parse::<u16>().unwrap());
        if rssi.is_some_and(|r| r > RSSI_MAX) {
            return Err(RamsesError::Corrupt(format!("rssi {} exceeds max {RSSI_MAX}", rssi.unwrap())));
        }
        let verb = Verb::from_wire(&caps["verb"])
            .ok_or_else(|| RamsesError::InvalidPacket(format!("bad verb: {}", &caps["verb"])))?;
        let seqn = match &caps["seqn"] {
            "---" => Seqn::None,
            s => Seqn::Num(s.parse().unwrap()),
        };

        let addr_field = format!("{} {} {}", &caps["a0"], &caps["a1"], &caps["a2"]);
        let addrs = address::parse_triplet(&addr_field)?;

        let code = caps["code"].to_uppercase();
        let declared_len: u8 = caps["len"]
            .parse()
            .map_err(|_| RamsesError::InvalidPacket("declared length is not a valid number".to_string()))?;
        let payload = caps["payload"].to_uppercase();

        if declared_len as usize > MAX_PAYLOAD_LEN {
            return Err(RamsesError::InvalidPacket(format!(
                "declared length {declared_len} exceeds max {MAX_PAYLOAD_LEN}"
            )));
        }
        if payload.len() != declared_len as usize * 2 {
            return Err(RamsesError::InvalidPacket(format!(
                "payload length {} does not match declared_len*2={}",
                payload.len(),
                declared_len as usize * 2
            )));
        }

        Ok(Frame {
            rssi,
            verb,
            seqn,
            addrs,
            code,
            declared_len,
            payload,
        })
    }

    /// Construct a frame from its parts, computing the declared length.
    pub fn from_parts(verb: Verb, addrs: AddressSet, code: String, payload: String) -> Frame {
        let declared_len = (payload.len() / 2) as u8;
        Frame {
            rssi: None,
            verb,
            seqn: Seqn::None,
            addrs,
            code: code.to_uppercase(),
            declared_len,
            payload: payload.to_uppercase(),
        }
    }

    /// True if the declared payload is empty.
    pub fn is_empty_payload(&self) -> bool {
        self.declared_len == 0
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {:03} {}",
            self.verb.wire(),
            self.seqn,
            self.addrs.addrs[0],
            self.addrs.addrs[1],
            self.addrs.addrs[2],
            self.code,
            self.declared_len,
            self.payload
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_domain_array_frame() {
        let f = Frame::parse("I --- 01:145038 --:------ 01:145038 0009 006 FC00FFF900FF").unwrap();
        assert_eq!(f.verb, Verb::I);
        assert_eq!(f.code, "0009");
        assert_eq!(f.declared_len, 6);
        assert_eq!(f.payload, "FC00FFF900FF");
    }

    #[test]
    fn rejects_length_mismatch() {
        let err = Frame::parse("I --- 01:145038 --:------ 01:145038 0009 006 FC00FF").unwrap_err();
        assert!(matches!(err, RamsesError::InvalidPacket(_)));
    }

    #[test]
    fn rejects_deprecated_seqn() {
        let err = Frame::parse("I ... 01:145038 --:------ 01:145038 0009 000 ").unwrap_err();
        assert!(matches!(err, RamsesError::InvalidPacket(_)));
    }

    #[test]
    fn accepts_empty_payload() {
        let f = Frame::parse("RQ --- 18:013393 10:050360 --:------ 3EF0 000 ").unwrap();
        assert!(f.is_empty_payload());
    }

    #[test]
    fn rejects_invalid_triplet() {
        let err = Frame::parse("I --- 01:145038 01:145039 01:145040 0009 003 000000").unwrap_err();
        assert!(matches!(err, RamsesError::InvalidAddrSet(_)) || matches!(err, RamsesError::InvalidPacket(_)));
    }

    #[test]
    fn round_trip_render() {
        let line = "RP --- 01:145038 18:013393 --:------ 000C 008 000406368EFFFFFF";
        let f = Frame::parse(line).unwrap();
        assert_eq!(f.to_string(), line);
    }

    #[test]
    fn rejects_rssi_out_of_range() {
        let err = Frame::parse("999  I --- 01:145038 --:------ 01:145038 0009 000 ").unwrap_err();
        assert!(matches!(err, RamsesError::Corrupt(_)));
    }
}
