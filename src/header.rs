//! The QoS header: a frame's retry/dedup fingerprint.
//!
//! Grounded verbatim on `pkt_header()` in
//! `original_source/ramses_rf/protocol/frame.py`, including its special
//! case for the `1FC9` rf-bind handshake.

use crate::address::DeviceType;
use crate::frame::{Frame, Verb};

/// Build the header for `frame`. When `rx_header` is true, build the
/// header of the *response* this frame would expect, if any.
pub fn pkt_header(frame: &Frame, ctx: Option<&str>, rx_header: bool) -> Option<String> {
    if frame.code == "1FC9" {
        return bind_header(frame, ctx, rx_header);
    }

    let addr = if frame.addrs.src.device_type() == DeviceType::Hgi {
        &frame.addrs.dst
    } else {
        &frame.addrs.src
    };

    let header = if !rx_header {
        format!("{}|{}|{}", frame.code, frame.verb.wire(), addr.id())
    } else if matches!(frame.verb, Verb::I | Verb::Rp) || frame.addrs.src == frame.addrs.dst {
        return None;
    } else {
        let expect_verb = if frame.verb == Verb::Rq { Verb::Rp } else { Verb::I };
        format!("{}|{}|{}", frame.code, expect_verb.wire(), addr.id())
    };

    match ctx {
        Some(c) => Some(format!("{header}|{c}")),
        None => Some(header),
    }
}

fn bind_header(frame: &Frame, ctx: Option<&str>, rx_header: bool) -> Option<String> {
    let src_is_dst = frame.addrs.src == frame.addrs.dst;

    if !rx_header {
        let device_id = if src_is_dst {
            crate::address::Address::nul().id().to_string()
        } else {
            frame.addrs.dst.id().to_string()
        };
        return Some(format!("{}|{}|{}", frame.code, frame.verb.wire(), device_id));
    }

    if src_is_dst {
        return Some(format!("{}|{}|{}", frame.code, Verb::W.wire(), frame.addrs.src.id()));
    }
    if frame.verb == Verb::W {
        return Some(format!("{}|{}|{}", frame.code, Verb::I.wire(), frame.addrs.src.id()));
    }
    let _ = ctx;
    None
}
