//! End-to-end scenarios exercising the parse → harvest → decode pipeline
//! against full wire-format lines, one test per documented case.

use chrono::Utc;
use ramses_core::config::GatewayConfig;
use ramses_core::processor::Processor;
use ramses_core::{Address, Frame, Gateway, Idx, Message, PayloadValue};

fn parse(line: &str) -> Message {
    Message::new(Frame::parse(line).unwrap(), Utc::now())
}

#[test]
fn domain_array_scenario() {
    let msg = parse("I --- 01:145038 --:------ 01:145038 0009 006 FC00FFF900FF");
    assert!(msg.has_array());
    assert!(msg.has_controller());
    assert!(matches!(msg.idx(), Idx::Array));
    assert_eq!(msg.hdr().as_deref(), Some("0009|I|01:145038"));

    let value = ramses_core::payloads::parse(&msg.frame.code, &msg.frame.payload, msg.has_array()).unwrap();
    match value {
        PayloadValue::List(records) => {
            assert_eq!(records.len(), 2);
            assert_eq!(records[0]["domain_id"], "FC");
            assert_eq!(records[0]["state"], 0);
            assert_eq!(records[0]["flag"], "FF");
            assert_eq!(records[1]["domain_id"], "F9");
        }
        _ => panic!("expected a list"),
    }
}

#[test]
fn zone_actuator_reply_scenario() {
    let line = "RP --- 01:145038 18:013393 --:------ 000C 008 000406368EFFFFFF";
    let msg = parse(line);
    assert_eq!(msg.ctx().as_value(), Some("0004"));

    let mut gw = Gateway::new(GatewayConfig::default()).unwrap();
    let mut proc = Processor::new(&mut gw);
    proc.process_line(line, Utc::now());

    let tcs = gw.system(&Address::parse("01:145038").unwrap()).unwrap();
    let zone = tcs.zones.get("00").unwrap();
    assert_eq!(zone.devices, vec!["01:145038".to_string()]);
}

#[test]
fn opentherm_request_scenario() {
    let msg = parse("RQ --- 30:258720 10:050360 --:------ 3220 005 0000050000");
    assert_eq!(msg.ctx().as_value(), Some("05"));
    assert!(!msg.has_controller());
    assert_eq!(msg.hdr().as_deref(), Some("3220|RQ|10:050360"));
    assert_eq!(msg.rx_header().as_deref(), Some("3220|RP|10:050360"));
}

#[test]
fn dhw_schedule_fragment_scenario() {
    let line = "RP --- 01:145038 18:013393 --:------ 0404 008 0023000800010103";
    let msg = parse(line);
    assert_eq!(msg.idx().as_value(), Some("HW"));

    let value = ramses_core::payloads::parse(&msg.frame.code, &msg.frame.payload, msg.has_array()).unwrap();
    match value {
        PayloadValue::Record(r) => {
            assert_eq!(r["zone_idx"], "HW");
            assert_eq!(r["frag_total"], 8);
            assert_eq!(r["frag_index"], 1);
        }
        _ => panic!("expected a record"),
    }
}

#[test]
fn invalid_triplet_scenario_produces_no_message() {
    let err = Frame::parse("I --- 01:145038 01:145039 01:145040 0009 003 000000").unwrap_err();
    assert!(matches!(err, ramses_core::RamsesError::InvalidAddrSet(_)));

    let mut gw = Gateway::new(GatewayConfig::default()).unwrap();
    let mut proc = Processor::new(&mut gw);
    assert!(proc.process_line("I --- 01:145038 01:145039 01:145040 0009 003 000000", Utc::now()).is_none());
    assert_eq!(gw.devices().count(), 0);
}

#[test]
fn bind_handshake_scenario() {
    let line = "W --- 01:145038 34:021943 --:------ 1FC9 006 002309063628";
    let msg = parse(line);
    let value = ramses_core::payloads::parse(&msg.frame.code, &msg.frame.payload, msg.has_array()).unwrap();
    match value {
        PayloadValue::List(records) => {
            assert_eq!(records.len(), 1);
            assert_eq!(records[0]["code"], "2309");
            assert!(records[0]["dev_id"].is_string());
        }
        _ => panic!("expected a list"),
    }

    assert_eq!(msg.hdr().as_deref(), Some("1FC9|W|34:021943"));
    assert_eq!(msg.rx_header().as_deref(), Some("1FC9|I|01:145038"));
}
