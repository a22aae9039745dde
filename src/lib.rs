//! A decoder and dispatcher for the RAMSES-II wireless protocol used by
//! Honeywell/Resideo evohome-family heating, hot-water and HVAC systems.
//!
//! The crate turns wire-format text lines into validated [`frame::Frame`]s,
//! enriches them into [`message::Message`]s with the derived routing
//! attributes the rest of the system needs, and maintains a [`gateway::Gateway`]
//! view of the devices, zones and systems inferred purely from observed
//! traffic.

pub mod address;
pub mod commands;
pub mod config;
pub mod constants;
pub mod entities;
pub mod error;
pub mod frame;
pub mod gateway;
pub mod header;
pub mod message;
pub mod payloads;
pub mod processor;
pub mod qos;
pub mod registry;
pub mod snapshot;

pub use address::{Address, AddressSet, DeviceType};
pub use config::GatewayConfig;
pub use error::{RamsesError, Result};
pub use frame::{Frame, Seqn, Verb};
pub use gateway::Gateway;
pub use message::{Idx, Message};
pub use payloads::Value as PayloadValue;
