//! ardumouse - drive an Arduino RawHID mouse bridge from the host.
//!
//! The firmware exposes a vendor-defined HID interface (usage page `0xFFC0`, usage
//! `0x0C00`) and turns 64-byte command reports into relative mouse motion, left-button
//! presses, and wheel ticks. This crate finds that interface, confirms it with a
//! one-shot handshake, and exposes the commands on [`MouseController`].
//!
//! Pure logic ([`report`], [`matcher`]) is separate from I/O ([`transport`],
//! [`backends`]); discovery progress is published on a [`DiscoveryEventBus`].

pub mod backends;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod handshake;
pub mod logger;
pub mod matcher;
pub mod metadata;
pub mod report;
pub mod timing;
pub mod transport;

pub use config::*;
pub use controller::*;
pub use error::{Error, Result};
pub use events::*;
pub use matcher::{find_candidates, Candidate, DeviceIdentity};
pub use metadata::*;
pub use report::{decode, decode_handshake_reply, encode, Command, Report, REPORT_LEN};
pub use transport::*;
