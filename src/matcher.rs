//! Candidate selection.
//!
//! The Arduino sketch exposes several HID interfaces (keyboard, mouse, RawHID). Only the
//! vendor-defined RawHID one carries our reports, so an interface qualifies when **all**
//! of vendor ID, usage page, and usage match. There is no scoring: a partial match is no
//! match.

use crate::metadata::DeviceDescriptor;
use serde::{Deserialize, Serialize};

/// Arduino SA vendor ID.
pub const ARDUINO_VID: u16 = 0x2341;
/// RawHID usage page (0xFFC0, vendor-defined).
pub const RAWHID_USAGE_PAGE: u16 = 65472;
/// RawHID usage (0x0C00).
pub const RAWHID_USAGE: u16 = 3072;

/// Identity rule an interface must satisfy to be tried.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub usage_page: u16,
    pub usage: u16,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self {
            vendor_id: ARDUINO_VID,
            usage_page: RAWHID_USAGE_PAGE,
            usage: RAWHID_USAGE,
        }
    }
}

impl DeviceIdentity {
    /// Absent usage fields never match.
    pub fn matches(&self, info: &DeviceDescriptor) -> bool {
        info.vendor_id == self.vendor_id
            && info.usage_page == Some(self.usage_page)
            && info.usage == Some(self.usage)
    }
}

/// An enumerated interface that passed the identity rule.
#[derive(Clone, Copy, Debug)]
pub struct Candidate<'a> {
    /// Position in the full enumeration.
    pub index: usize,
    pub descriptor: &'a DeviceDescriptor,
}

/// Filter `devices` down to candidates, preserving enumeration order.
pub fn find_candidates<'a>(
    identity: &DeviceIdentity,
    devices: &'a [DeviceDescriptor],
) -> Vec<Candidate<'a>> {
    devices
        .iter()
        .enumerate()
        .filter(|(_, d)| identity.matches(d))
        .map(|(index, descriptor)| Candidate { index, descriptor })
        .collect()
}
