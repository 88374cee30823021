//! Enumerated device description.
//!
//! [`DeviceDescriptor`] is a lightweight, cloneable snapshot of one HID interface as
//! reported by a backend's enumeration. It lives for one discovery pass.
//!
//! # Conventions
//! - `usage_page`/`usage` are `None` when the platform does not report them; such
//!   interfaces never match an identity rule.
//! - `path` is an OS/topology path (opaque string). When present it is the preferred
//!   way to open the exact interface; `vendor_id`/`product_id` may address several
//!   interfaces of one composite device.
//!
//! # Example
//! ```
//! use ardumouse::DeviceDescriptor;
//!
//! let d = DeviceDescriptor {
//!     vendor_id: 0x2341,
//!     product_id: 0x8036,
//!     usage: Some(3072),
//!     usage_page: Some(65472),
//!     ..Default::default()
//! };
//! assert!(d.to_string().starts_with("VID:2341 PID:8036"));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot of a single enumerated HID interface.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// USB Vendor ID (VID).
    pub vendor_id: u16,

    /// USB Product ID (PID).
    pub product_id: u16,

    /// HID Usage within the page, if known.
    pub usage: Option<u16>,

    /// HID Usage Page (e.g. `0xFFC0` vendor-defined), if known.
    pub usage_page: Option<u16>,

    /// Human-readable product name from the firmware.
    pub product_string: Option<String>,

    /// Manufacturer name from the firmware.
    pub manufacturer_string: Option<String>,

    /// OS/topological path to the interface. Treat as opaque.
    pub path: Option<String>,
}

impl DeviceDescriptor {
    /// Short label for logs: the path when known, otherwise `vid:pid`.
    pub fn label(&self) -> String {
        match &self.path {
            Some(p) => p.clone(),
            None => format!("{:04x}:{:04x}", self.vendor_id, self.product_id),
        }
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_na<T: fmt::Display>(v: &Option<T>) -> String {
            v.as_ref().map_or_else(|| "N/A".to_string(), |v| v.to_string())
        }
        write!(
            f,
            "VID:{:04X} PID:{:04X} Product: {} Manufacturer: {} Usage: {} UsagePage: {}",
            self.vendor_id,
            self.product_id,
            or_na(&self.product_string),
            or_na(&self.manufacturer_string),
            or_na(&self.usage),
            or_na(&self.usage_page),
        )
    }
}
