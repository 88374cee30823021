//! Host HID capability consumed by discovery and the controller.
//!
//! Backends implement [`HidBackend`] (enumerate + open) and hand out [`HidHandle`]s
//! (configure + write + read + close). The crate never talks to the OS directly;
//! see [`backends`](crate::backends) for the `hidapi` and in-memory implementations.

use crate::metadata::DeviceDescriptor;
use std::fmt;
use std::time::Duration;

/// Failure reported by a backend primitive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("HID backend unavailable: {0}")]
    Unavailable(String),
    #[error("enumeration failed: {0}")]
    Enumerate(String),
    #[error("open failed: {0}")]
    Open(String),
    #[error("path is not representable: {0}")]
    InvalidPath(String),
    #[error("I/O failed: {0}")]
    Io(String),
    #[error("handle already closed")]
    Closed,
}

/// How a candidate was opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenVia {
    Path,
    VendorProduct,
}

impl OpenVia {
    /// Route [`HidBackend::open`] takes for `info`.
    pub fn for_descriptor(info: &DeviceDescriptor) -> Self {
        if info.path.is_some() {
            OpenVia::Path
        } else {
            OpenVia::VendorProduct
        }
    }
}

impl fmt::Display for OpenVia {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpenVia::Path => f.write_str("path"),
            OpenVia::VendorProduct => f.write_str("vid/pid"),
        }
    }
}

/// An open, exclusively owned interface.
pub trait HidHandle: Send {
    fn set_nonblocking(&mut self, nonblocking: bool) -> Result<(), TransportError>;

    /// Write one output report. Returns the number of bytes the transport accepted;
    /// `Ok(0)` means nothing was sent.
    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Read at most `buf.len()` bytes. `None` means "whatever the handle's blocking mode
    /// does"; in non-blocking mode an empty read returns `Ok(0)`.
    fn read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> Result<usize, TransportError>;

    /// Release the handle. Calling it again is a no-op.
    fn close(&mut self);
}

/// Enumerate and open interfaces.
pub trait HidBackend {
    type Handle: HidHandle;

    /// Fresh list of every HID interface currently present, in platform order.
    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>, TransportError>;

    fn open_path(&mut self, path: &str) -> Result<Self::Handle, TransportError>;

    fn open_vid_pid(&mut self, vendor_id: u16, product_id: u16)
        -> Result<Self::Handle, TransportError>;

    /// Open `info`, preferring its stable path over the vendor/product pair.
    fn open(&mut self, info: &DeviceDescriptor) -> Result<Self::Handle, TransportError> {
        match &info.path {
            Some(path) => self.open_path(path),
            None => self.open_vid_pid(info.vendor_id, info.product_id),
        }
    }
}
