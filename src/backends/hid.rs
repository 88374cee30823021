//! `hidapi`-backed transport.
use crate::metadata::DeviceDescriptor;
use crate::transport::{HidBackend, HidHandle, TransportError};
use hidapi::{DeviceInfo, HidApi, HidDevice};
use std::ffi::{CStr, CString};
use std::time::Duration;

/// Host HID stack via `hidapi`.
pub struct HidApiBackend {
    api: HidApi,
}

impl HidApiBackend {
    pub fn new() -> Result<Self, TransportError> {
        let api = HidApi::new().map_err(|e| TransportError::Unavailable(e.to_string()))?;
        Ok(Self { api })
    }
}

impl HidBackend for HidApiBackend {
    type Handle = HidApiHandle;

    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>, TransportError> {
        self.api
            .refresh_devices()
            .map_err(|e| TransportError::Enumerate(e.to_string()))?;
        Ok(self.api.device_list().map(descriptor).collect())
    }

    fn open_path(&mut self, path: &str) -> Result<HidApiHandle, TransportError> {
        let c_path =
            CString::new(path).map_err(|_| TransportError::InvalidPath(path.to_string()))?;
        self.api
            .open_path(&c_path)
            .map(HidApiHandle::new)
            .map_err(|e| TransportError::Open(e.to_string()))
    }

    fn open_vid_pid(
        &mut self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<HidApiHandle, TransportError> {
        self.api
            .open(vendor_id, product_id)
            .map(HidApiHandle::new)
            .map_err(|e| TransportError::Open(e.to_string()))
    }
}

/// Build a [`DeviceDescriptor`] for a `hidapi` device entry.
///
/// `hidapi` always reports usage fields, but on backends that cannot read them (libusb)
/// they come back as zero, which never matches a real identity rule.
fn descriptor(info: &DeviceInfo) -> DeviceDescriptor {
    DeviceDescriptor {
        vendor_id: info.vendor_id(),
        product_id: info.product_id(),
        usage: Some(info.usage()),
        usage_page: Some(info.usage_page()),
        product_string: info.product_string().map(|s| s.to_string()),
        manufacturer_string: info.manufacturer_string().map(|s| s.to_string()),
        path: utf8_path(info.path()),
    }
}

/// A path that would not survive the round trip through `String` is dropped, so the
/// interface is opened by VID/PID instead of by a mangled path.
fn utf8_path(path: &CStr) -> Option<String> {
    path.to_str().ok().map(str::to_owned)
}

/// Open `hidapi` device. Dropping it closes the OS handle.
pub struct HidApiHandle {
    raw: Option<HidDevice>,
}

impl HidApiHandle {
    fn new(device: HidDevice) -> Self {
        Self { raw: Some(device) }
    }

    fn raw(&self) -> Result<&HidDevice, TransportError> {
        self.raw.as_ref().ok_or(TransportError::Closed)
    }
}

impl HidHandle for HidApiHandle {
    fn set_nonblocking(&mut self, nonblocking: bool) -> Result<(), TransportError> {
        self.raw()?
            .set_blocking_mode(!nonblocking)
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        self.raw()?
            .write(data)
            .map_err(|e| TransportError::Io(e.to_string()))
    }

    fn read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> Result<usize, TransportError> {
        let raw = self.raw()?;
        let res = match timeout {
            Some(t) => raw.read_timeout(buf, i32::try_from(t.as_millis()).unwrap_or(i32::MAX)),
            None => raw.read(buf),
        };
        res.map_err(|e| TransportError::Io(e.to_string()))
    }

    fn close(&mut self) {
        // HidDevice closes on drop.
        self.raw.take();
    }
}
