//! In-memory HID backend.
//!
//! [`VirtualBackend`] serves a scripted list of [`VirtualDevice`]s. Each device records
//! what happens to it in a shared [`DeviceLog`], so the log stays readable after the
//! handle has moved into a [`MouseController`](crate::MouseController).
//!
//! ```
//! use ardumouse::backends::virtual_hid::{VirtualBackend, VirtualDevice};
//!
//! let arduino = VirtualDevice::arduino("virtual:0");
//! let log = arduino.log();
//! let mut backend = VirtualBackend::new(vec![arduino]);
//! # let _ = (&mut backend, log);
//! ```

use crate::matcher::{ARDUINO_VID, RAWHID_USAGE, RAWHID_USAGE_PAGE};
use crate::metadata::DeviceDescriptor;
use crate::report::{decode, Command, Report, CMD_DISCOVER, HANDSHAKE_MARKER};
use crate::transport::{HidBackend, HidHandle, OpenVia, TransportError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// What a virtual device does when the host writes to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteBehavior {
    /// Accept every byte.
    Accept,
    /// Report zero bytes written.
    Zero,
    /// Fail with an I/O error.
    Fail,
}

/// Everything observed on one virtual device.
#[derive(Clone, Debug, Default)]
pub struct DeviceLog {
    pub opens: Vec<OpenVia>,
    pub closes: usize,
    pub nonblocking: Option<bool>,
    /// Raw bytes of every accepted write, in order.
    pub writes: Vec<Vec<u8>>,
    /// Timeout passed to every read, including failed ones.
    pub read_timeouts: Vec<Option<Duration>>,
}

impl DeviceLog {
    /// Accepted writes decoded back into commands; undecodable writes are skipped.
    pub fn commands(&self) -> Vec<Command> {
        self.writes
            .iter()
            .filter_map(|w| Report::from_bytes(w).ok())
            .filter_map(|r| decode(&r).ok())
            .collect()
    }

    pub fn is_open(&self) -> bool {
        self.opens.len() > self.closes
    }
}

/// Handle to a device's log shared with tests.
#[derive(Clone, Debug, Default)]
pub struct SharedLog(Arc<Mutex<DeviceLog>>);

impl SharedLog {
    pub fn snapshot(&self) -> DeviceLog {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, DeviceLog> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// A scripted device.
#[derive(Clone, Debug)]
pub struct VirtualDevice {
    pub descriptor: DeviceDescriptor,
    pub open_fails: bool,
    pub nonblocking_fails: bool,
    pub read_fails: bool,
    pub write: WriteBehavior,
    /// Bytes returned by the first read after each discover report.
    pub reply: Option<Vec<u8>>,
    log: SharedLog,
}

impl VirtualDevice {
    /// A device that accepts writes and never replies.
    pub fn new(descriptor: DeviceDescriptor) -> Self {
        Self {
            descriptor,
            open_fails: false,
            nonblocking_fails: false,
            read_fails: false,
            write: WriteBehavior::Accept,
            reply: None,
            log: SharedLog::default(),
        }
    }

    /// A RawHID Arduino interface at `path` that answers the handshake.
    pub fn arduino(path: &str) -> Self {
        let mut reply = vec![0u8; 64];
        reply[..HANDSHAKE_MARKER.len()].copy_from_slice(HANDSHAKE_MARKER);
        Self::new(DeviceDescriptor {
            vendor_id: ARDUINO_VID,
            product_id: 0x8036,
            usage: Some(RAWHID_USAGE),
            usage_page: Some(RAWHID_USAGE_PAGE),
            product_string: Some("Arduino Leonardo".into()),
            manufacturer_string: Some("Arduino LLC".into()),
            path: Some(path.to_string()),
        })
        .with_reply(reply)
    }

    pub fn with_reply(mut self, reply: impl Into<Vec<u8>>) -> Self {
        self.reply = Some(reply.into());
        self
    }

    pub fn silent(mut self) -> Self {
        self.reply = None;
        self
    }

    pub fn with_write(mut self, write: WriteBehavior) -> Self {
        self.write = write;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.open_fails = true;
        self
    }

    pub fn failing_nonblocking(mut self) -> Self {
        self.nonblocking_fails = true;
        self
    }

    pub fn failing_read(mut self) -> Self {
        self.read_fails = true;
        self
    }

    pub fn without_path(mut self) -> Self {
        self.descriptor.path = None;
        self
    }

    pub fn log(&self) -> SharedLog {
        self.log.clone()
    }

    fn open_handle(&self, via: OpenVia) -> Result<VirtualHandle, TransportError> {
        if self.open_fails {
            return Err(TransportError::Open(format!(
                "{} is busy",
                self.descriptor.label()
            )));
        }
        self.log.lock().opens.push(via);
        Ok(VirtualHandle {
            device: self.clone(),
            pending: VecDeque::new(),
            closed: false,
        })
    }
}

/// Scripted [`HidBackend`].
#[derive(Debug, Default)]
pub struct VirtualBackend {
    devices: Vec<VirtualDevice>,
    enumerations: usize,
}

impl VirtualBackend {
    pub fn new(devices: Vec<VirtualDevice>) -> Self {
        Self {
            devices,
            enumerations: 0,
        }
    }

    pub fn enumerations(&self) -> usize {
        self.enumerations
    }
}

impl HidBackend for VirtualBackend {
    type Handle = VirtualHandle;

    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>, TransportError> {
        self.enumerations += 1;
        Ok(self.devices.iter().map(|d| d.descriptor.clone()).collect())
    }

    fn open_path(&mut self, path: &str) -> Result<VirtualHandle, TransportError> {
        self.devices
            .iter()
            .find(|d| d.descriptor.path.as_deref() == Some(path))
            .ok_or_else(|| TransportError::Open(format!("no device at {path}")))?
            .open_handle(OpenVia::Path)
    }

    fn open_vid_pid(
        &mut self,
        vendor_id: u16,
        product_id: u16,
    ) -> Result<VirtualHandle, TransportError> {
        self.devices
            .iter()
            .find(|d| d.descriptor.vendor_id == vendor_id && d.descriptor.product_id == product_id)
            .ok_or_else(|| {
                TransportError::Open(format!("no device {vendor_id:04x}:{product_id:04x}"))
            })?
            .open_handle(OpenVia::VendorProduct)
    }
}

/// Open handle onto a [`VirtualDevice`].
#[derive(Debug)]
pub struct VirtualHandle {
    device: VirtualDevice,
    pending: VecDeque<Vec<u8>>,
    closed: bool,
}

impl HidHandle for VirtualHandle {
    fn set_nonblocking(&mut self, nonblocking: bool) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if self.device.nonblocking_fails {
            return Err(TransportError::Io("set_blocking_mode unsupported".into()));
        }
        self.device.log.lock().nonblocking = Some(nonblocking);
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        match self.device.write {
            WriteBehavior::Accept => {}
            WriteBehavior::Zero => return Ok(0),
            WriteBehavior::Fail => return Err(TransportError::Io("write: broken pipe".into())),
        }
        self.device.log.lock().writes.push(data.to_vec());
        if data.get(1) == Some(&CMD_DISCOVER) {
            if let Some(reply) = &self.device.reply {
                self.pending.push_back(reply.clone());
            }
        }
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> Result<usize, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.device.log.lock().read_timeouts.push(timeout);
        if self.device.read_fails {
            return Err(TransportError::Io("read: device disconnected".into()));
        }
        match self.pending.pop_front() {
            Some(reply) => {
                let n = reply.len().min(buf.len());
                buf[..n].copy_from_slice(&reply[..n]);
                Ok(n)
            }
            None => Ok(0),
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.device.log.lock().closes += 1;
        }
    }
}

impl Drop for VirtualHandle {
    fn drop(&mut self) {
        self.close();
    }
}
