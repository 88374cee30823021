//! The mouse command surface.
//!
//! [`MouseController`] owns the handle that won the handshake and turns method calls into
//! reports. Writes are fire-and-forget: nothing is read back, and a failed write is logged
//! instead of returned. Once closed (or if never bound) every command is a silent no-op.
//!
//! The handle sits behind a mutex, so a controller can be shared between threads; each
//! report is written under the lock. [`MouseController::click`] is *not* atomic: another
//! thread may interleave commands between its down and up reports.
//!
//! ```no_run
//! use ardumouse::MouseController;
//!
//! let mouse = MouseController::open()?;
//! mouse.move_by(10, 0)?;
//! mouse.click();
//! mouse.wheel(-3);
//! mouse.close();
//! # Ok::<(), ardumouse::Error>(())
//! ```

use crate::config::ControllerConfig;
use crate::error::Result;
use crate::events::{DiscoveryEventBus, EventFilter};
use crate::handshake::{Bound, Handshake};
use crate::logger::TracingListener;
use crate::metadata::DeviceDescriptor;
use crate::report::{encode, Command};
use crate::timing::{Delay, ThreadDelay, Timing};
use crate::transport::{HidBackend, HidHandle};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace, warn};

/// How reports are framed on write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteFormat {
    /// `[0x00 report id][command][payload...]`; the firmware sees the command first.
    #[default]
    ReportId,
}

pub struct MouseController<H: HidHandle> {
    device: Mutex<Option<H>>,
    descriptor: Option<DeviceDescriptor>,
    write_format: WriteFormat,
    timing: Timing,
    delay: Arc<dyn Delay>,
}

#[cfg(feature = "hid")]
impl MouseController<crate::backends::hid::HidApiHandle> {
    /// Discover the Arduino on the host HID stack with default settings.
    pub fn open() -> Result<Self> {
        Self::open_with(&ControllerConfig::default())
    }

    pub fn open_with(config: &ControllerConfig) -> Result<Self> {
        let mut backend = crate::backends::hid::HidApiBackend::new()?;
        Self::connect(&mut backend, config)
    }
}

impl<H: HidHandle> MouseController<H> {
    /// Run discovery on `backend`, logging progress through `tracing`.
    pub fn connect<B>(backend: &mut B, config: &ControllerConfig) -> Result<Self>
    where
        B: HidBackend<Handle = H>,
    {
        let mut events = DiscoveryEventBus::new();
        events.add_listener(TracingListener::new(), EventFilter::All);
        Self::connect_with(backend, config, Arc::new(ThreadDelay), &mut events)
    }

    /// Run discovery with an explicit sleep capability and event bus.
    ///
    /// Fails with [`Error::DeviceNotFound`](crate::Error::DeviceNotFound) when no candidate
    /// completes the handshake; calling again later (e.g. after replugging) is fine.
    pub fn connect_with<B>(
        backend: &mut B,
        config: &ControllerConfig,
        delay: Arc<dyn Delay>,
        events: &mut DiscoveryEventBus,
    ) -> Result<Self>
    where
        B: HidBackend<Handle = H>,
    {
        let bound = Handshake::new(backend, config, delay.as_ref(), events).run()?;
        Ok(Self::from_bound(bound, config.timing, delay))
    }

    /// Take ownership of a handle that already passed the handshake.
    pub fn from_bound(bound: Bound<H>, timing: Timing, delay: Arc<dyn Delay>) -> Self {
        Self {
            device: Mutex::new(Some(bound.handle)),
            descriptor: Some(bound.descriptor),
            write_format: WriteFormat::ReportId,
            timing,
            delay,
        }
    }

    /// A controller with no device; every command is a no-op.
    pub fn unbound(timing: Timing, delay: Arc<dyn Delay>) -> Self {
        Self {
            device: Mutex::new(None),
            descriptor: None,
            write_format: WriteFormat::ReportId,
            timing,
            delay,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.lock().is_some()
    }

    /// Descriptor of the interface that was bound, kept after `close()`.
    pub fn descriptor(&self) -> Option<&DeviceDescriptor> {
        self.descriptor.as_ref()
    }

    pub fn write_format(&self) -> WriteFormat {
        self.write_format
    }

    /// Relative move. Fails only if `dx` or `dy` is outside `i16`.
    pub fn move_by(&self, dx: i32, dy: i32) -> Result<()> {
        let cmd = Command::movement(dx, dy)?;
        self.send(cmd);
        Ok(())
    }

    /// Press the left button.
    pub fn click_down(&self) {
        self.send(Command::ButtonDown);
    }

    /// Release the left button.
    pub fn click_up(&self) {
        self.send(Command::ButtonUp);
    }

    /// Down, hold, up.
    pub fn click(&self) {
        self.click_down();
        self.delay.sleep(self.timing.click_hold());
        self.click_up();
    }

    /// Scroll; positive is up. `delta` is sent modulo 256.
    pub fn wheel(&self, delta: i64) {
        self.send(Command::wheel(delta));
    }

    /// Release the device. Safe to call more than once.
    pub fn close(&self) {
        if let Some(mut handle) = self.lock().take() {
            handle.close();
            debug!("device closed");
        }
    }

    fn send(&self, command: Command) {
        let mut guard = self.lock();
        let Some(handle) = guard.as_mut() else {
            debug!(?command, "no device bound, dropping command");
            return;
        };
        let report = match self.write_format {
            WriteFormat::ReportId => encode(command),
        };
        match handle.write(report.as_bytes()) {
            Ok(0) => warn!(?command, "write accepted 0 bytes"),
            Ok(n) => trace!(?command, n, "report sent"),
            Err(e) => warn!(?command, error = %e, "write failed"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<H>> {
        // A panic mid-write leaves the handle itself intact.
        self.device.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<H: HidHandle> Drop for MouseController<H> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<H: HidHandle> std::fmt::Debug for MouseController<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MouseController")
            .field("bound", &self.is_bound())
            .field("descriptor", &self.descriptor)
            .field("write_format", &self.write_format)
            .finish()
    }
}
