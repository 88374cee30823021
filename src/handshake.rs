//! Discovery handshake.
//!
//! For each candidate, in enumeration order:
//!
//! 1. **Open** the interface (by path when known, else by VID/PID).
//! 2. **Configure** non-blocking reads. Failure closes the handle and skips the candidate.
//! 3. **Send** one `Discover` report. Zero bytes written or an error skips the candidate.
//! 4. **Await** the configured wait (500 ms by default). One fixed sleep, no polling.
//! 5. **Validate** one zero-timeout read of up to 64 bytes against the handshake marker.
//!
//! The first candidate that validates is returned as a [`Bound`] handle and the rest are
//! never opened. Every other handle is closed before moving on. Per-candidate failures
//! are reported on the event bus and swallowed; only running out of candidates is an
//! error ([`Error::DeviceNotFound`]).

use crate::config::ControllerConfig;
use crate::error::{Error, Result};
use crate::events::{DiscoveryEvent, DiscoveryEventBus};
use crate::matcher::{find_candidates, Candidate};
use crate::metadata::DeviceDescriptor;
use crate::report::{contains_marker, encode, Command, REPORT_LEN};
use crate::transport::{HidBackend, HidHandle, OpenVia};
use crate::timing::Delay;
use std::time::Duration;

/// A validated handle together with the descriptor it was opened from.
pub struct Bound<H> {
    pub handle: H,
    pub descriptor: DeviceDescriptor,
    /// Position in the enumeration that produced it.
    pub index: usize,
}

impl<H> std::fmt::Debug for Bound<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bound")
            .field("descriptor", &self.descriptor)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// One discovery pass over a backend.
pub struct Handshake<'a, B: HidBackend> {
    backend: &'a mut B,
    config: &'a ControllerConfig,
    delay: &'a dyn Delay,
    events: &'a mut DiscoveryEventBus,
}

impl<'a, B: HidBackend> Handshake<'a, B> {
    pub fn new(
        backend: &'a mut B,
        config: &'a ControllerConfig,
        delay: &'a dyn Delay,
        events: &'a mut DiscoveryEventBus,
    ) -> Self {
        Self {
            backend,
            config,
            delay,
            events,
        }
    }

    /// Enumerate, filter, and try candidates until one binds.
    pub fn run(&mut self) -> Result<Bound<B::Handle>> {
        self.events.emit(&DiscoveryEvent::Started);

        let devices = self.backend.enumerate()?;
        let candidates = find_candidates(&self.config.identity, &devices);

        for (index, descriptor) in devices.iter().enumerate() {
            self.events.emit(&DiscoveryEvent::DeviceSeen {
                index,
                descriptor: descriptor.clone(),
                candidate: candidates.iter().any(|c| c.index == index),
            });
        }
        self.events.emit(&DiscoveryEvent::CandidatesSelected {
            count: candidates.len(),
        });

        for candidate in &candidates {
            match self.attempt(candidate) {
                Ok(handle) => {
                    self.events.emit(&DiscoveryEvent::Bound {
                        index: candidate.index,
                        descriptor: candidate.descriptor.clone(),
                    });
                    return Ok(Bound {
                        handle,
                        descriptor: candidate.descriptor.clone(),
                        index: candidate.index,
                    });
                }
                Err(e) if e.is_candidate_local() => continue,
                Err(e) => return Err(e),
            }
        }

        self.events.emit(&DiscoveryEvent::NotFound {
            candidates: candidates.len(),
        });
        Err(Error::DeviceNotFound {
            candidates: candidates.len(),
        })
    }

    /// Run the open/configure/send/await/validate sequence against one candidate.
    ///
    /// On success the open handle is returned; on failure it has already been closed.
    pub fn attempt(&mut self, candidate: &Candidate<'_>) -> Result<B::Handle> {
        let index = candidate.index;
        let info = candidate.descriptor;

        self.events.emit(&DiscoveryEvent::Opening {
            index,
            descriptor: info.clone(),
            via: OpenVia::for_descriptor(info),
        });
        let mut handle = match self.backend.open(info) {
            Ok(h) => h,
            Err(source) => {
                self.events.emit(&DiscoveryEvent::OpenFailed {
                    index,
                    reason: source.to_string(),
                });
                return Err(Error::DeviceOpenFailed {
                    device: info.label(),
                    source,
                });
            }
        };

        if let Err(e) = handle.set_nonblocking(true) {
            self.events.emit(&DiscoveryEvent::ConfigureFailed {
                index,
                reason: e.to_string(),
            });
            handle.close();
            return Err(Error::ConfigureFailed {
                device: info.label(),
                source: e,
            });
        }

        match self.exchange(index, info, &mut handle) {
            Ok(()) => Ok(handle),
            Err(e) => {
                handle.close();
                Err(e)
            }
        }
    }

    /// Send / Await / Validate. Leaves closing to the caller.
    fn exchange(
        &mut self,
        index: usize,
        info: &DeviceDescriptor,
        handle: &mut B::Handle,
    ) -> Result<()> {
        let report = encode(Command::Discover);
        let written = match handle.write(report.as_bytes()) {
            Ok(0) => {
                let reason = String::from("0 bytes written");
                self.events.emit(&DiscoveryEvent::WriteFailed {
                    index,
                    reason: reason.clone(),
                });
                return Err(Error::WriteFailed {
                    device: info.label(),
                    reason,
                });
            }
            Ok(n) => n,
            Err(e) => {
                self.events.emit(&DiscoveryEvent::WriteFailed {
                    index,
                    reason: e.to_string(),
                });
                return Err(Error::WriteFailed {
                    device: info.label(),
                    reason: e.to_string(),
                });
            }
        };
        self.events
            .emit(&DiscoveryEvent::DiscoverSent { index, written });

        self.delay.sleep(self.config.timing.handshake_wait());

        let mut buf = [0u8; REPORT_LEN];
        let len = self.config.handshake.reply_len.min(REPORT_LEN);
        let reply = match handle.read(&mut buf[..len], Some(Duration::ZERO)) {
            Ok(n) => &buf[..n],
            Err(e) => {
                tracing::debug!(index, error = %e, "handshake read failed");
                &buf[..0]
            }
        };
        self.events.emit(&DiscoveryEvent::ReplyReceived {
            index,
            bytes: reply.to_vec(),
        });

        if !reply.is_empty() && contains_marker(reply, self.config.handshake.marker.as_bytes()) {
            return Ok(());
        }

        self.events
            .emit(&DiscoveryEvent::HandshakeRejected { index });
        Err(Error::HandshakeRejected {
            device: info.label(),
        })
    }
}
