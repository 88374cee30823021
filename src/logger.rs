//! A listener that logs all discovery events through `tracing`.
use crate::events::{DiscoveryEvent, DiscoveryListener};
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingListener;

impl TracingListener {
    pub fn new() -> Self {
        TracingListener
    }
}

impl DiscoveryListener for TracingListener {
    fn on_event(&mut self, event: &DiscoveryEvent) {
        match event {
            DiscoveryEvent::Started => info!("searching for Arduino RawHID interface"),
            DiscoveryEvent::DeviceSeen {
                index,
                descriptor,
                candidate,
            } => debug!(index, candidate, "{descriptor}"),
            DiscoveryEvent::CandidatesSelected { count } => {
                info!(count, "RawHID Arduino interface(s) found")
            }
            DiscoveryEvent::Opening {
                index,
                descriptor,
                via,
            } => debug!(index, %via, device = %descriptor.label(), "opening candidate"),
            DiscoveryEvent::OpenFailed { index, reason } => {
                warn!(index, %reason, "open failed, skipping")
            }
            DiscoveryEvent::ConfigureFailed { index, reason } => {
                warn!(index, %reason, "could not switch to non-blocking reads, skipping")
            }
            DiscoveryEvent::DiscoverSent { index, written } => {
                debug!(index, written, "discover sent, waiting for response")
            }
            DiscoveryEvent::WriteFailed { index, reason } => {
                warn!(index, %reason, "discover write failed, skipping")
            }
            DiscoveryEvent::ReplyReceived { index, bytes } => {
                debug!(index, len = bytes.len(), "response {:02x?}", bytes)
            }
            DiscoveryEvent::HandshakeRejected { index } => {
                debug!(index, "no valid response, closed device")
            }
            DiscoveryEvent::Bound { index, descriptor } => info!(
                index,
                product = descriptor.product_string.as_deref().unwrap_or("?"),
                "found Arduino"
            ),
            DiscoveryEvent::NotFound { candidates } => {
                warn!(candidates, "Arduino RawHID interface not found")
            }
        }
    }
}
