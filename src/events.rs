//! Discovery progress events.
//!
//! Discovery never prints. Every decision it takes is published as a [`DiscoveryEvent`]
//! on a [`DiscoveryEventBus`]; listeners decide what to do with it (log it, collect it
//! for a UI, assert on it in tests).

use crate::metadata::DeviceDescriptor;
use crate::transport::OpenVia;
use std::collections::HashMap;

/// One step of a discovery pass.
#[derive(Clone, Debug, PartialEq)]
pub enum DiscoveryEvent {
    /// Discovery started.
    Started,
    /// One enumerated interface; `candidate` is the identity-rule verdict.
    DeviceSeen {
        index: usize,
        descriptor: DeviceDescriptor,
        candidate: bool,
    },
    /// Enumeration narrowed to `count` candidates.
    CandidatesSelected { count: usize },
    /// Opening a candidate.
    Opening {
        index: usize,
        descriptor: DeviceDescriptor,
        via: OpenVia,
    },
    OpenFailed { index: usize, reason: String },
    /// The non-blocking switch failed; the handle is closed and the candidate skipped.
    ConfigureFailed { index: usize, reason: String },
    DiscoverSent { index: usize, written: usize },
    WriteFailed { index: usize, reason: String },
    /// Result of the single read after the handshake wait (`0` = nothing).
    ReplyReceived { index: usize, bytes: Vec<u8> },
    HandshakeRejected { index: usize },
    /// The candidate's handle is now owned by the session.
    Bound {
        index: usize,
        descriptor: DeviceDescriptor,
    },
    /// All candidates exhausted.
    NotFound { candidates: usize },
}

impl DiscoveryEvent {
    /// `true` for per-candidate failures and the terminal `NotFound`.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            DiscoveryEvent::OpenFailed { .. }
                | DiscoveryEvent::ConfigureFailed { .. }
                | DiscoveryEvent::WriteFailed { .. }
                | DiscoveryEvent::HandshakeRejected { .. }
                | DiscoveryEvent::NotFound { .. }
        )
    }

    /// `true` for events that end a discovery pass.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DiscoveryEvent::Bound { .. } | DiscoveryEvent::NotFound { .. }
        )
    }
}

/// Receives discovery events.
pub trait DiscoveryListener: Send {
    fn on_event(&mut self, event: &DiscoveryEvent);
}

/// Closures are listeners.
impl<F> DiscoveryListener for F
where
    F: FnMut(&DiscoveryEvent) + Send,
{
    fn on_event(&mut self, event: &DiscoveryEvent) {
        self(event)
    }
}

/// Determines which events a listener wants to receive.
#[derive(Debug, Clone, Copy)]
pub enum EventFilter {
    All,
    FailuresOnly,
    /// `Bound` / `NotFound` only.
    TerminalOnly,
    Custom(fn(&DiscoveryEvent) -> bool),
}

impl EventFilter {
    fn passes(&self, event: &DiscoveryEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::FailuresOnly => event.is_failure(),
            EventFilter::TerminalOnly => event.is_terminal(),
            EventFilter::Custom(f) => f(event),
        }
    }
}

struct ListenerEntry {
    listener: Box<dyn DiscoveryListener>,
    enabled: bool,
    filter: EventFilter,
}

/// Fan-out of discovery events to registered listeners.
#[derive(Default)]
pub struct DiscoveryEventBus {
    next_id: u64,
    listeners: HashMap<u64, ListenerEntry>,
}

impl DiscoveryEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener and returns its id.
    pub fn add_listener(
        &mut self,
        listener: impl DiscoveryListener + 'static,
        filter: EventFilter,
    ) -> u64 {
        let id = self.next_id;
        self.listeners.insert(
            id,
            ListenerEntry {
                listener: Box::new(listener),
                enabled: true,
                filter,
            },
        );
        self.next_id += 1;
        id
    }

    pub fn enable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = true;
        }
    }

    /// Mutes a listener without removing it.
    pub fn disable(&mut self, id: u64) {
        if let Some(entry) = self.listeners.get_mut(&id) {
            entry.enabled = false;
        }
    }

    pub fn remove_listener(&mut self, id: u64) {
        self.listeners.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Delivers one event to every enabled listener whose filter accepts it.
    pub fn emit(&mut self, event: &DiscoveryEvent) {
        for entry in self.listeners.values_mut() {
            if entry.enabled && entry.filter.passes(event) {
                entry.listener.on_event(event);
            }
        }
    }
}
