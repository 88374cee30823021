//! Transport backends for `ardumouse`.
//!
//! Implementations of [`HidBackend`](crate::transport::HidBackend).
//!
//! # Feature flags
//! - **`hid`**: enables the `hidapi` backend (default).
//!
//! The in-memory [`virtual_hid`] backend is always available.

#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid;

pub mod virtual_hid;
