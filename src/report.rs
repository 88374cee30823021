//! Fixed-size command reports.
//!
//! Every report the host sends is exactly [`REPORT_LEN`] bytes:
//!
//! ```text
//! [0x00 report-id placeholder][command code][payload, little-endian][zero padding ...]
//! ```
//!
//! The firmware's HID stack strips the leading report ID, so on the device side the
//! command code is the first byte. Payload layouts are fixed per command:
//!
//! | Command      | Code | Payload                         |
//! |--------------|------|---------------------------------|
//! | `Discover`   | 0x01 | none                            |
//! | `Move`       | 0x02 | `dx: i16 LE`, `dy: i16 LE`      |
//! | `ButtonDown` | 0x03 | none                            |
//! | `ButtonUp`   | 0x04 | none                            |
//! | `Wheel`      | 0x05 | one byte, `delta mod 256`       |
//!
//! Nothing here performs I/O.

use crate::error::{Error, Result};

/// Total length of a report on the wire, including the report-ID placeholder.
pub const REPORT_LEN: usize = 64;

/// Report ID the host always sends in byte 0.
pub const REPORT_ID: u8 = 0x00;

/// Marker the firmware includes in its reply to [`Command::Discover`].
pub const HANDSHAKE_MARKER: &[u8] = b"Arduino_Mouse";

pub const CMD_DISCOVER: u8 = 0x01;
pub const CMD_MOVE: u8 = 0x02;
pub const CMD_BUTTON_DOWN: u8 = 0x03;
pub const CMD_BUTTON_UP: u8 = 0x04;
pub const CMD_WHEEL: u8 = 0x05;

/// Offset of the first payload byte.
const PAYLOAD_START: usize = 2;

/// A host-to-device command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Discover,
    /// Relative motion in device counts.
    Move { dx: i16, dy: i16 },
    ButtonDown,
    ButtonUp,
    /// Scroll ticks, positive = up. Sent as the two's-complement byte of `delta`.
    Wheel { delta: i8 },
}

impl Command {
    /// Build a `Move`, rejecting deltas outside the signed 16-bit range.
    pub fn movement(dx: i32, dy: i32) -> Result<Self> {
        let dx = i16::try_from(dx)
            .map_err(|_| Error::InvalidArgument(format!("dx {dx} does not fit in i16")))?;
        let dy = i16::try_from(dy)
            .map_err(|_| Error::InvalidArgument(format!("dy {dy} does not fit in i16")))?;
        Ok(Command::Move { dx, dy })
    }

    /// Build a `Wheel` from any integer; the value is reduced modulo 256.
    pub fn wheel(delta: i64) -> Self {
        Command::Wheel {
            delta: delta.rem_euclid(256) as u8 as i8,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Command::Discover => CMD_DISCOVER,
            Command::Move { .. } => CMD_MOVE,
            Command::ButtonDown => CMD_BUTTON_DOWN,
            Command::ButtonUp => CMD_BUTTON_UP,
            Command::Wheel { .. } => CMD_WHEEL,
        }
    }
}

/// One encoded report, always [`REPORT_LEN`] bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Report([u8; REPORT_LEN]);

impl Report {
    /// Wrap raw bytes as a report. Shorter input is zero-padded; longer input is rejected.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > REPORT_LEN {
            return Err(Error::MalformedReport(format!(
                "{} bytes exceeds the {REPORT_LEN}-byte report size",
                bytes.len()
            )));
        }
        let mut buf = [0u8; REPORT_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Report(buf))
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; REPORT_LEN] {
        &self.0
    }

    #[inline]
    pub fn command_code(&self) -> u8 {
        self.0[1]
    }

    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.0[PAYLOAD_START..]
    }
}

impl std::fmt::Debug for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Trailing padding is noise in logs; show up to the last non-zero byte.
        let end = self
            .0
            .iter()
            .rposition(|&b| b != 0)
            .map_or(PAYLOAD_START, |i| (i + 1).max(PAYLOAD_START));
        write!(f, "Report({:02x?} +{} zero)", &self.0[..end], REPORT_LEN - end)
    }
}

impl AsRef<[u8]> for Report {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Encode a command into its wire report.
pub fn encode(command: Command) -> Report {
    let mut buf = [0u8; REPORT_LEN];
    buf[0] = REPORT_ID;
    buf[1] = command.code();
    match command {
        Command::Move { dx, dy } => {
            buf[2..4].copy_from_slice(&dx.to_le_bytes());
            buf[4..6].copy_from_slice(&dy.to_le_bytes());
        }
        Command::Wheel { delta } => buf[2] = delta as u8,
        Command::Discover | Command::ButtonDown | Command::ButtonUp => {}
    }
    Report(buf)
}

/// Decode a host-form report back into a command.
///
/// Only the command code and its fixed payload bytes are inspected; padding is ignored.
pub fn decode(report: &Report) -> Result<Command> {
    let p = report.payload();
    match report.command_code() {
        CMD_DISCOVER => Ok(Command::Discover),
        CMD_MOVE => Ok(Command::Move {
            dx: i16::from_le_bytes([p[0], p[1]]),
            dy: i16::from_le_bytes([p[2], p[3]]),
        }),
        CMD_BUTTON_DOWN => Ok(Command::ButtonDown),
        CMD_BUTTON_UP => Ok(Command::ButtonUp),
        CMD_WHEEL => Ok(Command::Wheel { delta: p[0] as i8 }),
        other => Err(Error::UnknownCommand(other)),
    }
}

/// `true` iff `bytes` contains the `Arduino_Mouse` marker anywhere.
pub fn decode_handshake_reply(bytes: &[u8]) -> bool {
    contains_marker(bytes, HANDSHAKE_MARKER)
}

/// Substring search used by [`decode_handshake_reply`]; an empty marker never matches.
pub fn contains_marker(bytes: &[u8], marker: &[u8]) -> bool {
    !marker.is_empty()
        && bytes.len() >= marker.len()
        && bytes.windows(marker.len()).any(|w| w == marker)
}
