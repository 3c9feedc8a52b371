//! Marauder Console: a headless serial console for ESP32 Marauder firmware
//!
//! The library owns the serial command session: it opens the board's serial
//! port, writes newline-terminated commands, reads device output on a
//! background thread and classifies lines by the substrings the firmware is
//! known to print (discovered SSIDs, scan completion, attacks starting).
//! Frontends consume everything through the session's event channel.
//!
//! The `marauder` binary is one such frontend: a line console with port
//! listing, one-shot sends and the canned actions of the desktop tool.

#[doc(hidden)]
pub mod boot;
#[doc(hidden)]
pub mod cli;
pub mod protocol;

pub use protocol::*;
