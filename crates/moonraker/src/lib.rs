//! Blocking client for the Moonraker REST API of Klipper printers.
//!
//! This crate queries machine state and issues motion and tool-change
//! commands for tool-alignment work. Every call is a plain HTTP GET against a
//! fixed set of JSON endpoints; there is no connection state beyond the
//! underlying HTTP client.
//!
//! # Overview
//!
//! - **Printer**: a connected controller. Construction checks that the host
//!   reports `ready` and discovers the tools it exposes.
//! - **Tool**: a discovered tool with its index, name, nozzle size and offset.
//! - **MachineStatus**: every controller state collapses to idle, paused or
//!   processing.
//! - **Transport**: the seam between client logic and HTTP.
//!
//! Tool changes and moves wait for the machine to go idle by polling at a
//! fixed interval until a per-operation timeout. Errors carry their kind;
//! [`Error::is_recoverable`] tells a caller whether the machine is still
//! usable.
//!
//! # Example
//!
//! ```no_run
//! use moonraker::{Axes, ClientConfig, Move, Printer};
//!
//! let config = ClientConfig::new("http://192.168.1.20").with_nickname("toolchanger");
//! let printer = Printer::connect(&config)?;
//!
//! for tool in printer.tools() {
//!     println!("{}: {:?}", tool.name, tool.offset);
//! }
//!
//! printer.load_tool(0)?;
//! printer.move_relative(&Move::to(Axes::new().x(5.0)))?;
//! println!("now at {:?}", printer.coordinates()?);
//! # Ok::<(), moonraker::Error>(())
//! ```

mod client;
mod config;
mod error;
pub mod gcode;
mod poll;
mod status;
mod tool;
mod transport;

#[cfg(test)]
mod mock;

pub use client::{Printer, PrinterSnapshot};
pub use config::{ClientConfig, HttpConfig, ObjectNames, PollConfig};
pub use error::{Error, Result};
pub use gcode::{Move, Positioning};
pub use poll::{PollOutcome, poll_until};
pub use status::MachineStatus;
pub use tool::{Axes, DEFAULT_NOZZLE_SIZE, Tool, ToolView, Xyz, round3};
pub use transport::{HttpTransport, Transport};
