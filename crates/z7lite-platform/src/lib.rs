//! Pin, connector, and constraint model for the Z7-Lite FPGA board.
//!
//! A [`PlatformDescriptor`] owns the board's IO table and connector pad
//! tables and hands out exclusive pin bindings through the [`PinProvider`]
//! capability:
//! - every `(name, instance)` can be bound once,
//! - no package pin can end up driving two nets,
//! - extension tables merge only if none of their names exist yet.
//!
//! The [`board`] module carries the Z7-Lite tables themselves.

pub mod board;
pub mod connector;
pub mod constraints;
pub mod descriptor;
pub mod error;
pub mod parse;
pub mod pins;

pub use connector::{ConnectorTable, HeaderGeometry};
pub use constraints::{render_xdc, ConstraintSet, FalsePath, PeriodConstraint};
pub use descriptor::{DefaultClock, PinProvider, PlatformDescriptor};
pub use error::{ErrorKind, PlatformError, Result};
pub use parse::{load_extension_toml, parse_extension_toml};
pub use pins::{BoundSignal, BoundSubsignal, IoStandard, Misc, Pin, Pins, Signal, Subsignal};
