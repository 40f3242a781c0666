//! Build and load pipeline for the Z7-Lite board target.
//!
//! A composed [`SocDescription`](z7lite_soc::SocDescription) is turned into a
//! constraint file, a Vivado batch script and a JSON description, the
//! toolchain is run, and the resulting artifact can be loaded over JTAG.

pub mod error;
pub mod options;
pub mod pipeline;
pub mod process;
pub mod programmer;
pub mod vivado;

pub use error::{BuildError, Result};
pub use options::{BuildOptions, MemoryTarget, VivadoOptions, DEFAULT_DEVICE_INDEX};
pub use pipeline::{BuildPipeline, LoadRequest};
pub use programmer::{Programmer, VivadoProgrammer};
pub use vivado::{Toolchain, VivadoToolchain};
