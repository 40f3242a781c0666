//! Clock-domain generation and SoC composition for the Z7-Lite board.
//!
//! Composition runs in two steps:
//! 1. [`FeaturePlan::evaluate`] turns [`SocSettings`] into an immutable plan
//!    and rejects anything that can be rejected without binding a pin.
//! 2. [`SocComposer::compose`] walks the plan once: it derives the clock
//!    domains, binds pins for each feature, and produces a [`SocDescription`].

pub mod clock;
pub mod compose;
pub mod description;
pub mod error;
pub mod modules;
pub mod plan;

pub use clock::{
    ClockDomain, ClockDomainGenerator, ClockDomains, ClockGenerator, ClockSource, ClockStrategy,
    Primitive, ResetSource, VideoDomains,
};
pub use compose::{compose, SocComposer};
pub use description::SocDescription;
pub use error::{Result, SocError};
pub use modules::{
    CoreFactory, FeatureModule, GatewareCores, ModuleId, ModuleKind, PhyKind, ProtocolKind,
    VideoTimings,
};
pub use plan::{ConfigurationFlags, CpuType, Feature, FeaturePlan, SocSettings};
