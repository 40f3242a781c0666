//! The composed SoC description handed to the toolchain.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};
use z7lite_platform::{render_xdc, BoundSignal, ConstraintSet};

use crate::clock::{ClockDomain, ClockDomains};
use crate::error::Result;
use crate::modules::FeatureModule;
use crate::plan::CpuType;

/// Immutable result of a composition run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SocDescription {
    pub ident: String,
    pub device: String,
    pub sys_clk_hz: u64,
    pub cpu: CpuType,
    pub domains: ClockDomains,
    pub modules: Vec<FeatureModule>,
    /// Every pin binding, in request order.
    pub bindings: Vec<BoundSignal>,
    pub constraints: ConstraintSet,
}

impl SocDescription {
    pub fn module(&self, name: &str) -> Option<&FeatureModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn domain(&self, name: &str) -> Option<&ClockDomain> {
        self.domains.domain(name)
    }

    /// Pretty JSON, as written next to the constraint file.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// SHA-256 of the JSON form, as lowercase hex.
    pub fn fingerprint(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        let digest = Sha256::digest(&json);
        Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// Vivado constraints for the bound pins.
    pub fn xdc(&self) -> String {
        render_xdc(&self.bindings, &self.constraints)
    }
}

impl fmt::Display for SocDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.ident)?;
        writeln!(f, "Device: {}", self.device)?;
        writeln!(f, "CPU:    {}", self.cpu)?;
        writeln!(f)?;

        writeln!(f, "--- Clock domains ---")?;
        for d in self.domains.iter() {
            writeln!(
                f,
                "  {:<8} {:>12.3} MHz  reset: {}",
                d.name,
                d.freq_hz as f64 / 1e6,
                d.reset
            )?;
        }
        for g in &self.domains.generators {
            writeln!(
                f,
                "  {} ({:?}, speedgrade {}): {} output(s)",
                g.name,
                g.primitive,
                g.speedgrade,
                g.outputs.len()
            )?;
        }

        writeln!(f)?;
        writeln!(f, "--- Modules ---")?;
        if self.modules.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for m in &self.modules {
            let ports: Vec<&str> = m.pins.iter().map(|p| p.port.as_str()).collect();
            if ports.is_empty() {
                writeln!(f, "  {:<16} [{}]", m.name, m.domain)?;
            } else {
                writeln!(f, "  {:<16} [{}] {}", m.name, m.domain, ports.join(", "))?;
            }
        }

        writeln!(f)?;
        writeln!(f, "--- Pins ---")?;
        for b in &self.bindings {
            let pins = b.package_pins();
            if pins.is_empty() {
                writeln!(f, "  {:<16} (dedicated)", b.port)?;
            } else {
                writeln!(f, "  {:<16} {}", b.port, pins.join(" "))?;
            }
        }
        Ok(())
    }
}
