//! Builder, toolchain and load options.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BuildError;

/// Where build products go and whether the toolchain actually runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct BuildOptions {
    /// Root of the build tree; gateware lands in `<output_dir>/gateware`.
    pub output_dir: PathBuf,
    /// Base name of every generated file and the top-level module.
    pub build_name: String,
    /// When false, scripts are written but the toolchain is not run.
    pub compile: bool,
    /// HDL sources read into the project. Compiling needs at least one.
    pub sources: Vec<PathBuf>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("build/z7lite"),
            build_name: "z7lite".into(),
            compile: true,
            sources: Vec::new(),
        }
    }
}

impl BuildOptions {
    pub fn gateware_dir(&self) -> PathBuf {
        self.output_dir.join("gateware")
    }

    /// `<gateware_dir>/<build_name>.<extension>`
    pub fn file(&self, extension: &str) -> PathBuf {
        self.gateware_dir()
            .join(format!("{}.{extension}", self.build_name))
    }
}

/// Vivado invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct VivadoOptions {
    /// Executable name or path.
    pub executable: PathBuf,
    pub synth_directive: String,
    pub opt_directive: String,
    pub place_directive: String,
    pub route_directive: String,
    /// `general.maxThreads`; Vivado's own default when unset.
    pub max_threads: Option<u32>,
    /// Configuration memory part used when writing the persistent image.
    pub flash_part: String,
}

impl Default for VivadoOptions {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("vivado"),
            synth_directive: "default".into(),
            opt_directive: "default".into(),
            place_directive: "default".into(),
            route_directive: "default".into(),
            max_threads: None,
            flash_part: "s25fl128sxxxxxx0-spi-x1_x2_x4".into(),
        }
    }
}

/// Which memory a loaded image targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryTarget {
    /// Volatile configuration memory, lost on power cycle.
    #[default]
    Sram,
    /// Persistent configuration flash.
    Flash,
}

impl MemoryTarget {
    /// File extension of the artifact loaded into this memory.
    pub fn extension(self) -> &'static str {
        match self {
            MemoryTarget::Sram => "bit",
            MemoryTarget::Flash => "bin",
        }
    }
}

impl fmt::Display for MemoryTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryTarget::Sram => f.write_str("sram"),
            MemoryTarget::Flash => f.write_str("flash"),
        }
    }
}

impl FromStr for MemoryTarget {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sram" => Ok(MemoryTarget::Sram),
            "flash" => Ok(MemoryTarget::Flash),
            other => Err(BuildError::Invalid {
                what: "memory target",
                value: other.to_string(),
            }),
        }
    }
}

/// JTAG chain position of the programmable logic on the Z7-Lite.
pub const DEFAULT_DEVICE_INDEX: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_gateware() {
        let opts = BuildOptions {
            output_dir: PathBuf::from("out"),
            build_name: "top".into(),
            ..BuildOptions::default()
        };
        assert_eq!(opts.file("xdc"), PathBuf::from("out/gateware/top.xdc"));
    }

    #[test]
    fn memory_target_parsing() {
        assert_eq!("sram".parse::<MemoryTarget>().unwrap(), MemoryTarget::Sram);
        assert_eq!("flash".parse::<MemoryTarget>().unwrap().extension(), "bin");
        assert!("rom".parse::<MemoryTarget>().is_err());
        assert_eq!(MemoryTarget::default().to_string(), "sram");
    }
}
