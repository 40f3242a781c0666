//! `z7lite.toml` parsing.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use z7lite_build::{BuildOptions, MemoryTarget, VivadoOptions, DEFAULT_DEVICE_INDEX};

pub const FILE_NAME: &str = "z7lite.toml";

/// Project configuration. Every section is optional; command-line flags win.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Z7liteConfig {
    pub soc: SocConfig,
    pub features: FeaturesConfig,
    pub build: BuildOptions,
    pub toolchain: VivadoOptions,
    pub load: LoadConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SocConfig {
    pub ident: Option<String>,
    pub sys_clk_freq: Option<f64>,
    pub cpu_type: Option<String>,
    pub uart_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FeaturesConfig {
    pub ethernet: Option<bool>,
    pub etherbone: Option<bool>,
    pub video_terminal: Option<bool>,
    pub led_chaser: Option<bool>,
    pub ps7_clk: Option<bool>,
    pub usb_uart_extension: Option<bool>,
    /// Extension tables, relative to the directory holding `z7lite.toml`.
    pub extensions: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    pub target: MemoryTarget,
    pub device: u32,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            target: MemoryTarget::Sram,
            device: DEFAULT_DEVICE_INDEX,
        }
    }
}

impl Z7liteConfig {
    /// Search upward from `start_dir` for a `z7lite.toml` file, parse and return it
    /// along with the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(FILE_NAME);
            if candidate.is_file() {
                let config = Self::load(&candidate)?;
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    /// Load an explicit configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let config: Z7liteConfig = toml::from_str(
            r#"
[soc]
ident = "bench"
sys-clk-freq = 125e6
cpu-type = "none"
uart-name = "jtag_uart"

[features]
ethernet = true
led-chaser = false
extensions = ["pmod.toml"]

[build]
output-dir = "out"
build-name = "bench"
compile = false

[toolchain]
executable = "/opt/Xilinx/Vivado/2023.2/bin/vivado"
route-directive = "Explore"
max-threads = 8

[load]
target = "flash"
device = 0
"#,
        )
        .unwrap();
        assert_eq!(config.soc.ident.as_deref(), Some("bench"));
        assert_eq!(config.soc.sys_clk_freq, Some(125e6));
        assert_eq!(config.features.ethernet, Some(true));
        assert_eq!(config.features.led_chaser, Some(false));
        assert_eq!(config.features.extensions, vec![PathBuf::from("pmod.toml")]);
        assert_eq!(config.build.build_name, "bench");
        assert!(!config.build.compile);
        assert_eq!(config.toolchain.route_directive, "Explore");
        assert_eq!(config.toolchain.synth_directive, "default");
        assert_eq!(config.toolchain.max_threads, Some(8));
        assert_eq!(config.load.target, MemoryTarget::Flash);
        assert_eq!(config.load.device, 0);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Z7liteConfig = toml::from_str("").unwrap();
        assert_eq!(config.build, BuildOptions::default());
        assert_eq!(config.load.device, DEFAULT_DEVICE_INDEX);
        assert!(config.features.extensions.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Z7liteConfig>("[soc]\nclock = 1").is_err());
    }

    #[test]
    fn find_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FILE_NAME), "[soc]\nident = \"found\"\n").unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, found) = Z7liteConfig::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(found, dir.path());
        assert_eq!(config.soc.ident.as_deref(), Some("found"));
    }

    #[test]
    fn find_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FILE_NAME), "[soc\n").unwrap();
        let err = Z7liteConfig::find_and_load(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }
}
