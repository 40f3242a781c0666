//! JTAG programming through Vivado's hardware manager.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};
use crate::options::{MemoryTarget, VivadoOptions};
use crate::process::run_tool;

/// Loads a built artifact onto the board.
pub trait Programmer {
    fn load(&self, artifact: &Path, target: MemoryTarget, device: u32) -> Result<()>;
}

impl<P: Programmer + ?Sized> Programmer for &P {
    fn load(&self, artifact: &Path, target: MemoryTarget, device: u32) -> Result<()> {
        (**self).load(artifact, target, device)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VivadoProgrammer {
    pub options: VivadoOptions,
}

impl VivadoProgrammer {
    pub fn new(options: VivadoOptions) -> Self {
        Self { options }
    }

    pub fn load_script(&self, artifact: &Path, target: MemoryTarget, device: u32) -> String {
        let dev = format!("[lindex [get_hw_devices] {device}]");
        let file = artifact.display();
        let mut tcl = String::new();
        writeln!(tcl, "open_hw_manager").ok();
        writeln!(tcl, "connect_hw_server").ok();
        writeln!(tcl, "open_hw_target").ok();
        match target {
            MemoryTarget::Sram => {
                writeln!(tcl, "set_property PROBES.FILE {{}} {dev}").ok();
                writeln!(tcl, "set_property PROGRAM.FILE {{{file}}} {dev}").ok();
                writeln!(tcl, "program_hw_devices {dev}").ok();
                writeln!(tcl, "refresh_hw_device {dev}").ok();
            }
            MemoryTarget::Flash => {
                writeln!(
                    tcl,
                    "create_hw_cfgmem -hw_device {dev} -mem_dev [lindex [get_cfgmem_parts {{{}}}] 0]",
                    self.options.flash_part
                )
                .ok();
                let cfgmem = format!("[get_property PROGRAM.HW_CFGMEM {dev}]");
                writeln!(tcl, "set_property PROGRAM.FILES [list {{{file}}}] {cfgmem}").ok();
                writeln!(tcl, "set_property PROGRAM.ADDRESS_RANGE {{use_file}} {cfgmem}").ok();
                writeln!(tcl, "set_property PROGRAM.ERASE 1 {cfgmem}").ok();
                writeln!(tcl, "set_property PROGRAM.CFG_PROGRAM 1 {cfgmem}").ok();
                writeln!(tcl, "set_property PROGRAM.VERIFY 1 {cfgmem}").ok();
                writeln!(tcl, "program_hw_cfgmem -hw_cfgmem {cfgmem}").ok();
            }
        }
        writeln!(tcl, "quit").ok();
        tcl
    }
}

impl Programmer for VivadoProgrammer {
    fn load(&self, artifact: &Path, target: MemoryTarget, device: u32) -> Result<()> {
        if !artifact.is_file() {
            return Err(BuildError::ArtifactMissing {
                path: artifact.to_path_buf(),
            });
        }
        let dir = match artifact.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        // The tool runs inside `dir`, so both files are referenced by name.
        let file_name = artifact.file_name().map(Path::new).unwrap_or(artifact);
        let script_name = format!("load_{target}.tcl");
        let script = dir.join(&script_name);
        fs::write(&script, self.load_script(file_name, target, device)).map_err(|source| {
            BuildError::Write {
                path: script.clone(),
                source,
            }
        })?;

        tracing::info!(artifact = %artifact.display(), %target, device, "loading");
        run_tool(
            &self.options.executable,
            ["-mode", "batch", "-source", script_name.as_str()],
            &dir,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sram_script_targets_device_index() {
        let tcl = VivadoProgrammer::default().load_script(
            Path::new("gateware/z7lite.bit"),
            MemoryTarget::Sram,
            1,
        );
        assert!(tcl.contains(
            "set_property PROGRAM.FILE {gateware/z7lite.bit} [lindex [get_hw_devices] 1]"
        ));
        assert!(tcl.contains("program_hw_devices [lindex [get_hw_devices] 1]"));
    }

    #[test]
    fn flash_script_programs_cfgmem() {
        let tcl = VivadoProgrammer::default().load_script(
            Path::new("z7lite.bin"),
            MemoryTarget::Flash,
            0,
        );
        assert!(tcl.contains("create_hw_cfgmem -hw_device [lindex [get_hw_devices] 0]"));
        assert!(tcl.contains("program_hw_cfgmem"));
    }

    #[test]
    fn missing_artifact_is_a_lookup_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = VivadoProgrammer::default()
            .load(&dir.path().join("z7lite.bit"), MemoryTarget::Sram, 1)
            .unwrap_err();
        assert!(matches!(err, BuildError::ArtifactMissing { .. }));
        assert_eq!(err.kind(), z7lite_platform::ErrorKind::Lookup);
    }
}
