//! Vivado batch-mode toolchain.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use z7lite_soc::SocDescription;

use crate::error::{BuildError, Result};
use crate::options::{BuildOptions, MemoryTarget, VivadoOptions};
use crate::process::run_tool;

/// Turns a composed SoC into a bitstream.
pub trait Toolchain {
    /// Write the build inputs and, if `options.compile`, run the tool.
    /// Returns the path of the volatile (`.bit`) artifact.
    fn build(&self, soc: &SocDescription, options: &BuildOptions) -> Result<PathBuf>;
}

#[derive(Debug, Clone, Default)]
pub struct VivadoToolchain {
    pub options: VivadoOptions,
}

impl VivadoToolchain {
    pub fn new(options: VivadoOptions) -> Self {
        Self { options }
    }

    /// The batch script driving project creation through bitstream writing.
    pub fn build_script(&self, soc: &SocDescription, build: &BuildOptions) -> String {
        let name = &build.build_name;
        let opts = &self.options;
        let mut tcl = String::new();

        writeln!(tcl, "# Autogenerated for {}", soc.ident).ok();
        writeln!(tcl, "create_project -force -name {name} -part {}", soc.device).ok();
        writeln!(tcl, "set_msg_config -id {{Common 17-55}} -new_severity {{Warning}}").ok();
        if let Some(threads) = opts.max_threads {
            writeln!(tcl, "set_param general.maxThreads {threads}").ok();
        }
        tcl.push('\n');

        for source in &build.sources {
            writeln!(tcl, "{}", read_source(source)).ok();
        }
        writeln!(tcl, "read_xdc {name}.xdc").ok();
        writeln!(tcl, "set_property PROCESSING_ORDER EARLY [get_files {name}.xdc]").ok();
        tcl.push('\n');

        writeln!(
            tcl,
            "synth_design -directive {} -top {name} -part {}",
            opts.synth_directive, soc.device
        )
        .ok();
        writeln!(tcl, "report_timing_summary -file {name}_timing_synth.rpt").ok();
        writeln!(tcl, "report_utilization -file {name}_utilization_synth.rpt").ok();
        writeln!(tcl, "opt_design -directive {}", opts.opt_directive).ok();
        writeln!(tcl, "place_design -directive {}", opts.place_directive).ok();
        writeln!(tcl, "report_utilization -file {name}_utilization_place.rpt").ok();
        writeln!(tcl, "route_design -directive {}", opts.route_directive).ok();
        writeln!(tcl, "report_timing_summary -no_header -no_detailed_paths").ok();
        writeln!(tcl, "report_timing_summary -file {name}_timing.rpt").ok();
        writeln!(tcl, "report_power -file {name}_power.rpt").ok();
        tcl.push('\n');

        let bit = format!("{name}.{}", MemoryTarget::Sram.extension());
        let bin = format!("{name}.{}", MemoryTarget::Flash.extension());
        writeln!(tcl, "write_bitstream -force {bit}").ok();
        writeln!(
            tcl,
            "write_cfgmem -force -format bin -interface spix4 -size 16 \
             -loadbit \"up 0x0 {bit}\" -file {bin}"
        )
        .ok();
        writeln!(tcl, "quit").ok();
        tcl
    }
}

fn read_source(path: &Path) -> String {
    let command = match path.extension().and_then(|e| e.to_str()) {
        Some("vhd") | Some("vhdl") => "read_vhdl -vhdl2008",
        Some("sv") => "read_verilog -sv",
        Some("xci") => "read_ip",
        _ => "read_verilog",
    };
    format!("{command} {{{}}}", path.display())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|source| BuildError::Write {
        path: path.to_path_buf(),
        source,
    })
}

impl Toolchain for VivadoToolchain {
    fn build(&self, soc: &SocDescription, options: &BuildOptions) -> Result<PathBuf> {
        if options.compile && options.sources.is_empty() {
            return Err(BuildError::Invalid {
                what: "build sources",
                value: format!(
                    "none given, but synthesis needs a top module named '{}'",
                    options.build_name
                ),
            });
        }
        // Vivado runs inside the gateware directory.
        let sources = options
            .sources
            .iter()
            .map(|path| {
                fs::canonicalize(path).map_err(|_| BuildError::Invalid {
                    what: "build source",
                    value: path.display().to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let options = &BuildOptions {
            sources,
            ..options.clone()
        };

        let dir = options.gateware_dir();
        fs::create_dir_all(&dir).map_err(|source| BuildError::Write {
            path: dir.clone(),
            source,
        })?;

        write_file(&options.file("xdc"), &soc.xdc())?;
        write_file(&options.file("json"), &soc.to_json()?)?;
        let script = options.file("tcl");
        write_file(&script, &self.build_script(soc, options))?;
        tracing::info!(dir = %dir.display(), "build files written");

        let artifact = options.file(MemoryTarget::Sram.extension());
        if !options.compile {
            tracing::info!("compilation disabled, skipping vivado");
            return Ok(artifact);
        }

        let script_name = format!("{}.tcl", options.build_name);
        run_tool(
            &self.options.executable,
            ["-mode", "batch", "-source", script_name.as_str()],
            &dir,
        )?;
        tracing::info!(artifact = %artifact.display(), "bitstream built");
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use z7lite_platform::board;
    use z7lite_soc::{compose, SocSettings};

    fn soc() -> SocDescription {
        compose(&SocSettings::default(), &mut board::platform().unwrap()).unwrap()
    }

    #[test]
    fn script_uses_device_and_directives() {
        let toolchain = VivadoToolchain::new(VivadoOptions {
            synth_directive: "AreaOptimized_high".into(),
            route_directive: "Explore".into(),
            max_threads: Some(4),
            ..VivadoOptions::default()
        });
        let build = BuildOptions {
            build_name: "top".into(),
            sources: vec![PathBuf::from("top.v"), PathBuf::from("ip/uart.vhd")],
            ..BuildOptions::default()
        };
        let tcl = toolchain.build_script(&soc(), &build);
        assert!(tcl.contains("create_project -force -name top -part xc7z020-clg400-2"));
        assert!(tcl.contains("set_param general.maxThreads 4"));
        assert!(tcl.contains("read_verilog {top.v}"));
        assert!(tcl.contains("read_vhdl -vhdl2008 {ip/uart.vhd}"));
        assert!(tcl.contains("synth_design -directive AreaOptimized_high -top top"));
        assert!(tcl.contains("route_design -directive Explore"));
        assert!(tcl.contains("write_bitstream -force top.bit"));
        assert!(tcl.contains("-file top.bin"));
    }

    #[test]
    fn no_compile_writes_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let build = BuildOptions {
            output_dir: dir.path().to_path_buf(),
            compile: false,
            ..BuildOptions::default()
        };
        let toolchain = VivadoToolchain::new(VivadoOptions {
            executable: PathBuf::from("z7lite-no-such-tool"),
            ..VivadoOptions::default()
        });
        let artifact = toolchain.build(&soc(), &build).unwrap();

        assert_eq!(artifact, dir.path().join("gateware/z7lite.bit"));
        assert!(!artifact.exists());
        let xdc = fs::read_to_string(build.file("xdc")).unwrap();
        assert!(xdc.contains("set_property LOC N18 [get_ports {clk50}]"));
        assert!(build.file("tcl").exists());
        assert!(build.file("json").exists());
    }

    #[test]
    fn compiling_without_sources_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let build = BuildOptions {
            output_dir: dir.path().to_path_buf(),
            ..BuildOptions::default()
        };
        let toolchain = VivadoToolchain::new(VivadoOptions {
            executable: PathBuf::from("z7lite-no-such-tool"),
            ..VivadoOptions::default()
        });
        let err = toolchain.build(&soc(), &build).unwrap_err();
        assert!(matches!(err, BuildError::Invalid { what: "build sources", .. }));
        assert_eq!(err.kind(), z7lite_platform::ErrorKind::Configuration);
        assert!(!build.gateware_dir().exists());
    }

    #[test]
    fn sources_are_resolved_to_absolute_paths() {
        let dir = tempfile::tempdir().unwrap();
        let top = dir.path().join("top.v");
        fs::write(&top, "module z7lite(); endmodule\n").unwrap();
        let build = BuildOptions {
            output_dir: dir.path().join("out"),
            compile: false,
            sources: vec![top.clone()],
            ..BuildOptions::default()
        };
        VivadoToolchain::default().build(&soc(), &build).unwrap();
        let tcl = fs::read_to_string(build.file("tcl")).unwrap();
        let absolute = fs::canonicalize(&top).unwrap();
        assert!(tcl.contains(&format!("read_verilog {{{}}}", absolute.display())));

        let missing = BuildOptions {
            sources: vec![dir.path().join("missing.v")],
            ..build
        };
        let err = VivadoToolchain::default().build(&soc(), &missing).unwrap_err();
        assert!(matches!(err, BuildError::Invalid { what: "build source", .. }));
    }
}
