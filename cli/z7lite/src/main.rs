//! z7lite: compose, build and load SoCs for the Z7-Lite board.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use z7lite_build::{BuildError, LoadRequest, MemoryTarget};
use z7lite_soc::{ConfigurationFlags, CpuType, SocSettings};

use commands::build::Invocation;
use manifest::Z7liteConfig;

#[derive(Parser, Debug)]
#[command(name = "z7lite", version, about = "SoC builder for the Z7-Lite board")]
struct Cli {
    /// Run the toolchain and produce a bitstream
    #[arg(long)]
    build: bool,
    /// Load the bitstream onto the board
    #[arg(long)]
    load: bool,
    /// System clock frequency in Hz (default: 100e6)
    #[arg(long, value_name = "HZ")]
    sys_clk_freq: Option<f64>,
    /// Add an HDMI video terminal
    #[arg(long)]
    with_video_terminal: bool,
    /// Add an Ethernet MAC
    #[arg(long)]
    with_ethernet: bool,
    /// Add an Etherbone bridge
    #[arg(long)]
    with_etherbone: bool,
    /// Drop the LED chaser
    #[arg(long)]
    without_led_chaser: bool,
    /// Clock the system domain from the processing system
    #[arg(long)]
    ps7_clk: bool,
    /// Add the USB-UART pins on gpio1
    #[arg(long)]
    with_usb_uart_extension: bool,
    /// Merge an extension table (repeatable)
    #[arg(long = "extension", value_name = "FILE")]
    extensions: Vec<PathBuf>,
    /// Print the composed SoC
    #[arg(long)]
    describe: bool,
    /// Configuration file (default: nearest z7lite.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Memory to load into (sram, flash)
    #[arg(long, value_name = "TARGET")]
    load_target: Option<MemoryTarget>,
    /// JTAG device index to program
    #[arg(long, value_name = "N")]
    device: Option<u32>,

    #[command(flatten)]
    builder: BuilderArgs,
    #[command(flatten)]
    soc: SocArgs,
    #[command(flatten)]
    toolchain: ToolchainArgs,
}

#[derive(Args, Debug)]
#[command(next_help_heading = "Builder")]
struct BuilderArgs {
    /// Root of the build tree
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// Base name of generated files
    #[arg(long, value_name = "NAME")]
    build_name: Option<String>,
    /// Write build files without running the toolchain
    #[arg(long)]
    no_compile: bool,
    /// HDL source read before synthesis (repeatable)
    #[arg(long = "source", value_name = "FILE")]
    sources: Vec<PathBuf>,
}

#[derive(Args, Debug)]
#[command(next_help_heading = "SoC")]
struct SocArgs {
    /// CPU type (vexriscv, none, zynq7000, ...)
    #[arg(long, value_name = "CPU")]
    cpu_type: Option<String>,
    /// UART (serial, usb_uart, jtag_uart, crossover, stub, none)
    #[arg(long, value_name = "NAME")]
    uart_name: Option<String>,
    /// SoC identifier string
    #[arg(long)]
    ident: Option<String>,
}

#[derive(Args, Debug)]
#[command(next_help_heading = "Toolchain")]
struct ToolchainArgs {
    /// Vivado executable
    #[arg(long, value_name = "PATH")]
    vivado_path: Option<PathBuf>,
    #[arg(long, value_name = "DIRECTIVE")]
    vivado_synth_directive: Option<String>,
    #[arg(long, value_name = "DIRECTIVE")]
    vivado_opt_directive: Option<String>,
    #[arg(long, value_name = "DIRECTIVE")]
    vivado_place_directive: Option<String>,
    #[arg(long, value_name = "DIRECTIVE")]
    vivado_route_directive: Option<String>,
    #[arg(long, value_name = "N")]
    vivado_max_threads: Option<u32>,
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(exit_code(&e));
    }
}

/// A failed external tool's status, otherwise 1.
fn exit_code(e: &anyhow::Error) -> i32 {
    e.chain()
        .find_map(|cause| cause.downcast_ref::<BuildError>())
        .and_then(BuildError::tool_exit_code)
        .filter(|code| *code != 0)
        .unwrap_or(1)
}

fn run(cli: Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let (config, config_dir) = match &cli.config {
        Some(path) => {
            let config = Z7liteConfig::load(path)?;
            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (config, dir)
        }
        None => match Z7liteConfig::find_and_load(&cwd)? {
            Some((config, dir)) => {
                tracing::info!(dir = %dir.display(), "using {}", manifest::FILE_NAME);
                (config, dir)
            }
            None => (Z7liteConfig::default(), cwd),
        },
    };

    let invocation = resolve(cli, config, &config_dir)?;
    commands::build::run(&invocation)
}

/// Parse a frequency given in Hz, possibly in float notation (`100e6`).
fn parse_frequency(hz: f64) -> Result<u64> {
    if !hz.is_finite() || hz < 1.0 || hz > u64::MAX as f64 {
        bail!("invalid system clock frequency: {hz}");
    }
    let rounded = hz.round();
    if (rounded - hz).abs() > 1e-3 {
        bail!("system clock frequency must be a whole number of Hz: {hz}");
    }
    Ok(rounded as u64)
}

/// Merge the configuration file with command-line flags; flags win.
fn resolve(cli: Cli, config: Z7liteConfig, config_dir: &Path) -> Result<Invocation> {
    let defaults = SocSettings::default();
    let file = config.features;

    let sys_clk_hz = match cli.sys_clk_freq.or(config.soc.sys_clk_freq) {
        Some(hz) => parse_frequency(hz).context("--sys-clk-freq")?,
        None => defaults.sys_clk_hz,
    };

    let flags = ConfigurationFlags {
        ethernet: cli.with_ethernet || file.ethernet.unwrap_or(false),
        etherbone: cli.with_etherbone || file.etherbone.unwrap_or(false),
        video_terminal: cli.with_video_terminal || file.video_terminal.unwrap_or(false),
        led_chaser: !cli.without_led_chaser && file.led_chaser.unwrap_or(true),
        ps7_clk: cli.ps7_clk || file.ps7_clk.unwrap_or(false),
    };

    let cpu = cli
        .soc
        .cpu_type
        .or(config.soc.cpu_type)
        .map(|name| CpuType::parse(&name))
        .unwrap_or(defaults.cpu);
    let uart = match cli.soc.uart_name.or(config.soc.uart_name) {
        Some(name) if name == "none" => None,
        Some(name) => Some(name),
        None => defaults.uart,
    };

    let settings = SocSettings {
        ident: cli.soc.ident.or(config.soc.ident).unwrap_or(defaults.ident),
        sys_clk_hz,
        flags,
        cpu,
        uart,
    };

    let mut extensions: Vec<PathBuf> = file
        .extensions
        .into_iter()
        .map(|p| config_dir.join(p))
        .collect();
    extensions.extend(cli.extensions);

    let mut build = config.build;
    if let Some(dir) = cli.builder.output_dir {
        build.output_dir = dir;
    }
    if let Some(name) = cli.builder.build_name {
        build.build_name = name;
    }
    build.sources = build
        .sources
        .into_iter()
        .map(|p| config_dir.join(p))
        .chain(cli.builder.sources)
        .collect();
    build.compile = cli.build && build.compile && !cli.builder.no_compile;

    let mut vivado = config.toolchain;
    let tc = cli.toolchain;
    if let Some(path) = tc.vivado_path {
        vivado.executable = path;
    }
    if let Some(d) = tc.vivado_synth_directive {
        vivado.synth_directive = d;
    }
    if let Some(d) = tc.vivado_opt_directive {
        vivado.opt_directive = d;
    }
    if let Some(d) = tc.vivado_place_directive {
        vivado.place_directive = d;
    }
    if let Some(d) = tc.vivado_route_directive {
        vivado.route_directive = d;
    }
    if let Some(n) = tc.vivado_max_threads {
        vivado.max_threads = Some(n);
    }

    let load = cli.load.then(|| LoadRequest {
        target: cli.load_target.unwrap_or(config.load.target),
        device: cli.device.unwrap_or(config.load.device),
    });

    Ok(Invocation {
        settings,
        usb_uart_extension: cli.with_usb_uart_extension
            || file.usb_uart_extension.unwrap_or(false),
        extensions,
        build,
        vivado,
        load,
        describe: cli.describe,
    })
}
