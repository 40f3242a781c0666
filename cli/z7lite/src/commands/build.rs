//! Compose the SoC, then build and load it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use z7lite_build::{BuildOptions, BuildPipeline, LoadRequest, VivadoOptions};
use z7lite_platform::{board, load_extension_toml, PinProvider, PlatformDescriptor};
use z7lite_soc::{compose, SocDescription, SocSettings};

/// Fully resolved invocation: configuration file merged with flags.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub settings: SocSettings,
    pub usb_uart_extension: bool,
    pub extensions: Vec<PathBuf>,
    pub build: BuildOptions,
    pub vivado: VivadoOptions,
    pub load: Option<LoadRequest>,
    pub describe: bool,
}

pub fn platform(inv: &Invocation) -> Result<PlatformDescriptor> {
    let mut platform = board::platform().context("building the Z7-Lite platform")?;
    if inv.usb_uart_extension {
        platform
            .add_extension(board::usb_uart_io())
            .context("adding the USB-UART extension")?;
    }
    for path in &inv.extensions {
        let table = load_extension_toml(path)
            .with_context(|| format!("loading extension {}", path.display()))?;
        platform
            .add_extension(table)
            .with_context(|| format!("merging extension {}", path.display()))?;
    }
    Ok(platform)
}

pub fn compose_soc(inv: &Invocation) -> Result<SocDescription> {
    let mut platform = platform(inv)?;
    let soc = compose(&inv.settings, &mut platform).context("composing the SoC")?;
    tracing::info!(
        ident = %soc.ident,
        modules = soc.modules.len(),
        pins = soc.bindings.len(),
        "SoC composed"
    );
    Ok(soc)
}

pub fn run(inv: &Invocation) -> Result<()> {
    let soc = compose_soc(inv)?;
    if inv.describe {
        super::describe::print(&soc)?;
    }

    let pipeline = BuildPipeline::vivado(inv.build.clone(), inv.vivado.clone());
    let artifact = pipeline.run(&soc, inv.load)?;
    if inv.build.compile {
        println!("Bitstream: {}", artifact.display());
    } else {
        println!(
            "Build files written to {}",
            pipeline.options().gateware_dir().display()
        );
    }
    if let Some(request) = inv.load {
        println!(
            "Loaded {} into {} (device {})",
            pipeline.artifact_path(request.target).display(),
            request.target,
            request.device
        );
    }
    Ok(())
}
