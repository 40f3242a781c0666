//! Build-then-load orchestration.

use std::path::PathBuf;

use z7lite_soc::SocDescription;

use crate::error::Result;
use crate::options::{BuildOptions, MemoryTarget, VivadoOptions};
use crate::programmer::{Programmer, VivadoProgrammer};
use crate::vivado::{Toolchain, VivadoToolchain};

/// What to do after composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub target: MemoryTarget,
    /// JTAG chain index of the device to program.
    pub device: u32,
}

/// Drives a [`Toolchain`] and a [`Programmer`] against one build tree.
pub struct BuildPipeline<T, P> {
    toolchain: T,
    programmer: P,
    options: BuildOptions,
}

impl BuildPipeline<VivadoToolchain, VivadoProgrammer> {
    /// Vivado for both building and loading.
    pub fn vivado(options: BuildOptions, vivado: VivadoOptions) -> Self {
        Self::new(
            VivadoToolchain::new(vivado.clone()),
            VivadoProgrammer::new(vivado),
            options,
        )
    }
}

impl<T: Toolchain, P: Programmer> BuildPipeline<T, P> {
    pub fn new(toolchain: T, programmer: P, options: BuildOptions) -> Self {
        Self {
            toolchain,
            programmer,
            options,
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    pub fn build(&self, soc: &SocDescription) -> Result<PathBuf> {
        self.toolchain.build(soc, &self.options)
    }

    /// Where the artifact for `target` is (or will be) written.
    pub fn artifact_path(&self, target: MemoryTarget) -> PathBuf {
        self.options.file(target.extension())
    }

    pub fn load(&self, request: LoadRequest) -> Result<()> {
        let artifact = self.artifact_path(request.target);
        self.programmer
            .load(&artifact, request.target, request.device)
    }

    /// Build, then load if asked. A failed build never loads.
    pub fn run(&self, soc: &SocDescription, load: Option<LoadRequest>) -> Result<PathBuf> {
        let artifact = self.build(soc)?;
        if let Some(request) = load {
            self.load(request)?;
        }
        Ok(artifact)
    }
}
