use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use z7lite_build::{
    BuildError, BuildOptions, BuildPipeline, LoadRequest, MemoryTarget, Programmer, Toolchain,
    VivadoOptions, DEFAULT_DEVICE_INDEX,
};
use z7lite_platform::{board, ErrorKind};
use z7lite_soc::{compose, SocDescription, SocSettings};

fn soc() -> SocDescription {
    compose(&SocSettings::default(), &mut board::platform().unwrap()).unwrap()
}

fn options(dir: &Path) -> BuildOptions {
    let top = dir.join("top.v");
    fs::write(&top, "module z7lite(); endmodule\n").unwrap();
    BuildOptions {
        output_dir: dir.to_path_buf(),
        sources: vec![top],
        ..BuildOptions::default()
    }
}

struct FailingToolchain;

impl Toolchain for FailingToolchain {
    fn build(&self, _soc: &SocDescription, _options: &BuildOptions) -> z7lite_build::Result<PathBuf> {
        Err(BuildError::ExternalTool {
            tool: "vivado".into(),
            code: Some(2),
            stderr: "ERROR: [Synth 8-439] module not found".into(),
        })
    }
}

/// Reports the volatile artifact without running anything.
struct ListingToolchain;

impl Toolchain for ListingToolchain {
    fn build(&self, _soc: &SocDescription, options: &BuildOptions) -> z7lite_build::Result<PathBuf> {
        Ok(options.file(MemoryTarget::Sram.extension()))
    }
}

#[derive(Default)]
struct RecordingProgrammer {
    loads: RefCell<Vec<(PathBuf, MemoryTarget, u32)>>,
}

impl Programmer for RecordingProgrammer {
    fn load(&self, artifact: &Path, target: MemoryTarget, device: u32) -> z7lite_build::Result<()> {
        self.loads
            .borrow_mut()
            .push((artifact.to_path_buf(), target, device));
        Ok(())
    }
}

#[test]
fn artifact_paths_follow_memory_target() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = BuildPipeline::vivado(options(dir.path()), VivadoOptions::default());
    assert_eq!(
        pipeline.artifact_path(MemoryTarget::Sram),
        dir.path().join("gateware/z7lite.bit")
    );
    assert_eq!(
        pipeline.artifact_path(MemoryTarget::Flash),
        dir.path().join("gateware/z7lite.bin")
    );
}

#[test]
fn failed_build_never_loads() {
    let dir = tempfile::tempdir().unwrap();
    let programmer = RecordingProgrammer::default();
    let pipeline = BuildPipeline::new(FailingToolchain, &programmer, options(dir.path()));

    let err = pipeline
        .run(
            &soc(),
            Some(LoadRequest {
                target: MemoryTarget::Sram,
                device: DEFAULT_DEVICE_INDEX,
            }),
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalTool);
    assert_eq!(err.tool_exit_code(), Some(2));
    assert!(programmer.loads.borrow().is_empty());
}

#[test]
fn successful_build_loads_its_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let programmer = RecordingProgrammer::default();
    let pipeline = BuildPipeline::new(ListingToolchain, &programmer, options(dir.path()));

    let built = pipeline
        .run(
            &soc(),
            Some(LoadRequest {
                target: MemoryTarget::Flash,
                device: DEFAULT_DEVICE_INDEX,
            }),
        )
        .unwrap();
    assert_eq!(built, dir.path().join("gateware/z7lite.bit"));
    assert_eq!(
        *programmer.loads.borrow(),
        vec![(
            dir.path().join("gateware/z7lite.bin"),
            MemoryTarget::Flash,
            1
        )]
    );
}

#[test]
fn build_without_load_request_programs_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let programmer = RecordingProgrammer::default();
    let pipeline = BuildPipeline::new(ListingToolchain, &programmer, options(dir.path()));

    let built = pipeline.run(&soc(), None).unwrap();
    assert_eq!(built, pipeline.artifact_path(MemoryTarget::Sram));
    assert!(programmer.loads.borrow().is_empty());
}

#[cfg(unix)]
#[test]
fn vivado_build_and_load_with_stand_in_tool() {
    let dir = tempfile::tempdir().unwrap();
    let vivado = VivadoOptions {
        executable: PathBuf::from("true"),
        ..VivadoOptions::default()
    };
    let pipeline = BuildPipeline::vivado(options(dir.path()), vivado);
    let request = LoadRequest {
        target: MemoryTarget::Sram,
        device: DEFAULT_DEVICE_INDEX,
    };

    let artifact = pipeline.build(&soc()).unwrap();
    assert!(pipeline.options().file("tcl").exists());

    // The stand-in tool produces nothing, so there is nothing to load yet.
    let err = pipeline.load(request).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lookup);

    fs::write(&artifact, b"bitstream").unwrap();
    pipeline.load(request).unwrap();
    let script = fs::read_to_string(dir.path().join("gateware/load_sram.tcl")).unwrap();
    assert!(script.contains("PROGRAM.FILE {z7lite.bit} [lindex [get_hw_devices] 1]"));
}

#[cfg(unix)]
#[test]
fn vivado_failure_propagates_status() {
    let dir = tempfile::tempdir().unwrap();
    let vivado = VivadoOptions {
        executable: PathBuf::from("false"),
        ..VivadoOptions::default()
    };
    let pipeline = BuildPipeline::vivado(options(dir.path()), vivado);
    let err = pipeline.build(&soc()).unwrap_err();
    assert_eq!(err.tool_exit_code(), Some(1));
}

#[test]
fn compile_without_sources_is_a_configuration_error() {
    let dir = tempfile::tempdir().unwrap();
    let vivado = VivadoOptions {
        executable: PathBuf::from("z7lite-no-such-tool"),
        ..VivadoOptions::default()
    };
    let opts = BuildOptions {
        sources: Vec::new(),
        ..options(dir.path())
    };
    let pipeline = BuildPipeline::vivado(opts, vivado);
    let err = pipeline.run(&soc(), None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(err.to_string().contains("build sources"));
    assert!(!pipeline.options().gateware_dir().exists());
}
