//! Configuration flags and the feature plan derived from them.
//!
//! The flags are evaluated exactly once into a [`FeaturePlan`]. Everything
//! that can be rejected without touching a pin is rejected here, so a bad
//! configuration never leaves a half-bound platform behind.

use std::fmt;

use serde::Serialize;
use z7lite_platform::DefaultClock;

use crate::clock::{ClockDomainGenerator, ClockStrategy, ETH_DOMAIN};
use crate::error::{Result, SocError};
use crate::modules::VideoTimings;

/// UARTs that need board pins, by the signal they request.
const PIN_UARTS: &[&str] = &["serial", "usb_uart"];

/// UARTs that live entirely inside the fabric or on JTAG.
const PINLESS_UARTS: &[&str] = &["jtag_uart", "crossover", "stub"];

/// Independent feature switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigurationFlags {
    pub ethernet: bool,
    pub etherbone: bool,
    pub video_terminal: bool,
    pub led_chaser: bool,
    /// Clock the system domain from the processing system instead of a PLL.
    pub ps7_clk: bool,
}

impl Default for ConfigurationFlags {
    fn default() -> Self {
        Self {
            ethernet: false,
            etherbone: false,
            video_terminal: false,
            led_chaser: true,
            ps7_clk: false,
        }
    }
}

/// CPU selection passed through to the SoC core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CpuType {
    /// A soft core synthesized in fabric, by name.
    Soft(String),
    /// No CPU.
    None,
    /// The Zynq-7000 processing system as the SoC CPU.
    Zynq7000,
}

impl CpuType {
    pub fn parse(name: &str) -> Self {
        match name {
            "zynq7000" => CpuType::Zynq7000,
            "none" => CpuType::None,
            other => CpuType::Soft(other.to_string()),
        }
    }

    /// Whether the CPU has to be wired straight to the hard processor.
    pub fn requires_hard_processor_wiring(&self) -> bool {
        matches!(self, CpuType::Zynq7000)
    }
}

impl Default for CpuType {
    fn default() -> Self {
        CpuType::Soft("vexriscv".into())
    }
}

impl fmt::Display for CpuType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuType::Soft(name) => f.write_str(name),
            CpuType::None => f.write_str("none"),
            CpuType::Zynq7000 => f.write_str("zynq7000"),
        }
    }
}

/// Everything the composer is configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocSettings {
    pub ident: String,
    pub sys_clk_hz: u64,
    pub flags: ConfigurationFlags,
    pub cpu: CpuType,
    /// UART name, or `None` for no UART.
    pub uart: Option<String>,
}

impl Default for SocSettings {
    fn default() -> Self {
        Self {
            ident: "SoC on Z7-Lite".into(),
            sys_clk_hz: 100_000_000,
            flags: ConfigurationFlags::default(),
            cpu: CpuType::default(),
            uart: Some("serial".into()),
        }
    }
}

/// One enabled feature, in composition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "feature", rename_all = "kebab-case")]
pub enum Feature {
    /// SoC core UART on the named signal.
    Uart { signal: String },
    /// A single MII PHY carrying a MAC core, an Etherbone core, or both.
    Ethernet { mac: bool, etherbone: bool },
    VideoTerminal { timings: VideoTimings },
    LedChaser,
}

/// The immutable outcome of evaluating [`SocSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturePlan {
    ident: String,
    sys_clk_hz: u64,
    cpu: CpuType,
    clocking: ClockStrategy,
    features: Vec<Feature>,
}

impl FeaturePlan {
    /// Evaluate settings into a plan, validating everything that needs no pins.
    pub fn evaluate(settings: &SocSettings, oscillator: &DefaultClock) -> Result<Self> {
        let flags = settings.flags;
        let clocking = if flags.ps7_clk {
            ClockStrategy::HardProcessor
        } else {
            ClockStrategy::Pll
        };

        if settings.cpu.requires_hard_processor_wiring() {
            return Err(SocError::UnimplementedCpu {
                cpu: settings.cpu.to_string(),
            });
        }

        let mut features = Vec::new();
        if let Some(uart) = &settings.uart {
            if PIN_UARTS.contains(&uart.as_str()) {
                features.push(Feature::Uart {
                    signal: uart.clone(),
                });
            } else if !PINLESS_UARTS.contains(&uart.as_str()) {
                return Err(SocError::UnknownUart { name: uart.clone() });
            }
        }
        if flags.ethernet || flags.etherbone {
            if clocking == ClockStrategy::HardProcessor {
                return Err(SocError::UndrivenDomain {
                    feature: if flags.ethernet { "ethernet" } else { "etherbone" }.into(),
                    domain: ETH_DOMAIN.into(),
                    reason: "the system clock comes from the processing system".into(),
                });
            }
            features.push(Feature::Ethernet {
                mac: flags.ethernet,
                etherbone: flags.etherbone,
            });
        }
        if flags.video_terminal {
            features.push(Feature::VideoTerminal {
                timings: VideoTimings::SVGA_60HZ,
            });
        }
        if flags.led_chaser {
            features.push(Feature::LedChaser);
        }

        let plan = Self {
            ident: settings.ident.clone(),
            sys_clk_hz: settings.sys_clk_hz,
            cpu: settings.cpu.clone(),
            clocking,
            features,
        };
        plan.clock_generator(oscillator.clone()).validate()?;
        Ok(plan)
    }

    pub fn ident(&self) -> &str {
        &self.ident
    }

    pub fn sys_clk_hz(&self) -> u64 {
        self.sys_clk_hz
    }

    pub fn cpu(&self) -> &CpuType {
        &self.cpu
    }

    pub fn clocking(&self) -> ClockStrategy {
        self.clocking
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Pixel frequency the video PLL must produce, if video is planned.
    pub fn video_pixel_hz(&self) -> Option<u64> {
        self.features.iter().find_map(|f| match f {
            Feature::VideoTerminal { timings } => Some(timings.pix_clk_hz),
            _ => None,
        })
    }

    /// The CRG this plan needs.
    pub fn clock_generator(&self, oscillator: DefaultClock) -> ClockDomainGenerator {
        let crg = ClockDomainGenerator::new(oscillator, self.sys_clk_hz, self.clocking);
        match self.video_pixel_hz() {
            Some(pixel_hz) => crg.with_video(pixel_hz),
            None => crg,
        }
    }
}
