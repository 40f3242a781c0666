//! Clock-domain generation.
//!
//! Derives the SoC's clock domains from the board oscillator. The system
//! domain comes either from a 7-series PLL or straight from the processing
//! system; the optional video domains come from a separate MMCM so the pixel
//! clock never depends on the system frequency.

use std::fmt;

use serde::Serialize;
use z7lite_platform::{ConstraintSet, DefaultClock, PinProvider};

use crate::error::{Result, SocError};

/// Frequency of the processing system's fabric clock output (FCLK0).
pub const HARD_PROCESSOR_CLK_HZ: u64 = 100_000_000;

/// Reference clock for the Ethernet MAC.
pub const ETH_CLK_HZ: u64 = 25_000_000;

/// Serializer clock / pixel clock. The HDMI serializer shifts 10 bits per
/// pixel on both edges, so this must stay exactly 5.
pub const SERIALIZER_RATIO: u64 = 5;

pub const SYS_DOMAIN: &str = "sys";
pub const ETH_DOMAIN: &str = "eth";
pub const PIXEL_DOMAIN: &str = "hdmi";
pub const SERIALIZER_DOMAIN: &str = "hdmi5x";

const SPEEDGRADE: i8 = -2;

/// Where a domain's clock comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ClockSource {
    /// An output of the named clock generator.
    Generator { generator: String },
    /// The processing system's fabric clock.
    HardProcessor,
    /// Declared but not driven.
    Unassigned,
}

/// What holds a domain in reset. Every driven domain also honours the
/// software reset request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ResetSource {
    /// Held until the named generator locks.
    GeneratorLock { generator: String },
    /// The processing system's fabric reset.
    HardProcessor,
    Unassigned,
}

impl fmt::Display for ResetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetSource::GeneratorLock { generator } => write!(f, "~{generator}.locked | crg.rst"),
            ResetSource::HardProcessor => write!(f, "ps7_rst | crg.rst"),
            ResetSource::Unassigned => write!(f, "none"),
        }
    }
}

/// A named clock domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockDomain {
    pub name: String,
    pub freq_hz: u64,
    pub source: ClockSource,
    pub reset: ResetSource,
}

impl ClockDomain {
    /// Net carrying this domain's clock.
    pub fn clock_net(&self) -> String {
        format!("{}_clk", self.name)
    }
}

/// Clock synthesis primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Primitive {
    /// 7-series PLLE2_ADV.
    S7Pll,
    /// 7-series MMCME2_ADV.
    S7Mmcm,
}

impl Primitive {
    pub fn max_outputs(&self) -> usize {
        match self {
            Primitive::S7Pll => 6,
            Primitive::S7Mmcm => 7,
        }
    }
}

/// Reference input of a clock generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockInput {
    pub net: String,
    pub freq_hz: u64,
}

/// One generated output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockOutput {
    pub domain: String,
    pub freq_hz: u64,
}

/// A PLL or MMCM instance, described by its reference and requested outputs.
/// The primitive itself (VCO search, phase alignment) belongs to the toolchain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockGenerator {
    pub name: String,
    pub primitive: Primitive,
    pub speedgrade: i8,
    pub clkin: Option<ClockInput>,
    pub outputs: Vec<ClockOutput>,
}

impl ClockGenerator {
    pub fn new(name: impl Into<String>, primitive: Primitive, speedgrade: i8) -> Self {
        Self {
            name: name.into(),
            primitive,
            speedgrade,
            clkin: None,
            outputs: Vec::new(),
        }
    }

    fn error(&self, detail: impl Into<String>) -> SocError {
        SocError::ClockGenerator {
            generator: self.name.clone(),
            detail: detail.into(),
        }
    }

    /// Register the reference input.
    pub fn register_clkin(&mut self, net: impl Into<String>, freq_hz: u64) -> Result<()> {
        if self.clkin.is_some() {
            return Err(self.error("reference input already registered"));
        }
        if freq_hz == 0 {
            return Err(self.error("reference frequency must be non-zero"));
        }
        self.clkin = Some(ClockInput {
            net: net.into(),
            freq_hz,
        });
        Ok(())
    }

    /// Add an output and return the domain it drives.
    pub fn create_clkout(&mut self, domain: &str, freq_hz: u64) -> Result<ClockDomain> {
        if self.clkin.is_none() {
            return Err(self.error(format!(
                "output '{domain}' created before the reference input"
            )));
        }
        if freq_hz == 0 {
            return Err(SocError::InvalidFrequency {
                what: format!("{domain} domain"),
                hz: freq_hz,
            });
        }
        if self.outputs.iter().any(|o| o.domain == domain) {
            return Err(self.error(format!("domain '{domain}' is already driven")));
        }
        if self.outputs.len() == self.primitive.max_outputs() {
            return Err(self.error(format!(
                "{:?} has only {} outputs",
                self.primitive,
                self.primitive.max_outputs()
            )));
        }
        self.outputs.push(ClockOutput {
            domain: domain.to_string(),
            freq_hz,
        });
        Ok(ClockDomain {
            name: domain.to_string(),
            freq_hz,
            source: ClockSource::Generator {
                generator: self.name.clone(),
            },
            reset: ResetSource::GeneratorLock {
                generator: self.name.clone(),
            },
        })
    }
}

/// How the system domain is clocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClockStrategy {
    /// PLL from the board oscillator.
    Pll,
    /// Processing-system fabric clock, fixed at [`HARD_PROCESSOR_CLK_HZ`].
    HardProcessor,
}

/// Pixel and serializer domains of the video subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoDomains {
    pub pixel: ClockDomain,
    pub serializer: ClockDomain,
}

/// Every domain of a composed SoC, plus the generators that drive them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockDomains {
    pub sys: ClockDomain,
    pub eth: ClockDomain,
    pub video: Option<VideoDomains>,
    pub generators: Vec<ClockGenerator>,
}

impl ClockDomains {
    /// All domains, system first.
    pub fn iter(&self) -> impl Iterator<Item = &ClockDomain> {
        [&self.sys, &self.eth].into_iter().chain(
            self.video
                .iter()
                .flat_map(|v| [&v.pixel, &v.serializer]),
        )
    }

    pub fn domain(&self, name: &str) -> Option<&ClockDomain> {
        self.iter().find(|d| d.name == name)
    }
}

/// Serializer frequency for a pixel frequency, rejecting zero and overflow.
fn serializer_hz(pixel_hz: u64) -> Result<u64> {
    match pixel_hz.checked_mul(SERIALIZER_RATIO) {
        Some(hz) if pixel_hz != 0 => Ok(hz),
        _ => Err(SocError::InvalidFrequency {
            what: "pixel clock".into(),
            hz: pixel_hz,
        }),
    }
}

/// Derives the SoC clock domains (the CRG).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockDomainGenerator {
    oscillator: DefaultClock,
    sys_clk_hz: u64,
    strategy: ClockStrategy,
    video_pixel_hz: Option<u64>,
}

impl ClockDomainGenerator {
    pub fn new(oscillator: DefaultClock, sys_clk_hz: u64, strategy: ClockStrategy) -> Self {
        Self {
            oscillator,
            sys_clk_hz,
            strategy,
            video_pixel_hz: None,
        }
    }

    /// Also derive the video domains, with the given pixel frequency.
    pub fn with_video(mut self, pixel_hz: u64) -> Self {
        self.video_pixel_hz = Some(pixel_hz);
        self
    }

    /// Check what can be checked without touching any pin.
    pub fn validate(&self) -> Result<()> {
        if self.sys_clk_hz == 0 {
            return Err(SocError::InvalidFrequency {
                what: "system clock".into(),
                hz: 0,
            });
        }
        if self.strategy == ClockStrategy::HardProcessor && self.sys_clk_hz != HARD_PROCESSOR_CLK_HZ
        {
            return Err(SocError::FrequencyMismatch {
                requested: self.sys_clk_hz,
                required: HARD_PROCESSOR_CLK_HZ,
            });
        }
        if let Some(pixel_hz) = self.video_pixel_hz {
            serializer_hz(pixel_hz)?;
        }
        Ok(())
    }

    /// Request the oscillator and derive every domain.
    pub fn generate<P: PinProvider>(
        &self,
        platform: &mut P,
        constraints: &mut ConstraintSet,
    ) -> Result<ClockDomains> {
        self.validate()?;

        platform.request(&self.oscillator.name, 0)?;
        let osc_net = self.oscillator.name.as_str();
        let osc_hz = self.oscillator.freq_hz;

        let mut generators = Vec::new();
        let (sys, eth) = match self.strategy {
            ClockStrategy::HardProcessor => {
                tracing::debug!("system clock taken from the processing system");
                let sys = ClockDomain {
                    name: SYS_DOMAIN.into(),
                    freq_hz: HARD_PROCESSOR_CLK_HZ,
                    source: ClockSource::HardProcessor,
                    reset: ResetSource::HardProcessor,
                };
                let eth = ClockDomain {
                    name: ETH_DOMAIN.into(),
                    freq_hz: ETH_CLK_HZ,
                    source: ClockSource::Unassigned,
                    reset: ResetSource::Unassigned,
                };
                (sys, eth)
            }
            ClockStrategy::Pll => {
                let mut pll = ClockGenerator::new("pll", Primitive::S7Pll, SPEEDGRADE);
                pll.register_clkin(osc_net, osc_hz)?;
                let sys = pll.create_clkout(SYS_DOMAIN, self.sys_clk_hz)?;
                let eth = pll.create_clkout(ETH_DOMAIN, ETH_CLK_HZ)?;
                // sys_clk and the PLL input are not a real crossing.
                constraints.add_false_path(sys.clock_net(), osc_net);
                generators.push(pll);
                (sys, eth)
            }
        };

        let video = match self.video_pixel_hz {
            Some(pixel_hz) => {
                let mut mmcm = ClockGenerator::new("video_pll", Primitive::S7Mmcm, SPEEDGRADE);
                mmcm.register_clkin(osc_net, osc_hz)?;
                let pixel = mmcm.create_clkout(PIXEL_DOMAIN, pixel_hz)?;
                let serializer_freq = serializer_hz(pixel_hz)?;
                let serializer = mmcm.create_clkout(SERIALIZER_DOMAIN, serializer_freq)?;
                generators.push(mmcm);
                Some(VideoDomains { pixel, serializer })
            }
            None => None,
        };

        let domains = ClockDomains {
            sys,
            eth,
            video,
            generators,
        };
        for d in domains.iter() {
            tracing::debug!(domain = %d.name, freq_hz = d.freq_hz, "clock domain");
        }
        Ok(domains)
    }
}
