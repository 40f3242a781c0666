//! Feature modules and the factory that constructs them.
//!
//! The gateware behind each module (MII PHY, HDMI serializer, Etherbone,
//! LED chaser) is external IP. What the composer owns is a record of which
//! module exists, which pins it was granted and which clock domain it runs
//! in; [`CoreFactory`] is the seam where those records are produced.

use serde::Serialize;
use z7lite_platform::BoundSignal;

use crate::clock::ClockDomain;
use crate::error::{Result, SocError};

/// Index of a module within the composed SoC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ModuleId(pub usize);

/// Video mode timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VideoTimings {
    pub name: &'static str,
    pub pix_clk_hz: u64,
    pub h_active: u32,
    pub h_blanking: u32,
    pub h_sync_offset: u32,
    pub h_sync_width: u32,
    pub v_active: u32,
    pub v_blanking: u32,
    pub v_sync_offset: u32,
    pub v_sync_width: u32,
}

impl VideoTimings {
    /// VESA 800x600 @ 60 Hz.
    pub const SVGA_60HZ: VideoTimings = VideoTimings {
        name: "800x600@60Hz",
        pix_clk_hz: 40_000_000,
        h_active: 800,
        h_blanking: 256,
        h_sync_offset: 40,
        h_sync_width: 128,
        v_active: 600,
        v_blanking: 28,
        v_sync_offset: 1,
        v_sync_width: 4,
    };

    /// Frame refresh rate implied by the pixel clock and totals.
    pub fn refresh_hz(&self) -> f64 {
        let h_total = (self.h_active + self.h_blanking) as f64;
        let v_total = (self.v_active + self.v_blanking) as f64;
        self.pix_clk_hz as f64 / (h_total * v_total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhyKind {
    /// 10/100 Media Independent Interface.
    Mii,
    /// 7-series OSERDES-based HDMI transmitter.
    S7Hdmi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtocolKind {
    /// Ethernet MAC exposed to the CPU.
    Ethernet,
    /// Wishbone bridge over UDP.
    Etherbone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ModuleKind {
    Phy { phy: PhyKind },
    ProtocolCore { protocol: ProtocolKind, phy: ModuleId },
    VideoTerminal { phy: ModuleId, timings: VideoTimings },
    LedChaser { sys_clk_hz: u64 },
    Uart,
}

/// A composed feature module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureModule {
    pub name: String,
    pub kind: ModuleKind,
    /// Pins granted to the module; protocol cores hold none.
    pub pins: Vec<BoundSignal>,
    /// Domain the module is clocked from, by name.
    pub domain: String,
}

/// Constructs feature modules on behalf of the composer.
pub trait CoreFactory {
    fn phy(
        &mut self,
        kind: PhyKind,
        pins: Vec<BoundSignal>,
        domain: &ClockDomain,
    ) -> Result<FeatureModule>;

    fn protocol_core(
        &mut self,
        kind: ProtocolKind,
        phy: ModuleId,
        domain: &ClockDomain,
    ) -> Result<FeatureModule>;

    fn terminal(
        &mut self,
        phy: ModuleId,
        timings: &VideoTimings,
        domain: &ClockDomain,
    ) -> Result<FeatureModule>;

    fn sequencer(
        &mut self,
        pins: Vec<BoundSignal>,
        domain: &ClockDomain,
        sys_clk_hz: u64,
    ) -> Result<FeatureModule>;

    fn uart(&mut self, pins: BoundSignal, domain: &ClockDomain) -> Result<FeatureModule>;
}

impl<F: CoreFactory + ?Sized> CoreFactory for &mut F {
    fn phy(
        &mut self,
        kind: PhyKind,
        pins: Vec<BoundSignal>,
        domain: &ClockDomain,
    ) -> Result<FeatureModule> {
        (**self).phy(kind, pins, domain)
    }

    fn protocol_core(
        &mut self,
        kind: ProtocolKind,
        phy: ModuleId,
        domain: &ClockDomain,
    ) -> Result<FeatureModule> {
        (**self).protocol_core(kind, phy, domain)
    }

    fn terminal(
        &mut self,
        phy: ModuleId,
        timings: &VideoTimings,
        domain: &ClockDomain,
    ) -> Result<FeatureModule> {
        (**self).terminal(phy, timings, domain)
    }

    fn sequencer(
        &mut self,
        pins: Vec<BoundSignal>,
        domain: &ClockDomain,
        sys_clk_hz: u64,
    ) -> Result<FeatureModule> {
        (**self).sequencer(pins, domain, sys_clk_hz)
    }

    fn uart(&mut self, pins: BoundSignal, domain: &ClockDomain) -> Result<FeatureModule> {
        (**self).uart(pins, domain)
    }
}

/// The default factory: module records handed to the toolchain as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct GatewareCores;

impl CoreFactory for GatewareCores {
    fn phy(
        &mut self,
        kind: PhyKind,
        pins: Vec<BoundSignal>,
        domain: &ClockDomain,
    ) -> Result<FeatureModule> {
        let name = match kind {
            PhyKind::Mii => "ethphy",
            PhyKind::S7Hdmi => "videophy",
        };
        Ok(FeatureModule {
            name: name.into(),
            kind: ModuleKind::Phy { phy: kind },
            pins,
            domain: domain.name.clone(),
        })
    }

    fn protocol_core(
        &mut self,
        kind: ProtocolKind,
        phy: ModuleId,
        domain: &ClockDomain,
    ) -> Result<FeatureModule> {
        let name = match kind {
            ProtocolKind::Ethernet => "ethmac",
            ProtocolKind::Etherbone => "etherbone",
        };
        Ok(FeatureModule {
            name: name.into(),
            kind: ModuleKind::ProtocolCore {
                protocol: kind,
                phy,
            },
            pins: Vec::new(),
            domain: domain.name.clone(),
        })
    }

    fn terminal(
        &mut self,
        phy: ModuleId,
        timings: &VideoTimings,
        domain: &ClockDomain,
    ) -> Result<FeatureModule> {
        if domain.freq_hz != timings.pix_clk_hz {
            return Err(SocError::PixelClockMismatch {
                domain: domain.name.clone(),
                domain_hz: domain.freq_hz,
                timings: timings.name.to_string(),
                timings_hz: timings.pix_clk_hz,
            });
        }
        Ok(FeatureModule {
            name: "video_terminal".into(),
            kind: ModuleKind::VideoTerminal {
                phy,
                timings: *timings,
            },
            pins: Vec::new(),
            domain: domain.name.clone(),
        })
    }

    fn sequencer(
        &mut self,
        pins: Vec<BoundSignal>,
        domain: &ClockDomain,
        sys_clk_hz: u64,
    ) -> Result<FeatureModule> {
        Ok(FeatureModule {
            name: "leds".into(),
            kind: ModuleKind::LedChaser { sys_clk_hz },
            pins,
            domain: domain.name.clone(),
        })
    }

    fn uart(&mut self, pins: BoundSignal, domain: &ClockDomain) -> Result<FeatureModule> {
        Ok(FeatureModule {
            name: "uart".into(),
            kind: ModuleKind::Uart,
            pins: vec![pins],
            domain: domain.name.clone(),
        })
    }
}
