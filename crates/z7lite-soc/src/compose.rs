//! Single-pass SoC composition.

use z7lite_platform::{ConstraintSet, PinProvider, PlatformDescriptor};

use crate::clock::{ClockDomains, PIXEL_DOMAIN};
use crate::description::SocDescription;
use crate::error::{Result, SocError};
use crate::modules::{CoreFactory, FeatureModule, GatewareCores, ModuleId, PhyKind, ProtocolKind};
use crate::plan::{Feature, FeaturePlan, SocSettings};

/// The MII transmit clock enters on a pin without a dedicated clock route.
const ETH_CLOCK_ROUTE: &str =
    "set_property CLOCK_DEDICATED_ROUTE FALSE [get_nets eth_clocks_tx_IBUF]";

/// Walks a [`FeaturePlan`] once, binding pins and constructing modules.
pub struct SocComposer<'p, F: CoreFactory> {
    platform: &'p mut PlatformDescriptor,
    factory: F,
    constraints: ConstraintSet,
    modules: Vec<FeatureModule>,
}

impl<'p, F: CoreFactory> SocComposer<'p, F> {
    pub fn new(platform: &'p mut PlatformDescriptor, factory: F) -> Self {
        Self {
            platform,
            factory,
            constraints: ConstraintSet::new(),
            modules: Vec::new(),
        }
    }

    fn push(&mut self, module: FeatureModule) -> ModuleId {
        tracing::debug!(module = %module.name, domain = %module.domain, "added module");
        self.modules.push(module);
        ModuleId(self.modules.len() - 1)
    }

    /// Compose the SoC. Consumes the composer, so a plan is applied once.
    pub fn compose(mut self, plan: &FeaturePlan) -> Result<SocDescription> {
        let crg = plan.clock_generator(self.platform.default_clock().clone());
        let domains = crg.generate(&mut *self.platform, &mut self.constraints)?;

        for feature in plan.features() {
            self.add_feature(feature, &domains, plan.sys_clk_hz())?;
        }

        let clock = self.platform.default_clock().clone();
        if self.platform.bound(&clock.name, 0).is_some() {
            self.constraints.add_period(&clock.name, clock.period_ns());
        }

        Ok(SocDescription {
            ident: plan.ident().to_string(),
            device: self.platform.device().to_string(),
            sys_clk_hz: domains.sys.freq_hz,
            cpu: plan.cpu().clone(),
            domains,
            modules: self.modules,
            bindings: self.platform.bindings().to_vec(),
            constraints: self.constraints,
        })
    }

    fn add_feature(
        &mut self,
        feature: &Feature,
        domains: &ClockDomains,
        sys_clk_hz: u64,
    ) -> Result<()> {
        match feature {
            Feature::Uart { signal } => {
                let pads = self.platform.request(signal, 0)?;
                let uart = self.factory.uart(pads, &domains.sys)?;
                self.push(uart);
                tracing::info!(signal = %signal, "UART");
            }
            Feature::Ethernet { mac, etherbone } => {
                let clock_pads = self.platform.request("eth_clocks", 0)?;
                let pads = self.platform.request("eth", 0)?;
                let phy = self
                    .factory
                    .phy(PhyKind::Mii, vec![clock_pads, pads], &domains.eth)?;
                let phy = self.push(phy);
                self.constraints.add_command(ETH_CLOCK_ROUTE);
                if *mac {
                    let core = self
                        .factory
                        .protocol_core(ProtocolKind::Ethernet, phy, &domains.sys)?;
                    self.push(core);
                }
                if *etherbone {
                    let core = self
                        .factory
                        .protocol_core(ProtocolKind::Etherbone, phy, &domains.sys)?;
                    self.push(core);
                }
                tracing::info!(mac = *mac, etherbone = *etherbone, "Ethernet over MII");
            }
            Feature::VideoTerminal { timings } => {
                let video = domains
                    .video
                    .as_ref()
                    .ok_or_else(|| SocError::MissingDomain {
                        name: PIXEL_DOMAIN.into(),
                    })?;
                let pads = self.platform.request("hdmi_out", 0)?;
                let phy = self.factory.phy(PhyKind::S7Hdmi, vec![pads], &video.pixel)?;
                let phy = self.push(phy);
                let terminal = self.factory.terminal(phy, timings, &video.pixel)?;
                self.push(terminal);
                tracing::info!(timings = timings.name, "video terminal");
            }
            Feature::LedChaser => {
                let pads = self.platform.request_all("user_led")?;
                let count = pads.len();
                let leds = self.factory.sequencer(pads, &domains.sys, sys_clk_hz)?;
                self.push(leds);
                tracing::info!(leds = count, "LED chaser");
            }
        }
        Ok(())
    }
}

/// Evaluate `settings` and compose with the default module factory.
pub fn compose(
    settings: &SocSettings,
    platform: &mut PlatformDescriptor,
) -> Result<SocDescription> {
    let plan = FeaturePlan::evaluate(settings, platform.default_clock())?;
    SocComposer::new(platform, GatewareCores).compose(&plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::ConfigurationFlags;
    use z7lite_platform::board;

    #[test]
    fn default_settings_compose() {
        let mut platform = board::platform().unwrap();
        let soc = compose(&SocSettings::default(), &mut platform).unwrap();
        let names: Vec<_> = soc.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["uart", "leds"]);
        assert_eq!(soc.constraints.periods.len(), 1);
        assert_eq!(soc.constraints.periods[0].net, "clk50");
        assert!(soc.constraints.commands.is_empty());
    }

    #[test]
    fn ethernet_adds_route_exception_once() {
        let mut platform = board::platform().unwrap();
        let settings = SocSettings {
            flags: ConfigurationFlags {
                ethernet: true,
                etherbone: true,
                ..ConfigurationFlags::default()
            },
            ..SocSettings::default()
        };
        let soc = compose(&settings, &mut platform).unwrap();
        assert_eq!(soc.constraints.commands, vec![ETH_CLOCK_ROUTE.to_string()]);
        let phy = soc.module("ethphy").unwrap();
        assert_eq!(phy.domain, "eth");
        assert_eq!(phy.pins.len(), 2);
    }

    #[test]
    fn failed_plan_binds_nothing() {
        let mut platform = board::platform().unwrap();
        let settings = SocSettings {
            sys_clk_hz: 50_000_000,
            flags: ConfigurationFlags {
                ps7_clk: true,
                ..ConfigurationFlags::default()
            },
            ..SocSettings::default()
        };
        assert!(compose(&settings, &mut platform).is_err());
        assert!(platform.bindings().is_empty());
    }

    #[test]
    fn usb_uart_needs_its_extension() {
        let mut platform = board::platform().unwrap();
        let settings = SocSettings {
            uart: Some("usb_uart".into()),
            ..SocSettings::default()
        };
        let err = compose(&settings, &mut platform).unwrap_err();
        assert_eq!(err.kind(), z7lite_platform::ErrorKind::Lookup);

        let mut platform = board::platform().unwrap();
        platform.add_extension(board::usb_uart_io()).unwrap();
        let soc = compose(&settings, &mut platform).unwrap();
        assert_eq!(soc.module("uart").unwrap().pins[0].name, "usb_uart");
    }
}
