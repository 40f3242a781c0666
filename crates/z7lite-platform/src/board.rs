//! Z7-Lite board tables (xc7z020-clg400-2).

use crate::connector::{ConnectorTable, HeaderGeometry};
use crate::descriptor::{DefaultClock, PinProvider, PlatformDescriptor};
use crate::error::Result;
use crate::pins::{IoStandard, Signal, Subsignal};

/// FPGA part on the board.
pub const DEVICE: &str = "xc7z020-clg400-2";

/// On-board oscillator.
pub const OSCILLATOR: &str = "clk50";

/// Frequency of [`OSCILLATOR`] in Hz.
pub const OSCILLATOR_HZ: u64 = 50_000_000;

const GPIO_GEOMETRY: HeaderGeometry = HeaderGeometry {
    rows: 18,
    columns: 2,
};

fn lvcmos33(name: &str, instance: u32, pins: &str) -> Signal {
    Signal::new(name, instance)
        .with_pins(pins)
        .with_standard(IoStandard::Lvcmos33)
}

fn tmds(name: &str, pins: &str) -> Subsignal {
    Subsignal::new(name, pins).with_standard(IoStandard::Tmds33)
}

fn fast(name: &str, pins: &str) -> Subsignal {
    Subsignal::new(name, pins).with_misc("SLEW", "FAST")
}

/// Programmable-logic IOs.
pub fn io() -> Vec<Signal> {
    vec![
        lvcmos33(OSCILLATOR, 0, "N18"),
        lvcmos33("user_btn", 0, "P16"),
        lvcmos33("user_btn", 1, "T12"),
        lvcmos33("user_led", 0, "P15"),
        lvcmos33("user_led", 1, "U12"),
        Signal::new("hdmi_out", 0)
            .with_subsignal(tmds("clk_p", "U18"))
            .with_subsignal(tmds("clk_n", "U19"))
            .with_subsignal(tmds("data0_p", "V20"))
            .with_subsignal(tmds("data0_n", "W20"))
            .with_subsignal(tmds("data1_p", "T20"))
            .with_subsignal(tmds("data1_n", "U20"))
            .with_subsignal(tmds("data2_p", "N20"))
            .with_subsignal(tmds("data2_n", "P20"))
            .with_subsignal(Subsignal::new("scl", "R19").with_standard(IoStandard::Lvcmos33))
            .with_subsignal(Subsignal::new("sda", "T19").with_standard(IoStandard::Lvcmos33))
            .with_subsignal(Subsignal::new("hdp", "P19").with_standard(IoStandard::Lvcmos33)),
        // MII Ethernet
        Signal::new("eth_clocks", 0)
            .with_subsignal(Subsignal::new("tx", "L14"))
            .with_subsignal(Subsignal::new("rx", "K17"))
            .with_standard(IoStandard::Lvcmos33),
        Signal::new("eth", 0)
            .with_subsignal(Subsignal::new("rst_n", "H20"))
            .with_subsignal(fast("mdio", "J15"))
            .with_subsignal(fast("mdc", "G14"))
            .with_subsignal(Subsignal::new("rx_dv", "K18"))
            .with_subsignal(Subsignal::new("rx_data", "J14 K14 M18 M17"))
            .with_subsignal(fast("tx_en", "N16"))
            .with_subsignal(fast("tx_data", "M14 L15 M15 N15"))
            .with_standard(IoStandard::Lvcmos33),
        // LAN8720 RMII module on GPIO2
        Signal::new("lan8720_eth_clocks", 0)
            .with_subsignal(Subsignal::new("ref_clk", "F19"))
            .with_standard(IoStandard::Lvcmos33),
        Signal::new("lan8720_eth", 0)
            .with_subsignal(Subsignal::new("rx_data", "M19 M20"))
            .with_subsignal(Subsignal::new("crs_dv", "F20"))
            .with_subsignal(Subsignal::new("tx_en", "K19"))
            .with_subsignal(Subsignal::new("tx_data", "J19 J20"))
            .with_standard(IoStandard::Lvcmos33),
        Signal::new("serial", 0)
            .with_subsignal(Subsignal::new("tx", "L16"))
            .with_subsignal(Subsignal::new("rx", "L17"))
            .with_standard(IoStandard::Lvcmos33),
    ]
}

/// Processing-system pins, hard-wired to the PS7 block.
pub fn ps7_io() -> Vec<Signal> {
    vec![
        Signal::new("ps7_clk", 0).with_dedicated(1),
        Signal::new("ps7_porb", 0).with_dedicated(1),
        Signal::new("ps7_srstb", 0).with_dedicated(1),
        Signal::new("ps7_mio", 0).with_dedicated(54),
        Signal::new("ps7_ddram", 0)
            .with_subsignal(Subsignal::dedicated("addr", 15))
            .with_subsignal(Subsignal::dedicated("ba", 3))
            .with_subsignal(Subsignal::dedicated("cas_n", 1))
            .with_subsignal(Subsignal::dedicated("ck_n", 1))
            .with_subsignal(Subsignal::dedicated("ck_p", 1))
            .with_subsignal(Subsignal::dedicated("cke", 1))
            .with_subsignal(Subsignal::dedicated("cs_n", 1))
            .with_subsignal(Subsignal::dedicated("dm", 4))
            .with_subsignal(Subsignal::dedicated("dq", 32))
            .with_subsignal(Subsignal::dedicated("dqs_n", 4))
            .with_subsignal(Subsignal::dedicated("dqs_p", 4))
            .with_subsignal(Subsignal::dedicated("odt", 1))
            .with_subsignal(Subsignal::dedicated("ras_n", 1))
            .with_subsignal(Subsignal::dedicated("reset_n", 1))
            .with_subsignal(Subsignal::dedicated("we_n", 1))
            .with_subsignal(Subsignal::dedicated("vrn", 1))
            .with_subsignal(Subsignal::dedicated("vrp", 1)),
    ]
}

/// USB-UART adapter wired to the first two pads of GPIO1. Not merged by default.
pub fn usb_uart_io() -> Vec<Signal> {
    vec![Signal::new("usb_uart", 0)
        .with_subsignal(Subsignal::new("tx", "gpio1:1"))
        .with_subsignal(Subsignal::new("rx", "gpio1:2"))
        .with_standard(IoStandard::Lvcmos33)]
}

/// GPIO1 and GPIO2 headers. Pad 1 is the square soldering pad; power pads are not listed.
pub fn connectors() -> Result<Vec<ConnectorTable>> {
    let gpio1 = ConnectorTable::new(
        "gpio1",
        GPIO_GEOMETRY,
        &[
            "N17 P18", "R16 R17", "T16 U17", "W18 W19", "Y18 Y19", // 5V GND
            "Y16 Y17", "V17 V18", "W14 Y14", "V16 W16", "T17 R18", "V12 W13", "T14 T15",
            "T11 T10", // 3V3 GND
            "V15 W15", "P14 R14", "U14 U15", "U13 V13", "T12 U12",
        ],
    )?;
    let gpio2 = ConnectorTable::new(
        "gpio2",
        GPIO_GEOMETRY,
        &[
            "L16 L17", "H15 G15", "F16 F17", "E18 E19", "B19 A20", // 5V GND
            "D19 D20", "E17 D18", "H16 H17", "G19 G20", "J18 H18", "K16 J16", "C20 B20",
            "G17 G18", // 3V3 GND
            "L19 L20", "F19 F20", "M19 M20", "K19 J19", "J20 H20",
        ],
    )?;
    Ok(vec![gpio1, gpio2])
}

/// The Z7-Lite platform with the PS7 table merged.
pub fn platform() -> Result<PlatformDescriptor> {
    let mut platform = PlatformDescriptor::new(
        DEVICE,
        DefaultClock {
            name: OSCILLATOR.into(),
            freq_hz: OSCILLATOR_HZ,
        },
        io(),
        connectors()?,
    )?;
    platform.add_extension(ps7_io())?;
    Ok(platform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pins::Pin;

    #[test]
    fn platform_builds() {
        let p = platform().unwrap();
        assert_eq!(p.device(), DEVICE);
        assert_eq!(p.default_clock().freq_hz, OSCILLATOR_HZ);
        assert!(p.signal("ps7_ddram", 0).is_some());
        assert!(p.signal("usb_uart", 0).is_none());
    }

    #[test]
    fn connectors_have_36_pads() {
        for c in connectors().unwrap() {
            assert_eq!(c.pads().count(), 36);
        }
    }

    #[test]
    fn gpio2_first_pads_match_serial() {
        let p = platform().unwrap();
        let gpio2 = p.connector("gpio2").unwrap();
        let serial = p.signal("serial", 0).unwrap();
        assert_eq!(gpio2.pad(1).unwrap(), "L16");
        assert_eq!(serial.package_pins(), vec!["L16", "L17"]);
    }

    #[test]
    fn hdmi_subsignals_keep_their_standards() {
        let p = platform().unwrap();
        let hdmi = p.signal("hdmi_out", 0).unwrap();
        assert_eq!(hdmi.subsignals.len(), 11);
        assert_eq!(
            hdmi.subsignal("clk_p").unwrap().standard,
            Some(IoStandard::Tmds33)
        );
        assert_eq!(
            hdmi.subsignal("hdp").unwrap().standard,
            Some(IoStandard::Lvcmos33)
        );
    }

    #[test]
    fn eth_data_is_four_bits_with_slew_hint() {
        let p = platform().unwrap();
        let eth = p.signal("eth", 0).unwrap();
        let tx = eth.subsignal("tx_data").unwrap();
        assert_eq!(tx.pins.len(), 4);
        assert_eq!(tx.misc[0].to_string(), "SLEW=FAST");
        assert_eq!(tx.standard, Some(IoStandard::Lvcmos33));
    }

    #[test]
    fn usb_uart_resolves_through_gpio1() {
        let mut p = platform().unwrap();
        p.add_extension(usb_uart_io()).unwrap();
        let uart = p.signal("usb_uart", 0).unwrap();
        assert_eq!(
            uart.subsignal("tx").unwrap().pins,
            vec![Pin::Package("N17".into())]
        );
    }
}
