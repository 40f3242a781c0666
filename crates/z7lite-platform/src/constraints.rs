//! Timing constraints, platform commands, and XDC rendering.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::pins::{BoundSignal, IoStandard, Misc, Pin};

/// A clock period constraint on a net.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodConstraint {
    pub net: String,
    pub period_ns: f64,
}

/// Two nets whose clocks must not be timed against each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FalsePath {
    pub from: String,
    pub to: String,
}

/// Constraints accumulated while composing a design.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConstraintSet {
    pub periods: Vec<PeriodConstraint>,
    pub false_paths: Vec<FalsePath>,
    /// Raw toolchain commands, emitted verbatim.
    pub commands: Vec<String>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Constrain `net` to `period_ns`. A later constraint on the same net replaces the earlier one.
    pub fn add_period(&mut self, net: impl Into<String>, period_ns: f64) {
        let net = net.into();
        self.periods.retain(|p| p.net != net);
        self.periods.push(PeriodConstraint { net, period_ns });
    }

    pub fn add_false_path(&mut self, from: impl Into<String>, to: impl Into<String>) {
        let path = FalsePath {
            from: from.into(),
            to: to.into(),
        };
        if !self.false_paths.contains(&path) {
            self.false_paths.push(path);
        }
    }

    pub fn add_command(&mut self, command: impl Into<String>) {
        self.commands.push(command.into());
    }
}

/// Render bound pins and constraints as a Vivado XDC file.
pub fn render_xdc(bindings: &[BoundSignal], constraints: &ConstraintSet) -> String {
    let mut out = String::new();
    out.push_str("################################################################################\n");
    out.push_str("# IO constraints\n");
    out.push_str("################################################################################\n");

    for signal in bindings {
        writeln!(out, "# {}:{}", signal.name, signal.instance).ok();
        write_pins(&mut out, &signal.port, &signal.pins, signal.standard, &signal.misc);
        for sub in &signal.subsignals {
            write_pins(&mut out, &sub.port, &sub.pins, sub.standard, &sub.misc);
        }
        out.push('\n');
    }

    out.push_str("################################################################################\n");
    out.push_str("# Design constraints\n");
    out.push_str("################################################################################\n\n");
    for command in &constraints.commands {
        writeln!(out, "{command}").ok();
    }

    out.push_str("\n################################################################################\n");
    out.push_str("# Clock constraints\n");
    out.push_str("################################################################################\n\n");
    for period in &constraints.periods {
        writeln!(
            out,
            "create_clock -name {net} -period {period:.3} [get_nets {net}]",
            net = period.net,
            period = period.period_ns
        )
        .ok();
    }

    out.push_str("\n################################################################################\n");
    out.push_str("# False path constraints\n");
    out.push_str("################################################################################\n\n");
    for path in &constraints.false_paths {
        writeln!(
            out,
            "set_clock_groups -group [get_clocks -include_generated_clocks -of [get_nets {}]] \
             -group [get_clocks -include_generated_clocks -of [get_nets {}]] -asynchronous",
            path.from, path.to
        )
        .ok();
    }
    out
}

fn write_pins(
    out: &mut String,
    port: &str,
    pins: &[Pin],
    standard: Option<IoStandard>,
    misc: &[Misc],
) {
    let indexed = pins.len() > 1;
    for (i, pin) in pins.iter().enumerate() {
        // Dedicated processor pins are placed by the hard block.
        let Some(location) = pin.location() else {
            continue;
        };
        let target = if indexed {
            format!("{port}[{i}]")
        } else {
            port.to_string()
        };
        writeln!(out, "set_property LOC {location} [get_ports {{{target}}}]").ok();
        if let Some(std) = standard {
            writeln!(out, "set_property IOSTANDARD {std} [get_ports {{{target}}}]").ok();
        }
        for m in misc {
            writeln!(
                out,
                "set_property {} {} [get_ports {{{target}}}]",
                m.key, m.value
            )
            .ok();
        }
    }
}
