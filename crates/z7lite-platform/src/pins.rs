//! Signal and pin model.
//!
//! Board tables are written as [`Signal`] definitions whose pins are still
//! textual ([`Pins`]): package pins such as `"J14 K14"`, connector pad
//! references such as `"gpio1:3"`, or a count of dedicated processor pins.
//! The [`PlatformDescriptor`](crate::descriptor::PlatformDescriptor) resolves
//! them into [`BoundSignal`]s when the table is registered.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::connector::ConnectorTable;
use crate::error::{PlatformError, Result};

/// Electrical IO standard of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IoStandard {
    #[serde(rename = "LVCMOS12")]
    Lvcmos12,
    #[serde(rename = "LVCMOS15")]
    Lvcmos15,
    #[serde(rename = "LVCMOS18")]
    Lvcmos18,
    #[serde(rename = "LVCMOS25")]
    Lvcmos25,
    #[serde(rename = "LVCMOS33")]
    Lvcmos33,
    #[serde(rename = "LVTTL")]
    Lvttl,
    #[serde(rename = "LVDS_25")]
    Lvds25,
    #[serde(rename = "SSTL15")]
    Sstl15,
    /// Transition-minimized differential signalling, 3.3 V (HDMI).
    #[serde(rename = "TMDS_33")]
    Tmds33,
}

impl IoStandard {
    /// Name as written in vendor constraint files.
    pub fn as_str(&self) -> &'static str {
        match self {
            IoStandard::Lvcmos12 => "LVCMOS12",
            IoStandard::Lvcmos15 => "LVCMOS15",
            IoStandard::Lvcmos18 => "LVCMOS18",
            IoStandard::Lvcmos25 => "LVCMOS25",
            IoStandard::Lvcmos33 => "LVCMOS33",
            IoStandard::Lvttl => "LVTTL",
            IoStandard::Lvds25 => "LVDS_25",
            IoStandard::Sstl15 => "SSTL15",
            IoStandard::Tmds33 => "TMDS_33",
        }
    }
}

impl fmt::Display for IoStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IoStandard {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self> {
        let standard = match s {
            "LVCMOS12" => IoStandard::Lvcmos12,
            "LVCMOS15" => IoStandard::Lvcmos15,
            "LVCMOS18" => IoStandard::Lvcmos18,
            "LVCMOS25" => IoStandard::Lvcmos25,
            "LVCMOS33" => IoStandard::Lvcmos33,
            "LVTTL" => IoStandard::Lvttl,
            "LVDS_25" => IoStandard::Lvds25,
            "SSTL15" => IoStandard::Sstl15,
            "TMDS_33" => IoStandard::Tmds33,
            other => {
                return Err(PlatformError::Invalid {
                    what: "IO standard",
                    value: other.to_string(),
                })
            }
        };
        Ok(standard)
    }
}

/// A toolchain hint attached to a pin, e.g. `SLEW=FAST`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Misc {
    pub key: String,
    pub value: String,
}

impl Misc {
    /// Parse a `KEY=VALUE` hint.
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => Ok(Misc {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }),
            _ => Err(PlatformError::Invalid {
                what: "pin hint",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Misc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl TryFrom<String> for Misc {
    type Error = PlatformError;

    fn try_from(s: String) -> Result<Self> {
        Misc::parse(&s)
    }
}

impl From<Misc> for String {
    fn from(m: Misc) -> String {
        m.to_string()
    }
}

/// Unresolved pin list as written in a board table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pins {
    /// Whitespace-separated package pins and/or `connector:pad` references.
    Named(String),
    /// Hard-wired processor pins with no package location.
    Dedicated(usize),
}

impl Pins {
    /// Resolve the pin list, turning connector references into package pins.
    pub fn resolve(&self, connectors: &[ConnectorTable]) -> Result<Vec<Pin>> {
        match self {
            Pins::Dedicated(count) => Ok((0..*count).map(Pin::Dedicated).collect()),
            Pins::Named(text) => {
                let pins: Vec<Pin> = text
                    .split_whitespace()
                    .map(|token| resolve_token(token, connectors))
                    .collect::<Result<_>>()?;
                if pins.is_empty() {
                    return Err(PlatformError::Invalid {
                        what: "pin list",
                        value: text.clone(),
                    });
                }
                Ok(pins)
            }
        }
    }
}

fn resolve_token(token: &str, connectors: &[ConnectorTable]) -> Result<Pin> {
    if let Some((connector, pad)) = token.split_once(':') {
        let pad: usize = pad.parse().map_err(|_| PlatformError::Invalid {
            what: "connector pad",
            value: token.to_string(),
        })?;
        let table = connectors
            .iter()
            .find(|c| c.name() == connector)
            .ok_or_else(|| PlatformError::UnknownConnector {
                name: connector.to_string(),
            })?;
        return Ok(Pin::Package(table.pad(pad)?.to_string()));
    }
    if !token.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PlatformError::Invalid {
            what: "package pin",
            value: token.to_string(),
        });
    }
    Ok(Pin::Package(token.to_string()))
}

/// A resolved physical pin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pin {
    /// A package ball, e.g. `N18`.
    Package(String),
    /// Index of a dedicated processor pin.
    Dedicated(usize),
}

impl Pin {
    /// Package location, if this pin has one.
    pub fn location(&self) -> Option<&str> {
        match self {
            Pin::Package(loc) => Some(loc),
            Pin::Dedicated(_) => None,
        }
    }
}

/// Named member of a composite signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subsignal {
    pub name: String,
    pub pins: Pins,
    /// Overrides the parent signal's standard when set.
    pub standard: Option<IoStandard>,
    pub misc: Vec<Misc>,
}

impl Subsignal {
    pub fn new(name: impl Into<String>, pins: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pins: Pins::Named(pins.into()),
            standard: None,
            misc: Vec::new(),
        }
    }

    /// Subsignal made of dedicated processor pins.
    pub fn dedicated(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            pins: Pins::Dedicated(count),
            standard: None,
            misc: Vec::new(),
        }
    }

    pub fn with_standard(mut self, standard: IoStandard) -> Self {
        self.standard = Some(standard);
        self
    }

    pub fn with_misc(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.misc.push(Misc {
            key: key.into(),
            value: value.into(),
        });
        self
    }
}

/// One entry of a board IO table.
///
/// A signal carries either its own pins or a list of subsignals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub name: String,
    pub instance: u32,
    pub pins: Option<Pins>,
    pub subsignals: Vec<Subsignal>,
    pub standard: Option<IoStandard>,
    pub misc: Vec<Misc>,
}

impl Signal {
    pub fn new(name: impl Into<String>, instance: u32) -> Self {
        Self {
            name: name.into(),
            instance,
            pins: None,
            subsignals: Vec::new(),
            standard: None,
            misc: Vec::new(),
        }
    }

    pub fn with_pins(mut self, pins: impl Into<String>) -> Self {
        self.pins = Some(Pins::Named(pins.into()));
        self
    }

    pub fn with_dedicated(mut self, count: usize) -> Self {
        self.pins = Some(Pins::Dedicated(count));
        self
    }

    pub fn with_subsignal(mut self, subsignal: Subsignal) -> Self {
        self.subsignals.push(subsignal);
        self
    }

    pub fn with_standard(mut self, standard: IoStandard) -> Self {
        self.standard = Some(standard);
        self
    }

    pub fn with_misc(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.misc.push(Misc {
            key: key.into(),
            value: value.into(),
        });
        self
    }
}

/// A subsignal after resolution, with inherited standard and hints applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundSubsignal {
    pub name: String,
    /// Top-level port name, `<signal port>_<subsignal>`.
    pub port: String,
    pub pins: Vec<Pin>,
    pub standard: Option<IoStandard>,
    pub misc: Vec<Misc>,
}

/// A resolved signal, as handed out by a pin request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundSignal {
    pub name: String,
    pub instance: u32,
    /// Top-level port name.
    pub port: String,
    /// Pins of a simple signal; empty for composite signals.
    pub pins: Vec<Pin>,
    pub standard: Option<IoStandard>,
    pub misc: Vec<Misc>,
    pub subsignals: Vec<BoundSubsignal>,
}

impl BoundSignal {
    /// Resolve a table entry. `multi_instance` selects `<name><instance>` port naming.
    pub(crate) fn resolve(
        signal: &Signal,
        multi_instance: bool,
        connectors: &[ConnectorTable],
    ) -> Result<Self> {
        let port = if multi_instance {
            format!("{}{}", signal.name, signal.instance)
        } else {
            signal.name.clone()
        };

        let pins = match &signal.pins {
            Some(pins) => pins.resolve(connectors)?,
            None if signal.subsignals.is_empty() => {
                return Err(PlatformError::Invalid {
                    what: "signal without pins",
                    value: signal.name.clone(),
                })
            }
            None => Vec::new(),
        };

        let subsignals = signal
            .subsignals
            .iter()
            .map(|sub| {
                let mut misc = signal.misc.clone();
                misc.extend(sub.misc.iter().cloned());
                Ok(BoundSubsignal {
                    name: sub.name.clone(),
                    port: format!("{port}_{}", sub.name),
                    pins: sub.pins.resolve(connectors)?,
                    standard: sub.standard.or(signal.standard),
                    misc,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let bound = Self {
            name: signal.name.clone(),
            instance: signal.instance,
            port,
            pins,
            standard: signal.standard,
            misc: signal.misc.clone(),
            subsignals,
        };
        bound.check_distinct_pins()?;
        Ok(bound)
    }

    /// A package pin may appear only once across a signal and its subsignals.
    fn check_distinct_pins(&self) -> Result<()> {
        let ports = std::iter::once((self.port.as_str(), &self.pins)).chain(
            self.subsignals
                .iter()
                .map(|s| (s.port.as_str(), &s.pins)),
        );
        let mut seen: HashMap<&str, String> = HashMap::new();
        for (port, pins) in ports {
            let indexed = pins.len() > 1;
            for (i, pin) in pins.iter().enumerate() {
                let Some(location) = pin.location() else {
                    continue;
                };
                let target = if indexed {
                    format!("{port}[{i}]")
                } else {
                    port.to_string()
                };
                if let Some(owner) = seen.get(location) {
                    return Err(PlatformError::PinConflict {
                        pin: location.to_string(),
                        requested: format!("{} ({target})", self.label()),
                        owner: format!("{} ({owner})", self.label()),
                    });
                }
                seen.insert(location, target);
            }
        }
        Ok(())
    }

    /// Look up a subsignal by name.
    pub fn subsignal(&self, name: &str) -> Option<&BoundSubsignal> {
        self.subsignals.iter().find(|s| s.name == name)
    }

    /// Every package location used by this signal, in table order.
    pub fn package_pins(&self) -> Vec<&str> {
        self.pins
            .iter()
            .chain(self.subsignals.iter().flat_map(|s| s.pins.iter()))
            .filter_map(Pin::location)
            .collect()
    }

    /// Human-readable owner label used in conflict messages.
    pub fn label(&self) -> String {
        format!("{}:{}", self.name, self.instance)
    }
}
