//! TOML extension tables.
//!
//! An extension file lists additional signals, typically for a module plugged
//! into one of the GPIO headers:
//!
//! ```toml
//! [[signal]]
//! name = "pmod_uart"
//! standard = "LVCMOS33"
//!
//! [[signal.subsignal]]
//! name = "tx"
//! pins = "gpio1:3"
//! misc = ["SLEW=FAST"]
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{PlatformError, Result};
use crate::pins::{IoStandard, Misc, Pins, Signal, Subsignal};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExtensionFile {
    #[serde(default)]
    signal: Vec<SignalEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SignalEntry {
    name: String,
    #[serde(default)]
    instance: u32,
    pins: Option<String>,
    dedicated: Option<usize>,
    standard: Option<IoStandard>,
    #[serde(default)]
    misc: Vec<Misc>,
    #[serde(default)]
    subsignal: Vec<SubsignalEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubsignalEntry {
    name: String,
    pins: Option<String>,
    dedicated: Option<usize>,
    standard: Option<IoStandard>,
    #[serde(default)]
    misc: Vec<Misc>,
}

fn pins_of(owner: &str, pins: Option<String>, dedicated: Option<usize>) -> Result<Option<Pins>> {
    match (pins, dedicated) {
        (Some(_), Some(_)) => Err(PlatformError::Invalid {
            what: "pin list (both `pins` and `dedicated` given)",
            value: owner.to_string(),
        }),
        (Some(p), None) => Ok(Some(Pins::Named(p))),
        (None, Some(n)) => Ok(Some(Pins::Dedicated(n))),
        (None, None) => Ok(None),
    }
}

impl SignalEntry {
    fn into_signal(self) -> Result<Signal> {
        let pins = pins_of(&self.name, self.pins, self.dedicated)?;
        let subsignals = self
            .subsignal
            .into_iter()
            .map(|sub| {
                let owner = format!("{}.{}", self.name, sub.name);
                let pins = pins_of(&owner, sub.pins, sub.dedicated)?.ok_or(
                    PlatformError::Invalid {
                        what: "subsignal without pins",
                        value: owner,
                    },
                )?;
                Ok(Subsignal {
                    name: sub.name,
                    pins,
                    standard: sub.standard,
                    misc: sub.misc,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Signal {
            name: self.name,
            instance: self.instance,
            pins,
            subsignals,
            standard: self.standard,
            misc: self.misc,
        })
    }
}

/// Parse an extension table from a TOML string.
pub fn parse_extension_toml(toml_str: &str) -> Result<Vec<Signal>> {
    let file: ExtensionFile = toml::from_str(toml_str)?;
    file.signal.into_iter().map(SignalEntry::into_signal).collect()
}

/// Load an extension table from a `.toml` file.
pub fn load_extension_toml(path: &Path) -> Result<Vec<Signal>> {
    if !path.exists() {
        return Err(PlatformError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    parse_extension_toml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PMOD: &str = r#"
[[signal]]
name = "pmod_uart"
standard = "LVCMOS33"

[[signal.subsignal]]
name = "tx"
pins = "gpio1:3"
misc = ["SLEW=FAST"]

[[signal.subsignal]]
name = "rx"
pins = "gpio1:4"

[[signal]]
name = "pmod_led"
instance = 1
pins = "T16"
"#;

    #[test]
    fn parses_signals_and_subsignals() {
        let table = parse_extension_toml(PMOD).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].name, "pmod_uart");
        assert_eq!(table[0].standard, Some(IoStandard::Lvcmos33));
        assert_eq!(table[0].subsignals.len(), 2);
        assert_eq!(table[0].subsignals[0].misc[0].key, "SLEW");
        assert_eq!(table[1].instance, 1);
        assert_eq!(table[1].pins, Some(Pins::Named("T16".into())));
    }

    #[test]
    fn rejects_unknown_standard() {
        let bad = "[[signal]]\nname = \"x\"\npins = \"A1\"\nstandard = \"LVCMOS99\"\n";
        assert!(parse_extension_toml(bad).is_err());
    }

    #[test]
    fn rejects_pins_and_dedicated_together() {
        let bad = "[[signal]]\nname = \"x\"\npins = \"A1\"\ndedicated = 2\n";
        assert!(matches!(
            parse_extension_toml(bad),
            Err(PlatformError::Invalid { .. })
        ));
    }

    #[test]
    fn rejects_subsignal_without_pins() {
        let bad = "[[signal]]\nname = \"x\"\n[[signal.subsignal]]\nname = \"tx\"\n";
        assert!(parse_extension_toml(bad).is_err());
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_extension_toml(&dir.path().join("none.toml")).unwrap_err();
        assert!(matches!(err, PlatformError::NotFound { .. }));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pmod.toml");
        std::fs::write(&path, PMOD).unwrap();
        assert_eq!(load_extension_toml(&path).unwrap().len(), 2);
    }
}
