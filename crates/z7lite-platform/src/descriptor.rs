//! Platform descriptor: owns the pin map and hands out exclusive bindings.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::connector::ConnectorTable;
use crate::error::{PlatformError, Result};
use crate::pins::{BoundSignal, Signal};

/// Capability interface through which SoC composition obtains pins.
pub trait PinProvider {
    /// Bind `(name, instance)`. Fails if it is unregistered or already bound.
    fn request(&mut self, name: &str, instance: u32) -> Result<BoundSignal>;

    /// Like [`request`](Self::request), but an unregistered signal yields `None`.
    fn request_optional(&mut self, name: &str, instance: u32) -> Result<Option<BoundSignal>>;

    /// Bind every instance of `name`, ordered by instance index.
    fn request_all(&mut self, name: &str) -> Result<Vec<BoundSignal>>;

    /// Merge an auxiliary IO table. Fails if any of its names already exists.
    fn add_extension(&mut self, table: Vec<Signal>) -> Result<()>;

    /// An existing binding, without binding anything.
    fn bound(&self, name: &str, instance: u32) -> Option<&BoundSignal>;
}

/// The oscillator the board designates as its default clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultClock {
    pub name: String,
    pub freq_hz: u64,
}

impl DefaultClock {
    pub fn period_ns(&self) -> f64 {
        1e9 / self.freq_hz as f64
    }
}

type Key = (String, u32);

/// The board's pin map, connectors, and binding ledger.
#[derive(Debug, Clone)]
pub struct PlatformDescriptor {
    device: String,
    default_clock: DefaultClock,
    connectors: Vec<ConnectorTable>,
    entries: BTreeMap<Key, BoundSignal>,
    bound_keys: HashSet<Key>,
    pin_owners: HashMap<String, String>,
    bindings: Vec<BoundSignal>,
}

impl PlatformDescriptor {
    /// Build a descriptor from a base IO table and its connectors.
    pub fn new(
        device: impl Into<String>,
        default_clock: DefaultClock,
        io: Vec<Signal>,
        connectors: Vec<ConnectorTable>,
    ) -> Result<Self> {
        let mut descriptor = Self {
            device: device.into(),
            default_clock,
            connectors,
            entries: BTreeMap::new(),
            bound_keys: HashSet::new(),
            pin_owners: HashMap::new(),
            bindings: Vec::new(),
        };
        descriptor.register(io)?;
        Ok(descriptor)
    }

    /// FPGA part name, e.g. `xc7z020-clg400-2`.
    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn default_clock(&self) -> &DefaultClock {
        &self.default_clock
    }

    pub fn connectors(&self) -> &[ConnectorTable] {
        &self.connectors
    }

    pub fn connector(&self, name: &str) -> Option<&ConnectorTable> {
        self.connectors.iter().find(|c| c.name() == name)
    }

    /// A registered signal, bound or not.
    pub fn signal(&self, name: &str, instance: u32) -> Option<&BoundSignal> {
        self.entries.get(&(name.to_string(), instance))
    }

    /// Every registered signal ordered by name, then instance.
    pub fn signals(&self) -> impl Iterator<Item = &BoundSignal> {
        self.entries.values()
    }

    /// Bindings handed out so far, in request order.
    pub fn bindings(&self) -> &[BoundSignal] {
        &self.bindings
    }

    /// Whether `(name, instance)` has been bound.
    pub fn is_bound(&self, name: &str, instance: u32) -> bool {
        self.bound_keys.contains(&(name.to_string(), instance))
    }

    fn instances(&self, name: &str) -> Vec<Key> {
        self.entries
            .range((name.to_string(), 0)..=(name.to_string(), u32::MAX))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Validate and resolve a table, then insert it. Nothing is inserted on error.
    fn register(&mut self, table: Vec<Signal>) -> Result<()> {
        let mut seen = HashSet::new();
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for signal in &table {
            if !seen.insert((signal.name.as_str(), signal.instance)) {
                return Err(PlatformError::DuplicateEntry {
                    name: signal.name.clone(),
                    instance: signal.instance,
                });
            }
            *counts.entry(signal.name.as_str()).or_default() += 1;
        }

        let resolved = table
            .iter()
            .map(|signal| {
                let multi = counts.get(signal.name.as_str()).copied().unwrap_or(0) > 1;
                BoundSignal::resolve(signal, multi, &self.connectors)
            })
            .collect::<Result<Vec<_>>>()?;

        for bound in resolved {
            self.entries
                .insert((bound.name.clone(), bound.instance), bound);
        }
        Ok(())
    }

    fn bind(&mut self, key: Key) -> Result<BoundSignal> {
        let signal = self
            .entries
            .get(&key)
            .ok_or_else(|| PlatformError::UnknownSignal {
                name: key.0.clone(),
                instance: key.1,
            })?;

        if self.bound_keys.contains(&key) {
            return Err(PlatformError::DuplicateBinding {
                name: key.0,
                instance: key.1,
            });
        }

        let label = signal.label();
        for pin in signal.package_pins() {
            if let Some(owner) = self.pin_owners.get(pin) {
                return Err(PlatformError::PinConflict {
                    pin: pin.to_string(),
                    requested: label,
                    owner: owner.clone(),
                });
            }
        }

        let signal = signal.clone();
        for pin in signal.package_pins() {
            self.pin_owners.insert(pin.to_string(), label.clone());
        }
        tracing::debug!(
            signal = %signal.name,
            instance = signal.instance,
            port = %signal.port,
            "bound signal"
        );
        self.bound_keys.insert(key);
        self.bindings.push(signal.clone());
        Ok(signal)
    }
}

impl PinProvider for PlatformDescriptor {
    fn request(&mut self, name: &str, instance: u32) -> Result<BoundSignal> {
        self.bind((name.to_string(), instance))
    }

    fn request_optional(&mut self, name: &str, instance: u32) -> Result<Option<BoundSignal>> {
        if self.signal(name, instance).is_none() {
            return Ok(None);
        }
        self.request(name, instance).map(Some)
    }

    fn request_all(&mut self, name: &str) -> Result<Vec<BoundSignal>> {
        let keys = self.instances(name);
        if keys.is_empty() {
            return Err(PlatformError::UnknownSignalName {
                name: name.to_string(),
            });
        }
        if let Some(key) = keys.iter().find(|k| self.bound_keys.contains(*k)) {
            return Err(PlatformError::DuplicateBinding {
                name: key.0.clone(),
                instance: key.1,
            });
        }
        keys.into_iter().map(|key| self.bind(key)).collect()
    }

    fn add_extension(&mut self, table: Vec<Signal>) -> Result<()> {
        if let Some(existing) = table
            .iter()
            .find(|s| !self.instances(&s.name).is_empty())
        {
            return Err(PlatformError::NameCollision {
                name: existing.name.clone(),
            });
        }
        let count = table.len();
        self.register(table)?;
        tracing::debug!(signals = count, "merged extension table");
        Ok(())
    }

    fn bound(&self, name: &str, instance: u32) -> Option<&BoundSignal> {
        let key = (name.to_string(), instance);
        if !self.bound_keys.contains(&key) {
            return None;
        }
        self.entries.get(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::HeaderGeometry;
    use crate::error::ErrorKind;
    use crate::pins::{IoStandard, Subsignal};

    fn descriptor() -> PlatformDescriptor {
        let io = vec![
            Signal::new("clk", 0)
                .with_pins("A1")
                .with_standard(IoStandard::Lvcmos33),
            Signal::new("led", 0).with_pins("B1"),
            Signal::new("led", 1).with_pins("B2"),
            Signal::new("uart", 0)
                .with_subsignal(Subsignal::new("tx", "C1"))
                .with_subsignal(Subsignal::new("rx", "C2")),
        ];
        let header = ConnectorTable::new(
            "j1",
            HeaderGeometry {
                rows: 2,
                columns: 2,
            },
            &["D1 D2", "C1 D4"],
        )
        .unwrap();
        PlatformDescriptor::new(
            "xc7z020-clg400-2",
            DefaultClock {
                name: "clk".into(),
                freq_hz: 50_000_000,
            },
            io,
            vec![header],
        )
        .unwrap()
    }

    #[test]
    fn request_binds_once() {
        let mut p = descriptor();
        let clk = p.request("clk", 0).unwrap();
        assert_eq!(clk.port, "clk");
        let err = p.request("clk", 0).unwrap_err();
        assert!(matches!(err, PlatformError::DuplicateBinding { .. }));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn unknown_signal_is_lookup_error() {
        let mut p = descriptor();
        let err = p.request("nope", 0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert!(p.request_optional("nope", 0).unwrap().is_none());
    }

    #[test]
    fn optional_request_still_rejects_duplicates() {
        let mut p = descriptor();
        assert!(p.request_optional("clk", 0).unwrap().is_some());
        assert!(p.request_optional("clk", 0).is_err());
    }

    #[test]
    fn distinct_instances_yield_disjoint_pins() {
        let mut p = descriptor();
        let a = p.request("led", 0).unwrap();
        let b = p.request("led", 1).unwrap();
        assert_eq!(a.port, "led0");
        assert_eq!(b.port, "led1");
        assert!(a
            .package_pins()
            .iter()
            .all(|pin| !b.package_pins().contains(pin)));
    }

    #[test]
    fn request_all_orders_by_instance() {
        let mut p = descriptor();
        let leds = p.request_all("led").unwrap();
        assert_eq!(
            leds.iter().map(|l| l.instance).collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert!(p.request_all("led").is_err());
        assert_eq!(
            p.request("led", 5).unwrap_err().kind(),
            ErrorKind::Lookup
        );
    }

    #[test]
    fn request_all_of_unknown_name_fails() {
        let mut p = descriptor();
        assert!(matches!(
            p.request_all("nope"),
            Err(PlatformError::UnknownSignalName { .. })
        ));
    }

    #[test]
    fn request_all_rejects_partially_bound_group() {
        let mut p = descriptor();
        p.request("led", 1).unwrap();
        assert!(p.request_all("led").is_err());
        assert!(!p.is_bound("led", 0));
    }

    #[test]
    fn extension_with_connector_pads() {
        let mut p = descriptor();
        p.add_extension(vec![Signal::new("pmod", 0).with_pins("j1:1 j1:2")])
            .unwrap();
        let pmod = p.request("pmod", 0).unwrap();
        assert_eq!(pmod.package_pins(), vec!["D1", "D2"]);
    }

    #[test]
    fn extension_name_collision_fails() {
        let mut p = descriptor();
        let err = p
            .add_extension(vec![Signal::new("led", 7).with_pins("D1")])
            .unwrap_err();
        assert!(matches!(err, PlatformError::NameCollision { .. }));
        assert!(p.signal("led", 7).is_none());
    }

    #[test]
    fn extension_with_bad_pad_is_not_merged() {
        let mut p = descriptor();
        let err = p
            .add_extension(vec![
                Signal::new("ok", 0).with_pins("D1"),
                Signal::new("bad", 0).with_pins("j1:9"),
            ])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert!(p.signal("ok", 0).is_none());
    }

    #[test]
    fn shared_package_pin_conflicts() {
        let mut p = descriptor();
        p.add_extension(vec![Signal::new("alt_tx", 0).with_pins("j1:3")])
            .unwrap();
        p.request("uart", 0).unwrap();
        let err = p.request("alt_tx", 0).unwrap_err();
        match err {
            PlatformError::PinConflict { pin, owner, .. } => {
                assert_eq!(pin, "C1");
                assert_eq!(owner, "uart:0");
            }
            other => panic!("expected pin conflict, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_table_entry_rejected() {
        let io = vec![
            Signal::new("led", 0).with_pins("B1"),
            Signal::new("led", 0).with_pins("B2"),
        ];
        let err = PlatformDescriptor::new(
            "dev",
            DefaultClock {
                name: "clk".into(),
                freq_hz: 1,
            },
            io,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PlatformError::DuplicateEntry { .. }));
    }

    #[test]
    fn bound_only_reports_requested_signals() {
        let mut p = descriptor();
        assert!(p.bound("clk", 0).is_none());
        p.request("clk", 0).unwrap();
        assert!(p.bound("clk", 0).is_some());
        assert_eq!(p.bindings().len(), 1);
    }

    #[test]
    fn default_clock_period() {
        let p = descriptor();
        assert!((p.default_clock().period_ns() - 20.0).abs() < 1e-9);
    }
}
