//! Expansion header pad tables.

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, Result};

/// Physical layout of a pin header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderGeometry {
    pub rows: usize,
    pub columns: usize,
}

impl HeaderGeometry {
    /// Number of signal pads on the header.
    pub fn pad_count(&self) -> usize {
        self.rows * self.columns
    }
}

/// A named header mapping 1-indexed pad positions to package pins.
///
/// Pads are numbered row by row, starting at the square soldering pad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectorTable {
    name: String,
    geometry: HeaderGeometry,
    pads: Vec<String>,
}

impl ConnectorTable {
    /// Build a connector from per-row pad strings (whitespace separated).
    pub fn new(name: impl Into<String>, geometry: HeaderGeometry, rows: &[&str]) -> Result<Self> {
        let name = name.into();
        let pads: Vec<String> = rows
            .iter()
            .flat_map(|row| row.split_whitespace())
            .map(str::to_string)
            .collect();
        if pads.len() != geometry.pad_count() {
            return Err(PlatformError::ConnectorGeometry {
                name,
                expected: geometry.pad_count(),
                actual: pads.len(),
            });
        }
        Ok(Self {
            name,
            geometry,
            pads,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> HeaderGeometry {
        self.geometry
    }

    /// Package pin behind pad `pad` (1-indexed).
    pub fn pad(&self, pad: usize) -> Result<&str> {
        if pad == 0 || pad > self.pads.len() {
            return Err(PlatformError::PadOutOfRange {
                connector: self.name.clone(),
                pad,
                count: self.pads.len(),
            });
        }
        Ok(&self.pads[pad - 1])
    }

    /// All pads in order, paired with their 1-based position.
    pub fn pads(&self) -> impl Iterator<Item = (usize, &str)> {
        self.pads.iter().enumerate().map(|(i, p)| (i + 1, p.as_str()))
    }
}
