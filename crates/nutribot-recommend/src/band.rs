//! Calorie and protein bands. Each band is a half-open `[min, max)` range.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use nutribot_core::error::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalorieBand {
    #[default]
    Any,
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProteinBand {
    #[default]
    Any,
    Low,
    Medium,
    High,
}

/// Shared shape of the two band enums.
pub trait Band: Copy + FromStr<Err = Error> + Default {
    const KIND: &'static str;
    /// `None` for `Any`.
    fn range(self) -> Option<(f64, f64)>;

    fn contains(self, value: f64) -> bool {
        match self.range() {
            None => true,
            Some((min, max)) => value >= min && value < max,
        }
    }

    /// Parse a label, treating anything unrecognised as `Any` with a warning.
    fn parse_lenient(label: &str) -> Self {
        label.parse().unwrap_or_else(|e: Error| {
            warn!(kind = Self::KIND, label, error = %e, "Ignoring unknown band");
            Self::default()
        })
    }
}

/// Matches full labels such as `"Low (<400)"` and the bare names.
fn parse_level(label: &str, full: [&str; 4]) -> Option<usize> {
    let wanted = label.trim();
    let short = ["any", "low", "medium", "high"];
    (0..4).find(|&i| wanted == full[i] || wanted.eq_ignore_ascii_case(short[i]) || wanted.eq_ignore_ascii_case(full[i]))
}

impl CalorieBand {
    const LABELS: [&'static str; 4] = ["Any", "Low (<400)", "Medium (400-700)", "High (>700)"];

    pub fn label(self) -> &'static str {
        Self::LABELS[self as usize]
    }
}

impl ProteinBand {
    const LABELS: [&'static str; 4] = ["Any", "Low (<15g)", "Medium (15-30g)", "High (>30g)"];

    pub fn label(self) -> &'static str {
        Self::LABELS[self as usize]
    }
}

const LEVELS_CAL: [CalorieBand; 4] = [CalorieBand::Any, CalorieBand::Low, CalorieBand::Medium, CalorieBand::High];
const LEVELS_PRO: [ProteinBand; 4] = [ProteinBand::Any, ProteinBand::Low, ProteinBand::Medium, ProteinBand::High];

impl FromStr for CalorieBand {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Error> {
        parse_level(s, Self::LABELS)
            .map(|i| LEVELS_CAL[i])
            .ok_or_else(|| Error::InvalidBand { kind: Self::KIND, label: s.to_string() })
    }
}

impl FromStr for ProteinBand {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Error> {
        parse_level(s, Self::LABELS)
            .map(|i| LEVELS_PRO[i])
            .ok_or_else(|| Error::InvalidBand { kind: Self::KIND, label: s.to_string() })
    }
}

impl Band for CalorieBand {
    const KIND: &'static str = "calorie";
    fn range(self) -> Option<(f64, f64)> {
        match self {
            CalorieBand::Any => None,
            CalorieBand::Low => Some((0.0, 400.0)),
            CalorieBand::Medium => Some((400.0, 700.0)),
            CalorieBand::High => Some((700.0, f64::INFINITY)),
        }
    }
}

impl Band for ProteinBand {
    const KIND: &'static str = "protein";
    fn range(self) -> Option<(f64, f64)> {
        match self {
            ProteinBand::Any => None,
            ProteinBand::Low => Some((0.0, 15.0)),
            ProteinBand::Medium => Some((15.0, 30.0)),
            ProteinBand::High => Some((30.0, f64::INFINITY)),
        }
    }
}

impl fmt::Display for CalorieBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for ProteinBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
