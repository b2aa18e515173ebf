//! Floor ("etage") labels.

use std::fmt;

use serde::{Serialize, Serializer};

/// A floor from the closed vocabulary used in location codes and site rows.
///
/// Labels are Danish: `Underkælder`, `Kælder`, `Stue` (ground floor) and
/// `"<n>. sal"` for the storeys above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Floor {
    /// Sub-basement.
    Underkaelder,
    /// Basement.
    Kaelder,
    /// Ground floor.
    Stue,
    /// Storey `n` above the ground floor.
    Sal(u32),
}

impl Floor {
    /// Parse a human floor label.
    ///
    /// Matching ignores case and surrounding whitespace, and allows any
    /// whitespace between `"<n>."` and `"sal"`.
    pub fn parse_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        match label.as_str() {
            "underkælder" => Some(Floor::Underkaelder),
            "kælder" => Some(Floor::Kaelder),
            "stue" => Some(Floor::Stue),
            other => parse_sal(other).map(Floor::Sal),
        }
    }

    /// Position in natural floor order.
    ///
    /// Underkælder sorts first, then Kælder, Stue and the storeys upwards.
    pub fn rank(&self) -> i64 {
        match self {
            Floor::Underkaelder => -1,
            Floor::Kaelder => 0,
            Floor::Stue => 1,
            Floor::Sal(n) => 1 + i64::from(*n),
        }
    }

    /// The display label, e.g. `"3. sal"`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Floor::Underkaelder => f.write_str("Underkælder"),
            Floor::Kaelder => f.write_str("Kælder"),
            Floor::Stue => f.write_str("Stue"),
            Floor::Sal(n) => write!(f, "{n}. sal"),
        }
    }
}

impl Serialize for Floor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a lower-cased `"<n>. sal"` label into `n`.
pub(crate) fn parse_sal(label: &str) -> Option<u32> {
    let (number, rest) = label.split_once('.')?;
    if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if rest.trim_start() != "sal" {
        return None;
    }
    number.parse().ok()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Display output always parses back to the same floor
        #[test]
        fn label_roundtrip(n in 0u32..100) {
            let floor = Floor::Sal(n);
            prop_assert_eq!(Floor::parse_label(&floor.label()), Some(floor));
        }
    }
}
