//! Access point hardware address keys.

use std::fmt;

use serde::Serialize;

/// A normalized hardware address (BSSID / MAC) used as a lookup key.
///
/// Normalization only trims and lower-cases: addresses are compared as text,
/// not parsed, so vendor formats with dashes or dots still work as long as
/// both sides are written the same way.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MacKey(String);

impl MacKey {
    /// Normalize a raw address. Blank input yields `None`.
    pub fn normalize(raw: &str) -> Option<Self> {
        let key = raw.trim().to_lowercase();
        if key.is_empty() { None } else { Some(MacKey(key)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MacKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacKey({})", self.0)
    }
}

impl fmt::Display for MacKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
