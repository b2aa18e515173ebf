//! Wing ("opgang") membership configuration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Error returned when a configured wing id is not a two-digit number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid wing id {0}: must be between 0 and 99")]
pub struct InvalidWingId(pub u16);

/// Wing ids that use the two-digit grouping scheme.
///
/// A location code `ABCD` whose leading pair `AB` is a member belongs to
/// wing `AB`; every other code belongs to the single-digit wing `A`. The set
/// is configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u16>", into = "Vec<u16>")]
pub struct WingMembership(BTreeSet<u8>);

impl WingMembership {
    /// The campus's two-digit wings.
    pub const CAMPUS_WINGS: [u8; 30] = [
        2, 3, 4, 5, 6, 7, 8, 10, 11, 13, 39, 41, 42, 44, 45, 54, 55, 56, 57, 58, 62, 75, 76, 85,
        86, 87, 93, 94, 95, 99,
    ];

    /// Create a membership set from wing ids.
    pub fn new(ids: impl IntoIterator<Item = u16>) -> Result<Self, InvalidWingId> {
        ids.into_iter()
            .map(|id| {
                u8::try_from(id)
                    .ok()
                    .filter(|id| *id < 100)
                    .ok_or(InvalidWingId(id))
            })
            .collect::<Result<BTreeSet<_>, _>>()
            .map(WingMembership)
    }

    /// An empty set: every code decodes under the single-digit scheme.
    pub fn empty() -> Self {
        WingMembership(BTreeSet::new())
    }

    /// Check whether a leading pair selects the two-digit scheme.
    pub fn contains(&self, pair: u8) -> bool {
        self.0.contains(&pair)
    }

    /// Iterate over member ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for WingMembership {
    fn default() -> Self {
        WingMembership(Self::CAMPUS_WINGS.into_iter().collect())
    }
}

impl TryFrom<Vec<u16>> for WingMembership {
    type Error = InvalidWingId;

    fn try_from(ids: Vec<u16>) -> Result<Self, Self::Error> {
        WingMembership::new(ids)
    }
}

impl From<WingMembership> for Vec<u16> {
    fn from(wings: WingMembership) -> Self {
        wings.iter().map(u16::from).collect()
    }
}
