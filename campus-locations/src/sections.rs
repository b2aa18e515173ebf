//! Sections created inside a building.
//!
//! When a building is saved, the site rows of its wing are turned into
//! section drafts so every known section can later be placed on the map.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::buildings::LngLat;
use crate::floor_code::{self, FloorCode};
use crate::records::SiteRow;

/// A section to be stored for a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDraft {
    /// The section's location code as written on the site row, e.g. `"2014"`.
    pub afsnit: String,
    pub etage: FloorCode,
    pub building_id: String,
    #[serde(default)]
    pub description: String,
    /// Marker position, set once the section is placed on the map.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LngLat>,
}

impl SectionDraft {
    pub fn with_location(mut self, location: LngLat) -> Self {
        self.location = Some(location);
        self
    }
}

/// Plan the sections to create for a building from its wing's site rows.
///
/// Rows without an `Afsnitsnr` are skipped, as are codes the building
/// already has, whether stored (`existing`) or planned from an earlier row.
/// The floor code comes from the row's `Etage` label. Drafts have no
/// location yet.
pub fn plan_section_import(
    building_id: &str,
    rows: &[SiteRow],
    existing: &[SectionDraft],
) -> Vec<SectionDraft> {
    let mut seen: HashSet<&str> = existing
        .iter()
        .filter(|s| s.building_id == building_id)
        .map(|s| s.afsnit.trim())
        .collect();

    let drafts: Vec<SectionDraft> = rows
        .iter()
        .filter_map(|row| {
            let afsnit = row.afsnitsnr.trim();
            if afsnit.is_empty() || !seen.insert(afsnit) {
                return None;
            }
            Some(SectionDraft {
                afsnit: afsnit.to_string(),
                etage: floor_code::label_to_code(&row.etage),
                building_id: building_id.to_string(),
                description: row.afsnitsnavn_rumnavn.clone(),
                location: None,
            })
        })
        .collect();

    debug!(
        building_id,
        rows = rows.len(),
        planned = drafts.len(),
        "planned section import"
    );
    drafts
}
