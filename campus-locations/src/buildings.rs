//! Buildings drawn on the campus map.
//!
//! A building is named after the wing (opgang) it houses, so inspecting a
//! building means inspecting that wing's site rows.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::records::RecordError;

/// A position as `[longitude, latitude]`.
pub type LngLat = [f64; 2];

/// A GeoJSON polygon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Polygon")]
pub struct Polygon {
    /// Linear rings; the first is the outline.
    pub coordinates: Vec<Vec<LngLat>>,
}

impl Polygon {
    /// A polygon with a single outline ring.
    ///
    /// The ring is closed by repeating its first point when the last point
    /// differs. Empty rings produce an empty polygon.
    pub fn from_ring(mut ring: Vec<LngLat>) -> Self {
        let Some(&first) = ring.first() else {
            return Self::default();
        };
        if ring.last() != Some(&first) {
            ring.push(first);
        }
        Self {
            coordinates: vec![ring],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.iter().all(Vec::is_empty)
    }
}

/// A building on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Building {
    pub id: String,
    /// The wing this building houses.
    #[serde(alias = "navn")]
    pub name: String,
    pub polygon: Polygon,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floors: Option<u32>,
    /// The hospital site this building belongs to, if linked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,
}

impl Building {
    pub fn new(id: impl Into<String>, name: impl Into<String>, polygon: Polygon) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            polygon,
            floors: None,
            hospital_id: None,
        }
    }

    pub fn with_floors(mut self, floors: u32) -> Self {
        self.floors = Some(floors);
        self
    }

    pub fn with_hospital(mut self, hospital_id: impl Into<String>) -> Self {
        self.hospital_id = Some(hospital_id.into());
        self
    }

    /// The wing inspected when this building is selected.
    pub fn wing(&self) -> &str {
        self.name.trim()
    }
}

/// A hospital site outlined on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub id: String,
    pub name: String,
    pub polygon: Polygon,
}

impl Hospital {
    /// The buildings linked to this hospital.
    pub fn buildings<'a>(&self, buildings: &'a [Building]) -> Vec<&'a Building> {
        buildings
            .iter()
            .filter(|b| b.hospital_id.as_deref() == Some(self.id.as_str()))
            .collect()
    }
}

/// Parse a building sheet snapshot.
///
/// Each row needs a `Navn` and a `Polygon` cell; the polygon cell holds the
/// GeoJSON as text, and unreadable geometry becomes an empty polygon rather
/// than dropping the building. `Antal etager` is kept when it is a
/// non-negative whole number. Ids are assigned from the row position.
pub fn parse_building_rows(json: &str) -> Result<Vec<Building>, RecordError> {
    let rows: Vec<Value> = serde_json::from_str(json)?;

    let buildings: Vec<Building> = rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let name = cell_text(row.get("Navn")?)?;
            let polygon_text = cell_text(row.get("Polygon")?)?;
            let polygon = serde_json::from_str(&polygon_text).unwrap_or_else(|e| {
                debug!(row = i, error = %e, "unreadable building polygon");
                Polygon::default()
            });
            Some(Building {
                id: format!("building-{i}"),
                name,
                polygon,
                floors: row.get("Antal etager").and_then(cell_count),
                hospital_id: None,
            })
        })
        .collect();

    debug!(rows = rows.len(), buildings = buildings.len(), "parsed building snapshot");
    Ok(buildings)
}

/// Non-empty text from a string or number cell.
fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn cell_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
