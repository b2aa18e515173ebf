//! Spatial join between site rows and access points.
//!
//! Selecting a wing (usually by clicking its building) lists that wing's
//! site rows grouped by floor, and each row can be expanded to the access
//! points installed in its section. Rows and access points meet on the
//! location code: a row's `Afsnitsnr` against the code decoded from each
//! access point's location text.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::buildings::Building;
use crate::cache::{AccessPointCache, ResolvedLocation};
use crate::domain::Floor;
use crate::records::SiteRow;

/// Rank given to floor labels outside the known vocabulary.
const UNKNOWN_FLOOR_RANK: i64 = 999;

/// Position of a floor label in natural order.
///
/// Unknown labels sort after every known floor.
pub fn floor_rank(label: &str) -> i64 {
    Floor::parse_label(label).map_or(UNKNOWN_FLOOR_RANK, |f| f.rank())
}

/// Compare floor labels in natural order.
pub fn compare_floors(a: &str, b: &str) -> Ordering {
    floor_rank(a).cmp(&floor_rank(b))
}

/// Joins a site row snapshot against the access point cache.
#[derive(Debug, Clone)]
pub struct SpatialJoinIndex {
    rows: Vec<SiteRow>,
    cache: AccessPointCache,
}

impl SpatialJoinIndex {
    pub fn new(rows: Vec<SiteRow>, cache: AccessPointCache) -> Self {
        Self { rows, cache }
    }

    /// Replace the site row snapshot.
    pub fn replace_rows(&mut self, rows: Vec<SiteRow>) {
        debug!(rows = rows.len(), "replaced site rows");
        self.rows = rows;
    }

    pub fn rows(&self) -> &[SiteRow] {
        &self.rows
    }

    /// Distinct wings present in the rows.
    ///
    /// Values are listed exactly as written so each one can be passed to
    /// [`SpatialJoinIndex::inspect`]; blank values are skipped. Numeric wings
    /// come first in numeric order, then any others in lexicographic order.
    pub fn wings(&self) -> Vec<String> {
        let distinct: BTreeSet<&str> = self
            .rows
            .iter()
            .map(|r| r.opgang.as_str())
            .filter(|w| !w.trim().is_empty())
            .collect();

        let mut wings: Vec<&str> = distinct.into_iter().collect();
        wings.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => a.cmp(b),
        });
        wings.into_iter().map(str::to_string).collect()
    }

    /// Inspect one wing.
    ///
    /// Rows match on exact `Opgang` text. Floors are the distinct non-empty
    /// `Etage` values in natural order, and the first of them is selected.
    pub fn inspect(&self, wing: &str) -> WingInspection {
        let rows: Vec<SiteRow> = self
            .rows
            .iter()
            .filter(|r| r.opgang == wing)
            .cloned()
            .collect();

        let mut floors: Vec<String> = Vec::new();
        for row in &rows {
            if !row.etage.is_empty() && !floors.contains(&row.etage) {
                floors.push(row.etage.clone());
            }
        }
        floors.sort_by(|a, b| compare_floors(a, b));

        let mut rows_by_floor: BTreeMap<String, Vec<SiteRow>> = BTreeMap::new();
        for row in &rows {
            if !row.etage.is_empty() {
                rows_by_floor
                    .entry(row.etage.clone())
                    .or_default()
                    .push(row.clone());
            }
        }

        debug!(wing, rows = rows.len(), floors = floors.len(), "inspected wing");

        WingInspection {
            wing: wing.to_string(),
            current_floor: floors.first().cloned(),
            rows,
            floors,
            rows_by_floor,
        }
    }

    /// Inspect the wing housed by a building.
    pub fn inspect_building(&self, building: &Building) -> WingInspection {
        self.inspect(building.wing())
    }

    /// Access points installed in a row's section.
    ///
    /// Rows without a usable `Afsnitsnr` never match.
    pub fn access_points_for(&self, row: &SiteRow) -> Vec<ResolvedLocation> {
        let Some(code) = row.code() else {
            return Vec::new();
        };
        self.cache
            .snapshot()
            .at_code(&code)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Everything shown when a row is opened.
    pub fn row_details(&self, row: &SiteRow) -> RowDetails {
        RowDetails {
            title: row.detail_title(),
            fields: row
                .details()
                .into_iter()
                .map(|(label, value)| (label, value.to_string()))
                .collect(),
            access_points: self.access_points_for(row),
        }
    }
}

/// The rows and floors of one wing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WingInspection {
    pub wing: String,
    pub rows: Vec<SiteRow>,
    /// Distinct floors in natural order.
    pub floors: Vec<String>,
    pub rows_by_floor: BTreeMap<String, Vec<SiteRow>>,
    pub current_floor: Option<String>,
}

impl WingInspection {
    /// Select a floor. Floors not present in this wing are ignored and
    /// `false` is returned.
    pub fn select_floor(&mut self, floor: &str) -> bool {
        if !self.floors.iter().any(|f| f == floor) {
            return false;
        }
        self.current_floor = Some(floor.to_string());
        true
    }

    /// Rows on the selected floor, in snapshot order.
    pub fn rows_on_current_floor(&self) -> &[SiteRow] {
        self.current_floor
            .as_deref()
            .map_or(&[][..], |floor| self.rows_on(floor))
    }

    pub fn rows_on(&self, floor: &str) -> &[SiteRow] {
        self.rows_by_floor.get(floor).map_or(&[][..], Vec::as_slice)
    }

    /// No rows were found for the wing.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Labelled fields and joined access points for one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowDetails {
    pub title: String,
    pub fields: Vec<(&'static str, String)>,
    pub access_points: Vec<ResolvedLocation>,
}
