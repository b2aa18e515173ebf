//! Raw records supplied by the external stores.
//!
//! Access point records come from a document collection (camelCase fields)
//! or from the older spreadsheet export (Danish column headings). Site rows
//! come from the "steddata" spreadsheet, whose cells may be numbers even
//! where the core expects text. Both adapters are lenient: malformed cells
//! become empty strings, never errors.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::decode::LocationCodeDecoder;
use crate::domain::LocationCode;

/// Errors from parsing a snapshot document.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The document is not a JSON array
    #[error("snapshot is not a JSON array: {0}")]
    Json(#[from] serde_json::Error),
}

/// An access point as stored in the location database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessPointRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,

    #[serde(alias = "AP navn", deserialize_with = "lenient_string")]
    pub ap_name: String,

    /// Raw hardware address, mixed case and whitespace allowed.
    #[serde(alias = "Mac adresse", deserialize_with = "lenient_string")]
    pub mac_address: String,

    /// Free text, usually containing a location code.
    #[serde(alias = "Lokation", deserialize_with = "lenient_string")]
    pub location: String,

    /// Display-formatted creation time; opaque.
    #[serde(alias = "Oprettet", deserialize_with = "lenient_string")]
    pub created_at: String,
}

impl AccessPointRecord {
    /// Create a record that has not been stored yet.
    pub fn new(
        ap_name: impl Into<String>,
        mac_address: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            ap_name: ap_name.into(),
            mac_address: mac_address.into(),
            location: location.into(),
            ..Self::default()
        }
    }

    fn is_blank(&self) -> bool {
        [&self.created_at, &self.ap_name, &self.mac_address, &self.location]
            .iter()
            .all(|field| field.trim().is_empty())
    }
}

/// Parse an access point snapshot (a JSON array of records).
///
/// Entries that are not objects, and rows where every field is blank, are
/// dropped.
pub fn parse_access_points(json: &str) -> Result<Vec<AccessPointRecord>, RecordError> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    let total = values.len();

    let records: Vec<AccessPointRecord> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<AccessPointRecord>(value) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "skipping malformed access point entry");
                None
            }
        })
        .filter(|record| !record.is_blank())
        .collect();

    debug!(total, kept = records.len(), "parsed access point snapshot");
    Ok(records)
}

/// Result of parsing a pasted block of access points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkImport {
    pub records: Vec<AccessPointRecord>,
    /// Non-empty lines that did not have three fields.
    pub failed: usize,
}

/// Parse pasted access point lines: `name, mac, location` per line.
///
/// Each line is split on tabs; if that yields fewer than three fields it is
/// split on `;`, then on `,`. Extra fields are ignored. Blank lines are
/// skipped without counting as failures.
pub fn parse_bulk_access_points(text: &str) -> BulkImport {
    let mut import = BulkImport::default();

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match split_bulk_line(line) {
            Some([name, mac, location]) => import
                .records
                .push(AccessPointRecord::new(name, mac, location)),
            None => import.failed += 1,
        }
    }

    import
}

fn split_bulk_line(line: &str) -> Option<[&str; 3]> {
    ['\t', ';', ','].into_iter().find_map(|sep| {
        let mut fields = line.split(sep);
        match (fields.next(), fields.next(), fields.next()) {
            (Some(a), Some(b), Some(c)) => Some([a.trim(), b.trim(), c.trim()]),
            _ => None,
        }
    })
}

/// A physical place from the site spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteRow {
    #[serde(rename = "Oprettet", deserialize_with = "lenient_string")]
    pub oprettet: String,

    /// Free text as entered, e.g. `"4109 Akutmodtagelse"`.
    #[serde(rename = "Sted", deserialize_with = "lenient_string")]
    pub sted: String,

    /// The location code; joins site rows to access points.
    #[serde(rename = "Afsnitsnr", deserialize_with = "lenient_string")]
    pub afsnitsnr: String,

    #[serde(
        rename = "AfsnitsnavnRumnavn",
        alias = "Afsnitsnavn og/eller rumnavn",
        deserialize_with = "lenient_string"
    )]
    pub afsnitsnavn_rumnavn: String,

    #[serde(rename = "Opgang", deserialize_with = "lenient_string")]
    pub opgang: String,

    #[serde(rename = "Etage", deserialize_with = "lenient_string")]
    pub etage: String,

    #[serde(rename = "Afsnit", deserialize_with = "lenient_string")]
    pub afsnit: String,
}

impl SiteRow {
    /// Derive a row from its `Sted` text alone.
    ///
    /// A location code must open the text and be followed by a non-digit or
    /// the end of the text; the rest becomes the section or room name. Without a leading code only `Sted` and `Oprettet` are set.
    pub fn from_sted(sted: &str, oprettet: &str, decoder: &LocationCodeDecoder) -> Self {
        let mut row = SiteRow {
            oprettet: oprettet.to_string(),
            sted: sted.to_string(),
            ..SiteRow::default()
        };

        let trimmed = sted.trim();
        let Some(code) = trimmed.get(..4).and_then(|s| LocationCode::parse(s).ok()) else {
            return row;
        };
        // A fifth digit means the text opens with a longer number, not a code
        if trimmed.as_bytes().get(4).is_some_and(u8::is_ascii_digit) {
            return row;
        }

        let parsed = decoder.decode_code(code);
        row.afsnitsnr = code.to_string();
        row.afsnitsnavn_rumnavn = trimmed[4..].trim().to_string();
        row.opgang = parsed.opgang.clone();
        row.etage = parsed.etage_label();
        row.afsnit = parsed.afsnit;
        row
    }

    /// The join key, if `Afsnitsnr` holds a usable code.
    pub fn code(&self) -> Option<LocationCode> {
        LocationCode::from_key(&self.afsnitsnr)
    }

    /// Title for a detail view: code and name, or `"Detaljer"`.
    pub fn detail_title(&self) -> String {
        let title = format!("{} {}", self.afsnitsnr, self.afsnitsnavn_rumnavn);
        match title.trim() {
            "" => "Detaljer".to_string(),
            t => t.to_string(),
        }
    }

    /// Labelled fields for a detail view, in display order.
    pub fn details(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("Sted", self.sted.as_str()),
            ("Afsnitsnr", self.afsnitsnr.as_str()),
            ("Afsnitsnavn/rumnavn", self.afsnitsnavn_rumnavn.as_str()),
            ("Opgang", self.opgang.as_str()),
            ("Etage", self.etage.as_str()),
            ("Afsnit", self.afsnit.as_str()),
            ("Oprettet", self.oprettet.as_str()),
        ]
    }

    fn has_structure(&self) -> bool {
        [&self.afsnitsnr, &self.opgang, &self.etage, &self.afsnit]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

/// Parse a site row snapshot (a JSON array of spreadsheet rows).
///
/// Rows without `Sted` are dropped. Rows missing any structural field are
/// re-derived from `Sted` with the decoder.
pub fn parse_site_rows(
    json: &str,
    decoder: &LocationCodeDecoder,
) -> Result<Vec<SiteRow>, RecordError> {
    let values: Vec<Value> = serde_json::from_str(json)?;
    let mut derived = 0usize;

    let rows: Vec<SiteRow> = values
        .into_iter()
        .filter_map(|value| serde_json::from_value::<SiteRow>(value).ok())
        .filter(|row| !row.sted.trim().is_empty())
        .map(|row| {
            if row.has_structure() {
                row
            } else {
                derived += 1;
                SiteRow::from_sted(&row.sted, &row.oprettet, decoder)
            }
        })
        .collect();

    debug!(rows = rows.len(), derived, "parsed site row snapshot");
    Ok(rows)
}

/// Deserialize any JSON scalar as text; `null`, arrays and objects become
/// empty strings.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn access_point_from_camel_case() {
        let records = parse_access_points(
            r#"[{"id": "a1", "apName": "AP-01", "macAddress": " AA:BB ", "location": "4109 Akut", "createdAt": "2024-03-15 10:00"}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a1");
        assert_eq!(records[0].ap_name, "AP-01");
        assert_eq!(records[0].mac_address, " AA:BB ");
        assert_eq!(records[0].location, "4109 Akut");
        assert_eq!(records[0].created_at, "2024-03-15 10:00");
    }

    #[test]
    fn access_point_from_sheet_headings() {
        let records = parse_access_points(
            r#"[{"Oprettet": "2024-03-15 10:00", "AP navn": "AP-02", "Mac adresse": "cc:dd", "Lokation": 2014}]"#,
        )
        .unwrap();
        assert_eq!(records[0].ap_name, "AP-02");
        assert_eq!(records[0].mac_address, "cc:dd");
        assert_eq!(records[0].location, "2014");
    }

    #[test]
    fn blank_and_malformed_access_points_dropped() {
        let records = parse_access_points(
            r#"[{"apName": "  ", "macAddress": null}, 42, {"apName": "AP-03"}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ap_name, "AP-03");
        assert_eq!(records[0].mac_address, "");
    }

    #[test]
    fn non_array_snapshot_is_error() {
        assert!(matches!(
            parse_access_points(r#"{"apName": "AP"}"#),
            Err(RecordError::Json(_))
        ));
        assert!(parse_access_points("not json").is_err());
    }

    #[test]
    fn bulk_separators() {
        let import = parse_bulk_access_points(
            "AP-1\taa:01\t4109 Akut\nAP-2;aa:02;2014\nAP-3, aa:03 , 9123 Lab\n\n   \nonly,two\n",
        );
        assert_eq!(import.failed, 1);
        assert_eq!(import.records.len(), 3);
        assert_eq!(import.records[0].location, "4109 Akut");
        assert_eq!(import.records[1].mac_address, "aa:02");
        assert_eq!(import.records[2].mac_address, "aa:03");
        assert_eq!(import.records[2].location, "9123 Lab");
    }

    #[test]
    fn bulk_tab_wins_over_commas() {
        let import = parse_bulk_access_points("AP-1\taa:01\t4109, Akut, 1. sal");
        assert_eq!(import.records[0].location, "4109, Akut, 1. sal");
    }

    #[test]
    fn site_row_numeric_cells_and_name_alias() {
        let decoder = LocationCodeDecoder::default();
        let json = json!([{
            "Oprettet": "15-03-2024 10:00",
            "Sted": "4109 Akutmodtagelse",
            "Afsnitsnr": 4109,
            "Afsnitsnavn og/eller rumnavn": "Akutmodtagelse",
            "Opgang": 41,
            "Etage": "Stue",
            "Afsnit": 9
        }])
        .to_string();

        let rows = parse_site_rows(&json, &decoder).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].afsnitsnr, "4109");
        assert_eq!(rows[0].opgang, "41");
        assert_eq!(rows[0].afsnit, "9");
        assert_eq!(rows[0].afsnitsnavn_rumnavn, "Akutmodtagelse");
    }

    #[test]
    fn site_rows_without_sted_dropped() {
        let decoder = LocationCodeDecoder::default();
        let json = r#"[{"Sted": ""}, {"Afsnitsnr": "4109"}, {"Sted": "2014 Kardiologi"}]"#;
        let rows = parse_site_rows(json, &decoder).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sted, "2014 Kardiologi");
    }

    #[test]
    fn incomplete_site_row_derived_from_sted() {
        let decoder = LocationCodeDecoder::default();
        let json = r#"[{"Oprettet": "x", "Sted": "2014 Kardiologi  Rum 12", "Opgang": "2"}]"#;
        let rows = parse_site_rows(json, &decoder).unwrap();
        assert_eq!(
            rows[0],
            SiteRow {
                oprettet: "x".into(),
                sted: "2014 Kardiologi  Rum 12".into(),
                afsnitsnr: "2014".into(),
                afsnitsnavn_rumnavn: "Kardiologi  Rum 12".into(),
                opgang: "2".into(),
                etage: "1. sal".into(),
                afsnit: "4".into(),
            }
        );
    }

    #[test]
    fn from_sted_requires_leading_code() {
        let decoder = LocationCodeDecoder::default();
        let row = SiteRow::from_sted("Kantine 4109", "", &decoder);
        assert_eq!(row.sted, "Kantine 4109");
        assert_eq!(row.afsnitsnr, "");
        assert_eq!(row.opgang, "");
        assert_eq!(row.afsnitsnavn_rumnavn, "");

        let row = SiteRow::from_sted("æøå", "", &decoder);
        assert_eq!(row.afsnitsnr, "");
    }

    #[test]
    fn from_sted_rejects_longer_number() {
        let decoder = LocationCodeDecoder::default();
        let row = SiteRow::from_sted("41090 X", "", &decoder);
        assert_eq!(row.sted, "41090 X");
        assert_eq!(row.afsnitsnr, "");
        assert_eq!(row.afsnitsnavn_rumnavn, "");

        let row = SiteRow::from_sted("4109-Akut", "", &decoder);
        assert_eq!(row.afsnitsnr, "4109");
        assert_eq!(row.afsnitsnavn_rumnavn, "-Akut");
    }

    #[test]
    fn from_sted_code_only() {
        let row = SiteRow::from_sted(" 9123 ", "", &LocationCodeDecoder::default());
        assert_eq!(row.afsnitsnr, "9123");
        assert_eq!(row.afsnitsnavn_rumnavn, "");
        assert_eq!(row.etage, "1. sal");
    }

    #[test]
    fn row_code_normalizes_key() {
        let row = SiteRow {
            afsnitsnr: " 214".into(),
            ..SiteRow::default()
        };
        assert_eq!(row.code(), LocationCode::parse("0214").ok());
        assert_eq!(SiteRow::default().code(), None);
    }

    #[test]
    fn detail_title() {
        let row = SiteRow {
            afsnitsnr: "4109".into(),
            afsnitsnavn_rumnavn: "Akut".into(),
            ..SiteRow::default()
        };
        assert_eq!(row.detail_title(), "4109 Akut");
        assert_eq!(SiteRow::default().detail_title(), "Detaljer");
        assert_eq!(row.details()[1], ("Afsnitsnr", "4109"));
    }

    #[test]
    fn site_row_serializes_with_headings() {
        let row = SiteRow {
            sted: "4109".into(),
            ..SiteRow::default()
        };
        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["Sted"], "4109");
        assert_eq!(value["AfsnitsnavnRumnavn"], "");
    }
}
