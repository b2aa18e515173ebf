//! Numeric floor codes used when creating sections.
//!
//! This is a separate vocabulary from the decoder's floor labels: codes count
//! upwards from the basement, with `1` for Kælder and `2` for Stue. There is
//! no code for Underkælder; it maps onto Kælder.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::parse_sal;

/// A numeric floor code as stored on a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FloorCode(u32);

impl FloorCode {
    pub const KAELDER: FloorCode = FloorCode(1);
    pub const STUE: FloorCode = FloorCode(2);

    pub const fn new(code: u32) -> Self {
        FloorCode(code)
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl Default for FloorCode {
    fn default() -> Self {
        FloorCode::STUE
    }
}

impl fmt::Display for FloorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map a floor label to its code.
///
/// `Kælder` and `Underkælder` map to 1, `Stue` to 2 and `"<n>. sal"` to
/// `2 + n`. Matching ignores case and surrounding whitespace. Anything else,
/// including an empty label, falls back to Stue.
pub fn label_to_code(label: &str) -> FloorCode {
    let label = label.trim().to_lowercase();
    match label.as_str() {
        "kælder" | "underkælder" => FloorCode::KAELDER,
        "stue" => FloorCode::STUE,
        other => parse_sal(other)
            .and_then(|n| n.checked_add(2))
            .map(FloorCode)
            .unwrap_or_default(),
    }
}

/// Map a floor code back to its label.
///
/// 1 is `Kælder`, 2 is `Stue`, and `n >= 3` is `"<n-2>. sal"`. 0 and any
/// other value display as `Stue`.
pub fn code_to_label(code: FloorCode) -> String {
    match code.0 {
        1 => "Kælder".to_string(),
        n if n >= 3 => format!("{}. sal", n - 2),
        _ => "Stue".to_string(),
    }
}

/// A floor offered when creating a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FloorChoice {
    pub code: FloorCode,
    pub label: String,
}

/// The floors offered when creating a section, lowest first.
pub fn choices() -> Vec<FloorChoice> {
    (1..=5)
        .map(FloorCode)
        .map(|code| FloorChoice {
            code,
            label: code_to_label(code),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_labels() {
        assert_eq!(label_to_code("Kælder"), FloorCode(1));
        assert_eq!(label_to_code("Stue"), FloorCode(2));
        assert_eq!(label_to_code("1. sal"), FloorCode(3));
        assert_eq!(label_to_code("3. sal"), FloorCode(5));
        assert_eq!(label_to_code("12. sal"), FloorCode(14));
    }

    #[test]
    fn underkaelder_shares_basement_code() {
        assert_eq!(label_to_code("Underkælder"), FloorCode::KAELDER);
    }

    #[test]
    fn labels_are_trimmed_and_case_insensitive() {
        assert_eq!(label_to_code("  stue "), FloorCode::STUE);
        assert_eq!(label_to_code("KÆLDER"), FloorCode::KAELDER);
        assert_eq!(label_to_code("2. SAL"), FloorCode(4));
    }

    #[test]
    fn unknown_labels_fall_back_to_stue() {
        assert_eq!(label_to_code(""), FloorCode::STUE);
        assert_eq!(label_to_code("Tagetage"), FloorCode::STUE);
        assert_eq!(label_to_code("sal"), FloorCode::STUE);
    }

    #[test]
    fn codes_to_labels() {
        assert_eq!(code_to_label(FloorCode(1)), "Kælder");
        assert_eq!(code_to_label(FloorCode(2)), "Stue");
        assert_eq!(code_to_label(FloorCode(3)), "1. sal");
        assert_eq!(code_to_label(FloorCode(7)), "5. sal");
        assert_eq!(code_to_label(FloorCode(0)), "Stue");
    }

    #[test]
    fn creation_choices() {
        let labels: Vec<_> = choices().into_iter().map(|c| c.label).collect();
        assert_eq!(labels, ["Kælder", "Stue", "1. sal", "2. sal", "3. sal"]);
        assert_eq!(choices()[0].code, FloorCode::KAELDER);
        assert_eq!(choices()[4].code.value(), 5);
    }

    #[test]
    fn serializes_as_number() {
        assert_eq!(serde_json::to_string(&FloorCode(4)).unwrap(), "4");
        assert_eq!(FloorCode::default(), FloorCode::STUE);
    }
}
