//! Location code decoding.
//!
//! Campus location codes `ABCD` come in two digit groupings. Most wings are
//! identified by the single leading digit `A`, but a fixed set of wings
//! (see [`WingMembership`]) reserve the leading pair `AB` for the wing id.
//! Membership of `AB` alone decides which grouping applies; a code is never
//! evaluated under both.
//!
//! | grouping                   | wing | floor digits        | section |
//! |----------------------------|------|---------------------|---------|
//! | `AB` is a member           | `AB` | `C` (single-digit)  | `D`     |
//! | `A` is `2` or `3`          | `A`  | `BC` (two-digit)    | `D`     |
//! | any other `A`              | `A`  | `B` (single-digit)  | `D`     |
//!
//! An unknown floor digit leaves the floor blank but still decodes the wing
//! and section.

use serde::{Serialize, Serializer};

use crate::domain::{Floor, LocationCode, WingMembership};

/// The structure decoded from a location code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedLocation {
    /// The 4-digit code itself.
    pub afsnitsnr: LocationCode,
    /// Wing id, one or two digits as written in the code.
    pub opgang: String,
    /// Floor, or `None` when the floor digit(s) are not in the table.
    #[serde(serialize_with = "serialize_floor_label")]
    pub etage: Option<Floor>,
    /// Section id, the trailing digit.
    pub afsnit: String,
}

impl ParsedLocation {
    /// The floor label, empty when the floor is unknown.
    pub fn etage_label(&self) -> String {
        self.etage.map(|f| f.label()).unwrap_or_default()
    }
}

fn serialize_floor_label<S: Serializer>(
    floor: &Option<Floor>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match floor {
        Some(floor) => serializer.collect_str(floor),
        None => serializer.serialize_str(""),
    }
}

/// Decodes location codes using a wing membership set.
#[derive(Debug, Clone, Default)]
pub struct LocationCodeDecoder {
    wings: WingMembership,
}

impl LocationCodeDecoder {
    /// Create a decoder for the given two-digit wings.
    pub fn new(wings: WingMembership) -> Self {
        Self { wings }
    }

    /// The wing membership set in use.
    pub fn wings(&self) -> &WingMembership {
        &self.wings
    }

    /// Decode the first location code found in free text.
    ///
    /// Returns `None` when the text is absent or contains no four
    /// consecutive digits.
    ///
    /// # Examples
    ///
    /// ```
    /// use campus_locations::decode::LocationCodeDecoder;
    ///
    /// let decoder = LocationCodeDecoder::default();
    /// let parsed = decoder.decode(Some("4109 Akutmodtagelse")).unwrap();
    /// assert_eq!(parsed.opgang, "41");
    /// assert_eq!(parsed.etage_label(), "Stue");
    /// assert_eq!(parsed.afsnit, "9");
    ///
    /// assert!(decoder.decode(Some("no code here")).is_none());
    /// assert!(decoder.decode(None).is_none());
    /// ```
    pub fn decode(&self, text: Option<&str>) -> Option<ParsedLocation> {
        let code = LocationCode::find_in(text?)?;
        Some(self.decode_code(code))
    }

    /// Decode an already extracted code.
    pub fn decode_code(&self, code: LocationCode) -> ParsedLocation {
        let (opgang, etage) = if self.wings.contains(code.leading_pair_value()) {
            (
                code.leading_pair().to_string(),
                floor_from_single_digit(code.third_digit()),
            )
        } else {
            let wing = code.first_digit();
            let etage = match wing {
                "2" | "3" => floor_from_two_digits(code.middle_pair()),
                _ => floor_from_single_digit(code.second_digit()),
            };
            (wing.to_string(), etage)
        };

        ParsedLocation {
            afsnitsnr: code,
            opgang,
            etage,
            afsnit: code.last_digit().to_string(),
        }
    }
}

/// Single-digit floor table: `0` Stue, `1`-`7` storeys, `8` Underkælder,
/// `9` Kælder.
pub fn floor_from_single_digit(digit: &str) -> Option<Floor> {
    match digit.as_bytes() {
        [b'0'] => Some(Floor::Stue),
        [d @ b'1'..=b'7'] => Some(Floor::Sal(u32::from(d - b'0'))),
        [b'8'] => Some(Floor::Underkaelder),
        [b'9'] => Some(Floor::Kaelder),
        _ => None,
    }
}

/// Two-digit floor table: `00` Stue, `01`-`16` storeys, `18` Underkælder,
/// `19` Kælder. `17` and `20` upwards are unknown.
pub fn floor_from_two_digits(pair: &str) -> Option<Floor> {
    let [tens @ b'0'..=b'9', ones @ b'0'..=b'9'] = pair.as_bytes() else {
        return None;
    };
    match u32::from(tens - b'0') * 10 + u32::from(ones - b'0') {
        0 => Some(Floor::Stue),
        n @ 1..=16 => Some(Floor::Sal(n)),
        18 => Some(Floor::Underkaelder),
        19 => Some(Floor::Kaelder),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(text: &str) -> Option<ParsedLocation> {
        LocationCodeDecoder::default().decode(Some(text))
    }

    fn fields(p: &ParsedLocation) -> (&str, &str, String, &str) {
        (p.afsnitsnr.as_str(), p.opgang.as_str(), p.etage_label(), p.afsnit.as_str())
    }

    #[test]
    fn no_code_is_none() {
        assert!(decode("no code here").is_none());
        assert!(decode("").is_none());
        assert!(decode("41 09").is_none());
        assert!(LocationCodeDecoder::default().decode(None).is_none());
    }

    #[test]
    fn two_digit_wing() {
        let p = decode("4109").unwrap();
        assert_eq!(fields(&p), ("4109", "41", "Stue".to_string(), "9"));
    }

    #[test]
    fn wing_two_uses_two_digit_floor_table() {
        let p = decode("2014").unwrap();
        assert_eq!(fields(&p), ("2014", "2", "1. sal".to_string(), "4"));
    }

    #[test]
    fn other_single_digit_wing() {
        let p = decode("9123").unwrap();
        assert_eq!(fields(&p), ("9123", "9", "1. sal".to_string(), "3"));
    }

    #[test]
    fn embedded_in_text() {
        let p = decode("AP 3121 - Hjertemedicinsk").unwrap();
        assert_eq!(fields(&p), ("3121", "3", "12. sal".to_string(), "1"));
    }

    #[test]
    fn member_with_leading_zero_keeps_pair() {
        let p = decode("0532").unwrap();
        assert_eq!(fields(&p), ("0532", "05", "3. sal".to_string(), "2"));
    }

    #[test]
    fn non_member_zero_wing() {
        // 01 is not a member: wing 0, floor from B
        let p = decode("0154").unwrap();
        assert_eq!(fields(&p), ("0154", "0", "1. sal".to_string(), "4"));
    }

    #[test]
    fn basements() {
        assert_eq!(decode("4181").unwrap().etage, Some(Floor::Underkaelder));
        assert_eq!(decode("4191").unwrap().etage, Some(Floor::Kaelder));
        assert_eq!(decode("1811").unwrap().etage, Some(Floor::Underkaelder));
        assert_eq!(decode("2181").unwrap().etage, Some(Floor::Underkaelder));
        assert_eq!(decode("2191").unwrap().etage, Some(Floor::Kaelder));
    }

    #[test]
    fn unknown_two_digit_floor_is_blank_not_failure() {
        let p = decode("2171").unwrap();
        assert_eq!(fields(&p), ("2171", "2", String::new(), "1"));
        assert_eq!(p.etage, None);

        let p = decode("3201").unwrap();
        assert_eq!(p.opgang, "3");
        assert_eq!(p.etage_label(), "");
    }

    #[test]
    fn single_digit_scheme_never_uses_pair() {
        // 12 is not a member and A=1: floor comes from B only
        let p = decode("1234").unwrap();
        assert_eq!(fields(&p), ("1234", "1", "2. sal".to_string(), "4"));
    }

    #[test]
    fn custom_membership_changes_scheme() {
        let wings = WingMembership::new([20]).unwrap();
        let decoder = LocationCodeDecoder::new(wings);
        let p = decoder.decode(Some("2014")).unwrap();
        assert_eq!(fields(&p), ("2014", "20", "1. sal".to_string(), "4"));

        let p = LocationCodeDecoder::new(WingMembership::empty())
            .decode(Some("4109"))
            .unwrap();
        assert_eq!(fields(&p), ("4109", "4", "1. sal".to_string(), "9"));
    }

    #[test]
    fn floor_tables() {
        assert_eq!(floor_from_single_digit("0"), Some(Floor::Stue));
        assert_eq!(floor_from_single_digit("7"), Some(Floor::Sal(7)));
        assert_eq!(floor_from_single_digit("x"), None);
        assert_eq!(floor_from_single_digit("10"), None);
        assert_eq!(floor_from_two_digits("00"), Some(Floor::Stue));
        assert_eq!(floor_from_two_digits("09"), Some(Floor::Sal(9)));
        assert_eq!(floor_from_two_digits("16"), Some(Floor::Sal(16)));
        assert_eq!(floor_from_two_digits("17"), None);
        assert_eq!(floor_from_two_digits("18"), Some(Floor::Underkaelder));
        assert_eq!(floor_from_two_digits("19"), Some(Floor::Kaelder));
        assert_eq!(floor_from_two_digits("20"), None);
        assert_eq!(floor_from_two_digits("1"), None);
    }

    #[test]
    fn serializes_with_labels() {
        let json = serde_json::to_value(decode("2014").unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "afsnitsnr": "2014",
                "opgang": "2",
                "etage": "1. sal",
                "afsnit": "4",
            })
        );

        let json = serde_json::to_value(decode("2171").unwrap()).unwrap();
        assert_eq!(json["etage"], "");
    }
}
