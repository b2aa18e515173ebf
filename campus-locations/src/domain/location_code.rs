//! Location code ("afsnitsnummer") type.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when parsing an invalid location code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid location code: {reason}")]
pub struct InvalidLocationCode {
    reason: &'static str,
}

/// A validated 4-digit location code.
///
/// Codes are written `ABCD`. Depending on the wing, the leading one or two
/// digits identify the wing, the middle digit(s) the floor, and the last
/// digit the section. This type only guarantees the shape; decoding the
/// structure is [`LocationCodeDecoder`](crate::decode::LocationCodeDecoder)'s job.
///
/// Location codes usually arrive embedded in free text ("4109 Akutmodtagelse"),
/// so [`LocationCode::find_in`] is the common constructor.
///
/// # Examples
///
/// ```
/// use campus_locations::domain::LocationCode;
///
/// let code = LocationCode::find_in("AP-4109 Akut").unwrap();
/// assert_eq!(code.as_str(), "4109");
/// assert_eq!(code.leading_pair(), "41");
///
/// // No four consecutive digits
/// assert!(LocationCode::find_in("opgang 41").is_none());
///
/// // Strict parsing rejects surrounding text
/// assert!(LocationCode::parse("4109 Akut").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationCode([u8; 4]);

impl LocationCode {
    /// Parse a location code that must be exactly 4 ASCII digits.
    pub fn parse(s: &str) -> Result<Self, InvalidLocationCode> {
        let bytes = s.as_bytes();

        if bytes.len() != 4 {
            return Err(InvalidLocationCode {
                reason: "must be exactly 4 characters",
            });
        }

        if !bytes.iter().all(u8::is_ascii_digit) {
            return Err(InvalidLocationCode {
                reason: "must be ASCII digits 0-9",
            });
        }

        Ok(LocationCode([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Find the first four consecutive ASCII digits in free text.
    ///
    /// Longer digit runs yield their first four digits.
    pub fn find_in(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        let mut run = 0;

        for (i, b) in bytes.iter().enumerate() {
            if !b.is_ascii_digit() {
                run = 0;
                continue;
            }
            run += 1;
            if run == 4 {
                let start = i + 1 - 4;
                return Some(LocationCode([
                    bytes[start],
                    bytes[start + 1],
                    bytes[start + 2],
                    bytes[start + 3],
                ]));
            }
        }

        None
    }

    /// Normalize a join key taken from a record field.
    ///
    /// Surrounding whitespace is ignored. Spreadsheets drop leading zeros
    /// from numeric cells, so a key of one to three digits is zero-padded
    /// back to four. Otherwise the key must be exactly a code; longer digit
    /// runs and surrounding text never produce one.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        if key.len() < 4 && key.bytes().all(|b| b.is_ascii_digit()) {
            return Self::parse(&format!("{key:0>4}")).ok();
        }

        Self::parse(key).ok()
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII digits are ever stored
        std::str::from_utf8(&self.0).unwrap_or_default()
    }

    /// Digit `A`.
    pub fn first_digit(&self) -> &str {
        &self.as_str()[0..1]
    }

    /// Digits `AB`, the two-digit wing candidate.
    pub fn leading_pair(&self) -> &str {
        &self.as_str()[0..2]
    }

    /// `AB` as a number (0-99).
    pub fn leading_pair_value(&self) -> u8 {
        (self.0[0] - b'0') * 10 + (self.0[1] - b'0')
    }

    /// Digit `B`.
    pub fn second_digit(&self) -> &str {
        &self.as_str()[1..2]
    }

    /// Digit `C`.
    pub fn third_digit(&self) -> &str {
        &self.as_str()[2..3]
    }

    /// Digits `BC`.
    pub fn middle_pair(&self) -> &str {
        &self.as_str()[1..3]
    }

    /// Digit `D`, the section.
    pub fn last_digit(&self) -> &str {
        &self.as_str()[3..4]
    }
}

impl fmt::Debug for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LocationCode({})", self.as_str())
    }
}

impl fmt::Display for LocationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LocationCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for LocationCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        LocationCode::parse(&s).map_err(serde::de::Error::custom)
    }
}
