//! Campus location lookup.
//!
//! Decodes hospital location codes into wing, floor and section, resolves
//! Wi-Fi access point addresses to the location they are installed in, and
//! joins site rows against access points for wing-by-wing inspection.

pub mod buildings;
pub mod cache;
pub mod config;
pub mod decode;
pub mod domain;
pub mod floor_code;
pub mod inspect;
pub mod records;
pub mod sections;
pub mod tracker;
