//! Domain types for campus locations.
//!
//! Value objects here enforce their invariants at construction time, so code
//! that receives them can trust their shape.

mod floor;
mod location_code;
mod mac;
mod wing;

pub use floor::Floor;
pub(crate) use floor::parse_sal;
pub use location_code::{InvalidLocationCode, LocationCode};
pub use mac::MacKey;
pub use wing::{InvalidWingId, WingMembership};
