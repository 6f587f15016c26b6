//! Domain model: aide records and the enumerations they are filtered on

mod aide;
mod enums;

pub use aide::Aide;
pub use enums::{AideType, PerimeterType, PublicationStatus, Stage, WireValue, UNIVERSAL_SWEEP};
