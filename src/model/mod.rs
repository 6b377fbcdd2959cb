pub mod color;
pub mod element;
pub mod filter;
pub mod guid;
pub mod project;
pub mod property;

pub use color::{MarkColor, PALETTE};
pub use element::Element;
pub use filter::{Filter, MatchOptions, MmiPredicate, NameMatch};
pub use project::{IfcModel, SchemaVersion};
pub use property::{Property, PropertySet, PropertyValue, PsetIndex, ValueCount, NO_VALUE_LABEL};
