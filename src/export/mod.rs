//! Writing the marked model and reports about it.

pub mod ifc;
pub mod report;

pub use crate::error::ExportError;
pub use ifc::{export_ifc, output_path_for, OUTPUT_SUFFIX};
pub use report::{export_csv, export_json};
