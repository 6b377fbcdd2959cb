pub mod ifc;
pub mod step;
pub mod writer;

pub use crate::error::LoadError;
pub use ifc::{load_ifc_file, load_ifc_str};
pub use step::{StepEntity, StepFile, StepValue};
pub use writer::write_step;
