//! The filter-and-mark workflow: enumerate options, select elements, color
//! them and attach the `NOSKI_Eksisterende` property set.

pub mod index;
pub mod marking;
pub mod select;
pub mod style;

use crate::config::Config;
use crate::error::TagError;
use crate::model::{Filter, IfcModel, MarkColor};
use chrono::NaiveDate;

pub use index::build_pset_index;
pub use marking::{apply_marking, MarkedElement, MarkingRecord, MarkingReport};
pub use select::{select_elements, ElementMatch};

/// Name of the property set written on every marked element.
pub const MARKING_PSET_NAME: &str = "NOSKI_Eksisterende";

/// Selects with `filter` and marks the result in place.
///
/// Fails with [`TagError::EmptySelection`] before touching the model when
/// nothing matches.
pub fn tag_model(
    model: &mut IfcModel,
    filter: &Filter,
    color: &MarkColor,
    date: NaiveDate,
    config: &Config,
) -> Result<MarkingReport, TagError> {
    let matches = select_elements(model, filter, &config.matching);
    if matches.is_empty() {
        return Err(TagError::EmptySelection {
            filter: filter.summary(),
        });
    }

    Ok(apply_marking(
        model,
        &matches,
        color,
        filter,
        date,
        &config.marking,
    ))
}
