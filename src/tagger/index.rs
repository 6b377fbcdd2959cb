use crate::model::project::REL_DEFINES_BY_PROPERTIES;
use crate::model::{IfcModel, PsetIndex};

/// Builds the filter options in a single scan of the property relationships.
///
/// Relationships that relate no product (type objects, the project, groups)
/// are skipped, so only property sets seen on elements are offered. Each
/// value is counted once per related element.
#[must_use]
pub fn build_pset_index(model: &IfcModel) -> PsetIndex {
    let mut index = PsetIndex::default();

    for rel in model.step.get_entities_by_type(REL_DEFINES_BY_PROPERTIES) {
        let products = rel
            .ref_list_attr(4)
            .into_iter()
            .filter(|id| model.is_product(*id))
            .count();
        if products == 0 {
            continue;
        }

        let Some(pset) = rel.ref_attr(5).and_then(|id| model.property_set(id)) else {
            continue;
        };
        if pset.name.is_empty() {
            continue;
        }

        index.add_property_set(&pset.name);
        for property in &pset.properties {
            index.insert(&pset.name, &property.name, property.value.label(), products);
        }
    }

    tracing::debug!(psets = index.pset_names().len(), "Indexed property sets");
    index
}
