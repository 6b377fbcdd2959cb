use crate::model::element::is_product_type;
use crate::model::{Element, Filter, IfcModel, MatchOptions, PropertySet, PropertyValue};
use std::collections::HashMap;

/// An element selected by a filter, with the property that matched.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementMatch {
    pub element: Element,
    pub pset_name: String,
    pub property_name: String,
    pub value: PropertyValue,
}

/// Selects the elements matching `filter`, in model order, each at most once.
#[must_use]
pub fn select_elements(model: &IfcModel, filter: &Filter, options: &MatchOptions) -> Vec<ElementMatch> {
    let mut psets: HashMap<u64, Option<PropertySet>> = HashMap::new();
    let mut matches = Vec::new();

    for (element_id, pset_ids) in model.property_sets_by_element() {
        let Some(entity) = model.step.get_entity(element_id) else {
            tracing::warn!(element_id, "Property relationship points at a missing entity");
            continue;
        };
        if !is_product_type(&entity.entity_type) {
            continue;
        }

        let found = pset_ids.iter().find_map(|pset_id| {
            psets
                .entry(*pset_id)
                .or_insert_with(|| model.property_set(*pset_id))
                .as_ref()
                .and_then(|pset| match_in_set(pset, filter, options))
        });

        if let Some((pset_name, property_name, value)) = found {
            matches.push(ElementMatch {
                element: Element::from_entity(entity),
                pset_name,
                property_name,
                value,
            });
        }
    }

    tracing::info!(filter = %filter, matches = matches.len(), "Selected elements");
    matches
}

fn match_in_set(
    pset: &PropertySet,
    filter: &Filter,
    options: &MatchOptions,
) -> Option<(String, String, PropertyValue)> {
    let property = match filter {
        Filter::Property {
            pset: name,
            property,
            value,
        } => {
            if pset.name != *name {
                return None;
            }
            pset.properties
                .iter()
                .find(|p| p.name == *property && p.value.matches(value, options))
        }
        Filter::Mmi(predicate) => pset
            .properties
            .iter()
            .find(|p| predicate.matches_name(&p.name) && p.value.matches(&predicate.value, options)),
    }?;

    Some((pset.name.clone(), property.name.clone(), property.value.clone()))
}
