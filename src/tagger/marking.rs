use super::select::ElementMatch;
use super::style::{self, StyledItemIndex};
use super::MARKING_PSET_NAME;
use crate::config::MarkingConfig;
use crate::model::guid::new_global_id;
use crate::model::project::{PROPERTY_SET, REL_DEFINES_BY_PROPERTIES};
use crate::model::{Filter, IfcModel, MarkColor};
use crate::parser::StepValue;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Contents of the `NOSKI_Eksisterende` property set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkingRecord {
    pub info: String,
    pub farge: String,
    pub filter: String,
    pub markeringsdato: String,
    pub extra: Vec<(String, String)>,
}

impl MarkingRecord {
    #[must_use]
    pub fn new(
        color: &MarkColor,
        filter: &Filter,
        date: NaiveDate,
        extra: &BTreeMap<String, String>,
    ) -> Self {
        Self {
            info: format!(
                "Farget med \"{}\" basert på {}.",
                color.name,
                filter.summary()
            ),
            farge: color.name.to_string(),
            filter: filter.expression(),
            markeringsdato: date.format("%Y-%m-%d").to_string(),
            extra: extra
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// Property name and typed value, in write order.
    fn fields(&self, has_date_type: bool) -> Vec<(String, StepValue)> {
        let date_type = if has_date_type { "IFCDATE" } else { "IFCLABEL" };
        let mut fields = vec![
            ("Info".to_string(), StepValue::typed_string("IFCTEXT", &self.info)),
            ("Farge".to_string(), StepValue::typed_string("IFCLABEL", &self.farge)),
            ("Filter".to_string(), StepValue::typed_string("IFCTEXT", &self.filter)),
            (
                "MarkeringsDato".to_string(),
                StepValue::typed_string(date_type, &self.markeringsdato),
            ),
        ];
        fields.extend(
            self.extra
                .iter()
                .map(|(k, v)| (k.clone(), StepValue::typed_string("IFCLABEL", v))),
        );
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkedElement {
    pub global_id: String,
    pub entity_type: String,
    pub name: String,
    pub property: String,
    pub colored: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkingReport {
    pub color: String,
    pub filter: String,
    pub total: usize,
    pub colored: usize,
    pub elements: Vec<MarkedElement>,
}

/// Colors every matched element and writes a fresh marking property set on it.
///
/// Previous markings on the same elements are removed first, so running the
/// same filter and color twice leaves the model as a single run would.
pub fn apply_marking(
    model: &mut IfcModel,
    matches: &[ElementMatch],
    color: &MarkColor,
    filter: &Filter,
    date: NaiveDate,
    config: &MarkingConfig,
) -> MarkingReport {
    let handle = style::ensure_surface_style(model, color);
    let mut styled_items = StyledItemIndex::build(model);
    let mut previous = PreviousMarkings::collect(model);
    let record = MarkingRecord::new(color, filter, date, &config.extra_properties);
    let owner_history = model.owner_history();
    let has_date_type = model.schema_version().has_date_type();

    let mut report = MarkingReport {
        color: color.name.to_string(),
        filter: filter.summary(),
        ..MarkingReport::default()
    };
    let mut processed = HashSet::new();

    for matched in matches {
        let element_id = matched.element.id;
        if !processed.insert(element_id) {
            continue;
        }

        let colored = style::apply_style(model, element_id, handle, &mut styled_items);
        previous.detach(model, element_id);
        write_marking(model, element_id, &record, owner_history, has_date_type);

        tracing::debug!(
            element = %matched.element.global_id,
            entity_type = %matched.element.entity_type,
            colored,
            "Marked element"
        );

        if colored {
            report.colored += 1;
        } else {
            tracing::warn!(
                element = %matched.element.global_id,
                "Element has no shape representation, marked without color"
            );
        }
        report.total += 1;
        report.elements.push(MarkedElement {
            global_id: matched.element.global_id.clone(),
            entity_type: matched.element.entity_type.clone(),
            name: matched.element.display_name().to_string(),
            property: matched.property_name.clone(),
            colored,
        });
    }

    tracing::info!(
        color = color.name,
        total = report.total,
        colored = report.colored,
        "Applied marking"
    );
    report
}

fn write_marking(
    model: &mut IfcModel,
    element_id: u64,
    record: &MarkingRecord,
    owner_history: Option<u64>,
    has_date_type: bool,
) {
    let owner = owner_history.map_or(StepValue::Null, StepValue::Reference);

    let properties = record
        .fields(has_date_type)
        .into_iter()
        .map(|(name, value)| {
            StepValue::Reference(model.step.add_entity(
                "IFCPROPERTYSINGLEVALUE",
                vec![StepValue::String(name), StepValue::Null, value, StepValue::Null],
            ))
        })
        .collect();

    let pset = model.step.add_entity(
        PROPERTY_SET,
        vec![
            StepValue::String(new_global_id()),
            owner.clone(),
            StepValue::String(MARKING_PSET_NAME.to_string()),
            StepValue::Null,
            StepValue::List(properties),
        ],
    );

    model.step.add_entity(
        REL_DEFINES_BY_PROPERTIES,
        vec![
            StepValue::String(new_global_id()),
            owner,
            StepValue::Null,
            StepValue::Null,
            StepValue::List(vec![StepValue::Reference(element_id)]),
            StepValue::Reference(pset),
        ],
    );
}

/// Marking relationships already in the model, from an earlier run.
struct PreviousMarkings {
    by_element: HashMap<u64, Vec<u64>>,
    /// Inbound reference counts, computed on first removal.
    references: Option<HashMap<u64, usize>>,
}

impl PreviousMarkings {
    fn collect(model: &IfcModel) -> Self {
        let mut by_element: HashMap<u64, Vec<u64>> = HashMap::new();

        for rel in model.step.get_entities_by_type(REL_DEFINES_BY_PROPERTIES) {
            let is_marking = rel
                .ref_attr(5)
                .and_then(|id| model.step.get_entity(id))
                .is_some_and(|pset| {
                    pset.entity_type == PROPERTY_SET && pset.str_attr(2) == Some(MARKING_PSET_NAME)
                });
            if !is_marking {
                continue;
            }
            for element in rel.ref_list_attr(4) {
                by_element.entry(element).or_default().push(rel.id);
            }
        }

        Self {
            by_element,
            references: None,
        }
    }

    /// Unlinks the element from its old markings. Relationships left without
    /// objects are deleted together with property sets and properties that
    /// nothing else references.
    fn detach(&mut self, model: &mut IfcModel, element_id: u64) {
        let Some(rel_ids) = self.by_element.remove(&element_id) else {
            return;
        };

        for rel_id in rel_ids {
            let Some(rel) = model.step.get_entity(rel_id) else {
                continue;
            };
            let remaining: Vec<StepValue> = rel
                .ref_list_attr(4)
                .into_iter()
                .filter(|id| *id != element_id)
                .map(StepValue::Reference)
                .collect();

            if remaining.is_empty() {
                let pset = rel.ref_attr(5);
                let references = self
                    .references
                    .get_or_insert_with(|| model.step.reference_counts());
                model.step.remove_entity(rel_id);
                if let Some(pset) = pset {
                    release(model, references, pset);
                }
            } else if let Some(rel) = model.step.entity_mut(rel_id) {
                rel.set_attr(4, StepValue::List(remaining));
            }
        }
    }
}

/// Drops one reference to `id`; removes the entity and recurses into what it
/// pointed at once nothing refers to it any more.
fn release(model: &mut IfcModel, references: &mut HashMap<u64, usize>, id: u64) {
    let count = references.entry(id).or_insert(0);
    *count = count.saturating_sub(1);
    if *count > 0 {
        return;
    }

    let Some(entity) = model.step.remove_entity(id) else {
        return;
    };
    let mut targets = Vec::new();
    entity.for_each_reference(&mut |target| targets.push(target));
    for target in targets {
        if is_owned_by_marking(model, target) {
            release(model, references, target);
        }
    }
}

/// Only properties are collected along with a removed property set; shared
/// entities such as the owner history stay.
fn is_owned_by_marking(model: &IfcModel, id: u64) -> bool {
    model
        .step
        .get_entity(id)
        .is_some_and(|e| e.entity_type.starts_with("IFCPROPERTY"))
}
