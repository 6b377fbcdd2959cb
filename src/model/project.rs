use super::element::{is_product_type, Element};
use super::property::{Property, PropertySet, PropertyValue};
use crate::parser::{StepEntity, StepFile};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const REL_DEFINES_BY_PROPERTIES: &str = "IFCRELDEFINESBYPROPERTIES";
pub const PROPERTY_SET: &str = "IFCPROPERTYSET";
pub const PROPERTY_SINGLE_VALUE: &str = "IFCPROPERTYSINGLEVALUE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVersion {
    Ifc2x3,
    Ifc4,
    Ifc4x3,
}

impl SchemaVersion {
    #[must_use]
    pub fn from_schema(schema: &str) -> Self {
        let schema = schema.to_ascii_uppercase();
        if schema.starts_with("IFC2X") {
            Self::Ifc2x3
        } else if schema.starts_with("IFC4X3") {
            Self::Ifc4x3
        } else {
            Self::Ifc4
        }
    }

    /// IFC2X3 styled items must point at an `IfcPresentationStyleAssignment`.
    #[must_use]
    pub fn needs_style_assignment(self) -> bool {
        self == Self::Ifc2x3
    }

    /// `IfcDate` only exists from IFC4 on.
    #[must_use]
    pub fn has_date_type(self) -> bool {
        self != Self::Ifc2x3
    }
}

/// A loaded IFC file. The entity graph is edited in place by the tagger.
#[derive(Debug, Clone)]
pub struct IfcModel {
    pub name: String,
    pub schema: String,
    pub file_path: PathBuf,
    pub step: StepFile,
}

impl IfcModel {
    #[must_use]
    pub fn new(name: String, schema: String, file_path: PathBuf, step: StepFile) -> Self {
        Self {
            name,
            schema,
            file_path,
            step,
        }
    }

    #[must_use]
    pub fn schema_version(&self) -> SchemaVersion {
        SchemaVersion::from_schema(&self.schema)
    }

    pub fn products(&self) -> impl Iterator<Item = &StepEntity> {
        self.step
            .entities()
            .filter(|e| is_product_type(&e.entity_type) && e.str_attr(0).is_some())
    }

    #[must_use]
    pub fn total_products(&self) -> usize {
        self.products().count()
    }

    #[must_use]
    pub fn is_product(&self, id: u64) -> bool {
        self.step
            .get_entity(id)
            .is_some_and(|e| is_product_type(&e.entity_type))
    }

    #[must_use]
    pub fn element(&self, id: u64) -> Option<Element> {
        self.step.get_entity(id).map(Element::from_entity)
    }

    /// Object id → ids of the property definitions attached to it, in
    /// relationship order.
    #[must_use]
    pub fn property_sets_by_element(&self) -> BTreeMap<u64, Vec<u64>> {
        let mut links: BTreeMap<u64, Vec<u64>> = BTreeMap::new();

        for rel in self.step.get_entities_by_type(REL_DEFINES_BY_PROPERTIES) {
            // Index 4 = RelatedObjects, index 5 = RelatingPropertyDefinition
            let Some(pset_id) = rel.ref_attr(5) else {
                continue;
            };
            for object in rel.ref_list_attr(4) {
                links.entry(object).or_default().push(pset_id);
            }
        }

        links
    }

    /// Reads an `IfcPropertySet` with its single-value properties.
    #[must_use]
    pub fn property_set(&self, id: u64) -> Option<PropertySet> {
        let pset = self
            .step
            .get_entity(id)
            .filter(|e| e.entity_type == PROPERTY_SET)?;

        let properties = pset
            .ref_list_attr(4)
            .into_iter()
            .filter_map(|prop_id| self.step.get_entity(prop_id))
            .filter(|prop| prop.entity_type == PROPERTY_SINGLE_VALUE)
            .filter_map(|prop| {
                let name = prop.str_attr(0).filter(|n| !n.is_empty())?;
                let value = prop
                    .attr(2)
                    .map_or(PropertyValue::Null, PropertyValue::from_step);
                Some(Property {
                    name: name.to_string(),
                    value,
                })
            })
            .collect();

        Some(PropertySet {
            id,
            name: pset.str_attr(2).unwrap_or_default().to_string(),
            properties,
        })
    }

    #[must_use]
    pub fn property_sets_of(&self, element_id: u64) -> Vec<PropertySet> {
        self.property_sets_by_element()
            .remove(&element_id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.property_set(id))
            .collect()
    }

    /// The first `IfcOwnerHistory`, reused for new rooted entities.
    #[must_use]
    pub fn owner_history(&self) -> Option<u64> {
        self.step
            .get_entities_by_type("IFCOWNERHISTORY")
            .first()
            .map(|e| e.id)
    }
}
