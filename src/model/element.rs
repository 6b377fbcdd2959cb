use crate::parser::step::COMPLEX_ENTITY;
use crate::parser::StepEntity;

/// Object definitions that can carry property sets but are not products:
/// contexts, groups, controls, processes, resources and actors of IFC2X3,
/// IFC4 and IFC4X3.
const NON_PRODUCT_ENTITIES: &[&str] = &[
    // Contexts
    "IFCCONTEXT",
    "IFCPROJECT",
    "IFCPROJECTLIBRARY",
    // Groups
    "IFCGROUP",
    "IFCASSET",
    "IFCCONDITION",
    "IFCELECTRICALCIRCUIT",
    "IFCINVENTORY",
    "IFCSTRUCTURALANALYSISMODEL",
    "IFCSTRUCTURALLOADGROUP",
    "IFCSTRUCTURALLOADCASE",
    "IFCSTRUCTURALRESULTGROUP",
    "IFCSYSTEM",
    "IFCBUILDINGSYSTEM",
    "IFCBUILTSYSTEM",
    "IFCDISTRIBUTIONSYSTEM",
    "IFCDISTRIBUTIONCIRCUIT",
    "IFCZONE",
    // Controls
    "IFCCONTROL",
    "IFCACTIONREQUEST",
    "IFCCONDITIONCRITERION",
    "IFCCOSTITEM",
    "IFCCOSTSCHEDULE",
    "IFCEQUIPMENTSTANDARD",
    "IFCFURNITURESTANDARD",
    "IFCPERFORMANCEHISTORY",
    "IFCPERMIT",
    "IFCPROJECTORDER",
    "IFCPROJECTORDERRECORD",
    "IFCSCHEDULETIMECONTROL",
    "IFCSERVICELIFE",
    "IFCSPACEPROGRAM",
    "IFCTIMESERIESSCHEDULE",
    "IFCWORKCALENDAR",
    "IFCWORKCONTROL",
    "IFCWORKPLAN",
    "IFCWORKSCHEDULE",
    // Processes
    "IFCPROCESS",
    "IFCEVENT",
    "IFCMOVE",
    "IFCORDERACTION",
    "IFCPROCEDURE",
    "IFCTASK",
    // Resources
    "IFCRESOURCE",
    "IFCCONSTRUCTIONRESOURCE",
    "IFCCONSTRUCTIONEQUIPMENTRESOURCE",
    "IFCCONSTRUCTIONMATERIALRESOURCE",
    "IFCCONSTRUCTIONPRODUCTRESOURCE",
    "IFCCREWRESOURCE",
    "IFCLABORRESOURCE",
    "IFCSUBCONTRACTRESOURCE",
    // Actors
    "IFCACTOR",
    "IFCOCCUPANT",
];

/// Whether an entity type is an `IfcProduct` subtype.
///
/// Type objects (`IFCWALLTYPE`, `IFCDOORSTYLE`, `IFCTYPEPRODUCT`), complex
/// instances and the non-product object definitions above are excluded;
/// everything else that is related through `IfcRelDefinesByProperties` is
/// treated as an element.
#[must_use]
pub fn is_product_type(entity_type: &str) -> bool {
    if entity_type == COMPLEX_ENTITY {
        return false;
    }
    if entity_type.ends_with("TYPE") || entity_type.ends_with("STYLE") {
        return false;
    }
    if entity_type.starts_with("IFCTYPE")
        || entity_type.starts_with("IFCREL")
        || entity_type.starts_with("IFCPROPERTY")
    {
        return false;
    }
    !NON_PRODUCT_ENTITIES.contains(&entity_type)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub id: u64,
    pub global_id: String,
    pub entity_type: String,
    pub name: Option<String>,
}

impl Element {
    #[must_use]
    pub fn from_entity(entity: &StepEntity) -> Self {
        Self {
            id: entity.id,
            // GlobalId is always the first attribute (index 0) in rooted entities
            global_id: entity.str_attr(0).unwrap_or_default().to_string(),
            entity_type: entity.entity_type.clone(),
            name: entity
                .str_attr(2)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("-")
    }
}
