//! Surface styles and their assignment to representation items.

use super::MARKING_PSET_NAME;
use crate::model::{IfcModel, MarkColor};
use crate::parser::StepValue;
use std::collections::HashMap;

const SURFACE_STYLE: &str = "IFCSURFACESTYLE";
const STYLE_ASSIGNMENT: &str = "IFCPRESENTATIONSTYLEASSIGNMENT";
const STYLED_ITEM: &str = "IFCSTYLEDITEM";

/// Low roughness reads as a shiny, metallic surface.
const SPECULAR_ROUGHNESS: f64 = 0.2;

/// Ids to use when styling with one palette color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleHandle {
    pub surface_style: u64,
    /// What goes into `IfcStyledItem.Styles`: the surface style itself, or
    /// its presentation style assignment on IFC2X3.
    pub assignment: u64,
}

#[must_use]
pub fn style_name(color: &MarkColor) -> String {
    format!("{MARKING_PSET_NAME}_{}", color.name)
}

/// Finds the surface style for `color` or creates a metallic one.
pub fn ensure_surface_style(model: &mut IfcModel, color: &MarkColor) -> StyleHandle {
    let name = style_name(color);

    let existing = model
        .step
        .get_entities_by_type(SURFACE_STYLE)
        .into_iter()
        .find(|s| s.str_attr(0) == Some(name.as_str()))
        .map(|s| s.id);

    let surface_style = match existing {
        Some(id) => id,
        None => create_surface_style(model, &name, color),
    };

    let assignment = if model.schema_version().needs_style_assignment() {
        let existing = model
            .step
            .get_entities_by_type(STYLE_ASSIGNMENT)
            .into_iter()
            .find(|a| a.ref_list_attr(0) == [surface_style])
            .map(|a| a.id);
        existing.unwrap_or_else(|| {
            model.step.add_entity(
                STYLE_ASSIGNMENT,
                vec![StepValue::List(vec![StepValue::Reference(surface_style)])],
            )
        })
    } else {
        surface_style
    };

    StyleHandle {
        surface_style,
        assignment,
    }
}

fn create_surface_style(model: &mut IfcModel, name: &str, color: &MarkColor) -> u64 {
    let (r, g, b) = color.rgb;
    let step = &mut model.step;

    let colour = step.add_entity(
        "IFCCOLOURRGB",
        vec![
            StepValue::Null,
            StepValue::Real(r),
            StepValue::Real(g),
            StepValue::Real(b),
        ],
    );
    let specular = step.add_entity(
        "IFCCOLOURRGB",
        vec![
            StepValue::Null,
            StepValue::Real(1.0),
            StepValue::Real(1.0),
            StepValue::Real(1.0),
        ],
    );

    // SurfaceColour, Transparency, DiffuseColour, TransmissionColour,
    // DiffuseTransmissionColour, ReflectionColour, SpecularColour,
    // SpecularHighlight, ReflectanceMethod
    let rendering = step.add_entity(
        "IFCSURFACESTYLERENDERING",
        vec![
            StepValue::Reference(colour),
            StepValue::Real(0.0),
            StepValue::Reference(colour),
            StepValue::Null,
            StepValue::Null,
            StepValue::Null,
            StepValue::Reference(specular),
            StepValue::Typed(
                "IFCSPECULARROUGHNESS".to_string(),
                Box::new(StepValue::Real(SPECULAR_ROUGHNESS)),
            ),
            StepValue::Enum("METAL".to_string()),
        ],
    );

    let id = step.add_entity(
        SURFACE_STYLE,
        vec![
            StepValue::String(name.to_string()),
            StepValue::Enum("BOTH".to_string()),
            StepValue::List(vec![StepValue::Reference(rendering)]),
        ],
    );

    tracing::debug!(style = name, id, "Created surface style");
    id
}

/// Representation item id → styled items pointing at it.
#[derive(Debug, Default)]
pub struct StyledItemIndex {
    items: HashMap<u64, Vec<u64>>,
}

impl StyledItemIndex {
    #[must_use]
    pub fn build(model: &IfcModel) -> Self {
        let mut items: HashMap<u64, Vec<u64>> = HashMap::new();
        for styled in model.step.get_entities_by_type(STYLED_ITEM) {
            if let Some(item) = styled.ref_attr(0) {
                items.entry(item).or_default().push(styled.id);
            }
        }
        Self { items }
    }

    #[must_use]
    pub fn styled_items(&self, item: u64) -> &[u64] {
        self.items.get(&item).map_or(&[], Vec::as_slice)
    }
}

/// Items of the element's shape representations.
#[must_use]
pub fn representation_items(model: &IfcModel, element_id: u64) -> Vec<u64> {
    let Some(shape) = model
        .step
        .get_entity(element_id)
        // Index 6 = Representation on every IfcProduct
        .and_then(|e| e.ref_attr(6))
        .and_then(|id| model.step.get_entity(id))
    else {
        return Vec::new();
    };

    shape
        .ref_list_attr(2)
        .into_iter()
        .filter_map(|id| model.step.get_entity(id))
        .filter(|rep| rep.entity_type == "IFCSHAPEREPRESENTATION")
        .flat_map(|rep| rep.ref_list_attr(3))
        .collect()
}

/// Points every representation item of the element at `handle`, replacing
/// whatever style the item had. Returns false when the element has no shape
/// representation to color.
pub fn apply_style(
    model: &mut IfcModel,
    element_id: u64,
    handle: StyleHandle,
    index: &mut StyledItemIndex,
) -> bool {
    let items = representation_items(model, element_id);
    if items.is_empty() {
        return false;
    }

    let styles = StepValue::List(vec![StepValue::Reference(handle.assignment)]);

    for item in items {
        let existing = index.styled_items(item).to_vec();
        let Some((&first, duplicates)) = existing.split_first() else {
            let styled = model.step.add_entity(
                STYLED_ITEM,
                vec![StepValue::Reference(item), styles.clone(), StepValue::Null],
            );
            index.items.insert(item, vec![styled]);
            continue;
        };

        if let Some(styled) = model.step.entity_mut(first) {
            styled.set_attr(1, styles.clone());
        }
        for &duplicate in duplicates {
            if !model.step.is_referenced(duplicate) {
                model.step.remove_entity(duplicate);
            }
        }
        index.items.insert(item, vec![first]);
    }

    true
}

/// Surface styles reached from a styled item, looking through presentation
/// style assignments.
#[must_use]
pub fn surface_styles_of(model: &IfcModel, styled_item: u64) -> Vec<u64> {
    let Some(styled) = model.step.get_entity(styled_item) else {
        return Vec::new();
    };

    styled
        .ref_list_attr(1)
        .into_iter()
        .filter_map(|id| model.step.get_entity(id))
        .flat_map(|style| {
            if style.entity_type == STYLE_ASSIGNMENT {
                style.ref_list_attr(0)
            } else {
                vec![style.id]
            }
        })
        .filter(|id| {
            model
                .step
                .get_entity(*id)
                .is_some_and(|e| e.entity_type == SURFACE_STYLE)
        })
        .collect()
}

/// Surface colour of a style's rendering or shading.
#[must_use]
pub fn surface_colour(model: &IfcModel, surface_style: u64) -> Option<(f64, f64, f64)> {
    let style = model.step.get_entity(surface_style)?;
    style
        .ref_list_attr(2)
        .into_iter()
        .filter_map(|id| model.step.get_entity(id))
        .find_map(|shading| {
            let colour = model.step.get_entity(shading.ref_attr(0)?)?;
            match (colour.attr(1)?, colour.attr(2)?, colour.attr(3)?) {
                (StepValue::Real(r), StepValue::Real(g), StepValue::Real(b)) => Some((*r, *g, *b)),
                _ => None,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::load_ifc_str;
    use std::path::Path;

    fn model(schema: &str) -> IfcModel {
        let content = format!(
            "ISO-10303-21;HEADER;FILE_SCHEMA(('{schema}'));ENDSEC;DATA;
#10=IFCCARTESIANPOINT((0.,0.,0.));
#11=IFCAXIS2PLACEMENT3D(#10,$,$);
#13=IFCGEOMETRICREPRESENTATIONCONTEXT($,'Model',3,1.E-05,#11,$);
#20=IFCBLOCK(#11,1.,1.,1.);
#21=IFCBLOCK(#11,2.,1.,1.);
#22=IFCSHAPEREPRESENTATION(#13,'Body','CSG',(#20,#21));
#23=IFCPRODUCTDEFINITIONSHAPE($,$,(#22));
#30=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,'Wall',$,$,$,#23,$,$);
#31=IFCSLAB('3cUkl32yn9qRSPvBJVyWYp',$,'Slab',$,$,$,$,$,$);
#40=IFCSTYLEDITEM(#21,(#41),$);
#41=IFCSURFACESTYLE('Old',.BOTH.,());
#42=IFCSTYLEDITEM(#21,(#41),$);
ENDSEC;"
        );
        load_ifc_str(&content, Path::new("style.ifc")).unwrap()
    }

    #[test]
    fn creates_metallic_style_once() {
        let mut model = model("IFC4");
        let rosa = MarkColor::find("Rosa").unwrap();
        let first = ensure_surface_style(&mut model, rosa);
        let second = ensure_surface_style(&mut model, rosa);
        assert_eq!(first, second);
        assert_eq!(first.surface_style, first.assignment);
        assert_eq!(surface_colour(&model, first.surface_style), Some(rosa.rgb));

        let rendering = model
            .step
            .get_entities_by_type("IFCSURFACESTYLERENDERING")
            .into_iter()
            .next()
            .unwrap();
        assert_eq!(rendering.values[8], StepValue::Enum("METAL".to_string()));
    }

    #[test]
    fn ifc2x3_styles_go_through_an_assignment() {
        let mut model = model("IFC2X3");
        let handle = ensure_surface_style(&mut model, MarkColor::find("Gul").unwrap());
        assert_ne!(handle.surface_style, handle.assignment);
        let assignment = model.step.get_entity(handle.assignment).unwrap();
        assert_eq!(assignment.entity_type, STYLE_ASSIGNMENT);
        assert_eq!(assignment.ref_list_attr(0), vec![handle.surface_style]);
    }

    #[test]
    fn replaces_existing_styles_and_drops_duplicates() {
        let mut model = model("IFC4");
        let handle = ensure_surface_style(&mut model, MarkColor::find("Lilla").unwrap());
        let mut index = StyledItemIndex::build(&model);

        assert!(apply_style(&mut model, 30, handle, &mut index));
        assert!(model.step.get_entity(42).is_none());
        assert_eq!(index.styled_items(21), &[40]);
        assert_eq!(surface_styles_of(&model, 40), vec![handle.surface_style]);

        let new_item = index.styled_items(20)[0];
        assert_eq!(surface_styles_of(&model, new_item), vec![handle.surface_style]);
        assert_eq!(model.step.get_entities_by_type(STYLED_ITEM).len(), 2);
    }

    #[test]
    fn elements_without_geometry_are_not_colored() {
        let mut model = model("IFC4");
        let handle = ensure_surface_style(&mut model, MarkColor::find("Rød").unwrap());
        let mut index = StyledItemIndex::build(&model);
        assert!(!apply_style(&mut model, 31, handle, &mut index));
    }
}
