use chrono::NaiveDate;
use ifc_fargelegger::config::Config;
use ifc_fargelegger::error::TagError;
use ifc_fargelegger::export::{export_csv, export_ifc, export_json, output_path_for};
use ifc_fargelegger::model::{
    Filter, IfcModel, MarkColor, MmiPredicate, NameMatch, PropertySet, PropertyValue, PALETTE,
};
use ifc_fargelegger::parser::{load_ifc_file, StepValue};
use ifc_fargelegger::tagger::style::{
    representation_items, surface_colour, surface_styles_of, StyledItemIndex,
};
use ifc_fargelegger::tagger::{build_pset_index, select_elements, tag_model, MARKING_PSET_NAME};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

const BUILDING: &str = r"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [ReferenceView]'),'2;1');
FILE_NAME('bygg.ifc','2024-05-01T10:00:00',('Arkitekt'),('Firma'),'','','');
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCPERSON($,'Nordmann','Ola',$,$,$,$,$);
#2=IFCORGANIZATION($,'Firma',$,$,$);
#3=IFCPERSONANDORGANIZATION(#1,#2,$);
#4=IFCAPPLICATION(#2,'1.0','Modeller','MOD');
#5=IFCOWNERHISTORY(#3,#4,$,.ADDED.,$,$,$,1714550400);
#6=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',#5,'Skole',$,$,$,$,$,$);
#10=IFCCARTESIANPOINT((0.,0.,0.));
#12=IFCAXIS2PLACEMENT3D(#10,$,$);
#20=IFCBLOCK(#12,1.,2.,3.);
#21=IFCSHAPEREPRESENTATION($,'Body','CSG',(#20));
#22=IFCPRODUCTDEFINITIONSHAPE($,$,(#21));
#23=IFCBLOCK(#12,1.,1.,2.);
#24=IFCSHAPEREPRESENTATION($,'Body','CSG',(#23));
#25=IFCPRODUCTDEFINITIONSHAPE($,$,(#24));
#26=IFCBLOCK(#12,4.,1.,1.);
#27=IFCSHAPEREPRESENTATION($,'Body','CSG',(#26));
#28=IFCPRODUCTDEFINITIONSHAPE($,$,(#27));
#30=IFCWALL('1hOSvn6df7F8_7GcBWlRGQ',#5,'Vegg A',$,$,$,#22,$,$);
#31=IFCDOOR('1hOSvn6df7F8_7GcBWlRGR',#5,'D\X2\00F8\X0\r 1',$,$,$,#25,$,$,$,$,$,$);
#32=IFCSLAB('1hOSvn6df7F8_7GcBWlRGS',#5,'Dekke',$,$,$,$,$,$);
#33=IFCBEAM('1hOSvn6df7F8_7GcBWlRGT',#5,'Bjelke',$,$,$,#28,$,$);
#34=IFCWALLTYPE('1hOSvn6df7F8_7GcBWlRGU',#5,'Veggtype',$,$,(#48),$,$,$,.STANDARD.);
#40=IFCPROPERTYSINGLEVALUE('Status',$,IFCLABEL('Done'),$);
#41=IFCPROPERTYSET('2hOSvn6df7F8_7GcBWlRGA',#5,'Pset_Foo',$,(#40));
#42=IFCRELDEFINESBYPROPERTIES('3hOSvn6df7F8_7GcBWlRGA',#5,$,$,(#30),#41);
#43=IFCPROPERTYSINGLEVALUE('Status',$,IFCLABEL('Pending'),$);
#44=IFCPROPERTYSET('2hOSvn6df7F8_7GcBWlRGB',#5,'Pset_Foo',$,(#43));
#45=IFCRELDEFINESBYPROPERTIES('3hOSvn6df7F8_7GcBWlRGB',#5,$,$,(#31,#33),#44);
#46=IFCPROPERTYSINGLEVALUE('MMI',$,IFCINTEGER(700),$);
#47=IFCPROPERTYSET('2hOSvn6df7F8_7GcBWlRGC',#5,'Pset_MMI',$,(#46));
#48=IFCPROPERTYSET('2hOSvn6df7F8_7GcBWlRGD',#5,'Pset_TypeOnly',$,(#49));
#49=IFCPROPERTYSINGLEVALUE('Status',$,IFCLABEL('Done'),$);
#50=IFCRELDEFINESBYPROPERTIES('3hOSvn6df7F8_7GcBWlRGC',#5,$,$,(#31,#32),#47);
#51=IFCPROPERTYSINGLEVALUE('MMI',$,IFCLABEL('300'),$);
#52=IFCPROPERTYSET('2hOSvn6df7F8_7GcBWlRGE',#5,'Felles',$,(#51));
#53=IFCRELDEFINESBYPROPERTIES('3hOSvn6df7F8_7GcBWlRGE',#5,$,$,(#30),#52);
#54=IFCPROPERTYSINGLEVALUE('Prosjekt_MMI',$,IFCREAL(700.),$);
#55=IFCPROPERTYSET('2hOSvn6df7F8_7GcBWlRGF',#5,'Egenskaper',$,(#54));
#56=IFCRELDEFINESBYPROPERTIES('3hOSvn6df7F8_7GcBWlRGF',#5,$,$,(#33),#55);
#60=IFCCOLOURRGB($,0.5,0.5,0.5);
#61=IFCSURFACESTYLESHADING(#60,$);
#62=IFCSURFACESTYLE('Gr\X2\00E5\X0\',.BOTH.,(#61));
#63=IFCSTYLEDITEM(#23,(#62),$);
#64=IFCRELDEFINESBYTYPE('3hOSvn6df7F8_7GcBWlRGG',#5,$,$,(#30),#34);
ENDSEC;
END-ISO-10303-21;
";

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn load(dir: &Path) -> IfcModel {
    load_ifc_file(write_fixture(dir, "bygg.ifc", BUILDING)).unwrap()
}

fn color(name: &str) -> &'static MarkColor {
    MarkColor::find(name).unwrap()
}

fn marking_sets(model: &IfcModel, element_id: u64) -> Vec<PropertySet> {
    model
        .property_sets_of(element_id)
        .into_iter()
        .filter(|p| p.name == MARKING_PSET_NAME)
        .collect()
}

fn text(value: &str) -> PropertyValue {
    PropertyValue::Text(value.to_string())
}

fn selected_ids(model: &IfcModel, filter: &Filter) -> Vec<u64> {
    select_elements(model, filter, &Config::default().matching)
        .into_iter()
        .map(|m| m.element.id)
        .collect()
}

/// Tags and exports like the CLI: nothing is written when tagging fails.
fn run(input: &Path, filter: &Filter, color: &MarkColor) -> Result<PathBuf, TagError> {
    let mut model = load_ifc_file(input).unwrap();
    tag_model(&mut model, filter, color, date(), &Config::default())?;
    let output = output_path_for(input);
    export_ifc(&model, &output).unwrap();
    Ok(output)
}

#[test]
fn enumerates_element_property_sets_with_counts() {
    let dir = tempfile::tempdir().unwrap();
    let model = load(dir.path());
    let index = build_pset_index(&model);

    assert_eq!(model.name, "Skole");
    assert_eq!(model.total_products(), 4);
    assert_eq!(
        index.pset_names(),
        vec!["Egenskaper", "Felles", "Pset_Foo", "Pset_MMI"]
    );

    let status: Vec<(String, usize)> = index
        .values("Pset_Foo", "Status")
        .into_iter()
        .map(|v| (v.value, v.count))
        .collect();
    assert_eq!(
        status,
        vec![("Pending".to_string(), 2), ("Done".to_string(), 1)]
    );

    let mmi = index.values("Pset_MMI", "MMI");
    assert_eq!(mmi.len(), 1);
    assert_eq!(mmi[0].value, "700");
    assert_eq!(mmi[0].count, 2);
}

#[test]
fn property_filter_selects_exactly_the_matching_element() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = load(dir.path());
    let filter = Filter::property("Pset_Foo", "Status", "Done");

    assert_eq!(selected_ids(&model, &filter), vec![30]);
    assert!(selected_ids(&model, &Filter::property("Pset_TypeOnly", "Status", "Done")).is_empty());

    let report = tag_model(&mut model, &filter, color("Rosa"), date(), &Config::default()).unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(report.colored, 1);
    assert_eq!(report.elements[0].global_id, "1hOSvn6df7F8_7GcBWlRGQ");

    let marking = marking_sets(&model, 30);
    assert_eq!(marking.len(), 1);
    assert_eq!(marking[0].get("Farge"), Some(&text("Rosa")));
    assert_eq!(marking[0].get("Filter"), Some(&text("Pset_Foo.Status=Done")));
    assert_eq!(
        marking[0].get("Info"),
        Some(&text("Farget med \"Rosa\" basert på Pset_Foo.Status=Done."))
    );
    assert_eq!(marking[0].get("MarkeringsDato"), Some(&text("2026-10-16")));

    for other in [31, 32, 33] {
        assert!(marking_sets(&model, other).is_empty());
    }
}

#[test]
fn mmi_scan_contains_and_exact() {
    let dir = tempfile::tempdir().unwrap();
    let model = load(dir.path());

    let contains = Filter::Mmi(MmiPredicate::default());
    assert_eq!(selected_ids(&model, &contains), vec![31, 32, 33]);

    let exact = Filter::Mmi(MmiPredicate {
        name_match: NameMatch::Exact,
        ..MmiPredicate::default()
    });
    assert_eq!(selected_ids(&model, &exact), vec![31, 32]);
}

#[test]
fn mmi_marking_leaves_filter_blank() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = load(dir.path());

    let report = tag_model(
        &mut model,
        &Filter::Mmi(MmiPredicate::default()),
        color("Blå"),
        date(),
        &Config::default(),
    )
    .unwrap();

    assert_eq!(report.total, 3);
    // The slab has no shape representation.
    assert_eq!(report.colored, 2);

    let marking = marking_sets(&model, 32);
    assert_eq!(marking.len(), 1);
    assert_eq!(marking[0].get("Filter"), Some(&PropertyValue::Text(String::new())));
    assert_eq!(
        marking[0].get("Info"),
        Some(&text("Farget med \"Blå\" basert på MMI=700."))
    );
}

#[test]
fn empty_selection_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "bygg.ifc", BUILDING);

    let result = run(
        &input,
        &Filter::property("Pset_Foo", "Status", "Cancelled"),
        color("Gul"),
    );

    assert!(matches!(result, Err(TagError::EmptySelection { .. })));
    assert!(!output_path_for(&input).exists());
}

#[test]
fn tagging_twice_matches_tagging_once() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = load(dir.path());
    let filter = Filter::property("Pset_Foo", "Status", "Pending");
    let config = Config::default();

    let entity_types = |model: &IfcModel| {
        let mut types: Vec<String> = model.step.entities().map(|e| e.entity_type.clone()).collect();
        types.sort();
        types
    };

    tag_model(&mut model, &filter, color("Lilla"), date(), &config).unwrap();
    let once = model.step.len();
    let once_types = entity_types(&model);

    tag_model(&mut model, &filter, color("Lilla"), date(), &config).unwrap();
    let twice_types = entity_types(&model);

    assert_eq!(model.step.len(), once);
    assert_eq!(twice_types, once_types);
    for element in [31, 33] {
        assert_eq!(marking_sets(&model, element).len(), 1);
    }

    let styles = model.step.get_entities_by_type("IFCSURFACESTYLE");
    assert_eq!(
        styles
            .iter()
            .filter(|s| s.str_attr(0) == Some("NOSKI_Eksisterende_Lilla"))
            .count(),
        1
    );
}

#[test]
fn retagging_with_another_color_replaces_the_marking() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = load(dir.path());
    let filter = Filter::property("Pset_Foo", "Status", "Done");
    let config = Config::default();

    tag_model(&mut model, &filter, color("Rosa"), date(), &config).unwrap();
    tag_model(&mut model, &filter, color("Grønn"), date(), &config).unwrap();

    let marking = marking_sets(&model, 30);
    assert_eq!(marking.len(), 1);
    assert_eq!(marking[0].get("Farge"), Some(&text("Grønn")));
}

#[test]
fn farge_is_the_chosen_color_for_the_whole_palette() {
    let dir = tempfile::tempdir().unwrap();
    let model = load(dir.path());
    let filter = Filter::property("Pset_Foo", "Status", "Done");

    for color in &PALETTE {
        let mut tagged = model.clone();
        tag_model(&mut tagged, &filter, color, date(), &Config::default()).unwrap();
        let marking = marking_sets(&tagged, 30);
        assert_eq!(marking.len(), 1, "{}", color.name);
        assert_eq!(marking[0].get("Farge"), Some(&text(color.name)));
    }
}

#[test]
fn exported_model_reloads_with_marking_and_style() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "bygg.ifc", BUILDING);
    let filter = Filter::property("Pset_Foo", "Status", "Pending");
    let rosa = color("Rosa");

    let output = run(&input, &filter, rosa).unwrap();
    assert_eq!(output, dir.path().join("bygg_farget.ifc"));

    let reloaded = load_ifc_file(&output).unwrap();
    assert_eq!(reloaded.schema, "IFC4");
    assert_eq!(selected_ids(&reloaded, &filter), vec![31, 33]);

    let styled = StyledItemIndex::build(&reloaded);
    for element in [31, 33] {
        assert_eq!(marking_sets(&reloaded, element).len(), 1);

        let items = representation_items(&reloaded, element);
        assert!(!items.is_empty());
        for item in items {
            let styled_items = styled.styled_items(item);
            assert_eq!(styled_items.len(), 1);

            let surface = surface_styles_of(&reloaded, styled_items[0]);
            assert_eq!(surface.len(), 1);
            let (r, g, b) = surface_colour(&reloaded, surface[0]).unwrap();
            assert!((r - rosa.rgb.0).abs() < 1e-9);
            assert!((g - rosa.rgb.1).abs() < 1e-9);
            assert!((b - rosa.rgb.2).abs() < 1e-9);
        }
    }

    // The wall was not selected and keeps no marking or style.
    assert!(marking_sets(&reloaded, 30).is_empty());
    assert!(styled.styled_items(20).is_empty());

    let door = reloaded.element(31).unwrap();
    assert_eq!(door.display_name(), "Dør 1");
}

#[test]
fn untouched_entities_are_written_back_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "bygg.ifc", BUILDING);
    let original = load_ifc_file(&input).unwrap();

    let mut tagged = original.clone();
    tag_model(
        &mut tagged,
        &Filter::property("Pset_Foo", "Status", "Done"),
        color("Oransje"),
        date(),
        &Config::default(),
    )
    .unwrap();
    let output = dir.path().join("out.ifc");
    export_ifc(&tagged, &output).unwrap();
    let reloaded = load_ifc_file(&output).unwrap();

    for entity in original.step.entities() {
        let written = reloaded.step.get_entity(entity.id).unwrap();
        assert_eq!(written.raw(), entity.raw(), "#{}", entity.id);
    }
}

#[test]
fn ifc2x3_uses_style_assignment_and_label_date() {
    let dir = tempfile::tempdir().unwrap();
    let content = BUILDING.replace("FILE_SCHEMA(('IFC4'))", "FILE_SCHEMA(('IFC2X3'))");
    let input = write_fixture(dir.path(), "eldre.ifc", &content);

    let output = run(&input, &Filter::property("Pset_Foo", "Status", "Done"), color("Gul")).unwrap();
    let reloaded = load_ifc_file(&output).unwrap();
    assert_eq!(reloaded.schema, "IFC2X3");

    let marking = marking_sets(&reloaded, 30);
    assert_eq!(marking.len(), 1);
    let date_property = reloaded
        .step
        .get_entities_by_type("IFCPROPERTYSINGLEVALUE")
        .into_iter()
        .find(|p| p.str_attr(0) == Some("MarkeringsDato"))
        .unwrap();
    assert_eq!(
        date_property.attr(2),
        Some(&StepValue::typed_string("IFCLABEL", "2026-10-16"))
    );

    let styled = StyledItemIndex::build(&reloaded);
    let styled_item = styled.styled_items(20)[0];
    let style_ref = reloaded.step.get_entity(styled_item).unwrap().ref_list_attr(1)[0];
    assert_eq!(
        reloaded.step.get_entity(style_ref).unwrap().entity_type,
        "IFCPRESENTATIONSTYLEASSIGNMENT"
    );
    assert_eq!(surface_styles_of(&reloaded, styled_item).len(), 1);
}

const MIXED_OBJECTS: &str = r"ISO-10303-21;
HEADER;
FILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');
FILE_NAME('blandet.ifc','2024-05-01T10:00:00',(''),(''),'','','');
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCPROJECT('0YvctVUKr0kugbFTf53O9L',$,'Blandet',$,$,$,$,$,$);
#10=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,'Vegg',$,$,$,$,$);
#11=IFCSCHEDULETIMECONTROL('2O2Fr$t4X7Zf8NOew3FLOI',$,'Plan',$,$,$,$,$,$,$,$,$,$,$,$,$,$,$,$,$,$,$,$);
#12=IFCELECTRICALCIRCUIT('2O2Fr$t4X7Zf8NOew3FLOJ',$,'Kurs',$,$);
#13=IFCTYPEPRODUCT('2O2Fr$t4X7Zf8NOew3FLOK',$,'Type',$,$,$,$,$);
#14=(IFCREPRESENTATIONCONTEXT($,$)IFCGEOMETRICREPRESENTATIONCONTEXT(3,1.E-05,$,$));
#20=IFCPROPERTYSINGLEVALUE('MMI',$,IFCLABEL('700'),$);
#21=IFCPROPERTYSET('2O2Fr$t4X7Zf8NOew3FLOL',$,'Pset_MMI',$,(#20));
#22=IFCRELDEFINESBYPROPERTIES('2O2Fr$t4X7Zf8NOew3FLOM',$,$,$,(#10,#11,#12,#13,#14),#21);
ENDSEC;
END-ISO-10303-21;
";

#[test]
fn only_products_are_selected_counted_and_marked() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_fixture(dir.path(), "blandet.ifc", MIXED_OBJECTS);
    let mut model = load_ifc_file(&input).unwrap();
    let filter = Filter::Mmi(MmiPredicate::default());

    assert_eq!(selected_ids(&model, &filter), vec![10]);
    assert_eq!(model.total_products(), 1);

    let index = build_pset_index(&model);
    let counts: Vec<(String, usize)> = index
        .values("Pset_MMI", "MMI")
        .into_iter()
        .map(|v| (v.value, v.count))
        .collect();
    assert_eq!(counts, vec![("700".to_string(), 1)]);

    let report = tag_model(&mut model, &filter, color("Rosa"), date(), &Config::default()).unwrap();
    assert_eq!(report.total, 1);
    assert_eq!(marking_sets(&model, 10).len(), 1);
    for id in [11, 12, 13, 14] {
        assert!(marking_sets(&model, id).is_empty(), "#{id} was marked");
    }
}

#[test]
fn reports_list_every_marked_element() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = load(dir.path());
    let report = tag_model(
        &mut model,
        &Filter::Mmi(MmiPredicate::default()),
        color("Magenta"),
        date(),
        &Config::default(),
    )
    .unwrap();

    let csv_path = dir.path().join("rapport.csv");
    export_csv(&report, &csv_path).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "GlobalId,Type,Name,Property,Colored");
    assert_eq!(lines.len(), 4);
    assert!(lines[2].starts_with("1hOSvn6df7F8_7GcBWlRGS,IFCSLAB,Dekke,MMI,Failed"));

    let json_path = dir.path().join("rapport.json");
    export_json(&report, &json_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json["color"], "Magenta");
    assert_eq!(json["total"], 3);
    assert_eq!(json["elements"].as_array().unwrap().len(), 3);
}

#[test]
fn extra_marking_properties_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut model = load(dir.path());
    let config: Config =
        serde_json::from_str(r#"{ "marking": { "extra_properties": { "Laget av": "Skiplum" } } }"#)
            .unwrap();

    tag_model(
        &mut model,
        &Filter::property("Pset_Foo", "Status", "Done"),
        color("Hvit"),
        date(),
        &config,
    )
    .unwrap();

    let marking = marking_sets(&model, 30);
    assert_eq!(marking[0].get("Laget av"), Some(&text("Skiplum")));
    assert_eq!(marking[0].properties.len(), 5);
}
