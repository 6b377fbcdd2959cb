use crate::error::LoadError;
use crate::model::IfcModel;
use crate::parser::step::StepFile;
use std::path::Path;

/// Loads an IFC file into an editable model.
///
/// Supports IFC2x3, IFC4 and IFC4x3 STEP files. Every entity is kept; the
/// tagger only interprets property sets, representations and styles.
///
/// # Arguments
///
/// * `path` - Path to the IFC file
///
/// # Errors
///
/// Returns [`LoadError::FileRead`] if the file cannot be read.
/// Returns [`LoadError::InvalidStep`] if the STEP format is malformed.
/// Returns [`LoadError::UnsupportedSchema`] if the schema is not an IFC schema.
///
/// # Example
///
/// ```no_run
/// use ifc_fargelegger::parser::load_ifc_file;
///
/// let model = load_ifc_file("model.ifc")?;
/// println!("{}: {} elements", model.name, model.total_products());
/// # Ok::<(), ifc_fargelegger::error::LoadError>(())
/// ```
pub fn load_ifc_file<P: AsRef<Path>>(path: P) -> Result<IfcModel, LoadError> {
    let content = std::fs::read_to_string(&path).map_err(|source| LoadError::FileRead {
        path: path.as_ref().to_path_buf(),
        source,
    })?;

    let model = load_ifc_str(&content, path.as_ref())?;

    tracing::info!(
        path = %path.as_ref().display(),
        schema = %model.schema,
        entities = model.step.len(),
        "Loaded IFC file"
    );

    Ok(model)
}

/// Builds a model from IFC text already in memory.
pub fn load_ifc_str(content: &str, path: &Path) -> Result<IfcModel, LoadError> {
    let step_file = StepFile::parse(content)?;

    if !step_file.schema.to_ascii_uppercase().starts_with("IFC") {
        return Err(LoadError::UnsupportedSchema {
            schema: step_file.schema,
        });
    }

    let project_name = extract_project_name(&step_file);

    Ok(IfcModel::new(
        project_name,
        step_file.schema.clone(),
        path.to_path_buf(),
        step_file,
    ))
}

fn extract_project_name(step_file: &StepFile) -> String {
    step_file
        .get_entities_by_type("IFCPROJECT")
        .first()
        .and_then(|e| e.str_attr(2))
        .map_or_else(|| "Unknown Project".to_string(), str::to_string)
}
