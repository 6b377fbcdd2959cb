use crate::error::ExportError;
use crate::model::IfcModel;
use crate::parser::write_step;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Appended to the input file stem to name the output.
pub const OUTPUT_SUFFIX: &str = "_farget";

/// `model.ifc` → `model_farget.ifc`, next to the input.
#[must_use]
pub fn output_path_for<P: AsRef<Path>>(input: P) -> PathBuf {
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .map_or_else(|| "model".to_string(), |s| s.to_string_lossy().into_owned());

    let name = match input.extension() {
        Some(ext) => format!("{stem}{OUTPUT_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{OUTPUT_SUFFIX}"),
    };

    input.with_file_name(name)
}

/// Writes the model as IFC. The content goes to a temporary file in the
/// target directory that is renamed into place once complete, so a failed
/// export never leaves a partial file behind.
pub fn export_ifc<P: AsRef<Path>>(model: &IfcModel, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let content = write_step(&model.step)?;

    let dir = path_ref
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut file = NamedTempFile::new_in(dir).map_err(|source| ExportError::FileCreate {
        path: path_ref.to_path_buf(),
        source,
    })?;

    file.write_all(content.as_bytes())
        .map_err(|e| ExportError::WriteError {
            message: e.to_string(),
        })?;

    file.persist(path_ref).map_err(|e| ExportError::Persist {
        path: path_ref.to_path_buf(),
        source: e.error,
    })?;

    tracing::info!(path = %path_ref.display(), bytes = content.len(), "Exported IFC");
    Ok(())
}
