//! CSV and JSON reports of a marking run.

use crate::error::ExportError;
use crate::tagger::{MarkedElement, MarkingReport};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "GlobalId")]
    global_id: &'a str,
    #[serde(rename = "Type")]
    entity_type: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "Property")]
    property: &'a str,
    #[serde(rename = "Colored")]
    colored: &'static str,
}

impl<'a> From<&'a MarkedElement> for CsvRow<'a> {
    fn from(element: &'a MarkedElement) -> Self {
        Self {
            global_id: &element.global_id,
            entity_type: &element.entity_type,
            name: &element.name,
            property: &element.property,
            colored: if element.colored { "OK" } else { "Failed" },
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, ExportError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| ExportError::FileCreate {
            path: path.to_path_buf(),
            source,
        })
}

/// One row per marked element.
pub fn export_csv<P: AsRef<Path>>(report: &MarkingReport, path: P) -> Result<(), ExportError> {
    let path_ref = path.as_ref();
    let mut writer = csv::Writer::from_writer(create(path_ref)?);

    if report.elements.is_empty() {
        writer.write_record(["GlobalId", "Type", "Name", "Property", "Colored"])?;
    }
    for element in &report.elements {
        writer.serialize(CsvRow::from(element))?;
    }

    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })
}

/// The whole report, pretty-printed.
pub fn export_json<P: AsRef<Path>>(report: &MarkingReport, path: P) -> Result<(), ExportError> {
    let mut writer = create(path.as_ref())?;
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)
        .and_then(|()| writer.flush())
        .map_err(|e| ExportError::WriteError {
            message: e.to_string(),
        })
}
