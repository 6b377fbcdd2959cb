//! # IFC Fargelegger
//!
//! Marks elements of an IFC model: pick a property filter (or the MMI 700
//! scan), pick a color, and get a copy of the model where every matching
//! element is painted and carries a `NOSKI_Eksisterende` property set.
//!
//! ## Features
//!
//! - Lossless STEP reading and writing (IFC2X3, IFC4, IFC4X3)
//! - Enumeration of property sets, properties and values with counts
//! - Exact `Pset.Property=Value` filters and the MMI 700 scan
//! - Nine-color metallic palette
//! - Terminal UI, headless CLI, CSV and JSON reports
//!
//! ## Example
//!
//! ```no_run
//! use ifc_fargelegger::config::Config;
//! use ifc_fargelegger::export::{export_ifc, output_path_for};
//! use ifc_fargelegger::model::{Filter, MarkColor};
//! use ifc_fargelegger::parser::load_ifc_file;
//! use ifc_fargelegger::tagger::tag_model;
//!
//! let mut model = load_ifc_file("model.ifc").expect("Failed to load");
//! let filter = Filter::property("Pset_Foo", "Status", "Done");
//! let color = MarkColor::find("Rosa").expect("Unknown color");
//! let date = chrono::Local::now().date_naive();
//!
//! let report = tag_model(&mut model, &filter, color, date, &Config::default())
//!     .expect("Nothing to mark");
//! export_ifc(&model, output_path_for("model.ifc")).expect("Failed to write");
//! println!("Colored {}/{} elements", report.colored, report.total);
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod tagger;
pub mod ui;
