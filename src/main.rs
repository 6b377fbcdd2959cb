use chrono::Local;
use clap::{ArgGroup, Parser};
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use ifc_fargelegger::config::Config;
use ifc_fargelegger::error::TagError;
use ifc_fargelegger::export::{export_csv, export_ifc, export_json, output_path_for};
use ifc_fargelegger::model::{Filter, IfcModel, MarkColor, NameMatch, PALETTE};
use ifc_fargelegger::parser::load_ifc_file;
use ifc_fargelegger::tagger::{build_pset_index, select_elements, tag_model};
use ifc_fargelegger::ui::App;

#[derive(Parser, Debug)]
#[command(name = "ifc-fargelegger")]
#[command(about = "IFC Fargelegger - color and mark IFC elements by property")]
#[command(version)]
#[command(group(ArgGroup::new("filter").args(["pset", "mmi"])))]
struct Args {
    /// Path to IFC file
    #[arg(required = true)]
    file: PathBuf,

    /// Property set to filter on
    #[arg(long, requires_all = ["property", "value"], conflicts_with = "mmi")]
    pset: Option<String>,

    /// Property name inside the property set
    #[arg(long, requires = "pset")]
    property: Option<String>,

    /// Value the property must equal
    #[arg(long, requires = "pset")]
    value: Option<String>,

    /// Scan every property set for MMI = 700
    #[arg(long)]
    mmi: bool,

    /// Require the property name to be exactly "MMI" in the scan
    #[arg(long, requires = "mmi")]
    mmi_exact: bool,

    /// Color name (Hvit, Rosa, Grønn, Magenta, Gul, Lilla, Blå, Oransje, Rød)
    #[arg(long, value_name = "NAME")]
    color: Option<String>,

    /// Output IFC path (defaults to <file>_farget.<ext>)
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print property sets, properties and values, then exit
    #[arg(long)]
    list: bool,

    /// Print the matched elements without writing anything
    #[arg(long, requires = "filter")]
    preview: bool,

    /// Write a CSV report of the marked elements
    #[arg(long, value_name = "FILE", requires = "filter")]
    csv: Option<PathBuf>,

    /// Write a JSON report of the marked elements
    #[arg(long, value_name = "FILE", requires = "filter")]
    json: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn filter(&self, config: &Config) -> Option<Filter> {
        if self.mmi {
            let mut predicate = config.mmi.clone();
            if self.mmi_exact {
                predicate.name_match = NameMatch::Exact;
            }
            return Some(Filter::Mmi(predicate));
        }

        match (&self.pset, &self.property, &self.value) {
            (Some(pset), Some(property), Some(value)) => {
                Some(Filter::property(pset, property, value))
            }
            _ => None,
        }
    }

    fn is_headless(&self) -> bool {
        self.list
            || self.preview
            || self.mmi
            || self.pset.is_some()
            || self.csv.is_some()
            || self.json.is_some()
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| output_path_for(&args.file));

    if args.is_headless() {
        init_logging(args.verbose);
        let model = load_ifc_file(&args.file)?;
        return run_headless(&args, model, &config, &output);
    }

    let model = load_ifc_file(&args.file)?;
    let terminal = ratatui::init();
    let result = App::new(model, config, output).run(terminal);
    ratatui::restore();
    result
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_headless(args: &Args, mut model: IfcModel, config: &Config, output: &Path) -> Result<()> {
    println!(
        "{} ({}) - {} elements",
        model.name,
        model.schema,
        model.total_products()
    );

    if args.list {
        print_index(&model);
        return Ok(());
    }

    let filter = args
        .filter(config)
        .ok_or_else(|| eyre!("no filter given: use --pset/--property/--value or --mmi"))?;

    if args.preview {
        let matches = select_elements(&model, &filter, &config.matching);
        println!("{} elements match {filter}", matches.len());
        for m in &matches {
            println!(
                "  {:<24} {:<28} {:<30} {}.{} = {}",
                m.element.global_id,
                m.element.entity_type,
                m.element.display_name(),
                m.pset_name,
                m.property_name,
                m.value.label()
            );
        }
        return Ok(());
    }

    let Some(color_name) = &args.color else {
        let names: Vec<&str> = PALETTE.iter().map(|c| c.name).collect();
        bail!("--color is required, choose one of: {}", names.join(", "));
    };
    let color = MarkColor::find(color_name).ok_or_else(|| TagError::UnknownColor {
        name: color_name.clone(),
    })?;

    let date = Local::now().date_naive();
    let report = tag_model(&mut model, &filter, color, date, config)?;
    export_ifc(&model, output)?;

    if let Some(csv_path) = &args.csv {
        export_csv(&report, csv_path)?;
        println!("Report written to CSV: {}", csv_path.display());
    }

    if let Some(json_path) = &args.json {
        export_json(&report, json_path)?;
        println!("Report written to JSON: {}", json_path.display());
    }

    println!(
        "Colored {}/{} elements {} with {filter}",
        report.colored, report.total, color.name
    );
    println!("Saved: {}", output.display());
    Ok(())
}

fn print_index(model: &IfcModel) {
    let index = build_pset_index(model);
    if index.is_empty() {
        println!("No property sets on any element");
        return;
    }

    for pset in index.pset_names() {
        println!("{pset}");
        for property in index.property_names(pset) {
            println!("  {property}");
            for value in index.values(pset, property) {
                println!("    {} ({})", value.value, value.count);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("ifc-fargelegger").chain(args.iter().copied()))
    }

    #[test]
    fn reports_and_preview_need_a_filter() {
        for flags in [
            &["model.ifc", "--csv", "ut.csv"][..],
            &["model.ifc", "--json", "ut.json"][..],
            &["model.ifc", "--preview"][..],
        ] {
            let err = parse(flags).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument, "{flags:?}");
        }
    }

    #[test]
    fn reports_with_a_filter_run_headless() {
        let args = parse(&["model.ifc", "--mmi", "--color", "Rosa", "--csv", "ut.csv"]).unwrap();
        assert!(args.is_headless());
        assert!(matches!(args.filter(&Config::default()), Some(Filter::Mmi(_))));

        let args = parse(&[
            "model.ifc", "--pset", "Pset_Foo", "--property", "Status", "--value", "Done",
            "--json", "ut.json",
        ])
        .unwrap();
        assert!(args.is_headless());
        assert!(matches!(
            args.filter(&Config::default()),
            Some(Filter::Property { .. })
        ));
    }

    #[test]
    fn plain_file_opens_the_terminal_ui() {
        assert!(!parse(&["model.ifc"]).unwrap().is_headless());
    }
}
