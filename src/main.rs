// Entry point and high-level CLI flow.
//
// - Option [1] loads the spreadsheet and reports its layout.
// - Option [2] extracts the analysis payload from the best data row and
//   writes it with validation and quality notes.
// - Option [3] extracts one payload per data row and summarizes them.
use chrono::{DateTime, Utc};
use clap::Parser;
use lca_ingest::extract::extract_prepared;
use lca_ingest::quality::{self, QualityReport};
use lca_ingest::shape::{prepare, SheetLayout};
use lca_ingest::{
    config, extract_scenarios, loader, output, reports, util, validate, AnalysisPayload,
    ExtractConfig, SheetInput, ValidationResult,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lca_ingest", about = "Turns LCA input spreadsheets into analysis payloads")]
struct Args {
    /// Spreadsheet to read (.csv, .xlsx, .xlsm, .xlsb, .xls, .ods or .json)
    #[arg(long, default_value = "lca_inputs.csv")]
    file: PathBuf,

    /// JSON file overriding extraction defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory the outputs are written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Load and extract once, then exit without showing the menu
    #[arg(long, default_value = "false")]
    once: bool,
}

// Session context handed to each menu action. The sheet is loaded once and
// can be extracted from repeatedly.
struct AppState {
    args: Args,
    config: ExtractConfig,
    sheet: Option<SheetInput>,
}

#[derive(Serialize)]
struct PayloadEnvelope<'a> {
    extracted_at: DateTime<Utc>,
    source: String,
    layout: SheetLayout,
    selected_row: Option<usize>,
    payload: &'a AnalysisPayload,
    validation: &'a ValidationResult,
    quality: &'a QualityReport,
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
///
/// Returns `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to menu (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

/// Handle option [1]: load the spreadsheet named on the command line.
fn handle_load(state: &mut AppState) {
    match loader::load_sheet(&state.args.file) {
        Ok(sheet) => {
            let layout = prepare(&sheet).layout();
            println!(
                "Loaded {} ({} rows, {} layout)\n",
                state.args.file.display(),
                util::format_int(sheet.row_count()),
                layout
            );
            state.sheet = Some(sheet);
        }
        Err(e) => {
            eprintln!("Failed to load file: {}\n", e);
        }
    }
}

fn loaded_sheet(state: &AppState) -> Option<&SheetInput> {
    let sheet = state.sheet.as_ref();
    if sheet.is_none() {
        println!("Error: No data loaded. Please load the spreadsheet first (option 1).\n");
    }
    sheet
}

/// Handle option [2]: extract, validate and write the analysis payload.
fn handle_extract(state: &AppState) {
    let Some(input) = loaded_sheet(state) else {
        return;
    };
    let sheet = prepare(input);
    let extraction = extract_prepared(&sheet, &state.config);
    let validation = validate(&extraction.payload);
    let quality = quality::assess(&sheet, &extraction.payload);

    println!("Field Resolution ({} layout", extraction.layout);
    if let Some(sel) = extraction.selected_row {
        print!(", data row {} with score {}", sel.index + 1, sel.score);
        if sel.fallback_used {
            print!(" after skipping an all-zero row");
        }
    }
    println!(")\n");
    let field_rows = reports::generate_field_report(&extraction.trace);
    output::preview_table_rows(&field_rows, field_rows.len());

    if validation.valid {
        println!("Validation: OK");
    } else {
        for issue in &validation.issues {
            println!("Warning: {}", issue);
        }
    }
    println!(
        "Completeness: {}% ({} of {} cells missing)",
        util::format_number(quality.completeness * 100.0, 1),
        util::format_int(quality.missing_cells),
        util::format_int(quality.total_cells)
    );
    if !quality.unmapped_headers.is_empty() {
        println!("Ignored columns: {}", quality.unmapped_headers.join(", "));
    }
    for warning in &quality.warnings {
        println!("Note: {}", warning);
    }
    println!();

    let envelope = PayloadEnvelope {
        extracted_at: Utc::now(),
        source: state.args.file.display().to_string(),
        layout: extraction.layout,
        selected_row: extraction.selected_row.map(|s| s.index),
        payload: &extraction.payload,
        validation: &validation,
        quality: &quality,
    };
    let payload_file = state.args.out_dir.join("analysis_payload.json");
    if let Err(e) = output::write_json(&payload_file, &envelope) {
        eprintln!("Write error: {}", e);
    }
    let field_file = state.args.out_dir.join("field_resolution.csv");
    if let Err(e) = output::write_csv(&field_file, &field_rows) {
        eprintln!("Write error: {}", e);
    }
    println!(
        "(Payload saved to {}, field report to {})\n",
        payload_file.display(),
        field_file.display()
    );
}

/// Handle option [3]: one payload per data row plus a summary.
fn handle_scenarios(state: &AppState) {
    let Some(input) = loaded_sheet(state) else {
        return;
    };
    let scenarios = extract_scenarios(input, &state.config);
    let rows = reports::generate_scenario_report(&scenarios);
    println!("Scenarios ({} total)\n", util::format_int(scenarios.len()));
    output::preview_table_rows(&rows, 5);

    let scenario_file = state.args.out_dir.join("scenarios.csv");
    if let Err(e) = output::write_csv(&scenario_file, &rows) {
        eprintln!("Write error: {}", e);
    }
    let summary = reports::generate_summary(&scenarios);
    let summary_file = state.args.out_dir.join("scenario_summary.json");
    if let Err(e) = output::write_json(&summary_file, &summary) {
        eprintln!("Write error: {}", e);
    }
    println!(
        "{{\"total_mass_kg\": {}, \"avg_recycled_content_percent\": {}}}\n",
        util::format_number(summary.total_mass_kg, 2),
        util::format_number(summary.avg_recycled_content_percent, 2)
    );
    println!("(Full table exported to {})\n", scenario_file.display());
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => match config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => ExtractConfig::default(),
    };
    let mut state = AppState { args, config, sheet: None };

    if state.args.once {
        handle_load(&mut state);
        if state.sheet.is_none() {
            std::process::exit(1);
        }
        handle_extract(&state);
        return;
    }

    loop {
        println!("Select an option:");
        println!("[1] Load the spreadsheet");
        println!("[2] Extract analysis payload");
        println!("[3] Extract all scenarios\n");
        let Some(choice) = read_choice() else {
            println!("Exiting the program.");
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&mut state),
            "2" | "3" => {
                println!();
                if choice == "2" {
                    handle_extract(&state);
                } else {
                    handle_scenarios(&state);
                }
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1, 2 or 3.\n"),
        }
    }
}
