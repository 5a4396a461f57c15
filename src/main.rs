// marathon-bibs: Generate printable marathon bib cards from a CSV roster

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::Local;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marathon_bibs::background::load_background;
use marathon_bibs::error::AppError;
use marathon_bibs::export::{
    export_images, export_pdf, export_print, pdf_filename, print_filename, CardIndex, ExportReport,
};
use marathon_bibs::preview::PreviewState;
use marathon_bibs::raster::Rasterizer;
use marathon_bibs::records::{load_records, today_string};
use marathon_bibs::theme::{find_theme, COLOR_THEMES};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate printable 8x5-inch marathon bib cards with cutting bleeds")]
struct Cli {
    /// Show per-card progress on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the built-in color themes
    Themes {
        /// Print the registry as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load the roster and render every card
    Generate(SourceArgs),

    /// Render the card at the cursor to SVG or PNG
    Preview {
        #[command(flatten)]
        source: SourceArgs,

        /// Cards to move from the first (negative moves backwards, wrapping)
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        step: i64,

        /// Output file; a .png extension rasterizes (defaults to bib-preview.svg)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also print the current record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export every card as one page of a PDF document
    Pdf {
        #[command(flatten)]
        source: SourceArgs,

        /// Output filename (defaults to marathon-bibs-{date}.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export every card as its own JPEG file
    Images {
        #[command(flatten)]
        source: SourceArgs,

        /// Directory to write the JPEG files into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Write a print-ready HTML document that opens the print dialog
    Print {
        #[command(flatten)]
        source: SourceArgs,

        /// Output filename (defaults to marathon-bibs-print-{date}.html)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Where the cards come from and how they look
#[derive(Args, Debug)]
struct SourceArgs {
    /// Participant CSV file (header row required)
    #[arg(short, long)]
    csv: PathBuf,

    /// Color theme id (see `themes`)
    #[arg(short, long, default_value = "athletic-blue")]
    theme: String,

    /// Background image (file path or URL) replacing the theme gradient
    #[arg(short, long)]
    background: Option<String>,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "marathon_bibs=debug"
    } else {
        "marathon_bibs=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(command: Command) -> Result<(), AppError> {
    match command {
        Command::Themes { json } => list_themes(json),
        Command::Generate(source) => generate(&source),
        Command::Preview {
            source,
            step,
            output,
            json,
        } => preview(&source, step, output, json),
        Command::Pdf { source, output } => {
            let state = load_state(&source)?;
            let output = output.unwrap_or_else(|| PathBuf::from(pdf_filename(today())));
            let report = export_pdf(&state, &Rasterizer::new(), &output)?;
            announce(&report, |r| format!("Exported {} BIB pages to {}", r.located, output.display()));
            Ok(())
        }
        Command::Images { source, out_dir } => {
            let state = load_state(&source)?;
            let report = export_images(&state, &Rasterizer::new(), &out_dir)?;
            announce(&report, |r| format!("Exported {} JPEG files to {}", r.located, out_dir.display()));
            Ok(())
        }
        Command::Print { source, output } => {
            let state = load_state(&source)?;
            let output = output.unwrap_or_else(|| PathBuf::from(print_filename(today())));
            let report = export_print(&state, &output)?;
            announce(&report, |r| {
                format!("Wrote {} BIBs to {} (opening it starts printing)", r.located, output.display())
            });
            Ok(())
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

fn list_themes(json: bool) -> Result<(), AppError> {
    if json {
        let out = serde_json::to_string_pretty(&COLOR_THEMES)
            .map_err(|e| AppError::IoError(e.into()))?;
        println!("{}", out);
    } else {
        for theme in &COLOR_THEMES {
            println!("{:<16} {}", theme.id, theme.name);
        }
    }
    Ok(())
}

fn generate(source: &SourceArgs) -> Result<(), AppError> {
    let state = load_state(source)?;
    if state.records().is_empty() {
        println!("Nothing to generate: the CSV has no participant rows");
        return Ok(());
    }

    let index = CardIndex::build(state.records(), state.theme(), state.background());
    for collision in index.collisions() {
        println!(
            "  ! Row {} reuses {} from row {}; it will be skipped on export",
            collision.row + 1,
            collision.key,
            collision.first_row + 1
        );
    }
    println!("✓ Generated {} BIB cards", index.len());
    Ok(())
}

fn preview(
    source: &SourceArgs,
    step: i64,
    output: Option<PathBuf>,
    json: bool,
) -> Result<(), AppError> {
    let state = load_state(source)?.step(step);

    let (Some(card), Some(record), Some((position, total))) =
        (state.render_current(), state.current(), state.position())
    else {
        println!("Upload a CSV with participant rows to preview");
        return Ok(());
    };

    let output = output.unwrap_or_else(|| PathBuf::from("bib-preview.svg"));
    write_preview(&card.svg, &output)?;

    println!("✓ Preview {} of {}: {}", position, total, output.display());
    println!("  Participant: {}", record.participant_name);
    println!("  BIB: {}", record.bib_number);
    println!("  Theme: {}", state.theme().name);

    if json {
        let out = serde_json::to_string_pretty(record).map_err(|e| AppError::IoError(e.into()))?;
        println!("{}", out);
    }
    Ok(())
}

// ============================================================================
// Helper Functions
// ============================================================================

fn today() -> chrono::NaiveDate {
    Local::now().date_naive()
}

/// Applies the CLI inputs to a fresh preview state, reporting each load the
/// way the upload panel would.
fn load_state(source: &SourceArgs) -> Result<PreviewState, AppError> {
    let theme = find_theme(&source.theme)?;
    let records = load_records(&source.csv, &today_string())?;
    println!("✓ Loaded {} participants", records.len());

    let background = match &source.background {
        Some(src) if !src.is_empty() => {
            let image = load_background(src)?;
            println!("✓ Background image loaded");
            Some(image)
        }
        _ => None,
    };

    Ok(PreviewState::new()
        .load_records(records)
        .select_theme(theme)
        .set_background(background))
}

fn write_preview(svg: &str, output: &Path) -> Result<(), AppError> {
    let is_png = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));

    if is_png {
        let image = Rasterizer::new().rasterize(svg)?;
        let mut writer = BufWriter::new(File::create(output)?);
        image
            .write_to(&mut writer, ::image::ImageFormat::Png)
            .map_err(|e| AppError::RasterError(format!("PNG encoding failed: {}", e)))?;
    } else {
        std::fs::write(output, svg)?;
    }
    Ok(())
}

/// Prints the success line for a finished export; empty rosters stay silent.
fn announce(report: &ExportReport, message: impl FnOnce(&ExportReport) -> String) {
    if report.artifacts.is_empty() {
        return;
    }
    println!("✓ {}", message(report));
    if !report.skipped.is_empty() {
        println!("  Skipped (duplicate BIB number): {}", report.skipped.join(", "));
    }
}
