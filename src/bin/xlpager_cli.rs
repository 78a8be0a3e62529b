//! CLI tool for xlpager - paginates every sheet of an XLSX file
//!
//! Usage:
//!   xlpager_cli <input.xlsx>                      # Page plan as JSON on stdout
//!   xlpager_cli <input.xlsx> -o plan.json         # Page plan as JSON to a file
//!   xlpager_cli <input.xlsx> --format svg -o out/ # One SVG per page

#![allow(clippy::exit)]

use clap::{Parser, ValueEnum};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use xlpager::render::SvgRenderer;
use xlpager::{
    layout_workbook, parse_file, render_workbook, BreakMode, CharWidthMetrics, LayoutConfig,
    Orientation, PageSize, SheetPlan, XlpagerError,
};

#[derive(Parser)]
#[command(name = "xlpager_cli")]
#[command(version)]
#[command(about = "Paginate spreadsheet sheets onto fixed-size pages", long_about = None)]
struct Cli {
    /// Input .xlsx file
    input: PathBuf,

    /// Output file (json) or directory (svg); json goes to stdout if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Layout configuration as JSON; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Paper size for every sheet
    #[arg(long, value_enum)]
    page_size: Option<Paper>,

    /// Rotate pages to landscape
    #[arg(long)]
    landscape: bool,

    /// Ignore each sheet's own pageSetup and pageMargins
    #[arg(long)]
    ignore_sheet_setup: bool,

    /// How trailing rows and columns are paginated
    #[arg(long, value_enum)]
    break_mode: Option<Breaks>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Json)]
    format: Format,

    /// Fail on fonts without known metrics instead of assuming Calibri
    #[arg(long)]
    strict_fonts: bool,

    /// Suppress the per-sheet summary on stderr
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Paper {
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    Letter,
    Legal,
}

impl From<Paper> for PageSize {
    fn from(paper: Paper) -> Self {
        match paper {
            Paper::A0 => PageSize::A0,
            Paper::A1 => PageSize::A1,
            Paper::A2 => PageSize::A2,
            Paper::A3 => PageSize::A3,
            Paper::A4 => PageSize::A4,
            Paper::A5 => PageSize::A5,
            Paper::A6 => PageSize::A6,
            Paper::Letter => PageSize::Letter,
            Paper::Legal => PageSize::Legal,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Breaks {
    Complete,
    Legacy,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Json,
    Svg,
}

fn load_config(cli: &Cli) -> Result<LayoutConfig, XlpagerError> {
    let mut config = match &cli.config {
        Some(path) => LayoutConfig::from_path(path)?,
        None => LayoutConfig::default(),
    };
    if let Some(paper) = cli.page_size {
        config.page_size = Some(paper.into());
    }
    if cli.landscape {
        config.orientation = Some(Orientation::Landscape);
    }
    if cli.ignore_sheet_setup {
        config.ignore_sheet_setup = true;
    }
    if let Some(breaks) = cli.break_mode {
        config.break_mode = match breaks {
            Breaks::Complete => BreakMode::Complete,
            Breaks::Legacy => BreakMode::Legacy,
        };
    }
    config.validate()?;
    Ok(config)
}

fn write_svg_pages(dir: &Path, renderer: SvgRenderer) -> Result<usize, XlpagerError> {
    fs::create_dir_all(dir)?;
    let pages = renderer.into_pages();
    for page in &pages {
        fs::write(dir.join(page.file_name()), &page.svg)?;
    }
    Ok(pages.len())
}

fn summarize(plans: &[SheetPlan]) {
    for plan in plans {
        eprintln!(
            "{}: {} pages, {} issues",
            plan.name,
            plan.pages.len(),
            plan.issues.len()
        );
    }
}

fn run(cli: &Cli) -> Result<(), XlpagerError> {
    let config = load_config(cli)?;
    let metrics = CharWidthMetrics::new().strict_fonts(cli.strict_fonts);
    let workbook = parse_file(&cli.input)?;

    match cli.format {
        Format::Json => {
            let plans = layout_workbook(&workbook, &metrics, &config)?;
            let json = serde_json::to_string_pretty(&plans)?;
            match &cli.output {
                Some(path) => {
                    fs::write(path, &json)?;
                    if !cli.quiet {
                        eprintln!("Written: {}", path.display());
                    }
                }
                None => {
                    let mut stdout = io::stdout().lock();
                    stdout.write_all(json.as_bytes())?;
                    writeln!(stdout)?;
                }
            }
            if !cli.quiet {
                summarize(&plans);
            }
        }
        Format::Svg => {
            let dir = cli.output.clone().unwrap_or_else(|| PathBuf::from("."));
            let mut renderer = SvgRenderer::new();
            let plans = render_workbook(&workbook, &metrics, &config, &mut renderer)?;
            let written = write_svg_pages(&dir, renderer)?;
            if !cli.quiet {
                summarize(&plans);
                eprintln!("Written: {written} pages to {}", dir.display());
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error processing {}: {e}", cli.input.display());
        std::process::exit(1);
    }
}
