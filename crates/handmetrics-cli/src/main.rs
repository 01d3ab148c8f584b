//! `handmetrics-cli` – replay recorded hand detections through the metrics
//! engine.
//!
//! ```text
//! handmetrics [FILE|-]   replay newline-delimited JSON frames (stdin by default)
//! handmetrics init       write ~/.handmetrics/config.toml with defaults
//! handmetrics config     print the effective configuration
//! handmetrics schema     print the JSON Schema of the frame output
//! handmetrics help       show this help
//! ```
//!
//! Frames are written to stdout; logs go to stderr.

mod config;
mod output;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::process::ExitCode;

use colored::Colorize;
use handmetrics_runtime::{FramePipeline, JsonLinesDetector};
use tracing::{error, info};

use crate::output::FramePrinter;

fn main() -> ExitCode {
    let _guard = handmetrics_runtime::init_tracing("handmetrics");

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("help" | "-h" | "--help") => {
            print_help();
            ExitCode::SUCCESS
        }
        Some("init") => init_config(),
        Some("config") => show_config(),
        Some("schema") => {
            let schema = handmetrics_geometry::schema::hand_frame_schema();
            match serde_json::to_string_pretty(&schema) {
                Ok(text) => {
                    println!("{text}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!(error = %e, "failed to render schema");
                    ExitCode::FAILURE
                }
            }
        }
        Some(path) if args.len() == 1 => replay(Some(path)),
        None => replay(None),
        Some(_) => {
            print_help();
            ExitCode::from(2)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

fn replay(path: Option<&str>) -> ExitCode {
    let cfg = match config::effective() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            return ExitCode::FAILURE;
        }
    };

    let (source, reader): (String, Box<dyn BufRead + Send>) = match path {
        None | Some("-") => ("stdin".to_string(), Box::new(BufReader::new(io::stdin()))),
        Some(p) => match File::open(p) {
            Ok(file) => (p.to_string(), Box::new(BufReader::new(file))),
            Err(e) => {
                eprintln!("{}: cannot open {}: {}", "Error".red(), p, e);
                return ExitCode::FAILURE;
            }
        },
    };

    info!(source = %source, output = %cfg.output, side_bend = cfg.side_bend_enabled, "replaying frames");
    let detector = JsonLinesDetector::new(source, reader);
    let mut pipeline = FramePipeline::new(detector, cfg.pipeline_config());
    pipeline.add_annotator(Box::new(FramePrinter::new(io::stdout(), cfg.output)));

    let stats = pipeline.run();
    if stats.detector_errors > 0 || stats.faults > 0 {
        eprintln!(
            "{} {} frame(s), {} hand(s), {} fault(s), {} unreadable frame(s)",
            "done:".yellow(),
            stats.frames,
            stats.hands,
            stats.faults,
            stats.detector_errors
        );
    }
    ExitCode::SUCCESS
}

fn init_config() -> ExitCode {
    let path = config::config_path();
    match config::load() {
        Ok(Some(_)) => {
            println!("  Config already present at {}", path.display().to_string().bold());
            return ExitCode::SUCCESS;
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            return ExitCode::FAILURE;
        }
    }
    match config::save(&config::Config::default()) {
        Ok(()) => {
            println!(
                "  {} Config saved to {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error saving config".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn show_config() -> ExitCode {
    match config::effective() {
        Ok(cfg) => {
            println!("  {}", config::config_path().display().to_string().dimmed());
            println!("  side_bend_enabled               = {}", cfg.side_bend_enabled);
            println!("  bus_capacity                    = {}", cfg.bus_capacity);
            println!("  output                          = {}", cfg.output);
            println!(
                "  max_consecutive_detector_errors = {}",
                cfg.max_consecutive_detector_errors
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!(
        "{} {}",
        "handmetrics".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Per-finger bend, spread and pinch metrics from hand landmarks.");
    println!();
    println!("  {}  replay NDJSON frames (stdin by default)", "handmetrics [FILE|-]".cyan());
    println!("  {}      write a default config file", "handmetrics init".cyan());
    println!("  {}    print the effective configuration", "handmetrics config".cyan());
    println!("  {}    print the output JSON Schema", "handmetrics schema".cyan());
}
