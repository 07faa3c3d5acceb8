use clap::{Parser, Subcommand};
use jefit_core::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "jefit")]
#[command(about = "Read JEFIT CSV exports into routines, sessions and logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Load configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an export and print its contents
    Parse {
        /// Export file (defaults to the configured input path)
        file: Option<PathBuf>,

        /// Print the parsed export as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        overrides: ParserOverrides,
    },

    /// Parse an export and print collection counts (default)
    Summary {
        /// Export file (defaults to the configured input path)
        file: Option<PathBuf>,

        /// Print the counts as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        overrides: ParserOverrides,
    },
}

#[derive(clap::Args, Default)]
struct ParserOverrides {
    /// Time zone for session start times: local, utc, or +HH:MM
    #[arg(long)]
    timezone: Option<Zone>,

    /// Exercise logs naming unknown sessions: error or drop
    #[arg(long)]
    dangling: Option<DanglingPolicy>,

    /// Fail on rows outside any known section
    #[arg(long)]
    strict: bool,

    /// Accept end of file as the end of the last section
    #[arg(long)]
    allow_eof: bool,
}

impl ParserOverrides {
    fn apply(&self, config: &Config) -> ParserOptions {
        let mut options = ParserOptions::from(&config.parser);
        if let Some(zone) = self.timezone {
            options.timezone = zone;
        }
        if let Some(policy) = self.dangling {
            options.dangling_sessions = policy;
        }
        options.strict_sections |= self.strict;
        options.eof_terminates_section |= self.allow_eof;
        options
    }
}

fn main() {
    // Initialize logging
    jefit_core::logging::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Some(Commands::Parse {
            file,
            json,
            overrides,
        }) => {
            let path = file.unwrap_or_else(|| config.input.default_path.clone());
            cmd_parse(&path, json, overrides.apply(&config))
        }
        Some(Commands::Summary {
            file,
            json,
            overrides,
        }) => {
            let path = file.unwrap_or_else(|| config.input.default_path.clone());
            cmd_summary(&path, json, overrides.apply(&config))
        }
        None => {
            // Default to "summary" of the configured input
            let options = ParserOverrides::default().apply(&config);
            cmd_summary(&config.input.default_path, false, options)
        }
    }
}

fn cmd_parse(path: &Path, json: bool, options: ParserOptions) -> Result<()> {
    let export = ExportParser::new(options).parse_path(path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&export)?);
    } else {
        display_export(&export);
    }
    Ok(())
}

fn cmd_summary(path: &Path, json: bool, options: ParserOptions) -> Result<()> {
    let export = ExportParser::new(options).parse_path(path)?;
    let summary = export.summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", path.display());
        println!("{}", summary);
    }
    Ok(())
}

fn display_export(export: &ParsedExport) {
    match &export.settings {
        Some(settings) => println!("{}", settings),
        None => println!("Mass: (not set)"),
    }

    println!("\n── Routines ──");
    for routine in export.routines.values() {
        print!("{}", export.render_routine(routine));
    }

    let orphans: Vec<_> = export.orphan_sessions().collect();
    if !orphans.is_empty() {
        println!("\n── Sessions without routine ──");
        for session in orphans {
            print!("{}", session);
        }
    }

    println!("\n── Cardio logs ──");
    for cardio in &export.cardio_logs {
        println!("{} ({})", cardio, cardio.date);
    }

    println!("\n── Notes ──");
    for note in &export.notes {
        println!("{} ({})", note, note.date);
    }
}
