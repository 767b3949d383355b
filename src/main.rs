use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tipsheet::config::Config;
use tipsheet::error::Diagnostic;
use tipsheet::import::{
    import_predictions_file, import_results_file, PredictionsImportOptions, ResultsImportOptions,
};
use tipsheet::output;
use tipsheet::scoring::compute_standings;
use tipsheet::table::{load_predictions, load_results};
use tipsheet::text::{normalize_file, TeamNames};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_DIAGNOSTICS: i32 = 1;
const EXIT_FATAL: i32 = 2;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    /// Aligned table, coloured on a terminal
    #[default]
    Table,
    /// Tab-separated values for scripting
    Tsv,
    /// Pretty-printed JSON with per-round tallies
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Rewrite a fixtures template so every match sits on one canonical line
    Normalize {
        /// Template to normalize (rewritten in place unless --output is given)
        text: PathBuf,
        /// Write the normalized text here instead
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Stop at the first unreadable line and leave the file untouched
        #[arg(long)]
        strict: bool,
    },
    /// Merge match results from a text template into the results table
    ImportResults {
        text: PathBuf,
        /// Results table (.csv/.tsv)
        results: Option<PathBuf>,
        /// Round for every fixture in the text
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        round: Option<u32>,
        /// Prefix for generated match ids
        #[arg(long)]
        match_prefix: Option<String>,
        #[arg(long)]
        strict: bool,
    },
    /// Merge user predictions from a text template into the predictions table
    ImportPredictions {
        text: PathBuf,
        /// Results table the predictions are resolved against
        results: Option<PathBuf>,
        /// Predictions table (.csv/.tsv)
        predictions: Option<PathBuf>,
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        round: Option<u32>,
        /// Drop every stored prediction of the users in this text first
        #[arg(long)]
        clear_users: bool,
        /// Attribute the whole text to this user
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        user_id: Option<String>,
        #[arg(long)]
        strict: bool,
    },
    /// Score predictions against results and write the standings report
    Score {
        predictions: Option<PathBuf>,
        results: Option<PathBuf>,
        /// Report path (.xlsx, .csv or .tsv)
        output: Option<PathBuf>,
        /// Worksheet name for .xlsx reports
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Print standings without writing the report file
        #[arg(long)]
        no_report: bool,
    },
    /// Import a round of results (and optionally predictions), then score
    Update {
        /// Results template for the round
        text: PathBuf,
        #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
        round: u32,
        /// Predictions template
        #[arg(long)]
        predictions_text: Option<PathBuf>,
        /// Round for the predictions text (default: rounds from the text, or lookup by teams)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        predictions_round: Option<u32>,
        /// Replace stored predictions of the users in the predictions text
        #[arg(long)]
        clear_predictions: bool,
        #[arg(long)]
        results: Option<PathBuf>,
        #[arg(long)]
        predictions: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        sheet: Option<String>,
        #[arg(long)]
        match_prefix: Option<String>,
    },
}

#[derive(Parser, Debug)]
#[command(name = "tipsheet")]
#[command(about = "Football prediction league scoring from plain-text templates", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to <config dir>/tipsheet/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info,tipsheet=debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let start_time = Instant::now();

    // Load config
    let config = match tipsheet::config::load_config(cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    // Validate config at startup
    if let Err(errors) = tipsheet::config::validate_config(&config) {
        eprintln!("Config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }

    let teams = TeamNames::new(&config.aliases);
    let use_colors = output::should_use_colors();

    let outcome = match cli.command {
        Commands::Normalize {
            text,
            output,
            strict,
        } => run_normalize(&text, output.as_deref(), strict),
        Commands::ImportResults {
            text,
            results,
            round,
            match_prefix,
            strict,
        } => {
            let options = ResultsImportOptions {
                round,
                match_prefix: match_prefix.unwrap_or_else(|| config.match_prefix().to_string()),
                strict,
            };
            let results = results.unwrap_or_else(|| config.results_path());
            run_import_results(&text, &results, &options, &teams, use_colors)
        }
        Commands::ImportPredictions {
            text,
            results,
            predictions,
            round,
            clear_users,
            user,
            user_id,
            strict,
        } => {
            let options = PredictionsImportOptions {
                round,
                clear_users,
                user,
                user_id,
                strict,
            };
            let results = results.unwrap_or_else(|| config.results_path());
            let predictions = predictions.unwrap_or_else(|| config.predictions_path());
            run_import_predictions(&text, &results, &predictions, &options, &teams, use_colors)
        }
        Commands::Score {
            predictions,
            results,
            output,
            sheet,
            format,
            no_report,
        } => {
            let predictions = predictions.unwrap_or_else(|| config.predictions_path());
            let results = results.unwrap_or_else(|| config.results_path());
            let report = if no_report {
                None
            } else {
                Some(output.unwrap_or_else(|| config.report_path()))
            };
            let sheet = sheet.unwrap_or_else(|| config.sheet().to_string());
            run_score(
                &config,
                &predictions,
                &results,
                report.as_deref(),
                &sheet,
                format,
                use_colors,
            )
        }
        Commands::Update {
            text,
            round,
            predictions_text,
            predictions_round,
            clear_predictions,
            results,
            predictions,
            output,
            sheet,
            match_prefix,
        } => {
            let results = results.unwrap_or_else(|| config.results_path());
            let predictions = predictions.unwrap_or_else(|| config.predictions_path());
            let report = output.unwrap_or_else(|| config.report_path());
            let sheet = sheet.unwrap_or_else(|| config.sheet().to_string());
            let results_options = ResultsImportOptions {
                round: Some(round),
                match_prefix: match_prefix.unwrap_or_else(|| config.match_prefix().to_string()),
                strict: false,
            };
            let predictions_options = PredictionsImportOptions {
                round: predictions_round,
                clear_users: clear_predictions,
                ..Default::default()
            };
            run_update(
                &config,
                &text,
                predictions_text.as_deref(),
                &results,
                &predictions,
                &report,
                &sheet,
                &results_options,
                &predictions_options,
                &teams,
                use_colors,
            )
        }
    };

    let diagnostics = match outcome {
        Ok(diagnostics) => diagnostics,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(EXIT_FATAL);
        }
    };

    log::debug!("Finished in {:?}", start_time.elapsed());
    if diagnostics.is_empty() {
        std::process::exit(EXIT_SUCCESS);
    }
    eprintln!();
    eprintln!("{}", output::format_diagnostics(&diagnostics, use_colors));
    std::process::exit(EXIT_DIAGNOSTICS);
}

fn run_normalize(text: &Path, output: Option<&Path>, strict: bool) -> Result<Vec<Diagnostic>> {
    let outcome = normalize_file(text, output, strict)?;
    log::info!(
        "Normalized {} fixtures in {} ({} lines changed)",
        outcome.fixtures,
        output.unwrap_or(text).display(),
        outcome.changed
    );
    Ok(outcome.diagnostics.into_iter().map(Diagnostic::from).collect())
}

fn run_import_results(
    text: &Path,
    results: &Path,
    options: &ResultsImportOptions,
    teams: &TeamNames,
    use_colors: bool,
) -> Result<Vec<Diagnostic>> {
    let report = import_results_file(text, results, options, teams)?;
    log::info!("Saved results to {}", results.display());
    println!(
        "{}",
        output::format_import_summary("results", &report, use_colors)
    );
    Ok(report.diagnostics)
}

fn run_import_predictions(
    text: &Path,
    results: &Path,
    predictions: &Path,
    options: &PredictionsImportOptions,
    teams: &TeamNames,
    use_colors: bool,
) -> Result<Vec<Diagnostic>> {
    let report = import_predictions_file(text, results, predictions, options, teams)?;
    if report.imported > 0 {
        log::info!("Saved predictions to {}", predictions.display());
    }
    println!(
        "{}",
        output::format_import_summary("predictions", &report, use_colors)
    );
    Ok(report.diagnostics)
}

fn run_score(
    config: &Config,
    predictions: &Path,
    results: &Path,
    report: Option<&Path>,
    sheet: &str,
    format: OutputFormat,
    use_colors: bool,
) -> Result<Vec<Diagnostic>> {
    let results_table = load_results(results)?;
    let predictions_table = load_predictions(predictions)?;
    let points = config.scoring.clone().unwrap_or_default().points();
    let standings = compute_standings(&predictions_table, &results_table, &points);
    if standings.pending > 0 {
        log::info!(
            "{} predictions wait for results and were not scored",
            standings.pending
        );
    }

    // Validate the report target before printing anything
    if let Some(path) = report {
        output::ReportFormat::from_path(path)?;
    }

    match format {
        OutputFormat::Table => println!(
            "{}",
            output::format_standings_table(&standings, use_colors)
        ),
        OutputFormat::Tsv => println!("{}", output::format_tsv(&standings)),
        OutputFormat::Json => println!(
            "{}",
            output::format_json(&standings).context("Failed to serialize standings")?
        ),
    }

    if let Some(path) = report {
        output::write_report(path, &standings, sheet)?;
    }
    Ok(standings.diagnostics)
}

#[allow(clippy::too_many_arguments)]
fn run_update(
    config: &Config,
    text: &Path,
    predictions_text: Option<&Path>,
    results: &Path,
    predictions: &Path,
    report: &Path,
    sheet: &str,
    results_options: &ResultsImportOptions,
    predictions_options: &PredictionsImportOptions,
    teams: &TeamNames,
    use_colors: bool,
) -> Result<Vec<Diagnostic>> {
    let mut diagnostics = run_import_results(text, results, results_options, teams, use_colors)?;
    if let Some(predictions_text) = predictions_text {
        diagnostics.extend(run_import_predictions(
            predictions_text,
            results,
            predictions,
            predictions_options,
            teams,
            use_colors,
        )?);
    }
    diagnostics.extend(run_score(
        config,
        predictions,
        results,
        Some(report),
        sheet,
        OutputFormat::Table,
        use_colors,
    )?);
    Ok(diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update_rounds(args: &[&str]) -> (u32, Option<u32>) {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Update {
                round,
                predictions_round,
                ..
            } => (round, predictions_round),
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_update_predictions_round_is_independent() {
        assert_eq!(
            update_rounds(&["tipsheet", "update", "r5.txt", "--round", "5"]),
            (5, None)
        );
        assert_eq!(
            update_rounds(&[
                "tipsheet",
                "update",
                "r5.txt",
                "--round",
                "5",
                "--predictions-text",
                "tips.txt",
                "--predictions-round",
                "6",
            ]),
            (5, Some(6))
        );
        assert!(Cli::try_parse_from([
            "tipsheet",
            "update",
            "r5.txt",
            "-r",
            "5",
            "--predictions-round",
            "0"
        ])
        .is_err());
    }
}
