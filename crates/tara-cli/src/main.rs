//! `tara` command-line tool
//!
//! Scores the attack trees of an analysis document, renders them as DOT and
//! shows the active assessment configuration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::EnvFilter;

use tara_config::AssessmentConfig;
use tara_core::{Analysis, RiskEngine};
use tara_export::{DotExporter, DotOptions};

mod report;

fn cli() -> Command {
    Command::new("tara")
        .version(tara_core::VERSION)
        .about("Attack-tree risk and residual-risk assessment")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Assessment configuration (JSON or YAML); built-in reference config if omitted"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)"),
        )
        .subcommand(
            Command::new("assess")
                .about("Score every attack tree (R and RR)")
                .arg(
                    Arg::new("analysis")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Analysis document (JSON)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                )
                .arg(
                    Arg::new("write")
                        .long("write")
                        .action(ArgAction::SetTrue)
                        .help("Write the refreshed document back to its file"),
                ),
        )
        .subcommand(
            Command::new("dot")
                .about("Render attack trees as Graphviz DOT")
                .arg(
                    Arg::new("analysis")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Analysis document (JSON)"),
                )
                .arg(
                    Arg::new("tree")
                        .long("tree")
                        .help("Only render the tree with this id or uid"),
                )
                .arg(
                    Arg::new("residual")
                        .long("residual")
                        .action(ArgAction::SetTrue)
                        .help("Render the residual-risk view"),
                )
                .arg(
                    Arg::new("decimal-separator")
                        .long("decimal-separator")
                        .default_value(",")
                        .value_parser(value_parser!(char))
                        .help("Decimal separator used in labels"),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_parser(value_parser!(PathBuf))
                        .help("Write to a file instead of stdout"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Show the active assessment configuration")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the full configuration as JSON"),
                ),
        )
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<Arc<AssessmentConfig>> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => AssessmentConfig::from_path(path)
            .with_context(|| format!("cannot load configuration {}", path.display()))?,
        None => AssessmentConfig::builtin().context("built-in configuration is invalid")?,
    };
    tracing::info!(
        "Using configuration {} ({})",
        config.version().unwrap_or("-"),
        config.fingerprint().short()
    );
    Ok(Arc::new(config))
}

fn load_analysis(path: &Path) -> Result<Analysis> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Analysis::from_json(&json).with_context(|| format!("invalid analysis {}", path.display()))
}

fn analysis_path(args: &ArgMatches) -> Result<&PathBuf> {
    args.get_one::<PathBuf>("analysis")
        .context("missing analysis document")
}

fn run_assess(engine: &RiskEngine, args: &ArgMatches) -> Result<()> {
    let path = analysis_path(args)?;
    let mut analysis = load_analysis(path)?;
    let rows = engine.assess(&mut analysis);

    if args.get_flag("json") {
        println!("{}", report::assessment_json(&rows)?);
    } else {
        let mut table = String::new();
        report::assessment_table(&mut table, &rows)?;
        print!("{table}");
    }

    if args.get_flag("write") {
        std::fs::write(path, analysis.to_json()?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("Wrote refreshed analysis to {}", path.display());
    }
    Ok(())
}

fn run_dot(engine: &RiskEngine, args: &ArgMatches) -> Result<()> {
    let mut analysis = load_analysis(analysis_path(args)?)?;
    let mut options = DotOptions::default();
    if let Some(tree) = args.get_one::<String>("tree") {
        options = options.tree(tree.clone());
    }
    if let Some(separator) = args.get_one::<char>("decimal-separator") {
        options = options.decimal_separator(*separator);
    }

    let exporter = DotExporter::new(engine, options);
    let rendered = if args.get_flag("residual") {
        exporter.residual_view(&mut analysis)?
    } else {
        exporter.risk_view(&mut analysis)?
    };
    let Some(dot) = rendered else {
        tracing::warn!("Analysis has no attack trees, nothing to render");
        return Ok(());
    };

    match args.get_one::<PathBuf>("output") {
        Some(out) => {
            std::fs::write(out, dot).with_context(|| format!("failed to write {}", out.display()))?;
            tracing::info!("Wrote {}", out.display());
        }
        None => print!("{dot}"),
    }
    Ok(())
}

fn run_config(config: &AssessmentConfig, args: &ArgMatches) -> Result<()> {
    if args.get_flag("json") {
        println!("{}", config.to_json()?);
    } else {
        let mut summary = String::new();
        report::config_summary(&mut summary, config)?;
        print!("{summary}");
    }
    Ok(())
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    let config = load_config(&matches)?;
    let engine = RiskEngine::new(Arc::clone(&config));

    match matches.subcommand() {
        Some(("assess", args)) => run_assess(&engine, args),
        Some(("dot", args)) => run_dot(&engine, args),
        Some(("config", args)) => run_config(&config, args),
        _ => Ok(()),
    }
}
