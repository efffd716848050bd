//! Command-line interface for the vdmcheck counterexample search.

use clap::{Parser, Subcommand, ValueEnum};
use miette::{Diagnostic, NamedSource, SourceSpan};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vdmcheck_eval::{Interpreter, DEFAULT_STEP_LIMIT};
use vdmcheck_qc::{
    check_all, collect_type_binds, describe, ObligationReport, SearchConfig, SearchOutcome,
    Strategy,
};
use vdmcheck_syntax::{pretty_print_expr, ObligationSet, TypeEnv};

/// CLI error with source context for pretty printing.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("failed to read file: {message}")]
    IoError { message: String },

    #[error("invalid obligation file: {message}")]
    #[diagnostic(code(vdmcheck::decode_error))]
    DecodeError {
        message: String,
        #[source_code]
        src: NamedSource<Arc<String>>,
        #[label("here")]
        span: SourceSpan,
    },

    #[error("type definitions: {message}")]
    #[diagnostic(code(vdmcheck::type_env))]
    TypeEnvError { message: String },

    #[error("{message}")]
    Other { message: String },
}

impl CliError {
    fn from_decode_error(e: serde_json::Error, source: Arc<String>, filename: &str) -> Self {
        let offset = byte_offset(&source, e.line(), e.column());
        CliError::DecodeError {
            message: e.to_string(),
            src: NamedSource::new(filename, source),
            span: (offset, 0).into(),
        }
    }
}

/// Byte offset of a 1-based line/column position, clamped to the source.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}

type CliResult<T> = Result<T, CliError>;

const LONG_VERSION: &str = env!("VDMCHECK_LONG_VERSION");

#[derive(Parser)]
#[command(name = "vdmcheck", version, long_version = LONG_VERSION)]
#[command(about = "Counterexample search for VDM proof obligations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StrategyArg {
    Fixed,
    Random,
    #[value(alias = "exhaustive", alias = "finite")]
    ExhaustiveBounded,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Fixed => Strategy::Fixed,
            StrategyArg::Random => Strategy::Random,
            StrategyArg::ExhaustiveBounded => Strategy::ExhaustiveBounded,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search every obligation in a JSON file for counterexamples
    Check {
        /// Input file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Value generation strategy
        #[arg(long, value_enum, default_value = "fixed")]
        strategy: StrategyArg,

        /// Values sampled per type bind
        #[arg(long, default_value = "10")]
        budget: usize,

        /// Seed for the random strategy
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Maximum candidate bindings per obligation
        #[arg(long, default_value = "1000")]
        max_trials: usize,

        /// Wall-clock limit per obligation, in seconds
        #[arg(long, value_name = "SECS")]
        time_limit: Option<f64>,

        /// Evaluation steps allowed per candidate
        #[arg(long, default_value_t = DEFAULT_STEP_LIMIT)]
        step_limit: u64,

        /// Disable parallel search
        #[arg(long)]
        no_parallel: bool,

        /// Number of threads for parallel search (0 = use all available)
        #[arg(long, default_value = "0")]
        threads: usize,

        /// Print results as JSON
        #[arg(long)]
        json: bool,

        /// Show verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show the value range each type bind is sampled from
    Describe {
        /// Input file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() {
    // Install miette's fancy error handler
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    let cli = Cli::parse();

    // Initialize logging
    let filter = if matches!(&cli.command, Commands::Check { verbose: true, .. }) {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Check {
            file,
            strategy,
            budget,
            seed,
            max_trials,
            time_limit,
            step_limit,
            no_parallel,
            threads,
            json,
            verbose: _,
        } => {
            let mut config = SearchConfig::default()
                .with_strategy(strategy.into())
                .with_budget(budget)
                .with_seed(seed)
                .with_max_trials(max_trials)
                .with_parallel(!no_parallel);
            config.num_threads = threads;
            match time_limit.map(Duration::try_from_secs_f64).transpose() {
                Ok(limit) => {
                    config.time_limit = limit;
                    cmd_check(&file, &config, step_limit, json)
                }
                Err(e) => Err(CliError::Other {
                    message: format!("invalid --time-limit: {}", e),
                }),
            }
        }
        Commands::Describe { file } => cmd_describe(&file).map(|()| false),
    };

    match result {
        Ok(false) => {}
        Ok(true) => std::process::exit(2),
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            std::process::exit(1);
        }
    }
}

fn load(file: &PathBuf) -> CliResult<(ObligationSet, TypeEnv)> {
    let filename = file.display().to_string();
    let source = Arc::new(fs::read_to_string(file).map_err(|e| CliError::IoError {
        message: e.to_string(),
    })?);

    let set: ObligationSet = serde_json::from_str(&source)
        .map_err(|e| CliError::from_decode_error(e, source.clone(), &filename))?;
    let env = set.type_env().map_err(|e| CliError::TypeEnvError {
        message: e.to_string(),
    })?;
    Ok((set, env))
}

/// Returns whether any obligation was disproved.
fn cmd_check(
    file: &PathBuf,
    config: &SearchConfig,
    step_limit: u64,
    json: bool,
) -> CliResult<bool> {
    info!("loading...");
    let (set, env) = load(file)?;
    let interpreter = Interpreter::new(&env).with_step_limit(step_limit);

    info!(
        obligations = set.obligations.len(),
        strategy = %config.strategy,
        "searching..."
    );
    let start = Instant::now();
    let reports = check_all(&set.obligations, &env, &interpreter, config);
    let elapsed = start.elapsed();

    let disproved = reports
        .iter()
        .any(|r| matches!(&r.outcome, Ok(o) if o.is_disproved()));

    if json {
        let lines: Vec<ReportLine> = reports.iter().map(ReportLine::from).collect();
        let text = serde_json::to_string_pretty(&lines).map_err(|e| CliError::Other {
            message: e.to_string(),
        })?;
        println!("{}", text);
        return Ok(disproved);
    }

    let mut counts = [0usize; 5];
    for report in &reports {
        let line = ReportLine::from(report);
        let slot = match line.status {
            "PROVABLE" => 0,
            "FAILED" => 1,
            "MAYBE" => 2,
            "UNCHECKED" => 3,
            _ => 4,
        };
        counts[slot] += 1;
        println!("{}", line.render());
    }

    println!();
    println!(
        "Result: {} obligations, {} provable, {} failed, {} maybe, {} unchecked, {} errors",
        reports.len(),
        counts[0],
        counts[1],
        counts[2],
        counts[3],
        counts[4]
    );
    println!("  Time: {:.2}s", elapsed.as_secs_f64());
    Ok(disproved)
}

fn cmd_describe(file: &PathBuf) -> CliResult<()> {
    let (set, env) = load(file)?;
    for po in &set.obligations {
        println!("{}: {}", po.name, pretty_print_expr(&po.predicate));
        for bind in collect_type_binds(&po.predicate) {
            println!(
                "  {}:{} in set {}",
                bind.pattern,
                bind.ty,
                describe(&env, &bind.ty)
            );
        }
    }
    Ok(())
}

/// One obligation's result, as printed.
#[derive(Debug, Serialize)]
struct ReportLine {
    name: String,
    kind: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    binding: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    facts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    trials: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    skipped: Option<usize>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    timed_out: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    elapsed_ms: u128,
}

impl From<&ObligationReport> for ReportLine {
    fn from(report: &ObligationReport) -> Self {
        let mut line = ReportLine {
            name: report.name.clone(),
            kind: report.kind.clone(),
            status: "ERROR",
            binding: Vec::new(),
            facts: Vec::new(),
            trials: None,
            skipped: None,
            timed_out: false,
            message: None,
            elapsed_ms: report.elapsed.as_millis(),
        };
        match &report.outcome {
            Ok(outcome) => {
                line.status = outcome.status();
                match outcome {
                    SearchOutcome::Proved(proof) => line.facts = proof.facts.clone(),
                    SearchOutcome::Disproved { binding } => {
                        line.binding = binding
                            .iter()
                            .map(|(name, value)| (name.clone(), value.to_string()))
                            .collect();
                    }
                    SearchOutcome::Inconclusive { reason } => line.message = Some(reason.clone()),
                    SearchOutcome::Undetermined {
                        trials,
                        skipped,
                        timed_out,
                    } => {
                        line.trials = Some(*trials);
                        line.skipped = Some(*skipped);
                        line.timed_out = *timed_out;
                    }
                }
            }
            Err(e) => line.message = Some(e.to_string()),
        }
        line
    }
}

impl ReportLine {
    fn render(&self) -> String {
        let title = if self.kind.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.kind)
        };
        let detail = match self.status {
            "PROVABLE" if !self.facts.is_empty() => format!("by {}", self.facts.join(", ")),
            "FAILED" => self
                .binding
                .iter()
                .map(|(name, value)| format!("{} = {}", name, value))
                .collect::<Vec<_>>()
                .join(", "),
            "MAYBE" => {
                let mut s = format!(
                    "{} trials, {} skipped",
                    self.trials.unwrap_or(0),
                    self.skipped.unwrap_or(0)
                );
                if self.timed_out {
                    s.push_str(", timed out");
                }
                s
            }
            _ => self.message.clone().unwrap_or_default(),
        };
        if detail.is_empty() {
            format!("{:<9} {}", self.status, title)
        } else {
            format!("{:<9} {}: {}", self.status, title, detail)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_offset() {
        let src = "{\n  \"a\": 1,\n  oops\n}";
        assert_eq!(byte_offset(src, 1, 1), 0);
        assert_eq!(byte_offset(src, 3, 3), 15);
        assert_eq!(byte_offset(src, 99, 1), src.len());
    }

    #[test]
    fn test_render_lines() {
        let line = ReportLine {
            name: "f".into(),
            kind: "subtype".into(),
            status: "FAILED",
            binding: vec![("x".into(), "5".into()), ("y".into(), "true".into())],
            facts: Vec::new(),
            trials: None,
            skipped: None,
            timed_out: false,
            message: None,
            elapsed_ms: 0,
        };
        assert_eq!(line.render(), "FAILED    f (subtype): x = 5, y = true");

        let maybe = ReportLine {
            name: "g".into(),
            kind: String::new(),
            status: "MAYBE",
            binding: Vec::new(),
            facts: Vec::new(),
            trials: Some(10),
            skipped: Some(1),
            timed_out: true,
            message: None,
            elapsed_ms: 0,
        };
        assert_eq!(maybe.render(), "MAYBE     g: 10 trials, 1 skipped, timed out");
    }

    #[test]
    fn test_strategy_aliases() {
        assert!(matches!(
            StrategyArg::from_str("finite", true),
            Ok(StrategyArg::ExhaustiveBounded)
        ));
        assert_eq!(Strategy::from(StrategyArg::Random), Strategy::Random);
    }
}
