mod config;

use anyhow::{Context, bail};
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use config::{ConfigMerger, RunOverrides};
use docfix_alerts::AlertStats;
use docfix_core::adapters::CommandLinter;
use docfix_core::{Fix, Interrupt, Pipeline, ProcessingResult, RuleRegistry, ToolError};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "docfix",
    version,
    about = "Apply safe, classified fixes for Vale findings in AsciiDoc modules."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Lint files and report the fixes that would be made, without changing anything.
    Check(RunArgs),
    /// Lint files and apply fixes in place (originals are backed up first).
    Fix(FixArgs),
    /// List the built-in rules in the order they run.
    ListRules(ListRulesArgs),
}

#[derive(Debug, Parser)]
struct RunArgs {
    /// AsciiDoc files to process.
    #[arg(required = true)]
    files: Vec<Utf8PathBuf>,

    /// Only run this rule (and only report its violations).
    #[arg(long)]
    rule: Option<String>,

    /// Directory the linter runs in; relative paths resolve against it.
    #[arg(long, default_value = ".")]
    working_dir: Utf8PathBuf,

    /// Linter executable (default: vale).
    #[arg(long)]
    linter: Option<String>,

    /// Maximum number of files processed concurrently (capped at 8).
    #[arg(long)]
    max_workers: Option<usize>,

    /// Skip files larger than this many bytes.
    #[arg(long)]
    max_file_bytes: Option<u64>,

    /// Parent directory for per-run backups (default: system temp dir).
    #[arg(long)]
    backup_dir: Option<Utf8PathBuf>,

    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Parser)]
struct FixArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Compute fixes but do not write them.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

#[derive(Debug, Parser)]
struct ListRulesArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.cmd {
        Command::Check(args) => cmd_run(args, true).await,
        Command::Fix(args) => cmd_run(args.run, args.dry_run).await,
        Command::ListRules(args) => cmd_list_rules(args).map(|()| ExitCode::SUCCESS),
    };

    match outcome {
        Ok(code) => code,
        Err(e) => {
            error!("{:?}", e);
            ExitCode::from(1)
        }
    }
}

async fn cmd_run(args: RunArgs, dry_run: bool) -> anyhow::Result<ExitCode> {
    let file_config =
        config::load_or_default(&args.working_dir).context("load docfix.toml config")?;
    let overrides = RunOverrides {
        linter: args.linter.clone(),
        max_workers: args.max_workers,
        max_file_bytes: args.max_file_bytes,
        backup_dir: args.backup_dir.clone(),
    };
    let settings = ConfigMerger::new(file_config).merge_run_args(&args.working_dir, &overrides);
    debug!(?settings, "merged settings");

    let registry = RuleRegistry::with_builtin_rules();
    if let Some(rule) = &args.rule
        && registry.rule(rule).is_none()
    {
        bail!("unknown rule {rule:?} (see `docfix list-rules`)");
    }

    let linter = Arc::new(CommandLinter::from_settings(
        &settings.linter,
        settings.working_dir.clone(),
    ));

    // Ctrl+C stops new files from being modified; in-flight ones finish.
    let interrupt = Interrupt::new();
    let handle = interrupt.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("received Ctrl+C, finishing files in flight");
            handle.trigger();
        }
    });

    let pipeline = Pipeline::new(registry, linter, settings, interrupt);
    let result = pipeline
        .process_files(&args.files, dry_run, args.rule.as_deref())
        .await;

    match args.format {
        OutputFormat::Text => print_text(&result, dry_run),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(match ToolError::check(&result) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    })
}

fn print_text(result: &ProcessingResult, dry_run: bool) {
    let (listed, verb) = if dry_run {
        (&result.fixes_skipped, "would fix")
    } else {
        (&result.fixes_applied, "fixed")
    };
    for fix in listed {
        print_fix(fix, verb);
    }
    if !dry_run {
        for fix in &result.fixes_skipped {
            print_fix(fix, "skipped");
        }
    }

    let summary = result.summary();
    println!();
    println!(
        "{} violation(s) in {} file(s); {} fix(es) applied, {} skipped, {} need review; {} file(s) modified",
        summary.violations,
        summary.files_processed,
        summary.fixes_applied,
        summary.fixes_skipped,
        summary.review_required,
        summary.files_modified,
    );

    for (fix_type, count) in result.fix_type_counts() {
        println!("  {:<24} {}", fix_type.as_str(), count);
    }

    let stats = AlertStats::from_violations(&result.violations);
    let top = stats.most_common_rules(5);
    if !top.is_empty() {
        let rendered: Vec<String> = top.iter().map(|(rule, n)| format!("{rule} ({n})")).collect();
        println!("Most common: {}", rendered.join(", "));
    }

    if let Some(dir) = &result.backup_dir {
        println!("Backups: {dir}");
    }
    if result.interrupted {
        println!("Interrupted: some files were not processed.");
    }
    for err in &result.errors {
        println!("error: {err}");
    }
}

fn print_fix(fix: &Fix, verb: &str) {
    let v = &fix.violation;
    let review = if fix.requires_review { " (review)" } else { "" };
    println!(
        "{}:{}:{}: {} {}{}: {}",
        v.file,
        v.line,
        v.column,
        verb,
        v.rule_name,
        review,
        fix.description.as_deref().unwrap_or(fix.replacement.as_str()),
    );
}

fn cmd_list_rules(args: ListRulesArgs) -> anyhow::Result<()> {
    let registry = RuleRegistry::with_builtin_rules();
    let rules = registry.rules_in_dependency_order();

    match args.format {
        OutputFormat::Text => {
            println!("Rules in run order:\n");
            println!("  {:<18} {:<24} DEPENDS ON", "NAME", "FIX TYPE");
            println!("  {:<18} {:<24} ----------", "----", "--------");
            for rule in &rules {
                println!(
                    "  {:<18} {:<24} {}",
                    rule.name(),
                    rule.fix_type().as_str(),
                    rule.dependencies().join(", ")
                );
            }
        }
        OutputFormat::Json => {
            let rules: Vec<_> = rules
                .iter()
                .map(|r| {
                    serde_json::json!({
                        "name": r.name(),
                        "fix_type": r.fix_type(),
                        "automatic": r.fix_type().is_automatic(),
                        "dependencies": r.dependencies(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
    }
    Ok(())
}
