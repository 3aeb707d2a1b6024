// curricheck - curriculum workbook audits from the command line

mod audit;
mod exit_codes;
mod report;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use audit::RulesCommands;
use exit_codes::{EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "curricheck")]
#[command(about = "Audit curriculum-planning workbooks against their subject registry")]
#[command(version)]
struct Cli {
    /// Log engine decisions (sheet classification, skipped sheets) to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a workbook document and print the grouped issue report
    #[command(after_help = "\
Examples:
  curricheck run plan.json
  curricheck run plan.json --rules school.rules.toml
  curricheck run plan.json --json
  curricheck run plan.json --output report.json
  curricheck run plan.json --sheet \"2025학년도 입학생\"

Exit codes:
  0  no issues
  3  issues found
  4  rule set error
  5  workbook input error")]
    Run {
        /// Path to the workbook document (JSON)
        workbook: PathBuf,

        /// Rule set TOML (defaults to the built-in rules)
        #[arg(long, env = "CURRICHECK_RULES")]
        rules: Option<PathBuf>,

        /// Output the JSON report to stdout instead of the human report
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print only this sheet's section
        #[arg(long)]
        sheet: Option<String>,
    },

    /// Inspect or validate rule sets
    #[command(subcommand)]
    Rules(RulesCommands),
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // stdout carries the report; logs go to stderr.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            workbook,
            rules,
            json,
            output,
            sheet,
        } => audit::cmd_run(workbook, rules, json, output, sheet),
        Commands::Rules(cmd) => audit::cmd_rules(cmd),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
