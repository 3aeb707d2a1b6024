//! `curricheck run` and `curricheck rules`: workbook audits and rule sets.

use std::io::Write;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use curricheck_rules::{AuditConfig, RawWorkbook};

use crate::exit_codes::{audit_exit_code, EXIT_AUDIT_INPUT, EXIT_AUDIT_ISSUES, EXIT_AUDIT_RULES, EXIT_ERROR};
use crate::report;
use crate::CliError;

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Parse and validate a rule set without running an audit
    #[command(after_help = "\
Examples:
  curricheck rules check school.rules.toml")]
    Check {
        /// Path to the rule set TOML file
        rules: PathBuf,
    },

    /// Print the built-in rule set as TOML
    #[command(after_help = "\
Examples:
  curricheck rules defaults > school.rules.toml")]
    Defaults,
}

fn audit_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

fn engine_err(err: curricheck_rules::AuditError) -> CliError {
    audit_err(audit_exit_code(&err), err.to_string())
}

fn load_rules(path: Option<&Path>) -> Result<AuditConfig, CliError> {
    let Some(path) = path else {
        log::debug!("no rule set given, using built-in rules");
        return Ok(AuditConfig::default());
    };
    log::debug!("loading rule set {}", path.display());
    let text = std::fs::read_to_string(path).map_err(|e| {
        audit_err(EXIT_AUDIT_RULES, format!("cannot read rule set {}: {e}", path.display()))
    })?;
    AuditConfig::from_toml(&text).map_err(engine_err)
}

fn load_workbook(path: &Path) -> Result<RawWorkbook, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        audit_err(EXIT_AUDIT_INPUT, format!("cannot read workbook {}: {e}", path.display()))
    })?;
    log::debug!("read workbook {} ({} bytes)", path.display(), text.len());
    RawWorkbook::from_json(&text).map_err(|e| {
        engine_err(e).with_hint("expected a workbook document: {\"sheets\": [{\"name\", \"cells\", ...}]}")
    })
}

fn print_stdout(text: &str) -> Result<(), CliError> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .and_then(|_| handle.flush())
        .map_err(|e| audit_err(EXIT_ERROR, e.to_string()))
}

pub fn cmd_run(
    workbook_path: PathBuf,
    rules_path: Option<PathBuf>,
    json_output: bool,
    output_file: Option<PathBuf>,
    sheet: Option<String>,
) -> Result<(), CliError> {
    let config = load_rules(rules_path.as_deref())?;
    let raw = load_workbook(&workbook_path)?;

    let result = curricheck_rules::run(&config, &raw).map_err(engine_err)?;
    let grouped = result.grouped();

    if let Some(ref name) = sheet {
        if !result.sheets.iter().any(|s| &s.name == name) {
            let known: Vec<&str> = result.sheets.iter().map(|s| s.name.as_str()).collect();
            return Err(CliError::args(format!("no sheet named \"{name}\" was checked"))
                .with_hint(format!("checked sheets: {}", known.join(", "))));
        }
    }

    if json_output || output_file.is_some() {
        let json_str = serde_json::to_string_pretty(&result)
            .map_err(|e| audit_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = output_file {
            std::fs::write(path, &json_str)
                .map_err(|e| audit_err(EXIT_ERROR, format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }
        if json_output {
            print_stdout(&format!("{json_str}\n"))?;
        }
    }

    if !json_output {
        print_stdout(&report::render(&result, &grouped, sheet.as_deref()))?;
    }

    let total = result.summary.total_issues;
    if total > 0 {
        return Err(audit_err(EXIT_AUDIT_ISSUES, format!("{total} issue(s) found")));
    }
    Ok(())
}

pub fn cmd_rules(cmd: RulesCommands) -> Result<(), CliError> {
    match cmd {
        RulesCommands::Check { rules } => {
            let config = load_rules(Some(&rules))?;
            eprintln!(
                "ok: rule set \"{}\" ({} cohort pattern(s), similarity threshold {})",
                config.name,
                config.cohorts.len(),
                config.similarity_threshold
            );
            Ok(())
        }
        RulesCommands::Defaults => {
            let toml = AuditConfig::default().to_toml().map_err(engine_err)?;
            print_stdout(&toml)
        }
    }
}
