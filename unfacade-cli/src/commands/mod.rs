pub mod check;
pub mod fix;
pub mod rules;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use unfacade_core::config::UnfacadeConfig;
use unfacade_core::pipeline::{self, RunReport};
use unfacade_core::rules::RuleRegistry;
use unfacade_core::unfacade_graphs::ProjectModel;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report calls to deprecated facade helpers
    Check(check::CheckArgs),
    /// Rewrite calls to deprecated facade helpers in place
    Fix(fix::FixArgs),
    /// List the available rules
    Rules(rules::RulesArgs),
}

/// How a successful command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    Findings,
}

pub fn run(cmd: Command) -> anyhow::Result<Outcome> {
    match cmd {
        Command::Check(args) => check::run(&args),
        Command::Fix(args) => fix::run(&args),
        Command::Rules(args) => rules::run(&args),
    }
}

/// A loaded project and the result of running the enabled rules over it.
#[derive(Debug)]
pub struct Analysis {
    pub root: PathBuf,
    pub model: ProjectModel,
    pub report: RunReport,
}

/// Resolve `path`, load the config, build the model, and run enabled rules.
pub fn analyze(path: &Path, config_path: Option<&Path>) -> anyhow::Result<Analysis> {
    let root = std::fs::canonicalize(path)
        .with_context(|| format!("Cannot resolve path: {}", path.display()))?;

    let config = match config_path {
        Some(p) => UnfacadeConfig::load(p),
        None => UnfacadeConfig::discover(&root),
    }
    .context("Cannot load config")?;

    let model = pipeline::load_project(&root, &config)
        .with_context(|| format!("Cannot load project: {}", root.display()))?;

    let registry = RuleRegistry::new();
    let rules = registry.select(&config.rules.enabled);
    let report = pipeline::analyze_project(&model, &rules);

    Ok(Analysis {
        root,
        model,
        report,
    })
}

/// Print rule errors and turn the first into the command's error.
pub fn fail_on_rule_errors(report: &RunReport) -> anyhow::Result<()> {
    let Some(first) = report.errors.first() else {
        return Ok(());
    };
    for e in &report.errors {
        eprintln!("{}: {}", e.path.display(), e.error);
    }
    Err(anyhow::Error::new(first.error.clone()).context(format!(
        "{} file(s) could not be analyzed",
        report.errors.len()
    )))
}
