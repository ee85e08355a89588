use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, ValueEnum};
use unfacade_core::report::line_col;

use super::{Analysis, Outcome, analyze, fail_on_rule_errors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Project root (default: current directory)
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Config file (default: <path>/unfacade.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub fn run(args: &CheckArgs) -> anyhow::Result<Outcome> {
    let analysis = analyze(&args.path, args.config.as_deref())?;

    match args.format {
        OutputFormat::Text => print_text(&analysis),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&analysis.report)
                .context("Cannot serialize report")?;
            println!("{json}");
        }
    }

    fail_on_rule_errors(&analysis.report)?;
    if analysis.report.failure_count() == 0 {
        Ok(Outcome::Clean)
    } else {
        Ok(Outcome::Findings)
    }
}

fn print_text(analysis: &Analysis) {
    let report = &analysis.report;
    for file_report in &report.files {
        let source = analysis
            .model
            .project()
            .file(&file_report.path)
            .map_or("", |f| f.source.as_str());
        for failure in &file_report.failures {
            let (line, col) = line_col(source, failure.start);
            let marker = if failure.is_fixable() { " (fixable)" } else { "" };
            println!(
                "{}:{line}:{col} {}: {}{marker}",
                failure.file.display(),
                failure.rule,
                failure.message
            );
        }
    }

    let total = report.failure_count();
    if total > 0 {
        println!(
            "\n{total} facade call(s) in {} file(s), {} fixable",
            report.files.len(),
            report.fixable_count()
        );
    }
}
