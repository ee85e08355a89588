use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use unfacade_core::pipeline;

use super::{Outcome, analyze, fail_on_rule_errors};

#[derive(Args, Debug)]
pub struct FixArgs {
    /// Project root (default: current directory)
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Config file (default: <path>/unfacade.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Print a unified diff instead of writing files
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: &FixArgs) -> anyhow::Result<Outcome> {
    let analysis = analyze(&args.path, args.config.as_deref())?;
    let fixes = pipeline::plan_fixes(&analysis.model, &analysis.report)
        .context("Cannot apply fixes")?;

    let applied: usize = fixes.iter().map(|f| f.outcome.applied).sum();
    let deferred: usize = fixes.iter().map(|f| f.outcome.skipped).sum();
    let unfixable = analysis.report.failure_count() - analysis.report.fixable_count();

    if args.dry_run {
        for fix in fixes.iter().filter(|f| f.changed()) {
            print!("{}", fix.unified_diff());
        }
    } else {
        let written = pipeline::write_fixes(&analysis.root, &fixes)
            .context("Cannot write fixed files")?;
        println!("Fixed {applied} call(s) in {written} file(s)");
    }
    if deferred > 0 {
        println!("{deferred} overlapping fix(es) deferred; run `unfacade fix` again");
    }
    if unfixable > 0 {
        println!("{unfixable} call(s) need manual follow-up");
    }

    fail_on_rule_errors(&analysis.report)?;
    Ok(Outcome::Clean)
}
