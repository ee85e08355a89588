use anyhow::Context;
use clap::Args;
use unfacade_core::rules::RuleRegistry;

use super::Outcome;

#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Print rule metadata as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &RulesArgs) -> anyhow::Result<Outcome> {
    let registry = RuleRegistry::new();

    if args.json {
        let metas: Vec<_> = registry.iter().map(|r| r.meta()).collect();
        let json = serde_json::to_string_pretty(&metas).context("Cannot serialize rules")?;
        println!("{json}");
        return Ok(Outcome::Clean);
    }

    for rule in registry.iter() {
        let meta = rule.meta();
        let fixable = if meta.fixable { "fixable" } else { "" };
        println!(
            "{:<20} {:<16} {:<8} {}",
            meta.name,
            format!("{:?}", meta.rule_type).to_lowercase(),
            fixable,
            meta.description
        );
    }
    Ok(Outcome::Clean)
}
