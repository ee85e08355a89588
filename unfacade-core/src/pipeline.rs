// Per-file and per-project analysis.
//
// A run loads every configured source file into one `ProjectModel`, then
// checks each file independently (in parallel) with the enabled rules.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Serialize, Serializer};
use tracing::{debug, error, info, instrument, warn};
use unfacade_graphs::{LanguageRegistry, Project, ProjectModel, SemanticModel, SourceFile};

use crate::config::{FilesSection, UnfacadeConfig};
use crate::edit::{FixOutcome, apply_fixes};
use crate::error::{EditError, Result, RuleError};
use crate::matcher::walk_calls;
use crate::report::RewriteFailure;
use crate::rules::{Rule, RuleContext};

/// Appended to a failure whose fix would rewrite another reported call.
pub const NESTED_FIX_WITHHELD: &str = "nested facade call; fix withheld";

/// Failures found in one file, in source order.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub failures: Vec<RewriteFailure>,
}

/// A file whose analysis stopped on a rule error.
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub path: PathBuf,
    #[serde(serialize_with = "display")]
    pub error: RuleError,
}

fn display<S: Serializer>(error: &RuleError, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Outcome of one analysis run, ordered by file path.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub files: Vec<FileReport>,
    pub errors: Vec<FileError>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &RewriteFailure> {
        self.files.iter().flat_map(|f| f.failures.iter())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn fixable_count(&self) -> usize {
        self.failures().filter(|f| f.is_fixable()).count()
    }
}

/// Read every file under `root` selected by the include/exclude globs.
///
/// Returned paths are relative to `root`, sorted.
pub fn collect_sources(root: &Path, files: &FilesSection) -> Result<Vec<(PathBuf, String)>> {
    let excludes: Vec<glob::Pattern> = files
        .exclude
        .iter()
        .filter_map(|p| glob::Pattern::new(p).ok())
        .collect();

    let mut matched = Vec::new();
    for pattern in &files.include {
        let full_pattern = root.join(pattern).to_string_lossy().to_string();
        match glob::glob(&full_pattern) {
            Ok(paths) => {
                for entry in paths.flatten() {
                    let relative = entry.strip_prefix(root).unwrap_or(&entry).to_path_buf();
                    if entry.is_file() && !is_excluded(&relative, &excludes) {
                        matched.push(relative);
                    }
                }
            }
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Invalid glob pattern");
            }
        }
    }
    matched.sort();
    matched.dedup();

    matched
        .into_iter()
        .map(|relative| -> Result<(PathBuf, String)> {
            let source = std::fs::read_to_string(root.join(&relative))?;
            Ok((relative, source))
        })
        .collect()
}

fn is_excluded(relative: &Path, excludes: &[glob::Pattern]) -> bool {
    excludes.iter().any(|p| p.matches_path(relative))
}

/// Parse the configured sources under `root` and build the semantic model.
#[instrument(skip_all, name = "load_project")]
pub fn load_project(root: &Path, config: &UnfacadeConfig) -> Result<ProjectModel> {
    let sources = collect_sources(root, &config.files)?;
    info!(root = %root.display(), files = sources.len(), "Loading project");
    let project = Project::parse_all(&LanguageRegistry::new(), sources)?;
    Ok(ProjectModel::new(project))
}

/// Run `rules` over every call expression in `file`.
pub fn analyze_file(
    model: &dyn SemanticModel,
    file: &SourceFile,
    rules: &[&dyn Rule],
) -> std::result::Result<Vec<RewriteFailure>, RuleError> {
    let ctx = RuleContext::new(model, file);
    let mut failures = Vec::new();
    walk_calls(file.tree.root_node(), |call| {
        for rule in rules {
            if let Some(failure) = rule.check_call(&ctx, call)? {
                debug!(
                    rule = %failure.rule,
                    file = %file.path.display(),
                    start = failure.start,
                    "Facade call found"
                );
                failures.push(failure);
            }
        }
        Ok::<_, RuleError>(())
    })?;

    withhold_nested_fixes(&mut failures);
    failures.sort_by_key(|f| (f.start, f.width));
    Ok(failures)
}

/// Drop the fix of any failure that would rewrite another reported call
/// nested inside it.
fn withhold_nested_fixes(failures: &mut [RewriteFailure]) {
    let spans: Vec<(usize, usize)> = failures.iter().map(|f| (f.start, f.end())).collect();
    for failure in failures.iter_mut() {
        let Some(fix) = &failure.fix else {
            continue;
        };
        let own = (failure.start, failure.end());
        let nested = spans.iter().any(|&(start, end)| {
            (start, end) != own && own.0 <= start && end <= own.1 && fix.touches(start, end)
        });
        if nested {
            warn!(
                rule = %failure.rule,
                file = %failure.file.display(),
                start = failure.start,
                "Fix rewrites a nested facade call; withholding it"
            );
            failure.withhold_fix(NESTED_FIX_WITHHELD);
        }
    }
}

/// Analyze every file of the model in parallel.
#[instrument(skip_all, name = "analyze_project")]
pub fn analyze_project(model: &ProjectModel, rules: &[&dyn Rule]) -> RunReport {
    let results: Vec<_> = model
        .project()
        .files()
        .par_iter()
        .map(|file| (file.path.clone(), analyze_file(model, file, rules)))
        .collect();

    let mut report = RunReport::default();
    for (path, result) in results {
        match result {
            Ok(failures) if failures.is_empty() => {}
            Ok(failures) => report.files.push(FileReport { path, failures }),
            Err(e) => {
                error!(file = %path.display(), error = %e, "Rule error; file skipped");
                report.errors.push(FileError { path, error: e });
            }
        }
    }

    info!(
        files = model.project().len(),
        failures = report.failure_count(),
        fixable = report.fixable_count(),
        errors = report.errors.len(),
        "Analysis complete"
    );
    report
}

/// The rewritten text of one file.
#[derive(Debug, Clone)]
pub struct FileFix {
    pub path: PathBuf,
    pub original: String,
    pub outcome: FixOutcome,
}

impl FileFix {
    pub fn changed(&self) -> bool {
        self.outcome.output != self.original
    }

    /// Unified diff from the original to the fixed text.
    pub fn unified_diff(&self) -> String {
        let name = self.path.display().to_string();
        similar::TextDiff::from_lines(&self.original, &self.outcome.output)
            .unified_diff()
            .context_radius(3)
            .header(&format!("a/{name}"), &format!("b/{name}"))
            .to_string()
    }
}

/// Apply each file's non-conflicting fixes in memory.
pub fn plan_fixes(
    model: &ProjectModel,
    report: &RunReport,
) -> std::result::Result<Vec<FileFix>, EditError> {
    let mut planned = Vec::new();
    for file_report in &report.files {
        let Some(file) = model.project().file(&file_report.path) else {
            continue;
        };
        let outcome = apply_fixes(
            &file.source,
            file_report.failures.iter().filter_map(|f| f.fix.as_ref()),
        )?;
        if outcome.skipped > 0 {
            debug!(
                file = %file.path.display(),
                skipped = outcome.skipped,
                "Conflicting fixes left for a later run"
            );
        }
        planned.push(FileFix {
            path: file.path.clone(),
            original: file.source.clone(),
            outcome,
        });
    }
    Ok(planned)
}

/// Write every changed file back under `root`. Returns the number written.
#[instrument(skip_all, name = "write_fixes")]
pub fn write_fixes(root: &Path, fixes: &[FileFix]) -> Result<usize> {
    let mut written = 0;
    for fix in fixes.iter().filter(|f| f.changed()) {
        std::fs::write(root.join(&fix.path), &fix.outcome.output)?;
        written += 1;
    }
    info!(written, "Fixes written");
    Ok(written)
}
