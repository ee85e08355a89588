// Integration test utilities and fixture management for unfacade.

use std::path::Path;

use unfacade_core::config::UnfacadeConfig;
use unfacade_core::pipeline::{self, RunReport};
use unfacade_core::rules::RuleRegistry;
use unfacade_graphs::ProjectModel;

/// `facade/src/lang.ts` as shipped by the legacy framework.
pub const FACADE_LANG: &str = "\
export function isPresent(obj: any): boolean {
  return obj !== undefined && obj !== null;
}

export function isBlank(obj: any): boolean {
  return obj === undefined || obj === null;
}
";

/// `facade/src/collection.ts` as shipped by the legacy framework.
pub const FACADE_COLLECTION: &str = "\
export class StringMapWrapper {
  static create(): {[k: string]: any} { return {}; }
  static contains(map: {[key: string]: any}, key: string): boolean { return map.hasOwnProperty(key); }
  static keys(map: {[key: string]: any}): string[] { return Object.keys(map); }
  static values<T>(map: {[key: string]: T}): T[] { return Object.keys(map).map((k: string): T => map[k]); }
  static isEmpty(map: {[key: string]: any}): boolean { return Object.keys(map).length === 0; }
  static forEach<V>(map: {[key: string]: V}, callback: (v: V, k: string) => void) {
    Object.keys(map).forEach(k => callback(map[k], k));
  }
}
";

/// A temporary TypeScript project with the facade modules under
/// `modules/@angular/facade/src`.
#[derive(Debug)]
pub struct TestProject {
    pub dir: tempfile::TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create tempdir");
        let project = Self { dir };
        project.write("modules/@angular/facade/src/lang.ts", FACADE_LANG);
        project.write("modules/@angular/facade/src/collection.ts", FACADE_COLLECTION);
        project
    }

    /// A project with one user file.
    pub fn with_file(path: &str, source: &str) -> Self {
        let project = Self::new();
        project.write(path, source);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `source` to `path` (relative to the project root).
    pub fn write(&self, path: &str, source: &str) {
        let full = self.dir.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        std::fs::write(full, source).expect("write fixture file");
    }

    pub fn read(&self, path: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(path)).expect("read fixture file")
    }

    /// Load the project with the config found in its root (or defaults).
    pub fn load(&self) -> anyhow::Result<(ProjectModel, UnfacadeConfig)> {
        let config = UnfacadeConfig::discover(self.path())?;
        let model = pipeline::load_project(self.path(), &config)?;
        Ok((model, config))
    }

    /// Run every enabled rule.
    pub fn analyze(&self) -> anyhow::Result<(ProjectModel, RunReport)> {
        let (model, config) = self.load()?;
        let registry = RuleRegistry::new();
        let rules = registry.select(&config.rules.enabled);
        let report = pipeline::analyze_project(&model, &rules);
        Ok((model, report))
    }

    /// Apply every non-conflicting fix, write the files back, and return the
    /// new text of `path`.
    pub fn fix(&self, path: &str) -> anyhow::Result<String> {
        let (model, report) = self.analyze()?;
        let fixes = pipeline::plan_fixes(&model, &report)?;
        pipeline::write_fixes(self.path(), &fixes)?;
        Ok(self.read(path))
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
