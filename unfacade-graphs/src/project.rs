// The set of parsed source files one analysis run works on.
//
// Paths are kept exactly as given (normally relative to the project root) so
// that declaration sites and module specifiers compare lexically.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::languages::{LanguageRegistry, LanguageSupport};
use crate::{GraphError, Result};

/// One parsed source file. Immutable for the lifetime of an analysis pass.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    pub tree: tree_sitter::Tree,
    pub language: Arc<dyn LanguageSupport>,
}

impl SourceFile {
    /// Parse `source` with the language registered for the path's extension.
    pub fn parse(registry: &LanguageRegistry, path: PathBuf, source: String) -> Result<Self> {
        let language = registry
            .for_file(&path)
            .ok_or_else(|| GraphError::UnsupportedLanguage(path.display().to_string()))?;
        let tree = language.parse(&source, &path)?;
        Ok(Self {
            path,
            source,
            tree,
            language,
        })
    }

    /// Source text covered by a node of this file's tree.
    pub fn text(&self, node: tree_sitter::Node<'_>) -> &str {
        &self.source[node.byte_range()]
    }
}

/// All files of a project, ordered by path.
#[derive(Debug, Default)]
pub struct Project {
    files: Vec<SourceFile>,
    index: HashMap<PathBuf, usize>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every `(path, source)` pair in parallel.
    pub fn parse_all(registry: &LanguageRegistry, sources: Vec<(PathBuf, String)>) -> Result<Self> {
        let parsed: Vec<SourceFile> = sources
            .into_par_iter()
            .map(|(path, source)| SourceFile::parse(registry, path, source))
            .collect::<Result<_>>()?;

        let mut project = Self::new();
        for file in parsed {
            project.insert(file);
        }
        debug!(files = project.len(), "Project parsed");
        Ok(project)
    }

    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.index.get(path).map(|&i| &self.files[i])
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn insert(&mut self, file: SourceFile) {
        if let Some(&i) = self.index.get(&file.path) {
            self.files[i] = file;
            return;
        }
        let pos = self.files.partition_point(|f| f.path < file.path);
        self.files.insert(pos, file);
        self.index = self
            .files
            .iter()
            .enumerate()
            .map(|(i, f)| (f.path.clone(), i))
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_are_kept_in_path_order() {
        let reg = LanguageRegistry::new();
        let project = Project::parse_all(
            &reg,
            vec![
                (PathBuf::from("src/b.ts"), "export const b = 1;".to_string()),
                (PathBuf::from("src/a.ts"), "export const a = 1;".to_string()),
            ],
        )
        .unwrap();

        let paths: Vec<_> = project.files().iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("src/a.ts"), PathBuf::from("src/b.ts")]);
        assert_eq!(project.file(Path::new("src/b.ts")).unwrap().source, "export const b = 1;");
    }

    #[test]
    fn repeated_path_keeps_the_last_source() {
        let reg = LanguageRegistry::new();
        let project = Project::parse_all(
            &reg,
            vec![
                (PathBuf::from("a.ts"), "let x = 1;".to_string()),
                (PathBuf::from("a.ts"), "let x = 2;".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(project.len(), 1);
        assert_eq!(project.file(Path::new("a.ts")).unwrap().source, "let x = 2;");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let reg = LanguageRegistry::new();
        let err = Project::parse_all(
            &reg,
            vec![(PathBuf::from("main.rs"), "fn main() {}".to_string())],
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::UnsupportedLanguage(_)));
    }
}
