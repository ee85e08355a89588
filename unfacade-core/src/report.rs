// Failure records for matched facade calls.
//
// A failure carries the call's span in the pristine source and an optional
// fix; `report` checks the span against the source before recording it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::edit::EditBuffer;
use crate::error::RuleError;

/// One detected facade call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteFailure {
    pub rule: String,
    pub file: PathBuf,
    /// Byte offset of the call in the original source.
    pub start: usize,
    pub width: usize,
    pub message: String,
    /// `None` when the call is detected but cannot be rewritten.
    pub fix: Option<EditBuffer>,
}

impl RewriteFailure {
    pub fn end(&self) -> usize {
        self.start + self.width
    }

    pub fn is_fixable(&self) -> bool {
        self.fix.is_some()
    }

    /// Drop the fix and note why.
    pub fn withhold_fix(&mut self, reason: &str) {
        self.fix = None;
        self.message = format!("{} ({reason})", self.message);
    }
}

/// Package a matched location into a failure record.
///
/// Rejects locations and fix edits that fall outside `source`.
pub fn report(
    rule: &str,
    file: &Path,
    source: &str,
    start: usize,
    width: usize,
    message: String,
    fix: Option<EditBuffer>,
) -> Result<RewriteFailure, RuleError> {
    let invalid = |start, width| RuleError::InvalidSpan {
        file: file.display().to_string(),
        start,
        width,
        len: source.len(),
    };

    let end = start.checked_add(width).ok_or_else(|| invalid(start, width))?;
    if end > source.len() {
        return Err(invalid(start, width));
    }
    if let Some((fix_start, fix_end)) = fix.as_ref().and_then(EditBuffer::span) {
        if fix_end > source.len() {
            return Err(invalid(fix_start, fix_end - fix_start));
        }
    }

    Ok(RewriteFailure {
        rule: rule.to_string(),
        file: file.to_path_buf(),
        start,
        width,
        message,
        fix,
    })
}

/// 1-based line and column of a byte offset.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let before = &source.as_bytes()[..offset.min(source.len())];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
    (line, offset.min(source.len()) - line_start + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_record_for_in_bounds_span() {
        let failure = report("is-blank", Path::new("a.ts"), "isBlank(x);", 0, 10, "msg".into(), None)
            .unwrap();
        assert_eq!(failure.end(), 10);
        assert!(!failure.is_fixable());
    }

    #[test]
    fn rejects_span_past_end() {
        let err = report("is-blank", Path::new("a.ts"), "abc", 2, 5, "msg".into(), None).unwrap_err();
        assert_eq!(
            err,
            RuleError::InvalidSpan {
                file: "a.ts".into(),
                start: 2,
                width: 5,
                len: 3
            }
        );
    }

    #[test]
    fn rejects_fix_past_end() {
        let mut fix = EditBuffer::new();
        fix.delete(1, 9);
        let err = report("is-blank", Path::new("a.ts"), "abc", 0, 1, "msg".into(), Some(fix));
        assert!(matches!(err, Err(RuleError::InvalidSpan { .. })));
    }

    #[test]
    fn withholding_keeps_the_record() {
        let mut fix = EditBuffer::new();
        fix.insert(0, "!");
        let mut failure =
            report("is-blank", Path::new("a.ts"), "abc", 0, 3, "Inline".into(), Some(fix)).unwrap();
        failure.withhold_fix("nested");
        assert_eq!(failure.message, "Inline (nested)");
        assert!(failure.fix.is_none());
    }

    #[test]
    fn line_and_column_are_one_based() {
        let source = "a\nbc\nd";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 3), (2, 2));
        assert_eq!(line_col(source, 5), (3, 1));
    }
}
