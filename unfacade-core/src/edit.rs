// Positional text edits against a pristine source.
//
// Every offset in an `EditBuffer` refers to the original text, never to a
// partially rewritten one. Applying walks the edits in offset order and copies
// the untouched stretches between them.

use serde::{Deserialize, Serialize};

use crate::error::EditError;

/// One positional edit. Offsets are bytes into the original source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Edit {
    Delete { offset: usize, length: usize },
    Insert { offset: usize, text: String },
}

impl Edit {
    pub fn offset(&self) -> usize {
        match self {
            Self::Delete { offset, .. } | Self::Insert { offset, .. } => *offset,
        }
    }

    /// End of the replaced range (equal to `offset` for inserts).
    pub fn end(&self) -> usize {
        match self {
            Self::Delete { offset, length } => offset + length,
            Self::Insert { offset, .. } => *offset,
        }
    }

    /// Inserts sort before deletes at the same offset.
    fn order_key(&self) -> (usize, u8) {
        match self {
            Self::Insert { offset, .. } => (*offset, 0),
            Self::Delete { offset, .. } => (*offset, 1),
        }
    }
}

/// The edits making up one atomic fix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditBuffer {
    edits: Vec<Edit>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete `length` bytes at `offset`. Empty deletes are dropped.
    pub fn delete(&mut self, offset: usize, length: usize) -> &mut Self {
        if length > 0 {
            self.edits.push(Edit::Delete { offset, length });
        }
        self
    }

    /// Delete the byte range `start..end`.
    pub fn delete_range(&mut self, start: usize, end: usize) -> &mut Self {
        self.delete(start, end.saturating_sub(start))
    }

    /// Insert `text` at `offset`. Empty inserts are dropped.
    pub fn insert(&mut self, offset: usize, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if !text.is_empty() {
            self.edits.push(Edit::Insert { offset, text });
        }
        self
    }

    /// Replace `start..end` with `text`.
    pub fn replace(&mut self, start: usize, end: usize, text: impl Into<String>) -> &mut Self {
        self.delete_range(start, end).insert(start, text)
    }

    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Smallest range covering every edit.
    pub fn span(&self) -> Option<(usize, usize)> {
        let start = self.edits.iter().map(Edit::offset).min()?;
        let end = self.edits.iter().map(Edit::end).max()?;
        Some((start, end))
    }

    /// Whether any edit rewrites text inside `start..end`.
    pub fn touches(&self, start: usize, end: usize) -> bool {
        self.edits.iter().any(|e| match e {
            Edit::Delete { .. } => e.offset() < end && start < e.end(),
            Edit::Insert { offset, .. } => start < *offset && *offset < end,
        })
    }

    /// Check every edit against `source` and return them in application order.
    fn sorted_checked(&self, source: &str) -> Result<Vec<&Edit>, EditError> {
        let mut sorted: Vec<&Edit> = self.edits.iter().collect();
        sorted.sort_by_key(|e| e.order_key());

        let mut previous_end = 0;
        for edit in &sorted {
            let (offset, end) = (edit.offset(), edit.end());
            if end > source.len() {
                return Err(EditError::OutOfBounds {
                    offset,
                    end,
                    len: source.len(),
                });
            }
            for at in [offset, end] {
                if !source.is_char_boundary(at) {
                    return Err(EditError::NotCharBoundary(at));
                }
            }
            if offset < previous_end {
                return Err(EditError::Overlap {
                    offset,
                    previous_end,
                });
            }
            previous_end = previous_end.max(end);
        }
        Ok(sorted)
    }

    /// Validate the edits against `source` without applying them.
    pub fn validate(&self, source: &str) -> Result<(), EditError> {
        self.sorted_checked(source).map(|_| ())
    }

    /// Apply to the pristine `source`.
    pub fn apply(&self, source: &str) -> Result<String, EditError> {
        let sorted = self.sorted_checked(source)?;

        let mut out = String::with_capacity(source.len());
        let mut cursor = 0;
        for edit in sorted {
            match edit {
                Edit::Insert { offset, text } => {
                    out.push_str(&source[cursor..*offset]);
                    out.push_str(text);
                    cursor = *offset;
                }
                Edit::Delete { offset, length } => {
                    out.push_str(&source[cursor..*offset]);
                    cursor = offset + length;
                }
            }
        }
        out.push_str(&source[cursor..]);
        Ok(out)
    }
}

/// Result of applying several independent fixes to one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    pub output: String,
    pub applied: usize,
    /// Fixes left out because they overlap an earlier fix.
    pub skipped: usize,
}

/// Apply every fix that does not conflict with an earlier one (by span start).
pub fn apply_fixes<'a>(
    source: &str,
    fixes: impl IntoIterator<Item = &'a EditBuffer>,
) -> Result<FixOutcome, EditError> {
    let mut fixes: Vec<(usize, usize, &EditBuffer)> = fixes
        .into_iter()
        .filter_map(|f| f.span().map(|(s, e)| (s, e, f)))
        .collect();
    fixes.sort_by_key(|(s, e, _)| (*s, *e));

    let mut merged = EditBuffer::new();
    let mut applied = 0;
    let mut skipped = 0;
    let mut last: Option<(usize, usize)> = None;
    for (start, end, fix) in fixes {
        if let Some((prev_start, prev_end)) = last {
            if start < prev_end || start == prev_start {
                skipped += 1;
                continue;
            }
        }
        fix.validate(source)?;
        merged.edits.extend(fix.edits.iter().cloned());
        applied += 1;
        last = Some((start, end));
    }

    Ok(FixOutcome {
        output: merged.apply(source)?,
        applied,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_refer_to_the_original_source() {
        let source = "isBlank(foo)";
        let mut fix = EditBuffer::new();
        fix.insert(0, "!").delete(0, 8).delete(11, 1);
        assert_eq!(fix.apply(source).unwrap(), "!foo");
    }

    #[test]
    fn insert_goes_before_delete_at_same_offset() {
        let mut fix = EditBuffer::new();
        fix.delete(0, 3).insert(0, "xyz");
        assert_eq!(fix.apply("abc!").unwrap(), "xyz!");
    }

    #[test]
    fn empty_edits_are_dropped() {
        let mut fix = EditBuffer::new();
        fix.delete(4, 0).insert(2, "").delete_range(5, 5);
        assert!(fix.is_empty());
        assert_eq!(fix.span(), None);
    }

    #[test]
    fn rejects_overlapping_deletes() {
        let mut fix = EditBuffer::new();
        fix.delete(0, 5).delete(3, 2);
        assert_eq!(
            fix.apply("0123456789"),
            Err(EditError::Overlap {
                offset: 3,
                previous_end: 5
            })
        );
    }

    #[test]
    fn rejects_insert_inside_deleted_range() {
        let mut fix = EditBuffer::new();
        fix.delete(0, 5).insert(2, "x");
        assert!(matches!(fix.apply("0123456789"), Err(EditError::Overlap { .. })));
    }

    #[test]
    fn rejects_out_of_bounds_and_split_characters() {
        let mut fix = EditBuffer::new();
        fix.delete(2, 10);
        assert!(matches!(fix.apply("abc"), Err(EditError::OutOfBounds { .. })));

        let mut fix = EditBuffer::new();
        fix.insert(1, "x");
        assert_eq!(fix.apply("é"), Err(EditError::NotCharBoundary(1)));
    }

    #[test]
    fn touches_reports_rewritten_ranges() {
        let mut fix = EditBuffer::new();
        fix.replace(10, 20, "{}");
        assert!(fix.touches(12, 14));
        assert!(fix.touches(0, 11));
        assert!(!fix.touches(20, 25));
        assert!(!fix.touches(0, 10));
    }

    #[test]
    fn apply_fixes_skips_conflicts() {
        let source = "a(b(c)) d(e)";
        let mut outer = EditBuffer::new();
        outer.replace(0, 7, "X");
        let mut inner = EditBuffer::new();
        inner.replace(2, 6, "Y");
        let mut last = EditBuffer::new();
        last.replace(8, 12, "Z");

        let outcome = apply_fixes(source, [&outer, &inner, &last]).unwrap();
        assert_eq!(outcome.output, "X Z");
        assert_eq!(outcome.applied, 2);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn serializes_with_kind_tags() {
        let mut fix = EditBuffer::new();
        fix.replace(3, 5, "{}");
        insta::assert_snapshot!(
            serde_json::to_string(&fix).unwrap(),
            @r#"[{"kind":"delete","offset":3,"length":2},{"kind":"insert","offset":3,"text":"{}"}]"#
        );
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn empty_buffer_is_identity(source in "\\PC{0,64}") {
                prop_assert_eq!(EditBuffer::new().apply(&source).unwrap(), source);
            }

            #[test]
            fn delete_removes_exactly_its_range(
                source in "[a-z]{1,64}",
                a in 0usize..64,
                b in 0usize..64,
            ) {
                let len = source.len();
                let (start, end) = (a.min(b) % (len + 1), a.max(b).min(len));
                let (start, end) = (start.min(end), end);
                let mut fix = EditBuffer::new();
                fix.delete_range(start, end);
                let out = fix.apply(&source).unwrap();
                prop_assert_eq!(out.len(), len - (end - start));
                prop_assert_eq!(out, format!("{}{}", &source[..start], &source[end..]));
            }

            #[test]
            fn replace_then_apply_contains_replacement(
                source in "[a-z]{0,32}",
                at in 0usize..32,
                text in "[A-Z]{1,8}",
            ) {
                let at = at.min(source.len());
                let mut fix = EditBuffer::new();
                fix.insert(at, text.clone());
                let out = fix.apply(&source).unwrap();
                prop_assert_eq!(&out[at..at + text.len()], text.as_str());
                prop_assert_eq!(out.len(), source.len() + text.len());
            }
        }
    }
}
