//! Hierarchical code generation.
//!
//! Titles and line items never carry a code in ACU text; it is derived from
//! where they are declared. A [`CodeGenerator`] holds one counter per title
//! level plus one counter per enclosing title for line items. It is created
//! fresh for every parse and never shared.

use std::{collections::HashMap, num::NonZeroU32};

use crate::domain::{Code, code::MAX_LEVEL};

/// Per-document numbering state.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    levels: [Option<NonZeroU32>; MAX_LEVEL],
    items: HashMap<Option<Code>, NonZeroU32>,
}

impl CodeGenerator {
    /// A generator with every counter unset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the code of a title declared at `level` (1-based).
    ///
    /// Counters deeper than `level` are cleared, so numbering below a new
    /// title always restarts at 1. A level skipped on the way down has no
    /// title of its own and is rendered as `01`.
    ///
    /// # Panics
    ///
    /// Panics if `level` is zero or deeper than [`MAX_LEVEL`]; the parser
    /// validates levels before calling this.
    pub fn next_title(&mut self, level: usize) -> Code {
        assert!(
            (1..=MAX_LEVEL).contains(&level),
            "title level {level} out of range"
        );
        for slot in &mut self.levels[level..] {
            *slot = None;
        }
        let slot = &mut self.levels[level - 1];
        *slot = Some(slot.map_or(NonZeroU32::MIN, |n| n.saturating_add(1)));
        self.path(level)
    }

    /// Code of the title that encloses the next declaration: the path down to
    /// the deepest level with a counter, or `None` before the first title.
    #[must_use]
    pub fn current_title(&self) -> Option<Code> {
        let depth = self.levels.iter().rposition(Option::is_some)? + 1;
        Some(self.path(depth))
    }

    /// Assigns the code of a line item, returning it along with the code of
    /// its enclosing title.
    ///
    /// Items declared before any title share a single document-wide counter
    /// and get a bare one-segment code.
    pub fn next_line_item(&mut self) -> (Option<Code>, Code) {
        let title = self.current_title();
        let counter = self
            .items
            .entry(title.clone())
            .and_modify(|n| *n = n.saturating_add(1))
            .or_insert(NonZeroU32::MIN);
        let code = title
            .as_ref()
            .map_or_else(|| Code::root(*counter), |title| title.child(*counter));
        (title, code)
    }

    fn path(&self, depth: usize) -> Code {
        let segments = self.levels[..depth]
            .iter()
            .map(|slot| slot.unwrap_or(NonZeroU32::MIN))
            .collect();
        Code::from_segments(segments).unwrap_or_else(|_| Code::root(NonZeroU32::MIN))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn titles(levels: &[usize]) -> Vec<String> {
        let mut generator = CodeGenerator::new();
        levels
            .iter()
            .map(|&level| generator.next_title(level).to_string())
            .collect()
    }

    #[test]
    fn shallower_title_resets_deeper_levels() {
        assert_eq!(titles(&[1, 2, 1]), ["01", "01.01", "02"]);
    }

    #[test_case(&[1, 2, 2, 3, 2, 3], &["01", "01.01", "01.02", "01.02.01", "01.03", "01.03.01"]; "siblings restart children")]
    #[test_case(&[1, 2, 3, 1, 3], &["01", "01.01", "01.01.01", "02", "02.01.01"]; "skipped level renders as 01")]
    #[test_case(&[2], &["01.01"]; "first title below level 1")]
    fn title_codes(levels: &[usize], expected: &[&str]) {
        assert_eq!(titles(levels), expected);
    }

    #[test]
    fn every_level_resets_everything_below() {
        for level in 1..=MAX_LEVEL {
            let mut generator = CodeGenerator::new();
            for deeper in 1..=MAX_LEVEL {
                generator.next_title(deeper);
            }
            let code = generator.next_title(level);
            assert_eq!(code.depth(), level);
            assert_eq!(code.sequence().get(), 2);
            let child = generator.next_title((level + 1).min(MAX_LEVEL));
            if level < MAX_LEVEL {
                assert_eq!(child.sequence().get(), 1);
            }
        }
    }

    #[test]
    fn sequences_widen_past_two_digits() {
        let mut generator = CodeGenerator::new();
        let mut last = None;
        for _ in 0..100 {
            last = Some(generator.next_title(1));
        }
        assert_eq!(last.unwrap().to_string(), "100");
    }

    #[test]
    fn line_items_number_under_their_title() {
        let mut generator = CodeGenerator::new();
        generator.next_title(1);
        generator.next_title(2);
        let (title, first) = generator.next_line_item();
        let (_, second) = generator.next_line_item();
        assert_eq!(title.unwrap().to_string(), "01.01");
        assert_eq!(first.to_string(), "01.01.01");
        assert_eq!(second.to_string(), "01.01.02");

        generator.next_title(1);
        let (_, third) = generator.next_line_item();
        assert_eq!(third.to_string(), "02.01");
    }

    #[test]
    fn untitled_items_share_one_counter() {
        let mut generator = CodeGenerator::new();
        let (title, first) = generator.next_line_item();
        let (_, second) = generator.next_line_item();
        assert!(title.is_none());
        assert_eq!(first.to_string(), "01");
        assert_eq!(second.to_string(), "02");
    }

    #[test]
    fn generators_are_independent() {
        let mut first = CodeGenerator::new();
        first.next_title(1);
        first.next_title(1);
        let mut second = CodeGenerator::new();
        assert_eq!(second.next_title(1).to_string(), "01");
    }
}
