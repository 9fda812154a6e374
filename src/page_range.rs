use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Result, SplitError};

/// Most pages one selection may expand to. A token that would push the
/// selection past this is dropped like any other malformed token.
pub const MAX_SELECTION_PAGES: u64 = 1_000_000;

/// One comma-separated piece of a page specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageToken {
    Single(i64),
    /// Inclusive; `start > end` is legal and expands to nothing
    Range(i64, i64),
}

impl PageToken {
    /// Parse a token like "5", "-4" or "3-9". Returns `None` for anything
    /// else, including "1-5-10" and "1-".
    pub fn parse(s: &str) -> Option<Self> {
        if let Ok(n) = s.parse::<i64>() {
            return Some(PageToken::Single(n));
        }

        let mut parts = s.split('-');
        let (start, end) = match (parts.next(), parts.next(), parts.next()) {
            (Some(start), Some(end), None) => (start, end),
            _ => return None,
        };
        let start = start.parse::<i64>().ok()?;
        let end = end.parse::<i64>().ok()?;
        Some(PageToken::Range(start, end))
    }

    /// Number of pages this token expands to.
    pub fn page_count(self) -> u64 {
        match self {
            PageToken::Single(_) => 1,
            PageToken::Range(start, end) if start > end => 0,
            PageToken::Range(start, end) => end.abs_diff(start).saturating_add(1),
        }
    }

    fn expand_into(self, pages: &mut BTreeSet<i64>) {
        match self {
            PageToken::Single(n) => {
                pages.insert(n);
            }
            PageToken::Range(start, end) => pages.extend(start..=end),
        }
    }
}

/// Canonical, ascending, duplicate-free list of requested 1-based page
/// numbers. Not checked against any document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    pages: Vec<i64>,
}

impl PageSelection {
    /// Parse a specification like "1,3,5-10,15", dropping malformed tokens.
    pub fn parse(s: &str) -> Self {
        let (selection, rejected) = Self::parse_with_rejects(s);
        for token in &rejected {
            tracing::debug!(token = %token, "dropping malformed page token");
        }
        selection
    }

    /// Like [`PageSelection::parse`], but fails on the first malformed token.
    pub fn parse_strict(s: &str) -> Result<Self> {
        let (selection, rejected) = Self::parse_with_rejects(s);
        match rejected.into_iter().next() {
            Some(token) => Err(SplitError::MalformedToken(token)),
            None => Ok(selection),
        }
    }

    /// Parse and also return every non-empty token that was dropped.
    pub fn parse_with_rejects(s: &str) -> (Self, Vec<String>) {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();

        let mut pages = BTreeSet::new();
        let mut rejected = Vec::new();
        for part in compact.split(',') {
            if part.is_empty() {
                continue;
            }
            match PageToken::parse(part) {
                Some(token)
                    if (pages.len() as u64).saturating_add(token.page_count())
                        <= MAX_SELECTION_PAGES =>
                {
                    token.expand_into(&mut pages)
                }
                _ => rejected.push(part.to_string()),
            }
        }

        (
            PageSelection {
                pages: pages.into_iter().collect(),
            },
            rejected,
        )
    }

    pub fn pages(&self) -> &[i64] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl From<Vec<i64>> for PageSelection {
    fn from(pages: Vec<i64>) -> Self {
        let pages: BTreeSet<i64> = pages.into_iter().collect();
        PageSelection {
            pages: pages.into_iter().collect(),
        }
    }
}

impl fmt::Display for PageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, page) in self.pages.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", page)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Vec<i64> {
        PageSelection::parse(s).pages().to_vec()
    }

    #[test]
    fn test_single_page() {
        assert_eq!(PageToken::parse("5"), Some(PageToken::Single(5)));
        assert_eq!(parse("5"), vec![5]);
    }

    #[test]
    fn test_mixed_singles_and_ranges() {
        assert_eq!(parse("1,3,5-7"), vec![1, 3, 5, 6, 7]);
    }

    #[test]
    fn test_whitespace_is_ignored() {
        assert_eq!(parse(" 1 , 3 - 5 ,\t9 "), vec![1, 3, 4, 5, 9]);
    }

    #[test]
    fn test_sorted_and_deduplicated() {
        assert_eq!(parse("10,2-4,3,1-2"), vec![1, 2, 3, 4, 10]);
    }

    #[test]
    fn test_descending_range_is_empty() {
        assert_eq!(PageToken::parse("5-1"), Some(PageToken::Range(5, 1)));
        assert!(parse("5-1").is_empty());
    }

    #[test]
    fn test_multi_dash_token_dropped() {
        assert!(parse("1-5-10").is_empty());
        assert_eq!(parse("2,1-5-10,9"), vec![2, 9]);
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").is_empty());
        assert!(parse("   ").is_empty());
        assert!(parse(",,").is_empty());
    }

    #[test]
    fn test_garbage_tokens_dropped() {
        assert_eq!(parse("a,2,b-4,1-,3x"), vec![2]);
    }

    #[test]
    fn test_negative_single_accepted() {
        assert_eq!(parse("-4,2"), vec![-4, 2]);
        assert_eq!(parse("0"), vec![0]);
    }

    #[test]
    fn test_huge_range_dropped() {
        assert_eq!(parse("1-999999999999,7"), vec![7]);
        assert_eq!(parse("-9223372036854775808-9223372036854775807,7"), vec![7]);
    }

    #[test]
    fn test_widest_allowed_range() {
        assert_eq!(PageToken::parse("1-1000000").unwrap().page_count(), MAX_SELECTION_PAGES);
        assert_eq!(PageSelection::parse("1-1000000").len(), 1_000_000);
        assert_eq!(parse("1-1000001,7"), vec![7]);
    }

    #[test]
    fn test_many_wide_ranges_stay_under_cap() {
        let input: Vec<String> = (0..20i64)
            .map(|i| format!("{}-{}", i * 999_999 + 1, (i + 1) * 999_999))
            .collect();
        let (selection, rejected) = PageSelection::parse_with_rejects(&input.join(","));
        assert!(selection.len() as u64 <= MAX_SELECTION_PAGES);
        assert_eq!(selection.len(), 999_999);
        assert_eq!(rejected.len(), 19);
    }

    #[test]
    fn test_token_page_count() {
        assert_eq!(PageToken::Single(-4).page_count(), 1);
        assert_eq!(PageToken::Range(3, 9).page_count(), 7);
        assert_eq!(PageToken::Range(9, 3).page_count(), 0);
    }

    #[test]
    fn test_rejects_reported() {
        let (selection, rejected) = PageSelection::parse_with_rejects("1,x,3-1-2,,4");
        assert_eq!(selection.pages(), &[1, 4]);
        assert_eq!(rejected, vec!["x".to_string(), "3-1-2".to_string()]);
    }

    #[test]
    fn test_strict_mode() {
        assert_eq!(
            PageSelection::parse_strict("1-3,5").unwrap().pages(),
            &[1, 2, 3, 5]
        );
        match PageSelection::parse_strict("1,oops") {
            Err(SplitError::MalformedToken(token)) => assert_eq!(token, "oops"),
            other => panic!("expected malformed token, got {:?}", other),
        }
    }

    #[test]
    fn test_canonical_rendering_is_idempotent() {
        for input in ["1,3,5-7", "9-12,2,2,4", "", "-3,-1-1", "100-98,7"] {
            let selection = PageSelection::parse(input);
            let reparsed = PageSelection::parse(&selection.to_string());
            assert_eq!(reparsed, selection, "input {:?}", input);
        }
    }
}
