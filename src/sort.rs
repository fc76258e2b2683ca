//! Display ordering for citation lists.
//!
//! The canonical citation collection never moves; sorting produces a fresh
//! permutation of `(citation, original_index)` pairs, so parsed records keyed
//! by original index stay valid across any reordering. Comparable values come
//! from the structured record when structured view is on and one exists for
//! the index, and from the raw-text heuristics in [`crate::extract`]
//! otherwise.

use std::cmp::Ordering;

use crate::extract;
use crate::models::{ParsedCitationMap, SortKey};

/// One display entry: the citation text with its position in the canonical
/// collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortedCitation<'a> {
    pub citation: &'a str,
    pub original_index: usize,
}

/// Produce the display order for a citation list.
///
/// Every input citation appears exactly once in the output, paired with its
/// original index. `SortKey::None` preserves the input order. Ties under
/// other keys may reorder (`sort_unstable_by`); only display position
/// changes, identity is the index.
pub fn sort_view<'a>(
    citations: &'a [String],
    parsed: Option<&ParsedCitationMap>,
    structured_view: bool,
    key: SortKey,
) -> Vec<SortedCitation<'a>> {
    let view: Vec<SortedCitation<'a>> = citations
        .iter()
        .enumerate()
        .map(|(original_index, citation)| SortedCitation {
            citation: citation.as_str(),
            original_index,
        })
        .collect();

    let record = |index: usize| {
        if structured_view {
            parsed.and_then(|map| map.get(&index))
        } else {
            None
        }
    };

    let descending = key.is_descending();
    match key {
        SortKey::None => view,
        SortKey::TitleAsc | SortKey::TitleDesc => {
            let value = |item: &SortedCitation<'a>| match record(item.original_index) {
                Some(rec) => rec.primary_title().to_string(),
                None => extract::title(item.citation).to_string(),
            };
            sort_by_text(view, value, descending)
        }
        SortKey::AuthorAsc | SortKey::AuthorDesc => {
            let value = |item: &SortedCitation<'a>| match record(item.original_index) {
                Some(rec) => rec.primary_authors().to_string(),
                None => extract::author(item.citation).to_string(),
            };
            sort_by_text(view, value, descending)
        }
        SortKey::YearAsc | SortKey::YearDesc => {
            let value = |item: &SortedCitation<'a>| match record(item.original_index) {
                Some(rec) => rec.year_value(),
                None => extract::year(item.citation),
            };
            sort_by_year(view, value, descending)
        }
    }
}

fn sort_by_text<'a, F>(
    view: Vec<SortedCitation<'a>>,
    value: F,
    descending: bool,
) -> Vec<SortedCitation<'a>>
where
    F: Fn(&SortedCitation<'a>) -> String,
{
    let mut decorated: Vec<(String, SortedCitation<'a>)> =
        view.into_iter().map(|item| (value(&item), item)).collect();
    decorated.sort_unstable_by(|a, b| {
        let ord = natural_cmp(&a.0, &b.0);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    decorated.into_iter().map(|(_, item)| item).collect()
}

fn sort_by_year<'a, F>(
    view: Vec<SortedCitation<'a>>,
    value: F,
    descending: bool,
) -> Vec<SortedCitation<'a>>
where
    F: Fn(&SortedCitation<'a>) -> u32,
{
    let mut decorated: Vec<(u32, SortedCitation<'a>)> =
        view.into_iter().map(|item| (value(&item), item)).collect();
    decorated.sort_unstable_by(|a, b| {
        let ord = a.0.cmp(&b.0);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    decorated.into_iter().map(|(_, item)| item).collect()
}

/// Case-insensitive, numeric-aware string comparison.
///
/// Digit runs compare as numbers, so "Chapter 2" orders before "Chapter 10";
/// everything else compares by lowercased characters.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ca = a.chars().flat_map(char::to_lowercase).peekable();
    let mut cb = b.chars().flat_map(char::to_lowercase).peekable();

    loop {
        match (ca.peek().copied(), cb.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let run_a = digit_run(&mut ca);
                let run_b = digit_run(&mut cb);
                let ord = compare_digit_runs(&run_a, &run_b);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                ca.next();
                cb.next();
            }
        }
    }
}

fn digit_run<I: Iterator<Item = char>>(chars: &mut std::iter::Peekable<I>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    // Numeric comparison without overflow: longer run of significant digits
    // is larger, equal lengths compare lexicographically.
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
