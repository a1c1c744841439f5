use std::ops::Range;

use crate::app::infrastructure::error::{AppError, Result};

/// Find every case-insensitive occurrence of `term` in `text`.
///
/// Returns character ranges, scanning left to right and resuming after the end
/// of each match, so matches never overlap. An empty term is rejected.
pub fn find_all(text: &str, term: &str) -> Result<Vec<Range<usize>>> {
    if term.is_empty() {
        return Err(AppError::validation("Please enter a search term."));
    }

    let haystack: Vec<char> = text.chars().collect();
    let needle: Vec<char> = term.chars().collect();
    let mut matches = Vec::new();

    if needle.len() > haystack.len() {
        return Ok(matches);
    }

    let mut pos = 0;
    while pos + needle.len() <= haystack.len() {
        let window = &haystack[pos..pos + needle.len()];
        if window.iter().zip(&needle).all(|(&a, &b)| chars_eq_ignore_case(a, b)) {
            matches.push(pos..pos + needle.len());
            pos += needle.len();
        } else {
            pos += 1;
        }
    }

    Ok(matches)
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
