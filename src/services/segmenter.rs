//! Segmenter
//!
//! Splits a large result text into bounded, boundary-aware segments. Pure
//! function: no shared state, no I/O.

use crate::models::segment::Segment;

/// How far back from a hard cut point to look for a newline before giving up
/// and cutting mid-line.
const NEWLINE_SEARCH_WINDOW: usize = 500;

/// Split `text` into segments of at most roughly `target_size_bytes` bytes.
///
/// Cuts prefer the nearest newline within [`NEWLINE_SEARCH_WINDOW`] bytes
/// behind the target boundary; failing that, the cut lands exactly at the
/// target (nudged to a UTF-8 character boundary). The final segment absorbs
/// the remainder. Concatenating the returned segments in index order
/// reproduces `text` exactly.
pub fn split(text: &str, target_size_bytes: usize) -> Vec<Segment> {
    let target = target_size_bytes.max(1);
    if text.len() <= target {
        return vec![Segment::new(1, 1, text)];
    }

    let mut pieces: Vec<&str> = Vec::new();
    let mut start = 0usize;
    while text.len() - start > target {
        let hard_cut = start + target;
        let cut = match newline_cut(text, start, hard_cut) {
            Some(cut) => cut,
            None => {
                let mut cut = floor_char_boundary(text, hard_cut);
                if cut <= start {
                    // A single character wider than the target; overshoot
                    // rather than split it.
                    cut = ceil_char_boundary(text, hard_cut);
                }
                cut
            }
        };
        pieces.push(&text[start..cut]);
        start = cut;
    }
    pieces.push(&text[start..]);

    let total = pieces.len() as u32;
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| Segment::new(i as u32 + 1, total, piece))
        .collect()
}

/// Position just after the last newline within the search window behind
/// `hard_cut`, if any.
fn newline_cut(text: &str, start: usize, hard_cut: usize) -> Option<usize> {
    let window_start = hard_cut.saturating_sub(NEWLINE_SEARCH_WINDOW).max(start);
    text.as_bytes()[window_start..hard_cut]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|offset| window_start + offset + 1)
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    while index < text.len() && !text.is_char_boundary(index) {
        index += 1;
    }
    index
}
