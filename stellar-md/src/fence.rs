//! Code region tracking.
//!
//! Directive tags inside fenced code blocks and inline code spans are example
//! text, not directives.

use std::collections::{HashMap, VecDeque};

/// Tracks code fence state during line-by-line scanning.
///
/// Fences use backticks or tildes (three or more). The closing fence must use
/// the same character and be at least as long as the opening one.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    fence_char: Option<char>,
    fence_len: usize,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn in_fence(&self) -> bool {
        self.fence_char.is_some()
    }

    /// Update state from one line. Returns `true` if the line is a fence marker.
    pub(crate) fn update(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();

        if let Some(fence_char) = self.fence_char {
            if is_closing_fence(trimmed, fence_char, self.fence_len) {
                self.fence_char = None;
                self.fence_len = 0;
                return true;
            }
            false
        } else if let Some((ch, len)) = detect_fence(trimmed) {
            self.fence_char = Some(ch);
            self.fence_len = len;
            true
        } else {
            false
        }
    }
}

/// Byte ranges of `text` covered by fenced code blocks (fence lines included).
///
/// An unterminated fence runs to the end of the text, matching CommonMark.
pub(crate) fn fenced_ranges(text: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut tracker = FenceTracker::new();
    let mut open_at: Option<usize> = None;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let was_in = tracker.in_fence();
        if tracker.update(line) {
            if was_in {
                if let Some(start) = open_at.take() {
                    ranges.push((start, offset + line.len()));
                }
            } else {
                open_at = Some(offset);
            }
        }
        offset += line.len();
    }

    if let Some(start) = open_at {
        ranges.push((start, text.len()));
    }

    ranges
}

/// Fenced blocks and inline code spans, sorted by start and disjoint.
pub(crate) fn code_ranges(text: &str) -> Vec<(usize, usize)> {
    let fenced = fenced_ranges(text);
    let mut ranges = code_span_ranges(text, &fenced);
    ranges.extend(fenced);
    ranges.sort_unstable();
    ranges
}

/// Byte ranges of inline code spans outside fenced code.
///
/// A run of N backticks opens a span that the next run of exactly N
/// backticks in the same paragraph closes. Unmatched runs are literal.
pub(crate) fn code_span_ranges(text: &str, fenced: &[(usize, usize)]) -> Vec<(usize, usize)> {
    // (start, length, paragraph)
    let mut runs: Vec<(usize, usize, usize)> = Vec::new();
    let mut paragraph = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if line.trim().is_empty() || containing(fenced, line_start).is_some() {
            paragraph += 1;
            continue;
        }

        let bytes = line.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'`' {
                let len = bytes[i..].iter().take_while(|&&b| b == b'`').count();
                runs.push((line_start + i, len, paragraph));
                i += len;
            } else {
                i += 1;
            }
        }
    }

    let mut pending: HashMap<(usize, usize), VecDeque<usize>> = HashMap::new();
    for (idx, &(_, len, para)) in runs.iter().enumerate() {
        pending.entry((para, len)).or_default().push_back(idx);
    }

    let mut spans = Vec::new();
    let mut idx = 0;
    while idx < runs.len() {
        let (start, len, para) = runs[idx];
        let closer = pending.get_mut(&(para, len)).and_then(|queue| {
            while queue.front().is_some_and(|&j| j <= idx) {
                queue.pop_front();
            }
            queue.pop_front()
        });
        match closer {
            Some(j) => {
                spans.push((start, runs[j].0 + len));
                idx = j + 1;
            }
            None => idx += 1,
        }
    }

    spans
}

/// The range of `ranges` (sorted and disjoint) that contains `pos`.
pub(crate) fn containing(ranges: &[(usize, usize)], pos: usize) -> Option<(usize, usize)> {
    let idx = ranges.partition_point(|&(start, _)| start <= pos);
    let &(start, end) = ranges.get(idx.checked_sub(1)?)?;
    (pos < end).then_some((start, end))
}

fn detect_fence(trimmed: &str) -> Option<(char, usize)> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }

    let count = trimmed.chars().take_while(|&c| c == first).count();
    if count < 3 {
        return None;
    }
    // A backtick fence's info string may not contain backticks.
    if first == '`' && trimmed[count..].contains('`') {
        return None;
    }
    Some((first, count))
}

fn is_closing_fence(trimmed: &str, expected: char, min_len: usize) -> bool {
    if !trimmed.starts_with(expected) {
        return false;
    }
    let count = trimmed.chars().take_while(|&c| c == expected).count();
    count >= min_len && trimmed[count..].chars().all(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn backtick_fence() {
        let mut tracker = FenceTracker::new();
        assert!(tracker.update("```rust"));
        assert!(tracker.in_fence());
        assert!(!tracker.update("{% note %}"));
        assert!(tracker.in_fence());
        assert!(tracker.update("```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn tilde_needs_same_char_and_length() {
        let mut tracker = FenceTracker::new();
        tracker.update("~~~~");
        assert!(!tracker.update("```"));
        assert!(!tracker.update("~~~"));
        assert!(tracker.in_fence());
        assert!(tracker.update("~~~~~"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn inline_code_is_not_a_fence() {
        let mut tracker = FenceTracker::new();
        assert!(!tracker.update("``` `x` ```"));
        assert!(!tracker.in_fence());
    }

    #[test]
    fn code_spans_pair_equal_runs() {
        let text = "a `{% x %}` b ``c ` d`` e";
        let spans = code_span_ranges(text, &[]);
        assert_eq!(spans, vec![(2, 11), (14, 23)]);
        assert_eq!(&text[14..23], "``c ` d``");
    }

    #[test]
    fn code_spans_stop_at_paragraph_end() {
        let text = "open ` here\n\nclose ` there\n";
        assert!(code_span_ranges(text, &[]).is_empty());
        assert_eq!(code_span_ranges("a `b\nc` d", &[]), vec![(2, 7)]);
    }

    #[test]
    fn code_spans_skip_fences() {
        let text = "```\n` x\n```\nreal `y`\n";
        let ranges = code_ranges(text);
        assert_eq!(ranges, vec![(0, 12), (17, 20)]);
        assert_eq!(containing(&ranges, 18), Some((17, 20)));
        assert_eq!(containing(&ranges, 12), None);
    }

    #[test]
    fn ranges_cover_fence_lines() {
        let text = "a\n```\n{% note %}\n```\nb\n";
        let ranges = fenced_ranges(text);
        assert_eq!(ranges, vec![(2, 21)]);
        assert_eq!(&text[2..21], "```\n{% note %}\n```\n");
    }

    #[test]
    fn unterminated_fence_runs_to_end() {
        let text = "x\n~~~\nstill code";
        assert_eq!(fenced_ranges(text), vec![(2, text.len())]);
    }
}
