//! Line reconstruction from loose words.
//!
//! The native PDF text layer yields words, not lines. Lines are rebuilt by
//! sorting words into reading order (top row first, left to right) and
//! cutting a new line whenever a word's top edge jumps by more than
//! [`LINE_TOLERANCE`] from the previous word's top edge.
//!
//! The reference top is the *last* word's `y`, not the first word's. Slowly
//! drifting baselines therefore stay on one line, while a fixed band around
//! the first word would split them.

use crate::output::{BoundingBox, Line, Word};

/// Maximum vertical distance (unit-square, i.e. 2% of page height) between
/// consecutive words on the same line.
pub const LINE_TOLERANCE: f64 = 0.02;

/// Partition one page's words into lines, in reading order.
pub fn group_into_lines(words: &[Word]) -> Vec<Vec<Word>> {
    let mut sorted: Vec<&Word> = words.iter().collect();
    sorted.sort_by(|a, b| {
        a.bbox
            .y
            .total_cmp(&b.bbox.y)
            .then_with(|| a.bbox.x.total_cmp(&b.bbox.x))
    });

    let mut lines: Vec<Vec<Word>> = Vec::new();
    let mut current: Vec<Word> = Vec::new();
    let mut current_top: Option<f64> = None;

    for word in sorted {
        let same_line = current_top.is_none_or(|top| (word.bbox.y - top).abs() <= LINE_TOLERANCE);
        if !same_line {
            lines.push(std::mem::take(&mut current));
        }
        current_top = Some(word.bbox.y);
        current.push(word.clone());
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Group `words` (all on page `page`) and turn each group into a [`Line`].
pub fn build_lines(page: usize, words: &[Word]) -> Vec<Line> {
    group_into_lines(words)
        .into_iter()
        .filter_map(|group| line_from_words(page, &group))
        .collect()
}

/// Space-join the texts and union the boxes of a word group.
pub fn line_from_words(page: usize, group: &[Word]) -> Option<Line> {
    let bbox = BoundingBox::union(group.iter().map(|w| &w.bbox))?;
    let text = group
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    Some(Line { page, text, bbox })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x: f64, y: f64) -> Word {
        Word {
            page: 1,
            text: text.to_string(),
            bbox: BoundingBox::new(x, y, 0.08, 0.015),
        }
    }

    fn texts(lines: &[Line]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn empty_input_gives_no_lines() {
        assert!(group_into_lines(&[]).is_empty());
        assert!(build_lines(1, &[]).is_empty());
    }

    #[test]
    fn single_word_is_one_line() {
        let lines = build_lines(1, &[word("alone", 0.3, 0.3)]);
        assert_eq!(texts(&lines), vec!["alone"]);
        let b = lines[0].bbox;
        assert!((b.x - 0.3).abs() < 1e-12 && (b.y - 0.3).abs() < 1e-12);
        assert!((b.width - 0.08).abs() < 1e-12 && (b.height - 0.015).abs() < 1e-12);
    }

    #[test]
    fn words_are_put_in_reading_order() {
        let words = [
            word("world", 0.30, 0.100),
            word("second", 0.10, 0.300),
            word("Hello", 0.10, 0.100),
        ];
        let lines = build_lines(1, &words);
        assert_eq!(texts(&lines), vec!["Hello world", "second"]);
    }

    #[test]
    fn order_within_line_follows_top_edge_first() {
        // "late" sits slightly higher, so it sorts first even though it is
        // to the right.
        let words = [word("early", 0.10, 0.105), word("late", 0.30, 0.100)];
        assert_eq!(texts(&build_lines(1, &words)), vec!["late early"]);
    }

    #[test]
    fn identical_y_orders_by_x() {
        let words = [
            word("c", 0.50, 0.2),
            word("a", 0.10, 0.2),
            word("b", 0.30, 0.2),
        ];
        assert_eq!(texts(&build_lines(1, &words)), vec!["a b c"]);
    }

    #[test]
    fn gap_above_tolerance_splits_lines() {
        let words = [word("top", 0.1, 0.40), word("bottom", 0.1, 0.43)];
        assert_eq!(texts(&build_lines(1, &words)), vec!["top", "bottom"]);
    }

    #[test]
    fn gap_within_tolerance_joins_lines() {
        let words = [word("left", 0.1, 0.40), word("right", 0.3, 0.41)];
        assert_eq!(texts(&build_lines(1, &words)), vec!["left right"]);
    }

    #[test]
    fn tolerance_rolls_with_last_word() {
        // Each step is 0.015; the total drift of 0.045 exceeds the tolerance
        // but no single step does, so everything stays on one line.
        let words = [
            word("a", 0.10, 0.500),
            word("b", 0.20, 0.515),
            word("c", 0.30, 0.530),
            word("d", 0.40, 0.545),
        ];
        let groups = group_into_lines(&words);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 4);
    }

    #[test]
    fn line_box_is_union_of_word_boxes() {
        let words = [
            word("one", 0.10, 0.200),
            word("two", 0.25, 0.205),
            word("three", 0.40, 0.198),
        ];
        let lines = build_lines(1, &words);
        assert_eq!(lines.len(), 1);
        let b = lines[0].bbox;
        assert!((b.x - 0.10).abs() < 1e-12);
        assert!((b.right() - 0.48).abs() < 1e-12);
        assert!((b.y - 0.198).abs() < 1e-12);
        assert!((b.bottom() - 0.220).abs() < 1e-12);
    }

    #[test]
    fn grouping_is_idempotent() {
        let words = [
            word("x", 0.6, 0.71),
            word("y", 0.1, 0.70),
            word("z", 0.3, 0.90),
            word("w", 0.2, 0.10),
        ];
        assert_eq!(build_lines(1, &words), build_lines(1, &words));
        assert_eq!(group_into_lines(&words), group_into_lines(&words));
    }
}
