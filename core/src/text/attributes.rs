//! Ranged text attributes.

use super::metrics::{Font, FontStyle, FontWeight};
use crate::color::Color;
use std::ops::Range;

/// The kind and value of a ranged attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AttributeKind {
    Underline(bool),
    Strikethrough(bool),
    Foreground(Color),
    Background(Color),
    FontWeight(FontWeight),
    FontStyle(FontStyle),
}

impl AttributeKind {
    /// Whether the attribute changes glyph advances.
    pub fn affects_metrics(&self) -> bool {
        match self {
            AttributeKind::FontWeight(_) | AttributeKind::FontStyle(_) => true,
            _ => false,
        }
    }
}

/// An attribute applied to a range of characters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextAttribute {
    /// Start offset, in characters.
    pub start: usize,
    /// Length, in characters.
    pub length: usize,
    pub kind: AttributeKind,
}

impl TextAttribute {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.length
    }
}

/// A range of characters with uniform formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun {
    /// Character range.
    pub range: Range<usize>,
    pub font: Font,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub underline: bool,
    pub strikethrough: bool,
}

impl StyledRun {
    fn plain(range: Range<usize>, font: &Font) -> StyledRun {
        StyledRun {
            range,
            font: font.clone(),
            foreground: None,
            background: None,
            underline: false,
            strikethrough: false,
        }
    }

    fn apply(&mut self, kind: AttributeKind) {
        match kind {
            AttributeKind::Underline(on) => self.underline = on,
            AttributeKind::Strikethrough(on) => self.strikethrough = on,
            AttributeKind::Foreground(color) => self.foreground = Some(color),
            AttributeKind::Background(color) => self.background = Some(color),
            AttributeKind::FontWeight(weight) => self.font.weight = weight,
            AttributeKind::FontStyle(style) => self.font.style = style,
        }
    }
}

/// Splits `range` into runs of uniform formatting.
///
/// Attributes are applied in insertion order, so a later attribute of the same kind overrides an
/// earlier one where they overlap.
pub fn styled_runs(range: Range<usize>, font: &Font, attributes: &[TextAttribute]) -> Vec<StyledRun> {
    if range.start >= range.end {
        return Vec::new();
    }

    let mut bounds = vec![range.start, range.end];
    for attr in attributes {
        for &b in &[attr.start, attr.start + attr.length] {
            if b > range.start && b < range.end {
                bounds.push(b);
            }
        }
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut runs: Vec<StyledRun> = Vec::with_capacity(bounds.len() - 1);
    for pair in bounds.windows(2) {
        let mut run = StyledRun::plain(pair[0]..pair[1], font);
        for attr in attributes {
            if attr.start <= pair[0] && attr.start + attr.length >= pair[1] {
                run.apply(attr.kind);
            }
        }

        // merge with the previous run if the formatting is identical
        if let Some(last) = runs.last_mut() {
            if last.range.end == run.range.start
                && last.font == run.font
                && last.foreground == run.foreground
                && last.background == run.background
                && last.underline == run.underline
                && last.strikethrough == run.strikethrough
            {
                last.range.end = run.range.end;
                continue;
            }
        }
        runs.push(run);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(start: usize, length: usize, kind: AttributeKind) -> TextAttribute {
        TextAttribute {
            start,
            length,
            kind,
        }
    }

    #[test]
    fn different_kinds_compose() {
        let font = Font::default();
        let attrs = [
            attr(0, 5, AttributeKind::Underline(true)),
            attr(3, 5, AttributeKind::FontWeight(FontWeight::Bold)),
        ];
        let runs = styled_runs(0..10, &font, &attrs);
        let ranges: Vec<_> = runs.iter().map(|r| r.range.clone()).collect();
        assert_eq!(ranges, vec![0..3, 3..5, 5..8, 8..10]);
        assert!(runs[1].underline && runs[1].font.weight == FontWeight::Bold);
        assert!(!runs[2].underline && runs[2].font.weight == FontWeight::Bold);
        assert!(!runs[3].underline && runs[3].font.weight == FontWeight::Normal);
    }

    #[test]
    fn later_attribute_of_same_kind_wins() {
        let font = Font::default();
        let attrs = [
            attr(0, 6, AttributeKind::Foreground(Color::RED)),
            attr(2, 2, AttributeKind::Foreground(Color::BLUE)),
        ];
        let runs = styled_runs(0..6, &font, &attrs);
        let colors: Vec<_> = runs.iter().map(|r| (r.range.clone(), r.foreground)).collect();
        assert_eq!(
            colors,
            vec![
                (0..2, Some(Color::RED)),
                (2..4, Some(Color::BLUE)),
                (4..6, Some(Color::RED))
            ]
        );
    }

    #[test]
    fn identical_runs_merge() {
        let font = Font::default();
        let attrs = [
            attr(0, 2, AttributeKind::Underline(true)),
            attr(2, 2, AttributeKind::Underline(true)),
        ];
        let runs = styled_runs(0..6, &font, &attrs);
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].range, 0..4);
    }
}
