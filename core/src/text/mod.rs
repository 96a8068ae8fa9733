//! Text layout.
//!
//! A [`TextLayout`] lays out a string in a font under optional width and height constraints:
//! it breaks the text into lines, truncates overflowing text, and carries ranged formatting
//! attributes. Glyph metrics come from a backend [`TextMeasurer`]; everything else is done here,
//! so all backends wrap and truncate the same way.
//!
//! Measurement applies the font weight and style attributes, so bold runs are measured wider
//! than regular ones. The computed layout is cached until a setter invalidates it.

mod attributes;
mod lines;
mod metrics;

pub use attributes::{styled_runs, AttributeKind, StyledRun, TextAttribute};
pub use lines::{Trimming, WrapMode};
pub use metrics::{Font, FontStyle, FontWeight, HeadlessMetrics, LineMetrics, TextMeasurer};

use crate::color::Color;
use crate::error::{Error, Result};
use cgmath::{Point2, Vector2};
use lines::BreakParams;
use std::cell::RefCell;
use std::ops::Range;
use std::sync::Arc;

/// Horizontal alignment of lines within the layout width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    Start,
    Center,
    End,
}

/// A visible line of a laid out text.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutLine {
    /// Character range of the visible text (without the ellipsis).
    pub range: Range<usize>,
    /// The rendered string, including the ellipsis if the line was truncated.
    pub text: String,
    /// Advance width, including the ellipsis.
    pub width: f64,
    /// Horizontal offset from alignment.
    pub x: f64,
    /// Top of the line box.
    pub top: f64,
    /// Baseline position.
    pub baseline: f64,
    pub ellipsized: bool,
}

/// A run of uniformly formatted text, positioned for drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRun {
    pub text: String,
    /// Offset from the line's left edge.
    pub x: f64,
    pub width: f64,
    pub font: Font,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
    pub underline: bool,
    pub strikethrough: bool,
}

/// A line ready for drawing, relative to the layout origin.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedLine {
    pub x: f64,
    pub top: f64,
    pub baseline: f64,
    pub height: f64,
    pub runs: Vec<PreparedRun>,
}

/// Everything a backend needs to draw a text layout.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedText {
    pub lines: Vec<PreparedLine>,
    pub size: Vector2<f64>,
    pub metrics: LineMetrics,
}

#[derive(Debug)]
struct Computed {
    advances: Vec<f64>,
    lines: Vec<LayoutLine>,
    size: Vector2<f64>,
    metrics: LineMetrics,
}

/// A text layout.
#[derive(Debug)]
pub struct TextLayout {
    measurer: Arc<dyn TextMeasurer>,
    text: String,
    char_count: usize,
    font: Font,
    width: Option<f64>,
    height: Option<f64>,
    wrap: WrapMode,
    alignment: Alignment,
    trimming: Trimming,
    ellipsis: String,
    attributes: Vec<TextAttribute>,
    cache: RefCell<Option<Arc<Computed>>>,
}

/// Maps the “unset” sentinel (negative or NaN) to `None`.
fn constraint(value: f64) -> Option<f64> {
    if value >= 0. {
        Some(value)
    } else {
        None
    }
}

impl TextLayout {
    pub fn new(measurer: Arc<dyn TextMeasurer>) -> TextLayout {
        TextLayout::with_font(measurer, Font::default())
    }

    pub fn with_font(measurer: Arc<dyn TextMeasurer>, font: Font) -> TextLayout {
        TextLayout {
            measurer,
            text: String::new(),
            char_count: 0,
            font,
            width: None,
            height: None,
            wrap: WrapMode::Word,
            alignment: Alignment::Start,
            trimming: Trimming::None,
            ellipsis: "\u{2026}".to_string(),
            attributes: Vec::new(),
            cache: RefCell::new(None),
        }
    }

    fn invalidate(&mut self) {
        *self.cache.get_mut() = None;
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replaces the text. Attributes are cleared, since their offsets refer to the old text.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.char_count = self.text.chars().count();
        self.attributes.clear();
        self.invalidate();
    }

    /// Length of the text in characters.
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    pub fn set_font(&mut self, font: Font) {
        self.font = font;
        self.invalidate();
    }

    pub fn width(&self) -> Option<f64> {
        self.width
    }

    /// Sets the width constraint; a negative value removes it.
    pub fn set_width(&mut self, width: f64) {
        self.width = constraint(width);
        self.invalidate();
    }

    pub fn height(&self) -> Option<f64> {
        self.height
    }

    /// Sets the height constraint; a negative value removes it.
    pub fn set_height(&mut self, height: f64) {
        self.height = constraint(height);
        self.invalidate();
    }

    pub fn wrap_mode(&self) -> WrapMode {
        self.wrap
    }

    pub fn set_wrap_mode(&mut self, wrap: WrapMode) {
        self.wrap = wrap;
        self.invalidate();
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
        self.invalidate();
    }

    pub fn trimming(&self) -> Trimming {
        self.trimming
    }

    pub fn set_trimming(&mut self, trimming: Trimming) {
        self.trimming = trimming;
        self.invalidate();
    }

    pub fn ellipsis(&self) -> &str {
        &self.ellipsis
    }

    /// Sets the marker appended to truncated lines.
    pub fn set_ellipsis(&mut self, ellipsis: &str) {
        self.ellipsis = ellipsis.to_string();
        self.invalidate();
    }

    pub fn attributes(&self) -> &[TextAttribute] {
        &self.attributes
    }

    pub fn clear_attributes(&mut self) {
        let had_metrics = self.attributes.iter().any(|a| a.kind.affects_metrics());
        self.attributes.clear();
        if had_metrics {
            self.invalidate();
        }
    }

    fn add_attribute(&mut self, start: usize, length: usize, kind: AttributeKind) -> Result<()> {
        let in_bounds = start
            .checked_add(length)
            .map_or(false, |end| end <= self.char_count);
        if !in_bounds {
            return Err(Error::InvalidRange {
                start,
                length,
                len: self.char_count,
            });
        }
        if kind.affects_metrics() {
            self.invalidate();
        }
        self.attributes.push(TextAttribute {
            start,
            length,
            kind,
        });
        Ok(())
    }

    pub fn set_underline(&mut self, start: usize, length: usize) -> Result<()> {
        self.add_attribute(start, length, AttributeKind::Underline(true))
    }

    pub fn set_strikethrough(&mut self, start: usize, length: usize) -> Result<()> {
        self.add_attribute(start, length, AttributeKind::Strikethrough(true))
    }

    pub fn set_foreground(&mut self, start: usize, length: usize, color: Color) -> Result<()> {
        self.add_attribute(start, length, AttributeKind::Foreground(color))
    }

    pub fn set_background(&mut self, start: usize, length: usize, color: Color) -> Result<()> {
        self.add_attribute(start, length, AttributeKind::Background(color))
    }

    pub fn set_font_weight(&mut self, start: usize, length: usize, weight: FontWeight) -> Result<()> {
        self.add_attribute(start, length, AttributeKind::FontWeight(weight))
    }

    pub fn set_font_style(&mut self, start: usize, length: usize, style: FontStyle) -> Result<()> {
        self.add_attribute(start, length, AttributeKind::FontStyle(style))
    }

    fn computed(&self) -> Arc<Computed> {
        if let Some(computed) = &*self.cache.borrow() {
            return Arc::clone(computed);
        }
        let computed = Arc::new(self.compute());
        *self.cache.borrow_mut() = Some(Arc::clone(&computed));
        computed
    }

    fn compute(&self) -> Computed {
        let chars: Vec<char> = self.text.chars().collect();
        let mut advances = vec![0.; chars.len()];
        for run in styled_runs(0..chars.len(), &self.font, &self.attributes) {
            for i in run.range {
                advances[i] = self.measurer.char_width(chars[i], &run.font);
            }
        }

        let metrics = self.measurer.line_metrics(&self.font);
        let line_height = metrics.height();
        let max_lines = match self.height {
            Some(height) if line_height > 0. => Some(((height / line_height).floor() as usize).max(1)),
            _ => None,
        };

        let boxes = BreakParams {
            chars: &chars,
            advances: &advances,
            width: self.width,
            wrap: self.wrap,
            trimming: self.trimming,
            max_lines,
            ellipsis_width: self.measurer.run_width(&self.ellipsis, &self.font),
        }
        .break_lines();

        let content_width = boxes.iter().map(|b| b.width).fold(0., f64::max);
        let align_width = self.width.unwrap_or(content_width);

        let lines: Vec<LayoutLine> = boxes
            .into_iter()
            .enumerate()
            .map(|(i, b)| {
                let x = match self.alignment {
                    Alignment::Start => 0.,
                    Alignment::Center => (align_width - b.width) / 2.,
                    Alignment::End => align_width - b.width,
                };
                let mut text: String = chars[b.range.clone()].iter().collect();
                if b.ellipsis {
                    text.push_str(&self.ellipsis);
                }
                let top = i as f64 * line_height;
                LayoutLine {
                    range: b.range,
                    text,
                    width: b.width,
                    x,
                    top,
                    baseline: top + metrics.ascent,
                    ellipsized: b.ellipsis,
                }
            })
            .collect();

        let size = Vector2::new(content_width, lines.len() as f64 * line_height);
        log::trace!(
            "laid out {} chars into {} lines ({}×{})",
            chars.len(),
            lines.len(),
            size.x,
            size.y
        );

        Computed {
            advances,
            lines,
            size,
            metrics,
        }
    }

    /// The size needed to draw the text under the current constraints.
    ///
    /// Memoized until the text, font, constraints or a metric-affecting attribute change.
    pub fn get_size(&self) -> Vector2<f64> {
        self.computed().size
    }

    /// The visible lines.
    pub fn lines(&self) -> Vec<LayoutLine> {
        self.computed().lines.clone()
    }

    /// The rendered text: visible lines joined by newlines, with ellipses.
    pub fn visible_text(&self) -> String {
        let computed = self.computed();
        let lines: Vec<&str> = computed.lines.iter().map(|l| l.text.as_str()).collect();
        lines.join("\n")
    }

    pub fn line_height(&self) -> f64 {
        self.computed().metrics.height()
    }

    /// Uniformly formatted runs covering a character range.
    pub fn styled_runs(&self, range: Range<usize>) -> Vec<StyledRun> {
        let end = range.end.min(self.char_count);
        styled_runs(range.start.min(end)..end, &self.font, &self.attributes)
    }

    /// Returns the character index at a point in layout coordinates, if the point is on a line.
    pub fn index_at_point(&self, point: Point2<f64>) -> Option<usize> {
        let computed = self.computed();
        let height = computed.metrics.height();
        let line = computed
            .lines
            .iter()
            .find(|l| point.y >= l.top && point.y < l.top + height)?;
        let mut x = line.x;
        for i in line.range.clone() {
            let advance = computed.advances[i];
            if point.x < x + advance / 2. {
                return Some(i);
            }
            x += advance;
        }
        Some(line.range.end)
    }

    /// Returns the top-left position of the character at `index`, if it is visible.
    pub fn point_at_index(&self, index: usize) -> Option<Point2<f64>> {
        let computed = self.computed();
        let line = computed
            .lines
            .iter()
            .find(|l| index >= l.range.start && index <= l.range.end)?;
        let x: f64 = computed.advances[line.range.start..index].iter().sum();
        Some(Point2::new(line.x + x, line.top))
    }

    /// Splits the visible lines into positioned runs for drawing.
    pub fn prepare(&self) -> PreparedText {
        let computed = self.computed();
        let height = computed.metrics.height();
        let lines = computed
            .lines
            .iter()
            .map(|line| {
                let mut runs = Vec::new();
                let mut x = 0.;
                let styled = styled_runs(line.range.clone(), &self.font, &self.attributes);
                for run in &styled {
                    let width: f64 = computed.advances[run.range.clone()].iter().sum();
                    let text: String = self
                        .text
                        .chars()
                        .skip(run.range.start)
                        .take(run.range.end - run.range.start)
                        .collect();
                    runs.push(PreparedRun {
                        text,
                        x,
                        width,
                        font: run.font.clone(),
                        foreground: run.foreground,
                        background: run.background,
                        underline: run.underline,
                        strikethrough: run.strikethrough,
                    });
                    x += width;
                }
                if line.ellipsized {
                    // the ellipsis keeps the decoration of the text it replaces
                    let last = styled.last();
                    runs.push(PreparedRun {
                        text: self.ellipsis.clone(),
                        x,
                        width: line.width - x,
                        font: self.font.clone(),
                        foreground: last.and_then(|r| r.foreground),
                        background: last.and_then(|r| r.background),
                        underline: last.map_or(false, |r| r.underline),
                        strikethrough: last.map_or(false, |r| r.strikethrough),
                    });
                }
                PreparedLine {
                    x: line.x,
                    top: line.top,
                    baseline: line.baseline,
                    height,
                    runs,
                }
            })
            .collect();
        PreparedText {
            lines,
            size: computed.size,
            metrics: computed.metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts measurement calls to observe the cache.
    #[derive(Debug, Default)]
    struct CountingMetrics(AtomicUsize);

    impl TextMeasurer for CountingMetrics {
        fn run_width(&self, text: &str, font: &Font) -> f64 {
            self.0.fetch_add(1, Ordering::SeqCst);
            HeadlessMetrics.run_width(text, font)
        }

        fn line_metrics(&self, font: &Font) -> LineMetrics {
            HeadlessMetrics.line_metrics(font)
        }
    }

    fn layout(text: &str) -> TextLayout {
        let mut layout = TextLayout::with_font(Arc::new(HeadlessMetrics), Font::new("Sans", 10.));
        layout.set_text(text);
        layout
    }

    #[test]
    fn size_is_memoized_and_invalidated() {
        let metrics = Arc::new(CountingMetrics::default());
        let mut layout = TextLayout::with_font(metrics.clone(), Font::new("Sans", 10.));
        layout.set_text("Hi");
        let first = layout.get_size();
        let calls = metrics.0.load(Ordering::SeqCst);
        assert_eq!(layout.get_size(), first);
        assert_eq!(metrics.0.load(Ordering::SeqCst), calls);

        layout.set_text("Hello World");
        assert!(layout.get_size().x > first.x);

        let before = layout.get_size();
        layout.set_font(Font::new("Sans", 20.));
        assert!(layout.get_size().x > before.x);

        let before = layout.get_size();
        layout.set_width(30.);
        assert!(layout.get_size().y > before.y);
    }

    #[test]
    fn font_style_ranges_change_the_size() {
        let mut layout = layout("Hello World");
        let upright = layout.get_size();
        layout.set_font_style(0, 5, FontStyle::Italic).unwrap();
        let slanted = layout.get_size();
        assert!(slanted.x > upright.x);
        assert_eq!(slanted.y, upright.y);
        assert_eq!(layout.get_size(), slanted);
    }

    #[test]
    fn unconstrained_width_does_not_wrap() {
        let mut layout = layout("one two three four");
        layout.set_width(-1.);
        assert_eq!(layout.width(), None);
        assert_eq!(layout.lines().len(), 1);
        assert_eq!(layout.get_size(), Vector2::new(90., 12.));
    }

    #[test]
    fn wraps_to_width() {
        let mut layout = layout("one two three four");
        layout.set_width(40.);
        let lines: Vec<String> = layout.lines().into_iter().map(|l| l.text).collect();
        assert_eq!(lines, vec!["one two ", "three ", "four"]);
        assert_eq!(layout.get_size(), Vector2::new(35., 36.));
    }

    #[test]
    fn word_ellipsis_truncates_at_word_boundary() {
        let mut layout = layout("The quick brown fox jumps over the lazy dog");
        layout.set_width(100.);
        layout.set_trimming(Trimming::WordElipsis);
        let text = layout.visible_text();
        assert_eq!(text, "The quick brown fox\u{2026}");
        assert!(layout.get_size().x <= 100.);

        layout.set_width(-1.);
        assert_eq!(layout.visible_text(), "The quick brown fox jumps over the lazy dog");
        assert_eq!(layout.get_size().x, 215.);
    }

    #[test]
    fn height_limits_lines() {
        let mut layout = layout("aa bb cc dd ee");
        layout.set_width(25.);
        layout.set_height(30.);
        layout.set_trimming(Trimming::CharacterElipsis);
        layout.set_ellipsis("...");
        let lines = layout.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ellipsized);
        assert!(lines[1].text.ends_with("..."));
        assert_eq!(layout.get_size().y, 24.);
    }

    #[test]
    fn bold_runs_are_measured() {
        let mut layout = layout("bold text");
        let plain = layout.get_size().x;
        layout.set_font_weight(0, 4, FontWeight::Bold).unwrap();
        assert!(layout.get_size().x > plain);
        layout.set_underline(0, 9).unwrap();
        let runs = layout.prepare().lines[0].runs.clone();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "bold");
        assert!(runs[0].underline && runs[1].underline);
        assert_eq!(runs[1].x, runs[0].width);
    }

    #[test]
    fn attribute_ranges_are_checked() {
        let mut layout = layout("héllo");
        assert!(layout.set_underline(0, 5).is_ok());
        assert_eq!(
            layout.set_strikethrough(3, 3),
            Err(Error::InvalidRange {
                start: 3,
                length: 3,
                len: 5
            })
        );
        assert!(layout.set_foreground(usize::max_value(), 2, Color::RED).is_err());
        layout.set_text("x");
        assert!(layout.attributes().is_empty());
    }

    #[test]
    fn alignment_only_moves_lines() {
        let mut layout = layout("abcd");
        layout.set_width(100.);
        let size = layout.get_size();
        layout.set_alignment(Alignment::Center);
        assert_eq!(layout.get_size(), size);
        assert_eq!(layout.lines()[0].x, 40.);
        layout.set_alignment(Alignment::End);
        assert_eq!(layout.lines()[0].x, 80.);
    }

    #[test]
    fn hit_testing() {
        let mut layout = layout("ab\ncd");
        layout.set_width(-1.);
        assert_eq!(layout.index_at_point(Point2::new(6., 1.)), Some(1));
        assert_eq!(layout.index_at_point(Point2::new(1., 13.)), Some(3));
        assert_eq!(layout.index_at_point(Point2::new(1., 40.)), None);
        assert_eq!(layout.point_at_index(4), Some(Point2::new(5., 12.)));
    }
}
