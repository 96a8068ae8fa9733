//! Line breaking and truncation.

use std::ops::Range;

// tolerance for float comparisons of accumulated advances
const EPSILON: f64 = 1e-9;

/// How text is wrapped when a width constraint is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WrapMode {
    /// No wrapping; every paragraph is one line.
    None,
    /// Wrap at word boundaries; words longer than a line overflow.
    Word,
    /// Wrap between any two characters.
    Character,
    /// Wrap at word boundaries, splitting words that do not fit on a line by themselves.
    WordCharacter,
}

/// How overflowing text is truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trimming {
    None,
    WordElipsis,
    CharacterElipsis,
}

/// A laid out line, before alignment.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LineBox {
    /// Visible character range (without the ellipsis).
    pub range: Range<usize>,
    /// Advance width, including the ellipsis if present.
    pub width: f64,
    pub ellipsis: bool,
}

pub(crate) struct BreakParams<'a> {
    pub chars: &'a [char],
    /// Advance of every character, already measured in its styled font.
    pub advances: &'a [f64],
    pub width: Option<f64>,
    pub wrap: WrapMode,
    pub trimming: Trimming,
    pub max_lines: Option<usize>,
    pub ellipsis_width: f64,
}

fn is_space(c: char) -> bool {
    c.is_whitespace() && c != '\n'
}

impl<'a> BreakParams<'a> {
    fn sum(&self, range: Range<usize>) -> f64 {
        self.advances[range].iter().sum()
    }

    /// End of the range with trailing whitespace removed.
    fn trimmed_end(&self, range: Range<usize>) -> usize {
        let mut end = range.end;
        while end > range.start && is_space(self.chars[end - 1]) {
            end -= 1;
        }
        end
    }

    /// Width of a line; trailing whitespace hangs and is not counted.
    fn line_width(&self, range: Range<usize>) -> f64 {
        let end = self.trimmed_end(range.clone());
        self.sum(range.start..end)
    }

    fn paragraphs(&self) -> Vec<Range<usize>> {
        let mut paragraphs = Vec::new();
        let mut start = 0;
        for (i, &c) in self.chars.iter().enumerate() {
            if c == '\n' {
                paragraphs.push(start..i);
                start = i + 1;
            }
        }
        paragraphs.push(start..self.chars.len());
        paragraphs
    }

    fn wrap_words(&self, range: Range<usize>, width: f64, split_words: bool, out: &mut Vec<Range<usize>>) {
        let mut line_start = range.start;
        // width up to the end of the last word on the line
        let mut line_width = 0.;
        // whitespace after the last word on the line
        let mut pending_space = 0.;
        let mut i = range.start;

        while i < range.end {
            let word_start = i;
            while i < range.end && !is_space(self.chars[i]) {
                i += 1;
            }
            let word_end = i;
            while i < range.end && is_space(self.chars[i]) {
                i += 1;
            }
            let word_width = self.sum(word_start..word_end);
            let space_width = self.sum(word_end..i);

            if word_start != line_start {
                if line_width + pending_space + word_width <= width + EPSILON {
                    line_width += pending_space + word_width;
                    pending_space = space_width;
                    continue;
                }
                out.push(line_start..word_start);
                line_start = word_start;
            }

            // the word starts a new line
            if split_words && word_width > width + EPSILON {
                let mut w = 0.;
                for j in word_start..word_end {
                    let advance = self.advances[j];
                    if w > 0. && w + advance > width + EPSILON {
                        out.push(line_start..j);
                        line_start = j;
                        w = 0.;
                    }
                    w += advance;
                }
                line_width = w;
            } else {
                line_width = word_width;
            }
            pending_space = space_width;
        }
        out.push(line_start..range.end);
    }

    fn wrap_chars(&self, range: Range<usize>, width: f64, out: &mut Vec<Range<usize>>) {
        let mut line_start = range.start;
        let mut w = 0.;
        for j in range.clone() {
            let advance = self.advances[j];
            if j > line_start && !is_space(self.chars[j]) && w + advance > width + EPSILON {
                out.push(line_start..j);
                line_start = j;
                w = 0.;
            }
            w += advance;
        }
        out.push(line_start..range.end);
    }

    /// Shortens a line so that it and the ellipsis fit into `limit`.
    fn ellipsize(&self, line: &mut LineBox, limit: f64) {
        let available = limit - self.ellipsis_width;
        let start = line.range.start;
        let end = match self.trimming {
            Trimming::None => return,
            Trimming::CharacterElipsis => {
                let mut w = 0.;
                let mut j = start;
                while j < line.range.end && w + self.advances[j] <= available + EPSILON {
                    w += self.advances[j];
                    j += 1;
                }
                self.trimmed_end(start..j)
            }
            Trimming::WordElipsis => {
                let mut best = start;
                for k in start + 1..=line.range.end {
                    let word_end = !is_space(self.chars[k - 1])
                        && (k == line.range.end || is_space(self.chars[k]));
                    if !word_end {
                        continue;
                    }
                    if self.sum(start..k) <= available + EPSILON {
                        best = k;
                    } else {
                        break;
                    }
                }
                best
            }
        };
        line.range = start..end;
        line.width = self.sum(start..end) + self.ellipsis_width;
        line.ellipsis = true;
    }

    /// Breaks the text into lines, applying the line limit and trimming.
    pub fn break_lines(&self) -> Vec<LineBox> {
        // with trimming and no height, every paragraph is a single truncated line
        let single_line = match self.width {
            None => true,
            Some(_) => {
                self.wrap == WrapMode::None
                    || (self.trimming != Trimming::None && self.max_lines.is_none())
            }
        };

        let mut ranges = Vec::new();
        for paragraph in self.paragraphs() {
            match self.width {
                Some(width) if !single_line => match self.wrap {
                    WrapMode::Word => self.wrap_words(paragraph, width, false, &mut ranges),
                    WrapMode::WordCharacter => self.wrap_words(paragraph, width, true, &mut ranges),
                    WrapMode::Character => self.wrap_chars(paragraph, width, &mut ranges),
                    WrapMode::None => ranges.push(paragraph),
                },
                _ => ranges.push(paragraph),
            }
        }

        let mut lines: Vec<LineBox> = ranges
            .into_iter()
            .map(|range| LineBox {
                width: self.line_width(range.clone()),
                range,
                ellipsis: false,
            })
            .collect();

        let mut cut_last = false;
        if let Some(max) = self.max_lines {
            let max = max.max(1);
            if lines.len() > max {
                lines.truncate(max);
                cut_last = true;
            }
        }

        if self.trimming != Trimming::None {
            let limit = self.width.unwrap_or(std::f64::INFINITY);
            let last = lines.len() - 1;
            for (i, line) in lines.iter_mut().enumerate() {
                if (i == last && cut_last) || line.width > limit + EPSILON {
                    self.ellipsize(line, limit);
                }
            }
        }
        lines
    }
}
