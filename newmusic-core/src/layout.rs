//! Greedy word wrap and the vertical cursor used to stack blocks on the card.

/// The running vertical offset of a render pass, in pixels.
///
/// Passed by value through each layout step and handed back advanced; nothing
/// else holds it.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct LayoutCursor(pub f32);
impl LayoutCursor {
    pub fn y(self) -> f32 {
        self.0
    }

    #[must_use]
    pub fn advance(self, by: f32) -> Self {
        Self(self.0 + by)
    }
}

/// One line emitted by [`TextFlow::flow`], positioned at its baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextFlowOutput {
    pub lines: Vec<PlacedLine>,
    /// The baseline of the last line drawn. Not the next free line: callers
    /// stacking another block add their own spacing.
    pub last_y: f32,
}

/// Wraps text into a column of fixed width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextFlow {
    pub max_width: f32,
    pub line_height: f32,
}
impl TextFlow {
    pub fn new(max_width: f32, line_height: f32) -> Self {
        Self {
            max_width,
            line_height,
        }
    }

    /// Lay out `text` starting with a baseline at `(x, y)`.
    ///
    /// Words are split on single spaces and packed greedily. A word moves to a
    /// new line when the candidate line (with its trailing space) measures wider
    /// than `max_width`, unless it is the first word on its line; a single
    /// overlong word is placed as-is and never split. The final partial line is
    /// always emitted, even when empty.
    pub fn flow(
        &self,
        text: &str,
        x: f32,
        y: f32,
        mut measure: impl FnMut(&str) -> f32,
    ) -> TextFlowOutput {
        let mut lines = vec![];
        let mut y = y;
        let mut line = String::new();
        for (i, word) in text.split(' ').enumerate() {
            let candidate = format!("{line}{word} ");
            if measure(&candidate) > self.max_width && i > 0 {
                lines.push(PlacedLine {
                    text: line.trim_end().to_string(),
                    x,
                    y,
                });
                line = format!("{word} ");
                y += self.line_height;
            } else {
                line = candidate;
            }
        }
        lines.push(PlacedLine {
            text: line.trim_end().to_string(),
            x,
            y,
        });

        TextFlowOutput { lines, last_y: y }
    }

    /// Lay out and draw `text`, returning the baseline of the last drawn line.
    pub fn wrap(
        &self,
        text: &str,
        x: f32,
        y: f32,
        measure: impl FnMut(&str) -> f32,
        mut draw: impl FnMut(&str, f32, f32),
    ) -> f32 {
        let output = self.flow(text, x, y, measure);
        for line in &output.lines {
            draw(&line.text, line.x, line.y);
        }
        output.last_y
    }
}
