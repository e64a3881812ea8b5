//! Text emission shared by the postprocessors
//!
//! [`NumberFormat`] turns values into fixed-precision text, [`Modal`] drops
//! repeated words and [`LineWriter`] collects finished lines. Everything
//! that has to stay consistent for a whole run lives in [`RenderState`].

use std::fmt;

use crate::math::RunCounters;

pub mod format;
pub mod words;

pub use format::{NumberFormat, Scale};
pub use words::{Incremental, Modal};

/// Output lines of one file.
#[derive(Debug, Clone)]
pub struct LineWriter {
    lines: Vec<String>,
    spacer: String,
    line_numbers: Option<Incremental>,
    tags: Vec<String>,
}

impl Default for LineWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl LineWriter {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            spacer: " ".to_string(),
            line_numbers: None,
            tags: Vec::new(),
        }
    }

    pub fn with_spacer(mut self, spacer: &str) -> Self {
        self.spacer = spacer.to_string();
        self
    }

    /// Prefix numbered lines with `N<first>`, `N<first + step>`, ...
    pub fn with_line_numbers(mut self, first: f64, step: f64) -> Self {
        self.line_numbers = Some(Incremental::new(NumberFormat::new(0).prefix("N"), first, step));
        self
    }

    pub fn spacer(&self) -> &str {
        &self.spacer
    }

    /// Append a line. Empty lines are dropped and do not take a number.
    pub fn emit(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        match self.line_numbers.as_mut() {
            Some(numbers) => {
                let nr = numbers.next_word();
                self.lines.push(format!("{}{}{}", nr, self.spacer, line));
            }
            None => self.lines.push(line.to_string()),
        }
    }

    /// Append a line that is never numbered, such as the `%` delimiters.
    pub fn emit_raw(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    /// Join the non-empty words with the spacer.
    pub fn join_words<I, S>(&self, words: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        words
            .into_iter()
            .filter(|w| !w.as_ref().is_empty())
            .map(|w| w.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(&self.spacer)
    }

    /// `( words )` with the spacer on both sides.
    pub fn comment<I, S>(&self, words: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        format!("({}{}{})", self.spacer, self.join_words(words), self.spacer)
    }

    pub fn emit_comment(&mut self, text: &str) {
        let comment = self.comment([text]);
        self.emit(&comment);
    }

    pub fn open_tag(&mut self, tag: &str) {
        self.emit(&format!("<{}>", tag));
        self.tags.push(tag.to_string());
    }

    /// Closes the most recently opened tag.
    pub fn close_tag(&mut self) {
        if let Some(tag) = self.tags.pop() {
            self.emit(&format!("</{}>", tag));
        }
    }

    pub fn tag_value(&mut self, tag: &str, value: &str) {
        self.emit(&format!("<{}>{}</{}>", tag, value, tag));
    }

    pub fn append(&mut self, other: LineWriter) {
        self.lines.extend(other.lines);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl fmt::Display for LineWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

/// Counters owned by one postprocessing run.
#[derive(Debug)]
pub struct RenderState {
    program: Incremental,
    pub counters: RunCounters,
    polyline_id: u32,
    sequence_id: u32,
}

impl Default for RenderState {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderState {
    pub fn new() -> Self {
        Self {
            program: Incremental::new(NumberFormat::new(0).prefix("O").width(4).zero_pad(), 1.0, 1.0),
            counters: RunCounters::new(),
            polyline_id: 0,
            sequence_id: 0,
        }
    }

    /// `O0001`, `O0002`, ... one per program file of the run.
    pub fn next_program_word(&mut self) -> String {
        self.program.next_word()
    }

    /// Start a new polyline; its sequence numbering restarts.
    pub fn next_polyline(&mut self) -> u32 {
        self.polyline_id += 1;
        self.sequence_id = 0;
        self.polyline_id
    }

    pub fn polyline_id(&self) -> u32 {
        self.polyline_id
    }

    pub fn next_sequence(&mut self) -> u32 {
        self.sequence_id += 1;
        self.sequence_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_drops_empty_lines() {
        let mut out = LineWriter::new();
        out.emit("G90");
        out.emit("");
        out.emit("G21");
        assert_eq!(out.to_string(), "G90\nG21\n");
    }

    #[test]
    fn test_line_numbers_skip_raw_lines() {
        let mut out = LineWriter::new().with_line_numbers(10.0, 10.0);
        out.emit_raw("%");
        out.emit("G90");
        out.emit("");
        out.emit("G21");
        assert_eq!(out.lines(), &["%", "N10 G90", "N20 G21"]);
    }

    #[test]
    fn test_words_and_comments() {
        let out = LineWriter::new();
        assert_eq!(out.join_words(["G00", "", "X1.000"]), "G00 X1.000");
        assert_eq!(out.comment(["Part:", "", "code= P1"]), "( Part: code= P1 )");
        let tabs = LineWriter::new().with_spacer("\t");
        assert_eq!(tabs.join_words(["M05", "M30"]), "M05\tM30");
    }

    #[test]
    fn test_tags() {
        let mut out = LineWriter::new();
        out.open_tag("PartDraw");
        out.open_tag("Draw");
        out.tag_value("X", "10");
        out.close_tag();
        out.close_tag();
        out.close_tag();
        assert_eq!(out.to_string(), "<PartDraw>\n<Draw>\n<X>10</X>\n</Draw>\n</PartDraw>\n");
    }

    #[test]
    fn test_render_state_counters() {
        let mut state = RenderState::new();
        assert_eq!(state.next_program_word(), "O0001");
        assert_eq!(state.next_program_word(), "O0002");
        assert_eq!(state.next_polyline(), 1);
        assert_eq!(state.next_sequence(), 1);
        assert_eq!(state.next_sequence(), 2);
        assert_eq!(state.next_polyline(), 2);
        assert_eq!(state.next_sequence(), 1);
        assert_eq!(state.polyline_id(), 2);
    }
}
