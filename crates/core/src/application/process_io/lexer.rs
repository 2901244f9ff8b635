// Character-level line lexer
//
// States: START, LINE, CR, ERROR. Inputs are classified as text, prompt
// (the trailing characters equal the active prompt), CR or LF. A line is
// emitted on LF, on a prompt match, or when a CR is followed by anything
// but LF.

use super::cyclic_buffer::CyclicBuffer;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexState {
    Start,
    Line,
    Cr,
    /// Stream closed, further input is ignored
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputClass {
    Text,
    Prompt,
    Cr,
    Lf,
}

#[derive(Debug)]
pub struct LineLexer {
    state: LexState,
    line: String,
    prompt: CyclicBuffer,
}

impl LineLexer {
    pub fn new(prompt: Option<&str>) -> Self {
        Self {
            state: LexState::Start,
            line: String::new(),
            prompt: CyclicBuffer::new(prompt),
        }
    }

    pub fn state(&self) -> LexState {
        self.state
    }

    /// Change the prompt recognised from the next character on
    pub fn set_prompt(&mut self, prompt: Option<&str>) {
        self.prompt.resize(prompt);
    }

    fn classify(&mut self, c: char) -> InputClass {
        let prompt_hit = self.prompt.push(c);
        match c {
            '\n' => InputClass::Lf,
            '\r' => InputClass::Cr,
            _ if prompt_hit => InputClass::Prompt,
            _ => InputClass::Text,
        }
    }

    fn emit(&mut self, out: &mut Vec<String>) {
        out.push(std::mem::take(&mut self.line));
    }

    /// Feed one character, pushing completed lines into `out`
    pub fn push(&mut self, c: char, out: &mut Vec<String>) {
        if self.state == LexState::Error {
            warn!("Input after end of stream ignored");
            return;
        }
        let class = self.classify(c);
        self.state = match (self.state, class) {
            (LexState::Start | LexState::Line, InputClass::Text) => {
                self.line.push(c);
                LexState::Line
            }
            (LexState::Start | LexState::Line, InputClass::Prompt) => {
                self.line.push(c);
                self.emit(out);
                self.prompt.clear();
                LexState::Start
            }
            (LexState::Start | LexState::Line, InputClass::Cr) => LexState::Cr,
            (LexState::Start | LexState::Line, InputClass::Lf) => {
                self.emit(out);
                LexState::Start
            }
            (LexState::Cr, InputClass::Text) => {
                self.emit(out);
                self.line.push(c);
                LexState::Line
            }
            (LexState::Cr, InputClass::Prompt) => {
                self.emit(out);
                self.line.push(c);
                self.emit(out);
                self.prompt.clear();
                LexState::Start
            }
            (LexState::Cr, InputClass::Cr) => {
                self.emit(out);
                LexState::Cr
            }
            (LexState::Cr, InputClass::Lf) => {
                self.emit(out);
                LexState::Start
            }
            (LexState::Error, _) => LexState::Error,
        };
    }

    /// End of stream: flush a trailing partial line and close
    pub fn finish(&mut self, out: &mut Vec<String>) {
        self.break_line(out);
        self.state = LexState::Error;
    }

    /// Source boundary: flush the partial line but keep accepting input
    pub fn break_line(&mut self, out: &mut Vec<String>) {
        match self.state {
            LexState::Line | LexState::Cr => {
                self.emit(out);
                self.state = LexState::Start;
            }
            LexState::Start | LexState::Error => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str, prompt: Option<&str>) -> Vec<String> {
        let mut lexer = LineLexer::new(prompt);
        let mut out = Vec::new();
        for c in input.chars() {
            lexer.push(c, &mut out);
        }
        lexer.finish(&mut out);
        out
    }

    #[test]
    fn test_line_endings_normalized() {
        assert_eq!(lex("a\nb\r\nc\rd", None), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_empty_lines_kept() {
        assert_eq!(lex("a\n\nb\n", None), vec!["a", "", "b"]);
        assert_eq!(lex("a\r\rb", None), vec!["a", "", "b"]);
    }

    #[test]
    fn test_prompt_ends_line() {
        assert_eq!(
            lex("Enter password>secret\n", Some("password>")),
            vec!["Enter password>", "secret"]
        );
    }

    #[test]
    fn test_trailing_partial_line_flushed() {
        assert_eq!(lex("no newline", None), vec!["no newline"]);
        assert_eq!(lex("cr at end\r", None), vec!["cr at end"]);
    }

    #[test]
    fn test_break_line_keeps_lexer_open() {
        let mut lexer = LineLexer::new(None);
        let mut out = Vec::new();
        for c in "partial".chars() {
            lexer.push(c, &mut out);
        }
        lexer.break_line(&mut out);
        for c in "next\n".chars() {
            lexer.push(c, &mut out);
        }
        assert_eq!(out, vec!["partial", "next"]);
        assert_eq!(lexer.state(), LexState::Start);
    }

    #[test]
    fn test_closed_lexer_ignores_input() {
        let mut lexer = LineLexer::new(None);
        let mut out = Vec::new();
        lexer.finish(&mut out);
        lexer.push('x', &mut out);
        lexer.finish(&mut out);
        assert!(out.is_empty());
        assert_eq!(lexer.state(), LexState::Error);
    }
}
