//! Process-IO verification state machine
//!
//! Classifies the interleaved output of a local process against an ordered
//! list of expected tokens. Characters go through [`lexer::LineLexer`]; every
//! completed line is scanned with the active token's [`trie::PrefixTrie`].
//! A token is satisfied once all of its success strings have been seen, at
//! which point its reply (if any) is sent and the next token becomes active.
//! Any error string yields ERROR, which is never downgraded.

pub mod cyclic_buffer;
pub mod lexer;
pub mod trie;

use crate::domain::{ProcessIoContent, Token};
use lexer::LineLexer;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};
use trie::{MatchKind, PrefixTrie};

const READ_CHUNK: usize = 4096;

/// Verdict over the whole conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessIoResult {
    Success,
    Error,
    Unknown,
}

pub struct ProcessIoParser {
    tokens: Vec<Token>,
    index: usize,
    lexer: LineLexer,
    trie: PrefixTrie,
    fired: Vec<bool>,
    verdict: ProcessIoResult,
    output: Vec<String>,
}

impl ProcessIoParser {
    pub fn new(content: &ProcessIoContent) -> Self {
        let tokens = content.tokens().to_vec();
        let mut parser = Self {
            lexer: LineLexer::new(None),
            trie: PrefixTrie::new(),
            fired: Vec::new(),
            tokens,
            index: 0,
            verdict: ProcessIoResult::Unknown,
            output: Vec::new(),
        };
        parser.activate();
        parser
    }

    /// Configure trie, fired set and prompt for the current token
    fn activate(&mut self) {
        match self.tokens.get(self.index) {
            Some(token) => {
                self.trie = PrefixTrie::from_sets(token.success(), token.error());
                // Empty success strings can never fire, count them as seen
                self.fired = token.success().iter().map(String::is_empty).collect();
                self.lexer.set_prompt(token.prompt());
            }
            None => {
                // Past the last token only its error strings still count
                self.trie = match self.tokens.last() {
                    Some(last) => PrefixTrie::from_sets(&[], last.error()),
                    None => PrefixTrie::new(),
                };
                self.fired.clear();
                self.lexer.set_prompt(None);
            }
        }
    }

    /// Feed a chunk of process output, returning replies to send in order
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        let mut replies = Vec::new();
        let mut lines = Vec::new();
        for c in chunk.chars() {
            self.lexer.push(c, &mut lines);
            // Lines are handled before the next character: a satisfied token
            // may switch the prompt
            for line in lines.drain(..) {
                if let Some(reply) = self.on_line(line) {
                    replies.push(reply);
                }
            }
        }
        replies
    }

    /// One source ended but another follows (stdout then stderr): flush the
    /// trailing partial line, keep parsing
    pub fn end_source(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        self.lexer.break_line(&mut lines);
        lines.into_iter().filter_map(|line| self.on_line(line)).collect()
    }

    /// End of stream: flush the trailing partial line
    pub fn finish(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        self.lexer.finish(&mut lines);
        lines.into_iter().filter_map(|line| self.on_line(line)).collect()
    }

    fn on_line(&mut self, line: String) -> Option<String> {
        debug!(line = %line, token = self.index, "Process output line");
        let hits = if self.verdict == ProcessIoResult::Error {
            Vec::new()
        } else {
            self.trie.scan(&line)
        };
        self.output.push(line);

        for hit in hits {
            match hit.kind {
                MatchKind::Error => {
                    self.verdict = ProcessIoResult::Error;
                    return None;
                }
                MatchKind::Success => self.fired[hit.index] = true,
            }
        }

        if self.index >= self.tokens.len() || self.verdict == ProcessIoResult::Error {
            return None;
        }
        if !self.fired.iter().all(|f| *f) {
            return None;
        }

        self.verdict = ProcessIoResult::Success;
        let reply = self.tokens[self.index].reply().map(str::to_string);
        self.index += 1;
        self.activate();
        reply
    }

    pub fn result(&self) -> ProcessIoResult {
        self.verdict
    }

    /// Every completed line in arrival order
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn output_text(&self) -> String {
        self.output.join("\n")
    }

    /// Index of the active token, equal to the token count once all matched
    pub fn token_index(&self) -> usize {
        self.index
    }
}

/// Split off the longest valid UTF-8 prefix of `pending`; invalid sequences
/// become U+FFFD, an incomplete trailing sequence stays buffered
fn take_utf8(pending: &mut Vec<u8>) -> String {
    let mut out = String::new();
    loop {
        match std::str::from_utf8(pending) {
            Ok(s) => {
                out.push_str(s);
                pending.clear();
                return out;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                match e.error_len() {
                    None => {
                        out.push_str(&String::from_utf8_lossy(&pending[..valid]));
                        pending.drain(..valid);
                        return out;
                    }
                    Some(len) => {
                        out.push_str(&String::from_utf8_lossy(&pending[..valid + len]));
                        pending.drain(..valid + len);
                    }
                }
            }
        }
    }
}

/// Run the parser over a process's stdout, answering prompts on stdin
///
/// Returns once stdout reaches EOF, with the partial last line flushed but the
/// parser still open: the caller feeds any further source (stderr) and then
/// calls [`ProcessIoParser::finish`]. Replies are written followed by a newline.
///
/// # Errors
/// I/O errors reading stdout or writing a reply
pub async fn drive<R, W>(
    parser: &mut ProcessIoParser,
    mut stdout: R,
    mut stdin: Option<W>,
) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK];
    let mut pending = Vec::new();
    loop {
        let n = stdout.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        pending.extend_from_slice(&buf[..n]);
        let text = take_utf8(&mut pending);
        let replies = parser.feed(&text);
        send_replies(&mut stdin, replies).await?;
    }
    if !pending.is_empty() {
        let tail = String::from_utf8_lossy(&pending).into_owned();
        let replies = parser.feed(&tail);
        send_replies(&mut stdin, replies).await?;
    }
    let replies = parser.end_source();
    send_replies(&mut stdin, replies).await?;
    Ok(())
}

async fn send_replies<W: AsyncWrite + Unpin>(
    stdin: &mut Option<W>,
    replies: Vec<String>,
) -> std::io::Result<()> {
    for reply in replies {
        match stdin.as_mut() {
            Some(w) => {
                w.write_all(reply.as_bytes()).await?;
                w.write_all(b"\n").await?;
                w.flush().await?;
            }
            None => warn!("Process expects input but stdin is not attached"),
        }
    }
    Ok(())
}
