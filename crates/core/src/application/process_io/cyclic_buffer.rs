// Fixed-size cyclic buffer comparing the trailing characters with a prompt

/// Holds the last N characters seen, N being the active prompt length
#[derive(Debug, Default)]
pub struct CyclicBuffer {
    prompt: Vec<char>,
    buf: Vec<char>,
    pos: usize,
    filled: usize,
}

impl CyclicBuffer {
    pub fn new(prompt: Option<&str>) -> Self {
        let mut buffer = Self::default();
        buffer.resize(prompt);
        buffer
    }

    /// Switch to a new prompt, dropping any buffered characters
    pub fn resize(&mut self, prompt: Option<&str>) {
        self.prompt = prompt.map(|p| p.chars().collect()).unwrap_or_default();
        self.buf = vec!['\0'; self.prompt.len()];
        self.clear();
    }

    pub fn clear(&mut self) {
        self.pos = 0;
        self.filled = 0;
    }

    /// Append `c`; true when the trailing characters now equal the prompt
    pub fn push(&mut self, c: char) -> bool {
        let len = self.prompt.len();
        if len == 0 {
            return false;
        }
        self.buf[self.pos] = c;
        self.pos = (self.pos + 1) % len;
        self.filled = (self.filled + 1).min(len);
        if self.filled < len {
            return false;
        }
        // pos now points at the oldest character
        (0..len).all(|i| self.buf[(self.pos + i) % len] == self.prompt[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_all(buffer: &mut CyclicBuffer, s: &str) -> Vec<bool> {
        s.chars().map(|c| buffer.push(c)).collect()
    }

    #[test]
    fn test_matches_trailing_prompt() {
        let mut buffer = CyclicBuffer::new(Some("password>"));
        let hits = push_all(&mut buffer, "Enter admin password>");
        assert_eq!(hits.iter().filter(|h| **h).count(), 1);
        assert!(*hits.last().unwrap());
    }

    #[test]
    fn test_no_prompt_never_matches() {
        let mut buffer = CyclicBuffer::new(None);
        assert!(push_all(&mut buffer, "anything>").iter().all(|h| !h));
    }

    #[test]
    fn test_resize_resets_state() {
        let mut buffer = CyclicBuffer::new(Some("ab"));
        buffer.push('a');
        buffer.resize(Some("b>"));
        assert!(!buffer.push('b'));
        assert!(buffer.push('>'));
    }
}
