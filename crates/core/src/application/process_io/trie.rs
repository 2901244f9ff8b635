// Prefix trie over a token's success and error strings

use std::collections::HashMap;

/// Which expectation set a string belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Success,
    Error,
}

/// A string of the token matched somewhere in a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieMatch {
    pub kind: MatchKind,
    /// Index in the token's success or error list
    pub index: usize,
}

#[derive(Debug, Default)]
struct Node {
    children: HashMap<char, usize>,
    hits: Vec<TrieMatch>,
}

#[derive(Debug)]
pub struct PrefixTrie {
    nodes: Vec<Node>,
}

impl Default for PrefixTrie {
    fn default() -> Self {
        Self {
            nodes: vec![Node::default()],
        }
    }
}

impl PrefixTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a token's expectation sets; empty strings are skipped
    pub fn from_sets(success: &[String], error: &[String]) -> Self {
        let mut trie = Self::new();
        for (index, key) in success.iter().enumerate() {
            trie.insert(key, TrieMatch { kind: MatchKind::Success, index });
        }
        for (index, key) in error.iter().enumerate() {
            trie.insert(key, TrieMatch { kind: MatchKind::Error, index });
        }
        trie
    }

    pub fn insert(&mut self, key: &str, hit: TrieMatch) {
        if key.is_empty() {
            return;
        }
        let mut node = 0;
        for c in key.chars() {
            node = match self.nodes[node].children.get(&c) {
                Some(&next) => next,
                None => {
                    self.nodes.push(Node::default());
                    let next = self.nodes.len() - 1;
                    self.nodes[node].children.insert(c, next);
                    next
                }
            };
        }
        self.nodes[node].hits.push(hit);
    }

    /// Every key that starts at `start` in `chars`
    fn matches_at(&self, chars: &[char], start: usize, out: &mut Vec<TrieMatch>) {
        let mut node = 0;
        for c in &chars[start..] {
            match self.nodes[node].children.get(c) {
                Some(&next) => {
                    node = next;
                    out.extend_from_slice(&self.nodes[node].hits);
                }
                None => return,
            }
        }
    }

    /// Scan a line at every start offset
    pub fn scan(&self, line: &str) -> Vec<TrieMatch> {
        let chars: Vec<char> = line.chars().collect();
        let mut out = Vec::new();
        for start in 0..chars.len() {
            self.matches_at(&chars, start, &mut out);
        }
        out
    }
}
