use crate::utils::charmap::classify;
use fnv::FnvHasher;
use std::hash::Hasher;
use std::io::{self, Read};

/// Words shorter than this (in normalized bytes) are scanned but never stored.
pub const MIN_TOKEN_LEN: usize = 2;

/// Default read size when streaming file contents.
pub const DEFAULT_BLOCK_SIZE: usize = 16 * 1024;

/// A stored word together with its place in the document stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Normalized text, built from classification fragments
    pub text: String,
    /// FNV-1a 64 of `text`, folded in one fragment at a time while scanning
    pub hash: u64,
    /// 0-based index among the stored tokens of the document
    pub position: u32,
}

/// Incremental word scanner.
///
/// Code points are pushed one at a time; a token pops out whenever a boundary
/// closes a word of at least [`MIN_TOKEN_LEN`] bytes. The scanner carries no
/// state besides the pending word, so input may arrive in any number of
/// pieces.
pub struct WordScanner {
    word: String,
    hasher: FnvHasher,
    position: u32,
}

impl Default for WordScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl WordScanner {
    pub fn new() -> Self {
        Self {
            word: String::new(),
            hasher: FnvHasher::default(),
            position: 0,
        }
    }

    #[inline]
    pub fn push(&mut self, c: char) -> Option<Token> {
        match classify(c) {
            Some(fragment) => {
                self.word.push_str(fragment);
                self.hasher.write(fragment.as_bytes());
                None
            }
            None => self.close_word(),
        }
    }

    /// Flush the pending word at end of stream.
    pub fn finish(&mut self) -> Option<Token> {
        self.close_word()
    }

    /// Number of tokens stored so far.
    pub fn stored(&self) -> u32 {
        self.position
    }

    fn close_word(&mut self) -> Option<Token> {
        if self.word.is_empty() {
            return None;
        }
        let hasher = std::mem::take(&mut self.hasher);
        if self.word.len() < MIN_TOKEN_LEN {
            self.word.clear();
            return None;
        }

        let token = Token {
            text: std::mem::take(&mut self.word),
            hash: hasher.finish(),
            position: self.position,
        };
        self.position += 1;
        Some(token)
    }
}

/// Hash of a normalized word, equal to the `hash` of the token that produced it.
pub fn word_hash(word: &str) -> u64 {
    let mut hasher = FnvHasher::default();
    hasher.write(word.as_bytes());
    hasher.finish()
}

/// Tokenize an in-memory string (used for path text and queries).
pub fn tokenize_str(text: &str) -> impl Iterator<Item = Token> + '_ {
    let mut chars = text.chars();
    let mut scanner = WordScanner::new();
    let mut done = false;

    std::iter::from_fn(move || {
        if done {
            return None;
        }
        for c in chars.by_ref() {
            if let Some(token) = scanner.push(c) {
                return Some(token);
            }
        }
        done = true;
        scanner.finish()
    })
}

/// Lazy token stream over a reader consumed in fixed-size blocks.
///
/// Words and UTF-8 sequences split across block boundaries are reassembled;
/// the final pending word is flushed only after the reader is exhausted.
pub struct Tokens<R> {
    reader: R,
    block: Vec<u8>,
    decoder: BlockDecoder,
    units: Vec<char>,
    cursor: usize,
    scanner: WordScanner,
    state: StreamState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Reading,
    Draining,
    Done,
}

impl<R: Read> Tokens<R> {
    pub fn new(reader: R, block_size: usize) -> Self {
        Self {
            reader,
            block: vec![0; block_size.max(1)],
            decoder: BlockDecoder::default(),
            units: Vec::with_capacity(block_size.max(1)),
            cursor: 0,
            scanner: WordScanner::new(),
            state: StreamState::Reading,
        }
    }

    /// Number of tokens yielded so far.
    pub fn stored(&self) -> u32 {
        self.scanner.stored()
    }
}

impl<R: Read> Iterator for Tokens<R> {
    type Item = io::Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            while self.cursor < self.units.len() {
                let c = self.units[self.cursor];
                self.cursor += 1;
                if let Some(token) = self.scanner.push(c) {
                    return Some(Ok(token));
                }
            }

            match self.state {
                StreamState::Reading => {}
                StreamState::Draining => {
                    self.state = StreamState::Done;
                    return self.scanner.finish().map(Ok);
                }
                StreamState::Done => return None,
            }

            self.cursor = 0;
            self.units.clear();
            match self.reader.read(&mut self.block) {
                Ok(0) => {
                    self.decoder.finish(&mut self.units);
                    self.state = StreamState::Draining;
                }
                Ok(n) => self.decoder.decode(&self.block[..n], &mut self.units),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.state = StreamState::Done;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Decodes byte blocks into code points.
///
/// A UTF-8 sequence cut by a block boundary is held back until the next block
/// completes it. Bytes that do not form valid UTF-8 decode as Latin-1 units.
#[derive(Default)]
struct BlockDecoder {
    carry: Vec<u8>,
}

impl BlockDecoder {
    fn decode(&mut self, block: &[u8], out: &mut Vec<char>) {
        let mut rest = block;

        if !self.carry.is_empty() {
            let need = sequence_len(self.carry[0]);
            let take = rest
                .iter()
                .take(need.saturating_sub(self.carry.len()))
                .take_while(|&&b| is_continuation(b))
                .count();
            self.carry.extend_from_slice(&rest[..take]);
            rest = &rest[take..];

            if self.carry.len() < need && rest.is_empty() {
                return;
            }
            let carry = std::mem::take(&mut self.carry);
            decode_complete(&carry, out);
        }

        let split = rest.len() - incomplete_tail(rest);
        decode_complete(&rest[..split], out);
        self.carry.extend_from_slice(&rest[split..]);
    }

    fn finish(&mut self, out: &mut Vec<char>) {
        let carry = std::mem::take(&mut self.carry);
        decode_complete(&carry, out);
    }
}

fn decode_complete(bytes: &[u8], out: &mut Vec<char>) {
    for chunk in bytes.utf8_chunks() {
        out.extend(chunk.valid().chars());
        out.extend(chunk.invalid().iter().map(|&b| b as char));
    }
}

#[inline]
fn is_continuation(b: u8) -> bool {
    b & 0xC0 == 0x80
}

#[inline]
fn sequence_len(lead: u8) -> usize {
    match lead {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    }
}

/// Length of a trailing UTF-8 sequence that needs more bytes to complete.
fn incomplete_tail(bytes: &[u8]) -> usize {
    for back in 1..=bytes.len().min(3) {
        let b = bytes[bytes.len() - back];
        if is_continuation(b) {
            continue;
        }
        return if sequence_len(b) > back { back } else { 0 };
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reader handing out a fixed number of bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    fn words(tokens: impl Iterator<Item = Token>) -> Vec<(String, u32)> {
        tokens.map(|t| (t.text, t.position)).collect()
    }

    fn stream_words(data: &[u8], block_size: usize) -> Vec<(String, u32)> {
        Tokens::new(data, block_size)
            .map(|t| t.unwrap())
            .map(|t| (t.text, t.position))
            .collect()
    }

    /// Classify each unit on its own and group maximal constituent runs.
    fn reference_words(text: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut cur = String::new();
        for c in text.chars() {
            match classify(c) {
                Some(f) => cur.push_str(f),
                None => {
                    if cur.len() >= MIN_TOKEN_LEN {
                        out.push(cur.clone());
                    }
                    cur.clear();
                }
            }
        }
        if cur.len() >= MIN_TOKEN_LEN {
            out.push(cur);
        }
        out
    }

    #[test]
    fn test_positions_count_stored_tokens() {
        let got = words(tokenize_str("gamma abc def ghi abc"));
        assert_eq!(
            got,
            vec![
                ("gamma".to_string(), 0),
                ("abc".to_string(), 1),
                ("def".to_string(), 2),
                ("ghi".to_string(), 3),
                ("abc".to_string(), 4),
            ]
        );
    }

    #[test]
    fn test_single_characters_do_not_advance_position() {
        let got = words(tokenize_str("a big x cat"));
        assert_eq!(got, vec![("big".to_string(), 0), ("cat".to_string(), 1)]);
    }

    #[test]
    fn test_normalization() {
        let got: Vec<String> = tokenize_str("Hello, WORLD! snake_case été").map(|t| t.text).collect();
        assert_eq!(got, vec!["hello", "world", "snake_case", "ete"]);
    }

    #[test]
    fn test_path_text() {
        let got: Vec<String> = tokenize_str("/home/user/My Docs/notes.txt").map(|t| t.text).collect();
        assert_eq!(got, vec!["home", "user", "my", "docs", "notes", "txt"]);
    }

    #[test]
    fn test_empty_and_boundary_only() {
        assert!(tokenize_str("").next().is_none());
        assert!(tokenize_str("  ,.;  ").next().is_none());
        assert!(stream_words(b"", 16).is_empty());
    }

    #[test]
    fn test_incremental_hash_matches_whole_word() {
        let token = tokenize_str("Straße").next().unwrap();
        assert_eq!(token.text, "strasse");

        let mut hasher = FnvHasher::default();
        hasher.write(b"strasse");
        assert_eq!(token.hash, hasher.finish());
        assert_eq!(word_hash(&token.text), token.hash);
    }

    #[test]
    fn test_word_split_across_blocks() {
        let text = b"alpha beta gamma delta";
        let expected = stream_words(text, 1024);
        for block_size in 1..8 {
            assert_eq!(stream_words(text, block_size), expected, "block size {block_size}");
        }

        let trickled: Vec<_> = Tokens::new(Trickle { data: text, step: 3 }, 1024)
            .map(|t| t.unwrap().text)
            .collect();
        assert_eq!(trickled, vec!["alpha", "beta", "gamma", "delta"]);
    }

    #[test]
    fn test_utf8_sequence_split_across_blocks() {
        let text = "café crème brûlée".as_bytes();
        for block_size in 1..6 {
            let got: Vec<String> = stream_words(text, block_size).into_iter().map(|w| w.0).collect();
            assert_eq!(got, vec!["cafe", "creme", "brulee"], "block size {block_size}");
        }
    }

    #[test]
    fn test_invalid_utf8_decodes_as_latin1() {
        // "caf\xe9 ok" in Latin-1
        let got: Vec<String> = stream_words(b"caf\xe9 ok", 16).into_iter().map(|w| w.0).collect();
        assert_eq!(got, vec!["cafe", "ok"]);

        // Lead byte at end of stream with nothing following
        let got: Vec<String> = stream_words(b"abc\xc3", 2).into_iter().map(|w| w.0).collect();
        assert_eq!(got, vec!["abca"]);
    }

    #[test]
    fn test_last_word_flushed_at_end() {
        let got = stream_words(b"first last", 4);
        assert_eq!(got.last(), Some(&("last".to_string(), 1)));
    }

    #[test]
    fn test_matches_independent_grouping() {
        // Small deterministic generator over a mixed alphabet
        let alphabet: Vec<char> = "ab Z_9.-é\n/Ü,xß".chars().collect();
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        for _ in 0..200 {
            let len = (seed % 40) as usize;
            let mut text = String::new();
            for _ in 0..len {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                text.push(alphabet[(seed >> 33) as usize % alphabet.len()]);
            }
            let expected = reference_words(&text);
            let from_str: Vec<String> = tokenize_str(&text).map(|t| t.text).collect();
            let from_stream: Vec<String> = stream_words(text.as_bytes(), 3).into_iter().map(|w| w.0).collect();
            assert_eq!(from_str, expected, "text {text:?}");
            assert_eq!(from_stream, expected, "text {text:?}");
        }
    }
}
