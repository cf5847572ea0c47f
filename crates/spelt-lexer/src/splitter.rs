//! Splitting source text into unclassified fragments.

use spelt_syntax::error::{Error, Result};
use spelt_syntax::token::{RawToken, Span};

/// Cuts source text into raw fragments.
///
/// `symbols` holds every punctuation spelling known to the active recognizers,
/// longest first. A splitter must be able to cut each of them as one fragment.
pub trait Splitter: Send + Sync {
    fn split(&self, source: &str, symbols: &[String]) -> Result<Vec<RawToken>>;
}

/// Character scanner used by the default lexer.
///
/// Emits quoted strings, numbers, words, the longest matching symbol, or a
/// single character, and skips whitespace between fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSplitter;

impl Splitter for DefaultSplitter {
    fn split(&self, source: &str, symbols: &[String]) -> Result<Vec<RawToken>> {
        Scanner::new(source, symbols).run()
    }
}

pub(crate) fn is_word_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

pub(crate) fn is_word_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

struct Scanner<'a> {
    src: Vec<char>,
    symbols: Vec<Vec<char>>,
    raw: &'a str,
    pos: usize,
    offset: usize,
    line: usize,
    col: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str, symbols: &[String]) -> Self {
        Self {
            src: input.chars().collect(),
            symbols: symbols.iter().map(|s| s.chars().collect()).collect(),
            raw: input,
            pos: 0,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }
    fn peek_next(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }
    fn advance(&mut self) -> Option<char> {
        let ch = self.src.get(self.pos).copied();
        if let Some(c) = ch {
            self.pos += 1;
            self.offset += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && matches!(self.peek_next(), Some(c) if c.is_ascii_digit()) {
            self.advance();
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('L' | 'l' | 'D' | 'd'))
            && !matches!(self.peek_next(), Some(c) if is_word_part(c))
        {
            self.advance();
        }
    }

    fn read_word(&mut self) {
        while matches!(self.peek(), Some(c) if is_word_part(c)) {
            self.advance();
        }
    }

    fn read_string(&mut self, quote: char, line: usize, col: usize) -> Result<()> {
        self.advance();
        while let Some(c) = self.advance() {
            if c == quote {
                return Ok(());
            }
            if c == '\\' && self.advance().is_none() {
                break;
            }
        }
        Err(Error::lexical("Unterminated string", line, col))
    }

    fn match_symbol(&self) -> Option<usize> {
        self.symbols
            .iter()
            .find(|sym| {
                !sym.is_empty()
                    && self.src.len() >= self.pos + sym.len()
                    && self.src[self.pos..self.pos + sym.len()] == sym[..]
            })
            .map(|sym| sym.len())
    }

    fn run(mut self) -> Result<Vec<RawToken>> {
        let mut out = Vec::new();
        loop {
            self.skip_whitespace();
            let (start, line, col) = (self.offset, self.line, self.col);
            match self.peek() {
                None => break,
                Some(q @ ('\'' | '"')) => self.read_string(q, line, col)?,
                Some(c) if c.is_ascii_digit() => self.read_number(),
                Some(c) if is_word_start(c) => self.read_word(),
                Some(_) => match self.match_symbol() {
                    Some(n) => {
                        for _ in 0..n {
                            self.advance();
                        }
                    }
                    None => {
                        self.advance();
                    }
                },
            }
            out.push(RawToken::new(
                &self.raw[start..self.offset],
                Span::new(start, self.offset, line, col),
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(src: &str, symbols: &[&str]) -> Vec<String> {
        let symbols: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
        DefaultSplitter
            .split(src, &symbols)
            .expect("split should succeed")
            .into_iter()
            .map(|r| r.text)
            .collect()
    }

    #[test]
    fn test_longest_symbol_wins() {
        assert_eq!(texts("x++ + 1", &["++", "+"]), vec!["x", "++", "+", "1"]);
        assert_eq!(texts("a<=b", &["<=", "<"]), vec!["a", "<=", "b"]);
    }

    #[test]
    fn test_numbers_and_paths() {
        assert_eq!(texts("3.25 + 10L", &["+"]), vec!["3.25", "+", "10L"]);
        assert_eq!(texts("a.b[0].c", &["."]), vec!["a", ".", "b", "[", "0", "]", ".", "c"]);
    }

    #[test]
    fn test_strings_keep_quotes() {
        assert_eq!(texts(r#"'it\'s' + "x""#, &["+"]), vec![r"'it\'s'", "+", "\"x\""]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = DefaultSplitter.split("name + 'abc", &[]).unwrap_err();
        assert_eq!(err.kind, spelt_syntax::ErrorKind::Lexical);
        assert_eq!((err.line, err.col), (Some(1), Some(8)));
    }

    #[test]
    fn test_spans_track_lines() {
        let raws = DefaultSplitter.split("a\n  bb", &[]).unwrap();
        assert_eq!(raws[1].span, Span::new(4, 6, 2, 3));
    }
}
