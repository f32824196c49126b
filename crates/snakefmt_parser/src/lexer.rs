//! A from-scratch tokenizer covering the subset of Python-style lexical
//! grammar snakefmt's parser relies on: logical-line joining inside brackets
//! or after a trailing backslash, an explicit INDENT/DEDENT stack, and
//! comment-preserving scanning. See `snakefmt_parser::lexer` module docs in
//! `lib.rs` for why this is a reimplementation rather than a wrapped
//! tokenizer.

use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

use crate::token::{Pos, Token, TokenKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("L{line}: unterminated string literal")]
    UnterminatedString { line: u32 },
    #[error("L{line}: inconsistent indentation")]
    BadIndent { line: u32 },
    #[error("L{line}: unexpected character {ch:?}")]
    UnexpectedChar { line: u32, ch: char },
}

const BRACKETS_OPEN: [char; 3] = ['(', '[', '{'];
const BRACKETS_CLOSE: [char; 3] = [')', ']', '}'];

/// A single pass, pull-based tokenizer over one source string.
///
/// Implements [`Iterator`] rather than a custom trait so that it composes
/// with the rest of the standard library (`.peekable()`, `itertools`
/// helpers, `for` loops). Once [`TokenKind::EndMarker`] has been produced,
/// the iterator keeps yielding it forever instead of returning `None` --
/// callers never need to special-case "ran out of tokens".
pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: u32,
    col: u32,
    bracket_depth: i32,
    indents: Vec<u32>,
    pending: Vec<Token>,
    at_line_start: bool,
    done: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            col: 0,
            bracket_depth: 0,
            indents: vec![0],
            pending: Vec::new(),
            at_line_start: true,
            done: false,
        }
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.byte_offset()..].chars().nth(offset)
    }

    fn byte_offset(&self) -> usize {
        self.chars
            .peek()
            .map(|(i, _)| *i)
            .unwrap_or(self.source.len())
    }

    /// Consumes leading whitespace of a fresh logical line, measuring
    /// indentation width (tabs normalized to 8-column stops, matching
    /// CPython's tokenizer), and emits INDENT/DEDENT tokens as needed.
    fn handle_line_start(&mut self) {
        let mut width = 0u32;
        loop {
            match self.peek_char() {
                Some(' ') => {
                    width += 1;
                    self.bump();
                }
                Some('\t') => {
                    width += 8 - (width % 8);
                    self.bump();
                }
                _ => break,
            }
        }
        // Blank or comment-only lines do not affect indentation.
        match self.peek_char() {
            None | Some('\n') | Some('#') | Some('\r') => {
                self.at_line_start = false;
                return;
            }
            _ => {}
        }
        let current = *self.indents.last().unwrap();
        if width > current {
            self.indents.push(width);
            self.pending.push(Token::new(
                TokenKind::Indent,
                "",
                self.pos(),
                self.pos(),
            ));
        } else if width < current {
            while *self.indents.last().unwrap() > width {
                self.indents.pop();
                self.pending.push(Token::new(
                    TokenKind::Dedent,
                    "",
                    self.pos(),
                    self.pos(),
                ));
            }
        }
        self.at_line_start = false;
    }

    fn lex_string(&mut self, start: Pos, quote: char, triple: bool) -> Result<Token, LexError> {
        let mut text = String::new();
        text.push(quote);
        if triple {
            text.push(quote);
            text.push(quote);
        }
        loop {
            match self.bump() {
                None => return Err(LexError::UnterminatedString { line: start.line }),
                Some('\\') => {
                    text.push('\\');
                    if let Some(c) = self.bump() {
                        text.push(c);
                    }
                }
                Some(c) if c == quote => {
                    text.push(c);
                    if !triple {
                        break;
                    }
                    if self.peek_char() == Some(quote) {
                        self.bump();
                        text.push(quote);
                        if self.peek_char() == Some(quote) {
                            self.bump();
                            text.push(quote);
                            break;
                        }
                    }
                }
                Some('\n') if !triple => {
                    return Err(LexError::UnterminatedString { line: start.line })
                }
                Some(c) => text.push(c),
            }
        }
        Ok(Token::new(TokenKind::String, text, start, self.pos()))
    }

    fn lex_name_or_string_prefix(&mut self, start: Pos, first: char) -> Result<Token, LexError> {
        let mut text = String::new();
        text.push(first);
        while let Some(c) = self.peek_char() {
            if unicode_ident::is_xid_continue(c) || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        let is_string_prefix = text.len() <= 2
            && text
                .to_ascii_lowercase()
                .chars()
                .all(|c| matches!(c, 'r' | 'b' | 'f' | 'u'));
        if is_string_prefix {
            if let Some(q @ ('"' | '\'')) = self.peek_char() {
                self.bump();
                let triple = self.peek_char() == Some(q) && self.peek_at(1) == Some(q);
                if triple {
                    self.bump();
                    self.bump();
                }
                let rest = self.lex_string(start, q, triple)?;
                return Ok(Token::new(
                    TokenKind::String,
                    format!("{text}{}", rest.text),
                    start,
                    rest.end,
                ));
            }
        }
        Ok(Token::new(TokenKind::Name, text, start, self.pos()))
    }

    fn lex_number(&mut self, start: Pos, first: char) -> Token {
        let mut text = String::new();
        text.push(first);
        let mut seen_dot = first == '.';
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '_' {
                text.push(c);
                self.bump();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                text.push(c);
                self.bump();
            } else if matches!(c, 'e' | 'E')
                && matches!(self.peek_at(1), Some('+') | Some('-') | Some('0'..='9'))
            {
                text.push(c);
                self.bump();
                if let Some(sign @ ('+' | '-')) = self.peek_char() {
                    text.push(sign);
                    self.bump();
                }
            } else if matches!(c, 'x' | 'X' | 'o' | 'O' | 'b' | 'B' | 'j' | 'J') {
                text.push(c);
                self.bump();
            } else if c.is_ascii_hexdigit() && text.len() <= 2 && text.starts_with('0') {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Number, text, start, self.pos())
    }

    fn lex_op(&mut self, start: Pos, first: char) -> Token {
        const THREE: [&str; 4] = ["**=", "//=", "...", ">>="];
        const TWO: [&str; 19] = [
            "**", "//", "->", ":=", "==", "!=", "<=", ">=", "+=", "-=", "*=", "/=", "%=", "&=",
            "|=", "^=", ">>", "<<", "<>",
        ];
        let two: String = [first].into_iter().chain(self.peek_char()).collect();
        let three: String = {
            let mut s = two.clone();
            if let Some(c) = self.peek_at(1) {
                s.push(c);
            }
            s
        };
        if three.len() == 3 && THREE.contains(&three.as_str()) {
            self.bump();
            self.bump();
            return Token::new(TokenKind::Op, three, start, self.pos());
        }
        if two.len() == 2 && TWO.contains(&two.as_str()) {
            self.bump();
            return Token::new(TokenKind::Op, two, start, self.pos());
        }
        Token::new(TokenKind::Op, first.to_string(), start, self.pos())
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        if let Some(tok) = self.pending.pop() {
            return Ok(tok);
        }
        loop {
            if self.at_line_start && self.bracket_depth == 0 {
                self.handle_line_start();
                if let Some(tok) = self.pending.pop() {
                    return Ok(tok);
                }
            }
            let start = self.pos();
            let Some(c) = self.peek_char() else {
                if *self.indents.last().unwrap() > 0 {
                    self.indents.pop();
                    return Ok(Token::new(TokenKind::Dedent, "", start, start));
                }
                self.done = true;
                return Ok(Token::new(TokenKind::EndMarker, "", start, start));
            };
            match c {
                ' ' | '\t' | '\r' => {
                    self.bump();
                    continue;
                }
                '\\' if self.peek_at(1) == Some('\n') => {
                    self.bump();
                    self.bump();
                    continue;
                }
                '\n' => {
                    self.bump();
                    let kind = if self.bracket_depth > 0 {
                        TokenKind::Nl
                    } else {
                        self.at_line_start = true;
                        TokenKind::Newline
                    };
                    return Ok(Token::new(kind, "\n", start, self.pos()));
                }
                '#' => {
                    let mut text = String::new();
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        text.push(c);
                        self.bump();
                    }
                    return Ok(Token::new(TokenKind::Comment, text, start, self.pos()));
                }
                '"' | '\'' => {
                    self.bump();
                    let triple = self.peek_char() == Some(c) && self.peek_at(1) == Some(c);
                    if triple {
                        self.bump();
                        self.bump();
                    }
                    return self.lex_string(start, c, triple);
                }
                c if c.is_ascii_digit() => {
                    self.bump();
                    return Ok(self.lex_number(start, c));
                }
                c if unicode_ident::is_xid_start(c) || c == '_' => {
                    self.bump();
                    return self.lex_name_or_string_prefix(start, c);
                }
                c if BRACKETS_OPEN.contains(&c) => {
                    self.bump();
                    self.bracket_depth += 1;
                    return Ok(Token::new(TokenKind::Op, c.to_string(), start, self.pos()));
                }
                c if BRACKETS_CLOSE.contains(&c) => {
                    self.bump();
                    self.bracket_depth = (self.bracket_depth - 1).max(0);
                    return Ok(Token::new(TokenKind::Op, c.to_string(), start, self.pos()));
                }
                c if c.is_ascii_punctuation() => {
                    self.bump();
                    return Ok(self.lex_op(start, c));
                }
                other => {
                    self.bump();
                    return Err(LexError::UnexpectedChar {
                        line: start.line,
                        ch: other,
                    });
                }
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return Some(Ok(Token::new(
                TokenKind::EndMarker,
                "",
                self.pos(),
                self.pos(),
            )));
        }
        Some(self.next_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut out = Vec::new();
        for tok in Lexer::new(src) {
            let tok = tok.unwrap();
            out.push(tok.kind);
            if tok.kind == TokenKind::EndMarker {
                break;
            }
        }
        out
    }

    #[test]
    fn simple_assignment() {
        let ks = kinds("x = 1\n");
        assert_eq!(
            ks,
            vec![
                TokenKind::Name,
                TokenKind::Op,
                TokenKind::Number,
                TokenKind::Newline,
                TokenKind::EndMarker,
            ]
        );
    }

    #[test]
    fn indent_dedent() {
        let ks = kinds("if x:\n    y = 1\nz = 2\n");
        assert!(ks.contains(&TokenKind::Indent));
        assert!(ks.contains(&TokenKind::Dedent));
    }

    #[test]
    fn bracket_newlines_are_non_logical() {
        let ks = kinds("x = [\n    1,\n    2,\n]\n");
        assert_eq!(ks.iter().filter(|k| **k == TokenKind::Nl).count(), 2);
        assert_eq!(ks.iter().filter(|k| **k == TokenKind::Newline).count(), 1);
    }

    #[test]
    fn comment_preserved() {
        let mut lex = Lexer::new("# hello\n");
        let tok = lex.next().unwrap().unwrap();
        assert_eq!(tok.kind, TokenKind::Comment);
        assert_eq!(tok.text, "# hello");
    }

    #[test]
    fn triple_quoted_string() {
        let mut lex = Lexer::new("\"\"\"a\nb\"\"\"\n");
        let tok = lex.next().unwrap().unwrap();
        assert_eq!(tok.kind, TokenKind::String);
        assert_eq!(tok.text, "\"\"\"a\nb\"\"\"");
    }

    #[test]
    fn endmarker_repeats_forever() {
        let mut lex = Lexer::new("x\n");
        let mut last = None;
        for _ in 0..6 {
            last = lex.next();
        }
        assert_eq!(last.unwrap().unwrap().kind, TokenKind::EndMarker);
    }
}
