//! The [`Parameter`] value object: a single positional or keyword argument
//! inside a parameter-bearing keyword's body, together with the comments
//! attached to it while it was being assembled.

use snakefmt_parser::{Token, TokenKind};

use crate::errors::{FormatError, FormatResult};

/// Returns true if `s` is, as a whole, a single valid identifier in the
/// embedded scripting language (used to validate the left-hand side of a
/// `key=value` parameter).
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(unicode_ident::is_xid_start(first) || first == '_') {
        return false;
    }
    chars.all(|c| unicode_ident::is_xid_continue(c) || c == '_')
}

/// Holds the value of a single parameter to a parameter-bearing keyword
/// (e.g. one entry of an `input:`/`params:` list).
#[derive(Debug, Clone, Default)]
pub struct Parameter {
    pub line_nb: u32,
    pub col_nb: u32,
    pub key: String,
    pub value: String,
    pub pre_comments: Vec<String>,
    pub post_comments: Vec<String>,
    saw_newline_in_value: bool,
}

impl Parameter {
    pub fn new(line_nb: u32, col_nb: u32) -> Self {
        Self {
            line_nb,
            col_nb,
            ..Default::default()
        }
    }

    /// True once neither a key nor a value has been recorded yet -- the slot
    /// a freshly-flushed comment or keyword routes to.
    pub fn is_empty(&self) -> bool {
        self.key.is_empty() && self.value.is_empty()
    }

    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }

    pub fn has_key(&self) -> bool {
        !self.key.is_empty()
    }

    /// Whether the parameter's value never spanned a newline, i.e. it could
    /// be formatted on the same line as its introducing keyword.
    pub fn inline(&self) -> bool {
        !self.saw_newline_in_value
    }

    /// Appends `tok`'s literal text to the value, inserting a single space
    /// between two adjacent NAME tokens (so `return value` doesn't collapse
    /// into `returnvalue`).
    pub fn add_token(&mut self, tok: &Token) {
        if self.is_empty() {
            self.col_nb = tok.start.col;
        }
        if tok.kind == TokenKind::Name && !self.value.is_empty() {
            self.value.push(' ');
        }
        if tok.text == "\n" {
            self.saw_newline_in_value = true;
        }
        self.value.push_str(&tok.text);
    }

    /// Routes a comment to `pre_comments` if the slot is still empty, else to
    /// `post_comments`.
    pub fn add_comment(&mut self, text: impl Into<String>) {
        let text = text.into();
        if self.is_empty() {
            self.pre_comments.push(text);
        } else {
            self.post_comments.push(text);
        }
    }

    /// Handles an `=` encountered outside brackets: the accumulated value
    /// becomes the key, provided it is a bare identifier.
    pub fn to_key_mode(&mut self, eq_line: u32) -> FormatResult<()> {
        if !self.has_value() {
            return Err(FormatError::InvalidParameterSyntax {
                line: eq_line,
                message: "Operator = used with no preceding key".to_string(),
            });
        }
        if !is_valid_identifier(&self.value) {
            return Err(FormatError::InvalidParameterSyntax {
                line: eq_line,
                message: format!("Invalid key {}", self.value),
            });
        }
        self.key = std::mem::take(&mut self.value);
        self.saw_newline_in_value = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snakefmt_parser::Pos;

    fn name(s: &str) -> Token {
        Token::new(TokenKind::Name, s, Pos::new(1, 0), Pos::new(1, 0))
    }

    #[test]
    fn adjacent_names_get_a_space() {
        let mut p = Parameter::new(1, 0);
        p.add_token(&name("return"));
        p.add_token(&name("value"));
        assert_eq!(p.value, "return value");
    }

    #[test]
    fn to_key_mode_requires_identifier() {
        let mut p = Parameter::new(1, 0);
        p.add_token(&Token::new(
            TokenKind::Number,
            "1",
            Pos::new(1, 0),
            Pos::new(1, 0),
        ));
        assert!(p.to_key_mode(1).is_err());
    }

    #[test]
    fn to_key_mode_moves_value_to_key() {
        let mut p = Parameter::new(1, 0);
        p.add_token(&name("threads"));
        p.to_key_mode(1).unwrap();
        assert_eq!(p.key, "threads");
        assert!(p.value.is_empty());
    }
}
