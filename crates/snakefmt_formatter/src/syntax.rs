//! The two token-consuming state machines: block-header syntax
//! ([`BlockContext`]) and parameter-list syntax ([`ParameterSyntax`]).
//! Together they replace the original implementation's `KeywordSyntax`/
//! `ParameterSyntax` class hierarchy (spec.md §4.3–4.4).

use rustc_hash::FxHashSet;

use snakefmt_parser::{LexError, Token, TokenKind};

use crate::errors::{FormatError, FormatResult};
use crate::grammar::{self, GrammarId, ParamShape};
use crate::parameter::Parameter;

pub const TAB: &str = "    ";

const BRACKETS_OPEN: [&str; 3] = ["(", "[", "{"];
const BRACKETS_CLOSE: [&str; 3] = [")", "]", "}"];

pub type TokenStream<'a> = dyn Iterator<Item = Result<Token, LexError>> + 'a;

fn next_tok(tokens: &mut TokenStream) -> FormatResult<Token> {
    match tokens.next() {
        Some(Ok(tok)) => Ok(tok),
        Some(Err(e)) => {
            let line = match &e {
                LexError::UnterminatedString { line }
                | LexError::BadIndent { line }
                | LexError::UnexpectedChar { line, .. } => *line,
            };
            Err(FormatError::Lex { line, source: e })
        }
        None => unreachable!("the lexer yields EndMarker forever, never None"),
    }
}

fn spacing_trigger(prev: TokenKind, next: TokenKind) -> bool {
    use TokenKind::*;
    let set: &[TokenKind] = match prev {
        Name => &[Name, String, Number, Op],
        String => &[Name, Op],
        Number => &[Name, Op],
        Op => &[Name, String, Number, Op],
        _ => &[],
    };
    set.contains(&next)
}

fn operator_skip_spacing(prev: &Token, tok: &Token) -> bool {
    if prev.kind != TokenKind::Op && tok.kind != TokenKind::Op {
        return false;
    }
    if BRACKETS_OPEN.contains(&prev.text.as_str())
        || prev.text == "."
        || BRACKETS_CLOSE.contains(&tok.text.as_str())
        || ["[", ":", "."].contains(&tok.text.as_str())
    {
        true
    } else {
        prev.kind == TokenKind::Name && tok.text == "("
    }
}

/// Result of a header parse shared by [`BlockContext::open`] and
/// [`ParameterSyntax::parse`]: the keyword's inline trailing comment, and
/// the first token that follows it (which may already be the first token of
/// the body, for inline forms like `shell: "cmd"`).
struct Header {
    comment: String,
    next: Token,
    line: u32,
}

/// Consumes an optional name token (for [`grammar::is_nameable`] keywords),
/// the mandatory colon, and an optional trailing inline comment.
///
/// `use` is nameable but, unlike `rule foo:`/`checkpoint foo:`, its name is
/// the whole `rule <pattern> from <module> [as <alias>] [exclude <rules>]`
/// specifier rather than a single token, so it gets its own loop that reads
/// tokens until the header colon instead of stopping after one.
fn parse_header(
    keyword_name: &mut String,
    tokens: &mut TokenStream,
) -> FormatResult<Header> {
    let mut tok = next_tok(tokens)?;
    let line = tok.start.line;
    if keyword_name == "use" {
        while !tok.is_op(":") {
            if matches!(
                tok.kind,
                TokenKind::Newline | TokenKind::Nl | TokenKind::EndMarker
            ) {
                return Err(FormatError::ColonExpected {
                    line: tok.start.line,
                    keyword: keyword_name.clone(),
                    found: tok.text.clone(),
                });
            }
            keyword_name.push(' ');
            keyword_name.push_str(&tok.text);
            tok = next_tok(tokens)?;
        }
    } else if !tok.is_op(":") {
        if grammar::is_nameable(keyword_name) {
            if tok.kind != TokenKind::Name {
                return Err(FormatError::NamedKeywordError {
                    line: tok.start.line,
                    keyword: keyword_name.clone(),
                    found: tok.text.clone(),
                });
            }
            keyword_name.push(' ');
            keyword_name.push_str(&tok.text);
            tok = next_tok(tokens)?;
        }
    }
    if !tok.is_op(":") {
        return Err(FormatError::ColonExpected {
            line: tok.start.line,
            keyword: keyword_name.clone(),
            found: tok.text.clone(),
        });
    }
    let mut next = next_tok(tokens)?;
    let mut comment = String::new();
    if next.kind == TokenKind::Comment {
        comment = format!(" {}", next.text);
        next = next_tok(tokens)?;
    }
    Ok(Header {
        comment,
        next,
        line,
    })
}

/// The status returned by [`BlockContext::get_next_queriable`]: the next
/// candidate keyword token, the indentation it was observed at, the
/// scripting buffer accumulated along the way, and whether end-of-input was
/// reached.
pub struct QueriableStatus {
    pub token: Token,
    pub indent: u32,
    pub buffer: String,
    pub eof: bool,
    pub pythonable: bool,
}

/// One entry of the parser's context stack: an open block and everything
/// needed to validate and re-emit it.
pub struct BlockContext {
    pub keyword_name: String,
    pub grammar: GrammarId,
    pub target_indent: u32,
    pub cur_indent: u32,
    pub comment: String,
    pub header_line: u32,
    pub accepts_scripting_code: bool,
    pub from_python: bool,
    processed_keywords: FxHashSet<String>,
    queriable: bool,
}

impl BlockContext {
    /// Builds the implicit root context: the `Global` grammar at indent 0,
    /// with no header to parse.
    pub fn root() -> Self {
        Self {
            keyword_name: "Global".to_string(),
            grammar: GrammarId::Global,
            target_indent: 0,
            cur_indent: 0,
            comment: String::new(),
            header_line: 0,
            accepts_scripting_code: true,
            from_python: false,
            processed_keywords: FxHashSet::default(),
            queriable: true,
        }
    }

    /// Opens a nested block: parses and validates its header (name, colon,
    /// optional comment, mandatory newline), per spec.md §4.3.
    pub fn open(
        mut keyword_name: String,
        grammar: GrammarId,
        target_indent: u32,
        from_python: bool,
        tokens: &mut TokenStream,
    ) -> FormatResult<Self> {
        let header = parse_header(&mut keyword_name, tokens)?;
        if header.next.kind != TokenKind::Newline {
            return Err(FormatError::NewlineExpected {
                line: header.next.start.line,
                keyword: keyword_name,
            });
        }
        Ok(Self {
            keyword_name,
            grammar,
            target_indent,
            cur_indent: target_indent.saturating_sub(1),
            comment: header.comment,
            header_line: header.line,
            accepts_scripting_code: grammar.accepts_scripting_code(),
            from_python,
            processed_keywords: FxHashSet::default(),
            queriable: true,
        })
    }

    fn effective_indent(&self) -> u32 {
        self.cur_indent.saturating_sub(self.target_indent)
    }

    /// Registers `keyword` as processed in this context, raising
    /// `DuplicateKeyWordError` unless the keyword is in the
    /// duplicates-allowed set or this context was itself opened from
    /// scripting code (§3 "Block context" invariants).
    pub fn add_processed_keyword(&mut self, keyword: &str, line: u32) -> FormatResult<()> {
        let check_dup = !self.from_python && !grammar::duplicates_allowed(keyword);
        if check_dup && self.processed_keywords.contains(keyword) {
            return Err(FormatError::DuplicateKeyword {
                line,
                keyword: keyword.to_string(),
            });
        }
        self.processed_keywords.insert(keyword.to_string());
        Ok(())
    }

    pub fn check_empty(&self, line: u32) -> FormatResult<()> {
        if self.processed_keywords.is_empty() {
            return Err(FormatError::EmptyContext {
                line,
                keyword: self.keyword_name.clone(),
            });
        }
        Ok(())
    }

    /// Produces the next word that could be a recognised keyword, per
    /// spec.md §4.3.
    pub fn get_next_queriable(&mut self, tokens: &mut TokenStream) -> FormatResult<QueriableStatus> {
        let mut buffer = String::new();
        let mut newline = false;
        let mut pythonable = false;
        let mut prev_token: Option<Token> = Some(Token::sentinel(TokenKind::Name));

        loop {
            let token = next_tok(tokens)?;
            match token.kind {
                TokenKind::Indent => {
                    self.cur_indent += 1;
                    prev_token = None;
                    continue;
                }
                TokenKind::Dedent => {
                    self.cur_indent = self.cur_indent.saturating_sub(1);
                    prev_token = None;
                    continue;
                }
                TokenKind::EndMarker => {
                    return Ok(QueriableStatus {
                        token,
                        indent: self.cur_indent,
                        buffer,
                        eof: true,
                        pythonable,
                    });
                }
                TokenKind::Newline | TokenKind::Nl => {
                    self.queriable = true;
                    newline = true;
                    buffer.push('\n');
                    prev_token = None;
                    continue;
                }
                _ => {}
            }

            if newline && token.kind != TokenKind::Comment {
                buffer.push_str(&TAB.repeat(self.effective_indent() as usize));
            }

            if token.kind == TokenKind::Name && self.queriable {
                self.queriable = false;
                return Ok(QueriableStatus {
                    token,
                    indent: self.cur_indent,
                    buffer,
                    eof: false,
                    pythonable,
                });
            }

            if let Some(prev) = &prev_token {
                if spacing_trigger(prev.kind, token.kind) && !operator_skip_spacing(prev, &token) {
                    buffer.push(' ');
                }
            }
            newline = false;
            if !pythonable && token.kind != TokenKind::Comment {
                pythonable = true;
            }
            buffer.push_str(&token.text);
            prev_token = Some(token);
        }
    }
}

/// Parses the body of a parameter-bearing keyword (spec.md §4.4).
pub struct ParameterSyntax {
    pub keyword_name: String,
    pub target_indent: u32,
    pub cur_indent: u32,
    pub comment: String,
    pub header_line: u32,
    pub positional_params: Vec<Parameter>,
    pub keyword_params: Vec<Parameter>,
    pub eof: bool,
    /// The overshoot token the parameter loop stopped on, handed back to
    /// the driver to resume scanning from.
    pub overshoot: Token,
}

#[derive(Clone, Copy)]
enum LastFlushed {
    None,
    Positional,
    Keyword,
}

impl ParameterSyntax {
    pub fn all_params(&self) -> impl Iterator<Item = &Parameter> {
        self.positional_params.iter().chain(&self.keyword_params)
    }

    pub fn num_params(&self) -> usize {
        self.positional_params.len() + self.keyword_params.len()
    }

    /// Parses a parameter-bearing keyword's body and validates its arity
    /// against `shape`.
    pub fn parse(
        mut keyword_name: String,
        target_indent: u32,
        shape: ParamShape,
        enclosing_grammar: GrammarId,
        tokens: &mut TokenStream,
    ) -> FormatResult<Self> {
        let header = parse_header(&mut keyword_name, tokens)?;
        let mut this = ParameterSyntax {
            keyword_name,
            target_indent,
            cur_indent: target_indent.saturating_sub(1),
            comment: header.comment,
            header_line: header.line,
            positional_params: Vec::new(),
            keyword_params: Vec::new(),
            eof: false,
            overshoot: header.next.clone(),
        };
        this.parse_body(header.next, enclosing_grammar, tokens)?;
        validate_shape(&this, shape)?;
        Ok(this)
    }

    fn flush(&mut self, param: Parameter, last: &mut LastFlushed, skip_empty: bool) {
        if skip_empty && !param.has_value() && !param.has_key() {
            *last = LastFlushed::None;
            return;
        }
        if param.has_key() {
            self.keyword_params.push(param);
            *last = LastFlushed::Keyword;
        } else {
            self.positional_params.push(param);
            *last = LastFlushed::Positional;
        }
    }

    fn latest_flushed_mut(&mut self, last: LastFlushed) -> Option<&mut Parameter> {
        match last {
            LastFlushed::None => None,
            LastFlushed::Positional => self.positional_params.last_mut(),
            LastFlushed::Keyword => self.keyword_params.last_mut(),
        }
    }

    fn parse_body(
        &mut self,
        first_token: Token,
        enclosing_grammar: GrammarId,
        tokens: &mut TokenStream,
    ) -> FormatResult<()> {
        let mut cur = Parameter::new(self.header_line, first_token.start.col);
        let mut token = first_token;
        let mut brackets: Vec<&'static str> = Vec::new();
        let mut found_newline = false;
        // True from a logical-line boundary until the first value-bearing
        // token of the next line is consumed. Over-indented-keyword
        // detection (spec.md §4.4) only applies to that first token -- not
        // to every token whose accumulated value happens to be one word
        // (e.g. the `.` in `output.foo` must not be mistaken for it).
        let mut at_line_start = true;
        let mut in_lambda = false;
        let mut last_flushed = LastFlushed::None;

        loop {
            match token.kind {
                TokenKind::Indent => self.cur_indent += 1,
                TokenKind::Dedent => self.cur_indent = self.cur_indent.saturating_sub(1),
                TokenKind::Newline | TokenKind::Nl => {
                    found_newline = true;
                    at_line_start = true;
                    if cur.has_value() {
                        cur.add_token(&token);
                    }
                }
                TokenKind::Comment if brackets.is_empty() => {
                    if cur.is_empty() {
                        if let Some(target) = self.latest_flushed_mut(last_flushed) {
                            log::warn!(
                                "L{}: keyword \"{}\" has a comment below a value; \
                                 PEP8 recommends block comments appear before what they describe",
                                token.start.line,
                                self.keyword_name
                            );
                            target.add_comment(format!(" {}", token.text));
                        } else {
                            cur.add_comment(format!(" {}", token.text));
                        }
                    } else {
                        cur.add_comment(format!(" {}", token.text));
                    }
                }
                TokenKind::Op if token.text == "=" && brackets.is_empty() => {
                    cur.to_key_mode(token.start.line)?;
                    at_line_start = false;
                }
                TokenKind::Op if token.text == "," && brackets.is_empty() && !in_lambda => {
                    self.flush(cur, &mut last_flushed, false);
                    cur = Parameter::new(token.start.line, token.start.col);
                    at_line_start = false;
                }
                TokenKind::EndMarker => {}
                _ => {
                    if BRACKETS_OPEN.contains(&token.text.as_str()) {
                        brackets.push(match token.text.as_str() {
                            "(" => "(",
                            "[" => "[",
                            _ => "{",
                        });
                    }
                    if BRACKETS_CLOSE.contains(&token.text.as_str()) {
                        brackets.pop();
                    }
                    if token.is_op(":") && in_lambda {
                        in_lambda = false;
                    }
                    if cur.value.split_whitespace().count() == 1 && cur.value == "lambda" {
                        in_lambda = true;
                    }
                    if at_line_start
                        && cur.is_empty()
                        && token.kind == TokenKind::Name
                        && self.cur_indent >= self.target_indent
                        && grammar::lookup(enclosing_grammar, &token.text).is_some()
                    {
                        return Err(FormatError::InvalidParameterSyntax {
                            line: token.start.line,
                            message: format!(
                                "Over-indented recognised keyword found: '{}'",
                                token.text
                            ),
                        });
                    }
                    cur.add_token(&token);
                    at_line_start = false;
                }
            }

            let next = next_tok(tokens)?;
            if next.kind == TokenKind::EndMarker {
                self.flush(cur, &mut last_flushed, true);
                self.eof = true;
                self.overshoot = next;
                return Ok(());
            }

            if found_newline && !next.is_empty() {
                let exit = if next.kind == TokenKind::Comment {
                    next.start.col < self.target_indent * TAB.len() as u32
                } else {
                    self.cur_indent < self.target_indent
                };
                if exit {
                    self.flush(cur, &mut last_flushed, true);
                    self.overshoot = next;
                    return Ok(());
                }
            }
            token = next;
        }
    }
}

fn validate_shape(params: &ParameterSyntax, shape: ParamShape) -> FormatResult<()> {
    use ParamShape::*;
    let line = params.header_line;
    let kw = || params.keyword_name.clone();

    match shape {
        SingleParam | InlineSingleParam => {
            if params.num_params() > 1 {
                return Err(FormatError::TooManyParameters { line, keyword: kw() });
            }
            if !params.keyword_params.is_empty() {
                return Err(FormatError::InvalidParameter { line, keyword: kw() });
            }
        }
        NoKeywordParamList | ParamListNoComma => {
            if !params.keyword_params.is_empty() {
                return Err(FormatError::InvalidParameterSyntax {
                    line,
                    message: format!("{} definition does not accept key/value parameters", kw()),
                });
            }
        }
        ParamList => {}
    }
    if params.num_params() == 0 {
        return Err(FormatError::NoParameters { line, keyword: kw() });
    }
    Ok(())
}
