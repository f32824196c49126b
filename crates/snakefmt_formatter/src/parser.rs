//! Parser driver (spec.md §4.5). Owns the context stack, interleaves the
//! two state machines of [`crate::syntax`], and produces a flat event
//! stream that [`crate::formatter`] turns into output text -- this removes
//! the original implementation's inheritance-based
//! parser/formatter coupling (spec.md §9, "Polymorphic formatter").

use snakefmt_parser::{LexError, Lexer};

use crate::errors::{FormatError, FormatResult};
use crate::grammar::{self, GrammarId, KeywordShape};
use crate::parameter::Parameter;
use crate::syntax::{BlockContext, ParameterSyntax, TokenStream};

/// One step of the parse, in emission order.
pub enum ParserEvent {
    /// Non-keyword tokens accumulated since the last event; hand to the
    /// external scripting formatter (or pass through verbatim if blank).
    FlushScript { buffer: String },
    /// A block-opening keyword's header was parsed and validated.
    OpenBlock {
        keyword_name: String,
        comment: String,
        header_indent: u32,
        is_rule_like: bool,
    },
    /// A context was popped off the stack. `returned_to_top` is set when
    /// this closed the last non-Global context, mirroring the original
    /// driver's `context_exit` appending a bare separator once the stack
    /// returns to holding only `Global`.
    CloseBlock { indent: u32, returned_to_top: bool },
    /// A parameter-bearing keyword's body was parsed and validated.
    Parameters {
        keyword_name: String,
        comment: String,
        header_indent: u32,
        child_indent: u32,
        positional: Vec<Parameter>,
        keyword: Vec<Parameter>,
        inline_shape: bool,
        in_rule_like: bool,
    },
    Eof,
}

/// Runs the full parse of `source`, returning its event stream.
pub fn parse(source: &str) -> FormatResult<Vec<ParserEvent>> {
    let mut lexer = Lexer::new(source);
    let tokens: &mut TokenStream = &mut lexer;
    Driver::new().run(tokens)
}

struct Driver {
    stack: Vec<BlockContext>,
    indent: u32,
    scripting_buffer: String,
    events: Vec<ParserEvent>,
}

impl Driver {
    fn new() -> Self {
        Self {
            stack: vec![BlockContext::root()],
            indent: 0,
            scripting_buffer: String::new(),
            events: Vec::new(),
        }
    }

    fn top(&mut self) -> &mut BlockContext {
        self.stack.last_mut().expect("root context is never popped")
    }

    fn flush_scripting(&mut self) {
        let buffer = std::mem::take(&mut self.scripting_buffer);
        self.events.push(ParserEvent::FlushScript { buffer });
    }

    fn run(mut self, tokens: &mut TokenStream) -> FormatResult<Vec<ParserEvent>> {
        let mut status = self.top().get_next_queriable(tokens)?;
        self.scripting_buffer.push_str(&status.buffer);

        loop {
            if status.indent < self.indent {
                self.context_exit(status.indent)?;
            }
            if status.eof {
                break;
            }

            let keyword = status.token.text.clone();
            let line = status.token.start.line;
            let current_grammar = self.stack.last().unwrap().grammar;

            if let Some(shape) = grammar::lookup(current_grammar, &keyword) {
                self.flush_scripting();
                match shape {
                    KeywordShape::Block(next_grammar) => {
                        self.open_block(keyword, line, next_grammar, tokens)?;
                        status = self.top().get_next_queriable(tokens)?;
                        self.scripting_buffer.push_str(&status.buffer);
                        continue;
                    }
                    KeywordShape::Params(param_shape) => {
                        let overshoot =
                            self.emit_parameters(keyword, line, param_shape, current_grammar, tokens)?;
                        status = overshoot;
                        continue;
                    }
                }
            } else if self.stack.last().unwrap().accepts_scripting_code {
                self.scripting_buffer.push_str(&keyword);
            } else {
                return Err(FormatError::UnrecognisedKeyword {
                    line,
                    keyword,
                    context: self.stack.last().unwrap().keyword_name.clone(),
                });
            }

            status = self.top().get_next_queriable(tokens)?;
            self.scripting_buffer.push_str(&status.buffer);
        }

        self.flush_scripting();
        self.events.push(ParserEvent::Eof);
        Ok(self.events)
    }

    fn open_block(
        &mut self,
        keyword: String,
        line: u32,
        next_grammar: GrammarId,
        tokens: &mut TokenStream,
    ) -> FormatResult<()> {
        self.indent += 1;
        let ctx = BlockContext::open(keyword.clone(), next_grammar, self.indent, false, tokens)?;
        self.top().add_processed_keyword(&keyword, line)?;

        self.events.push(ParserEvent::OpenBlock {
            keyword_name: ctx.keyword_name.clone(),
            comment: ctx.comment.clone(),
            header_indent: ctx.target_indent.saturating_sub(1),
            is_rule_like: grammar::is_rule_like(&ctx.keyword_name),
        });
        self.stack.push(ctx);
        Ok(())
    }

    fn emit_parameters(
        &mut self,
        keyword: String,
        line: u32,
        shape: crate::grammar::ParamShape,
        enclosing_grammar: GrammarId,
        tokens: &mut TokenStream,
    ) -> FormatResult<crate::syntax::QueriableStatus> {
        let params = ParameterSyntax::parse(keyword.clone(), self.indent + 1, shape, enclosing_grammar, tokens)?;
        self.top().add_processed_keyword(&keyword, line)?;

        let inline_shape = matches!(
            shape,
            crate::grammar::ParamShape::SingleParam | crate::grammar::ParamShape::InlineSingleParam
        );
        let overshoot = crate::syntax::QueriableStatus {
            token: params.overshoot.clone(),
            indent: params.cur_indent,
            buffer: String::new(),
            eof: params.eof,
            pythonable: false,
        };

        self.events.push(ParserEvent::Parameters {
            keyword_name: params.keyword_name.clone(),
            comment: params.comment.clone(),
            header_indent: self.indent,
            child_indent: params.target_indent,
            positional: params.positional_params,
            keyword: params.keyword_params,
            inline_shape,
            in_rule_like: matches!(enclosing_grammar, GrammarId::Rule),
        });

        Ok(overshoot)
    }

    fn context_exit(&mut self, new_indent: u32) -> FormatResult<()> {
        while self.indent > new_indent {
            let ctx = self.stack.pop().expect("indent > 0 implies a non-root top");
            if ctx.accepts_scripting_code {
                self.flush_scripting();
            } else {
                ctx.check_empty(ctx.header_line)?;
            }
            self.indent -= 1;
            self.events.push(ParserEvent::CloseBlock {
                indent: self.indent,
                returned_to_top: self.stack.len() == 1,
            });
        }
        assert_eq!(self.stack.len(), self.indent as usize + 1);
        Ok(())
    }
}

/// Surfaces a [`LexError`] with its originating line, matching every other
/// error's `L<n>:` prefix (used when callers drive the lexer directly).
pub fn lex_error_line(e: &LexError) -> u32 {
    match e {
        LexError::UnterminatedString { line }
        | LexError::BadIndent { line }
        | LexError::UnexpectedChar { line, .. } => *line,
    }
}
