//! Recursive-descent parser over the token buffer.
//!
//! Produces the [`TopLevelItem`] stream the rest of the crate consumes:
//! `import Name`, `def name(args) = body`, or a bare expression.
//! Precedence is comparison < additive < multiplicative < primary; infix
//! operators become [`Term::Binary`] nodes that the evaluator desugars.

use crate::ast::{BinOp, Import, Literal, Pattern, PatternArg, Rule, Term, TopLevelItem};
use crate::errors::{RedexError, Result};
use crate::syntax::lexer::{Lexer, Token};

/// Parses a whole source text into top-level items.
pub fn parse_source(source: &str) -> Result<Vec<TopLevelItem>> {
    let tokens = Lexer::new(source).tokenize()?;
    Parser::new(tokens).parse()
}

/// Parses a single expression; used by embedders and tests.
pub fn parse_expression(source: &str) -> Result<Term> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.expression()?;
    parser.expect(Token::Eof)?;
    Ok(expr)
}

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser {
            tokens,
            position: 0,
        }
    }

    pub fn parse(&mut self) -> Result<Vec<TopLevelItem>> {
        let mut items = Vec::new();
        while self.current() != &Token::Eof {
            if self.advance_if(&Token::Def) {
                items.push(TopLevelItem::Rule(self.definition()?));
            } else if self.advance_if(&Token::Import) {
                items.push(TopLevelItem::Import(self.import()?));
            } else {
                items.push(TopLevelItem::Expr(self.expression()?));
            }
        }
        Ok(items)
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        self.position += 1;
        token
    }

    fn advance_if(&mut self, token: &Token) -> bool {
        if self.current() == token {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> Result<()> {
        if self.advance_if(&token) {
            Ok(())
        } else {
            Err(RedexError::Parse {
                message: format!(
                    "expected {}, got {}",
                    token.describe(),
                    self.current().describe()
                ),
            })
        }
    }

    fn identifier(&mut self) -> Result<String> {
        match self.advance() {
            Token::Ident(name) => Ok(name),
            other => Err(RedexError::Parse {
                message: format!("expected identifier, got {}", other.describe()),
            }),
        }
    }

    // ----- top level ------------------------------------------------------

    fn import(&mut self) -> Result<Import> {
        Ok(Import {
            module: self.identifier()?,
        })
    }

    fn definition(&mut self) -> Result<Rule> {
        let name = self.identifier()?;
        self.expect(Token::LParen)?;
        let mut args = Vec::new();
        if self.current() != &Token::RParen {
            loop {
                args.push(self.pattern_arg()?);
                if !self.advance_if(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;
        self.expect(Token::Assign)?;
        let body = self.expression()?;
        Ok(Rule {
            pattern: Pattern::new(name, args),
            replacement: body,
        })
    }

    fn pattern_arg(&mut self) -> Result<PatternArg> {
        match self.advance() {
            Token::Ident(name) => {
                if self.current() == &Token::LParen {
                    // Nested call pattern: destructure the argument.
                    self.position -= 1;
                    let call = self.call_or_var()?;
                    Ok(PatternArg::Nested(call))
                } else {
                    Ok(PatternArg::Var(name))
                }
            }
            Token::IntLit(v) => Ok(PatternArg::Literal(Literal::Int(v))),
            Token::FloatLit(v) => Ok(PatternArg::Literal(Literal::Float(v))),
            Token::StrLit(v) => Ok(PatternArg::Literal(Literal::Str(v))),
            Token::CharLit(v) => Ok(PatternArg::Literal(Literal::Char(v))),
            Token::True => Ok(PatternArg::Literal(Literal::Bool(true))),
            Token::False => Ok(PatternArg::Literal(Literal::Bool(false))),
            Token::Wildcard => Ok(PatternArg::Wildcard),
            other => Err(RedexError::Parse {
                message: format!("invalid pattern argument: {}", other.describe()),
            }),
        }
    }

    // ----- expressions ----------------------------------------------------

    pub fn expression(&mut self) -> Result<Term> {
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Term> {
        let mut expr = self.additive()?;
        loop {
            let op = match self.current() {
                Token::EqEq => BinOp::Eq,
                Token::NotEq => BinOp::Nq,
                Token::Lt => BinOp::Lt,
                Token::Le => BinOp::Le,
                Token::Gt => BinOp::Gt,
                Token::Ge => BinOp::Ge,
                _ => return Ok(expr),
            };
            self.position += 1;
            let right = self.additive()?;
            expr = binary(expr, op, right);
        }
    }

    fn additive(&mut self) -> Result<Term> {
        let mut expr = self.multiplicative()?;
        loop {
            let op = match self.current() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => return Ok(expr),
            };
            self.position += 1;
            let right = self.multiplicative()?;
            expr = binary(expr, op, right);
        }
    }

    fn multiplicative(&mut self) -> Result<Term> {
        let mut expr = self.primary()?;
        loop {
            let op = match self.current() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                Token::Percent => BinOp::Mod,
                _ => return Ok(expr),
            };
            self.position += 1;
            let right = self.primary()?;
            expr = binary(expr, op, right);
        }
    }

    fn primary(&mut self) -> Result<Term> {
        match self.current().clone() {
            Token::IntLit(v) => {
                self.position += 1;
                Ok(Term::int(v))
            }
            Token::FloatLit(v) => {
                self.position += 1;
                Ok(Term::float(v))
            }
            Token::StrLit(v) => {
                self.position += 1;
                Ok(Term::str(v))
            }
            Token::CharLit(v) => {
                self.position += 1;
                Ok(Term::char(v))
            }
            Token::True => {
                self.position += 1;
                Ok(Term::bool(true))
            }
            Token::False => {
                self.position += 1;
                Ok(Term::bool(false))
            }
            Token::Ident(_) => self.call_or_var(),
            Token::LParen => {
                self.position += 1;
                let expr = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            other => Err(RedexError::Parse {
                message: format!("unexpected token in expression: {}", other.describe()),
            }),
        }
    }

    /// `ident`, `ident(args)` or `Namespace.ident(args)`.
    fn call_or_var(&mut self) -> Result<Term> {
        let name = self.identifier()?;

        if self.advance_if(&Token::Dot) {
            let function = self.identifier()?;
            self.expect(Token::LParen)?;
            let args = self.call_args()?;
            return Ok(Term::Call {
                namespace: Some(name),
                function,
                args,
            });
        }

        if self.advance_if(&Token::LParen) {
            let args = self.call_args()?;
            return Ok(Term::call(name, args));
        }

        Ok(Term::var(name))
    }

    fn call_args(&mut self) -> Result<Vec<Term>> {
        let mut args = Vec::new();
        if self.current() != &Token::RParen {
            loop {
                args.push(self.expression()?);
                if !self.advance_if(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;
        Ok(args)
    }
}

fn binary(left: Term, op: BinOp, right: Term) -> Term {
    Term::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}
