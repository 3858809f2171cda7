//! Hand-written scanner for the `.rx` surface syntax.
//!
//! Comments run from `//` to end of line. `-` followed by `>` is the rule
//! arrow, which only appears in pretty-printed rules, but the scanner
//! recognises it anyway so dumped rules stay lexable.

use crate::errors::{RedexError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    IntLit(i64),
    FloatLit(f64),
    StrLit(String),
    CharLit(char),

    // keywords
    Def,
    Import,
    True,
    False,

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,

    LParen,
    RParen,
    Comma,
    Dot,
    Assign,
    Arrow,
    Wildcard,

    Eof,
}

impl Token {
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("identifier '{name}'"),
            Token::IntLit(v) => format!("integer {v}"),
            Token::FloatLit(v) => format!("float {v}"),
            Token::StrLit(v) => format!("string \"{v}\""),
            Token::CharLit(v) => format!("char '{v}'"),
            Token::Def => "'def'".into(),
            Token::Import => "'import'".into(),
            Token::True => "'true'".into(),
            Token::False => "'false'".into(),
            Token::Plus => "'+'".into(),
            Token::Minus => "'-'".into(),
            Token::Star => "'*'".into(),
            Token::Slash => "'/'".into(),
            Token::Percent => "'%'".into(),
            Token::EqEq => "'=='".into(),
            Token::NotEq => "'!='".into(),
            Token::Lt => "'<'".into(),
            Token::Le => "'<='".into(),
            Token::Gt => "'>'".into(),
            Token::Ge => "'>='".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::Comma => "','".into(),
            Token::Dot => "'.'".into(),
            Token::Assign => "'='".into(),
            Token::Arrow => "'->'".into(),
            Token::Wildcard => "'_'".into(),
            Token::Eof => "end of input".into(),
        }
    }
}

pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            chars: source.chars().peekable(),
        }
    }

    /// Scans the whole input. Surface lexing is cheap enough that the
    /// parser works over a fully tokenised buffer.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let Some(&c) = self.chars.peek() else {
            return Ok(Token::Eof);
        };

        match c {
            '+' => self.single(Token::Plus),
            '-' => {
                self.chars.next();
                if self.chars.peek() == Some(&'>') {
                    self.chars.next();
                    Ok(Token::Arrow)
                } else {
                    Ok(Token::Minus)
                }
            }
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '%' => self.single(Token::Percent),
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            ',' => self.single(Token::Comma),
            '_' => self.single(Token::Wildcard),
            '.' => {
                self.chars.next();
                // Leading-dot float: .5 lexes as 0.5.
                if self.chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.read_number(String::from("0."))
                } else {
                    Ok(Token::Dot)
                }
            }
            '=' => {
                self.chars.next();
                if self.chars.peek() == Some(&'=') {
                    self.chars.next();
                    Ok(Token::EqEq)
                } else {
                    Ok(Token::Assign)
                }
            }
            '!' => {
                self.chars.next();
                if self.chars.peek() == Some(&'=') {
                    self.chars.next();
                    Ok(Token::NotEq)
                } else {
                    Err(unexpected_char('!'))
                }
            }
            '<' => {
                self.chars.next();
                if self.chars.peek() == Some(&'=') {
                    self.chars.next();
                    Ok(Token::Le)
                } else {
                    Ok(Token::Lt)
                }
            }
            '>' => {
                self.chars.next();
                if self.chars.peek() == Some(&'=') {
                    self.chars.next();
                    Ok(Token::Ge)
                } else {
                    Ok(Token::Gt)
                }
            }
            '"' => self.read_string(),
            '\'' => self.read_char(),
            c if c.is_ascii_digit() => self.read_number(String::new()),
            c if c.is_alphabetic() => Ok(self.read_identifier()),
            other => Err(unexpected_char(other)),
        }
    }

    fn single(&mut self, token: Token) -> Result<Token> {
        self.chars.next();
        Ok(token)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
                self.chars.next();
            }
            // Line comment: need two-character lookahead, so clone the
            // iterator rather than consuming a lone '/'.
            let mut ahead = self.chars.clone();
            if ahead.next() == Some('/') && ahead.next() == Some('/') {
                self.chars = ahead;
                while self.chars.peek().is_some_and(|&c| c != '\n') {
                    self.chars.next();
                }
                continue;
            }
            return;
        }
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if !c.is_alphanumeric() {
                break;
            }
            ident.push(c);
            self.chars.next();
        }
        match ident.as_str() {
            "def" => Token::Def,
            "import" => Token::Import,
            "true" => Token::True,
            "false" => Token::False,
            _ => Token::Ident(ident),
        }
    }

    fn read_number(&mut self, mut text: String) -> Result<Token> {
        let mut seen_dot = text.contains('.');
        self.push_digits(&mut text);
        if !seen_dot && self.chars.peek() == Some(&'.') {
            // Only consume the dot when a digit follows, so a trailing
            // dot stays available as a qualified-call separator.
            let mut ahead = self.chars.clone();
            ahead.next();
            if ahead.peek().is_some_and(|c| c.is_ascii_digit()) {
                seen_dot = true;
                text.push('.');
                self.chars.next();
                self.push_digits(&mut text);
            }
        }

        if seen_dot {
            text.parse::<f64>()
                .map(Token::FloatLit)
                .map_err(|_| bad_literal("float", &text))
        } else {
            text.parse::<i64>()
                .map(Token::IntLit)
                .map_err(|_| bad_literal("integer", &text))
        }
    }

    fn push_digits(&mut self, text: &mut String) {
        while let Some(&c) = self.chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            text.push(c);
            self.chars.next();
        }
    }

    fn read_string(&mut self) -> Result<Token> {
        self.chars.next(); // opening quote
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some('"') => return Ok(Token::StrLit(value)),
                Some('\\') => value.push(self.read_escape()?),
                Some(c) => value.push(c),
                None => {
                    return Err(RedexError::Parse {
                        message: "unterminated string literal".into(),
                    })
                }
            }
        }
    }

    fn read_char(&mut self) -> Result<Token> {
        self.chars.next(); // opening quote
        let value = match self.chars.next() {
            Some('\\') => self.read_escape()?,
            Some(c) if c != '\'' => c,
            _ => {
                return Err(RedexError::Parse {
                    message: "empty char literal".into(),
                })
            }
        };
        match self.chars.next() {
            Some('\'') => Ok(Token::CharLit(value)),
            _ => Err(RedexError::Parse {
                message: "unterminated char literal".into(),
            }),
        }
    }

    fn read_escape(&mut self) -> Result<char> {
        match self.chars.next() {
            Some('n') => Ok('\n'),
            Some('t') => Ok('\t'),
            Some('\\') => Ok('\\'),
            Some('"') => Ok('"'),
            Some('\'') => Ok('\''),
            Some(other) => Err(RedexError::Parse {
                message: format!("unknown escape sequence: \\{other}"),
            }),
            None => Err(RedexError::Parse {
                message: "dangling escape at end of input".into(),
            }),
        }
    }
}

fn unexpected_char(c: char) -> RedexError {
    RedexError::Parse {
        message: format!("unexpected character: {c}"),
    }
}

fn bad_literal(kind: &str, text: &str) -> RedexError {
    RedexError::Parse {
        message: format!("invalid {kind} literal: {text}"),
    }
}
