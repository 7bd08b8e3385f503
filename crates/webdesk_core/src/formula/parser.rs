//! Formula tokenizer and recursive-descent parser.
//!
//! # Responsibility
//! - Turn formula text (without the leading `=` marker) into a typed AST.
//! - Resolve names against the closed function set at parse time.
//!
//! # Invariants
//! - No dynamic dispatch through strings: every function call is a
//!   `FunctionName` variant, every operator a typed enum.
//! - Ranges are only produced by explicit `A1:B2` syntax.

use crate::formula::coord::{CellCoord, CellRange, MAX_RANGE_CELLS};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Closed set of supported formula functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionName {
    Sum,
    Average,
    Min,
    Max,
    Count,
    Abs,
    Round,
    Power,
    Sqrt,
    Concatenate,
    Upper,
    Lower,
    Left,
    Right,
    Substitute,
    Len,
    Today,
    Now,
    Day,
    Month,
    Year,
    If,
    And,
    Or,
    Not,
    IfError,
}

impl FunctionName {
    /// Resolves a function name, case-insensitive.
    pub fn resolve(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "SUM" => Some(Self::Sum),
            "AVERAGE" => Some(Self::Average),
            "MIN" => Some(Self::Min),
            "MAX" => Some(Self::Max),
            "COUNT" => Some(Self::Count),
            "ABS" => Some(Self::Abs),
            "ROUND" => Some(Self::Round),
            "POWER" => Some(Self::Power),
            "SQRT" => Some(Self::Sqrt),
            "CONCATENATE" => Some(Self::Concatenate),
            "UPPER" => Some(Self::Upper),
            "LOWER" => Some(Self::Lower),
            "LEFT" => Some(Self::Left),
            "RIGHT" => Some(Self::Right),
            "SUBSTITUTE" => Some(Self::Substitute),
            "LEN" => Some(Self::Len),
            "TODAY" => Some(Self::Today),
            "NOW" => Some(Self::Now),
            "DAY" => Some(Self::Day),
            "MONTH" => Some(Self::Month),
            "YEAR" => Some(Self::Year),
            "IF" => Some(Self::If),
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            "NOT" => Some(Self::Not),
            "IFERROR" => Some(Self::IfError),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "SUM",
            Self::Average => "AVERAGE",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Count => "COUNT",
            Self::Abs => "ABS",
            Self::Round => "ROUND",
            Self::Power => "POWER",
            Self::Sqrt => "SQRT",
            Self::Concatenate => "CONCATENATE",
            Self::Upper => "UPPER",
            Self::Lower => "LOWER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Substitute => "SUBSTITUTE",
            Self::Len => "LEN",
            Self::Today => "TODAY",
            Self::Now => "NOW",
            Self::Day => "DAY",
            Self::Month => "MONTH",
            Self::Year => "YEAR",
            Self::If => "IF",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::IfError => "IFERROR",
        }
    }
}

/// Binary operators in precedence groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

/// Typed formula expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    Ref(CellCoord),
    Range(CellRange),
    Call {
        name: FunctionName,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    /// Collects every coordinate this expression reads, ranges expanded.
    pub fn collect_refs(&self, out: &mut std::collections::BTreeSet<CellCoord>) {
        match self {
            Self::Number(_) | Self::Text(_) | Self::Bool(_) => {}
            Self::Ref(coord) => {
                out.insert(*coord);
            }
            Self::Range(range) => {
                out.extend(range.cells());
            }
            Self::Call { args, .. } => {
                for arg in args {
                    arg.collect_refs(out);
                }
            }
            Self::Unary { operand, .. } => operand.collect_refs(out),
            Self::Binary { lhs, rhs, .. } => {
                lhs.collect_refs(out);
                rhs.collect_refs(out);
            }
        }
    }
}

/// Formula parse errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    Empty,
    UnknownFunction(String),
    UnknownName(String),
    RangeTooLarge(String),
    InvalidNumber(String),
    UnterminatedString,
    UnexpectedChar(char),
    UnexpectedToken(String),
    UnexpectedEnd,
    TrailingInput(String),
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "formula is empty"),
            Self::UnknownFunction(name) => write!(f, "unknown function: {name}"),
            Self::UnknownName(name) => write!(f, "unknown name: {name}"),
            Self::RangeTooLarge(range) => write!(
                f,
                "range {range} exceeds the {MAX_RANGE_CELLS}-cell limit"
            ),
            Self::InvalidNumber(text) => write!(f, "invalid number literal: {text}"),
            Self::UnterminatedString => write!(f, "unterminated string literal"),
            Self::UnexpectedChar(c) => write!(f, "unexpected character: `{c}`"),
            Self::UnexpectedToken(token) => write!(f, "unexpected token: {token}"),
            Self::UnexpectedEnd => write!(f, "unexpected end of formula"),
            Self::TrailingInput(token) => write!(f, "trailing input after expression: {token}"),
        }
    }
}

impl Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Word(String),
    Colon,
    Comma,
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Amp,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Number(n) => format!("number `{n}`"),
            Self::Str(text) => format!("string \"{text}\""),
            Self::Word(word) => format!("`{word}`"),
            Self::Colon => "`:`".to_string(),
            Self::Comma => "`,`".to_string(),
            Self::LParen => "`(`".to_string(),
            Self::RParen => "`)`".to_string(),
            Self::Plus => "`+`".to_string(),
            Self::Minus => "`-`".to_string(),
            Self::Star => "`*`".to_string(),
            Self::Slash => "`/`".to_string(),
            Self::Caret => "`^`".to_string(),
            Self::Amp => "`&`".to_string(),
            Self::Eq => "`=`".to_string(),
            Self::Ne => "`<>`".to_string(),
            Self::Lt => "`<`".to_string(),
            Self::Le => "`<=`".to_string(),
            Self::Gt => "`>`".to_string(),
            Self::Ge => "`>=`".to_string(),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' | '\r' | '\n' => {
                chars.next();
            }
            '0'..='9' | '.' => {
                let mut literal = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        literal.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = literal
                    .parse::<f64>()
                    .map_err(|_| ParseError::InvalidNumber(literal.clone()))?;
                tokens.push(Token::Number(number));
            }
            '"' => {
                chars.next();
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some('"') => {
                            // Doubled quote is an escaped quote.
                            if chars.peek() == Some(&'"') {
                                chars.next();
                                literal.push('"');
                            } else {
                                break;
                            }
                        }
                        Some(other) => literal.push(other),
                        None => return Err(ParseError::UnterminatedString),
                    }
                }
                tokens.push(Token::Str(literal));
            }
            'A'..='Z' | 'a'..='z' | '_' => {
                let mut word = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        word.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Word(word));
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '(' => {
                chars.next();
                tokens.push(Token::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(Token::RParen);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '^' => {
                chars.next();
                tokens.push(Token::Caret);
            }
            '&' => {
                chars.next();
                tokens.push(Token::Amp);
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '<' => {
                chars.next();
                match chars.peek() {
                    Some('>') => {
                        chars.next();
                        tokens.push(Token::Ne);
                    }
                    Some('=') => {
                        chars.next();
                        tokens.push(Token::Le);
                    }
                    _ => tokens.push(Token::Lt),
                }
            }
            '>' => {
                chars.next();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    tokens.push(Token::Ge);
                } else {
                    tokens.push(Token::Gt);
                }
            }
            other => return Err(ParseError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

/// Parses formula text (without the leading `=`) into an expression.
pub fn parse_formula(text: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.comparison()?;
    match parser.peek() {
        Some(token) => Err(ParseError::TrailingInput(token.describe())),
        None => Ok(expr),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(ParseError::UnexpectedToken(token.describe())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn comparison(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.concat()?;
        while let Some(op) = match self.peek() {
            Some(Token::Eq) => Some(BinaryOp::Eq),
            Some(Token::Ne) => Some(BinaryOp::Ne),
            Some(Token::Lt) => Some(BinaryOp::Lt),
            Some(Token::Le) => Some(BinaryOp::Le),
            Some(Token::Gt) => Some(BinaryOp::Gt),
            Some(Token::Ge) => Some(BinaryOp::Ge),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.concat()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn concat(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.additive()?;
        while matches!(self.peek(), Some(Token::Amp)) {
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = Expr::Binary {
                op: BinaryOp::Concat,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.multiplicative()?;
        while let Some(op) = match self.peek() {
            Some(Token::Plus) => Some(BinaryOp::Add),
            Some(Token::Minus) => Some(BinaryOp::Sub),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn multiplicative(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.unary()?;
        while let Some(op) = match self.peek() {
            Some(Token::Star) => Some(BinaryOp::Mul),
            Some(Token::Slash) => Some(BinaryOp::Div),
            _ => None,
        } {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.pos += 1;
            let operand = self.unary()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
            });
        }
        self.power()
    }

    fn power(&mut self) -> Result<Expr, ParseError> {
        let base = self.primary()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.pos += 1;
            // Right-associative: 2^3^2 is 2^(3^2).
            let exponent = self.unary()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                lhs: Box::new(base),
                rhs: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, ParseError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(Expr::Number(n)),
            Some(Token::Str(text)) => Ok(Expr::Text(text)),
            Some(Token::LParen) => {
                let inner = self.comparison()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Word(word)) => self.resolve_word(word),
            Some(token) => Err(ParseError::UnexpectedToken(token.describe())),
            None => Err(ParseError::UnexpectedEnd),
        }
    }

    fn resolve_word(&mut self, word: String) -> Result<Expr, ParseError> {
        if matches!(self.peek(), Some(Token::LParen)) {
            let name = FunctionName::resolve(&word)
                .ok_or_else(|| ParseError::UnknownFunction(word.clone()))?;
            self.pos += 1;
            let args = self.call_args()?;
            return Ok(Expr::Call { name, args });
        }

        if word.eq_ignore_ascii_case("TRUE") {
            return Ok(Expr::Bool(true));
        }
        if word.eq_ignore_ascii_case("FALSE") {
            return Ok(Expr::Bool(false));
        }

        let Ok(start) = CellCoord::parse(&word) else {
            return Err(ParseError::UnknownName(word));
        };

        if matches!(self.peek(), Some(Token::Colon)) {
            self.pos += 1;
            match self.next() {
                Some(Token::Word(end_word)) => {
                    let end = CellCoord::parse(&end_word)
                        .map_err(|_| ParseError::UnknownName(end_word))?;
                    let range = CellRange::new(start, end);
                    if range.cell_count() > MAX_RANGE_CELLS {
                        return Err(ParseError::RangeTooLarge(range.to_string()));
                    }
                    return Ok(Expr::Range(range));
                }
                Some(token) => return Err(ParseError::UnexpectedToken(token.describe())),
                None => return Err(ParseError::UnexpectedEnd),
            }
        }

        Ok(Expr::Ref(start))
    }

    fn call_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token::RParen)) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.comparison()?);
            match self.next() {
                Some(Token::Comma) => {}
                Some(Token::RParen) => return Ok(args),
                Some(token) => return Err(ParseError::UnexpectedToken(token.describe())),
                None => return Err(ParseError::UnexpectedEnd),
            }
        }
    }
}
