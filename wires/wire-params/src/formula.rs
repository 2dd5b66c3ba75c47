//! A small arithmetic expression evaluator for parameter formulas.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary ('^' unary)?
//! primary := number | ident | ident '(' expr (',' expr)* ')' | '(' expr ')'
//! ```
//!
//! `^` is right associative and binds tighter than unary minus, so
//! `-2^2 == -4`. Identifiers resolve against the [`Variables`] passed to
//! [`Formula::evaluate`]; `pi` is predefined unless shadowed.

use std::fmt;

use hashbrown::HashMap;

use crate::error::FormulaError;

/// Named variable bindings for formula evaluation.
pub type Variables = HashMap<String, f64>;

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    Sin,
    Cos,
    Tan,
    Sqrt,
    Abs,
    Exp,
    Ln,
    Log,
    Min,
    Max,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "sqrt" => Self::Sqrt,
            "abs" => Self::Abs,
            "exp" => Self::Exp,
            "ln" => Self::Ln,
            "log" => Self::Log,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => return None,
        })
    }

    const fn is_variadic(self) -> bool {
        matches!(self, Self::Min | Self::Max)
    }

    fn apply(self, args: &[f64]) -> f64 {
        let x = args.first().copied().unwrap_or(f64::NAN);
        match self {
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Tan => x.tan(),
            Self::Sqrt => x.sqrt(),
            Self::Abs => x.abs(),
            Self::Exp => x.exp(),
            Self::Ln => x.ln(),
            Self::Log => x.log10(),
            Self::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Variable(String),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl Expr {
    fn eval(&self, variables: &Variables) -> Result<f64, FormulaError> {
        Ok(match self {
            Self::Number(v) => *v,
            Self::Variable(name) => match variables.get(name) {
                Some(v) => *v,
                None if name == "pi" => std::f64::consts::PI,
                None => return Err(FormulaError::UndefinedVariable(name.clone())),
            },
            Self::Neg(inner) => -inner.eval(variables)?,
            Self::Binary(op, lhs, rhs) => {
                let a = lhs.eval(variables)?;
                let b = rhs.eval(variables)?;
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Self::Call(function, args) => {
                let values = args
                    .iter()
                    .map(|a| a.eval(variables))
                    .collect::<Result<Vec<_>, _>>()?;
                function.apply(&values)
            }
        })
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Number(_) => {}
            Self::Variable(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Self::Neg(inner) => inner.collect_variables(out),
            Self::Binary(_, lhs, rhs) => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Self::Call(_, args) => args.iter().for_each(|a| a.collect_variables(out)),
        }
    }
}

/// A parsed formula.
///
/// # Example
///
/// ```
/// use wire_params::{Formula, Variables};
///
/// let f = Formula::parse("max(0.1, t / 2) + 2^-1").unwrap();
/// let mut vars = Variables::new();
/// vars.insert("t".to_string(), 0.6);
/// assert!((f.evaluate(&vars).unwrap() - 0.8).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Parse `source`.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::Syntax`] for malformed input and
    /// [`FormulaError::UnknownFunction`] for calls to anything but the
    /// built-in functions.
    pub fn parse(source: &str) -> Result<Self, FormulaError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expr()?;
        if let Some(token) = parser.peek() {
            return Err(FormulaError::syntax(token.offset, "unexpected trailing input"));
        }
        Ok(Self {
            source: source.trim().to_string(),
            expr,
        })
    }

    /// Evaluate with the given bindings.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::UndefinedVariable`] if a referenced variable is
    /// not bound.
    pub fn evaluate(&self, variables: &Variables) -> Result<f64, FormulaError> {
        self.expr.eval(variables)
    }

    /// Names of the variables the formula references, in first-use order.
    #[must_use]
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.expr.collect_variables(&mut out);
        out
    }

    /// The formula text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// =============================================================================
// Lexer
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    Number(f64),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn tokenize(source: &str) -> Result<Vec<Token>, FormulaError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        let start = i;
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let kind = if c.is_ascii_digit() || c == '.' {
            while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                i += 1;
            }
            // Exponent, only when followed by digits (optionally signed).
            if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                let mut j = i + 1;
                if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                    j += 1;
                }
                if j < bytes.len() && bytes[j].is_ascii_digit() {
                    i = j;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text = &source[start..i];
            let value = text
                .parse::<f64>()
                .map_err(|_| FormulaError::syntax(start, format!("invalid number '{text}'")))?;
            TokenKind::Number(value)
        } else if c.is_ascii_alphabetic() || c == '_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            TokenKind::Ident(source[start..i].to_string())
        } else {
            i += 1;
            match c {
                '+' | '-' | '*' | '/' | '^' => TokenKind::Op(c),
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                ',' => TokenKind::Comma,
                _ => {
                    return Err(FormulaError::syntax(
                        start,
                        format!("unexpected character '{c}'"),
                    ))
                }
            }
        };
        tokens.push(Token {
            kind,
            offset: start,
        });
    }
    if tokens.is_empty() {
        return Err(FormulaError::syntax(0, "empty formula"));
    }
    Ok(tokens)
}

// =============================================================================
// Parser
// =============================================================================

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn end_offset(&self) -> usize {
        self.tokens.last().map_or(0, |t| t.offset + 1)
    }

    fn next(&mut self) -> Result<Token, FormulaError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| FormulaError::syntax(self.end_offset(), "unexpected end of formula"))?;
        self.pos += 1;
        Ok(token)
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Token {
                kind: TokenKind::Op(op),
                ..
            }) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expect(&mut self, expected: &TokenKind, what: &str) -> Result<(), FormulaError> {
        let token = self.next()?;
        if &token.kind == expected {
            Ok(())
        } else {
            Err(FormulaError::syntax(token.offset, format!("expected {what}")))
        }
    }

    fn expr(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.term()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.term()?;
            let op = if op == '+' { BinaryOp::Add } else { BinaryOp::Sub };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.eat_op(&['*', '/']) {
            let rhs = self.unary()?;
            let op = if op == '*' { BinaryOp::Mul } else { BinaryOp::Div };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.eat_op(&['-', '+']) {
            Some('-') => Ok(Expr::Neg(Box::new(self.unary()?))),
            Some(_) => self.unary(),
            None => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, FormulaError> {
        let base = self.primary()?;
        if self.eat_op(&['^']).is_some() {
            let exponent = self.unary()?;
            return Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let token = self.next()?;
        match token.kind {
            TokenKind::Number(v) => Ok(Expr::Number(v)),
            TokenKind::LParen => {
                let inner = self.expr()?;
                self.expect(&TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Ident(name) => {
                if !matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LParen)) {
                    return Ok(Expr::Variable(name));
                }
                let function =
                    Function::from_name(&name).ok_or(FormulaError::UnknownFunction(name))?;
                self.pos += 1;
                let mut args = vec![self.expr()?];
                while matches!(self.peek().map(|t| &t.kind), Some(TokenKind::Comma)) {
                    self.pos += 1;
                    args.push(self.expr()?);
                }
                self.expect(&TokenKind::RParen, "')'")?;
                if !function.is_variadic() && args.len() != 1 {
                    return Err(FormulaError::syntax(
                        token.offset,
                        format!("function takes 1 argument, got {}", args.len()),
                    ));
                }
                Ok(Expr::Call(function, args))
            }
            TokenKind::Op(op) => Err(FormulaError::syntax(
                token.offset,
                format!("unexpected operator '{op}'"),
            )),
            TokenKind::RParen | TokenKind::Comma => {
                Err(FormulaError::syntax(token.offset, "expected a value"))
            }
        }
    }
}
