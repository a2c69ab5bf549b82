//! Expression language used inside `${ ... }$` phrase blocks.
//!
//! Parsed by hand into a small AST, then evaluated against a property bag.

use std::collections::BTreeMap;

use crate::error::FormulaError;
use crate::types::{PropertyBag, PropertyValue};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    Comma,
}

const OPERATORS: [&str; 14] = [
    "&&", "||", "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%", "!",
];

fn tokenize(src: &str, base: usize) -> Result<Vec<(usize, Token)>, FormulaError> {
    // `pos` walks chars; offsets reported to callers are byte offsets.
    let (byte_offsets, chars): (Vec<usize>, Vec<char>) = src.char_indices().unzip();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        let offset = base + byte_offsets[pos];

        if c.is_whitespace() {
            pos += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && chars.get(pos + 1).is_some_and(|n| n.is_ascii_digit()))
        {
            let start = pos;
            while pos < chars.len() && (chars[pos].is_ascii_digit() || chars[pos] == '.') {
                pos += 1;
            }
            let text: String = chars[start..pos].iter().collect();
            let value = text.parse::<f64>().map_err(|_| FormulaError::Syntax {
                offset,
                message: format!("invalid number '{}'", text),
            })?;
            tokens.push((offset, Token::Number(value)));
            continue;
        }

        if c == '\'' || c == '"' {
            let quote = c;
            pos += 1;
            let mut value = String::new();
            loop {
                match chars.get(pos) {
                    None => {
                        return Err(FormulaError::Syntax {
                            offset,
                            message: "unterminated string literal".to_string(),
                        })
                    }
                    Some('\\') if chars.get(pos + 1).is_some() => {
                        value.push(chars[pos + 1]);
                        pos += 2;
                    }
                    Some(ch) if *ch == quote => {
                        pos += 1;
                        break;
                    }
                    Some(ch) => {
                        value.push(*ch);
                        pos += 1;
                    }
                }
            }
            tokens.push((offset, Token::Str(value)));
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = pos;
            while pos < chars.len()
                && (chars[pos].is_alphanumeric() || chars[pos] == '_' || chars[pos] == '.')
            {
                pos += 1;
            }
            tokens.push((offset, Token::Ident(chars[start..pos].iter().collect())));
            continue;
        }

        match c {
            '(' => tokens.push((offset, Token::LParen)),
            ')' => tokens.push((offset, Token::RParen)),
            ',' => tokens.push((offset, Token::Comma)),
            _ => {
                let rest: String = chars[pos..chars.len().min(pos + 2)].iter().collect();
                let op = OPERATORS
                    .iter()
                    .find(|op| rest.starts_with(**op))
                    .ok_or_else(|| FormulaError::Syntax {
                        offset,
                        message: format!("unexpected character '{}'", c),
                    })?;
                tokens.push((offset, Token::Op(*op)));
                pos += op.len();
                continue;
            }
        }
        pos += 1;
    }

    Ok(tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
    Literal(PropertyValue),
    Ref(String),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|(o, _)| *o).unwrap_or(self.end)
    }

    fn syntax(&self, message: impl Into<String>) -> FormulaError {
        FormulaError::Syntax {
            offset: self.offset(),
            message: message.into(),
        }
    }

    fn eat_op(&mut self, ops: &[&'static str]) -> Option<&'static str> {
        match self.peek() {
            Some(Token::Op(op)) if ops.contains(op) => {
                let op = *op;
                self.pos += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), FormulaError> {
        if self.peek() == Some(&token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.syntax(format!("expected {}", what)))
        }
    }

    fn parse_or(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_and()?;
        while self.eat_op(&["||"]).is_some() {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_comparison()?;
        while self.eat_op(&["&&"]).is_some() {
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_comparison(&mut self) -> Result<Expr, FormulaError> {
        let lhs = self.parse_additive()?;
        let op = match self.eat_op(&["==", "!=", "<=", ">=", "<", ">"]) {
            Some("==") => BinaryOp::Eq,
            Some("!=") => BinaryOp::Ne,
            Some("<=") => BinaryOp::Le,
            Some(">=") => BinaryOp::Ge,
            Some("<") => BinaryOp::Lt,
            Some(">") => BinaryOp::Gt,
            _ => return Ok(lhs),
        };
        let rhs = self.parse_additive()?;
        Ok(Expr::Binary(op, Box::new(lhs), Box::new(rhs)))
    }

    fn parse_additive(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_multiplicative()?;
        while let Some(op) = self.eat_op(&["+", "-"]) {
            let rhs = self.parse_multiplicative()?;
            let op = if op == "+" { BinaryOp::Add } else { BinaryOp::Sub };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.parse_unary()?;
        while let Some(op) = self.eat_op(&["*", "/", "%"]) {
            let rhs = self.parse_unary()?;
            let op = match op {
                "*" => BinaryOp::Mul,
                "/" => BinaryOp::Div,
                _ => BinaryOp::Rem,
            };
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, FormulaError> {
        if self.eat_op(&["!"]).is_some() {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        if self.eat_op(&["-"]).is_some() {
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, FormulaError> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| self.syntax("unexpected end of formula"))?;
        self.pos += 1;

        match token {
            Token::Number(value) => Ok(Expr::Literal(PropertyValue::from_number(value))),
            Token::Str(value) => Ok(Expr::Literal(PropertyValue::String(value))),
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(name) => match name.as_str() {
                "true" => Ok(Expr::Literal(PropertyValue::Boolean(true))),
                "false" => Ok(Expr::Literal(PropertyValue::Boolean(false))),
                "null" => Ok(Expr::Literal(PropertyValue::Null)),
                _ if self.peek() == Some(&Token::LParen) => {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.parse_or()?);
                            if self.peek() == Some(&Token::Comma) {
                                self.pos += 1;
                            } else {
                                break;
                            }
                        }
                    }
                    self.expect(Token::RParen, "')' after arguments")?;
                    Ok(Expr::Call(name, args))
                }
                _ => Ok(Expr::Ref(name)),
            },
            other => {
                self.pos -= 1;
                Err(self.syntax(format!("unexpected token {:?}", other)))
            }
        }
    }
}

/// Parses one expression. `base` is the offset of `src` inside the phrase,
/// so error offsets point into the whole phrase.
pub(crate) fn parse(src: &str, base: usize) -> Result<Expr, FormulaError> {
    let tokens = tokenize(src, base)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: base + src.len(),
    };
    let expr = parser.parse_or()?;
    if parser.pos < parser.tokens.len() {
        return Err(parser.syntax("unexpected trailing input"));
    }
    Ok(expr)
}

/// Evaluation state: the bag being read and every reference resolved so far.
pub(crate) struct Scope<'a> {
    pub props: &'a PropertyBag,
    pub values: BTreeMap<String, PropertyValue>,
}

impl<'a> Scope<'a> {
    pub fn new(props: &'a PropertyBag) -> Self {
        Self {
            props,
            values: BTreeMap::new(),
        }
    }

    fn resolve(&mut self, path: &str) -> PropertyValue {
        let value = PropertyValue::lookup(self.props, path)
            .cloned()
            .unwrap_or(PropertyValue::Null);
        self.values.insert(path.to_string(), value.clone());
        value
    }
}

fn number(value: &PropertyValue) -> Result<f64, FormulaError> {
    value
        .as_number()
        .ok_or_else(|| FormulaError::NotNumeric(format!("'{}'", value)))
}

fn is_numeric_kind(value: &PropertyValue) -> bool {
    matches!(
        value,
        PropertyValue::Null
            | PropertyValue::Boolean(_)
            | PropertyValue::Integer(_)
            | PropertyValue::Float(_)
    )
}

fn compare(op: BinaryOp, lhs: &PropertyValue, rhs: &PropertyValue) -> bool {
    use std::cmp::Ordering;

    let ordering = match (lhs.as_number(), rhs.as_number()) {
        (Some(a), Some(b)) if is_numeric_kind(lhs) || is_numeric_kind(rhs) => {
            a.partial_cmp(&b)
        }
        _ => Some(lhs.to_string().cmp(&rhs.to_string())),
    };

    match (op, ordering) {
        (BinaryOp::Eq, ordering) => ordering == Some(Ordering::Equal),
        (BinaryOp::Ne, ordering) => ordering != Some(Ordering::Equal),
        (_, None) => false,
        (BinaryOp::Lt, Some(o)) => o == Ordering::Less,
        (BinaryOp::Le, Some(o)) => o != Ordering::Greater,
        (BinaryOp::Gt, Some(o)) => o == Ordering::Greater,
        (BinaryOp::Ge, Some(o)) => o != Ordering::Less,
        _ => false,
    }
}

fn call(name: &str, args: &[Expr], scope: &mut Scope<'_>) -> Result<PropertyValue, FormulaError> {
    let arity = |expected: &'static str, ok: bool| {
        if ok {
            Ok(())
        } else {
            Err(FormulaError::Arity {
                name: name.to_string(),
                expected,
                got: args.len(),
            })
        }
    };

    match name {
        "if" => {
            arity("3", args.len() == 3)?;
            if evaluate(&args[0], scope)?.is_truthy() {
                evaluate(&args[1], scope)
            } else {
                evaluate(&args[2], scope)
            }
        }
        "min" | "max" => {
            arity("at least 1", !args.is_empty())?;
            let mut best: Option<f64> = None;
            for arg in args {
                let value = number(&evaluate(arg, scope)?)?;
                best = Some(match best {
                    None => value,
                    Some(current) if name == "min" => current.min(value),
                    Some(current) => current.max(value),
                });
            }
            Ok(PropertyValue::from_number(best.unwrap_or_default()))
        }
        "floor" | "ceil" | "round" | "abs" => {
            arity("1", args.len() == 1)?;
            let value = number(&evaluate(&args[0], scope)?)?;
            let result = match name {
                "floor" => value.floor(),
                "ceil" => value.ceil(),
                "round" => value.round(),
                _ => value.abs(),
            };
            Ok(PropertyValue::from_number(result))
        }
        _ => Err(FormulaError::UnknownFunction(name.to_string())),
    }
}

pub(crate) fn evaluate(expr: &Expr, scope: &mut Scope<'_>) -> Result<PropertyValue, FormulaError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ref(path) => Ok(scope.resolve(path)),
        Expr::Not(inner) => Ok(PropertyValue::Boolean(!evaluate(inner, scope)?.is_truthy())),
        Expr::Neg(inner) => Ok(PropertyValue::from_number(-number(&evaluate(inner, scope)?)?)),
        Expr::Call(name, args) => call(name, args, scope),
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            let result = evaluate(lhs, scope)?.is_truthy() && evaluate(rhs, scope)?.is_truthy();
            Ok(PropertyValue::Boolean(result))
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            let result = evaluate(lhs, scope)?.is_truthy() || evaluate(rhs, scope)?.is_truthy();
            Ok(PropertyValue::Boolean(result))
        }
        Expr::Binary(op, lhs, rhs) => {
            let lhs = evaluate(lhs, scope)?;
            let rhs = evaluate(rhs, scope)?;
            match op {
                BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::Lt
                | BinaryOp::Le
                | BinaryOp::Gt
                | BinaryOp::Ge => Ok(PropertyValue::Boolean(compare(*op, &lhs, &rhs))),
                BinaryOp::Add
                    if matches!(lhs, PropertyValue::String(_))
                        || matches!(rhs, PropertyValue::String(_)) =>
                {
                    Ok(PropertyValue::String(format!("{}{}", lhs, rhs)))
                }
                _ => {
                    let a = number(&lhs)?;
                    let b = number(&rhs)?;
                    let result = match op {
                        BinaryOp::Add => a + b,
                        BinaryOp::Sub => a - b,
                        BinaryOp::Mul => a * b,
                        BinaryOp::Div | BinaryOp::Rem if b == 0.0 => {
                            return Err(FormulaError::DivisionByZero)
                        }
                        BinaryOp::Div => a / b,
                        _ => a % b,
                    };
                    Ok(PropertyValue::from_number(result))
                }
            }
        }
    }
}
