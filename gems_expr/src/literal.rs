//! Literal-only value parser.
//!
//! Accepts the constant subset of the rule language: numbers (optionally
//! signed), strings, `True`/`False`/`None`, and lists or tuples built from
//! those. Anything that would need evaluation is reported as
//! [`LiteralError::NotConstant`] with the kind of node that was found.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A parsed constant argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
}

/// Non-constant constructs the parser recognises and refuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Name,
    Call,
    Attribute,
    Subscript,
    Operator,
    Comprehension,
    FormattedString,
    Mapping,
    Lambda,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NodeKind::Name => "name reference",
            NodeKind::Call => "function call",
            NodeKind::Attribute => "attribute access",
            NodeKind::Subscript => "subscript",
            NodeKind::Operator => "operator",
            NodeKind::Comprehension => "comprehension",
            NodeKind::FormattedString => "formatted string",
            NodeKind::Mapping => "dict or set display",
            NodeKind::Lambda => "lambda",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("malformed value '{text}' at offset {offset}: {message}")]
    Syntax {
        text: String,
        offset: usize,
        message: String,
    },
    #[error("'{text}' contains a {kind}; only constant literals are allowed")]
    NotConstant { text: String, kind: NodeKind },
}

impl LiteralError {
    pub fn is_syntax(&self) -> bool {
        matches!(self, LiteralError::Syntax { .. })
    }
}

impl Literal {
    /// Python-style `repr`, used when a literal is nested inside another.
    pub fn repr(&self) -> String {
        match self {
            Literal::Str(value) => quote_str(value),
            other => other.to_string(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::None => "None",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Str(_) => "str",
            Literal::List(_) => "list",
            Literal::Tuple(_) => "tuple",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Literal::None => false,
            Literal::Bool(value) => *value,
            Literal::Int(value) => *value != 0,
            Literal::Float(value) => *value != 0.0,
            Literal::Str(value) => !value.is_empty(),
            Literal::List(items) | Literal::Tuple(items) => !items.is_empty(),
        }
    }

    /// Integer view following `int(...)` conversion rules.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Bool(value) => Some(i64::from(*value)),
            Literal::Int(value) => Some(*value),
            Literal::Float(value) if value.is_finite() => Some(value.trunc() as i64),
            Literal::Str(value) => value.trim().replace('_', "").parse().ok(),
            _ => None,
        }
    }

    /// Float view following `float(...)` conversion rules.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Literal::Bool(value) => Some(if *value { 1.0 } else { 0.0 }),
            Literal::Int(value) => Some(*value as f64),
            Literal::Float(value) => Some(*value),
            Literal::Str(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn items(&self) -> Option<&[Literal]> {
        match self {
            Literal::List(items) | Literal::Tuple(items) => Some(items),
            _ => None,
        }
    }
}

/// `str(...)` rendering: strings print bare, containers print their items'
/// `repr`.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::None => f.write_str("None"),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Float(value) => f.write_str(&format_float(*value)),
            Literal::Str(value) => f.write_str(value),
            Literal::List(items) => {
                let inner: Vec<String> = items.iter().map(Literal::repr).collect();
                write!(f, "[{}]", inner.join(", "))
            }
            Literal::Tuple(items) if items.len() == 1 => write!(f, "({},)", items[0].repr()),
            Literal::Tuple(items) => {
                let inner: Vec<String> = items.iter().map(Literal::repr).collect();
                write!(f, "({})", inner.join(", "))
            }
        }
    }
}

/// Render a float the way the authoring tool prints it (`3.0`, not `3`).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        let label = if value > 0.0 { "inf" } else { "-inf" };
        label.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

fn quote_str(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') { '"' } else { '\'' };
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Parse `text` as a single constant literal.
pub fn parse_literal(text: &str) -> Result<Literal, LiteralError> {
    let mut parser = LiteralParser::new(text);
    let value = parser.expression()?;
    parser.skip_ws();
    if parser.at_end() {
        Ok(value)
    } else {
        Err(parser.trailing())
    }
}

const OPERATOR_CHARS: &str = "+-*/%@<>=!&|^~:";

/// Deepest list/tuple nesting accepted before the value is refused.
pub const MAX_NESTING: usize = 100;

struct LiteralParser<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn skip_ws(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn syntax(&self, message: impl Into<String>) -> LiteralError {
        LiteralError::Syntax {
            text: self.text.to_string(),
            offset: self.pos,
            message: message.into(),
        }
    }

    fn not_constant(&self, kind: NodeKind) -> LiteralError {
        LiteralError::NotConstant {
            text: self.text.to_string(),
            kind,
        }
    }

    /// One value followed by a separator, a closing bracket or the end.
    fn expression(&mut self) -> Result<Literal, LiteralError> {
        let value = self.primary()?;
        self.skip_ws();
        match self.peek() {
            None | Some(',') | Some(']') | Some(')') => Ok(value),
            Some(_) => Err(self.trailing()),
        }
    }

    /// Classify whatever follows a complete value.
    fn trailing(&mut self) -> LiteralError {
        self.skip_ws();
        match self.peek() {
            None => self.syntax("unexpected end of input"),
            Some('(') => self.not_constant(NodeKind::Call),
            Some('.') => self.not_constant(NodeKind::Attribute),
            Some('[') => self.not_constant(NodeKind::Subscript),
            Some(c) if OPERATOR_CHARS.contains(c) => self.not_constant(NodeKind::Operator),
            Some(c) if is_ident_start(c) => match self.peek_word().as_str() {
                "for" | "async" => self.not_constant(NodeKind::Comprehension),
                "if" | "and" | "or" | "not" | "in" | "is" => self.not_constant(NodeKind::Operator),
                word => self.syntax(format!("unexpected token '{word}'")),
            },
            Some(c) => self.syntax(format!("unexpected character '{c}'")),
        }
    }

    fn primary(&mut self) -> Result<Literal, LiteralError> {
        self.skip_ws();
        let Some(ch) = self.peek() else {
            return Err(self.syntax("expected a value"));
        };
        match ch {
            '[' | '(' => self.nested(ch),
            '{' => Err(self.not_constant(NodeKind::Mapping)),
            '\'' | '"' => self.strings(),
            '-' | '+' => self.signed(),
            '~' => Err(self.not_constant(NodeKind::Operator)),
            c if c.is_ascii_digit() => self.number(false),
            '.' if self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) => self.number(false),
            c if is_ident_start(c) => {
                if self.string_prefix().is_some() {
                    self.strings()
                } else {
                    self.word()
                }
            }
            c => Err(self.syntax(format!("unexpected character '{c}'"))),
        }
    }

    fn signed(&mut self) -> Result<Literal, LiteralError> {
        let negative = self.bump() == Some('-');
        self.skip_ws();
        match self.peek() {
            Some(c) if c.is_ascii_digit() => self.number(negative),
            Some('.') if self.peek_at(1).map_or(false, |c| c.is_ascii_digit()) => {
                self.number(negative)
            }
            None => Err(self.syntax("sign without a number")),
            Some(_) => Err(self.not_constant(NodeKind::Operator)),
        }
    }

    fn number(&mut self, negative: bool) -> Result<Literal, LiteralError> {
        let mut digits = String::new();
        if negative {
            digits.push('-');
        }

        let radix = match (self.peek(), self.peek_at(1).map(|c| c.to_ascii_lowercase())) {
            (Some('0'), Some('x')) => 16,
            (Some('0'), Some('o')) => 8,
            (Some('0'), Some('b')) => 2,
            _ => 10,
        };

        let mut is_float = false;
        if radix != 10 {
            self.pos += 2;
            while let Some(c) = self.peek().filter(|c| c.is_ascii_hexdigit() || *c == '_') {
                digits.push(c);
                self.pos += 1;
            }
        } else {
            self.take_digits(&mut digits);
            if self.peek() == Some('.') {
                is_float = true;
                digits.push('.');
                self.pos += 1;
                self.take_digits(&mut digits);
            }
            if matches!(self.peek(), Some('e') | Some('E')) {
                let sign = self.peek_at(1).filter(|c| *c == '+' || *c == '-');
                let digit_at = if sign.is_some() { 2 } else { 1 };
                if self.peek_at(digit_at).map_or(false, |c| c.is_ascii_digit()) {
                    is_float = true;
                    digits.push('e');
                    if let Some(sign) = sign {
                        digits.push(sign);
                    }
                    self.pos += digit_at;
                    self.take_digits(&mut digits);
                }
            }
        }

        let glued = self.peek().map_or(false, |c| c.is_alphanumeric() || c == '_');
        if glued || (is_float && self.peek() == Some('.')) {
            return Err(self.syntax("invalid number literal"));
        }

        let cleaned = digits.replace('_', "");
        if is_float {
            cleaned
                .parse::<f64>()
                .map(Literal::Float)
                .map_err(|_| self.syntax("invalid float literal"))
        } else {
            i64::from_str_radix(&cleaned, radix)
                .map(Literal::Int)
                .map_err(|_| self.syntax("integer literal out of range"))
        }
    }

    fn take_digits(&mut self, out: &mut String) {
        while let Some(c) = self.peek().filter(|c| c.is_ascii_digit() || *c == '_') {
            out.push(c);
            self.pos += 1;
        }
    }

    fn peek_word(&self) -> String {
        self.chars[self.pos..]
            .iter()
            .take_while(|c| is_ident_char(**c))
            .collect()
    }

    fn word(&mut self) -> Result<Literal, LiteralError> {
        let word = self.peek_word();
        self.pos += word.chars().count();
        match word.as_str() {
            "True" => Ok(Literal::Bool(true)),
            "False" => Ok(Literal::Bool(false)),
            "None" => Ok(Literal::None),
            "lambda" => Err(self.not_constant(NodeKind::Lambda)),
            "not" => Err(self.not_constant(NodeKind::Operator)),
            _ => {
                self.skip_ws();
                let kind = match self.peek() {
                    Some('(') => NodeKind::Call,
                    Some('.') => NodeKind::Attribute,
                    Some('[') => NodeKind::Subscript,
                    _ => NodeKind::Name,
                };
                Err(self.not_constant(kind))
            }
        }
    }

    /// Length, raw flag and f-string flag of a string prefix at the cursor.
    fn string_prefix(&self) -> Option<(usize, bool, bool)> {
        for len in 1..=2 {
            let is_quote = matches!(self.peek_at(len), Some('\'') | Some('"'));
            if !is_quote {
                continue;
            }
            let prefix: String = self.chars[self.pos..self.pos + len]
                .iter()
                .collect::<String>()
                .to_ascii_lowercase();
            return match prefix.as_str() {
                "r" | "u" | "b" | "br" | "rb" => Some((len, prefix.contains('r'), false)),
                "f" | "fr" | "rf" => Some((len, true, true)),
                _ => None,
            };
        }
        None
    }

    /// One or more adjacent string literals, concatenated.
    fn strings(&mut self) -> Result<Literal, LiteralError> {
        let mut out = String::new();
        loop {
            let mut raw = false;
            if let Some((len, is_raw, formatted)) = self.string_prefix() {
                if formatted {
                    return Err(self.not_constant(NodeKind::FormattedString));
                }
                self.pos += len;
                raw = is_raw;
            }
            self.string_body(raw, &mut out)?;
            self.skip_ws();
            let continues = matches!(self.peek(), Some('\'') | Some('"'))
                || (self.peek().map_or(false, is_ident_start) && self.string_prefix().is_some());
            if !continues {
                return Ok(Literal::Str(out));
            }
        }
    }

    fn string_body(&mut self, raw: bool, out: &mut String) -> Result<(), LiteralError> {
        let Some(quote) = self.bump() else {
            return Err(self.syntax("expected a string"));
        };
        let triple = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if triple {
            self.pos += 2;
        }

        loop {
            let Some(ch) = self.bump() else {
                return Err(self.syntax("unterminated string"));
            };
            if ch == quote {
                if !triple {
                    return Ok(());
                }
                if self.peek() == Some(quote) && self.peek_at(1) == Some(quote) {
                    self.pos += 2;
                    return Ok(());
                }
                out.push(ch);
                continue;
            }
            if ch == '\n' && !triple {
                return Err(self.syntax("unterminated string"));
            }
            if ch != '\\' {
                out.push(ch);
                continue;
            }

            let Some(next) = self.bump() else {
                return Err(self.syntax("unterminated string"));
            };
            if raw {
                out.push('\\');
                out.push(next);
                continue;
            }
            match next {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '0' => out.push('\0'),
                'a' => out.push('\x07'),
                'b' => out.push('\x08'),
                'f' => out.push('\x0c'),
                'v' => out.push('\x0b'),
                '\\' | '\'' | '"' => out.push(next),
                '\n' => {}
                'x' => out.push(self.hex_escape(2)?),
                'u' => out.push(self.hex_escape(4)?),
                'U' => out.push(self.hex_escape(8)?),
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    fn hex_escape(&mut self, width: usize) -> Result<char, LiteralError> {
        let end = self.pos + width;
        if end > self.chars.len() {
            return Err(self.syntax("truncated escape sequence"));
        }
        let hex: String = self.chars[self.pos..end].iter().collect();
        let code = u32::from_str_radix(&hex, 16).map_err(|_| self.syntax("invalid escape sequence"))?;
        self.pos = end;
        char::from_u32(code).ok_or_else(|| self.syntax("invalid code point"))
    }

    fn nested(&mut self, open: char) -> Result<Literal, LiteralError> {
        if self.depth >= MAX_NESTING {
            return Err(self.syntax(format!("nesting deeper than {MAX_NESTING} levels")));
        }
        self.depth += 1;
        let value = if open == '[' { self.list() } else { self.parenthesized() };
        self.depth -= 1;
        value
    }

    fn list(&mut self) -> Result<Literal, LiteralError> {
        self.pos += 1;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(']') {
                return Ok(Literal::List(items));
            }
            items.push(self.expression()?);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat(']') {
                return Ok(Literal::List(items));
            }
            return Err(self.trailing());
        }
    }

    /// `()` and `(a,)` are tuples; `(a)` is just `a`.
    fn parenthesized(&mut self) -> Result<Literal, LiteralError> {
        self.pos += 1;
        self.skip_ws();
        if self.eat(')') {
            return Ok(Literal::Tuple(Vec::new()));
        }
        let first = self.expression()?;
        self.skip_ws();
        if self.eat(')') {
            return Ok(first);
        }
        if !self.eat(',') {
            return Err(self.trailing());
        }

        let mut items = vec![first];
        loop {
            self.skip_ws();
            if self.eat(')') {
                return Ok(Literal::Tuple(items));
            }
            items.push(self.expression()?);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat(')') {
                return Ok(Literal::Tuple(items));
            }
            return Err(self.trailing());
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind_of(text: &str) -> NodeKind {
        match parse_literal(text) {
            Err(LiteralError::NotConstant { kind, .. }) => kind,
            other => panic!("expected NotConstant for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn parses_scalars() {
        assert_eq!(parse_literal("42").unwrap(), Literal::Int(42));
        assert_eq!(parse_literal("-7").unwrap(), Literal::Int(-7));
        assert_eq!(parse_literal("+ 2.5").unwrap(), Literal::Float(2.5));
        assert_eq!(parse_literal(".5").unwrap(), Literal::Float(0.5));
        assert_eq!(parse_literal("1e3").unwrap(), Literal::Float(1000.0));
        assert_eq!(parse_literal("1_000").unwrap(), Literal::Int(1000));
        assert_eq!(parse_literal("0x1F").unwrap(), Literal::Int(31));
        assert_eq!(parse_literal("True").unwrap(), Literal::Bool(true));
        assert_eq!(parse_literal("None").unwrap(), Literal::None);
        assert_eq!(parse_literal("  'hi'  ").unwrap(), Literal::Str("hi".into()));
    }

    #[test]
    fn parses_string_escapes_and_prefixes() {
        assert_eq!(
            parse_literal(r#""a\tb\'c\x41""#).unwrap(),
            Literal::Str("a\tb'cA".into())
        );
        assert_eq!(parse_literal(r"r'\d+'").unwrap(), Literal::Str(r"\d+".into()));
        assert_eq!(parse_literal("'ab' \"cd\"").unwrap(), Literal::Str("abcd".into()));
        assert_eq!(parse_literal("'''multi\nline'''").unwrap(), Literal::Str("multi\nline".into()));
        assert_eq!(parse_literal("''").unwrap(), Literal::Str(String::new()));
    }

    #[test]
    fn parses_nested_containers() {
        let value = parse_literal("['red', 255, (0, 1.5), [[None]], ()]").unwrap();
        assert_eq!(
            value,
            Literal::List(vec![
                Literal::Str("red".into()),
                Literal::Int(255),
                Literal::Tuple(vec![Literal::Int(0), Literal::Float(1.5)]),
                Literal::List(vec![Literal::List(vec![Literal::None])]),
                Literal::Tuple(Vec::new()),
            ])
        );
        assert_eq!(parse_literal("(3)").unwrap(), Literal::Int(3));
        assert_eq!(parse_literal("(3,)").unwrap(), Literal::Tuple(vec![Literal::Int(3)]));
        assert_eq!(parse_literal("[1, 2,]").unwrap(), Literal::List(vec![Literal::Int(1), Literal::Int(2)]));
    }

    #[test]
    fn classifies_non_constant_nodes() {
        assert_eq!(kind_of("os"), NodeKind::Name);
        assert_eq!(kind_of("__import__('os')"), NodeKind::Call);
        assert_eq!(kind_of("open ('x')"), NodeKind::Call);
        assert_eq!(kind_of("'abc'.upper()"), NodeKind::Attribute);
        assert_eq!(kind_of("sys.exit"), NodeKind::Attribute);
        assert_eq!(kind_of("1 + 2"), NodeKind::Operator);
        assert_eq!(kind_of("--1"), NodeKind::Operator);
        assert_eq!(kind_of("-x"), NodeKind::Operator);
        assert_eq!(kind_of("[x for x in 'ab']"), NodeKind::Name);
        assert_eq!(kind_of("[1 for _ in ()]"), NodeKind::Comprehension);
        assert_eq!(kind_of("f'{x}'"), NodeKind::FormattedString);
        assert_eq!(kind_of("{'a': 1}"), NodeKind::Mapping);
        assert_eq!(kind_of("lambda: 1"), NodeKind::Lambda);
        assert_eq!(kind_of("[1, 2][0]"), NodeKind::Subscript);
        assert_eq!(kind_of("[1, open('f')]"), NodeKind::Call);
    }

    #[test]
    fn reports_syntax_errors() {
        for text in ["", "'open", "[1, 2", "(1 2)", "4abc", "1.5.2", "99999999999999999999", "'a\nb'"] {
            let err = parse_literal(text).unwrap_err();
            assert!(err.is_syntax(), "{text:?} gave {err:?}");
        }
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let nested = |depth: usize| format!("{}1{}", "[".repeat(depth), "]".repeat(depth));
        assert!(parse_literal(&nested(MAX_NESTING)).is_ok());
        assert!(parse_literal(&nested(MAX_NESTING + 1)).unwrap_err().is_syntax());
        let tuples = format!("{}1{}", "(".repeat(50_000), ",)".repeat(50_000));
        assert!(parse_literal(&tuples).unwrap_err().is_syntax());
    }

    #[test]
    fn display_matches_python_str() {
        assert_eq!(Literal::Float(3.0).to_string(), "3.0");
        assert_eq!(Literal::Float(0.25).to_string(), "0.25");
        assert_eq!(Literal::Bool(false).to_string(), "False");
        let list = parse_literal("['a', 1, (2,), \"it's\"]").unwrap();
        assert_eq!(list.to_string(), "['a', 1, (2,), \"it's\"]");
    }

    #[test]
    fn conversions_follow_numeric_coercion() {
        assert_eq!(Literal::Str(" 12 ".into()).as_int(), Some(12));
        assert_eq!(Literal::Float(2.9).as_int(), Some(2));
        assert_eq!(Literal::Str("2.5".into()).as_float(), Some(2.5));
        assert_eq!(Literal::Bool(true).as_int(), Some(1));
        assert_eq!(Literal::None.as_float(), None);
        assert!(!Literal::Str(String::new()).is_truthy());
        assert!(Literal::List(vec![Literal::None]).is_truthy());
    }
}
