//! Expression tokenizer.
//!
//! Splits an expression on operators and parentheses, trims each piece and
//! classifies it exactly once. Classification order is fixed: parentheses,
//! functions, operators, boolean literals, identifiers, numbers, quoted
//! strings. Word operators (`AND`, `OR`, `NOT`, `XOR`) and function names are
//! only split out as whole words, and quoted strings are never split.

use std::fmt;

use crate::error::ExprError;
use crate::value::Value;

// ──────────────────────────────────────────────
// Tokens
// ──────────────────────────────────────────────

/// Binary and unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
    And,
    Or,
    Xor,
    Not,
}

impl Operator {
    pub fn from_symbol(s: &str) -> Option<Operator> {
        let op = match s {
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            "%" => Operator::Rem,
            "^" => Operator::Pow,
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Ge,
            "<=" => Operator::Le,
            "AND" => Operator::And,
            "OR" => Operator::Or,
            "XOR" => Operator::Xor,
            "NOT" => Operator::Not,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Rem => "%",
            Operator::Pow => "^",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::And => "AND",
            Operator::Or => "OR",
            Operator::Xor => "XOR",
            Operator::Not => "NOT",
        }
    }

    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Operator::Pow => 48,
            Operator::Mul | Operator::Div | Operator::Rem => 32,
            Operator::Add | Operator::Sub => 16,
            Operator::Gt | Operator::Lt | Operator::Ge | Operator::Le => 8,
            Operator::Eq | Operator::Ne => 4,
            Operator::Not => 3,
            Operator::And => 2,
            Operator::Or | Operator::Xor => 1,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Operator::Not => 1,
            _ => 2,
        }
    }
}

/// Built-in functions. All take a single argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    IsNull,
}

impl Function {
    /// Precedence shared by every function.
    pub const PRECEDENCE: u8 = 64;

    pub fn from_name(s: &str) -> Option<Function> {
        match s {
            "ISNULL" => Some(Function::IsNull),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::IsNull => "ISNULL",
        }
    }

    pub fn arity(self) -> usize {
        1
    }
}

/// A classified expression token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    OpenParen,
    CloseParen,
    Function(Function),
    Operator(Operator),
    /// Boolean, numeric or quoted-string literal.
    Literal(Value),
    /// Reference to another piece of evidence by id.
    Identifier(String),
}

impl Token {
    /// Precedence used by the infix-to-postfix conversion. Parentheses sit
    /// below every operator.
    pub fn precedence(&self) -> u8 {
        match self {
            Token::Operator(op) => op.precedence(),
            Token::Function(_) => Function::PRECEDENCE,
            _ => 0,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::OpenParen => f.write_str("("),
            Token::CloseParen => f.write_str(")"),
            Token::Function(func) => f.write_str(func.name()),
            Token::Operator(op) => f.write_str(op.symbol()),
            Token::Literal(Value::Text(s)) => write!(f, "\"{}\"", s),
            Token::Literal(v) => write!(f, "{}", v),
            Token::Identifier(id) => f.write_str(id),
        }
    }
}

// ──────────────────────────────────────────────
// Tokenizer
// ──────────────────────────────────────────────

const WORD_OPERATORS: &[&str] = &["AND", "OR", "NOT", "XOR", "ISNULL"];

/// Tokenize and classify an expression into its infix token sequence.
pub fn tokenize(src: &str) -> Result<Vec<Token>, ExprError> {
    let pieces = split(src)?;
    let mut tokens = Vec::with_capacity(pieces.len());
    for piece in &pieces {
        tokens.push(classify(piece)?);
    }

    // An identifier in call position must be a known function.
    for pair in tokens.windows(2) {
        if let [Token::Identifier(name), Token::OpenParen] = pair {
            return Err(ExprError::UnknownFunction { name: name.clone() });
        }
    }

    tracing::trace!(
        expression = src,
        tokens = %tokens.iter().map(|t| t.to_string()).collect::<Vec<_>>().join("|"),
        "tokenized"
    );
    Ok(tokens)
}

/// Split into raw trimmed pieces without classifying them.
fn split(src: &str) -> Result<Vec<String>, ExprError> {
    let chars: Vec<char> = src.chars().collect();
    let mut pieces = Vec::new();
    let mut pending = String::new();
    let mut pos = 0usize;

    while pos < chars.len() {
        let c = chars[pos];

        // Quoted string: kept whole, quotes included.
        if c == '"' {
            flush(&mut pending, &mut pieces);
            let start = pos;
            pos += 1;
            while pos < chars.len() && chars[pos] != '"' {
                pos += 1;
            }
            if pos >= chars.len() {
                return Err(ExprError::InvalidToken {
                    token: chars[start..].iter().collect(),
                });
            }
            pos += 1;
            pieces.push(chars[start..pos].iter().collect());
            continue;
        }

        if c == '(' || c == ')' {
            flush(&mut pending, &mut pieces);
            pieces.push(c.to_string());
            pos += 1;
            continue;
        }

        if is_symbol(c) {
            flush(&mut pending, &mut pieces);
            let two: String = chars[pos..(pos + 2).min(chars.len())].iter().collect();
            if two.len() == 2 && Operator::from_symbol(&two).is_some() {
                pieces.push(two);
                pos += 2;
                continue;
            }
            let one = c.to_string();
            if Operator::from_symbol(&one).is_none() {
                let mut end = pos;
                while end < chars.len() && is_symbol(chars[end]) {
                    end += 1;
                }
                return Err(ExprError::UnknownOperator {
                    operator: chars[pos..end].iter().collect(),
                });
            }
            pieces.push(one);
            pos += 1;
            continue;
        }

        // Word: a keyword becomes its own piece, anything else joins the
        // pending text.
        if c.is_alphanumeric() || c == '_' || c == '.' {
            let start = pos;
            while pos < chars.len()
                && (chars[pos].is_alphanumeric() || chars[pos] == '_' || chars[pos] == '.')
            {
                pos += 1;
            }
            let word: String = chars[start..pos].iter().collect();
            if WORD_OPERATORS.contains(&word.as_str()) {
                flush(&mut pending, &mut pieces);
                pieces.push(word);
            } else {
                pending.push_str(&word);
            }
            continue;
        }

        pending.push(c);
        pos += 1;
    }
    flush(&mut pending, &mut pieces);
    Ok(pieces)
}

fn flush(pending: &mut String, pieces: &mut Vec<String>) {
    let trimmed = pending.trim();
    if !trimmed.is_empty() {
        pieces.push(trimmed.to_string());
    }
    pending.clear();
}

fn is_symbol(c: char) -> bool {
    matches!(
        c,
        '+' | '-' | '*' | '/' | '%' | '^' | '=' | '!' | '<' | '>' | '&' | '|'
    )
}

/// Classify one trimmed piece.
fn classify(s: &str) -> Result<Token, ExprError> {
    if s == "(" {
        return Ok(Token::OpenParen);
    }
    if s == ")" {
        return Ok(Token::CloseParen);
    }
    // Functions before identifiers: exact match against the function table.
    if let Some(func) = Function::from_name(s) {
        return Ok(Token::Function(func));
    }
    if let Some(op) = Operator::from_symbol(s) {
        return Ok(Token::Operator(op));
    }
    // Booleans before identifiers.
    if s.eq_ignore_ascii_case("true") {
        return Ok(Token::Literal(Value::Boolean(true)));
    }
    if s.eq_ignore_ascii_case("false") {
        return Ok(Token::Literal(Value::Boolean(false)));
    }
    if is_identifier(s) {
        return Ok(Token::Identifier(s.to_string()));
    }
    if is_number(s) {
        if let Ok(n) = s.parse::<f64>() {
            return Ok(Token::Literal(Value::Number(n)));
        }
    }
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        return Ok(Token::Literal(Value::Text(s[1..s.len() - 1].to_string())));
    }
    Err(ExprError::InvalidToken {
        token: s.to_string(),
    })
}

/// Leading letter followed by letters and digits.
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() => chars.all(|c| c.is_alphanumeric()),
        _ => false,
    }
}

/// Digits with at most one decimal point, starting with a digit.
fn is_number(s: &str) -> bool {
    let mut dots = 0;
    for c in s.chars() {
        if c == '.' {
            dots += 1;
        } else if !c.is_ascii_digit() {
            return false;
        }
    }
    dots <= 1 && s.starts_with(|c: char| c.is_ascii_digit())
}
