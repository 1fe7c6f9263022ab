//! Tokenizer and parser for the cut expression language.
//!
//! Cut expressions are the strings found in analysis configurations:
//!
//! ```text
//! ev : ev.ht40[0] > 200
//! ev : -2.5 < ev.jet_eta[0] < 2.5
//! ev : 200 <= ev.ht40[0] < 250
//! ```
//!
//! A binding identifier is declared before the colon; the body is a chain of
//! comparisons over attribute references and numeric literals. Chains behave
//! like Python's chained comparisons: every adjacent pair must hold.

use crate::event::AttrRef;
use crate::utils::error::PredicateError;

/// Comparison operator of one chain link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    /// Apply to two numbers. NaN operands fail every comparison except `!=`,
    /// the IEEE behavior; a cut on a NaN quantity simply does not pass.
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CmpOp::Eq => lhs == rhs,
            CmpOp::Ne => lhs != rhs,
            CmpOp::Lt => lhs < rhs,
            CmpOp::Le => lhs <= rhs,
            CmpOp::Gt => lhs > rhs,
            CmpOp::Ge => lhs >= rhs,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }
}

/// One operand of a comparison chain
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Literal(f64),
    Attr(AttrRef),
}

/// Parse result: the binding name plus an alternating operand/operator chain
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCut {
    pub binding: String,
    pub operands: Vec<Operand>,
    pub ops: Vec<CmpOp>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Number(f64),
    Colon,
    Dot,
    LBracket,
    RBracket,
    Minus,
    Cmp(CmpOp),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Ident(s) => s.clone(),
            Token::Number(n) => n.to_string(),
            Token::Colon => ":".to_string(),
            Token::Dot => ".".to_string(),
            Token::LBracket => "[".to_string(),
            Token::RBracket => "]".to_string(),
            Token::Minus => "-".to_string(),
            Token::Cmp(op) => op.as_str().to_string(),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, PredicateError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos] as char;
        match c {
            ' ' | '\t' => pos += 1,
            ':' => {
                tokens.push(Token::Colon);
                pos += 1;
            }
            '.' if !next_is_digit(bytes, pos + 1) => {
                tokens.push(Token::Dot);
                pos += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                pos += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                pos += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                pos += 1;
            }
            '=' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::Cmp(CmpOp::Eq));
                    pos += 2;
                } else {
                    return Err(PredicateError::UnexpectedChar('=', pos));
                }
            }
            '!' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::Cmp(CmpOp::Ne));
                    pos += 2;
                } else {
                    return Err(PredicateError::UnexpectedChar('!', pos));
                }
            }
            '<' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::Cmp(CmpOp::Le));
                    pos += 2;
                } else {
                    tokens.push(Token::Cmp(CmpOp::Lt));
                    pos += 1;
                }
            }
            '>' => {
                if bytes.get(pos + 1) == Some(&b'=') {
                    tokens.push(Token::Cmp(CmpOp::Ge));
                    pos += 2;
                } else {
                    tokens.push(Token::Cmp(CmpOp::Gt));
                    pos += 1;
                }
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let start = pos;
                while pos < bytes.len() {
                    let d = bytes[pos] as char;
                    if d.is_ascii_digit() || d == '.' {
                        pos += 1;
                    } else {
                        break;
                    }
                }
                let literal = &text[start..pos];
                let value: f64 = literal
                    .parse()
                    .map_err(|_| PredicateError::BadNumber(literal.to_string()))?;
                tokens.push(Token::Number(value));
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = pos;
                while pos < bytes.len() {
                    let d = bytes[pos] as char;
                    if d.is_ascii_alphanumeric() || d == '_' {
                        pos += 1;
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(text[start..pos].to_string()));
            }
            _ => return Err(PredicateError::UnexpectedChar(c, pos)),
        }
    }

    Ok(tokens)
}

fn next_is_digit(bytes: &[u8], pos: usize) -> bool {
    bytes.get(pos).is_some_and(|b| b.is_ascii_digit())
}

/// Parse a full cut expression
///
/// **Public (crate)** - called by `Predicate::compile`
pub(crate) fn parse(text: &str) -> Result<ParsedCut, PredicateError> {
    let tokens = tokenize(text)?;
    let mut cursor = Cursor { tokens, pos: 0 };

    // `ev :` prefix declares the binding identifier for attribute references.
    let binding = match cursor.next() {
        Some(Token::Ident(name)) => name,
        _ => return Err(PredicateError::MissingBinding),
    };
    match cursor.next() {
        Some(Token::Colon) => {}
        _ => return Err(PredicateError::MissingBinding),
    }

    let mut operands = vec![cursor.operand(&binding)?];
    let mut ops = Vec::new();
    while !cursor.at_end() {
        ops.push(cursor.cmp_op()?);
        operands.push(cursor.operand(&binding)?);
    }
    if ops.is_empty() {
        return Err(PredicateError::NoComparison);
    }

    Ok(ParsedCut {
        binding,
        operands,
        ops,
    })
}

struct Cursor {
    tokens: Vec<Token>,
    pos: usize,
}

impl Cursor {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn cmp_op(&mut self) -> Result<CmpOp, PredicateError> {
        match self.next() {
            Some(Token::Cmp(op)) => Ok(op),
            Some(other) => Err(PredicateError::UnexpectedToken {
                expected: "a comparison operator",
                found: other.describe(),
            }),
            None => Err(PredicateError::UnexpectedEnd),
        }
    }

    /// One operand: a (possibly negated) literal or an attribute reference
    fn operand(&mut self, binding: &str) -> Result<Operand, PredicateError> {
        match self.next() {
            Some(Token::Number(v)) => Ok(Operand::Literal(v)),
            Some(Token::Minus) => match self.next() {
                Some(Token::Number(v)) => Ok(Operand::Literal(-v)),
                Some(other) => Err(PredicateError::UnexpectedToken {
                    expected: "a number after '-'",
                    found: other.describe(),
                }),
                None => Err(PredicateError::UnexpectedEnd),
            },
            Some(Token::Ident(name)) if name == binding => self.attr_ref(),
            Some(Token::Ident(name)) => Err(PredicateError::UnknownBinding(name)),
            Some(other) => Err(PredicateError::UnexpectedToken {
                expected: "a number or an attribute reference",
                found: other.describe(),
            }),
            None => Err(PredicateError::UnexpectedEnd),
        }
    }

    /// The `.name` / `.name[i]` part after the binding identifier
    fn attr_ref(&mut self) -> Result<Operand, PredicateError> {
        match self.next() {
            Some(Token::Dot) => {}
            Some(other) => {
                return Err(PredicateError::UnexpectedToken {
                    expected: "'.' after the binding identifier",
                    found: other.describe(),
                })
            }
            None => return Err(PredicateError::UnexpectedEnd),
        }
        let name = match self.next() {
            Some(Token::Ident(name)) => name,
            Some(other) => {
                return Err(PredicateError::UnexpectedToken {
                    expected: "an attribute name",
                    found: other.describe(),
                })
            }
            None => return Err(PredicateError::UnexpectedEnd),
        };

        if self.peek() != Some(&Token::LBracket) {
            return Ok(Operand::Attr(AttrRef::scalar(name)));
        }
        self.next();
        let index = match self.next() {
            Some(Token::Number(v)) if v.fract() == 0.0 && v >= 0.0 => v as usize,
            Some(other) => {
                return Err(PredicateError::UnexpectedToken {
                    expected: "a non-negative integer index",
                    found: other.describe(),
                })
            }
            None => return Err(PredicateError::UnexpectedEnd),
        };
        match self.next() {
            Some(Token::RBracket) => Ok(Operand::Attr(AttrRef::indexed(name, index))),
            Some(other) => Err(PredicateError::UnexpectedToken {
                expected: "']'",
                found: other.describe(),
            }),
            None => Err(PredicateError::UnexpectedEnd),
        }
    }
}
