//! Expression AST used inside field declarations.
//!
//! Terms compute lengths, conditions and discriminators, e.g. `payloadLength - 4`,
//! `header.flags[2]` or `STATIC_CALL(count, 1)`. They are immutable once built and
//! compare structurally, so duplicate length expressions shared by many fields can be
//! deduplicated through a `HashSet` or `HashMap` key.
//!
//! This module prints terms ([`Term::string_representation`]); it does not evaluate
//! them. Binary terms print exactly as built, with no implicit parentheses. Grouping
//! the author wrote explicitly is a unary term with op [`GROUP_OP`]. Code that evaluates
//! terms should use [`Term::parenthesized_representation`], which makes every binary
//! grouping explicit.

use std::cell::OnceCell;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::types::TypeReference;

/// Longest `a.b.c...` chain a [`VariableLiteral`] may form.
pub const MAX_VARIABLE_DEPTH: usize = 32;

/// Unary op marking an explicitly parenthesised sub-expression.
pub const GROUP_OP: &str = "()";

/// Default ternary op.
pub const IF_OP: &str = "if";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TermError {
    #[error("variable {name} nests deeper than {max} segments")]
    TooDeep { name: String, max: usize },
    #[error("type reference of variable {name} is already bound")]
    TypeAlreadyBound { name: String },
    #[error("variable path has no segments")]
    EmptyPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Literal(Literal),
    Variable(VariableLiteral),
    Unary(UnaryTerm),
    Binary(BinaryTerm),
    Ternary(TernaryTerm),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Null,
    Boolean(bool),
    Numeric(NumericLiteral),
    /// Hex literal as written, e.g. `0x0F`.
    Hex(String),
    String(String),
}

#[derive(Debug, Clone, Copy)]
pub enum NumericLiteral {
    Integer(i64),
    Float(f64),
}

impl PartialEq for NumericLiteral {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (NumericLiteral::Integer(a), NumericLiteral::Integer(b)) => a == b,
            (NumericLiteral::Float(a), NumericLiteral::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for NumericLiteral {}

impl Hash for NumericLiteral {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            NumericLiteral::Integer(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            NumericLiteral::Float(v) => {
                1u8.hash(state);
                v.to_bits().hash(state);
            }
        }
    }
}

/// Floats print in plain decimal notation (never an exponent) with at least one
/// fractional digit, e.g. `2.0`, `0.001`, `1000000000000000000000.0`. Non-finite
/// values print as `NaN`, `Infinity` and `-Infinity`.
impl fmt::Display for NumericLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NumericLiteral::Integer(v) => write!(f, "{}", v),
            NumericLiteral::Float(v) if v.is_nan() => f.write_str("NaN"),
            NumericLiteral::Float(v) if v.is_infinite() => {
                f.write_str(if v > 0.0 { "Infinity" } else { "-Infinity" })
            }
            NumericLiteral::Float(v) if v.fract() == 0.0 => write!(f, "{}.0", v),
            NumericLiteral::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Reference to a field, argument or helper, optionally indexed, called and chained.
///
/// `a.b[2]` is `a` with child `b` indexed by 2; `COUNT(items)` is `COUNT` with one
/// argument. The type reference is bound after construction by a semantic pass and
/// does not take part in equality.
#[derive(Debug, Clone)]
pub struct VariableLiteral {
    name: String,
    type_reference: OnceCell<TypeReference>,
    args: Option<Vec<Term>>,
    index: Option<u32>,
    child: Option<Box<VariableLiteral>>,
}

impl VariableLiteral {
    pub fn new(name: impl Into<String>) -> Self {
        VariableLiteral {
            name: name.into(),
            type_reference: OnceCell::new(),
            args: None,
            index: None,
            child: None,
        }
    }

    pub fn with_args(mut self, args: Vec<Term>) -> Self {
        self.args = Some(args);
        self
    }

    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// Append `child` as the next path segment.
    pub fn with_child(mut self, child: VariableLiteral) -> Result<Self, TermError> {
        if 1 + child.depth() > MAX_VARIABLE_DEPTH {
            return Err(TermError::TooDeep {
                name: self.name,
                max: MAX_VARIABLE_DEPTH,
            });
        }
        self.child = Some(Box::new(child));
        Ok(self)
    }

    /// Build `a.b.c` from plain segment names.
    pub fn path<I, S>(segments: I) -> Result<Self, TermError>
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: DoubleEndedIterator,
        S: Into<String>,
    {
        let mut chain: Option<VariableLiteral> = None;
        for name in segments.into_iter().rev() {
            let segment = VariableLiteral::new(name);
            chain = Some(match chain {
                Some(child) => segment.with_child(child)?,
                None => segment,
            });
        }
        chain.ok_or(TermError::EmptyPath)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> Option<&[Term]> {
        self.args.as_deref()
    }

    pub fn index(&self) -> Option<u32> {
        self.index
    }

    pub fn child(&self) -> Option<&VariableLiteral> {
        self.child.as_deref()
    }

    /// Number of segments in the chain, this one included.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The chain flattened from this segment to the innermost child.
    pub fn segments(&self) -> impl Iterator<Item = &VariableLiteral> {
        std::iter::successors(Some(self), |v| v.child())
    }

    pub fn type_reference(&self) -> Option<&TypeReference> {
        self.type_reference.get()
    }

    pub fn bind_type_reference(&self, type_reference: TypeReference) -> Result<(), TermError> {
        self.type_reference
            .set(type_reference)
            .map_err(|_| TermError::TypeAlreadyBound {
                name: self.name.clone(),
            })
    }

    fn contains(&self, name: &str) -> bool {
        self.segments().any(|v| {
            v.name == name || v.args().is_some_and(|args| args.iter().any(|a| a.contains(name)))
        })
    }

    fn render(&self, out: &mut String, parenthesize: bool) {
        for (i, segment) in self.segments().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(&segment.name);
            if let Some(args) = segment.args() {
                out.push('(');
                for (j, arg) in args.iter().enumerate() {
                    if j > 0 {
                        out.push(',');
                    }
                    arg.render(out, parenthesize);
                }
                out.push(')');
            }
            if let Some(index) = segment.index {
                out.push('[');
                out.push_str(&index.to_string());
                out.push(']');
            }
        }
    }
}

impl PartialEq for VariableLiteral {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.args == other.args
            && self.index == other.index
            && self.child == other.child
    }
}

impl Eq for VariableLiteral {}

impl Hash for VariableLiteral {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for segment in self.segments() {
            segment.name.hash(state);
            segment.args.hash(state);
            segment.index.hash(state);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnaryTerm {
    pub operand: Box<Term>,
    pub op: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryTerm {
    pub left: Box<Term>,
    pub right: Box<Term>,
    pub op: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TernaryTerm {
    pub condition: Box<Term>,
    pub then: Box<Term>,
    pub otherwise: Box<Term>,
    pub op: String,
}

impl Term {
    pub fn null() -> Self {
        Term::Literal(Literal::Null)
    }

    pub fn boolean(value: bool) -> Self {
        Term::Literal(Literal::Boolean(value))
    }

    pub fn integer(value: i64) -> Self {
        Term::Literal(Literal::Numeric(NumericLiteral::Integer(value)))
    }

    pub fn float(value: f64) -> Self {
        Term::Literal(Literal::Numeric(NumericLiteral::Float(value)))
    }

    pub fn hex(text: impl Into<String>) -> Self {
        Term::Literal(Literal::Hex(text.into()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Term::Literal(Literal::String(value.into()))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Term::Variable(VariableLiteral::new(name))
    }

    pub fn unary(operand: Term, op: impl Into<String>) -> Self {
        Term::Unary(UnaryTerm {
            operand: Box::new(operand),
            op: op.into(),
        })
    }

    /// `(operand)` as written by the author.
    pub fn group(operand: Term) -> Self {
        Term::unary(operand, GROUP_OP)
    }

    pub fn binary(left: Term, right: Term, op: impl Into<String>) -> Self {
        Term::Binary(BinaryTerm {
            left: Box::new(left),
            right: Box::new(right),
            op: op.into(),
        })
    }

    pub fn ternary(condition: Term, then: Term, otherwise: Term) -> Self {
        Term::Ternary(TernaryTerm {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
            op: IF_OP.to_string(),
        })
    }

    /// Canonical surface syntax.
    pub fn string_representation(&self) -> String {
        let mut out = String::new();
        self.render(&mut out, false);
        out
    }

    /// Surface syntax with every binary term wrapped in parentheses.
    pub fn parenthesized_representation(&self) -> String {
        let mut out = String::new();
        self.render(&mut out, true);
        out
    }

    /// Whether a variable segment named `name` occurs anywhere in the term.
    pub fn contains(&self, name: &str) -> bool {
        match self {
            Term::Literal(_) => false,
            Term::Variable(v) => v.contains(name),
            Term::Unary(u) => u.operand.contains(name),
            Term::Binary(b) => b.left.contains(name) || b.right.contains(name),
            Term::Ternary(t) => {
                t.condition.contains(name) || t.then.contains(name) || t.otherwise.contains(name)
            }
        }
    }

    pub fn as_variable(&self) -> Option<&VariableLiteral> {
        match self {
            Term::Variable(v) => Some(v),
            _ => None,
        }
    }

    fn render(&self, out: &mut String, parenthesize: bool) {
        match self {
            Term::Literal(Literal::Null) => out.push_str("null"),
            Term::Literal(Literal::Boolean(b)) => out.push_str(if *b { "true" } else { "false" }),
            Term::Literal(Literal::Numeric(n)) => out.push_str(&n.to_string()),
            Term::Literal(Literal::Hex(text)) => out.push_str(text),
            Term::Literal(Literal::String(value)) => {
                out.push('"');
                out.push_str(value);
                out.push('"');
            }
            Term::Variable(v) => v.render(out, parenthesize),
            Term::Unary(u) if u.op == GROUP_OP => {
                out.push('(');
                u.operand.render(out, parenthesize);
                out.push(')');
            }
            Term::Unary(u) => {
                out.push_str(&u.op);
                u.operand.render(out, parenthesize);
            }
            Term::Binary(b) => {
                if parenthesize {
                    out.push('(');
                }
                b.left.render(out, parenthesize);
                out.push_str(&b.op);
                b.right.render(out, parenthesize);
                if parenthesize {
                    out.push(')');
                }
            }
            Term::Ternary(t) => {
                out.push('(');
                t.condition.render(out, parenthesize);
                out.push_str(")?(");
                t.then.render(out, parenthesize);
                out.push_str("):(");
                t.otherwise.render(out, parenthesize);
                out.push(')');
            }
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string_representation())
    }
}

impl From<VariableLiteral> for Term {
    fn from(v: VariableLiteral) -> Self {
        Term::Variable(v)
    }
}

impl From<Literal> for Term {
    fn from(l: Literal) -> Self {
        Term::Literal(l)
    }
}
