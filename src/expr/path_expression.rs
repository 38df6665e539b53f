use super::PathPattern;
use super::parser::parse_expression;
use crate::Result;
use crate::path::{ObjectPath, is_property_name};
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use ohno::bail;
use std::sync::Arc;

/// Binary set operators, in order of increasing binding strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOperator {
    /// `+`
    Union,

    /// `-`
    Difference,

    /// `&`
    Intersection,

    /// Whitespace between two terms.
    ImpliedUnion,
}

impl SetOperator {
    const fn precedence(self) -> u8 {
        match self {
            Self::Union => 1,
            Self::Difference => 2,
            Self::Intersection => 3,
            Self::ImpliedUnion => 4,
        }
    }

    const fn symbol(self) -> &'static str {
        match self {
            Self::Union => " + ",
            Self::Difference => " - ",
            Self::Intersection => " & ",
            Self::ImpliedUnion => " ",
        }
    }
}

const COMPLEMENT_PRECEDENCE: u8 = 5;
const TERM_PRECEDENCE: u8 = 6;

/// A reference to another collection's membership, `%/Owner:name` or `%:name`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExpressionReference {
    owner: ObjectPath,
    name: Arc<str>,
}

impl ExpressionReference {
    /// Parses reference text, including the leading `%`.
    ///
    /// # Errors
    ///
    /// Returns an error if the owner is not a container path or the name is invalid.
    pub fn parse(text: &str) -> Result<Self> {
        let Some(body) = text.strip_prefix('%') else {
            bail!("collection reference '{text}' must start with '%'");
        };

        let Some((owner, name)) = body.split_once(':') else {
            bail!("collection reference '{text}' has no collection name");
        };

        let owner = if owner.is_empty() { ObjectPath::parse(".")? } else { ObjectPath::parse(owner)? };
        if owner.is_property() {
            bail!("collection reference '{text}' must name a container");
        }

        if !is_property_name(name) {
            bail!("invalid collection name '{name}' in reference '{text}'");
        }

        Ok(Self {
            owner,
            name: Arc::from(name),
        })
    }

    /// The owning container; relative until the expression is anchored.
    #[must_use]
    pub const fn owner(&self) -> &ObjectPath {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn make_absolute(&self, anchor: &ObjectPath) -> Result<Self> {
        Ok(Self {
            owner: self.owner.make_absolute(anchor)?,
            name: Arc::clone(&self.name),
        })
    }
}

impl Display for ExpressionReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        if self.owner.as_str() == "." {
            write!(f, "%:{}", self.name)
        } else {
            write!(f, "%{}:{}", self.owner, self.name)
        }
    }
}

/// A set-algebraic expression over path patterns and collection references.
///
/// Equality and hashing are structural: `/A /B` and `/B /A` are different
/// expressions even though they match the same paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum PathExpression {
    /// Matches nothing.
    #[default]
    Nothing,
    Pattern(PathPattern),
    Reference(ExpressionReference),
    Complement(Box<Self>),
    Binary {
        op: SetOperator,
        lhs: Box<Self>,
        rhs: Box<Self>,
    },
}

impl PathExpression {
    /// Parses expression text. Empty or blank text yields [`PathExpression::Nothing`].
    ///
    /// # Errors
    ///
    /// Returns an error describing the first syntax problem.
    pub fn parse(text: &str) -> Result<Self> {
        parse_expression(text)
    }

    /// Joins two expressions as written, without simplification.
    #[must_use]
    pub fn binary(op: SetOperator, lhs: Self, rhs: Self) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Joins two expressions, folding away empty operands.
    #[must_use]
    pub fn combine(op: SetOperator, lhs: Self, rhs: Self) -> Self {
        match (op, lhs, rhs) {
            (SetOperator::Union | SetOperator::ImpliedUnion, Self::Nothing, other)
            | (SetOperator::Union | SetOperator::ImpliedUnion | SetOperator::Difference, other, Self::Nothing) => other,
            (SetOperator::Difference | SetOperator::Intersection, Self::Nothing, _) | (SetOperator::Intersection, _, Self::Nothing) => {
                Self::Nothing
            }
            (op, lhs, rhs) => Self::binary(op, lhs, rhs),
        }
    }

    #[must_use]
    pub fn complement(operand: Self) -> Self {
        Self::Complement(Box::new(operand))
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Nothing)
    }

    #[must_use]
    pub fn contains_references(&self) -> bool {
        match self {
            Self::Nothing | Self::Pattern(_) => false,
            Self::Reference(_) => true,
            Self::Complement(operand) => operand.contains_references(),
            Self::Binary { lhs, rhs, .. } => lhs.contains_references() || rhs.contains_references(),
        }
    }

    /// Anchors every relative pattern and reference at `anchor`.
    ///
    /// # Errors
    ///
    /// Returns an error if a relative term cannot be anchored there.
    pub fn make_absolute(&self, anchor: &ObjectPath) -> Result<Self> {
        Ok(match self {
            Self::Nothing => Self::Nothing,
            Self::Pattern(pattern) => Self::Pattern(pattern.make_absolute(anchor)?),
            Self::Reference(reference) => Self::Reference(reference.make_absolute(anchor)?),
            Self::Complement(operand) => Self::complement(operand.make_absolute(anchor)?),
            Self::Binary { op, lhs, rhs } => Self::binary(*op, lhs.make_absolute(anchor)?, rhs.make_absolute(anchor)?),
        })
    }

    const fn precedence(&self) -> u8 {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::Complement(_) => COMPLEMENT_PRECEDENCE,
            Self::Nothing | Self::Pattern(_) | Self::Reference(_) => TERM_PRECEDENCE,
        }
    }

    fn fmt_operand(&self, f: &mut Formatter<'_>, parenthesize: bool) -> core::fmt::Result {
        if self.is_empty() {
            f.write_str("()")
        } else if parenthesize {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl Display for PathExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Nothing => Ok(()),
            Self::Pattern(pattern) => Display::fmt(pattern, f),
            Self::Reference(reference) => Display::fmt(reference, f),
            Self::Complement(operand) => {
                f.write_str("~")?;
                operand.fmt_operand(f, operand.precedence() < COMPLEMENT_PRECEDENCE)
            }
            Self::Binary { op, lhs, rhs } => {
                // operators associate to the left
                lhs.fmt_operand(f, lhs.precedence() < op.precedence())?;
                f.write_str(op.symbol())?;
                rhs.fmt_operand(f, rhs.precedence() <= op.precedence())
            }
        }
    }
}

impl FromStr for PathExpression {
    type Err = ohno::AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
