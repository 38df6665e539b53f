use super::{ExpressionReference, PathExpression, PathPattern, SetOperator};
use crate::Result;
use ohno::bail;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Term(&'a str),
    Open,
    Close,
    Plus,
    Minus,
    Ampersand,
    Tilde,
}

impl Token<'_> {
    const fn starts_operand(self) -> bool {
        matches!(self, Self::Term(_) | Self::Open | Self::Tilde)
    }
}

fn tokenize(text: &str) -> Result<Vec<Token<'_>>> {
    let mut tokens = Vec::new();
    let mut rest = text;

    loop {
        rest = rest.trim_start();
        let Some(c) = rest.chars().next() else {
            break;
        };

        let token = match c {
            '(' => Token::Open,
            ')' => Token::Close,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '&' => Token::Ampersand,
            '~' => Token::Tilde,
            _ => {
                let end = term_end(rest);
                if end == 0 {
                    bail!("unexpected character '{c}' in expression '{text}'");
                }
                tokens.push(Token::Term(&rest[..end]));
                rest = &rest[end..];
                continue;
            }
        };

        tokens.push(token);
        rest = &rest[c.len_utf8()..];
    }

    Ok(tokens)
}

/// Length of the term at the start of `text`; operators inside `[...]` and `{...}` do not end it.
fn term_end(text: &str) -> usize {
    let mut depth = 0_usize;
    for (index, c) in text.char_indices() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            c if depth == 0 && (c.is_whitespace() || "()+-&~".contains(c)) => return index,
            _ => {}
        }
    }
    text.len()
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token<'a>>,
    position: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.position).copied()
    }

    fn advance(&mut self) -> Option<Token<'a>> {
        let token = self.peek();
        self.position += 1;
        token
    }

    fn eat(&mut self, expected: Token<'a>) -> bool {
        if self.peek() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    // union := difference ('+' difference)*
    fn union(&mut self) -> Result<PathExpression> {
        let mut lhs = self.difference()?;
        while self.eat(Token::Plus) {
            lhs = PathExpression::binary(SetOperator::Union, lhs, self.difference()?);
        }
        Ok(lhs)
    }

    // difference := intersection ('-' intersection)*
    fn difference(&mut self) -> Result<PathExpression> {
        let mut lhs = self.intersection()?;
        while self.eat(Token::Minus) {
            lhs = PathExpression::binary(SetOperator::Difference, lhs, self.intersection()?);
        }
        Ok(lhs)
    }

    // intersection := implied ('&' implied)*
    fn intersection(&mut self) -> Result<PathExpression> {
        let mut lhs = self.implied_union()?;
        while self.eat(Token::Ampersand) {
            lhs = PathExpression::binary(SetOperator::Intersection, lhs, self.implied_union()?);
        }
        Ok(lhs)
    }

    // implied := unary unary*
    fn implied_union(&mut self) -> Result<PathExpression> {
        let mut lhs = self.unary()?;
        while self.peek().is_some_and(Token::starts_operand) {
            lhs = PathExpression::binary(SetOperator::ImpliedUnion, lhs, self.unary()?);
        }
        Ok(lhs)
    }

    // unary := '~' unary | primary
    fn unary(&mut self) -> Result<PathExpression> {
        if self.eat(Token::Tilde) {
            return Ok(PathExpression::complement(self.unary()?));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<PathExpression> {
        match self.advance() {
            Some(Token::Open) => {
                if self.eat(Token::Close) {
                    return Ok(PathExpression::Nothing);
                }

                let inner = self.union()?;
                if !self.eat(Token::Close) {
                    bail!("missing ')' in expression '{}'", self.text);
                }
                Ok(inner)
            }
            Some(Token::Term(term)) if term.starts_with('%') => Ok(PathExpression::Reference(ExpressionReference::parse(term)?)),
            Some(Token::Term(term)) => Ok(PathExpression::Pattern(PathPattern::parse(term)?)),
            Some(token) => bail!("unexpected {token:?} in expression '{}'", self.text),
            None => bail!("unexpected end of expression '{}'", self.text),
        }
    }
}

pub(super) fn parse_expression(text: &str) -> Result<PathExpression> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Ok(PathExpression::Nothing);
    }

    let mut parser = Parser {
        text,
        tokens,
        position: 0,
    };

    let expression = parser.union()?;
    if let Some(token) = parser.peek() {
        bail!("unexpected {token:?} in expression '{text}'");
    }

    Ok(expression)
}
