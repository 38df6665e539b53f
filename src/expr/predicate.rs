use crate::Result;
use crate::graph::Object;
use crate::path::is_property_name;
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use ohno::{IntoAppError, bail};
use std::sync::Arc;
use strum::{Display as StrumDisplay, EnumIter, EnumString};

/// The object predicates available inside `{...}` in a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, StrumDisplay, EnumIter, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum ObjectPredicate {
    /// A container with an authored kind, optionally of the given kind or a kind derived from it.
    Kind,

    /// A container whose kind is `model` or derives from it.
    Model,

    /// A container of the given schema type.
    Type,

    Container,
    Property,
    InstanceProxy,
}

impl ObjectPredicate {
    const fn takes_argument(self) -> bool {
        matches!(self, Self::Kind | Self::Type)
    }
}

/// A predicate together with its optional argument, such as `kind:component`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PredicateCall {
    predicate: ObjectPredicate,
    argument: Option<Arc<str>>,
}

impl PredicateCall {
    /// Parses the text between the braces of `{name}` or `{name:arg}`.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown predicates and malformed or unexpected arguments.
    pub fn parse(text: &str) -> Result<Self> {
        let (name, argument) = match text.split_once(':') {
            Some((name, argument)) => (name, Some(argument)),
            None => (text, None),
        };

        let predicate = ObjectPredicate::from_str(name).into_app_err_with(|| format!("unknown predicate '{name}' in '{{{text}}}'"))?;

        if let Some(argument) = argument {
            if !predicate.takes_argument() {
                bail!("predicate '{name}' does not take an argument");
            }

            if !is_property_name(argument) {
                bail!("invalid argument '{argument}' for predicate '{name}'");
            }
        }

        Ok(Self {
            predicate,
            argument: argument.map(Arc::from),
        })
    }

    #[must_use]
    pub const fn predicate(&self) -> ObjectPredicate {
        self.predicate
    }

    #[must_use]
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// Evaluates the predicate; a missing object never satisfies it.
    #[must_use]
    pub fn evaluate(&self, object: Option<&Object>) -> bool {
        let Some(object) = object else {
            return false;
        };

        match self.predicate {
            ObjectPredicate::Kind => object
                .model_kind()
                .is_some_and(|kind| self.argument().is_none_or(|base| kind_is_a(kind, base))),
            ObjectPredicate::Model => object.model_kind().is_some_and(|kind| kind_is_a(kind, "model")),
            ObjectPredicate::Type => object
                .type_name()
                .is_some_and(|type_name| self.argument().is_none_or(|expected| type_name == expected)),
            ObjectPredicate::Container => object.is_container(),
            ObjectPredicate::Property => object.is_property(),
            ObjectPredicate::InstanceProxy => object.is_instance_proxy(),
        }
    }
}

impl Display for PredicateCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match &self.argument {
            Some(argument) => write!(f, "{}:{argument}", self.predicate),
            None => write!(f, "{}", self.predicate),
        }
    }
}

/// The base kind each built-in kind derives from.
fn base_kind(kind: &str) -> Option<&'static str> {
    match kind {
        "component" | "group" => Some("model"),
        "assembly" => Some("group"),
        _ => None,
    }
}

/// Whether `kind` is `base` or derives from it.
fn kind_is_a(kind: &str, base: &str) -> bool {
    let mut current = Some(kind);
    while let Some(candidate) = current {
        if candidate == base {
            return true;
        }

        current = base_kind(candidate);
    }

    false
}
