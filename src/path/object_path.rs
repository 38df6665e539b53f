use crate::Result;
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use ohno::bail;
use std::sync::Arc;

const ROOT: &str = "/";

/// A hierarchical identifier of an object in the graph.
///
/// Absolute paths start at the root (`/`, `/A/B`, `/A/B.prop`). Relative paths
/// (`A/B`, `.`, `../A.prop`) only appear inside expressions and are anchored
/// with [`ObjectPath::make_absolute`] before they are used for lookups.
///
/// Paths order and hash by their canonical text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectPath {
    text: Arc<str>,
}

/// Decomposed view of a validated path.
struct Parts<'a> {
    absolute: bool,
    up: usize,
    names: Vec<&'a str>,
    property: Option<&'a str>,
}

impl<'a> Parts<'a> {
    fn parse(text: &'a str) -> Result<Self> {
        if text.is_empty() {
            bail!("empty path");
        }

        let absolute = text.starts_with('/');
        let body = if absolute { &text[1..] } else { text };

        let (prim_part, property) = match body.split_once('.') {
            // leading dots belong to `.` / `..` components, not to a property
            Some((prim, prop)) if !prim.is_empty() && !prim.ends_with('/') => (prim, Some(prop)),
            _ => split_relative_property(body),
        };

        let mut parts = Self {
            absolute,
            up: 0,
            names: Vec::new(),
            property,
        };

        if !prim_part.is_empty() {
            for element in prim_part.split('/') {
                match element {
                    "." if !absolute && parts.up == 0 && parts.names.is_empty() => {}
                    ".." if !absolute && parts.names.is_empty() => parts.up += 1,
                    _ if is_identifier(element) => parts.names.push(element),
                    _ => bail!("invalid path element '{element}' in path '{text}'"),
                }
            }
        } else if !absolute && property.is_none() {
            bail!("invalid path '{text}'");
        }

        if let Some(prop) = property {
            if !is_property_name(prop) {
                bail!("invalid property name '{prop}' in path '{text}'");
            }

            if parts.names.is_empty() {
                bail!("property '{prop}' must belong to a named container in path '{text}'");
            }
        }

        Ok(parts)
    }

    fn render(&self) -> String {
        let mut text = String::new();
        if self.absolute {
            text.push('/');
            text.push_str(&self.names.join("/"));
        } else {
            let mut elements: Vec<&str> = core::iter::repeat_n("..", self.up).collect();
            elements.extend(self.names.iter().copied());
            if elements.is_empty() {
                text.push('.');
            } else {
                text.push_str(&elements.join("/"));
            }
        }

        if let Some(prop) = self.property {
            text.push('.');
            text.push_str(prop);
        }

        text
    }
}

/// Splits `../A.prop`-style text where the first `.` belongs to a relative component.
fn split_relative_property(body: &str) -> (&str, Option<&str>) {
    let last_element_start = body.rfind('/').map_or(0, |i| i + 1);
    let last = &body[last_element_start..];
    if last == "." || last == ".." {
        return (body, None);
    }

    match last.split_once('.') {
        Some((name, prop)) if !name.is_empty() => (&body[..last_element_start + name.len()], Some(prop)),
        _ => (body, None),
    }
}

pub(crate) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn is_property_name(text: &str) -> bool {
    text.split(':').all(is_identifier)
}

impl ObjectPath {
    /// Parses and canonicalizes path text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is empty or contains an invalid element.
    pub fn parse(text: &str) -> Result<Self> {
        let parts = Parts::parse(text)?;
        Ok(Self {
            text: Arc::from(parts.render()),
        })
    }

    /// The root of the graph.
    #[must_use]
    pub fn root() -> Self {
        Self { text: Arc::from(ROOT) }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_absolute(&self) -> bool {
        self.text.starts_with('/')
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        &*self.text == ROOT
    }

    /// Whether this path addresses a leaf property rather than a container.
    #[must_use]
    pub fn is_property(&self) -> bool {
        self.property_name().is_some()
    }

    #[must_use]
    pub fn property_name(&self) -> Option<&str> {
        let last_element_start = self.text.rfind('/').map_or(0, |i| i + 1);
        let last = &self.text[last_element_start..];
        if last == "." || last == ".." {
            return None;
        }

        last.split_once('.').and_then(|(name, prop)| (!name.is_empty()).then_some(prop))
    }

    /// The final element: a property name, a container name, or `""` for the root.
    #[must_use]
    pub fn name(&self) -> &str {
        if let Some(prop) = self.property_name() {
            return prop;
        }

        self.text.rsplit('/').next().unwrap_or_default()
    }

    /// Container element names of an absolute path, root first.
    pub fn container_names(&self) -> impl Iterator<Item = &str> {
        let prim = self.property_name().map_or(&*self.text, |prop| &self.text[..self.text.len() - prop.len() - 1]);
        prim.split('/').filter(|e| !e.is_empty() && *e != "." && *e != "..")
    }

    /// Number of elements below the root, counting a property as one more element.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.container_names().count() + usize::from(self.is_property())
    }

    /// The container owning this path: the path itself for containers, the owner for properties.
    #[must_use]
    pub fn prim_path(&self) -> Self {
        self.property_name().map_or_else(
            || self.clone(),
            |prop| Self {
                text: Arc::from(&self.text[..self.text.len() - prop.len() - 1]),
            },
        )
    }

    /// The parent of an absolute path, or `None` for the root and for relative paths.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if !self.is_absolute() || self.is_root() {
            return None;
        }

        if self.is_property() {
            return Some(self.prim_path());
        }

        let cut = self.text.rfind('/').unwrap_or_default();
        if cut == 0 {
            Some(Self::root())
        } else {
            Some(Self {
                text: Arc::from(&self.text[..cut]),
            })
        }
    }

    /// This path followed by each of its ancestors up to and including the root.
    pub fn ancestors_inclusive(&self) -> impl Iterator<Item = Self> {
        core::iter::successors(Some(self.clone()), Self::parent)
    }

    /// Whether `prefix` is this path or one of its ancestors. Both paths must be absolute.
    #[must_use]
    pub fn has_prefix(&self, prefix: &Self) -> bool {
        if prefix.is_root() {
            return self.is_absolute();
        }

        if prefix.is_property() {
            return self == prefix;
        }

        match self.text.strip_prefix(&*prefix.text) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('.'),
            None => false,
        }
    }

    /// Appends a container element.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not an identifier or this path is a property path.
    pub fn append_child(&self, name: &str) -> Result<Self> {
        if self.is_property() {
            bail!("cannot append child '{name}' to property path '{self}'");
        }

        if !is_identifier(name) {
            bail!("invalid container name '{name}'");
        }

        let text = if self.is_root() { format!("/{name}") } else { format!("{self}/{name}") };
        Ok(Self { text: Arc::from(text) })
    }

    /// Appends a property element.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is not a valid property name or this path cannot own properties.
    pub fn append_property(&self, name: &str) -> Result<Self> {
        if self.is_property() || self.is_root() {
            bail!("cannot append property '{name}' to path '{self}'");
        }

        if !is_property_name(name) {
            bail!("invalid property name '{name}'");
        }

        Ok(Self {
            text: Arc::from(format!("{self}.{name}")),
        })
    }

    /// Anchors a relative path at `anchor`; absolute paths are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if `anchor` is not an absolute container path or the
    /// relative path climbs above the root.
    pub fn make_absolute(&self, anchor: &Self) -> Result<Self> {
        if self.is_absolute() {
            return Ok(self.clone());
        }

        if !anchor.is_absolute() || anchor.is_property() {
            bail!("cannot anchor '{self}' at '{anchor}': anchor must be an absolute container path");
        }

        let rel = Parts::parse(&self.text)?;
        let mut names: Vec<&str> = anchor.container_names().collect();
        for _ in 0..rel.up {
            if names.pop().is_none() {
                bail!("relative path '{self}' climbs above the root when anchored at '{anchor}'");
            }
        }

        names.extend(rel.names.iter().copied());
        let parts = Parts {
            absolute: true,
            up: 0,
            names,
            property: rel.property,
        };

        Ok(Self {
            text: Arc::from(parts.render()),
        })
    }
}

impl Display for ObjectPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for ObjectPath {
    type Err = ohno::AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
