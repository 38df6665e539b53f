use super::PredicateCall;
use crate::Result;
use crate::graph::ObjectGraph;
use crate::path::{ObjectPath, is_identifier, is_property_name};
use core::fmt::{Display, Formatter};
use core::hash::{Hash, Hasher};
use ohno::{IntoAppError, bail};
use regex::Regex;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum GlobKind {
    Literal,
    Any,
    Regex(Regex),
}

/// A shell-style name glob (`*`, `?`, `[...]`). Globs compare by their text.
#[derive(Debug, Clone)]
struct Glob {
    text: Arc<str>,
    kind: GlobKind,
}

impl Glob {
    fn literal(name: &str) -> Self {
        Self {
            text: Arc::from(name),
            kind: GlobKind::Literal,
        }
    }

    fn any() -> Self {
        Self {
            text: Arc::from("*"),
            kind: GlobKind::Any,
        }
    }

    fn parse(text: &str, namespaced: bool) -> Result<Self> {
        if text == "*" {
            return Ok(Self::any());
        }

        if !text.contains(['*', '?', '[']) {
            let valid = if namespaced { is_property_name(text) } else { is_identifier(text) };
            if !valid {
                bail!("invalid name '{text}' in pattern");
            }

            return Ok(Self::literal(text));
        }

        let regex = Regex::new(&glob_to_regex(text, namespaced)?).into_app_err_with(|| format!("invalid glob '{text}'"))?;
        Ok(Self {
            text: Arc::from(text),
            kind: GlobKind::Regex(regex),
        })
    }

    fn is_match(&self, name: &str) -> bool {
        match &self.kind {
            GlobKind::Literal => *self.text == *name,
            GlobKind::Any => true,
            GlobKind::Regex(regex) => regex.is_match(name),
        }
    }
}

impl PartialEq for Glob {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Glob {}

impl Hash for Glob {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

fn glob_to_regex(text: &str, namespaced: bool) -> Result<String> {
    let name_char = |c: char| c.is_ascii_alphanumeric() || c == '_' || (namespaced && c == ':');

    let mut pattern = String::from("^");
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            '[' => {
                pattern.push('[');
                if chars.next_if(|&c| c == '!' || c == '^').is_some() {
                    pattern.push('^');
                }

                let mut members = 0;
                loop {
                    match chars.next() {
                        Some(']') if members > 0 => break,
                        Some(member) if name_char(member) || member == '-' => {
                            pattern.push(member);
                            members += 1;
                        }
                        _ => bail!("malformed character class in '{text}'"),
                    }
                }

                pattern.push(']');
            }
            c if name_char(c) => pattern.push(c),
            other => bail!("invalid character '{other}' in pattern '{text}'"),
        }
    }

    pattern.push('$');
    Ok(pattern)
}

/// Matches one path element by name glob and an optional predicate on the object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ElementMatcher {
    glob: Glob,
    predicate: Option<PredicateCall>,
}

impl ElementMatcher {
    fn parse(text: &str, namespaced: bool) -> Result<Self> {
        let (glob_text, predicate) = match text.split_once('{') {
            Some((glob_text, rest)) => {
                let Some(call) = rest.strip_suffix('}') else {
                    bail!("unterminated predicate in '{text}'");
                };
                (glob_text, Some(PredicateCall::parse(call)?))
            }
            None => (text, None),
        };

        let glob = if glob_text.is_empty() {
            if predicate.is_none() {
                bail!("empty element in pattern");
            }
            Glob {
                text: Arc::from(""),
                kind: GlobKind::Any,
            }
        } else {
            Glob::parse(glob_text, namespaced)?
        };

        Ok(Self { glob, predicate })
    }

    fn literal(name: &str) -> Self {
        Self {
            glob: Glob::literal(name),
            predicate: None,
        }
    }

    fn accepts(&self, name: &str, path: impl FnOnce() -> Option<ObjectPath>, graph: &dyn ObjectGraph) -> bool {
        if !self.glob.is_match(name) {
            return false;
        }

        self.predicate.as_ref().is_none_or(|call| {
            let object = path().and_then(|path| graph.object(&path));
            call.evaluate(object.as_ref())
        })
    }
}

impl Display for ElementMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.glob.text)?;
        if let Some(call) = &self.predicate {
            write!(f, "{{{call}}}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    /// `//`: zero or more container levels.
    Stretch,
    Element(ElementMatcher),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Anchor {
    Absolute,
    Relative { up: usize },
}

/// A single path-matching term such as `/World//Box*`, `Geom//{kind}` or `//.visibility`.
///
/// A pattern without a property part only matches containers; one with a
/// property part only matches properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    anchor: Anchor,
    segments: Vec<Segment>,
    property: Option<ElementMatcher>,
}

impl PathPattern {
    /// # Errors
    ///
    /// Returns an error if the text is not a well-formed pattern.
    pub fn parse(text: &str) -> Result<Self> {
        if text.is_empty() {
            bail!("empty pattern");
        }

        let (anchor, mut rest) = parse_anchor(text);
        let mut pattern = Self {
            anchor,
            segments: Vec::new(),
            property: None,
        };

        if let Some(after) = rest.strip_prefix('/') {
            pattern.segments.push(Segment::Stretch);
            rest = after;
        }

        while !rest.is_empty() {
            if pattern.property.is_some() {
                bail!("property part must end the pattern '{text}'");
            }

            let end = element_end(rest);
            pattern.push_element(&rest[..end], text)?;
            rest = &rest[end..];

            if let Some(after) = rest.strip_prefix("//") {
                pattern.segments.push(Segment::Stretch);
                rest = after;
            } else if let Some(after) = rest.strip_prefix('/') {
                if after.is_empty() {
                    bail!("trailing '/' in pattern '{text}'");
                }
                rest = after;
            }
        }

        Ok(pattern)
    }

    fn push_element(&mut self, element: &str, text: &str) -> Result<()> {
        if element.is_empty() {
            bail!("empty element in pattern '{text}'");
        }

        let (container, property) = match split_property(element) {
            Some((container, property)) => (container, Some(property)),
            None => (element, None),
        };

        if !container.is_empty() {
            self.segments.push(Segment::Element(ElementMatcher::parse(container, false)?));
        } else if !matches!(self.segments.last(), Some(Segment::Stretch)) {
            bail!("a bare property part must follow '//' in pattern '{text}'");
        }

        if let Some(property) = property {
            if property.is_empty() {
                bail!("empty property name in pattern '{text}'");
            }
            self.property = Some(ElementMatcher::parse(property, true)?);
        }

        Ok(())
    }

    /// Matches exactly `path`.
    #[must_use]
    pub fn exact(path: &ObjectPath) -> Self {
        Self {
            anchor: Anchor::Absolute,
            segments: literal_segments(path),
            property: path.property_name().map(ElementMatcher::literal),
        }
    }

    /// Matches the container `path` and every container beneath it (`path//`).
    #[must_use]
    pub fn subtree_containers(path: &ObjectPath) -> Self {
        let mut segments = literal_segments(path);
        segments.push(Segment::Stretch);
        Self {
            anchor: Anchor::Absolute,
            segments,
            property: None,
        }
    }

    /// Matches every property of `path` and of the containers beneath it (`path//.*`).
    #[must_use]
    pub fn subtree_properties(path: &ObjectPath) -> Self {
        let mut segments = literal_segments(path);
        segments.push(Segment::Stretch);
        Self {
            anchor: Anchor::Absolute,
            segments,
            property: Some(ElementMatcher {
                glob: Glob::any(),
                predicate: None,
            }),
        }
    }

    #[must_use]
    pub const fn is_absolute(&self) -> bool {
        matches!(self.anchor, Anchor::Absolute)
    }

    /// Anchors a relative pattern at `anchor`; absolute patterns are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if `anchor` is not an absolute container path or the
    /// pattern climbs above the root.
    pub fn make_absolute(&self, anchor: &ObjectPath) -> Result<Self> {
        let Anchor::Relative { up } = self.anchor else {
            return Ok(self.clone());
        };

        if !anchor.is_absolute() || anchor.is_property() {
            bail!("cannot anchor pattern '{self}' at '{anchor}': anchor must be an absolute container path");
        }

        let mut names: Vec<&str> = anchor.container_names().collect();
        for _ in 0..up {
            if names.pop().is_none() {
                bail!("pattern '{self}' climbs above the root when anchored at '{anchor}'");
            }
        }

        let mut segments: Vec<Segment> = names.into_iter().map(|name| Segment::Element(ElementMatcher::literal(name))).collect();
        segments.extend(self.segments.iter().cloned());

        Ok(Self {
            anchor: Anchor::Absolute,
            segments,
            property: self.property.clone(),
        })
    }

    /// Whether `path` matches. Relative patterns and relative paths never match.
    #[must_use]
    pub fn matches(&self, path: &ObjectPath, graph: &dyn ObjectGraph) -> bool {
        if !self.is_absolute() || !path.is_absolute() {
            return false;
        }

        let names: Vec<&str> = path.container_names().collect();
        match (&self.property, path.property_name()) {
            (None, None) => self.match_segments(0, &names, 0, graph),
            (Some(matcher), Some(name)) => {
                matcher.accepts(name, || Some(path.clone()), graph) && self.match_segments(0, &names, 0, graph)
            }
            _ => false,
        }
    }

    fn match_segments(&self, segment_index: usize, names: &[&str], name_index: usize, graph: &dyn ObjectGraph) -> bool {
        let Some(segment) = self.segments.get(segment_index) else {
            return name_index == names.len();
        };

        match segment {
            Segment::Stretch => (name_index..=names.len()).any(|next| self.match_segments(segment_index + 1, names, next, graph)),
            Segment::Element(matcher) => names.get(name_index).is_some_and(|name| {
                matcher.accepts(name, || container_path(&names[..=name_index]), graph)
                    && self.match_segments(segment_index + 1, names, name_index + 1, graph)
            }),
        }
    }
}

impl Display for PathPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut out = match self.anchor {
            Anchor::Absolute => String::from("/"),
            Anchor::Relative { up } => vec![".."; up].join("/"),
        };

        for segment in &self.segments {
            match segment {
                Segment::Stretch if out.is_empty() => out.push_str(".//"),
                Segment::Stretch if out.ends_with('/') => out.push('/'),
                Segment::Stretch => out.push_str("//"),
                Segment::Element(matcher) => {
                    if !out.is_empty() && !out.ends_with('/') {
                        out.push('/');
                    }
                    out.push_str(&matcher.to_string());
                }
            }
        }

        if let Some(property) = &self.property {
            out.push('.');
            out.push_str(&property.to_string());
        }

        if out.is_empty() {
            out.push('.');
        }

        f.write_str(&out)
    }
}

/// Splits the relative prefix (`.`, `./`, `../`) or the absolute root off pattern text.
fn parse_anchor(text: &str) -> (Anchor, &str) {
    if let Some(rest) = text.strip_prefix('/') {
        return (Anchor::Absolute, rest);
    }

    let mut up = 0;
    let mut rest = text;
    loop {
        if rest == ".." {
            up += 1;
            rest = "";
        } else if let Some(after) = rest.strip_prefix("../") {
            up += 1;
            rest = after;
            continue;
        }
        break;
    }

    if rest == "." {
        rest = "";
    } else if let Some(after) = rest.strip_prefix("./") {
        rest = after;
    }

    (Anchor::Relative { up }, rest)
}

/// Index of the first `/` outside of `[...]` and `{...}`.
fn element_end(text: &str) -> usize {
    let mut depth = 0_usize;
    for (index, c) in text.char_indices() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            '/' if depth == 0 => return index,
            _ => {}
        }
    }
    text.len()
}

/// Splits `name.prop` at the first `.` outside of `[...]` and `{...}`.
fn split_property(element: &str) -> Option<(&str, &str)> {
    let mut depth = 0_usize;
    for (index, c) in element.char_indices() {
        match c {
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => return Some((&element[..index], &element[index + 1..])),
            _ => {}
        }
    }
    None
}

fn literal_segments(path: &ObjectPath) -> Vec<Segment> {
    path.container_names().map(|name| Segment::Element(ElementMatcher::literal(name))).collect()
}

fn container_path(names: &[&str]) -> Option<ObjectPath> {
    ObjectPath::parse(&format!("/{}", names.join("/"))).ok()
}
