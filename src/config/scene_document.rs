use crate::Result;
use crate::collection::{CollectionId, CollectionSpec, ExpansionRule};
use crate::graph::Stage;
use crate::path::ObjectPath;
use camino::Utf8Path;
use ohno::{IntoAppError, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;

const LOG_TARGET: &str = "     scene";

/// A TOML description of an object graph and the collections authored on it.
///
/// ```toml
/// [[object]]
/// path = "/World/Geom/Box"
/// type_name = "Cube"
/// properties = ["size"]
///
/// [[collection]]
/// owner = "/World"
/// name = "geom"
/// expansion_rule = "expandContainersAndProperties"
/// includes = ["/World/Geom"]
/// ```
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDocument {
    #[serde(default, rename = "object")]
    pub objects: Vec<ObjectDecl>,

    #[serde(default, rename = "collection")]
    pub collections: Vec<CollectionDecl>,
}

/// One container, together with its properties. Missing ancestors are created implicitly.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectDecl {
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default)]
    pub properties: Vec<String>,

    #[serde(default)]
    pub instance_proxy: bool,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionDecl {
    pub owner: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expansion_rule: Option<ExpansionRule>,

    #[serde(default)]
    pub include_root: bool,

    #[serde(default)]
    pub includes: Vec<String>,

    #[serde(default)]
    pub excludes: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_expression: Option<String>,
}

impl SceneDocument {
    /// Reads a scene document from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid scene document.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let text = fs::read_to_string(path).into_app_err_with(|| format!("reading scene document from {path}"))?;
        let document: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing scene document from {path}"))?;

        log::debug!(
            target: LOG_TARGET,
            "Loaded {} object(s) and {} collection(s) from {path}",
            document.objects.len(),
            document.collections.len()
        );

        Ok(document)
    }

    /// # Errors
    ///
    /// Returns an error if the text is not a valid scene document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).into_app_err("parsing scene document")
    }

    /// Writes this document as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized or the file cannot be written.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        let text = toml::to_string(self).into_app_err_with(|| format!("serializing scene document for saving to {path}"))?;
        fs::write(path, text).into_app_err_with(|| format!("writing scene document to {path}"))?;
        Ok(())
    }

    /// Builds the in-memory stage described by this document.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed paths or names, collections on undeclared
    /// owners, and collections declared more than once.
    pub fn into_stage(self) -> Result<Stage> {
        let mut stage = Stage::new();

        for object in self.objects {
            let path = parse_absolute(&object.path, "object path")?;
            stage.define_container(&path)?;

            if let Some(type_name) = &object.type_name {
                stage.set_type_name(&path, type_name)?;
            }

            if let Some(kind) = &object.kind {
                stage.set_model_kind(&path, kind)?;
            }

            if object.instance_proxy {
                stage.set_instance_proxy(&path, true)?;
            }

            for property in &object.properties {
                let _ = stage.add_property(&path, property)?;
            }
        }

        let mut seen = HashSet::new();
        for decl in self.collections {
            let id = CollectionId::new(parse_absolute(&decl.owner, "collection owner")?, &decl.name)?;
            if !seen.insert(id.clone()) {
                bail!("collection '{id}' is declared more than once");
            }

            let mut spec = CollectionSpec::new(id);
            spec.expansion_rule = decl.expansion_rule;
            spec.include_root = decl.include_root;
            spec.includes = parse_targets(&decl.includes)?;
            spec.excludes = parse_targets(&decl.excludes)?;
            spec.membership_expression = decl.membership_expression;

            let _ = stage.set_collection(spec)?;
        }

        Ok(stage)
    }
}

fn parse_absolute(text: &str, what: &str) -> Result<ObjectPath> {
    let path = ObjectPath::parse(text)?;
    if !path.is_absolute() {
        bail!("{what} '{text}' must be absolute");
    }
    Ok(path)
}

fn parse_targets(targets: &[String]) -> Result<Vec<ObjectPath>> {
    targets.iter().map(|target| parse_absolute(target, "collection target")).collect()
}
