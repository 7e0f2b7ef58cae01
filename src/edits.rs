//! User overrides applied between extraction and rendering.
//!
//! An edits file is JSON; every field is optional and unknown keys are
//! rejected so typos surface instead of being ignored.

use crate::sketch::{infer_define_type, DefineRole, FactSet, PrimitiveType, VariableRole};
use anyhow::{anyhow, ensure, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

/// Description used when neither the user nor the sketch provides one.
pub const DEFAULT_DESCRIPTION: &str = "Automatically generated block";

static ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("regex for aliases"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockEdits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_input: Option<bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, VariableEdit>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defines: BTreeMap<String, DefineEdit>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<VariableRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// An empty string clears the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefineEdit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<DefineRole>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<PrimitiveType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Check that `alias` is usable as an identifier in generated code.
pub fn validate_alias(alias: &str) -> Result<()> {
    ensure!(!alias.is_empty(), "alias must not be empty");
    ensure!(
        ALIAS.is_match(alias),
        "invalid alias `{alias}`: use letters, digits and underscores, not starting with a digit"
    );
    Ok(())
}

impl BlockEdits {
    /// Load an edits file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("read edits {}", path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parse edits JSON {}", path.display()))
    }

    /// An edits document describing `facts` as extracted, ready to modify.
    pub fn template(facts: &FactSet) -> Self {
        let variables = facts
            .variables
            .values()
            .map(|variable| {
                let edit = VariableEdit {
                    role: Some(variable.role),
                    alias: Some(variable.alias.clone()),
                    default: variable.default.clone(),
                };
                (variable.name.clone(), edit)
            })
            .collect();
        let defines = facts
            .defines
            .iter()
            .map(|define| {
                let edit = DefineEdit {
                    role: Some(define.role),
                    ty: Some(define.ty),
                    value: Some(define.value.clone()),
                };
                (define.name.clone(), edit)
            })
            .collect();
        Self {
            name: None,
            description: facts.leading_comment.clone(),
            enable_input: Some(false),
            variables,
            defines,
        }
    }

    /// Check every target exists and every alias is valid.
    pub fn validate(&self, facts: &FactSet) -> Result<()> {
        for (name, edit) in &self.variables {
            ensure!(
                facts.variables.contains_key(name),
                "edits name unknown variable `{name}`"
            );
            if let Some(alias) = edit.alias.as_deref() {
                validate_alias(alias).with_context(|| format!("variable `{name}`"))?;
            }
        }
        for name in self.defines.keys() {
            ensure!(
                facts.define(name).is_some(),
                "edits name unknown define `{name}`"
            );
        }
        Ok(())
    }

    /// Validate, then apply every override to `facts`.
    ///
    /// Nothing is changed when validation fails.
    pub fn apply(&self, facts: &mut FactSet) -> Result<()> {
        self.validate(facts)?;

        for (name, edit) in &self.variables {
            let variable = facts
                .variables
                .get_mut(name)
                .ok_or_else(|| anyhow!("edits name unknown variable `{name}`"))?;
            if let Some(role) = edit.role {
                variable.role = role;
            }
            if let Some(alias) = &edit.alias {
                variable.alias = alias.clone();
            }
            if let Some(default) = &edit.default {
                let default = default.trim();
                variable.default = (!default.is_empty()).then(|| default.to_string());
            }
        }

        for (name, edit) in &self.defines {
            let define = facts
                .defines
                .iter_mut()
                .find(|define| define.name == *name)
                .ok_or_else(|| anyhow!("edits name unknown define `{name}`"))?;
            if let Some(value) = &edit.value {
                define.value = value.trim().to_string();
                define.ty = infer_define_type(&define.value);
            }
            if let Some(ty) = edit.ty {
                define.ty = ty;
            }
            if let Some(role) = edit.role {
                define.role = role;
            }
        }

        tracing::debug!(
            variables = self.variables.len(),
            defines = self.defines.len(),
            "applied edits"
        );
        Ok(())
    }
}

/// Block name: flag, then edits, then the input file stem.
pub fn resolve_block_name(flag: Option<&str>, edits: &BlockEdits, input: &Path) -> String {
    non_empty(flag)
        .or_else(|| non_empty(edits.name.as_deref()))
        .map(str::to_string)
        .or_else(|| {
            input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "block".to_string())
}

/// Description: flag, then edits, then the sketch's leading comment.
pub fn resolve_description(flag: Option<&str>, edits: &BlockEdits, facts: &FactSet) -> String {
    non_empty(flag)
        .or_else(|| non_empty(edits.description.as_deref()))
        .or_else(|| non_empty(facts.leading_comment.as_deref()))
        .unwrap_or(DEFAULT_DESCRIPTION)
        .to_string()
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
