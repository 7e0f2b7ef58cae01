//! Fact-set types produced by extraction and consumed by the emitter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Everything extraction learns about a sketch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FactSet {
    pub leading_comment: Option<String>,
    pub setup_body: String,
    pub loop_body: String,
    pub functions: Vec<FunctionRecord>,
    pub variables: BTreeMap<String, VariableRecord>,
    pub includes: Vec<String>,
    pub defines: Vec<DefineRecord>,
    pub opaque_declarations: Vec<String>,
    pub global_section: String,
}

impl FactSet {
    pub fn function(&self, name: &str) -> Option<&FunctionRecord> {
        self.functions.iter().find(|func| func.name == name)
    }

    pub fn define(&self, name: &str) -> Option<&DefineRecord> {
        self.defines.iter().find(|define| define.name == name)
    }

    pub(crate) fn upsert_function(&mut self, record: FunctionRecord) {
        match self.functions.iter_mut().find(|f| f.name == record.name) {
            Some(existing) => *existing = record,
            None => self.functions.push(record),
        }
    }

    /// Variables with `role`, in the order they were declared.
    pub fn variables_in_source_order(&self, role: VariableRole) -> Vec<&VariableRecord> {
        let mut selected: Vec<&VariableRecord> = self
            .variables
            .values()
            .filter(|var| var.role == role)
            .collect();
        selected.sort_by_key(|var| var.position);
        selected
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionRecord {
    pub name: String,
    pub return_type: String,
    pub raw_params: String,
    pub params: Vec<FunctionParam>,
    pub body: String,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionParam {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}

/// Where a function sits relative to `setup`/`loop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    BeforeEntryPoints,
    AfterEntryPoints,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: PrimitiveType,
    pub default: Option<String>,
    pub role: VariableRole,
    pub alias: String,
    /// Storage qualifiers stripped before matching, e.g. `static const`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub qualifiers: String,
    pub position: usize,
}

impl VariableRecord {
    pub fn is_renamed(&self) -> bool {
        self.alias != self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefineRecord {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub ty: PrimitiveType,
    pub role: DefineRole,
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableRole {
    #[default]
    Variable,
    Input,
    Output,
    Parameter,
}

impl VariableRole {
    pub fn as_str(self) -> &'static str {
        match self {
            VariableRole::Variable => "variable",
            VariableRole::Input => "input",
            VariableRole::Output => "output",
            VariableRole::Parameter => "parameter",
        }
    }
}

impl fmt::Display for VariableRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefineRole {
    #[default]
    Global,
    Parameter,
}

/// The closed set of Arduino types the block editor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PrimitiveType {
    #[serde(rename = "int")]
    Int,
    #[serde(rename = "long")]
    Long,
    #[serde(rename = "unsigned long")]
    UnsignedLong,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "boolean")]
    Boolean,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "double")]
    Double,
    #[serde(rename = "byte")]
    Byte,
    #[serde(rename = "char")]
    Char,
    #[serde(rename = "String")]
    String,
    #[serde(rename = "uint8_t")]
    Uint8,
    #[serde(rename = "int16_t")]
    Int16,
    #[serde(rename = "uint16_t")]
    Uint16,
    #[serde(rename = "int32_t")]
    Int32,
    #[serde(rename = "uint32_t")]
    Uint32,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 15] = [
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::UnsignedLong,
        PrimitiveType::Bool,
        PrimitiveType::Boolean,
        PrimitiveType::Float,
        PrimitiveType::Double,
        PrimitiveType::Byte,
        PrimitiveType::Char,
        PrimitiveType::String,
        PrimitiveType::Uint8,
        PrimitiveType::Int16,
        PrimitiveType::Uint16,
        PrimitiveType::Int32,
        PrimitiveType::Uint32,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::UnsignedLong => "unsigned long",
            PrimitiveType::Bool => "bool",
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Char => "char",
            PrimitiveType::String => "String",
            PrimitiveType::Uint8 => "uint8_t",
            PrimitiveType::Int16 => "int16_t",
            PrimitiveType::Uint16 => "uint16_t",
            PrimitiveType::Int32 => "int32_t",
            PrimitiveType::Uint32 => "uint32_t",
        }
    }

    /// Parse a type spelling; `unsigned   long` tolerates inner whitespace.
    pub fn parse(text: &str) -> Option<Self> {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == normalized)
    }

    /// SIXX data-type class used by FLProg for this type.
    pub fn sixx_class(self) -> &'static str {
        match self {
            PrimitiveType::Int | PrimitiveType::Int16 | PrimitiveType::Uint16 => "IntegerDataType",
            PrimitiveType::Long
            | PrimitiveType::UnsignedLong
            | PrimitiveType::Int32
            | PrimitiveType::Uint32 => "LongDataType",
            PrimitiveType::Bool | PrimitiveType::Boolean => "BooleanDataType",
            PrimitiveType::Float | PrimitiveType::Double => "FloatDataType",
            PrimitiveType::Byte | PrimitiveType::Uint8 => "ByteDataType",
            PrimitiveType::Char => "CharDataType",
            PrimitiveType::String => "StringDataType",
        }
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, PrimitiveType::Bool | PrimitiveType::Boolean)
    }

    pub fn is_floating(self) -> bool {
        matches!(self, PrimitiveType::Float | PrimitiveType::Double)
    }

    pub fn is_string(self) -> bool {
        self == PrimitiveType::String
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
