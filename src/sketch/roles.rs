use super::model::{DefineRole, VariableRole};
use super::scan::{line_at, trailing_comment};
use regex::Regex;
use std::sync::LazyLock;

static INPUT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:in|input)\b").expect("regex for input marker"));
static OUTPUT_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:out|output)\b").expect("regex for output marker"));
static PARAMETER_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?:par|param|parameter)\b").expect("regex for parameter marker")
});

/// Role of a declaration from the trailing comment of the line at `offset`.
pub(super) fn variable_role_at(text: &str, offset: usize) -> VariableRole {
    let Some(comment) = trailing_comment(line_at(text, offset)) else {
        return VariableRole::Variable;
    };
    if INPUT_MARKER.is_match(comment) {
        VariableRole::Input
    } else if OUTPUT_MARKER.is_match(comment) {
        VariableRole::Output
    } else if PARAMETER_MARKER.is_match(comment) {
        VariableRole::Parameter
    } else {
        VariableRole::Variable
    }
}

/// Defines only distinguish plain constants from configurable parameters.
pub(super) fn define_role(comment: Option<&str>) -> DefineRole {
    match comment {
        Some(comment) if PARAMETER_MARKER.is_match(comment) => DefineRole::Parameter,
        _ => DefineRole::Global,
    }
}
