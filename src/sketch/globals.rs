use super::model::{DefineRecord, PrimitiveType, VariableRecord};
use super::roles::{define_role, variable_role_at};
use super::scan::{
    blank_ranges, find_top_level, mask_comments, split_top_level, trailing_comment, Segment,
};
use super::type_alternation;
use regex::Regex;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::LazyLock;

static INCLUDE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#\s*include\b").expect("regex for include lines"));
static DEFINE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*#\s*define\s+([A-Za-z_][A-Za-z0-9_]*(?:\([^)]*\))?)(?:\s+(.*))?$")
        .expect("regex for define lines")
});
static QUALIFIERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:static|const|volatile|extern|register)\s+)+")
        .expect("regex for storage qualifiers")
});
static PRIMITIVE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(r"(?s)^({})\s+(.+)$", type_alternation());
    Regex::new(&pattern).expect("regex for primitive declarations")
});
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").expect("regex for identifiers"));

/// Declarations found in the pre-entry-point section.
#[derive(Debug, Default)]
pub(super) struct GlobalFacts {
    pub(super) variables: BTreeMap<String, VariableRecord>,
    pub(super) includes: Vec<String>,
    pub(super) defines: Vec<DefineRecord>,
    pub(super) opaque_declarations: Vec<String>,
}

/// Parse the global section; `function_spans` are definitions to ignore.
pub(super) fn parse_global_section(section: &str, function_spans: &[Range<usize>]) -> GlobalFacts {
    let mut facts = GlobalFacts::default();
    let source = blank_ranges(section, function_spans);
    let code_view = mask_comments(&source);

    let mut directive_lines = Vec::new();
    let mut line_start = 0;
    for line in code_view.split_inclusive('\n') {
        let range = line_start..line_start + line.len();
        line_start = range.end;
        let content = line.trim_end_matches(['\n', '\r']);
        if !content.trim_start().starts_with('#') {
            continue;
        }
        directive_lines.push(range.clone());

        if INCLUDE_LINE.is_match(content) {
            facts.includes.push(content.trim().to_string());
        } else if let Some(caps) = DEFINE_LINE.captures(content) {
            let raw_line = &source[range.start..range.start + content.len()];
            let name = caps.get(1).map_or("", |m| m.as_str()).to_string();
            let value = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
            facts.defines.push(DefineRecord {
                ty: infer_define_type(&value),
                role: define_role(trailing_comment(raw_line)),
                name,
                value,
                position: range.start,
            });
        }
    }

    let statements_view = blank_ranges(&code_view, &directive_lines);
    let mut segments = split_top_level(&statements_view, b';');
    // Text after the last `;` is not a complete statement.
    segments.pop();

    for segment in segments {
        let statement = segment.trimmed();
        if statement.text.is_empty() || looks_like_prototype(statement.text) {
            continue;
        }
        match parse_primitive_declaration(statement, &source) {
            Some(variables) => {
                for variable in variables {
                    facts.variables.insert(variable.name.clone(), variable);
                }
            }
            None => facts
                .opaque_declarations
                .push(format!("{};", statement.text)),
        }
    }

    facts
}

/// A trailing parenthesized group with no assignment reads as a prototype.
fn looks_like_prototype(statement: &str) -> bool {
    statement.ends_with(')') && !statement.contains('=')
}

/// Variables declared by `statement`, or `None` when it is not a scalar
/// declaration of a primitive type.
fn parse_primitive_declaration(statement: Segment<'_>, source: &str) -> Option<Vec<VariableRecord>> {
    let qualifier_len = QUALIFIERS.find(statement.text).map_or(0, |m| m.end());
    let qualifiers = statement.text[..qualifier_len]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let unqualified = &statement.text[qualifier_len..];

    let caps = PRIMITIVE_DECL.captures(unqualified)?;
    let ty = PrimitiveType::parse(caps.get(1)?.as_str())?;
    let list = caps.get(2)?;
    let list_start = statement.start + qualifier_len + list.start();

    let mut variables = Vec::new();
    for declarator in split_top_level(list.as_str(), b',') {
        let (name_part, default) = match find_top_level(declarator.text, b'=') {
            Some(eq) => {
                let init = declarator.text[eq + 1..].trim();
                let init = (!init.is_empty()).then(|| init.to_string());
                (&declarator.text[..eq], init)
            }
            None => (declarator.text, None),
        };
        if name_part.contains('[') {
            return None;
        }
        let Some(name) = IDENTIFIER.find_iter(name_part).last() else {
            continue;
        };
        let position = list_start + declarator.start + name.start();
        variables.push(VariableRecord {
            name: name.as_str().to_string(),
            ty,
            default,
            role: variable_role_at(source, position),
            alias: name.as_str().to_string(),
            qualifiers: qualifiers.clone(),
            position,
        });
    }

    if variables.is_empty() {
        None
    } else {
        Some(variables)
    }
}

/// Guess a type for a `#define` value.
pub(crate) fn infer_define_type(value: &str) -> PrimitiveType {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        return PrimitiveType::String;
    }
    if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false") {
        return PrimitiveType::Boolean;
    }
    if (value.contains(',') || value.contains('.'))
        && value.replace(',', ".").parse::<f64>().is_ok()
    {
        return PrimitiveType::Float;
    }
    if value.parse::<i64>().is_ok() {
        return PrimitiveType::Long;
    }
    PrimitiveType::String
}
