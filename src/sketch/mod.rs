//! Best-effort extraction of facts from Arduino sketches.
//!
//! Nothing here fails: text that does not fit the expected shapes is skipped
//! so arbitrary pasted code always produces a (possibly empty) fact set.

mod comment;
mod functions;
mod globals;
mod model;
mod roles;
mod scan;

pub use model::{
    DefineRecord, DefineRole, FactSet, FunctionParam, FunctionRecord, Placement, PrimitiveType,
    VariableRecord, VariableRole,
};

use functions::{catalog_functions, entry_point_body, first_entry_point};
pub(crate) use globals::infer_define_type;
use globals::parse_global_section;
use scan::mask_comments;

/// Extract the full fact set from sketch source text.
pub fn extract(code: &str) -> FactSet {
    let code_view = mask_comments(code);

    let boundary = first_entry_point(&code_view).unwrap_or(code.len());
    let prefix = &code[..boundary];
    let lead = prefix.len() - prefix.trim_start().len();
    let global_section = prefix.trim();

    let cataloged = catalog_functions(code, &code_view);
    let function_spans: Vec<_> = cataloged
        .iter()
        .filter(|func| func.record.placement == Placement::BeforeEntryPoints)
        .filter(|func| func.span.start >= lead)
        .map(|func| {
            let start = func.span.start - lead;
            let end = (func.span.end - lead).min(global_section.len());
            start..end
        })
        .collect();

    let globals = parse_global_section(global_section, &function_spans);

    let mut facts = FactSet {
        leading_comment: comment::leading_comment(code),
        setup_body: entry_point_body(code, &code_view, "setup"),
        loop_body: entry_point_body(code, &code_view, "loop"),
        functions: Vec::new(),
        variables: globals.variables,
        includes: globals.includes,
        defines: globals.defines,
        opaque_declarations: globals.opaque_declarations,
        global_section: global_section.to_string(),
    };
    for func in cataloged {
        facts.upsert_function(func.record);
    }

    tracing::debug!(
        variables = facts.variables.len(),
        functions = facts.functions.len(),
        includes = facts.includes.len(),
        defines = facts.defines.len(),
        opaque = facts.opaque_declarations.len(),
        "extracted sketch facts"
    );
    facts
}

/// Regex alternation over every primitive type spelling.
fn type_alternation() -> String {
    PrimitiveType::ALL
        .iter()
        .map(|ty| regex::escape(ty.as_str()).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|")
}
