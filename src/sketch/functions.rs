use super::model::{FunctionParam, FunctionRecord, Placement, PrimitiveType};
use super::scan::{block_body, match_brace, split_top_level};
use super::type_alternation;
use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

pub(super) const ENTRY_POINTS: [&str; 2] = ["setup", "loop"];

static FUNCTION_DECL: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"\b(?:(?:static|inline|const|volatile|extern)\s+)*(void|{})\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(([^)]*)\)\s*\{{",
        type_alternation()
    );
    Regex::new(&pattern).expect("regex for function declarations")
});

static ENTRY_POINT_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bvoid\s+(setup|loop)\s*\(").expect("regex for entry point declarations")
});

/// A cataloged function plus the byte span of its whole definition.
pub(super) struct CatalogedFunction {
    pub(super) record: FunctionRecord,
    pub(super) span: Range<usize>,
}

/// Offset of the earliest `void setup(` / `void loop(` declaration.
///
/// `code_view` must have comments masked so commented-out entry points are
/// not picked up.
pub(super) fn first_entry_point(code_view: &str) -> Option<usize> {
    ENTRY_POINT_DECL
        .find_iter(code_view)
        .map(|found| found.start())
        .min()
}

/// Trimmed body of `void <name>() { ... }`, or empty when absent/unterminated.
pub(super) fn entry_point_body(code: &str, code_view: &str, name: &str) -> String {
    let pattern = format!(r"\bvoid\s+{}\s*\(\s*\)\s*\{{", regex::escape(name));
    let Ok(decl) = Regex::new(&pattern) else {
        return String::new();
    };
    match decl.find(code_view) {
        Some(found) => block_body(code, found.end()),
        None => String::new(),
    }
}

/// Catalog every user function except the lifecycle entry points.
pub(super) fn catalog_functions(code: &str, code_view: &str) -> Vec<CatalogedFunction> {
    let boundary = first_entry_point(code_view).unwrap_or(code.len());
    let mut functions = Vec::new();

    for caps in FUNCTION_DECL.captures_iter(code_view) {
        let (Some(whole), Some(ret), Some(name), Some(params)) =
            (caps.get(0), caps.get(1), caps.get(2), caps.get(3))
        else {
            continue;
        };
        if ENTRY_POINTS.contains(&name.as_str()) {
            continue;
        }

        let body_start = whole.end();
        let span_end = match_brace(code, body_start).map_or(body_start, |end| end + 1);
        let raw_params = code[params.range()].trim().to_string();
        let return_type = PrimitiveType::parse(ret.as_str())
            .map_or("void", PrimitiveType::as_str)
            .to_string();
        let placement = if whole.start() < boundary {
            Placement::BeforeEntryPoints
        } else {
            Placement::AfterEntryPoints
        };

        functions.push(CatalogedFunction {
            record: FunctionRecord {
                name: name.as_str().to_string(),
                return_type,
                params: parse_params(&raw_params),
                raw_params,
                body: block_body(code, body_start),
                placement,
            },
            span: whole.start()..span_end,
        });
    }

    functions
}

/// Split a raw parameter list into `{type, name}` pairs.
///
/// Fragments need at least two words; anything past the second is ignored.
pub(super) fn parse_params(raw: &str) -> Vec<FunctionParam> {
    split_top_level(raw, b',')
        .into_iter()
        .filter_map(|segment| {
            let mut words = segment.text.split_whitespace();
            let ty = words.next()?;
            let name = words.next()?;
            Some(FunctionParam {
                ty: ty.to_string(),
                name: name.to_string(),
            })
        })
        .collect()
}
