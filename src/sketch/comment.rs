/// Documentation comment at the very top of a sketch, if any.
///
/// A block comment yields its trimmed interior (to end-of-text when never
/// closed). A run of `//` lines yields those lines with the marker and one
/// following space removed.
pub(super) fn leading_comment(code: &str) -> Option<String> {
    let rest = code.trim_start();

    if let Some(after) = rest.strip_prefix("/*") {
        let body = after.find("*/").map_or(after, |end| &after[..end]);
        return non_empty(body.trim());
    }

    if rest.starts_with("//") {
        let mut lines = Vec::new();
        for line in rest.lines() {
            let Some(text) = line.trim_start().strip_prefix("//") else {
                break;
            };
            let text = text.strip_prefix(' ').unwrap_or(text);
            lines.push(text.trim_end());
        }
        return non_empty(lines.join("\n").trim());
    }

    None
}

fn non_empty(text: &str) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
