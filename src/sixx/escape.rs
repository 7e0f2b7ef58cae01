/// Escape text for placement inside a SIXX element.
pub(crate) fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape source code; FLProg also treats `(`, `)`, `,` and `%` specially.
pub(crate) fn escape_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in escape_markup(text).chars() {
        match ch {
            '(' => out.push_str("&#40;"),
            ')' => out.push_str("&#41;"),
            ',' => out.push_str("&#44;"),
            '%' => out.push_str("&#37;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Drop trailing whitespace from every line.
pub(crate) fn trim_line_ends(code: &str) -> String {
    code.lines().map(str::trim_end).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_markup("a < b && c > \"d\" 'e'"),
            "a &lt; b &amp;&amp; c &gt; &quot;d&quot; &#x27;e&#x27;"
        );
    }

    #[test]
    fn escapes_code_specials_after_markup() {
        assert_eq!(
            escape_code("printf(\"%d, %d\", a & 1, b);"),
            "printf&#40;&quot;&#37;d&#44; &#37;d&quot;&#44; a &amp; 1&#44; b&#41;;"
        );
    }

    #[test]
    fn trims_trailing_whitespace_per_line() {
        assert_eq!(trim_line_ends("a;  \n\tb; \t\n"), "a;\n\tb;");
    }
}
