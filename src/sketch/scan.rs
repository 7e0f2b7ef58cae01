//! Byte-level scanning helpers shared by the extractor.
//!
//! Every helper preserves byte offsets: masked text has the same length as its
//! source so positions found in one view can be used to slice the other.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Mode {
    Code,
    LineComment,
    BlockComment,
    Quoted(u8),
}

impl Mode {
    fn is_comment(self) -> bool {
        matches!(self, Mode::LineComment | Mode::BlockComment)
    }
}

/// Iterates over `(offset, byte, mode)` for a C-like source text.
///
/// Comment openers/closers are reported in comment mode and quote characters
/// in quoted mode. Strings and char literals end at their closing quote or at
/// a newline, whichever comes first.
pub(super) struct CodeWalk<'a> {
    bytes: &'a [u8],
    pos: usize,
    mode: Mode,
    pending: Option<(usize, u8, Mode)>,
}

impl<'a> CodeWalk<'a> {
    pub(super) fn new(text: &'a str) -> Self {
        Self {
            bytes: text.as_bytes(),
            pos: 0,
            mode: Mode::Code,
            pending: None,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos + 1).copied()
    }
}

impl Iterator for CodeWalk<'_> {
    type Item = (usize, u8, Mode);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(item) = self.pending.take() {
            return Some(item);
        }
        let idx = self.pos;
        let byte = *self.bytes.get(idx)?;
        self.pos += 1;

        match self.mode {
            Mode::Code => {
                if byte == b'/' && self.bytes.get(idx + 1) == Some(&b'/') {
                    self.mode = Mode::LineComment;
                } else if byte == b'/' && self.bytes.get(idx + 1) == Some(&b'*') {
                    self.mode = Mode::BlockComment;
                    self.pending = Some((idx + 1, b'*', Mode::BlockComment));
                    self.pos += 1;
                } else if byte == b'"' || byte == b'\'' {
                    self.mode = Mode::Quoted(byte);
                }
                Some((idx, byte, self.mode))
            }
            Mode::LineComment => {
                if byte == b'\n' {
                    self.mode = Mode::Code;
                }
                Some((idx, byte, self.mode))
            }
            Mode::BlockComment => {
                if byte == b'*' && self.bytes.get(idx + 1) == Some(&b'/') {
                    self.pending = Some((idx + 1, b'/', Mode::BlockComment));
                    self.pos += 1;
                    self.mode = Mode::Code;
                    return Some((idx, byte, Mode::BlockComment));
                }
                Some((idx, byte, Mode::BlockComment))
            }
            Mode::Quoted(quote) => {
                let mode = self.mode;
                if byte == b'\\' && self.peek().is_some_and(|next| next != b'\n') {
                    self.pending = Some((idx + 1, self.bytes[idx + 1], mode));
                    self.pos += 1;
                } else if byte == quote {
                    self.mode = Mode::Code;
                } else if byte == b'\n' {
                    self.mode = Mode::Code;
                    return Some((idx, byte, Mode::Code));
                }
                Some((idx, byte, mode))
            }
        }
    }
}

/// Replace every comment with spaces, keeping newlines and offsets intact.
pub(super) fn mask_comments(text: &str) -> String {
    let mut bytes = text.as_bytes().to_vec();
    for (idx, byte, mode) in CodeWalk::new(text) {
        if mode.is_comment() && byte != b'\n' {
            bytes[idx] = b' ';
        }
    }
    // Only whole UTF-8 sequences inside comments were replaced.
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Replace the given byte ranges with spaces, keeping newlines.
pub(super) fn blank_ranges(text: &str, ranges: &[Range<usize>]) -> String {
    let mut bytes = text.as_bytes().to_vec();
    for range in ranges {
        let end = range.end.min(bytes.len());
        for byte in bytes.iter_mut().take(end).skip(range.start) {
            if *byte != b'\n' {
                *byte = b' ';
            }
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Find the `}` closing a block whose body starts at `body_start` (just past
/// the opening `{`). Returns the offset of that closing brace.
pub(super) fn match_brace(text: &str, body_start: usize) -> Option<usize> {
    let tail = text.get(body_start..)?;
    let mut depth = 1usize;
    for (idx, byte, mode) in CodeWalk::new(tail) {
        if mode != Mode::Code {
            continue;
        }
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(body_start + idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract the trimmed body of a block starting at `body_start`, or an empty
/// string when the block never closes.
pub(super) fn block_body(text: &str, body_start: usize) -> String {
    match match_brace(text, body_start) {
        Some(end) => text[body_start..end].trim().to_string(),
        None => String::new(),
    }
}

/// A slice of the scanned text together with its starting offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Segment<'a> {
    pub(super) start: usize,
    pub(super) text: &'a str,
}

impl<'a> Segment<'a> {
    /// The segment without surrounding whitespace, offset adjusted.
    pub(super) fn trimmed(self) -> Segment<'a> {
        let lead = self.text.len() - self.text.trim_start().len();
        Segment {
            start: self.start + lead,
            text: self.text.trim(),
        }
    }
}

/// Split on `separator` wherever it appears outside brackets and quotes.
///
/// The returned segments cover the whole input, so the last one holds any
/// text after the final separator.
pub(super) fn split_top_level(text: &str, separator: u8) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, byte, mode) in CodeWalk::new(text) {
        if mode != Mode::Code {
            continue;
        }
        match byte {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            _ if byte == separator && depth == 0 => {
                segments.push(Segment {
                    start,
                    text: &text[start..idx],
                });
                start = idx + 1;
            }
            _ => {}
        }
    }
    segments.push(Segment {
        start,
        text: &text[start..],
    });
    segments
}

/// Offset of the first `needle` outside brackets and quotes.
pub(super) fn find_top_level(text: &str, needle: u8) -> Option<usize> {
    let first = split_top_level(text, needle);
    if first.len() > 1 {
        Some(first[0].text.len())
    } else {
        None
    }
}

/// The full line of `text` that contains `offset`, without its newline.
pub(super) fn line_at(text: &str, offset: usize) -> &str {
    let offset = offset.min(text.len());
    let start = text[..offset].rfind('\n').map_or(0, |idx| idx + 1);
    let end = text[offset..]
        .find('\n')
        .map_or(text.len(), |idx| offset + idx);
    &text[start..end]
}

/// Text following the first `//` on a line that is not inside a literal.
pub(super) fn trailing_comment(line: &str) -> Option<&str> {
    CodeWalk::new(line)
        .find(|(_, _, mode)| *mode == Mode::LineComment)
        .map(|(idx, _, _)| &line[idx + 2..])
}
