use crate::error::ParseError;
use crate::util::{excerpt, show_newlines};

const CONTEXT_RADIUS: usize = 20;
const DOCUMENT_START_CHARS: usize = 100;

/// Map serde_json's 1-based line/column (column counted in bytes) to a
/// 0-based character offset into `text`.
pub(crate) fn char_offset(text: &str, line: usize, column: usize) -> usize {
    if line == 0 {
        return 0;
    }

    let mut line_start = 0usize;
    for _ in 1..line {
        match text[line_start..].find('\n') {
            Some(nl) => line_start += nl + 1,
            None => break,
        }
    }

    let mut byte = (line_start + column.saturating_sub(1)).min(text.len());
    while !text.is_char_boundary(byte) {
        byte -= 1;
    }
    text[..byte].chars().count()
}

/// Build the operator report for the failure of the last attempted pass.
pub(crate) fn diagnose(
    pass: &'static str,
    text: &str,
    raw: &str,
    err: &serde_json::Error,
) -> ParseError {
    let position = char_offset(text, err.line(), err.column());
    let start = position.saturating_sub(CONTEXT_RADIUS);
    let window: Vec<char> = text
        .chars()
        .skip(start)
        .take(position - start + CONTEXT_RADIUS)
        .collect();
    let marker = position - start;

    let hex_dump = window
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let code = format!("{:04x}", *c as u32);
            if i == marker {
                format!(">>>{code}<<<")
            } else {
                code
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    let context: String = window.into_iter().collect();

    ParseError {
        message: err.to_string(),
        position,
        context: show_newlines(&context),
        hex_dump,
        document_start: show_newlines(&excerpt(raw, DOCUMENT_START_CHARS)),
        pass,
    }
}
