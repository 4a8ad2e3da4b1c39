//! Small string helpers shared by the parser diagnostics and the transport.

/// First `max_chars` characters of `s`, with a trailing `…` when cut.
pub fn excerpt(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        None => s.to_string(),
        Some((end, _)) => {
            let mut out = s[..end].to_string();
            out.push('…');
            out
        }
    }
}

/// Render literal line feeds as the two characters `\n` for one-line display.
pub fn show_newlines(s: &str) -> String {
    s.replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_keeps_short_input_untouched() {
        assert_eq!(excerpt("abc", 5), "abc");
        assert_eq!(excerpt("abc", 3), "abc");
    }

    #[test]
    fn excerpt_cuts_on_char_boundaries() {
        assert_eq!(excerpt("привет", 2), "пр…");
    }

    #[test]
    fn show_newlines_escapes_line_feeds_only() {
        assert_eq!(show_newlines("a\nb\tc"), "a\\nb\tc");
    }
}
