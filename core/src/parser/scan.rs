//! Text rewrites applied before a strict re-parse.
//!
//! Every rewrite returns `Cow::Borrowed` when it has nothing to change, so the
//! caller can tell a no-op apart from a real transformation.
use std::borrow::Cow;

/// Where a character sits relative to JSON string literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Region {
    /// Structural JSON between string literals.
    Outside,
    /// An opening or closing double quote.
    Quote,
    /// Plain content of a string literal.
    Body,
    /// A backslash that starts an escape sequence.
    EscapeStart,
    /// The character right after an escape-starting backslash.
    Escaped,
}

/// Left-to-right scanner tracking string literal boundaries.
#[derive(Debug, Default)]
pub(crate) struct QuoteScanner {
    in_string: bool,
    escaped: bool,
}

impl QuoteScanner {
    pub(crate) fn step(&mut self, c: char) -> Region {
        if !self.in_string {
            if c == '"' {
                self.in_string = true;
                return Region::Quote;
            }
            return Region::Outside;
        }
        if self.escaped {
            self.escaped = false;
            return Region::Escaped;
        }
        match c {
            '\\' => {
                self.escaped = true;
                Region::EscapeStart
            }
            '"' => {
                self.in_string = false;
                Region::Quote
            }
            _ => Region::Body,
        }
    }

    /// Treat a just-seen escape-starting backslash as a finished literal pair.
    fn cancel_escape(&mut self) {
        self.escaped = false;
    }
}

fn is_invalid_control(c: char) -> bool {
    matches!(c, '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}')
}

/// Drop C0 control characters other than tab, line feed and carriage return.
pub fn scrub_control_chars(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_invalid_control) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.chars().filter(|c| !is_invalid_control(*c)).collect())
}

/// Inside string literals only, turn literal LF, CR and TAB into their JSON
/// escapes. Decoding the escape yields the original character again.
pub fn protect_string_whitespace(text: &str) -> Cow<'_, str> {
    if !text.contains(['\n', '\r', '\t']) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut changed = false;
    let mut scanner = QuoteScanner::default();

    for c in text.chars() {
        let region = scanner.step(c);
        let escape = match (region, c) {
            (Region::Body, '\n') => Some("\\n"),
            (Region::Body, '\r') => Some("\\r"),
            (Region::Body, '\t') => Some("\\t"),
            _ => None,
        };
        match escape {
            Some(seq) => {
                out.push_str(seq);
                changed = true;
            }
            None => out.push(c),
        }
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

fn is_valid_escape(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        Some('"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't') => true,
        Some('u') => {
            let hex: Vec<char> = chars.take(4).collect();
            hex.len() == 4 && hex.iter().all(char::is_ascii_hexdigit)
        }
        _ => false,
    }
}

/// Inside string literals only, double every backslash that does not start a
/// valid JSON escape so it survives as a literal backslash.
pub fn repair_escapes(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    let mut changed = false;
    let mut scanner = QuoteScanner::default();

    for (idx, c) in text.char_indices() {
        out.push(c);
        if scanner.step(c) == Region::EscapeStart && !is_valid_escape(&text[idx + 1..]) {
            out.push('\\');
            scanner.cancel_escape();
            changed = true;
        }
    }

    if changed {
        Cow::Owned(out)
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regions(text: &str) -> Vec<Region> {
        let mut scanner = QuoteScanner::default();
        text.chars().map(|c| scanner.step(c)).collect()
    }

    #[test]
    fn scanner_closes_string_after_escaped_backslash() {
        // "\\" then a structural colon
        let got = regions(r#""\\":"#);
        assert_eq!(
            got,
            vec![
                Region::Quote,
                Region::EscapeStart,
                Region::Escaped,
                Region::Quote,
                Region::Outside,
            ]
        );
    }

    #[test]
    fn scanner_keeps_escaped_quote_inside_string() {
        let got = regions(r#""a\"b""#);
        assert_eq!(got[3], Region::Escaped);
        assert_eq!(got[4], Region::Body);
        assert_eq!(got[5], Region::Quote);
    }

    #[test]
    fn scrub_removes_only_invalid_controls() {
        let text = "{\"a\":\u{1}\"x\u{7f}\t\r\n\"\u{1b}}";
        assert_eq!(scrub_control_chars(text), "{\"a\":\"x\u{7f}\t\r\n\"}");
        assert!(matches!(scrub_control_chars("{\"a\":1}"), Cow::Borrowed(_)));
    }

    #[test]
    fn protect_escapes_whitespace_inside_strings_only() {
        let text = "{\n  \"text\": \"line1\nline2\tend\"\n}";
        assert_eq!(
            protect_string_whitespace(text),
            "{\n  \"text\": \"line1\\nline2\\tend\"\n}"
        );
    }

    #[test]
    fn protect_is_noop_without_raw_whitespace_in_strings() {
        let text = "{\n  \"a\": \"b\"\n}";
        assert!(matches!(protect_string_whitespace(text), Cow::Borrowed(_)));
    }

    #[test]
    fn repair_doubles_unknown_escapes() {
        assert_eq!(repair_escapes(r#"{"p":"C:\temp\x"}"#), r#"{"p":"C:\temp\\x"}"#);
        assert_eq!(repair_escapes(r#"{"p":"\u12G4"}"#), r#"{"p":"\\u12G4"}"#);
    }

    #[test]
    fn repair_leaves_valid_escapes_alone() {
        let text = r#"{"p":"a\"b\\c\/d\u00e9\n"}"#;
        assert!(matches!(repair_escapes(text), Cow::Borrowed(_)));
    }

    #[test]
    fn repair_handles_trailing_backslash_before_quote_pair() {
        // `\\` is a complete escape, so the following quote closes the string
        let text = r#"{"a":"x\\","b":"\q"}"#;
        assert_eq!(repair_escapes(text), r#"{"a":"x\\","b":"\\q"}"#);
    }
}
