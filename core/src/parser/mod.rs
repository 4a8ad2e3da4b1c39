//! Lenient parsing of hand-authored parameter text.
//!
//! The raw text is first parsed strictly. Only when that fails are the
//! leniency passes tried, in order, each one a pipeline of rewrites applied to
//! the raw text followed by another strict parse. The first success wins; if
//! every pass fails the last failure is reported with an excerpt and hex dump.
use std::borrow::Cow;

use serde_json::{Map, Value};

use crate::error::ParseError;

mod diagnostic;
mod scan;

pub use scan::{protect_string_whitespace, repair_escapes, scrub_control_chars};

type Rewrite = for<'a> fn(&'a str) -> Cow<'a, str>;

struct Pass {
    name: &'static str,
    rewrites: &'static [Rewrite],
}

const STRICT: &str = "strict";

const LENIENCY_PASSES: &[Pass] = &[
    Pass {
        name: "scrub",
        rewrites: &[scrub_control_chars],
    },
    Pass {
        name: "protect",
        rewrites: &[scrub_control_chars, protect_string_whitespace],
    },
    // repair runs before protect so a backslash in front of a raw line feed
    // is doubled first and the line feed still gets its own escape
    Pass {
        name: "repair",
        rewrites: &[scrub_control_chars, repair_escapes, protect_string_whitespace],
    },
];

impl Pass {
    fn apply<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        let mut text = Cow::Borrowed(raw);
        for rewrite in self.rewrites {
            let next = match rewrite(&text) {
                Cow::Owned(next) => next,
                Cow::Borrowed(_) => continue,
            };
            text = Cow::Owned(next);
        }
        text
    }
}

/// Strict JSON decode, no rewriting.
pub fn parse_strict(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(text)
}

/// Parse parameter text into JSON, tolerating raw control characters, raw
/// line breaks inside strings and stray backslashes.
///
/// Empty or whitespace-only text means "no parameters" and yields `{}`.
pub fn parse(raw: &str) -> Result<Value, ParseError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let mut last_err = match parse_strict(raw) {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };
    let mut last_pass = STRICT;
    let mut last_text: Cow<'_, str> = Cow::Borrowed(raw);

    for pass in LENIENCY_PASSES {
        let text = pass.apply(raw);
        if text == last_text {
            continue;
        }
        match parse_strict(&text) {
            Ok(value) => {
                tracing::debug!(pass = pass.name, "parameter text accepted after leniency pass");
                return Ok(value);
            }
            Err(err) => {
                last_err = err;
                last_pass = pass.name;
                last_text = text;
            }
        }
    }

    let report = diagnostic::diagnose(last_pass, &last_text, raw, &last_err);
    tracing::warn!(
        pass = report.pass,
        position = report.position,
        error.message = %report.message,
        "parameter text rejected"
    );
    Err(report)
}
