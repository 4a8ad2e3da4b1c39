use serde::Serialize;
use serde_json::Value;

use tcms_bridge_core::operations::{
    schema_for, FieldDefault, FieldKind, FieldSpec, FreeText, KNOWN_OPERATIONS,
};
use tcms_bridge_core::BridgeError;

use super::cli::OperationsArgs;

#[derive(Debug, Serialize)]
struct FieldView {
    name: &'static str,
    kind: &'static str,
    required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    description: &'static str,
}

#[derive(Debug, Serialize)]
struct OperationView {
    operation: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldView>,
    /// `params` handling: "only", "merged" or "ignored".
    params: &'static str,
}

fn field_view(spec: &FieldSpec) -> FieldView {
    FieldView {
        name: spec.name,
        kind: match spec.kind {
            FieldKind::Number => "number",
            FieldKind::Text => "text",
        },
        required: spec.default.is_none(),
        default: spec.default.map(|d| match d {
            FieldDefault::Number(n) => Value::from(n),
            FieldDefault::Text(s) => Value::from(s),
        }),
        description: spec.description,
    }
}

fn catalog() -> Vec<OperationView> {
    KNOWN_OPERATIONS
        .iter()
        .map(|&operation| match schema_for(operation) {
            Some(schema) => OperationView {
                operation,
                fields: schema.fields.iter().map(field_view).collect(),
                params: match schema.free_text {
                    FreeText::MergedOver => "merged",
                    FreeText::Ignored => "ignored",
                },
            },
            None => OperationView {
                operation,
                fields: Vec::new(),
                params: "only",
            },
        })
        .collect()
}

fn render_text(ops: &[OperationView]) -> String {
    let mut out = String::new();
    for op in ops {
        out.push_str(op.operation);
        out.push('\n');
        for f in &op.fields {
            let default = match &f.default {
                Some(v) => format!(", default {v}"),
                None => ", required".to_string(),
            };
            out.push_str(&format!("    {} ({}{default})  {}\n", f.name, f.kind, f.description));
        }
        if op.params != "only" {
            out.push_str(&format!("    params: {}\n", op.params));
        }
    }
    out
}

pub fn run_operations(args: OperationsArgs) -> Result<i32, BridgeError> {
    let ops = catalog();
    if args.json {
        let text = serde_json::to_string_pretty(&ops)
            .map_err(|e| BridgeError::Io(std::io::Error::other(e)))?;
        println!("{text}");
    } else {
        print!("{}", render_text(&ops));
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_operation() {
        let ops = catalog();
        assert_eq!(ops.len(), KNOWN_OPERATIONS.len());
        let create = ops.iter().find(|o| o.operation == "TestCase.create").unwrap();
        assert_eq!(create.params, "ignored");
        assert!(create.fields.iter().any(|f| f.name == "summary" && f.required));
    }

    #[test]
    fn text_listing_shows_defaults() {
        let text = render_text(&catalog());
        assert!(text.contains("TestCase.filter\n    pk (number, default 0)"));
        assert!(text.contains("    text (text, default \"\")"));
        assert!(text.contains("TestRun.update\n"));
    }
}
