//! Static operation catalog and the per-operation field schema.
//!
//! Operations listed in [`SCHEMAS`] take dedicated, typed fields from the work
//! item; every other operation gets its parameters from free text only.
use std::sync::OnceLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldDefault {
    Number(i64),
    Text(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// `None` means the work item must carry the field.
    pub default: Option<FieldDefault>,
    pub description: &'static str,
}

/// What happens to the free-text `params` of an operation with dedicated fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FreeText {
    /// Parsed and merged over the dedicated fields; its keys win.
    MergedOver,
    Ignored,
}

#[derive(Debug, Clone, Copy)]
pub struct OperationSchema {
    pub operation: &'static str,
    pub fields: &'static [FieldSpec],
    pub free_text: FreeText,
}

const fn number(name: &'static str, default: i64, description: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Number,
        default: Some(FieldDefault::Number(default)),
        description,
    }
}

pub const SCHEMAS: &[OperationSchema] = &[
    OperationSchema {
        operation: "TestCase.filter",
        fields: &[number("pk", 0, "Record ID of the test case")],
        free_text: FreeText::MergedOver,
    },
    OperationSchema {
        operation: "TestCase.create",
        fields: &[
            FieldSpec {
                name: "summary",
                kind: FieldKind::Text,
                default: None,
                description: "Brief description of the test case",
            },
            number("case_status", 2, "Test case status"),
            number("category", 4, "Category ID"),
            number("priority", 1, "Test case priority"),
            number("author", 25, "Test case author ID"),
            FieldSpec {
                name: "text",
                kind: FieldKind::Text,
                default: Some(FieldDefault::Text("")),
                description: "Test case steps (Markdown)",
            },
        ],
        free_text: FreeText::Ignored,
    },
];

pub fn schema_for(operation: &str) -> Option<&'static OperationSchema> {
    SCHEMAS.iter().find(|s| s.operation == operation)
}

pub const KNOWN_OPERATIONS: &[&str] = &[
    "Build.create",
    "Build.filter",
    "Build.update",
    "Component.create",
    "Component.filter",
    "Component.update",
    "Environment.add_property",
    "Environment.create",
    "Environment.filter",
    "Environment.properties",
    "Environment.remove_property",
    "Product.create",
    "Product.filter",
    "Tag.filter",
    "TestCase.add_attachment",
    "TestCase.add_comment",
    "TestCase.add_component",
    "TestCase.add_notification_cc",
    "TestCase.add_property",
    "TestCase.add_tag",
    "TestCase.comments",
    "TestCase.create",
    "TestCase.filter",
    "TestCase.get_notification_cc",
    "TestCase.history",
    "TestCase.list_attachments",
    "TestCase.properties",
    "TestCase.remove",
    "TestCase.remove_comment",
    "TestCase.remove_component",
    "TestCase.remove_notification_cc",
    "TestCase.remove_property",
    "TestCase.remove_tag",
    "TestCase.sortkeys",
    "TestCase.update",
    "TestExecution.add_comment",
    "TestExecution.add_link",
    "TestExecution.filter",
    "TestExecution.get_comments",
    "TestExecution.get_links",
    "TestExecution.history",
    "TestExecution.properties",
    "TestExecution.remove",
    "TestExecution.remove_comment",
    "TestExecution.remove_link",
    "TestExecution.update",
    "TestPlan.add_attachment",
    "TestPlan.add_case",
    "TestPlan.add_tag",
    "TestPlan.create",
    "TestPlan.filter",
    "TestPlan.list_attachments",
    "TestPlan.remove_case",
    "TestPlan.remove_tag",
    "TestPlan.tree",
    "TestPlan.update",
    "TestPlan.update_case_order",
    "TestRun.add_attachment",
    "TestRun.add_case",
    "TestRun.add_cc",
    "TestRun.add_tag",
    "TestRun.annotate_executions_with_properties",
    "TestRun.create",
    "TestRun.filter",
    "TestRun.get_cases",
    "TestRun.properties",
    "TestRun.remove",
    "TestRun.remove_case",
    "TestRun.remove_cc",
    "TestRun.remove_tag",
    "TestRun.update",
];

pub fn is_known(operation: &str) -> bool {
    KNOWN_OPERATIONS.contains(&operation)
}

fn operation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_]*\.[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex")
    })
}

/// Check the `Resource.verb` form. Unknown but well-formed ids pass with a
/// warning; the worker is the authority on what exists.
pub fn validate_operation(operation: &str) -> Result<(), String> {
    if operation.trim().is_empty() {
        return Err("action is empty".to_string());
    }
    if !operation_re().is_match(operation) {
        return Err(format!("action '{operation}' is not of the form Resource.verb"));
    }
    if !is_known(operation) {
        tracing::warn!(action = %operation, "action not in the known catalog, forwarding anyway");
    }
    Ok(())
}
