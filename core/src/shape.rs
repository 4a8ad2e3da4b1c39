use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ItemErrorKind;

/// How a decoded worker result is turned into output records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapePolicy {
    /// Arrays fan out to one record per element; anything else, scalars
    /// and null included, becomes a single record.
    #[default]
    Lenient,
    /// Only an object or an array of objects is accepted.
    Strict,
}

/// One output record, tagged with the index of the work item it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub item: usize,
    pub json: Value,
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn shape_result(
    item: usize,
    result: Value,
    policy: ShapePolicy,
) -> Result<Vec<OutputRecord>, ItemErrorKind> {
    if policy == ShapePolicy::Strict {
        match &result {
            Value::Object(_) => {}
            Value::Array(elements) => {
                if let Some(bad) = elements.iter().find(|v| !v.is_object()) {
                    return Err(ItemErrorKind::UnexpectedResultShape {
                        found: type_name(bad),
                    });
                }
            }
            other => {
                return Err(ItemErrorKind::UnexpectedResultShape {
                    found: type_name(other),
                })
            }
        }
    }

    Ok(match result {
        Value::Array(elements) => elements
            .into_iter()
            .map(|json| OutputRecord { item, json })
            .collect(),
        json => vec![OutputRecord { item, json }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn values(records: Vec<OutputRecord>) -> Vec<Value> {
        records.into_iter().map(|r| r.json).collect()
    }

    #[test]
    fn empty_array_yields_no_records() {
        let out = shape_result(0, json!([]), ShapePolicy::Lenient).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn array_fans_out_in_order() {
        let out = shape_result(3, json!([{ "id": 1 }, { "id": 2 }]), ShapePolicy::Lenient).unwrap();
        assert!(out.iter().all(|r| r.item == 3));
        assert_eq!(values(out), vec![json!({ "id": 1 }), json!({ "id": 2 })]);
    }

    #[test]
    fn object_is_a_single_record() {
        let out = shape_result(0, json!({ "id": 5 }), ShapePolicy::Lenient).unwrap();
        assert_eq!(values(out), vec![json!({ "id": 5 })]);
    }

    #[test]
    fn lenient_wraps_scalars() {
        for scalar in [json!(42), json!("ok"), json!(null), json!(true)] {
            let out = shape_result(0, scalar.clone(), ShapePolicy::Lenient).unwrap();
            assert_eq!(values(out), vec![scalar]);
        }
    }

    #[test]
    fn empty_output_object_is_one_empty_record() {
        let out = shape_result(0, json!({}), ShapePolicy::Lenient).unwrap();
        assert_eq!(values(out), vec![json!({})]);
    }

    #[test]
    fn strict_rejects_scalars_and_mixed_arrays() {
        let err = shape_result(0, json!(42), ShapePolicy::Strict).unwrap_err();
        assert!(matches!(err, ItemErrorKind::UnexpectedResultShape { found: "number" }));

        let err = shape_result(0, json!([{ "id": 1 }, "x"]), ShapePolicy::Strict).unwrap_err();
        assert!(matches!(err, ItemErrorKind::UnexpectedResultShape { found: "string" }));

        let ok = shape_result(0, json!([{ "id": 1 }]), ShapePolicy::Strict).unwrap();
        assert_eq!(ok.len(), 1);
    }
}
