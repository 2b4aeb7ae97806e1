//! Finalize step 7 support: `[parameters('name')]` expression scanning.
//! Configuration values and output expressions may embed ARM parameter
//! references anywhere, including inside nested arrays and objects; every
//! referenced name must be declared on the builder.

use std::collections::BTreeSet;

use serde_json::Value;

use crate::{TemplateBuilder, ValidationProblem};

const OPEN: &str = "parameters('";

/// Collects every parameter name referenced in `text`.
pub(crate) fn extract_parameter_refs(text: &str, out: &mut BTreeSet<String>) {
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        rest = &rest[start + OPEN.len()..];
        let Some(end) = rest.find("')") else {
            return;
        };
        out.insert(rest[..end].to_string());
        rest = &rest[end..];
    }
}

pub(crate) fn collect_refs_from_value(value: &Value, out: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => extract_parameter_refs(s, out),
        Value::Array(items) => {
            for item in items {
                collect_refs_from_value(item, out);
            }
        }
        Value::Object(map) => {
            for value in map.values() {
                collect_refs_from_value(value, out);
            }
        }
        _ => {}
    }
}

pub(crate) fn check_parameter_references(
    builder: &TemplateBuilder<'_>,
    problems: &mut Vec<ValidationProblem>,
) {
    for declaration in builder.declarations() {
        let mut referenced = BTreeSet::new();
        for value in declaration.configuration.values() {
            collect_refs_from_value(value, &mut referenced);
        }
        for parameter in referenced {
            if !builder.parameters().contains_key(parameter.as_str()) {
                problems.push(ValidationProblem::UndeclaredParameter {
                    resource: declaration.logical_name.clone(),
                    parameter,
                });
            }
        }
    }

    for (name, output) in builder.outputs() {
        let mut referenced = BTreeSet::new();
        extract_parameter_refs(&output.value, &mut referenced);
        for parameter in referenced {
            if !builder.parameters().contains_key(parameter.as_str()) {
                problems.push(ValidationProblem::UndeclaredOutputParameter {
                    output: name.clone(),
                    parameter,
                });
            }
        }
    }
}

/// Every parameter name referenced anywhere on the builder. Used by the
/// unused-parameter lint.
pub(crate) fn all_referenced_parameters(builder: &TemplateBuilder<'_>) -> BTreeSet<String> {
    let mut referenced = BTreeSet::new();
    for declaration in builder.declarations() {
        for value in declaration.configuration.values() {
            collect_refs_from_value(value, &mut referenced);
        }
    }
    for output in builder.outputs().values() {
        extract_parameter_refs(&output.value, &mut referenced);
    }
    referenced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_multiple_references_from_one_expression() {
        let mut out = BTreeSet::new();
        extract_parameter_refs(
            "[concat(parameters('prefix'), '-', parameters('suffix'))]",
            &mut out,
        );
        assert_eq!(
            out.into_iter().collect::<Vec<_>>(),
            vec!["prefix".to_string(), "suffix".to_string()]
        );
    }

    #[test]
    fn unterminated_reference_is_ignored() {
        let mut out = BTreeSet::new();
        extract_parameter_refs("[parameters('broken]", &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn walks_nested_arrays_and_objects() {
        let mut out = BTreeSet::new();
        collect_refs_from_value(
            &serde_json::json!({
                "appSettings": [
                    { "value": "[parameters('connString')]" }
                ]
            }),
            &mut out,
        );
        assert!(out.contains("connString"));
    }
}
