//! Finalize step 1: per-declaration schema validation against the catalog.
//! Violations are collected, never short-circuited, so the caller can show
//! every problem in one pass.

use bragi_catalog::{Catalog, FieldSpec, FieldType};
use bragi_template::ResourceDeclaration;
use serde_json::Value;

use crate::ValidationProblem;

/// Configuration key allowed on every kind; defaults to the resource group's
/// location when absent.
pub(crate) const LOCATION_FIELD: &str = "location";

pub(crate) fn validate_declarations(
    catalog: &Catalog,
    declarations: &[ResourceDeclaration],
    problems: &mut Vec<ValidationProblem>,
) {
    for declaration in declarations {
        let Some(spec) = catalog.spec(declaration.kind) else {
            // add_resource rejects unknown kinds; a custom catalog swapped in
            // after the fact still gets a readable problem.
            problems.push(ValidationProblem::SchemaViolation {
                logical_name: declaration.logical_name.clone(),
                field: "kind".to_string(),
                reason: format!("kind `{}` is not in the catalog", declaration.kind),
            });
            continue;
        };

        for field in &spec.fields {
            if field.required && !declaration.configuration.contains_key(field.name) {
                problems.push(ValidationProblem::SchemaViolation {
                    logical_name: declaration.logical_name.clone(),
                    field: field.name.to_string(),
                    reason: "required field is missing".to_string(),
                });
            }
        }

        for (key, value) in &declaration.configuration {
            if key == LOCATION_FIELD {
                if !value.is_string() {
                    problems.push(ValidationProblem::SchemaViolation {
                        logical_name: declaration.logical_name.clone(),
                        field: key.clone(),
                        reason: "expected string".to_string(),
                    });
                }
                continue;
            }
            let Some(field) = spec.field(key) else {
                problems.push(ValidationProblem::SchemaViolation {
                    logical_name: declaration.logical_name.clone(),
                    field: key.clone(),
                    reason: format!("unknown field for kind `{}`", declaration.kind),
                });
                continue;
            };
            if let Some(reason) = check_value(field, value) {
                problems.push(ValidationProblem::SchemaViolation {
                    logical_name: declaration.logical_name.clone(),
                    field: key.clone(),
                    reason,
                });
            }
        }
    }
}

fn check_value(field: &FieldSpec, value: &Value) -> Option<String> {
    match field.ty {
        FieldType::String => (!value.is_string()).then(|| "expected string".to_string()),
        FieldType::Int => {
            (!(value.is_i64() || value.is_u64())).then(|| "expected integer".to_string())
        }
        FieldType::Bool => (!value.is_boolean()).then(|| "expected boolean".to_string()),
        FieldType::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => None,
            Some(s) => Some(format!(
                "`{s}` is not an allowed value (allowed: {})",
                allowed.join(", ")
            )),
            None => Some(format!("expected {}", field.ty.describe())),
        },
        // Reference targets are logical names; resolution happens in step 2.
        FieldType::Reference(_) => {
            (!value.is_string()).then(|| "expected a logical name string".to_string())
        }
    }
}
