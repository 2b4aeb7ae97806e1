//! Value types shared between the template builder and its consumers:
//! validated names, resource declarations, and the finalized ARM template
//! document with canonical serialization.

mod document;
mod names;
pub mod validate;

use std::collections::BTreeMap;

use bragi_catalog::ResourceKind;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error as ThisError;

pub use document::{
    ARM_SCHEMA, CONTENT_VERSION, TemplateDigest, TemplateDocument, TemplateResource,
    canonical_json,
};
pub use names::{LogicalName, OutputName, ParameterName};

#[derive(Debug, ThisError, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid {kind} name `{name}`: {reason}")]
    #[diagnostic(code(template::invalid_name))]
    InvalidName {
        kind: &'static str,
        name: String,
        reason: &'static str,
    },
}

/// A user-authored statement of intent to create one resource. Declarations
/// accumulate in a builder (or a session store) and are never mutated by the
/// builder itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ResourceDeclaration {
    pub kind: ResourceKind,
    pub logical_name: LogicalName,
    /// Field name to value, validated against the kind's catalog schema at
    /// finalize time. Reference fields hold the target's logical name.
    #[serde(default)]
    #[builder(default)]
    pub configuration: BTreeMap<String, Value>,
}

impl ResourceDeclaration {
    /// Logical names this declaration's reference fields point at, per the
    /// given kind spec. Unknown fields and non-string values are skipped;
    /// schema validation reports those separately.
    pub fn reference_targets<'a>(
        &'a self,
        spec: &'a bragi_catalog::KindSpec,
    ) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.configuration.iter().filter_map(|(field, value)| {
            let field_spec = spec.field(field)?;
            if !matches!(field_spec.ty, bragi_catalog::FieldType::Reference(_)) {
                return None;
            }
            Some((field.as_str(), value.as_str()?))
        })
    }
}

/// ARM parameter value types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ParameterType {
    String,
    SecureString,
    Int,
    Bool,
    Array,
    Object,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields)]
#[builder(on(String, into))]
pub struct ParameterMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One entry in the template's `parameters` map, in ARM wire shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ParameterSpec {
    #[serde(rename = "type")]
    pub ty: ParameterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ParameterMetadata>,
}

/// One entry in the template's `outputs` map. The value is an ARM expression
/// string, e.g. `[reference('web1').defaultHostName]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, bon::Builder)]
#[serde(deny_unknown_fields)]
#[builder(on(String, into))]
pub struct OutputSpec {
    #[serde(rename = "type")]
    pub ty: ParameterType,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn declaration_round_trips_through_serde() {
        let decl = ResourceDeclaration::builder()
            .kind(ResourceKind::AppService)
            .logical_name("web1".parse().unwrap())
            .configuration(BTreeMap::from([(
                "plan".to_string(),
                json!("plan1"),
            )]))
            .build();

        let wire = serde_json::to_value(&decl).unwrap();
        assert_eq!(
            wire,
            json!({
                "kind": "appService",
                "logicalName": "web1",
                "configuration": { "plan": "plan1" }
            })
        );
        let back: ResourceDeclaration = serde_json::from_value(wire).unwrap();
        assert_eq!(back, decl);
    }

    #[test]
    fn reference_targets_follow_the_kind_spec() {
        let catalog = bragi_catalog::Catalog::builtin();
        let spec = catalog.spec(ResourceKind::AppService).unwrap();
        let decl = ResourceDeclaration::builder()
            .kind(ResourceKind::AppService)
            .logical_name("web1".parse().unwrap())
            .configuration(BTreeMap::from([
                ("plan".to_string(), json!("plan1")),
                ("httpsOnly".to_string(), json!(true)),
            ]))
            .build();

        let targets: Vec<_> = decl.reference_targets(spec).collect();
        assert_eq!(targets, vec![("plan", "plan1")]);
    }

    #[test]
    fn parameter_spec_serializes_in_arm_shape() {
        let spec = ParameterSpec::builder()
            .ty(ParameterType::SecureString)
            .metadata(ParameterMetadata::builder().description("admin password").build())
            .build();
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "type": "securestring",
                "metadata": { "description": "admin password" }
            })
        );
    }
}
