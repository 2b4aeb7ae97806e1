//! Structural validation of serialized templates: the checks a deployment
//! submitter runs before handing a document to the cloud API. Works on plain
//! JSON so externally authored templates can be checked too.

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum TemplateLint {
    #[error("missing required top-level field `{field}`")]
    #[diagnostic(code(template::missing_field))]
    MissingTopLevelField { field: &'static str },

    #[error("`resources` must be an array")]
    #[diagnostic(code(template::resources_not_array))]
    ResourcesNotArray,

    #[error("resource {index} must be an object")]
    #[diagnostic(code(template::resource_not_object))]
    ResourceNotObject { index: usize },

    #[error("resource {index} is missing required field `{field}`")]
    #[diagnostic(code(template::resource_missing_field))]
    ResourceMissingField { index: usize, field: &'static str },

    #[error("`parameters` must be an object")]
    #[diagnostic(code(template::parameters_not_object))]
    ParametersNotObject,

    #[error("`outputs` must be an object")]
    #[diagnostic(code(template::outputs_not_object))]
    OutputsNotObject,

    #[error("`$schema` does not look like an ARM deployment template schema: {url}")]
    #[diagnostic(
        code(template::suspect_schema_url),
        severity(Warning),
        help("Expected a URL under https://schema.management.azure.com/.")
    )]
    SuspectSchemaUrl { url: String },
}

impl TemplateLint {
    pub fn is_error(&self) -> bool {
        !matches!(
            self.severity(),
            Some(miette::Severity::Warning | miette::Severity::Advice)
        )
    }
}

/// Checks the ARM top-level shape of a serialized template. Returns every
/// finding; the document is submittable when none of them [`TemplateLint::is_error`].
pub fn check_document(template: &Value) -> Vec<TemplateLint> {
    let mut lints = Vec::new();

    for field in ["$schema", "contentVersion", "resources"] {
        if template.get(field).is_none() {
            lints.push(TemplateLint::MissingTopLevelField { field });
        }
    }

    if let Some(schema) = template.get("$schema").and_then(|v| v.as_str())
        && !schema.starts_with("https://schema.management.azure.com/")
    {
        lints.push(TemplateLint::SuspectSchemaUrl {
            url: schema.to_string(),
        });
    }

    match template.get("resources") {
        None => {}
        Some(Value::Array(resources)) => {
            for (index, resource) in resources.iter().enumerate() {
                let Value::Object(obj) = resource else {
                    lints.push(TemplateLint::ResourceNotObject { index });
                    continue;
                };
                for field in ["type", "apiVersion", "name"] {
                    if !obj.contains_key(field) {
                        lints.push(TemplateLint::ResourceMissingField { index, field });
                    }
                }
            }
        }
        Some(_) => lints.push(TemplateLint::ResourcesNotArray),
    }

    if let Some(parameters) = template.get("parameters")
        && !parameters.is_object()
    {
        lints.push(TemplateLint::ParametersNotObject);
    }
    if let Some(outputs) = template.get("outputs")
        && !outputs.is_object()
    {
        lints.push(TemplateLint::OutputsNotObject);
    }

    lints
}
