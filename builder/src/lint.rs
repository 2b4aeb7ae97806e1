//! Non-fatal review findings over a builder's declarations and parameters.
//! Lints never block `finalize`; the CLI can escalate them with `--deny`.

use bragi_template::{LogicalName, ParameterName, ParameterType};
use miette::Diagnostic;
use thiserror::Error;

use crate::{TemplateBuilder, params};

#[derive(Clone, Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum BuilderLint {
    #[error("parameter `{name}` is declared but never referenced")]
    #[diagnostic(
        code(builder::unused_parameter),
        severity(Warning),
        help("Remove the parameter or reference it with [parameters('{name}')].")
    )]
    UnusedParameter { name: ParameterName },

    #[error("secure parameter `{name}` carries a default value")]
    #[diagnostic(
        code(builder::secure_default),
        severity(Warning),
        help("Defaults for securestring parameters end up in template history; supply the value at deployment time.")
    )]
    SecureDefault { name: ParameterName },

    #[error("resource `{resource}`: field `{field}` holds a literal secret")]
    #[diagnostic(
        code(builder::password_literal),
        severity(Warning),
        help("Use a securestring parameter expression instead of a literal password.")
    )]
    PasswordLiteral { resource: LogicalName, field: String },
}

pub(crate) fn lint_builder(builder: &TemplateBuilder<'_>) -> Vec<BuilderLint> {
    let mut lints = Vec::new();

    let referenced = params::all_referenced_parameters(builder);
    for (name, spec) in builder.parameters() {
        if !referenced.contains(name.as_str()) {
            lints.push(BuilderLint::UnusedParameter { name: name.clone() });
        }
        if spec.ty == ParameterType::SecureString && spec.default_value.is_some() {
            lints.push(BuilderLint::SecureDefault { name: name.clone() });
        }
    }

    for declaration in builder.declarations() {
        for (field, value) in &declaration.configuration {
            if !field.to_ascii_lowercase().contains("password") {
                continue;
            }
            let Some(text) = value.as_str() else {
                continue;
            };
            if !text.contains("parameters('") {
                lints.push(BuilderLint::PasswordLiteral {
                    resource: declaration.logical_name.clone(),
                    field: field.clone(),
                });
            }
        }
    }

    lints
}
