//! The template graph builder: a deterministic, side-effect-free translation
//! from an ordered list of resource declarations into a validated ARM
//! template document.
//!
//! One builder per wizard session. `add_resource` only appends and catches
//! local mistakes (duplicate names, unknown kinds); everything that involves
//! more than one declaration waits for [`TemplateBuilder::finalize`], which
//! runs the full pipeline: schema validation, reference resolution, cycle
//! detection, stable topological ordering, deployed-name synthesis, and
//! emission. Validation problems are accumulated across all declarations and
//! reported together; only graph-level failures (cycles, name synthesis) are
//! fatal on their own.

mod emit;
mod graph;
pub mod lint;
mod names;
mod params;
mod refs;
mod schema;

use std::collections::BTreeMap;

use bragi_catalog::{Catalog, ResourceKind};
use bragi_template::{
    LogicalName, OutputName, OutputSpec, ParameterName, ParameterSpec, ResourceDeclaration,
    TemplateDocument,
};
use miette::Diagnostic;
use thiserror::Error;

pub use lint::BuilderLint;

/// Errors raised immediately by the mutating operations. These are local to
/// the single offending input; the caller rejects it and keeps the rest.
#[derive(Clone, Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum AddError {
    #[error("resource kind `{kind}` is not in the catalog")]
    #[diagnostic(code(builder::unknown_resource_kind))]
    UnknownResourceKind { kind: ResourceKind },

    #[error("logical name `{name}` is already declared")]
    #[diagnostic(
        code(builder::duplicate_name),
        help("Logical names are unique within a template; pick another name or edit the existing declaration.")
    )]
    DuplicateName { name: LogicalName },

    #[error("parameter `{name}` is already declared")]
    #[diagnostic(code(builder::duplicate_parameter))]
    DuplicateParameter { name: ParameterName },

    #[error("output `{name}` is already declared")]
    #[diagnostic(code(builder::duplicate_output))]
    DuplicateOutput { name: OutputName },

    #[error("parameter `{name}` has a default value outside its allowed values")]
    #[diagnostic(code(builder::default_not_allowed))]
    DefaultNotAllowed { name: ParameterName },

    #[error("resource `{name}` is not declared")]
    #[diagnostic(code(builder::unknown_resource))]
    UnknownResource { name: String },

    #[error(
        "resource `{name}` is still referenced by {}",
        .referrers
            .iter()
            .map(|r| format!("`{r}`"))
            .collect::<Vec<_>>()
            .join(", ")
    )]
    #[diagnostic(
        code(builder::still_referenced),
        help("Detach or remove the referencing declarations first.")
    )]
    StillReferenced {
        name: LogicalName,
        referrers: Vec<LogicalName>,
    },
}

/// Recoverable per-field problems found during `finalize`. Accumulated and
/// reported in one batch so the caller can surface every error at once.
#[derive(Clone, Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum ValidationProblem {
    #[error("resource `{logical_name}`: field `{field}`: {reason}")]
    #[diagnostic(code(builder::schema_violation))]
    SchemaViolation {
        logical_name: LogicalName,
        field: String,
        reason: String,
    },

    #[error("resource `{from}`: field `{field}` references unknown resource `{to}`")]
    #[diagnostic(code(builder::unresolved_reference))]
    UnresolvedReference {
        from: LogicalName,
        field: String,
        to: String,
    },

    #[error(
        "resource `{from}`: field `{field}` references `{to}` of kind {found}, expected {expected}"
    )]
    #[diagnostic(code(builder::incompatible_reference))]
    IncompatibleReference {
        from: LogicalName,
        field: String,
        to: LogicalName,
        expected: String,
        found: ResourceKind,
    },

    #[error("resource `{resource}` references undeclared parameter `{parameter}`")]
    #[diagnostic(
        code(builder::undeclared_parameter),
        help("Declare the parameter before finalizing (blueprint `parameters` section).")
    )]
    UndeclaredParameter {
        resource: LogicalName,
        parameter: String,
    },

    #[error("output `{output}` references undeclared parameter `{parameter}`")]
    #[diagnostic(code(builder::undeclared_output_parameter))]
    UndeclaredOutputParameter {
        output: OutputName,
        parameter: String,
    },
}

/// Failure result of [`TemplateBuilder::finalize`]. `Validation` carries the
/// full batch of recoverable problems; the remaining variants are structural
/// and invalidate the graph as a whole.
#[derive(Clone, Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum FinalizeError {
    #[error("template validation failed with {} problem(s)", problems.len())]
    #[diagnostic(code(builder::validation))]
    Validation {
        #[related]
        problems: Vec<ValidationProblem>,
    },

    #[error(
        "dependency cycle: {}",
        .cycle
            .iter()
            .map(|name| name.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    )]
    #[diagnostic(code(builder::dependency_cycle))]
    DependencyCycle { cycle: Vec<LogicalName> },

    #[error(
        "deployed name `{synthesized}` for `{logical_name}` exceeds the {max_len}-character limit \
         for {kind}"
    )]
    #[diagnostic(
        code(builder::name_too_long),
        help("Deployed names are never truncated; shorten the logical name.")
    )]
    NameTooLong {
        logical_name: LogicalName,
        kind: ResourceKind,
        synthesized: String,
        max_len: usize,
    },

    #[error(
        "deployed name `{synthesized}` for `{logical_name}` is shorter than the {min_len}-character \
         minimum for {kind}"
    )]
    #[diagnostic(code(builder::name_too_short))]
    NameTooShort {
        logical_name: LogicalName,
        kind: ResourceKind,
        synthesized: String,
        min_len: usize,
    },

    #[error("logical name `{logical_name}` leaves no valid characters for a {kind} name")]
    #[diagnostic(
        code(builder::invalid_name_characters),
        help("Deployed names keep only the characters the provider allows; use letters and digits.")
    )]
    InvalidNameCharacters {
        logical_name: LogicalName,
        kind: ResourceKind,
    },

    #[error("resources `{first}` and `{second}` would both deploy as `{synthesized}`")]
    #[diagnostic(
        code(builder::name_collision),
        help("Deployed names fold to the provider's character set; pick logical names that stay distinct after folding.")
    )]
    NameCollision {
        first: LogicalName,
        second: LogicalName,
        synthesized: String,
    },
}

/// Accumulates one wizard session's declarations and turns them into a
/// [`TemplateDocument`]. Pure and synchronous: no I/O, no shared state.
#[derive(Clone, Debug)]
pub struct TemplateBuilder<'c> {
    catalog: &'c Catalog,
    declarations: Vec<ResourceDeclaration>,
    parameters: BTreeMap<ParameterName, ParameterSpec>,
    outputs: BTreeMap<OutputName, OutputSpec>,
}

impl<'c> TemplateBuilder<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        TemplateBuilder {
            catalog,
            declarations: Vec::new(),
            parameters: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Rehydrates a builder from a persisted declaration list, re-applying
    /// the same immediate checks `add_resource` performs.
    pub fn from_declarations(
        catalog: &'c Catalog,
        declarations: impl IntoIterator<Item = ResourceDeclaration>,
    ) -> Result<Self, AddError> {
        let mut builder = TemplateBuilder::new(catalog);
        for declaration in declarations {
            builder.add_resource(declaration)?;
        }
        Ok(builder)
    }

    /// Appends one declaration. Cross-references are deliberately not checked
    /// here: the wizard allows adding resources in any order, so forward
    /// references stay legal until `finalize`.
    pub fn add_resource(&mut self, declaration: ResourceDeclaration) -> Result<(), AddError> {
        if self.catalog.spec(declaration.kind).is_none() {
            return Err(AddError::UnknownResourceKind {
                kind: declaration.kind,
            });
        }
        if self.declaration(declaration.logical_name.as_str()).is_some() {
            return Err(AddError::DuplicateName {
                name: declaration.logical_name,
            });
        }
        self.declarations.push(declaration);
        Ok(())
    }

    pub fn declare_parameter(
        &mut self,
        name: ParameterName,
        spec: ParameterSpec,
    ) -> Result<(), AddError> {
        if self.parameters.contains_key(&name) {
            return Err(AddError::DuplicateParameter { name });
        }
        if let (Some(default), Some(allowed)) = (&spec.default_value, &spec.allowed_values)
            && !allowed.contains(default)
        {
            return Err(AddError::DefaultNotAllowed { name });
        }
        self.parameters.insert(name, spec);
        Ok(())
    }

    pub fn add_output(&mut self, name: OutputName, spec: OutputSpec) -> Result<(), AddError> {
        if self.outputs.contains_key(&name) {
            return Err(AddError::DuplicateOutput { name });
        }
        self.outputs.insert(name, spec);
        Ok(())
    }

    /// Renames a declaration. Rejected while other declarations reference the
    /// old name: the builder never rewrites user configuration behind the
    /// caller's back.
    pub fn rename_resource(&mut self, from: &str, to: LogicalName) -> Result<(), AddError> {
        let Some(index) = self.declaration_index(from) else {
            return Err(AddError::UnknownResource {
                name: from.to_string(),
            });
        };
        if from != to.as_str() && self.declaration(to.as_str()).is_some() {
            return Err(AddError::DuplicateName { name: to });
        }
        let referrers = self.referrers_of(from);
        if !referrers.is_empty() {
            return Err(AddError::StillReferenced {
                name: self.declarations[index].logical_name.clone(),
                referrers,
            });
        }
        self.declarations[index].logical_name = to;
        Ok(())
    }

    /// Removes a declaration, with the same still-referenced policy as
    /// [`TemplateBuilder::rename_resource`].
    pub fn remove_resource(&mut self, name: &str) -> Result<ResourceDeclaration, AddError> {
        let Some(index) = self.declaration_index(name) else {
            return Err(AddError::UnknownResource {
                name: name.to_string(),
            });
        };
        let referrers = self.referrers_of(name);
        if !referrers.is_empty() {
            return Err(AddError::StillReferenced {
                name: self.declarations[index].logical_name.clone(),
                referrers,
            });
        }
        Ok(self.declarations.remove(index))
    }

    pub fn declarations(&self) -> &[ResourceDeclaration] {
        &self.declarations
    }

    pub fn parameters(&self) -> &BTreeMap<ParameterName, ParameterSpec> {
        &self.parameters
    }

    pub fn outputs(&self) -> &BTreeMap<OutputName, OutputSpec> {
        &self.outputs
    }

    pub fn declaration(&self, name: &str) -> Option<&ResourceDeclaration> {
        self.declaration_index(name)
            .map(|index| &self.declarations[index])
    }

    /// Runs the full validation and emission pipeline. Deterministic: the
    /// same declaration list always yields a byte-identical document.
    pub fn finalize(&self) -> Result<TemplateDocument, FinalizeError> {
        let mut problems = Vec::new();
        schema::validate_declarations(self.catalog, &self.declarations, &mut problems);
        let edges = refs::resolve_references(self.catalog, &self.declarations, &mut problems);
        params::check_parameter_references(self, &mut problems);
        if !problems.is_empty() {
            tracing::debug!(problems = problems.len(), "finalize rejected declarations");
            return Err(FinalizeError::Validation { problems });
        }

        let order = graph::topo_order(self.declarations.len(), &edges).map_err(|err| {
            FinalizeError::DependencyCycle {
                cycle: err
                    .cycle
                    .into_iter()
                    .map(|index| self.declarations[index].logical_name.clone())
                    .collect(),
            }
        })?;
        let deployed = names::synthesize_all(self.catalog, &self.declarations)?;

        tracing::debug!(
            resources = self.declarations.len(),
            parameters = self.parameters.len(),
            "emitting template document"
        );
        Ok(emit::emit_document(self, &order, &deployed))
    }

    /// Non-fatal review findings. Independent of `finalize`; safe to call on
    /// an invalid declaration list.
    pub fn lint(&self) -> Vec<BuilderLint> {
        lint::lint_builder(self)
    }

    pub(crate) fn catalog(&self) -> &Catalog {
        self.catalog
    }

    fn declaration_index(&self, name: &str) -> Option<usize> {
        self.declarations
            .iter()
            .position(|decl| decl.logical_name.as_str() == name)
    }

    /// Logical names of declarations whose reference fields point at `name`.
    fn referrers_of(&self, name: &str) -> Vec<LogicalName> {
        self.declarations
            .iter()
            .filter(|decl| {
                let Some(spec) = self.catalog.spec(decl.kind) else {
                    return false;
                };
                decl.logical_name.as_str() != name
                    && decl.reference_targets(spec).any(|(_, to)| to == name)
            })
            .map(|decl| decl.logical_name.clone())
            .collect()
    }
}
