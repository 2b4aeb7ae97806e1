//! Finalize step 2: resolve reference fields to their target declarations and
//! check kind compatibility. Produces the edge list the graph steps run on;
//! edges are only created for fully resolved, compatible references.

use std::collections::BTreeMap;

use bragi_catalog::{Catalog, FieldType};
use bragi_template::ResourceDeclaration;

use crate::ValidationProblem;

/// `from` references `to`, both indices into the declaration list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Edge {
    pub from: usize,
    pub to: usize,
}

pub(crate) fn resolve_references(
    catalog: &Catalog,
    declarations: &[ResourceDeclaration],
    problems: &mut Vec<ValidationProblem>,
) -> Vec<Edge> {
    let by_name: BTreeMap<&str, usize> = declarations
        .iter()
        .enumerate()
        .map(|(index, decl)| (decl.logical_name.as_str(), index))
        .collect();

    let mut edges = Vec::new();
    for (from, declaration) in declarations.iter().enumerate() {
        let Some(spec) = catalog.spec(declaration.kind) else {
            continue;
        };
        for (field, target_name) in declaration.reference_targets(spec) {
            let Some(&to) = by_name.get(target_name) else {
                problems.push(ValidationProblem::UnresolvedReference {
                    from: declaration.logical_name.clone(),
                    field: field.to_string(),
                    to: target_name.to_string(),
                });
                continue;
            };
            let target = &declarations[to];
            let allowed = match spec.field(field).map(|f| f.ty) {
                Some(FieldType::Reference(kinds)) => kinds,
                // reference_targets only yields reference fields
                _ => continue,
            };
            if !allowed.contains(&target.kind) {
                problems.push(ValidationProblem::IncompatibleReference {
                    from: declaration.logical_name.clone(),
                    field: field.to_string(),
                    to: target.logical_name.clone(),
                    expected: allowed
                        .iter()
                        .map(|kind| kind.as_str())
                        .collect::<Vec<_>>()
                        .join(" or "),
                    found: target.kind,
                });
                continue;
            }
            // Self-references become self-loops and surface as a cycle.
            edges.push(Edge { from, to });
        }
    }
    edges
}
