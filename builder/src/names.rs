//! Finalize step 5: deployed-name synthesis.
//!
//! A deployed name is the logical name folded into the kind's character set
//! (lowercasing where the provider demands it, stripping everything else).
//! Names are never truncated: truncation would drop caller-chosen
//! uniqueness-bearing characters, so an over-long name is a fatal error
//! instead. Child resource types compose `parent/child`.

use std::collections::BTreeMap;

use bragi_catalog::Catalog;
use bragi_template::ResourceDeclaration;

use crate::FinalizeError;

/// Synthesizes the deployed name of every declaration, by declaration index.
/// Runs after reference validation and cycle detection, so parent references
/// are known to resolve and parent chains are finite.
pub(crate) fn synthesize_all(
    catalog: &Catalog,
    declarations: &[ResourceDeclaration],
) -> Result<Vec<String>, FinalizeError> {
    let mut base = Vec::with_capacity(declarations.len());
    for declaration in declarations {
        let spec = catalog
            .spec(declaration.kind)
            .expect("kinds checked during validation");
        let rule = spec.name_rule;
        let logical = declaration.logical_name.as_str();

        let folded: String = logical.chars().filter_map(|ch| rule.charset.fold(ch)).collect();
        if folded.is_empty() {
            return Err(FinalizeError::InvalidNameCharacters {
                logical_name: declaration.logical_name.clone(),
                kind: declaration.kind,
            });
        }
        if folded.len() > rule.max_len {
            return Err(FinalizeError::NameTooLong {
                logical_name: declaration.logical_name.clone(),
                kind: declaration.kind,
                synthesized: folded,
                max_len: rule.max_len,
            });
        }
        if folded.len() < rule.min_len {
            return Err(FinalizeError::NameTooShort {
                logical_name: declaration.logical_name.clone(),
                kind: declaration.kind,
                synthesized: folded,
                min_len: rule.min_len,
            });
        }
        base.push(folded);
    }

    let by_name: BTreeMap<&str, usize> = declarations
        .iter()
        .enumerate()
        .map(|(index, decl)| (decl.logical_name.as_str(), index))
        .collect();

    // Compose parent/child names. Parent chains are acyclic here (cycle
    // detection already passed), so plain recursion terminates.
    fn composed(
        index: usize,
        catalog: &Catalog,
        declarations: &[ResourceDeclaration],
        by_name: &BTreeMap<&str, usize>,
        base: &[String],
        memo: &mut Vec<Option<String>>,
    ) -> String {
        if let Some(name) = &memo[index] {
            return name.clone();
        }
        let declaration = &declarations[index];
        let spec = catalog
            .spec(declaration.kind)
            .expect("kinds checked during validation");
        let name = match spec.parent_field.and_then(|field| {
            declaration
                .configuration
                .get(field)
                .and_then(|value| value.as_str())
        }) {
            Some(parent) => {
                let parent_index = *by_name
                    .get(parent)
                    .expect("parent reference resolved during validation");
                let parent_name =
                    composed(parent_index, catalog, declarations, by_name, base, memo);
                format!("{parent_name}/{}", base[index])
            }
            None => base[index].clone(),
        };
        memo[index] = Some(name.clone());
        name
    }

    let mut memo = vec![None; declarations.len()];
    let mut deployed = Vec::with_capacity(declarations.len());
    for index in 0..declarations.len() {
        deployed.push(composed(
            index,
            catalog,
            declarations,
            &by_name,
            &base,
            &mut memo,
        ));
    }

    // Collision check: same provider type, same deployed name.
    let mut seen: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for (index, declaration) in declarations.iter().enumerate() {
        let spec = catalog
            .spec(declaration.kind)
            .expect("kinds checked during validation");
        if let Some(&first) = seen.get(&(spec.azure_type, deployed[index].as_str())) {
            return Err(FinalizeError::NameCollision {
                first: declarations[first].logical_name.clone(),
                second: declaration.logical_name.clone(),
                synthesized: deployed[index].clone(),
            });
        }
        seen.insert((spec.azure_type, deployed[index].as_str()), index);
    }

    Ok(deployed)
}
