//! Finalize steps 6 through 8: `dependsOn` materialization, parameter and
//! output aggregation, and document assembly.
//!
//! `dependsOn` carries direct references only: ARM implies transitive
//! dependencies, so a chain A -> B -> C gives A an edge to B and nothing
//! else. Every collection is emitted in sorted or topological order, which
//! together with canonical serialization makes the output reproducible.

use std::collections::{BTreeMap, BTreeSet};

use bragi_catalog::{FieldTarget, FieldType};
use bragi_template::{TemplateDocument, TemplateResource};
use serde_json::{Map, Value, json};

use crate::{TemplateBuilder, schema::LOCATION_FIELD};

const DEFAULT_LOCATION: &str = "[resourceGroup().location]";

/// ARM resourceId expression. Child resource names contribute one argument
/// per path segment.
fn resource_id(azure_type: &str, deployed_name: &str) -> String {
    let segments = deployed_name
        .split('/')
        .map(|segment| format!("'{segment}'"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[resourceId('{azure_type}', {segments})]")
}

pub(crate) fn emit_document(
    builder: &TemplateBuilder<'_>,
    order: &[usize],
    deployed: &[String],
) -> TemplateDocument {
    let catalog = builder.catalog();
    let declarations = builder.declarations();
    let by_name: BTreeMap<&str, usize> = declarations
        .iter()
        .enumerate()
        .map(|(index, decl)| (decl.logical_name.as_str(), index))
        .collect();

    let mut document = TemplateDocument::empty();
    document.parameters = builder.parameters().clone();
    document.outputs = builder.outputs().clone();

    for declaration in declarations {
        let index = by_name[declaration.logical_name.as_str()];
        let spec = catalog
            .spec(declaration.kind)
            .expect("kinds checked during validation");
        document.variables.insert(
            format!("{}Id", declaration.logical_name),
            resource_id(spec.azure_type, &deployed[index]),
        );
    }

    for &index in order {
        let declaration = &declarations[index];
        let spec = catalog
            .spec(declaration.kind)
            .expect("kinds checked during validation");

        let location = declaration
            .configuration
            .get(LOCATION_FIELD)
            .and_then(|value| value.as_str())
            .unwrap_or(DEFAULT_LOCATION)
            .to_string();

        let mut properties = match &spec.default_properties {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        let mut kind_tag = None;
        let mut sku_name = None;
        let mut sku_capacity = None;
        let mut depends_on = BTreeSet::new();

        for (key, value) in &declaration.configuration {
            if key == LOCATION_FIELD {
                continue;
            }
            let Some(field) = spec.field(key) else {
                continue;
            };
            let emitted = if let FieldType::Reference(_) = field.ty {
                let target_name = value.as_str().expect("references validated");
                let target = *by_name
                    .get(target_name)
                    .expect("references resolved during validation");
                let target_spec = catalog
                    .spec(declarations[target].kind)
                    .expect("kinds checked during validation");
                depends_on.insert(resource_id(target_spec.azure_type, &deployed[target]));
                json!(resource_id(target_spec.azure_type, &deployed[target]))
            } else {
                value.clone()
            };
            match field.target {
                FieldTarget::Sku => sku_name = emitted.as_str().map(str::to_string),
                FieldTarget::SkuCapacity => sku_capacity = Some(emitted),
                FieldTarget::KindTag => kind_tag = emitted.as_str().map(str::to_string),
                FieldTarget::Property(property) => {
                    properties.insert(property.to_string(), emitted);
                }
                // parent is expressed through the compound name and dependsOn
                FieldTarget::Parent => {}
            }
        }

        let sku = sku_name.map(|name| {
            let mut sku = Map::new();
            sku.insert("name".to_string(), json!(name));
            if let Some(capacity) = sku_capacity {
                sku.insert("capacity".to_string(), capacity);
            }
            Value::Object(sku)
        });

        document.resources.push(TemplateResource {
            resource_type: spec.azure_type.to_string(),
            api_version: spec.api_version.to_string(),
            name: deployed[index].clone(),
            location,
            kind: kind_tag,
            sku,
            properties: Value::Object(properties),
            depends_on: depends_on.into_iter().collect(),
        });
    }

    document
}
