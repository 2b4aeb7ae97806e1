//! The blueprint file format: the JSON surface callers hand to the CLI. A
//! blueprint is the persisted form of one builder session; loading one
//! re-applies the same checks interactive additions go through.

use std::{collections::BTreeMap, path::Path};

use bragi_builder::TemplateBuilder;
use bragi_catalog::{Catalog, ResourceKind};
use bragi_template::{LogicalName, OutputName, OutputSpec, ParameterName, ParameterSpec};
use miette::{Context as _, IntoDiagnostic as _, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{MapPreventDuplicates, serde_as};

#[serde_as]
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Blueprint {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[serde_as(as = "MapPreventDuplicates<_, _>")]
    pub parameters: BTreeMap<ParameterName, ParameterSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<BlueprintResource>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[serde_as(as = "MapPreventDuplicates<_, _>")]
    pub outputs: BTreeMap<OutputName, OutputSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlueprintResource {
    pub kind: ResourceKind,
    pub name: LogicalName,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, Value>,
}

impl Blueprint {
    pub fn load(path: &Path) -> Result<Blueprint> {
        tracing::debug!(path = %path.display(), "loading blueprint");
        let text = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read blueprint `{}`", path.display()))?;
        serde_json::from_str(&text)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to parse blueprint `{}`", path.display()))
    }

    /// Feeds the blueprint into a fresh builder. Duplicate logical names and
    /// malformed parameter declarations are rejected here; everything
    /// cross-resource waits for `finalize`.
    pub fn into_builder(self, catalog: &Catalog) -> Result<TemplateBuilder<'_>> {
        let mut builder = TemplateBuilder::new(catalog);
        for resource in self.resources {
            builder
                .add_resource(
                    bragi_template::ResourceDeclaration::builder()
                        .kind(resource.kind)
                        .logical_name(resource.name)
                        .configuration(resource.config)
                        .build(),
                )
                .map_err(miette::Report::new)?;
        }
        for (name, spec) in self.parameters {
            builder
                .declare_parameter(name, spec)
                .map_err(miette::Report::new)?;
        }
        for (name, spec) in self.outputs {
            builder.add_output(name, spec).map_err(miette::Report::new)?;
        }
        Ok(builder)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_the_documented_shape() {
        let blueprint: Blueprint = serde_json::from_value(json!({
            "parameters": {
                "adminLogin": { "type": "string" }
            },
            "resources": [
                { "kind": "appServicePlan", "name": "plan1", "config": { "sku": "B1" } },
                { "kind": "appService", "name": "web1", "config": { "plan": "plan1" } }
            ],
            "outputs": {
                "siteName": { "type": "string", "value": "[reference('web1').name]" }
            }
        }))
        .unwrap();

        assert_eq!(blueprint.resources.len(), 2);
        let builder = blueprint.into_builder(Catalog::builtin()).unwrap();
        assert!(builder.finalize().is_ok());
    }

    #[test]
    fn rejects_unknown_top_level_keys() {
        let result = serde_json::from_value::<Blueprint>(json!({
            "variables": {}
        }));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_duplicate_parameter_keys() {
        let text = r#"{
            "parameters": {
                "env": { "type": "string" },
                "env": { "type": "string" }
            }
        }"#;
        assert!(serde_json::from_str::<Blueprint>(text).is_err());
    }

    #[test]
    fn duplicate_resource_names_fail_at_builder_construction() {
        let blueprint: Blueprint = serde_json::from_value(json!({
            "resources": [
                { "kind": "storageAccount", "name": "logs", "config": { "sku": "Standard_LRS" } },
                { "kind": "storageAccount", "name": "logs", "config": { "sku": "Standard_GRS" } }
            ]
        }))
        .unwrap();
        assert!(blueprint.into_builder(Catalog::builtin()).is_err());
    }
}
