use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest as _, Sha256};

use crate::{OutputName, OutputSpec, ParameterName, ParameterSpec};

pub const ARM_SCHEMA: &str =
    "https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#";
pub const CONTENT_VERSION: &str = "1.0.0.0";

/// One emitted resource object, in ARM wire shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub api_version: String,
    /// Synthesized deployed name (`parent/child` for child resource types).
    pub name: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<Value>,
    pub properties: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

/// The finalized template. A pure value: once emitted it is never mutated in
/// place, and regenerating from the same declaration list reproduces it
/// byte for byte.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDocument {
    #[serde(rename = "$schema")]
    pub schema: String,
    pub content_version: String,
    pub parameters: BTreeMap<ParameterName, ParameterSpec>,
    pub variables: BTreeMap<String, String>,
    pub resources: Vec<TemplateResource>,
    pub outputs: BTreeMap<OutputName, OutputSpec>,
}

impl TemplateDocument {
    pub fn empty() -> Self {
        TemplateDocument {
            schema: ARM_SCHEMA.to_string(),
            content_version: CONTENT_VERSION.to_string(),
            parameters: BTreeMap::new(),
            variables: BTreeMap::new(),
            resources: Vec::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Canonical JSON value: object keys sorted at every level. Resource
    /// order is semantic and preserved.
    pub fn to_json(&self) -> Value {
        canonical_json(&serde_json::to_value(self).expect("document serializes"))
    }

    pub fn to_json_string_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).expect("document serializes")
    }

    /// SHA-256 over the compact canonical serialization. Equal digests mean
    /// byte-identical templates, which makes regeneration after a wizard
    /// edit cheap to detect.
    pub fn digest(&self) -> TemplateDigest {
        let compact = serde_json::to_string(&self.to_json()).expect("document serializes");
        let mut hasher = Sha256::new();
        hasher.update(compact.as_bytes());
        TemplateDigest(hasher.finalize().into())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateDigest([u8; 32]);

impl TemplateDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for TemplateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TemplateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TemplateDigest({self})")
    }
}

/// Recursively sorts object keys. Arrays keep their order.
pub fn canonical_json(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::new();
            for k in keys {
                out.insert(
                    k.clone(),
                    canonical_json(map.get(k.as_str()).expect("key exists")),
                );
            }
            Value::Object(out)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(canonical_json).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_document_has_the_arm_top_level_shape() {
        let doc = TemplateDocument::empty();
        let wire = doc.to_json();
        assert_eq!(wire["$schema"], json!(ARM_SCHEMA));
        assert_eq!(wire["contentVersion"], json!("1.0.0.0"));
        assert!(wire["resources"].as_array().unwrap().is_empty());
        assert!(wire["parameters"].as_object().unwrap().is_empty());
        assert!(wire["outputs"].as_object().unwrap().is_empty());
    }

    #[test]
    fn canonical_json_sorts_nested_keys_and_keeps_array_order() {
        let value = json!({
            "b": { "z": 1, "a": 2 },
            "a": [{ "y": 1, "x": 2 }, 3]
        });
        let canonical = canonical_json(&value);
        let text = serde_json::to_string(&canonical).unwrap();
        assert_eq!(text, r#"{"a":[{"x":2,"y":1},3],"b":{"a":2,"z":1}}"#);
    }

    #[test]
    fn digest_is_stable_and_sensitive_to_content() {
        let doc = TemplateDocument::empty();
        assert_eq!(doc.digest(), doc.digest());

        let mut other = TemplateDocument::empty();
        other.variables.insert("web1Id".to_string(), "x".to_string());
        assert_ne!(doc.digest(), other.digest());
    }

    #[test]
    fn depends_on_serializes_camel_case_and_skips_when_empty() {
        let resource = TemplateResource {
            resource_type: "Microsoft.Web/sites".to_string(),
            api_version: "2021-02-01".to_string(),
            name: "web1".to_string(),
            location: "[resourceGroup().location]".to_string(),
            kind: None,
            sku: None,
            properties: json!({}),
            depends_on: vec!["[resourceId('Microsoft.Web/serverfarms', 'plan1')]".to_string()],
        };
        let wire = serde_json::to_value(&resource).unwrap();
        assert!(wire.get("dependsOn").is_some());
        assert!(wire.get("kind").is_none());

        let bare = TemplateResource {
            depends_on: Vec::new(),
            ..resource
        };
        let wire = serde_json::to_value(&bare).unwrap();
        assert!(wire.get("dependsOn").is_none());
    }
}
