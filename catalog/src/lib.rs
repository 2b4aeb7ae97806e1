//! The resource-kind catalog: a read-only lookup table describing every Azure
//! resource kind the template builder understands.
//!
//! The catalog is data, not code. Each [`KindSpec`] carries the Azure
//! `type`/`apiVersion` literal pair, the field schema (required fields, value
//! types, allowed SKU sets, reference compatibility), the deployed-name rule,
//! and the default property fragment merged into every emitted resource.
//! Supporting a new resource kind is a change to [`Catalog::builtin`], not to
//! the builder.

mod kinds;

use std::{collections::BTreeMap, fmt, str::FromStr, sync::OnceLock};

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("unknown resource kind `{kind}`")]
    #[diagnostic(
        code(catalog::unknown_kind),
        help("Supported kinds: {supported}.")
    )]
    UnknownKind { kind: String, supported: String },

    #[error("resource kind `{kind}` is declared twice in the catalog")]
    #[diagnostic(code(catalog::duplicate_kind))]
    DuplicateKind { kind: ResourceKind },

    #[error("field `{field}` of `{kind}` references kind `{target}` absent from the catalog")]
    #[diagnostic(code(catalog::dangling_reference_target))]
    DanglingReferenceTarget {
        kind: ResourceKind,
        field: &'static str,
        target: ResourceKind,
    },

    #[error("parent field `{field}` of `{kind}` is not a reference field")]
    #[diagnostic(code(catalog::invalid_parent_field))]
    InvalidParentField {
        kind: ResourceKind,
        field: &'static str,
    },
}

/// Closed set of supported resource kinds. Wire tags are camelCase, matching
/// the blueprint format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub enum ResourceKind {
    AppServicePlan,
    AppService,
    StorageAccount,
    SqlServer,
    SqlDatabase,
    VirtualNetwork,
    Subnet,
    NetworkSecurityGroup,
    PublicIp,
    KeyVault,
    RedisCache,
}

impl ResourceKind {
    pub const ALL: &'static [ResourceKind] = &[
        ResourceKind::AppServicePlan,
        ResourceKind::AppService,
        ResourceKind::StorageAccount,
        ResourceKind::SqlServer,
        ResourceKind::SqlDatabase,
        ResourceKind::VirtualNetwork,
        ResourceKind::Subnet,
        ResourceKind::NetworkSecurityGroup,
        ResourceKind::PublicIp,
        ResourceKind::KeyVault,
        ResourceKind::RedisCache,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::AppServicePlan => "appServicePlan",
            ResourceKind::AppService => "appService",
            ResourceKind::StorageAccount => "storageAccount",
            ResourceKind::SqlServer => "sqlServer",
            ResourceKind::SqlDatabase => "sqlDatabase",
            ResourceKind::VirtualNetwork => "virtualNetwork",
            ResourceKind::Subnet => "subnet",
            ResourceKind::NetworkSecurityGroup => "networkSecurityGroup",
            ResourceKind::PublicIp => "publicIp",
            ResourceKind::KeyVault => "keyVault",
            ResourceKind::RedisCache => "redisCache",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CatalogError::UnknownKind {
                kind: s.to_string(),
                supported: ResourceKind::ALL
                    .iter()
                    .map(|kind| kind.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Value type of a configuration field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    String,
    Int,
    Bool,
    /// Canonical enumerated values (SKU names, tiers, OS kinds).
    Enum(&'static [&'static str]),
    /// Logical name of another declaration; the target's kind must be one of
    /// the listed kinds.
    Reference(&'static [ResourceKind]),
}

impl FieldType {
    pub fn describe(&self) -> String {
        match self {
            FieldType::String => "string".to_string(),
            FieldType::Int => "integer".to_string(),
            FieldType::Bool => "boolean".to_string(),
            FieldType::Enum(values) => format!("one of {}", values.join(", ")),
            FieldType::Reference(kinds) => format!(
                "reference to {}",
                kinds
                    .iter()
                    .map(|kind| kind.as_str())
                    .collect::<Vec<_>>()
                    .join(" or ")
            ),
        }
    }
}

/// Where a configuration field lands in the emitted resource object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldTarget {
    /// Resource-level `sku.name`.
    Sku,
    /// Resource-level `sku.capacity`.
    SkuCapacity,
    /// Resource-level `kind` tag.
    KindTag,
    /// Key under the resource's `properties` object.
    Property(&'static str),
    /// ARM parent resource: composes the deployed name (`parent/child`) and
    /// a `dependsOn` edge. Must be a reference field.
    Parent,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
    pub target: FieldTarget,
}

/// Character set a deployed resource name must draw from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameCharset {
    /// `a-z0-9` only (storage accounts).
    LowercaseAlphanumeric,
    /// `a-z0-9-`.
    LowercaseAlphanumericHyphen,
}

impl NameCharset {
    /// Folds a logical-name character into the charset, or drops it.
    /// Uppercase letters fold to lowercase; anything else outside the set is
    /// stripped.
    pub fn fold(&self, ch: char) -> Option<char> {
        let ch = ch.to_ascii_lowercase();
        match self {
            NameCharset::LowercaseAlphanumeric if ch.is_ascii_lowercase() || ch.is_ascii_digit() => {
                Some(ch)
            }
            NameCharset::LowercaseAlphanumericHyphen
                if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' =>
            {
                Some(ch)
            }
            _ => None,
        }
    }
}

/// Provider naming rule for one resource kind.
#[derive(Clone, Copy, Debug)]
pub struct NameRule {
    pub min_len: usize,
    pub max_len: usize,
    pub charset: NameCharset,
}

/// Everything the builder needs to know about one resource kind.
#[derive(Clone, Debug)]
pub struct KindSpec {
    pub kind: ResourceKind,
    /// Azure provider/resource-type literal, e.g. `Microsoft.Web/sites`.
    pub azure_type: &'static str,
    pub api_version: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub fields: Vec<FieldSpec>,
    pub name_rule: NameRule,
    /// Name of the [`FieldTarget::Parent`] field, if this kind is a child
    /// resource type.
    pub parent_field: Option<&'static str>,
    /// Property fragment merged under `properties` before user fields.
    pub default_properties: Value,
}

impl KindSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Allowed SKU names, if the kind has a `sku` field.
    pub fn sku_values(&self) -> Option<&'static [&'static str]> {
        self.fields.iter().find_map(|field| {
            if matches!(field.target, FieldTarget::Sku)
                && let FieldType::Enum(values) = field.ty
            {
                Some(values)
            } else {
                None
            }
        })
    }
}

/// Read-only lookup table of kind specs. The builder borrows a catalog and
/// never mutates it; swapping in a different table changes the supported
/// resource set without touching builder logic.
#[derive(Clone, Debug)]
pub struct Catalog {
    kinds: BTreeMap<ResourceKind, KindSpec>,
}

impl Catalog {
    /// The built-in catalog.
    pub fn builtin() -> &'static Catalog {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(|| {
            Catalog::from_specs(kinds::builtin_specs()).expect("builtin catalog is consistent")
        })
    }

    /// Builds a catalog from an explicit spec list, checking internal
    /// consistency: no duplicate kinds, every reference target present,
    /// parent fields actually references.
    pub fn from_specs(specs: Vec<KindSpec>) -> Result<Catalog, CatalogError> {
        let mut kinds = BTreeMap::new();
        for spec in specs {
            let kind = spec.kind;
            if kinds.insert(kind, spec).is_some() {
                return Err(CatalogError::DuplicateKind { kind });
            }
        }
        for spec in kinds.values() {
            for field in &spec.fields {
                if let FieldType::Reference(targets) = field.ty {
                    for target in targets {
                        if !kinds.contains_key(target) {
                            return Err(CatalogError::DanglingReferenceTarget {
                                kind: spec.kind,
                                field: field.name,
                                target: *target,
                            });
                        }
                    }
                }
            }
            if let Some(parent) = spec.parent_field {
                let ok = spec
                    .field(parent)
                    .is_some_and(|field| matches!(field.ty, FieldType::Reference(_)));
                if !ok {
                    return Err(CatalogError::InvalidParentField {
                        kind: spec.kind,
                        field: parent,
                    });
                }
            }
        }
        Ok(Catalog { kinds })
    }

    pub fn spec(&self, kind: ResourceKind) -> Option<&KindSpec> {
        self.kinds.get(&kind)
    }

    pub fn specs(&self) -> impl Iterator<Item = &KindSpec> {
        self.kinds.values()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_covers_every_kind() {
        let catalog = Catalog::builtin();
        for kind in ResourceKind::ALL {
            let spec = catalog.spec(*kind).expect("kind present");
            assert!(spec.azure_type.starts_with("Microsoft."), "{kind}");
            assert!(!spec.api_version.is_empty(), "{kind}");
            assert!(spec.name_rule.min_len <= spec.name_rule.max_len, "{kind}");
            assert!(spec.default_properties.is_object(), "{kind}");
        }
    }

    #[test]
    fn parent_fields_are_required_references() {
        for spec in Catalog::builtin().specs() {
            let Some(parent) = spec.parent_field else {
                continue;
            };
            let field = spec.field(parent).expect("parent field declared");
            assert!(field.required, "{}: parent field must be required", spec.kind);
            assert!(matches!(field.ty, FieldType::Reference(_)));
            assert!(matches!(field.target, FieldTarget::Parent));
        }
    }

    #[test]
    fn kind_round_trips_through_display_and_from_str() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.as_str().parse::<ResourceKind>().unwrap(), *kind);
        }
        let err = "blobStore".parse::<ResourceKind>().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownKind { .. }));
    }

    #[test]
    fn from_specs_rejects_dangling_reference_target() {
        let specs = kinds::builtin_specs()
            .into_iter()
            .filter(|spec| spec.kind != ResourceKind::AppServicePlan)
            .collect();
        let err = Catalog::from_specs(specs).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DanglingReferenceTarget {
                kind: ResourceKind::AppService,
                ..
            }
        ));
    }

    #[test]
    fn storage_account_names_fold_to_lowercase_alphanumeric() {
        let rule = Catalog::builtin()
            .spec(ResourceKind::StorageAccount)
            .unwrap()
            .name_rule;
        assert_eq!(rule.charset.fold('A'), Some('a'));
        assert_eq!(rule.charset.fold('-'), None);
        assert_eq!(rule.charset.fold('7'), Some('7'));
    }
}
