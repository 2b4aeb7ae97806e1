//! Workload sizing presets: canonical SKU picks per workload size, plus a
//! scaffold that turns a size into a ready-to-edit declaration list.

use std::{collections::BTreeMap, fmt, str::FromStr};

use bragi_catalog::ResourceKind;
use bragi_template::{LogicalName, ResourceDeclaration};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum PresetError {
    #[error("unknown workload size `{size}`")]
    #[diagnostic(
        code(estimator::unknown_workload_size),
        help("Supported sizes: small, medium, large, enterprise.")
    )]
    UnknownSize { size: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidName(#[from] bragi_template::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadSize {
    Small,
    Medium,
    Large,
    Enterprise,
}

impl WorkloadSize {
    pub const ALL: &'static [WorkloadSize] = &[
        WorkloadSize::Small,
        WorkloadSize::Medium,
        WorkloadSize::Large,
        WorkloadSize::Enterprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadSize::Small => "small",
            WorkloadSize::Medium => "medium",
            WorkloadSize::Large => "large",
            WorkloadSize::Enterprise => "enterprise",
        }
    }

    pub fn profile(&self) -> WorkloadProfile {
        match self {
            WorkloadSize::Small => WorkloadProfile {
                app_service_sku: "B1",
                app_service_capacity: 1,
                meta_database_sku: "Basic",
                warehouse_database_sku: "Basic",
                storage_sku: "Standard_LRS",
                storage_access_tier: "Hot",
            },
            WorkloadSize::Medium => WorkloadProfile {
                app_service_sku: "S1",
                app_service_capacity: 2,
                meta_database_sku: "S0",
                warehouse_database_sku: "S1",
                storage_sku: "Standard_GRS",
                storage_access_tier: "Hot",
            },
            WorkloadSize::Large => WorkloadProfile {
                app_service_sku: "P1",
                app_service_capacity: 3,
                meta_database_sku: "P1",
                warehouse_database_sku: "P2",
                storage_sku: "Standard_RAGRS",
                storage_access_tier: "Hot",
            },
            WorkloadSize::Enterprise => WorkloadProfile {
                app_service_sku: "P3",
                app_service_capacity: 5,
                meta_database_sku: "P4",
                warehouse_database_sku: "P6",
                storage_sku: "Standard_RAGRS",
                storage_access_tier: "Hot",
            },
        }
    }
}

impl fmt::Display for WorkloadSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadSize {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkloadSize::ALL
            .iter()
            .copied()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| PresetError::UnknownSize {
                size: s.to_string(),
            })
    }
}

/// Canonical SKU picks for one workload size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkloadProfile {
    pub app_service_sku: &'static str,
    pub app_service_capacity: u32,
    pub meta_database_sku: &'static str,
    pub warehouse_database_sku: &'static str,
    pub storage_sku: &'static str,
    pub storage_access_tier: &'static str,
}

/// The standard workload stack at the given size: hosting plan, web app, SQL
/// server with metadata and warehouse databases, and a storage account. The
/// SQL administrator credentials reference the `sqlAdminLogin` and
/// `sqlAdminPassword` parameters, which the caller declares.
pub fn scaffold(
    size: WorkloadSize,
    prefix: &str,
) -> Result<Vec<ResourceDeclaration>, PresetError> {
    let profile = size.profile();
    let name = |suffix: &str| -> Result<LogicalName, PresetError> {
        Ok(format!("{prefix}{suffix}").parse::<LogicalName>()?)
    };
    let config = |entries: &[(&str, serde_json::Value)]| {
        entries
            .iter()
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect::<BTreeMap<_, _>>()
    };

    Ok(vec![
        ResourceDeclaration::builder()
            .kind(ResourceKind::AppServicePlan)
            .logical_name(name("Plan")?)
            .configuration(config(&[
                ("sku", json!(profile.app_service_sku)),
                ("capacity", json!(profile.app_service_capacity)),
            ]))
            .build(),
        ResourceDeclaration::builder()
            .kind(ResourceKind::AppService)
            .logical_name(name("Web")?)
            .configuration(config(&[("plan", json!(format!("{prefix}Plan")))]))
            .build(),
        ResourceDeclaration::builder()
            .kind(ResourceKind::SqlServer)
            .logical_name(name("Sql")?)
            .configuration(config(&[
                ("administratorLogin", json!("[parameters('sqlAdminLogin')]")),
                (
                    "administratorLoginPassword",
                    json!("[parameters('sqlAdminPassword')]"),
                ),
            ]))
            .build(),
        ResourceDeclaration::builder()
            .kind(ResourceKind::SqlDatabase)
            .logical_name(name("Meta")?)
            .configuration(config(&[
                ("server", json!(format!("{prefix}Sql"))),
                ("sku", json!(profile.meta_database_sku)),
            ]))
            .build(),
        ResourceDeclaration::builder()
            .kind(ResourceKind::SqlDatabase)
            .logical_name(name("Dwh")?)
            .configuration(config(&[
                ("server", json!(format!("{prefix}Sql"))),
                ("sku", json!(profile.warehouse_database_sku)),
            ]))
            .build(),
        ResourceDeclaration::builder()
            .kind(ResourceKind::StorageAccount)
            .logical_name(name("Assets")?)
            .configuration(config(&[
                ("sku", json!(profile.storage_sku)),
                ("accessTier", json!(profile.storage_access_tier)),
            ]))
            .build(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_round_trip_through_display_and_from_str() {
        for size in WorkloadSize::ALL {
            assert_eq!(size.as_str().parse::<WorkloadSize>().unwrap(), *size);
        }
        let err = "xlarge".parse::<WorkloadSize>().unwrap_err();
        assert!(matches!(err, PresetError::UnknownSize { .. }));
    }

    #[test]
    fn profiles_scale_up_with_size() {
        assert_eq!(WorkloadSize::Small.profile().app_service_sku, "B1");
        assert_eq!(WorkloadSize::Medium.profile().warehouse_database_sku, "S1");
        assert_eq!(WorkloadSize::Large.profile().storage_sku, "Standard_RAGRS");
        assert_eq!(WorkloadSize::Enterprise.profile().app_service_capacity, 5);
    }

    #[test]
    fn scaffold_wires_the_stack_together() {
        let declarations = scaffold(WorkloadSize::Medium, "data").unwrap();
        assert_eq!(declarations.len(), 6);
        let web = declarations
            .iter()
            .find(|decl| decl.logical_name.as_str() == "dataWeb")
            .unwrap();
        assert_eq!(web.configuration["plan"], json!("dataPlan"));
        let meta = declarations
            .iter()
            .find(|decl| decl.logical_name.as_str() == "dataMeta")
            .unwrap();
        assert_eq!(meta.configuration["server"], json!("dataSql"));
        assert_eq!(meta.configuration["sku"], json!("S0"));
    }

    #[test]
    fn scaffold_rejects_an_invalid_prefix() {
        let err = scaffold(WorkloadSize::Small, "9data").unwrap_err();
        assert!(matches!(err, PresetError::InvalidName(_)));
    }
}
