//! Offline cost estimation over a finalized template.
//!
//! The rate table is deliberately coarse: flat monthly USD per SKU, no region
//! or usage modeling. It exists so a review can rank configurations before
//! anything is deployed, not to predict a bill.

pub mod presets;

use std::collections::BTreeMap;

use bragi_template::TemplateDocument;
use serde::Serialize;

pub use presets::{WorkloadProfile, WorkloadSize};

const APP_SERVICE_RATES: &[(&str, f64)] = &[
    ("F1", 0.0),
    ("B1", 13.0),
    ("B2", 26.0),
    ("B3", 52.0),
    ("S1", 73.0),
    ("S2", 146.0),
    ("S3", 292.0),
    ("P1", 219.0),
    ("P2", 438.0),
    ("P3", 876.0),
];

const SQL_DATABASE_RATES: &[(&str, f64)] = &[
    ("Basic", 5.0),
    ("S0", 15.0),
    ("S1", 30.0),
    ("S2", 60.0),
    ("S3", 120.0),
    ("P1", 90.0),
    ("P2", 180.0),
    ("P4", 360.0),
    ("P6", 720.0),
    ("P11", 1440.0),
    ("P15", 2880.0),
];

/// Per-GB monthly rates; reported as-is, usage is not modeled.
const STORAGE_RATES: &[(&str, f64)] = &[
    ("Standard_LRS", 0.02),
    ("Standard_GRS", 0.04),
    ("Standard_RAGRS", 0.05),
];

fn rate(table: &[(&str, f64)], sku: &str, floor: f64) -> f64 {
    table
        .iter()
        .find(|(name, _)| *name == sku)
        .map(|(_, rate)| *rate)
        .unwrap_or(floor)
}

/// Monthly USD estimate with a per-resource breakdown. Only priced resource
/// types appear in the breakdown; everything else costs nothing here.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CostEstimate {
    pub monthly_estimate: f64,
    pub breakdown: BTreeMap<String, f64>,
}

impl CostEstimate {
    fn add(&mut self, label: String, cost: f64) {
        self.breakdown.insert(label, cost);
        self.monthly_estimate += cost;
    }
}

pub fn estimate(document: &TemplateDocument) -> CostEstimate {
    let mut estimate = CostEstimate {
        monthly_estimate: 0.0,
        breakdown: BTreeMap::new(),
    };

    for resource in &document.resources {
        let sku_name = resource
            .sku
            .as_ref()
            .and_then(|sku| sku["name"].as_str());
        match resource.resource_type.as_str() {
            "Microsoft.Web/serverfarms" => {
                let sku = sku_name.unwrap_or("F1");
                estimate.add(
                    format!("App Service Plan ({})", resource.name),
                    rate(APP_SERVICE_RATES, sku, 0.0),
                );
            }
            "Microsoft.Sql/servers/databases" => {
                let sku = sku_name.unwrap_or("Basic");
                estimate.add(
                    format!("SQL Database ({})", resource.name),
                    rate(SQL_DATABASE_RATES, sku, 5.0),
                );
            }
            "Microsoft.Storage/storageAccounts" => {
                let sku = sku_name.unwrap_or("Standard_LRS");
                estimate.add(
                    format!("Storage ({})", resource.name),
                    rate(STORAGE_RATES, sku, 0.02),
                );
            }
            _ => {}
        }
    }

    estimate
}

/// Review guidance keyed off the resource mix and the total estimate.
pub fn recommendations(document: &TemplateDocument, estimate: &CostEstimate) -> Vec<String> {
    let mut out = Vec::new();

    if estimate.monthly_estimate > 1000.0 {
        out.push(
            "Estimated cost exceeds $1000/month; consider smaller SKUs for non-production \
             environments"
                .to_string(),
        );
    }

    for resource in &document.resources {
        match resource.resource_type.as_str() {
            "Microsoft.Web/sites" => {
                if resource.properties["httpsOnly"] != serde_json::json!(true) {
                    out.push(format!(
                        "App Service `{}` does not enforce HTTPS; set httpsOnly",
                        resource.name
                    ));
                }
            }
            "Microsoft.Sql/servers" => {
                out.push(format!(
                    "SQL Server `{}` is configured; review firewall rules before deploying",
                    resource.name
                ));
            }
            "Microsoft.Storage/storageAccounts" => {
                out.push(format!(
                    "Storage account `{}` is configured; consider enabling soft delete",
                    resource.name
                ));
            }
            _ => {}
        }
    }

    out
}
