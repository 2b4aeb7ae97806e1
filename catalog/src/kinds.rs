//! Built-in kind specs. SKU sets, API versions, and default property
//! fragments follow the Azure provider defaults the wizard ships with.

use serde_json::json;

use crate::{FieldSpec, FieldTarget, FieldType, KindSpec, NameCharset, NameRule, ResourceKind};

const APP_SERVICE_PLAN_SKUS: &[&str] = &[
    "F1", "B1", "B2", "B3", "S1", "S2", "S3", "P1", "P2", "P3",
];
const STORAGE_SKUS: &[&str] = &[
    "Standard_LRS",
    "Standard_GRS",
    "Standard_RAGRS",
    "Premium_LRS",
];
const SQL_DATABASE_SKUS: &[&str] = &[
    "Basic", "S0", "S1", "S2", "S3", "P1", "P2", "P4", "P6", "P11", "P15",
];
const KEY_VAULT_SKUS: &[&str] = &["standard", "premium"];
const REDIS_SKUS: &[&str] = &["Basic", "Standard", "Premium"];
const PUBLIC_IP_SKUS: &[&str] = &["Basic", "Standard"];

fn field(name: &'static str, ty: FieldType, required: bool, target: FieldTarget) -> FieldSpec {
    FieldSpec {
        name,
        ty,
        required,
        target,
    }
}

fn hyphenated(min_len: usize, max_len: usize) -> NameRule {
    NameRule {
        min_len,
        max_len,
        charset: NameCharset::LowercaseAlphanumericHyphen,
    }
}

pub(crate) fn builtin_specs() -> Vec<KindSpec> {
    vec![
        KindSpec {
            kind: ResourceKind::AppServicePlan,
            azure_type: "Microsoft.Web/serverfarms",
            api_version: "2021-02-01",
            display_name: "App Service Plan",
            description: "Hosting plan for web applications",
            fields: vec![
                field(
                    "sku",
                    FieldType::Enum(APP_SERVICE_PLAN_SKUS),
                    true,
                    FieldTarget::Sku,
                ),
                field("capacity", FieldType::Int, false, FieldTarget::SkuCapacity),
                field(
                    "kind",
                    FieldType::Enum(&["linux", "windows"]),
                    false,
                    FieldTarget::KindTag,
                ),
            ],
            name_rule: hyphenated(1, 60),
            parent_field: None,
            default_properties: json!({ "reserved": true }),
        },
        KindSpec {
            kind: ResourceKind::AppService,
            azure_type: "Microsoft.Web/sites",
            api_version: "2021-02-01",
            display_name: "App Service",
            description: "Web application hosting",
            fields: vec![
                field(
                    "plan",
                    FieldType::Reference(&[ResourceKind::AppServicePlan]),
                    true,
                    FieldTarget::Property("serverFarmId"),
                ),
                field("httpsOnly", FieldType::Bool, false, FieldTarget::Property("httpsOnly")),
                field(
                    "runtimeStack",
                    FieldType::String,
                    false,
                    FieldTarget::Property("linuxFxVersion"),
                ),
            ],
            name_rule: hyphenated(2, 60),
            parent_field: None,
            default_properties: json!({
                "httpsOnly": true,
                "siteConfig": { "appSettings": [] }
            }),
        },
        KindSpec {
            kind: ResourceKind::StorageAccount,
            azure_type: "Microsoft.Storage/storageAccounts",
            api_version: "2021-09-01",
            display_name: "Storage Account",
            description: "Blob, file, table, and queue storage",
            fields: vec![
                field("sku", FieldType::Enum(STORAGE_SKUS), true, FieldTarget::Sku),
                field(
                    "accessTier",
                    FieldType::Enum(&["Hot", "Cool"]),
                    false,
                    FieldTarget::Property("accessTier"),
                ),
            ],
            name_rule: NameRule {
                min_len: 3,
                max_len: 24,
                charset: NameCharset::LowercaseAlphanumeric,
            },
            parent_field: None,
            default_properties: json!({
                "supportsHttpsTrafficOnly": true,
                "minimumTlsVersion": "TLS1_2",
                "allowBlobPublicAccess": false
            }),
        },
        KindSpec {
            kind: ResourceKind::SqlServer,
            azure_type: "Microsoft.Sql/servers",
            api_version: "2021-11-01",
            display_name: "SQL Server",
            description: "Database management system",
            fields: vec![
                field(
                    "administratorLogin",
                    FieldType::String,
                    true,
                    FieldTarget::Property("administratorLogin"),
                ),
                field(
                    "administratorLoginPassword",
                    FieldType::String,
                    true,
                    FieldTarget::Property("administratorLoginPassword"),
                ),
                field(
                    "publicNetworkAccess",
                    FieldType::Enum(&["Enabled", "Disabled"]),
                    false,
                    FieldTarget::Property("publicNetworkAccess"),
                ),
                field(
                    "vault",
                    FieldType::Reference(&[ResourceKind::KeyVault]),
                    false,
                    FieldTarget::Property("keyVaultId"),
                ),
            ],
            name_rule: hyphenated(1, 63),
            parent_field: None,
            default_properties: json!({
                "version": "12.0",
                "publicNetworkAccess": "Disabled"
            }),
        },
        KindSpec {
            kind: ResourceKind::SqlDatabase,
            azure_type: "Microsoft.Sql/servers/databases",
            api_version: "2021-11-01",
            display_name: "SQL Database",
            description: "Relational database",
            fields: vec![
                field(
                    "server",
                    FieldType::Reference(&[ResourceKind::SqlServer]),
                    true,
                    FieldTarget::Parent,
                ),
                field("sku", FieldType::Enum(SQL_DATABASE_SKUS), false, FieldTarget::Sku),
                field(
                    "maxSizeBytes",
                    FieldType::Int,
                    false,
                    FieldTarget::Property("maxSizeBytes"),
                ),
                field(
                    "collation",
                    FieldType::String,
                    false,
                    FieldTarget::Property("collation"),
                ),
            ],
            name_rule: hyphenated(1, 128),
            parent_field: Some("server"),
            default_properties: json!({
                "collation": "SQL_Latin1_General_CP1_CI_AS",
                "maxSizeBytes": 2147483648u64
            }),
        },
        KindSpec {
            kind: ResourceKind::VirtualNetwork,
            azure_type: "Microsoft.Network/virtualNetworks",
            api_version: "2021-05-01",
            display_name: "Virtual Network",
            description: "Isolated network environment",
            fields: vec![field(
                "addressSpace",
                FieldType::String,
                true,
                FieldTarget::Property("addressSpace"),
            )],
            name_rule: hyphenated(2, 64),
            parent_field: None,
            default_properties: json!({ "subnets": [] }),
        },
        KindSpec {
            kind: ResourceKind::Subnet,
            azure_type: "Microsoft.Network/virtualNetworks/subnets",
            api_version: "2021-05-01",
            display_name: "Subnet",
            description: "Address range inside a virtual network",
            fields: vec![
                field(
                    "network",
                    FieldType::Reference(&[ResourceKind::VirtualNetwork]),
                    true,
                    FieldTarget::Parent,
                ),
                field(
                    "addressPrefix",
                    FieldType::String,
                    true,
                    FieldTarget::Property("addressPrefix"),
                ),
                field(
                    "securityGroup",
                    FieldType::Reference(&[ResourceKind::NetworkSecurityGroup]),
                    false,
                    FieldTarget::Property("networkSecurityGroupId"),
                ),
            ],
            name_rule: hyphenated(1, 80),
            parent_field: Some("network"),
            default_properties: json!({}),
        },
        KindSpec {
            kind: ResourceKind::NetworkSecurityGroup,
            azure_type: "Microsoft.Network/networkSecurityGroups",
            api_version: "2021-05-01",
            display_name: "Network Security Group",
            description: "Inbound and outbound traffic rules",
            fields: vec![],
            name_rule: hyphenated(1, 80),
            parent_field: None,
            default_properties: json!({ "securityRules": [] }),
        },
        KindSpec {
            kind: ResourceKind::PublicIp,
            azure_type: "Microsoft.Network/publicIPAddresses",
            api_version: "2021-05-01",
            display_name: "Public IP Address",
            description: "Internet-routable address",
            fields: vec![
                field("sku", FieldType::Enum(PUBLIC_IP_SKUS), false, FieldTarget::Sku),
                field(
                    "allocationMethod",
                    FieldType::Enum(&["Static", "Dynamic"]),
                    false,
                    FieldTarget::Property("publicIPAllocationMethod"),
                ),
            ],
            name_rule: hyphenated(1, 80),
            parent_field: None,
            default_properties: json!({ "publicIPAllocationMethod": "Static" }),
        },
        KindSpec {
            kind: ResourceKind::KeyVault,
            azure_type: "Microsoft.KeyVault/vaults",
            api_version: "2021-10-01",
            display_name: "Key Vault",
            description: "Secure storage for secrets, keys, and certificates",
            fields: vec![
                field(
                    "tenantId",
                    FieldType::String,
                    true,
                    FieldTarget::Property("tenantId"),
                ),
                field("sku", FieldType::Enum(KEY_VAULT_SKUS), false, FieldTarget::Sku),
            ],
            name_rule: hyphenated(3, 24),
            parent_field: None,
            default_properties: json!({
                "enabledForDeployment": false,
                "enabledForTemplateDeployment": true,
                "enableSoftDelete": true,
                "softDeleteRetentionInDays": 90,
                "enableRbacAuthorization": true
            }),
        },
        KindSpec {
            kind: ResourceKind::RedisCache,
            azure_type: "Microsoft.Cache/Redis",
            api_version: "2021-06-01",
            display_name: "Redis Cache",
            description: "In-memory data store",
            fields: vec![
                field("sku", FieldType::Enum(REDIS_SKUS), true, FieldTarget::Sku),
                field("capacity", FieldType::Int, false, FieldTarget::SkuCapacity),
            ],
            name_rule: hyphenated(1, 63),
            parent_field: None,
            default_properties: json!({ "enableNonSslPort": false }),
        },
    ]
}
