use std::collections::BTreeMap;

use bragi_builder::TemplateBuilder;
use bragi_catalog::{Catalog, ResourceKind};
use bragi_template::{
    OutputSpec, ParameterMetadata, ParameterSpec, ParameterType, ResourceDeclaration,
};
use serde_json::{Value, json};

fn declare(
    builder: &mut TemplateBuilder<'_>,
    kind: ResourceKind,
    name: &str,
    config: &[(&str, Value)],
) {
    builder
        .add_resource(
            ResourceDeclaration::builder()
                .kind(kind)
                .logical_name(name.parse().unwrap())
                .configuration(
                    config
                        .iter()
                        .map(|(field, value)| (field.to_string(), value.clone()))
                        .collect::<BTreeMap<_, _>>(),
                )
                .build(),
        )
        .expect("declaration should be accepted");
}

fn three_tier_builder(catalog: &Catalog) -> TemplateBuilder<'_> {
    let mut builder = TemplateBuilder::new(catalog);

    declare(
        &mut builder,
        ResourceKind::NetworkSecurityGroup,
        "appNsg",
        &[],
    );
    declare(
        &mut builder,
        ResourceKind::VirtualNetwork,
        "appVnet",
        &[("addressSpace", json!("10.10.0.0/16"))],
    );
    declare(
        &mut builder,
        ResourceKind::Subnet,
        "webSubnet",
        &[
            ("network", json!("appVnet")),
            ("addressPrefix", json!("10.10.1.0/24")),
            ("securityGroup", json!("appNsg")),
        ],
    );
    declare(
        &mut builder,
        ResourceKind::AppServicePlan,
        "webPlan",
        &[
            ("sku", json!("S1")),
            ("capacity", json!(2)),
            ("kind", json!("linux")),
        ],
    );
    declare(
        &mut builder,
        ResourceKind::AppService,
        "webApp",
        &[
            ("plan", json!("webPlan")),
            ("runtimeStack", json!("NODE|18-lts")),
        ],
    );
    declare(
        &mut builder,
        ResourceKind::SqlServer,
        "appSql",
        &[
            ("administratorLogin", json!("appadmin")),
            (
                "administratorLoginPassword",
                json!("[parameters('sqlAdminPassword')]"),
            ),
        ],
    );
    declare(
        &mut builder,
        ResourceKind::SqlDatabase,
        "appDb",
        &[("server", json!("appSql")), ("sku", json!("S0"))],
    );
    declare(
        &mut builder,
        ResourceKind::StorageAccount,
        "appAssets",
        &[("sku", json!("Standard_LRS")), ("accessTier", json!("Hot"))],
    );

    builder
        .declare_parameter(
            "sqlAdminPassword".parse().unwrap(),
            ParameterSpec::builder()
                .ty(ParameterType::SecureString)
                .metadata(
                    ParameterMetadata::builder()
                        .description("SQL administrator password")
                        .build(),
                )
                .build(),
        )
        .unwrap();
    builder
        .add_output(
            "webHost".parse().unwrap(),
            OutputSpec::builder()
                .ty(ParameterType::String)
                .value("[reference('webapp').defaultHostName]")
                .build(),
        )
        .unwrap();

    builder
}

#[test]
fn three_tier_stack_produces_a_deployable_template() {
    let builder = three_tier_builder(Catalog::builtin());
    let document = builder.finalize().expect("stack should finalize");

    let positions: BTreeMap<&str, usize> = document
        .resources
        .iter()
        .enumerate()
        .map(|(index, resource)| (resource.name.as_str(), index))
        .collect();

    // every dependsOn target is emitted earlier
    for resource in &document.resources {
        for dependency in &resource.depends_on {
            let target = document
                .resources
                .iter()
                .position(|candidate| {
                    dependency.contains(&format!("'{}'", candidate.resource_type))
                        && dependency.ends_with(&format!(
                            "{})]",
                            candidate
                                .name
                                .split('/')
                                .map(|segment| format!("'{segment}'"))
                                .collect::<Vec<_>>()
                                .join(", ")
                        ))
                })
                .unwrap_or_else(|| panic!("dependency `{dependency}` not emitted"));
            assert!(
                target < positions[resource.name.as_str()],
                "`{}` emitted before its dependency `{dependency}`",
                resource.name
            );
        }
    }

    // unrelated resources keep declaration order
    assert!(positions["appnsg"] < positions["appvnet"]);
    assert!(positions["webplan"] < positions["appsql"]);

    let subnet = &document.resources[positions["appvnet/websubnet"]];
    assert_eq!(subnet.depends_on.len(), 2);
    assert_eq!(
        subnet.properties["networkSecurityGroupId"],
        json!("[resourceId('Microsoft.Network/networkSecurityGroups', 'appnsg')]")
    );

    let web = &document.resources[positions["webapp"]];
    assert_eq!(
        web.depends_on,
        vec!["[resourceId('Microsoft.Web/serverfarms', 'webplan')]".to_string()]
    );
    assert_eq!(web.properties["linuxFxVersion"], json!("NODE|18-lts"));

    assert_eq!(document.parameters.len(), 1);
    assert_eq!(document.outputs.len(), 1);
}

#[test]
fn wire_shape_matches_the_arm_contract() {
    let builder = three_tier_builder(Catalog::builtin());
    let wire = builder.finalize().unwrap().to_json();

    assert_eq!(
        wire["$schema"],
        json!("https://schema.management.azure.com/schemas/2019-04-01/deploymentTemplate.json#")
    );
    assert_eq!(wire["contentVersion"], json!("1.0.0.0"));
    assert_eq!(
        wire["parameters"]["sqlAdminPassword"]["type"],
        json!("securestring")
    );
    assert_eq!(
        wire["variables"]["webAppId"],
        json!("[resourceId('Microsoft.Web/sites', 'webapp')]")
    );

    let resources = wire["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 8);
    for resource in resources {
        let object = resource.as_object().unwrap();
        assert!(object.contains_key("type"));
        assert!(object.contains_key("apiVersion"));
        assert!(object.contains_key("name"));
        assert!(object.contains_key("location"));
        assert!(object.contains_key("properties"));
    }

    let plan = resources
        .iter()
        .find(|resource| resource["name"] == json!("webplan"))
        .unwrap();
    assert_eq!(plan["sku"], json!({ "capacity": 2, "name": "S1" }));
    assert_eq!(plan["kind"], json!("linux"));
}

#[test]
fn rebuilding_from_saved_declarations_reproduces_the_digest() {
    let builder = three_tier_builder(Catalog::builtin());
    let saved = builder.declarations().to_vec();

    let mut restored =
        TemplateBuilder::from_declarations(Catalog::builtin(), saved).unwrap();
    restored
        .declare_parameter(
            "sqlAdminPassword".parse().unwrap(),
            ParameterSpec::builder()
                .ty(ParameterType::SecureString)
                .metadata(
                    ParameterMetadata::builder()
                        .description("SQL administrator password")
                        .build(),
                )
                .build(),
        )
        .unwrap();
    restored
        .add_output(
            "webHost".parse().unwrap(),
            OutputSpec::builder()
                .ty(ParameterType::String)
                .value("[reference('webapp').defaultHostName]")
                .build(),
        )
        .unwrap();

    assert_eq!(
        builder.finalize().unwrap().digest(),
        restored.finalize().unwrap().digest()
    );
}
