//! Build representation rendered for the frontend.
//!
//! Each supported component category is projected from the build's
//! component graph into flat string records. Extraction never fails:
//! missing or mistyped attributes degrade to empty strings, and dangling
//! cross-references (an lb naming an unknown public ip, a vm naming an
//! unknown interface) are silently omitted. The only error path when
//! rendering a build is the upstream mapping fetch, which callers handle
//! before constructing the view.

use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::HashMap;

use gantry_models::models::builds::Build;
use gantry_models::models::environments::Environment;
use gantry_models::models::graph::{Component, ComponentGraph};

/// One flattened component record.
pub type Fields = BTreeMap<String, String>;

/// Build representation to be rendered on the frontend.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildView {
    pub id: String,
    pub environment_id: i64,
    pub name: String,
    pub project: String,
    pub provider: String,
    pub status: String,
    pub user_id: i64,
    pub user_name: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vpcs: Vec<Fields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<Fields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub instances: Vec<Fields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nats: Vec<Fields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<Fields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub elbs: Vec<Fields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rds_clusters: Vec<Fields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rds_instances: Vec<Fields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ebs_volumes: Vec<Fields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub load_balancers: Vec<Fields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sql_databases: Vec<Fields>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub virtual_machines: Vec<Fields>,
}

impl BuildView {
    /// Projects a build's metadata without walking a graph; used for
    /// listings, where mappings are not fetched.
    pub fn from_metadata(build: &Build, env: &Environment) -> BuildView {
        BuildView {
            id: build.id.clone(),
            environment_id: build.environment_id,
            name: env.name.clone(),
            project: env.project.clone().unwrap_or_default(),
            provider: env.provider.clone().unwrap_or_default(),
            status: build.status.clone(),
            user_id: build.user_id,
            user_name: build.username.clone(),
            created_at: build
                .created_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            updated_at: build
                .updated_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Projects a build and its component graph into the full view.
    pub fn render(build: &Build, env: &Environment, graph: &ComponentGraph) -> BuildView {
        let mut view = BuildView::from_metadata(build, env);

        view.vpcs = render_vpcs(graph);
        view.networks = render_networks(graph);
        view.security_groups = render_security_groups(graph);
        view.nats = render_nats(graph);
        view.instances = render_instances(graph);
        view.elbs = render_elbs(graph);
        view.rds_clusters = render_rds_clusters(graph);
        view.rds_instances = render_rds_instances(graph);
        view.ebs_volumes = render_ebs_volumes(graph);
        view.load_balancers = render_load_balancers(graph);
        view.sql_databases = render_sql_databases(graph);
        view.virtual_machines = render_virtual_machines(graph);

        view
    }
}

fn record(pairs: &[(&str, String)]) -> Fields {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn render_components<F>(graph: &ComponentGraph, tag: &str, convert: F) -> Vec<Fields>
where
    F: Fn(&Component) -> Fields,
{
    graph.nodes_of(tag).iter().map(|c| convert(c)).collect()
}

/// Renders a build's vpcs.
pub fn render_vpcs(graph: &ComponentGraph) -> Vec<Fields> {
    render_components(graph, "vpc", |c| {
        record(&[
            ("name", c.string("name")),
            ("vpc_id", c.string("vpc_aws_id")),
            ("vpc_subnet", c.string("subnet")),
        ])
    })
}

/// Renders a build's networks.
pub fn render_networks(graph: &ComponentGraph) -> Vec<Fields> {
    render_components(graph, "network", |c| {
        record(&[
            ("name", c.string("name")),
            ("network_aws_id", c.string("network_aws_id")),
            ("availability_zone", c.string("availability_zone")),
        ])
    })
}

/// Renders a build's security groups.
pub fn render_security_groups(graph: &ComponentGraph) -> Vec<Fields> {
    render_components(graph, "firewall", |c| {
        record(&[
            ("name", c.string("name")),
            ("security_group_aws_id", c.string("security_group_aws_id")),
        ])
    })
}

/// Renders a build's nat gateways.
pub fn render_nats(graph: &ComponentGraph) -> Vec<Fields> {
    render_components(graph, "nat", |c| {
        record(&[
            ("name", c.string("name")),
            ("nat_gateway_aws_id", c.string("nat_gateway_aws_id")),
            ("public_ip", c.string("nat_gateway_allocation_ip")),
        ])
    })
}

/// Renders a build's instances.
pub fn render_instances(graph: &ComponentGraph) -> Vec<Fields> {
    render_components(graph, "instance", |c| {
        record(&[
            ("name", c.string("name")),
            ("instance_aws_id", c.string("instance_aws_id")),
            ("public_ip", c.string("public_ip")),
            ("ip", c.string("ip")),
        ])
    })
}

/// Renders a build's elbs.
pub fn render_elbs(graph: &ComponentGraph) -> Vec<Fields> {
    render_components(graph, "elb", |c| {
        record(&[
            ("name", c.string("name")),
            ("dns_name", c.string("dns_name")),
        ])
    })
}

/// Renders a build's rds clusters.
pub fn render_rds_clusters(graph: &ComponentGraph) -> Vec<Fields> {
    render_components(graph, "rds_cluster", |c| {
        record(&[
            ("name", c.string("name")),
            ("endpoint", c.string("endpoint")),
        ])
    })
}

/// Renders a build's rds instances.
pub fn render_rds_instances(graph: &ComponentGraph) -> Vec<Fields> {
    render_components(graph, "rds_instance", |c| {
        record(&[
            ("name", c.string("name")),
            ("endpoint", c.string("endpoint")),
        ])
    })
}

/// Renders a build's ebs volumes.
pub fn render_ebs_volumes(graph: &ComponentGraph) -> Vec<Fields> {
    render_components(graph, "ebs_volume", |c| {
        record(&[
            ("name", c.string("name")),
            ("volume_aws_id", c.string("volume_aws_id")),
        ])
    })
}

/// Renders a build's sql databases.
pub fn render_sql_databases(graph: &ComponentGraph) -> Vec<Fields> {
    render_components(graph, "sql_database", |c| {
        record(&[
            ("name", c.string("name")),
            (
                "server_name",
                format!("{}.database.windows.net", c.string("server_name")),
            ),
            ("id", c.string("id")),
        ])
    })
}

/// Indexes the graph's public ip nodes by id.
fn list_ip_addresses(graph: &ComponentGraph) -> HashMap<String, String> {
    let mut existing = HashMap::new();

    for ip in graph.nodes_of("public_ip") {
        existing.insert(ip.string("id"), ip.string("ip_address"));
    }

    existing
}

/// Renders a build's load balancers, resolving each lb's first frontend ip
/// configuration through the public-ip index. Unresolved references render
/// as an empty public_ip.
pub fn render_load_balancers(graph: &ComponentGraph) -> Vec<Fields> {
    let ips = list_ip_addresses(graph);

    graph
        .nodes_of("lb")
        .iter()
        .map(|c| {
            let mut public_ip = String::new();
            if let Some(config) = c
                .entries("frontend_ip_configurations")
                .first()
                .and_then(Component::from_value)
            {
                let ip_id = config.string("public_ip_address_id");
                if let Some(address) = ips.get(&ip_id) {
                    public_ip = address.clone();
                }
            }

            record(&[
                ("name", c.string("name")),
                ("id", c.string("id")),
                ("public_ip", public_ip),
            ])
        })
        .collect()
}

/// Renders a build's virtual machines.
///
/// Two passes: network interfaces are indexed by name to the public and
/// private addresses found in their ip configurations (public addresses
/// resolved through the public-ip index, dangling references skipped); each
/// vm then concatenates the addresses of its referenced interfaces in
/// reference order, joined ", ".
pub fn render_virtual_machines(graph: &ComponentGraph) -> Vec<Fields> {
    let existing_ips = list_ip_addresses(graph);
    let mut mapped: HashMap<String, (Vec<String>, Vec<String>)> = HashMap::new();

    for ni in graph.nodes_of("network_interface") {
        let mut public = Vec::new();
        let mut private = Vec::new();

        for config in ni.entries("ip_configuration") {
            let Some(config) = Component::from_value(config) else {
                continue;
            };

            let public_id = config.string("public_ip_address_id");
            if let Some(address) = existing_ips.get(&public_id) {
                public.push(address.clone());
            }
            private.push(config.string("private_ip_address"));
        }

        mapped.insert(ni.string("name"), (public, private));
    }

    graph
        .nodes_of("virtual_machine")
        .iter()
        .map(|c| {
            let mut public_ips: Vec<String> = Vec::new();
            let mut private_ips: Vec<String> = Vec::new();

            for name in c.strings("network_interfaces") {
                if let Some((public, private)) = mapped.get(&name) {
                    public_ips.extend(public.iter().cloned());
                    private_ips.extend(private.iter().cloned());
                }
            }

            record(&[
                ("name", c.string("name")),
                ("id", c.string("id")),
                ("public_ip", public_ips.join(", ")),
                ("private_ip", private_ips.join(", ")),
            ])
        })
        .collect()
}
