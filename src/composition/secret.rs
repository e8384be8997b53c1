// Copyright (c) 2025 - Cowboy AI, Inc.
//! Secret Composer
//!
//! Flattens the connection facts a client needs out of a finished graph.
//! The bundle is the only place a generated password leaves the engine;
//! the orchestrator stores it and replays it on the next reconcile.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::composition::builder::PASSWORD_KEY;
use crate::composition::graph::{ResourceGraph, ResourceNode};
use crate::domain::resource_kind::ResourceKind;
use crate::errors::{CompositionError, CompositionResult};

/// Connection secret document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretBundle {
    pub cluster_endpoint: String,
    pub cluster_reader_endpoint: String,
    pub cluster_id: String,
    /// `null` when the provider manages the password
    #[serde(default)]
    pub master_password: Option<String>,
    pub vpc_id: String,
    pub subnet_group_name: String,
    pub master_username: String,
    pub port: String,
    pub database_name: String,
}

impl SecretBundle {
    /// Flat key/value view, in key order
    ///
    /// Every key is always present; a provider-managed password is an empty
    /// value.
    pub fn entries(&self) -> Vec<(&'static str, &str)> {
        vec![
            ("clusterEndpoint", self.cluster_endpoint.as_str()),
            ("clusterId", self.cluster_id.as_str()),
            ("clusterReaderEndpoint", self.cluster_reader_endpoint.as_str()),
            ("databaseName", self.database_name.as_str()),
            ("masterPassword", self.master_password.as_deref().unwrap_or_default()),
            ("masterUsername", self.master_username.as_str()),
            ("port", self.port.as_str()),
            ("subnetGroupName", self.subnet_group_name.as_str()),
            ("vpcId", self.vpc_id.as_str()),
        ]
    }

    /// Name of the connection Secret rendered for this bundle
    pub fn secret_name(&self) -> String {
        format!("{}-connection", self.cluster_id)
    }

    /// Render as a Kubernetes `Secret` with base64 encoded data
    pub fn to_secret_manifest(&self, name: &str, namespace: &str) -> Value {
        let data: serde_json::Map<String, Value> = self
            .entries()
            .into_iter()
            .map(|(key, value)| (key.to_string(), Value::String(BASE64.encode(value))))
            .collect();

        json!({
            "apiVersion": "v1",
            "kind": "Secret",
            "type": "Opaque",
            "metadata": {
                "name": name,
                "namespace": namespace,
            },
            "data": data,
        })
    }
}

fn required(graph: &ResourceGraph, kind: ResourceKind) -> CompositionResult<&ResourceNode> {
    graph
        .first_of_kind(kind)
        .ok_or_else(|| CompositionError::incomplete(format!("graph has no {kind} node")))
}

fn detail(node: &ResourceNode, key: &str) -> CompositionResult<String> {
    node.connection_details()
        .get(key)
        .cloned()
        .ok_or_else(|| {
            CompositionError::incomplete(format!("{} publishes no {key}", node.id()))
        })
}

/// Compose the connection secret from a built graph
///
/// # Errors
/// [`CompositionError::IncompleteGraph`] when the VPC, subnet group or
/// cluster is missing, or the cluster references a password Secret that is
/// not in the graph.
pub fn compose(graph: &ResourceGraph) -> CompositionResult<SecretBundle> {
    let vpc = required(graph, ResourceKind::Vpc)?;
    let subnet_group = required(graph, ResourceKind::SubnetGroup)?;
    let cluster = required(graph, ResourceKind::Cluster)?;

    let master_password = match cluster
        .property("masterPasswordSecretRef")
        .and_then(|r| r.get("name"))
        .and_then(Value::as_str)
    {
        Some(secret_name) => {
            let secret = graph
                .find_by_name(secret_name)
                .filter(|n| n.kind() == ResourceKind::Secret)
                .ok_or_else(|| {
                    CompositionError::incomplete(format!(
                        "cluster references missing password secret {secret_name}"
                    ))
                })?;
            Some(detail(secret, PASSWORD_KEY)?)
        }
        None => None,
    };

    let database_name = cluster
        .property("databaseName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let bundle = SecretBundle {
        cluster_endpoint: detail(cluster, "endpoint")?,
        cluster_reader_endpoint: detail(cluster, "readerEndpoint")?,
        cluster_id: detail(cluster, "clusterIdentifier")?,
        master_password,
        vpc_id: vpc.name().to_string(),
        subnet_group_name: subnet_group.name().to_string(),
        master_username: detail(cluster, "username")?,
        port: detail(cluster, "port")?,
        database_name,
    };

    debug!(
        cluster = %bundle.cluster_id,
        managed_password = bundle.master_password.is_none(),
        "Composed connection secret"
    );
    Ok(bundle)
}
