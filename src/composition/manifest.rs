// Copyright (c) 2025 - Cowboy AI, Inc.
//! Orchestrator-facing manifests
//!
//! Managed resources render as
//!
//! ```yaml
//! apiVersion: ec2.aws.upbound.io/v1beta1
//! kind: Subnet
//! metadata:
//!   name: vectordb-subnet-database-0-dev
//!   labels: { app: vectordb, environment: dev, component: network }
//!   annotations:
//!     crossplane.io/depends-on: vpc
//! spec:
//!   forProvider: { ... }
//!   providerConfigRef: { name: default }
//! ```
//!
//! The password node renders as a plain namespaced Kubernetes `Secret`,
//! and so does the connection bundle.

use serde_json::{json, Map, Value};

use crate::composition::graph::{ResourceGraph, ResourceNode};
use crate::composition::secret::SecretBundle;
use crate::config::EngineConfig;
use crate::domain::resource_kind::ResourceKind;
use crate::domain::spec::CompositeInputSpec;

/// Annotation listing the ids a resource waits for
pub const DEPENDS_ON_ANNOTATION: &str = "crossplane.io/depends-on";

/// Renders nodes with the claim's namespace, provider config and labels
#[derive(Debug, Clone)]
pub struct ManifestRenderer {
    app: String,
    environment: String,
    namespace: String,
    provider_config_ref: String,
}

impl ManifestRenderer {
    pub fn new(spec: &CompositeInputSpec, config: &EngineConfig) -> Self {
        Self {
            app: config.project_tag.clone(),
            environment: spec.environment_suffix.clone(),
            namespace: spec.namespace.clone(),
            provider_config_ref: spec.provider_config_ref.clone(),
        }
    }

    /// Render every node in graph order
    pub fn render_graph(&self, graph: &ResourceGraph) -> Vec<Value> {
        graph.nodes().iter().map(|node| self.render(node)).collect()
    }

    pub fn render(&self, node: &ResourceNode) -> Value {
        if node.kind() == ResourceKind::Secret {
            return self.render_secret(node);
        }

        let mut metadata = json!({
            "name": node.name(),
            "labels": self.labels(node),
        });
        if !node.depends_on().is_empty() {
            let ids: Vec<&str> = node.depends_on().iter().map(|id| id.as_str()).collect();
            metadata["annotations"] = json!({ DEPENDS_ON_ANNOTATION: ids.join(",") });
        }

        let mut spec = json!({
            "forProvider": node.properties(),
            "providerConfigRef": { "name": self.provider_config_ref },
        });
        if !node.connection_details().is_empty() {
            spec["writeConnectionSecretToRef"] = json!({
                "name": node.name(),
                "namespace": self.namespace,
            });
        }

        json!({
            "apiVersion": node.kind().api_version(),
            "kind": node.kind().kind_name(),
            "metadata": metadata,
            "spec": spec,
        })
    }

    /// Connection bundle as a namespaced `Secret` with base64 data
    pub fn render_bundle(&self, bundle: &SecretBundle) -> Value {
        let mut manifest = bundle.to_secret_manifest(&bundle.secret_name(), &self.namespace);
        manifest["metadata"]["labels"] = json!({
            "app": self.app,
            "environment": self.environment,
            "component": "connection",
        });
        manifest
    }

    fn render_secret(&self, node: &ResourceNode) -> Value {
        let mut manifest = Map::new();
        manifest.insert("apiVersion".into(), json!(node.kind().api_version()));
        manifest.insert("kind".into(), json!(node.kind().kind_name()));
        manifest.insert(
            "metadata".into(),
            json!({
                "name": node.name(),
                "namespace": self.namespace,
                "labels": self.labels(node),
            }),
        );
        if let Some(properties) = node.properties().as_object() {
            manifest.extend(properties.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Value::Object(manifest)
    }

    fn labels(&self, node: &ResourceNode) -> Value {
        json!({
            "app": self.app,
            "environment": self.environment,
            "component": node.kind().component().as_str(),
        })
    }
}
