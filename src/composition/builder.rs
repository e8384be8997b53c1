// Copyright (c) 2025 - Cowboy AI, Inc.
//! Resource Graph Builder
//!
//! Turns a validated spec, its zone selection and CIDR plan into the
//! ordered node list the orchestrator applies. Nodes are emitted in
//! dependency order:
//!
//! ```text
//! VPC
//!  ├─ InternetGateway
//!  ├─ Subnet (tier, zone) ──┐
//!  ├─ RouteTable (tier) ────┼─ Route (tier → gateway)
//!  │                        └─ RouteTableAssociation (tier, zone)
//!  └─ SecurityGroup ─ SecurityGroupRule (ingress, egress)
//! Role ─ RolePolicyAttachment
//! ClusterParameterGroup, ParameterGroup
//! SubnetGroup (database subnets)
//! Secret (master password)
//! Cluster ─ ClusterInstance × instanceCount
//! ```
//!
//! References between nodes are expressed with provider `*Ref`/`*Refs`
//! fields carrying the target's name; the graph derives `depends_on` from
//! them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::composition::cidr::CidrPlan;
use crate::composition::graph::{GraphAssembler, ResourceGraph};
use crate::composition::naming::{Namer, MAX_NAME_LENGTH};
use crate::config::EngineConfig;
use crate::domain::region::AvailabilityZoneSet;
use crate::domain::resource_kind::ResourceKind;
use crate::domain::spec::{CompositeInputSpec, SubnetTier};
use crate::errors::{CompositionError, CompositionResult};

/// Database engine emitted on the cluster and its instances
pub const ENGINE: &str = "aurora-postgresql";

/// Key of the password inside the master password Secret
pub const PASSWORD_KEY: &str = "password";

/// Build the resource graph for one compilation
///
/// `password` is the replayed or freshly generated master password; `None`
/// hands password management to the provider.
pub fn build(
    spec: &CompositeInputSpec,
    zones: &AvailabilityZoneSet,
    plan: &CidrPlan,
    namer: &Namer,
    config: &EngineConfig,
    password: Option<&str>,
) -> CompositionResult<ResourceGraph> {
    GraphBuilder {
        spec,
        zones,
        plan,
        namer,
        config,
        graph: GraphAssembler::new(),
    }
    .build(password)
}

/// Provider endpoint of the cluster writer
pub fn cluster_endpoint(cluster: &str, region: &str) -> String {
    format!("{cluster}.cluster-{region}.rds.amazonaws.com")
}

/// Provider endpoint of the cluster readers
pub fn reader_endpoint(cluster: &str, region: &str) -> String {
    format!("{cluster}.cluster-ro-{region}.rds.amazonaws.com")
}

/// Name of the `ordinal`-th (1-based) cluster member
///
/// The cluster part is shortened so the ordinal always survives the length
/// cap.
pub fn instance_name(cluster: &str, ordinal: u32) -> String {
    let suffix = format!("-instance-{ordinal}");
    let keep = MAX_NAME_LENGTH
        .saturating_sub(suffix.len())
        .min(cluster.len());
    format!("{}{suffix}", cluster[..keep].trim_end_matches('-'))
}

struct GraphBuilder<'a> {
    spec: &'a CompositeInputSpec,
    zones: &'a AvailabilityZoneSet,
    plan: &'a CidrPlan,
    namer: &'a Namer,
    config: &'a EngineConfig,
    graph: GraphAssembler,
}

impl GraphBuilder<'_> {
    fn build(mut self, password: Option<&str>) -> CompositionResult<ResourceGraph> {
        self.network()?;
        self.security()?;
        let monitoring_role = self.monitoring()?;
        let (cluster_params, instance_params) = self.parameter_groups()?;
        let subnet_group = self.subnet_group()?;
        let secret = password.map(|p| self.password_secret(p)).transpose()?;
        let cluster = self.cluster(&subnet_group, &cluster_params, secret.as_deref())?;
        self.instances(&cluster, &instance_params, monitoring_role.as_deref())?;

        let graph = self.graph.finish()?;
        info!(
            region = %self.spec.region,
            suffix = %self.spec.environment_suffix,
            nodes = graph.len(),
            "Built resource graph"
        );
        Ok(graph)
    }

    fn region(&self) -> &str {
        &self.spec.region
    }

    fn tags(&self, kind: ResourceKind, name: &str) -> BTreeMap<String, String> {
        self.namer.tags(kind, name)
    }

    fn vpc_name(&self) -> String {
        self.namer.name(ResourceKind::Vpc, None)
    }

    fn gateway_name(&self) -> String {
        self.namer.name(ResourceKind::InternetGateway, None)
    }

    fn subnet_name(&self, tier: SubnetTier, zone_index: usize) -> String {
        self.namer
            .name(ResourceKind::Subnet, Some(&format!("{tier}-{zone_index}")))
    }

    fn route_table_name(&self, tier: SubnetTier) -> String {
        self.namer.name(ResourceKind::RouteTable, Some(tier.as_str()))
    }

    fn security_group_name(&self) -> String {
        self.namer.name(ResourceKind::SecurityGroup, None)
    }

    /// Explicit cluster names share the namespace of generated names
    fn ensure_cluster_name_free(&self, name: &str) -> CompositionResult<()> {
        if self.spec.cluster_name.is_some() && self.graph.contains_name(name) {
            return Err(CompositionError::validation(
                "clusterName",
                format!("{name} collides with another resource of this composite"),
            ));
        }
        Ok(())
    }

    fn cluster_name(&self) -> String {
        self.spec
            .cluster_name
            .clone()
            .unwrap_or_else(|| self.namer.name(ResourceKind::Cluster, None))
    }

    fn network(&mut self) -> CompositionResult<()> {
        let vpc = self.vpc_name();
        self.graph.add(
            "vpc",
            ResourceKind::Vpc,
            &vpc,
            json!({
                "region": self.region(),
                "cidrBlock": self.spec.vpc_cidr.to_string(),
                "enableDnsHostnames": true,
                "enableDnsSupport": true,
                "tags": self.tags(ResourceKind::Vpc, &vpc),
            }),
        )?;

        let gateway = self.gateway_name();
        self.graph.add(
            "internet-gateway",
            ResourceKind::InternetGateway,
            &gateway,
            json!({
                "region": self.region(),
                "vpcIdRef": { "name": vpc },
                "tags": self.tags(ResourceKind::InternetGateway, &gateway),
            }),
        )?;

        for allocation in self.plan.allocations() {
            let zone = self.zones.zones().get(allocation.zone_index).ok_or_else(|| {
                CompositionError::incomplete(format!(
                    "no availability zone for index {}",
                    allocation.zone_index
                ))
            })?;
            let name = self.subnet_name(allocation.tier, allocation.zone_index);
            let mut tags = self.tags(ResourceKind::Subnet, &name);
            tags.insert("Tier".to_string(), allocation.tier.to_string());

            self.graph.add(
                format!("subnet-{}-{}", allocation.tier, allocation.zone_index),
                ResourceKind::Subnet,
                &name,
                json!({
                    "region": self.region(),
                    "vpcIdRef": { "name": vpc },
                    "cidrBlock": allocation.cidr.to_string(),
                    "availabilityZone": zone,
                    "mapPublicIpOnLaunch": self.routes_to_gateway(allocation.tier),
                    "tags": tags,
                }),
            )?;
        }

        let tiers = self.plan.tiers();
        for tier in &tiers {
            let name = self.route_table_name(*tier);
            self.graph.add(
                format!("route-table-{tier}"),
                ResourceKind::RouteTable,
                &name,
                json!({
                    "region": self.region(),
                    "vpcIdRef": { "name": vpc },
                    "tags": self.tags(ResourceKind::RouteTable, &name),
                }),
            )?;
        }

        let routed: Vec<SubnetTier> = tiers
            .iter()
            .copied()
            .filter(|t| self.routes_to_gateway(*t))
            .collect();
        for tier in &routed {
            self.graph.add(
                format!("route-{tier}-internet"),
                ResourceKind::Route,
                self.namer
                    .name(ResourceKind::Route, Some(&format!("{tier}-internet"))),
                json!({
                    "region": self.region(),
                    "destinationCidrBlock": "0.0.0.0/0",
                    "routeTableIdRef": { "name": self.route_table_name(*tier) },
                    "gatewayIdRef": { "name": gateway },
                }),
            )?;
        }

        for allocation in self.plan.allocations() {
            let (tier, zone_index) = (allocation.tier, allocation.zone_index);
            self.graph.add(
                format!("route-table-association-{tier}-{zone_index}"),
                ResourceKind::RouteTableAssociation,
                self.namer.name(
                    ResourceKind::RouteTableAssociation,
                    Some(&format!("{tier}-{zone_index}")),
                ),
                json!({
                    "region": self.region(),
                    "subnetIdRef": { "name": self.subnet_name(tier, zone_index) },
                    "routeTableIdRef": { "name": self.route_table_name(tier) },
                }),
            )?;
        }

        debug!(
            subnets = self.plan.len(),
            route_tables = tiers.len(),
            "Planned network resources"
        );
        Ok(())
    }

    /// Public subnets always reach the gateway; database subnets only when
    /// the instances are publicly accessible
    fn routes_to_gateway(&self, tier: SubnetTier) -> bool {
        match tier {
            SubnetTier::Public => true,
            SubnetTier::Private => false,
            SubnetTier::Database => self.spec.publicly_accessible,
        }
    }

    fn security(&mut self) -> CompositionResult<()> {
        let group = self.security_group_name();
        self.graph.add(
            "security-group",
            ResourceKind::SecurityGroup,
            &group,
            json!({
                "region": self.region(),
                "name": group,
                "description": format!("PostgreSQL access for {}", self.cluster_name()),
                "vpcIdRef": { "name": self.vpc_name() },
                "tags": self.tags(ResourceKind::SecurityGroup, &group),
            }),
        )?;

        let sources: Vec<String> = self.spec.allowed_cidrs.iter().map(|c| c.to_string()).collect();
        self.graph.add(
            "security-group-ingress",
            ResourceKind::SecurityGroupRule,
            self.namer.name(ResourceKind::SecurityGroupRule, Some("ingress")),
            json!({
                "region": self.region(),
                "type": "ingress",
                "protocol": "tcp",
                "fromPort": self.config.db_port,
                "toPort": self.config.db_port,
                "cidrBlocks": sources,
                "description": "PostgreSQL access",
                "securityGroupIdRef": { "name": group },
            }),
        )?;

        self.graph.add(
            "security-group-egress",
            ResourceKind::SecurityGroupRule,
            self.namer.name(ResourceKind::SecurityGroupRule, Some("egress")),
            json!({
                "region": self.region(),
                "type": "egress",
                "protocol": "-1",
                "fromPort": 0,
                "toPort": 0,
                "cidrBlocks": ["0.0.0.0/0"],
                "description": "Allow all outbound traffic",
                "securityGroupIdRef": { "name": group },
            }),
        )?;
        Ok(())
    }

    /// Enhanced monitoring role; skipped when monitoring is disabled
    fn monitoring(&mut self) -> CompositionResult<Option<String>> {
        if self.config.monitoring_interval == 0 {
            debug!("Enhanced monitoring disabled, no monitoring role");
            return Ok(None);
        }

        let role = self.namer.name(ResourceKind::Role, None);
        let trust = serde_json::to_string(&json!({
            "Version": "2012-10-17",
            "Statement": [{
                "Effect": "Allow",
                "Principal": { "Service": "monitoring.rds.amazonaws.com" },
                "Action": "sts:AssumeRole",
            }],
        }))?;

        self.graph.add(
            "monitoring-role",
            ResourceKind::Role,
            &role,
            json!({
                "assumeRolePolicy": trust,
                "description": "Enhanced monitoring for Aurora",
                "tags": self.tags(ResourceKind::Role, &role),
            }),
        )?;

        self.graph.add(
            "monitoring-policy",
            ResourceKind::RolePolicyAttachment,
            self.namer.name(ResourceKind::RolePolicyAttachment, None),
            json!({
                "policyArn": self.config.monitoring_policy_arn,
                "roleRef": { "name": role },
            }),
        )?;
        Ok(Some(role))
    }

    fn parameter_groups(&mut self) -> CompositionResult<(String, String)> {
        let family = self.spec.parameter_group_family();
        let version = format!("pg{}", self.spec.engine_major_version());
        let parameters = json!([{
            "name": "shared_preload_libraries",
            "value": self.config.preload_libraries,
            "applyMethod": "pending-reboot",
        }]);

        let mut names = Vec::with_capacity(2);
        for (id, kind, description) in [
            (
                "cluster-parameter-group",
                ResourceKind::ClusterParameterGroup,
                "Cluster parameters for the vector extension",
            ),
            (
                "parameter-group",
                ResourceKind::ParameterGroup,
                "Instance parameters for the vector extension",
            ),
        ] {
            let name = self.namer.versioned_name(
                kind,
                &version,
                &json!({
                    "kind": kind.kind_name(),
                    "family": family,
                    "parameters": parameters,
                    "environment": self.spec.environment_suffix,
                }),
            )?;
            self.graph.add(
                id,
                kind,
                &name,
                json!({
                    "region": self.region(),
                    "family": family,
                    "description": description,
                    "parameter": parameters,
                    "tags": self.tags(kind, &name),
                }),
            )?;
            names.push(name);
        }

        let instance = names.pop().unwrap_or_default();
        let cluster = names.pop().unwrap_or_default();
        Ok((cluster, instance))
    }

    fn subnet_group(&mut self) -> CompositionResult<String> {
        let name = self.namer.name(ResourceKind::SubnetGroup, None);
        let subnets: Vec<Value> = (0..self.plan.tier_blocks(SubnetTier::Database).len())
            .map(|i| json!({ "name": self.subnet_name(SubnetTier::Database, i) }))
            .collect();

        self.graph.add(
            "subnet-group",
            ResourceKind::SubnetGroup,
            &name,
            json!({
                "region": self.region(),
                "description": format!("Database subnets for {}", self.cluster_name()),
                "subnetIdRefs": subnets,
                "tags": self.tags(ResourceKind::SubnetGroup, &name),
            }),
        )?;
        Ok(name)
    }

    fn password_secret(&mut self, password: &str) -> CompositionResult<String> {
        let name = self.namer.name(ResourceKind::Secret, None);
        self.graph.add_with_details(
            "master-password",
            ResourceKind::Secret,
            &name,
            json!({
                "type": "Opaque",
                "data": { PASSWORD_KEY: BASE64.encode(password) },
            }),
            BTreeMap::from([(PASSWORD_KEY.to_string(), password.to_string())]),
        )?;
        Ok(name)
    }

    fn cluster(
        &mut self,
        subnet_group: &str,
        cluster_params: &str,
        secret: Option<&str>,
    ) -> CompositionResult<String> {
        let spec = self.spec;
        let name = self.cluster_name();
        self.ensure_cluster_name_free(&name)?;

        let mut properties = json!({
            "region": self.region(),
            "engine": ENGINE,
            "engineMode": "provisioned",
            "engineVersion": spec.engine_version,
            "databaseName": spec.database_name,
            "masterUsername": spec.master_username,
            "port": self.config.db_port,
            "dbSubnetGroupNameRef": { "name": subnet_group },
            "vpcSecurityGroupIdRefs": [{ "name": self.security_group_name() }],
            "dbClusterParameterGroupNameRef": { "name": cluster_params },
            "serverlessv2ScalingConfiguration": [{
                "minCapacity": spec.min_capacity,
                "maxCapacity": spec.max_capacity,
            }],
            "backupRetentionPeriod": spec.backup_retention_days,
            "preferredBackupWindow": spec.backup_window.to_string(),
            "preferredMaintenanceWindow": spec.maintenance_window.to_string(),
            "deletionProtection": spec.deletion_protection,
            "storageEncrypted": true,
            "skipFinalSnapshot": false,
            "finalSnapshotIdentifier": format!("{name}-final-snapshot"),
            "copyTagsToSnapshot": true,
            "iamDatabaseAuthenticationEnabled": false,
            "tags": self.tags(ResourceKind::Cluster, &name),
        });

        match secret {
            Some(secret) => {
                properties["masterPasswordSecretRef"] = json!({
                    "name": secret,
                    "namespace": spec.namespace,
                    "key": PASSWORD_KEY,
                });
            }
            None => {
                properties["manageMasterUserPassword"] = json!(true);
            }
        }

        let details = BTreeMap::from([
            ("clusterIdentifier".to_string(), name.clone()),
            ("endpoint".to_string(), cluster_endpoint(&name, self.region())),
            ("readerEndpoint".to_string(), reader_endpoint(&name, self.region())),
            ("port".to_string(), self.config.db_port.to_string()),
            ("username".to_string(), spec.master_username.clone()),
        ]);

        self.graph
            .add_with_details("cluster", ResourceKind::Cluster, &name, properties, details)?;
        Ok(name)
    }

    fn instances(
        &mut self,
        cluster: &str,
        instance_params: &str,
        monitoring_role: Option<&str>,
    ) -> CompositionResult<()> {
        for index in 0..self.spec.instance_count {
            let ordinal = index + 1;
            let name = instance_name(cluster, ordinal);
            self.ensure_cluster_name_free(&name)?;

            let mut properties = json!({
                "region": self.region(),
                "engine": ENGINE,
                "instanceClass": self.spec.instance_class,
                "clusterIdentifierRef": { "name": cluster },
                "dbParameterGroupNameRef": { "name": instance_params },
                "promotionTier": index,
                "publiclyAccessible": self.spec.publicly_accessible,
                "autoMinorVersionUpgrade": true,
                "performanceInsightsEnabled": true,
                "performanceInsightsRetentionPeriod": self.config.performance_insights_retention,
                "tags": self.tags(ResourceKind::ClusterInstance, &name),
            });

            if let Some(role) = monitoring_role {
                properties["monitoringInterval"] = json!(self.config.monitoring_interval);
                properties["monitoringRoleArnRef"] = json!({ "name": role });
            }

            self.graph.add(
                format!("instance-{ordinal}"),
                ResourceKind::ClusterInstance,
                &name,
                properties,
            )?;
        }
        Ok(())
    }
}
