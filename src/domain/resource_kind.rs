// Copyright (c) 2025 - Cowboy AI, Inc.
//! Cloud Resource Kind Domain Model
//!
//! Defines the taxonomy of resource descriptors the composition engine can
//! emit. Each kind knows its provider API group, its kind name, the token
//! used in generated names, the component it belongs to, and which naming
//! policy decides whether a configuration change updates or replaces it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource descriptor kinds emitted into a resource graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    // Network
    /// Virtual private cloud (network container)
    Vpc,
    /// Internet gateway attached to the VPC
    InternetGateway,
    /// Subnet in one availability zone
    Subnet,
    /// Route table
    RouteTable,
    /// Single route in a route table
    Route,
    /// Subnet to route table binding
    RouteTableAssociation,

    // Security
    /// Security group
    SecurityGroup,
    /// Ingress or egress rule of a security group
    SecurityGroupRule,
    /// IAM role assumed by enhanced monitoring
    Role,
    /// Managed policy attached to a role
    RolePolicyAttachment,

    // Database
    /// Cluster-level parameter group
    ClusterParameterGroup,
    /// Instance-level parameter group
    ParameterGroup,
    /// Database subnet group
    SubnetGroup,
    /// Secret holding the master password
    Secret,
    /// Aurora database cluster
    Cluster,
    /// Aurora cluster member instance
    ClusterInstance,
}

impl ResourceKind {
    /// Every kind, in the order the builder emits them
    pub const ALL: [ResourceKind; 16] = [
        Self::Vpc,
        Self::InternetGateway,
        Self::Subnet,
        Self::RouteTable,
        Self::Route,
        Self::RouteTableAssociation,
        Self::SecurityGroup,
        Self::SecurityGroupRule,
        Self::Role,
        Self::RolePolicyAttachment,
        Self::ClusterParameterGroup,
        Self::ParameterGroup,
        Self::SubnetGroup,
        Self::Secret,
        Self::Cluster,
        Self::ClusterInstance,
    ];

    /// Provider API group and version
    pub fn api_version(&self) -> &'static str {
        match self.component() {
            Component::Network => "ec2.aws.upbound.io/v1beta1",
            Component::Security => match self {
                Self::Role | Self::RolePolicyAttachment => "iam.aws.upbound.io/v1beta1",
                _ => "ec2.aws.upbound.io/v1beta1",
            },
            Component::Database => match self {
                Self::Secret => "v1",
                _ => "rds.aws.upbound.io/v1beta1",
            },
        }
    }

    /// Provider kind name
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Vpc => "VPC",
            Self::InternetGateway => "InternetGateway",
            Self::Subnet => "Subnet",
            Self::RouteTable => "RouteTable",
            Self::Route => "Route",
            Self::RouteTableAssociation => "RouteTableAssociation",
            Self::SecurityGroup => "SecurityGroup",
            Self::SecurityGroupRule => "SecurityGroupRule",
            Self::Role => "Role",
            Self::RolePolicyAttachment => "RolePolicyAttachment",
            Self::ClusterParameterGroup => "ClusterParameterGroup",
            Self::ParameterGroup => "ParameterGroup",
            Self::SubnetGroup => "SubnetGroup",
            Self::Secret => "Secret",
            Self::Cluster => "Cluster",
            Self::ClusterInstance => "ClusterInstance",
        }
    }

    /// Token used inside generated resource names
    pub fn name_token(&self) -> &'static str {
        match self {
            Self::Vpc => "vpc",
            Self::InternetGateway => "igw",
            Self::Subnet => "subnet",
            Self::RouteTable => "route-table",
            Self::Route => "route",
            Self::RouteTableAssociation => "route-assoc",
            Self::SecurityGroup => "security-group",
            Self::SecurityGroupRule => "sg-rule",
            Self::Role => "monitoring-role",
            Self::RolePolicyAttachment => "monitoring-policy",
            Self::ClusterParameterGroup => "cluster-params",
            Self::ParameterGroup => "instance-params",
            Self::SubnetGroup => "subnet-group",
            Self::Secret => "password",
            Self::Cluster => "cluster",
            Self::ClusterInstance => "instance",
        }
    }

    /// Component the kind belongs to, used for the `Component` tag
    pub fn component(&self) -> Component {
        match self {
            Self::Vpc
            | Self::InternetGateway
            | Self::Subnet
            | Self::RouteTable
            | Self::Route
            | Self::RouteTableAssociation => Component::Network,

            Self::SecurityGroup
            | Self::SecurityGroupRule
            | Self::Role
            | Self::RolePolicyAttachment => Component::Security,

            Self::ClusterParameterGroup
            | Self::ParameterGroup
            | Self::SubnetGroup
            | Self::Secret
            | Self::Cluster
            | Self::ClusterInstance => Component::Database,
        }
    }

    /// Naming policy for the kind
    ///
    /// Parameter groups cannot be modified in place when their family
    /// changes, so their name carries a content hash and a new group is
    /// created whenever the defining configuration changes.
    pub fn naming_policy(&self) -> NamingPolicy {
        match self {
            Self::ClusterParameterGroup | Self::ParameterGroup => NamingPolicy::VersionedHash,
            _ => NamingPolicy::Suffix,
        }
    }

    /// Whether the provider accepts a `tags` map for the kind
    pub fn is_taggable(&self) -> bool {
        !matches!(
            self,
            Self::Route
                | Self::RouteTableAssociation
                | Self::SecurityGroupRule
                | Self::RolePolicyAttachment
                | Self::Secret
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind_name())
    }
}

/// Component grouping of resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// VPC, subnets, routing
    Network,
    /// Security groups and IAM
    Security,
    /// Aurora cluster and its supporting objects
    Database,
}

impl Component {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Security => "security",
            Self::Database => "database",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a kind's resource name is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingPolicy {
    /// `<prefix>-<kind>-<suffix>`: stable while the suffix is unchanged,
    /// configuration changes update the live resource in place
    Suffix,
    /// `<prefix>-<kind>-<version>-<hash>`: the name changes with the
    /// defining configuration, forcing replacement
    VersionedHash,
}
