//! AWS CLI transport.
//!
//! Every query is one `aws <service> <operation>` invocation with JSON
//! output and pagination disabled. Identifiers are pulled out of the JSON
//! response by walking a fixed key path.

use std::io::ErrorKind;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::credentials::AwsCredentials;
use crate::error::{OracleError, OracleResult};
use crate::oracle::{
    CacheApi, ComputeApi, ContainerApi, DatabaseApi, IdentityApi, LoadBalancingApi,
    LoadBalancingV2Api,
};
use crate::query::ResourceSet;

/// Provider implementation backed by the `aws` command line tool.
#[derive(Debug, Clone)]
pub struct AwsCliOracle {
    program: String,
    credentials: AwsCredentials,
}

impl AwsCliOracle {
    pub fn new(credentials: AwsCredentials) -> Self {
        Self {
            program: "aws".to_string(),
            credentials,
        }
    }

    /// Use a different executable, e.g. a wrapper script.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn credentials(&self) -> &AwsCredentials {
        &self.credentials
    }

    /// Arguments for one invocation.
    pub fn command_args(&self, service: &str, operation: &str, extra: &[&str]) -> Vec<String> {
        let mut args = vec![
            service.to_string(),
            operation.to_string(),
            "--output".to_string(),
            "json".to_string(),
            "--no-paginate".to_string(),
        ];
        args.extend(extra.iter().map(|arg| arg.to_string()));
        if let Some(region) = &self.credentials.region {
            args.push("--region".to_string());
            args.push(region.clone());
        }
        if !self.credentials.has_static_keys() {
            if let Some(profile) = &self.credentials.profile {
                args.push("--profile".to_string());
                args.push(profile.clone());
            }
        }
        args
    }

    async fn call(&self, service: &str, operation: &str, extra: &[&str]) -> OracleResult<Value> {
        let query = format!("{} {}", service, operation);
        let args = self.command_args(service, operation, extra);
        debug!("Executing: {} {}", self.program, args.join(" "));

        let output = Command::new(&self.program)
            .args(&args)
            .envs(self.credentials.environment())
            .output()
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => {
                    OracleError::Unavailable(format!("{} executable not found", self.program))
                }
                _ => OracleError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OracleError::query_failed(query, stderr.trim()));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| OracleError::InvalidResponse {
            query,
            message: e.to_string(),
        })
    }

    async fn collect(
        &self,
        service: &str,
        operation: &str,
        path: &[&str],
        field: &str,
    ) -> OracleResult<ResourceSet> {
        let response = self.call(service, operation, &[]).await?;
        Ok(extract_strings(&response, path, field))
    }
}

/// Collect `field` from every object reached by following `path`.
/// Arrays met along the way are flattened.
pub fn extract_strings(value: &Value, path: &[&str], field: &str) -> ResourceSet {
    let mut out = ResourceSet::new();
    walk(value, path, field, &mut out);
    out
}

fn walk(value: &Value, path: &[&str], field: &str, out: &mut ResourceSet) {
    match (value, path.split_first()) {
        (Value::Array(items), _) => {
            for item in items {
                walk(item, path, field, out);
            }
        }
        (_, None) => {
            if let Some(s) = value.get(field).and_then(Value::as_str) {
                out.insert(s.to_string());
            }
        }
        (_, Some((key, rest))) => {
            if let Some(next) = value.get(*key) {
                walk(next, rest, field, out);
            }
        }
    }
}

/// `<vpc_id>.<group_name>` keys from a DescribeSecurityGroups response.
pub fn security_group_keys(response: &Value) -> ResourceSet {
    response
        .get("SecurityGroups")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|group| {
            let name = group.get("GroupName")?.as_str()?;
            let vpc = group.get("VpcId").and_then(Value::as_str).unwrap_or_default();
            Some(format!("{}.{}", vpc, name))
        })
        .collect()
}

#[async_trait]
impl ComputeApi for AwsCliOracle {
    async fn security_group_ids(&self) -> OracleResult<ResourceSet> {
        self.collect("ec2", "describe-security-groups", &["SecurityGroups"], "GroupId")
            .await
    }

    async fn security_group_names(&self) -> OracleResult<ResourceSet> {
        let response = self.call("ec2", "describe-security-groups", &[]).await?;
        Ok(security_group_keys(&response))
    }

    async fn subnet_ids(&self) -> OracleResult<ResourceSet> {
        self.collect("ec2", "describe-subnets", &["Subnets"], "SubnetId")
            .await
    }

    async fn instance_ids(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "ec2",
            "describe-instances",
            &["Reservations", "Instances"],
            "InstanceId",
        )
        .await
    }

    async fn key_pair_names(&self) -> OracleResult<ResourceSet> {
        self.collect("ec2", "describe-key-pairs", &["KeyPairs"], "KeyName")
            .await
    }

    async fn image_ids(&self) -> OracleResult<ResourceSet> {
        self.collect("ec2", "describe-images", &["Images"], "ImageId")
            .await
    }

    async fn default_vpc_id(&self) -> OracleResult<Option<String>> {
        let response = self
            .call(
                "ec2",
                "describe-vpcs",
                &["--filters", "Name=isDefault,Values=true"],
            )
            .await?;
        let mut ids: Vec<String> = extract_strings(&response, &["Vpcs"], "VpcId")
            .into_iter()
            .collect();
        ids.sort();
        Ok(ids.into_iter().next())
    }

    async fn egress_only_internet_gateway_ids(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "ec2",
            "describe-egress-only-internet-gateways",
            &["EgressOnlyInternetGateways"],
            "EgressOnlyInternetGatewayId",
        )
        .await
    }

    async fn internet_gateway_ids(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "ec2",
            "describe-internet-gateways",
            &["InternetGateways"],
            "InternetGatewayId",
        )
        .await
    }

    async fn nat_gateway_ids(&self) -> OracleResult<ResourceSet> {
        self.collect("ec2", "describe-nat-gateways", &["NatGateways"], "NatGatewayId")
            .await
    }

    async fn network_interface_ids(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "ec2",
            "describe-network-interfaces",
            &["NetworkInterfaces"],
            "NetworkInterfaceId",
        )
        .await
    }

    async fn route_table_ids(&self) -> OracleResult<ResourceSet> {
        self.collect("ec2", "describe-route-tables", &["RouteTables"], "RouteTableId")
            .await
    }

    async fn vpc_peering_connection_ids(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "ec2",
            "describe-vpc-peering-connections",
            &["VpcPeeringConnections"],
            "VpcPeeringConnectionId",
        )
        .await
    }
}

#[async_trait]
impl DatabaseApi for AwsCliOracle {
    async fn db_subnet_group_names(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "rds",
            "describe-db-subnet-groups",
            &["DBSubnetGroups"],
            "DBSubnetGroupName",
        )
        .await
    }

    async fn option_group_names(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "rds",
            "describe-option-groups",
            &["OptionGroupsList"],
            "OptionGroupName",
        )
        .await
    }

    async fn db_parameter_group_names(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "rds",
            "describe-db-parameter-groups",
            &["DBParameterGroups"],
            "DBParameterGroupName",
        )
        .await
    }

    async fn db_instance_identifiers(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "rds",
            "describe-db-instances",
            &["DBInstances"],
            "DBInstanceIdentifier",
        )
        .await
    }
}

#[async_trait]
impl CacheApi for AwsCliOracle {
    async fn cache_parameter_group_names(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "elasticache",
            "describe-cache-parameter-groups",
            &["CacheParameterGroups"],
            "CacheParameterGroupName",
        )
        .await
    }

    async fn cache_subnet_group_names(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "elasticache",
            "describe-cache-subnet-groups",
            &["CacheSubnetGroups"],
            "CacheSubnetGroupName",
        )
        .await
    }

    async fn cache_cluster_ids(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "elasticache",
            "describe-cache-clusters",
            &["CacheClusters"],
            "CacheClusterId",
        )
        .await
    }
}

#[async_trait]
impl LoadBalancingApi for AwsCliOracle {
    async fn load_balancer_names(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "elb",
            "describe-load-balancers",
            &["LoadBalancerDescriptions"],
            "LoadBalancerName",
        )
        .await
    }
}

#[async_trait]
impl LoadBalancingV2Api for AwsCliOracle {
    async fn load_balancer_names(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "elbv2",
            "describe-load-balancers",
            &["LoadBalancers"],
            "LoadBalancerName",
        )
        .await
    }
}

#[async_trait]
impl IdentityApi for AwsCliOracle {
    async fn instance_profile_names(&self) -> OracleResult<ResourceSet> {
        self.collect(
            "iam",
            "list-instance-profiles",
            &["InstanceProfiles"],
            "InstanceProfileName",
        )
        .await
    }
}

#[async_trait]
impl ContainerApi for AwsCliOracle {
    async fn cluster_names(&self) -> OracleResult<ResourceSet> {
        let response = self.call("ecs", "list-clusters", &[]).await?;
        Ok(response
            .get("clusterArns")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .filter_map(|arn| arn.rsplit('/').next())
            .map(str::to_string)
            .collect())
    }
}
