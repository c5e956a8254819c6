//! Request and response payloads of the verification API

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Public verification or private push of one or more contracts
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VerificationRequest {
    #[serde(default)]
    pub config: CompilerConfig,
    pub contracts: Vec<ContractSubmission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Verification of contracts deployed on a fork
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ForkVerificationRequest {
    /// Fork transaction the contracts were deployed at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default)]
    pub config: CompilerConfig,
    pub contracts: Vec<ContractSubmission>,
}

/// Global compiler settings shared by every submitted contract
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompilerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizations_used: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimizations_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evm_version: Option<String>,
}

/// One contract in a verification request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractSubmission {
    pub contract_name: String,
    pub source: String,
    pub source_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<ContractCompiler>,
    /// Deployments keyed by chain id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub networks: BTreeMap<String, ContractDeployment>,
    /// ABI-encoded constructor arguments, hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor_arguments: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContractCompiler {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

/// Where a contract is deployed on a given chain
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContractDeployment {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    /// Linked library addresses keyed by library name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, String>,
}

/// Reply to any of the three verification endpoints
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct VerificationResponse {
    #[serde(default)]
    pub contracts: Option<Vec<VerifiedContractDescriptor>>,
    #[serde(default)]
    pub bytecode_mismatch_errors: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VerifiedContractDescriptor {
    pub address: String,
    #[serde(deserialize_with = "string_or_number")]
    pub network_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_name: Option<String>,
}

/// A chain supported by the service
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Network {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ethereum_network_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BlockNumberResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub block_number: String,
}

/// The user associated with the current access key
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PrincipalResponse {
    pub user: Principal,
}

/// A project owned by the principal
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Project {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProjectsResponse {
    /// Absent or `null` when the reply is malformed
    #[serde(default)]
    pub projects: Option<Vec<Project>>,
}

/// Ids and block numbers come back as either JSON strings or numbers
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

impl VerificationRequest {
    /// Names of the requested contracts, in request order
    pub fn contract_names(&self) -> Vec<String> {
        contract_names(&self.contracts)
    }
}

impl ForkVerificationRequest {
    pub fn contract_names(&self) -> Vec<String> {
        contract_names(&self.contracts)
    }
}

fn contract_names(contracts: &[ContractSubmission]) -> Vec<String> {
    contracts.iter().map(|c| c.contract_name.clone()).collect()
}
