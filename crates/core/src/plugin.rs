//! Plugin context that tracked contracts report their deployments to

use crate::{
    api::{
        CompilerConfig, ContractCompiler, ContractDeployment, ContractSubmission,
        ForkVerificationRequest, VerificationRequest,
    },
    config::PluginConfig,
    service::{VerificationOutcome, VerificationService},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::{error, warn};

/// Linked library addresses keyed by library name
pub type Libraries = BTreeMap<String, String>;

/// A deployed contract identified by its name in the build output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractByName {
    pub name: String,
    pub address: String,
    /// Chain id, defaults to the configured one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub libraries: Option<Libraries>,
}

/// Receives deployments of tracked contracts
#[async_trait]
pub trait PluginContext: Send + Sync {
    async fn verify(&self, contracts: &[ContractByName]) -> VerificationOutcome;
}

/// Compiled output of a contract, supplied by the build toolchain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContractArtifact {
    pub source: String,
    pub source_path: String,
    pub compiler: ContractCompiler,
    pub config: CompilerConfig,
}

/// Looks up compiled contracts by name
pub trait ArtifactSource: Send + Sync {
    fn artifact(&self, contract_name: &str) -> Option<ContractArtifact>;
}

impl ArtifactSource for BTreeMap<String, ContractArtifact> {
    fn artifact(&self, contract_name: &str) -> Option<ContractArtifact> {
        self.get(contract_name).cloned()
    }
}

/// Fork that deployments currently go to, and its head transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ForkTarget {
    fork_id: Option<String>,
    head: Option<String>,
}

/// Verifies tracked deployments according to the plugin configuration.
///
/// The fork id and head start from the config and can be changed while
/// deployments run.
pub struct VerificationPlugin {
    config: PluginConfig,
    service: VerificationService,
    artifacts: Arc<dyn ArtifactSource>,
    fork: RwLock<ForkTarget>,
}

impl VerificationPlugin {
    pub fn new(config: PluginConfig, artifacts: Arc<dyn ArtifactSource>) -> Self {
        let service = VerificationService::new(config.api.clone(), config.credentials());
        let fork = RwLock::new(ForkTarget {
            fork_id: config.project.fork_id.clone(),
            head: config.project.head.clone(),
        });
        Self {
            config,
            service,
            artifacts,
            fork,
        }
    }

    /// Replace the service, e.g. to use a custom plugin name
    pub fn with_service(mut self, service: VerificationService) -> Self {
        self.service = service;
        self
    }

    pub fn service(&self) -> &VerificationService {
        &self.service
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn fork(&self) -> Option<String> {
        self.fork_target().fork_id
    }

    /// Route later verifications to this fork, or back to the network with `None`
    pub fn set_fork(&self, fork_id: Option<String>) {
        self.fork.write().unwrap_or_else(PoisonError::into_inner).fork_id = fork_id;
    }

    pub fn head(&self) -> Option<String> {
        self.fork_target().head
    }

    /// Fork transaction sent as the root of later fork verifications
    pub fn set_head(&self, head: Option<String>) {
        self.fork.write().unwrap_or_else(PoisonError::into_inner).head = head;
    }

    fn fork_target(&self) -> ForkTarget {
        self.fork.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Resolves contracts into a request. Contracts without an artifact are skipped.
    pub fn build_request(&self, contracts: &[ContractByName]) -> VerificationRequest {
        let mut request = VerificationRequest::default();

        for contract in contracts {
            let Some(artifact) = self.artifacts.artifact(&contract.name) else {
                warn!(contract = %contract.name, "No compiled artifact found, skipping");
                continue;
            };

            if request.contracts.is_empty() {
                request.config = artifact.config.clone();
            }

            let mut networks = BTreeMap::new();
            let network = contract
                .network
                .clone()
                .or_else(|| self.config.project.chain_id.map(|id| id.to_string()));
            if let Some(network) = network {
                networks.insert(
                    network,
                    ContractDeployment {
                        address: contract.address.clone(),
                        transaction_hash: None,
                        links: contract.libraries.clone().unwrap_or_default(),
                    },
                );
            }

            request.contracts.push(ContractSubmission {
                contract_name: contract.name.clone(),
                source: artifact.source,
                source_path: artifact.source_path,
                compiler: Some(artifact.compiler),
                networks,
                constructor_arguments: None,
            });
        }

        request
    }

    /// Verifies on the configured fork, pushes privately, or verifies publicly
    pub async fn verify_contracts(&self, contracts: &[ContractByName]) -> VerificationOutcome {
        let request = self.build_request(contracts);
        let project = &self.config.project;
        let fork = self.fork_target();

        if !project.private_verification && fork.fork_id.is_none() {
            return self.service.verify_publicly(&request).await;
        }

        let (Some(username), Some(project_slug)) = (&project.username, &project.project) else {
            error!("Project and username must be configured for private or fork verification");
            return VerificationOutcome::MissingProject;
        };

        match &fork.fork_id {
            Some(fork_id) => {
                let request = ForkVerificationRequest {
                    root: fork.head.clone(),
                    config: request.config,
                    contracts: request.contracts,
                };
                self.service
                    .verify_on_fork(&request, project_slug, username, fork_id)
                    .await
            }
            None => {
                self.service
                    .push_privately(&request, project_slug, username)
                    .await
            }
        }
    }

    /// Raw public verification request
    pub async fn verify_api(&self, request: &VerificationRequest) -> VerificationOutcome {
        self.service.verify_publicly(request).await
    }

    /// Raw private push request
    pub async fn push_api(
        &self,
        request: &VerificationRequest,
        project: &str,
        username: &str,
    ) -> VerificationOutcome {
        self.service.push_privately(request, project, username).await
    }

    /// Raw fork verification request
    pub async fn verify_fork_api(
        &self,
        request: &ForkVerificationRequest,
        project: &str,
        username: &str,
        fork_id: &str,
    ) -> VerificationOutcome {
        self.service
            .verify_on_fork(request, project, username, fork_id)
            .await
    }
}

#[async_trait]
impl PluginContext for VerificationPlugin {
    async fn verify(&self, contracts: &[ContractByName]) -> VerificationOutcome {
        self.verify_contracts(contracts).await
    }
}
