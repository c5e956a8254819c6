//! Tenderly contract verification client and deployment tracking
pub mod api;
pub mod config;
pub mod contract;
pub mod errors;
#[cfg(feature = "ethers")]
pub mod ethers;
pub mod factory;
pub mod links;
pub mod log_compliance;
pub mod plugin;
pub mod service;

pub use api::{
    ApiClient, CompilerConfig, ContractCompiler, ContractDeployment, ContractSubmission,
    ForkVerificationRequest, Network, Principal, Project, VerificationRequest,
    VerificationResponse,
};
pub use config::{ApiSettings, Credentials, PluginConfig, PluginConfigBuilder, ProjectSettings};
pub use contract::{NativeContract, TrackedContract};
pub use errors::ServiceError;
pub use factory::{FactorySurface, NativeContractFactory, TrackedContractFactory};
pub use plugin::{
    ArtifactSource, ContractArtifact, ContractByName, Libraries, PluginContext, VerificationPlugin,
};
pub use service::{VerificationOutcome, VerificationService, VerifiedContract};
