//! HTTP clients and payloads for the verification API

mod client;
mod types;

pub use client::{ApiClient, ClientKind, ACCESS_KEY_HEADER};
pub(crate) use types::{BlockNumberResponse, PrincipalResponse, ProjectsResponse};
pub use types::{
    CompilerConfig, ContractCompiler, ContractDeployment, ContractSubmission,
    ForkVerificationRequest, Network, Principal, Project, VerificationRequest,
    VerificationResponse, VerifiedContractDescriptor,
};
