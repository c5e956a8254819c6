//! Compact, log-safe summaries of API payloads and errors
//!
//! Response bodies can be large and error bodies may echo request headers, so
//! nothing coming back from the API is logged verbatim.

use crate::{
    api::{Network, Project, VerificationResponse},
    errors::ServiceError,
};

/// Longest body excerpt kept in a log line
pub const MAX_BODY_EXCERPT: usize = 200;

const REDACTED: &str = "[redacted]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCompliantApiError {
    pub kind: &'static str,
    pub status: Option<u16>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCompliantNetwork {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCompliantProject {
    pub id: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCompliantVerificationResponse {
    pub verified_contracts: Option<usize>,
    pub addresses: Vec<String>,
    pub has_bytecode_mismatch: bool,
}

/// Summarizes an error, dropping the access key and truncating response bodies
pub fn api_error(err: &ServiceError, access_key: Option<&str>) -> LogCompliantApiError {
    let (status, message) = match err {
        ServiceError::Status { status, body } => (Some(status.as_u16()), excerpt(body)),
        ServiceError::Transport(inner) => (
            inner.status().map(|s| s.as_u16()),
            inner.to_string(),
        ),
        other => (None, other.to_string()),
    };

    LogCompliantApiError {
        kind: err.kind(),
        status,
        message: scrub(&message, access_key),
    }
}

pub fn networks(networks: &[Network]) -> Vec<LogCompliantNetwork> {
    networks
        .iter()
        .map(|n| LogCompliantNetwork {
            id: n.id.clone(),
            name: n.name.clone(),
        })
        .collect()
}

pub fn projects(projects: &[Project]) -> Vec<LogCompliantProject> {
    projects
        .iter()
        .map(|p| LogCompliantProject {
            id: p.id.clone(),
            slug: p.slug.clone(),
        })
        .collect()
}

pub fn verification_response(response: &VerificationResponse) -> LogCompliantVerificationResponse {
    LogCompliantVerificationResponse {
        verified_contracts: response.contracts.as_ref().map(Vec::len),
        addresses: response
            .contracts
            .iter()
            .flatten()
            .map(|c| c.address.clone())
            .collect(),
        has_bytecode_mismatch: response.bytecode_mismatch_errors.is_some(),
    }
}

/// First `MAX_BODY_EXCERPT` characters of a body, on a single line
pub fn excerpt(body: &str) -> String {
    let single_line = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= MAX_BODY_EXCERPT {
        return single_line;
    }
    let mut cut: String = single_line.chars().take(MAX_BODY_EXCERPT).collect();
    cut.push_str("...");
    cut
}

/// Replaces every occurrence of the access key
pub fn scrub(text: &str, access_key: Option<&str>) -> String {
    match access_key {
        Some(key) if !key.is_empty() => text.replace(key, REDACTED),
        _ => text.to_string(),
    }
}
