//! Error types and the fixed user-facing failure messages

use reqwest::StatusCode;

pub const API_VERIFICATION_REQUEST_ERR_MSG: &str = "Unexpected error occurred while verifying contracts. \
     This can happen if your access key is invalid or a wrong project slug or username is provided. \
     Please check your configuration and try again.";

pub const BYTECODE_MISMATCH_ERR_MSG: &str =
    "Compiled bytecode of the submitted contracts does not match the bytecode deployed on-chain. \
     Verification failed.";

pub const NO_NEW_CONTRACTS_VERIFIED_ERR_MSG: &str =
    "No new contracts were verified. They may already be verified. Requested contracts:";

pub const NO_VERIFIABLE_CONTRACTS_ERR_MSG: &str =
    "No verifiable contracts provided. Nothing to verify.";

pub const NETWORK_FETCH_FAILED_ERR_MSG: &str =
    "There was an error while fetching public networks from Tenderly.";

pub const LATEST_BLOCK_NUMBER_FETCH_FAILED_ERR_MSG: &str =
    "There was an error while fetching the latest block number from Tenderly.";

pub const ACCESS_TOKEN_NOT_PROVIDED_ERR_MSG: &str =
    "Access key not provided. Set `access_key` in the [project] section of the config file \
     or the TENDERLY_ACCESS_KEY environment variable.";

pub const PRINCIPAL_FETCH_FAILED_ERR_MSG: &str =
    "There was an error while fetching the user associated with the access key.";

pub const PROJECTS_FETCH_FAILED_ERR_MSG: &str =
    "There was an error while fetching projects from Tenderly.";

/// Failures that can occur while talking to the API
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("base url cannot carry a path: {0}")]
    InvalidBaseUrl(url::Url),

    #[error("invalid access key header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

impl ServiceError {
    /// Short machine-friendly name of the failure category
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Transport(_) => "transport",
            ServiceError::Status { .. } => "status",
            ServiceError::Decode(_) => "decode",
            ServiceError::InvalidBaseUrl(_) => "invalid_url",
            ServiceError::InvalidHeader(_) => "invalid_header",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = ServiceError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: "{}".to_string(),
        };
        assert_eq!(err.kind(), "status");
        assert_eq!(err.to_string(), "unexpected status 401 Unauthorized: {}");

        let decode = serde_json::from_str::<u64>("nope").unwrap_err();
        assert_eq!(ServiceError::from(decode).kind(), "decode");
    }

    #[test]
    fn test_mismatch_and_no_new_messages_differ() {
        assert_ne!(BYTECODE_MISMATCH_ERR_MSG, NO_NEW_CONTRACTS_VERIFIED_ERR_MSG);
        assert_ne!(NO_VERIFIABLE_CONTRACTS_ERR_MSG, NO_NEW_CONTRACTS_VERIFIED_ERR_MSG);
    }
}
