//! Verification service client
//!
//! Every operation absorbs its failures: errors are logged in compact form and
//! turned into an empty result, `None`, or a non-success
//! [`VerificationOutcome`], so a failed verification never aborts the caller.

use crate::{
    api::{
        ApiClient, BlockNumberResponse, ForkVerificationRequest, Network, Principal,
        PrincipalResponse, Project, ProjectsResponse, VerificationRequest, VerificationResponse,
        VerifiedContractDescriptor,
    },
    config::{ApiSettings, Credentials},
    errors::{
        ServiceError, ACCESS_TOKEN_NOT_PROVIDED_ERR_MSG, API_VERIFICATION_REQUEST_ERR_MSG,
        BYTECODE_MISMATCH_ERR_MSG, LATEST_BLOCK_NUMBER_FETCH_FAILED_ERR_MSG,
        NETWORK_FETCH_FAILED_ERR_MSG, NO_NEW_CONTRACTS_VERIFIED_ERR_MSG,
        NO_VERIFIABLE_CONTRACTS_ERR_MSG, PRINCIPAL_FETCH_FAILED_ERR_MSG,
        PROJECTS_FETCH_FAILED_ERR_MSG,
    },
    links, log_compliance,
};
use serde::Serialize;
use tracing::{debug, error, info, trace};

pub const DEFAULT_PLUGIN_NAME: &str = "tenderly";

/// What a verification call ended with
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VerificationOutcome {
    /// The service verified at least one contract
    Verified {
        contracts: Vec<VerifiedContract>,
        /// Project page, set for private pushes
        #[serde(skip_serializing_if = "Option::is_none")]
        dashboard_url: Option<String>,
    },
    /// Submitted sources do not compile to the on-chain bytecode
    BytecodeMismatch,
    /// Nothing new was verified, e.g. everything was already verified
    NoNewContracts { requested: Vec<String> },
    /// The request had no contracts; no call was made
    NoVerifiableContracts,
    /// The operation requires an access key; no call was made
    Unauthenticated,
    /// Private or fork verification without a project and username; no call was made
    MissingProject,
    /// The service answered with an empty body
    InvalidResponse,
    /// Transport, status or decoding failure
    RequestFailed,
}

impl VerificationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, VerificationOutcome::Verified { .. })
    }
}

/// One contract the service reported as verified
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedContract {
    pub address: String,
    pub network_id: String,
    /// Dashboard page of the contract, set for public verification
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Client for the verification API.
///
/// Clients are built per call from the settings and the credentials held here;
/// the credentials alone decide between the anonymous and authenticated client.
#[derive(Debug, Clone)]
pub struct VerificationService {
    plugin_name: String,
    settings: ApiSettings,
    credentials: Credentials,
}

impl VerificationService {
    pub fn new(settings: ApiSettings, credentials: Credentials) -> Self {
        Self {
            plugin_name: DEFAULT_PLUGIN_NAME.to_string(),
            settings,
            credentials,
        }
    }

    /// Name used as the prefix of logged error messages
    pub fn with_plugin_name(mut self, plugin_name: impl Into<String>) -> Self {
        self.plugin_name = plugin_name.into();
        self
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Lists the public networks. Authentication only changes attribution.
    pub async fn list_networks(&self) -> Vec<Network> {
        debug!("Obtaining public networks.");

        let result = async {
            let client = ApiClient::for_credentials(&self.settings, &self.credentials)?;
            client.get::<Vec<Network>>(&["api", "v1", "public-networks"]).await
        }
        .await;

        match result {
            Ok(Some(networks)) => {
                trace!(networks = ?log_compliance::networks(&networks), "Obtained public networks");
                networks
            }
            Ok(None) => {
                error!("There was an error while obtaining public networks. Obtained response is invalid.");
                vec![]
            }
            Err(err) => {
                self.log_api_error(&err, NETWORK_FETCH_FAILED_ERR_MSG);
                vec![]
            }
        }
    }

    /// Latest block number of a network, as returned by the service
    pub async fn latest_block_number(&self, network_id: &str) -> Option<String> {
        debug!(network_id, "Getting latest block number.");

        let result = async {
            let client = ApiClient::for_credentials(&self.settings, &self.credentials)?;
            client
                .get::<BlockNumberResponse>(&["api", "v1", "network", network_id, "block-number"])
                .await
        }
        .await;

        match result {
            Ok(Some(response)) => {
                trace!(block_number = %response.block_number, "Api successfully returned block number");
                Some(response.block_number)
            }
            Ok(None) => {
                error!("There was an error while obtaining latest block number. Obtained response is invalid.");
                None
            }
            Err(err) => {
                self.log_api_error(&err, LATEST_BLOCK_NUMBER_FETCH_FAILED_ERR_MSG);
                None
            }
        }
    }

    /// Verifies contracts publicly, logging a dashboard link per verified contract
    pub async fn verify_publicly(&self, request: &VerificationRequest) -> VerificationOutcome {
        debug!("Verifying contracts publicly.");

        if request.contracts.is_empty() {
            error!("{NO_VERIFIABLE_CONTRACTS_ERR_MSG}");
            return VerificationOutcome::NoVerifiableContracts;
        }

        let result = async {
            let client = ApiClient::for_credentials(&self.settings, &self.credentials)?;
            client
                .post::<_, VerificationResponse>(&["api", "v1", "public", "verify-contracts"], request)
                .await
        }
        .await;

        let requested = request.contract_names();
        let contracts = match self.normalize(result, requested, "publicly verifying contracts") {
            Ok(contracts) => contracts,
            Err(outcome) => return outcome,
        };

        info!("Smart contracts successfully verified");
        let dashboard = self.settings.dashboard_base();
        let contracts = contracts
            .into_iter()
            .map(|contract| {
                let url =
                    links::public_contract_url(dashboard, &contract.network_id, &contract.address);
                info!(
                    "Contract {} verified. You can view the contract at {}",
                    contract.address, url
                );
                VerifiedContract {
                    address: contract.address,
                    network_id: contract.network_id,
                    url: Some(url),
                }
            })
            .collect();

        VerificationOutcome::Verified {
            contracts,
            dashboard_url: None,
        }
    }

    /// Pushes contracts to a project, recording them privately
    pub async fn push_privately(
        &self,
        request: &VerificationRequest,
        project: &str,
        username: &str,
    ) -> VerificationOutcome {
        debug!(project, username, "Pushing contracts onto Tenderly.");

        if !self.require_authentication() {
            return VerificationOutcome::Unauthenticated;
        }
        if request.contracts.is_empty() {
            error!("{NO_VERIFIABLE_CONTRACTS_ERR_MSG}");
            return VerificationOutcome::NoVerifiableContracts;
        }

        let result = async {
            let client = ApiClient::authenticated(&self.settings, &self.credentials)?;
            client
                .post::<_, VerificationResponse>(
                    &["api", "v1", "account", username, "project", project, "contracts"],
                    request,
                )
                .await
        }
        .await;

        let requested = request.contract_names();
        let contracts = match self.normalize(result, requested, "pushing contracts") {
            Ok(contracts) => contracts,
            Err(outcome) => return outcome,
        };

        let dashboard_url =
            links::project_contracts_url(self.settings.dashboard_base(), username, project);
        info!(
            "Successfully privately verified smart contracts for project {}. You can view your contracts at {}",
            project, dashboard_url
        );

        VerificationOutcome::Verified {
            contracts: contracts.into_iter().map(VerifiedContract::from).collect(),
            dashboard_url: Some(dashboard_url),
        }
    }

    /// Verifies contracts deployed on a fork, through the RPC client
    pub async fn verify_on_fork(
        &self,
        request: &ForkVerificationRequest,
        project: &str,
        username: &str,
        fork_id: &str,
    ) -> VerificationOutcome {
        info!(fork_id, "Verifying contracts on fork.");

        if !self.require_authentication() {
            return VerificationOutcome::Unauthenticated;
        }
        if request.contracts.is_empty() {
            error!("{NO_VERIFIABLE_CONTRACTS_ERR_MSG}");
            return VerificationOutcome::NoVerifiableContracts;
        }

        let result = async {
            let client = ApiClient::rpc(&self.settings, &self.credentials)?;
            client
                .post::<_, VerificationResponse>(
                    &["account", username, "project", project, "fork", fork_id, "verify"],
                    request,
                )
                .await
        }
        .await;

        let requested = request.contract_names();
        let contracts = match self.normalize(result, requested, "verifying contracts on fork") {
            Ok(contracts) => contracts,
            Err(outcome) => return outcome,
        };

        for contract in &contracts {
            info!("Contract at {} verified.", contract.address);
        }

        VerificationOutcome::Verified {
            contracts: contracts.into_iter().map(VerifiedContract::from).collect(),
            dashboard_url: None,
        }
    }

    /// The user owning the configured access key
    pub async fn principal(&self) -> Option<Principal> {
        debug!("Getting principal.");

        if !self.require_authentication() {
            return None;
        }

        let result = async {
            let client = ApiClient::authenticated(&self.settings, &self.credentials)?;
            client.get::<PrincipalResponse>(&["api", "v1", "user"]).await
        }
        .await;

        match result {
            Ok(Some(response)) => {
                trace!(id = %response.user.id, "Retrieved principal");
                Some(response.user)
            }
            Ok(None) => {
                error!("There was an error while obtaining principal. Obtained response is invalid.");
                None
            }
            Err(err) => {
                self.log_api_error(&err, PRINCIPAL_FETCH_FAILED_ERR_MSG);
                None
            }
        }
    }

    /// Projects of an account
    pub async fn projects(&self, principal_id: &str) -> Vec<Project> {
        debug!(principal_id, "Getting project slugs.");

        if !self.require_authentication() {
            return vec![];
        }

        let result = async {
            let client = ApiClient::authenticated(&self.settings, &self.credentials)?;
            client
                .get::<ProjectsResponse>(&["api", "v1", "account", principal_id, "projects"])
                .await
        }
        .await;

        match result {
            Ok(Some(ProjectsResponse {
                projects: Some(projects),
            })) => {
                trace!(projects = ?log_compliance::projects(&projects), "Obtained projects");
                projects
            }
            Ok(_) => {
                error!("There was an error while obtaining project slugs. Obtained response is invalid.");
                vec![]
            }
            Err(err) => {
                self.log_api_error(&err, PROJECTS_FETCH_FAILED_ERR_MSG);
                vec![]
            }
        }
    }

    /// Shared reply handling of the three verification endpoints.
    ///
    /// A mismatch wins over any listed contracts; an absent or empty contract
    /// list means nothing new was verified.
    fn normalize(
        &self,
        result: Result<Option<VerificationResponse>, ServiceError>,
        requested: Vec<String>,
        action: &str,
    ) -> Result<Vec<VerifiedContractDescriptor>, VerificationOutcome> {
        let response = match result {
            Ok(Some(response)) => response,
            Ok(None) => {
                error!("There was an error while {action}. Obtained response is invalid.");
                return Err(VerificationOutcome::InvalidResponse);
            }
            Err(err) => {
                self.log_api_error(&err, API_VERIFICATION_REQUEST_ERR_MSG);
                return Err(VerificationOutcome::RequestFailed);
            }
        };

        trace!(
            response = ?log_compliance::verification_response(&response),
            "Verification response"
        );

        if response.bytecode_mismatch_errors.is_some() {
            error!("Error in {}: {}", self.plugin_name, BYTECODE_MISMATCH_ERR_MSG);
            return Err(VerificationOutcome::BytecodeMismatch);
        }

        match response.contracts {
            Some(contracts) if !contracts.is_empty() => Ok(contracts),
            _ => {
                error!(
                    "Error in {}: {} {}",
                    self.plugin_name,
                    NO_NEW_CONTRACTS_VERIFIED_ERR_MSG,
                    requested.join(", ")
                );
                Err(VerificationOutcome::NoNewContracts { requested })
            }
        }
    }

    fn require_authentication(&self) -> bool {
        if self.credentials.is_authenticated() {
            return true;
        }
        error!("Error in {}: {}", self.plugin_name, ACCESS_TOKEN_NOT_PROVIDED_ERR_MSG);
        false
    }

    fn log_api_error(&self, err: &ServiceError, message: &str) {
        let compact = log_compliance::api_error(err, self.credentials.access_key());
        error!(
            kind = compact.kind,
            status = ?compact.status,
            detail = %compact.message,
            "Error in {}: {}",
            self.plugin_name,
            message
        );
    }
}

impl From<VerifiedContractDescriptor> for VerifiedContract {
    fn from(contract: VerifiedContractDescriptor) -> Self {
        Self {
            address: contract.address,
            network_id: contract.network_id,
            url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ContractSubmission, ACCESS_KEY_HEADER};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use url::Url;
    use std::sync::{Arc, Mutex};
    use tracing::{
        field::{Field, Visit},
        subscriber::DefaultGuard,
        Event, Level, Subscriber,
    };
    use tracing_subscriber::{
        layer::{Context, SubscriberExt},
        Layer, Registry,
    };
    use wiremock::matchers::{any, body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Events emitted by this crate while the returned guard is alive
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

    impl CapturedLogs {
        fn install() -> (Self, DefaultGuard) {
            let logs = Self::default();
            let guard = tracing::subscriber::set_default(Registry::default().with(logs.clone()));
            (logs, guard)
        }

        fn errors(&self) -> Vec<String> {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|(level, _)| *level == Level::ERROR)
                .map(|(_, message)| message.clone())
                .collect()
        }
    }

    impl<S: Subscriber> Layer<S> for CapturedLogs {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            if !event.metadata().target().starts_with(env!("CARGO_CRATE_NAME")) {
                return;
            }
            let mut visitor = MessageVisitor::default();
            event.record(&mut visitor);
            self.0.lock().unwrap().push((*event.metadata().level(), visitor.0));
        }
    }

    #[derive(Default)]
    struct MessageVisitor(String);

    impl Visit for MessageVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.0 = format!("{value:?}");
            }
        }
    }

    fn settings(server: &MockServer) -> ApiSettings {
        let url = Url::parse(&server.uri()).unwrap();
        ApiSettings {
            base_url: url.clone(),
            rpc_url: url.join("/rpc/").unwrap(),
            dashboard_url: Url::parse("https://dashboard.example").unwrap(),
            timeout_secs: 5,
        }
    }

    fn anonymous(server: &MockServer) -> VerificationService {
        VerificationService::new(settings(server), Credentials::anonymous())
    }

    fn authenticated(server: &MockServer) -> VerificationService {
        VerificationService::new(settings(server), Credentials::new("secret"))
    }

    fn request(names: &[&str]) -> VerificationRequest {
        VerificationRequest {
            contracts: names
                .iter()
                .map(|name| ContractSubmission {
                    contract_name: name.to_string(),
                    source: format!("contract {name} {{}}"),
                    source_path: format!("contracts/{name}.sol"),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn fork_request(names: &[&str]) -> ForkVerificationRequest {
        ForkVerificationRequest {
            root: Some("0xroot".to_string()),
            config: Default::default(),
            contracts: request(names).contracts,
        }
    }

    /// Fails the test on drop if any request reaches the server
    async fn expect_no_calls(server: &MockServer) {
        Mock::given(any())
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(server)
            .await;
    }

    async fn mount_json(server: &MockServer, http_method: &str, route: &str, body: serde_json::Value) {
        Mock::given(method(http_method))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_list_networks_returns_server_sequence() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "GET",
            "/api/v1/public-networks",
            json!([{ "id": "1", "name": "Mainnet" }]),
        )
        .await;

        let networks = anonymous(&server).list_networks().await;
        assert_eq!(
            networks,
            vec![Network {
                id: "1".to_string(),
                name: "Mainnet".to_string(),
                slug: None,
                ethereum_network_id: None,
            }]
        );
    }

    #[tokio::test]
    async fn test_list_networks_uses_authenticated_client_when_possible() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/public-networks"))
            .and(header(ACCESS_KEY_HEADER, "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        assert!(authenticated(&server).list_networks().await.is_empty());
    }

    #[tokio::test]
    async fn test_list_networks_unreachable_server_is_empty() {
        let settings = ApiSettings {
            base_url: Url::parse("http://127.0.0.1:1").unwrap(),
            timeout_secs: 1,
            ..Default::default()
        };
        let service = VerificationService::new(settings, Credentials::anonymous());

        let (logs, _guard) = CapturedLogs::install();
        assert!(service.list_networks().await.is_empty());
        assert_eq!(
            logs.errors(),
            vec![format!("Error in tenderly: {NETWORK_FETCH_FAILED_ERR_MSG}")]
        );
    }

    #[tokio::test]
    async fn test_list_networks_null_body_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/public-networks"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        assert!(anonymous(&server).list_networks().await.is_empty());
    }

    #[tokio::test]
    async fn test_latest_block_number() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "GET",
            "/api/v1/network/1/block-number",
            json!({ "block_number": 17000000 }),
        )
        .await;

        let block = anonymous(&server).latest_block_number("1").await;
        assert_eq!(block.as_deref(), Some("17000000"));
    }

    #[tokio::test]
    async fn test_latest_block_number_server_error_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let (logs, _guard) = CapturedLogs::install();
        assert!(anonymous(&server).latest_block_number("1").await.is_none());
        assert_eq!(
            logs.errors(),
            vec![format!("Error in tenderly: {LATEST_BLOCK_NUMBER_FETCH_FAILED_ERR_MSG}")]
        );
    }

    #[tokio::test]
    async fn test_latest_block_number_encodes_network_id() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "GET",
            "/api/v1/network/a%2Fb%3Fc/block-number",
            json!({ "block_number": "12" }),
        )
        .await;

        let block = anonymous(&server).latest_block_number("a/b?c").await;
        assert_eq!(block.as_deref(), Some("12"));
    }

    #[tokio::test]
    async fn test_push_privately_encodes_path_parameters() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "POST",
            "/api/v1/account/al%2Fice/project/de%23mo/contracts",
            json!({
                "contracts": [{ "address": "0xaaa", "network_id": "1" }],
                "bytecode_mismatch_errors": null
            }),
        )
        .await;

        let outcome = authenticated(&server)
            .push_privately(&request(&["Greeter"]), "de#mo", "al/ice")
            .await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_verify_publicly_without_contracts_makes_no_call() {
        let server = MockServer::start().await;
        expect_no_calls(&server).await;

        let outcome = anonymous(&server).verify_publicly(&request(&[])).await;
        assert_eq!(outcome, VerificationOutcome::NoVerifiableContracts);
    }

    #[tokio::test]
    async fn test_verify_publicly_success_builds_dashboard_links() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/public/verify-contracts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "contracts": [
                    { "address": "0xaaa", "network_id": "1" },
                    { "address": "0xbbb", "network_id": "5" }
                ],
                "bytecode_mismatch_errors": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = anonymous(&server).verify_publicly(&request(&["Greeter"])).await;
        assert_eq!(
            outcome,
            VerificationOutcome::Verified {
                contracts: vec![
                    VerifiedContract {
                        address: "0xaaa".to_string(),
                        network_id: "1".to_string(),
                        url: Some("https://dashboard.example/contract/mainnet/0xaaa".to_string()),
                    },
                    VerifiedContract {
                        address: "0xbbb".to_string(),
                        network_id: "5".to_string(),
                        url: Some("https://dashboard.example/contract/goerli/0xbbb".to_string()),
                    },
                ],
                dashboard_url: None,
            }
        );
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_verify_publicly_mismatch_wins_over_contracts() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "POST",
            "/api/v1/public/verify-contracts",
            json!({
                "contracts": [{ "address": "0xaaa", "network_id": "1" }],
                "bytecode_mismatch_errors": [{ "contract_name": "Greeter" }]
            }),
        )
        .await;

        let (logs, _guard) = CapturedLogs::install();
        let outcome = anonymous(&server).verify_publicly(&request(&["Greeter"])).await;
        assert_eq!(outcome, VerificationOutcome::BytecodeMismatch);
        assert!(!outcome.is_success());
        assert_eq!(
            logs.errors(),
            vec![format!("Error in tenderly: {BYTECODE_MISMATCH_ERR_MSG}")]
        );
    }

    #[tokio::test]
    async fn test_verify_publicly_empty_contracts_lists_requested_names() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "POST",
            "/api/v1/public/verify-contracts",
            json!({ "contracts": [], "bytecode_mismatch_errors": null }),
        )
        .await;

        let (logs, _guard) = CapturedLogs::install();
        let outcome = anonymous(&server)
            .with_plugin_name("hardhat-tenderly")
            .verify_publicly(&request(&["Greeter", "Token"]))
            .await;
        assert_eq!(
            logs.errors(),
            vec![format!(
                "Error in hardhat-tenderly: {NO_NEW_CONTRACTS_VERIFIED_ERR_MSG} Greeter, Token"
            )]
        );
        assert_eq!(
            outcome,
            VerificationOutcome::NoNewContracts {
                requested: vec!["Greeter".to_string(), "Token".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn test_verify_publicly_missing_contracts_is_no_new_contracts() {
        let server = MockServer::start().await;
        mount_json(&server, "POST", "/api/v1/public/verify-contracts", json!({})).await;

        let outcome = anonymous(&server).verify_publicly(&request(&["Greeter"])).await;
        assert_eq!(
            outcome,
            VerificationOutcome::NoNewContracts {
                requested: vec!["Greeter".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn test_verify_publicly_null_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let outcome = anonymous(&server).verify_publicly(&request(&["Greeter"])).await;
        assert_eq!(outcome, VerificationOutcome::InvalidResponse);
    }

    #[tokio::test]
    async fn test_verify_publicly_server_error_is_request_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let outcome = anonymous(&server).verify_publicly(&request(&["Greeter"])).await;
        assert_eq!(outcome, VerificationOutcome::RequestFailed);
    }

    #[tokio::test]
    async fn test_authenticated_operations_without_credentials_make_no_call() {
        let server = MockServer::start().await;
        expect_no_calls(&server).await;
        let service = anonymous(&server);

        assert_eq!(
            service.push_privately(&request(&["Greeter"]), "demo", "alice").await,
            VerificationOutcome::Unauthenticated
        );
        assert_eq!(
            service
                .verify_on_fork(&fork_request(&["Greeter"]), "demo", "alice", "fork")
                .await,
            VerificationOutcome::Unauthenticated
        );
        assert!(service.principal().await.is_none());
        assert!(service.projects("user-id").await.is_empty());
    }

    #[tokio::test]
    async fn test_push_privately_success_links_project() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/account/alice/project/demo/contracts"))
            .and(header(ACCESS_KEY_HEADER, "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "contracts": [{ "address": "0xaaa", "network_id": "1" }],
                "bytecode_mismatch_errors": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = authenticated(&server)
            .push_privately(&request(&["Greeter"]), "demo", "alice")
            .await;
        assert_eq!(
            outcome,
            VerificationOutcome::Verified {
                contracts: vec![VerifiedContract {
                    address: "0xaaa".to_string(),
                    network_id: "1".to_string(),
                    url: None,
                }],
                dashboard_url: Some("https://dashboard.example/alice/demo/contracts".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn test_push_privately_mismatch() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "POST",
            "/api/v1/account/alice/project/demo/contracts",
            json!({ "contracts": [], "bytecode_mismatch_errors": { "Greeter": "mismatch" } }),
        )
        .await;

        let outcome = authenticated(&server)
            .push_privately(&request(&["Greeter"]), "demo", "alice")
            .await;
        assert_eq!(outcome, VerificationOutcome::BytecodeMismatch);
    }

    #[tokio::test]
    async fn test_push_privately_without_contracts_makes_no_call() {
        let server = MockServer::start().await;
        expect_no_calls(&server).await;

        let outcome = authenticated(&server)
            .push_privately(&request(&[]), "demo", "alice")
            .await;
        assert_eq!(outcome, VerificationOutcome::NoVerifiableContracts);
    }

    #[tokio::test]
    async fn test_verify_on_fork_uses_rpc_client() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rpc/account/alice/project/demo/fork/f00d/verify"))
            .and(header(ACCESS_KEY_HEADER, "secret"))
            .and(body_partial_json(json!({ "root": "0xroot" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "contracts": [{ "address": "0xaaa", "network_id": "736031" }],
                "bytecode_mismatch_errors": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = authenticated(&server)
            .verify_on_fork(&fork_request(&["Greeter"]), "demo", "alice", "f00d")
            .await;
        assert_eq!(
            outcome,
            VerificationOutcome::Verified {
                contracts: vec![VerifiedContract {
                    address: "0xaaa".to_string(),
                    network_id: "736031".to_string(),
                    url: None,
                }],
                dashboard_url: None,
            }
        );
    }

    #[tokio::test]
    async fn test_verify_on_fork_null_body_is_guarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;

        let outcome = authenticated(&server)
            .verify_on_fork(&fork_request(&["Greeter"]), "demo", "alice", "f00d")
            .await;
        assert_eq!(outcome, VerificationOutcome::InvalidResponse);
    }

    #[tokio::test]
    async fn test_verify_on_fork_empty_contracts() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "POST",
            "/rpc/account/alice/project/demo/fork/f00d/verify",
            json!({ "contracts": [], "bytecode_mismatch_errors": null }),
        )
        .await;

        let outcome = authenticated(&server)
            .verify_on_fork(&fork_request(&["A", "B"]), "demo", "alice", "f00d")
            .await;
        assert_eq!(
            outcome,
            VerificationOutcome::NoNewContracts {
                requested: vec!["A".to_string(), "B".to_string()]
            }
        );
    }

    #[tokio::test]
    async fn test_principal_extracts_nested_user() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "GET",
            "/api/v1/user",
            json!({ "user": { "id": "u-1", "username": "alice", "email": "a@example.com" } }),
        )
        .await;

        let principal = authenticated(&server).principal().await;
        assert_eq!(
            principal,
            Some(Principal {
                id: "u-1".to_string(),
                username: "alice".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_principal_null_body_is_guarded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/user"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        assert!(authenticated(&server).principal().await.is_none());
    }

    #[tokio::test]
    async fn test_projects_listing() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "GET",
            "/api/v1/account/u-1/projects",
            json!({ "projects": [{ "id": "p-1", "name": "Demo", "slug": "demo" }] }),
        )
        .await;

        let projects = authenticated(&server).projects("u-1").await;
        assert_eq!(
            projects,
            vec![Project {
                id: "p-1".to_string(),
                name: "Demo".to_string(),
                slug: "demo".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_projects_null_body_is_guarded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        assert!(authenticated(&server).projects("u-1").await.is_empty());
    }

    #[tokio::test]
    async fn test_projects_null_field_is_invalid_response() {
        let server = MockServer::start().await;
        mount_json(
            &server,
            "GET",
            "/api/v1/account/u-1/projects",
            json!({ "projects": null }),
        )
        .await;

        let (logs, _guard) = CapturedLogs::install();
        assert!(authenticated(&server).projects("u-1").await.is_empty());

        let errors = logs.errors();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Obtained response is invalid"), "{errors:?}");
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let value = serde_json::to_value(VerificationOutcome::NoNewContracts {
            requested: vec!["Greeter".to_string()],
        })
        .unwrap();
        assert_eq!(value, json!({ "status": "no_new_contracts", "requested": ["Greeter"] }));
    }
}
