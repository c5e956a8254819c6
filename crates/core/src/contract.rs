//! Deployed contracts that report themselves for verification

use crate::{
    plugin::{ContractByName, Libraries, PluginContext},
    service::VerificationOutcome,
};
use std::{fmt, ops::Deref, sync::Arc};

/// A contract instance produced by a native factory
pub trait NativeContract: Send + Sync {
    /// On-chain address, `0x`-prefixed hex
    fn address(&self) -> String;
}

/// Native contract paired with the context it reports its deployment to.
///
/// Derefs to the native contract, so every native method stays callable.
pub struct TrackedContract<C> {
    native: C,
    context: Arc<dyn PluginContext>,
    contract_name: String,
    libraries: Option<Libraries>,
}

impl<C: NativeContract> TrackedContract<C> {
    pub fn new(
        native: C,
        context: Arc<dyn PluginContext>,
        contract_name: impl Into<String>,
        libraries: Option<Libraries>,
    ) -> Self {
        Self {
            native,
            context,
            contract_name: contract_name.into(),
            libraries,
        }
    }

    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    pub fn libraries(&self) -> Option<&Libraries> {
        self.libraries.as_ref()
    }

    pub fn into_native(self) -> C {
        self.native
    }

    /// Name, address and libraries as reported to the context
    pub fn contract_by_name(&self) -> ContractByName {
        ContractByName {
            name: self.contract_name.clone(),
            address: self.native.address(),
            network: None,
            libraries: self.libraries.clone(),
        }
    }

    /// Reports the deployment to the plugin context and waits for verification
    pub async fn deployed(&self) -> VerificationOutcome {
        tracing::debug!(contract = %self.contract_name, "Contract deployed, verifying");
        self.context.verify(&[self.contract_by_name()]).await
    }
}

impl<C> Deref for TrackedContract<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.native
    }
}

impl<C: NativeContract> NativeContract for TrackedContract<C> {
    fn address(&self) -> String {
        self.native.address()
    }
}

impl<C: fmt::Debug> fmt::Debug for TrackedContract<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedContract")
            .field("native", &self.native)
            .field("contract_name", &self.contract_name)
            .field("libraries", &self.libraries)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every verification request instead of calling the API
    #[derive(Default)]
    pub(crate) struct RecordingContext {
        pub calls: Mutex<Vec<Vec<ContractByName>>>,
    }

    #[async_trait]
    impl PluginContext for RecordingContext {
        async fn verify(&self, contracts: &[ContractByName]) -> VerificationOutcome {
            self.calls.lock().unwrap().push(contracts.to_vec());
            VerificationOutcome::NoVerifiableContracts
        }
    }

    #[derive(Debug)]
    struct Fixed(&'static str);

    impl NativeContract for Fixed {
        fn address(&self) -> String {
            self.0.to_string()
        }
    }

    impl Fixed {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[tokio::test]
    async fn test_deployed_reports_to_context() {
        let context = Arc::new(RecordingContext::default());
        let mut libraries = Libraries::new();
        libraries.insert("Math".to_string(), "0x02".to_string());

        let contract =
            TrackedContract::new(Fixed("0x01"), context.clone(), "Greeter", Some(libraries.clone()));
        contract.deployed().await;

        let calls = context.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            vec![ContractByName {
                name: "Greeter".to_string(),
                address: "0x01".to_string(),
                network: None,
                libraries: Some(libraries),
            }]
        );
    }

    #[test]
    fn test_native_methods_stay_reachable() {
        let context = Arc::new(RecordingContext::default());
        let contract = TrackedContract::new(Fixed("0x01"), context.clone(), "Greeter", None);

        assert_eq!(contract.greet(), "hello");
        assert_eq!(NativeContract::address(&contract), "0x01");
        assert!(context.calls.lock().unwrap().is_empty());
        assert_eq!(contract.into_native().0, "0x01");
    }
}
