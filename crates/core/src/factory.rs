//! Contract factories whose deployments report themselves for verification

use crate::{
    contract::{NativeContract, TrackedContract},
    plugin::{Libraries, PluginContext},
};
use async_trait::async_trait;
use serde_json::Value;
use std::{fmt, sync::Arc};

/// Interface and creation code of a factory
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactorySurface {
    /// JSON ABI entries
    pub abi: Vec<Value>,
    pub bytecode: Vec<u8>,
}

/// Deploys and attaches contracts of a single type
#[async_trait]
pub trait NativeContractFactory: Sized + Send + Sync {
    type Contract: NativeContract;
    type Signer: Send + 'static;
    type Args: Send + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    fn surface(&self) -> FactorySurface;

    /// Creation calldata for the given constructor arguments
    fn deploy_transaction(&self, args: &Self::Args) -> Result<Vec<u8>, Self::Error>;

    /// Contract instance at an existing address
    fn attach(&self, address: &str) -> Result<Self::Contract, Self::Error>;

    async fn deploy(&self, args: Self::Args) -> Result<Self::Contract, Self::Error>;

    /// Same factory, sending transactions from another signer
    async fn connect(&self, signer: Self::Signer) -> Result<Self, Self::Error>;
}

/// Wraps a native factory so every deployed contract is tracked.
///
/// Everything except `deploy` and `connect` is answered by the native factory.
/// The surface is captured once at construction.
pub struct TrackedContractFactory<F> {
    native: F,
    surface: FactorySurface,
    context: Arc<dyn PluginContext>,
    contract_name: String,
    libraries: Option<Libraries>,
}

impl<F: NativeContractFactory> TrackedContractFactory<F> {
    pub fn new(
        native: F,
        context: Arc<dyn PluginContext>,
        contract_name: impl Into<String>,
        libraries: Option<Libraries>,
    ) -> Self {
        let surface = native.surface();
        Self {
            native,
            surface,
            context,
            contract_name: contract_name.into(),
            libraries,
        }
    }

    pub fn native(&self) -> &F {
        &self.native
    }

    pub fn abi(&self) -> &[Value] {
        &self.surface.abi
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.surface.bytecode
    }

    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    pub fn libraries(&self) -> Option<&Libraries> {
        self.libraries.as_ref()
    }

    fn track(&self, contract: F::Contract) -> TrackedContract<F::Contract> {
        TrackedContract::new(
            contract,
            self.context.clone(),
            self.contract_name.clone(),
            self.libraries.clone(),
        )
    }
}

#[async_trait]
impl<F: NativeContractFactory> NativeContractFactory for TrackedContractFactory<F> {
    type Contract = TrackedContract<F::Contract>;
    type Signer = F::Signer;
    type Args = F::Args;
    type Error = F::Error;

    fn surface(&self) -> FactorySurface {
        self.surface.clone()
    }

    fn deploy_transaction(&self, args: &Self::Args) -> Result<Vec<u8>, Self::Error> {
        self.native.deploy_transaction(args)
    }

    fn attach(&self, address: &str) -> Result<Self::Contract, Self::Error> {
        let contract = self.native.attach(address)?;
        Ok(self.track(contract))
    }

    async fn deploy(&self, args: Self::Args) -> Result<Self::Contract, Self::Error> {
        let contract = self.native.deploy(args).await?;
        tracing::debug!(
            contract = %self.contract_name,
            address = %contract.address(),
            "Deployed tracked contract"
        );
        Ok(self.track(contract))
    }

    async fn connect(&self, signer: Self::Signer) -> Result<Self, Self::Error> {
        let native = self.native.connect(signer).await?;
        Ok(Self::new(
            native,
            self.context.clone(),
            self.contract_name.clone(),
            self.libraries.clone(),
        ))
    }
}

impl<F: fmt::Debug> fmt::Debug for TrackedContractFactory<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedContractFactory")
            .field("native", &self.native)
            .field("contract_name", &self.contract_name)
            .field("libraries", &self.libraries)
            .finish_non_exhaustive()
    }
}
