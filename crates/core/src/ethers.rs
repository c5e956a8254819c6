//! `ethers` contract factories as native factories

use crate::{
    contract::NativeContract,
    factory::{FactorySurface, NativeContractFactory},
};
use ::ethers::{
    abi::{Abi, Token},
    contract::{Contract, ContractFactory, ContractInstance},
    providers::Middleware,
    types::{Address, Bytes},
};
use async_trait::async_trait;
use serde_json::Value;
use std::{borrow::Borrow, sync::Arc};

#[derive(Debug, thiserror::Error)]
pub enum EthersFactoryError {
    #[error("contract call failed: {0}")]
    Contract(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("invalid contract address `{0}`")]
    InvalidAddress(String),
}

impl EthersFactoryError {
    fn contract(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Contract(Box::new(err))
    }
}

impl<B, M> NativeContract for ContractInstance<B, M>
where
    B: Borrow<M> + Send + Sync,
    M: Middleware,
{
    fn address(&self) -> String {
        format!("{:?}", ContractInstance::address(self))
    }
}

/// ABI and creation code bound to a client
#[derive(Debug)]
pub struct EthersContractFactory<M> {
    abi: Abi,
    bytecode: Bytes,
    client: Arc<M>,
}

impl<M> Clone for EthersContractFactory<M> {
    fn clone(&self) -> Self {
        Self {
            abi: self.abi.clone(),
            bytecode: self.bytecode.clone(),
            client: self.client.clone(),
        }
    }
}

impl<M: Middleware + 'static> EthersContractFactory<M> {
    pub fn new(abi: Abi, bytecode: Bytes, client: Arc<M>) -> Self {
        Self {
            abi,
            bytecode,
            client,
        }
    }

    pub fn client(&self) -> &Arc<M> {
        &self.client
    }

    fn factory(&self) -> ContractFactory<M> {
        ContractFactory::new(self.abi.clone(), self.bytecode.clone(), self.client.clone())
    }
}

#[async_trait]
impl<M: Middleware + 'static> NativeContractFactory for EthersContractFactory<M> {
    type Contract = Contract<M>;
    type Signer = Arc<M>;
    type Args = Vec<Token>;
    type Error = EthersFactoryError;

    fn surface(&self) -> FactorySurface {
        let abi = match serde_json::to_value(&self.abi) {
            Ok(Value::Array(entries)) => entries,
            _ => Vec::new(),
        };
        FactorySurface {
            abi,
            bytecode: self.bytecode.to_vec(),
        }
    }

    fn deploy_transaction(&self, args: &Vec<Token>) -> Result<Vec<u8>, EthersFactoryError> {
        let deployer =
            self.factory().deploy_tokens(args.clone()).map_err(EthersFactoryError::contract)?;
        Ok(deployer.tx.data().map(|data| data.to_vec()).unwrap_or_default())
    }

    fn attach(&self, address: &str) -> Result<Contract<M>, EthersFactoryError> {
        let address: Address = address
            .parse()
            .map_err(|_| EthersFactoryError::InvalidAddress(address.to_string()))?;
        Ok(Contract::new(address, self.abi.clone(), self.client.clone()))
    }

    async fn deploy(&self, args: Vec<Token>) -> Result<Contract<M>, EthersFactoryError> {
        let deployer = self.factory().deploy_tokens(args).map_err(EthersFactoryError::contract)?;
        deployer.send().await.map_err(EthersFactoryError::contract)
    }

    async fn connect(&self, signer: Arc<M>) -> Result<Self, EthersFactoryError> {
        Ok(Self::new(self.abi.clone(), self.bytecode.clone(), signer))
    }
}
