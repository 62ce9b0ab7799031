//! Trait definitions for the node a deployment is submitted to.
//!
//! The trait abstracts chain access so that the deployment procedure can be
//! unit tested with mocks.

use alloy::primitives::{Address, Bytes, TxHash};

/// The node's view of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction_hash: TxHash,
    /// `false` if execution reverted.
    pub status: bool,
    /// Address of the created contract, set for contract-creation
    /// transactions.
    pub contract_address: Option<Address>,
    pub block_number: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The node could not be reached or failed to process the request.
    #[error("rpc call failed: {0:#}")]
    Rpc(anyhow::Error),
    /// The node refused the request because EVM execution reverted, e.g. the
    /// constructor reverts during gas estimation.
    #[error("execution reverted: {0}")]
    Reverted(String),
    /// No private key is configured and the node has no unlocked accounts.
    #[error("node exposes no accounts to sign with")]
    NoAccounts,
}

/// Abstracts the chain operations needed to deploy a contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait NetworkClient: Send + Sync {
    /// Returns the chain id reported by the node.
    async fn chain_id(&self) -> Result<u64, ClientError>;

    /// Returns the account that signs and pays for transactions.
    async fn signer(&self) -> Result<Address, ClientError>;

    /// Submits a contract-creation transaction from `from` with the given
    /// init code (creation bytecode followed by the encoded constructor
    /// arguments).
    ///
    /// Returns as soon as the node accepted the transaction, not when it is
    /// mined. Submitted transactions cannot be retracted.
    async fn submit_creation(&self, from: Address, init_code: Bytes) -> Result<TxHash, ClientError>;

    /// Returns the receipt of a mined transaction or `None` if the
    /// transaction is pending or unknown to the node.
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, ClientError>;

    /// Returns the number of the latest block.
    async fn block_number(&self) -> Result<u64, ClientError>;
}
