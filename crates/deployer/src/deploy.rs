//! The deployment procedure: encode, submit, wait for the receipt, report.
//!
//! A deployment has exactly one suspension point, the confirmation wait.
//! Everything before the submission is validated locally first, so that
//! caller errors never reach the network.

use {
    crate::{
        artifact::{self, ArtifactSource, ContractArtifact},
        request::{ArgumentMismatch, DeploymentRequest},
        traits::{ClientError, NetworkClient, Receipt},
    },
    alloy::primitives::{Address, TxHash},
    std::{sync::Arc, time::Duration},
};

#[derive(Debug, Clone)]
pub struct Config {
    /// How long to wait for the deployment to be confirmed after it was
    /// submitted.
    pub confirmation_timeout: Duration,
    /// Delay between two receipt queries.
    pub poll_interval: Duration,
    /// Number of blocks (including the one the transaction was mined in)
    /// required before a deployment counts as confirmed.
    pub confirmations: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
            confirmations: 1,
        }
    }
}

/// A confirmed deployment. Only constructed from a successful receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentResult {
    contract_address: Address,
    transaction_hash: TxHash,
    block_number: Option<u64>,
}

impl DeploymentResult {
    fn from_receipt(receipt: &Receipt) -> Result<Self, Error> {
        let reverted = |reason: &str| Error::TransactionReverted {
            tx_hash: Some(receipt.transaction_hash),
            reason: reason.to_owned(),
        };
        if !receipt.status {
            return Err(reverted("deployment transaction reverted"));
        }
        let contract_address = receipt
            .contract_address
            .ok_or_else(|| reverted("receipt carries no contract address"))?;

        Ok(Self {
            contract_address,
            transaction_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }

    /// Address of the deployed contract. Its `Display` output is checksummed.
    pub fn contract_address(&self) -> Address {
        self.contract_address
    }

    pub fn transaction_hash(&self) -> TxHash {
        self.transaction_hash
    }

    pub fn block_number(&self) -> Option<u64> {
        self.block_number
    }
}

/// Deploys contracts through a [`NetworkClient`].
///
/// Meant for one deployment at a time. Deployments are not idempotent: every
/// successful call creates a new contract.
pub struct Deployer {
    client: Arc<dyn NetworkClient>,
    artifacts: Arc<dyn ArtifactSource>,
    config: Config,
}

impl Deployer {
    pub fn new(
        client: Arc<dyn NetworkClient>,
        artifacts: Arc<dyn ArtifactSource>,
        config: Config,
    ) -> Self {
        Self {
            client,
            artifacts,
            config,
        }
    }

    /// Deploys the requested contract and waits for the deployment to be
    /// confirmed.
    ///
    /// On [`Error::Timeout`] the transaction was submitted and may still be
    /// mined later. Use [`Deployer::lookup`] with the hash from the error
    /// before deploying again.
    pub async fn deploy(&self, request: &DeploymentRequest) -> Result<DeploymentResult, Error> {
        self.deploy_with_cancellation(request, std::future::pending())
            .await
    }

    /// Like [`Deployer::deploy`] but stops waiting for the confirmation as
    /// soon as `cancel` completes. The submitted transaction is not retracted
    /// and may still be mined.
    pub async fn deploy_with_cancellation(
        &self,
        request: &DeploymentRequest,
        cancel: impl Future<Output = ()> + Send,
    ) -> Result<DeploymentResult, Error> {
        let contract = request.contract_name();
        let network = request.network();

        let artifact = self.artifact(contract).await?;
        let init_code = request.init_code(&artifact)?;
        tracing::debug!(
            contract,
            network = %network.name,
            init_code_len = init_code.len(),
            "encoded deployment"
        );

        let chain_id = self
            .client
            .chain_id()
            .await
            .map_err(Error::NetworkUnavailable)?;
        if chain_id != network.chain_id {
            return Err(Error::ChainMismatch {
                expected: network.chain_id,
                actual: chain_id,
            });
        }
        let from = self
            .client
            .signer()
            .await
            .map_err(Error::NetworkUnavailable)?;

        let tx_hash = self
            .client
            .submit_creation(from, init_code)
            .await
            .map_err(|err| match err {
                ClientError::Reverted(reason) => Error::TransactionReverted {
                    tx_hash: None,
                    reason,
                },
                err => Error::NetworkUnavailable(err),
            })?;
        // Logged before waiting so the hash survives a timeout or a crash.
        tracing::info!(%tx_hash, %from, contract, "submitted deployment transaction");

        let receipt = self.wait_for_confirmation(tx_hash, cancel).await?;
        let result = DeploymentResult::from_receipt(&receipt)?;
        tracing::info!(
            address = %result.contract_address,
            %tx_hash,
            block = ?result.block_number,
            contract,
            "contract deployed"
        );
        Ok(result)
    }

    /// Looks up a previously submitted deployment. Returns `None` if the node
    /// does not know the transaction as mined (yet).
    pub async fn lookup(&self, tx_hash: TxHash) -> Result<Option<DeploymentResult>, Error> {
        let receipt = self
            .client
            .receipt(tx_hash)
            .await
            .map_err(Error::NetworkUnavailable)?;
        receipt
            .as_ref()
            .map(DeploymentResult::from_receipt)
            .transpose()
    }

    async fn artifact(&self, contract: &str) -> Result<ContractArtifact, artifact::Error> {
        let artifacts = self.artifacts.clone();
        let name = contract.to_owned();
        match tokio::task::spawn_blocking(move || artifacts.artifact(&name)).await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(artifact::Error::Aborted(contract.to_owned())),
        }
    }

    async fn wait_for_confirmation(
        &self,
        tx_hash: TxHash,
        cancel: impl Future<Output = ()>,
    ) -> Result<Receipt, Error> {
        let timeout = self.config.confirmation_timeout;
        tokio::select! {
            result = tokio::time::timeout(timeout, self.poll_receipt(tx_hash)) => match result {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!(%tx_hash, ?timeout, "deployment not confirmed in time, it may still be mined");
                    Err(Error::Timeout { tx_hash, timeout })
                }
            },
            _ = cancel => {
                tracing::warn!(%tx_hash, "stopped waiting for deployment, it may still be mined");
                Err(Error::Cancelled { tx_hash })
            }
        }
    }

    async fn poll_receipt(&self, tx_hash: TxHash) -> Result<Receipt, Error> {
        loop {
            match self.client.receipt(tx_hash).await {
                Ok(Some(receipt)) if !receipt.status => {
                    return Err(Error::TransactionReverted {
                        tx_hash: Some(tx_hash),
                        reason: "deployment transaction reverted".to_owned(),
                    });
                }
                Ok(Some(receipt)) => {
                    if self.is_confirmed(&receipt).await {
                        return Ok(receipt);
                    }
                }
                Ok(None) => tracing::trace!(%tx_hash, "deployment transaction pending"),
                // The transaction is already out, giving up here would lose
                // track of it. Keep polling until the timeout.
                Err(err) => tracing::warn!(%tx_hash, ?err, "failed to fetch receipt"),
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn is_confirmed(&self, receipt: &Receipt) -> bool {
        if self.config.confirmations <= 1 {
            return true;
        }
        let Some(mined_in) = receipt.block_number else {
            return true;
        };
        match self.client.block_number().await {
            Ok(latest) => {
                let confirmations = latest.saturating_sub(mined_in) + 1;
                tracing::debug!(
                    tx_hash = %receipt.transaction_hash,
                    confirmations,
                    required = self.config.confirmations,
                    "waiting for confirmations"
                );
                confirmations >= self.config.confirmations
            }
            Err(err) => {
                tracing::warn!(?err, "failed to fetch latest block");
                false
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("constructor arguments do not match the ABI: {0}")]
    ArgumentMismatch(#[from] ArgumentMismatch),
    #[error("contract artifact unavailable: {0}")]
    Artifact(#[from] artifact::Error),
    #[error("network unavailable: {0}")]
    NetworkUnavailable(#[source] ClientError),
    #[error("node is on chain {actual} but the network is configured for chain {expected}")]
    ChainMismatch { expected: u64, actual: u64 },
    #[error("{reason}")]
    TransactionReverted {
        tx_hash: Option<TxHash>,
        reason: String,
    },
    #[error(
        "deployment transaction {tx_hash} not confirmed within {timeout:?}, it may still be mined"
    )]
    Timeout { tx_hash: TxHash, timeout: Duration },
    #[error("stopped waiting for deployment transaction {tx_hash}, it may still be mined")]
    Cancelled { tx_hash: TxHash },
}

impl Error {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ArgumentMismatch(_) => "ArgumentMismatch",
            Self::Artifact(_) => "Artifact",
            Self::NetworkUnavailable(_) => "NetworkUnavailable",
            Self::ChainMismatch { .. } => "ChainMismatch",
            Self::TransactionReverted { .. } => "TransactionReverted",
            Self::Timeout { .. } => "Timeout",
            Self::Cancelled { .. } => "Cancelled",
        }
    }

    /// Hash of the deployment transaction if one was submitted.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::TransactionReverted { tx_hash, .. } => *tx_hash,
            Self::Timeout { tx_hash, .. } | Self::Cancelled { tx_hash } => Some(*tx_hash),
            _ => None,
        }
    }
}
