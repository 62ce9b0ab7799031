use {
    crate::{
        network::NetworkConfig,
        traits::{ClientError, NetworkClient, Receipt},
    },
    alloy::{
        network::TransactionBuilder,
        primitives::{Address, Bytes, TxHash},
        providers::Provider,
        rpc::types::TransactionRequest,
        signers::local::PrivateKeySigner,
        transports::TransportError,
    },
    ethrpc::{AlloyProvider, alloy::errors::RpcErrorExt},
};

/// [`NetworkClient`] backed by an alloy provider.
pub struct AlloyNetworkClient {
    provider: AlloyProvider,
    /// Account of the locally configured signer. Without one the node signs
    /// with its first unlocked account.
    signer: Option<Address>,
}

impl AlloyNetworkClient {
    pub fn new(provider: AlloyProvider, signer: Option<Address>) -> Self {
        Self { provider, signer }
    }

    /// Connects to `network`, signing locally if a private key is given.
    pub fn connect(network: &NetworkConfig, signer: Option<PrivateKeySigner>) -> Self {
        match signer {
            Some(signer) => {
                let address = signer.address();
                let provider =
                    ethrpc::alloy::provider_with_signer(&network.url, &network.name, signer);
                Self::new(provider, Some(address))
            }
            None => Self::new(
                ethrpc::alloy::provider(&network.url, &network.name),
                None,
            ),
        }
    }
}

fn rpc_error(err: TransportError) -> ClientError {
    if err.is_revert() {
        ClientError::Reverted(err.to_string())
    } else {
        ClientError::Rpc(err.into())
    }
}

#[async_trait::async_trait]
impl NetworkClient for AlloyNetworkClient {
    async fn chain_id(&self) -> Result<u64, ClientError> {
        self.provider.get_chain_id().await.map_err(rpc_error)
    }

    async fn signer(&self) -> Result<Address, ClientError> {
        if let Some(address) = self.signer {
            return Ok(address);
        }
        let accounts = self.provider.get_accounts().await.map_err(rpc_error)?;
        accounts.first().copied().ok_or(ClientError::NoAccounts)
    }

    async fn submit_creation(&self, from: Address, init_code: Bytes) -> Result<TxHash, ClientError> {
        let tx = TransactionRequest::default()
            .from(from)
            .with_deploy_code(init_code);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(rpc_error)?;
        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>, ClientError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(rpc_error)?;
        Ok(receipt.map(|receipt| Receipt {
            transaction_hash: receipt.transaction_hash,
            status: receipt.status(),
            contract_address: receipt.contract_address,
            block_number: receipt.block_number,
        }))
    }

    async fn block_number(&self) -> Result<u64, ClientError> {
        self.provider.get_block_number().await.map_err(rpc_error)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::{U64, address},
    };

    const ACCOUNT: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    #[tokio::test]
    async fn reads_chain_id() {
        let (provider, asserter) = ethrpc::alloy::dummy_provider();
        asserter.push_success(&U64::from(31337));

        let client = AlloyNetworkClient::new(provider, None);

        assert_eq!(client.chain_id().await.unwrap(), 31337);
    }

    #[tokio::test]
    async fn configured_signer_needs_no_rpc_call() {
        let (provider, _asserter) = ethrpc::alloy::dummy_provider();
        let client = AlloyNetworkClient::new(provider, Some(ACCOUNT));

        assert_eq!(client.signer().await.unwrap(), ACCOUNT);
    }

    #[tokio::test]
    async fn falls_back_to_first_node_account() {
        let (provider, asserter) = ethrpc::alloy::dummy_provider();
        asserter.push_success(&vec![ACCOUNT, Address::repeat_byte(2)]);

        let client = AlloyNetworkClient::new(provider, None);

        assert_eq!(client.signer().await.unwrap(), ACCOUNT);
    }

    #[tokio::test]
    async fn node_without_accounts() {
        let (provider, asserter) = ethrpc::alloy::dummy_provider();
        asserter.push_success(&Vec::<Address>::new());

        let client = AlloyNetworkClient::new(provider, None);

        assert!(matches!(
            client.signer().await,
            Err(ClientError::NoAccounts)
        ));
    }

    #[tokio::test]
    async fn pending_transaction_has_no_receipt() {
        let (provider, asserter) = ethrpc::alloy::dummy_provider();
        asserter.push_success(&serde_json::Value::Null);

        let client = AlloyNetworkClient::new(provider, None);

        assert_eq!(client.receipt(TxHash::repeat_byte(1)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn classifies_rpc_failures() {
        let (provider, asserter) = ethrpc::alloy::dummy_provider();
        asserter.push_failure_msg("header not found");
        asserter.push_failure_msg("execution reverted");

        let client = AlloyNetworkClient::new(provider, None);

        assert!(matches!(
            client.block_number().await,
            Err(ClientError::Rpc(_))
        ));
        assert!(matches!(
            client.block_number().await,
            Err(ClientError::Reverted(_))
        ));
    }
}
