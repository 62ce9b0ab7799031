use {
    serde::Deserialize,
    std::{collections::BTreeMap, path::Path},
    url::Url,
};

/// Name of the built-in development network.
pub const LOCAL: &str = "local";
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";
pub const DEFAULT_CHAIN_ID: u64 = 31337;

/// Connection parameters of a network a contract gets deployed to. Built once
/// at startup and never re-read from the environment afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub name: String,
    pub url: Url,
    pub chain_id: u64,
}

impl NetworkConfig {
    /// The local development network (Anvil or a Hardhat node) with optional
    /// endpoint and chain id overrides.
    pub fn local(url: Option<Url>, chain_id: Option<u64>) -> Self {
        Self {
            name: LOCAL.to_owned(),
            url: url.unwrap_or_else(|| DEFAULT_RPC_URL.parse().expect("valid default url")),
            chain_id: chain_id.unwrap_or(DEFAULT_CHAIN_ID),
        }
    }
}

/// All networks known to the process, addressable by name.
#[derive(Debug, Clone)]
pub struct Networks(BTreeMap<String, NetworkConfig>);

impl Networks {
    pub fn new(local: NetworkConfig) -> Self {
        Self(BTreeMap::from([(local.name.clone(), local)]))
    }

    /// Builds the network registry from the local network and an optional
    /// TOML file declaring additional networks:
    ///
    /// ```toml
    /// [networks.sepolia]
    /// url = "https://rpc.sepolia.org"
    /// chain-id = 11155111
    /// ```
    pub async fn load(local: NetworkConfig, path: Option<&Path>) -> Result<Self, Error> {
        let Some(path) = path else {
            return Ok(Self::new(local));
        };
        let data = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::Io {
                path: path.to_owned(),
                source,
            })?;
        Self::from_toml(local, &data)
    }

    fn from_toml(local: NetworkConfig, data: &str) -> Result<Self, Error> {
        let file: File = toml::de::from_str(data)?;
        let mut networks = Self::new(local);
        for (name, network) in file.networks {
            if networks.0.contains_key(&name) {
                return Err(Error::Redefined(name));
            }
            networks.0.insert(
                name.clone(),
                NetworkConfig {
                    name,
                    url: network.url,
                    chain_id: network.chain_id,
                },
            );
        }
        Ok(networks)
    }

    pub fn get(&self, name: &str) -> Result<&NetworkConfig, Error> {
        self.0.get(name).ok_or_else(|| Error::Unknown {
            name: name.to_owned(),
            known: self.0.keys().cloned().collect(),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct File {
    #[serde(default)]
    networks: BTreeMap<String, NetworkEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct NetworkEntry {
    url: Url,
    chain_id: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read networks file {path:?}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid networks file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("network {0} is built in and cannot be redefined")]
    Redefined(String),
    #[error("unknown network {name}, known networks: {known:?}")]
    Unknown { name: String, known: Vec<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_defaults() {
        let local = NetworkConfig::local(None, None);
        assert_eq!(local.name, "local");
        assert_eq!(local.url.as_str(), "http://127.0.0.1:8545/");
        assert_eq!(local.chain_id, 31337);
    }

    #[test]
    fn local_overrides() {
        let local = NetworkConfig::local(Some("http://node:9545".parse().unwrap()), Some(1337));
        assert_eq!(local.url.as_str(), "http://node:9545/");
        assert_eq!(local.chain_id, 1337);
    }

    #[test]
    fn parses_networks_file() {
        let networks = Networks::from_toml(
            NetworkConfig::local(None, None),
            r#"
            [networks.sepolia]
            url = "https://rpc.sepolia.org"
            chain-id = 11155111
            "#,
        )
        .unwrap();

        let sepolia = networks.get("sepolia").unwrap();
        assert_eq!(sepolia.name, "sepolia");
        assert_eq!(sepolia.url.as_str(), "https://rpc.sepolia.org/");
        assert_eq!(sepolia.chain_id, 11155111);
        assert_eq!(networks.get(LOCAL).unwrap().chain_id, DEFAULT_CHAIN_ID);
    }

    #[test]
    fn local_cannot_be_redefined() {
        let result = Networks::from_toml(
            NetworkConfig::local(None, None),
            r#"
            [networks.local]
            url = "http://127.0.0.1:7545"
            chain-id = 1
            "#,
        );
        assert!(matches!(result, Err(Error::Redefined(name)) if name == "local"));
    }

    #[test]
    fn rejects_unknown_fields() {
        let result = Networks::from_toml(
            NetworkConfig::local(None, None),
            r#"
            [networks.sepolia]
            url = "https://rpc.sepolia.org"
            chainId = 11155111
            "#,
        );
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn unknown_network_lists_known_ones() {
        let networks = Networks::new(NetworkConfig::local(None, None));
        let err = networks.get("mainnet").unwrap_err();
        assert!(matches!(
            err,
            Error::Unknown { name, known } if name == "mainnet" && known == ["local"]
        ));
    }

    #[tokio::test]
    async fn load_without_file_only_knows_local() {
        let networks = Networks::load(NetworkConfig::local(None, None), None)
            .await
            .unwrap();
        assert!(networks.get(LOCAL).is_ok());
    }
}
