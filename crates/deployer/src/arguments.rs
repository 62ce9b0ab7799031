use {
    crate::{artifact::DEFAULT_ROOTS, deploy},
    alloy::{primitives::TxHash, signers::local::PrivateKeySigner},
    clap::{Parser, Subcommand},
    serde_json::Value,
    std::{fmt, path::PathBuf, str::FromStr, time::Duration},
    url::Url,
};

/// Deploy compiled contracts to an Ethereum network.
#[derive(Parser)]
#[command(version)]
pub struct Arguments {
    #[clap(subcommand)]
    pub command: Command,

    /// The log filter.
    #[clap(
        long,
        env,
        global = true,
        default_value = "warn,deployer=info,ethrpc=info"
    )]
    pub log_filter: String,

    /// Log as JSON.
    #[clap(long, env, global = true)]
    pub use_json_logs: bool,

    /// Node URL of the built-in `local` network. Defaults to
    /// http://127.0.0.1:8545.
    #[clap(long, env = "RPC_URL", global = true)]
    pub rpc_url: Option<Url>,

    /// Chain id of the built-in `local` network. Defaults to 31337.
    #[clap(long, env = "CHAIN_ID", global = true)]
    pub chain_id: Option<u64>,

    /// TOML file declaring additional networks.
    #[clap(long, env, global = true)]
    pub networks_file: Option<PathBuf>,

    /// Directories containing compiled contract artifacts, searched in
    /// order.
    #[clap(
        long,
        env,
        global = true,
        value_delimiter = ',',
        default_values = DEFAULT_ROOTS,
    )]
    pub artifacts: Vec<PathBuf>,

    /// Private key of the deploying account. Without it the node's first
    /// unlocked account is used.
    #[clap(long, env = "PRIVATE_KEY", global = true, hide_env_values = true)]
    pub private_key: Option<PrivateKeySigner>,

    /// How long to wait for the deployment to be confirmed.
    #[clap(
        long,
        env,
        global = true,
        default_value = "30s",
        value_parser = humantime::parse_duration,
    )]
    pub confirmation_timeout: Duration,

    /// Delay between two receipt queries.
    #[clap(
        long,
        env,
        global = true,
        default_value = "1s",
        value_parser = humantime::parse_duration,
    )]
    pub poll_interval: Duration,

    /// Number of blocks required for a deployment to count as confirmed.
    #[clap(
        long,
        env,
        global = true,
        default_value = "1",
        value_parser = clap::value_parser!(u64).range(1..),
    )]
    pub confirmations: u64,
}

#[derive(Subcommand)]
pub enum Command {
    /// Deploy a contract and wait for it to be mined.
    Deploy {
        /// Name of the network to deploy to.
        #[clap(long, default_value = "local")]
        network: String,

        /// Name of the contract to deploy.
        #[clap(long, default_value = "GoldSilverStablecoin")]
        contract: String,

        /// Constructor arguments as a JSON array. Large integers have to be
        /// given as strings.
        #[clap(long, default_value = "[]")]
        args: JsonArgs,

        /// Print the full result as JSON instead of only the address.
        #[clap(long)]
        json: bool,
    },
    /// Look up a previously submitted deployment transaction.
    Status {
        /// Name of the network the transaction was sent to.
        #[clap(long, default_value = "local")]
        network: String,

        #[clap(long)]
        tx_hash: TxHash,

        /// Print the full result as JSON instead of only the address.
        #[clap(long)]
        json: bool,
    },
}

/// Constructor arguments parsed from a JSON array.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonArgs(pub Vec<Value>);

impl FromStr for JsonArgs {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match serde_json::from_str(s) {
            Ok(Value::Array(values)) => Ok(Self(values)),
            Ok(_) => Err("constructor arguments must be a JSON array".to_owned()),
            Err(err) => Err(format!("invalid JSON: {err}")),
        }
    }
}

impl Arguments {
    pub fn deploy_config(&self) -> deploy::Config {
        deploy::Config {
            confirmation_timeout: self.confirmation_timeout,
            poll_interval: self.poll_interval,
            confirmations: self.confirmations,
        }
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "log_filter: {}", self.log_filter)?;
        writeln!(f, "use_json_logs: {}", self.use_json_logs)?;
        writeln!(f, "rpc_url: {:?}", self.rpc_url.as_ref().map(Url::as_str))?;
        writeln!(f, "chain_id: {:?}", self.chain_id)?;
        writeln!(f, "networks_file: {:?}", self.networks_file)?;
        writeln!(f, "artifacts: {:?}", self.artifacts)?;
        let private_key = self.private_key.as_ref().map(|_| "SECRET");
        writeln!(f, "private_key: {private_key:?}")?;
        writeln!(f, "confirmation_timeout: {:?}", self.confirmation_timeout)?;
        writeln!(f, "poll_interval: {:?}", self.poll_interval)?;
        writeln!(f, "confirmations: {}", self.confirmations)?;
        match &self.command {
            Command::Deploy {
                network,
                contract,
                args,
                json,
            } => {
                writeln!(f, "command: deploy")?;
                writeln!(f, "network: {network}")?;
                writeln!(f, "contract: {contract}")?;
                writeln!(f, "args: {}", Value::Array(args.0.clone()))?;
                writeln!(f, "json: {json}")?;
            }
            Command::Status {
                network,
                tx_hash,
                json,
            } => {
                writeln!(f, "command: status")?;
                writeln!(f, "network: {network}")?;
                writeln!(f, "tx_hash: {tx_hash}")?;
                writeln!(f, "json: {json}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn parse(args: &[&str]) -> Arguments {
        Arguments::try_parse_from(std::iter::once("deployer").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn deploy_command() {
        let args = parse(&[
            "deploy",
            "--network",
            "local",
            "--args",
            r#"["0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266", "1000000000000000000000000"]"#,
        ]);

        let Command::Deploy {
            network,
            contract,
            args: constructor_args,
            json,
        } = &args.command
        else {
            panic!("expected deploy command");
        };
        assert_eq!(network, "local");
        assert_eq!(contract, "GoldSilverStablecoin");
        assert_eq!(
            constructor_args.0,
            [
                json!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
                json!("1000000000000000000000000")
            ]
        );
        assert!(!json);
    }

    #[test]
    fn deploy_defaults() {
        let args = parse(&["deploy"]);
        assert!(matches!(
            &args.command,
            Command::Deploy { network, args, .. } if network == "local" && args.0.is_empty()
        ));
    }

    #[test]
    fn shared_flags_follow_the_subcommand() {
        let args = parse(&[
            "deploy",
            "--confirmation-timeout",
            "2m",
            "--poll-interval",
            "250ms",
            "--confirmations",
            "3",
            "--artifacts",
            "out,build/artifacts",
        ]);

        let config = args.deploy_config();
        assert_eq!(config.confirmation_timeout, Duration::from_secs(120));
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.confirmations, 3);
        assert_eq!(
            args.artifacts,
            [PathBuf::from("out"), PathBuf::from("build/artifacts")]
        );
    }

    #[test]
    fn status_command() {
        let tx_hash = format!("0x{}", "11".repeat(32));
        let args = parse(&["status", "--tx-hash", &tx_hash]);
        assert!(matches!(
            args.command,
            Command::Status { tx_hash, .. } if tx_hash == TxHash::repeat_byte(0x11)
        ));
    }

    #[test]
    fn args_must_be_a_json_array() {
        assert!("[]".parse::<JsonArgs>().is_ok());
        assert!(r#"{"deployer": "0x"}"#.parse::<JsonArgs>().is_err());
        assert!("[1,".parse::<JsonArgs>().is_err());
        assert!(
            Arguments::try_parse_from(["deployer", "deploy", "--args", "42"]).is_err()
        );
    }

    #[test]
    fn zero_confirmations_are_rejected() {
        assert!(
            Arguments::try_parse_from(["deployer", "deploy", "--confirmations", "0"]).is_err()
        );
    }

    #[test]
    fn display_redacts_private_key() {
        let args = parse(&["deploy", "--private-key", KEY]);
        let display = args.to_string();
        assert!(display.contains("private_key: Some(\"SECRET\")"));
        assert!(!display.contains(&KEY[2..]));
    }
}
