pub mod arguments;
pub mod artifact;
pub mod client;
pub mod deploy;
pub mod network;
pub mod request;
pub mod traits;

pub use {
    deploy::{Config, DeploymentResult, Deployer, Error},
    network::NetworkConfig,
    request::{ArgumentMismatch, ConstructorArg, DeploymentRequest},
};
use {
    crate::{
        arguments::{Arguments, Command},
        artifact::ArtifactDirs,
        client::AlloyNetworkClient,
        network::Networks,
    },
    alloy::signers::local::PrivateKeySigner,
    anyhow::Context,
    clap::Parser,
    std::{
        io::{self, Write},
        process::ExitCode,
        sync::Arc,
    },
};

/// Entry point of the `deployer` binary.
pub async fn start(args: impl Iterator<Item = String>) -> ExitCode {
    let args = match Arguments::try_parse_from(args) {
        Ok(args) => args,
        Err(err) => return usage(&err),
    };
    observe::tracing::initialize(&observe::Config::new(
        &args.log_filter,
        args.use_json_logs,
    ));
    observe::panic_hook::install();
    tracing::info!("running deployer with validated arguments:\n{}", args);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(?err, "run failed");
            if let Err(err) = report(&err, &mut std::io::stderr()) {
                tracing::error!(?err, "failed to report error");
            }
            ExitCode::FAILURE
        }
    }
}

/// Prints a parse failure. Only `--help` and `--version` count as success.
fn usage(err: &clap::Error) -> ExitCode {
    // Logging is not initialized yet, stderr is all there is.
    let _ = err.print();
    if err.use_stderr() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

pub async fn run(args: Arguments) -> anyhow::Result<()> {
    let local = NetworkConfig::local(args.rpc_url.clone(), args.chain_id);
    let networks = Networks::load(local, args.networks_file.as_deref())
        .await
        .context("failed to load network configuration")?;
    let artifacts = ArtifactDirs::new(args.artifacts.clone());
    let config = args.deploy_config();

    match args.command {
        Command::Deploy {
            network,
            contract,
            args: constructor_args,
            json,
        } => {
            let network = networks.get(&network)?.clone();
            // Listening starts now so that an interrupt after submission
            // cancels the wait instead of killing the process.
            let cancel = shutdown_signal()?;
            let deployer = deployer(&network, args.private_key, artifacts, config);
            let request = DeploymentRequest::new(
                contract,
                constructor_args
                    .0
                    .into_iter()
                    .map(ConstructorArg::Json)
                    .collect(),
                network,
            );
            let result = deployer
                .deploy_with_cancellation(&request, cancel)
                .await?;
            print(&result, json)
        }
        Command::Status {
            network,
            tx_hash,
            json,
        } => {
            let network = networks.get(&network)?;
            let deployer = deployer(network, args.private_key, artifacts, config);
            match deployer.lookup(tx_hash).await? {
                Some(result) => print(&result, json),
                None => anyhow::bail!("transaction {tx_hash} is unknown or not mined yet"),
            }
        }
    }
}

fn deployer(
    network: &NetworkConfig,
    private_key: Option<PrivateKeySigner>,
    artifacts: ArtifactDirs,
    config: deploy::Config,
) -> Deployer {
    let client = AlloyNetworkClient::connect(network, private_key);
    Deployer::new(Arc::new(client), Arc::new(artifacts), config)
}

/// Writes the result to stdout, the only output meant for machines.
fn print(result: &DeploymentResult, json: bool) -> anyhow::Result<()> {
    if json {
        let output = serde_json::json!({
            "contractAddress": result.contract_address().to_string(),
            "transactionHash": result.transaction_hash().to_string(),
            "blockNumber": result.block_number(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", result.contract_address());
    }
    Ok(())
}

/// Writes a failed run as a single human readable report. For deployment
/// errors the kind and, if one was submitted, the transaction hash are
/// written separately so they can be grepped.
fn report(err: &anyhow::Error, out: &mut impl Write) -> io::Result<()> {
    match err.downcast_ref::<deploy::Error>() {
        Some(err) => {
            writeln!(out, "error: {}: {err}", err.kind())?;
            if let Some(tx_hash) = err.tx_hash() {
                writeln!(out, "transaction hash: {tx_hash}")?;
            }
            Ok(())
        }
        None => writeln!(out, "error: {err:#}"),
    }
}

/// Returns a future completing on SIGINT or SIGTERM. Signals are captured
/// from the moment this is called, not only once the future is polled.
#[cfg(unix)]
fn shutdown_signal() -> anyhow::Result<impl Future<Output = ()> + Send> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint =
        signal(SignalKind::interrupt()).context("failed to install SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => tracing::info!("received SIGINT signal, stopping"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM signal, stopping"),
        }
    })
}

#[cfg(not(unix))]
fn shutdown_signal() -> anyhow::Result<impl Future<Output = ()> + Send> {
    Ok(async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("received CTRL+C signal, stopping"),
            Err(err) => {
                tracing::warn!(?err, "failed to install CTRL+C handler");
                std::future::pending().await
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::primitives::TxHash,
        std::time::Duration,
    };

    fn args(args: &[&str]) -> std::vec::IntoIter<String> {
        std::iter::once("deployer")
            .chain(args.iter().copied())
            .map(str::to_owned)
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[tokio::test]
    async fn usage_errors_exit_with_failure() {
        assert_eq!(
            start(args(&["deploy", "--args", "42"])).await,
            ExitCode::FAILURE
        );
        assert_eq!(
            start(args(&["deploy", "--args", "[1,"])).await,
            ExitCode::FAILURE
        );
        assert_eq!(
            start(args(&["deploy", "--confirmations", "0"])).await,
            ExitCode::FAILURE
        );
        assert_eq!(start(args(&["undeploy"])).await, ExitCode::FAILURE);
    }

    #[tokio::test]
    async fn help_and_version_succeed() {
        assert_eq!(start(args(&["--help"])).await, ExitCode::SUCCESS);
        assert_eq!(start(args(&["--version"])).await, ExitCode::SUCCESS);
    }

    #[test]
    fn report_names_kind_and_transaction_hash() {
        let err = anyhow::Error::from(deploy::Error::Timeout {
            tx_hash: TxHash::repeat_byte(0x11),
            timeout: Duration::from_secs(30),
        });
        let mut out = Vec::new();
        report(&err, &mut out).unwrap();

        let out = String::from_utf8(out).unwrap();
        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with("error: Timeout: "));
        assert_eq!(
            lines.next().unwrap(),
            format!("transaction hash: {}", TxHash::repeat_byte(0x11))
        );
    }

    #[test]
    fn report_other_errors_with_context() {
        let err =
            anyhow::anyhow!("connection refused").context("failed to load network configuration");
        let mut out = Vec::new();
        report(&err, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "error: failed to load network configuration: connection refused\n"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn interrupt_before_waiting_is_not_lost() {
        let cancel = shutdown_signal().unwrap();

        let status = std::process::Command::new("kill")
            .args(["-INT", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), cancel)
            .await
            .unwrap();
    }
}
