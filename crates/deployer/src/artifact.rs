//! Compiled contract artifacts produced by an external build step.
//!
//! Both the Hardhat layout (`artifacts/contracts/**/<File>.sol/<Name>.json`
//! with `"bytecode": "0x.."`) and the Foundry layout
//! (`out/<File>.sol/<Name>.json` with `"bytecode": {"object": "0x.."}`) are
//! understood.

use {
    alloy::{
        json_abi::{JsonAbi, Param},
        primitives::Bytes,
    },
    serde::Deserialize,
    std::{
        fs,
        path::{Path, PathBuf},
    },
};

/// Roots searched when no artifact directories are configured.
pub const DEFAULT_ROOTS: [&str; 2] = ["artifacts/contracts", "out"];

/// ABI and creation code of a single contract.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub name: String,
    pub abi: JsonAbi,
    pub bytecode: Bytes,
}

impl ContractArtifact {
    /// Parses the JSON artifact of contract `name`.
    pub fn from_json(name: &str, json: &str) -> Result<Self, Error> {
        let file: ArtifactFile = serde_json::from_str(json).map_err(|source| Error::Malformed {
            name: name.to_owned(),
            source,
        })?;
        let bytecode = match file.bytecode {
            Bytecode::Hex(bytes) => bytes,
            Bytecode::Object { object } => object,
        };
        if bytecode.is_empty() {
            return Err(Error::NotDeployable(name.to_owned()));
        }

        Ok(Self {
            name: name.to_owned(),
            abi: file.abi,
            bytecode,
        })
    }

    /// Constructor parameters in declaration order. Contracts without an
    /// explicit constructor take no arguments.
    pub fn constructor_inputs(&self) -> &[Param] {
        self.abi
            .constructor()
            .map(|constructor| constructor.inputs.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Deserialize)]
struct ArtifactFile {
    abi: JsonAbi,
    bytecode: Bytecode,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Bytecode {
    /// Hardhat
    Hex(Bytes),
    /// Foundry
    Object { object: Bytes },
}

/// Resolves contract names to compiled artifacts. Implementations may block,
/// callers on an async runtime should use a blocking task.
#[cfg_attr(test, mockall::automock)]
pub trait ArtifactSource: Send + Sync {
    fn artifact(&self, name: &str) -> Result<ContractArtifact, Error>;
}

/// Looks up artifacts in build output directories on disk.
///
/// Roots are searched in order and the first root containing the contract
/// wins. This matters for mixed Hardhat/Foundry projects where both tools
/// emit an artifact for the same contract.
#[derive(Debug, Clone)]
pub struct ArtifactDirs {
    roots: Vec<PathBuf>,
}

impl ArtifactDirs {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    fn find(&self, name: &str) -> Result<PathBuf, Error> {
        let file_name = format!("{name}.json");
        for root in self.roots.iter().filter(|root| root.is_dir()) {
            let mut found = Vec::new();
            collect_artifacts(root, &file_name, &mut found)?;
            match found.len() {
                0 => continue,
                1 => return Ok(found.remove(0)),
                _ => {
                    found.sort();
                    return Err(Error::Ambiguous {
                        name: name.to_owned(),
                        paths: found,
                    });
                }
            }
        }
        Err(Error::NotFound {
            name: name.to_owned(),
            roots: self.roots.clone(),
        })
    }
}

impl Default for ArtifactDirs {
    fn default() -> Self {
        Self::new(DEFAULT_ROOTS.iter().map(PathBuf::from).collect())
    }
}

impl ArtifactSource for ArtifactDirs {
    fn artifact(&self, name: &str) -> Result<ContractArtifact, Error> {
        let path = self.find(name)?;
        tracing::debug!(?path, "loading contract artifact");
        let json = fs::read_to_string(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        ContractArtifact::from_json(name, &json)
    }
}

/// Artifacts live in one directory per source file (`<File>.sol`), which may
/// be nested arbitrarily deep below the root.
fn collect_artifacts(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> Result<(), Error> {
    let io_error = |source| Error::Io {
        path: dir.to_owned(),
        source,
    };
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let entry = entry.map_err(io_error)?;
        // Symlinked directories are not followed, they may form cycles.
        if !entry.file_type().map_err(io_error)?.is_dir() {
            continue;
        }
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "sol") {
            let candidate = path.join(file_name);
            if candidate.is_file() {
                found.push(candidate);
            }
        } else {
            collect_artifacts(&path, file_name, found)?;
        }
    }
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no artifact for contract {name} in {roots:?}")]
    NotFound { name: String, roots: Vec<PathBuf> },
    #[error("contract name {name} is ambiguous, candidates: {paths:?}")]
    Ambiguous { name: String, paths: Vec<PathBuf> },
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed artifact for contract {name}: {source}")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("contract {0} has no creation code, it is abstract or an interface")]
    NotDeployable(String),
    #[error("lookup of contract {0} was aborted")]
    Aborted(String),
}
