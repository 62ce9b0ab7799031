use {
    crate::{artifact::ContractArtifact, network::NetworkConfig},
    alloy::{
        dyn_abi::{DynSolType, DynSolValue, Specifier},
        primitives::Bytes,
    },
    serde_json::Value,
};

/// A single constructor argument.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructorArg {
    /// An already typed ABI value. It must match the parameter type exactly.
    Typed(DynSolValue),
    /// A JSON value, coerced to the parameter type when the request is
    /// encoded. Integers that do not fit into a JSON number must be given as
    /// decimal or hex strings.
    Json(Value),
}

impl From<DynSolValue> for ConstructorArg {
    fn from(value: DynSolValue) -> Self {
        Self::Typed(value)
    }
}

impl From<Value> for ConstructorArg {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl ConstructorArg {
    fn resolve(&self, ty: &DynSolType) -> Result<DynSolValue, String> {
        match self {
            Self::Typed(value) if ty.matches(value) => Ok(value.clone()),
            Self::Typed(value) => Err(format!("{value:?} is not a {ty}")),
            Self::Json(value) => coerce_json(ty, value),
        }
    }
}

/// Everything needed to deploy one contract.
///
/// Deploying the same request twice creates two contracts at different
/// addresses: the address of a created contract depends on the sender's
/// nonce, so requests are not idempotent.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    contract_name: String,
    constructor_args: Vec<ConstructorArg>,
    network: NetworkConfig,
}

impl DeploymentRequest {
    pub fn new(
        contract_name: impl Into<String>,
        constructor_args: Vec<ConstructorArg>,
        network: NetworkConfig,
    ) -> Self {
        Self {
            contract_name: contract_name.into(),
            constructor_args,
            network,
        }
    }

    pub fn contract_name(&self) -> &str {
        &self.contract_name
    }

    pub fn constructor_args(&self) -> &[ConstructorArg] {
        &self.constructor_args
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Builds the init code of the creation transaction: the artifact's
    /// creation bytecode followed by the ABI encoded constructor arguments.
    pub fn init_code(&self, artifact: &ContractArtifact) -> Result<Bytes, ArgumentMismatch> {
        let inputs = artifact.constructor_inputs();
        if inputs.len() != self.constructor_args.len() {
            return Err(ArgumentMismatch::Count {
                expected: inputs.len(),
                actual: self.constructor_args.len(),
            });
        }

        let values = inputs
            .iter()
            .zip(&self.constructor_args)
            .enumerate()
            .map(|(index, (param, arg))| {
                let mismatch = |reason: String| ArgumentMismatch::Type {
                    index,
                    name: param.name.clone(),
                    reason,
                };
                let ty = param.resolve().map_err(|err| mismatch(err.to_string()))?;
                arg.resolve(&ty).map_err(mismatch)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut init_code = artifact.bytecode.to_vec();
        init_code.extend(DynSolValue::Tuple(values).abi_encode_params());
        Ok(init_code.into())
    }
}

/// Coerces a JSON value into an ABI value of type `ty`. JSON arrays map to
/// Solidity arrays and tuples, scalars are parsed with alloy's Solidity
/// literal syntax.
fn coerce_json(ty: &DynSolType, value: &Value) -> Result<DynSolValue, String> {
    let coerce_all = |ty: &DynSolType, items: &[Value]| {
        items
            .iter()
            .map(|item| coerce_json(ty, item))
            .collect::<Result<Vec<_>, _>>()
    };

    match (ty, value) {
        (DynSolType::Array(inner), Value::Array(items)) => {
            coerce_all(inner, items).map(DynSolValue::Array)
        }
        (DynSolType::FixedArray(inner, len), Value::Array(items)) => {
            if items.len() != *len {
                return Err(format!("expected {len} elements for {ty} but got {}", items.len()));
            }
            coerce_all(inner, items).map(DynSolValue::FixedArray)
        }
        (DynSolType::Tuple(types), Value::Array(items)) => {
            if items.len() != types.len() {
                return Err(format!(
                    "expected {} components for {ty} but got {}",
                    types.len(),
                    items.len()
                ));
            }
            types
                .iter()
                .zip(items)
                .map(|(ty, item)| coerce_json(ty, item))
                .collect::<Result<Vec<_>, _>>()
                .map(DynSolValue::Tuple)
        }
        (_, Value::String(s)) => ty.coerce_str(s).map_err(|err| err.to_string()),
        // Integers beyond 64 bits are parsed as floats and would lose
        // precision.
        (_, Value::Number(n)) if n.is_u64() || n.is_i64() => {
            ty.coerce_str(&n.to_string()).map_err(|err| err.to_string())
        }
        (_, Value::Number(n)) => Err(format!(
            "{n} is not an exact integer, pass large integers as strings"
        )),
        (_, Value::Bool(b)) => ty.coerce_str(&b.to_string()).map_err(|err| err.to_string()),
        _ => Err(format!("cannot encode {value} as {ty}")),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentMismatch {
    #[error("constructor takes {expected} arguments but {actual} were given")]
    Count { expected: usize, actual: usize },
    #[error("argument {index} ({name}): {reason}")]
    Type {
        index: usize,
        name: String,
        reason: String,
    },
}
