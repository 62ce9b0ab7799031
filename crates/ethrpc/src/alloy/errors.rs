use alloy::transports::{RpcError, TransportError};

pub trait RpcErrorExt {
    /// Returns whether the node rejected the request because EVM execution
    /// reverted, as opposed to the node being unreachable or failing for an
    /// unrelated reason.
    fn is_revert(&self) -> bool;
}

impl RpcErrorExt for TransportError {
    fn is_revert(&self) -> bool {
        match self {
            // Nodes disagree on how they report reverts during gas estimation:
            // some attach the revert data, others only say so in the message
            // (e.g. an empty revert from a constructor without a reason).
            RpcError::ErrorResp(err) => {
                let has_revert_data = err.as_revert_data().is_some();
                tracing::debug!(?err, %has_revert_data, "rpc error response");
                has_revert_data || err.message.contains("revert")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        alloy::{rpc::json_rpc::ErrorPayload, transports::TransportErrorKind},
        serde_json::value::RawValue,
    };

    fn error_response(message: &'static str, data: Option<&str>) -> TransportError {
        TransportError::ErrorResp(ErrorPayload {
            code: 3,
            message: message.into(),
            data: data.map(|data| RawValue::from_string(data.to_owned()).unwrap()),
        })
    }

    #[test]
    fn revert_with_data() {
        let err = error_response(
            "execution reverted: supply too large",
            Some(r#""0x08c379a00000000000000000000000000000000000000000000000000000000000000020""#),
        );
        assert!(err.is_revert());
    }

    #[test]
    fn revert_without_data() {
        assert!(error_response("execution reverted", None).is_revert());
    }

    #[test]
    fn node_errors_are_not_reverts() {
        assert!(!error_response("insufficient funds for gas * price + value", None).is_revert());
        assert!(!TransportError::ErrorResp(ErrorPayload::internal_error()).is_revert());
        assert!(!TransportErrorKind::custom_str("connection refused").is_revert());
    }
}
