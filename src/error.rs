use std::fmt::{self, Display};

use alloy::{
    contract,
    primitives::{Bytes, TxHash},
    providers::PendingTransactionError,
    sol_types, transports,
};

use crate::order::OrderError;

/// Call/transaction revert reason, decoded from the standard
/// `Error(string)` payload when possible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevertReason {
    Message(String),
    Generic(String),
    Unknown,
}

/// Error returned by the RPC provider or the exchange contract as a result
/// of a call or transaction execution.
#[derive(Debug, thiserror::Error)]
pub enum DexError {
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    NullResp,

    #[error("transaction ran out of gas")]
    OutOfGas,

    #[error("transaction reverted: {0}")]
    Reverted(Box<RevertReason>),

    #[error("transaction {0} failed on-chain")]
    TransactionFailed(TxHash),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("transaction timed out")]
    Timeout,

    #[error("order error: {0}")]
    Order(#[from] OrderError),
}

impl DexError {
    /// Short human-readable reason, suitable for a transient UI message.
    pub fn reason(&self) -> String {
        match self {
            DexError::Reverted(reason) => reason.to_string(),
            DexError::TransactionFailed(_) => "transaction failed".to_string(),
            DexError::OutOfGas => "out of gas".to_string(),
            other => other.to_string(),
        }
    }
}

impl Display for RevertReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevertReason::Message(msg) => write!(f, "{msg}"),
            RevertReason::Generic(raw) => write!(f, "{raw}"),
            RevertReason::Unknown => write!(f, "unknown reason"),
        }
    }
}

impl From<contract::Error> for DexError {
    fn from(value: contract::Error) -> Self {
        match value {
            contract::Error::UnknownFunction(_) => Self::Fatal(value.to_string()),
            contract::Error::UnknownSelector(_) => Self::Fatal(value.to_string()),
            contract::Error::NotADeploymentTransaction => Self::Fatal(value.to_string()),
            contract::Error::ContractNotDeployed => Self::Fatal(value.to_string()),
            contract::Error::ZeroData(_, _) => Self::Fatal(value.to_string()),
            contract::Error::AbiError(_) => Self::Fatal(value.to_string()),
            contract::Error::TransportError(rpc_err) => Self::from(rpc_err),
            contract::Error::PendingTransactionError(err) => err.into(),
        }
    }
}

impl From<PendingTransactionError> for DexError {
    fn from(value: PendingTransactionError) -> Self {
        match value {
            PendingTransactionError::FailedToRegister => Self::Fatal(value.to_string()),
            PendingTransactionError::TransportError(rpc_err) => Self::from(rpc_err),
            PendingTransactionError::Recv(_) => Self::Transport(value.to_string()),
            PendingTransactionError::TxWatcher(err) => match err {
                alloy::providers::WatchTxError::Timeout => Self::Timeout,
            },
        }
    }
}

impl<E: Display> From<transports::RpcError<E>> for DexError {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                // Heuristic to determine if eth_call failed due to OutOfGas or
                // if transaction was reverted during the gas estimation
                let msg = resp.message.to_ascii_lowercase();
                if (resp.code == -32603) && (msg.contains("gas") || msg.contains("oog")) {
                    Self::OutOfGas
                } else if ((resp.code == -32600 || resp.code == -32601 || resp.code == -32602)
                    && (msg.contains("invalid") || msg.contains("not found")))
                    || (resp.code == -32603
                        && (msg.contains("block by number") || msg.contains("getting block")))
                {
                    Self::InvalidRequest(msg)
                } else if (resp.code == 3 || resp.code == -32000) && msg.contains("revert") {
                    Self::Reverted(Box::new(RevertReason::from(value)))
                } else if msg.contains("insufficient funds") {
                    Self::InvalidRequest(msg)
                } else {
                    Self::Transport(value.to_string())
                }
            }
            transports::RpcError::NullResp => Self::NullResp,
            _ => Self::Transport(value.to_string()),
        }
    }
}

impl From<sol_types::Error> for DexError {
    fn from(value: sol_types::Error) -> Self {
        Self::Fatal(value.to_string())
    }
}

impl<E: Display> From<transports::RpcError<E>> for RevertReason {
    fn from(value: transports::RpcError<E>) -> Self {
        let decoded = value
            .as_error_resp()
            .and_then(|payload| payload.as_revert_data())
            .map(RevertReason::from);
        match decoded {
            Some(RevertReason::Message(msg)) => Self::Message(msg),
            _ => Self::Generic(value.to_string()),
        }
    }
}

impl From<Bytes> for RevertReason {
    fn from(value: Bytes) -> Self {
        if value.is_empty() {
            return Self::Unknown;
        }
        match sol_types::decode_revert_reason(&value) {
            Some(msg) => Self::Message(msg),
            None => Self::Generic(value.to_string()),
        }
    }
}
