pub mod alloy;

use ::alloy::providers::DynProvider;

/// Type-erased alloy provider used by every component talking to a node.
pub type AlloyProvider = DynProvider;
