// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Stream identities
//!
//! A [`StreamIdentity`] names one logical, filter-independent data stream:
//! one contract's event logs, one pre-encoded contract call, or one account's
//! native balance. The cache layers treat identities as opaque keys (see
//! [`StreamIdentity::cache_key`]); only the chain client interprets the
//! variant to build RPC requests.

use alloy_chains::Chain;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{keccak256, Address, Bytes};
use serde::{Deserialize, Serialize};

/// The kind of chain data a stream carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Decoded event logs of one contract and event.
    Logs {
        /// Emitting contract
        address: Address,
        /// Human-readable event declaration, e.g.
        /// `"event Transfer(address indexed from, address indexed to, uint256 value)"`.
        /// Parameter names become row field keys.
        event: String,
    },
    /// `eth_call` results for one pre-encoded call, sampled per block.
    Call {
        /// Target contract
        address: Address,
        /// Full ABI-encoded calldata (selector + arguments)
        calldata: Bytes,
    },
    /// Native balance of one account, sampled per block.
    Balance {
        /// Account address
        address: Address,
    },
}

/// Chain-scoped identity of a logical data stream.
///
/// All cache entries for one identity share one coverage index, regardless
/// of the filters they were fetched under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamIdentity {
    /// Chain the stream lives on
    pub chain: Chain,
    /// What the stream carries and how to request it
    pub kind: StreamKind,
}

impl StreamIdentity {
    /// Identity of one contract's event logs. `event` is the human-readable
    /// event declaration the chain client decodes rows with.
    pub fn logs(chain: Chain, address: Address, event: impl Into<String>) -> Self {
        Self {
            chain,
            kind: StreamKind::Logs {
                address,
                event: event.into(),
            },
        }
    }

    /// Identity of a contract call, built from a human-readable method
    /// signature (e.g. `"balanceOf(address)"`) and ABI values.
    ///
    /// The calldata is encoded once here; two identities built from the same
    /// signature and arguments are equal.
    pub fn call(chain: Chain, address: Address, signature: &str, args: &[DynSolValue]) -> Self {
        let selector = &keccak256(signature.as_bytes())[..4];
        let encoded = DynSolValue::Tuple(args.to_vec()).abi_encode_params();
        let mut calldata = Vec::with_capacity(4 + encoded.len());
        calldata.extend_from_slice(selector);
        calldata.extend_from_slice(&encoded);
        Self {
            chain,
            kind: StreamKind::Call {
                address,
                calldata: calldata.into(),
            },
        }
    }

    /// Identity of a contract call with already-encoded calldata.
    pub fn raw_call(chain: Chain, address: Address, calldata: Bytes) -> Self {
        Self {
            chain,
            kind: StreamKind::Call { address, calldata },
        }
    }

    /// Identity of an account's native balance.
    pub fn balance(chain: Chain, address: Address) -> Self {
        Self {
            chain,
            kind: StreamKind::Balance { address },
        }
    }

    /// Canonical store/cache key. Stable across processes; the cache layers
    /// use nothing else about the identity.
    pub fn cache_key(&self) -> String {
        match &self.kind {
            StreamKind::Logs { address, event } => {
                format!("{}:logs:{:#x}:{}", self.chain.id(), address, event)
            }
            StreamKind::Call { address, calldata } => {
                format!("{}:call:{:#x}:{:#x}", self.chain.id(), address, calldata)
            }
            StreamKind::Balance { address } => {
                format!("{}:balance:{:#x}", self.chain.id(), address)
            }
        }
    }
}

impl std::fmt::Display for StreamIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.cache_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_keys_are_distinct_per_kind() {
        let chain = Chain::mainnet();
        let addr = Address::repeat_byte(0x11);

        let logs = StreamIdentity::logs(chain, addr, "Transfer");
        let balance = StreamIdentity::balance(chain, addr);
        let call = StreamIdentity::raw_call(chain, addr, Bytes::from(vec![0xde, 0xad]));

        let keys = [logs.cache_key(), balance.cache_key(), call.cache_key()];
        assert_eq!(keys[0], format!("1:logs:{addr:#x}:Transfer"));
        assert!(keys.iter().collect::<std::collections::HashSet<_>>().len() == 3);
    }

    #[test]
    fn test_cache_key_scoped_by_chain() {
        let addr = Address::repeat_byte(0x22);
        let mainnet = StreamIdentity::balance(Chain::mainnet(), addr);
        let sepolia = StreamIdentity::balance(Chain::sepolia(), addr);
        assert_ne!(mainnet.cache_key(), sepolia.cache_key());
    }

    #[test]
    fn test_call_encoding_is_deterministic() {
        let chain = Chain::mainnet();
        let token = Address::repeat_byte(0x33);
        let holder = Address::repeat_byte(0x44);

        let a = StreamIdentity::call(
            chain,
            token,
            "balanceOf(address)",
            &[DynSolValue::Address(holder)],
        );
        let b = StreamIdentity::call(
            chain,
            token,
            "balanceOf(address)",
            &[DynSolValue::Address(holder)],
        );
        assert_eq!(a, b);
        assert_eq!(a.cache_key(), b.cache_key());

        if let StreamKind::Call { calldata, .. } = &a.kind {
            // balanceOf(address) selector is 0x70a08231
            assert_eq!(&calldata[..4], &[0x70, 0xa0, 0x82, 0x31]);
            assert_eq!(calldata.len(), 4 + 32);
        } else {
            panic!("expected call identity");
        }
    }
}
