// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Alloy-backed chain client
//!
//! Interprets each [`StreamKind`] into RPC requests:
//!
//! - `Logs`: `eth_getLogs` filtered by address and event signature topic,
//!   decoded into named fields, then constrained client-side so the result
//!   is exhaustive for the query filter
//! - `Call`: `eth_call` of the pre-encoded calldata, sampled at
//!   `sample_step`-aligned blocks within the range
//! - `Balance`: `eth_getBalance`, sampled the same way
//!
//! Sampling only at step multiples keeps row sets partition-independent:
//! fetching `[0, 2000]` in one gap or as `[0, 1500]` + `[1501, 2000]`
//! yields identical rows.

use alloy_chains::Chain;
use alloy_dyn_abi::{DynSolValue, EventExt};
use alloy_eips::BlockId;
use alloy_json_abi::Event;
use alloy_json_rpc::RpcError;
use alloy_network::{AnyNetwork, Network, TransactionBuilder};
use alloy_primitives::{hex, Address, BlockNumber, Bytes, B256, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_client::RpcClient;
use alloy_rpc_types::Log;
use alloy_transport::{TransportError, TransportErrorKind};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use super::ChainClient;
use crate::config::ChainFetchConfig;
use crate::errors::ChainError;
use crate::types::{BlockRange, FetchedRow, Filter, GridNode, StreamIdentity, StreamKind};

/// [`ChainClient`] implementation over an Alloy provider.
///
/// Generic over the provider so applications can layer transports as they
/// like; [`RpcChainClient::connect_http`] covers the common case.
///
/// # Examples
///
/// ```rust,ignore
/// use chainfetch::chain::RpcChainClient;
/// use chainfetch::ChainFetchConfig;
/// use alloy_chains::Chain;
///
/// let client = RpcChainClient::connect_http(
///     "https://eth.llamarpc.com".parse()?,
///     Chain::mainnet(),
///     &ChainFetchConfig::default(),
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RpcChainClient<P> {
    provider: P,
    chain: Chain,
    max_span: u64,
    sample_step: u64,
}

impl RpcChainClient<RootProvider<AnyNetwork>> {
    /// Connects over HTTP with no middleware.
    pub fn connect_http(url: Url, chain: Chain, config: &ChainFetchConfig) -> Self {
        let client = RpcClient::new_http(url);
        Self::new(RootProvider::new(client), chain, config)
    }
}

impl<P: Provider<AnyNetwork>> RpcChainClient<P> {
    /// Wraps an existing provider.
    pub fn new(provider: P, chain: Chain, config: &ChainFetchConfig) -> Self {
        Self {
            provider,
            chain,
            max_span: config.max_span,
            sample_step: config.sample_step,
        }
    }

    /// The chain this client talks to.
    pub fn chain(&self) -> Chain {
        self.chain
    }

    async fn fetch_log_rows(
        &self,
        address: Address,
        event_decl: &str,
        filter: &Filter,
        range: BlockRange,
    ) -> Result<Vec<FetchedRow>, ChainError> {
        let operation = format!("get_logs {address:#x} {range}");
        let event = parse_event(event_decl)?;
        let topic0: B256 = event.selector();

        let rpc_filter = alloy_rpc_types::Filter::new()
            .address(address)
            .event_signature(topic0)
            .from_block(range.start)
            .to_block(range.end);

        let logs = self
            .provider
            .get_logs(&rpc_filter)
            .await
            .map_err(|e| classify(&operation, e))?;

        debug!(
            address = %address,
            range = %range,
            logs = logs.len(),
            "Fetched logs"
        );

        let mut rows = Vec::with_capacity(logs.len());
        for log in &logs {
            let row = decode_log_row(&event, log)?;
            // Constrain client-side so the committed entry is the exhaustive
            // match set for the query filter
            if filter.matches(&row.fields) {
                rows.push(row);
            }
        }
        rows.sort();
        Ok(rows)
    }

    async fn fetch_call_rows(
        &self,
        address: Address,
        calldata: &Bytes,
        range: BlockRange,
    ) -> Result<Vec<FetchedRow>, ChainError> {
        let mut rows = Vec::new();
        for block in sample_blocks(range, self.sample_step) {
            let operation = format!("call {address:#x} at {block}");
            let tx = <AnyNetwork as Network>::TransactionRequest::default()
                .with_to(address)
                .with_input(calldata.clone());
            let returndata = self
                .provider
                .call(tx)
                .block(BlockId::number(block))
                .await
                .map_err(|e| classify(&operation, e))?;

            let mut fields = Map::new();
            fields.insert(
                "returndata".into(),
                Value::String(hex::encode_prefixed(&returndata)),
            );
            // Single-word returns also get a decoded numeric view
            if returndata.len() == 32 {
                let word = U256::from_be_slice(&returndata);
                fields.insert("value".into(), Value::String(word.to_string()));
            }
            rows.push(FetchedRow::at_block(block, fields));
        }
        Ok(rows)
    }

    async fn fetch_balance_rows(
        &self,
        address: Address,
        range: BlockRange,
    ) -> Result<Vec<FetchedRow>, ChainError> {
        let mut rows = Vec::new();
        for block in sample_blocks(range, self.sample_step) {
            let operation = format!("get_balance {address:#x} at {block}");
            let balance = self
                .provider
                .get_balance(address)
                .block_id(BlockId::number(block))
                .await
                .map_err(|e| classify(&operation, e))?;

            let mut fields = Map::new();
            fields.insert("balance".into(), Value::String(balance.to_string()));
            rows.push(FetchedRow::at_block(block, fields));
        }
        Ok(rows)
    }
}

#[async_trait]
impl<P: Provider<AnyNetwork>> ChainClient for RpcChainClient<P> {
    async fn fetch_rows(
        &self,
        identity: &StreamIdentity,
        filter: &Filter,
        range: BlockRange,
    ) -> Result<Vec<FetchedRow>, ChainError> {
        match &identity.kind {
            StreamKind::Logs { address, event } => {
                self.fetch_log_rows(*address, event, filter, range).await
            }
            StreamKind::Call { address, calldata } => {
                let rows = self.fetch_call_rows(*address, calldata, range).await?;
                Ok(rows.into_iter().filter(|r| filter.matches(&r.fields)).collect())
            }
            StreamKind::Balance { address } => {
                let rows = self.fetch_balance_rows(*address, range).await?;
                Ok(rows.into_iter().filter(|r| filter.matches(&r.fields)).collect())
            }
        }
    }

    async fn block_header(&self, number: BlockNumber) -> Result<GridNode, ChainError> {
        let operation = format!("get_block {number}");
        let block = self
            .provider
            .get_block_by_number(number.into())
            .await
            .map_err(|e| classify(&operation, e))?;

        match block {
            Some(block) => Ok(GridNode {
                number: block.header.number,
                timestamp: block.header.timestamp,
            }),
            None => {
                let tip = self.chain_tip().await?;
                Err(ChainError::InvalidBlock {
                    block_number: number,
                    tip,
                })
            }
        }
    }

    async fn chain_tip(&self) -> Result<BlockNumber, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| classify("get_block_number", e))
    }

    fn max_span(&self) -> u64 {
        self.max_span
    }
}

/// Blocks sampled for call/balance streams: every `step` multiple inside
/// the range. A range containing no multiple yields no rows, which is a
/// valid (empty) coverage unit.
fn sample_blocks(range: BlockRange, step: u64) -> Vec<BlockNumber> {
    let first = range.start.div_ceil(step) * step;
    (first..=range.end).step_by(step as usize).collect()
}

fn parse_event(decl: &str) -> Result<Event, ChainError> {
    Event::parse(decl)
        .map_err(|e| ChainError::decode(format!("parse event '{decl}'"), e.to_string()))
}

fn decode_log_row(event: &Event, log: &Log) -> Result<FetchedRow, ChainError> {
    let operation = format!("decode {} log", event.name);
    let decoded = event
        .decode_log_parts(log.topics().iter().copied(), &log.data().data)
        .map_err(|e| ChainError::decode(&operation, e.to_string()))?;

    let mut indexed = decoded.indexed.into_iter();
    let mut body = decoded.body.into_iter();
    let mut fields = Map::new();
    for param in &event.inputs {
        let value = if param.indexed {
            indexed.next()
        } else {
            body.next()
        };
        let value = value.ok_or_else(|| {
            ChainError::decode(&operation, format!("missing value for param '{}'", param.name))
        })?;
        fields.insert(param.name.clone(), dyn_value_to_json(&value));
    }

    // Pending logs carry no block number; they cannot be cached by range.
    let block_number = log
        .block_number
        .ok_or_else(|| ChainError::decode(&operation, "log without block number"))?;

    Ok(FetchedRow {
        block_number,
        transaction_index: log.transaction_index.unwrap_or_default(),
        log_index: log.log_index.unwrap_or_default(),
        fields,
    })
}

/// Converts a decoded ABI value into the JSON representation rows carry.
/// Addresses and byte strings render as lowercase hex, numbers as decimal
/// strings (they routinely exceed JSON's safe integer range).
fn dyn_value_to_json(value: &DynSolValue) -> Value {
    match value {
        DynSolValue::Address(a) => Value::String(format!("{a:#x}")),
        DynSolValue::Bool(b) => Value::Bool(*b),
        DynSolValue::Uint(u, _) => Value::String(u.to_string()),
        DynSolValue::Int(i, _) => Value::String(i.to_string()),
        DynSolValue::String(s) => Value::String(s.clone()),
        DynSolValue::Bytes(b) => Value::String(hex::encode_prefixed(b)),
        DynSolValue::FixedBytes(word, size) => {
            Value::String(hex::encode_prefixed(&word[..*size]))
        }
        DynSolValue::Function(f) => Value::String(hex::encode_prefixed(f.as_slice())),
        DynSolValue::Array(items)
        | DynSolValue::FixedArray(items)
        | DynSolValue::Tuple(items) => {
            Value::Array(items.iter().map(dyn_value_to_json).collect())
        }
    }
}

/// Maps a transport failure onto the retry taxonomy. HTTP 429 and
/// rate-limit error responses become [`ChainError::RateLimited`];
/// everything else transient becomes [`ChainError::Unavailable`].
fn classify(operation: &str, error: TransportError) -> ChainError {
    match &error {
        RpcError::Transport(TransportErrorKind::HttpError(http)) if http.status == 429 => {
            ChainError::RateLimited { retry_after: None }
        }
        RpcError::ErrorResp(payload)
            if payload.code == 429
                || payload.message.to_ascii_lowercase().contains("rate limit") =>
        {
            ChainError::RateLimited { retry_after: None }
        }
        _ => ChainError::unavailable(operation, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_blocks_aligned_to_step() {
        let range = BlockRange::new(0, 2_000).unwrap();
        assert_eq!(sample_blocks(range, 1_000), vec![0, 1_000, 2_000]);
    }

    #[test]
    fn test_sample_blocks_partition_independent() {
        let whole = sample_blocks(BlockRange::new(0, 2_000).unwrap(), 1_000);
        let mut split = sample_blocks(BlockRange::new(0, 1_500).unwrap(), 1_000);
        split.extend(sample_blocks(BlockRange::new(1_501, 2_000).unwrap(), 1_000));
        assert_eq!(whole, split);
    }

    #[test]
    fn test_sample_blocks_empty_between_multiples() {
        assert!(sample_blocks(BlockRange::new(1_001, 1_999).unwrap(), 1_000).is_empty());
    }

    #[test]
    fn test_parse_event_selector() {
        let event = parse_event(
            "event Transfer(address indexed from, address indexed to, uint256 value)",
        )
        .unwrap();
        // keccak256("Transfer(address,address,uint256)")
        assert_eq!(
            format!("{:#x}", event.selector()),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_parse_event_rejects_garbage() {
        assert!(matches!(
            parse_event("not an event"),
            Err(ChainError::Decode { .. })
        ));
    }

    fn transfer_event() -> Event {
        parse_event("event Transfer(address indexed from, address indexed to, uint256 value)")
            .unwrap()
    }

    fn transfer_log(block_number: Option<u64>) -> Log {
        let event = transfer_event();
        let from = Address::repeat_byte(0x11);
        let to = Address::repeat_byte(0x22);
        let topics = vec![event.selector(), from.into_word(), to.into_word()];
        let data = Bytes::from(B256::from(U256::from(42u64)).to_vec());
        Log {
            inner: alloy_primitives::Log {
                address: Address::repeat_byte(0xcc),
                data: alloy_primitives::LogData::new_unchecked(topics, data),
            },
            block_number,
            transaction_index: Some(3),
            log_index: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn test_decode_log_row_names_fields_and_orders() {
        let row = decode_log_row(&transfer_event(), &transfer_log(Some(1_234))).unwrap();
        assert_eq!(row.order_key(), (1_234, 3, 7));
        assert_eq!(
            row.fields["from"],
            Value::String(format!("{:#x}", Address::repeat_byte(0x11)))
        );
        assert_eq!(row.fields["value"], Value::String("42".into()));
    }

    #[test]
    fn test_decode_log_row_rejects_missing_block_number() {
        // Pending logs have no block number and must not decode to block 0.
        assert!(matches!(
            decode_log_row(&transfer_event(), &transfer_log(None)),
            Err(ChainError::Decode { .. })
        ));
    }

    #[test]
    fn test_dyn_value_to_json_scalars() {
        let addr = Address::repeat_byte(0xab);
        assert_eq!(
            dyn_value_to_json(&DynSolValue::Address(addr)),
            Value::String(format!("{addr:#x}"))
        );
        assert_eq!(
            dyn_value_to_json(&DynSolValue::Uint(U256::from(1_000_000u64), 256)),
            Value::String("1000000".into())
        );
        assert_eq!(dyn_value_to_json(&DynSolValue::Bool(true)), Value::Bool(true));
    }
}
