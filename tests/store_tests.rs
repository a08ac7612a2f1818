// SPDX-FileCopyrightText: 2026 chainfetch contributors
//
// SPDX-License-Identifier: Apache-2.0

//! Store backend behavior shared between DiskStore and MemoryStore
//!
//! Both backends must agree on batch semantics: removals before inserts,
//! row deduplication by chain order key, write-once grid nodes. The disk
//! backend additionally guarantees cross-handle visibility and atomic
//! replacement of the store file.

use std::sync::Arc;

use chainfetch::{
    BlockRange, CacheStore, CoverageRecord, DiskStore, FetchedRow, Filter, GridNode, MemoryStore,
    StoreBatch,
};
use serde_json::{json, Map};

fn r(start: u64, end: u64) -> BlockRange {
    BlockRange::new(start, end).unwrap()
}

fn row(block: u64, log: u64) -> FetchedRow {
    let mut fields = Map::new();
    fields.insert("value".into(), json!(block.to_string()));
    FetchedRow {
        block_number: block,
        transaction_index: 0,
        log_index: log,
        fields,
    }
}

fn seed_batch() -> StoreBatch {
    StoreBatch {
        put_coverage: vec![CoverageRecord {
            identity: "1:balance:0xaa".into(),
            filter: Filter::empty(),
            range: r(100, 300),
        }],
        put_rows: vec![(
            "1:balance:0xaa".into(),
            Filter::empty().signature(),
            vec![row(100, 0), row(200, 0), row(300, 0)],
        )],
        put_grid_nodes: vec![(
            1,
            GridNode {
                number: 1000,
                timestamp: 1_700_000_000,
            },
        )],
        ..Default::default()
    }
}

async fn assert_seeded(store: &dyn CacheStore) {
    let records = store.coverage_records("1:balance:0xaa").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].range, r(100, 300));

    let rows = store
        .rows_in_range("1:balance:0xaa", &Filter::empty().signature(), r(150, 300))
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);

    let node = store.grid_node(1, 1000).await.unwrap().unwrap();
    assert_eq!(node.timestamp, 1_700_000_000);
}

#[tokio::test]
async fn test_backends_agree_on_batch_semantics() {
    let memory = MemoryStore::new();
    memory.apply(seed_batch()).await.unwrap();
    assert_seeded(&memory).await;

    let dir = tempfile::TempDir::new().unwrap();
    let disk = DiskStore::new(dir.path().join("cache.json")).validate().unwrap();
    disk.apply(seed_batch()).await.unwrap();
    assert_seeded(&disk).await;
}

#[tokio::test]
async fn test_rows_deduplicate_by_order_key_not_content() {
    let store = MemoryStore::new();
    store.apply(seed_batch()).await.unwrap();

    // Re-inserting block 200 (same order key, same content) is a no-op.
    store
        .apply(StoreBatch {
            put_rows: vec![(
                "1:balance:0xaa".into(),
                Filter::empty().signature(),
                vec![row(200, 0), row(250, 0)],
            )],
            ..Default::default()
        })
        .await
        .unwrap();

    let rows = store
        .rows_in_range("1:balance:0xaa", &Filter::empty().signature(), r(0, 1000))
        .await
        .unwrap();
    let keys: Vec<_> = rows.iter().map(FetchedRow::order_key).collect();
    assert_eq!(
        keys,
        vec![(100, 0, 0), (200, 0, 0), (250, 0, 0), (300, 0, 0)]
    );
}

#[tokio::test]
async fn test_rows_are_keyed_by_filter_signature() {
    let store = MemoryStore::new();
    let narrow = Filter::empty().with_eq("from", json!("0xabc"));

    store
        .apply(StoreBatch {
            put_rows: vec![
                ("id".into(), Filter::empty().signature(), vec![row(10, 0)]),
                ("id".into(), narrow.signature(), vec![row(20, 0)]),
            ],
            ..Default::default()
        })
        .await
        .unwrap();

    let general = store
        .rows_in_range("id", &Filter::empty().signature(), r(0, 100))
        .await
        .unwrap();
    assert_eq!(general.len(), 1);
    assert_eq!(general[0].block_number, 10);

    let specific = store
        .rows_in_range("id", &narrow.signature(), r(0, 100))
        .await
        .unwrap();
    assert_eq!(specific.len(), 1);
    assert_eq!(specific[0].block_number, 20);
}

#[tokio::test]
async fn test_coalescing_batch_replaces_records_atomically() {
    let store = MemoryStore::new();
    store.apply(seed_batch()).await.unwrap();
    store
        .apply(StoreBatch {
            put_coverage: vec![CoverageRecord {
                identity: "1:balance:0xaa".into(),
                filter: Filter::empty(),
                range: r(301, 500),
            }],
            ..Default::default()
        })
        .await
        .unwrap();

    // Replace both with the merged record in one batch.
    store
        .apply(StoreBatch {
            remove_coverage: vec![
                ("1:balance:0xaa".into(), Filter::empty().signature(), r(100, 300)),
                ("1:balance:0xaa".into(), Filter::empty().signature(), r(301, 500)),
            ],
            put_coverage: vec![CoverageRecord {
                identity: "1:balance:0xaa".into(),
                filter: Filter::empty(),
                range: r(100, 500),
            }],
            ..Default::default()
        })
        .await
        .unwrap();

    let records = store.coverage_records("1:balance:0xaa").await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].range, r(100, 500));
}

#[tokio::test]
async fn test_disk_handles_share_committed_state() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("cache.json");

    let writer = DiskStore::new(&path).validate().unwrap();
    let reader = DiskStore::new(&path).validate().unwrap();

    writer.apply(seed_batch()).await.unwrap();
    assert_seeded(&reader).await;

    // A second batch through the other handle is visible to the first.
    reader
        .apply(StoreBatch {
            put_grid_nodes: vec![(
                1,
                GridNode {
                    number: 2000,
                    timestamp: 1_700_012_000,
                },
            )],
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(writer.grid_node(1, 2000).await.unwrap().is_some());
}

#[tokio::test]
async fn test_concurrent_applies_do_not_lose_writes() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(
        DiskStore::new(dir.path().join("cache.json"))
            .validate()
            .unwrap(),
    );

    let tasks: Vec<_> = (0u64..8)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                store
                    .apply(StoreBatch {
                        put_grid_nodes: vec![(
                            1,
                            GridNode {
                                number: i * 1000,
                                timestamp: 1_700_000_000 + i,
                            },
                        )],
                        ..Default::default()
                    })
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    for i in 0u64..8 {
        assert!(
            store.grid_node(1, i * 1000).await.unwrap().is_some(),
            "node {i} lost"
        );
    }
}
