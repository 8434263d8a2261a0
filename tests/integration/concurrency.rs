//! Concurrent traffic through one shared gateway.

use std::sync::Arc;

use minnow_integration_tests::{IntegrationGateway, test_data_seeded};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_put_get() {
    let gw = Arc::new(IntegrationGateway::new(4).await);

    let mut handles = Vec::new();
    for i in 0..64u32 {
        let gw = gw.clone();
        handles.push(tokio::spawn(async move {
            let id = format!("par{i}");
            let data = test_data_seeded(512 + i as usize * 13, i);
            gw.put(&id, &data).await.unwrap();
            assert_eq!(gw.get(&id).await.unwrap(), data, "mismatch for {id}");
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut total = 0;
    for i in 0..gw.len() {
        total += gw.object_count(i).await;
    }
    assert_eq!(total, 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_overwrites_leave_one_whole_version() {
    let gw = Arc::new(IntegrationGateway::new(3).await);
    let versions: Vec<Vec<u8>> = (0..16).map(|i| test_data_seeded(2048, i)).collect();

    let mut handles = Vec::new();
    for data in versions.clone() {
        let gw = gw.clone();
        handles.push(tokio::spawn(async move {
            gw.put("contended", &data).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Last writer wins, and no write is torn.
    let stored = gw.get("contended").await.unwrap();
    assert!(versions.contains(&stored));
    assert_eq!(gw.holders("contended").await.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_during_writes() {
    let gw = Arc::new(IntegrationGateway::new(3).await);
    let initial = test_data_seeded(1024, 7);
    gw.put("shared", &initial).await.unwrap();

    let writer = {
        let gw = gw.clone();
        tokio::spawn(async move {
            for i in 0..20 {
                gw.put(&format!("side{i}"), &test_data_seeded(128, i))
                    .await
                    .unwrap();
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..8 {
        let gw = gw.clone();
        let expected = initial.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..10 {
                assert_eq!(gw.get("shared").await.unwrap(), expected);
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}
