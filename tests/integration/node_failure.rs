//! Behavior when storage nodes fail to initialize.

use std::time::Duration;

use minnow_gateway::GatewayError;
use minnow_integration_tests::{
    FlakyConnector, IntegrationGateway, ids_on_node, test_data, test_nodes,
};
use minnow_registry::{NodeState, RegistryError, RetryPolicy};

#[tokio::test]
async fn test_down_node_rejects_only_its_objects() {
    let gw = IntegrationGateway::with_down_nodes(3, &[1]).await;
    assert_eq!(gw.report().ready.len(), 2);
    assert_eq!(gw.report().failed, vec![gw.node_id(1)]);

    for id in ids_on_node(1, 3, 5) {
        let err = gw.put(&id, b"x").await.unwrap_err();
        assert!(
            matches!(&err, GatewayError::NodeUninitialized { node } if *node == gw.node_id(1)),
            "put {id}: {err:?}"
        );
        assert!(matches!(
            gw.get(&id).await.unwrap_err(),
            GatewayError::NodeUninitialized { .. }
        ));
    }

    for target in [0, 2] {
        for id in ids_on_node(target, 3, 5) {
            gw.put(&id, &test_data(128)).await.unwrap();
            assert_eq!(gw.get(&id).await.unwrap(), test_data(128));
            assert_eq!(gw.holders(&id).await, vec![target]);
        }
    }
}

#[tokio::test]
async fn test_placement_does_not_skip_down_nodes() {
    // Objects for a dead node are not redirected elsewhere.
    let gw = IntegrationGateway::with_down_nodes(4, &[2]).await;

    let ids = ids_on_node(2, 4, 10);
    for id in &ids {
        assert!(gw.put(id, b"x").await.is_err());
    }
    for i in [0, 1, 3] {
        assert_eq!(gw.object_count(i).await, 0);
    }
}

#[tokio::test]
async fn test_down_node_exhausts_attempts() {
    let gw = IntegrationGateway::with_down_nodes(2, &[0]).await;

    let node = gw.node_id(0);
    assert_eq!(
        gw.connector().calls(&node),
        RetryPolicy::DEFAULT_MAX_ATTEMPTS
    );
    match gw.registry().state(&node).await {
        Some(NodeState::Failed { attempts, .. }) => {
            assert_eq!(attempts, RetryPolicy::DEFAULT_MAX_ATTEMPTS)
        }
        other => panic!("expected failed state, got {other:?}"),
    }
    assert_eq!(gw.connector().calls(&gw.node_id(1)), 1);
}

#[tokio::test]
async fn test_all_nodes_down() {
    let gw = IntegrationGateway::with_down_nodes(3, &[0, 1, 2]).await;

    assert_eq!(gw.report().ready.len(), 0);
    assert!(matches!(
        gw.report().check(false),
        Err(RegistryError::NoNodesAvailable)
    ));
    assert!(matches!(
        gw.put("k1", b"x").await.unwrap_err(),
        GatewayError::NodeUninitialized { .. }
    ));
}

#[tokio::test]
async fn test_strict_check_rejects_partial_set() {
    let gw = IntegrationGateway::with_down_nodes(3, &[0, 2]).await;

    assert!(gw.report().check(false).is_ok());
    match gw.report().check(true) {
        Err(RegistryError::NodesFailed { failed, total }) => {
            assert_eq!(failed, vec![gw.node_id(0), gw.node_id(2)]);
            assert_eq!(total, 3);
        }
        other => panic!("expected NodesFailed, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_recover_under_default_policy() {
    let nodes = test_nodes(3);
    let flaky = nodes[1].id.clone();
    let connector = FlakyConnector::default().failing(flaky.clone(), 2);

    let start = tokio::time::Instant::now();
    let gw = IntegrationGateway::with_connector(nodes, connector, RetryPolicy::default()).await;
    let elapsed = start.elapsed();

    assert_eq!(gw.connector().calls(&flaky), 3);
    assert_eq!(gw.registry().state(&flaky).await, Some(NodeState::Ready));
    assert_eq!(gw.report().ready.len(), 3);
    // Two failed attempts, two pauses.
    assert!(elapsed >= Duration::from_secs(20));
    assert!(elapsed < Duration::from_secs(21));

    for id in ids_on_node(1, 3, 3) {
        gw.put(&id, b"recovered").await.unwrap();
        assert_eq!(gw.get(&id).await.unwrap(), b"recovered");
    }
}

#[tokio::test]
async fn test_failed_node_can_be_retried_later() {
    let nodes = test_nodes(2);
    let id = nodes[0].id.clone();
    let connector = FlakyConnector::default().failing(id.clone(), 3);
    let gw = IntegrationGateway::with_connector(nodes, connector, RetryPolicy::no_delay(2)).await;

    assert!(gw.registry().state(&id).await.unwrap().is_failed());

    let state = gw
        .registry()
        .connect_node(&id, gw.connector(), &RetryPolicy::no_delay(2))
        .await
        .unwrap();
    assert!(state.is_ready());
    assert_eq!(gw.connector().calls(&id), 4);

    let key = &ids_on_node(0, 2, 1)[0];
    gw.put(key, b"back").await.unwrap();
    assert_eq!(gw.get(key).await.unwrap(), b"back");
}
