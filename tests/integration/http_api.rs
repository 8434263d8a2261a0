//! The HTTP API over a multi-node gateway.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use minnow_gateway::StorageGateway;
use minnow_http::{ApiServer, REQUEST_ID_HEADER};
use minnow_integration_tests::{IntegrationGateway, ids_on_node, test_data};
use minnow_registry::NodeRegistry;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;

fn put_request(id: &str, data: Vec<u8>) -> Request<Body> {
    Request::put(format!("/api/v1/object/{id}"))
        .header("content-length", data.len())
        .body(Body::from(data))
        .unwrap()
}

fn get_request(id: &str) -> Request<Body> {
    Request::get(format!("/api/v1/object/{id}"))
        .body(Body::empty())
        .unwrap()
}

async fn json(resp: axum::response::Response) -> serde_json::Value {
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_put_then_get_over_http() {
    let gw = IntegrationGateway::new(3).await;
    let data = test_data(50_000);

    let resp = gw
        .router()
        .oneshot(put_request("bigblob", data.clone()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json(resp).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Object bigblob stored successfully");

    let resp = gw.router().oneshot(get_request("bigblob")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["content-type"],
        "application/octet-stream"
    );
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], &data[..]);

    // Stored on exactly its placement node.
    let expected = minnow_placement::node_index("bigblob", 3).unwrap();
    assert_eq!(gw.holders("bigblob").await, vec![expected]);
}

#[tokio::test]
async fn test_http_and_gateway_see_same_objects() {
    let gw = IntegrationGateway::new(3).await;
    gw.put("direct", b"from the gateway").await.unwrap();

    let resp = gw.router().oneshot(get_request("direct")).await.unwrap();
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"from the gateway");
}

#[tokio::test]
async fn test_down_node_is_500_healthy_node_is_201() {
    let gw = IntegrationGateway::with_down_nodes(3, &[0]).await;

    let dead = &ids_on_node(0, 3, 1)[0];
    let resp = gw
        .router()
        .oneshot(put_request(dead, b"x".to_vec()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json(resp).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Failed to store object");

    let alive = &ids_on_node(1, 3, 1)[0];
    let resp = gw
        .router()
        .oneshot(put_request(alive, b"x".to_vec()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn test_empty_node_set_is_503() {
    let registry = Arc::new(NodeRegistry::new(Vec::new()));
    let router = ApiServer::new(Arc::new(StorageGateway::new(registry))).into_router();

    let resp = router.oneshot(get_request("k1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json(resp).await["message"], "No storage nodes available");
}

#[tokio::test]
async fn test_invalid_id_is_400_and_stores_nothing() {
    let gw = IntegrationGateway::new(3).await;

    let resp = gw
        .router()
        .oneshot(put_request("not-valid", b"x".to_vec()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    for i in 0..gw.len() {
        assert_eq!(gw.object_count(i).await, 0);
    }
}

#[tokio::test]
async fn test_request_id_echoed() {
    let gw = IntegrationGateway::new(1).await;

    let req = Request::get("/health")
        .header(REQUEST_ID_HEADER, "trace-42")
        .body(Body::empty())
        .unwrap();
    let resp = gw.router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[REQUEST_ID_HEADER], "trace-42");
}

async fn roundtrip(addr: std::net::SocketAddr, request: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    String::from_utf8_lossy(&out).into_owned()
}

#[tokio::test]
async fn test_served_over_tcp() {
    let gw = IntegrationGateway::new(3).await;
    let server = ApiServer::new(Arc::new(gw.gateway().clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let task = tokio::spawn(server.serve_with_shutdown(listener, async move {
        let _ = stop_rx.await;
    }));

    let put = roundtrip(
        addr,
        b"PUT /api/v1/object/wire HTTP/1.1\r\nHost: localhost\r\nContent-Length: 11\r\nConnection: close\r\n\r\nhello world",
    )
    .await;
    assert!(put.starts_with("HTTP/1.1 201"), "{put}");
    assert!(put.contains("x-request-id"), "{put}");

    let get = roundtrip(
        addr,
        b"GET /api/v1/object/wire HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(get.starts_with("HTTP/1.1 200"), "{get}");
    assert!(get.contains("hello world"), "{get}");

    let missing = roundtrip(
        addr,
        b"PUT /api/v1/object/wire HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(missing.starts_with("HTTP/1.1 400"), "{missing}");

    stop_tx.send(()).unwrap();
    task.await.unwrap().unwrap();
    assert_eq!(gw.holders("wire").await.len(), 1);
}
