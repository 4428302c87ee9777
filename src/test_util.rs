//! A mocked API server for unit tests.

use http_1::{Request, Response};
use kube::{Client, client::Body};
use serde::Serialize;

use crate::Cluster;

pub(crate) type Handle = tower_test::mock::Handle<Request<Body>, Response<Body>>;

/// A cluster whose requests are answered through the returned handle.
pub(crate) fn mock_cluster() -> (Cluster, Handle) {
    let (service, handle) = tower_test::mock::pair::<Request<Body>, Response<Body>>();
    (Cluster::from_client(Client::new(service, "default")), handle)
}

pub(crate) fn json_response(status: u16, body: &impl Serialize) -> Response<Body> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap()
}

/// An API server error status such as `404 NotFound`.
pub(crate) fn status_response(code: u16, reason: &str) -> Response<Body> {
    json_response(
        code,
        &serde_json::json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": format!("request failed: {reason}"),
            "reason": reason,
            "code": code,
        }),
    )
}

/// Answer requests in order: each entry checks the request path and replies.
pub(crate) async fn serve(mut handle: Handle, replies: Vec<(&'static str, Response<Body>)>) {
    for (expected_path, response) in replies {
        let (request, send) = handle
            .next_request()
            .await
            .unwrap_or_else(|| panic!("no request for {expected_path}"));
        assert_eq!(request.uri().path(), expected_path, "{}", request.uri());
        send.send_response(response);
    }
}
