use std::io::Read;
use std::thread::{self, JoinHandle};

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tiny_http::{Response, Server};

use warmup_dash::backend::{
    BackendError, CONNECT_PATH, ConnectRequest, GENERIC_TRANSPORT_ERROR, HttpBackend,
    WarmupBackend,
};

/// Serve one request with `status` and `body`; the join handle yields the
/// path and JSON body that came in.
fn serve_once(status: u16, body: &'static str) -> (String, JoinHandle<(String, Value)>) {
    let server = Server::http("127.0.0.1:0").unwrap();
    let port = server.server_addr().port();
    let handle = thread::spawn(move || {
        let mut request = server.recv().unwrap();
        let mut raw = String::new();
        request.as_reader().read_to_string(&mut raw).unwrap();
        let url = request.url().to_string();
        request
            .respond(Response::from_string(body).with_status_code(status))
            .unwrap();
        (url, serde_json::from_str(&raw).unwrap_or(Value::Null))
    });
    (format!("http://127.0.0.1:{port}/"), handle)
}

fn request() -> ConnectRequest {
    ConnectRequest {
        email: "a@x.com".into(),
        password: "secret".into(),
        user_id: "u1".into(),
    }
}

#[test]
fn successful_connect_posts_camel_case_body() {
    let (base, server) = serve_once(
        200,
        r#"{"success":true,"account":{"email":"a@x.com","sentCount":4,"receivedCount":2}}"#,
    );
    let backend = HttpBackend::new(base).unwrap();

    let summary = backend.connect(&request()).unwrap();
    assert_eq!(summary.sent_count, 4);
    assert_eq!(summary.received_count, 2);

    let (path, body) = server.join().unwrap();
    assert_eq!(path, CONNECT_PATH);
    assert_eq!(
        body,
        json!({"email": "a@x.com", "password": "secret", "userId": "u1"})
    );
}

#[test]
fn backend_message_is_passed_through() {
    let (base, server) = serve_once(401, r#"{"success":false,"message":"bad credentials"}"#);
    let backend = HttpBackend::new(base).unwrap();

    let err = backend.connect(&request()).unwrap_err();
    assert_eq!(err, BackendError::Rejected("bad credentials".into()));
    server.join().unwrap();
}

#[test]
fn unparsable_error_gets_generic_message() {
    let (base, server) = serve_once(502, "<html>bad gateway</html>");
    let backend = HttpBackend::new(base).unwrap();

    let err = backend.connect(&request()).unwrap_err();
    assert_eq!(err.to_string(), GENERIC_TRANSPORT_ERROR);
    server.join().unwrap();
}

#[test]
fn success_flag_false_is_a_failure_even_on_200() {
    let (base, server) = serve_once(200, r#"{"success":false}"#);
    let backend = HttpBackend::new(base).unwrap();

    assert!(backend.connect(&request()).is_err());
    server.join().unwrap();
}

#[test]
fn unreachable_backend_is_a_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let backend = HttpBackend::new(format!("http://127.0.0.1:{port}")).unwrap();

    let err = backend.connect(&request()).unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)));
    assert_eq!(err.to_string(), GENERIC_TRANSPORT_ERROR);
}

#[test]
fn base_url_can_change_at_runtime() {
    let backend = HttpBackend::new("http://127.0.0.1:1").unwrap();
    let (base, server) = serve_once(200, r#"{"success":true}"#);
    backend.set_base_url(base.clone());
    assert_eq!(backend.base_url(), base);

    let summary = backend.connect(&request()).unwrap();
    assert_eq!(summary.email, "a@x.com");
    server.join().unwrap();
}
