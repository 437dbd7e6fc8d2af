//! `HttpTransport` against an in-process fake server.
#![cfg(feature = "http")]

use std::collections::HashMap;

use axum::extract::Query;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use pengine_client::{
    CancellationToken, Client, ClientConfig, CreateOptions, HostTerm, HttpTransport,
    PengineError, Transport, TransportError,
};
use serde_json::Value;

type Params = Query<HashMap<String, String>>;
type Reply = (StatusCode, String);

fn ok(body: &str) -> Reply {
    (StatusCode::OK, body.to_string())
}

fn bad(why: &str) -> Reply {
    (StatusCode::BAD_REQUEST, why.to_string())
}

async fn create(Query(params): Params, Json(options): Json<Value>) -> Reply {
    if params.get("format").map(String::as_str) == Some("prolog") {
        if options["format"] != "prolog" || options["template"] != "p(X)" {
            return bad("prolog create without template");
        }
        return ok("create(e3,[slave_limit(1),answer(destroy(e3,success(e3,[p(1)],[],0.0,false)))])\n");
    }
    match options["ask"].as_str() {
        Some("member(X,[1,2,3])") if options["destroy"] == true && options["chunk"] == 2 => ok(
            r#"{"event":"create","id":"e1","slave_limit":2,
                "answer":{"event":"success","id":"e1","data":[{"X":1},{"X":2}],
                          "projection":["X"],"time":0.01,"more":true}}"#,
        ),
        None if options["destroy"] == false => ok(r#"{"event":"create","id":"e2","slave_limit":4}"#),
        _ => bad("unexpected create options"),
    }
}

async fn send(Query(params): Params, headers: HeaderMap, body: String) -> Reply {
    if headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
        != Some("application/x-prolog; charset=utf-8")
    {
        return bad("wrong content type");
    }
    if params.get("format").map(String::as_str) != Some("json") {
        return bad("wrong format");
    }
    match (params.get("id").map(String::as_str), body.as_str()) {
        (Some("e1"), "next\n.") => ok(
            r#"{"event":"destroy","id":"e1",
                "data":{"event":"success","id":"e1","data":[{"X":3}],"time":0.02,"more":false}}"#,
        ),
        (Some("e2"), "destroy\n.") => ok(r#"{"event":"destroy","id":"e2"}"#),
        _ => bad("unexpected send"),
    }
}

async fn ping(Query(params): Params) -> Reply {
    match (
        params.get("id").map(String::as_str),
        params.get("format").map(String::as_str),
    ) {
        (Some("e2"), Some("json")) => ok(r#"{"event":"ping","id":"e2"}"#),
        _ => bad("unexpected ping"),
    }
}

/// Start the fake server; returns its base URL.
async fn serve() -> String {
    let app = Router::new()
        .route("/pengine/create", post(create))
        .route("/pengine/send", post(send))
        .route("/pengine/ping", get(ping));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/pengine")
}

#[tokio::test]
async fn test_ask_across_continuation() {
    let url = serve().await;
    let client = Client::new(ClientConfig::new(url).with_chunk(2));
    let cancel = CancellationToken::new();
    let mut answers = client.ask("member(X,[1,2,3])", &cancel).await.unwrap();

    let mut got = Vec::new();
    while answers.next(&cancel).await {
        got.push(answers.current().unwrap()["X"].to_host());
    }
    assert_eq!(got, vec![HostTerm::from(1), HostTerm::from(2), HostTerm::from(3)]);
    assert!(answers.final_error().is_none());
    assert!(!answers.session().is_alive());
    assert_eq!(answers.successes(), 3);
}

#[tokio::test]
async fn test_session_lifecycle() {
    let url = serve().await;
    let client = Client::new(ClientConfig::new(url));
    let cancel = CancellationToken::new();
    let mut session = client.create(false, &cancel).await.unwrap();
    assert_eq!(session.id(), "e2");
    assert_eq!(session.slave_limit(), 4);

    session.ping(&cancel).await.unwrap();
    session.close().await.unwrap();
    assert!(!session.is_alive());
    assert!(matches!(session.ping(&cancel).await, Err(PengineError::Dead)));
}

#[tokio::test]
async fn test_prolog_encoding() {
    let url = serve().await;
    let client = Client::new(ClientConfig::new(url));
    let cancel = CancellationToken::new();
    let mut answers = client.ask_prolog("p(X)", &cancel).await.unwrap();
    assert!(answers.next(&cancel).await);
    assert_eq!(
        answers.current(),
        Some(&HostTerm::compound("p", vec![HostTerm::from(1)]))
    );
    assert!(!answers.next(&cancel).await);
    assert!(answers.final_error().is_none());
}

#[tokio::test]
async fn test_non_ok_status() {
    let url = serve().await;
    let missing = HttpTransport::new(format!("{url}/missing"));
    assert_eq!(
        missing.create(&CreateOptions::default()).await,
        Err(TransportError::Status(404))
    );

    let transport = HttpTransport::new(url);
    assert_eq!(
        transport.send("nobody", pengine_client::Format::Json, "next").await,
        Err(TransportError::Status(400))
    );
}
