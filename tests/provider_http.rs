//! Wire-level tests for the HTTP provider client against a local stub
//! server.

use std::io::Read;
use std::thread;

use quill::annotation::Severity;
use quill::config::StyleRules;
use quill::services::analysis::{AnalysisProvider, HttpProvider};
use tiny_http::{Header, Response, Server};

fn json_header() -> Header {
    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap()
}

/// Start a stub server answering `count` requests with the given bodies
/// (status, body). Returns the base URL and the captured request bodies.
fn stub_server(
    responses: Vec<(u16, &'static str)>,
) -> (String, thread::JoinHandle<Vec<String>>) {
    let server = Server::http("127.0.0.1:0").expect("binding stub server");
    let port = server.server_addr().to_ip().unwrap().port();
    let base = format!("http://127.0.0.1:{}", port);

    let handle = thread::spawn(move || {
        let mut bodies = Vec::new();
        for (status, body) in responses {
            let mut request = match server.recv() {
                Ok(request) => request,
                Err(_) => break,
            };
            let mut received = String::new();
            let _ = request.as_reader().read_to_string(&mut received);
            bodies.push(received);
            let response = Response::from_string(body)
                .with_status_code(status)
                .with_header(json_header());
            let _ = request.respond(response);
        }
        bodies
    });

    (base, handle)
}

#[test]
fn analyze_parses_issues_and_sends_rules() {
    let (base, server) = stub_server(vec![(
        200,
        r#"{"issues":[
            {"kind":"adverb","severity":"warning","message":"adverb flagged","start":3,"end":9},
            {"kind":"emdash","severity":"fatal","message":"em dash banned","start":10,"end":13}
        ]}"#,
    )]);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let provider = HttpProvider::new(base, 5);
    let issues = runtime
        .block_on(provider.analyze("he quickly ran", &StyleRules::default()))
        .unwrap();

    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0].kind, "adverb");
    assert_eq!(issues[0].severity, Severity::Warning);
    assert_eq!(issues[0].range, Some(3..9));
    // Unknown severity strings degrade instead of failing the parse
    assert_eq!(issues[1].severity, Severity::Unknown);

    let bodies = server.join().unwrap();
    assert!(bodies[0].contains("\"text\":\"he quickly ran\""));
    assert!(bodies[0].contains("\"ban_em_dashes\":true"));
}

#[test]
fn suggest_edits_maps_line_keyed_edits() {
    let (base, server) = stub_server(vec![(
        200,
        r#"{"edits":[{"line":2,"old":"He was very cold.","new":"He was freezing.","rationale":"stronger"}]}"#,
    )]);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let provider = HttpProvider::new(base, 5);
    let suggestions = runtime
        .block_on(provider.suggest_edits(
            "line one\nHe was very cold.",
            "llama3.2:latest",
            &StyleRules::default(),
            &[],
        ))
        .unwrap();

    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0].source_line, 2);
    assert_eq!(suggestions[0].old_text, "He was very cold.");
    assert_eq!(suggestions[0].new_text, "He was freezing.");
    assert_eq!(suggestions[0].rationale.as_deref(), Some("stronger"));
    assert_eq!(suggestions[0].range, None, "ranges are located at rebuild");

    let bodies = server.join().unwrap();
    assert!(bodies[0].contains("\"model\":\"llama3.2:latest\""));
}

#[test]
fn chat_returns_plain_response() {
    let (base, server) = stub_server(vec![(200, r#"{"response":"Try a colder opening."}"#)]);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let provider = HttpProvider::new(base, 5);
    let response = runtime
        .block_on(provider.chat("llama3.2:3b", "how do I open?", Some("He was cold.")))
        .unwrap();

    assert_eq!(response, "Try a colder opening.");
    let bodies = server.join().unwrap();
    assert!(bodies[0].contains("\"context\":\"He was cold.\""));
}

#[test]
fn non_success_status_is_a_recoverable_error() {
    let (base, server) = stub_server(vec![(500, "boom")]);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let provider = HttpProvider::new(base, 5);
    let result = runtime.block_on(provider.analyze("text", &StyleRules::default()));

    let err = result.expect_err("HTTP 500 must surface as an error");
    assert!(err.to_string().contains("500"), "got: {:#}", err);
    let _ = server.join();
}

#[test]
fn malformed_body_is_a_recoverable_error() {
    let (base, server) = stub_server(vec![(200, "not json at all")]);

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let provider = HttpProvider::new(base, 5);
    let result = runtime.block_on(provider.analyze("text", &StyleRules::default()));

    assert!(result.is_err());
    let _ = server.join();
}
