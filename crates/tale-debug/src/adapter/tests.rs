//! Adapter unit tests.
//! - stdio framing roundtrips
//! - request dispatch against a replayed story

use std::io::BufReader;

use expect_test::{expect, Expect};
use serde_json::{json, Value};

use super::protocol_io::{read_message, write_message, MAX_CONTENT_LENGTH};
use super::*;
use crate::bridge::{ExecutionBridge, ReplayBridge, TracePoint};
use crate::protocol::{MessageType, Request};
use crate::session::SessionState;

fn request(seq: u32, command: &str, arguments: Value) -> Request<Value> {
    Request {
        seq,
        message_type: MessageType::Request,
        command: command.to_string(),
        arguments: Some(arguments),
    }
}

fn adapter_for(points: Vec<TracePoint>) -> DebugAdapter {
    DebugAdapter::new(Session::new(ReplayBridge::from_points(points)))
}

fn visits_trace() -> Vec<TracePoint> {
    let mut points = vec![TracePoint::new("story.ink", 1).named("start")];
    for visits in 1..=3 {
        points.push(
            TracePoint::new("story.ink", 10)
                .named("garden")
                .with_var("visits", json!(visits)),
        );
        points.push(
            TracePoint::new("story.ink", 11)
                .named("garden")
                .with_var("visits", json!(visits)),
        );
    }
    points
}

/// One line per message: responses with their status, events with the
/// detail that matters for each kind.
fn summarize(outcome: &DispatchOutcome) -> String {
    let mut lines = Vec::new();
    for response in &outcome.responses {
        let command = response["command"].as_str().unwrap_or_default();
        let success = response["success"].as_bool().unwrap_or_default();
        match response["message"].as_str() {
            Some(message) => lines.push(format!("response {command} {success}: {message}")),
            None => lines.push(format!("response {command} {success}")),
        }
    }
    for event in &outcome.events {
        let name = event["event"].as_str().unwrap_or_default();
        let body = &event["body"];
        match name {
            "stopped" => lines.push(format!(
                "event stopped reason={}",
                body["reason"].as_str().unwrap_or_default()
            )),
            "output" => lines.push(format!(
                "event output {}: {}",
                body["category"].as_str().unwrap_or_default(),
                body["output"].as_str().unwrap_or_default().trim_end()
            )),
            other => lines.push(format!("event {other}")),
        }
    }
    lines.join("\n")
}

fn check(outcome: &DispatchOutcome, expected: Expect) {
    expected.assert_eq(&summarize(outcome));
}

fn body(outcome: &DispatchOutcome) -> &Value {
    &outcome.responses[0]["body"]
}

fn initialize(adapter: &mut DebugAdapter) {
    adapter.dispatch_request(request(1, "initialize", json!({"adapterID": "tale"})));
}

fn set_breakpoint(adapter: &mut DebugAdapter, breakpoint: Value) -> DispatchOutcome {
    adapter.dispatch_request(request(
        2,
        "setBreakpoints",
        json!({"source": {"path": "story.ink"}, "breakpoints": [breakpoint]}),
    ))
}

#[test]
fn stdio_roundtrip() {
    let payload = r#"{"seq":1,"type":"request","command":"initialize"}"#;
    let mut buffer = Vec::new();
    write_message(&mut buffer, payload).unwrap();

    let mut reader = BufReader::new(&buffer[..]);
    let read = read_message(&mut reader).unwrap().unwrap();
    assert_eq!(read, payload);
    assert!(read_message(&mut reader).unwrap().is_none());
}

#[test]
fn read_message_waits_for_the_declared_length() {
    let framed = b"Content-Length: 7\r\nContent-Type: x\r\n\r\n{\"a\":1}Content-Length: 2\r\n\r\n{}";
    let mut reader = BufReader::with_capacity(3, &framed[..]);
    assert_eq!(read_message(&mut reader).unwrap().unwrap(), r#"{"a":1}"#);
    assert_eq!(read_message(&mut reader).unwrap().unwrap(), "{}");
}

#[test]
fn read_message_rejects_missing_length() {
    let mut reader = BufReader::new(&b"X-Other: 1\r\n\r\n"[..]);
    let err = read_message(&mut reader).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn read_message_rejects_oversized_length() {
    let mut reader = BufReader::new(&b"Content-Length: 18446744073709551615\r\n\r\n{}"[..]);
    let err = read_message(&mut reader).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);

    let header = format!("Content-Length: {}\r\n\r\n", MAX_CONTENT_LENGTH + 1);
    let mut reader = BufReader::new(header.as_bytes());
    let err = read_message(&mut reader).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn initialize_announces_capabilities() {
    let mut adapter = adapter_for(visits_trace());
    let outcome = adapter.dispatch_request(request(1, "initialize", json!({})));
    check(
        &outcome,
        expect![[r#"
            response initialize true
            event initialized"#]],
    );
    assert_eq!(body(&outcome)["supportsConditionalBreakpoints"], json!(true));
    assert_eq!(body(&outcome)["supportsLogPoints"], json!(true));
    assert_eq!(outcome.responses[0]["request_seq"], json!(1));

    let again = adapter.dispatch_request(request(2, "initialize", json!({})));
    check(
        &again,
        expect!["response initialize false: cannot initialize while session is initialized"],
    );
}

#[test]
fn requests_out_of_state_are_rejected() {
    let mut adapter = adapter_for(visits_trace());
    let outcome = adapter.dispatch_request(request(1, "continue", json!({"threadId": 1})));
    check(
        &outcome,
        expect!["response continue false: cannot continue while session is uninitialized"],
    );
    let outcome = adapter.dispatch_request(request(2, "launch", json!({})));
    check(
        &outcome,
        expect!["response launch false: cannot launch while session is uninitialized"],
    );
}

#[test]
fn unknown_commands_are_unsupported() {
    let mut adapter = adapter_for(visits_trace());
    let outcome = adapter.dispatch_request(request(4, "stIoState", json!({})));
    check(&outcome, expect!["response stIoState false: unsupported command"]);
}

#[test]
fn conditional_breakpoint_end_to_end() {
    let mut adapter = adapter_for(visits_trace());
    initialize(&mut adapter);
    let outcome = set_breakpoint(&mut adapter, json!({"line": 10, "condition": "visits > 2"}));
    let breakpoint = &body(&outcome)["breakpoints"][0];
    assert_eq!(breakpoint["verified"], json!(true));
    assert_eq!(breakpoint["line"], json!(10));

    let launch = adapter.dispatch_request(request(3, "launch", json!({})));
    check(&launch, expect!["response launch true"]);
    let outcome = adapter.dispatch_request(request(4, "configurationDone", json!({})));
    check(
        &outcome,
        expect![[r#"
            response configurationDone true
            event stopped reason=breakpoint"#]],
    );
    assert_eq!(outcome.events[0]["body"]["hitBreakpointIds"], json!([1]));

    let trace = adapter.dispatch_request(request(5, "stackTrace", json!({"threadId": 1})));
    let frame = &body(&trace)["stackFrames"][0];
    assert_eq!(frame["line"], json!(10));
    assert_eq!(frame["name"], json!("garden"));
    assert_eq!(frame["source"]["name"], json!("story.ink"));

    let scopes = adapter.dispatch_request(request(6, "scopes", json!({"frameId": 1})));
    let scope = &body(&scopes)["scopes"][0];
    assert_eq!(scope["name"], json!("Story"));
    let reference = scope["variablesReference"].clone();

    let variables = adapter.dispatch_request(request(
        7,
        "variables",
        json!({"variablesReference": reference}),
    ));
    assert_eq!(
        body(&variables)["variables"],
        json!([{
            "name": "visits",
            "value": "3",
            "type": "number",
            "variablesReference": 0,
            "evaluateName": "visits"
        }])
    );

    let outcome = adapter.dispatch_request(request(8, "continue", json!({"threadId": 1})));
    check(
        &outcome,
        expect![[r#"
            response continue true
            event terminated"#]],
    );
    assert_eq!(adapter.session().state(), SessionState::Terminated);
}

#[test]
fn logpoints_emit_output_without_stopping() {
    let mut adapter = adapter_for(visits_trace());
    initialize(&mut adapter);
    set_breakpoint(
        &mut adapter,
        json!({"line": 11, "logMessage": "visits={visits}"}),
    );
    adapter.dispatch_request(request(3, "launch", json!({})));
    let outcome = adapter.dispatch_request(request(4, "configurationDone", json!({})));
    check(
        &outcome,
        expect![[r#"
            response configurationDone true
            event output console: visits=1
            event output console: visits=2
            event output console: visits=3
            event terminated"#]],
    );
    assert_eq!(outcome.events[0]["body"]["line"], json!(11));
}

#[test]
fn configuration_done_before_launch_is_remembered() {
    let mut adapter = adapter_for(visits_trace());
    initialize(&mut adapter);
    let outcome = adapter.dispatch_request(request(2, "configurationDone", json!({})));
    check(
        &outcome,
        expect![[r#"
            response configurationDone true
            event output console: [tale-debug] configuration done; waiting for launch"#]],
    );
    let outcome = adapter.dispatch_request(request(3, "launch", json!({"stopOnEntry": true})));
    check(
        &outcome,
        expect![[r#"
            response launch true
            event stopped reason=entry"#]],
    );
}

#[test]
fn stepping_stops_with_step_reason() {
    let mut adapter = adapter_for(visits_trace());
    initialize(&mut adapter);
    set_breakpoint(&mut adapter, json!({"line": 10}));
    adapter.dispatch_request(request(3, "launch", json!({"stopOnEntry": true})));
    adapter.dispatch_request(request(4, "configurationDone", json!({})));

    let outcome = adapter.dispatch_request(request(5, "next", json!({"threadId": 1})));
    check(
        &outcome,
        expect![[r#"
            response next true
            event stopped reason=step"#]],
    );
    let stop = adapter.session().stop().unwrap();
    assert_eq!(stop.location.as_ref().map(|location| location.line), Some(10));
    assert_eq!(adapter.session().breakpoints().hit_count("story.ink", 10), Some(0));
}

#[test]
fn pause_before_start_makes_the_first_stop_a_pause() {
    let mut adapter = adapter_for(visits_trace());
    initialize(&mut adapter);
    adapter.dispatch_request(request(2, "launch", json!({})));
    let outcome = adapter.dispatch_request(request(3, "pause", json!({"threadId": 1})));
    check(
        &outcome,
        expect![[r#"
            response pause true
            event output console: [tale-debug] pause requested"#]],
    );
    let outcome = adapter.dispatch_request(request(4, "configurationDone", json!({})));
    check(
        &outcome,
        expect![[r#"
            response configurationDone true
            event stopped reason=pause"#]],
    );
    let outcome = adapter.dispatch_request(request(5, "pause", json!({"threadId": 1})));
    check(
        &outcome,
        expect![[r#"
            response pause true
            event output console: [tale-debug] pause ignored (already stopped)"#]],
    );
}

#[test]
fn zero_based_clients_are_converted() {
    let mut adapter = adapter_for(visits_trace());
    adapter.dispatch_request(request(1, "initialize", json!({"linesStartAt1": false})));
    let outcome = set_breakpoint(&mut adapter, json!({"line": 9}));
    let breakpoint = &body(&outcome)["breakpoints"][0];
    assert_eq!(breakpoint["verified"], json!(true));
    assert_eq!(breakpoint["line"], json!(9));
    assert!(adapter.session().breakpoints().has_breakpoint("story.ink", 10));

    adapter.dispatch_request(request(3, "launch", json!({})));
    adapter.dispatch_request(request(4, "configurationDone", json!({})));
    let trace = adapter.dispatch_request(request(
        5,
        "stackTrace",
        json!({"threadId": 1, "startFrame": 0, "levels": 1}),
    ));
    assert_eq!(body(&trace)["stackFrames"][0]["line"], json!(9));
}

#[test]
fn unreachable_lines_are_unverified() {
    let mut adapter = adapter_for(visits_trace());
    initialize(&mut adapter);
    let outcome = set_breakpoint(&mut adapter, json!({"line": 42}));
    let breakpoint = &body(&outcome)["breakpoints"][0];
    assert_eq!(breakpoint["verified"], json!(false));
    assert_eq!(
        breakpoint["message"],
        json!("the story never pauses at this line")
    );
}

#[test]
fn broken_conditions_are_reported_but_verified() {
    let mut adapter = adapter_for(visits_trace());
    initialize(&mut adapter);
    let outcome = set_breakpoint(&mut adapter, json!({"line": 10, "condition": "visits >"}));
    let breakpoint = &body(&outcome)["breakpoints"][0];
    assert_eq!(breakpoint["verified"], json!(true));
    assert_eq!(
        breakpoint["message"],
        json!("condition: Syntax error: unexpected end of expression")
    );
}

#[test]
fn evaluate_against_the_stopped_state() {
    let mut adapter = adapter_for(vec![TracePoint::new("a.ink", 1)
        .with_var("gold", json!(12))
        .with_var("player", json!({"name": "Ada"}))]);
    initialize(&mut adapter);
    let outcome = adapter.dispatch_request(request(2, "evaluate", json!({"expression": "gold"})));
    check(
        &outcome,
        expect!["response evaluate false: cannot evaluate while session is initialized"],
    );
    adapter.dispatch_request(request(3, "launch", json!({"stopOnEntry": true})));
    adapter.dispatch_request(request(4, "configurationDone", json!({})));

    let outcome = adapter.dispatch_request(request(5, "evaluate", json!({"expression": "gold * 2"})));
    assert_eq!(
        body(&outcome),
        &json!({"result": "24", "type": "number", "variablesReference": 0})
    );

    let outcome = adapter.dispatch_request(request(6, "evaluate", json!({"expression": "player"})));
    assert_eq!(body(&outcome)["result"], json!("table[1]"));
    let reference = body(&outcome)["variablesReference"].clone();
    let children = adapter.dispatch_request(request(
        7,
        "variables",
        json!({"variablesReference": reference}),
    ));
    assert_eq!(body(&children)["variables"][0]["evaluateName"], json!("player.name"));
    assert_eq!(body(&children)["variables"][0]["value"], json!("\"Ada\""));

    let outcome = adapter.dispatch_request(request(8, "evaluate", json!({"expression": "gold +"})));
    check(
        &outcome,
        expect!["response evaluate false: Syntax error: unexpected end of expression"],
    );
    let outcome = adapter.dispatch_request(request(9, "evaluate", json!({"expression": "nope.x"})));
    check(
        &outcome,
        expect!["response evaluate false: Runtime error: attempt to index a nil value (variable 'nope')"],
    );
}

#[test]
fn deeply_nested_expressions_fail_without_ending_the_session() {
    let mut adapter = adapter_for(vec![TracePoint::new("a.ink", 1).with_var("gold", json!(12))]);
    initialize(&mut adapter);
    adapter.dispatch_request(request(2, "launch", json!({"stopOnEntry": true})));
    adapter.dispatch_request(request(3, "configurationDone", json!({})));

    let expression = format!("{}gold{}", "(".repeat(5000), ")".repeat(5000));
    let outcome = adapter.dispatch_request(request(4, "evaluate", json!({"expression": expression})));
    check(
        &outcome,
        expect!["response evaluate false: Syntax error: expression nested too deeply"],
    );
    let outcome = adapter.dispatch_request(request(5, "evaluate", json!({"expression": "gold"})));
    assert_eq!(body(&outcome)["result"], json!("12"));
}

#[test]
fn stale_references_expand_to_nothing() {
    let mut adapter = adapter_for(visits_trace());
    let outcome = adapter.dispatch_request(request(
        1,
        "variables",
        json!({"variablesReference": 999}),
    ));
    assert_eq!(body(&outcome)["variables"], json!([]));
    let scopes = adapter.dispatch_request(request(2, "scopes", json!({"frameId": 1})));
    assert_eq!(body(&scopes)["scopes"], json!([]));
    let trace = adapter.dispatch_request(request(3, "stackTrace", json!({"threadId": 1})));
    assert_eq!(body(&trace)["stackFrames"], json!([]));
}

#[test]
fn story_errors_stop_with_exception() {
    let mut adapter = adapter_for(vec![
        TracePoint::new("a.ink", 1),
        TracePoint::new("a.ink", 2).failing("missing knot 'cellar'"),
    ]);
    initialize(&mut adapter);
    adapter.dispatch_request(request(2, "launch", json!({"stopOnEntry": true})));
    adapter.dispatch_request(request(3, "configurationDone", json!({})));
    let outcome = adapter.dispatch_request(request(4, "continue", json!({"threadId": 1})));
    check(
        &outcome,
        expect![[r#"
            response continue true
            event output stderr: story runtime error: missing knot 'cellar'
            event stopped reason=exception"#]],
    );
    assert_eq!(
        outcome.events[1]["body"]["text"],
        json!("story runtime error: missing knot 'cellar'")
    );
}

#[test]
fn launch_failures_are_reported() {
    let mut adapter = DebugAdapter::new(Session::new(ReplayBridge::new()));
    initialize(&mut adapter);
    let outcome = adapter.dispatch_request(request(2, "launch", json!({})));
    check(&outcome, expect!["response launch false: no story loaded"]);
    assert_eq!(adapter.session().state(), SessionState::Initialized);
}

#[test]
fn terminate_releases_the_story() {
    let mut adapter = adapter_for(visits_trace());
    initialize(&mut adapter);
    adapter.dispatch_request(request(2, "launch", json!({"stopOnEntry": true})));
    adapter.dispatch_request(request(3, "configurationDone", json!({})));
    let outcome = adapter.dispatch_request(request(4, "terminate", json!({})));
    assert!(outcome.should_exit);
    check(
        &outcome,
        expect![[r#"
            response terminate true
            event output console: [tale-debug] terminate
            event terminated"#]],
    );
    assert_eq!(adapter.session().state(), SessionState::Terminated);
    assert!(adapter.session().bridge().is_terminated());
}

fn framed(payloads: &[&str]) -> Vec<u8> {
    let mut buffer = Vec::new();
    for payload in payloads {
        write_message(&mut buffer, payload).unwrap();
    }
    buffer
}

fn read_all(bytes: &[u8]) -> Vec<Value> {
    let mut reader = BufReader::new(bytes);
    let mut messages = Vec::new();
    while let Some(payload) = read_message(&mut reader).unwrap() {
        messages.push(serde_json::from_str(&payload).unwrap());
    }
    messages
}

#[test]
fn run_loop_survives_malformed_messages() {
    let mut input = framed(&[
        r#"{"seq":1,"type":"request","command":"initialize","arguments":{}}"#,
        "{not json",
        r#"{"seq":3,"type":"request"}"#,
    ]);
    input.extend_from_slice(b"X-Other: 1\r\n\r\n");
    input.extend(framed(&[
        r#"{"seq":5,"type":"request","command":"threads","arguments":{}}"#,
    ]));

    let mut adapter = adapter_for(visits_trace());
    let mut output = Vec::new();
    adapter
        .run(&mut BufReader::new(&input[..]), &mut output)
        .unwrap();

    let messages = read_all(&output);
    let summary: Vec<String> = messages
        .iter()
        .map(|message| match message["type"].as_str() {
            Some("event") => format!("event {}", message["event"].as_str().unwrap_or_default()),
            _ => format!(
                "response seq={} success={}",
                message["request_seq"], message["success"]
            ),
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            "response seq=1 success=true",
            "event initialized",
            "response seq=0 success=false",
            "response seq=3 success=false",
            "response seq=0 success=false",
            "response seq=5 success=true",
        ]
    );
    assert!(messages[2]["message"]
        .as_str()
        .is_some_and(|message| message.starts_with("invalid json")));
    assert_eq!(
        messages[4]["message"],
        json!("invalid message: missing Content-Length header")
    );
    assert_eq!(adapter.session().state(), SessionState::Terminated);
}

#[test]
fn run_loop_exits_on_disconnect() {
    let input = framed(&[
        r#"{"seq":1,"type":"request","command":"disconnect","arguments":{}}"#,
        r#"{"seq":2,"type":"request","command":"threads","arguments":{}}"#,
    ]);
    let mut adapter = adapter_for(visits_trace());
    let mut output = Vec::new();
    adapter
        .run(&mut BufReader::new(&input[..]), &mut output)
        .unwrap();
    let messages = read_all(&output);
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2]["event"], json!("terminated"));
}
