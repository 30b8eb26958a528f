//! `BedrockAgentClient` against a mock Bedrock Agents endpoint serving real
//! event-stream bodies.

use std::sync::Arc;

use base64::Engine;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use twin_agentcore::agentcore::{AgentBackend, AgentInvoker, BedrockAgentClient, RemoteErrorKind};
use twin_agentcore::config::{AgentIdentity, AgentSettings};
use twin_agentcore::error::ChatError;

fn encode_frame(headers: &[(&str, &str)], payload: &[u8]) -> Vec<u8> {
    let mut headers_buf = Vec::new();
    for (name, value) in headers {
        headers_buf.push(name.len() as u8);
        headers_buf.extend_from_slice(name.as_bytes());
        headers_buf.push(7);
        headers_buf.extend_from_slice(&(value.len() as u16).to_be_bytes());
        headers_buf.extend_from_slice(value.as_bytes());
    }
    let total_len = 12 + headers_buf.len() + payload.len() + 4;

    let mut frame = Vec::new();
    frame.extend_from_slice(&(total_len as u32).to_be_bytes());
    frame.extend_from_slice(&(headers_buf.len() as u32).to_be_bytes());
    frame.extend_from_slice(&[0u8; 4]);
    frame.extend_from_slice(&headers_buf);
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&[0u8; 4]);
    frame
}

fn chunk(text: &str) -> Vec<u8> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text);
    encode_frame(
        &[
            (":message-type", "event"),
            (":event-type", "chunk"),
            (":content-type", "application/json"),
        ],
        json!({ "bytes": encoded }).to_string().as_bytes(),
    )
}

fn trace(step: u32) -> Vec<u8> {
    encode_frame(
        &[(":message-type", "event"), (":event-type", "trace")],
        json!({ "agentId": "AG1", "trace": { "step": step } }).to_string().as_bytes(),
    )
}

fn settings(server: &MockServer, enable_trace: bool, token: Option<&str>) -> AgentSettings {
    AgentSettings {
        identity: AgentIdentity {
            agent_id: Some("AG1".into()),
            alias_id: "TSTALIASID".into(),
        },
        region: "us-east-1".into(),
        enable_trace,
        runtime_endpoint: server.uri(),
        control_endpoint: server.uri(),
        bearer_token: token.map(|t| t.to_string().into()),
    }
}

fn invoker(settings: AgentSettings) -> AgentInvoker {
    let client = BedrockAgentClient::new(&settings).unwrap();
    AgentInvoker::new(Arc::new(client), Arc::new(settings))
}

const INVOKE_PATH: &str = "/agents/AG1/agentAliases/TSTALIASID/sessions/sess-42/text";

#[tokio::test]
async fn test_invoke_streams_and_concatenates() {
    let server = MockServer::start().await;

    let mut body = chunk("Hello");
    body.extend(trace(1));
    body.extend(chunk(", "));
    body.extend(chunk("world"));
    body.extend(trace(2));

    Mock::given(method("POST"))
        .and(path(INVOKE_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({ "inputText": "Hi there", "enableTrace": true })))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "application/vnd.amazon.eventstream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = invoker(settings(&server, true, Some("test-token")))
        .invoke("Hi there", "sess-42")
        .await
        .unwrap();

    assert_eq!(result.text, "Hello, world");
    let trace = result.trace.unwrap();
    assert_eq!(trace.len(), 2);
    assert_eq!(trace[0]["trace"]["step"], 1);
    assert_eq!(trace[1]["trace"]["step"], 2);
}

#[tokio::test]
async fn test_not_found_header_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(INVOKE_PATH))
        .respond_with(
            ResponseTemplate::new(404)
                .insert_header("x-amzn-ErrorType", "ResourceNotFoundException:http://internal.amazon.com/")
                .set_body_json(json!({ "message": "Failed to retrieve resource because it doesn't exist." })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = invoker(settings(&server, false, None))
        .invoke("Hi", "sess-42")
        .await
        .unwrap_err();

    match err {
        ChatError::NotFound(message) => assert!(message.contains("AG1")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_in_stream_exception_maps_to_permission_denied() {
    let server = MockServer::start().await;

    let mut body = chunk("partial");
    body.extend(encode_frame(
        &[
            (":message-type", "exception"),
            (":exception-type", "accessDeniedException"),
        ],
        json!({ "message": "User is not authorized" }).to_string().as_bytes(),
    ));

    Mock::given(method("POST"))
        .and(path(INVOKE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "application/vnd.amazon.eventstream"),
        )
        .mount(&server)
        .await;

    let err = invoker(settings(&server, false, None))
        .invoke("Hi", "sess-42")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::PermissionDenied(_)));
}

#[tokio::test]
async fn test_truncated_stream_is_internal() {
    let server = MockServer::start().await;

    let mut body = chunk("Hello");
    let tail = chunk("lost");
    body.extend_from_slice(&tail[..tail.len() / 2]);

    Mock::given(method("POST"))
        .and(path(INVOKE_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body, "application/vnd.amazon.eventstream"),
        )
        .mount(&server)
        .await;

    let err = invoker(settings(&server, false, None))
        .invoke("Hi", "sess-42")
        .await
        .unwrap_err();
    assert!(matches!(err, ChatError::Internal(_)));
}

#[tokio::test]
async fn test_get_agent_reads_metadata() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/agents/AG1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "agent": {
                "agentId": "AG1",
                "agentName": "ada-digital-twin",
                "agentStatus": "PREPARED",
                "foundationModel": "anthropic.claude-3-5-sonnet-20241022-v2:0"
            }
        })))
        .mount(&server)
        .await;

    let client = BedrockAgentClient::new(&settings(&server, true, None)).unwrap();
    let agent = client.get_agent("AG1").await.unwrap();

    assert_eq!(agent.agent_name, "ada-digital-twin");
    assert_eq!(agent.agent_status, "PREPARED");
    assert_eq!(
        agent.foundation_model.as_deref(),
        Some("anthropic.claude-3-5-sonnet-20241022-v2:0")
    );
}

#[tokio::test]
async fn test_get_agent_error_code_from_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/agents/AG1/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "__type": "com.amazonaws.bedrock#AccessDeniedException",
            "message": "not authorized to perform bedrock:GetAgent"
        })))
        .mount(&server)
        .await;

    let client = BedrockAgentClient::new(&settings(&server, true, None)).unwrap();
    let err = client.get_agent("AG1").await.unwrap_err();

    assert_eq!(err.kind(), RemoteErrorKind::AccessDenied);
    assert!(err.to_string().contains("bedrock:GetAgent"));
}
