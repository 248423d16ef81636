//! Integration tests for Fatebook MCP Server
//!
//! These tests verify the MCP protocol handling and tool invocations.
//! The Fatebook API is played by a local wiremock server - no real API calls are made.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{any, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fatebook_mcp_server_rust::config::Config;
use fatebook_mcp_server_rust::fatebook::client::FatebookClient;
use fatebook_mcp_server_rust::mcp::server::McpServer;
use fatebook_mcp_server_rust::mcp::tools::ToolHandler;
use fatebook_mcp_server_rust::mcp::types::CallToolResult;

fn config_for(server: &MockServer, api_key: Option<&str>) -> Config {
    Config::default()
        .with_base_url(server.uri())
        .with_api_key(api_key.map(str::to_string))
        .with_timeout(Duration::from_secs(5))
}

fn handler(config: &Config) -> ToolHandler {
    ToolHandler::new(Arc::new(assert_ok!(FatebookClient::new(config))))
}

fn text(result: &CallToolResult) -> &str {
    result.first_text().expect("tool result has text content")
}

/// Mount a catch-all that fails the test if any request reaches the server
async fn forbid_requests(server: &MockServer) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

fn sample_question() -> Value {
    json!({
        "title": "Will it rain tomorrow in SF?",
        "type": "BINARY",
        "resolved": false,
        "createdAt": "2024-12-30T18:00:00.000Z",
        "resolveBy": "2025-01-02T23:59:59.000Z",
        "notes": "Per NWS reading at SFO",
        "forecasts": [
            {"id": 991, "forecast": 0.7, "user": {"id": "u1", "name": "Ada"}, "createdAt": "2024-12-30T18:00:00.000Z"}
        ],
        "tags": [{"id": "t1", "name": "weather"}],
        "comments": [],
        "sharedPublicly": false,
        "unlisted": false,
        "yourLatestPrediction": "0.70"
    })
}

mod question_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_question_returns_id_and_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/createQuestion"))
            .and(body_partial_json(json!({
                "apiKey": "test-key",
                "title": "Will it rain tomorrow in SF?",
                "forecast": 0.7,
                "resolveBy": "2025-01-02",
                "tags": ["weather"]
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("https://fatebook.io/q/will-it-rain-tomorrow-in-sf--clx9rain"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let tools = handler(&config_for(&server, None));
        let result = tools
            .call_tool(
                "create_question",
                json!({
                    "title": "Will it rain tomorrow in SF?",
                    "forecast": 0.7,
                    "resolveBy": "2025-01-02",
                    "tags": ["weather"],
                    "apiKey": "test-key"
                }),
            )
            .await;

        assert!(!result.is_error, "{}", text(&result));
        let created: Value = serde_json::from_str(text(&result)).unwrap();
        let id = created["id"].as_str().unwrap();
        assert_eq!(id, "clx9rain");
        assert_eq!(created["title"], "Will it rain tomorrow in SF?");
        assert!(created["url"].as_str().unwrap().contains(id));
    }

    #[tokio::test]
    async fn test_get_question_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getQuestion"))
            .and(query_param("questionId", "clx9rain"))
            .and(query_param("apiKey", "env-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_question()))
            .expect(2)
            .mount(&server)
            .await;

        let tools = handler(&config_for(&server, Some("env-key")));
        let args = json!({"questionId": "clx9rain"});
        let first = tools.call_tool("get_question", args.clone()).await;
        let second = tools.call_tool("get_question", args).await;

        assert!(!first.is_error, "{}", text(&first));
        let first: Value = serde_json::from_str(text(&first)).unwrap();
        let second: Value = serde_json::from_str(text(&second)).unwrap();
        assert_eq!(first, second);

        assert_eq!(first["id"], "clx9rain");
        assert_eq!(first["type"], "BINARY");
        assert_eq!(first["resolved"], false);
        assert_eq!(first["createdAt"], "2024-12-30T18:00:00.000Z");
        assert_eq!(first["forecasts"][0]["id"], "991");
        assert_eq!(first["forecasts"][0]["user"]["name"], "Ada");
    }

    #[tokio::test]
    async fn test_list_questions_passes_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getQuestions"))
            .and(query_param("apiKey", "env-key"))
            .and(query_param("unresolved", "true"))
            .and(query_param("searchString", "rain"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [
                    {"id": "q1", "title": "Rain on Monday?", "type": "BINARY", "resolved": false},
                    {"id": "q2", "title": "Rain on Tuesday?", "type": "BINARY", "resolved": false}
                ],
                "cursor": "q2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tools = handler(&config_for(&server, Some("env-key")));
        let result = tools
            .call_tool(
                "list_questions",
                json!({"unresolved": true, "searchString": "rain", "limit": 5}),
            )
            .await;

        assert!(!result.is_error, "{}", text(&result));
        let list: Value = serde_json::from_str(text(&result)).unwrap();
        assert_eq!(list["result"].as_array().unwrap().len(), 2);
        assert_eq!(list["result"][1]["id"], "q2");
        assert_eq!(list["cursor"], "q2");
    }

    #[tokio::test]
    async fn test_write_operations_confirm() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/addForecast"))
            .and(body_partial_json(json!({"questionId": "q1", "forecast": 0.8, "apiKey": "env-key"})))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/addComment"))
            .and(body_partial_json(json!({"questionId": "q1", "comment": "Radar looks wet"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/resolveQuestion"))
            .and(body_partial_json(json!({"questionId": "q1", "resolution": "YES", "questionType": "BINARY"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/editQuestion"))
            .and(body_partial_json(json!({"questionId": "q1", "notes": "Updated source"})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/setSharedPublicly"))
            .and(body_partial_json(json!({"questionId": "q1", "sharedPublicly": true, "unlisted": true})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/deleteQuestion"))
            .and(query_param("questionId", "q1"))
            .and(query_param("apiKey", "env-key"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let tools = handler(&config_for(&server, Some("env-key")));
        let calls = [
            ("add_forecast", json!({"questionId": "q1", "forecast": 0.8})),
            ("add_comment", json!({"questionId": "q1", "comment": "Radar looks wet"})),
            (
                "resolve_question",
                json!({"questionId": "q1", "resolution": "YES", "questionType": "BINARY"}),
            ),
            ("edit_question", json!({"questionId": "q1", "notes": "Updated source"})),
            (
                "set_visibility",
                json!({"questionId": "q1", "sharedPublicly": true, "unlisted": true}),
            ),
            ("delete_question", json!({"questionId": "q1"})),
        ];

        for (name, args) in calls {
            let result = tools.call_tool(name, args).await;
            assert!(!result.is_error, "{}: {}", name, text(&result));
            assert_eq!(text(&result), "true", "{}", name);
        }
    }

    #[tokio::test]
    async fn test_count_forecasts_without_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/countForecasts"))
            .and(query_param("userId", "cme6dxa8g0001"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"numberOfForecasts": 12})))
            .expect(1)
            .mount(&server)
            .await;

        let tools = handler(&config_for(&server, None));
        let result = tools
            .call_tool("count_forecasts", json!({"userId": "cme6dxa8g0001"}))
            .await;

        assert!(!result.is_error, "{}", text(&result));
        assert_eq!(text(&result).parse::<u64>().unwrap(), 12);
    }
}

mod credential_tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_credential_never_reaches_network() {
        let server = MockServer::start().await;
        forbid_requests(&server).await;

        let tools = handler(&config_for(&server, None));
        let calls = [
            ("list_questions", json!({})),
            (
                "create_question",
                json!({"title": "t", "forecast": 0.5, "resolveBy": "2025-01-02"}),
            ),
            ("get_question", json!({"questionId": "q1"})),
            ("add_forecast", json!({"questionId": "q1", "forecast": 0.5})),
            ("add_comment", json!({"questionId": "q1", "comment": "c"})),
            (
                "resolve_question",
                json!({"questionId": "q1", "resolution": "NO", "questionType": "BINARY"}),
            ),
            ("edit_question", json!({"questionId": "q1", "title": "new"})),
            ("delete_question", json!({"questionId": "q1"})),
            ("set_visibility", json!({"questionId": "q1", "sharedPublicly": false})),
        ];

        for (name, args) in calls {
            let result = tools.call_tool(name, args).await;
            assert!(result.is_error, "{}", name);
            assert!(text(&result).contains("[missing_credential]"), "{}: {}", name, text(&result));
        }
    }

    #[tokio::test]
    async fn test_blank_explicit_key_counts_as_missing() {
        let server = MockServer::start().await;
        forbid_requests(&server).await;

        let tools = handler(&config_for(&server, None));
        let result = tools
            .call_tool("get_question", json!({"questionId": "q1", "apiKey": "   "}))
            .await;
        assert!(text(&result).contains("[missing_credential]"));
    }

    #[tokio::test]
    async fn test_explicit_key_overrides_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getQuestion"))
            .and(query_param("apiKey", "call-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_question()))
            .expect(1)
            .mount(&server)
            .await;

        let tools = handler(&config_for(&server, Some("env-key")));
        let result = tools
            .call_tool("get_question", json!({"questionId": "q1", "apiKey": "call-key"}))
            .await;
        assert!(!result.is_error, "{}", text(&result));
    }
}

mod validation_tests {
    use super::*;

    #[tokio::test]
    async fn test_out_of_range_forecasts_rejected_locally() {
        let server = MockServer::start().await;
        forbid_requests(&server).await;

        let tools = handler(&config_for(&server, Some("env-key")));
        for forecast in [-0.01, 1.01] {
            let result = tools
                .call_tool("add_forecast", json!({"questionId": "q1", "forecast": forecast}))
                .await;
            assert!(result.is_error);
            assert!(text(&result).contains("[local_validation]"), "{}", text(&result));
        }
    }

    #[tokio::test]
    async fn test_maybe_is_not_a_binary_resolution() {
        let server = MockServer::start().await;
        forbid_requests(&server).await;

        let tools = handler(&config_for(&server, Some("env-key")));
        let result = tools
            .call_tool(
                "resolve_question",
                json!({"questionId": "q1", "resolution": "MAYBE", "questionType": "BINARY"}),
            )
            .await;
        assert!(result.is_error);
        assert!(text(&result).contains("MAYBE"));
        assert!(text(&result).starts_with("Error: resolve_question failed [local_validation]"));
    }

    #[tokio::test]
    async fn test_whitespace_ids_rejected_locally() {
        let server = MockServer::start().await;
        forbid_requests(&server).await;

        let tools = handler(&config_for(&server, Some("env-key")));
        for name in ["get_question", "delete_question"] {
            let result = tools.call_tool(name, json!({"questionId": "   "})).await;
            assert!(text(&result).contains("[local_validation]"), "{}", name);
        }

        let result = tools.call_tool("count_forecasts", json!({"userId": ""})).await;
        assert!(text(&result).contains("[local_validation]"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let server = MockServer::start().await;
        forbid_requests(&server).await;

        let tools = handler(&config_for(&server, Some("env-key")));
        let result = tools.call_tool("send_email", json!({})).await;
        assert!(result.is_error);
        assert!(text(&result).contains("Unknown tool: send_email"));
    }
}

mod remote_failure_tests {
    use super::*;

    async fn failing_call(template: ResponseTemplate) -> String {
        let server = MockServer::start().await;
        Mock::given(path("/getQuestion"))
            .respond_with(template)
            .expect(1)
            .mount(&server)
            .await;

        let tools = handler(&config_for(&server, Some("env-key")));
        let result = tools
            .call_tool("get_question", json!({"questionId": "q1"}))
            .await;
        assert!(result.is_error);
        text(&result).to_string()
    }

    #[tokio::test]
    async fn test_auth_failure() {
        let message =
            failing_call(ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid API key"})))
                .await;
        assert!(message.contains("[remote_auth]"));
        assert!(message.contains("401"));
        assert!(message.contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_not_found() {
        let message = failing_call(ResponseTemplate::new(404).set_body_string("Question not found")).await;
        assert!(message.contains("[remote_not_found]"));
        assert!(message.contains("404"));
        assert!(message.contains("Question not found"));
    }

    #[tokio::test]
    async fn test_remote_validation_is_verbatim() {
        let message = failing_call(
            ResponseTemplate::new(400).set_body_json(json!({"error": "questionId is malformed"})),
        )
        .await;
        assert!(message.contains("[remote_validation]"));
        assert!(message.contains("questionId is malformed"));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let message = failing_call(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "7")
                .set_body_string("Too many requests"),
        )
        .await;
        assert!(message.contains("[rate_limited]"));
        assert!(message.contains("429"));
        assert!(message.contains("retry after 7 seconds"));
    }

    #[tokio::test]
    async fn test_server_error() {
        let message = failing_call(ResponseTemplate::new(502).set_body_string("bad gateway")).await;
        assert!(message.contains("[server_error]"));
        assert!(message.contains("502"));
    }

    #[tokio::test]
    async fn test_timeout_is_bounded() {
        let server = MockServer::start().await;
        Mock::given(path("/getQuestion"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(sample_question())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = config_for(&server, Some("env-key")).with_timeout(Duration::from_millis(200));
        let tools = handler(&config);

        let started = Instant::now();
        let result = tools
            .call_tool("get_question", json!({"questionId": "q1"}))
            .await;

        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(result.is_error);
        assert!(text(&result).contains("[network]"), "{}", text(&result));
        assert!(text(&result).contains("timed out"));
        assert!(!text(&result).contains("env-key"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        // Port 9 (discard) is not served in test environments.
        let config = Config::default()
            .with_base_url("http://127.0.0.1:9")
            .with_api_key(Some("secret-key".to_string()))
            .with_timeout(Duration::from_secs(2));
        let tools = handler(&config);

        let result = tools
            .call_tool("get_question", json!({"questionId": "q1"}))
            .await;
        assert!(result.is_error);
        assert!(text(&result).contains("[network]"), "{}", text(&result));
        assert!(!text(&result).contains("secret-key"));
    }
}

mod mcp_protocol_tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    fn server_for(config: &Config) -> McpServer {
        McpServer::new(Arc::new(assert_ok!(FatebookClient::new(config))))
    }

    #[tokio::test]
    async fn test_ping_answered_while_call_in_flight() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/countForecasts"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("5")
                    .set_delay(Duration::from_millis(1500)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut mcp = server_for(&config_for(&server, None));
        let (client_end, server_end) = tokio::io::duplex(8192);
        let (server_read, server_write) = tokio::io::split(server_end);
        let serving =
            tokio::spawn(async move { mcp.run(BufReader::new(server_read), server_write).await });

        let (client_read, mut client_write) = tokio::io::split(client_end);
        let call = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": "count_forecasts", "arguments": {"userId": "u1"}}
        });
        let ping = json!({"jsonrpc": "2.0", "id": 2, "method": "ping"});
        let input = format!("{}\n{}\n", call, ping);

        let started = Instant::now();
        client_write.write_all(input.as_bytes()).await.unwrap();

        let mut lines = BufReader::new(client_read).lines();
        let first: Value = serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(first["id"], 2);
        assert!(started.elapsed() < Duration::from_millis(1000));

        let second: Value =
            serde_json::from_str(&lines.next_line().await.unwrap().unwrap()).unwrap();
        assert_eq!(second["id"], 1);
        assert_eq!(second["result"]["content"][0]["text"], "5");

        drop(client_write);
        drop(lines);
        assert_ok!(serving.await.unwrap());
    }

    #[tokio::test]
    async fn test_call_tool_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/countForecasts"))
            .respond_with(ResponseTemplate::new(200).set_body_string("3"))
            .mount(&server)
            .await;

        let mut mcp = server_for(&config_for(&server, None));
        let response = mcp
            .handle_message(
                &json!({
                    "jsonrpc": "2.0",
                    "id": 7,
                    "method": "tools/call",
                    "params": {"name": "count_forecasts", "arguments": {"userId": "u1"}}
                })
                .to_string(),
            )
            .await
            .unwrap()
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["content"][0]["type"], "text");
        assert_eq!(result["content"][0]["text"], "3");
        assert!(result.get("isError").is_none());
    }

    #[tokio::test]
    async fn test_tool_failure_is_marked() {
        let server = MockServer::start().await;
        forbid_requests(&server).await;

        let mut mcp = server_for(&config_for(&server, None));
        let response = mcp
            .handle_message(
                &json!({
                    "jsonrpc": "2.0",
                    "id": 8,
                    "method": "tools/call",
                    "params": {"name": "get_question", "arguments": {"questionId": "q1"}}
                })
                .to_string(),
            )
            .await
            .unwrap()
            .unwrap();

        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("missing_credential"));
    }

    #[tokio::test]
    async fn test_read_question_resource() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/getQuestion"))
            .and(query_param("questionId", "clx9rain"))
            .and(query_param("apiKey", "env-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_question()))
            .expect(1)
            .mount(&server)
            .await;

        let mut mcp = server_for(&config_for(&server, Some("env-key")));
        let response = mcp
            .handle_message(
                r#"{"jsonrpc":"2.0","id":9,"method":"resources/read","params":{"uri":"question://clx9rain"}}"#,
            )
            .await
            .unwrap()
            .unwrap();

        let result = response.result.unwrap();
        let content = &result["contents"][0];
        assert_eq!(content["uri"], "question://clx9rain");
        assert_eq!(content["mimeType"], "application/json");

        let question: Value = serde_json::from_str(content["text"].as_str().unwrap()).unwrap();
        assert_eq!(question["id"], "clx9rain");
        assert_eq!(question["title"], "Will it rain tomorrow in SF?");
    }

    #[tokio::test]
    async fn test_read_resource_without_key_is_an_error() {
        let server = MockServer::start().await;
        forbid_requests(&server).await;

        let mut mcp = server_for(&config_for(&server, None));
        let response = mcp
            .handle_message(
                r#"{"jsonrpc":"2.0","id":10,"method":"resources/read","params":{"uri":"question://q1"}}"#,
            )
            .await
            .unwrap()
            .unwrap();

        let error = response.error.unwrap();
        assert_eq!(error.code, -32603);
        assert_eq!(error.data.unwrap()["kind"], "missing_credential");
    }

    #[test]
    fn test_invalid_base_url_is_still_constructible() {
        // Construction never touches the network; failures surface per call.
        let config = Config::default().with_base_url("http://invalid.localhost:1");
        let client = assert_ok!(FatebookClient::new(&config));
        assert_eq!(client.base_url(), "http://invalid.localhost:1");
    }

    #[test]
    fn test_request_without_method_is_rejected() {
        let parsed: Result<fatebook_mcp_server_rust::mcp::types::JsonRpcRequest, _> =
            serde_json::from_str(r#"{"id": 1}"#);
        assert_err!(parsed);
    }
}
