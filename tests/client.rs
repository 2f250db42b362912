//! Client behavior against a mock Targetprocess instance.

use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use targetprocess_mcp::config::{Config, Credentials};
use targetprocess_mcp::models::EntityType;
use targetprocess_mcp::tp_client::{AssignmentQuery, TpClient, UserRef};

const TOKEN_AUTH: &str = "Basic OnNlY3JldC10b2tlbg==";

fn token_client(server: &MockServer) -> TpClient {
    let config = Config {
        base_url: server.uri(),
        credentials: Credentials::Token("secret-token".to_string()),
    };
    TpClient::new(&config).unwrap()
}

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[tokio::test]
async fn token_is_sent_as_password_with_empty_username() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Projects"))
        .and(header("Authorization", TOKEN_AUTH))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Items": [{"Id": 1}]})))
        .expect(1)
        .mount(&server)
        .await;

    token_client(&server).test_connection().await.unwrap();
}

#[tokio::test]
async fn basic_credentials_are_sent_as_given() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Projects"))
        .and(header("Authorization", "Basic YWxpY2U6czNjcmV0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        base_url: server.uri(),
        credentials: Credentials::Basic {
            username: "alice".to_string(),
            password: "s3cret".to_string(),
        },
    };
    let client = TpClient::new(&config).unwrap();
    let page = client.list(EntityType::Project, None, None, 5).await.unwrap();
    assert!(page.items.is_empty());
}

#[tokio::test]
async fn list_clamps_take_and_reports_more() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Bugs"))
        .and(query_param("take", "1000"))
        .and(query_param("where", "(Tags contains 'urgent')"))
        .and(query_param("include", "[Id,Name]"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Next": "http://example.com/api/v1/Bugs?skip=1000",
            "Items": [{"Id": 1, "Name": "Crash"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = token_client(&server)
        .list(
            EntityType::Bug,
            Some("(Tags contains 'urgent')"),
            Some("[Id,Name]"),
            50_000,
        )
        .await
        .unwrap();
    assert_eq!(page.count, 1);
    assert!(page.has_more);
}

#[tokio::test]
async fn create_then_get_returns_supplied_fields() {
    let server = MockServer::start().await;
    let created = json!({
        "ResourceType": "UserStory",
        "Id": 77,
        "Name": "Checkout flow",
        "Effort": 5.0,
        "Project": {"Id": 12}
    });
    Mock::given(method("POST"))
        .and(path("/api/v1/UserStories"))
        .and(body_json(json!({"Name": "Checkout flow", "Project": {"Id": 12}, "Effort": 5.0})))
        .respond_with(ResponseTemplate::new(201).set_body_json(created.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/UserStories/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(created))
        .expect(1)
        .mount(&server)
        .await;

    let client = token_client(&server);
    let story = client
        .create(
            EntityType::UserStory,
            &fields(json!({"Name": "Checkout flow", "Project": {"Id": 12}, "Effort": 5.0})),
        )
        .await
        .unwrap();
    let id = story.id().unwrap();

    let fetched = client.get_by_id(EntityType::UserStory, id, None).await.unwrap();
    assert_eq!(fetched.name(), Some("Checkout flow"));
    assert_eq!(fetched.nested_id(&["Project"]), Some(12));
    assert_eq!(fetched.get("Effort"), Some(&json!(5.0)));
}

#[tokio::test]
async fn repeated_update_sends_the_same_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/Tasks/5"))
        .and(body_json(json!({"Name": "Renamed"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"Id": 5, "Name": "Renamed"})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = token_client(&server);
    let update = fields(json!({"Name": "Renamed"}));
    let first = client.update(EntityType::Task, 5, &update).await.unwrap();
    let second = client.update(EntityType::Task, 5, &update).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn empty_update_is_rejected_locally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = token_client(&server)
        .update(EntityType::Task, 5, &Map::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "ValidationError");
}

#[tokio::test]
async fn comment_links_to_general_entity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/Comments"))
        .and(body_json(json!({"Description": "Looks good", "General": {"Id": 42}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Id": 900,
            "Description": "Looks good",
            "CreateDate": "/Date(1700000000000+0100)/",
            "General": {"Id": 42}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let comment = token_client(&server)
        .add_comment(EntityType::UserStory, 42, "Looks good")
        .await
        .unwrap();
    assert_eq!(comment.id(), Some(900));
    assert_eq!(
        comment.get("CreateDate"),
        Some(&json!("2023-11-14T23:13:20+01:00"))
    );
}

#[tokio::test]
async fn change_state_resolves_within_process() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Bugs/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Id": 9,
            "EntityState": {"Id": 1, "Name": "Open"},
            "Project": {"Id": 12, "Process": {"Id": 3}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/EntityStates"))
        .and(query_param(
            "where",
            "(EntityType.Name eq 'Bug') and (Process.Id eq 3) and (Name eq 'In Progress')",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Items": [{"Id": 31, "Name": "In Progress"}]})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/Bugs/9"))
        .and(body_json(json!({"EntityState": {"Id": 31}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Id": 9,
            "EntityState": {"Id": 31, "Name": "In Progress"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bug = token_client(&server)
        .change_state(EntityType::Bug, 9, "In Progress")
        .await
        .unwrap();
    assert_eq!(bug.state_name(), Some("In Progress"));
}

#[tokio::test]
async fn change_state_with_unknown_state_never_updates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Bugs/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Id": 9,
            "Project": {"Id": 12, "Process": {"Id": 3}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/EntityStates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Items": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = token_client(&server)
        .change_state(EntityType::Bug, 9, "Nope")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "NotFoundError");
    assert!(err.to_string().contains("'Nope'"));
}

#[tokio::test]
async fn entity_states_are_ordered_by_priority() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/EntityStates"))
        .and(query_param("where", "(EntityType.Name eq 'Task')"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Items": [
            {"Id": 3, "Name": "Done", "NumericPriority": 3.0},
            {"Id": 1, "Name": "Open", "NumericPriority": 1.0},
            {"Id": 2, "Name": "In Progress", "NumericPriority": 2.0}
        ]})))
        .mount(&server)
        .await;

    let states = token_client(&server)
        .entity_states(EntityType::Task, None)
        .await
        .unwrap();
    let names: Vec<_> = states.iter().filter_map(|s| s.name()).collect();
    assert_eq!(names, ["Open", "In Progress", "Done"]);
}

#[tokio::test]
async fn user_without_assignments_gets_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/GeneralUsers/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Id": 8, "Email": "bob@example.com"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Assignments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Items": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = token_client(&server);
    let user = client.resolve_user(&UserRef::Id(8)).await.unwrap();
    let page = client
        .list_assignments(user.id().unwrap(), &AssignmentQuery::default())
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert!(!page.has_more);
}

#[tokio::test]
async fn unknown_user_id_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/GeneralUsers/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = token_client(&server)
        .resolve_user(&UserRef::Id(404))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn bad_request_is_remote_http_error_with_redacted_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/UserStories"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("Invalid where: secret-token (Effort gtt 3)"),
        )
        .mount(&server)
        .await;

    let client = token_client(&server);
    let err = client
        .list(EntityType::UserStory, Some("(Effort gtt 3)"), None, 10)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "RemoteHTTPError");

    let tool_error = err.to_tool_error(&client.secrets());
    assert_eq!(tool_error["error"]["status"], json!(400));
    assert_eq!(
        tool_error["error"]["body"],
        json!("Invalid where: [REDACTED] (Effort gtt 3)")
    );
}

#[tokio::test]
async fn long_error_body_is_truncated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Tasks/1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(2000)))
        .mount(&server)
        .await;

    let err = token_client(&server)
        .get_by_id(EntityType::Task, 1, None)
        .await
        .unwrap_err();
    let tool_error = err.to_tool_error(&[]);
    let body = tool_error["error"]["body"].as_str().unwrap();
    assert!(body.ends_with("...[truncated]"));
    assert!(body.len() < 600);
}

#[tokio::test]
async fn invalid_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/Projects"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = token_client(&server)
        .list(EntityType::Project, None, None, 10)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "DecodeError");
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    let config = Config {
        base_url: "http://127.0.0.1:9".to_string(),
        credentials: Credentials::Token("secret-token".to_string()),
    };
    let err = TpClient::new(&config)
        .unwrap()
        .list(EntityType::Project, None, None, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "TransportError");
}
