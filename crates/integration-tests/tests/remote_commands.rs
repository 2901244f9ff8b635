//! Remote administration end to end
//!
//! Every test drives a real `AdminClient` against a canned endpoint on
//! localhost and checks both the wire traffic and the task notifications.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{json, manifest, response, Endpoint};
use glassadmin_client::{AdminClient, ClientConfig};
use glassadmin_core::domain::{Command, ServerVersion, TaskEvent, TaskState, ValueKind};
use glassadmin_core::port::listener::mocks::RecordingListener;

fn client(listener: &Arc<RecordingListener>) -> AdminClient {
    AdminClient::new(ClientConfig::default())
        .unwrap()
        .with_listener(listener.clone())
}

/// `version` over REST is a single authenticated POST returning the text
#[tokio::test]
async fn test_rest_version() {
    let endpoint = Endpoint::start(vec![json(
        r#"{"message":"Payara 5.192","exit_code":"SUCCESS","command":"version"}"#,
    )])
    .await;
    let listener = Arc::new(RecordingListener::new());
    let client = client(&listener);

    let result = client
        .exec(Arc::new(endpoint.server("payara")), Command::new("version"))
        .await
        .unwrap();

    assert_eq!(result.state(), TaskState::Completed);
    assert!(result.auth_ok());
    assert_eq!(result.value().and_then(|v| v.as_text()), Some("Payara 5.192"));

    let requests = endpoint.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].request_line(), "POST /command/version HTTP/1.1");
    assert!(requests[0].header("authorization").is_some());

    assert_eq!(
        listener.states(),
        vec![TaskState::Ready, TaskState::Running, TaskState::Completed]
    );
    let last = listener.notifications().pop().unwrap();
    assert_eq!(last.event, TaskEvent::CmdCompleted);
    assert_eq!(last.args, vec!["payara".to_string(), "version".to_string()]);

    client.shutdown().await;
}

/// A missing artifact fails before anything touches the network
#[tokio::test]
async fn test_deploy_missing_file_never_connects() {
    let endpoint = Endpoint::start(vec![json(r#"{"message":"","exit_code":"SUCCESS"}"#)]).await;
    let listener = Arc::new(RecordingListener::new());
    let client = client(&listener);

    let dir = tempfile::tempdir().unwrap();
    let command = Command::new("deploy").with_upload(dir.path().join("missing.war"));
    let result = client
        .exec(Arc::new(endpoint.server("payara")), command)
        .await
        .unwrap();

    assert_eq!(result.state(), TaskState::Failed);
    assert!(result.message().unwrap().contains("missing.war"));
    let last = listener.notifications().pop().unwrap();
    assert_eq!(last.event, TaskEvent::InvalidPath);
    assert_eq!(last.args.len(), 3);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(endpoint.connections(), 0);
    client.shutdown().await;
}

/// Rejected credentials fail the task and clear `auth_ok`
#[tokio::test]
async fn test_unauthorized_clears_auth_flag() {
    let endpoint = Endpoint::start(vec![response("401 Unauthorized", "text/plain", "")]).await;
    let listener = Arc::new(RecordingListener::new());
    let client = client(&listener);

    let result = client
        .exec(Arc::new(endpoint.server("payara")), Command::new("list-applications"))
        .await
        .unwrap();

    assert_eq!(result.state(), TaskState::Failed);
    assert!(!result.auth_ok());
    assert_eq!(listener.notifications().pop().unwrap().event, TaskEvent::AuthFailedHttp);
    assert_eq!(endpoint.connections(), 1);
    client.shutdown().await;
}

/// A login exception inside a REST report is an auth failure, not a plain one
#[tokio::test]
async fn test_rest_login_exception_clears_auth_flag() {
    let endpoint = Endpoint::start(vec![json(
        r#"{"message":"javax.security.auth.login.LoginException: Cannot authenticate","exit_code":"FAILURE"}"#,
    )])
    .await;
    let listener = Arc::new(RecordingListener::new());
    let client = client(&listener);

    let result = client
        .exec(Arc::new(endpoint.server("payara")), Command::new("version"))
        .await
        .unwrap();

    assert_eq!(result.state(), TaskState::Failed);
    assert!(!result.auth_ok());
    assert_eq!(listener.notifications().pop().unwrap().event, TaskEvent::AuthFailed);
    client.shutdown().await;
}

/// A REST failure report carries the server's message
#[tokio::test]
async fn test_rest_failure_message() {
    let endpoint = Endpoint::start(vec![json(
        r#"{"message":"Application with name hello is not deployed","exit_code":"FAILURE"}"#,
    )])
    .await;
    let listener = Arc::new(RecordingListener::new());
    let client = client(&listener);

    let result = client
        .exec(
            Arc::new(endpoint.server("payara")),
            Command::new("undeploy").with_operand("hello"),
        )
        .await
        .unwrap();

    assert_eq!(result.state(), TaskState::Failed);
    assert!(result.auth_ok());
    assert!(result
        .message()
        .unwrap()
        .ends_with("Application with name hello is not deployed"));
    assert_eq!(listener.notifications().pop().unwrap().event, TaskEvent::CmdFailed);
    client.shutdown().await;
}

/// Servers older than the REST interface are driven over the legacy path
#[tokio::test]
async fn test_legacy_server_uses_manifest_endpoint() {
    let endpoint = Endpoint::start(vec![response(
        "200 OK",
        "text/plain",
        "Manifest-Version: 1.0\r\nexit-code: SUCCESS\r\nchildren: hello;petstore\r\n\r\n\
         Name: hello\r\nmessage: hello\r\n\r\n\
         Name: petstore\r\nmessage: petstore\r\n\r\n",
    )])
    .await;
    let listener = Arc::new(RecordingListener::new());
    let client = client(&listener);

    let mut server = endpoint.server("glassfish3");
    server.version = Some(ServerVersion::new(3, 1, 2, 0));
    let command = Command::new("list-applications").with_value_kind(ValueKind::List);
    let result = client.exec(Arc::new(server), command).await.unwrap();

    assert_eq!(result.state(), TaskState::Completed);
    assert_eq!(
        result.value().and_then(|v| v.as_list()).unwrap(),
        &["hello".to_string(), "petstore".to_string()][..]
    );
    let requests = endpoint.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]
        .request_line()
        .starts_with("GET /__asadmin/list-applications"));
    client.shutdown().await;
}

/// "please wait" completes the task but flags it for a later retry
#[tokio::test]
async fn test_legacy_please_wait_requests_retry() {
    let endpoint = Endpoint::start(vec![manifest(
        "SUCCESS",
        "Server+is+starting,+please+wait",
    )])
    .await;
    let listener = Arc::new(RecordingListener::new());
    let client = client(&listener);

    let mut server = endpoint.server("glassfish3");
    server.version = Some(ServerVersion::new(3, 1, 0, 0));
    let result = client
        .exec(Arc::new(server), Command::new("version"))
        .await
        .unwrap();

    assert_eq!(result.state(), TaskState::Completed);
    assert!(result.retry_requested());
    client.shutdown().await;
}

/// Legacy failure exit code becomes a failed task
#[tokio::test]
async fn test_legacy_failure_exit_code() {
    let endpoint = Endpoint::start(vec![manifest("FAILURE", "No+such+command")]).await;
    let listener = Arc::new(RecordingListener::new());
    let client = client(&listener);

    let mut server = endpoint.server("glassfish3");
    server.version = Some(ServerVersion::new(3, 1, 0, 0));
    let result = client
        .exec(Arc::new(server), Command::new("frobnicate"))
        .await
        .unwrap();

    assert_eq!(result.state(), TaskState::Failed);
    assert!(result.message().unwrap().ends_with("No such command"));
    client.shutdown().await;
}

/// Nothing listening: the task fails as a transport error after the retry budget
#[tokio::test]
async fn test_connection_refused_fails_task() {
    let port = {
        let spare = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        spare.local_addr().unwrap().port()
    };
    let listener = Arc::new(RecordingListener::new());
    let client = client(&listener);

    let mut server = glassadmin_core::domain::ServerDescriptor::new("down", "127.0.0.1", port);
    server.admin_scheme = Some(glassadmin_core::domain::Scheme::Http);
    server.version = Some(ServerVersion::new(5, 192, 0, 0));
    let result = client
        .exec(Arc::new(server), Command::new("version"))
        .await
        .unwrap();

    assert_eq!(result.state(), TaskState::Failed);
    assert_eq!(listener.notifications().pop().unwrap().event, TaskEvent::TransportFailed);
    client.shutdown().await;
}
