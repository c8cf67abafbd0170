//! Endpoint fallback against a live HTTP server.
//!
//! Gateways differ in which route variants they expose. A 404/405 from one
//! variant must move on to the next, and any other failure must surface in
//! the command result.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zapcmd::gateway::{endpoints, GatewayRequest};
use zapcmd::{Gateway, HttpGateway, Interpreter};

const TOKEN: &str = "TEST_TOKEN";

fn gateway(server: &MockServer) -> Arc<HttpGateway> {
    Arc::new(HttpGateway::new(server.uri(), TOKEN, Duration::from_secs(5)).unwrap())
}

fn interpreter(server: &MockServer) -> Interpreter {
    Interpreter::new(gateway(server)).with_settle_delay(Duration::ZERO)
}

async fn mock_group_list(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/group/list"))
        .and(header("token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groups": [
                {"JID": "120363001@g.us", "subject": "Vendas"},
                {"JID": "120363002@g.us", "subject": "Suporte"}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn send_carries_token_and_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send/text"))
        .and(header("token", TOKEN))
        .and(body_partial_json(json!({"number": "5511999999999", "text": "oi"})))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id": "msg1"}"#))
        .expect(1)
        .mount(&server)
        .await;

    let response = gateway(&server)
        .send(&GatewayRequest::post(
            "/send/text",
            json!({"number": "5511999999999", "text": "oi"}),
        ))
        .await
        .unwrap();

    assert!(response.is_success());
    assert_eq!(response.json()["id"], "msg1");
}

#[tokio::test]
async fn non_success_status_is_a_response_not_an_error() {
    let server = MockServer::start().await;

    let response = gateway(&server)
        .send(&GatewayRequest::get("/group/list"))
        .await
        .unwrap();

    assert_eq!(response.status, 404);
    assert!(!response.is_success());
}

#[tokio::test]
async fn probe_falls_through_missing_routes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/group/updateName"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/group/updateName"))
        .and(body_partial_json(json!({"groupjid": "1@g.us", "name": "Novo"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let success = endpoints::rename("1@g.us", "Novo")
        .run(gateway.as_ref())
        .await
        .unwrap();

    assert_eq!(success.index, 1);
    assert_eq!(success.response.status, 200);
}

#[tokio::test]
async fn rename_by_name_uses_fallback_route() {
    let server = MockServer::start().await;
    mock_group_list(&server).await;

    Mock::given(method("POST"))
        .and(path("/group/updateName"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/group/updateName"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/group/updateSubject"))
        .and(body_partial_json(json!({"groupjid": "120363001@g.us", "subject": "Vendas 2024"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let result = interpreter(&server)
        .interpret("#attnomegrupo vendas|Vendas 2024")
        .await
        .unwrap();

    assert!(result.success, "rename should succeed, got: {result:?}");
    assert_eq!(result.command, "attnomegrupo");
    assert_eq!(result.data.unwrap()["group"]["id"], "120363001@g.us");
}

#[tokio::test]
async fn server_error_outranks_later_missing_routes() {
    let server = MockServer::start().await;
    mock_group_list(&server).await;

    Mock::given(method("POST"))
        .and(path("/group/updateParticipants"))
        .respond_with(ResponseTemplate::new(500).set_body_string("participante inválido"))
        .mount(&server)
        .await;

    let result = interpreter(&server)
        .interpret("#addnogrupo Suporte|+55 (11) 98888-7777")
        .await
        .unwrap();

    assert!(!result.success);
    assert!(
        result.message.contains("500"),
        "expected the 500 to be reported, got: {}",
        result.message
    );
    assert!(result.message.contains("participante inválido"));
}

#[tokio::test]
async fn invite_link_to_phone_sends_the_link() {
    let server = MockServer::start().await;
    mock_group_list(&server).await;

    Mock::given(method("GET"))
        .and(path("/group/invitelink/120363002@g.us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"inviteCode": "XyZ123AbCdEf"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/send/text"))
        .and(body_partial_json(json!({
            "number": "5511977776666",
            "text": "https://chat.whatsapp.com/XyZ123AbCdEf"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let result = interpreter(&server)
        .interpret("#linkgrupo Suporte|5511977776666")
        .await
        .unwrap();

    assert!(result.success, "got: {result:?}");
    assert_eq!(result.data.unwrap()["link"], "https://chat.whatsapp.com/XyZ123AbCdEf");
}

#[tokio::test]
async fn unknown_group_stops_before_any_update() {
    let server = MockServer::start().await;
    mock_group_list(&server).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = interpreter(&server)
        .interpret("#attdescricao Financeiro|nova descrição")
        .await
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.message, "Grupo \"Financeiro\" não encontrado");
}

#[tokio::test]
async fn truncated_body_is_a_transport_error() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        // Promise 100 bytes, deliver a few, hang up.
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\ncontent-type: application/json\r\n\r\n{\"groups\": [")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let gateway = HttpGateway::new(format!("http://{addr}"), TOKEN, Duration::from_secs(5)).unwrap();
    let result = gateway.send(&GatewayRequest::get("/group/list")).await;

    assert!(result.is_err(), "expected a body read error, got: {result:?}");
}
