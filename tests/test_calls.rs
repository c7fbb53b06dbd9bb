mod common;

use bitrix24_client::{Batch, CallSpec, Error, ParamTree, MAX_BATCH_CALLS};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_webhook_call_uses_code_in_path() {
    common::init_test_logging();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/rest/{}/{}/user.get.json", common::USER_ID, common::WEBHOOK_CODE)))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"FILTER": {"ACTIVE": true}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": [{"ID": "1", "NAME": "Ivan"}],
            "total": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = common::webhook_client(&mock_server);
    let response = client
        .call("user.get", &json!({"FILTER": {"ACTIVE": true}}))
        .await
        .expect("call should succeed");

    assert_eq!(response.total, Some(1));
    assert_eq!(response.result.unwrap()[0]["NAME"], "Ivan");
}

#[tokio::test]
async fn test_api_error_envelope_becomes_error() {
    common::init_test_logging();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "ERROR_METHOD_NOT_FOUND",
            "error_description": "Method not found!"
        })))
        .mount(&mock_server)
        .await;

    let client = common::webhook_client(&mock_server);
    let result = client.call("no.such.method", &json!({})).await;

    match result {
        Err(Error::Api { error, description }) => {
            assert_eq!(error, "ERROR_METHOD_NOT_FOUND");
            assert_eq!(description, "Method not found!");
        }
        other => panic!("expected an API error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_body_is_a_serialization_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&mock_server)
        .await;

    let client = common::webhook_client(&mock_server);
    let result = client.call("profile", &json!({})).await;

    assert!(matches!(result, Err(Error::Serialization(_))));
}

#[tokio::test]
async fn test_batch_sends_compiled_commands() {
    common::init_test_logging();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/rest/{}/{}/batch.json", common::USER_ID, common::WEBHOOK_CODE)))
        .and(body_json(json!({
            "cmd": {
                "get_user": "user.current?",
                "get_department": "department.get?ID=%24result%5Bget_user%5D%5BUF_DEPARTMENT%5D"
            },
            "halt": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "result": {"get_user": {"ID": "1"}, "get_department": [{"ID": "5"}]},
                "result_error": []
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let batch = Batch::new()
        .with("get_user", CallSpec::pair("user.current", ParamTree::map()))
        .with(
            "get_department",
            CallSpec::Record {
                method: "department.get".to_string(),
                params: ParamTree::map().with("ID", "$result[get_user][UF_DEPARTMENT]"),
            },
        );

    let client = common::webhook_client(&mock_server);
    let response = client.call_batch(&batch, true).await.expect("batch should succeed");

    assert!(response.error_message().is_none());
    assert_eq!(response.result.unwrap()["result"]["get_user"]["ID"], "1");
}

#[tokio::test]
async fn test_invalid_batch_is_rejected_before_sending() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = common::webhook_client(&mock_server);
    let batch = Batch::new().with("bad", CallSpec::pair("crm.lead.list", ParamTree::from("nope")));

    let result = client.call_batch(&batch, false).await;

    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[tokio::test]
async fn test_oversized_batch_is_still_sent() {
    common::init_test_logging();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/rest/{}/{}/batch.json", common::USER_ID, common::WEBHOOK_CODE)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"result": {}, "result_error": {}}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut batch = Batch::new();
    for i in 0..=MAX_BATCH_CALLS {
        batch.push(format!("call_{i}"), CallSpec::Literal("profile".into()));
    }
    assert!(batch.exceeds_limit());

    let client = common::webhook_client(&mock_server);
    let response = client.call_batch(&batch, false).await.expect("batch should be sent");

    assert!(response.error_message().is_none());
}

#[tokio::test]
async fn test_bind_defaults_auth_type_to_user_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/rest/{}/{}/event.bind.json", common::USER_ID, common::WEBHOOK_CODE)))
        .and(body_json(json!({
            "auth_type": common::USER_ID,
            "event": "OnAppUpdate",
            "handler": "https://example.com/"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/rest/{}/{}/event.unbind.json", common::USER_ID, common::WEBHOOK_CODE)))
        .and(body_json(json!({
            "auth_type": 3,
            "event": "OnAppUpdate",
            "handler": "https://example.com/"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": {"count": 1}})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = common::webhook_client(&mock_server);
    client
        .call_bind("OnAppUpdate", "https://example.com/", None)
        .await
        .expect("bind should succeed");
    client
        .call_unbind("OnAppUpdate", "https://example.com/", Some(3))
        .await
        .expect("unbind should succeed");
}
