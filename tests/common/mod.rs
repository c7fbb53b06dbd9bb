#![allow(dead_code)]

use std::sync::Arc;

use bitrix24_client::client::{
    Bitrix24Client, Credentials, OAuth2Client, ReqwestTransport, UrlFormatter,
};
use wiremock::MockServer;

pub const USER_ID: u64 = 7;
pub const WEBHOOK_CODE: &str = "w3bh00kc0de";

/// Host part (`127.0.0.1:port`) of a mock server, usable as a portal hostname.
pub fn host_of(server: &MockServer) -> String {
    server.address().to_string()
}

pub fn webhook_client(server: &MockServer) -> Bitrix24Client {
    Bitrix24Client::new(
        host_of(server),
        Credentials::Webhook {
            auth_code: WEBHOOK_CODE.to_string(),
        },
        Arc::new(ReqwestTransport::new()),
    )
    .with_user_id(USER_ID)
    .with_url_formatter(UrlFormatter::new("http"))
}

pub fn application_client(server: &MockServer) -> Bitrix24Client {
    let transport = Arc::new(ReqwestTransport::new());
    let oauth = OAuth2Client::new(
        host_of(server),
        "local.app".to_string(),
        "app-secret".to_string(),
        transport.clone(),
    )
    .with_url_formatter(UrlFormatter::new("http"));

    Bitrix24Client::new(
        host_of(server),
        Credentials::Application(Arc::new(oauth)),
        transport,
    )
    .with_url_formatter(UrlFormatter::new("http"))
}

pub fn init_test_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}
