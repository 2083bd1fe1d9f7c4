//! Integration tests for notification channels using wiremock

use darkwatch::config::NotificationConfig;
use darkwatch::notifications::{
    Channel, ChannelError, Notification, NotificationManager, Notifier, TelegramChannel,
    TelegramConfig, WebhookChannel, WebhookConfig,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn telegram(server: &MockServer) -> TelegramChannel {
    TelegramChannel::new(TelegramConfig::new("123:abc", "42").with_api_base(server.uri())).unwrap()
}

#[tokio::test]
async fn test_telegram_send_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .and(body_partial_json(serde_json::json!({
            "chat_id": "42",
            "text": "Found 2 matches for 'breach'",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "ok": true,
            "result": { "message_id": 7 }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let status = telegram(&mock_server)
        .send(&Notification::new("Found 2 matches for 'breach'"))
        .await
        .unwrap();

    assert!(status.success);
    assert_eq!(status.channel, "telegram");
}

#[tokio::test]
async fn test_telegram_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "ok": false,
            "description": "Bad Request: chat not found"
        })))
        .mount(&mock_server)
        .await;

    let err = telegram(&mock_server)
        .send(&Notification::new("hello"))
        .await
        .unwrap_err();

    match err {
        ChannelError::Rejected(reason) => assert!(reason.contains("chat not found")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_webhook_post_with_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("authorization", "Bearer s3cret"))
        .and(body_partial_json(serde_json::json!({
            "source": "darkwatch",
            "message": "Failed to access http://x.onion after 3 attempts",
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let channel = WebhookChannel::new(
        WebhookConfig::new(format!("{}/hook", mock_server.uri())).with_auth_token("s3cret"),
    )
    .unwrap();

    let status = channel
        .send(&Notification::new("Failed to access http://x.onion after 3 attempts"))
        .await
        .unwrap();
    assert!(status.success);
}

#[tokio::test]
async fn test_webhook_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    let channel = WebhookChannel::from_url(mock_server.uri()).unwrap();
    let err = channel.send(&Notification::new("hello")).await.unwrap_err();

    assert!(matches!(err, ChannelError::Rejected(ref r) if r.contains("500")));
}

#[tokio::test]
async fn test_manager_survives_one_dead_channel() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/bot123:abc/sendMessage"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut manager = NotificationManager::new();
    manager.add_channel(Box::new(telegram(&mock_server)));
    manager
        .add_webhook_channel(&format!("{}/hook", mock_server.uri()))
        .unwrap();

    assert!(manager.notify("Found 1 matches for 'leak'").await.is_ok());
}

#[tokio::test]
async fn test_manager_from_config_sends_webhook_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/hook"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = NotificationConfig {
        webhook_url: Some(format!("{}/hook", mock_server.uri())),
        webhook_token: Some("s3cret".to_string()),
        ..Default::default()
    };
    let manager = NotificationManager::from_config(&config).unwrap();

    assert!(manager.notify("Found 1 matches for 'leak'").await.is_ok());
}
