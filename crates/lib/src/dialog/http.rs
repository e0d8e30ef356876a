//! Dialog engine runtime API over HTTP, both API generations.
//!
//! **v2** uses `/bot/{botId}/botAlias/{aliasId}/botLocale/{localeId}/session/{sessionId}`;
//! session calls return their messages compressed in the `x-amz-lex-messages` header.
//! **v1** uses `/bot/{botName}/alias/{alias}/user/{userId}/{session|text}` with JSON bodies.
//! Requests are unsigned: point `dialog.endpoint` at a signing proxy or a local emulator.

use super::{DialogEngine, UpstreamCallError};
use crate::config::{ApiGeneration, DialogConfig};
use crate::normalize::{MessageList, RawReply};
use async_trait::async_trait;
use serde_json::json;

const MESSAGES_HEADER: &str = "x-amz-lex-messages";

/// Client for the dialog engine runtime API.
#[derive(Clone)]
pub struct HttpDialogEngine {
    base_url: String,
    generation: ApiGeneration,
    bot_id: String,
    bot_alias_id: String,
    locale_id: String,
    client: reqwest::Client,
}

impl HttpDialogEngine {
    pub fn new(config: &DialogConfig) -> Self {
        Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            generation: config.api_generation,
            bot_id: config.bot_id.clone(),
            bot_alias_id: config.bot_alias_id.clone(),
            locale_id: config.locale_id.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn v2_session_url(&self, session_id: &str) -> String {
        format!(
            "{}/bot/{}/botAlias/{}/botLocale/{}/session/{}",
            self.base_url, self.bot_id, self.bot_alias_id, self.locale_id, session_id
        )
    }

    fn v1_user_url(&self, session_id: &str) -> String {
        format!(
            "{}/bot/{}/alias/{}/user/{}",
            self.base_url, self.bot_id, self.bot_alias_id, session_id
        )
    }

    /// Send the request and turn the response into a raw reply (messages header first, then JSON body).
    async fn send(&self, req: reqwest::RequestBuilder) -> Result<RawReply, UpstreamCallError> {
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(UpstreamCallError::Api(format!("{} {}", status, body)));
        }
        if let Some(header) = res.headers().get(MESSAGES_HEADER) {
            let encoded = header
                .to_str()
                .map_err(|_| {
                    UpstreamCallError::Reply(format!("{} header is not ASCII", MESSAGES_HEADER))
                })?
                .to_string();
            return Ok(RawReply::Modern {
                messages: MessageList::Compressed(encoded),
            });
        }
        let body = res.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(RawReply::empty());
        }
        let value: serde_json::Value = serde_json::from_slice(&body)
            .map_err(|e| UpstreamCallError::Reply(e.to_string()))?;
        RawReply::from_json(value)
            .ok_or_else(|| UpstreamCallError::Reply("expected a JSON object".to_string()))
    }
}

#[async_trait]
impl DialogEngine for HttpDialogEngine {
    async fn start_session(
        &self,
        session_id: &str,
        intent: &str,
    ) -> Result<RawReply, UpstreamCallError> {
        let req = match self.generation {
            ApiGeneration::V2 => self.client.put(self.v2_session_url(session_id)).json(&json!({
                "sessionState": {
                    "intent": { "name": intent },
                    "dialogAction": { "type": "Delegate" }
                }
            })),
            ApiGeneration::V1 => self
                .client
                .post(format!("{}/session", self.v1_user_url(session_id)))
                .json(&json!({
                    "dialogAction": { "type": "Delegate", "intentName": intent }
                })),
        };
        log::debug!("start_session {} (intent {})", session_id, intent);
        self.send(req).await
    }

    async fn recognize_text(
        &self,
        session_id: &str,
        text: &str,
    ) -> Result<RawReply, UpstreamCallError> {
        let req = match self.generation {
            ApiGeneration::V2 => self
                .client
                .post(format!("{}/text", self.v2_session_url(session_id)))
                .json(&json!({ "text": text, "sessionState": {} })),
            ApiGeneration::V1 => self
                .client
                .post(format!("{}/text", self.v1_user_url(session_id)))
                .json(&json!({ "inputText": text })),
        };
        log::debug!("recognize_text {}", session_id);
        self.send(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::test_support::gzip_base64;
    use crate::normalize::{decode, MessageUnit};
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn config(endpoint: &str, generation: ApiGeneration) -> DialogConfig {
        DialogConfig {
            endpoint: format!("{}/", endpoint),
            api_generation: generation,
            bot_id: "BOT".to_string(),
            bot_alias_id: "ALIAS".to_string(),
            locale_id: "en_US".to_string(),
            welcome_intent: "Welcome".to_string(),
        }
    }

    #[tokio::test]
    async fn v2_start_session_reads_compressed_header() {
        let server = MockServer::start().await;
        let messages = r#"[{"contentType":"PlainText","content":"Welcome!"}]"#;
        Mock::given(method("PUT"))
            .and(path("/bot/BOT/botAlias/ALIAS/botLocale/en_US/session/s-1"))
            .and(body_json(json!({
                "sessionState": {
                    "intent": { "name": "Welcome" },
                    "dialogAction": { "type": "Delegate" }
                }
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header(MESSAGES_HEADER, gzip_base64(messages).as_str()),
            )
            .mount(&server)
            .await;

        let engine = HttpDialogEngine::new(&config(&server.uri(), ApiGeneration::V2));
        let reply = engine.start_session("s-1", "Welcome").await.unwrap();
        assert_eq!(decode(&reply).unwrap(), vec![MessageUnit::plain("Welcome!")]);
    }

    #[tokio::test]
    async fn v2_recognize_text_reads_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot/BOT/botAlias/ALIAS/botLocale/en_US/session/s-1/text"))
            .and(body_json(json!({ "text": ".", "sessionState": {} })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [{ "contentType": "PlainText", "content": "Pardon?" }],
                "sessionId": "s-1"
            })))
            .mount(&server)
            .await;

        let engine = HttpDialogEngine::new(&config(&server.uri(), ApiGeneration::V2));
        let reply = engine.recognize_text("s-1", ".").await.unwrap();
        assert_eq!(decode(&reply).unwrap(), vec![MessageUnit::plain("Pardon?")]);
    }

    #[tokio::test]
    async fn v1_recognize_text_reads_legacy_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot/BOT/alias/ALIAS/user/s-9/text"))
            .and(body_json(json!({ "inputText": "hello" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messageFormat": "PlainText",
                "message": "Hi there"
            })))
            .mount(&server)
            .await;

        let engine = HttpDialogEngine::new(&config(&server.uri(), ApiGeneration::V1));
        let reply = engine.recognize_text("s-9", "hello").await.unwrap();
        assert_eq!(decode(&reply).unwrap(), vec![MessageUnit::plain("Hi there")]);
    }

    #[tokio::test]
    async fn error_status_is_an_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such bot"))
            .mount(&server)
            .await;

        let engine = HttpDialogEngine::new(&config(&server.uri(), ApiGeneration::V2));
        let err = engine.recognize_text("s-1", "hi").await.unwrap_err();
        match err {
            UpstreamCallError::Api(msg) => {
                assert!(msg.starts_with("404"), "{}", msg);
                assert!(msg.ends_with("no such bot"), "{}", msg);
            }
            other => panic!("expected api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_body_is_an_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let engine = HttpDialogEngine::new(&config(&server.uri(), ApiGeneration::V2));
        let reply = engine.start_session("s-2", "Welcome").await.unwrap();
        assert!(decode(&reply).unwrap().is_empty());
    }

    #[tokio::test]
    async fn non_object_body_is_unreadable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let engine = HttpDialogEngine::new(&config(&server.uri(), ApiGeneration::V1));
        let err = engine.recognize_text("s-1", "hi").await.unwrap_err();
        assert!(matches!(err, UpstreamCallError::Reply(_)));
    }
}
