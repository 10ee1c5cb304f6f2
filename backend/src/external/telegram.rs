//! Telegram messaging transport
//!
//! Webhook update types and the Bot API client used for replies. Only the
//! surface the assistant needs: text messages, voice notes, audio replies
//! and document attachments.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::config::TelegramConfig;
use crate::error::{AppError, AppResult};

const API_BASE: &str = "https://api.telegram.org";

/// Inbound webhook update
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
}

/// A message within an update
#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
    pub voice: Option<TelegramVoice>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

/// A voice note attached to a message
#[derive(Debug, Deserialize)]
pub struct TelegramVoice {
    pub file_id: String,
    #[serde(default)]
    pub duration: i64,
}

/// Response envelope for getFile
#[derive(Debug, Deserialize)]
struct FileResponse {
    ok: bool,
    result: Option<FileInfo>,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    file_path: Option<String>,
}

/// Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    token: String,
    http_client: Client,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            token: config.token.clone(),
            http_client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    /// Send a plain text reply
    pub async fn send_message(&self, chat_id: i64, text: &str) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.method_url("sendMessage"))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("sendMessage failed: {}", e)))?;

        Self::check(response, "sendMessage").await
    }

    /// Send a synthesized audio reply
    pub async fn send_audio(&self, chat_id: i64, audio: Vec<u8>, filename: &str) -> AppResult<()> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("audio", Part::bytes(audio).file_name(filename.to_string()));

        let response = self
            .http_client
            .post(self.method_url("sendAudio"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("sendAudio failed: {}", e)))?;

        Self::check(response, "sendAudio").await
    }

    /// Send a document attachment (e.g. an invoice PDF)
    pub async fn send_document(
        &self,
        chat_id: i64,
        document: Vec<u8>,
        filename: &str,
    ) -> AppResult<()> {
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part(
                "document",
                Part::bytes(document).file_name(filename.to_string()),
            );

        let response = self
            .http_client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("sendDocument failed: {}", e)))?;

        Self::check(response, "sendDocument").await
    }

    /// Download the bytes of an uploaded file (voice notes)
    pub async fn download_file(&self, file_id: &str) -> AppResult<Vec<u8>> {
        let response = self
            .http_client
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("getFile failed: {}", e)))?;

        let file: FileResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transport(format!("getFile parse failed: {}", e)))?;

        let file_path = file
            .result
            .filter(|_| file.ok)
            .and_then(|f| f.file_path)
            .ok_or_else(|| AppError::Transport("getFile returned no path".to_string()))?;

        let url = format!("{}/file/bot{}/{}", API_BASE, self.token, file_path);
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("file download failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "file download returned {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Transport(format!("file download read failed: {}", e)))?;
        Ok(bytes.to_vec())
    }

    async fn check(response: reqwest::Response, method: &str) -> AppResult<()> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "{} returned {}: {}",
                method, status, body
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_deserialization_text() {
        let json = r#"{
            "update_id": 1001,
            "message": {
                "message_id": 7,
                "from": {"id": 42, "first_name": "Rahul"},
                "chat": {"id": 42},
                "text": "add 10 pens at 5"
            }
        }"#;
        let update: TelegramUpdate = serde_json::from_str(json).unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.text.as_deref(), Some("add 10 pens at 5"));
        assert!(message.voice.is_none());
    }

    #[test]
    fn test_update_deserialization_voice() {
        let json = r#"{
            "update_id": 1002,
            "message": {
                "message_id": 8,
                "from": {"id": 42, "first_name": "Rahul"},
                "chat": {"id": 42},
                "voice": {"file_id": "voice-abc", "duration": 3}
            }
        }"#;
        let update: TelegramUpdate = serde_json::from_str(json).unwrap();
        let message = update.message.unwrap();
        assert!(message.text.is_none());
        assert_eq!(message.voice.unwrap().file_id, "voice-abc");
    }
}
