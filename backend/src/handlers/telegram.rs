//! HTTP handler for the Telegram webhook
//!
//! Receives updates, runs them through the orchestrator and sends the
//! replies back out. The handler always answers 200 so the transport does
//! not re-deliver updates we have already acted on; failures are reported
//! to the user in-channel instead.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;

use shared::{detect_language, Language};

use crate::external::telegram::{TelegramMessage, TelegramUpdate};
use crate::AppState;

/// Response for webhook processing
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
}

const GENERIC_FAILURE: &str =
    "⚠️ Something went wrong while saving that. Please try again. / कुछ गड़बड़ हो गई, कृपया फिर से कोशिश करें।";
const AUDIO_FAILURE: &str =
    "⚠️ I couldn't process that audio. Please try again. / मैं वह ऑडियो समझ नहीं पाया, कृपया फिर से कोशिश करें।";

/// Handle Telegram webhook updates
/// POST /webhook/telegram
pub async fn handle_telegram_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(update): Json<TelegramUpdate>,
) -> Result<Json<WebhookResponse>, (StatusCode, Json<WebhookResponse>)> {
    // Verify the secret token Telegram echoes back on every webhook call
    let token = headers
        .get("x-telegram-bot-api-secret-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if token != state.config.telegram.webhook_secret {
        tracing::warn!("Telegram webhook secret token mismatch");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(WebhookResponse {
                success: false,
                message: "Invalid secret token".to_string(),
            }),
        ));
    }

    let Some(message) = update.message else {
        return Ok(Json(WebhookResponse {
            success: true,
            message: "Ignored non-message update".to_string(),
        }));
    };

    if let Err(e) = process_message(&state, message).await {
        tracing::error!("Failed to process Telegram update: {}", e);
        // Still 200: the update was consumed, the user saw a failure reply
        return Ok(Json(WebhookResponse {
            success: false,
            message: format!("Processing error: {}", e),
        }));
    }

    Ok(Json(WebhookResponse {
        success: true,
        message: "Update processed".to_string(),
    }))
}

async fn process_message(state: &AppState, message: TelegramMessage) -> crate::error::AppResult<()> {
    let chat_id = message.chat.id;
    let user_id = message
        .from
        .as_ref()
        .map(|user| user.id)
        .unwrap_or(chat_id)
        .to_string();

    if let Some(voice) = &message.voice {
        return process_voice(state, chat_id, &user_id, &voice.file_id).await;
    }
    if let Some(text) = &message.text {
        return process_text(state, chat_id, &user_id, text).await;
    }
    Ok(())
}

/// Text pipeline: orchestrate, reply, attach documents, speak if asked
async fn process_text(
    state: &AppState,
    chat_id: i64,
    user_id: &str,
    text: &str,
) -> crate::error::AppResult<()> {
    let language = detect_language(text);

    let reply = match state.orchestrator.handle(user_id, text).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("Orchestration failed: {}", e);
            state.telegram.send_message(chat_id, GENERIC_FAILURE).await?;
            return Ok(());
        }
    };

    state
        .telegram
        .send_message(chat_id, &reply.text(language))
        .await?;

    for attachment in &reply.attachments {
        state
            .telegram
            .send_document(chat_id, attachment.bytes.clone(), &attachment.filename)
            .await?;
    }

    if reply.voice_reply {
        send_voice_reply(state, chat_id, &reply.text(language), language).await;
    }
    Ok(())
}

/// Voice pipeline: download, transcribe, then run the text pipeline
async fn process_voice(
    state: &AppState,
    chat_id: i64,
    user_id: &str,
    file_id: &str,
) -> crate::error::AppResult<()> {
    let audio = match state.telegram.download_file(file_id).await {
        Ok(audio) => audio,
        Err(e) => {
            tracing::error!("Voice download failed: {}", e);
            state.telegram.send_message(chat_id, AUDIO_FAILURE).await?;
            return Ok(());
        }
    };

    let (text, language) = match state.speech.transcribe_best(audio).await {
        Ok(transcript) => transcript,
        Err(e) => {
            tracing::warn!("Transcription failed: {}", e);
            state.telegram.send_message(chat_id, AUDIO_FAILURE).await?;
            return Ok(());
        }
    };

    state
        .telegram
        .send_message(chat_id, &format!("🗣 You said: {}", text))
        .await?;

    let reply = match state.orchestrator.handle(user_id, &text).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!("Orchestration failed: {}", e);
            state.telegram.send_message(chat_id, GENERIC_FAILURE).await?;
            return Ok(());
        }
    };

    state
        .telegram
        .send_message(chat_id, &reply.text(language))
        .await?;

    for attachment in &reply.attachments {
        state
            .telegram
            .send_document(chat_id, attachment.bytes.clone(), &attachment.filename)
            .await?;
    }

    if reply.voice_reply {
        send_voice_reply(state, chat_id, &reply.text(language), language).await;
    }
    Ok(())
}

/// Best-effort spoken reply; the text already went out, so a synthesis
/// failure only produces a targeted notice
async fn send_voice_reply(state: &AppState, chat_id: i64, text: &str, language: Language) {
    match state.speech.synthesize(text, language).await {
        Ok(audio) => {
            if let Err(e) = state.telegram.send_audio(chat_id, audio, "reply.mp3").await {
                tracing::warn!("Could not send voice reply: {}", e);
            }
        }
        Err(e) => {
            tracing::warn!("Voice synthesis failed: {}", e);
            let _ = state.telegram.send_message(chat_id, AUDIO_FAILURE).await;
        }
    }
}
