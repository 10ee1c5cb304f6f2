//! Intent classifier client
//!
//! Sends the user's utterance (plus a bounded slice of conversation memory)
//! to a chat-completions style inference service and parses the structured
//! intent out of the reply. The model's output is untrusted: anything that
//! does not parse degrades to `general_chat` carrying the raw text, never
//! an error to the user.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ClassifierConfig;
use crate::error::{AppError, AppResult};

/// Business intents the classifier may emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    PurchaseEntry,
    SalesEntry,
    MixedTransaction,
    AddStock,
    UpdateStock,
    ReduceStock,
    CheckStock,
    LowStockCheck,
    AddCustomer,
    SupplierAdd,
    GetCustomers,
    GetCustomerProfile,
    CreateInvoice,
    AddService,
    UpdateService,
    GetServiceStatus,
    AddFinance,
    GetFinance,
    AddTask,
    GetTasks,
    ProfitReport,
    SalesReport,
    PurchaseReport,
    DailyReport,
    WeeklyReport,
    Suggestions,
    GeneralChat,
}

impl Intent {
    /// Map the classifier's intent string onto the closed set.
    /// Unknown or missing intents are general chat.
    pub fn parse(value: &str) -> Intent {
        match value.trim() {
            "purchase_entry" => Intent::PurchaseEntry,
            "sales_entry" => Intent::SalesEntry,
            "mixed_transaction" => Intent::MixedTransaction,
            "add_stock" | "add_inventory" => Intent::AddStock,
            "update_stock" | "update_inventory" => Intent::UpdateStock,
            "reduce_stock" => Intent::ReduceStock,
            "check_stock" | "get_inventory" => Intent::CheckStock,
            "low_stock_check" => Intent::LowStockCheck,
            "add_customer" | "auto_create_customer" => Intent::AddCustomer,
            "supplier_add" => Intent::SupplierAdd,
            "get_customers" => Intent::GetCustomers,
            "get_customer_profile" => Intent::GetCustomerProfile,
            "create_invoice" | "invoice_needed" => Intent::CreateInvoice,
            "add_service" => Intent::AddService,
            "update_service" => Intent::UpdateService,
            "get_service_status" => Intent::GetServiceStatus,
            "add_finance" => Intent::AddFinance,
            "get_finance" => Intent::GetFinance,
            "add_task" => Intent::AddTask,
            "get_tasks" => Intent::GetTasks,
            "profit_report" => Intent::ProfitReport,
            "sales_report" => Intent::SalesReport,
            "purchase_report" => Intent::PurchaseReport,
            "daily_report" => Intent::DailyReport,
            "weekly_report" => Intent::WeeklyReport,
            "suggestions" => Intent::Suggestions,
            _ => Intent::GeneralChat,
        }
    }
}

/// A classified utterance: the intent, its loose field payload, the
/// suggested user-facing reply, and whether a spoken reply was requested
#[derive(Debug, Clone)]
pub struct ClassifiedIntent {
    pub intent: Intent,
    pub data: Value,
    pub reply: String,
    pub voice_reply: bool,
}

impl ClassifiedIntent {
    /// The degraded result used whenever classification fails
    pub fn general_chat(reply: impl Into<String>) -> Self {
        Self {
            intent: Intent::GeneralChat,
            data: Value::Null,
            reply: reply.into(),
            voice_reply: false,
        }
    }
}

/// Wire shape of the classifier's JSON payload
#[derive(Debug, Deserialize)]
struct RawClassification {
    #[serde(default)]
    intent: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    reply: String,
    #[serde(default)]
    voice_reply: bool,
}

/// Chat-completions response envelope
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

const SYSTEM_PROMPT: &str = r#"You are a bilingual (Hindi/English) business assistant for a small shop.
Classify every user message into exactly one intent and extract its fields.

ALLOWED INTENTS:
purchase_entry, sales_entry, mixed_transaction, add_stock, update_stock,
reduce_stock, check_stock, low_stock_check, add_customer, supplier_add,
get_customers, get_customer_profile, create_invoice, add_service,
update_service, get_service_status, add_finance, get_finance, add_task,
get_tasks, profit_report, sales_report, purchase_report, daily_report,
weekly_report, suggestions, general_chat

Respond with JSON only:
{"intent": "", "data": {}, "reply": "", "voice_reply": false}

DATA RULES:
purchase_entry: {"supplier", "product", "quantity", "price_each", "notes"}
sales_entry: {"customer", "product", "quantity", "selling_price", "notes"}
mixed_transaction: {"purchases": [...], "sales": [...]} using the rules above
add_stock/update_stock: {"product", "quantity", "price"}
reduce_stock: {"product", "quantity"}
create_invoice: {"customer", "items": [{"product", "quantity", "price"}], "tax_rate", "discount", "paid"}
add_service: {"customer", "device", "problem", "technician"}

If the user asks for a spoken reply (voice/bolo/sunao/audio), set voice_reply true.
Keep replies short. Detect the user's language and reply in it."#;

/// Client for the intent classification service
#[derive(Clone)]
pub struct ClassifierClient {
    api_endpoint: String,
    api_key: String,
    model: String,
    http_client: Client,
}

impl ClassifierClient {
    /// Create a classifier client from configuration
    pub fn new(config: &ClassifierConfig) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_endpoint: config.api_endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            http_client,
        })
    }

    /// Classify an utterance. Never fails: transport and parse problems
    /// both degrade to a `general_chat` result.
    pub async fn classify(&self, text: &str, memory: Option<&str>) -> ClassifiedIntent {
        match self.request_classification(text, memory).await {
            Ok(raw) => Self::parse_response(&raw),
            Err(e) => {
                tracing::warn!("Classifier unavailable, degrading to general chat: {}", e);
                ClassifiedIntent::general_chat(
                    "Sorry, I could not understand that right now. / क्षमा करें, मैं अभी समझ नहीं सका।",
                )
            }
        }
    }

    async fn request_classification(
        &self,
        text: &str,
        memory: Option<&str>,
    ) -> AppResult<String> {
        let mut messages = vec![ChatMessage {
            role: "system".to_string(),
            content: SYSTEM_PROMPT.to_string(),
        }];
        if let Some(memory) = memory.filter(|m| !m.is_empty()) {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: format!("Conversation memory (last messages):\n{}", memory),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: text.to_string(),
        });

        let response = self
            .http_client
            .post(&self.api_endpoint)
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": self.model,
                "messages": messages,
                "temperature": 0.2,
            }))
            .send()
            .await
            .map_err(|e| AppError::Classifier(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Classifier(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Classifier(format!("failed to parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::Classifier("empty completion".to_string()))
    }

    /// Parse the model's raw text into a classification.
    ///
    /// Tries strict JSON first, then the outermost brace-delimited slice
    /// (models often wrap JSON in prose), and finally falls back to
    /// general chat with the raw text as the reply.
    pub fn parse_response(raw: &str) -> ClassifiedIntent {
        if let Some(parsed) = Self::try_parse(raw) {
            return parsed;
        }
        if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
            if end > start {
                if let Some(parsed) = Self::try_parse(&raw[start..=end]) {
                    return parsed;
                }
            }
        }
        ClassifiedIntent::general_chat(raw.to_string())
    }

    fn try_parse(candidate: &str) -> Option<ClassifiedIntent> {
        let raw: RawClassification = serde_json::from_str(candidate).ok()?;
        Some(ClassifiedIntent {
            intent: Intent::parse(&raw.intent),
            data: raw.data,
            reply: raw.reply,
            voice_reply: raw.voice_reply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed_response() {
        let raw = r#"{"intent": "purchase_entry", "data": {"product": "Pen", "quantity": 10}, "reply": "Done", "voice_reply": false}"#;
        let parsed = ClassifierClient::parse_response(raw);
        assert_eq!(parsed.intent, Intent::PurchaseEntry);
        assert_eq!(parsed.data["product"], "Pen");
        assert_eq!(parsed.reply, "Done");
        assert!(!parsed.voice_reply);
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let raw = r#"Here is the classification:
{"intent": "sales_entry", "data": {"product": "Pen"}, "reply": "ok", "voice_reply": true}
Let me know if you need anything else."#;
        let parsed = ClassifierClient::parse_response(raw);
        assert_eq!(parsed.intent, Intent::SalesEntry);
        assert!(parsed.voice_reply);
    }

    #[test]
    fn test_parse_garbage_degrades_to_general_chat() {
        let parsed = ClassifierClient::parse_response("I can't help with that");
        assert_eq!(parsed.intent, Intent::GeneralChat);
        assert_eq!(parsed.reply, "I can't help with that");
    }

    #[test]
    fn test_parse_unknown_intent_degrades_to_general_chat() {
        let raw = r#"{"intent": "launch_rocket", "data": {}, "reply": "ok", "voice_reply": false}"#;
        let parsed = ClassifierClient::parse_response(raw);
        assert_eq!(parsed.intent, Intent::GeneralChat);
    }

    #[test]
    fn test_parse_missing_fields_use_defaults() {
        let parsed = ClassifierClient::parse_response(r#"{"intent": "weekly_report"}"#);
        assert_eq!(parsed.intent, Intent::WeeklyReport);
        assert_eq!(parsed.reply, "");
        assert!(!parsed.voice_reply);
        assert!(parsed.data.is_null());
    }

    #[test]
    fn test_intent_aliases() {
        assert_eq!(Intent::parse("invoice_needed"), Intent::CreateInvoice);
        assert_eq!(Intent::parse("get_inventory"), Intent::CheckStock);
        assert_eq!(Intent::parse("auto_create_customer"), Intent::AddCustomer);
    }
}
