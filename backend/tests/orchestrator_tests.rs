//! End-to-end orchestrator tests over the in-memory store
//!
//! These exercise the public surface the webhook drives: classified
//! intents applied to business state, composite best-effort semantics, and
//! the degraded path when the classifier is unreachable.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use vyapar_backend::config::ClassifierConfig;
use vyapar_backend::external::classifier::{ClassifiedIntent, ClassifierClient, Intent};
use vyapar_backend::services::TransactionOrchestrator;
use vyapar_backend::store::{schema, MemoryStore, TabularStore};

fn offline_classifier() -> ClassifierClient {
    // Nothing listens on the discard port; classification degrades
    ClassifierClient::new(&ClassifierConfig {
        api_endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
        api_key: String::new(),
        model: "test".to_string(),
        timeout_secs: 1,
    })
    .expect("classifier client")
}

fn classified(intent: Intent, data: serde_json::Value) -> ClassifiedIntent {
    ClassifiedIntent {
        intent,
        data,
        reply: String::new(),
        voice_reply: false,
    }
}

#[tokio::test]
async fn mixed_transaction_applies_purchases_then_sales() {
    let store = Arc::new(MemoryStore::with_schema().await);
    let orchestrator = TransactionOrchestrator::new(store.clone(), offline_classifier(), None);

    let reply = orchestrator
        .apply(&classified(
            Intent::MixedTransaction,
            json!({
                "purchases": [
                    { "supplier": "Sharma Traders", "product": "Pen", "quantity": 10, "price_each": 5 },
                    { "supplier": "Gupta & Sons", "product": "Notebook", "quantity": 20, "price_each": 30 }
                ],
                "sales": [
                    { "customer": "Rahul", "product": "Pen", "quantity": 3, "selling_price": 8 },
                    { "customer": "Priya", "product": "Notebook", "quantity": 5, "selling_price": 45 }
                ]
            }),
        ))
        .await
        .expect("apply");

    assert!(reply.fully_succeeded());
    assert_eq!(reply.lines.len(), 4);

    let inventory = store.read_all(schema::INVENTORY).await.expect("inventory");
    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory[0].get("Product"), "Pen");
    assert_eq!(inventory[0].get("Quantity"), "7");
    assert_eq!(inventory[1].get("Product"), "Notebook");
    assert_eq!(inventory[1].get("Quantity"), "15");

    let sales = store.read_all(schema::SALES).await.expect("sales");
    assert_eq!(sales.len(), 2);
    // (8-5)*3 and (45-30)*5
    assert_eq!(sales[0].get("Profit"), "9");
    assert_eq!(sales[1].get("Profit"), "75");
}

#[tokio::test]
async fn composite_keeps_going_after_a_failing_sub_operation() {
    // A store with no Sales collection: every record_sale append fails,
    // purchases still work.
    let store = Arc::new(MemoryStore::new());
    for (collection, header) in schema::ALL {
        if *collection != schema::SALES {
            store
                .create_collection(collection, header)
                .await
                .expect("create");
        }
    }
    let orchestrator = TransactionOrchestrator::new(store.clone(), offline_classifier(), None);

    let reply = orchestrator
        .apply(&classified(
            Intent::MixedTransaction,
            json!({
                "purchases": [{ "supplier": "Sharma", "product": "Pen", "quantity": 10, "price_each": 5 }],
                "sales": [{ "customer": "Rahul", "product": "Pen", "quantity": 3, "selling_price": 8 }]
            }),
        ))
        .await
        .expect("apply");

    // Both sub-operations are reported: one success, one explicit failure
    assert_eq!(reply.lines.len(), 2);
    assert!(reply.lines[0].success);
    assert!(!reply.lines[1].success);
    assert!(reply.lines[1].message.contains("Could not sell Pen"));
    assert!(!reply.fully_succeeded());

    // The purchase side was still applied
    let purchases = store.read_all(schema::PURCHASE).await.expect("purchases");
    assert_eq!(purchases.len(), 1);
}

#[tokio::test]
async fn repeated_sales_never_drive_stock_negative() {
    let store = Arc::new(MemoryStore::with_schema().await);
    let orchestrator = TransactionOrchestrator::new(store.clone(), offline_classifier(), None);

    orchestrator
        .apply(&classified(
            Intent::AddStock,
            json!({ "product": "Pen", "quantity": 5, "price": 5 }),
        ))
        .await
        .expect("stock");

    for _ in 0..4 {
        orchestrator
            .apply(&classified(
                Intent::SalesEntry,
                json!({ "customer": "Rahul", "product": "Pen", "quantity": 2, "selling_price": 8 }),
            ))
            .await
            .expect("sale");
    }

    let inventory = store.read_all(schema::INVENTORY).await.expect("inventory");
    let quantity: Decimal = inventory[0].get("Quantity").parse().expect("decimal");
    assert_eq!(quantity, Decimal::ZERO);

    // Every sale was still recorded
    let sales = store.read_all(schema::SALES).await.expect("sales");
    assert_eq!(sales.len(), 4);
}

#[tokio::test]
async fn record_ids_stay_unique_across_rapid_messages() {
    let store = Arc::new(MemoryStore::with_schema().await);
    let orchestrator = TransactionOrchestrator::new(store.clone(), offline_classifier(), None);

    for _ in 0..50 {
        orchestrator
            .apply(&classified(
                Intent::PurchaseEntry,
                json!({ "supplier": "Sharma", "product": "Pen", "quantity": 1, "price_each": 5 }),
            ))
            .await
            .expect("purchase");
    }

    let purchases = store.read_all(schema::PURCHASE).await.expect("purchases");
    let mut ids: Vec<String> = purchases
        .iter()
        .map(|record| record.get("PurchaseID").to_string())
        .collect();
    let before = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), before, "purchase ids collided");
}

#[tokio::test]
async fn unreachable_classifier_degrades_to_general_chat() {
    let store = Arc::new(MemoryStore::with_schema().await);
    let orchestrator = TransactionOrchestrator::new(store.clone(), offline_classifier(), None);

    let reply = orchestrator
        .handle("42", "add 10 pens at 5")
        .await
        .expect("handle");

    // The degraded reply apologizes instead of erroring out
    assert!(reply
        .text(shared::Language::English)
        .contains("could not understand"));

    // Nothing was written to business state
    assert!(store.read_all(schema::INVENTORY).await.expect("read").is_empty());

    // Both turns were remembered
    let memory = store.read_all(schema::MEMORY).await.expect("memory");
    assert_eq!(memory.len(), 2);
    assert_eq!(memory[0].get("Role"), "user");
    assert_eq!(memory[1].get("Role"), "assistant");
}

#[tokio::test]
async fn conversation_memory_feeds_back_bounded_context() {
    let store = Arc::new(MemoryStore::with_schema().await);
    let orchestrator = TransactionOrchestrator::new(store.clone(), offline_classifier(), None);

    for i in 0..5 {
        orchestrator
            .handle("42", &format!("message {}", i))
            .await
            .expect("handle");
    }

    // 5 user turns + 5 assistant turns, all persisted for this user
    let memory = store.read_all(schema::MEMORY).await.expect("memory");
    assert_eq!(memory.len(), 10);
    assert!(memory.iter().all(|record| record.get("UserID") == "42"));
}
