//! Transaction orchestrator
//!
//! Entry point for a classified utterance. Dispatches each intent to its
//! effect sequence, runs composite utterances as ordered batches (all
//! purchases before all sales), and aggregates every sub-operation's
//! explicit success or failure into one reply. Failure of one sub-operation
//! never aborts the rest: the policy is best-effort with full reporting,
//! not all-or-nothing.
//!
//! Messages from the same conversation are processed one at a time; the
//! per-user lock here enforces that.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use shared::{format_money, Language, MemoryRole};

use crate::error::AppResult;
use crate::external::classifier::{ClassifiedIntent, ClassifierClient, Intent};
use crate::external::renderer::RendererClient;
use crate::services::directory::{EntityDirectory, UpsertInput};
use crate::services::finance::{FinanceService, TaskService};
use crate::services::invoice::InvoiceService;
use crate::services::jobs::ServiceJobService;
use crate::services::ledger::{InventoryLedger, LOW_STOCK_THRESHOLD};
use crate::services::memory::{ConversationMemory, MEMORY_WINDOW};
use crate::services::normalizer::{self, PurchaseFields, SaleFields};
use crate::services::recorder::{IdGenerator, TransactionRecorder};
use crate::services::reporting::ReportingAggregator;
use crate::store::StoreHandle;

/// One sub-operation's outcome, bilingual
#[derive(Debug, Clone)]
pub struct OutcomeLine {
    pub success: bool,
    pub message: String,
    pub message_hi: String,
}

impl OutcomeLine {
    pub fn ok(message: impl Into<String>, message_hi: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            message_hi: message_hi.into(),
        }
    }

    pub fn fail(message: impl Into<String>, message_hi: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            message_hi: message_hi.into(),
        }
    }

    /// Same text in both languages (reports, listings)
    pub fn plain(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            success: true,
            message_hi: message.clone(),
            message,
        }
    }
}

/// A document produced alongside the reply
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Aggregate reply for one utterance
#[derive(Debug, Clone, Default)]
pub struct AssistantReply {
    pub lines: Vec<OutcomeLine>,
    pub attachments: Vec<Attachment>,
    pub voice_reply: bool,
}

impl AssistantReply {
    pub fn from_line(line: OutcomeLine) -> Self {
        Self {
            lines: vec![line],
            ..Default::default()
        }
    }

    /// The reply text in the requested language
    pub fn text(&self, language: Language) -> String {
        self.lines
            .iter()
            .map(|line| match language {
                Language::Hindi => line.message_hi.as_str(),
                Language::English => line.message.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// True when every sub-operation succeeded
    pub fn fully_succeeded(&self) -> bool {
        self.lines.iter().all(|line| line.success)
    }
}

/// Orchestrates intent dispatch over all business services
#[derive(Clone)]
pub struct TransactionOrchestrator {
    classifier: ClassifierClient,
    renderer: Option<RendererClient>,
    ledger: InventoryLedger,
    recorder: TransactionRecorder,
    directory: EntityDirectory,
    invoices: InvoiceService,
    jobs: ServiceJobService,
    finance: FinanceService,
    tasks: TaskService,
    memory: ConversationMemory,
    reporting: ReportingAggregator,
    conversation_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl TransactionOrchestrator {
    /// Wire every service onto one store handle
    pub fn new(
        store: StoreHandle,
        classifier: ClassifierClient,
        renderer: Option<RendererClient>,
    ) -> Self {
        let ids = Arc::new(IdGenerator::new());
        Self {
            classifier,
            renderer,
            ledger: InventoryLedger::new(store.clone()),
            recorder: TransactionRecorder::new(store.clone(), ids.clone()),
            directory: EntityDirectory::new(store.clone()),
            invoices: InvoiceService::new(store.clone(), ids.clone()),
            jobs: ServiceJobService::new(store.clone(), ids),
            finance: FinanceService::new(store.clone()),
            tasks: TaskService::new(store.clone()),
            memory: ConversationMemory::new(store.clone()),
            reporting: ReportingAggregator::new(store),
            conversation_locks: Arc::new(DashMap::new()),
        }
    }

    fn conversation_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.conversation_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Process one inbound message end to end: load memory, classify,
    /// apply, remember both turns, reply. One message at a time per
    /// conversation.
    pub async fn handle(&self, user_id: &str, text: &str) -> AppResult<AssistantReply> {
        let lock = self.conversation_lock(user_id);
        let _guard = lock.lock().await;

        // Memory is context, not state: a store hiccup here must not block
        // the message itself.
        let context = match self.memory.recent(user_id, MEMORY_WINDOW).await {
            Ok(entries) if !entries.is_empty() => Some(ConversationMemory::as_context(&entries)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Could not load conversation memory: {}", e);
                None
            }
        };

        let classified = self.classifier.classify(text, context.as_deref()).await;
        tracing::info!(intent = ?classified.intent, "classified utterance");

        let reply = self.apply(&classified).await?;

        let reply_text = reply.text(shared::detect_language(text));
        if let Err(e) = self.memory.append(user_id, MemoryRole::User, text).await {
            tracing::warn!("Could not store user turn: {}", e);
        }
        if let Err(e) = self
            .memory
            .append(user_id, MemoryRole::Assistant, &reply_text)
            .await
        {
            tracing::warn!("Could not store assistant turn: {}", e);
        }

        Ok(reply)
    }

    /// Apply a classified intent to business state and compose the reply.
    /// Public so the effect sequences can be exercised without a live
    /// classifier.
    pub async fn apply(&self, classified: &ClassifiedIntent) -> AppResult<AssistantReply> {
        let data = &classified.data;
        let mut reply = match classified.intent {
            Intent::PurchaseEntry => {
                let fields = normalizer::purchase_fields(data);
                AssistantReply::from_line(self.purchase_effect(&fields).await)
            }
            Intent::SalesEntry => {
                let fields = normalizer::sale_fields(data);
                AssistantReply::from_line(self.sale_effect(&fields).await)
            }
            Intent::MixedTransaction => {
                let fields = normalizer::mixed_fields(data);
                let mut lines = Vec::new();
                // Purchases always apply before sales, whatever order the
                // utterance used: a same-utterance sale may depend on the
                // stock its purchase just supplied.
                for purchase in &fields.purchases {
                    lines.push(self.purchase_effect(purchase).await);
                }
                for sale in &fields.sales {
                    lines.push(self.sale_effect(sale).await);
                }
                if lines.is_empty() {
                    lines.push(OutcomeLine::fail(
                        "I could not find any purchases or sales in that message.",
                        "मुझे उस संदेश में कोई ख़रीद या बिक्री नहीं मिली।",
                    ));
                }
                AssistantReply {
                    lines,
                    ..Default::default()
                }
            }
            Intent::AddStock => {
                let fields = normalizer::stock_fields(data);
                if fields.product.is_empty() {
                    AssistantReply::from_line(Self::missing_product())
                } else {
                    // An utterance without a price must not clobber the
                    // stored purchase price
                    let item = self
                        .ledger
                        .increase(&fields.product, fields.quantity, normalizer::optional_price(data))
                        .await?;
                    AssistantReply::from_line(OutcomeLine::ok(
                        format!(
                            "✔ Stock updated: {} now at {} pcs.",
                            item.product_name, item.quantity
                        ),
                        format!(
                            "✔ स्टॉक अपडेट: {} अब {} पीस।",
                            item.product_name, item.quantity
                        ),
                    ))
                }
            }
            Intent::UpdateStock => {
                let fields = normalizer::stock_fields(data);
                if fields.product.is_empty() {
                    AssistantReply::from_line(Self::missing_product())
                } else {
                    let item = self
                        .ledger
                        .set_stock(&fields.product, fields.quantity, fields.price)
                        .await?;
                    AssistantReply::from_line(OutcomeLine::ok(
                        format!(
                            "✔ {} set to {} pcs at {}.",
                            item.product_name,
                            item.quantity,
                            format_money(item.last_price)
                        ),
                        format!(
                            "✔ {} अब {} पीस, दाम {}।",
                            item.product_name,
                            item.quantity,
                            format_money(item.last_price)
                        ),
                    ))
                }
            }
            Intent::ReduceStock => {
                let fields = normalizer::stock_fields(data);
                if fields.product.is_empty() {
                    AssistantReply::from_line(Self::missing_product())
                } else {
                    match self.ledger.decrease(&fields.product, fields.quantity).await? {
                        Some(item) => AssistantReply::from_line(OutcomeLine::ok(
                            format!(
                                "✔ Stock reduced: {} now at {} pcs.",
                                item.product_name, item.quantity
                            ),
                            format!(
                                "✔ स्टॉक घटाया: {} अब {} पीस।",
                                item.product_name, item.quantity
                            ),
                        )),
                        None => AssistantReply::from_line(OutcomeLine::fail(
                            format!("{} is not in stock.", fields.product),
                            format!("{} स्टॉक में नहीं है।", fields.product),
                        )),
                    }
                }
            }
            Intent::CheckStock => {
                let items = self.ledger.get_all().await?;
                if items.is_empty() {
                    AssistantReply::from_line(OutcomeLine::ok(
                        "Inventory is empty.",
                        "स्टॉक खाली है।",
                    ))
                } else {
                    let listing = items
                        .iter()
                        .map(|item| {
                            format!(
                                "{} — {} pcs — {}",
                                item.product_name,
                                item.quantity,
                                format_money(item.last_price)
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                    AssistantReply::from_line(OutcomeLine::plain(listing))
                }
            }
            Intent::LowStockCheck => {
                let low = self
                    .ledger
                    .low_stock(Decimal::from(LOW_STOCK_THRESHOLD))
                    .await?;
                if low.is_empty() {
                    AssistantReply::from_line(OutcomeLine::ok(
                        "All stock levels are OK 👍",
                        "सारा स्टॉक ठीक है 👍",
                    ))
                } else {
                    let listing = low
                        .iter()
                        .map(|item| format!("{}: {} pcs left", item.product_name, item.quantity))
                        .collect::<Vec<_>>()
                        .join("\n");
                    AssistantReply::from_line(OutcomeLine::plain(format!(
                        "⚠️ Low Stock:\n{}",
                        listing
                    )))
                }
            }
            Intent::AddCustomer | Intent::SupplierAdd => {
                let mut fields = normalizer::customer_fields(data);
                if fields.name.is_empty() {
                    AssistantReply::from_line(OutcomeLine::fail(
                        "I could not tell whose profile to create.",
                        "समझ नहीं आया किसका प्रोफ़ाइल बनाना है।",
                    ))
                } else {
                    if classified.intent == Intent::SupplierAdd {
                        fields.tags = if fields.tags.is_empty() {
                            "supplier".to_string()
                        } else {
                            format!("{},supplier", fields.tags)
                        };
                    }
                    self.directory
                        .upsert(
                            &fields.name,
                            UpsertInput {
                                phone: fields.phone.clone(),
                                email: fields.email.clone(),
                                notes: fields.notes.clone(),
                                tags: fields.tags.clone(),
                            },
                        )
                        .await?;
                    self.directory.add_contact(&fields).await?;
                    AssistantReply::from_line(OutcomeLine::ok(
                        format!("✔ {} added.", fields.name),
                        format!("✔ {} जोड़ा गया।", fields.name),
                    ))
                }
            }
            Intent::GetCustomers => {
                let contacts = self.directory.list_contacts().await?;
                if contacts.is_empty() {
                    AssistantReply::from_line(OutcomeLine::ok(
                        "No customers found.",
                        "कोई ग्राहक नहीं मिला।",
                    ))
                } else {
                    let listing = contacts
                        .iter()
                        .map(|c| format!("{} - {} - {} - {}", c.name, c.phone, c.email, c.company))
                        .collect::<Vec<_>>()
                        .join("\n");
                    AssistantReply::from_line(OutcomeLine::plain(listing))
                }
            }
            Intent::GetCustomerProfile => {
                let name = normalizer::customer_name_field(data);
                match self.directory.get_profile(&name).await? {
                    Some(profile) => {
                        let last_visit = profile
                            .last_visit
                            .map(|d| d.to_string())
                            .unwrap_or_else(|| "-".to_string());
                        AssistantReply::from_line(OutcomeLine::plain(format!(
                            "📇 Customer Profile\nName: {}\nPhone: {}\nEmail: {}\nLast Visit: {}\nTotal Purchases: {}\nTotal Spent: {}\nTotal Profit: {}\nNotes: {}\nTags: {}",
                            profile.name,
                            profile.phone,
                            profile.email,
                            last_visit,
                            profile.total_purchases,
                            format_money(profile.total_spent),
                            format_money(profile.total_profit),
                            profile.notes,
                            profile.tags
                        )))
                    }
                    None => AssistantReply::from_line(OutcomeLine::fail(
                        "Customer not found.",
                        "ग्राहक नहीं मिला।",
                    )),
                }
            }
            Intent::CreateInvoice => {
                let fields = normalizer::invoice_fields(data);
                if fields.items.is_empty() {
                    AssistantReply::from_line(OutcomeLine::fail(
                        "I could not find any items for the invoice.",
                        "बिल के लिए कोई आइटम नहीं मिला।",
                    ))
                } else {
                    let invoice = self.invoices.create(&fields).await?;
                    let mut reply = AssistantReply::from_line(OutcomeLine::ok(
                        format!(
                            "🧾 Invoice {} created for {} ({}).",
                            invoice.id,
                            invoice.customer,
                            format_money(invoice.grand_total)
                        ),
                        format!(
                            "🧾 {} के लिए बिल {} बना ({})।",
                            invoice.customer,
                            invoice.id,
                            format_money(invoice.grand_total)
                        ),
                    ));
                    if let Some(renderer) = &self.renderer {
                        match renderer.render_invoice(&invoice).await {
                            Ok(bytes) => reply.attachments.push(Attachment {
                                filename: format!("invoice_{}.pdf", invoice.id),
                                bytes,
                            }),
                            Err(e) => {
                                tracing::warn!("Invoice PDF rendering failed: {}", e);
                                reply.lines.push(OutcomeLine::fail(
                                    "The invoice is saved but the PDF could not be generated.",
                                    "बिल सेव हो गया पर PDF नहीं बन पाया।",
                                ));
                            }
                        }
                    }
                    reply
                }
            }
            Intent::AddService => {
                let fields = normalizer::service_fields(data);
                let job = self.jobs.create(&fields).await?;
                AssistantReply::from_line(OutcomeLine::ok(
                    format!(
                        "🛠 Service Job Created\nID: {}\nCustomer: {}\nDevice: {}\nProblem: {}",
                        job.id, job.customer, job.device, job.problem
                    ),
                    format!(
                        "🛠 सर्विस जॉब बना\nID: {}\nग्राहक: {}\nडिवाइस: {}\nसमस्या: {}",
                        job.id, job.customer, job.device, job.problem
                    ),
                ))
            }
            Intent::UpdateService => {
                let fields = normalizer::service_update_fields(data);
                match self.jobs.update(&fields).await? {
                    Some(job) => AssistantReply::from_line(OutcomeLine::ok(
                        format!("✔ Job {} is now {}.", job.id, job.status.as_str()),
                        format!("✔ जॉब {} अब {} है।", job.id, job.status.as_str()),
                    )),
                    None => AssistantReply::from_line(OutcomeLine::fail(
                        "No such job found.",
                        "ऐसा कोई जॉब नहीं मिला।",
                    )),
                }
            }
            Intent::GetServiceStatus => {
                let job_id = normalizer::service_id_field(data);
                match self.jobs.get(&job_id).await? {
                    Some(job) => AssistantReply::from_line(OutcomeLine::plain(format!(
                        "📝 Service Status\nID: {}\nCustomer: {}\nDevice: {}\nProblem: {}\nStatus: {}\nTechnician: {}\nCost: {}",
                        job.id,
                        job.customer,
                        job.device,
                        job.problem,
                        job.status.as_str(),
                        job.technician,
                        format_money(job.cost)
                    ))),
                    None => AssistantReply::from_line(OutcomeLine::fail(
                        "No such job found.",
                        "ऐसा कोई जॉब नहीं मिला।",
                    )),
                }
            }
            Intent::AddFinance => {
                let fields = normalizer::finance_fields(data);
                self.finance.add(&fields).await?;
                AssistantReply::from_line(OutcomeLine::ok(
                    "✔ Finance record added.",
                    "✔ वित्त रिकॉर्ड जोड़ा गया।",
                ))
            }
            Intent::GetFinance => {
                let records = self.finance.list().await?;
                if records.is_empty() {
                    AssistantReply::from_line(OutcomeLine::ok(
                        "No finance records found.",
                        "कोई वित्त रिकॉर्ड नहीं मिला।",
                    ))
                } else {
                    let listing = records
                        .iter()
                        .map(|r| {
                            format!(
                                "{} - {} - {} - {}",
                                r.customer,
                                format_money(r.amount),
                                r.entry_type,
                                r.date
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                    AssistantReply::from_line(OutcomeLine::plain(listing))
                }
            }
            Intent::AddTask => {
                let fields = normalizer::task_fields(data);
                self.tasks.add(&fields).await?;
                AssistantReply::from_line(OutcomeLine::ok(
                    "✔ Task added.",
                    "✔ कार्य जोड़ा गया।",
                ))
            }
            Intent::GetTasks => {
                let tasks = self.tasks.list().await?;
                if tasks.is_empty() {
                    AssistantReply::from_line(OutcomeLine::ok(
                        "No tasks found.",
                        "कोई कार्य नहीं मिला।",
                    ))
                } else {
                    let listing = tasks
                        .iter()
                        .map(|t| format!("{} | {} | {}", t.name, t.assigned_to, t.status))
                        .collect::<Vec<_>>()
                        .join("\n");
                    AssistantReply::from_line(OutcomeLine::plain(listing))
                }
            }
            Intent::ProfitReport => {
                let profit = self.reporting.total_profit().await?;
                AssistantReply::from_line(OutcomeLine::plain(format!(
                    "💰 Total Profit So Far: {}",
                    format_money(profit)
                )))
            }
            Intent::SalesReport => {
                let today = self.reporting.today_summary().await?;
                let top = self.reporting.top_selling(3).await?;
                let mut text = format!("📊 Sales today: {}", format_money(today.sales));
                if !top.is_empty() {
                    text.push_str("\nBest sellers:");
                    for (product, quantity) in &top {
                        text.push_str(&format!("\n• {}: {} sold", product, quantity));
                    }
                }
                AssistantReply::from_line(OutcomeLine::plain(text))
            }
            Intent::PurchaseReport => {
                let today = self.reporting.today_summary().await?;
                AssistantReply::from_line(OutcomeLine::plain(format!(
                    "📦 Purchases today: {}",
                    format_money(today.purchases)
                )))
            }
            Intent::DailyReport => {
                let today = self.reporting.today_summary().await?;
                AssistantReply::from_line(OutcomeLine::plain(format!(
                    "📅 Today's Summary:\n• Purchases: {}\n• Sales: {}\n• Profit Today: {}",
                    format_money(today.purchases),
                    format_money(today.sales),
                    format_money(today.profit)
                )))
            }
            Intent::WeeklyReport => {
                let report = self.reporting.weekly_report().await?;
                AssistantReply::from_line(OutcomeLine::plain(report))
            }
            Intent::Suggestions => {
                let digest = self.reporting.suggestions().await?;
                AssistantReply::from_line(OutcomeLine::plain(format!(
                    "🔎 Suggestions:\n{}",
                    digest
                )))
            }
            Intent::GeneralChat => {
                let reply = if classified.reply.is_empty() {
                    OutcomeLine::ok("Okay.", "ठीक है।")
                } else {
                    OutcomeLine::plain(classified.reply.clone())
                };
                AssistantReply::from_line(reply)
            }
        };

        reply.voice_reply = classified.voice_reply;
        Ok(reply)
    }

    fn missing_product() -> OutcomeLine {
        OutcomeLine::fail(
            "I could not tell which product you meant.",
            "समझ नहीं आया कौन सा प्रोडक्ट है।",
        )
    }

    /// Purchase effect sequence: stock up, then record. Errors become an
    /// explicit failure line so composite utterances keep going.
    async fn purchase_effect(&self, fields: &PurchaseFields) -> OutcomeLine {
        if fields.product.is_empty() {
            return Self::missing_product();
        }
        let result: AppResult<OutcomeLine> = async {
            self.ledger
                .increase(&fields.product, fields.quantity, Some(fields.unit_price))
                .await?;
            let record = self.recorder.record_purchase(fields).await?;
            Ok(OutcomeLine::ok(
                format!(
                    "✔ Purchased {} {} from {}. Total {}.",
                    record.quantity,
                    record.product_name,
                    record.supplier_name,
                    format_money(record.total)
                ),
                format!(
                    "✔ {} से {} {} ख़रीदा। कुल {}।",
                    record.supplier_name,
                    record.quantity,
                    record.product_name,
                    format_money(record.total)
                ),
            ))
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!("Purchase of {} failed: {}", fields.product, e);
            OutcomeLine::fail(
                format!("Could not record the purchase of {}.", fields.product),
                format!("{} की ख़रीद दर्ज नहीं हो पाई।", fields.product),
            )
        })
    }

    /// Sale effect sequence: capture the cost basis, move stock, record the
    /// sale, then fold the amount into the customer's CRM profile. A sale
    /// of an unstocked product still proceeds — the cost basis is zero and
    /// stock is neither created nor driven negative.
    async fn sale_effect(&self, fields: &SaleFields) -> OutcomeLine {
        if fields.product.is_empty() {
            return Self::missing_product();
        }
        let result: AppResult<OutcomeLine> = async {
            let purchase_price = self.ledger.lookup_price(&fields.product).await?;
            if self
                .ledger
                .decrease(&fields.product, fields.quantity)
                .await?
                .is_none()
            {
                tracing::warn!("Sold {} with no stock on hand", fields.product);
            }
            let record = self.recorder.record_sale(fields, purchase_price).await?;

            // Customers are auto-created on first sale; the upsert makes
            // that linkage explicit before the counters move.
            self.directory
                .upsert(&fields.customer, UpsertInput::default())
                .await?;
            self.directory
                .record_transaction(&fields.customer, record.total, record.profit)
                .await?;

            Ok(OutcomeLine::ok(
                format!(
                    "✔ Sold {} {} to {}. Profit {}.",
                    record.quantity,
                    record.product_name,
                    record.customer_name,
                    format_money(record.profit)
                ),
                format!(
                    "✔ {} को {} {} बेचा। मुनाफ़ा {}।",
                    record.customer_name,
                    record.quantity,
                    record.product_name,
                    format_money(record.profit)
                ),
            ))
        }
        .await;

        result.unwrap_or_else(|e| {
            tracing::error!("Sale of {} failed: {}", fields.product, e);
            OutcomeLine::fail(
                format!("Could not sell {}.", fields.product),
                format!("{} बेचा नहीं जा सका।", fields.product),
            )
        })
    }
}
