// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduled jobs driven against the test harness.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tally_agent::OpsForwarder;
use tally_config::model::MonitorConfig;
use tally_core::types::{
    AdapterType, HealthStatus, InventoryLevel, Product, ProductId, ProductListing, SaleId,
    SaleLine, Seller, SellerId, SessionId,
};
use tally_core::{ChannelAdapter, LedgerStore, PluginAdapter, TallyError};
use tally_report::ReportingEngine;
use tally_storage::SqliteLedger;
use tally_cron::{Job, MonitorJob, ReminderJob, SessionSweepJob, UptimeMonitor, WeeklyDigestJob};
use tally_test_utils::TestHarness;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

const GROUP: i64 = -1001;
const OPS: i64 = -2002;

async fn harness() -> TestHarness {
    TestHarness::builder()
        .with_seller("ana", "1234", "Ana Pérez")
        .with_seller("luis", "abcd", "Luis Gómez")
        .with_product("Coffee", 2.0, 5.0, 50)
        .build()
        .await
        .unwrap()
}

fn channel(h: &TestHarness) -> Arc<dyn ChannelAdapter> {
    h.mock_channel.clone()
}

fn ops(h: &TestHarness) -> OpsForwarder {
    OpsForwarder::new(channel(h), Some(SessionId::from(OPS)))
}

#[tokio::test]
async fn reminder_goes_to_logged_in_sellers_only() {
    let h = harness().await;
    h.login(1, "ana", "1234").await;
    h.select(1, "product_1").await;
    h.text(1, "3").await;
    h.command(2, "start").await;
    h.mock_channel.clear_sent().await;

    let job = ReminderJob::new(h.registry.clone(), h.reports.clone(), channel(&h));
    let delivered = job.run_on(Local::now().date_naive()).await.unwrap();

    assert_eq!(delivered, 1);
    let sent = h.mock_channel.sent_messages().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].session_id, SessionId::from(1));
    assert!(sent[0].text.contains("Ana Pérez"));
    assert!(sent[0].text.contains("$15.00"));
}

/// Delegates to a real ledger but fails the first `failures` daily lookups.
struct FlakyLedger {
    inner: Arc<SqliteLedger>,
    failures: AtomicUsize,
}

#[async_trait]
impl PluginAdapter for FlakyLedger {
    fn name(&self) -> &str {
        "flaky"
    }

    fn version(&self) -> semver::Version {
        self.inner.version()
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, TallyError> {
        self.inner.health_check().await
    }

    async fn shutdown(&self) -> Result<(), TallyError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl LedgerStore for FlakyLedger {
    async fn initialize(&self) -> Result<(), TallyError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), TallyError> {
        self.inner.close().await
    }

    async fn create_seller(
        &self,
        username: &str,
        password: &str,
        display_name: &str,
    ) -> Result<SellerId, TallyError> {
        self.inner.create_seller(username, password, display_name).await
    }

    async fn find_seller_by_username(&self, username: &str) -> Result<Option<Seller>, TallyError> {
        self.inner.find_seller_by_username(username).await
    }

    async fn list_sellers(&self) -> Result<Vec<Seller>, TallyError> {
        self.inner.list_sellers().await
    }

    async fn create_product(
        &self,
        name: &str,
        purchase_price: f64,
        sale_price: f64,
        initial_inventory: i64,
    ) -> Result<ProductId, TallyError> {
        self.inner
            .create_product(name, purchase_price, sale_price, initial_inventory)
            .await
    }

    async fn list_products(&self) -> Result<Vec<ProductListing>, TallyError> {
        self.inner.list_products().await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, TallyError> {
        self.inner.get_product(id).await
    }

    async fn find_product_by_name(&self, name: &str) -> Result<Option<Product>, TallyError> {
        self.inner.find_product_by_name(name).await
    }

    async fn add_stock(&self, id: ProductId, quantity: i64) -> Result<i64, TallyError> {
        self.inner.add_stock(id, quantity).await
    }

    async fn remove_stock(&self, id: ProductId, quantity: i64) -> Result<i64, TallyError> {
        self.inner.remove_stock(id, quantity).await
    }

    async fn inventory_snapshot(&self) -> Result<Vec<InventoryLevel>, TallyError> {
        self.inner.inventory_snapshot().await
    }

    async fn record_sale(
        &self,
        seller_id: SellerId,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<SaleId, TallyError> {
        self.inner.record_sale(seller_id, product_id, quantity).await
    }

    async fn daily_sales_for_seller(
        &self,
        seller_id: Option<SellerId>,
        date: NaiveDate,
    ) -> Result<Vec<SaleLine>, TallyError> {
        let pending = self.failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.failures.store(pending - 1, Ordering::SeqCst);
            return Err(TallyError::Storage {
                source: "database is locked".into(),
            });
        }
        self.inner.daily_sales_for_seller(seller_id, date).await
    }

    async fn weekly_sales_for_seller(
        &self,
        seller_id: Option<SellerId>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<SaleLine>, TallyError> {
        self.inner.weekly_sales_for_seller(seller_id, start, end).await
    }
}

#[tokio::test]
async fn reminder_failure_for_one_seller_does_not_skip_the_rest() {
    let h = harness().await;
    h.login(1, "ana", "1234").await;
    h.login(2, "luis", "abcd").await;
    h.mock_channel.clear_sent().await;

    let flaky: Arc<dyn LedgerStore> = Arc::new(FlakyLedger {
        inner: h.store.clone(),
        failures: AtomicUsize::new(1),
    });
    let reports = ReportingEngine::new(flaky, 0.20);
    let job = ReminderJob::new(h.registry.clone(), reports, channel(&h));
    let delivered = job.run_on(Local::now().date_naive()).await.unwrap();

    assert_eq!(delivered, 1);
    assert_eq!(h.mock_channel.sent_count().await, 1);
}

#[tokio::test]
async fn weekly_digest_with_no_sales_shows_na() {
    let h = harness().await;
    let job = WeeklyDigestJob::new(
        h.reports.clone(),
        channel(&h),
        SessionId::from(GROUP),
        ops(&h),
    );

    job.run_on(Local::now().date_naive()).await.unwrap();

    let group = h.mock_channel.sent_to(&SessionId::from(GROUP)).await;
    assert_eq!(group.len(), 1);
    assert!(group[0].text.contains("Producto más vendido: N/A"));
    assert!(group[0].text.contains("El vendedor de la semana: N/A"));

    let notes = h.mock_channel.sent_to(&SessionId::from(OPS)).await;
    assert_eq!(notes[0].text, "[INFO] Resumen semanal enviado al grupo.");
}

#[tokio::test]
async fn weekly_digest_names_best_seller() {
    let h = harness().await;
    h.login(1, "ana", "1234").await;
    h.select(1, "product_1").await;
    h.text(1, "4").await;

    let job = WeeklyDigestJob::new(
        h.reports.clone(),
        channel(&h),
        SessionId::from(GROUP),
        ops(&h),
    );
    job.run().await.unwrap();

    let group = h.mock_channel.sent_to(&SessionId::from(GROUP)).await;
    assert!(group[0].text.contains("Producto más vendido: Coffee"));
    assert!(group[0].text.contains("El vendedor de la semana: Ana Pérez"));
}

#[tokio::test]
async fn failed_digest_delivery_is_reported() {
    let h = harness().await;
    h.mock_channel.fail_sends(true);
    let job = WeeklyDigestJob::new(
        h.reports.clone(),
        channel(&h),
        SessionId::from(GROUP),
        ops(&h),
    );
    assert!(job.run().await.is_err());
}

#[tokio::test]
async fn session_sweep_evicts_idle_sessions() {
    let h = harness().await;
    h.command(1, "start").await;
    assert_eq!(h.registry.len(), 1);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let job = SessionSweepJob::new(h.registry.clone(), Duration::from_millis(5));
    job.run().await.unwrap();
    assert!(h.registry.is_empty());
}

#[tokio::test]
async fn monitor_job_mirrors_status_to_ops() {
    let h = harness().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"stat": "ok", "monitors": [{"status": 2}]})),
        )
        .mount(&server)
        .await;

    let monitor = UptimeMonitor::new(&MonitorConfig {
        enabled: true,
        api_url: format!("{}/v2/getMonitors", server.uri()),
        api_key: Some("k".into()),
        monitor_id: Some("1".into()),
    })
    .unwrap();
    MonitorJob::new(monitor, ops(&h)).run().await.unwrap();

    let notes = h.mock_channel.sent_to(&SessionId::from(OPS)).await;
    assert_eq!(notes[0].text, "[INFO] El bot está funcionando correctamente.");
}

#[tokio::test]
async fn unreachable_monitor_reports_error() {
    let h = harness().await;
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let monitor = UptimeMonitor::new(&MonitorConfig {
        enabled: true,
        api_url: server.uri(),
        api_key: Some("k".into()),
        monitor_id: Some("1".into()),
    })
    .unwrap();
    MonitorJob::new(monitor, ops(&h)).run().await.unwrap();

    let notes = h.mock_channel.sent_to(&SessionId::from(OPS)).await;
    assert!(notes[0].text.starts_with("[ERROR] Error al conectar con UptimeRobot"));
}
