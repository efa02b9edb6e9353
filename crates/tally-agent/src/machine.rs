// SPDX-FileCopyrightText: 2026 Tally Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The conversation state machine.
//!
//! [`ConversationEngine::handle`] takes one inbound event, reads and updates
//! the session in the [`SessionRegistry`], calls the ledger and reports as
//! needed, and returns the actions the agent loop must execute. The engine
//! never talks to the transport itself.

use std::sync::Arc;

use chrono::Local;
use tally_core::types::{
    Choice, EventKind, InboundEvent, OpsLevel, OpsNote, OutboundAction, OutboundMessage, ProductId,
    SessionId,
};
use tally_core::{LedgerStore, TallyError};
use tally_report::ReportingEngine;
use tally_report::render::{render_daily, render_snapshot};
use tracing::{debug, error, info, warn};

use crate::flow::{FieldValue, FlowKind, parse_field, parse_quantity};
use crate::messages as msg;
use crate::registry::{AuthenticatedSeller, SessionRegistry, SessionState, Step};

/// What happens to the session after an event.
enum Outcome {
    Keep,
    Clear,
}

/// Actions accumulated while handling one event.
struct Turn {
    session: SessionId,
    actions: Vec<OutboundAction>,
}

impl Turn {
    fn new(session: SessionId) -> Self {
        Self {
            session,
            actions: Vec::new(),
        }
    }

    fn say(&mut self, text: impl Into<String>) {
        self.say_with(text, Vec::new());
    }

    fn say_with(&mut self, text: impl Into<String>, choices: Vec<Choice>) {
        self.actions.push(OutboundAction::Send(
            OutboundMessage::text(self.session.clone(), text).with_choices(choices),
        ));
    }

    fn ops(&mut self, level: OpsLevel, text: impl Into<String>) {
        self.actions
            .push(OutboundAction::Ops(OpsNote::new(level, text)));
    }
}

pub struct ConversationEngine {
    registry: Arc<SessionRegistry>,
    store: Arc<dyn LedgerStore>,
    reports: ReportingEngine,
    admin_password: String,
}

impl ConversationEngine {
    pub fn new(
        registry: Arc<SessionRegistry>,
        store: Arc<dyn LedgerStore>,
        reports: ReportingEngine,
        admin_password: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            store,
            reports,
            admin_password: admin_password.into(),
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Handle one event and return the resulting actions.
    ///
    /// A `RegisterNextInput` action is appended whenever the session ends
    /// the turn on a step that waits for free text.
    pub async fn handle(&self, event: InboundEvent) -> Vec<OutboundAction> {
        let session = event.session_id.clone();
        let mut state = self.registry.get(&session).unwrap_or_default();
        let mut turn = Turn::new(session.clone());

        debug!(
            session_id = %session,
            sender_id = %event.sender_id,
            step = ?state.step,
            kind = ?event.kind,
            "handling event"
        );

        let outcome = match &event.kind {
            EventKind::Command(name) => self.on_command(name, &mut state, &mut turn),
            EventKind::Selection(token) => self.on_selection(token, &mut state, &mut turn).await,
            EventKind::TextReply(text) => self.on_text(text, &mut state, &mut turn).await,
        };

        match outcome {
            Outcome::Keep => {
                let awaits_text = state.step.awaits_text();
                self.registry.set(session.clone(), state);
                if awaits_text {
                    turn.actions.push(OutboundAction::RegisterNextInput(session));
                }
            }
            Outcome::Clear => self.registry.clear(&session),
        }
        turn.actions
    }

    // --- Commands ---

    fn on_command(&self, name: &str, state: &mut SessionState, turn: &mut Turn) -> Outcome {
        match name {
            "start" => {
                *state = SessionState {
                    step: Step::AwaitingUsername,
                    ..SessionState::default()
                };
                turn.say_with(msg::WELCOME, msg::login_choice());
                Outcome::Keep
            }
            "admin" => {
                state.pending.clear();
                state.step = Step::AdminAwaitingPassword;
                turn.say(msg::ASK_ADMIN_PASSWORD);
                Outcome::Keep
            }
            "logout" => self.logout(state, turn),
            _ => {
                turn.say_with(msg::UNKNOWN_COMMAND, menu_for(state));
                Outcome::Keep
            }
        }
    }

    fn logout(&self, state: &SessionState, turn: &mut Turn) -> Outcome {
        if let Some(seller) = &state.seller {
            info!(session_id = %turn.session, seller_id = seller.id.0, "seller logged out");
            turn.ops(
                OpsLevel::Info,
                format!("Vendedor {} cerró sesión.", seller.username),
            );
        }
        turn.say_with(msg::LOGGED_OUT, msg::login_choice());
        Outcome::Clear
    }

    // --- Selections ---

    async fn on_selection(&self, token: &str, state: &mut SessionState, turn: &mut Turn) -> Outcome {
        if token == "login" {
            *state = SessionState {
                step: Step::AwaitingUsername,
                ..SessionState::default()
            };
            turn.say(msg::ASK_USERNAME);
            return Outcome::Keep;
        }
        if token == "cerrar_sesion" {
            return self.logout(state, turn);
        }

        if let Ok(flow) = token.parse::<FlowKind>() {
            if !state.admin {
                return deny_admin(state, turn);
            }
            return self.start_flow(flow, state, turn);
        }
        match token {
            "admin_menu" | "admin_ver_datos" if !state.admin => return deny_admin(state, turn),
            "admin_menu" => {
                state.pending.clear();
                state.step = Step::AdminMenu;
                turn.say_with(msg::ADMIN_PANEL, msg::admin_menu());
                return Outcome::Keep;
            }
            "admin_ver_datos" => return self.show_admin_data(state, turn).await,
            _ => {}
        }

        let product_id = token
            .strip_prefix("product_")
            .and_then(|id| id.parse::<i64>().ok())
            .map(ProductId);
        let seller_token = matches!(token, "venta" | "historial" | "atras_menu");
        if !seller_token && product_id.is_none() {
            warn!(session_id = %turn.session, token, "unrecognized selection");
            turn.say_with(msg::UNKNOWN_OPTION, menu_for(state));
            return Outcome::Keep;
        }

        let Some(seller) = state.seller.clone() else {
            state.step = Step::Unauthenticated;
            turn.say_with(msg::LOGIN_REQUIRED, msg::login_choice());
            return Outcome::Keep;
        };

        match (token, product_id) {
            (_, Some(id)) => self.pick_product(id, state, turn).await,
            ("venta", _) => self.show_products(None, state, turn).await,
            ("historial", _) => self.show_history(&seller, state, turn).await,
            _ => {
                state.pending.clear();
                seller_home(&seller, state, turn);
                Outcome::Keep
            }
        }
    }

    async fn show_products(
        &self,
        notice: Option<String>,
        state: &mut SessionState,
        turn: &mut Turn,
    ) -> Outcome {
        state.pending.clear();
        match self.store.list_products().await {
            Ok(products) if products.is_empty() => {
                state.step = Step::AuthenticatedMenu;
                turn.say_with(msg::NO_PRODUCTS, msg::seller_menu());
            }
            Ok(products) => {
                state.step = Step::SelectingProduct;
                let text = notice.unwrap_or_else(|| msg::PICK_PRODUCT.to_string());
                turn.say_with(text, msg::product_menu(&products));
            }
            Err(e) => {
                state.step = Step::AuthenticatedMenu;
                store_failure(turn, "listing products", &e, msg::seller_menu());
            }
        }
        Outcome::Keep
    }

    async fn pick_product(&self, id: ProductId, state: &mut SessionState, turn: &mut Turn) -> Outcome {
        match self.store.get_product(id).await {
            Ok(Some(product)) if product.inventory_count <= 0 => {
                self.show_products(Some(msg::out_of_stock(&product.name)), state, turn)
                    .await
            }
            Ok(Some(product)) => {
                state.pending.clear();
                turn.say_with(
                    msg::ask_quantity(&product.name, product.inventory_count),
                    msg::back_to_menu(),
                );
                state.pending.insert(
                    "product",
                    FieldValue::Product {
                        id: product.id,
                        name: product.name,
                    },
                );
                state.step = Step::AwaitingQuantity;
                Outcome::Keep
            }
            Ok(None) => {
                self.show_products(Some(msg::PRODUCT_NOT_FOUND.to_string()), state, turn)
                    .await
            }
            Err(e) => {
                state.step = Step::AuthenticatedMenu;
                store_failure(turn, "loading product", &e, msg::seller_menu());
                Outcome::Keep
            }
        }
    }

    async fn show_history(
        &self,
        seller: &AuthenticatedSeller,
        state: &mut SessionState,
        turn: &mut Turn,
    ) -> Outcome {
        let today = Local::now().date_naive();
        let report = self.reports.daily(seller.id, today).await;
        let inventory = self.reports.inventory().await;
        match report.and_then(|r| inventory.map(|i| (r, i))) {
            Ok((report, inventory)) => {
                state.step = Step::ViewingHistory;
                let text = render_daily(&report, self.reports.commission_rate(), &inventory);
                turn.say_with(text, msg::back_to_menu());
            }
            Err(e) => {
                state.step = Step::AuthenticatedMenu;
                store_failure(turn, "building daily report", &e, msg::seller_menu());
            }
        }
        Outcome::Keep
    }

    async fn show_admin_data(&self, state: &mut SessionState, turn: &mut Turn) -> Outcome {
        let today = Local::now().date_naive();
        let snapshot = self.reports.admin_snapshot(today).await;
        let inventory = self.reports.inventory().await;
        state.pending.clear();
        match snapshot.and_then(|s| inventory.map(|i| (s, i))) {
            Ok((snapshot, inventory)) => {
                state.step = Step::AdminViewingData;
                turn.say_with(render_snapshot(&snapshot, &inventory), msg::back_to_admin());
            }
            Err(e) => {
                state.step = Step::AdminMenu;
                store_failure(turn, "building admin snapshot", &e, msg::admin_menu());
            }
        }
        Outcome::Keep
    }

    fn start_flow(&self, flow: FlowKind, state: &mut SessionState, turn: &mut Turn) -> Outcome {
        state.pending.clear();
        match flow.field(0) {
            Some(first) => {
                state.step = Step::AdminForm { flow, field: 0 };
                turn.say(first.prompt);
            }
            None => {
                state.step = Step::AdminMenu;
                turn.say_with(msg::ADMIN_PANEL, msg::admin_menu());
            }
        }
        Outcome::Keep
    }

    // --- Free text ---

    async fn on_text(&self, text: &str, state: &mut SessionState, turn: &mut Turn) -> Outcome {
        match state.step {
            Step::AwaitingUsername => self.check_username(text, state, turn).await,
            Step::AwaitingPassword => self.check_password(text, state, turn).await,
            Step::AwaitingQuantity => self.enter_quantity(text, state, turn).await,
            Step::AdminAwaitingPassword => self.check_admin_password(text, state, turn),
            Step::AdminForm { flow, field } => {
                self.fill_field(flow, field, text, state, turn).await
            }
            _ => {
                turn.say_with(msg::NOT_EXPECTING_TEXT, menu_for(state));
                Outcome::Keep
            }
        }
    }

    async fn check_username(&self, text: &str, state: &mut SessionState, turn: &mut Turn) -> Outcome {
        match self.store.find_seller_by_username(text.trim()).await {
            Ok(Some(seller)) => {
                state
                    .pending
                    .insert("username", FieldValue::Text(seller.username));
                state.step = Step::AwaitingPassword;
                turn.say(msg::ASK_PASSWORD);
                Outcome::Keep
            }
            Ok(None) => {
                debug!(session_id = %turn.session, "unknown username");
                turn.say(msg::UNKNOWN_USER);
                Outcome::Keep
            }
            Err(e) => {
                store_failure(turn, "looking up seller", &e, msg::login_choice());
                Outcome::Clear
            }
        }
    }

    async fn check_password(&self, text: &str, state: &mut SessionState, turn: &mut Turn) -> Outcome {
        let Some(FieldValue::Text(username)) = state.pending.get("username").cloned() else {
            state.step = Step::AwaitingUsername;
            turn.say(msg::ASK_USERNAME);
            return Outcome::Keep;
        };

        match self.store.find_seller_by_username(&username).await {
            Ok(Some(seller)) if seller.password == text => {
                info!(session_id = %turn.session, seller_id = seller.id.0, "seller logged in");
                turn.ops(OpsLevel::Info, format!("Vendedor {username} inició sesión."));
                let seller = AuthenticatedSeller {
                    id: seller.id,
                    username: seller.username,
                    display_name: seller.display_name,
                };
                state.pending.clear();
                seller_home(&seller, state, turn);
                state.seller = Some(seller);
                Outcome::Keep
            }
            Ok(_) => {
                warn!(session_id = %turn.session, username = %username, "wrong seller password");
                turn.ops(
                    OpsLevel::Warning,
                    format!("Contraseña incorrecta para el usuario {username}."),
                );
                turn.say_with(msg::WRONG_PASSWORD, msg::login_choice());
                Outcome::Clear
            }
            Err(e) => {
                store_failure(turn, "verifying password", &e, msg::login_choice());
                Outcome::Clear
            }
        }
    }

    async fn enter_quantity(&self, text: &str, state: &mut SessionState, turn: &mut Turn) -> Outcome {
        let Some(seller) = state.seller.clone() else {
            turn.say_with(msg::LOGIN_REQUIRED, msg::login_choice());
            return Outcome::Clear;
        };
        let Some(FieldValue::Product { id, name }) = state.pending.get("product").cloned() else {
            return self.show_products(None, state, turn).await;
        };

        let quantity = match parse_quantity(text) {
            Ok(q) => q,
            Err(e) => {
                turn.say_with(user_message(&e), msg::back_to_menu());
                return Outcome::Keep;
            }
        };

        match self.store.record_sale(seller.id, id, quantity).await {
            Ok(sale_id) => {
                info!(
                    session_id = %turn.session,
                    seller_id = seller.id.0,
                    sale_id = sale_id.0,
                    product = %name,
                    quantity,
                    "sale recorded"
                );
                turn.ops(
                    OpsLevel::Info,
                    format!("{} vendió {quantity} x {name}.", seller.username),
                );
                state.pending.clear();
                state.step = Step::AuthenticatedMenu;
                turn.say_with(msg::sale_recorded(quantity, &name), msg::seller_menu());
                Outcome::Keep
            }
            Err(TallyError::Validation(reason)) => {
                debug!(session_id = %turn.session, %reason, "sale rejected");
                let available = match self.store.get_product(id).await {
                    Ok(Some(p)) => p.inventory_count,
                    _ => 0,
                };
                turn.say_with(msg::insufficient_stock(&name, available), msg::back_to_menu());
                Outcome::Keep
            }
            Err(TallyError::NotFound { .. }) => {
                self.show_products(Some(msg::PRODUCT_NOT_FOUND.to_string()), state, turn)
                    .await
            }
            Err(e) => {
                state.pending.clear();
                state.step = Step::AuthenticatedMenu;
                store_failure(turn, "recording sale", &e, msg::seller_menu());
                Outcome::Keep
            }
        }
    }

    fn check_admin_password(&self, text: &str, state: &mut SessionState, turn: &mut Turn) -> Outcome {
        if text == self.admin_password {
            info!(session_id = %turn.session, "admin panel unlocked");
            turn.ops(OpsLevel::Info, "Acceso al panel de administración.");
            state.admin = true;
            state.pending.clear();
            state.step = Step::AdminMenu;
            turn.say_with(msg::ADMIN_PANEL, msg::admin_menu());
            Outcome::Keep
        } else {
            warn!(session_id = %turn.session, "wrong admin password");
            turn.ops(
                OpsLevel::Warning,
                "Contraseña de administrador incorrecta.",
            );
            turn.say_with(msg::WRONG_ADMIN_PASSWORD, msg::login_choice());
            Outcome::Clear
        }
    }

    async fn fill_field(
        &self,
        flow: FlowKind,
        field: usize,
        text: &str,
        state: &mut SessionState,
        turn: &mut Turn,
    ) -> Outcome {
        if !state.admin {
            turn.say_with(msg::ADMIN_REQUIRED, msg::login_choice());
            return Outcome::Clear;
        }
        let Some(spec) = flow.field(field) else {
            return self.start_flow(flow, state, turn);
        };

        let value = match parse_field(spec.kind, text, &state.pending, self.store.as_ref()).await {
            Ok(value) => value,
            Err(e) => return flow_failed(flow, &e, state, turn),
        };
        state.pending.insert(spec.key, value);

        if let Some(next) = flow.field(field + 1) {
            state.step = Step::AdminForm {
                flow,
                field: field + 1,
            };
            turn.say(next.prompt);
            return Outcome::Keep;
        }

        match flow.commit(&state.pending, self.store.as_ref()).await {
            Ok(confirmation) => {
                info!(session_id = %turn.session, flow = %flow, "admin flow completed");
                turn.ops(OpsLevel::Info, confirmation.clone());
                state.pending.clear();
                state.step = Step::AdminMenu;
                turn.say_with(confirmation, msg::admin_menu());
                Outcome::Keep
            }
            Err(e) => flow_failed(flow, &e, state, turn),
        }
    }
}

fn seller_home(seller: &AuthenticatedSeller, state: &mut SessionState, turn: &mut Turn) {
    state.step = Step::AuthenticatedMenu;
    turn.say_with(msg::seller_welcome(&seller.display_name), msg::seller_menu());
}

fn deny_admin(state: &SessionState, turn: &mut Turn) -> Outcome {
    turn.say_with(msg::ADMIN_REQUIRED, menu_for(state));
    Outcome::Keep
}

fn menu_for(state: &SessionState) -> Vec<Choice> {
    if state.admin {
        msg::admin_menu()
    } else if state.seller.is_some() {
        msg::seller_menu()
    } else {
        msg::login_choice()
    }
}

/// Text shown to the user for a recoverable error.
fn user_message(e: &TallyError) -> String {
    match e {
        TallyError::Validation(reason) => reason.clone(),
        TallyError::NotFound {
            entity: "product",
            key,
        } => msg::product_missing(key),
        TallyError::NotFound { key, .. } => format!("No se encontró '{key}'."),
        TallyError::Conflict { entity, key } => msg::duplicate(entity, key),
        _ => msg::GENERIC_FAILURE.to_string(),
    }
}

/// Abort an admin flow: discard the partial entity and return to the panel.
fn flow_failed(flow: FlowKind, e: &TallyError, state: &mut SessionState, turn: &mut Turn) -> Outcome {
    state.pending.clear();
    state.step = Step::AdminMenu;
    if e.is_user_recoverable() {
        debug!(session_id = %turn.session, flow = %flow, error = %e, "admin flow aborted");
        turn.say_with(
            format!("{}\n{}", user_message(e), msg::FLOW_CANCELLED),
            msg::admin_menu(),
        );
    } else {
        store_failure(turn, "completing admin flow", e, msg::admin_menu());
    }
    Outcome::Keep
}

/// Report an unexpected failure: generic text to the user, details to the log and ops chat.
fn store_failure(turn: &mut Turn, context: &str, e: &TallyError, choices: Vec<Choice>) {
    error!(session_id = %turn.session, error = %e, "{context} failed");
    turn.ops(OpsLevel::Error, format!("Error {context} ({}): {e}", turn.session));
    turn.say_with(msg::GENERIC_FAILURE, choices);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_config::model::StorageConfig;
    use tally_storage::SqliteLedger;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        store: Arc<SqliteLedger>,
        engine: ConversationEngine,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(SqliteLedger::new(StorageConfig {
            database_path: dir.path().join("tally.db").to_string_lossy().into_owned(),
            wal_mode: true,
        }));
        store.initialize().await.unwrap();
        store.create_seller("ana", "1234", "Ana Pérez").await.unwrap();
        store.create_product("Coffee", 2.0, 5.0, 10).await.unwrap();

        let ledger: Arc<dyn LedgerStore> = store.clone();
        let engine = ConversationEngine::new(
            Arc::new(SessionRegistry::new()),
            ledger.clone(),
            ReportingEngine::new(ledger, 0.20),
            "admin-secret",
        );
        Fixture {
            _dir: dir,
            store,
            engine,
        }
    }

    fn sid() -> SessionId {
        SessionId::from(42)
    }

    async fn send(f: &Fixture, kind: EventKind) -> Vec<OutboundAction> {
        f.engine
            .handle(InboundEvent::new(sid(), "42", kind))
            .await
    }

    async fn text(f: &Fixture, s: &str) -> Vec<OutboundAction> {
        send(f, EventKind::TextReply(s.into())).await
    }

    async fn select(f: &Fixture, token: &str) -> Vec<OutboundAction> {
        send(f, EventKind::Selection(token.into())).await
    }

    fn texts(actions: &[OutboundAction]) -> Vec<String> {
        actions
            .iter()
            .filter_map(|a| match a {
                OutboundAction::Send(m) => Some(m.text.clone()),
                _ => None,
            })
            .collect()
    }

    fn ops(actions: &[OutboundAction]) -> Vec<OpsNote> {
        actions
            .iter()
            .filter_map(|a| match a {
                OutboundAction::Ops(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    fn registers_input(actions: &[OutboundAction]) -> bool {
        actions
            .iter()
            .any(|a| matches!(a, OutboundAction::RegisterNextInput(s) if *s == sid()))
    }

    fn step(f: &Fixture) -> Option<Step> {
        f.engine.registry().get(&sid()).map(|s| s.step)
    }

    async fn login(f: &Fixture) {
        send(f, EventKind::Command("start".into())).await;
        text(f, "ana").await;
        text(f, "1234").await;
    }

    async fn unlock_admin(f: &Fixture) {
        send(f, EventKind::Command("admin".into())).await;
        text(f, "admin-secret").await;
    }

    #[tokio::test]
    async fn start_greets_and_awaits_username() {
        let f = fixture().await;
        let actions = send(&f, EventKind::Command("start".into())).await;
        assert_eq!(texts(&actions), vec![msg::WELCOME.to_string()]);
        assert!(registers_input(&actions));
        assert_eq!(step(&f), Some(Step::AwaitingUsername));
    }

    #[tokio::test]
    async fn unknown_username_reprompts() {
        let f = fixture().await;
        send(&f, EventKind::Command("start".into())).await;
        let actions = text(&f, "nadie").await;
        assert_eq!(texts(&actions), vec![msg::UNKNOWN_USER.to_string()]);
        assert!(registers_input(&actions));
        assert_eq!(step(&f), Some(Step::AwaitingUsername));
    }

    #[tokio::test]
    async fn login_shows_seller_menu() {
        let f = fixture().await;
        send(&f, EventKind::Command("start".into())).await;
        text(&f, "ana").await;
        let actions = text(&f, "1234").await;

        assert!(texts(&actions)[0].contains("Ana Pérez"));
        assert!(!registers_input(&actions));
        assert_eq!(step(&f), Some(Step::AuthenticatedMenu));
        let state = f.engine.registry().get(&sid()).unwrap();
        assert_eq!(state.seller.unwrap().username, "ana");
        assert_eq!(ops(&actions)[0].level, OpsLevel::Info);
    }

    #[tokio::test]
    async fn wrong_password_clears_session() {
        let f = fixture().await;
        send(&f, EventKind::Command("start".into())).await;
        text(&f, "ana").await;
        let actions = text(&f, "12345").await;

        assert_eq!(texts(&actions), vec![msg::WRONG_PASSWORD.to_string()]);
        assert_eq!(ops(&actions)[0].level, OpsLevel::Warning);
        assert!(f.engine.registry().get(&sid()).is_none());
    }

    #[tokio::test]
    async fn sale_decrements_stock() {
        let f = fixture().await;
        login(&f).await;

        let actions = select(&f, "venta").await;
        assert_eq!(step(&f), Some(Step::SelectingProduct));
        let OutboundAction::Send(menu) = &actions[0] else {
            panic!("expected product menu");
        };
        assert_eq!(menu.choices[0].token, "product_1");

        let actions = select(&f, "product_1").await;
        assert!(registers_input(&actions));
        assert_eq!(step(&f), Some(Step::AwaitingQuantity));

        let actions = text(&f, "3").await;
        let confirmation = &texts(&actions)[0];
        assert!(confirmation.contains('3'));
        assert!(confirmation.contains("Coffee"));
        assert_eq!(step(&f), Some(Step::AuthenticatedMenu));

        let product = f.store.get_product(ProductId(1)).await.unwrap().unwrap();
        assert_eq!(product.inventory_count, 7);
    }

    #[tokio::test]
    async fn non_numeric_quantity_keeps_waiting() {
        let f = fixture().await;
        login(&f).await;
        select(&f, "product_1").await;

        let actions = text(&f, "tres").await;
        assert!(texts(&actions)[0].contains("inválida"));
        assert!(registers_input(&actions));
        assert_eq!(step(&f), Some(Step::AwaitingQuantity));
        let product = f.store.get_product(ProductId(1)).await.unwrap().unwrap();
        assert_eq!(product.inventory_count, 10);
    }

    #[tokio::test]
    async fn quantity_above_stock_is_rejected() {
        let f = fixture().await;
        login(&f).await;
        select(&f, "product_1").await;

        let actions = text(&f, "11").await;
        assert_eq!(texts(&actions), vec![msg::insufficient_stock("Coffee", 10)]);
        assert_eq!(step(&f), Some(Step::AwaitingQuantity));
        let product = f.store.get_product(ProductId(1)).await.unwrap().unwrap();
        assert_eq!(product.inventory_count, 10);
    }

    #[tokio::test]
    async fn out_of_stock_product_returns_to_list() {
        let f = fixture().await;
        f.store.create_product("Tea", 2.0, 5.0, 0).await.unwrap();
        login(&f).await;

        let actions = select(&f, "product_2").await;
        assert_eq!(texts(&actions), vec![msg::out_of_stock("Tea")]);
        assert_eq!(step(&f), Some(Step::SelectingProduct));
    }

    #[tokio::test]
    async fn seller_tokens_require_login() {
        let f = fixture().await;
        let actions = select(&f, "venta").await;
        assert_eq!(texts(&actions), vec![msg::LOGIN_REQUIRED.to_string()]);
        assert_eq!(step(&f), Some(Step::Unauthenticated));
    }

    #[tokio::test]
    async fn unknown_token_is_reported() {
        let f = fixture().await;
        login(&f).await;
        let actions = select(&f, "bogus").await;
        assert_eq!(texts(&actions), vec![msg::UNKNOWN_OPTION.to_string()]);
        assert_eq!(step(&f), Some(Step::AuthenticatedMenu));
    }

    #[tokio::test]
    async fn history_shows_daily_report() {
        let f = fixture().await;
        login(&f).await;
        select(&f, "product_1").await;
        text(&f, "2").await;

        let actions = select(&f, "historial").await;
        assert_eq!(step(&f), Some(Step::ViewingHistory));
        assert!(texts(&actions)[0].contains("Coffee"));

        select(&f, "atras_menu").await;
        assert_eq!(step(&f), Some(Step::AuthenticatedMenu));
    }

    #[tokio::test]
    async fn logout_clears_session() {
        let f = fixture().await;
        login(&f).await;
        let actions = send(&f, EventKind::Command("logout".into())).await;
        assert_eq!(texts(&actions), vec![msg::LOGGED_OUT.to_string()]);
        assert!(f.engine.registry().get(&sid()).is_none());
    }

    #[tokio::test]
    async fn admin_tokens_require_password() {
        let f = fixture().await;
        let actions = select(&f, "admin_agregar_producto").await;
        assert_eq!(texts(&actions), vec![msg::ADMIN_REQUIRED.to_string()]);

        send(&f, EventKind::Command("admin".into())).await;
        let actions = text(&f, "wrong").await;
        assert_eq!(texts(&actions), vec![msg::WRONG_ADMIN_PASSWORD.to_string()]);
        assert!(f.engine.registry().get(&sid()).is_none());
    }

    #[tokio::test]
    async fn admin_adds_product_with_zero_stock() {
        let f = fixture().await;
        unlock_admin(&f).await;
        assert_eq!(step(&f), Some(Step::AdminMenu));

        select(&f, "admin_agregar_producto").await;
        text(&f, "Tea").await;
        text(&f, "2").await;
        let actions = text(&f, "5").await;

        assert_eq!(step(&f), Some(Step::AdminMenu));
        assert!(texts(&actions)[0].contains("Tea"));
        let tea = f.store.find_product_by_name("Tea").await.unwrap().unwrap();
        assert_eq!(tea.inventory_count, 0);
        assert_eq!(tea.sale_price, 5.0);
    }

    #[tokio::test]
    async fn sale_price_not_above_purchase_aborts_flow() {
        let f = fixture().await;
        unlock_admin(&f).await;
        select(&f, "admin_agregar_producto").await;
        text(&f, "Widget").await;
        text(&f, "10").await;
        let actions = text(&f, "10").await;

        assert!(texts(&actions)[0].contains(msg::FLOW_CANCELLED));
        assert_eq!(step(&f), Some(Step::AdminMenu));
        assert!(f.engine.registry().get(&sid()).unwrap().pending.is_empty());
        assert!(f.store.find_product_by_name("Widget").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_product_is_reported() {
        let f = fixture().await;
        unlock_admin(&f).await;
        select(&f, "admin_agregar_producto").await;
        text(&f, "Coffee").await;
        text(&f, "1").await;
        let actions = text(&f, "3").await;

        assert!(texts(&actions)[0].contains(&msg::duplicate("product", "Coffee")));
        assert_eq!(f.store.list_products().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn remove_stock_of_missing_product_aborts() {
        let f = fixture().await;
        unlock_admin(&f).await;
        select(&f, "admin_restar_producto").await;
        let actions = text(&f, "Nope").await;

        assert!(texts(&actions)[0].contains(&msg::product_missing("Nope")));
        assert_eq!(step(&f), Some(Step::AdminMenu));
    }

    #[tokio::test]
    async fn restock_adds_units() {
        let f = fixture().await;
        unlock_admin(&f).await;
        select(&f, "admin_reponer_producto").await;
        text(&f, "Coffee").await;
        text(&f, "5").await;

        let coffee = f.store.get_product(ProductId(1)).await.unwrap().unwrap();
        assert_eq!(coffee.inventory_count, 15);
    }

    #[tokio::test]
    async fn admin_data_snapshot() {
        let f = fixture().await;
        unlock_admin(&f).await;
        let actions = select(&f, "admin_ver_datos").await;
        assert_eq!(step(&f), Some(Step::AdminViewingData));
        assert!(texts(&actions)[0].contains("Coffee"));

        select(&f, "admin_menu").await;
        assert_eq!(step(&f), Some(Step::AdminMenu));
    }

    #[tokio::test]
    async fn ledger_failure_during_sale_is_reported_and_returns_to_menu() {
        let f = fixture().await;
        login(&f).await;
        select(&f, "product_1").await;

        let broken: Arc<dyn LedgerStore> = Arc::new(SqliteLedger::new(StorageConfig {
            database_path: "never-opened.db".into(),
            wal_mode: true,
        }));
        let engine = ConversationEngine::new(
            f.engine.registry().clone(),
            broken.clone(),
            ReportingEngine::new(broken, 0.20),
            "admin-secret",
        );
        let actions = engine
            .handle(InboundEvent::new(sid(), "42", EventKind::TextReply("3".into())))
            .await;

        assert_eq!(texts(&actions), vec![msg::GENERIC_FAILURE.to_string()]);
        let notes = ops(&actions);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, OpsLevel::Error);
        assert_eq!(step(&f), Some(Step::AuthenticatedMenu));
        assert!(f.engine.registry().get(&sid()).unwrap().pending.is_empty());
        assert!(f.engine.registry().get(&sid()).unwrap().seller.is_some());

        let product = f.store.get_product(ProductId(1)).await.unwrap().unwrap();
        assert_eq!(product.inventory_count, 10);
    }

    #[tokio::test]
    async fn oversized_restock_aborts_flow_without_touching_stock() {
        let f = fixture().await;
        unlock_admin(&f).await;
        select(&f, "admin_reponer_producto").await;
        text(&f, "Coffee").await;
        let actions = text(&f, "9223372036854775807").await;

        assert!(texts(&actions)[0].contains("cantidad máxima"));
        assert_eq!(step(&f), Some(Step::AdminMenu));
        let product = f.store.get_product(ProductId(1)).await.unwrap().unwrap();
        assert_eq!(product.inventory_count, 10);

        select(&f, "admin_reponer_producto").await;
        text(&f, "Coffee").await;
        text(&f, "5").await;
        let product = f.store.get_product(ProductId(1)).await.unwrap().unwrap();
        assert_eq!(product.inventory_count, 15);
    }

    #[tokio::test]
    async fn username_reply_is_trimmed_before_lookup() {
        let f = fixture().await;
        send(&f, EventKind::Command("start".into())).await;
        text(&f, "  ana \n").await;
        assert_eq!(step(&f), Some(Step::AwaitingPassword));
        text(&f, "1234").await;
        assert_eq!(step(&f), Some(Step::AuthenticatedMenu));
    }

    #[tokio::test]
    async fn stray_text_is_not_expected() {
        let f = fixture().await;
        login(&f).await;
        let actions = text(&f, "hola").await;
        assert_eq!(texts(&actions), vec![msg::NOT_EXPECTING_TEXT.to_string()]);
        assert_eq!(step(&f), Some(Step::AuthenticatedMenu));
    }
}
