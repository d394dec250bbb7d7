//! Per-message entry point: classifies the inbound text, consults the
//! conversation state and dispatches to the right flow handler.
//!
//! Concurrency note: every collaborator call is a suspension point, so state
//! read before such a call can be stale by the time it returns (two
//! near-simultaneous messages from one user may both read the same scratch).
//! The stores serialize individual operations; serializing whole messages
//! per user is a possible hardening, not something this router does.

use std::sync::Arc;

use tracing::{debug, warn};

use tiendy_agent::{MessageAnalysis, MessageClassifier, ProductExtractor};
use tiendy_backend::{CatalogSearcher, CustomerDirectory, OrderSubmitter};
use tiendy_core::{classify, ChatState, UserId};
use tiendy_store::Stores;
use tiendy_whatsapp::OutboundMessenger;

use crate::copy;

const CANNED_REPLY_THRESHOLD: f32 = 0.85;
const HELP_INTENT_THRESHOLD: f32 = 0.7;
const NEGATIVE_SENTIMENT_THRESHOLD: f32 = -0.5;

pub struct DialogueRouter {
    pub(crate) stores: Arc<Stores>,
    pub(crate) messenger: Arc<dyn OutboundMessenger>,
    pub(crate) classifier: Arc<dyn MessageClassifier>,
    pub(crate) extractor: Arc<dyn ProductExtractor>,
    pub(crate) catalog: Arc<dyn CatalogSearcher>,
    pub(crate) orders: Arc<dyn OrderSubmitter>,
    pub(crate) customers: Arc<dyn CustomerDirectory>,
}

impl DialogueRouter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        stores: Arc<Stores>,
        messenger: Arc<dyn OutboundMessenger>,
        classifier: Arc<dyn MessageClassifier>,
        extractor: Arc<dyn ProductExtractor>,
        catalog: Arc<dyn CatalogSearcher>,
        orders: Arc<dyn OrderSubmitter>,
        customers: Arc<dyn CustomerDirectory>,
    ) -> Self {
        Self { stores, messenger, classifier, extractor, catalog, orders, customers }
    }

    /// Best-effort send; a failed delivery is logged and never aborts the
    /// state transition that produced it.
    pub(crate) async fn send(&self, user: &UserId, text: &str) {
        if let Err(error) = self.messenger.send_text(user, text).await {
            warn!(user = %user, error = %error, "outbound message delivery failed");
        }
    }

    /// Routes one inbound message. Fire-and-forget from the transport's
    /// perspective; every failure path ends in a user-visible message and a
    /// well-defined state.
    pub async fn handle_inbound(&self, user: &UserId, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let state = self.stores.states.state(user);
        debug!(user = %user, state = ?state, "routing inbound message");

        // Free-text classification is suppressed while the user is answering
        // a fixed prompt, and for bare digits (reserved for menu selection).
        let analysis = if !state.in_menu_flow() && !classify::is_single_digit(text) {
            match self.classifier.classify(text).await {
                Ok(analysis) => Some(analysis),
                Err(error) => {
                    warn!(user = %user, error = %error, "message classification failed");
                    None
                }
            }
        } else {
            None
        };

        // Farewell/thanks outranks everything. The static matcher applies
        // even where classification is suppressed, so a goodbye mid-order
        // still closes the session.
        let farewell = classify::detect_farewell(text).matched
            || analysis.as_ref().is_some_and(|a| a.farewell);
        if farewell {
            self.send(user, &copy::farewell_reply()).await;
            self.stores.reset(user);
            return;
        }

        // Registration happens before any other branch.
        if !self.stores.sessions.exists(user) {
            self.stores.sessions.touch(user);
            self.enter_welcome(user).await;
            return;
        }

        if self.stores.sessions.is_expired(user) {
            let cart_had_items = self.stores.carts.has_items(user);
            self.stores.reset(user);
            self.send(user, &copy::expiry_notice(cart_had_items)).await;
            // The same message still gets a response: re-enter welcome so
            // the user is not left hanging.
            self.stores.sessions.touch(user);
            self.enter_welcome(user).await;
            return;
        }

        // This message is the activity that begins the next window.
        self.stores.sessions.touch(user);

        if let Some(analysis) = &analysis {
            if self.apply_classification(user, state, analysis).await {
                return;
            }
        }

        // Pattern-based product question, independent of the LLM call.
        if !state.in_product_context()
            && !state.in_menu_flow()
            && classify::detect_product_query(text).matched
            && self.quick_product_lookup(user, text).await
        {
            return;
        }

        if state == ChatState::Faq {
            if let Some(topic) = classify::detect_faq_topic(text) {
                self.send(user, &copy::faq_answer(topic)).await;
                return;
            }
        }

        if self.apply_global_shortcuts(user, state, text).await {
            return;
        }

        self.dispatch(user, state, text).await;
    }

    /// High-confidence automatic replies and mood-based redirects. Returns
    /// true when the message was fully handled.
    async fn apply_classification(
        &self,
        user: &UserId,
        state: ChatState,
        analysis: &MessageAnalysis,
    ) -> bool {
        if let Some(canned) = &analysis.canned_reply {
            if canned.confidence > CANNED_REPLY_THRESHOLD {
                self.send(user, &canned.reply).await;
                return true;
            }
        }

        if analysis.greeting && state.is_idle() {
            self.enter_welcome(user).await;
            return true;
        }

        if state.in_product_context() {
            return false;
        }

        if analysis.help_confidence > HELP_INTENT_THRESHOLD {
            self.show_main_menu(user).await;
            return true;
        }

        if analysis.sentiment_score < NEGATIVE_SENTIMENT_THRESHOLD {
            self.send(user, &copy::empathetic_redirect()).await;
            self.stores.states.set_state(user, ChatState::Menu);
            return true;
        }

        false
    }

    /// Global keyword shortcuts, evaluated in fixed order against the raw
    /// lowercased message. Returns true when the message was handled.
    async fn apply_global_shortcuts(&self, user: &UserId, state: ChatState, text: &str) -> bool {
        let normalized = classify::normalize(text);

        if classify::is_menu_keyword(text) {
            self.show_main_menu(user).await;
            return true;
        }

        if classify::has_order_intent(text)
            && !normalized.contains("confirmar")
            && !state.in_order_flow()
        {
            self.start_order(user).await;
            return true;
        }

        if classify::has_cart_keyword(text) {
            let lines = self.stores.cart_lines(user);
            let totals = self.stores.carts.totals(user);
            self.send(user, &copy::cart_summary(&lines, &totals)).await;
            return true;
        }

        if classify::has_price_inquiry(text) {
            self.start_search(user).await;
            return true;
        }

        false
    }

    async fn dispatch(&self, user: &UserId, state: ChatState, text: &str) {
        match state {
            ChatState::Initial => self.enter_welcome(user).await,
            ChatState::AwaitingFirstNameLastname => self.handle_name(user, text).await,
            ChatState::Menu => self.handle_menu_selection(user, text).await,
            ChatState::ProductInfo => self.handle_product_info(user, text).await,
            ChatState::OrdersMenu => self.handle_orders_menu(user, text).await,
            ChatState::Faq => self.handle_faq(user, text).await,
            ChatState::ProductSearchAwaitingQuery => self.handle_search_query(user, text).await,
            ChatState::ProductSearchAwaitingSelection => {
                self.handle_search_selection(user, text).await
            }
            ChatState::ProductSearchShowingDetails => self.handle_search_details(user, text).await,
            ChatState::OrderAwaitingProductList => self.handle_order_product_list(user, text).await,
            ChatState::OrderResolvingAmbiguousProducts => {
                self.handle_order_ambiguous(user, text).await
            }
            ChatState::OrderAwaitingAddMoreDecision => self.handle_order_add_more(user, text).await,
            ChatState::OrderAwaitingDeliveryMethod => {
                self.handle_order_delivery_method(user, text).await
            }
            ChatState::OrderAwaitingAddress => self.handle_order_address(user, text).await,
            ChatState::OrderAwaitingCity => self.handle_order_city(user, text).await,
            ChatState::OrderAwaitingDistrict => self.handle_order_district(user, text).await,
            ChatState::OrderAwaitingCourier => self.handle_order_courier(user, text).await,
            ChatState::OrderAwaitingConfirmation => {
                self.handle_order_confirmation(user, text).await
            }
        }
    }

    pub(crate) async fn show_main_menu(&self, user: &UserId) {
        self.send(user, &copy::main_menu()).await;
        self.stores.states.set_state(user, ChatState::Menu);
    }
}
