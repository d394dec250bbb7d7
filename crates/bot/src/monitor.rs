//! Background session sweep: warning, context reset and expiry notices on a
//! fixed cadence, independent of message arrival.

use std::sync::Arc;

use tracing::{debug, info, warn};

use tiendy_core::{ChatState, UserId};
use tiendy_store::{
    Clock, Session, Stores, CONTEXT_RESET_AT_SECS, SESSION_TTL_SECS, SWEEP_INTERVAL,
    WARNING_AT_SECS,
};
use tiendy_whatsapp::OutboundMessenger;

use crate::copy;

pub struct SessionMonitor {
    stores: Arc<Stores>,
    messenger: Arc<dyn OutboundMessenger>,
    clock: Arc<dyn Clock>,
}

impl SessionMonitor {
    pub fn new(
        stores: Arc<Stores>,
        messenger: Arc<dyn OutboundMessenger>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { stores, messenger, clock }
    }

    /// Runs the sweep on its fixed cadence until the task is dropped.
    pub async fn run(self: Arc<Self>) {
        let mut ticks = tokio::time::interval(SWEEP_INTERVAL);
        ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticks.tick().await;
            self.sweep().await;
        }
    }

    /// One pass over all known sessions. Users are evaluated independently;
    /// one user's failed notice never blocks another's.
    pub async fn sweep(&self) {
        for (user, session) in self.stores.sessions.snapshot() {
            self.sweep_user(&user, &session).await;
        }
    }

    async fn sweep_user(&self, user: &UserId, session: &Session) {
        let elapsed = (self.clock.now() - session.last_activity_at).num_seconds();

        if elapsed >= SESSION_TTL_SECS {
            if self.stores.sessions.mark_expiry_notice_sent(user) {
                let cart_had_items = self.stores.carts.has_items(user);
                self.deliver(user, &copy::expiry_notice(cart_had_items)).await;
            }
            info!(user = %user, elapsed_secs = elapsed, "session expired, resetting");
            self.stores.reset(user);
            return;
        }

        if elapsed >= WARNING_AT_SECS && self.stores.sessions.mark_warning_sent(user) {
            debug!(user = %user, elapsed_secs = elapsed, "sending inactivity warning");
            self.deliver(user, &copy::inactivity_warning()).await;
            return;
        }

        if elapsed >= CONTEXT_RESET_AT_SECS && self.stores.sessions.mark_context_reset_sent(user) {
            debug!(user = %user, elapsed_secs = elapsed, "returning conversation to main menu");
            self.deliver(user, &copy::context_reset_notice()).await;
            // Conversation state goes back to the menu; session and cart
            // survive. Activity is refreshed so the reset itself does not
            // count as further inactivity.
            self.stores.states.reset_flow(user, ChatState::Menu);
            self.stores.sessions.refresh_activity(user);
        }
    }

    async fn deliver(&self, user: &UserId, text: &str) {
        if let Err(error) = self.messenger.send_text(user, text).await {
            warn!(user = %user, error = %error, "monitor notice delivery failed");
        }
    }
}
