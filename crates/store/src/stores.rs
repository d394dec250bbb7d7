use std::sync::Arc;

use tracing::debug;

use tiendy_core::domain::cart::CartLine;
use tiendy_core::UserId;

use crate::cart::CartStore;
use crate::clock::Clock;
use crate::session::SessionStore;
use crate::state::StateStore;

/// The three per-user stores behind one facade. Owns the cross-store
/// operations: the reset cascade and the expiry-aware cart read.
pub struct Stores {
    pub sessions: SessionStore,
    pub carts: CartStore,
    pub states: StateStore,
}

impl Stores {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: SessionStore::new(clock),
            carts: CartStore::new(),
            states: StateStore::new(),
        }
    }

    /// Removes session, conversation state, and cart as one logical
    /// operation.
    pub fn reset(&self, user: &UserId) {
        debug!(user = %user, "resetting session, state and cart");
        self.sessions.remove(user);
        self.states.clear(user);
        self.carts.clear(user);
    }

    /// Expiry-aware cart read: an expired session voids the cart (full
    /// cascade) even between monitor sweeps.
    pub fn cart_lines(&self, user: &UserId) -> Vec<CartLine> {
        if self.sessions.is_expired(user) {
            self.reset(user);
            return Vec::new();
        }
        self.carts.lines(user)
    }
}
