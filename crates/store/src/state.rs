use std::collections::HashMap;
use std::sync::Mutex;

use tiendy_core::{ChatState, Customer, Scratch, UserId};

#[derive(Clone, Debug, Default)]
struct ConversationRecord {
    state: ChatState,
    scratch: Scratch,
    customer: Option<Customer>,
}

/// Per-user dialogue position plus flow scratch data. Absence of a record
/// is the implicit initial state.
pub struct StateStore {
    records: Mutex<HashMap<UserId, ConversationRecord>>,
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore {
    pub fn new() -> Self {
        Self { records: Mutex::new(HashMap::new()) }
    }

    pub fn state(&self, user: &UserId) -> ChatState {
        let records = self.records.lock().expect("state mutex poisoned");
        records.get(user).map(|record| record.state).unwrap_or_default()
    }

    pub fn set_state(&self, user: &UserId, state: ChatState) {
        let mut records = self.records.lock().expect("state mutex poisoned");
        records.entry(user.clone()).or_default().state = state;
    }

    pub fn customer(&self, user: &UserId) -> Option<Customer> {
        let records = self.records.lock().expect("state mutex poisoned");
        records.get(user).and_then(|record| record.customer.clone())
    }

    pub fn set_customer(&self, user: &UserId, customer: Customer) {
        let mut records = self.records.lock().expect("state mutex poisoned");
        records.entry(user.clone()).or_default().customer = Some(customer);
    }

    pub fn scratch(&self, user: &UserId) -> Scratch {
        let records = self.records.lock().expect("state mutex poisoned");
        records.get(user).map(|record| record.scratch.clone()).unwrap_or_default()
    }

    /// Patches the scratch in place; the closure sees the current value and
    /// mutates only the fields its flow step owns.
    pub fn update_scratch<R>(&self, user: &UserId, patch: impl FnOnce(&mut Scratch) -> R) -> R {
        let mut records = self.records.lock().expect("state mutex poisoned");
        patch(&mut records.entry(user.clone()).or_default().scratch)
    }

    pub fn clear_scratch(&self, user: &UserId) {
        let mut records = self.records.lock().expect("state mutex poisoned");
        if let Some(record) = records.get_mut(user) {
            record.scratch.clear();
        }
    }

    /// Context reset: back to the main menu with empty scratch, keeping the
    /// cached customer identity so a continued conversation still knows who
    /// the user is.
    pub fn reset_flow(&self, user: &UserId, state: ChatState) {
        let mut records = self.records.lock().expect("state mutex poisoned");
        let record = records.entry(user.clone()).or_default();
        record.state = state;
        record.scratch.clear();
    }

    /// Full removal; part of the session reset cascade.
    pub fn clear(&self, user: &UserId) {
        self.records.lock().expect("state mutex poisoned").remove(user);
    }
}
