pub mod cart;
pub mod clock;
pub mod session;
pub mod state;
pub mod stores;

pub use cart::CartStore;
pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{
    Session, SessionStore, CONTEXT_RESET_AT_SECS, SESSION_TTL_SECS, SWEEP_INTERVAL,
    WARNING_AT_SECS,
};
pub use state::StateStore;
pub use stores::Stores;
