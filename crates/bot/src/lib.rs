pub mod copy;
pub mod flows;
pub mod monitor;
pub mod router;

pub use monitor::SessionMonitor;
pub use router::DialogueRouter;
