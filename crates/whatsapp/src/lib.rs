pub mod inbound;
pub mod outbound;

pub use inbound::{InboundMessage, WebhookPayload};
pub use outbound::{
    CloudApiMessenger, NoopMessenger, OutboundMessenger, RecordingMessenger, SendError,
};
