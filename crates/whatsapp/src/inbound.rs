//! Cloud-API webhook payload, reduced to the text messages the bot
//! consumes. Everything else (statuses, media, reactions) is ignored.

use serde::Deserialize;

use tiendy_core::UserId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub user: UserId,
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub from: String,
    #[serde(rename = "type", default)]
    pub message_type: String,
    pub text: Option<TextBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub body: String,
}

impl WebhookPayload {
    /// Text messages contained in the payload, in delivery order.
    pub fn text_messages(&self) -> Vec<InboundMessage> {
        self.entry
            .iter()
            .flat_map(|entry| &entry.changes)
            .flat_map(|change| &change.value.messages)
            .filter(|message| message.message_type == "text" && !message.from.is_empty())
            .filter_map(|message| {
                message.text.as_ref().map(|text| InboundMessage {
                    user: UserId(message.from.clone()),
                    text: text.body.clone(),
                })
            })
            .collect()
    }
}
