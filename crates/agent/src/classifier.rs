use async_trait::async_trait;

use tiendy_core::classify;

use crate::llm::LlmError;

#[derive(Clone, Debug, PartialEq)]
pub struct CannedReply {
    pub reply: String,
    pub confidence: f32,
}

/// Classification outcome for one inbound message. The router interprets
/// each field against the current dialogue state; the classifier never
/// touches flow state itself.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MessageAnalysis {
    pub canned_reply: Option<CannedReply>,
    pub greeting: bool,
    pub farewell: bool,
    pub help_confidence: f32,
    pub sentiment_score: f32,
}

#[async_trait]
pub trait MessageClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<MessageAnalysis, LlmError>;
}

/// Deterministic classifier built from the pure detectors plus small
/// keyword tables for help intent, sentiment and canned replies.
#[derive(Clone, Debug, Default)]
pub struct RuleBasedClassifier;

const HELP_MARKERS: &[&str] = &[
    "ayuda",
    "ayudame",
    "ayúdame",
    "no entiendo",
    "como funciona",
    "cómo funciona",
    "que puedo hacer",
    "qué puedo hacer",
    "estoy perdido",
    "estoy perdida",
];

const NEGATIVE_MARKERS: &[&str] = &[
    "pesimo", "pésimo", "malo", "mala", "terrible", "horrible", "molesto", "molesta", "enojado",
    "enojada", "furioso", "furiosa", "indignante", "nunca mas", "nunca más", "reclamo", "queja",
];

const POSITIVE_MARKERS: &[&str] =
    &["excelente", "genial", "buenisimo", "buenísimo", "perfecto", "me encanta", "felicitaciones"];

const CANNED_REPLIES: &[(&str, &str)] = &[
    (
        "donde estan ubicados",
        "Estamos en Av. Providencia 1234, Santiago. ¡Te esperamos! 🏪",
    ),
    (
        "dónde están ubicados",
        "Estamos en Av. Providencia 1234, Santiago. ¡Te esperamos! 🏪",
    ),
    (
        "hacen factura",
        "Sí, emitimos boleta y factura. Indícanos los datos al confirmar tu pedido. 🧾",
    ),
];

impl RuleBasedClassifier {
    fn help_confidence(normalized: &str) -> f32 {
        if HELP_MARKERS.iter().any(|marker| normalized.contains(marker)) {
            0.8
        } else {
            0.0
        }
    }

    fn sentiment_score(normalized: &str) -> f32 {
        let negatives =
            NEGATIVE_MARKERS.iter().filter(|marker| normalized.contains(*marker)).count() as f32;
        let positives =
            POSITIVE_MARKERS.iter().filter(|marker| normalized.contains(*marker)).count() as f32;
        (positives * 0.4 - negatives * 0.4).clamp(-1.0, 1.0)
    }

    fn canned_reply(normalized: &str) -> Option<CannedReply> {
        CANNED_REPLIES.iter().find(|(question, _)| normalized.contains(question)).map(
            |(_, reply)| CannedReply { reply: (*reply).to_string(), confidence: 0.9 },
        )
    }
}

#[async_trait]
impl MessageClassifier for RuleBasedClassifier {
    async fn classify(&self, text: &str) -> Result<MessageAnalysis, LlmError> {
        let normalized = classify::normalize(text);

        Ok(MessageAnalysis {
            canned_reply: Self::canned_reply(&normalized),
            greeting: classify::detect_greeting(text).matched,
            farewell: classify::detect_farewell(text).matched,
            help_confidence: Self::help_confidence(&normalized),
            sentiment_score: Self::sentiment_score(&normalized),
        })
    }
}
