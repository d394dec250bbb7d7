//! Product/quantity extraction from free text.
//!
//! Two-stage strategy: an LLM-backed primary extractor and a deterministic
//! keyword fallback behind one trait, composed by `FailoverExtractor` so a
//! collaborator failure never reaches the user as a raw error.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::llm::{LlmClient, LlmError};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ExtractedItem {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "cantidad", default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[async_trait]
pub trait ProductExtractor: Send + Sync {
    /// Single product term, `None` when no product is mentioned.
    async fn extract_single_term(&self, text: &str) -> Result<Option<String>, LlmError>;

    /// All mentioned products with quantities (quantity defaults to 1).
    async fn extract_with_quantities(&self, text: &str) -> Result<Vec<ExtractedItem>, LlmError>;
}

pub struct LlmExtractor<C> {
    client: C,
}

impl<C> LlmExtractor<C>
where
    C: LlmClient,
{
    pub fn new(client: C) -> Self {
        Self { client }
    }
}

const SINGLE_TERM_PROMPT: &str = "Extrae el nombre del producto mencionado en el mensaje de un \
cliente. Responde únicamente con el nombre del producto, sin explicaciones. Si no se menciona \
ningún producto responde NINGUNO.\n\nMensaje: ";

const MULTI_ITEM_PROMPT: &str = "Extrae los productos y cantidades mencionados en el pedido de \
un cliente. Responde únicamente con un arreglo JSON de objetos {\"nombre\": string, \
\"cantidad\": number}. Si no se menciona cantidad usa 1. Si no hay productos responde [].\n\n\
Pedido: ";

#[async_trait]
impl<C> ProductExtractor for LlmExtractor<C>
where
    C: LlmClient,
{
    async fn extract_single_term(&self, text: &str) -> Result<Option<String>, LlmError> {
        let completion = self.client.complete(&format!("{SINGLE_TERM_PROMPT}{text}")).await?;
        Ok(parse_single_term(&completion))
    }

    async fn extract_with_quantities(&self, text: &str) -> Result<Vec<ExtractedItem>, LlmError> {
        let completion = self.client.complete(&format!("{MULTI_ITEM_PROMPT}{text}")).await?;
        parse_items(&completion)
    }
}

fn parse_single_term(completion: &str) -> Option<String> {
    let term = completion.trim().trim_matches(['"', '`', '.']).trim();
    if term.is_empty() {
        return None;
    }
    let upper = term.to_uppercase();
    if upper == "NINGUNO" || upper == "NONE" || upper == "NULL" {
        return None;
    }
    Some(term.to_lowercase())
}

fn parse_items(completion: &str) -> Result<Vec<ExtractedItem>, LlmError> {
    let start = completion.find('[');
    let end = completion.rfind(']');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &completion[start..=end],
        _ => return Err(LlmError::Decode("completion did not contain a JSON array".to_string())),
    };

    let items: Vec<ExtractedItem> =
        serde_json::from_str(json).map_err(|error| LlmError::Decode(error.to_string()))?;

    Ok(items
        .into_iter()
        .filter(|item| !item.name.trim().is_empty())
        .map(|item| ExtractedItem {
            name: item.name.trim().to_lowercase(),
            quantity: item.quantity.max(1),
        })
        .collect())
}

/// Deterministic keyword-based extractor. Strips filler words and pairs
/// leading numbers with the remaining tokens of each comma-separated
/// segment.
#[derive(Clone, Debug, Default)]
pub struct KeywordExtractor;

const FILLER_WORDS: &[&str] = &[
    "hola", "quiero", "quisiera", "necesito", "busco", "dame", "envíame", "enviame", "tienen",
    "tienes", "venden", "hay", "precio", "precios", "cuanto", "cuánto", "cuesta", "vale", "sale",
    "saber", "comprar", "pedir", "pedido", "encargar", "me", "interesa", "interesan", "el", "la",
    "los", "las", "un", "una", "unos", "unas", "de", "del", "al", "a", "y", "o", "que", "qué",
    "por", "favor", "para", "mi", "su", "es", "son", "cual", "cuál", "como", "cómo",
];

fn is_filler(token: &str) -> bool {
    FILLER_WORDS.contains(&token)
}

fn sanitize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() || c == ',' || c == ':' { c } else { ' ' })
        .collect()
}

impl KeywordExtractor {
    fn term_from(&self, text: &str) -> Option<String> {
        let sanitized = sanitize(text);
        let tokens: Vec<&str> = sanitized
            .split([',', ':'])
            .flat_map(str::split_whitespace)
            .filter(|token| !is_filler(token) && token.parse::<u32>().is_err())
            .take(3)
            .collect();

        if tokens.is_empty() {
            None
        } else {
            Some(tokens.join(" "))
        }
    }

    fn items_from(&self, text: &str) -> Vec<ExtractedItem> {
        let sanitized = sanitize(text);
        let mut items = Vec::new();

        for segment in sanitized.split(',') {
            let mut quantity = None;
            let mut name_tokens = Vec::new();

            for token in segment.split_whitespace() {
                if let Ok(number) = token.parse::<u32>() {
                    if quantity.is_none() && number > 0 {
                        quantity = Some(number);
                    }
                } else if !is_filler(token) {
                    name_tokens.push(token);
                }
            }

            if !name_tokens.is_empty() {
                items.push(ExtractedItem {
                    name: name_tokens.join(" "),
                    quantity: quantity.unwrap_or(1),
                });
            }
        }

        items
    }
}

#[async_trait]
impl ProductExtractor for KeywordExtractor {
    async fn extract_single_term(&self, text: &str) -> Result<Option<String>, LlmError> {
        Ok(self.term_from(text))
    }

    async fn extract_with_quantities(&self, text: &str) -> Result<Vec<ExtractedItem>, LlmError> {
        Ok(self.items_from(text))
    }
}

/// Primary extractor with a deterministic fallback. The fallback also
/// absorbs the primary's errors, so callers always get a usable result.
pub struct FailoverExtractor<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FailoverExtractor<P, F>
where
    P: ProductExtractor,
    F: ProductExtractor,
{
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl<P, F> ProductExtractor for FailoverExtractor<P, F>
where
    P: ProductExtractor,
    F: ProductExtractor,
{
    async fn extract_single_term(&self, text: &str) -> Result<Option<String>, LlmError> {
        match self.primary.extract_single_term(text).await {
            Ok(term) => Ok(term),
            Err(error) => {
                warn!(error = %error, "primary extractor failed, using keyword fallback");
                self.fallback.extract_single_term(text).await
            }
        }
    }

    async fn extract_with_quantities(&self, text: &str) -> Result<Vec<ExtractedItem>, LlmError> {
        match self.primary.extract_with_quantities(text).await {
            Ok(items) => Ok(items),
            Err(error) => {
                warn!(error = %error, "primary extractor failed, using keyword fallback");
                self.fallback.extract_with_quantities(text).await
            }
        }
    }
}
