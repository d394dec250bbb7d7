//! Pure text detectors used by the dialogue router. Each detector is
//! independent of conversation state; the router alone interprets their
//! output against the current state.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Greeting,
    Farewell,
    ProductQuery,
    Faq,
    None,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub matched: bool,
    pub category: Category,
    pub confidence: f32,
}

impl Detection {
    fn hit(category: Category, confidence: f32) -> Self {
        Self { matched: true, category, confidence }
    }

    fn miss() -> Self {
        Self { matched: false, category: Category::None, confidence: 0.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaqTopic {
    Hours,
    Shipping,
    Payment,
    Returns,
}

pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Bare single digits are reserved for menu selection and never classified.
pub fn is_single_digit(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.len() == 1 && trimmed.chars().all(|c| c.is_ascii_digit())
}

const GREETINGS: &[&str] = &[
    "hola",
    "buenas",
    "buenos dias",
    "buenos días",
    "buenas tardes",
    "buenas noches",
    "que tal",
    "qué tal",
    "hey",
];

pub fn detect_greeting(text: &str) -> Detection {
    let normalized = normalize(text);
    let cleaned = normalized.trim_matches(|c: char| !c.is_alphanumeric());
    if GREETINGS.iter().any(|greeting| {
        cleaned == *greeting || cleaned.starts_with(&format!("{greeting} "))
    }) {
        return Detection::hit(Category::Greeting, 0.9);
    }
    Detection::miss()
}

const FAREWELLS: &[&str] = &[
    "chao",
    "chau",
    "adios",
    "adiós",
    "hasta luego",
    "hasta pronto",
    "nos vemos",
    "bye",
    "gracias",
    "muchas gracias",
];

pub fn detect_farewell(text: &str) -> Detection {
    let normalized = normalize(text);
    if FAREWELLS.iter().any(|farewell| normalized.contains(farewell)) {
        return Detection::hit(Category::Farewell, 0.9);
    }
    Detection::miss()
}

const PRODUCT_QUERY_MARKERS: &[&str] = &[
    "tienen ",
    "tienes ",
    "hay ",
    "busco ",
    "venden ",
    "me interesa ",
    "quiero saber de ",
    "precio de ",
    "cuanto cuesta",
    "cuánto cuesta",
    "cuanto vale",
    "cuánto vale",
    "cuanto sale",
    "cuánto sale",
];

/// Pattern-based product-question heuristic, independent of the LLM call.
pub fn detect_product_query(text: &str) -> Detection {
    let normalized = normalize(text);
    if PRODUCT_QUERY_MARKERS.iter().any(|marker| normalized.contains(marker)) {
        return Detection::hit(Category::ProductQuery, 0.75);
    }
    Detection::miss()
}

pub fn detect_faq_topic(text: &str) -> Option<FaqTopic> {
    let normalized = normalize(text);
    if normalized.contains("horario") || normalized.contains("abren") || normalized.contains("cierran")
    {
        return Some(FaqTopic::Hours);
    }
    if normalized.contains("despacho")
        || normalized.contains("envio")
        || normalized.contains("envío")
        || normalized.contains("entrega")
    {
        return Some(FaqTopic::Shipping);
    }
    if normalized.contains("pago") || normalized.contains("transferencia") {
        return Some(FaqTopic::Payment);
    }
    if normalized.contains("devolucion")
        || normalized.contains("devolución")
        || normalized.contains("cambio")
    {
        return Some(FaqTopic::Returns);
    }
    None
}

/// Exact main-menu shortcut.
pub fn is_menu_keyword(text: &str) -> bool {
    let normalized = normalize(text);
    normalized == "menu" || normalized == "menú"
}

const ORDER_INTENT_MARKERS: &[&str] =
    &["pedido", "pedir", "ordenar", "comprar", "quiero hacer un pedido", "encargar"];

pub fn has_order_intent(text: &str) -> bool {
    let normalized = normalize(text);
    ORDER_INTENT_MARKERS.iter().any(|marker| normalized.contains(marker))
}

const CART_MARKERS: &[&str] = &["carrito", "carro", "mi compra", "ver compra"];

pub fn has_cart_keyword(text: &str) -> bool {
    let normalized = normalize(text);
    CART_MARKERS.iter().any(|marker| normalized.contains(marker))
}

const PRICE_INQUIRY_MARKERS: &[&str] =
    &["precio", "precios", "catalogo", "catálogo", "consultar producto", "que productos", "qué productos"];

pub fn has_price_inquiry(text: &str) -> bool {
    let normalized = normalize(text);
    PRICE_INQUIRY_MARKERS.iter().any(|marker| normalized.contains(marker))
}

pub fn is_affirmative(text: &str) -> bool {
    let normalized = normalize(text);
    matches!(normalized.as_str(), "si" | "sí" | "1" | "ok" | "dale" | "ya" | "bueno")
        || normalized.starts_with("si ")
        || normalized.starts_with("sí ")
        || normalized.contains("agregar")
}

pub fn is_negative(text: &str) -> bool {
    let normalized = normalize(text);
    matches!(normalized.as_str(), "no" | "2" | "otro" | "otra")
        || normalized.starts_with("no ")
        || normalized.contains("buscar otro")
}
