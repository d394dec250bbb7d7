use serde::{Deserialize, Serialize};

use crate::domain::customer::CustomerId;
use crate::domain::product::{Product, ProductId};

/// Minimum cart total (CLP) required before delivery can be selected.
pub const MIN_DELIVERY_TOTAL: i64 = 50_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Pickup,
    Delivery,
}

impl DeliveryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Delivery => "delivery",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pickup => "Retiro en tienda",
            Self::Delivery => "Despacho a domicilio",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Courier {
    Starken,
    Chilexpress,
    CorreosChile,
}

impl Courier {
    /// Accepts either the courier name or the numeric menu choice (1-3).
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "1" => Some(Self::Starken),
            "2" => Some(Self::Chilexpress),
            "3" => Some(Self::CorreosChile),
            _ if normalized.contains("starken") => Some(Self::Starken),
            _ if normalized.contains("chilexpress") => Some(Self::Chilexpress),
            _ if normalized.contains("correos") => Some(Self::CorreosChile),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starken => "starken",
            Self::Chilexpress => "chilexpress",
            Self::CorreosChile => "correos_chile",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Starken => "Starken",
            Self::Chilexpress => "Chilexpress",
            Self::CorreosChile => "Correos de Chile",
        }
    }
}

/// Delivery/payment data accumulated across the order-capture states.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub delivery_method: Option<DeliveryMethod>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub district: Option<String>,
    pub courier: Option<Courier>,
}

impl OrderDraft {
    /// Single-line delivery address for the backend payload. Pickup orders
    /// resolve to the provided store address.
    pub fn resolved_address(&self, store_address: &str) -> Option<String> {
        match self.delivery_method? {
            DeliveryMethod::Pickup => Some(format!("Retiro en tienda: {store_address}")),
            DeliveryMethod::Delivery => {
                let address = self.address.as_deref()?;
                let district = self.district.as_deref()?;
                let city = self.city.as_deref()?;
                Some(format!("{address}, {district}, {city}"))
            }
        }
    }
}

/// One numbered choice shown while resolving an ambiguous product mention.
/// Numbers run globally across all ambiguous products of one extraction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousOption {
    pub number: u32,
    pub requested_name: String,
    pub requested_quantity: u32,
    pub product: Product,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesChannel {
    Whatsapp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Order-creation payload for the backend API.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub delivery_address: String,
    pub courier: Option<Courier>,
    pub channel: SalesChannel,
    pub payment_method: PaymentMethod,
    pub lines: Vec<NewOrderLine>,
    pub manual_discount: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CreatedOrder {
    pub order_id: String,
}
