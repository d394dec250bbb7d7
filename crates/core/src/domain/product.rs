use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// Catalog entry as returned by the backend search. Prices are CLP, which
/// has no minor unit, so amounts are plain integers. A `bulk_price` of zero
/// means the product has no quantity-tier price.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub unit_price: i64,
    pub bulk_price: i64,
    pub stock: u32,
}
