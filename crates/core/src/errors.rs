use thiserror::Error;

/// Cart mutation failures. Validation failures re-prompt the current state;
/// they never transition it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("quantity must be a positive integer")]
    InvalidQuantity,
    #[error("insufficient stock: {in_cart} already in cart, {available} available")]
    StockInsufficient { in_cart: u32, available: u32 },
    #[error("product `{product_id}` is not in the cart")]
    NotInCart { product_id: String },
}
