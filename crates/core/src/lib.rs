pub mod classify;
pub mod config;
pub mod dialogue;
pub mod domain;
pub mod errors;

pub use dialogue::scratch::{OrderScratch, Scratch, SearchScratch};
pub use dialogue::states::ChatState;
pub use domain::cart::{CartLine, CartTotals, BULK_THRESHOLD};
pub use domain::customer::{Customer, CustomerId};
pub use domain::order::{
    AmbiguousOption, Courier, CreatedOrder, DeliveryMethod, NewOrder, NewOrderLine, OrderDraft,
    MIN_DELIVERY_TOTAL,
};
pub use domain::product::{Product, ProductId};
pub use domain::user::UserId;
pub use errors::CartError;
