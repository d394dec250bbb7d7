use serde::{Deserialize, Serialize};

/// Position of a user within the dialogue. Absence of a stored record is
/// equivalent to `Initial`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatState {
    #[default]
    Initial,
    AwaitingFirstNameLastname,
    Menu,
    ProductInfo,
    OrdersMenu,
    Faq,
    ProductSearchAwaitingQuery,
    ProductSearchAwaitingSelection,
    ProductSearchShowingDetails,
    OrderAwaitingProductList,
    OrderResolvingAmbiguousProducts,
    OrderAwaitingAddMoreDecision,
    OrderAwaitingDeliveryMethod,
    OrderAwaitingAddress,
    OrderAwaitingCity,
    OrderAwaitingDistrict,
    OrderAwaitingCourier,
    OrderAwaitingConfirmation,
}

impl ChatState {
    /// States belonging to the order-capture flow.
    pub fn in_order_flow(&self) -> bool {
        matches!(
            self,
            Self::OrderAwaitingProductList
                | Self::OrderResolvingAmbiguousProducts
                | Self::OrderAwaitingAddMoreDecision
                | Self::OrderAwaitingDeliveryMethod
                | Self::OrderAwaitingAddress
                | Self::OrderAwaitingCity
                | Self::OrderAwaitingDistrict
                | Self::OrderAwaitingCourier
                | Self::OrderAwaitingConfirmation
        )
    }

    /// States where free-text classification is suppressed: the user is
    /// answering a fixed prompt, so their reply must not be re-interpreted.
    pub fn in_menu_flow(&self) -> bool {
        matches!(
            self,
            Self::Menu | Self::AwaitingFirstNameLastname | Self::ProductSearchAwaitingSelection
        ) || self.in_order_flow()
    }

    /// States where the user is actively working with products; help-intent
    /// and sentiment short-circuits are suppressed here.
    pub fn in_product_context(&self) -> bool {
        matches!(
            self,
            Self::ProductInfo
                | Self::ProductSearchAwaitingQuery
                | Self::ProductSearchAwaitingSelection
                | Self::ProductSearchShowingDetails
                | Self::OrderAwaitingProductList
                | Self::OrderResolvingAmbiguousProducts
                | Self::OrderAwaitingAddMoreDecision
        )
    }

    /// States where a greeting re-enters the welcome flow.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Initial | Self::Menu | Self::OrdersMenu | Self::Faq)
    }
}
