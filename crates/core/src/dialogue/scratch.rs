use serde::{Deserialize, Serialize};

use crate::domain::order::{AmbiguousOption, OrderDraft};
use crate::domain::product::Product;

/// Per-flow working data attached to a conversation. One variant per flow
/// family: a handler asking for the search variant while the order variant
/// is active replaces it, which is what "flow restart clears scratch" means
/// in practice. Fields within the active variant are patched in place so
/// consecutive steps accumulate into the same draft.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Scratch {
    #[default]
    None,
    Search(SearchScratch),
    Order(OrderScratch),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchScratch {
    pub query: Option<String>,
    pub candidates: Vec<Product>,
    pub selected: Option<Product>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderScratch {
    pub draft: OrderDraft,
    pub ambiguous: Vec<AmbiguousOption>,
}

impl Scratch {
    /// Active search scratch, switching the variant (and discarding any
    /// order draft) if a different flow family was active.
    pub fn search_mut(&mut self) -> &mut SearchScratch {
        if !matches!(self, Self::Search(_)) {
            *self = Self::Search(SearchScratch::default());
        }
        match self {
            Self::Search(search) => search,
            _ => unreachable!("variant was just set"),
        }
    }

    pub fn order_mut(&mut self) -> &mut OrderScratch {
        if !matches!(self, Self::Order(_)) {
            *self = Self::Order(OrderScratch::default());
        }
        match self {
            Self::Order(order) => order,
            _ => unreachable!("variant was just set"),
        }
    }

    pub fn as_search(&self) -> Option<&SearchScratch> {
        match self {
            Self::Search(search) => Some(search),
            _ => None,
        }
    }

    pub fn as_order(&self) -> Option<&OrderScratch> {
        match self {
            Self::Order(order) => Some(order),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::None;
    }
}
