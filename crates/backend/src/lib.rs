pub mod client;

pub use client::{
    BackendClient, BackendError, CatalogSearcher, CustomerDirectory, CustomerLookup,
    OrderSubmitter,
};
