use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use tiendy_core::config::BackendConfig;
use tiendy_core::{CreatedOrder, Customer, CustomerId, NewOrder, Product, ProductId};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend transport failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend api error {status}: {detail}")]
    Api { status: u16, detail: String },
    #[error("backend response could not be decoded: {0}")]
    Decode(String),
}

#[async_trait]
pub trait CatalogSearcher: Send + Sync {
    /// Searches the catalog; a backend "not found" is an empty result, not
    /// an error.
    async fn search_products(&self, term: &str, limit: u32) -> Result<Vec<Product>, BackendError>;
}

#[async_trait]
pub trait OrderSubmitter: Send + Sync {
    async fn create_order(&self, order: &NewOrder) -> Result<CreatedOrder, BackendError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerLookup {
    pub registered: bool,
    pub customer: Option<Customer>,
}

#[async_trait]
pub trait CustomerDirectory: Send + Sync {
    async fn validate_by_phone(&self, phone: &str) -> Result<CustomerLookup, BackendError>;
    async fn register_customer(
        &self,
        phone: &str,
        full_name: &str,
    ) -> Result<Customer, BackendError>;
}

/// REST client for the commerce backend.
pub struct BackendClient {
    client: Client,
    base_url: String,
    api_key: Option<SecretString>,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(api_key) => builder.bearer_auth(api_key.expose_secret()),
            None => builder,
        }
    }

    async fn error_from(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|error| error.message)
            .unwrap_or_else(|_| truncate(&body));
        BackendError::Api { status, detail }
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &body[..end])
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize)]
struct ProductDto {
    id: String,
    name: String,
    unit_price: i64,
    #[serde(default)]
    bulk_price: i64,
    stock: u32,
}

impl From<ProductDto> for Product {
    fn from(dto: ProductDto) -> Self {
        Self {
            id: ProductId(dto.id),
            name: dto.name,
            unit_price: dto.unit_price,
            bulk_price: dto.bulk_price,
            stock: dto.stock,
        }
    }
}

#[derive(Deserialize)]
struct CustomerDto {
    id: String,
    name: String,
    #[serde(default)]
    phone: String,
}

impl CustomerDto {
    fn into_customer(self, phone: &str) -> Customer {
        let phone = if self.phone.is_empty() { phone.to_string() } else { self.phone };
        Customer { id: CustomerId(self.id), name: self.name, phone }
    }
}

#[derive(Deserialize)]
struct ValidateResponse {
    registered: bool,
    customer: Option<CustomerDto>,
}

#[async_trait]
impl CatalogSearcher for BackendClient {
    async fn search_products(&self, term: &str, limit: u32) -> Result<Vec<Product>, BackendError> {
        let url = format!("{}/api/products/search", self.base_url);
        let response = self
            .request(self.client.get(&url).query(&[("q", term), ("limit", &limit.to_string())]))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let products: Vec<ProductDto> =
            response.json().await.map_err(|error| BackendError::Decode(error.to_string()))?;
        Ok(products.into_iter().map(Product::from).collect())
    }
}

#[async_trait]
impl OrderSubmitter for BackendClient {
    async fn create_order(&self, order: &NewOrder) -> Result<CreatedOrder, BackendError> {
        let url = format!("{}/api/orders", self.base_url);
        let response = self.request(self.client.post(&url).json(order)).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        response.json().await.map_err(|error| BackendError::Decode(error.to_string()))
    }
}

#[async_trait]
impl CustomerDirectory for BackendClient {
    async fn validate_by_phone(&self, phone: &str) -> Result<CustomerLookup, BackendError> {
        let url = format!("{}/api/customers/validate", self.base_url);
        let response =
            self.request(self.client.get(&url).query(&[("phone", phone)])).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(CustomerLookup { registered: false, customer: None });
        }
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let parsed: ValidateResponse =
            response.json().await.map_err(|error| BackendError::Decode(error.to_string()))?;
        Ok(CustomerLookup {
            registered: parsed.registered,
            customer: parsed.customer.map(|dto| dto.into_customer(phone)),
        })
    }

    async fn register_customer(
        &self,
        phone: &str,
        full_name: &str,
    ) -> Result<Customer, BackendError> {
        let url = format!("{}/api/customers", self.base_url);
        let response = self
            .request(
                self.client
                    .post(&url)
                    .json(&serde_json::json!({ "phone": phone, "name": full_name })),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let customer: CustomerDto =
            response.json().await.map_err(|error| BackendError::Decode(error.to_string()))?;
        Ok(customer.into_customer(phone))
    }
}

#[cfg(test)]
mod tests {
    use tiendy_core::Product;

    use super::{truncate, ProductDto};

    #[test]
    fn product_dto_maps_into_the_domain_type() {
        let dto = ProductDto {
            id: "p-1".to_string(),
            name: "Miel de ulmo".to_string(),
            unit_price: 5990,
            bulk_price: 4990,
            stock: 12,
        };

        let product = Product::from(dto);
        assert_eq!(product.id.0, "p-1");
        assert_eq!(product.bulk_price, 4990);
        assert_eq!(product.stock, 12);
    }

    #[test]
    fn long_error_bodies_are_truncated_for_users() {
        let body = "x".repeat(500);
        let detail = truncate(&body);
        assert!(detail.chars().count() <= 201);
        assert!(detail.ends_with('…'));
    }

    #[test]
    fn short_error_bodies_pass_through() {
        assert_eq!(truncate("stock agotado"), "stock agotado");
    }
}
