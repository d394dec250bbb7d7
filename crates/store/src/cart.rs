use std::collections::HashMap;
use std::sync::Mutex;

use tiendy_core::domain::cart::{self, CartLine, CartTotals};
use tiendy_core::{CartError, Product, ProductId, UserId};

/// Per-user cart lines with stock-validated mutation and quantity-tier
/// pricing. Quantities never exceed the `available_stock` observed on the
/// product at mutation time.
pub struct CartStore {
    carts: Mutex<HashMap<UserId, Vec<CartLine>>>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    pub fn new() -> Self {
        Self { carts: Mutex::new(HashMap::new()) }
    }

    /// Adds `quantity` of `product`, merging into an existing line for the
    /// same product. The merged quantity is validated against stock.
    pub fn add(
        &self,
        user: &UserId,
        product: &Product,
        quantity: u32,
    ) -> Result<(CartLine, CartTotals), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let mut carts = self.carts.lock().expect("cart mutex poisoned");
        let lines = carts.entry(user.clone()).or_default();

        let line = match lines.iter_mut().find(|line| line.product_id == product.id) {
            Some(existing) => {
                let merged = existing.quantity.saturating_add(quantity);
                if merged > product.stock {
                    return Err(CartError::StockInsufficient {
                        in_cart: existing.quantity,
                        available: product.stock,
                    });
                }
                existing.available_stock = product.stock;
                existing.set_quantity(merged);
                existing.clone()
            }
            None => {
                if quantity > product.stock {
                    return Err(CartError::StockInsufficient { in_cart: 0, available: product.stock });
                }
                let line = CartLine::new(product, quantity);
                lines.push(line.clone());
                line
            }
        };

        Ok((line, cart::totals(lines)))
    }

    /// Replaces a line's quantity, validated against the stock cached on
    /// the line.
    pub fn update_quantity(
        &self,
        user: &UserId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(CartLine, CartTotals), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let mut carts = self.carts.lock().expect("cart mutex poisoned");
        let lines = carts.entry(user.clone()).or_default();

        let line = lines
            .iter_mut()
            .find(|line| &line.product_id == product_id)
            .ok_or_else(|| CartError::NotInCart { product_id: product_id.0.clone() })?;

        if quantity > line.available_stock {
            return Err(CartError::StockInsufficient {
                in_cart: line.quantity,
                available: line.available_stock,
            });
        }

        line.set_quantity(quantity);
        let updated = line.clone();
        Ok((updated, cart::totals(lines)))
    }

    pub fn remove_line(
        &self,
        user: &UserId,
        product_id: &ProductId,
    ) -> Result<(CartLine, CartTotals), CartError> {
        let mut carts = self.carts.lock().expect("cart mutex poisoned");
        let lines = carts.entry(user.clone()).or_default();

        let index = lines
            .iter()
            .position(|line| &line.product_id == product_id)
            .ok_or_else(|| CartError::NotInCart { product_id: product_id.0.clone() })?;

        let removed = lines.remove(index);
        Ok((removed, cart::totals(lines)))
    }

    pub fn lines(&self, user: &UserId) -> Vec<CartLine> {
        let carts = self.carts.lock().expect("cart mutex poisoned");
        carts.get(user).cloned().unwrap_or_default()
    }

    pub fn totals(&self, user: &UserId) -> CartTotals {
        let carts = self.carts.lock().expect("cart mutex poisoned");
        cart::totals(carts.get(user).map(Vec::as_slice).unwrap_or_default())
    }

    pub fn has_items(&self, user: &UserId) -> bool {
        let carts = self.carts.lock().expect("cart mutex poisoned");
        carts.get(user).is_some_and(|lines| !lines.is_empty())
    }

    pub fn clear(&self, user: &UserId) {
        self.carts.lock().expect("cart mutex poisoned").remove(user);
    }
}

#[cfg(test)]
mod tests {
    use tiendy_core::{CartError, Product, ProductId, UserId};

    use super::CartStore;

    fn user() -> UserId {
        UserId::from("+56922222222")
    }

    fn product(id: &str, unit_price: i64, bulk_price: i64, stock: u32) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: id.to_string(),
            unit_price,
            bulk_price,
            stock,
        }
    }

    #[test]
    fn add_creates_then_merges_lines() {
        let store = CartStore::new();
        let miel = product("miel", 1000, 800, 10);

        let (line, totals) = store.add(&user(), &miel, 2).expect("first add");
        assert_eq!(line.quantity, 2);
        assert_eq!(totals.line_count, 1);

        let (line, totals) = store.add(&user(), &miel, 3).expect("merge add");
        assert_eq!(line.quantity, 5);
        assert!(line.bulk_price_applied);
        assert_eq!(totals.total, 4000);
    }

    #[test]
    fn quantity_never_exceeds_stock_across_mutations() {
        let store = CartStore::new();
        let miel = product("miel", 1000, 0, 5);

        store.add(&user(), &miel, 3).expect("initial add");
        let error = store.add(&user(), &miel, 3).expect_err("merge exceeds stock");
        assert_eq!(error, CartError::StockInsufficient { in_cart: 3, available: 5 });

        let error =
            store.update_quantity(&user(), &miel.id, 6).expect_err("update exceeds stock");
        assert_eq!(error, CartError::StockInsufficient { in_cart: 3, available: 5 });

        assert_eq!(store.lines(&user())[0].quantity, 3);
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let store = CartStore::new();
        let miel = product("miel", 1000, 0, 5);

        assert_eq!(store.add(&user(), &miel, 0), Err(CartError::InvalidQuantity));
        store.add(&user(), &miel, 1).expect("add");
        assert_eq!(store.update_quantity(&user(), &miel.id, 0), Err(CartError::InvalidQuantity));
    }

    #[test]
    fn missing_lines_report_not_in_cart() {
        let store = CartStore::new();
        let id = ProductId("fantasma".to_string());

        assert!(matches!(
            store.update_quantity(&user(), &id, 1),
            Err(CartError::NotInCart { .. })
        ));
        assert!(matches!(store.remove_line(&user(), &id), Err(CartError::NotInCart { .. })));
    }

    #[test]
    fn remove_returns_the_line_and_new_totals() {
        let store = CartStore::new();
        store.add(&user(), &product("miel", 1000, 0, 5), 2).expect("add miel");
        store.add(&user(), &product("te", 500, 0, 5), 1).expect("add te");

        let (removed, totals) =
            store.remove_line(&user(), &ProductId("miel".to_string())).expect("remove");
        assert_eq!(removed.name, "miel");
        assert_eq!(totals.line_count, 1);
        assert_eq!(totals.total, 500);
    }

    #[test]
    fn clear_is_idempotent() {
        let store = CartStore::new();
        store.add(&user(), &product("miel", 1000, 0, 5), 2).expect("add");
        store.clear(&user());
        store.clear(&user());
        assert!(!store.has_items(&user()));
    }
}
