use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId};

/// Minimum quantity at which the bulk price applies.
pub const BULK_THRESHOLD: u32 = 5;

/// One product's quantity and computed pricing within an in-progress order.
///
/// `available_stock` is the stock observed when the line was created or
/// last merged; quantity mutations are validated against it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: u32,
    pub unit_price: i64,
    pub bulk_price: i64,
    pub available_stock: u32,
    pub applied_price: i64,
    pub line_total: i64,
    pub bulk_price_applied: bool,
}

impl CartLine {
    pub fn new(product: &Product, quantity: u32) -> Self {
        let mut line = Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity,
            unit_price: product.unit_price,
            bulk_price: product.bulk_price,
            available_stock: product.stock,
            applied_price: 0,
            line_total: 0,
            bulk_price_applied: false,
        };
        line.reprice();
        line
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.reprice();
    }

    fn reprice(&mut self) {
        self.bulk_price_applied = bulk_applies(self.unit_price, self.bulk_price, self.quantity);
        self.applied_price =
            if self.bulk_price_applied { self.bulk_price } else { self.unit_price };
        self.line_total = self.applied_price.saturating_mul(i64::from(self.quantity));
    }

    fn subtotal_at_unit_price(&self) -> i64 {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }
}

fn bulk_applies(unit_price: i64, bulk_price: i64, quantity: u32) -> bool {
    quantity >= BULK_THRESHOLD && bulk_price > 0 && bulk_price < unit_price
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal_at_unit_price: i64,
    pub discount: i64,
    pub total: i64,
    pub line_count: usize,
    pub unit_count: u32,
    pub discounted_line_count: usize,
}

pub fn totals(lines: &[CartLine]) -> CartTotals {
    let subtotal_at_unit_price = lines.iter().map(CartLine::subtotal_at_unit_price).sum();
    let total = lines.iter().map(|line| line.line_total).sum();

    CartTotals {
        subtotal_at_unit_price,
        discount: subtotal_at_unit_price - total,
        total,
        line_count: lines.len(),
        unit_count: lines.iter().map(|line| line.quantity).sum(),
        discounted_line_count: lines.iter().filter(|line| line.bulk_price_applied).count(),
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::product::{Product, ProductId};

    use super::{totals, CartLine};

    fn product(unit_price: i64, bulk_price: i64, stock: u32) -> Product {
        Product {
            id: ProductId("prod-1".to_string()),
            name: "Almendras".to_string(),
            unit_price,
            bulk_price,
            stock,
        }
    }

    #[test]
    fn bulk_price_applies_at_threshold() {
        let line = CartLine::new(&product(1000, 800, 10), 5);
        assert_eq!(line.applied_price, 800);
        assert_eq!(line.line_total, 4000);
        assert!(line.bulk_price_applied);
    }

    #[test]
    fn unit_price_applies_below_threshold() {
        let line = CartLine::new(&product(1000, 800, 10), 4);
        assert_eq!(line.applied_price, 1000);
        assert_eq!(line.line_total, 4000);
        assert!(!line.bulk_price_applied);
    }

    #[test]
    fn bulk_price_ignored_when_zero_or_not_a_discount() {
        let no_bulk = CartLine::new(&product(1000, 0, 10), 8);
        assert_eq!(no_bulk.applied_price, 1000);
        assert!(!no_bulk.bulk_price_applied);

        let inverted = CartLine::new(&product(1000, 1200, 10), 8);
        assert_eq!(inverted.applied_price, 1000);
        assert!(!inverted.bulk_price_applied);
    }

    #[test]
    fn repricing_follows_quantity_changes() {
        let mut line = CartLine::new(&product(1000, 800, 10), 2);
        assert_eq!(line.line_total, 2000);

        line.set_quantity(6);
        assert_eq!(line.applied_price, 800);
        assert_eq!(line.line_total, 4800);

        line.set_quantity(3);
        assert_eq!(line.applied_price, 1000);
        assert_eq!(line.line_total, 3000);
    }

    #[test]
    fn totals_report_discount_against_unit_pricing() {
        let lines = vec![
            CartLine::new(&product(1000, 800, 10), 5),
            CartLine::new(&product(500, 0, 20), 2),
        ];

        let summary = totals(&lines);
        assert_eq!(summary.subtotal_at_unit_price, 6000);
        assert_eq!(summary.total, 5000);
        assert_eq!(summary.discount, 1000);
        assert_eq!(summary.line_count, 2);
        assert_eq!(summary.unit_count, 7);
        assert_eq!(summary.discounted_line_count, 1);
    }

    #[test]
    fn totals_are_idempotent_without_mutation() {
        let lines = vec![CartLine::new(&product(1500, 1200, 30), 7)];
        let first = totals(&lines);
        let second = totals(&lines);

        assert_eq!(first, second);
        assert_eq!(first.discount, first.subtotal_at_unit_price - first.total);
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let summary = totals(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.discount, 0);
        assert_eq!(summary.line_count, 0);
        assert_eq!(summary.unit_count, 0);
    }
}
