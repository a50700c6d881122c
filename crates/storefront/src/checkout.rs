//! Checkout collaborator: order summaries over the cart's totals.
//!
//! Shipping is a step function of the cart subtotal: free at or above a
//! configured threshold, a flat fee below it. The rule lives here rather
//! than in the aggregate because thresholds are presentation-time policy
//! that changes independently of cart identity rules.
//!
//! Actual order submission (payment, fulfillment) is handled by downstream
//! services; placement here means minting an order ID and clearing the cart.

use pomelo_core::Price;
use pomelo_core::cart::Cart;

use crate::config::ShippingConfig;

/// The shipping step function.
#[derive(Debug, Clone, Copy)]
pub struct ShippingPolicy {
    free_threshold: Price,
    flat_fee: Price,
}

impl ShippingPolicy {
    /// Create a policy with the given threshold and flat fee.
    #[must_use]
    pub const fn new(free_threshold: Price, flat_fee: Price) -> Self {
        Self {
            free_threshold,
            flat_fee,
        }
    }

    /// Shipping fee for a given cart subtotal.
    ///
    /// An empty cart (zero subtotal) ships nothing and costs nothing.
    #[must_use]
    pub fn fee(&self, subtotal: Price) -> Price {
        if subtotal.is_zero() || subtotal >= self.free_threshold {
            Price::ZERO
        } else {
            self.flat_fee
        }
    }
}

impl From<ShippingConfig> for ShippingPolicy {
    fn from(config: ShippingConfig) -> Self {
        Self::new(config.free_threshold, config.flat_fee)
    }
}

/// Totals the checkout flow presents to the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderSummary {
    /// `Σ unit_price × quantity` over the cart.
    pub subtotal: Price,
    /// Step-function shipping fee.
    pub shipping_fee: Price,
    /// `subtotal + shipping_fee`.
    pub grand_total: Price,
    /// Total unit count across all lines.
    pub item_count: u32,
}

impl OrderSummary {
    /// Compute the summary for the cart's current state.
    #[must_use]
    pub fn for_cart(cart: &Cart, policy: &ShippingPolicy) -> Self {
        let subtotal = cart.total_price();
        let shipping_fee = policy.fee(subtotal);
        Self {
            subtotal,
            shipping_fee,
            grand_total: subtotal + shipping_fee,
            item_count: cart.total_item_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pomelo_core::ProductId;
    use pomelo_core::cart::CandidateItem;

    use super::*;

    fn policy() -> ShippingPolicy {
        ShippingPolicy::new(Price::from_cents(7500), Price::from_cents(599))
    }

    fn cart_worth(cents: i64, quantity: u32) -> Cart {
        let mut cart = Cart::new();
        cart.add_item(
            CandidateItem {
                product_id: ProductId::new("item"),
                name: "Item".to_owned(),
                unit_price: Price::from_cents(cents),
                list_price: None,
                category: "misc".to_owned(),
                available_stock: 100,
                storage: None,
                condition: None,
                color: None,
            },
            quantity,
        );
        cart
    }

    #[test]
    fn below_threshold_charges_flat_fee() {
        assert_eq!(policy().fee(Price::from_cents(7499)), Price::from_cents(599));
    }

    #[test]
    fn at_threshold_ships_free() {
        assert_eq!(policy().fee(Price::from_cents(7500)), Price::ZERO);
    }

    #[test]
    fn above_threshold_ships_free() {
        assert_eq!(policy().fee(Price::from_cents(100_000)), Price::ZERO);
    }

    #[test]
    fn empty_cart_has_no_shipping_fee() {
        let summary = OrderSummary::for_cart(&Cart::new(), &policy());
        assert_eq!(summary.shipping_fee, Price::ZERO);
        assert_eq!(summary.grand_total, Price::ZERO);
        assert_eq!(summary.item_count, 0);
    }

    #[test]
    fn grand_total_includes_fee_below_threshold() {
        let summary = OrderSummary::for_cart(&cart_worth(1999, 2), &policy());
        assert_eq!(summary.subtotal, Price::from_cents(3998));
        assert_eq!(summary.shipping_fee, Price::from_cents(599));
        assert_eq!(summary.grand_total, Price::from_cents(4597));
        assert_eq!(summary.item_count, 2);
    }

    #[test]
    fn grand_total_equals_subtotal_above_threshold() {
        let summary = OrderSummary::for_cart(&cart_worth(39_900, 1), &policy());
        assert_eq!(summary.shipping_fee, Price::ZERO);
        assert_eq!(summary.grand_total, summary.subtotal);
    }
}
