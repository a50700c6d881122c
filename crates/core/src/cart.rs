//! The cart aggregate: line items keyed by a composite identity.
//!
//! A cart is an ordered sequence of [`LineItem`]s. Each item is uniquely
//! identified by its [`LineKey`] (product plus variant fields); adding a
//! product whose key matches an existing item accumulates quantity instead of
//! creating a duplicate. Quantities are clamped to `1..=available_stock`,
//! never rejected.
//!
//! Every operation is total: missing items and out-of-range quantities
//! resolve via clamping or no-op, so no operation returns an error. Mutations
//! that can clamp report the requested and actually-applied amounts through
//! [`QuantityChange`] so callers can tell the user when a request was only
//! partially honored.
//!
//! The aggregate performs no I/O. `available_stock` is supplied by the caller
//! from a prior catalog lookup; staleness between that lookup and the
//! mutation is accepted and resolved at order placement.

use serde::{Deserialize, Serialize};

use crate::types::{Condition, Price, ProductId, StorageCapacity};

/// The identity key of a line item.
///
/// Two additions merge into one line item exactly when their keys are equal.
/// Absent variant fields are part of the identity: `None` is a distinct
/// canonical value, not equal to an empty string, so "iPhone 13, no storage
/// selected" and "iPhone 13, 128GB" are different line items.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    /// Opaque identifier of the underlying product.
    pub product_id: ProductId,
    /// Storage capacity variant, if the product has one.
    pub storage: Option<StorageCapacity>,
    /// Cosmetic grade variant, if the product has one.
    pub condition: Option<Condition>,
    /// Free-form color variant, if the product has one.
    pub color: Option<String>,
}

impl LineKey {
    /// Key for a product with no variant fields selected.
    #[must_use]
    pub const fn bare(product_id: ProductId) -> Self {
        Self {
            product_id,
            storage: None,
            condition: None,
            color: None,
        }
    }
}

/// A candidate for insertion into the cart: every [`LineItem`] field except
/// the quantity, as supplied by the catalog collaborator at add time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateItem {
    /// Opaque identifier of the underlying product.
    pub product_id: ProductId,
    /// Display name.
    pub name: String,
    /// Price per unit.
    pub unit_price: Price,
    /// Optional pre-discount reference price.
    pub list_price: Option<Price>,
    /// Classification tag, display-only.
    pub category: String,
    /// Upper bound on quantity, from the catalog at lookup time.
    pub available_stock: u32,
    /// Storage capacity variant.
    pub storage: Option<StorageCapacity>,
    /// Cosmetic grade variant.
    pub condition: Option<Condition>,
    /// Free-form color variant.
    pub color: Option<String>,
}

impl CandidateItem {
    /// The identity key this candidate would occupy in the cart.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            storage: self.storage,
            condition: self.condition,
            color: self.color.clone(),
        }
    }
}

/// One distinct purchasable configuration in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Opaque identifier of the underlying product.
    pub product_id: ProductId,
    /// Display name.
    pub name: String,
    /// Price per unit.
    pub unit_price: Price,
    /// Optional pre-discount reference price.
    pub list_price: Option<Price>,
    /// Classification tag, display-only.
    pub category: String,
    /// Upper bound on quantity, from the catalog at add or last refresh.
    pub available_stock: u32,
    /// Count of this configuration in the cart. Always in
    /// `1..=available_stock`.
    pub quantity: u32,
    /// Storage capacity variant.
    pub storage: Option<StorageCapacity>,
    /// Cosmetic grade variant.
    pub condition: Option<Condition>,
    /// Free-form color variant.
    pub color: Option<String>,
}

impl LineItem {
    fn from_candidate(candidate: CandidateItem, quantity: u32) -> Self {
        Self {
            product_id: candidate.product_id,
            name: candidate.name,
            unit_price: candidate.unit_price,
            list_price: candidate.list_price,
            category: candidate.category,
            available_stock: candidate.available_stock,
            quantity,
            storage: candidate.storage,
            condition: candidate.condition,
            color: candidate.color,
        }
    }

    fn into_parts(self) -> (CandidateItem, u32) {
        let quantity = self.quantity;
        let candidate = CandidateItem {
            product_id: self.product_id,
            name: self.name,
            unit_price: self.unit_price,
            list_price: self.list_price,
            category: self.category,
            available_stock: self.available_stock,
            storage: self.storage,
            condition: self.condition,
            color: self.color,
        };
        (candidate, quantity)
    }

    /// The identity key of this line item.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id.clone(),
            storage: self.storage,
            condition: self.condition,
            color: self.color.clone(),
        }
    }

    /// `unit_price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price * self.quantity
    }
}

/// Outcome of a quantity-affecting mutation.
///
/// `applied` is the delta actually added; it is less than `requested` when
/// the mutation was clamped against `available_stock` (or the candidate was
/// out of stock entirely, in which case it is 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityChange {
    /// Quantity the caller asked for.
    pub requested: u32,
    /// Quantity actually applied after clamping.
    pub applied: u32,
}

impl QuantityChange {
    /// Whether the request was only partially honored.
    #[must_use]
    pub const fn is_clamped(&self) -> bool {
        self.applied < self.requested
    }
}

/// An ordered collection of [`LineItem`]s, at most one per [`LineKey`].
///
/// Insertion order is preserved for stable display. The aggregate is not
/// directly deserializable: persisted line sequences re-enter through
/// [`Cart::from_lines`], which re-applies the identity and clamping
/// invariants instead of trusting stored data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<LineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Rebuild a cart from a persisted line sequence.
    ///
    /// Each line re-enters through [`Cart::add_item`], so duplicate keys are
    /// merged and over-stock quantities are clamped even if the stored value
    /// was tampered with or produced by an older version.
    #[must_use]
    pub fn from_lines(lines: Vec<LineItem>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            let (candidate, quantity) = line.into_parts();
            cart.add_item(candidate, quantity);
        }
        cart
    }

    /// Add `quantity` units of `candidate` to the cart.
    ///
    /// If a line item with the candidate's identity key already exists, its
    /// quantity becomes `min(existing + quantity, candidate.available_stock)`
    /// and its stock and display fields are refreshed from the candidate.
    /// Otherwise a new line item is appended with
    /// `min(quantity, available_stock)`.
    ///
    /// Never fails. A zero `quantity` or an out-of-stock candidate applies
    /// nothing; overflow past `available_stock` is silently clamped. The
    /// returned [`QuantityChange`] carries the requested/applied delta so
    /// callers can surface the clamp.
    pub fn add_item(&mut self, candidate: CandidateItem, quantity: u32) -> QuantityChange {
        let requested = quantity;

        // An out-of-stock candidate can neither create a line item nor keep
        // an existing one inside the quantity invariant; leave the cart
        // untouched.
        if candidate.available_stock == 0 {
            return QuantityChange {
                requested,
                applied: 0,
            };
        }

        let key = candidate.key();
        if let Some(line) = self.lines.iter_mut().find(|line| line.key() == key) {
            let before = line.quantity;
            let merged = before
                .saturating_add(quantity)
                .min(candidate.available_stock)
                .max(1);

            *line = LineItem::from_candidate(candidate, merged);
            return QuantityChange {
                requested,
                applied: merged.saturating_sub(before),
            };
        }

        let applied = quantity.min(candidate.available_stock);
        if applied > 0 {
            self.lines.push(LineItem::from_candidate(candidate, applied));
        }
        QuantityChange { requested, applied }
    }

    /// Remove the line item exactly matching `key`.
    ///
    /// Returns whether an item was removed; a miss is a no-op.
    pub fn remove_item(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.key() != *key);
        self.lines.len() != before
    }

    /// Set the quantity of the line item matching `key` to
    /// `clamp(quantity, 1, available_stock)`.
    ///
    /// The floor of 1 is enforced; use [`Cart::remove_item`] to delete.
    /// Returns the resulting quantity, or `None` if no item matched.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: u32) -> Option<u32> {
        let line = self.lines.iter_mut().find(|line| line.key() == *key)?;
        line.quantity = quantity.clamp(1, line.available_stock);
        Some(line.quantity)
    }

    /// Empty the cart unconditionally. Idempotent.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// `Σ unit_price × quantity` over all line items.
    #[must_use]
    pub fn total_price(&self) -> Price {
        self.lines.iter().map(LineItem::line_total).sum()
    }

    /// `Σ quantity` over all line items.
    #[must_use]
    pub fn total_item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// The line items in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Consume the cart, yielding its line sequence for persistence.
    #[must_use]
    pub fn into_lines(self) -> Vec<LineItem> {
        self.lines
    }

    /// Whether the cart holds no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct line items (not total quantity).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone(stock: u32) -> CandidateItem {
        CandidateItem {
            product_id: ProductId::new("iphone-13"),
            name: "iPhone 13".to_owned(),
            unit_price: Price::from_cents(39_900),
            list_price: Some(Price::from_cents(59_900)),
            category: "smartphones".to_owned(),
            available_stock: stock,
            storage: Some(StorageCapacity::Gb128),
            condition: Some(Condition::Excellent),
            color: Some("midnight".to_owned()),
        }
    }

    fn tablet(stock: u32) -> CandidateItem {
        CandidateItem {
            product_id: ProductId::new("ipad-air-5"),
            name: "iPad Air 5".to_owned(),
            unit_price: Price::from_cents(44_900),
            list_price: None,
            category: "tablets".to_owned(),
            available_stock: stock,
            storage: Some(StorageCapacity::Gb64),
            condition: Some(Condition::Good),
            color: None,
        }
    }

    #[test]
    fn adding_same_key_twice_merges_into_one_line() {
        let mut cart = Cart::new();
        cart.add_item(phone(10), 2);
        cart.add_item(phone(10), 3);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn different_variants_stay_distinct_lines() {
        let mut cart = Cart::new();
        cart.add_item(phone(10), 1);

        let mut other_storage = phone(10);
        other_storage.storage = Some(StorageCapacity::Gb256);
        cart.add_item(other_storage, 1);

        let mut other_color = phone(10);
        other_color.color = Some("starlight".to_owned());
        cart.add_item(other_color, 1);

        assert_eq!(cart.len(), 3);
        assert_eq!(cart.total_item_count(), 3);
    }

    #[test]
    fn absent_variant_is_not_equal_to_empty_string() {
        let mut cart = Cart::new();
        let mut no_color = phone(10);
        no_color.color = None;
        let mut empty_color = phone(10);
        empty_color.color = Some(String::new());

        cart.add_item(no_color, 1);
        cart.add_item(empty_color, 1);

        assert_eq!(cart.len(), 2);
    }

    #[test]
    fn add_reports_full_application_under_stock() {
        let mut cart = Cart::new();
        let change = cart.add_item(phone(10), 4);
        assert_eq!(
            change,
            QuantityChange {
                requested: 4,
                applied: 4
            }
        );
        assert!(!change.is_clamped());
    }

    #[test]
    fn add_clamps_to_available_stock() {
        let mut cart = Cart::new();
        cart.add_item(phone(5), 3);
        let change = cart.add_item(phone(5), 4);

        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(
            change,
            QuantityChange {
                requested: 4,
                applied: 2
            }
        );
        assert!(change.is_clamped());
    }

    #[test]
    fn add_with_zero_quantity_is_a_noop() {
        let mut cart = Cart::new();
        let change = cart.add_item(phone(5), 0);
        assert!(cart.is_empty());
        assert_eq!(change.applied, 0);
    }

    #[test]
    fn out_of_stock_candidate_never_enters_the_cart() {
        let mut cart = Cart::new();
        let change = cart.add_item(phone(0), 3);
        assert!(cart.is_empty());
        assert_eq!(change.applied, 0);
    }

    #[test]
    fn quantity_stays_within_bounds_after_any_mutation() {
        let mut cart = Cart::new();
        cart.add_item(phone(5), 200);
        cart.add_item(tablet(2), 1);
        cart.update_quantity(&tablet(2).key(), 0);
        cart.update_quantity(&phone(5).key(), 99);

        for line in cart.lines() {
            assert!(line.quantity >= 1);
            assert!(line.quantity <= line.available_stock);
        }
    }

    #[test]
    fn update_clamps_to_floor_of_one() {
        let mut cart = Cart::new();
        cart.add_item(phone(5), 3);
        let result = cart.update_quantity(&phone(5).key(), 0);

        assert_eq!(result, Some(1));
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn update_clamps_to_stock_ceiling() {
        let mut cart = Cart::new();
        cart.add_item(phone(5), 3);
        let result = cart.update_quantity(&phone(5).key(), 40);

        assert_eq!(result, Some(5));
    }

    #[test]
    fn update_of_missing_key_is_a_noop() {
        let mut cart = Cart::new();
        cart.add_item(phone(5), 2);
        let result = cart.update_quantity(&LineKey::bare(ProductId::new("nope")), 3);

        assert_eq!(result, None);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn remove_takes_exactly_the_matching_line() {
        let mut cart = Cart::new();
        cart.add_item(phone(10), 2);
        cart.add_item(tablet(10), 1);

        assert!(cart.remove_item(&phone(10).key()));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].key(), tablet(10).key());
        assert_eq!(cart.lines()[0].quantity, 1);
    }

    #[test]
    fn remove_of_missing_key_leaves_cart_unchanged() {
        let mut cart = Cart::new();
        cart.add_item(phone(10), 2);
        let before = cart.clone();

        assert!(!cart.remove_item(&LineKey::bare(ProductId::new("nope"))));
        assert_eq!(cart, before);
    }

    #[test]
    fn totals_sum_over_all_lines() {
        let mut cart = Cart::new();
        let mut a = phone(10);
        a.unit_price = Price::from_cents(1000);
        let mut b = tablet(10);
        b.unit_price = Price::from_cents(500);

        cart.add_item(a, 2);
        cart.add_item(b, 3);

        assert_eq!(cart.total_price(), Price::from_cents(3500));
        assert_eq!(cart.total_item_count(), 5);
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let cart = Cart::new();
        assert_eq!(cart.total_price(), Price::ZERO);
        assert_eq!(cart.total_item_count(), 0);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut cart = Cart::new();
        cart.clear();
        assert!(cart.is_empty());

        cart.add_item(phone(10), 2);
        cart.clear();
        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut cart = Cart::new();
        cart.add_item(tablet(10), 1);
        cart.add_item(phone(10), 1);
        cart.add_item(tablet(10), 1);

        let ids: Vec<&str> = cart
            .lines()
            .iter()
            .map(|line| line.product_id.as_str())
            .collect();
        assert_eq!(ids, ["ipad-air-5", "iphone-13"]);
    }

    #[test]
    fn line_sequence_round_trips_through_json() {
        let mut cart = Cart::new();
        cart.add_item(phone(10), 2);
        cart.add_item(tablet(10), 1);

        let json = serde_json::to_string(cart.lines()).expect("serialize");
        let lines: Vec<LineItem> = serde_json::from_str(&json).expect("deserialize");
        let restored = Cart::from_lines(lines);

        assert_eq!(restored, cart);
    }

    #[test]
    fn from_lines_renormalizes_tampered_input() {
        // Duplicate keys merge and an over-stock quantity clamps on load.
        let mut doctored = LineItem::from_candidate(phone(5), 3);
        doctored.quantity = 9;
        let duplicate = LineItem::from_candidate(phone(5), 3);

        let cart = Cart::from_lines(vec![doctored, duplicate]);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn add_clamp_update_remove_scenario() {
        let mut cart = Cart::new();

        cart.add_item(phone(5), 2);
        assert_eq!(cart.lines()[0].quantity, 2);

        // 2 + 4 = 6 clamps to the stock of 5.
        let change = cart.add_item(phone(5), 4);
        assert_eq!(cart.lines()[0].quantity, 5);
        assert_eq!(change.applied, 3);

        cart.update_quantity(&phone(5).key(), 1);
        assert_eq!(cart.lines()[0].quantity, 1);

        cart.remove_item(&phone(5).key());
        assert!(cart.is_empty());
    }
}
