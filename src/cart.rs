//! Cart state.
//!
//! The cart lives on the client for the duration of a browsing session; the
//! server only ever sees its items at checkout time. This model exists so
//! that the cart rules (merge-on-add, quantity floor, derived totals) are
//! defined and tested in one place, and so a client can persist the whole
//! value (it serializes to the same JSON shape the storefront keeps in
//! local storage). It is an explicit store object, not a singleton.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One selected item: a product reference with a client-side quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    /// Product identifier (catalog id or slug)
    pub id: String,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a product. An existing entry with the same id gains quantity 1,
    /// otherwise the item is appended with quantity 1. No upper bound.
    pub fn add_item(&mut self, id: impl Into<String>, name: impl Into<String>, price: Decimal) {
        let id = id.into();
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == id) {
            existing.quantity += 1;
        } else {
            self.items.push(CartItem {
                id,
                name: name.into(),
                price,
                quantity: 1,
            });
        }
    }

    /// Set an item's quantity. A quantity of zero (the public API takes an
    /// unsigned count; callers treat negative input as zero) removes the
    /// entry entirely, so the cart never holds a non-positive quantity.
    pub fn update_quantity(&mut self, id: &str, quantity: u32) {
        if quantity == 0 {
            self.remove_item(id);
        } else if let Some(item) = self.items.iter_mut().find(|i| i.id == id) {
            item.quantity = quantity;
        }
    }

    /// Remove an item; no-op when absent.
    pub fn remove_item(&mut self, id: &str) {
        self.items.retain(|i| i.id != id);
    }

    pub fn total_items(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .map(|i| i.price * Decimal::from(i.quantity))
            .sum()
    }

    /// Empty the cart. Called after a recognized successful-payment
    /// redirect.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}
