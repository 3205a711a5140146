//! Cart lines and the visitor-side cart.
//!
//! A cart line is identified by product + size + color. Visitors who are not
//! signed in keep a [`LocalCart`]; when they sign in, every local line is
//! handed to the server cart and the local cart is emptied.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId};

/// Errors raised by cart operations.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// No line matches the given key.
    #[error("no cart line for {0}")]
    UnknownLine(CartLineKey),
}

/// Identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineKey {
    pub product_id: ProductId,
    pub size: String,
    pub color: String,
}

impl CartLineKey {
    /// Build a key; size and color are trimmed.
    #[must_use]
    pub fn new(product_id: ProductId, size: &str, color: &str) -> Self {
        Self {
            product_id,
            size: size.trim().to_owned(),
            color: color.trim().to_owned(),
        }
    }
}

impl fmt::Display for CartLineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.product_id, self.size, self.color)
    }
}

/// One line in a cart or order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawCartItem")]
pub struct CartItem {
    pub product_id: ProductId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub price: Price,
}

impl CartItem {
    /// The key identifying this line.
    #[must_use]
    pub fn key(&self) -> CartLineKey {
        CartLineKey::new(self.product_id.clone(), &self.size, &self.color)
    }

    /// Price × quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price * self.quantity
    }
}

/// Wire shape of a cart line. The product may arrive as a bare ID or as a
/// populated product document.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCartItem {
    #[serde(alias = "productId", alias = "product_id")]
    product: ProductRef,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    size: String,
    #[serde(default)]
    color: String,
    #[serde(default, alias = "qty")]
    quantity: u32,
    #[serde(default)]
    price: Option<Price>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProductRef {
    Id(ProductId),
    Doc {
        #[serde(rename = "_id", alias = "id")]
        id: ProductId,
        #[serde(default)]
        name: String,
        #[serde(default)]
        images: Vec<String>,
        #[serde(default)]
        price: Option<Price>,
    },
}

impl From<RawCartItem> for CartItem {
    fn from(raw: RawCartItem) -> Self {
        let (product_id, doc_name, doc_image, doc_price) = match raw.product {
            ProductRef::Id(id) => (id, None, None, None),
            ProductRef::Doc {
                id,
                name,
                images,
                price,
            } => (id, Some(name), images.into_iter().next(), price),
        };

        Self {
            product_id,
            name: raw.name.or(doc_name).unwrap_or_default(),
            image: raw.image.or(doc_image),
            size: raw.size,
            color: raw.color,
            quantity: raw.quantity.max(1),
            price: raw.price.or(doc_price).unwrap_or_default(),
        }
    }
}

/// A quantity change requested from a cart page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    Increment,
    Decrement,
    Set(u32),
}

impl QuantityChange {
    /// The quantity after applying this change; never below 1.
    #[must_use]
    pub fn apply(self, current: u32) -> u32 {
        match self {
            Self::Increment => current.saturating_add(1),
            Self::Decrement => current.saturating_sub(1),
            Self::Set(q) => q,
        }
        .max(1)
    }
}

/// The cart of a visitor who is not signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalCart {
    items: Vec<CartItem>,
}

impl LocalCart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether there are no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of line totals.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Look up a line.
    #[must_use]
    pub fn get(&self, key: &CartLineKey) -> Option<&CartItem> {
        self.items.iter().find(|i| &i.key() == key)
    }

    /// Add a line, summing quantities with an existing line of the same key.
    ///
    /// Returns the line's quantity after the add.
    pub fn add(&mut self, mut item: CartItem) -> u32 {
        item.quantity = item.quantity.max(1);
        let key = item.key();
        if let Some(existing) = self.items.iter_mut().find(|i| i.key() == key) {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            existing.price = item.price;
            return existing.quantity;
        }
        let quantity = item.quantity;
        self.items.push(item);
        quantity
    }

    /// Apply a quantity change to a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownLine`] if no line has this key.
    pub fn change_quantity(
        &mut self,
        key: &CartLineKey,
        change: QuantityChange,
    ) -> Result<u32, CartError> {
        let line = self
            .items
            .iter_mut()
            .find(|i| &i.key() == key)
            .ok_or_else(|| CartError::UnknownLine(key.clone()))?;
        line.quantity = change.apply(line.quantity);
        Ok(line.quantity)
    }

    /// Set a line's quantity; values below 1 become 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownLine`] if no line has this key.
    pub fn set_quantity(&mut self, key: &CartLineKey, quantity: u32) -> Result<u32, CartError> {
        self.change_quantity(key, QuantityChange::Set(quantity))
    }

    /// Add one unit to a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownLine`] if no line has this key.
    pub fn increment(&mut self, key: &CartLineKey) -> Result<u32, CartError> {
        self.change_quantity(key, QuantityChange::Increment)
    }

    /// Take one unit off a line, stopping at 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::UnknownLine`] if no line has this key.
    pub fn decrement(&mut self, key: &CartLineKey) -> Result<u32, CartError> {
        self.change_quantity(key, QuantityChange::Decrement)
    }

    /// Remove a line.
    pub fn remove(&mut self, key: &CartLineKey) -> Option<CartItem> {
        self.position(key).map(|pos| self.items.remove(pos))
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Empty the cart and return its lines for posting to the server cart.
    pub fn drain_for_merge(&mut self) -> Vec<CartItem> {
        std::mem::take(&mut self.items)
    }

    fn position(&self, key: &CartLineKey) -> Option<usize> {
        self.items.iter().position(|i| &i.key() == key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn line(product: &str, size: &str, color: &str, quantity: u32, cents: i64) -> CartItem {
        CartItem {
            product_id: ProductId::new(product),
            name: format!("Product {product}"),
            image: None,
            size: size.to_string(),
            color: color.to_string(),
            quantity,
            price: Price::from_cents(cents),
        }
    }

    #[test]
    fn test_add_same_key_merges() {
        let mut cart = LocalCart::new();
        cart.add(line("p1", "M", "Red", 1, 500));
        cart.add(line("p1", "M ", "Red", 2, 500));
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
    }

    #[test]
    fn test_add_different_variant_is_new_line() {
        let mut cart = LocalCart::new();
        cart.add(line("p1", "M", "Red", 1, 500));
        cart.add(line("p1", "L", "Red", 1, 600));
        cart.add(line("p1", "M", "Blue", 1, 500));
        assert_eq!(cart.items().len(), 3);
        assert_eq!(cart.item_count(), 3);
        assert_eq!(cart.subtotal(), Price::from_cents(1600));
    }

    #[test]
    fn test_add_zero_quantity_becomes_one() {
        let mut cart = LocalCart::new();
        assert_eq!(cart.add(line("p1", "", "", 0, 100)), 1);
    }

    #[test]
    fn test_quantity_never_below_one() {
        let mut cart = LocalCart::new();
        let first = line("p1", "M", "Red", 1, 500);
        let key = first.key();
        cart.add(first);
        assert_eq!(cart.decrement(&key).unwrap(), 1);
        assert_eq!(cart.set_quantity(&key, 0).unwrap(), 1);
        assert_eq!(cart.increment(&key).unwrap(), 2);
        assert_eq!(cart.change_quantity(&key, QuantityChange::Set(5)).unwrap(), 5);
    }

    #[test]
    fn test_unknown_line() {
        let mut cart = LocalCart::new();
        let key = CartLineKey::new(ProductId::new("missing"), "M", "Red");
        assert!(matches!(
            cart.set_quantity(&key, 2),
            Err(CartError::UnknownLine(_))
        ));
        assert!(cart.remove(&key).is_none());
    }

    #[test]
    fn test_remove() {
        let mut cart = LocalCart::new();
        let first = line("p1", "M", "Red", 2, 500);
        let key = first.key();
        cart.add(first);
        cart.add(line("p2", "", "", 1, 100));
        let removed = cart.remove(&key).unwrap();
        assert_eq!(removed.quantity, 2);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_drain_for_merge_empties_cart() {
        let mut cart = LocalCart::new();
        cart.add(line("p1", "M", "Red", 2, 500));
        cart.add(line("p2", "S", "Blue", 1, 700));
        let merged = cart.drain_for_merge();
        assert_eq!(merged.len(), 2);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_decode_populated_product() {
        let item: CartItem = serde_json::from_str(
            r#"{"product":{"_id":"p9","name":"Kurta","images":["k.jpg"],"price":20},"size":"L","color":"White","quantity":0}"#,
        )
        .unwrap();
        assert_eq!(item.product_id.as_str(), "p9");
        assert_eq!(item.name, "Kurta");
        assert_eq!(item.image.as_deref(), Some("k.jpg"));
        assert_eq!(item.quantity, 1);
        assert_eq!(item.price, Price::from_cents(2000));
    }

    #[test]
    fn test_session_roundtrip_shape() {
        let mut cart = LocalCart::new();
        cart.add(line("p1", "M", "Red", 2, 450));
        let json = serde_json::to_string(&cart).unwrap();
        assert!(json.contains("\"productId\":\"p1\""));
        let back: LocalCart = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);
    }
}
