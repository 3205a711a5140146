//! Product and variant records.

use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::types::{Price, ProductId, ShopId};

/// Why a product cannot be put in a cart as requested.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum CartItemError {
    /// The product has variants and none matches the size/color pair.
    #[error("no {size}/{color} variant")]
    UnknownVariant { size: String, color: String },
    /// The product has no price at all.
    #[error("{0} is not available right now")]
    Unavailable(String),
}

/// A purchasable size/color combination of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    pub price: Price,
    /// Units in stock.
    #[serde(default, alias = "stock")]
    pub quantity: u32,
}

impl Variant {
    /// Whether this variant matches a size/color pair (case-insensitive).
    #[must_use]
    pub fn matches(&self, size: &str, color: &str) -> bool {
        self.size.eq_ignore_ascii_case(size.trim()) && self.color.eq_ignore_ascii_case(color.trim())
    }
}

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id", alias = "id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, alias = "subCategory")]
    pub subcategory: String,
    #[serde(default, alias = "third_category")]
    pub third_category: String,
    #[serde(default)]
    pub variants: Vec<Variant>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default, alias = "shopId", skip_serializing_if = "Option::is_none")]
    pub shop: Option<ShopId>,
    /// Flat price for products sold without variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
}

impl Product {
    /// Cheapest variant price, or the flat price when there are no variants.
    #[must_use]
    pub fn lowest_price(&self) -> Option<Price> {
        self.variants
            .iter()
            .map(|v| v.price)
            .min()
            .or(self.price)
    }

    /// Units in stock across all variants.
    #[must_use]
    pub fn total_stock(&self) -> u32 {
        self.variants.iter().map(|v| v.quantity).sum()
    }

    /// Whether any variant can be bought.
    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.variants.is_empty() || self.total_stock() > 0
    }

    /// Distinct sizes in first-seen order, blanks skipped.
    #[must_use]
    pub fn sizes(&self) -> Vec<&str> {
        distinct(self.variants.iter().map(|v| v.size.as_str()))
    }

    /// Distinct colors in first-seen order, blanks skipped.
    #[must_use]
    pub fn colors(&self) -> Vec<&str> {
        distinct(self.variants.iter().map(|v| v.color.as_str()))
    }

    /// The variant for a size/color pair.
    #[must_use]
    pub fn find_variant(&self, size: &str, color: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.matches(size, color))
    }

    /// Price for a size/color pair, falling back to the lowest price.
    #[must_use]
    pub fn price_for(&self, size: &str, color: &str) -> Option<Price> {
        self.find_variant(size, color)
            .map(|v| v.price)
            .or_else(|| self.lowest_price())
    }

    /// First image URL, if any.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Build a cart line for a size/color pair.
    ///
    /// Products with variants require a matching pair; the line carries the
    /// product's current name, image and price. Quantity is at least one.
    ///
    /// # Errors
    ///
    /// Returns [`CartItemError::UnknownVariant`] when no variant matches and
    /// [`CartItemError::Unavailable`] when the product has no price.
    pub fn cart_item(
        &self,
        size: &str,
        color: &str,
        quantity: u32,
    ) -> Result<CartItem, CartItemError> {
        if !self.variants.is_empty() && self.find_variant(size, color).is_none() {
            return Err(CartItemError::UnknownVariant {
                size: size.trim().to_owned(),
                color: color.trim().to_owned(),
            });
        }
        let price = self
            .price_for(size, color)
            .ok_or_else(|| CartItemError::Unavailable(self.name.clone()))?;

        Ok(CartItem {
            product_id: self.id.clone(),
            name: self.name.clone(),
            image: self.primary_image().map(String::from),
            size: size.trim().to_owned(),
            color: color.trim().to_owned(),
            quantity: quantity.max(1),
            price,
        })
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut out: Vec<&str> = Vec::new();
    for value in values {
        if !value.trim().is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// Fields sent when creating or updating a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub category: String,
    pub subcategory: String,
    pub third_category: String,
    pub variants: Vec<Variant>,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shop: Option<ShopId>,
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.clone(),
            subcategory: product.subcategory.clone(),
            third_category: product.third_category.clone(),
            variants: product.variants.clone(),
            images: product.images.clone(),
            shop: product.shop.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tee() -> Product {
        serde_json::from_str(
            r#"{
                "_id": "p1",
                "name": "Tee",
                "category": "Clothing",
                "subCategory": "Tops",
                "thirdCategory": "T-Shirts",
                "variants": [
                    {"size": "M", "color": "Red", "price": 12.5, "quantity": 3},
                    {"size": "L", "color": "Red", "price": 14, "stock": 0},
                    {"size": "M", "color": "Blue", "price": 11, "quantity": 1}
                ],
                "images": ["a.jpg", "b.jpg"]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_decodes_aliases() {
        let p = tee();
        assert_eq!(p.subcategory, "Tops");
        assert_eq!(p.third_category, "T-Shirts");
        assert_eq!(p.variants[1].quantity, 0);
    }

    #[test]
    fn test_derived_values() {
        let p = tee();
        assert_eq!(p.lowest_price(), Some(Price::from_cents(1100)));
        assert_eq!(p.total_stock(), 4);
        assert_eq!(p.sizes(), vec!["M", "L"]);
        assert_eq!(p.colors(), vec!["Red", "Blue"]);
        assert_eq!(p.primary_image(), Some("a.jpg"));
    }

    #[test]
    fn test_find_variant_ignores_case() {
        let p = tee();
        assert_eq!(
            p.price_for("m", " blue "),
            Some(Price::from_cents(1100))
        );
        assert_eq!(p.price_for("XL", "Green"), p.lowest_price());
    }

    #[test]
    fn test_cart_item_carries_variant_price() {
        let item = tee().cart_item(" m ", "blue", 0).unwrap();
        assert_eq!(item.product_id, ProductId::new("p1"));
        assert_eq!(item.name, "Tee");
        assert_eq!(item.image.as_deref(), Some("a.jpg"));
        assert_eq!((item.size.as_str(), item.color.as_str()), ("m", "blue"));
        assert_eq!(item.quantity, 1);
        assert_eq!(item.price, Price::from_cents(1100));
    }

    #[test]
    fn test_cart_item_rejects_unknown_variant() {
        assert_eq!(
            tee().cart_item("XL", "Green", 2),
            Err(CartItemError::UnknownVariant {
                size: "XL".to_owned(),
                color: "Green".to_owned(),
            })
        );
    }

    #[test]
    fn test_cart_item_needs_a_price() {
        let p: Product = serde_json::from_str(r#"{"id":"p3","name":"Mystery"}"#).unwrap();
        assert_eq!(
            p.cart_item("", "", 1),
            Err(CartItemError::Unavailable("Mystery".to_owned()))
        );

        let soup: Product = serde_json::from_str(r#"{"id":"p2","name":"Soup","price":4.25}"#).unwrap();
        assert_eq!(soup.cart_item("", "", 3).unwrap().quantity, 3);
    }

    #[test]
    fn test_flat_price_without_variants() {
        let p: Product = serde_json::from_str(r#"{"id":"p2","name":"Soup","price":4.25}"#).unwrap();
        assert_eq!(p.lowest_price(), Some(Price::from_cents(425)));
        assert!(p.in_stock());
    }
}
