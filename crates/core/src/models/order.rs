//! Orders and shipping addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::cart::CartItem;
use crate::types::{DeliveryStatus, OrderId, PaymentStatus, Price, UserId};

/// Errors raised when validating a shipping address.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is blank.
    #[error("{0} is required")]
    Missing(&'static str),
}

/// Errors raised when building an order.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// The cart has no lines.
    #[error("your cart is empty")]
    EmptyCart,
    /// The shipping address is incomplete.
    #[error(transparent)]
    Address(#[from] AddressError),
}

/// Where an order is shipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    #[serde(default, alias = "name", alias = "fullname")]
    pub full_name: String,
    #[serde(default, alias = "address", alias = "street")]
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default, alias = "province")]
    pub state: String,
    #[serde(default, alias = "zip", alias = "pincode", alias = "postcode")]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub phone: String,
}

impl ShippingAddress {
    /// Check that every required field has a value.
    ///
    /// # Errors
    ///
    /// Returns the first blank required field.
    pub fn validate(&self) -> Result<(), AddressError> {
        let required = [
            ("Full name", &self.full_name),
            ("Address", &self.line1),
            ("City", &self.city),
            ("State", &self.state),
            ("Postal code", &self.postal_code),
            ("Country", &self.country),
            ("Phone", &self.phone),
        ];
        for (label, value) in required {
            if value.trim().is_empty() {
                return Err(AddressError::Missing(label));
            }
        }
        Ok(())
    }

    /// Single-line rendering for tables.
    #[must_use]
    pub fn one_line(&self) -> String {
        [
            self.line1.as_str(),
            self.line2.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.postal_code.as_str(),
            self.country.as_str(),
        ]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

/// The customer attached to an order, populated or not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderCustomer {
    pub id: Option<UserId>,
    pub name: String,
    pub email: String,
}

impl<'de> Deserialize<'de> for OrderCustomer {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(UserId),
            Doc {
                #[serde(default, rename = "_id", alias = "id")]
                id: Option<UserId>,
                #[serde(default)]
                name: String,
                #[serde(default)]
                email: String,
            },
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Id(id) => Self {
                id: Some(id),
                ..Self::default()
            },
            Raw::Doc { id, name, email } => Self { id, name, email },
        })
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id", alias = "id")]
    pub id: OrderId,
    #[serde(default, alias = "orderItems", alias = "products")]
    pub items: Vec<CartItem>,
    #[serde(default, alias = "address", alias = "shippingInfo")]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default, alias = "orderStatus", alias = "status")]
    pub delivery_status: DeliveryStatus,
    #[serde(default, alias = "totalPrice", alias = "totalAmount", alias = "amount")]
    pub total: Option<Price>,
    #[serde(default, alias = "userId")]
    pub user: Option<OrderCustomer>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Order {
    /// The backend total, or the sum of line totals when absent.
    #[must_use]
    pub fn total(&self) -> Price {
        self.total
            .unwrap_or_else(|| self.items.iter().map(CartItem::line_total).sum())
    }

    /// Total units ordered.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Owners may cancel only while the order is still processing.
    #[must_use]
    pub fn can_cancel(&self) -> bool {
        self.delivery_status == DeliveryStatus::Processing
    }

    /// Short reference shown to customers (last 8 characters, uppercased).
    #[must_use]
    pub fn reference(&self) -> String {
        let id = self.id.as_str();
        let start = id.len().saturating_sub(8);
        id.get(start..).unwrap_or(id).to_uppercase()
    }
}

/// Body sent to place an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<CartItem>,
    pub shipping_address: ShippingAddress,
    pub total: Price,
    pub payment_method: String,
}

impl NewOrder {
    /// Build an order from cart lines and an address.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::EmptyCart`] for an empty cart, or the address
    /// validation error.
    pub fn new(
        items: Vec<CartItem>,
        shipping_address: ShippingAddress,
        payment_method: impl Into<String>,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyCart);
        }
        shipping_address.validate()?;
        let total = items.iter().map(CartItem::line_total).sum();
        Ok(Self {
            items,
            shipping_address,
            total,
            payment_method: payment_method.into(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::ProductId;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Asha Rao".into(),
            line1: "12 Market St".into(),
            line2: String::new(),
            city: "Pune".into(),
            state: "MH".into(),
            postal_code: "411001".into(),
            country: "India".into(),
            phone: "9999999999".into(),
        }
    }

    fn item() -> CartItem {
        CartItem {
            product_id: ProductId::new("p1"),
            name: "Thali".into(),
            image: None,
            size: String::new(),
            color: String::new(),
            quantity: 2,
            price: Price::from_cents(350),
        }
    }

    #[test]
    fn test_address_validation() {
        assert!(address().validate().is_ok());
        let mut missing = address();
        missing.city = "  ".into();
        assert_eq!(missing.validate(), Err(AddressError::Missing("City")));
    }

    #[test]
    fn test_new_order_requires_items() {
        assert_eq!(
            NewOrder::new(vec![], address(), "cod"),
            Err(OrderError::EmptyCart)
        );
    }

    #[test]
    fn test_new_order_totals() {
        let order = NewOrder::new(vec![item()], address(), "cod").unwrap();
        assert_eq!(order.total, Price::from_cents(700));
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["shippingAddress"]["postalCode"], "411001");
        assert_eq!(json["items"][0]["productId"], "p1");
    }

    #[test]
    fn test_order_decoding_and_rules() {
        let order: Order = serde_json::from_str(
            r#"{
                "_id": "65f0aa11bb22cc33",
                "orderItems": [{"productId": "p1", "name": "Thali", "quantity": 2, "price": 3.5}],
                "address": {"name": "Asha", "address": "12 Market St", "zip": "411001"},
                "paymentStatus": "paid",
                "orderStatus": "processing",
                "user": {"_id": "u1", "name": "Asha", "email": "asha@x.io"}
            }"#,
        )
        .unwrap();

        assert_eq!(order.total(), Price::from_cents(700));
        assert_eq!(order.item_count(), 2);
        assert!(order.can_cancel());
        assert_eq!(order.reference(), "BB22CC33");
        assert_eq!(order.user.unwrap().email, "asha@x.io");
        assert_eq!(
            order.shipping_address.unwrap().one_line(),
            "12 Market St, 411001"
        );
    }

    #[test]
    fn test_order_user_as_bare_id() {
        let order: Order =
            serde_json::from_str(r#"{"id":"o1","userId":"u5","status":"delivered"}"#).unwrap();
        assert_eq!(order.user.as_ref().unwrap().id.as_ref().unwrap().as_str(), "u5");
        assert!(!order.can_cancel());
    }
}
