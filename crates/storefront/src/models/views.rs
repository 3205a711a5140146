//! Display structs shared by several pages.
//!
//! Prices and dates are formatted here so templates only print strings.

use chrono::{DateTime, Utc};

use bazaar_core::{CartItem, DeliveryStatus, Notification, Order, Product, Shop};

/// Format an optional timestamp for display.
#[must_use]
pub fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(String::new, |at| at.format("%b %-d, %Y").to_string())
}

/// CSS modifier for a delivery status badge.
#[must_use]
pub const fn status_class(status: DeliveryStatus) -> &'static str {
    match status {
        DeliveryStatus::Processing => "badge--pending",
        DeliveryStatus::Shipped | DeliveryStatus::OutForDelivery => "badge--info",
        DeliveryStatus::Delivered => "badge--success",
        DeliveryStatus::Cancelled => "badge--danger",
        DeliveryStatus::Unknown => "badge--muted",
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Product tile in grids and lists.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub price: String,
    pub category: String,
    pub in_stock: bool,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            image: product.primary_image().map(String::from),
            price: product
                .lowest_price()
                .map_or_else(String::new, |p| p.to_string()),
            category: product.category.clone(),
            in_stock: product.in_stock(),
        }
    }
}

/// Shop tile.
#[derive(Debug, Clone)]
pub struct ShopCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub address: String,
}

impl From<&Shop> for ShopCard {
    fn from(shop: &Shop) -> Self {
        Self {
            id: shop.id.to_string(),
            name: shop.name.clone(),
            description: shop.description.clone(),
            image: shop.image.clone(),
            address: shop.address.clone(),
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// One cart or order line.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    pub size: String,
    pub color: String,
    pub quantity: u32,
    pub price: String,
    pub line_total: String,
}

impl CartLineView {
    /// "M / Red", or empty when the line has no variant.
    #[must_use]
    pub fn variant_label(&self) -> String {
        [self.size.as_str(), self.color.as_str()]
            .into_iter()
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(" / ")
    }
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id.to_string(),
            name: item.name.clone(),
            image: item.image.clone(),
            size: item.size.clone(),
            color: item.color.clone(),
            quantity: item.quantity,
            price: item.price.to_string(),
            line_total: item.line_total().to_string(),
        }
    }
}

/// Cart display data for templates.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    /// Build from cart lines, local or server.
    #[must_use]
    pub fn from_items(items: &[CartItem]) -> Self {
        Self {
            lines: items.iter().map(CartLineView::from).collect(),
            subtotal: items
                .iter()
                .map(CartItem::line_total)
                .sum::<bazaar_core::Price>()
                .to_string(),
            item_count: items.iter().map(|i| i.quantity).sum(),
        }
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order row in history and admin lists.
#[derive(Debug, Clone)]
pub struct OrderSummaryView {
    pub id: String,
    pub reference: String,
    pub placed_on: String,
    pub item_count: u32,
    pub total: String,
    pub delivery: String,
    pub delivery_class: &'static str,
    pub payment: String,
    pub customer: String,
    pub can_cancel: bool,
}

impl From<&Order> for OrderSummaryView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            reference: order.reference(),
            placed_on: format_date(order.created_at),
            item_count: order.item_count(),
            total: order.total().to_string(),
            delivery: order.delivery_status.label().to_string(),
            delivery_class: status_class(order.delivery_status),
            payment: order.payment_status.to_string(),
            customer: order
                .user
                .as_ref()
                .map(|c| if c.name.is_empty() { c.email.clone() } else { c.name.clone() })
                .unwrap_or_default(),
            can_cancel: order.can_cancel(),
        }
    }
}

/// Full order page.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub summary: OrderSummaryView,
    pub lines: Vec<CartLineView>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub payment_status: String,
    pub delivery_status: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            summary: OrderSummaryView::from(order),
            lines: order.items.iter().map(CartLineView::from).collect(),
            address: order.shipping_address.as_ref().map(|a| a.one_line()),
            phone: order
                .shipping_address
                .as_ref()
                .map(|a| a.phone.clone())
                .filter(|p| !p.is_empty()),
            payment_status: order.payment_status.as_str().to_string(),
            delivery_status: order.delivery_status.as_str().to_string(),
        }
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// Inbox row.
#[derive(Debug, Clone)]
pub struct NotificationView {
    pub id: String,
    pub message: String,
    pub read: bool,
    pub received_on: String,
    pub order_id: Option<String>,
}

impl From<&Notification> for NotificationView {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id.to_string(),
            message: n.message.clone(),
            read: n.read,
            received_on: format_date(n.created_at),
            order_id: n.order.as_ref().map(ToString::to_string),
        }
    }
}
