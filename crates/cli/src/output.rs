//! Plain-text rendering for terminal output.

#![allow(clippy::print_stdout)]

use bazaar_core::{CartItem, Category, Notification, Order, Price, Product};

/// Print lines to stdout.
pub fn emit(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

/// Indented category tree.
pub fn category_tree(categories: &[Category]) -> Vec<String> {
    let mut lines = Vec::new();
    for category in categories {
        lines.push(category.name.clone());
        for sub in &category.subcategories {
            lines.push(format!("  {}", sub.name));
            lines.extend(sub.third_categories.iter().map(|third| format!("    {third}")));
        }
    }
    lines
}

/// One row per product.
pub fn product_rows(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .map(|p| {
            let price = p
                .lowest_price()
                .map_or_else(|| "-".to_string(), |price| price.to_string());
            let stock = if p.in_stock() { "" } else { "  (sold out)" };
            format!("{}  {}  {price}{stock}", p.id, p.name)
        })
        .collect()
}

/// Cart lines followed by the subtotal.
pub fn cart_lines(items: &[CartItem]) -> Vec<String> {
    if items.is_empty() {
        return vec!["Your cart is empty".to_string()];
    }
    let mut lines: Vec<String> = items
        .iter()
        .map(|item| {
            let variant = [item.size.as_str(), item.color.as_str()]
                .into_iter()
                .filter(|v| !v.is_empty())
                .collect::<Vec<_>>()
                .join("/");
            format!(
                "{} x {}{}  {}  [{}]",
                item.quantity,
                item.name,
                if variant.is_empty() { String::new() } else { format!(" ({variant})") },
                item.line_total(),
                item.product_id,
            )
        })
        .collect();
    let subtotal: Price = items.iter().map(CartItem::line_total).sum();
    lines.push(format!("Subtotal: {subtotal}"));
    lines
}

/// One row per order.
pub fn order_rows(orders: &[Order]) -> Vec<String> {
    if orders.is_empty() {
        return vec!["No orders yet".to_string()];
    }
    orders
        .iter()
        .map(|order| {
            let placed = order
                .created_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default();
            format!(
                "{}  {placed}  {} items  {}  {} / {}",
                order.reference(),
                order.item_count(),
                order.total(),
                order.payment_status,
                order.delivery_status,
            )
        })
        .collect()
}

/// One line for a notification.
pub fn notification_line(notification: &Notification) -> String {
    let marker = if notification.read { " " } else { "*" };
    let at = notification
        .created_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    format!("{marker} {at}  {}", notification.message)
}
