//! Cart commands.
//!
//! Signed out, the cart lives in the state file. Signed in, every command
//! goes to the server cart.

use bazaar_core::{CartError, CartItemError, CartLineKey, ProductId};
use tracing::instrument;

use super::Context;
use crate::error::CliError;
use crate::output::{cart_lines, emit};

fn line_key(product_id: &str, size: &str, color: &str) -> CartLineKey {
    CartLineKey::new(ProductId::new(product_id.trim()), size, color)
}

/// Print the cart.
pub async fn list(ctx: &mut Context) -> Result<(), CliError> {
    let items = match ctx.state.token() {
        Some(token) => {
            let result = ctx.api().server_cart(&token).await;
            ctx.check(result)?
        }
        None => ctx.state.local_cart.items().to_vec(),
    };
    emit(&cart_lines(&items));
    Ok(())
}

/// Add a product variant.
///
/// The product is looked up first so the line carries its current name and
/// the variant's price.
#[instrument(skip(ctx))]
pub async fn add(
    ctx: &mut Context,
    product_id: &str,
    size: &str,
    color: &str,
    quantity: u32,
) -> Result<(), CliError> {
    let product_id = ProductId::new(product_id.trim());
    let product = ctx.api().product(&product_id).await?;

    let item = product.cart_item(size, color, quantity).map_err(|e| match e {
        CartItemError::UnknownVariant { size, color } => CliError::Invalid(format!(
            "No {size}/{color} variant. Sizes: {}. Colors: {}.",
            product.sizes().join(", "),
            product.colors().join(", ")
        )),
        CartItemError::Unavailable(_) => CliError::Invalid(e.to_string()),
    })?;

    match ctx.state.token() {
        Some(token) => {
            let result = ctx.api().add_to_server_cart(&token, &item).await;
            ctx.check(result)?;
        }
        None => {
            ctx.state.local_cart.add(item);
            ctx.save()?;
        }
    }
    emit(&[format!("Added {} to your cart", product.name)]);
    Ok(())
}

/// Remove a line.
pub async fn remove(
    ctx: &mut Context,
    product_id: &str,
    size: &str,
    color: &str,
) -> Result<(), CliError> {
    let key = line_key(product_id, size, color);
    match ctx.state.token() {
        Some(token) => {
            let result = ctx.api().remove_from_server_cart(&token, &key).await;
            ctx.check(result)?;
        }
        None => {
            ctx.state
                .local_cart
                .remove(&key)
                .ok_or_else(|| CartError::UnknownLine(key.clone()))?;
            ctx.save()?;
        }
    }
    emit(&[format!("Removed {key}")]);
    Ok(())
}

/// Set a line's quantity, never below 1.
pub async fn set(
    ctx: &mut Context,
    product_id: &str,
    size: &str,
    color: &str,
    quantity: u32,
) -> Result<(), CliError> {
    let key = line_key(product_id, size, color);
    let quantity = quantity.max(1);
    match ctx.state.token() {
        Some(token) => {
            let result = ctx.api().update_server_cart(&token, &key, quantity).await;
            ctx.check(result)?;
        }
        None => {
            ctx.state.local_cart.set_quantity(&key, quantity)?;
            ctx.save()?;
        }
    }
    emit(&[format!("{key} now x {quantity}")]);
    Ok(())
}
