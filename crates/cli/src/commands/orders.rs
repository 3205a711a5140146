//! Order history.

use super::Context;
use crate::error::CliError;
use crate::output::{emit, order_rows};

/// Print the signed-in user's orders, newest first.
pub async fn list(ctx: &mut Context) -> Result<(), CliError> {
    let token = ctx.token()?;
    let result = ctx.api().my_orders(&token).await;
    let mut orders = ctx.check(result)?;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    emit(&order_rows(&orders));
    Ok(())
}
