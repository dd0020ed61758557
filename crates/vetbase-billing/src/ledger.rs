//! Stock ledger: the only writer of product stock.
//!
//! Every function takes `&mut PgConnection` so the caller's transaction
//! scopes the adjustment; a failure anywhere in that transaction rolls the
//! stock change back with everything else. The decrement relies on the
//! conditional row update in the product model rather than read-then-write,
//! so two concurrent consumers of the same product cannot both succeed past
//! zero.
//!
//! Editing an attendance's product list is two-phase: [`restore`] puts every
//! previously consumed quantity back first, then [`consume`] applies the new
//! quantities. Restoring first means shrinking one product's quantity while
//! growing another's never fails on stale stock numbers.

use sqlx::PgConnection;
use uuid::Uuid;

use vetbase_db::models::{AttendanceProductItem, Product};

use crate::error::{BillingError, Result};

/// One product demand to apply against stock.
#[derive(Debug, Clone)]
pub struct StockDemand {
    /// The product to consume.
    pub product_id: Uuid,
    /// Units to consume.
    pub quantity: i32,
}

/// Add `quantity` units back to a product's stock.
pub async fn increment(
    conn: &mut PgConnection,
    product_id: Uuid,
    quantity: i32,
) -> Result<()> {
    if Product::increment_stock(&mut *conn, product_id, quantity).await? {
        Ok(())
    } else {
        Err(BillingError::ProductNotFound(product_id))
    }
}

/// Consume `quantity` units of a product's stock, failing with
/// [`BillingError::InsufficientStock`] (naming the product and what is
/// actually available) when not enough units are on hand.
pub async fn decrement(
    conn: &mut PgConnection,
    product_id: Uuid,
    quantity: i32,
) -> Result<()> {
    if Product::try_decrement_stock(&mut *conn, product_id, quantity).await? {
        return Ok(());
    }

    // The conditional update matched no row: either the product is gone or
    // the stock ran short. Fetch it to produce an actionable message.
    match Product::find_by_id(&mut *conn, product_id).await? {
        Some(product) => Err(BillingError::InsufficientStock {
            product: product.name,
            available: product.stock,
        }),
        None => Err(BillingError::ProductNotFound(product_id)),
    }
}

/// Phase one of an attendance edit: put back every quantity the attendance
/// had consumed so the new list validates against restored levels.
pub async fn restore(
    conn: &mut PgConnection,
    consumed: &[AttendanceProductItem],
) -> Result<()> {
    for item in consumed {
        increment(&mut *conn, item.product_id, item.quantity).await?;
    }
    Ok(())
}

/// Apply a list of demands, failing fast on the first shortfall.
pub async fn consume(conn: &mut PgConnection, demands: &[StockDemand]) -> Result<()> {
    for demand in demands {
        decrement(&mut *conn, demand.product_id, demand.quantity).await?;
    }
    Ok(())
}
