//! Inventory commands.

use chrono::Utc;
use neupool_app::AppContext;
use neupool_core::{InventoryItem, InventoryItemId, NewInventoryItem, Quantity};
use rust_decimal::Decimal;
use tracing::info;

use super::{CommandError, Credentials, emit, or_dash};

/// Arguments for a new stock item.
#[derive(Debug, Clone)]
pub struct NewItemArgs {
    /// Product name.
    pub name: String,
    /// Initial stock.
    pub quantity: Decimal,
    /// Unit of measure.
    pub unit: Option<String>,
    /// Supplier name.
    pub vendor: Option<String>,
    /// Supplier product page.
    pub vendor_url: Option<String>,
    /// Reorder threshold.
    pub min: Option<Decimal>,
}

impl NewItemArgs {
    fn into_new_item(self) -> Result<NewInventoryItem, CommandError> {
        Ok(NewInventoryItem {
            name: self.name,
            quantity: Quantity::new(self.quantity).map_err(neupool_core::ValidationError::from)?,
            unit: self.unit,
            vendor: self.vendor,
            vendor_url: self.vendor_url,
            min_threshold: self
                .min
                .map(Quantity::new)
                .transpose()
                .map_err(neupool_core::ValidationError::from)?,
        })
    }
}

/// List stock. Any logged-in user may view it.
///
/// # Errors
///
/// Returns an error if the login fails.
pub fn list(ctx: &AppContext, credentials: &Credentials, low_only: bool) -> Result<(), CommandError> {
    credentials.login(ctx)?;
    let state = ctx.state();
    let items: Vec<&InventoryItem> = if low_only {
        state.low_stock()
    } else {
        state.inventory.iter().collect()
    };

    if items.is_empty() {
        return emit([if low_only {
            "Nothing is low on stock."
        } else {
            "Inventory is empty."
        }]);
    }
    emit(items.into_iter().map(describe))
}

/// Add a stock item (admin).
///
/// # Errors
///
/// Returns an error unless the acting user is an admin, or if the name is
/// blank or a quantity is negative.
pub async fn add(
    ctx: &mut AppContext,
    credentials: &Credentials,
    args: NewItemArgs,
) -> Result<(), CommandError> {
    credentials.login_admin(ctx)?;
    let item = args.into_new_item()?;
    let (next, id) = ctx.state().add_inventory_item(item, Utc::now())?;
    ctx.apply(next).await?;
    info!(item_id = %id, "Added inventory item");
    emit([format!("Added item {id}")])
}

/// Change stock by `delta`, clamped at zero (admin).
///
/// # Errors
///
/// Returns an error unless the acting user is an admin, or if the item
/// does not exist.
pub async fn adjust(
    ctx: &mut AppContext,
    credentials: &Credentials,
    id: &str,
    delta: Decimal,
) -> Result<(), CommandError> {
    credentials.login_admin(ctx)?;
    let item_id = InventoryItemId::new(id);
    let next = ctx.state().adjust_inventory_quantity(&item_id, delta)?;
    ctx.apply(next).await?;

    let line = ctx
        .state()
        .inventory_item(&item_id)
        .map_or_else(|| format!("Adjusted {item_id}"), describe);
    info!(%item_id, %delta, "Adjusted inventory");
    emit([line])
}

/// Delete a stock item (admin).
///
/// # Errors
///
/// Returns an error unless the acting user is an admin, or if the item
/// does not exist.
pub async fn delete(
    ctx: &mut AppContext,
    credentials: &Credentials,
    id: &str,
) -> Result<(), CommandError> {
    credentials.login_admin(ctx)?;
    let item_id = InventoryItemId::new(id);
    let next = ctx.state().delete_inventory_item(&item_id)?;
    ctx.apply(next).await?;
    info!(%item_id, "Deleted inventory item");
    emit([format!("Deleted item {item_id}")])
}

fn describe(item: &InventoryItem) -> String {
    let low = if item.is_low() { "  LOW" } else { "" };
    format!(
        "{}  {}: {} {}  min: {}  vendor: {}  url: {}  last purchased: {}{low}",
        item.id,
        item.name,
        item.quantity,
        item.unit,
        or_dash(item.min_threshold),
        or_dash(item.vendor.as_deref()),
        or_dash(item.vendor_url.as_deref()),
        or_dash(item.last_purchased.map(|t| t.format("%Y-%m-%d")))
    )
}
