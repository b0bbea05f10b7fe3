//! Domain models.

pub mod adjustment;
pub mod inventory;
pub mod log;
pub mod pool;
pub mod reading;
pub mod user;

pub use adjustment::{AdjustmentOrigin, ChemicalAdjustment, MANUAL_REASON};
pub use inventory::{DEFAULT_UNIT, InventoryItem, NewInventoryItem};
pub use log::{LogEntry, WaterEvents};
pub use pool::{PoolConfig, PoolData};
pub use reading::ChemicalReading;
pub use user::User;
