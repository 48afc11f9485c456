//! Database operations for the `shops` table.

mod read;
mod types;
mod write;

pub use read::{
    find_shops_by_name, find_shops_by_place_ids, find_shops_within_radius, get_existing_snapshots,
};
pub use types::{ShopRow, SnapshotRow};
pub use write::{insert_shops, update_shops};
