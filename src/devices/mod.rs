//! Gateway device records and their mapping to points
//!
//! The schema registry declares, per device type, which fields become
//! measurement fields or tags; the mapper applies it to raw records.

mod mapper;
mod record;
mod schema;

pub use mapper::{map_devices, map_record};
pub use record::DeviceRecord;
pub use schema::{registry, Coercion, DeviceSpec};
