//! InfluxDB line protocol
//!
//! Point model plus the encoder used for the write API body, and a decoder
//! for the same subset.

pub mod decode;
pub mod encode;
mod point;

pub use decode::{decode, decode_lines};
pub use encode::{encode, encode_all, render_item, render_tag};
pub use point::{is_valid_name, FieldValue, Point};
