//! miletrack-domain
//!
//! Pure domain models (Garage, Car, Reading) and calendar helpers.
//! No I/O, no CLI, no storage. Only data types and shared traits.

pub mod car;
pub mod common;
pub mod garage;
pub mod reading;

pub use car::*;
pub use common::*;
pub use garage::*;
pub use reading::*;
