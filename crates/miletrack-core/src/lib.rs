//! miletrack-core
//!
//! Mileage projection, reading analysis, and the services that mutate a garage.
//! Depends on miletrack-domain. No CLI, no terminal I/O, no direct storage interactions.

pub mod analysis;
pub mod cache;
pub mod car_service;
pub mod classification;
pub mod error;
pub mod garage_service;
pub mod import_service;
pub mod projection;
pub mod reading_service;
pub mod storage;
pub mod summary_service;
pub mod time;

#[cfg(test)]
mod tests;

pub use analysis::*;
pub use cache::*;
pub use car_service::*;
pub use classification::*;
pub use error::CoreError;
pub use garage_service::*;
pub use import_service::*;
pub use projection::*;
pub use reading_service::*;
pub use summary_service::*;
pub use time::Clock;
