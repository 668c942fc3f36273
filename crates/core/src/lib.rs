pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod record;

pub use aggregate::*;
pub use config::Config;
pub use error::*;
pub use record::*;
