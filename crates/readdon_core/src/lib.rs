pub mod config;
pub mod entities;
pub mod error;
pub mod filter;
pub mod ports;
pub mod use_cases;

pub use error::{Error, ErrorKind};
pub use filter::AddonFilter;
