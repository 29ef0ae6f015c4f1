pub mod config;
pub mod data;
pub mod error;
pub mod ledger;
pub mod source;

pub use config::Config;
pub use data::*;
pub use error::*;
pub use ledger::*;
pub use source::*;
