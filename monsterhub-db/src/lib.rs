pub mod auth;
pub mod error;
pub mod posts;
pub mod projection;
pub mod registry;
pub mod session;
pub mod store;

pub use error::{DbError, Result};
