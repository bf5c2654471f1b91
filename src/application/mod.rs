pub mod account;
pub mod catalog;
mod dependencies;
mod errors;
pub mod loan;
pub mod wishlist;

pub use dependencies::{ServiceDependencies, ServiceSettings};
pub(crate) use dependencies::require_admin;
pub use errors::{ApplicationError, Result};
