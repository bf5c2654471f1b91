pub mod catalog;
pub mod commands;
pub mod errors;
pub mod loan;
pub mod user;
pub mod value_objects;
pub mod wishlist;

pub use errors::*;
pub use value_objects::*;
