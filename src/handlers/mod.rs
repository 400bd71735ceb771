pub mod auth;
pub mod comment;
pub mod complaint;
pub mod profile;
pub mod support;

pub use auth::*;
