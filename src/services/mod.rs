pub mod auth;
pub mod comment;
pub mod complaint;
pub mod ranking;
pub mod support;
pub mod user;
