pub mod city;
pub mod cookie;
pub mod jwt;
pub mod locks;
pub mod password;

pub use city::normalize_city;
pub use jwt::{decode_session_token, encode_session_token};
pub use password::{hash_password, verify_password};
