pub mod admin;
pub mod client_ip;

pub use admin::{admin_auth_middleware, ADMIN_PASSWORD_HEADER};
pub use client_ip::ClientIp;
