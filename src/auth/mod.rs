pub mod cookies;
pub mod handlers;
pub mod password;
pub mod session;
