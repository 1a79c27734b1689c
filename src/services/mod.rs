pub mod auth;
pub mod channel;
pub mod member;
pub mod message;
pub mod server;
pub mod user;
