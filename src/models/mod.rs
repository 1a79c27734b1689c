pub mod channel;
pub mod message;
pub mod server;
pub mod server_member;
pub mod user;
