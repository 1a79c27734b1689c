pub mod crypto;
pub mod error;
pub mod jwt;
pub mod validation;
