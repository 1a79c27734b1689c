//! Authorization and membership integrity.
//!
//! [`membership`] answers role questions, [`guards`] proves a resource path
//! is real, [`policy`] composes both into one decision per operation, and
//! [`cascade`] performs the writes whose invariants outlive a single check.

pub mod cascade;
pub mod guards;
pub mod membership;
pub mod policy;
