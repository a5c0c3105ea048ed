//! Bearer tokens.

pub mod jwt;
