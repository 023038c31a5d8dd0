//! # crypto-utils
//!
//! Secure random generation and zero-on-drop containers for the secret
//! material handled by the lab (entropy for new keys, WIF strings).

pub mod random;
pub mod zeroizing;

pub use zeroizing::ZeroizingString;
