//! Storefront profiles

pub mod amazon;
