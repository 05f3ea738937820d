//! Container provisioning and host relaying for hostbox.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod clone;
pub mod manager;
pub mod provision;
pub mod relay;
