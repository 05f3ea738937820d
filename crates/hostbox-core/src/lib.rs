//! # hostbox-core
//!
//! Launch configuration for host-integrated containers.
//!
//! This crate provides:
//! - **Host probing**: read-only detection of optional integration points
//!   (SELinux, `/nix`, symlinked `/dev/shm`, runtime dir, ostree home).
//! - **Requests**: validation and defaulting of a container create request.
//! - **Launch synthesis**: a pure mapping from request and host facts to the
//!   ordered argument list handed to the container manager.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod host;
pub mod launch;
pub mod request;
