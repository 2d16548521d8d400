//! Test helpers shared across the `layered_config` workspace.
//!
//! [`jail`] isolates the working directory and environment of a test;
//! [`stores`] supplies instrumented [`layered_config::SecretStore`]
//! implementations.

pub mod jail;
pub mod stores;

pub use jail::{jail_error, with_jail, write_file};
pub use stores::{CountingStore, FailingStore};
