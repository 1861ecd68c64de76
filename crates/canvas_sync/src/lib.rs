//! Keeps an editing session in sync with the remote project store.
//!
//! The store itself is abstracted behind [`PersistenceGateway`]. Commands do
//! not talk to the gateway directly. They go through [`Persistence`], which
//! owns the id discipline and decides, through its [`SyncPolicy`], whether a
//! failed store call is swallowed or reported.
//!
//! [`InMemoryGateway`] is a complete store kept in process memory, used for
//! offline sessions and throughout the tests.

pub mod error;
pub use error::GatewayError;

pub mod gateway;
pub use gateway::PersistenceGateway;

pub mod memory;
pub use memory::{GatewayCall, GatewayOp, InMemoryGateway};

pub mod persistence;
pub use persistence::{Persistence, SyncPolicy};

pub use async_trait::async_trait;
