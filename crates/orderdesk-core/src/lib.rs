//! Core domain types for the orderdesk settings engine.
//!
//! This crate provides the types shared by every other crate:
//! - `ConfigDocument`: the parsed settings document (networks, subgraphs,
//!   orderbooks, orders, deployments)
//! - Ref aliases: string keys into the document mappings
//! - `KvStore`, `ErrorReporter`: collaborator traits implemented outside
//!   the reactive core

pub mod document;
pub mod report;
pub mod store;

pub use document::{
    ConfigDocument, Deployment, DeploymentRef, Network, NetworkRef, Order, OrderRef, Orderbook,
    OrderbookRef, SubgraphRef,
};
pub use report::ErrorReporter;
pub use store::KvStore;
