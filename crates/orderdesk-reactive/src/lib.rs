//! Observable cell primitives.
//!
//! Push-based reactive building blocks for the selection graph:
//! - `Cell`: mutable value with synchronous subscriber broadcast
//! - `CachedCell`: a `Cell` persisted through a `KvStore`
//! - `Derived`: pure function of one or more observables, recomputed on
//!   every source broadcast
//! - `AsyncDerived`: derived value whose recompute runs on the tokio
//!   runtime, with generation-keyed last-writer-wins settling and a
//!   fallback on failure
//!
//! Propagation is synchronous and depth-first: `set` notifies every
//! subscriber before it returns, and a subscriber may `get` or `set` other
//! cells freely. The only suspension point in the whole graph is an
//! `AsyncDerived` computation.

pub mod async_derived;
pub mod cached;
pub mod cell;
pub mod derived;

pub use async_derived::{async_derived, async_derived2, settle_result, AsyncDerived};
pub use cached::{cached_string, cached_string_optional, CachedCell};
pub use cell::{Cell, Observable, Subscriber, Subscription};
pub use derived::{derived, derived2, derived3, Derived};
