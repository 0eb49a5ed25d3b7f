//! This crate contains the plumbing shared by wallet front ends: settings
//! loading, tracing setup, and the timing primitives (debounce, bounded
//! polling, supervised subscriptions) the wallet controller is built on.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod settings;

mod debounce;
pub use debounce::*;

mod polling;
pub use polling::*;

mod subscription;
pub use subscription::*;
