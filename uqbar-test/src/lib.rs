//! Test doubles for the wallet crates: `mockall` mocks of every external
//! collaborator and an in-memory `FakeChainClient` that behaves like a
//! minimal wallet agent.

pub use fake::FakeChainClient;
pub use mocks::*;

mod fake;
/// Mock chain client and signer providers
pub mod mocks;
