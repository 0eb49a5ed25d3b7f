pub use chain_client::*;
pub use signing::*;

mod chain_client;
mod signing;
