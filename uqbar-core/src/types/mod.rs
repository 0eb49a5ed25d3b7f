pub use account::*;
pub use assets::*;
pub use poke::*;
pub use signature::*;
pub use status::*;
pub use transaction::*;

mod account;
mod assets;
mod poke;
mod signature;
mod status;
mod transaction;
