pub use chain_client::MockChainClient;
pub use providers::{MockEip1193Provider, MockHardwareDevice, MockWalletConnectSession};

mod chain_client;
mod providers;
