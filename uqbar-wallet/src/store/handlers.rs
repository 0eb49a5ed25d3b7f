//! Subscription event handlers. Each decodes one event and applies it to the
//! store; events that cannot be decoded are logged and dropped.

use serde_json::Value;
use tracing::{debug, warn};
use uqbar_core::{assets_from_wire, metadata_from_wire};

use super::WalletStore;

/// `/book-updates`: the full token book, keyed by holder
pub(crate) fn handle_book_update(store: &WalletStore, event: Value) {
    match assets_from_wire(&event) {
        Ok(assets) => {
            debug!(holders = assets.len(), "Book update");
            store.set_assets(assets);
        }
        Err(err) => warn!(error = %err, "Dropping malformed book update"),
    }
}

/// `/metadata-updates`: the full metadata store
pub(crate) fn handle_metadata_update(store: &WalletStore, event: Value) {
    match metadata_from_wire(&event) {
        Ok(metadata) => {
            debug!(tokens = metadata.len(), "Metadata update");
            store.set_metadata(metadata);
        }
        Err(err) => warn!(error = %err, "Dropping malformed metadata update"),
    }
}

/// `/tx-updates`: one `{hash: fields}` transaction
pub(crate) fn handle_tx_update(store: &WalletStore, event: Value) {
    if let Err(err) = store.apply_transaction_event(&event) {
        warn!(error = %err, "Dropping malformed transaction update");
    }
}
