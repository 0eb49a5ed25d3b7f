use std::collections::{BTreeMap, HashMap, VecDeque};

use async_trait::async_trait;
use ethers_core::types::H256;
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};
use tracing::debug;

use uqbar_core::utils::{add_decimal_dots, add_hex_dots};
use uqbar_core::{
    keccak256, ChainClient, ChainClientError, ChainResult, SubscriptionEvent, SubscriptionStream,
};

#[derive(Debug, Default)]
struct FakeState {
    scries: HashMap<String, Value>,
    pending: BTreeMap<String, Map<String, Value>>,
    nonces: HashMap<String, u64>,
    pokes: Vec<Value>,
    poke_failures: VecDeque<String>,
    subscribers: HashMap<String, Vec<UnboundedSender<SubscriptionEvent>>>,
    subscribe_calls: HashMap<String, usize>,
    issued: u64,
}

/// An in-memory wallet agent.
///
/// Records every poke. A `transaction` poke with a `from` creates a pending
/// transaction for that address; `submit-signed`, `submit` and
/// `delete-pending` remove it again. `/pending/{address}` scries are served
/// from that state, every other scry from values set with `set_scry`.
/// Subscriptions are fed by `push_event`.
#[derive(Debug, Default)]
pub struct FakeChainClient {
    state: Mutex<FakeState>,
}

impl FakeChainClient {
    /// An agent with no state
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `value` for scries of `path`
    pub fn set_scry(&self, path: &str, value: Value) {
        self.state.lock().scries.insert(path.to_owned(), value);
    }

    /// Every poke received, in order
    pub fn pokes(&self) -> Vec<Value> {
        self.state.lock().pokes.clone()
    }

    /// Payloads of the pokes with action `name`
    pub fn pokes_named(&self, name: &str) -> Vec<Value> {
        self.state
            .lock()
            .pokes
            .iter()
            .filter_map(|poke| poke.get(name).cloned())
            .collect()
    }

    /// Reject the next poke with `reason`
    pub fn fail_next_poke(&self, reason: &str) {
        self.state.lock().poke_failures.push_back(reason.to_owned());
    }

    /// Pending transactions of `address`
    pub fn pending(&self, address: &str) -> Map<String, Value> {
        self.state
            .lock()
            .pending
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    /// Add a pending transaction for `address` directly
    pub fn insert_pending(&self, address: &str, hash: &str, fields: Value) {
        self.state
            .lock()
            .pending
            .entry(address.to_owned())
            .or_default()
            .insert(hash.to_owned(), fields);
    }

    /// Deliver `value` to every open subscription on `path`
    pub fn push_event(&self, path: &str, value: Value) {
        let mut state = self.state.lock();
        if let Some(senders) = state.subscribers.get_mut(path) {
            senders.retain(|tx| {
                tx.unbounded_send(SubscriptionEvent::Event(value.clone()))
                    .is_ok()
            });
        }
    }

    /// Send `event` to every open subscription on `path` and close them
    pub fn close_subscriptions(&self, path: &str, event: SubscriptionEvent) {
        let mut state = self.state.lock();
        for tx in state.subscribers.remove(path).unwrap_or_default() {
            let _ = tx.unbounded_send(event.clone());
            tx.close_channel();
        }
    }

    /// Number of subscribe calls made for `path`
    pub fn subscribe_count(&self, path: &str) -> usize {
        self.state
            .lock()
            .subscribe_calls
            .get(path)
            .copied()
            .unwrap_or_default()
    }

    fn apply_poke(state: &mut FakeState, json: &Value) {
        let Some((name, body)) = json.as_object().and_then(|obj| obj.iter().next()) else {
            return;
        };
        let from = body.get("from").and_then(Value::as_str).map(str::to_owned);
        match (name.as_str(), from) {
            ("transaction", Some(from)) => {
                state.issued += 1;
                let hash = add_hex_dots(&format!(
                    "{:x}",
                    H256::from(keccak256(state.issued.to_be_bytes()))
                ));
                let nonce = state.nonces.entry(from.clone()).or_default();
                let fields = json!({
                    "from": from.clone(),
                    "contract": body.get("contract").cloned().unwrap_or_default(),
                    "town": body.get("town").cloned().unwrap_or_default(),
                    "action": body.get("action").cloned().unwrap_or_default(),
                    "status": "100",
                    "nonce": add_decimal_dots(*nonce),
                    "rate": "0",
                    "budget": "0",
                });
                *nonce += 1;
                debug!(%hash, %from, "Created pending transaction");
                state.pending.entry(from).or_default().insert(hash, fields);
            }
            ("submit-signed" | "submit" | "delete-pending", Some(from)) => {
                if let Some(hash) = body.get("hash").and_then(Value::as_str) {
                    if let Some(pending) = state.pending.get_mut(&from) {
                        pending.remove(hash);
                    }
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl ChainClient for FakeChainClient {
    async fn scry(&self, app: &str, path: &str) -> ChainResult<Value> {
        let state = self.state.lock();
        if let Some(address) = path.strip_prefix("/pending/") {
            return Ok(Value::Object(
                state.pending.get(address).cloned().unwrap_or_default(),
            ));
        }
        state
            .scries
            .get(path)
            .cloned()
            .ok_or_else(|| ChainClientError::ScryFailed {
                app: app.to_owned(),
                path: path.to_owned(),
                reason: "no such path".to_owned(),
            })
    }

    async fn poke(&self, app: &str, mark: &str, json: Value) -> ChainResult<()> {
        let mut state = self.state.lock();
        state.pokes.push(json.clone());
        if let Some(reason) = state.poke_failures.pop_front() {
            return Err(ChainClientError::PokeRejected {
                app: app.to_owned(),
                mark: mark.to_owned(),
                reason,
            });
        }
        Self::apply_poke(&mut state, &json);
        Ok(())
    }

    async fn subscribe(&self, _app: &str, path: &str) -> ChainResult<SubscriptionStream> {
        let (tx, rx) = unbounded();
        let mut state = self.state.lock();
        *state.subscribe_calls.entry(path.to_owned()).or_default() += 1;
        state.subscribers.entry(path.to_owned()).or_default().push(tx);
        Ok(rx.boxed())
    }
}
