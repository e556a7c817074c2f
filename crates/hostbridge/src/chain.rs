//! Chain queries plus head and log subscriptions.
//!
//! Block arguments on the host surface are `i64`; a negative number means
//! the latest block.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

use hostbridge_core::{
    Address, BigInt, Block, FilterQuery, Hash, Header, Log, Logs, Receipt, SyncProgress,
    Transaction,
};
use hostbridge_sub::{
    Context, ContextError, NativeSubscription, Subscription, SubscriptionError, SubscriptionPump,
};

use crate::error::{BridgeError, Result};
use crate::feed::Feed;
use crate::handlers::{FilterLogs, FilterLogsHandler, NewHeadHandler, NewHeads};

/// A native chain: one-shot queries and event sources.
///
/// Implementations must be thread-safe (Send + Sync). `number: None` asks
/// for the latest block.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    async fn block_by_hash(&self, ctx: &Context, hash: &Hash) -> Result<Block>;

    async fn block_by_number(&self, ctx: &Context, number: Option<u64>) -> Result<Block>;

    async fn header_by_hash(&self, ctx: &Context, hash: &Hash) -> Result<Header>;

    async fn header_by_number(&self, ctx: &Context, number: Option<u64>) -> Result<Header>;

    /// A transaction from a block body or the pending pool.
    async fn transaction_by_hash(&self, ctx: &Context, hash: &Hash) -> Result<Transaction>;

    async fn transaction_receipt(&self, ctx: &Context, hash: &Hash) -> Result<Receipt>;

    async fn balance_at(&self, ctx: &Context, account: &Address, number: Option<u64>)
        -> Result<BigInt>;

    /// Every recorded log matching `query`, oldest first.
    async fn filter_logs(&self, ctx: &Context, query: &FilterQuery) -> Result<Vec<Log>>;

    async fn suggest_gas_price(&self, ctx: &Context) -> Result<BigInt>;

    /// Submit `tx` to the pending pool.
    async fn send_transaction(&self, ctx: &Context, tx: &Transaction) -> Result<()>;

    /// `None` once the node is in sync.
    async fn sync_progress(&self, ctx: &Context) -> Result<Option<SyncProgress>>;

    /// Push every new canonical head into `sink`.
    async fn subscribe_new_head(
        &self,
        ctx: &Context,
        sink: mpsc::Sender<Header>,
    ) -> hostbridge_sub::Result<NativeSubscription>;

    /// Push every new log matching `query` into `sink`.
    async fn subscribe_filter_logs(
        &self,
        ctx: &Context,
        query: FilterQuery,
        sink: mpsc::Sender<Log>,
    ) -> hostbridge_sub::Result<NativeSubscription>;
}

fn block_number(number: i64) -> Option<u64> {
    u64::try_from(number).ok()
}

/// Synchronous host surface over a [`ChainBackend`].
#[derive(Clone)]
pub struct ChainClient {
    backend: Arc<dyn ChainBackend>,
    runtime: Handle,
    default_buffer: usize,
}

impl ChainClient {
    pub(crate) fn new(backend: Arc<dyn ChainBackend>, runtime: Handle, default_buffer: usize) -> Self {
        Self {
            backend,
            runtime,
            default_buffer,
        }
    }

    pub fn get_block_by_hash(&self, ctx: &Context, hash: &Hash) -> Result<Block> {
        self.query(ctx, self.backend.block_by_hash(ctx, hash))
    }

    pub fn get_block_by_number(&self, ctx: &Context, number: i64) -> Result<Block> {
        self.query(ctx, self.backend.block_by_number(ctx, block_number(number)))
    }

    pub fn get_header_by_hash(&self, ctx: &Context, hash: &Hash) -> Result<Header> {
        self.query(ctx, self.backend.header_by_hash(ctx, hash))
    }

    pub fn get_header_by_number(&self, ctx: &Context, number: i64) -> Result<Header> {
        self.query(ctx, self.backend.header_by_number(ctx, block_number(number)))
    }

    pub fn get_transaction_by_hash(&self, ctx: &Context, hash: &Hash) -> Result<Transaction> {
        self.query(ctx, self.backend.transaction_by_hash(ctx, hash))
    }

    pub fn get_transaction_receipt(&self, ctx: &Context, hash: &Hash) -> Result<Receipt> {
        self.query(ctx, self.backend.transaction_receipt(ctx, hash))
    }

    pub fn get_balance_at(&self, ctx: &Context, account: &Address, number: i64) -> Result<BigInt> {
        self.query(ctx, self.backend.balance_at(ctx, account, block_number(number)))
    }

    pub fn filter_logs(&self, ctx: &Context, query: &FilterQuery) -> Result<Logs> {
        self.query(ctx, self.backend.filter_logs(ctx, query))
            .map(Logs::from)
    }

    pub fn suggest_gas_price(&self, ctx: &Context) -> Result<BigInt> {
        self.query(ctx, self.backend.suggest_gas_price(ctx))
    }

    pub fn send_transaction(&self, ctx: &Context, tx: &Transaction) -> Result<()> {
        self.query(ctx, self.backend.send_transaction(ctx, tx))
    }

    pub fn sync_progress(&self, ctx: &Context) -> Result<Option<SyncProgress>> {
        self.query(ctx, self.backend.sync_progress(ctx))
    }

    /// Deliver new heads to `handler` until the source ends or `ctx` is done.
    ///
    /// `None` uses the bridge's default buffer.
    pub fn subscribe_new_head(
        &self,
        ctx: &Context,
        handler: Arc<dyn NewHeadHandler>,
        buffer: Option<usize>,
    ) -> Result<Subscription> {
        let pump = SubscriptionPump::new(ctx, Arc::new(NewHeads(handler)), self.buffer(buffer));
        let backend = Arc::clone(&self.backend);
        let sub = self.runtime.block_on(pump.start(|ctx, sink| async move {
            backend.subscribe_new_head(&ctx, sink).await
        }))?;
        Ok(sub)
    }

    /// Deliver logs matching `query` to `handler`.
    pub fn subscribe_filter_logs(
        &self,
        ctx: &Context,
        query: &FilterQuery,
        handler: Arc<dyn FilterLogsHandler>,
        buffer: Option<usize>,
    ) -> Result<Subscription> {
        let pump = SubscriptionPump::new(ctx, Arc::new(FilterLogs(handler)), self.buffer(buffer));
        let backend = Arc::clone(&self.backend);
        let query = query.clone();
        let sub = self.runtime.block_on(pump.start(|ctx, sink| async move {
            backend.subscribe_filter_logs(&ctx, query, sink).await
        }))?;
        Ok(sub)
    }

    fn buffer(&self, requested: Option<usize>) -> usize {
        requested.unwrap_or(self.default_buffer)
    }

    /// Run one backend query to completion, giving up when `ctx` ends.
    fn query<T>(&self, ctx: &Context, request: impl Future<Output = Result<T>>) -> Result<T> {
        if let Some(cause) = ctx.err() {
            return Err(cause.into());
        }
        self.runtime.block_on(async {
            tokio::select! {
                result = request => result,
                _ = ctx.done() => Err(ctx.err().unwrap_or(ContextError::Canceled).into()),
            }
        })
    }
}

#[derive(Default)]
struct ChainState {
    blocks: BTreeMap<u64, Block>,
    receipts: HashMap<Hash, Receipt>,
    logs: Vec<Log>,
    /// Balance changes per account, keyed by the block they take effect at.
    balances: HashMap<Address, BTreeMap<u64, BigInt>>,
    pending: Vec<Transaction>,
    gas_price: BigInt,
    progress: Option<SyncProgress>,
}

impl ChainState {
    fn block(&self, number: Option<u64>) -> Option<&Block> {
        match number {
            Some(n) => self.blocks.get(&n),
            None => self.blocks.values().next_back(),
        }
    }

    fn block_by_hash(&self, hash: &Hash) -> Option<&Block> {
        self.blocks.values().find(|b| b.hash() == *hash)
    }

    fn head(&self) -> u64 {
        self.blocks.keys().next_back().copied().unwrap_or(0)
    }
}

/// In-process chain for tests and embedding hosts.
pub struct MemoryChain {
    heads: Feed<Header, ()>,
    logs: Feed<Log, FilterQuery>,
    state: Mutex<ChainState>,
    rejecting: Mutex<Option<String>>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self {
            heads: Feed::new(),
            logs: Feed::new(),
            state: Mutex::new(ChainState::default()),
            rejecting: Mutex::new(None),
        }
    }

    /// Store `block` with its `receipts`, then announce its header and the
    /// receipts' logs. Included transactions leave the pending pool.
    /// Returns how many head subscribers received the header.
    pub async fn import_block(&self, block: Block, receipts: Vec<Receipt>) -> usize {
        let header = block.header();
        let logs: Vec<Log> = receipts.iter().flat_map(|r| r.logs.iter().cloned()).collect();
        {
            let mut state = self.state.lock();
            let included: Vec<Hash> = block.transactions.iter().map(Transaction::hash).collect();
            state.pending.retain(|tx| !included.contains(&tx.hash()));
            for receipt in receipts {
                state.receipts.insert(receipt.tx_hash, receipt);
            }
            state.logs.extend(logs.iter().cloned());
            state.blocks.insert(block.number(), block);
        }
        debug!(number = header.number, logs = logs.len(), "block imported");

        let delivered = self.publish_head(header).await;
        for log in logs {
            self.publish_log(log).await;
        }
        delivered
    }

    /// Set `account`'s balance from block `number` onwards.
    pub fn set_balance(&self, account: &Address, number: u64, amount: &BigInt) {
        self.state
            .lock()
            .balances
            .entry(*account)
            .or_default()
            .insert(number, amount.clone());
    }

    pub fn set_gas_price(&self, price: &BigInt) {
        self.state.lock().gas_price = price.clone();
    }

    /// `None` reports the node as in sync.
    pub fn set_sync_progress(&self, progress: Option<SyncProgress>) {
        self.state.lock().progress = progress;
    }

    /// Transactions submitted but not yet imported.
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.state.lock().pending.clone()
    }

    /// Announce a new head. Returns how many subscribers received it.
    pub async fn publish_head(&self, header: Header) -> usize {
        self.heads.send(&header, |_, _| true).await
    }

    /// Announce a log to every matching filter.
    pub async fn publish_log(&self, log: Log) -> usize {
        self.logs.send(&log, |query, log| query.matches(log)).await
    }

    /// Fail every open subscription with `message`.
    pub fn fail_all(&self, message: &str) {
        self.heads.close_all(Some(message));
        self.logs.close_all(Some(message));
    }

    /// Close every open subscription without an error.
    pub fn close_all(&self) {
        self.heads.close_all(None);
        self.logs.close_all(None);
    }

    /// Reject new registrations with `reason`; `None` accepts again.
    pub fn set_rejecting(&self, reason: Option<&str>) {
        *self.rejecting.lock() = reason.map(str::to_string);
    }

    /// Live head and log subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.heads.len() + self.logs.len()
    }

    fn admit(&self, ctx: &Context) -> hostbridge_sub::Result<()> {
        if let Some(cause) = ctx.err() {
            return Err(cause.into());
        }
        match self.rejecting.lock().as_ref() {
            Some(reason) => Err(SubscriptionError::RegistrationFailure(reason.clone())),
            None => Ok(()),
        }
    }
}

fn live(ctx: &Context) -> Result<()> {
    match ctx.err() {
        Some(cause) => Err(cause.into()),
        None => Ok(()),
    }
}

fn missing_block(number: Option<u64>) -> BridgeError {
    match number {
        Some(n) => BridgeError::NotFound(format!("block {n}")),
        None => BridgeError::NotFound("latest block".into()),
    }
}

impl Default for MemoryChain {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainBackend for MemoryChain {
    async fn block_by_hash(&self, ctx: &Context, hash: &Hash) -> Result<Block> {
        live(ctx)?;
        self.state
            .lock()
            .block_by_hash(hash)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(format!("block {hash}")))
    }

    async fn block_by_number(&self, ctx: &Context, number: Option<u64>) -> Result<Block> {
        live(ctx)?;
        self.state
            .lock()
            .block(number)
            .cloned()
            .ok_or_else(|| missing_block(number))
    }

    async fn header_by_hash(&self, ctx: &Context, hash: &Hash) -> Result<Header> {
        live(ctx)?;
        self.state
            .lock()
            .block_by_hash(hash)
            .map(Block::header)
            .ok_or_else(|| BridgeError::NotFound(format!("header {hash}")))
    }

    async fn header_by_number(&self, ctx: &Context, number: Option<u64>) -> Result<Header> {
        live(ctx)?;
        self.state
            .lock()
            .block(number)
            .map(Block::header)
            .ok_or_else(|| missing_block(number))
    }

    async fn transaction_by_hash(&self, ctx: &Context, hash: &Hash) -> Result<Transaction> {
        live(ctx)?;
        let state = self.state.lock();
        state
            .blocks
            .values()
            .find_map(|block| block.transaction(hash))
            .or_else(|| state.pending.iter().find(|tx| tx.hash() == *hash).cloned())
            .ok_or_else(|| BridgeError::NotFound(format!("transaction {hash}")))
    }

    async fn transaction_receipt(&self, ctx: &Context, hash: &Hash) -> Result<Receipt> {
        live(ctx)?;
        self.state
            .lock()
            .receipts
            .get(hash)
            .cloned()
            .ok_or_else(|| BridgeError::NotFound(format!("receipt {hash}")))
    }

    async fn balance_at(
        &self,
        ctx: &Context,
        account: &Address,
        number: Option<u64>,
    ) -> Result<BigInt> {
        live(ctx)?;
        let state = self.state.lock();
        let at = number.unwrap_or_else(|| state.head());
        let balance = state
            .balances
            .get(account)
            .and_then(|history| history.range(..=at).next_back())
            .map(|(_, amount)| amount.clone())
            .unwrap_or_default();
        Ok(balance)
    }

    async fn filter_logs(&self, ctx: &Context, query: &FilterQuery) -> Result<Vec<Log>> {
        live(ctx)?;
        let logs: Vec<Log> = self
            .state
            .lock()
            .logs
            .iter()
            .filter(|log| query.matches(log))
            .cloned()
            .collect();
        debug!(matched = logs.len(), "log filter query");
        Ok(logs)
    }

    async fn suggest_gas_price(&self, ctx: &Context) -> Result<BigInt> {
        live(ctx)?;
        Ok(self.state.lock().gas_price.clone())
    }

    async fn send_transaction(&self, ctx: &Context, tx: &Transaction) -> Result<()> {
        live(ctx)?;
        let hash = tx.hash();
        let mut state = self.state.lock();
        let known = state.pending.iter().any(|p| p.hash() == hash)
            || state.blocks.values().any(|b| b.transaction(&hash).is_some());
        if known {
            return Err(BridgeError::Rejected(format!("already known: {hash}")));
        }
        state.pending.push(tx.clone());
        debug!(%hash, pending = state.pending.len(), "transaction submitted");
        Ok(())
    }

    async fn sync_progress(&self, ctx: &Context) -> Result<Option<SyncProgress>> {
        live(ctx)?;
        Ok(self.state.lock().progress.clone())
    }

    async fn subscribe_new_head(
        &self,
        ctx: &Context,
        sink: mpsc::Sender<Header>,
    ) -> hostbridge_sub::Result<NativeSubscription> {
        self.admit(ctx)?;
        debug!("new head subscription");
        Ok(self.heads.subscribe((), sink))
    }

    async fn subscribe_filter_logs(
        &self,
        ctx: &Context,
        query: FilterQuery,
        sink: mpsc::Sender<Log>,
    ) -> hostbridge_sub::Result<NativeSubscription> {
        self.admit(ctx)?;
        debug!(
            addresses = query.addresses.len(),
            positions = query.topics.len(),
            "log filter subscription"
        );
        Ok(self.logs.subscribe(query, sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(nonce: u64) -> Transaction {
        Transaction::new(
            nonce,
            Some(&Address([0x0b; 20])),
            &BigInt::new(1_000),
            21_000,
            &BigInt::new(3),
            &[],
        )
    }

    fn block(number: u64, transactions: Vec<Transaction>) -> Block {
        Block {
            header: Header {
                number,
                ..Header::default()
            },
            transactions,
            uncles: Vec::new(),
        }
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_memory_chain_routes_logs_by_query() {
        let chain = MemoryChain::new();
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);

        let mut only_a = FilterQuery::new();
        only_a.addresses.push(Address([0xaa; 20]));
        let _sub_a = chain
            .subscribe_filter_logs(&Context::background(), only_a, tx_a)
            .await
            .unwrap();
        let _sub_b = chain
            .subscribe_filter_logs(&Context::background(), FilterQuery::new(), tx_b)
            .await
            .unwrap();

        let log = Log {
            address: Address([0xbb; 20]),
            topics: vec![Hash::ZERO],
            ..Log::default()
        };
        assert_eq!(chain.publish_log(log.clone()).await, 1);
        assert_eq!(rx_b.recv().await.unwrap(), log);
        assert!(rx_a.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rejecting_and_cancelled_registration() {
        let chain = MemoryChain::new();
        chain.set_rejecting(Some("node syncing"));
        let (tx, _rx) = mpsc::channel(1);
        let err = chain
            .subscribe_new_head(&Context::background(), tx.clone())
            .await
            .unwrap_err();
        assert!(matches!(err, SubscriptionError::RegistrationFailure(ref r) if r == "node syncing"));

        chain.set_rejecting(None);
        let ctx = Context::background().with_cancel();
        ctx.cancel();
        let err = chain.subscribe_new_head(&ctx, tx).await.unwrap_err();
        assert!(matches!(err, SubscriptionError::ContextDone(_)));
        assert_eq!(chain.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let chain = MemoryChain::new();
        let (tx, rx) = mpsc::channel(1);
        let native = chain
            .subscribe_new_head(&Context::background(), tx)
            .await
            .unwrap();
        assert_eq!(chain.subscriber_count(), 1);
        drop(native);
        drop(rx);
        assert_eq!(chain.subscriber_count(), 0);
        assert_eq!(chain.publish_head(Header::default()).await, 0);
    }

    #[test]
    fn test_client_subscribe_and_unsubscribe() {
        struct Heads(Mutex<Vec<u64>>);

        impl NewHeadHandler for Heads {
            fn on_new_head(&self, header: Header) {
                self.0.lock().push(header.number);
            }

            fn on_error(&self, _failure: String) {}
        }

        let runtime = runtime();
        let chain = Arc::new(MemoryChain::new());
        let client = ChainClient::new(chain.clone(), runtime.handle().clone(), 4);
        let heads = Arc::new(Heads(Mutex::new(Vec::new())));

        let sub = client
            .subscribe_new_head(&Context::background(), heads.clone(), None)
            .unwrap();
        for number in 1..=3 {
            let header = Header {
                number,
                ..Header::default()
            };
            runtime.block_on(chain.publish_head(header));
        }
        sub.unsubscribe();
        runtime.block_on(sub.terminated());

        let seen = heads.0.lock().clone();
        assert!(seen.len() <= 3);
        assert_eq!(seen, (1..=seen.len() as u64).collect::<Vec<_>>());
        assert_eq!(chain.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_block_and_header_queries() {
        let chain = MemoryChain::new();
        let ctx = Context::background();
        assert!(matches!(
            chain.block_by_number(&ctx, None).await,
            Err(BridgeError::NotFound(_))
        ));

        chain.import_block(block(1, vec![]), vec![]).await;
        chain.import_block(block(2, vec![]), vec![]).await;

        let latest = chain.block_by_number(&ctx, None).await.unwrap();
        assert_eq!(latest.number(), 2);
        let first = chain.header_by_number(&ctx, Some(1)).await.unwrap();
        assert_eq!(chain.header_by_hash(&ctx, &first.hash()).await.unwrap(), first);
        assert_eq!(
            chain.block_by_hash(&ctx, &latest.hash()).await.unwrap(),
            latest
        );
        let err = chain.header_by_number(&ctx, Some(9)).await.unwrap_err();
        assert_eq!(err.to_string(), "not found: block 9");
    }

    #[tokio::test]
    async fn test_pending_pool_and_receipts() {
        let chain = MemoryChain::new();
        let ctx = Context::background();
        let tx = transfer(0);

        chain.send_transaction(&ctx, &tx).await.unwrap();
        assert!(matches!(
            chain.send_transaction(&ctx, &tx).await,
            Err(BridgeError::Rejected(_))
        ));
        assert_eq!(chain.transaction_by_hash(&ctx, &tx.hash()).await.unwrap(), tx);
        assert!(chain.transaction_receipt(&ctx, &tx.hash()).await.is_err());

        let receipt = Receipt {
            status: 1,
            tx_hash: tx.hash(),
            logs: vec![Log {
                address: Address([0x0b; 20]),
                tx_hash: tx.hash(),
                block_number: 1,
                ..Log::default()
            }],
            ..Receipt::default()
        };
        chain.import_block(block(1, vec![tx.clone()]), vec![receipt.clone()]).await;

        assert!(chain.pending_transactions().is_empty());
        assert_eq!(chain.transaction_receipt(&ctx, &tx.hash()).await.unwrap(), receipt);
        assert_eq!(chain.transaction_by_hash(&ctx, &tx.hash()).await.unwrap(), tx);
        assert!(chain.send_transaction(&ctx, &tx).await.is_err());

        let mut query = FilterQuery::new();
        query.addresses.push(Address([0x0b; 20]));
        assert_eq!(chain.filter_logs(&ctx, &query).await.unwrap(), receipt.logs);
        query.set_from_block(2);
        assert!(chain.filter_logs(&ctx, &query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_balance_history() {
        let chain = MemoryChain::new();
        let ctx = Context::background();
        let account = Address([0x33; 20]);
        chain.set_balance(&account, 1, &BigInt::new(10));
        chain.set_balance(&account, 3, &BigInt::new(25));
        for number in 1..=4 {
            chain.import_block(block(number, vec![]), vec![]).await;
        }

        let expected = [(Some(0), 0), (Some(2), 10), (Some(3), 25), (None, 25)];
        for (number, amount) in expected {
            let balance = chain.balance_at(&ctx, &account, number).await.unwrap();
            assert_eq!(balance, BigInt::new(amount), "at {number:?}");
        }
    }

    #[test]
    fn test_client_queries_honour_context() {
        let runtime = runtime();
        let chain = Arc::new(MemoryChain::new());
        let client = ChainClient::new(chain.clone(), runtime.handle().clone(), 4);
        let ctx = Context::background();

        chain.set_gas_price(&BigInt::new(7));
        assert_eq!(client.suggest_gas_price(&ctx).unwrap(), BigInt::new(7));
        assert_eq!(client.sync_progress(&ctx).unwrap(), None);
        chain.set_sync_progress(Some(SyncProgress {
            current_block: 5,
            highest_block: 8,
            ..SyncProgress::default()
        }));
        assert_eq!(client.sync_progress(&ctx).unwrap().unwrap().remaining(), 3);

        runtime.block_on(chain.import_block(block(4, vec![]), vec![]));
        assert_eq!(client.get_block_by_number(&ctx, -1).unwrap().number(), 4);
        assert_eq!(client.get_header_by_number(&ctx, 4).unwrap().number, 4);
        assert!(client.filter_logs(&ctx, &FilterQuery::new()).unwrap().size() == 0);

        let cancelled = Context::background().with_cancel();
        cancelled.cancel();
        assert!(matches!(
            client.get_block_by_number(&cancelled, -1),
            Err(BridgeError::ContextDone(ContextError::Canceled))
        ));
    }
}
