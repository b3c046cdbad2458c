//! Mock implementations for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

use crate::domain::{
    Address, AppError, ChainError, ChainGateway, DomainInfo, MutationKind, SECONDS_PER_YEAR,
    Session, TransactionRequest, WalletConnector, WalletError, bare_name,
};

/// Configuration for mock behavior
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    pub should_fail: bool,
    pub error_message: Option<String>,
}

impl MockConfig {
    #[must_use]
    pub fn success() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            should_fail: true,
            error_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone)]
enum PendingWrite {
    Bio { name_hash: String, bio: String },
    Address { name_hash: String, addr: Address },
    Renew { name: String, duration_secs: u64 },
}

#[derive(Debug, Default)]
struct MockChainState {
    domains: HashMap<String, DomainInfo>,
    initialized: HashSet<Address>,
    price_per_year: f64,
    fail_reads: bool,
    fail_writes: bool,
    fail_rent: bool,
    fail_init: bool,
    fail_seal: bool,
    pending: HashMap<String, PendingWrite>,
    next_tx: u64,
    rent_cost_calls: Vec<(String, u64)>,
    submissions: Vec<MutationKind>,
    domain_reads: usize,
    init_checks: usize,
}

/// In-memory chain: writes are staged per transaction id and applied when
/// the transaction is sealed.
pub struct MockChainGateway {
    state: Mutex<MockChainState>,
    config: MockConfig,
    seal_delay: Mutex<Duration>,
    init_delay: Mutex<Duration>,
    rent_delay: Mutex<Duration>,
    is_healthy: AtomicBool,
}

impl MockChainGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(MockConfig::success())
    }

    #[must_use]
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            state: Mutex::new(MockChainState {
                price_per_year: 1.0,
                ..Default::default()
            }),
            config,
            seal_delay: Mutex::new(Duration::ZERO),
            init_delay: Mutex::new(Duration::ZERO),
            rent_delay: Mutex::new(Duration::ZERO),
            is_healthy: AtomicBool::new(true),
        }
    }

    /// Every call fails with the given message
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_config(MockConfig::failure(message))
    }

    /// Store a domain and mark its owner as initialized
    #[must_use]
    pub fn with_domain(self, info: DomainInfo) -> Self {
        self.insert_domain(info);
        self
    }

    pub fn insert_domain(&self, info: DomainInfo) {
        let mut state = self.state.lock().unwrap();
        state.initialized.insert(info.owner.clone());
        state.domains.insert(info.name_hash.clone(), info);
    }

    pub fn set_initialized(&self, addr: &Address, initialized: bool) {
        let mut state = self.state.lock().unwrap();
        if initialized {
            state.initialized.insert(addr.clone());
        } else {
            state.initialized.remove(addr);
        }
    }

    pub fn set_price_per_year(&self, price: f64) {
        self.state.lock().unwrap().price_per_year = price;
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_reads = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    pub fn set_fail_rent(&self, fail: bool) {
        self.state.lock().unwrap().fail_rent = fail;
    }

    pub fn set_fail_init(&self, fail: bool) {
        self.state.lock().unwrap().fail_init = fail;
    }

    pub fn set_fail_seal(&self, fail: bool) {
        self.state.lock().unwrap().fail_seal = fail;
    }

    pub fn set_seal_delay(&self, delay: Duration) {
        *self.seal_delay.lock().unwrap() = delay;
    }

    /// Delay applied to init checks started after this call
    pub fn set_init_delay(&self, delay: Duration) {
        *self.init_delay.lock().unwrap() = delay;
    }

    /// Delay applied to rent cost lookups started after this call
    pub fn set_rent_delay(&self, delay: Duration) {
        *self.rent_delay.lock().unwrap() = delay;
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.is_healthy.store(healthy, Ordering::Relaxed);
    }

    /// Current on-chain record (for assertions)
    pub fn domain(&self, name_hash: &str) -> Option<DomainInfo> {
        self.state.lock().unwrap().domains.get(name_hash).cloned()
    }

    /// `(name, duration_secs)` of every rent cost query
    pub fn rent_cost_calls(&self) -> Vec<(String, u64)> {
        self.state.lock().unwrap().rent_cost_calls.clone()
    }

    /// Kinds of every submitted transaction, in order
    pub fn submissions(&self) -> Vec<MutationKind> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn domain_reads(&self) -> usize {
        self.state.lock().unwrap().domain_reads
    }

    pub fn init_checks(&self) -> usize {
        self.state.lock().unwrap().init_checks
    }

    fn check_should_fail(&self) -> Result<(), AppError> {
        if self.config.should_fail {
            let msg = self
                .config
                .error_message
                .clone()
                .unwrap_or_else(|| "Mock error".to_string());
            return Err(AppError::Chain(ChainError::Connection(msg)));
        }
        Ok(())
    }

    fn stage(&self, kind: MutationKind, write: PendingWrite) -> Result<String, AppError> {
        self.check_should_fail()?;
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(AppError::Chain(ChainError::TransactionFailed(
                "Mock write failure".to_string(),
            )));
        }
        state.next_tx += 1;
        let tx_id = format!("mock_tx_{}", state.next_tx);
        state.pending.insert(tx_id.clone(), write);
        state.submissions.push(kind);
        Ok(tx_id)
    }
}

impl Default for MockChainGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainGateway for MockChainGateway {
    async fn health_check(&self) -> Result<(), AppError> {
        if !self.is_healthy.load(Ordering::Relaxed) {
            return Err(AppError::Chain(ChainError::Connection(
                "Unhealthy".to_string(),
            )));
        }
        self.check_should_fail()
    }

    async fn check_is_initialized(&self, addr: &Address) -> Result<bool, AppError> {
        self.check_should_fail()?;
        let delay = *self.init_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        state.init_checks += 1;
        if state.fail_init {
            return Err(AppError::Chain(ChainError::ScriptFailed(
                "Mock init check failure".to_string(),
            )));
        }
        Ok(state.initialized.contains(addr))
    }

    async fn get_domain_info_by_name_hash(
        &self,
        addr: &Address,
        name_hash: &str,
    ) -> Result<DomainInfo, AppError> {
        self.check_should_fail()?;
        let mut state = self.state.lock().unwrap();
        state.domain_reads += 1;
        if state.fail_reads {
            return Err(AppError::Chain(ChainError::Timeout(
                "Mock read timeout".to_string(),
            )));
        }
        state
            .domains
            .get(name_hash)
            .filter(|info| &info.owner == addr)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("domain {}", name_hash)))
    }

    async fn get_rent_cost(&self, name: &str, duration_secs: u64) -> Result<f64, AppError> {
        self.check_should_fail()?;
        let delay = *self.rent_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state.lock().unwrap();
        state
            .rent_cost_calls
            .push((name.to_string(), duration_secs));
        if state.fail_rent {
            return Err(AppError::Chain(ChainError::ScriptFailed(
                "Mock rent failure".to_string(),
            )));
        }
        Ok(state.price_per_year * duration_secs as f64 / SECONDS_PER_YEAR as f64)
    }

    async fn renew_domain(&self, name: &str, duration_secs: u64) -> Result<String, AppError> {
        self.stage(
            MutationKind::Renew,
            PendingWrite::Renew {
                name: name.to_string(),
                duration_secs,
            },
        )
    }

    async fn update_address_for_domain(
        &self,
        name_hash: &str,
        addr: &Address,
    ) -> Result<String, AppError> {
        self.stage(
            MutationKind::Address,
            PendingWrite::Address {
                name_hash: name_hash.to_string(),
                addr: addr.clone(),
            },
        )
    }

    async fn update_bio_for_domain(&self, name_hash: &str, bio: &str) -> Result<String, AppError> {
        self.stage(
            MutationKind::Bio,
            PendingWrite::Bio {
                name_hash: name_hash.to_string(),
                bio: bio.to_string(),
            },
        )
    }

    async fn wait_for_seal(&self, tx_id: &str) -> Result<(), AppError> {
        let delay = *self.seal_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if state.fail_seal {
            state.pending.remove(tx_id);
            return Err(AppError::Chain(ChainError::TransactionFailed(
                "Mock seal failure".to_string(),
            )));
        }
        let write = state.pending.remove(tx_id).ok_or_else(|| {
            AppError::Chain(ChainError::TransactionFailed(format!(
                "unknown transaction {}",
                tx_id
            )))
        })?;

        match write {
            PendingWrite::Bio { name_hash, bio } => {
                if let Some(info) = state.domains.get_mut(&name_hash) {
                    info.bio = Some(bio).filter(|b| !b.is_empty());
                }
            }
            PendingWrite::Address { name_hash, addr } => {
                if let Some(info) = state.domains.get_mut(&name_hash) {
                    info.address = Some(addr);
                }
            }
            PendingWrite::Renew {
                name,
                duration_secs,
            } => {
                if let Some(info) = state
                    .domains
                    .values_mut()
                    .find(|info| bare_name(&info.name) == name)
                {
                    info.expires_at += duration_secs as i64;
                }
            }
        }
        Ok(())
    }
}

/// Wallet whose session is driven by the test
pub struct MockWallet {
    session: watch::Sender<Session>,
    account: Mutex<Option<Address>>,
    subscribe_calls: AtomicUsize,
    deliver_logout: AtomicBool,
    sent: Mutex<Vec<TransactionRequest>>,
}

impl MockWallet {
    #[must_use]
    pub fn new() -> Self {
        let (session, _) = watch::channel(Session::logged_out());
        Self {
            session,
            account: Mutex::new(None),
            subscribe_calls: AtomicUsize::new(0),
            deliver_logout: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Wallet that logs in as `addr` when asked
    #[must_use]
    pub fn with_account(addr: Address) -> Self {
        let wallet = Self::new();
        *wallet.account.lock().unwrap() = Some(addr);
        wallet
    }

    /// Push a raw session update, as the wallet would
    pub fn push(&self, session: Session) {
        self.session.send_replace(session);
    }

    /// When false, `unauthenticate` succeeds without publishing anything,
    /// like a wallet whose confirmation is still in flight
    pub fn set_deliver_logout(&self, deliver: bool) {
        self.deliver_logout.store(deliver, Ordering::Relaxed);
    }

    pub fn subscribe_calls(&self) -> usize {
        self.subscribe_calls.load(Ordering::Relaxed)
    }

    /// Number of live receivers on the session channel
    pub fn receiver_count(&self) -> usize {
        self.session.receiver_count()
    }

    pub fn sent_transactions(&self) -> Vec<TransactionRequest> {
        self.sent.lock().unwrap().clone()
    }
}

impl Default for MockWallet {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WalletConnector for MockWallet {
    fn subscribe(&self) -> watch::Receiver<Session> {
        self.subscribe_calls.fetch_add(1, Ordering::Relaxed);
        self.session.subscribe()
    }

    async fn authenticate(&self) -> Result<(), AppError> {
        let account = self.account.lock().unwrap().clone();
        match account {
            Some(addr) => {
                self.session.send_replace(Session::logged_in(addr));
                Ok(())
            }
            None => Err(AppError::Wallet(WalletError::Unavailable(
                "Mock wallet has no account".to_string(),
            ))),
        }
    }

    async fn unauthenticate(&self) -> Result<(), AppError> {
        if self.deliver_logout.load(Ordering::Relaxed) {
            self.session.send_replace(Session::logged_out());
        }
        Ok(())
    }

    async fn authorize_and_send(&self, tx: &TransactionRequest) -> Result<String, AppError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(tx.clone());
        Ok(format!("wallet_tx_{}", sent.len()))
    }
}
