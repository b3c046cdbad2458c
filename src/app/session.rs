//! Session state provider.
//!
//! Mirrors the wallet's session into a single `watch` channel together with
//! the account's initialization flag.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::domain::{Address, AppError, ChainGateway, Session, SessionSnapshot, WalletConnector};

struct Inner {
    state: watch::Sender<SessionSnapshot>,
    wallet: Arc<dyn WalletConnector>,
    gateway: Arc<dyn ChainGateway>,
    stopped: AtomicBool,
}

impl Inner {
    /// Publish a session. Returns whether the address changed.
    fn apply(&self, next: Session) -> bool {
        if self.stopped.load(Ordering::Acquire) {
            return false;
        }
        let next = next.normalized();
        let mut addr_changed = false;
        self.state.send_if_modified(|snap| {
            let mut modified = false;
            if snap.session.addr != next.addr {
                addr_changed = true;
            }
            if snap.session != next {
                snap.session = next.clone();
                modified = true;
            }
            if (addr_changed || next.addr.is_none()) && snap.is_initialized {
                snap.is_initialized = false;
                modified = true;
            }
            modified
        });
        addr_changed
    }

    async fn refresh_init(&self, addr: &Address) -> Result<bool, AppError> {
        let flag = self.gateway.check_is_initialized(addr).await.map_err(|e| {
            warn!(addr = %addr, error = %e, "Initialization check failed");
            e
        })?;

        if self.stopped.load(Ordering::Acquire) {
            return Ok(flag);
        }
        self.state.send_if_modified(|snap| {
            // The session may have moved on while the check was running
            if snap.session.addr.as_ref() != Some(addr) || snap.is_initialized == flag {
                return false;
            }
            snap.is_initialized = flag;
            true
        });
        debug!(addr = %addr, initialized = flag, "Initialization flag updated");
        Ok(flag)
    }
}

type InitCheck = Pin<Box<dyn Future<Output = ()> + Send>>;

fn init_check(inner: &Arc<Inner>, addr: Address) -> InitCheck {
    let inner = Arc::clone(inner);
    Box::pin(async move {
        let _ = inner.refresh_init(&addr).await;
    })
}

/// Follow the wallet. The init check for the current address runs alongside
/// the receive loop and is dropped when the address changes.
async fn mirror_wallet(inner: Arc<Inner>, mut rx: watch::Receiver<Session>) {
    let initial = inner.state.borrow().session.addr.clone();
    let mut check: Option<InitCheck> = initial.map(|addr| init_check(&inner, addr));

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let next = rx.borrow_and_update().clone();
                if inner.apply(next) {
                    let addr = inner.state.borrow().session.addr.clone();
                    match addr {
                        Some(addr) => {
                            info!(addr = %addr, "Session changed");
                            check = Some(init_check(&inner, addr));
                        }
                        None => {
                            info!("Session ended");
                            check = None;
                        }
                    }
                }
            }
            () = async {
                if let Some(pending) = check.as_mut() {
                    pending.await;
                }
            }, if check.is_some() => {
                check = None;
            }
        }
    }
    debug!("Wallet session stream closed");
}

/// Process-wide session state.
///
/// Holds exactly one wallet subscription for its lifetime. [`shutdown`] or
/// dropping the provider releases it.
///
/// [`shutdown`]: SessionProvider::shutdown
pub struct SessionProvider {
    inner: Arc<Inner>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionProvider {
    /// Subscribe to the wallet and start mirroring its session.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(wallet: Arc<dyn WalletConnector>, gateway: Arc<dyn ChainGateway>) -> Arc<Self> {
        let mut rx = wallet.subscribe();
        let initial = rx.borrow_and_update().clone().normalized();
        let (state, _) = watch::channel(SessionSnapshot {
            session: initial,
            is_initialized: false,
        });

        let inner = Arc::new(Inner {
            state,
            wallet,
            gateway,
            stopped: AtomicBool::new(false),
        });
        let task = tokio::spawn(mirror_wallet(Arc::clone(&inner), rx));
        info!("Session provider started");

        Arc::new(Self {
            inner,
            task: Mutex::new(Some(task)),
        })
    }

    /// Ask the wallet to log in. The new session arrives asynchronously.
    #[instrument(skip(self))]
    pub async fn log_in(&self) -> Result<(), AppError> {
        self.inner.wallet.authenticate().await
    }

    /// Log out. The logged-out session is visible immediately, before the
    /// wallet confirms, and also when the wallet call fails.
    #[instrument(skip(self))]
    pub async fn log_out(&self) -> Result<(), AppError> {
        let result = self.inner.wallet.unauthenticate().await;
        if let Err(e) = &result {
            warn!(error = %e, "Wallet logout failed");
        }
        self.inner.apply(Session::logged_out());
        info!("Logged out");
        result
    }

    /// Re-run the initialization check for the current address
    #[instrument(skip(self))]
    pub async fn check_init(&self) -> Result<bool, AppError> {
        match self.current().addr {
            Some(addr) => self.inner.refresh_init(&addr).await,
            None => Ok(false),
        }
    }

    pub fn current(&self) -> Session {
        self.inner.state.borrow().session.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.state.borrow().is_initialized
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Receiver of the current snapshot and every later change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Stop mirroring the wallet and release the subscription
    pub fn shutdown(&self) {
        self.inner.stopped.store(true, Ordering::Release);
        let task = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
            info!("Session provider stopped");
        }
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        self.shutdown();
    }
}
