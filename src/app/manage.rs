//! Domain management view.
//!
//! One [`DomainManager`] per `(owner, name_hash)`. It loads the domain,
//! prices renewals and runs the three write workflows (bio, address, renew).
//! Each write is submit, wait for seal, reload, in that order, and only one
//! write runs at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

use crate::domain::{
    Address, AppError, ChainGateway, DomainInfo, MutationKind, QuoteState, RenewalQuote,
    SessionSnapshot, ValidationError, bare_name, renewal_duration_secs,
};

/// Page title of the management view
pub const MANAGE_PAGE_TITLE: &str = "Flow Name Service - Manage Domain";

/// Shown for an empty bio or unlinked address
pub const NOT_SET: &str = "Not Set";

/// Lifecycle of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewPhase {
    #[default]
    Uninitialized,
    Loading,
    Loaded,
    Mutating(MutationKind),
}

/// Rendered management page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ManagePage {
    #[schema(example = "Flow Name Service - Manage Domain")]
    pub title: String,
    #[schema(example = "alice.fns")]
    pub name: String,
    pub id: u64,
    pub owner: String,
    /// `YYYY-MM-DD`, UTC
    #[schema(example = "2022-11-14")]
    pub created_at: String,
    /// `YYYY-MM-DD`, UTC
    #[schema(example = "2023-11-14")]
    pub expires_at: String,
    #[schema(example = "Not Set")]
    pub bio: String,
    #[schema(example = "Not Set")]
    pub address: String,
    pub quote: QuoteState,
    pub renew_years: u32,
    pub loading: bool,
}

#[derive(Debug)]
struct ViewState {
    phase: ViewPhase,
    domain: Option<DomainInfo>,
    quote: QuoteState,
    renew_years: u32,
    quote_seq: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            phase: ViewPhase::Uninitialized,
            domain: None,
            quote: QuoteState::Unknown,
            renew_years: 1,
            quote_seq: 0,
        }
    }
}

impl ViewState {
    /// Move to `phase` unless a write owns the view
    fn enter(&mut self, phase: ViewPhase) {
        if !matches!(self.phase, ViewPhase::Mutating(_)) {
            self.phase = phase;
        }
    }

    /// Forget the loaded record and anything derived from it
    fn clear_domain(&mut self) {
        self.domain = None;
        self.enter(ViewPhase::Uninitialized);
        self.quote = QuoteState::Unknown;
        self.quote_seq += 1;
    }
}

/// Holds the mutation token. Dropping it releases the token.
struct MutationGuard<'a> {
    manager: &'a DomainManager,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        {
            let mut view = self.manager.view();
            if let ViewPhase::Mutating(_) = view.phase {
                view.phase = if view.domain.is_some() {
                    ViewPhase::Loaded
                } else {
                    ViewPhase::Uninitialized
                };
            }
        }
        self.manager.mutating.store(false, Ordering::Release);
    }
}

/// Management view for a single domain
pub struct DomainManager {
    gateway: Arc<dyn ChainGateway>,
    session: watch::Receiver<SessionSnapshot>,
    owner: Address,
    name_hash: String,
    view: Mutex<ViewState>,
    mutating: AtomicBool,
}

impl DomainManager {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn ChainGateway>,
        session: watch::Receiver<SessionSnapshot>,
        owner: Address,
        name_hash: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            session,
            owner,
            name_hash: name_hash.into(),
            view: Mutex::new(ViewState::default()),
            mutating: AtomicBool::new(false),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn name_hash(&self) -> &str {
        &self.name_hash
    }

    pub fn phase(&self) -> ViewPhase {
        self.view().phase
    }

    pub fn domain(&self) -> Option<DomainInfo> {
        self.view().domain.clone()
    }

    pub fn quote(&self) -> QuoteState {
        self.view().quote.clone()
    }

    pub fn is_mutating(&self) -> bool {
        self.mutating.load(Ordering::Acquire)
    }

    fn view(&self) -> MutexGuard<'_, ViewState> {
        self.view.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_preconditions(&self) -> Result<(), AppError> {
        if self.name_hash.is_empty() {
            return Err(AppError::Precondition("name hash is empty".to_string()));
        }
        let snapshot = self.session.borrow().clone();
        if snapshot.session.addr.as_ref() != Some(&self.owner) {
            return Err(AppError::Precondition(format!(
                "not logged in as {}",
                self.owner
            )));
        }
        if !snapshot.is_initialized {
            return Err(AppError::Precondition(
                "account is not initialized".to_string(),
            ));
        }
        Ok(())
    }

    /// Fetch the domain. A skipped or failed read clears any previously
    /// loaded record.
    #[instrument(skip(self), fields(name_hash = %self.name_hash, owner = %self.owner))]
    pub async fn load(&self) -> Result<DomainInfo, AppError> {
        if let Err(e) = self.check_preconditions() {
            warn!(error = %e, "Load skipped");
            self.view().clear_domain();
            return Err(e);
        }

        self.view().enter(ViewPhase::Loading);
        let result = self
            .gateway
            .get_domain_info_by_name_hash(&self.owner, &self.name_hash)
            .await;

        match result {
            Ok(info) => {
                let (changed, years) = {
                    let mut view = self.view();
                    let changed = view.domain.as_ref() != Some(&info);
                    view.domain = Some(info.clone());
                    view.enter(ViewPhase::Loaded);
                    (changed, view.renew_years)
                };
                info!(name = %info.name, expires_at = info.expires_at, "Domain loaded");
                if changed {
                    self.refresh_quote(years).await;
                }
                Ok(info)
            }
            Err(e) => {
                error!(error = %e, "Failed to load domain");
                self.view().clear_domain();
                Err(e)
            }
        }
    }

    /// Price a renewal of `years`. The result replaces the current quote.
    #[instrument(skip(self), fields(name_hash = %self.name_hash))]
    pub async fn refresh_quote(&self, years: u32) -> QuoteState {
        let (seq, name) = {
            let mut view = self.view();
            view.renew_years = years;
            view.quote_seq += 1;
            let name = view
                .domain
                .as_ref()
                .map(|d| bare_name(&d.name).to_string())
                .filter(|n| !n.is_empty());
            (view.quote_seq, name)
        };

        let state = match name {
            Some(name) if years > 0 => {
                let duration_secs = renewal_duration_secs(years);
                match self.gateway.get_rent_cost(&name, duration_secs).await {
                    Ok(cost) => QuoteState::Ready {
                        quote: RenewalQuote {
                            years,
                            duration_secs,
                            cost,
                        },
                    },
                    Err(e) => {
                        warn!(name = %name, years, error = %e, "Rent cost lookup failed");
                        QuoteState::Failed {
                            reason: e.to_string(),
                        }
                    }
                }
            }
            _ => QuoteState::Unknown,
        };

        let mut view = self.view();
        if view.quote_seq == seq {
            view.quote = state.clone();
        }
        state
    }

    /// Set the domain's bio
    #[instrument(skip(self, bio), fields(name_hash = %self.name_hash))]
    pub async fn update_bio(&self, bio: &str) -> Result<DomainInfo, AppError> {
        let _guard = self.begin_mutation(MutationKind::Bio)?;
        self.loaded_domain()?;
        let submitted = self
            .gateway
            .update_bio_for_domain(&self.name_hash, bio)
            .await;
        self.seal_and_reload(MutationKind::Bio, submitted).await
    }

    /// Link an address to the domain
    #[instrument(skip(self), fields(name_hash = %self.name_hash))]
    pub async fn update_address(&self, address: &str) -> Result<DomainInfo, AppError> {
        let addr: Address = address.parse().map_err(|e: ValidationError| {
            warn!(error = %e, "Rejected address update");
            AppError::Validation(e)
        })?;

        let _guard = self.begin_mutation(MutationKind::Address)?;
        self.loaded_domain()?;
        let submitted = self
            .gateway
            .update_address_for_domain(&self.name_hash, &addr)
            .await;
        self.seal_and_reload(MutationKind::Address, submitted).await
    }

    /// Extend the registration by `years`
    #[instrument(skip(self), fields(name_hash = %self.name_hash))]
    pub async fn renew(&self, years: u32) -> Result<DomainInfo, AppError> {
        if years == 0 {
            let e = ValidationError::RenewalDuration;
            warn!(error = %e, "Rejected renewal");
            return Err(e.into());
        }

        let _guard = self.begin_mutation(MutationKind::Renew)?;
        let domain = self.loaded_domain()?;
        let name = bare_name(&domain.name);
        let duration_secs = renewal_duration_secs(years);
        info!(name = %name, duration_secs, "Renewing domain");
        let submitted = self.gateway.renew_domain(name, duration_secs).await;
        self.seal_and_reload(MutationKind::Renew, submitted).await
    }

    /// Build the page, or `None` while no domain is loaded
    pub fn render(&self) -> Option<ManagePage> {
        let view = self.view();
        let domain = view.domain.as_ref()?;

        Some(ManagePage {
            title: MANAGE_PAGE_TITLE.to_string(),
            name: domain.name.clone(),
            id: domain.id,
            owner: domain.owner.to_string(),
            created_at: format_date(domain.created_at),
            expires_at: format_date(domain.expires_at),
            bio: domain
                .bio
                .clone()
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| NOT_SET.to_string()),
            address: domain
                .address
                .as_ref()
                .map_or_else(|| NOT_SET.to_string(), ToString::to_string),
            quote: view.quote.clone(),
            renew_years: view.renew_years,
            loading: self.is_mutating()
                || matches!(view.phase, ViewPhase::Loading | ViewPhase::Mutating(_)),
        })
    }

    fn begin_mutation(&self, kind: MutationKind) -> Result<MutationGuard<'_>, AppError> {
        if self
            .mutating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(kind = %kind, "Mutation already in progress");
            return Err(AppError::MutationInProgress(self.name_hash.clone()));
        }
        let guard = MutationGuard { manager: self };
        self.view().phase = ViewPhase::Mutating(kind);
        Ok(guard)
    }

    fn loaded_domain(&self) -> Result<DomainInfo, AppError> {
        self.view()
            .domain
            .clone()
            .ok_or_else(|| AppError::Precondition("domain is not loaded".to_string()))
    }

    async fn seal_and_reload(
        &self,
        kind: MutationKind,
        submitted: Result<String, AppError>,
    ) -> Result<DomainInfo, AppError> {
        let tx_id = submitted.map_err(|e| {
            error!(kind = %kind, error = %e, "Failed to submit transaction");
            e
        })?;
        info!(kind = %kind, tx_id = %tx_id, "Transaction submitted");

        self.gateway.wait_for_seal(&tx_id).await.map_err(|e| {
            error!(kind = %kind, tx_id = %tx_id, error = %e, "Transaction did not seal");
            e
        })?;
        info!(kind = %kind, tx_id = %tx_id, "Transaction sealed");

        self.load().await
    }
}

fn format_date(unix_secs: i64) -> String {
    DateTime::from_timestamp(unix_secs, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| unix_secs.to_string())
}
