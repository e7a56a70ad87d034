//! Background session refresh.
//!
//! The scheduler owns the lifecycle Idle → Monitoring → Refreshing. While
//! monitoring, three triggers funnel into one guarded routine: the start
//! of monitoring, a 60-second tick, and a window-focus notification. The
//! guard admits at most one refresh at a time; coalesced triggers are
//! dropped, not queued — the next tick re-evaluates freshness anyway.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use beamline_session::{clear_session, decode_store, CookieStore, TokenStore};
use serde::Deserialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::jar::session_cookie_header;

/// Periodic freshness-check cadence while monitoring.
pub const REFRESH_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Result of one pass through the guarded refresh routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No session, or every credential is comfortably fresh.
    Current,
    /// New tokens were obtained and mirrored into the cookie store.
    Refreshed,
    /// Another refresh was already in flight; this trigger was dropped.
    Skipped,
    /// The backend rejected the refresh token; the session was cleared.
    SignedOut,
    /// Transient failure (network, backend error); tokens left untouched.
    Failed,
}

/// Observable scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Monitoring,
    Refreshing,
}

/// Success body of the refresh endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    success: bool,
    tokens: TokenStore,
}

/// Drives proactive refresh for the browser runtime's session.
pub struct SessionRefreshScheduler<S> {
    cookies: Arc<Mutex<S>>,
    refresh_url: String,
    http: reqwest::Client,
    refreshing: Arc<AtomicBool>,
    monitoring: Arc<AtomicBool>,
    focus: Arc<Notify>,
    stop: Arc<Notify>,
    check_interval: Duration,
}

impl<S> Clone for SessionRefreshScheduler<S> {
    fn clone(&self) -> Self {
        Self {
            cookies: Arc::clone(&self.cookies),
            refresh_url: self.refresh_url.clone(),
            http: self.http.clone(),
            refreshing: Arc::clone(&self.refreshing),
            monitoring: Arc::clone(&self.monitoring),
            focus: Arc::clone(&self.focus),
            stop: Arc::clone(&self.stop),
            check_interval: self.check_interval,
        }
    }
}

impl<S: CookieStore + Send + 'static> SessionRefreshScheduler<S> {
    /// `refresh_url` is the backend's refresh endpoint
    /// (`{base_url}/api/auth/refresh`).
    #[must_use]
    pub fn new(cookies: Arc<Mutex<S>>, refresh_url: impl Into<String>) -> Self {
        Self {
            cookies,
            refresh_url: refresh_url.into(),
            http: reqwest::Client::new(),
            refreshing: Arc::new(AtomicBool::new(false)),
            monitoring: Arc::new(AtomicBool::new(false)),
            focus: Arc::new(Notify::new()),
            stop: Arc::new(Notify::new()),
            check_interval: REFRESH_CHECK_INTERVAL,
        }
    }

    /// Override the tick cadence. Tests use short intervals.
    #[must_use]
    pub fn with_check_interval(mut self, interval: Duration) -> Self {
        self.check_interval = interval;
        self
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        if self.refreshing.load(Ordering::Acquire) {
            SchedulerState::Refreshing
        } else if self.monitoring.load(Ordering::Acquire) {
            SchedulerState::Monitoring
        } else {
            SchedulerState::Idle
        }
    }

    /// Signal that the window regained focus; wakes the monitor loop for
    /// an immediate freshness check.
    pub fn notify_focus(&self) {
        self.focus.notify_one();
    }

    /// Stop monitoring. In-flight refresh completes; no further triggers
    /// fire.
    pub fn stop(&self) {
        self.stop.notify_one();
    }

    /// Enter the Monitoring state.
    ///
    /// The first tick fires immediately (the start trigger); subsequent
    /// ticks follow the configured cadence. A terminal sign-out ends
    /// monitoring without an explicit [`Self::stop`].
    pub fn start(&self) -> JoinHandle<()> {
        self.monitoring.store(true, Ordering::Release);
        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(scheduler.check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = scheduler.focus.notified() => {
                        debug!("focus regained; checking token freshness");
                    }
                    _ = scheduler.stop.notified() => break,
                }
                if scheduler.run_guarded_refresh().await == RefreshOutcome::SignedOut {
                    break;
                }
            }
            scheduler.monitoring.store(false, Ordering::Release);
        })
    }

    /// One pass of the guarded refresh routine.
    ///
    /// Every trigger lands here. The boolean guard is released on every
    /// exit path, including panics and errors, via its drop guard.
    pub async fn run_guarded_refresh(&self) -> RefreshOutcome {
        let Some(_guard) = RefreshGuard::acquire(&self.refreshing) else {
            debug!("refresh already in flight; dropping trigger");
            return RefreshOutcome::Skipped;
        };

        // Snapshot under the lock; never hold it across the exchange.
        let cookie_header = {
            let cookies = lock_recovering(&self.cookies);
            match decode_store(&*cookies) {
                None => return RefreshOutcome::Current,
                Some(store) if !store.needs_refresh() => return RefreshOutcome::Current,
                Some(_) => session_cookie_header(&*cookies),
            }
        };

        let response = self
            .http
            .post(&self.refresh_url)
            .header(reqwest::header::COOKIE, cookie_header)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "refresh request failed; keeping current tokens");
                return RefreshOutcome::Failed;
            }
        };

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            info!("refresh rejected; clearing session");
            clear_session(&mut *lock_recovering(&self.cookies));
            return RefreshOutcome::SignedOut;
        }
        if !response.status().is_success() {
            warn!(status = %response.status(), "refresh returned an error status");
            return RefreshOutcome::Failed;
        }

        match response.json::<RefreshResponse>().await {
            Ok(body) if !body.success => {
                warn!("refresh endpoint reported failure; keeping current tokens");
                RefreshOutcome::Failed
            }
            Ok(body) => {
                beamline_session::persist_session(
                    &mut *lock_recovering(&self.cookies),
                    &body.tokens,
                );
                info!(
                    resource_servers = body.tokens.by_resource_server.len(),
                    "session refreshed"
                );
                RefreshOutcome::Refreshed
            }
            Err(err) => {
                warn!(error = %err, "refresh response body was malformed");
                RefreshOutcome::Failed
            }
        }
    }
}

/// Holds the refresh flag; clears it when dropped.
struct RefreshGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RefreshGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
            .then_some(Self { flag })
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Lock recovering from poisoning: the jar holds plain string state that
/// stays coherent even if a holder panicked mid-update.
fn lock_recovering<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
