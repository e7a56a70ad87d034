//! Browser-runtime half of the session subsystem.
//!
//! The server never pushes state to the client; everything the client
//! knows about the session it reads from the shared cookie store. This
//! crate provides that runtime's three pieces:
//!
//! - **[`jar`]**: the percent-encoding cookie jar backing the
//!   `CookieStore` seam, plus the `Cookie`-header builder used when
//!   calling the backend.
//! - **[`context`]**: the per-app-load session snapshot widgets read
//!   instead of touching cookies directly.
//! - **[`scheduler`]**: proactive background refresh with an
//!   at-most-one-in-flight guard.
//! - **[`transport`]**: scoped bearer injection for the transfer widget.

pub mod context;
pub mod jar;
pub mod scheduler;
pub mod transport;

pub use context::SessionContext;
pub use jar::{session_cookie_header, CookieJar};
pub use scheduler::{
    RefreshOutcome, SchedulerState, SessionRefreshScheduler, REFRESH_CHECK_INTERVAL,
};
pub use transport::{
    HttpTransport, OutboundRequest, OutboundResponse, ReqwestTransport, TransportAuthInjector,
    TransportGuard, TransportSlot,
};
