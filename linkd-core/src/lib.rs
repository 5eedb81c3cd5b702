//! linkd-core: session registry and change-notification protocol
//!
//! Clients ("owners") ask the connection daemon for managed connectivity by
//! creating a *session* that describes their policy: which bearers they are
//! willing to use, latency and power trade-offs, reconnection behaviour. This
//! crate owns those sessions:
//!
//! - **Bearers** - [`BearerSpec`] parsing and matching
//! - **Sessions** - [`Session`], its [`SessionSettings`] and the closed
//!   [`SessionAttribute`] set
//! - **Registry** - [`SessionRegistry`]: uniqueness, authorization, teardown
//! - **Notifications** - [`NotificationDispatcher`]: full and partial `Update`
//!   pushes, `Release` on bulk teardown
//! - **Liveness** - [`LivenessMonitor`]: one watch per session on its owner
//! - **Session mode** - [`SessionModeController`]
//! - **Entry points** - [`handlers`], composed through [`SessionContext`]
//!
//! # Dispatch cycle
//!
//! ```text
//! inbound call ──► SessionContext::dispatch
//!                    ├─ handlers::route      (mutates registry, may queue tasks)
//!                    ├─ send reply / error
//!                    └─ run deferred tasks    (first full Update after create)
//! ```
//!
//! Everything here is synchronous and single-owner: the daemon holds the
//! [`SessionContext`] by value in one task and feeds it one event at a time.

pub mod bearer;
pub mod connectivity;
pub mod context;
pub mod deferred;
pub mod error;
pub mod handlers;
pub mod mode;
pub mod notify;
pub mod session;

pub use bearer::{BearerSpec, ServiceType, parse_bearers};
pub use connectivity::{ConnectivityManager, MockConnectivity, NoopConnectivity, ServiceView};
pub use context::SessionContext;
pub use deferred::{DeferredQueue, DeferredTask};
pub use error::{Result, SessionError};
pub use mode::{SessionMode, SessionModeController};
pub use notify::NotificationDispatcher;
pub use session::{
    DisconnectResult, LivenessMonitor, LivenessWatch, SESSION_PREFIX, Session, SessionAttribute,
    SessionRegistry, SessionSettings, session_path_for,
};
