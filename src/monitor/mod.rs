//! Monitoring core
//!
//! ```text
//!   MonitorService ──mutates──▶ MonitorConfig (registry + grace period)
//!        │                              ▲
//!        │ spawns one per service       │ reads grace period
//!        ▼                              │
//!   PollWorker ──probe──▶ host:port     │
//!        │                              │
//!        └── confirmed outage ──▶ Service::set_status(false) ──▶ clients
//! ```
//!
//! Workers are independent tokio tasks. Events from different services may
//! interleave arbitrarily; within one service every step runs in order.

pub mod registry;
pub mod service;
pub mod worker;

pub use registry::MonitorConfig;
pub use service::MonitorService;
pub use worker::{PollWorker, WorkerHandle};
