//! Data model: outage windows, clients and monitored services

mod client;
mod outage;
mod service;

pub use client::{Client, ClientId, ServiceListener};
pub use outage::OutageWindow;
pub use service::{Service, ServiceKey};
