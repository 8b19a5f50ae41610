pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod probe;
pub mod util;
pub mod validation;

pub use error::{MonitorError, Result};
pub use model::{Client, ClientId, OutageWindow, Service, ServiceKey, ServiceListener};
pub use monitor::{MonitorConfig, MonitorService};
pub use probe::{ProbeOutcome, Prober, TcpProber};
pub use validation::{InputValidator, Validator};
