//! Configuration loading

mod app_config;

pub use app_config::{
    AppConfig, BackendConfig, BackendsConfig, BatchSettings, DispatchSettings, LogFormat,
    LoggingConfig,
};
