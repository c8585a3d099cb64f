#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Gatekeep security manager
//!
//! [`SecurityManager`] is the entry point for hosts. It is assembled from a
//! [`SecurityConfig`] (see [`ConfigLoader`] for the layering rules) and a
//! [`ComponentRegistry`] that maps configured keys to realm and strategy
//! factories.
//!
//! ```ignore
//! let config = ConfigLoader::new().with_file("security.yaml").load()?;
//! init_logging(&config.logging)?;
//! let manager = SecurityManager::from_config(config)?;
//! manager.start_background_tasks()?;
//!
//! let ctx = manager
//!     .login(&AuthenticationToken::username_password("alice", "secret"))
//!     .await?;
//! manager.check_permission(&ctx, "printer:print:lp7200").await?;
//! manager.logout(&ctx).await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod registry;

pub use config::{
    AuthenticationConfig, AuthorizationConfig, ConfigLoader, ENV_PREFIX, ENV_SPLIT, RealmConfig, SecurityConfig,
};
pub use error::{ConfigError, SecurityError};
pub use logging::{LogFormat, LoggingConfig, init_logging};
pub use manager::{
    AUTHENTICATED_SESSION_KEY, PRINCIPALS_SESSION_KEY, SecurityManager, SecurityManagerBuilder,
};
pub use registry::{
    ComponentRegistry, MEMORY_REALM, RealmContext, RealmFactory, RealmHandle, StrategyFactory,
};
