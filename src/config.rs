//! Declarative settings for the standard pipeline.
//!
//! [`MediatorSettings`] selects a publish strategy and switches the standard
//! behaviors on or off. It can be loaded from JSON, so the dispatch pipeline
//! of a service can be tuned without recompiling.
//!
//! # Example
//!
//! ```
//! use mediator::{MediatorSettings, StrategyKind};
//!
//! let settings = MediatorSettings::from_json(
//!     r#"{ "strategy": "concurrent", "recover_panics": true }"#,
//! ).unwrap();
//!
//! assert_eq!(settings.strategy, StrategyKind::Concurrent);
//! assert!(settings.recover_panics);
//! assert!(!settings.log_requests);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::behavior::{
    LogNotificationBehavior, LogRequestBehavior, LogStrategyBehavior, RecoverRequestBehavior,
    RecoverStrategyBehavior,
};
use crate::error::Result;
use crate::pipeline::{NotificationBehavior, RequestBehavior, StrategyBehavior};
use crate::strategy::{Concurrent, ConcurrentCollectAll, PublishStrategy, Sequential};

/// Built-in publish strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// [`Sequential`].
    #[default]
    Sequential,
    /// [`Concurrent`].
    Concurrent,
    /// [`ConcurrentCollectAll`].
    ConcurrentCollectAll,
}

impl StrategyKind {
    /// Instantiate the strategy.
    pub fn build(self) -> Arc<dyn PublishStrategy> {
        match self {
            Self::Sequential => Arc::new(Sequential),
            Self::Concurrent => Arc::new(Concurrent),
            Self::ConcurrentCollectAll => Arc::new(ConcurrentCollectAll),
        }
    }
}

/// Strategy choice and standard behavior switches.
///
/// Missing fields take their defaults: sequential strategy, every behavior
/// off. When both are enabled, logging wraps recovery so recovered panics
/// are logged as failures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MediatorSettings {
    /// Publish strategy.
    pub strategy: StrategyKind,
    /// Install the panic recovery behaviors for requests and fan-outs.
    pub recover_panics: bool,
    /// Install [`LogRequestBehavior::tracing`].
    pub log_requests: bool,
    /// Install [`LogNotificationBehavior::tracing`] around every handler.
    pub log_handlers: bool,
    /// Install [`LogStrategyBehavior::tracing`] around every fan-out.
    pub log_strategy: bool,
}

impl MediatorSettings {
    /// Parse settings from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render settings as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Request behaviors implied by these settings, outermost first.
    pub fn request_behaviors(&self) -> Vec<Arc<dyn RequestBehavior>> {
        let mut behaviors: Vec<Arc<dyn RequestBehavior>> = Vec::new();
        if self.log_requests {
            behaviors.push(Arc::new(LogRequestBehavior::tracing()));
        }
        if self.recover_panics {
            behaviors.push(Arc::new(RecoverRequestBehavior));
        }
        behaviors
    }

    /// Per-handler notification behaviors implied by these settings.
    pub fn notification_behaviors(&self) -> Vec<Arc<dyn NotificationBehavior>> {
        let mut behaviors: Vec<Arc<dyn NotificationBehavior>> = Vec::new();
        if self.log_handlers {
            behaviors.push(Arc::new(LogNotificationBehavior::tracing()));
        }
        behaviors
    }

    /// Fan-out behaviors implied by these settings, outermost first.
    pub fn strategy_behaviors(&self) -> Vec<Arc<dyn StrategyBehavior>> {
        let mut behaviors: Vec<Arc<dyn StrategyBehavior>> = Vec::new();
        if self.log_strategy {
            behaviors.push(Arc::new(LogStrategyBehavior::tracing()));
        }
        if self.recover_panics {
            behaviors.push(Arc::new(RecoverStrategyBehavior));
        }
        behaviors
    }
}
