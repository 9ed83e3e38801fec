//! Per-operation timeout table
//!
//! Each [`OperationClass`] resolves to its own ceiling. With
//! `auto_adjust` enabled the table tightens a ceiling after successful calls
//! and widens it after timeouts, within the configured bounds.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use leadsync_common::millis;
use leadsync_domain::config::{secs, OperationClass, TimeoutConfig};
use tracing::{debug, warn};

const SUCCESS_FACTOR: f64 = 0.9;
const TIMEOUT_FACTOR: f64 = 1.5;

#[derive(Debug)]
pub struct TimeoutTable {
    auto_adjust: bool,
    min: Duration,
    max: Duration,
    connect: Duration,
    current: Mutex<HashMap<OperationClass, Duration>>,
}

impl TimeoutTable {
    pub fn new(config: &TimeoutConfig) -> Self {
        let current = OperationClass::ALL.iter().map(|class| (*class, config.for_operation(*class))).collect();
        let (min, max) = (secs(config.min_secs), secs(config.max_secs));
        Self {
            auto_adjust: config.auto_adjust,
            min: min.min(max),
            max: max.max(min),
            connect: secs(config.connect_secs),
            current: Mutex::new(current),
        }
    }

    /// Connect timeout applied to every request.
    pub fn connect(&self) -> Duration {
        self.connect
    }

    pub fn resolve(&self, class: OperationClass) -> Duration {
        self.lock().get(&class).copied().unwrap_or(self.max)
    }

    /// Feeds a call outcome back into the table. No-op unless auto
    /// adjustment is enabled.
    pub fn record_outcome(&self, class: OperationClass, success: bool) {
        if !self.auto_adjust {
            return;
        }
        let factor = if success { SUCCESS_FACTOR } else { TIMEOUT_FACTOR };
        let mut current = self.lock();
        let Some(value) = current.get_mut(&class) else {
            return;
        };
        let adjusted = value.mul_f64(factor).clamp(self.min, self.max);
        if adjusted != *value {
            debug!(
                operation = class.as_str(),
                from_ms = millis(*value),
                to_ms = millis(adjusted),
                "timeout adjusted"
            );
            *value = adjusted;
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<OperationClass, Duration>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("timeout table mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
