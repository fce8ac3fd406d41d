// Configuration snapshot and hot reload
// Readers take an immutable snapshot; reloads validate first, then swap atomically

use crate::config::Config;
use crate::error::Result;
use arc_swap::ArcSwap;
use std::path::Path;
use std::sync::Arc;

/// Process-wide read-only configuration, swappable without locks
#[derive(Debug)]
pub struct ConfigHandle {
    current: ArcSwap<Config>,
}

impl ConfigHandle {
    /// Wrap a validated config as generation 0
    pub fn new(mut config: Config) -> Result<Self> {
        config.validate()?;
        config.generation = 0;
        Ok(Self {
            current: ArcSwap::from_pointee(config),
        })
    }

    /// Current snapshot; stays consistent even if a reload lands mid-call
    pub fn snapshot(&self) -> Arc<Config> {
        self.current.load_full()
    }

    pub fn generation(&self) -> u64 {
        self.current.load().generation
    }

    /// Validate and publish a new config, returning its generation
    ///
    /// An invalid config leaves the current snapshot in place.
    pub fn replace(&self, config: Config) -> Result<u64> {
        if let Err(e) = config.validate() {
            tracing::warn!(
                error = %e,
                generation = self.generation(),
                "Rejected configuration reload, keeping current snapshot"
            );
            return Err(e);
        }

        let previous = self.current.rcu(|old| {
            let mut next = config.clone();
            next.generation = old.generation + 1;
            Arc::new(next)
        });
        let generation = previous.generation + 1;

        tracing::info!(
            old_generation = previous.generation,
            new_generation = generation,
            url_endpoint = %config.url_endpoint,
            "Configuration snapshot swapped"
        );

        Ok(generation)
    }

    /// Load a config file and publish it
    pub fn reload_from_file<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        let config = Config::from_file(path.as_ref()).map_err(|e| {
            tracing::warn!(
                path = %path.as_ref().display(),
                error = %e,
                "Failed to load configuration for reload"
            );
            e
        })?;
        self.replace(config)
    }
}
