//! The bridge: owns the runtime that relay tasks and calls run on.

use std::future::Future;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};
use tracing::info;

use hostbridge_core::Address;

use crate::chain::{ChainBackend, ChainClient};
use crate::config::BridgeConfig;
use crate::contract::{BoundContract, ContractCaller};
use crate::error::Result;
use crate::logging;
use crate::whisper::{WhisperBackend, WhisperClient};

/// Entry point for a host process.
///
/// Host calls are synchronous; subscriptions and calls run on a
/// multi-threaded tokio runtime owned here. Drop the bridge from a host
/// thread, never from inside one of its own tasks.
pub struct Bridge {
    config: BridgeConfig,
    runtime: Runtime,
}

impl Bridge {
    /// Install logging and start the runtime.
    pub fn new(config: BridgeConfig) -> Result<Self> {
        config.validate()?;
        logging::init(config.verbosity);

        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name("hostbridge-worker")
            .enable_all()
            .build()?;

        info!(
            worker_threads = config.worker_threads,
            default_buffer = config.default_buffer,
            "bridge started"
        );
        Ok(Self { config, runtime })
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Adjust log verbosity at runtime (0 crit .. 5 trace).
    pub fn set_verbosity(&self, level: u8) -> bool {
        logging::set_verbosity(level)
    }

    /// Run `future` to completion on the bridge runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn chain_client(&self, backend: Arc<dyn ChainBackend>) -> ChainClient {
        ChainClient::new(backend, self.runtime.handle().clone(), self.config.default_buffer)
    }

    pub fn whisper_client(&self, backend: Arc<dyn WhisperBackend>) -> WhisperClient {
        WhisperClient::new(backend, self.runtime.handle().clone(), self.config.default_buffer)
    }

    /// Bind the contract at `address` to `caller`.
    pub fn bound_contract(&self, address: &Address, caller: Arc<dyn ContractCaller>) -> BoundContract {
        BoundContract::new(*address, caller, self.runtime.handle().clone())
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge").field("config", &self.config).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    #[test]
    fn test_bridge_runs_futures() {
        let bridge = Bridge::new(BridgeConfig {
            worker_threads: 1,
            ..BridgeConfig::default()
        })
        .unwrap();
        assert_eq!(bridge.block_on(async { 40 + 2 }), 42);
        assert_eq!(bridge.config().worker_threads, 1);
    }

    #[test]
    fn test_bridge_rejects_zero_workers() {
        let err = Bridge::new(BridgeConfig {
            worker_threads: 0,
            ..BridgeConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfig(_)));
    }
}
