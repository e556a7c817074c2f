//! Bound contract calls marshalled through [`Interfaces`].
//!
//! The caller pre-allocates output slots with `set_default_*` so the callee
//! can see which kinds to decode into. With one slot the callee writes
//! straight into it; with several it fills a copy that is written back only
//! when the call succeeds.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::debug;

use hostbridge_core::{Address, Interface, Interfaces};
use hostbridge_sub::Context;

use crate::error::{BridgeError, Result};

/// Options for a read-only contract call.
#[derive(Debug, Clone, Default)]
pub struct CallOpts {
    pending: bool,
    from: Option<Address>,
    context: Context,
}

impl CallOpts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether to call against the pending state.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
    }

    pub fn from(&self) -> Option<Address> {
        self.from
    }

    pub fn set_from(&mut self, from: &Address) {
        self.from = Some(*from);
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn set_context(&mut self, context: &Context) {
        self.context = context.clone();
    }
}

/// Executes a contract method and decodes its results.
///
/// `out` holds placeholders whose kinds tell the callee what to decode.
/// Implementations fill them through [`Interface::value_mut`] or the typed
/// setters.
#[async_trait]
pub trait ContractCaller: Send + Sync {
    async fn call(
        &self,
        opts: &CallOpts,
        contract: &Address,
        method: &str,
        args: &[Interface],
        out: &mut [Interface],
    ) -> anyhow::Result<()>;
}

/// A contract at a fixed address, callable from the host.
#[derive(Clone)]
pub struct BoundContract {
    address: Address,
    caller: Arc<dyn ContractCaller>,
    runtime: Handle,
}

impl BoundContract {
    pub(crate) fn new(address: Address, caller: Arc<dyn ContractCaller>, runtime: Handle) -> Self {
        Self {
            address,
            caller,
            runtime,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Invoke `method` with `args`, decoding results into `out`.
    ///
    /// Fails with [`BridgeError::ContextDone`] if the options' context ends
    /// first.
    pub fn call(
        &self,
        opts: &CallOpts,
        out: &mut Interfaces,
        method: &str,
        args: &Interfaces,
    ) -> Result<()> {
        let ctx = opts.context();
        if let Some(cause) = ctx.err() {
            return Err(cause.into());
        }
        debug!(contract = %self.address, method, outputs = out.size(), "contract call");

        self.runtime.block_on(async {
            if out.size() == 1 {
                self.invoke(opts, method, args.as_slice(), out.as_mut_slice())
                    .await
            } else {
                let mut results = out.as_slice().to_vec();
                self.invoke(opts, method, args.as_slice(), &mut results)
                    .await?;
                out.as_mut_slice().clone_from_slice(&results);
                Ok(())
            }
        })
    }

    async fn invoke(
        &self,
        opts: &CallOpts,
        method: &str,
        args: &[Interface],
        out: &mut [Interface],
    ) -> Result<()> {
        let ctx = opts.context();
        tokio::select! {
            result = self.caller.call(opts, &self.address, method, args, out) => {
                result.map_err(BridgeError::from)
            }
            _ = ctx.done() => {
                let cause = ctx.err().unwrap_or(hostbridge_sub::ContextError::Canceled);
                Err(cause.into())
            }
        }
    }
}

impl std::fmt::Debug for BoundContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundContract")
            .field("address", &self.address)
            .finish()
    }
}
