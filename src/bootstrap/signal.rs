use std::fmt;

use async_lock::OnceCell;

use crate::bootstrap::error::BootstrapError;

/// Settled result of initialization.
pub type InitOutcome = Result<(), BootstrapError>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignalState {
    Pending,
    Fulfilled,
    Rejected,
}

/// Single-settlement signal: resolves or rejects once, then hands the stored outcome to
/// every waiter.
pub struct InitSignal {
    cell: OnceCell<InitOutcome>,
}

impl InitSignal {
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::new(),
        }
    }

    /// Settles with success. Returns `false` if the signal had already settled.
    pub async fn resolve(&self) -> bool {
        self.settle(Ok(())).await
    }

    /// Settles with `error`. Returns `false` if the signal had already settled.
    pub async fn reject(&self, error: BootstrapError) -> bool {
        self.settle(Err(error)).await
    }

    async fn settle(&self, outcome: InitOutcome) -> bool {
        self.cell.set(outcome).await.is_ok()
    }

    /// Waits for the first settlement and returns its outcome.
    pub async fn wait(&self) -> InitOutcome {
        self.cell.wait().await.clone()
    }

    pub fn outcome(&self) -> Option<InitOutcome> {
        self.cell.get().cloned()
    }

    pub fn state(&self) -> SignalState {
        match self.cell.get() {
            None => SignalState::Pending,
            Some(Ok(())) => SignalState::Fulfilled,
            Some(Err(_)) => SignalState::Rejected,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.cell.is_initialized()
    }
}

impl Default for InitSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitSignal")
            .field("state", &self.state())
            .finish()
    }
}
