//! Fee settlement.
//!
//! Creating a petition charges a flat fee, paid by the creator to the
//! authority. The registry only computes the [`TransferIntent`]; moving the
//! value is the job of a [`FeeSettlement`] implementation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use petition_registry_core::TransferIntent;
use thiserror::Error;

/// Errors reported by a settlement backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// The transfer was refused (insufficient funds, frozen account, ...).
    #[error("transfer rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("settlement unavailable: {0}")]
    Unavailable(String),
}

/// Executes or records fee transfers.
///
/// `settle` is awaited before the creation is persisted. An error aborts the
/// creation: no id is consumed and the title stays free.
///
/// If the creation then fails to persist, `refund` is called with the same
/// intent to reverse a transfer that already went through.
#[async_trait]
pub trait FeeSettlement: Send + Sync {
    async fn settle(&self, intent: &TransferIntent) -> Result<(), SettlementError>;

    /// Reverse a transfer previously accepted by `settle`.
    async fn refund(&self, intent: &TransferIntent) -> Result<(), SettlementError>;
}

#[async_trait]
impl<F: FeeSettlement + ?Sized> FeeSettlement for Arc<F> {
    async fn settle(&self, intent: &TransferIntent) -> Result<(), SettlementError> {
        (**self).settle(intent).await
    }

    async fn refund(&self, intent: &TransferIntent) -> Result<(), SettlementError> {
        (**self).refund(intent).await
    }
}

/// Records every intent it is given. Can be told to refuse.
///
/// A refund removes the matching intent from the settled log and keeps a
/// copy in the refund log.
#[derive(Debug, Default)]
pub struct RecordingSettlement {
    intents: Mutex<Vec<TransferIntent>>,
    refunds: Mutex<Vec<TransferIntent>>,
    reject: AtomicBool,
}

impl RecordingSettlement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse (or accept again) subsequent transfers.
    pub fn set_reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Intents settled so far, oldest first.
    pub fn intents(&self) -> Vec<TransferIntent> {
        self.lock().clone()
    }

    /// Intents refunded so far, oldest first.
    pub fn refunds(&self) -> Vec<TransferIntent> {
        lock(&self.refunds).clone()
    }

    /// Sum of all settled amounts, net of refunds.
    pub fn total(&self) -> u64 {
        self.lock().iter().map(|i| i.amount).sum()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<TransferIntent>> {
        lock(&self.intents)
    }
}

fn lock(log: &Mutex<Vec<TransferIntent>>) -> MutexGuard<'_, Vec<TransferIntent>> {
    // A poisoned log is still a valid log.
    log.lock().unwrap_or_else(|e| e.into_inner())
}

#[async_trait]
impl FeeSettlement for RecordingSettlement {
    async fn settle(&self, intent: &TransferIntent) -> Result<(), SettlementError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(SettlementError::Rejected(format!(
                "{} refused {} to {}",
                intent.payer, intent.amount, intent.payee
            )));
        }
        self.lock().push(intent.clone());
        Ok(())
    }

    async fn refund(&self, intent: &TransferIntent) -> Result<(), SettlementError> {
        let mut settled = self.lock();
        let Some(pos) = settled.iter().rposition(|i| i == intent) else {
            return Err(SettlementError::Rejected(format!(
                "no settled transfer of {} from {} to refund",
                intent.amount, intent.payer
            )));
        };
        let refunded = settled.remove(pos);
        drop(settled);

        lock(&self.refunds).push(refunded);
        Ok(())
    }
}
