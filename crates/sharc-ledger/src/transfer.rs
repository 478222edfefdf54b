//! Funds movement seam
//!
//! The ledger decides amounts and legality; moving tokens belongs to an
//! external collaborator. Transfers are treated as synchronous and atomic:
//! the ledger calls them after every precondition holds and before mutating
//! state, so a refused transfer leaves the ledger untouched.

use sharc_common::{Address, MinorUnits};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransferError(pub String);

pub trait FundsTransfer: Send + Sync {
    /// Move `amount` from `from` into the pool
    fn pull(&self, from: &Address, amount: MinorUnits) -> Result<(), TransferError>;

    /// Move `amount` out of the pool to `to`
    fn push(&self, to: &Address, amount: MinorUnits) -> Result<(), TransferError>;
}

/// Accepts every transfer; for single-process use where settlement is external
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTransfer;

impl FundsTransfer for NoopTransfer {
    fn pull(&self, _from: &Address, _amount: MinorUnits) -> Result<(), TransferError> {
        Ok(())
    }

    fn push(&self, _to: &Address, _amount: MinorUnits) -> Result<(), TransferError> {
        Ok(())
    }
}
