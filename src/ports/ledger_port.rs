//! Ledger export port trait.

use crate::domain::error::CrosstraderError;
use crate::domain::simulation::LedgerRow;

/// Port for persisting the transaction ledger of a simulation run.
pub trait LedgerPort {
    fn write_ledger(&self, rows: &[LedgerRow]) -> Result<(), CrosstraderError>;
}
