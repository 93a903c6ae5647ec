//! Scoped "transaction mode" on a destination connection.
//!
//! [`TransactionScope::begin`] records the connection's autocommit mode and
//! turns autocommit off. The scope is finished by [`TransactionScope::commit`]
//! or [`TransactionScope::rollback`], and both put the recorded mode back.

use tracing::{debug, warn};

use crate::core::traits::TargetWriter;
use crate::error::Result;

/// An open destination transaction.
pub struct TransactionScope<'a, W: TargetWriter + ?Sized> {
    writer: &'a mut W,
    restore_autocommit: bool,
    finished: bool,
}

impl<'a, W: TargetWriter + ?Sized> TransactionScope<'a, W> {
    /// Record the current autocommit mode and open a transaction.
    ///
    /// A connection that cannot report its mode is assumed to be in
    /// autocommit, which is the default for every supported engine.
    pub async fn begin(writer: &'a mut W) -> Result<Self> {
        let restore_autocommit = match writer.autocommit().await {
            Ok(mode) => mode,
            Err(e) => {
                debug!("Could not read autocommit mode, assuming enabled: {}", e);
                true
            }
        };

        writer.set_autocommit(false).await?;
        debug!(
            "{}: transaction started (autocommit was {})",
            writer.db_type(),
            restore_autocommit
        );

        Ok(Self {
            writer,
            restore_autocommit,
            finished: false,
        })
    }

    /// The writer, for use inside the transaction.
    pub fn writer(&mut self) -> &mut W {
        &mut *self.writer
    }

    /// Commit and restore the recorded autocommit mode.
    ///
    /// If the commit itself fails the transaction is rolled back before the
    /// error is returned.
    pub async fn commit(mut self) -> Result<()> {
        let result = self.writer.commit().await;
        if let Err(ref e) = result {
            warn!("Commit failed, rolling back: {}", e);
            if let Err(rollback_err) = self.writer.rollback().await {
                warn!("Rollback after failed commit also failed: {}", rollback_err);
            }
        }
        self.restore().await;
        result
    }

    /// Roll back and restore the recorded autocommit mode.
    ///
    /// A failed rollback is logged, never returned: the caller is already
    /// propagating the error that caused it.
    pub async fn rollback(mut self) {
        if let Err(e) = self.writer.rollback().await {
            warn!("Rollback failed: {}", e);
        }
        self.restore().await;
    }

    async fn restore(&mut self) {
        self.finished = true;
        if let Err(e) = self.writer.set_autocommit(self.restore_autocommit).await {
            warn!(
                "Could not restore autocommit={} on {} connection: {}",
                self.restore_autocommit,
                self.writer.db_type(),
                e
            );
        }
    }
}

impl<W: TargetWriter + ?Sized> Drop for TransactionScope<'_, W> {
    fn drop(&mut self) {
        if !self.finished {
            // Async cleanup cannot run here. The server discards the open
            // transaction when the connection is closed.
            warn!(
                "Transaction scope on {} connection dropped without commit or rollback",
                self.writer.db_type()
            );
        }
    }
}
