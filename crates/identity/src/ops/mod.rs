use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::{IdentityError, ResultIdentity, Unconfigured, VerificationProvider};

mod access;
mod claims;
mod materialize;
mod phone;

pub use claims::{ClaimReport, TransferCounts};
pub use materialize::MaterializeReport;
pub use phone::VerifyOutcome;

type TxFuture<'a, T> = Pin<Box<dyn Future<Output = ResultIdentity<T>> + Send + 'a>>;

fn normalize_required_name(value: &str, label: &str) -> ResultIdentity<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdentityError::InvalidInput(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Server-side identity claim service.
///
/// Owns the database handle and the verification provider. Every operation
/// that touches more than one row runs inside a single database
/// transaction (see [`IdentityService::with_tx`]).
pub struct IdentityService {
    database: DatabaseConnection,
    provider: Arc<dyn VerificationProvider>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl std::fmt::Debug for IdentityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityService")
            .field("database", &self.database)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl IdentityService {
    /// Return a builder for `IdentityService`. Help to build the struct.
    pub fn builder() -> IdentityServiceBuilder {
        IdentityServiceBuilder::default()
    }

    /// Runs `f` inside a database transaction, committing on success and
    /// rolling back on error.
    pub(crate) async fn with_tx<T, F>(&self, f: F) -> ResultIdentity<T>
    where
        T: Send,
        F: for<'a> FnOnce(&'a IdentityService, &'a DatabaseTransaction) -> TxFuture<'a, T> + Send,
    {
        let db_tx = self.database.begin().await?;
        match f(self, &db_tx).await {
            Ok(value) => {
                db_tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = db_tx.rollback().await {
                    tracing::error!("rollback failed: {rollback_err}");
                }
                Err(err)
            }
        }
    }
}

/// The builder for `IdentityService`
pub struct IdentityServiceBuilder {
    database: DatabaseConnection,
    provider: Arc<dyn VerificationProvider>,
    max_retries: u32,
    retry_backoff: Duration,
}

impl Default for IdentityServiceBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            provider: Arc::new(Unconfigured),
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

impl IdentityServiceBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> IdentityServiceBuilder {
        self.database = db;
        self
    }

    /// Verification provider; defaults to [`Unconfigured`].
    pub fn provider(mut self, provider: Arc<dyn VerificationProvider>) -> IdentityServiceBuilder {
        self.provider = provider;
        self
    }

    /// How many times a transient provider failure is retried.
    pub fn max_retries(mut self, retries: u32) -> IdentityServiceBuilder {
        self.max_retries = retries;
        self
    }

    /// Base delay between retries, multiplied by the attempt number.
    pub fn retry_backoff(mut self, backoff: Duration) -> IdentityServiceBuilder {
        self.retry_backoff = backoff;
        self
    }

    /// Construct `IdentityService`
    pub fn build(self) -> ResultIdentity<IdentityService> {
        if matches!(self.database, DatabaseConnection::Disconnected) {
            return Err(IdentityError::InvalidInput(
                "a database connection is required".to_string(),
            ));
        }
        Ok(IdentityService {
            database: self.database,
            provider: self.provider,
            max_retries: self.max_retries,
            retry_backoff: self.retry_backoff,
        })
    }
}
