//! Single-item transfer with bounded retry

use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::MaterializeError;
use crate::library::{LocalStore, RetryPolicy};
use crate::remote::{ItemDescriptor, Transfer, TransferRequest};

/// Transfers one item at a time into the storage root
pub struct Materializer {
    transfer: Box<dyn Transfer>,
    store: LocalStore,
    policy: RetryPolicy,
}

impl Materializer {
    pub fn new(transfer: Box<dyn Transfer>, store: LocalStore, policy: RetryPolicy) -> Self {
        Self {
            transfer,
            store,
            policy,
        }
    }

    /// Transfer an item under `stem`, retrying up to the policy bound
    ///
    /// Every attempt is a full transfer. Leftovers of earlier attempts are
    /// discarded first so nothing partial is mistaken for a result. The wait
    /// between attempts is constant.
    pub async fn materialize(
        &self,
        item: &ItemDescriptor,
        stem: &str,
    ) -> Result<PathBuf, MaterializeError> {
        let max_attempts = self.policy.max_retries.max(1);
        let request = TransferRequest {
            url: item.source_url.clone(),
            output_dir: self.store.root().to_path_buf(),
            stem: stem.to_string(),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;

            let discarded = self.store.discard_partials(stem).await;
            if discarded > 0 {
                debug!("Removed {} partial file(s) for {}", discarded, stem);
            }

            match self.transfer.fetch(&request).await {
                Ok(path) => {
                    debug!("Transferred {} on attempt {}", item.source_url, attempt);
                    return Ok(path);
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed: {}", attempt, max_attempts, e);
                    if e.is_permanent() {
                        warn!("Item {} looks permanently unavailable", item.id);
                    }

                    if attempt >= max_attempts {
                        return Err(MaterializeError {
                            attempts: attempt,
                            last_cause: e,
                        });
                    }

                    info!(
                        "Waiting {} seconds before retrying...",
                        self.policy.delay.as_secs()
                    );
                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        }
    }
}
