use std::time::Duration;

use log::{error, info, warn};

use crate::config::{Config, Provider};
use crate::imap_client::{ImapClient, MailboxSession};
use crate::status::{Status, NO_INCIDENTS};
use crate::store::StatusStore;

/// Background worker that keeps the status store up to date.
///
/// One reconciler runs for the process lifetime and is the sole writer of
/// the store; the HTTP handlers only ever read. Each cycle opens a single
/// mailbox session so every provider is evaluated against the same mailbox
/// state, scans the providers in registry order, then sleeps for the
/// configured interval.
pub struct Reconciler {
    config: Config,
    store: StatusStore,
}

impl Reconciler {
    pub fn new(config: Config, store: StatusStore) -> Self {
        Reconciler { config, store }
    }

    /// Runs forever. Nothing a cycle encounters is allowed to escape: a
    /// broken mailbox, a failing provider or a failed write only surfaces
    /// through the store and the logs, and the next cycle retries.
    pub async fn run(self) {
        info!(
            "Reconciliation loop started: {} provider(s), every {}s",
            self.config.providers.len(),
            self.config.refresh_interval
        );

        loop {
            self.run_cycle().await;
            tokio::time::sleep(Duration::from_secs(self.config.refresh_interval)).await;
        }
    }

    /// One full pass over all registered providers using a single mailbox
    /// session. A connection failure skips the scan entirely for this
    /// cycle; no record changes until the next successful pass.
    pub async fn run_cycle(&self) {
        match ImapClient::connect(&self.config.mailbox).await {
            Ok(mut client) => {
                self.scan_providers(&mut client).await;

                // Per-provider errors are contained inside the scan, so the
                // session is released on every path that opened one.
                if let Err(e) = client.logout().await {
                    warn!("IMAP logout failed: {}", e);
                }
            }
            Err(e) => {
                error!("Mailbox session could not be established, skipping this cycle: {}", e);
            }
        }
    }

    /// Classifies every provider in registry order, writing each verdict
    /// immediately so partial progress is visible before the cycle ends.
    pub async fn scan_providers<M: MailboxSession + Send>(&self, mailbox: &mut M) {
        for provider in &self.config.providers {
            let (status, detail) = scan_provider(mailbox, provider).await;

            // A failed write is skipped, not fatal: the provider keeps its
            // last good record until the next cycle.
            if let Err(e) = self.store.upsert(&provider.name, status, &detail).await {
                error!("Failed to record status for {}: {:#}", provider.name, e);
            }
        }
    }
}

/// Derives one provider's verdict from the mailbox, independent of any
/// previous status — no debouncing, no hysteresis. No messages from the
/// provider's sender means Up; the subject of the last search hit becomes
/// the Down evidence; any search or fetch failure becomes an Error verdict
/// so one broken provider never aborts the scan of the rest.
///
/// "Last search hit" deliberately trusts mailbox-native search order
/// instead of re-sorting by date; search order is server-dependent and
/// this is a known fragility, kept as is.
pub async fn scan_provider<M: MailboxSession + Send>(
    mailbox: &mut M,
    provider: &Provider,
) -> (Status, String) {
    match mailbox.search_from_sender(&provider.mail_address).await {
        Err(e) => (Status::Error, e.to_string()),
        Ok(ids) => match ids.last() {
            None => (Status::Up, NO_INCIDENTS.to_string()),
            Some(&latest) => match mailbox.fetch_subject(latest).await {
                Ok(subject) => (Status::Down, subject),
                Err(e) => (Status::Error, e.to_string()),
            },
        },
    }
}
