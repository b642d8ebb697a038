//! The purge run: one full pass over a listing, filter, delete, count.
//!
//! The executor iterates the source's stream exactly once per invocation,
//! with no early termination and no resumption across runs. Dry-run is an
//! executor flag, never a property of the source, so a preview run exercises
//! the exact same listing path as a real one.

use chrono::Utc;
use futures::TryStreamExt;

use crate::{
    filter::{RetentionPolicy, SkipReason, Verdict},
    models::ItemKind,
    source::{ItemSource, SourceError},
};

/// Drives one purge pass per invocation of [`Executor::run`].
#[derive(Debug, Clone)]
pub struct Executor {
    policy: RetentionPolicy,
    dry_run: bool,
}

/// Counts from a single purge run.
///
/// In dry-run mode `deleted` counts items that *would* have been deleted;
/// the summary line marks the run as a preview so the number cannot be
/// mistaken for performed deletions.
#[derive(Debug, Clone)]
pub struct PurgeReport {
    pub kind: ItemKind,
    /// Handle of the account that was processed.
    pub account: String,
    pub dry_run: bool,
    /// Items evaluated across all pages.
    pub examined: u64,
    /// Items deleted, or counted as would-delete in dry-run mode.
    pub deleted: u64,
    pub too_recent: u64,
    pub too_popular: u64,
    pub self_marked: u64,
    pub own_item: u64,
    /// Delete targets that were already gone (non-fatal).
    pub missing: u64,
}

impl PurgeReport {
    fn new(kind: ItemKind, account: String, dry_run: bool) -> Self {
        Self {
            kind,
            account,
            dry_run,
            examined: 0,
            deleted: 0,
            too_recent: 0,
            too_popular: 0,
            self_marked: 0,
            own_item: 0,
            missing: 0,
        }
    }

    fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::TooRecent => self.too_recent += 1,
            SkipReason::TooPopular => self.too_popular += 1,
            SkipReason::SelfMarked => self.self_marked += 1,
            SkipReason::OwnItem => self.own_item += 1,
        }
    }

    /// Total items retained by a skip predicate.
    pub fn skipped(&self) -> u64 {
        self.too_recent + self.too_popular + self.self_marked + self.own_item
    }

    /// One human-readable line for the operator.
    pub fn summary(&self) -> String {
        if self.dry_run {
            format!(
                "Would have deleted {} of {} {} for @{} (dry run)",
                self.deleted,
                self.examined,
                self.kind.plural(),
                self.account
            )
        } else {
            format!(
                "Deleted {} of {} {} for @{}",
                self.deleted,
                self.examined,
                self.kind.plural(),
                self.account
            )
        }
    }
}

impl Executor {
    pub fn new(policy: RetentionPolicy, dry_run: bool) -> Self {
        Self { policy, dry_run }
    }

    /// Run one purge pass over the given listing.
    ///
    /// Terminal source failures abort the run and surface to the caller;
    /// there is no partial-state cleanup because no local state exists.
    pub async fn run<S: ItemSource + ?Sized>(
        &self,
        source: &S,
        kind: ItemKind,
    ) -> Result<PurgeReport, SourceError> {
        let account = source.current_account().await?;
        let now = Utc::now();

        tracing::info!(
            account = %account.acct,
            kind = %kind,
            min_age_days = self.policy.min_age_days,
            dry_run = self.dry_run,
            "Examining {}",
            kind.plural()
        );

        let mut report = PurgeReport::new(kind, account.acct.clone(), self.dry_run);
        let mut items = source.items(kind, &account);

        while let Some(item) = items.try_next().await? {
            report.examined += 1;
            tracing::debug!(id = item.id(), "Examining {kind}");

            match self.policy.evaluate(&item, now, &account.id) {
                Verdict::Skip(reason) => {
                    tracing::info!(id = item.id(), reason = reason.as_str(), "Skipping {kind}");
                    report.record_skip(reason);
                }
                Verdict::Delete if self.dry_run => {
                    tracing::info!(id = item.id(), "Skipping {kind} (dry run)");
                    report.deleted += 1;
                }
                Verdict::Delete => {
                    tracing::warn!(id = item.id(), "Deleting {kind}");
                    match source.delete(kind, item.id()).await {
                        Ok(()) => report.deleted += 1,
                        Err(SourceError::NotFound) => {
                            tracing::warn!(id = item.id(), "Already deleted, skipping {kind}");
                            report.missing += 1;
                        }
                        Err(err) => return Err(err),
                    }
                }
            }
        }

        Ok(report)
    }
}
