//! Retention rules deciding which items survive a purge run.
//!
//! Predicates are evaluated per item, in fixed order, with no cross-item
//! state. The only context beyond the item itself is the current account id,
//! fetched once per run.

use chrono::{DateTime, Utc};

use crate::models::Item;

/// Retention thresholds for a purge run.
///
/// `max_favourites` only applies to posts; liked items are retained based on
/// age and self-authorship alone.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    /// Items at most this many whole days old are kept.
    pub min_age_days: i64,
    /// Posts with strictly more favourites than this are kept regardless
    /// of age.
    pub max_favourites: i64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            min_age_days: 62,
            max_favourites: 20,
        }
    }
}

/// Why an item was retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Within the configured age window.
    TooRecent,
    /// More favourites than the configured threshold.
    TooPopular,
    /// The account favourited its own post.
    SelfMarked,
    /// A favourite on the account's own item.
    OwnItem,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TooRecent => "recent",
            Self::TooPopular => "lots of favourites",
            Self::SelfMarked => "self-favourited",
            Self::OwnItem => "own item",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The filter's decision for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Skip(SkipReason),
    Delete,
}

impl RetentionPolicy {
    /// Decide whether `item` should be deleted.
    ///
    /// The recency check always runs first; an item exactly `min_age_days`
    /// old is still skipped (the condition is `<=`), so deletion requires
    /// strictly more than the threshold in whole days.
    pub fn evaluate(&self, item: &Item, now: DateTime<Utc>, self_account_id: &str) -> Verdict {
        if age_in_days(now, item.created_at()) <= self.min_age_days {
            return Verdict::Skip(SkipReason::TooRecent);
        }

        match item {
            Item::Post(post) => {
                if post.favourites_count > self.max_favourites {
                    return Verdict::Skip(SkipReason::TooPopular);
                }
                if post.favourited {
                    return Verdict::Skip(SkipReason::SelfMarked);
                }
            }
            Item::Liked(liked) => {
                if liked.account.id == self_account_id {
                    return Verdict::Skip(SkipReason::OwnItem);
                }
            }
        }

        Verdict::Delete
    }
}

/// Whole-day difference between two instants, truncating toward zero.
fn age_in_days(now: DateTime<Utc>, created_at: DateTime<Utc>) -> i64 {
    (now - created_at).num_days()
}
