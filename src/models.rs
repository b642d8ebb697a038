//! Read-only views over the remote listing.
//!
//! These types mirror the wire format of the Mastodon status entity: string
//! ids, RFC 3339 `created_at`, `favourites_count`, `favourited`, and a nested
//! `account`. They exist only for the duration of one iteration step and are
//! never mutated locally; remote deletion is their only state transition.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// The account a run operates on, or the author of an item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub id: String,
    /// Webfinger-style handle, e.g. `user@example.social`.
    pub acct: String,
}

/// A single authored item in the account's timeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Post {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub favourites_count: i64,
    /// Whether the posting account itself favourited this post.
    #[serde(default)]
    pub favourited: bool,
    pub account: Account,
}

/// An item the account has marked as a favourite.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LikedItem {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// The item's author, used to detect self-authorship.
    pub account: Account,
}

/// One element of the purge stream.
///
/// A single executor loop serves both listings, so items are carried behind
/// one enum rather than duplicating the loop per kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Post(Post),
    Liked(LikedItem),
}

impl Item {
    pub fn id(&self) -> &str {
        match self {
            Self::Post(post) => &post.id,
            Self::Liked(item) => &item.id,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Post(post) => post.created_at,
            Self::Liked(item) => item.created_at,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            Self::Post(_) => ItemKind::Post,
            Self::Liked(_) => ItemKind::Liked,
        }
    }
}

/// Which listing a run iterates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Post,
    Liked,
}

impl ItemKind {
    /// Singular noun for per-item log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Liked => "favourite",
        }
    }

    /// Plural noun for summary lines.
    pub fn plural(&self) -> &'static str {
        match self {
            Self::Post => "posts",
            Self::Liked => "favourites",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
