//! Lifecycle status of an ephemeral handoff record.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Status of a generated-section handoff record.
///
/// The progression is one-way:
///
/// ```text
/// pending ──► oauth_complete ──► retrieved
///    └───────────────────────────────▲
/// ```
///
/// `oauth_complete` is optional; a record may be retrieved straight from
/// `pending`. Nothing leaves `retrieved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "handoff_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum HandoffStatus {
    /// Stored, waiting for the shop to authorize.
    #[default]
    Pending,
    /// The OAuth callback carried this record's key.
    OauthComplete,
    /// Content has been released to a caller. Terminal.
    Retrieved,
}

impl HandoffStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::OauthComplete, Self::Retrieved];

    /// Whether moving from `self` to `next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::OauthComplete | Self::Retrieved)
                | (Self::OauthComplete, Self::Retrieved)
        )
    }

    /// Database names of the statuses a record may leave to enter `self`.
    ///
    /// Guarded updates bind this as their status precondition.
    #[must_use]
    pub fn predecessors(self) -> Vec<&'static str> {
        Self::ALL
            .into_iter()
            .filter(|from| from.can_transition_to(self))
            .map(Self::as_str)
            .collect()
    }

    /// Wire / database name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::OauthComplete => "oauth_complete",
            Self::Retrieved => "retrieved",
        }
    }
}

impl fmt::Display for HandoffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
