//! Network authority and client prediction.
//!
//! Every call that may create tracked effects states which side of the
//! network it runs on. Servers are authoritative. Clients may predict while
//! they hold a prediction key the server has not yet confirmed or rejected;
//! otherwise they are simulated proxies and must not create tracked effects.

use serde::{Deserialize, Serialize};

/// A client-side speculative action pending server confirmation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PredictionKey {
    /// Zero means "no key".
    pub id: u32,
    /// Set once the server has acknowledged the action.
    pub confirmed: bool,
}

impl PredictionKey {
    /// A fresh, unconfirmed key.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self { id, confirmed: false }
    }

    /// Mark the key as acknowledged by the server.
    #[must_use]
    pub const fn confirm(self) -> Self {
        Self {
            id: self.id,
            confirmed: true,
        }
    }

    /// True while the key may still back new predicted actions.
    #[must_use]
    pub const fn is_valid_for_more_prediction(self) -> bool {
        self.id != 0 && !self.confirmed
    }
}

/// The side a call runs on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetAuthority {
    /// Server, or a standalone game.
    #[default]
    Authority,
    /// Client activation running under a prediction key.
    Predicting(PredictionKey),
    /// Client without a usable prediction key.
    Simulated,
}

impl NetAuthority {
    /// True on the authoritative side.
    #[must_use]
    pub const fn is_authority(self) -> bool {
        matches!(self, Self::Authority)
    }

    /// True if this side may create tracked (durable) effects: the authority,
    /// or a client whose prediction key is still valid.
    #[must_use]
    pub const fn can_apply_tracked(self) -> bool {
        match self {
            Self::Authority => true,
            Self::Predicting(key) => key.is_valid_for_more_prediction(),
            Self::Simulated => false,
        }
    }
}
