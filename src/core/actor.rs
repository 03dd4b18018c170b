//! Actor identification.
//!
//! Every participant in combat (dinosaurs, props, projectiles, hazards) is
//! referenced by an `ActorId`. The host owns actor lifetime; this crate only
//! stores ids and asks the host whether an id still resolves.
//!
//! ## Usage
//!
//! ```
//! use dino_abilities::core::ActorId;
//!
//! let rex = ActorId::new(7);
//! assert_eq!(rex.raw(), 7);
//! assert_eq!(format!("{rex}"), "Actor(7)");
//! ```

use serde::{Deserialize, Serialize};

/// Unique identifier for a host actor.
///
/// Ids are opaque handles. A stale id (the actor was destroyed) is not an
/// error here; host queries simply stop resolving it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u32);

impl ActorId {
    /// Create an actor ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for ActorId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ActorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Actor({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u32() {
        let id: ActorId = 42.into();
        assert_eq!(id, ActorId::new(42));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ActorId(42)), "Actor(42)");
    }

    #[test]
    fn test_serialization() {
        let id = ActorId(123);
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: ActorId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
