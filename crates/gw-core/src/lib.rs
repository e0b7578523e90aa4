//! Core types for Gruppenwurf: session descriptors, entrants, and ability data.
//!
//! Nothing here knows about dice or networking. A [`SessionDescriptor`] is
//! the immutable description of one group check; an [`EntrantDirectory`]
//! resolves opaque entrant references to display data and modifiers.

/// Abilities, skills, and the key selecting a check's modifier.
pub mod ability;
/// Session descriptors, roles, and visibility flags.
pub mod descriptor;
/// Entrant data lookup and the in-memory roster.
pub mod directory;
/// Error types used throughout the crate.
pub mod error;
/// Session and entrant identifiers.
pub mod id;

/// Re-export ability types.
pub use ability::{Ability, AbilityKey, Skill};
/// Re-export descriptor types.
pub use descriptor::{Role, SessionDescriptor, Visibility};
/// Re-export directory types.
pub use directory::{
    AbilityScores, DisplayInfo, EntrantDirectory, EntrantSheet, Roster, compute_modifier,
    display_or_placeholder,
};
/// Re-export error types.
pub use error::{CoreError, CoreResult};
/// Re-export identifiers.
pub use id::{EntrantId, SessionId};
