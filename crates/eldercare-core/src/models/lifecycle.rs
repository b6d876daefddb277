//! Status lifecycles shared by every approval workflow.

use std::fmt::Debug;

/// A status enum with a fixed set of legal transitions.
///
/// Every workflow entity (elder, payment, consultation, appointment,
/// donation) stores one of these in its `status` column. Transition
/// handlers must consult [`Lifecycle::can_transition_to`] before writing.
pub trait Lifecycle: Copy + PartialEq + Debug + Sized + 'static {
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    /// Storage and wire form.
    fn as_str(&self) -> &'static str;

    /// Whether `next` may directly follow `self`.
    fn can_transition_to(&self, next: Self) -> bool;

    /// Parse the storage form.
    fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == s)
    }

    /// A status with no outgoing transitions.
    fn is_terminal(&self) -> bool {
        Self::ALL.iter().all(|next| !self.can_transition_to(*next))
    }
}
