//! Optimistic, offline-first resource stores.
//!
//! Every user-initiated mutation applies to the in-memory collection
//! synchronously - before the first await - then reconciles with the
//! backend in the background of the same call. The UI reads store
//! snapshots, so it reflects the mutation immediately regardless of
//! network outcome. `fetch()` replaces the whole collection with the
//! server view and is the only path that repairs divergence.
//!
//! Whether a reconciliation failure is swallowed or surfaced is explicit
//! per-store, per-operation configuration, not an implicit code path:
//!
//! | store     | add                | update                 | remove            |
//! |-----------|--------------------|------------------------|-------------------|
//! | cart      | tolerant           | tolerant               | tolerant          |
//! | addresses | strict (rollback)  | strict (retain patch)  | tolerant          |
//! | cards     | strict (rollback)  | strict (retain patch)  | strict (surface)  |
//! | orders    | -                  | strict (retain patch)  | -                 |
//!
//! Tolerant operations swallow NETWORK failures only (the request never
//! arrived); a validation rejection means the backend saw and refused the
//! write, and is always surfaced.

pub mod addresses;
pub mod cards;
pub mod cart;
pub mod orders;

pub use addresses::AddressStore;
pub use cards::CardStore;
pub use cart::CartStore;
pub use orders::OrderStore;

use tracing::warn;

use crate::error::ApiError;

/// How a store operation treats reconciliation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritePolicy {
    /// Offline-first: network failure is logged and swallowed; local state
    /// stays authoritative until the next fetch.
    Tolerant,
    /// Server-authoritative: every failure surfaces to the caller.
    Strict,
}

impl WritePolicy {
    /// Whether this policy swallows the given failure.
    #[must_use]
    pub const fn absorbs(self, error: &ApiError) -> bool {
        matches!(self, Self::Tolerant) && error.is_network()
    }
}

/// A store's per-operation policy table.
#[derive(Debug, Clone, Copy)]
pub struct StorePolicy {
    pub add: WritePolicy,
    pub update: WritePolicy,
    pub remove: WritePolicy,
}

impl StorePolicy {
    /// Cart: fully offline-tolerant.
    #[must_use]
    pub const fn cart() -> Self {
        Self {
            add: WritePolicy::Tolerant,
            update: WritePolicy::Tolerant,
            remove: WritePolicy::Tolerant,
        }
    }

    /// Addresses: identity-bearing creates are strict, removals tolerant.
    #[must_use]
    pub const fn addresses() -> Self {
        Self {
            add: WritePolicy::Strict,
            update: WritePolicy::Strict,
            remove: WritePolicy::Tolerant,
        }
    }

    /// Cards: the backend owns billing truth; everything is strict.
    #[must_use]
    pub const fn cards() -> Self {
        Self {
            add: WritePolicy::Strict,
            update: WritePolicy::Strict,
            remove: WritePolicy::Strict,
        }
    }

    /// Orders: only status updates exist, and they are strict.
    #[must_use]
    pub const fn orders() -> Self {
        Self {
            add: WritePolicy::Strict,
            update: WritePolicy::Strict,
            remove: WritePolicy::Strict,
        }
    }
}

/// Settle a reconciliation outcome against a policy: swallow what the
/// policy absorbs, surface the rest. The local mutation has already been
/// applied either way.
pub(crate) fn settle(
    policy: WritePolicy,
    operation: &'static str,
    outcome: Result<(), ApiError>,
) -> Result<(), ApiError> {
    match outcome {
        Ok(()) => Ok(()),
        Err(e) if policy.absorbs(&e) => {
            warn!(operation, error = %e, "offline-tolerant mutation kept locally");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

// =============================================================================
// Default-flag invariant
// =============================================================================

/// Entities carrying an `is_default` flag (addresses, payment cards).
///
/// The invariant: at most one entity in a collection is default at any
/// observable moment, and exactly one once the collection is non-empty.
/// All three helpers below mutate the collection in a single pass while
/// the store holds its lock, so no intermediate state is ever visible.
pub(crate) trait DefaultFlagged {
    /// Stable identity, as a string key.
    fn key(&self) -> &str;
    fn is_default(&self) -> bool;
    fn set_default(&mut self, value: bool);
}

/// Append an entity, enforcing the default-flag rules: the first entity is
/// always promoted; an entity arriving with the flag set demotes everyone
/// else.
pub(crate) fn push_with_default<T: DefaultFlagged>(items: &mut Vec<T>, mut entry: T) {
    if items.is_empty() {
        entry.set_default(true);
    } else if entry.is_default() {
        for item in items.iter_mut() {
            item.set_default(false);
        }
    }
    items.push(entry);
}

/// The target of a promotion was not in the collection.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct UnknownKey;

/// Promote one entity to default, demoting the previous holder, in one
/// pass. Returns the previous holder's key when it differs from the
/// target, so the caller can reconcile the demotion remotely.
///
/// # Errors
///
/// Returns [`UnknownKey`] when the target key is absent.
pub(crate) fn promote_default<T: DefaultFlagged>(
    items: &mut [T],
    key: &str,
) -> Result<Option<String>, UnknownKey> {
    if !items.iter().any(|item| item.key() == key) {
        return Err(UnknownKey);
    }

    let previous = items
        .iter()
        .find(|item| item.is_default() && item.key() != key)
        .map(|item| item.key().to_owned());

    for item in items.iter_mut() {
        item.set_default(item.key() == key);
    }

    Ok(previous)
}

/// Remove an entity; if it held the default flag, the first survivor is
/// promoted so a non-empty collection never has zero defaults.
pub(crate) fn remove_promoting<T: DefaultFlagged>(items: &mut Vec<T>, key: &str) -> Option<T> {
    let position = items.iter().position(|item| item.key() == key)?;
    let removed = items.remove(position);

    if removed.is_default()
        && let Some(first) = items.first_mut()
    {
        first.set_default(true);
    }

    Some(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Entry {
        id: String,
        default: bool,
    }

    impl Entry {
        fn new(id: &str, default: bool) -> Self {
            Self {
                id: id.to_owned(),
                default,
            }
        }
    }

    impl DefaultFlagged for Entry {
        fn key(&self) -> &str {
            &self.id
        }

        fn is_default(&self) -> bool {
            self.default
        }

        fn set_default(&mut self, value: bool) {
            self.default = value;
        }
    }

    fn defaults(items: &[Entry]) -> Vec<&str> {
        items
            .iter()
            .filter(|e| e.default)
            .map(|e| e.id.as_str())
            .collect()
    }

    #[test]
    fn test_first_push_promotes_itself() {
        let mut items = Vec::new();
        push_with_default(&mut items, Entry::new("a", false));
        assert_eq!(defaults(&items), vec!["a"]);
    }

    #[test]
    fn test_push_with_flag_demotes_others() {
        let mut items = Vec::new();
        push_with_default(&mut items, Entry::new("a", true));
        push_with_default(&mut items, Entry::new("b", false));
        push_with_default(&mut items, Entry::new("c", true));
        assert_eq!(defaults(&items), vec!["c"]);
    }

    #[test]
    fn test_promote_default_returns_previous_holder() {
        let mut items = Vec::new();
        push_with_default(&mut items, Entry::new("a", true));
        push_with_default(&mut items, Entry::new("b", false));

        let previous = promote_default(&mut items, "b").expect("b exists");
        assert_eq!(previous.as_deref(), Some("a"));
        assert_eq!(defaults(&items), vec!["b"]);

        // Promoting the current default is a no-op with no previous holder.
        let previous = promote_default(&mut items, "b").expect("b exists");
        assert!(previous.is_none());
        assert_eq!(defaults(&items), vec!["b"]);
    }

    #[test]
    fn test_promote_default_unknown_key() {
        let mut items = vec![Entry::new("a", true)];
        assert!(promote_default(&mut items, "nope").is_err());
        assert_eq!(defaults(&items), vec!["a"]);
    }

    #[test]
    fn test_remove_promoting_hands_flag_to_first_survivor() {
        let mut items = Vec::new();
        push_with_default(&mut items, Entry::new("a", true));
        push_with_default(&mut items, Entry::new("b", false));
        push_with_default(&mut items, Entry::new("c", false));

        let removed = remove_promoting(&mut items, "a").expect("a removed");
        assert!(removed.default);
        assert_eq!(defaults(&items), vec!["b"]);
    }

    #[test]
    fn test_remove_non_default_leaves_flag_alone() {
        let mut items = Vec::new();
        push_with_default(&mut items, Entry::new("a", true));
        push_with_default(&mut items, Entry::new("b", false));

        remove_promoting(&mut items, "b").expect("b removed");
        assert_eq!(defaults(&items), vec!["a"]);
    }

    #[test]
    fn test_remove_last_entity_empties_collection() {
        let mut items = Vec::new();
        push_with_default(&mut items, Entry::new("a", true));
        remove_promoting(&mut items, "a").expect("a removed");
        assert!(items.is_empty());
    }

    #[test]
    fn test_write_policy_absorbs_network_only() {
        let network = ApiError::Network("offline".to_owned());
        let validation = ApiError::validation_field("quantity", "too many");

        assert!(WritePolicy::Tolerant.absorbs(&network));
        assert!(!WritePolicy::Tolerant.absorbs(&validation));
        assert!(!WritePolicy::Strict.absorbs(&network));
    }
}
