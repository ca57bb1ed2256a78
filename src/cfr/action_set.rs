//! Canonical identity of an information set.
//!
//! In Goofspiel a player only observes their own remaining hand, so two
//! histories belong to the same information set exactly when the acting
//! player has the same unplayed cards. The set is stored as a bitmask, which
//! is order-independent and doubles as a dense index into the store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A card value in `1..=N`. Playing a card is the only kind of action.
pub type Card = u8;

/// Largest supported deck. The store allocates `2^N` records up front.
pub const MAX_DECK_SIZE: usize = 16;

/// Set of cards a player has not played yet. Bit `c - 1` is set for card `c`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionSet(u32);

impl ActionSet {
    /// The empty hand (after the last round).
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The full hand `{1, ..., n}`.
    pub fn full(n: usize) -> Self {
        debug_assert!(n <= MAX_DECK_SIZE);
        Self(((1u64 << n) - 1) as u32)
    }

    /// Build a set from a list of cards.
    pub fn from_cards(cards: &[Card]) -> Self {
        cards.iter().fold(Self::empty(), |set, &c| set.with(c))
    }

    /// Rebuild a set from its dense index.
    pub fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Dense index of this set, in `0..2^N`.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Number of cards in the set.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// True if no cards remain.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if `card` is still in hand.
    pub fn contains(self, card: Card) -> bool {
        card >= 1 && (card as usize) <= MAX_DECK_SIZE && self.0 & Self::bit(card) != 0
    }

    /// Copy of this set with `card` added.
    pub fn with(self, card: Card) -> Self {
        Self(self.0 | Self::bit(card))
    }

    /// Copy of this set with `card` removed.
    pub fn without(self, card: Card) -> Self {
        Self(self.0 & !Self::bit(card))
    }

    /// Position of `card` among the set's cards in ascending order.
    ///
    /// Per-action vectors in the store are laid out in this order.
    pub fn position(self, card: Card) -> Option<usize> {
        if !self.contains(card) {
            return None;
        }
        let below = self.0 & (Self::bit(card) - 1);
        Some(below.count_ones() as usize)
    }

    /// Cards in ascending order.
    pub fn cards(self) -> impl Iterator<Item = Card> {
        let bits = self.0;
        (1..=MAX_DECK_SIZE as Card).filter(move |&c| bits & Self::bit(c) != 0)
    }

    /// Every subset of `{1, ..., n}`, smallest first and lexicographic within a size.
    pub fn all_subsets(n: usize) -> Vec<ActionSet> {
        let mut subsets: Vec<ActionSet> = (0..1usize << n).map(Self::from_index).collect();
        subsets.sort_by_cached_key(|s| (s.len(), s.cards().collect::<Vec<_>>()));
        subsets
    }

    /// Canonical label such as `{1,3,4}`, used as the report key.
    pub fn label(self) -> String {
        self.to_string()
    }

    fn bit(card: Card) -> u32 {
        debug_assert!(card >= 1 && (card as usize) <= MAX_DECK_SIZE, "card {} out of range", card);
        1u32 << (card - 1)
    }
}

impl fmt::Display for ActionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, card) in self.cards().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", card)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_and_membership() {
        let full = ActionSet::full(5);
        assert_eq!(full.len(), 5);
        assert!(full.contains(1));
        assert!(full.contains(5));
        assert!(!full.contains(6));
        assert!(!full.contains(0));
        assert_eq!(full.cards().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_identity_ignores_play_order() {
        let a = ActionSet::full(5).without(2).without(4);
        let b = ActionSet::full(5).without(4).without(2);
        assert_eq!(a, b);
        assert_eq!(a, ActionSet::from_cards(&[5, 3, 1]));
        assert_eq!(a.label(), "{1,3,5}");
    }

    #[test]
    fn test_position_is_rank() {
        let set = ActionSet::from_cards(&[2, 5, 7]);
        assert_eq!(set.position(2), Some(0));
        assert_eq!(set.position(5), Some(1));
        assert_eq!(set.position(7), Some(2));
        assert_eq!(set.position(3), None);
    }

    #[test]
    fn test_all_subsets_order() {
        let subsets = ActionSet::all_subsets(3);
        assert_eq!(subsets.len(), 8);
        let labels: Vec<String> = subsets.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec!["{}", "{1}", "{2}", "{3}", "{1,2}", "{1,3}", "{2,3}", "{1,2,3}"]
        );
    }

    #[test]
    fn test_empty_set() {
        let empty = ActionSet::empty();
        assert!(empty.is_empty());
        assert_eq!(empty.cards().count(), 0);
        assert_eq!(empty.label(), "{}");
        assert_eq!(ActionSet::full(0), empty);
    }
}
