//! Quick action deck — a shuffled set of tiny standalone actions for when
//! the user doesn't want to describe anything at all.

use rand::seq::SliceRandom;
use rand::Rng;

const QUICK_ACTIONS: [&str; 10] = [
    "Drink a glass of water.",
    "Stretch your arms overhead.",
    "Put away exactly one item.",
    "Take three deep breaths.",
    "Open a window for fresh air.",
    "Write down one thought.",
    "Stand up and shake your hands.",
    "Check your posture.",
    "Look at something 20 feet away.",
    "Rub your hands together for warmth.",
];

/// A deck shuffled once on creation; `skip` cycles through it forever.
#[derive(Debug, Clone)]
pub struct QuickDeck {
    cards: Vec<&'static str>,
    index: usize,
}

impl QuickDeck {
    /// Shuffle a fresh deck with the given RNG.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut cards = QUICK_ACTIONS.to_vec();
        cards.shuffle(rng);
        Self { cards, index: 0 }
    }

    pub fn current(&self) -> &'static str {
        self.cards[self.index]
    }

    /// Advance to the next card, wrapping at the end.
    pub fn skip(&mut self) -> &'static str {
        self.index = (self.index + 1) % self.cards.len();
        self.current()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
