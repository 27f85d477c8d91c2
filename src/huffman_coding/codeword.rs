use std::{cmp::Ordering, fmt};

/// The path from the root of the code tree to a node, one bit per edge (`false` = 0-child,
/// `true` = 1-child). The root's codeword is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Codeword(Vec<bool>);

impl Codeword {
    /// The empty codeword of the root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Codeword of this node's child on the `bit` edge.
    pub fn child(&self, bit: bool) -> Self {
        let mut bits = Vec::with_capacity(self.0.len() + 1);
        bits.extend_from_slice(&self.0);
        bits.push(bit);
        Self(bits)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Bits from the root side down.
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn starts_with(&self, prefix: &Codeword) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// Rank order of two nodes: the shorter codeword first, and among equal lengths the larger
    /// binary value first. A level-order walk from the root (1-child before 0-child) visits
    /// nodes in exactly this order, so positions fall along it.
    pub fn rank_cmp(&self, other: &Codeword) -> Ordering {
        self.len()
            .cmp(&other.len())
            .then_with(|| other.0.cmp(&self.0))
    }
}

impl fmt::Display for Codeword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "\u{3b5}");
        }
        self.0
            .iter()
            .try_for_each(|&bit| write!(f, "{}", if bit { '1' } else { '0' }))
    }
}
