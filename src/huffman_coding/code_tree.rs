use std::cmp::Ordering;

use log::{debug, trace};
use rustc_hash::FxHashMap;

use super::codeword::Codeword;
use crate::error::{Error, Result};

/// What a tree node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A leaf for one alphabet value.
    Value(u8),
    /// The "not yet transmitted" leaf standing in for every unseen value.
    Nyt,
    /// A node with exactly two children.
    Internal,
}

/// One vertex of the code tree. Nodes live in an arena and refer to each other by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub symbol: Symbol,
    /// Occurrence count. Derived from the children for internal nodes, always 0 for NYT.
    pub weight: u64,
    /// Rank used by the sibling property. The root holds `2A - 1`; ranks fall away from it.
    pub position: usize,
    /// Path from the root.
    pub codeword: Codeword,
    parent: Option<usize>,
    /// Indices of the 0-child and the 1-child.
    children: Option<[usize; 2]>,
}

impl Node {
    fn leaf(symbol: Symbol, weight: u64, position: usize, codeword: Codeword, parent: usize) -> Self {
        Node {
            symbol,
            weight,
            position,
            codeword,
            parent: Some(parent),
            children: None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

/// Result of matching a bit path against the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The path ends on this symbol's leaf.
    Matched(u8),
    /// The path ends on the NYT leaf: a raw value follows in the stream.
    MatchedNyt,
    /// The path ends on an internal node: more bits are needed.
    Incomplete,
}

/// Resolution state for one codeword. Start a fresh cursor for every symbol: the tree changes
/// between symbols, so a cursor must never outlive the symbol it was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    node: usize,
    depth: usize,
}

impl Cursor {
    /// Number of bits consumed so far.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

const ROOT: usize = 0;

/// The adaptive code tree shared (by construction, never by transmission) between encoder and
/// decoder.
///
/// Feeding two trees the same symbols in the same order always leaves them identical; nothing
/// but the codec session that owns a tree may call `insert_symbol` on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTree {
    alphabet: usize,
    /// Arena. The root is always at index 0.
    nodes: Vec<Node>,
    /// Leaf index of every value seen so far.
    leaves: FxHashMap<u8, usize>,
    /// Index of the NYT leaf, `None` once every alphabet value has been seen.
    nyt: Option<usize>,
    /// Symbols inserted so far.
    inserted: u64,
    /// Node indices by falling position, as left by the last restoration.
    order: Vec<usize>,
}

impl CodeTree {
    /// Create a tree for an alphabet of `alphabet` values (2..=256). It starts as a single NYT
    /// root.
    pub fn new(alphabet: usize) -> Result<Self> {
        if !(2..=256).contains(&alphabet) {
            return Err(Error::InvalidAlphabet(alphabet));
        }
        let root = Node {
            symbol: Symbol::Nyt,
            weight: 0,
            position: 2 * alphabet - 1,
            codeword: Codeword::root(),
            parent: None,
            children: None,
        };
        Ok(Self {
            alphabet,
            nodes: vec![root],
            leaves: FxHashMap::default(),
            nyt: Some(ROOT),
            inserted: 0,
            order: vec![ROOT],
        })
    }

    pub fn alphabet(&self) -> usize {
        self.alphabet
    }

    /// Number of symbols inserted so far (the root weight).
    pub fn symbols_seen(&self) -> u64 {
        self.inserted
    }

    /// Number of distinct values seen so far.
    pub fn distinct_symbols(&self) -> usize {
        self.leaves.len()
    }

    pub fn root(&self) -> &Node {
        &self.nodes[ROOT]
    }

    /// All nodes, in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    /// The current codeword of `value`, or `None` if it has not been seen yet. In that case the
    /// caller sends the NYT codeword followed by the raw value.
    pub fn codeword_for(&self, value: u8) -> Option<&Codeword> {
        self.leaves.get(&value).map(|&i| &self.nodes[i].codeword)
    }

    /// The current NYT codeword, or `None` once the alphabet is exhausted.
    pub fn nyt_codeword(&self) -> Option<&Codeword> {
        self.nyt.map(|i| &self.nodes[i].codeword)
    }

    /// Account for one more occurrence of `value` and bring the tree back to a state that
    /// satisfies the sibling property.
    pub fn insert_symbol(&mut self, value: u8) -> Result<()> {
        if value as usize >= self.alphabet {
            return Err(Error::SymbolOutOfAlphabet {
                symbol: value,
                alphabet: self.alphabet,
            });
        }
        let leaf = self.leaves.get(&value).copied();
        self.inserted += 1;

        // A repeat only adds 1 along its leaf's path. If no node on that path now outweighs
        // the node ranked just above it, the tree is already in order.
        let swaps = match leaf {
            Some(leaf) if !self.increment_path(leaf) => 0,
            Some(_) => self.restore()?,
            None => {
                self.add_symbol(value)?;
                self.restore()?
            }
        };
        trace!(
            "Inserted {} -> {} ({} swaps, {} nodes)",
            value,
            self.nodes[self.leaves[&value]].codeword,
            swaps,
            self.nodes.len()
        );
        if self.nodes[ROOT].weight != self.inserted {
            return Err(Error::InvariantViolation(format!(
                "root weight {} after {} insertions",
                self.nodes[ROOT].weight, self.inserted
            )));
        }
        Ok(())
    }

    /// First occurrence of `value`: split the NYT leaf, or hand it over to `value` outright when
    /// `value` is the last unseen member of the alphabet.
    fn add_symbol(&mut self, value: u8) -> Result<()> {
        let nyt = self.nyt.ok_or_else(|| {
            Error::InvariantViolation(format!("no NYT leaf left for new symbol {}", value))
        })?;

        if self.leaves.len() + 1 == self.alphabet {
            let node = &mut self.nodes[nyt];
            node.symbol = Symbol::Value(value);
            node.weight = 1;
            self.leaves.insert(value, nyt);
            self.nyt = None;
            debug!("Alphabet exhausted with symbol {}", value);
            return Ok(());
        }

        let (codeword, position) = {
            let node = &self.nodes[nyt];
            (node.codeword.clone(), node.position)
        };
        let one = self.nodes.len();
        let zero = one + 1;
        self.nodes.push(Node::leaf(
            Symbol::Value(value),
            1,
            position - 1,
            codeword.child(true),
            nyt,
        ));
        self.nodes.push(Node::leaf(Symbol::Nyt, 0, position - 2, codeword.child(false), nyt));

        let node = &mut self.nodes[nyt];
        node.symbol = Symbol::Internal;
        node.children = Some([zero, one]);
        self.leaves.insert(value, one);
        self.nyt = Some(zero);
        Ok(())
    }

    /// Swap violating subtrees until the sibling property holds, recomputing weights and
    /// positions after every swap. Returns the number of swaps made.
    fn restore(&mut self) -> Result<usize> {
        let limit = self.nodes.len() * self.nodes.len();
        let mut swaps = 0;
        loop {
            let order = self.level_order();
            self.recompute_weights(&order);
            self.assign_positions(&order);

            let Some((lighter, heavier)) = self.find_violation(&order) else {
                self.order = order;
                return Ok(swaps);
            };
            if swaps >= limit {
                return Err(Error::InvariantViolation(format!(
                    "sibling property not restored after {} swaps",
                    swaps
                )));
            }
            debug!(
                "Swapping {} (weight {}) with {} (weight {})",
                self.nodes[lighter].codeword,
                self.nodes[lighter].weight,
                self.nodes[heavier].codeword,
                self.nodes[heavier].weight
            );
            self.swap_subtrees(lighter, heavier)?;
            swaps += 1;
        }
    }

    /// Add 1 to the weight of `leaf` and every ancestor. Returns true when one of them now
    /// outweighs its predecessor in rank order.
    fn increment_path(&mut self, leaf: usize) -> bool {
        let mut path = Vec::new();
        let mut next = Some(leaf);
        while let Some(i) = next {
            self.nodes[i].weight += 1;
            path.push(i);
            next = self.nodes[i].parent;
        }
        let top = 2 * self.alphabet - 1;
        path.iter().any(|&i| {
            let rank = top - self.nodes[i].position;
            rank > 0 && self.nodes[self.order[rank - 1]].weight < self.nodes[i].weight
        })
    }

    /// Node indices ordered by falling position: level by level from the root, and right to
    /// left (1-child before 0-child) within a level.
    fn level_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        order.push(ROOT);
        let mut next = 0;
        while next < order.len() {
            if let Some([zero, one]) = self.nodes[order[next]].children {
                order.push(one);
                order.push(zero);
            }
            next += 1;
        }
        order
    }

    /// Leaf weights are authoritative; everything else is summed bottom-up.
    fn recompute_weights(&mut self, order: &[usize]) {
        for &i in order.iter().rev() {
            match (self.nodes[i].symbol, self.nodes[i].children) {
                (Symbol::Nyt, _) => self.nodes[i].weight = 0,
                (_, Some([zero, one])) => {
                    self.nodes[i].weight = self.nodes[zero].weight + self.nodes[one].weight
                }
                _ => {}
            }
        }
    }

    fn assign_positions(&mut self, order: &[usize]) {
        let top = 2 * self.alphabet - 1;
        for (rank, &i) in order.iter().enumerate() {
            self.nodes[i].position = top - rank;
        }
    }

    /// Find a pair (lighter, heavier) where the lighter node holds the higher position. Every
    /// node before the first offender is already in falling weight order, so the lighter node
    /// picked is the highest-positioned one the offender outweighs.
    fn find_violation(&self, order: &[usize]) -> Option<(usize, usize)> {
        for i in 2..order.len() {
            let heavier = order[i];
            let weight = self.nodes[heavier].weight;
            if self.nodes[order[i - 1]].weight < weight {
                return order[1..i]
                    .iter()
                    .copied()
                    .find(|&n| self.nodes[n].weight < weight)
                    .map(|lighter| (lighter, heavier));
            }
        }
        None
    }

    /// Exchange the tree locations of two non-root nodes (and with them, their subtrees). Neither
    /// may be an ancestor of the other.
    fn swap_subtrees(&mut self, a: usize, b: usize) -> Result<()> {
        let (pa, sa) = self.parent_slot(a)?;
        let (pb, sb) = self.parent_slot(b)?;
        self.set_child(pa, sa, b);
        self.set_child(pb, sb, a);
        self.nodes[a].parent = Some(pb);
        self.nodes[b].parent = Some(pa);
        self.relabel_subtree(a);
        self.relabel_subtree(b);
        Ok(())
    }

    fn parent_slot(&self, i: usize) -> Result<(usize, usize)> {
        let parent = self.nodes[i]
            .parent
            .ok_or_else(|| Error::InvariantViolation("attempt to move the root".to_string()))?;
        match self.nodes[parent].children {
            Some([zero, _]) if zero == i => Ok((parent, 0)),
            Some([_, one]) if one == i => Ok((parent, 1)),
            _ => Err(Error::InvariantViolation(format!(
                "node {} is not a child of its parent {}",
                i, parent
            ))),
        }
    }

    fn set_child(&mut self, parent: usize, slot: usize, child: usize) {
        if let Some(children) = self.nodes[parent].children.as_mut() {
            children[slot] = child;
        }
    }

    /// Rebuild the codewords below (and including) `top` from its parent's codeword.
    fn relabel_subtree(&mut self, top: usize) {
        let mut stack = vec![top];
        while let Some(i) = stack.pop() {
            if let Some(parent) = self.nodes[i].parent {
                let bit = matches!(self.nodes[parent].children, Some([_, one]) if one == i);
                self.nodes[i].codeword = self.nodes[parent].codeword.child(bit);
            }
            if let Some(children) = self.nodes[i].children {
                stack.extend(children);
            }
        }
    }

    fn classify(&self, i: usize) -> Resolution {
        match self.nodes[i].symbol {
            Symbol::Value(v) => Resolution::Matched(v),
            Symbol::Nyt => Resolution::MatchedNyt,
            Symbol::Internal => Resolution::Incomplete,
        }
    }

    /// A fresh cursor at the root, for resolving one codeword bit by bit.
    pub fn cursor(&self) -> Cursor {
        Cursor { node: ROOT, depth: 0 }
    }

    /// What the cursor points at right now.
    pub fn current(&self, cursor: &Cursor) -> Resolution {
        self.classify(cursor.node)
    }

    /// Follow one more bit from the cursor.
    pub fn step(&self, cursor: &mut Cursor, bit: bool) -> Result<Resolution> {
        let children = self.nodes[cursor.node].children.ok_or_else(|| {
            Error::InvalidCodeword(format!(
                "{}{} runs past a leaf",
                self.nodes[cursor.node].codeword,
                bit as u8
            ))
        })?;
        cursor.node = children[bit as usize];
        cursor.depth += 1;
        Ok(self.classify(cursor.node))
    }

    /// Resolve a whole bit sequence from the root.
    pub fn resolve(&self, bits: &[bool]) -> Result<Resolution> {
        let mut cursor = self.cursor();
        let mut resolution = self.current(&cursor);
        for &bit in bits {
            resolution = self.step(&mut cursor, bit)?;
        }
        Ok(resolution)
    }

    /// Check every structural invariant: strict binary shape, codewords matching tree paths,
    /// prefix-free leaves, weight consistency and the sibling property.
    pub fn verify(&self) -> Result<()> {
        let fail = |msg: String| Err(Error::InvariantViolation(msg));

        let order = self.level_order();
        if order.len() != self.nodes.len() {
            return fail(format!(
                "{} nodes reachable from the root, {} allocated",
                order.len(),
                self.nodes.len()
            ));
        }

        for &i in &order {
            let node = &self.nodes[i];
            match (node.symbol, node.children) {
                (Symbol::Internal, Some([zero, one])) => {
                    for (bit, child) in [(false, zero), (true, one)] {
                        if self.nodes[child].parent != Some(i) {
                            return fail(format!("child {} does not point back to {}", child, i));
                        }
                        if self.nodes[child].codeword != node.codeword.child(bit) {
                            return fail(format!(
                                "codeword {} under {}",
                                self.nodes[child].codeword, node.codeword
                            ));
                        }
                    }
                    let sum = self.nodes[zero].weight + self.nodes[one].weight;
                    if node.weight != sum {
                        return fail(format!(
                            "node {} weighs {}, children sum to {}",
                            node.codeword, node.weight, sum
                        ));
                    }
                }
                (Symbol::Internal, None) => {
                    return fail(format!("internal node {} has no children", node.codeword))
                }
                (_, Some(_)) => return fail(format!("leaf {} has children", node.codeword)),
                (Symbol::Nyt, None) if node.weight != 0 => {
                    return fail(format!("NYT weighs {}", node.weight))
                }
                _ => {}
            }
        }

        if self.nodes[ROOT].weight != self.inserted {
            return fail(format!(
                "root weighs {} after {} insertions",
                self.nodes[ROOT].weight, self.inserted
            ));
        }

        let mut leaves: Vec<&Codeword> = self
            .nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| &n.codeword)
            .collect();
        leaves.sort_by(|a, b| a.as_slice().cmp(b.as_slice()));
        for pair in leaves.windows(2) {
            if pair[1].starts_with(pair[0]) {
                return fail(format!("{} is a prefix of {}", pair[0], pair[1]));
            }
        }

        // Positions must run down from 2A - 1 without gaps, in codeword rank order.
        let top = 2 * self.alphabet - 1;
        let mut by_position: Vec<&Node> = self.nodes.iter().collect();
        by_position.sort_by(|a, b| b.position.cmp(&a.position));
        for (rank, node) in by_position.iter().enumerate() {
            if node.position + rank != top {
                return fail(format!(
                    "position {} of {} out of sequence",
                    node.position, node.codeword
                ));
            }
        }
        for pair in by_position.windows(2) {
            let (hi, lo) = (pair[0], pair[1]);
            if hi.codeword.rank_cmp(&lo.codeword) != Ordering::Less {
                return fail(format!(
                    "{} (position {}) ranked above {} (position {})",
                    hi.codeword, hi.position, lo.codeword, lo.position
                ));
            }
            if hi.weight < lo.weight {
                return fail(format!(
                    "sibling property: {} (weight {}) ranks above {} (weight {})",
                    hi.codeword, hi.weight, lo.codeword, lo.weight
                ));
            }
        }

        if self.nyt.is_some() == (self.leaves.len() == self.alphabet) {
            return fail("NYT presence does not match alphabet usage".to_string());
        }
        Ok(())
    }
}
