//! Rank-aware probabilistic skip list ordered by `(score, member)`.
//!
//! Nodes live in an arena (`Vec` plus a free list) and link to each other
//! by index, so the structure owns its memory outright and `backward`
//! pointers are plain handles rather than aliased references. Each forward
//! edge carries a span: the number of level-0 hops it covers, which is
//! what makes rank queries O(log n). Edges whose forward pointer is none
//! keep their span equal to the distance to the end of the list, so the
//! splice arithmetic never needs to special-case them.
//!
//! The list is not internally synchronized and member uniqueness is the
//! caller's contract; [`ZSet`](crate::zset::ZSet) layers both on top.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

const MAX_LEVEL: usize = 16;
/// 1-in-4 promotion probability per level.
const BRANCHING: u32 = 4;

type NodeId = usize;
/// The header sentinel always occupies arena slot 0.
const HEAD: NodeId = 0;

struct Level {
	forward: Option<NodeId>,
	span: u64,
}

struct Node {
	score: i64,
	member: String,
	backward: Option<NodeId>,
	levels: Vec<Level>,
}

impl Node {
	fn new(member: String, score: i64, height: usize) -> Self {
		Self {
			score,
			member,
			backward: None,
			levels: (0..height)
				.map(|_| Level {
					forward: None,
					span: 0,
				})
				.collect(),
		}
	}

	/// Strict `(score, member)` ordering key.
	fn key(&self) -> (i64, &str) {
		(self.score, self.member.as_str())
	}
}

/// Ordered set index: ascending by score, ties broken by member.
///
/// # Example
///
/// ```
/// use expiring_cache::SkipList;
///
/// let mut list = SkipList::new();
/// list.insert("low", 5);
/// list.insert("high", 75);
/// list.insert("mid", 20);
///
/// assert_eq!(list.rank(5, "low"), Some(1));
/// assert_eq!(list.member_by_rank(3), Some(("high", 75)));
/// ```
pub struct SkipList {
	nodes: Vec<Option<Node>>,
	free: Vec<NodeId>,
	tail: Option<NodeId>,
	len: u64,
	level: usize,
	rng: SmallRng,
}

impl SkipList {
	pub fn new() -> Self {
		Self::with_rng(SmallRng::from_rng(&mut rand::rng()))
	}

	/// Deterministic level sampling, for reproducible structure in tests.
	pub fn with_seed(seed: u64) -> Self {
		Self::with_rng(SmallRng::seed_from_u64(seed))
	}

	fn with_rng(rng: SmallRng) -> Self {
		Self {
			nodes: vec![Some(Node::new(String::new(), 0, MAX_LEVEL))],
			free: Vec::new(),
			tail: None,
			len: 0,
			level: 1,
			rng,
		}
	}

	pub fn len(&self) -> u64 {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Lowest-ranked element, if any.
	pub fn front(&self) -> Option<(&str, i64)> {
		let id = self.node(HEAD).levels[0].forward?;
		let n = self.node(id);
		Some((n.member.as_str(), n.score))
	}

	/// Highest-ranked element, if any.
	pub fn back(&self) -> Option<(&str, i64)> {
		let n = self.node(self.tail?);
		Some((n.member.as_str(), n.score))
	}

	/// Ascending walk over `(member, score)`.
	pub fn iter(&self) -> Iter<'_> {
		Iter {
			list: self,
			cur: self.node(HEAD).levels[0].forward,
		}
	}

	/// Insert a member. The caller guarantees `member` is not already
	/// present under any score; a duplicate insert corrupts rank
	/// accounting.
	pub fn insert(&mut self, member: &str, score: i64) {
		let (mut rank, mut update) = self.find_path(score, member);

		let height = self.random_level();
		if height > self.level {
			// Fresh levels start at the header and span the whole list.
			for i in self.level..height {
				rank[i] = 0;
				update[i] = HEAD;
				self.node_mut(HEAD).levels[i].span = self.len;
			}
			self.level = height;
		}

		let id = self.alloc(Node::new(member.to_string(), score, height));
		for i in 0..height {
			let upd = update[i];
			let (upd_forward, upd_span) = {
				let lvl = &self.node(upd).levels[i];
				(lvl.forward, lvl.span)
			};
			// The new edge covers what the old edge covered past the
			// insertion point; the old edge shrinks to reach the new node.
			{
				let lvl = &mut self.node_mut(id).levels[i];
				lvl.forward = upd_forward;
				lvl.span = upd_span - (rank[0] - rank[i]);
			}
			let lvl = &mut self.node_mut(upd).levels[i];
			lvl.forward = Some(id);
			lvl.span = (rank[0] - rank[i]) + 1;
		}
		// Untouched higher levels gained one covered position.
		for i in height..self.level {
			self.node_mut(update[i]).levels[i].span += 1;
		}

		self.node_mut(id).backward = if update[0] == HEAD { None } else { Some(update[0]) };
		match self.node(id).levels[0].forward {
			Some(next) => self.node_mut(next).backward = Some(id),
			None => self.tail = Some(id),
		}
		self.len += 1;
	}

	/// Remove the node matching `(score, member)` exactly. Returns whether
	/// a node was removed.
	pub fn delete(&mut self, score: i64, member: &str) -> bool {
		let (_, update) = self.find_path(score, member);
		let Some(id) = self.node(update[0]).levels[0].forward else {
			return false;
		};
		if self.node(id).key() != (score, member) {
			return false;
		}
		self.unlink(id, &update);
		self.dealloc(id);
		true
	}

	/// Move `member` from `old_score` to `new_score`. When the node's
	/// position is still valid under the new score it is mutated in place;
	/// otherwise it is deleted and re-inserted. Returns whether the member
	/// was found at `old_score`.
	pub fn update_score(&mut self, member: &str, old_score: i64, new_score: i64) -> bool {
		let (_, update) = self.find_path(old_score, member);
		let Some(id) = self.node(update[0]).levels[0].forward else {
			return false;
		};
		if self.node(id).key() != (old_score, member) {
			return false;
		}

		// In place only when strictly between both structural neighbors;
		// score ties force a reinsert so the member tiebreak re-applies.
		let node = self.node(id);
		let after_prev = match node.backward {
			None => true,
			Some(b) => self.node(b).score < new_score,
		};
		let before_next = match node.levels[0].forward {
			None => true,
			Some(f) => self.node(f).score > new_score,
		};
		if after_prev && before_next {
			self.node_mut(id).score = new_score;
			return true;
		}

		self.unlink(id, &update);
		let node = self.dealloc(id);
		self.insert(&node.member, new_score);
		true
	}

	/// 1-based rank of `(score, member)`, or `None` when absent.
	pub fn rank(&self, score: i64, member: &str) -> Option<u64> {
		let mut rank = 0u64;
		let mut cur = HEAD;
		for i in (0..self.level).rev() {
			loop {
				let node = self.node(cur);
				let Some(next) = node.levels[i].forward else {
					break;
				};
				if self.node(next).key() <= (score, member) {
					rank += node.levels[i].span;
					cur = next;
				} else {
					break;
				}
			}
			if cur != HEAD && self.node(cur).key() == (score, member) {
				return Some(rank);
			}
		}
		None
	}

	/// The element at 1-based `rank`, or `None` when out of range.
	pub fn member_by_rank(&self, rank: u64) -> Option<(&str, i64)> {
		if rank == 0 || rank > self.len {
			return None;
		}
		let mut acc = 0u64;
		let mut cur = HEAD;
		for i in (0..self.level).rev() {
			loop {
				let node = self.node(cur);
				let Some(next) = node.levels[i].forward else {
					break;
				};
				if acc + node.levels[i].span <= rank {
					acc += node.levels[i].span;
					cur = next;
				} else {
					break;
				}
			}
			if acc == rank {
				let n = self.node(cur);
				return Some((n.member.as_str(), n.score));
			}
		}
		None
	}

	/// Walk down from the top level, recording per level the rank advanced
	/// so far and the node where the walk dropped a level. `update[i]` is
	/// the last node strictly before `(score, member)` at level `i`.
	fn find_path(&self, score: i64, member: &str) -> ([u64; MAX_LEVEL], [NodeId; MAX_LEVEL]) {
		let mut rank = [0u64; MAX_LEVEL];
		let mut update = [HEAD; MAX_LEVEL];
		let mut cur = HEAD;
		for i in (0..self.level).rev() {
			rank[i] = if i == self.level - 1 { 0 } else { rank[i + 1] };
			loop {
				let node = self.node(cur);
				let Some(next) = node.levels[i].forward else {
					break;
				};
				if self.node(next).key() < (score, member) {
					rank[i] += node.levels[i].span;
					cur = next;
				} else {
					break;
				}
			}
			update[i] = cur;
		}
		(rank, update)
	}

	/// Splice a node out. `update` must come from `find_path` for this
	/// node's key.
	fn unlink(&mut self, id: NodeId, update: &[NodeId; MAX_LEVEL]) {
		for i in 0..self.level {
			let upd = update[i];
			if self.node(upd).levels[i].forward == Some(id) {
				let (span, forward) = {
					let lvl = &self.node(id).levels[i];
					(lvl.span, lvl.forward)
				};
				let lvl = &mut self.node_mut(upd).levels[i];
				lvl.span = lvl.span + span - 1;
				lvl.forward = forward;
			} else {
				// The node sits below this level; the edge just covers one
				// position less.
				self.node_mut(upd).levels[i].span -= 1;
			}
		}

		let (forward, backward) = {
			let n = self.node(id);
			(n.levels[0].forward, n.backward)
		};
		match forward {
			Some(next) => self.node_mut(next).backward = backward,
			None => self.tail = backward,
		}
		while self.level > 1 && self.node(HEAD).levels[self.level - 1].forward.is_none() {
			self.level -= 1;
		}
		self.len -= 1;
	}

	/// Geometric height: promote with probability 1/4 per level, capped.
	fn random_level(&mut self) -> usize {
		let mut level = 1;
		while self.rng.random::<u32>() & 0xFFFF < 0xFFFF / BRANCHING {
			level += 1;
		}
		level.min(MAX_LEVEL)
	}

	fn alloc(&mut self, node: Node) -> NodeId {
		match self.free.pop() {
			Some(id) => {
				self.nodes[id] = Some(node);
				id
			}
			None => {
				self.nodes.push(Some(node));
				self.nodes.len() - 1
			}
		}
	}

	fn dealloc(&mut self, id: NodeId) -> Node {
		self.free.push(id);
		self.nodes[id].take().expect("deallocated node was already vacant")
	}

	fn node(&self, id: NodeId) -> &Node {
		self.nodes[id].as_ref().expect("node id names a vacant slot")
	}

	fn node_mut(&mut self, id: NodeId) -> &mut Node {
		self.nodes[id].as_mut().expect("node id names a vacant slot")
	}
}

impl Default for SkipList {
	fn default() -> Self {
		Self::new()
	}
}

pub struct Iter<'a> {
	list: &'a SkipList,
	cur: Option<NodeId>,
}

impl<'a> Iterator for Iter<'a> {
	type Item = (&'a str, i64);

	fn next(&mut self) -> Option<Self::Item> {
		let node = self.list.node(self.cur?);
		self.cur = node.levels[0].forward;
		Some((node.member.as_str(), node.score))
	}
}
