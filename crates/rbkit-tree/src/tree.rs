use core::{
  cmp::Ordering as CmpOrdering,
  sync::atomic::{
    AtomicU64,
    Ordering,
  },
};

use log::{
  debug,
  trace,
  warn,
};
use rbkit_arena::{
  Arena,
  ArenaStats,
};

use crate::{
  NodeRef,
  RbError,
  RbResult,
  TreeConfig,
  iter::Iter,
  link::{
    Color,
    Dir,
    NIL,
    Node,
    RbLink,
  },
};

/// Tree identity tags. 64-bit, never handed out twice in one process.
static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// Red-black tree over a single ordered key.
///
/// Nodes live in an arena and link to each other by slot index. The sentinel
/// is not stored in the arena: index [`NIL`] resolves to `nil`, a permanently
/// black link record that doubles as every leaf and as the root's parent.
pub struct RbTree<K> {
  id: u64,
  nodes: Arena<Node<K>>,
  nil: RbLink,
  root: u32,
}

impl<K> RbTree<K>
where
  K: Ord,
{
  pub fn new() -> Self {
    Self::from_arena(Arena::new())
  }

  /// Alias of [`RbTree::new`].
  pub fn create() -> Self {
    Self::new()
  }

  pub fn with_config(config: TreeConfig) -> RbResult<Self> {
    let nodes = Arena::with_config(config.arena()).map_err(RbError::Arena)?;
    Ok(Self::from_arena(nodes))
  }

  fn from_arena(nodes: Arena<Node<K>>) -> Self {
    let id = NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed);
    debug!("created red-black tree {id}");
    Self {
      id,
      nodes,
      nil: RbLink::sentinel(),
      root: NIL,
    }
  }

  #[inline(always)]
  pub fn id(&self) -> u64 {
    self.id
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.root == NIL
  }

  pub fn stats(&self) -> ArenaStats {
    self.nodes.stats()
  }

  pub fn root(&self) -> NodeRef {
    self.node_ref(self.root)
  }

  pub fn nil(&self) -> NodeRef {
    NodeRef::new(self.id, None)
  }

  pub(crate) fn root_index(&self) -> u32 {
    self.root
  }

  pub(crate) fn nil_link(&self) -> &RbLink {
    &self.nil
  }

  pub(crate) fn node_ref(&self, index: u32) -> NodeRef {
    NodeRef::new(self.id, self.nodes.handle_at(index))
  }

  pub(crate) fn node(&self, index: u32) -> Option<&Node<K>> {
    self.nodes.get_index(index)
  }

  pub(crate) fn link(&self, index: u32) -> &RbLink {
    match self.nodes.get_index(index) {
      Some(node) => &node.link,
      None => &self.nil,
    }
  }

  fn link_mut(&mut self, index: u32) -> &mut RbLink {
    match self.nodes.get_index_mut(index) {
      Some(node) => &mut node.link,
      None => &mut self.nil,
    }
  }

  #[inline(always)]
  pub(crate) fn parent(&self, index: u32) -> u32 {
    self.link(index).parent()
  }

  #[inline(always)]
  pub(crate) fn child(&self, index: u32, dir: Dir) -> u32 {
    self.link(index).child(dir)
  }

  #[inline(always)]
  pub(crate) fn color_at(&self, index: u32) -> Color {
    self.link(index).color()
  }

  #[inline(always)]
  fn set_parent(&mut self, index: u32, parent: u32) {
    self.link_mut(index).set_parent(parent);
  }

  #[inline(always)]
  fn set_child(&mut self, index: u32, dir: Dir, child: u32) {
    self.link_mut(index).set_child(dir, child);
  }

  #[inline(always)]
  fn set_color(&mut self, index: u32, color: Color) {
    self.link_mut(index).set_color(color);
  }

  /// Which side of its parent `index` hangs on.
  fn side_of(&self, index: u32, parent: u32) -> Dir {
    if self.child(parent, Dir::Left) == index {
      Dir::Left
    } else {
      Dir::Right
    }
  }

  fn resolve(&self, node: NodeRef) -> RbResult<u32> {
    if node.tree() != self.id {
      return Err(RbError::InvalidRef);
    }
    let handle = node.handle().ok_or(RbError::InvalidRef)?;
    if !self.nodes.contains(handle) {
      return Err(RbError::InvalidRef);
    }
    Ok(handle.index())
  }

  pub fn key(&self, node: NodeRef) -> Option<&K> {
    let index = self.resolve(node).ok()?;
    self.node(index).map(|node| &node.key)
  }

  /// Color of a node of this tree. The sentinel reports black.
  pub fn color(&self, node: NodeRef) -> Option<Color> {
    if node.tree() == self.id && node.is_nil() {
      return Some(Color::Black);
    }
    let index = self.resolve(node).ok()?;
    Some(self.color_at(index))
  }

  /// Points `parent`'s link that held `old` at `new`, or makes `new` the root.
  fn replace_child(&mut self, parent: u32, old: u32, new: u32) {
    if parent == NIL {
      self.root = new;
    } else {
      let side = self.side_of(old, parent);
      self.set_child(parent, side, new);
    }
  }

  /// Rotates `x` down towards `dir`; its child on the other side takes its
  /// place. `Dir::Left` is the classic left rotation.
  fn rotate(&mut self, x: u32, dir: Dir) {
    let y = self.child(x, dir.opposite());
    let inner = self.child(y, dir);

    self.set_child(x, dir.opposite(), inner);
    if inner != NIL {
      self.set_parent(inner, x);
    }

    let parent = self.parent(x);
    self.set_parent(y, parent);
    self.replace_child(parent, x, y);

    self.set_child(y, dir, x);
    self.set_parent(x, y);
  }

  /// Puts `v` where `u` was. `v` may be the sentinel, whose parent is then
  /// written as well; erase-fixup reads it back.
  fn transplant(&mut self, u: u32, v: u32) {
    let parent = self.parent(u);
    self.replace_child(parent, u, v);
    self.set_parent(v, parent);
  }

  pub(crate) fn extreme(&self, from: u32, dir: Dir) -> u32 {
    let mut current = from;
    if current == NIL {
      return NIL;
    }
    loop {
      let next = self.child(current, dir);
      if next == NIL {
        return current;
      }
      current = next;
    }
  }

  /// In-order neighbour of `index`: successor for `Dir::Right`, predecessor
  /// for `Dir::Left`.
  pub(crate) fn step(&self, index: u32, dir: Dir) -> u32 {
    let child = self.child(index, dir);
    if child != NIL {
      return self.extreme(child, dir.opposite());
    }

    let mut current = index;
    let mut parent = self.parent(current);
    while parent != NIL && self.child(parent, dir) == current {
      current = parent;
      parent = self.parent(parent);
    }
    parent
  }

  pub fn find(&self, key: &K) -> Option<NodeRef> {
    let mut current = self.root;
    while let Some(node) = self.node(current) {
      current = match key.cmp(&node.key) {
        CmpOrdering::Less => node.link.child(Dir::Left),
        CmpOrdering::Greater => node.link.child(Dir::Right),
        CmpOrdering::Equal => return Some(self.node_ref(current)),
      };
    }
    None
  }

  pub fn contains(&self, key: &K) -> bool {
    self.find(key).is_some()
  }

  /// Smallest node, or the sentinel ref when the tree is empty.
  pub fn min(&self) -> NodeRef {
    self.node_ref(self.extreme(self.root, Dir::Left))
  }

  /// Largest node, or the sentinel ref when the tree is empty.
  pub fn max(&self) -> NodeRef {
    self.node_ref(self.extreme(self.root, Dir::Right))
  }

  pub fn successor(&self, node: NodeRef) -> RbResult<NodeRef> {
    let index = self.resolve(node)?;
    Ok(self.node_ref(self.step(index, Dir::Right)))
  }

  pub fn predecessor(&self, node: NodeRef) -> RbResult<NodeRef> {
    let index = self.resolve(node)?;
    Ok(self.node_ref(self.step(index, Dir::Left)))
  }

  /// Inserts `key` and returns a reference to its node. Equal keys are kept;
  /// a duplicate lands after the existing ones in order.
  ///
  /// Nothing is linked until the node has been allocated, so an allocation
  /// failure leaves the tree as it was.
  pub fn insert(&mut self, key: K) -> RbResult<NodeRef> {
    let mut parent = NIL;
    let mut dir = Dir::Left;
    let mut current = self.root;
    while let Some(node) = self.node(current) {
      parent = current;
      dir = if key < node.key { Dir::Left } else { Dir::Right };
      current = node.link.child(dir);
    }

    let handle = self
      .nodes
      .alloc(Node::new(key, parent))
      .map_err(RbError::Arena)?;
    let z = handle.index();

    if parent == NIL {
      self.root = z;
    } else {
      self.set_child(parent, dir, z);
    }

    self.insert_fixup(z);
    Ok(NodeRef::new(self.id, Some(handle)))
  }

  fn insert_fixup(&mut self, mut z: u32) {
    while self.color_at(self.parent(z)) == Color::Red {
      let parent = self.parent(z);
      let grand = self.parent(parent);
      let side = self.side_of(parent, grand);
      let uncle = self.child(grand, side.opposite());

      if self.color_at(uncle) == Color::Red {
        self.set_color(parent, Color::Black);
        self.set_color(uncle, Color::Black);
        self.set_color(grand, Color::Red);
        z = grand;
        continue;
      }

      if z == self.child(parent, side.opposite()) {
        z = parent;
        self.rotate(z, side);
      }

      let parent = self.parent(z);
      let grand = self.parent(parent);
      self.set_color(parent, Color::Black);
      self.set_color(grand, Color::Red);
      self.rotate(grand, side.opposite());
    }

    let root = self.root;
    self.set_color(root, Color::Black);
  }

  /// Removes the node behind `node` and returns its key.
  ///
  /// Sentinel refs, refs from another tree and refs to already erased nodes
  /// are rejected with [`RbError::InvalidRef`] and leave the tree untouched.
  pub fn erase(&mut self, node: NodeRef) -> RbResult<K> {
    let z = self.resolve(node)?;
    let handle = node.handle().ok_or(RbError::InvalidRef)?;

    let left = self.child(z, Dir::Left);
    let right = self.child(z, Dir::Right);
    let mut removed_color = self.color_at(z);
    let x;

    if left == NIL {
      x = right;
      self.transplant(z, right);
    } else if right == NIL {
      x = left;
      self.transplant(z, left);
    } else {
      let s = self.extreme(right, Dir::Left);
      removed_color = self.color_at(s);
      x = self.child(s, Dir::Right);

      if self.parent(s) == z {
        self.set_parent(x, s);
      } else {
        self.transplant(s, x);
        self.set_child(s, Dir::Right, right);
        self.set_parent(right, s);
      }

      self.transplant(z, s);
      self.set_child(s, Dir::Left, left);
      self.set_parent(left, s);
      let color = self.color_at(z);
      self.set_color(s, color);
    }

    let removed = self.nodes.free(handle).map_err(RbError::Arena)?;

    if removed_color == Color::Black {
      self.erase_fixup(x);
    }

    self.nil = RbLink::sentinel();
    Ok(removed.key)
  }

  fn erase_fixup(&mut self, mut x: u32) {
    while x != self.root && self.color_at(x) == Color::Black {
      let parent = self.parent(x);
      let side = self.side_of(x, parent);
      let far = side.opposite();
      let mut bro = self.child(parent, far);

      if self.color_at(bro) == Color::Red {
        self.set_color(bro, Color::Black);
        self.set_color(parent, Color::Red);
        self.rotate(parent, side);
        bro = self.child(parent, far);
      }

      let near_child = self.child(bro, side);
      let far_child = self.child(bro, far);
      if self.color_at(near_child) == Color::Black && self.color_at(far_child) == Color::Black {
        self.set_color(bro, Color::Red);
        x = parent;
        continue;
      }

      if self.color_at(far_child) == Color::Black {
        self.set_color(near_child, Color::Black);
        self.set_color(bro, Color::Red);
        self.rotate(bro, far);
        bro = self.child(parent, far);
      }

      let color = self.color_at(parent);
      self.set_color(bro, color);
      self.set_color(parent, Color::Black);
      let far_child = self.child(bro, far);
      self.set_color(far_child, Color::Black);
      self.rotate(parent, side);
      x = self.root;
    }

    self.set_color(x, Color::Black);
  }

  /// Finds `key` and erases the first node holding it.
  pub fn remove(&mut self, key: &K) -> RbResult<Option<K>> {
    match self.find(key) {
      Some(node) => self.erase(node).map(Some),
      None => Ok(None),
    }
  }

  pub fn iter(&self) -> Iter<'_, K> {
    Iter::new(self)
  }

  /// Copies keys in ascending order into `buf`, at most `buf.len()` of them,
  /// and returns the number of keys in the tree. A return value larger than
  /// `buf.len()` means the output was truncated.
  pub fn to_array(&self, buf: &mut [K]) -> usize
  where
    K: Copy,
  {
    for (slot, key) in buf.iter_mut().zip(self.iter()) {
      *slot = *key;
    }
    self.len()
  }

  /// Releases every node children-first, handing each key to `visit` in the
  /// order it is freed.
  fn release_nodes<F>(&mut self, mut visit: F) -> usize
  where
    F: FnMut(K),
  {
    let mut released = 0;
    let mut current = self.root;

    while current != NIL {
      let left = self.child(current, Dir::Left);
      if left != NIL {
        current = left;
        continue;
      }
      let right = self.child(current, Dir::Right);
      if right != NIL {
        current = right;
        continue;
      }

      let parent = self.parent(current);
      if parent != NIL {
        let side = self.side_of(current, parent);
        self.set_child(parent, side, NIL);
      }

      let Some(handle) = self.nodes.handle_at(current) else {
        warn!("tree {} links to vacant slot {current}", self.id);
        debug_assert!(false, "linked node {current} has no live slot");
        break;
      };
      match self.nodes.free(handle) {
        Ok(node) => {
          trace!("tree {} released node {}", self.id, handle.index());
          visit(node.key);
          released += 1;
        }
        Err(err) => {
          warn!("tree {} failed to release node {}: {err:?}", self.id, handle.index());
          debug_assert!(false, "release of a live node failed: {err:?}");
        }
      }
      current = parent;
    }

    self.root = NIL;
    self.nil = RbLink::sentinel();
    released
  }

  /// Erases everything. Outstanding node refs go stale.
  pub fn clear(&mut self) {
    let released = self.release_nodes(|_| {});
    debug!("cleared tree {}: {released} nodes", self.id);
  }

  /// Tears the tree down and returns the number of released allocations:
  /// one per node plus the sentinel.
  pub fn destroy(self) -> usize {
    self.destroy_with(|_| {})
  }

  /// Like [`RbTree::destroy`], passing every key to `visit` as its node is
  /// freed. Children are always freed before their parent.
  pub fn destroy_with<F>(mut self, visit: F) -> usize
  where
    F: FnMut(K),
  {
    let nodes = self.release_nodes(visit);
    debug!("destroyed tree {}: {nodes} nodes and the sentinel", self.id);
    nodes + 1
  }
}

impl<K> Default for RbTree<K>
where
  K: Ord,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<'tree, K> IntoIterator for &'tree RbTree<K>
where
  K: Ord,
{
  type Item = &'tree K;
  type IntoIter = Iter<'tree, K>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}
