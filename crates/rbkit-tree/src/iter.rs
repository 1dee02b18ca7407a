use core::iter::FusedIterator;

use crate::{
  link::{
    Dir,
    NIL,
  },
  tree::RbTree,
};

/// In-order iterator over the keys of an [`RbTree`].
pub struct Iter<'tree, K>
where
  K: Ord,
{
  tree: &'tree RbTree<K>,
  next: u32,
  remaining: usize,
}

impl<'tree, K> Iter<'tree, K>
where
  K: Ord,
{
  pub(crate) fn new(tree: &'tree RbTree<K>) -> Self {
    Self {
      tree,
      next: tree.extreme(tree.root_index(), Dir::Left),
      remaining: tree.len(),
    }
  }
}

impl<'tree, K> Iterator for Iter<'tree, K>
where
  K: Ord,
{
  type Item = &'tree K;

  fn next(&mut self) -> Option<Self::Item> {
    if self.next == NIL {
      return None;
    }

    let current = self.next;
    let node = self.tree.node(current)?;
    self.next = self.tree.step(current, Dir::Right);
    self.remaining = self.remaining.saturating_sub(1);
    Some(&node.key)
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    (self.remaining, Some(self.remaining))
  }
}

impl<K> ExactSizeIterator for Iter<'_, K> where K: Ord {}

impl<K> FusedIterator for Iter<'_, K> where K: Ord {}
