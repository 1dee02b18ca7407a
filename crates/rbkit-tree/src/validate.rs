use crate::{
  link::{
    Color,
    Dir,
    NIL,
  },
  tree::RbTree,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RbViolation {
  RootHasParent,
  RootNotBlack,
  SentinelNotBlack,
  /// A child's parent link does not point back at the node holding it.
  BrokenParentLink { node: u32 },
  RedRed { node: u32 },
  BlackHeight { node: u32, left: usize, right: usize },
  OutOfOrder,
  Count { reachable: usize, len: usize },
}

impl<K> RbTree<K>
where
  K: Ord,
{
  /// Checks every structural and coloring invariant and returns the black
  /// height of the tree (the sentinel does not count).
  pub fn validate(&self) -> Result<usize, RbViolation> {
    if self.nil_link().color() != Color::Black {
      return Err(RbViolation::SentinelNotBlack);
    }

    let root = self.root_index();
    if root == NIL {
      return match self.len() {
        0 => Ok(0),
        len => Err(RbViolation::Count { reachable: 0, len }),
      };
    }

    if self.parent(root) != NIL {
      return Err(RbViolation::RootHasParent);
    }
    if self.color_at(root) != Color::Black {
      return Err(RbViolation::RootNotBlack);
    }

    let mut reachable = 0;
    let height = self.black_height(root, &mut reachable)?;
    if reachable != self.len() {
      return Err(RbViolation::Count {
        reachable,
        len: self.len(),
      });
    }

    let mut keys = self.iter();
    if let Some(mut prev) = keys.next() {
      for key in keys {
        if prev > key {
          return Err(RbViolation::OutOfOrder);
        }
        prev = key;
      }
    }

    Ok(height)
  }

  fn black_height(&self, node: u32, reachable: &mut usize) -> Result<usize, RbViolation> {
    if node == NIL {
      return Ok(0);
    }
    *reachable += 1;

    let color = self.color_at(node);
    let mut heights = [0; 2];
    for (slot, dir) in heights.iter_mut().zip([Dir::Left, Dir::Right]) {
      let child = self.child(node, dir);
      if child == NIL {
        continue;
      }
      if self.parent(child) != node {
        return Err(RbViolation::BrokenParentLink { node: child });
      }
      if color == Color::Red && self.color_at(child) == Color::Red {
        return Err(RbViolation::RedRed { node: child });
      }
      *slot = self.black_height(child, reachable)?;
    }

    let [left, right] = heights;
    if left != right {
      return Err(RbViolation::BlackHeight { node, left, right });
    }

    Ok(left + usize::from(color == Color::Black))
  }
}
