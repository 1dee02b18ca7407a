#![cfg_attr(not(test), no_std)]

use getset::CopyGetters;
use rbkit_arena::{
  ArenaConfig,
  ArenaError,
  Handle,
};

mod iter;
mod link;
mod tree;
mod validate;

pub use iter::Iter;
pub use link::Color;
pub use tree::RbTree;
pub use validate::RbViolation;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RbError {
  Arena(ArenaError),
  /// The reference is the sentinel, belongs to another tree, or points at a
  /// node that has since been erased.
  InvalidRef,
}

pub type RbResult<T> = Result<T, RbError>;

/// Borrowed view of one node (or of the sentinel) of a particular tree.
///
/// It stays usable across mutations, but every operation re-checks it: once
/// the node is erased the reference is rejected instead of resolving to a
/// recycled slot.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, CopyGetters)]
pub struct NodeRef {
  #[getset(get_copy = "pub")]
  tree: u64,
  handle: Option<Handle>,
}

impl NodeRef {
  pub(crate) const fn new(tree: u64, handle: Option<Handle>) -> Self {
    Self { tree, handle }
  }

  /// True for the sentinel, i.e. "no element".
  #[inline(always)]
  pub const fn is_nil(&self) -> bool {
    self.handle.is_none()
  }

  pub const fn handle(&self) -> Option<Handle> {
    self.handle
  }
}

#[derive(Debug, Clone, Copy, Default, CopyGetters)]
pub struct TreeConfig {
  #[getset(get_copy = "pub")]
  arena: ArenaConfig,
}

impl TreeConfig {
  pub const fn new() -> Self {
    Self {
      arena: ArenaConfig::new(),
    }
  }

  /// Caps the number of keys the tree may hold; inserts past it fail with
  /// `ArenaError::Exhausted`.
  pub const fn with_limit(mut self, limit: usize) -> Self {
    self.arena = self.arena.with_limit(limit);
    self
  }

  pub const fn with_reserve(mut self, reserve: usize) -> Self {
    self.arena = self.arena.with_reserve(reserve);
    self
  }
}

pub mod prelude {
  pub use super::{
    Color,
    Iter,
    NodeRef,
    RbError,
    RbResult,
    RbTree,
    RbViolation,
    TreeConfig,
  };
}

#[cfg(test)]
mod tests;
