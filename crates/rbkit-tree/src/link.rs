use getset::{
  CopyGetters,
  Setters,
};

/// Reserved index of the sentinel. The arena never hands it out.
pub const NIL: u32 = u32::MAX;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum Color {
  #[default]
  Red,
  Black,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Dir {
  Left,
  Right,
}

impl Dir {
  #[inline(always)]
  pub const fn opposite(self) -> Self {
    match self {
      Dir::Left => Dir::Right,
      Dir::Right => Dir::Left,
    }
  }
}

#[derive(Debug, Clone, Copy, CopyGetters, Setters)]
pub(crate) struct RbLink {
  #[getset(get_copy = "pub", set = "pub")]
  parent: u32,
  left: u32,
  right: u32,
  #[getset(get_copy = "pub", set = "pub")]
  color: Color,
}

impl RbLink {
  pub const fn new(parent: u32, color: Color) -> Self {
    Self {
      parent,
      left: NIL,
      right: NIL,
      color,
    }
  }

  pub const fn sentinel() -> Self {
    Self::new(NIL, Color::Black)
  }

  #[inline(always)]
  pub const fn child(&self, dir: Dir) -> u32 {
    match dir {
      Dir::Left => self.left,
      Dir::Right => self.right,
    }
  }

  #[inline(always)]
  pub fn set_child(&mut self, dir: Dir, index: u32) {
    match dir {
      Dir::Left => self.left = index,
      Dir::Right => self.right = index,
    }
  }
}

pub(crate) struct Node<K> {
  pub key: K,
  pub link: RbLink,
}

impl<K> Node<K> {
  pub const fn new(key: K, parent: u32) -> Self {
    Self {
      key,
      link: RbLink::new(parent, Color::Red),
    }
  }
}
