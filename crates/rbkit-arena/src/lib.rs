#![cfg_attr(not(test), no_std)]

extern crate alloc;

use alloc::vec::Vec;
use core::mem;

use getset::CopyGetters;
use log::debug;

/// Largest slot index an arena hands out. `u32::MAX` stays free so callers
/// can use it as a reserved "no slot" marker.
pub const MAX_INDEX: u32 = u32::MAX - 1;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ArenaError {
  OutOfMemory,
  Exhausted { limit: usize },
  Stale(Handle),
}

pub type ArenaResult<T> = Result<T, ArenaError>;

/// Stable reference to one occupied slot.
///
/// The generation is bumped every time the slot is released, so a handle
/// kept past `free` never resolves to whatever reuses the slot later. A slot
/// whose generation is exhausted is retired instead of being reused.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, CopyGetters)]
pub struct Handle {
  #[getset(get_copy = "pub")]
  index: u32,
  #[getset(get_copy = "pub")]
  generation: u32,
}

#[derive(Debug, Clone, Copy, Default, CopyGetters)]
pub struct ArenaConfig {
  #[getset(get_copy = "pub")]
  limit: Option<usize>,
  #[getset(get_copy = "pub")]
  reserve: usize,
}

impl ArenaConfig {
  pub const fn new() -> Self {
    Self {
      limit: None,
      reserve: 0,
    }
  }

  /// Caps the number of live slots.
  pub const fn with_limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  pub const fn with_reserve(mut self, reserve: usize) -> Self {
    self.reserve = reserve;
    self
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, CopyGetters)]
pub struct ArenaStats {
  #[getset(get_copy = "pub")]
  allocated: usize,
  #[getset(get_copy = "pub")]
  released: usize,
}

impl ArenaStats {
  pub const fn live(&self) -> usize {
    self.allocated - self.released
  }
}

enum Slot<T> {
  Occupied { generation: u32, value: T },
  Vacant { generation: u32, next: Option<u32> },
  Retired,
}

pub struct Arena<T> {
  slots: Vec<Slot<T>>,
  free: Option<u32>,
  len: usize,
  config: ArenaConfig,
  stats: ArenaStats,
}

impl<T> Arena<T> {
  pub const fn new() -> Self {
    Self {
      slots: Vec::new(),
      free: None,
      len: 0,
      config: ArenaConfig::new(),
      stats: ArenaStats {
        allocated: 0,
        released: 0,
      },
    }
  }

  pub fn with_config(config: ArenaConfig) -> ArenaResult<Self> {
    let mut slots = Vec::new();
    let reserve = match config.limit {
      Some(limit) => config.reserve.min(limit),
      None => config.reserve,
    };
    slots
      .try_reserve_exact(reserve)
      .map_err(|_| ArenaError::OutOfMemory)?;

    Ok(Self {
      slots,
      free: None,
      len: 0,
      config,
      stats: ArenaStats::default(),
    })
  }

  #[inline(always)]
  pub fn len(&self) -> usize {
    self.len
  }

  #[inline(always)]
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn stats(&self) -> ArenaStats {
    self.stats
  }

  fn check_limit(&self) -> ArenaResult<()> {
    if let Some(limit) = self.config.limit {
      if self.len >= limit {
        debug!("arena limit of {limit} slots reached");
        return Err(ArenaError::Exhausted { limit });
      }
    }
    Ok(())
  }

  fn reuse(&mut self, value: T) -> Result<Handle, T> {
    let Some(index) = self.free else {
      return Err(value);
    };

    let slot = &mut self.slots[index as usize];
    let Slot::Vacant { generation, next } = *slot else {
      return Err(value);
    };

    *slot = Slot::Occupied { generation, value };
    self.free = next;
    Ok(Handle { index, generation })
  }

  fn append(&mut self, value: T) -> ArenaResult<Handle> {
    let index = self.slots.len();
    if index > MAX_INDEX as usize {
      return Err(ArenaError::Exhausted {
        limit: MAX_INDEX as usize + 1,
      });
    }

    self
      .slots
      .try_reserve(1)
      .map_err(|_| ArenaError::OutOfMemory)?;
    self.slots.push(Slot::Occupied {
      generation: 0,
      value,
    });

    Ok(Handle {
      index: index as u32,
      generation: 0,
    })
  }

  /// Stores `value`, reusing the most recently released slot if there is one.
  ///
  /// On error the arena is left exactly as it was.
  pub fn alloc(&mut self, value: T) -> ArenaResult<Handle> {
    self.check_limit()?;

    let handle = match self.reuse(value) {
      Ok(handle) => handle,
      Err(value) => self.append(value)?,
    };

    self.len += 1;
    self.stats.allocated += 1;
    Ok(handle)
  }

  pub fn free(&mut self, handle: Handle) -> ArenaResult<T> {
    if !self.contains(handle) {
      return Err(ArenaError::Stale(handle));
    }

    let released = match handle.generation.checked_add(1) {
      Some(generation) => Slot::Vacant {
        generation,
        next: self.free,
      },
      None => {
        debug!("arena slot {} retired", handle.index);
        Slot::Retired
      }
    };
    let reusable = matches!(released, Slot::Vacant { .. });
    let Slot::Occupied { value, .. } = mem::replace(&mut self.slots[handle.index as usize], released)
    else {
      return Err(ArenaError::Stale(handle));
    };

    if reusable {
      self.free = Some(handle.index);
    }
    self.len -= 1;
    self.stats.released += 1;
    Ok(value)
  }

  pub fn contains(&self, handle: Handle) -> bool {
    matches!(
      self.slots.get(handle.index as usize),
      Some(Slot::Occupied { generation, .. }) if *generation == handle.generation
    )
  }

  /// Index access without a generation check, for owners that keep their
  /// own links as raw indices.
  #[inline(always)]
  pub fn get_index(&self, index: u32) -> Option<&T> {
    match self.slots.get(index as usize)? {
      Slot::Occupied { value, .. } => Some(value),
      _ => None,
    }
  }

  #[inline(always)]
  pub fn get_index_mut(&mut self, index: u32) -> Option<&mut T> {
    match self.slots.get_mut(index as usize)? {
      Slot::Occupied { value, .. } => Some(value),
      _ => None,
    }
  }

  pub fn handle_at(&self, index: u32) -> Option<Handle> {
    match self.slots.get(index as usize)? {
      Slot::Occupied { generation, .. } => Some(Handle {
        index,
        generation: *generation,
      }),
      _ => None,
    }
  }
}

impl<T> Default for Arena<T> {
  fn default() -> Self {
    Self::new()
  }
}
