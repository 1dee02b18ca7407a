#![no_std]

pub use rbkit_arena as arena;
pub use rbkit_tree as tree;

pub mod prelude {
  pub use rbkit_arena::{
    ArenaConfig,
    ArenaError,
    ArenaStats,
    Handle,
  };
  pub use rbkit_tree::prelude::*;
}
