use super::*;

use rand::{
  Rng,
  SeedableRng,
  rngs::StdRng,
  seq::SliceRandom,
};
use simplelog::{
  Config,
  LevelFilter,
  TestLogger,
};

fn init_logging() {
  let _ = TestLogger::init(LevelFilter::Trace, Config::default());
}

fn tree_of(keys: &[i32]) -> RbTree<i32> {
  let mut tree = RbTree::new();
  for &key in keys {
    tree.insert(key).unwrap();
    tree.validate().unwrap();
  }
  tree
}

fn keys_of(tree: &RbTree<i32>) -> Vec<i32> {
  let mut buf = vec![0; tree.len()];
  let count = tree.to_array(&mut buf);
  assert_eq!(count, buf.len());
  buf
}

#[test]
fn empty_tree() {
  init_logging();
  let tree: RbTree<i32> = RbTree::create();

  assert!(tree.is_empty());
  assert_eq!(tree.len(), 0);
  assert!(tree.min().is_nil());
  assert!(tree.max().is_nil());
  assert!(tree.root().is_nil());
  assert_eq!(tree.min(), tree.nil());
  assert_eq!(tree.find(&1), None);
  assert_eq!(tree.validate(), Ok(0));
  assert_eq!(tree.to_array(&mut []), 0);
}

#[test]
fn insert_then_to_array_is_sorted() {
  init_logging();
  let tree = tree_of(&[5, 3, 8, 1, 4, 7, 9]);

  assert_eq!(keys_of(&tree), vec![1, 3, 4, 5, 7, 8, 9]);
  assert_eq!(tree.len(), 7);
}

#[test]
fn root_is_black_after_insert() {
  let mut tree = RbTree::new();
  let node = tree.insert(42).unwrap();

  assert_eq!(tree.root(), node);
  assert_eq!(tree.color(node), Some(Color::Black));
  assert_eq!(tree.color(tree.nil()), Some(Color::Black));
  assert_eq!(tree.key(node), Some(&42));
}

#[test]
fn new_child_starts_red() {
  let mut tree = RbTree::new();
  tree.insert(2).unwrap();
  let left = tree.insert(1).unwrap();
  let right = tree.insert(3).unwrap();

  assert_eq!(tree.color(left), Some(Color::Red));
  assert_eq!(tree.color(right), Some(Color::Red));
  assert_eq!(tree.validate(), Ok(1));
}

#[test]
fn find_min_max() {
  let tree = tree_of(&[12, 4, 30, 8, 1, 27, 19]);

  let found = tree.find(&8).unwrap();
  assert_eq!(tree.key(found), Some(&8));
  assert_eq!(tree.find(&9), None);
  assert_eq!(tree.key(tree.min()), Some(&1));
  assert_eq!(tree.key(tree.max()), Some(&30));
  assert!(tree.contains(&27));
  assert!(!tree.contains(&28));
}

#[test]
fn find_after_erase() {
  let mut tree = tree_of(&[10, 20, 30]);
  let node = tree.find(&20).unwrap();

  assert_eq!(tree.erase(node), Ok(20));
  assert_eq!(tree.find(&20), None);
  assert!(tree.find(&10).is_some());
  assert!(tree.find(&30).is_some());
  tree.validate().unwrap();
}

#[test]
fn erase_node_with_two_children() {
  let mut tree = tree_of(&[20, 10, 30, 5, 15, 25, 35]);
  let node = tree.find(&20).unwrap();

  assert_eq!(tree.erase(node), Ok(20));
  assert_eq!(keys_of(&tree), vec![5, 10, 15, 25, 30, 35]);
  tree.validate().unwrap();
  assert_eq!(tree.key(tree.root()), Some(&25));
}

#[test]
fn erase_successor_deep_in_right_subtree() {
  let mut tree = tree_of(&[50, 20, 80, 10, 30, 70, 90, 60, 75]);
  let node = tree.find(&50).unwrap();

  tree.erase(node).unwrap();
  tree.validate().unwrap();
  assert_eq!(keys_of(&tree), vec![10, 20, 30, 60, 70, 75, 80, 90]);
}

#[test]
fn erase_until_empty() {
  let mut tree = tree_of(&[8, 3, 10, 1, 6, 14, 4, 7, 13]);

  let mut expected = keys_of(&tree);
  while !tree.is_empty() {
    let min = tree.min();
    assert_eq!(tree.erase(min), Ok(expected.remove(0)));
    tree.validate().unwrap();
  }

  assert!(tree.min().is_nil());
  assert_eq!(tree.len(), 0);
}

#[test]
fn erase_rejects_nil_ref() {
  let mut tree = tree_of(&[1, 2, 3]);
  let nil = tree.nil();

  assert_eq!(tree.erase(nil), Err(RbError::InvalidRef));
  assert_eq!(tree.len(), 3);
  tree.validate().unwrap();
}

#[test]
fn erase_rejects_foreign_ref() {
  let mut tree = tree_of(&[1, 2, 3]);
  let other = tree_of(&[1, 2, 3]);
  let foreign = other.find(&2).unwrap();

  assert_ne!(tree.id(), other.id());
  assert_eq!(tree.erase(foreign), Err(RbError::InvalidRef));
  assert_eq!(tree.key(foreign), None);
  assert_eq!(keys_of(&tree), vec![1, 2, 3]);
}

#[test]
fn erase_rejects_stale_ref() {
  let mut tree = tree_of(&[1, 2, 3]);
  let node = tree.find(&2).unwrap();
  tree.erase(node).unwrap();

  assert_eq!(tree.erase(node), Err(RbError::InvalidRef));

  // the freed slot is recycled, the old ref must still not resolve
  let fresh = tree.insert(4).unwrap();
  assert_eq!(fresh.handle().map(|h| h.index()), node.handle().map(|h| h.index()));
  assert_eq!(tree.erase(node), Err(RbError::InvalidRef));
  assert_eq!(tree.key(node), None);
  assert_eq!(keys_of(&tree), vec![1, 3, 4]);
}

#[test]
fn to_array_caps_writes_and_reports_count() {
  let tree = tree_of(&[5, 3, 8, 1, 4, 7, 9]);
  let mut buf = [0; 3];

  assert_eq!(tree.to_array(&mut buf), 7);
  assert_eq!(buf, [1, 3, 4]);

  let mut wide = [-1; 10];
  assert_eq!(tree.to_array(&mut wide), 7);
  assert_eq!(wide, [1, 3, 4, 5, 7, 8, 9, -1, -1, -1]);
}

#[test]
fn duplicates_are_kept() {
  let mut tree = tree_of(&[3, 1, 3, 2, 3]);

  assert_eq!(keys_of(&tree), vec![1, 2, 3, 3, 3]);
  assert_eq!(tree.remove(&3), Ok(Some(3)));
  assert_eq!(keys_of(&tree), vec![1, 2, 3, 3]);
  tree.validate().unwrap();
}

#[test]
fn remove_by_key() {
  let mut tree = tree_of(&[4, 2, 6]);

  assert_eq!(tree.remove(&2), Ok(Some(2)));
  assert_eq!(tree.remove(&2), Ok(None));
  assert_eq!(keys_of(&tree), vec![4, 6]);
}

#[test]
fn successor_and_predecessor_walk() {
  let tree = tree_of(&[40, 20, 60, 10, 30, 50, 70]);

  let mut forward = Vec::new();
  let mut node = tree.min();
  while !node.is_nil() {
    forward.push(*tree.key(node).unwrap());
    node = tree.successor(node).unwrap();
  }
  assert_eq!(forward, vec![10, 20, 30, 40, 50, 60, 70]);

  let mut backward = Vec::new();
  let mut node = tree.max();
  while !node.is_nil() {
    backward.push(*tree.key(node).unwrap());
    node = tree.predecessor(node).unwrap();
  }
  assert_eq!(backward, vec![70, 60, 50, 40, 30, 20, 10]);

  assert_eq!(tree.successor(tree.nil()), Err(RbError::InvalidRef));
}

#[test]
fn iter_matches_to_array() {
  let tree = tree_of(&[9, 2, 7, 4, 5]);
  let iter = tree.iter();

  assert_eq!(iter.len(), 5);
  let collected: Vec<i32> = iter.copied().collect();
  assert_eq!(collected, keys_of(&tree));

  let mut total = 0;
  for key in &tree {
    total += key;
  }
  assert_eq!(total, 27);
}

#[test]
fn limit_failure_leaves_tree_intact() {
  let mut tree = RbTree::with_config(TreeConfig::new().with_limit(3)).unwrap();
  tree.insert(1).unwrap();
  tree.insert(2).unwrap();
  tree.insert(3).unwrap();

  let err = tree.insert(4).unwrap_err();
  assert_eq!(
    err,
    RbError::Arena(rbkit_arena::ArenaError::Exhausted { limit: 3 })
  );
  assert_eq!(keys_of(&tree), vec![1, 2, 3]);
  tree.validate().unwrap();

  let two = tree.find(&2).unwrap();
  tree.erase(two).unwrap();
  tree.insert(4).unwrap();
  assert_eq!(keys_of(&tree), vec![1, 3, 4]);
}

#[test]
fn destroy_releases_nodes_and_sentinel() {
  init_logging();
  let tree = tree_of(&[20, 10, 30, 5, 15, 25, 35]);
  assert_eq!(tree.stats().allocated(), 7);

  let mut order = Vec::new();
  let released = tree.destroy_with(|key| order.push(key));

  assert_eq!(released, 8);
  assert_eq!(order, vec![5, 15, 10, 25, 35, 30, 20]);
}

#[test]
fn destroy_empty_tree() {
  let tree: RbTree<u64> = RbTree::new();
  assert_eq!(tree.destroy(), 1);
}

#[test]
fn destroy_after_erases() {
  let mut tree = tree_of(&(0..50).collect::<Vec<_>>());
  for key in (0..50).step_by(3) {
    tree.remove(&key).unwrap();
  }
  let live = tree.len();

  assert_eq!(tree.stats().live(), live);
  assert_eq!(tree.destroy(), live + 1);
}

#[test]
fn clear_stales_refs() {
  let mut tree = tree_of(&[1, 2, 3]);
  let node = tree.find(&1).unwrap();
  tree.clear();

  assert!(tree.is_empty());
  assert_eq!(tree.validate(), Ok(0));
  assert_eq!(tree.erase(node), Err(RbError::InvalidRef));

  tree.insert(7).unwrap();
  assert_eq!(keys_of(&tree), vec![7]);
}

#[test]
fn ascending_inserts_stay_balanced() {
  let count = 1024;
  let mut tree = RbTree::new();
  for key in 0..count {
    tree.insert(key).unwrap();
  }

  let height = tree.validate().unwrap();
  // black height of a red-black tree with n keys is at most log2(n + 1)
  assert!(height <= 11);
  assert_eq!(tree.len(), count as usize);
}

#[test]
fn random_operations_match_model() {
  init_logging();
  let mut rng = StdRng::seed_from_u64(0x5eed);
  let mut tree = RbTree::new();
  let mut model: Vec<i32> = Vec::new();

  for _ in 0..4000 {
    let key = rng.random_range(0..512);
    if rng.random_bool(0.6) {
      tree.insert(key).unwrap();
      let pos = model.partition_point(|&k| k <= key);
      model.insert(pos, key);
    } else {
      let removed = tree.remove(&key).unwrap();
      match model.binary_search(&key) {
        Ok(pos) => {
          model.remove(pos);
          assert_eq!(removed, Some(key));
        }
        Err(_) => assert_eq!(removed, None),
      }
    }

    tree.validate().unwrap();
    assert_eq!(tree.len(), model.len());
  }

  assert_eq!(keys_of(&tree), model);
}

#[test]
fn shuffled_erase_of_every_key() {
  let mut rng = StdRng::seed_from_u64(7);
  let mut keys: Vec<i32> = (0..300).collect();
  keys.shuffle(&mut rng);
  let mut tree = tree_of(&keys);

  keys.shuffle(&mut rng);
  for (done, key) in keys.iter().enumerate() {
    let node = tree.find(key).unwrap();
    assert_eq!(tree.erase(node), Ok(*key));
    tree.validate().unwrap();
    assert_eq!(tree.len(), keys.len() - done - 1);
  }

  assert!(tree.is_empty());
  assert_eq!(tree.stats().allocated(), 300);
  assert_eq!(tree.stats().released(), 300);
}

#[test]
fn random_erase_of_arbitrary_nodes_across_seeds() {
  init_logging();
  for seed in 0..40u64 {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut tree = RbTree::new();
    let mut model: Vec<i32> = Vec::new();

    for _ in 0..3000 {
      if model.is_empty() || rng.random_bool(0.55) {
        let key = rng.random_range(0..2048);
        tree.insert(key).unwrap();
        let pos = model.partition_point(|&k| k <= key);
        model.insert(pos, key);
      } else {
        let key = model.remove(rng.random_range(0..model.len()));
        let node = tree.find(&key).unwrap();
        assert_eq!(tree.erase(node), Ok(key));
        assert_eq!(tree.nil_link().parent(), link::NIL);
        assert_eq!(tree.nil_link().color(), Color::Black);
      }

      tree.validate().unwrap();
      assert_eq!(tree.len(), model.len());
    }

    assert_eq!(keys_of(&tree), model);
    let live = tree.len();
    let mut released = Vec::new();
    assert_eq!(tree.destroy_with(|key| released.push(key)), live + 1);
    released.sort_unstable();
    assert_eq!(released, model);
  }
}

#[test]
fn tree_ids_are_unique() {
  let first: RbTree<i32> = RbTree::new();
  let second: RbTree<i32> = RbTree::new();
  let third: RbTree<i32> = RbTree::new();

  assert!(first.id() < second.id());
  assert!(second.id() < third.id());
  assert_eq!(first.nil().tree(), first.id());
  assert_ne!(first.nil(), second.nil());
}
