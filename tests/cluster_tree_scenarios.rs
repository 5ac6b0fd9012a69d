use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

use clustree::error::{ClustreeError, Result};
use clustree::storage::StorageConfig;
use clustree::storage::file::FileStorageConfig;
use clustree::tree::{ClusterTree, Neighbor, TreeConfig};

const SQUARE: [[f32; 2]; 4] = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];

fn square_tree(dir: &TempDir) -> Result<ClusterTree> {
    let mut tree = ClusterTree::open(dir.path(), 2, 4)?;
    for point in SQUARE {
        tree.insert(&point)?;
    }
    Ok(tree)
}

fn positions(neighbors: &[Neighbor]) -> Vec<Vec<f32>> {
    neighbors.iter().map(|n| n.position.clone()).collect()
}

fn random_tree(seed: u64, points: usize, max_leafs: usize) -> Result<ClusterTree> {
    let config = TreeConfig::new(2).with_max_leafs(max_leafs);
    let mut tree = ClusterTree::with_config(StorageConfig::default(), config)?;
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..points {
        let x: f32 = rng.random_range(-3.0..3.0);
        let y: f32 = rng.random_range(-3.0..3.0);
        tree.insert(&[x, y])?;
    }
    Ok(tree)
}

#[test]
fn full_first_layer_is_extended_one_level() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let tree = square_tree(&dir)?;

    let root = tree.root()?;
    assert_eq!(root.children.len(), 4);
    assert_eq!(root.descendant_counter, 8);
    assert_eq!(root.position, vec![0.5, 0.5]);

    for child in tree.root()?.children {
        let child = tree.node(child)?;
        assert_eq!(child.children.len(), 1);
        assert_eq!(child.descendant_counter, 1);

        let copy = tree.node(child.children[0])?;
        assert_eq!(copy.position, child.position);
        assert!(copy.is_leaf());
    }

    assert_eq!(tree.count()?, 4);
    assert!(tree.validate()?.is_valid());
    Ok(())
}

#[test]
fn fifth_point_joins_nearest_cluster() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let mut tree = square_tree(&dir)?;
    tree.insert(&[5.0, 5.0])?;

    let root = tree.root()?;
    assert_eq!(root.position, vec![1.0, 1.0]);

    let clusters: Vec<(Vec<f32>, usize)> = root
        .children
        .iter()
        .map(|id| tree.node(*id).map(|n| (n.position, n.children.len())))
        .collect::<Result<_>>()?;
    assert_eq!(
        clusters,
        vec![
            (vec![0.0, 0.0], 1),
            (vec![1.0, 0.0], 1),
            (vec![0.0, 1.0], 1),
            (vec![3.0, 3.0], 2),
        ]
    );

    let path = tree.locate(&[5.0, 5.0])?;
    assert_eq!(path.len(), 3);
    assert_eq!(path.layers()[1][0].position, vec![3.0, 3.0]);
    let leaves: Vec<Vec<f32>> = path.layers()[2]
        .iter()
        .map(|n| n.position.clone())
        .collect();
    assert_eq!(leaves, vec![vec![5.0, 5.0], vec![1.0, 1.0]]);

    assert_eq!(tree.count()?, 5);
    assert!(tree.validate()?.is_valid());
    Ok(())
}

#[test]
fn exact_match_is_first_neighbor() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let mut tree = square_tree(&dir)?;
    tree.insert(&[5.0, 5.0])?;
    tree.insert(&[10.0, 10.0])?;

    let nearest = tree
        .nearest(&[10.0, 10.0], 1)?
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(nearest.len(), 1);
    assert_eq!(nearest[0].position, vec![10.0, 10.0]);
    assert_eq!(nearest[0].distance, 0.0);

    let three = tree
        .nearest(&[10.0, 10.0], 3)?
        .collect::<Result<Vec<_>>>()?;
    assert_eq!(
        positions(&three),
        vec![vec![10.0, 10.0], vec![5.0, 5.0], vec![1.0, 1.0]]
    );
    assert_eq!(tree.count()?, 6);
    Ok(())
}

#[test]
fn exact_match_on_single_point_tree() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let mut tree = ClusterTree::open(dir.path(), 2, 8)?;
    tree.insert(&[10.0, 10.0])?;

    let nearest = tree.nearest(&[10.0, 10.0], 1)?.next().unwrap()?;
    assert_eq!(nearest.position, vec![10.0, 10.0]);
    Ok(())
}

#[test]
fn zero_limit_yields_nothing() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let tree = square_tree(&dir)?;
    assert_eq!(tree.nearest(&[0.5, 0.5], 0)?.count(), 0);
    Ok(())
}

#[test]
fn empty_tree_yields_nothing() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let tree = ClusterTree::open(dir.path(), 3, 4)?;
    assert_eq!(tree.count()?, 0);
    assert_eq!(tree.nearest(&[0.0, 0.0, 0.0], 10)?.count(), 0);
    Ok(())
}

#[test]
fn reopening_with_other_dimension_fails() -> Result<()> {
    let dir = TempDir::new().unwrap();
    ClusterTree::open(dir.path(), 3, 8)?;

    let err = ClusterTree::open(dir.path(), 2, 8).unwrap_err();
    assert!(matches!(
        err,
        ClustreeError::DimensionMismatch {
            expected: 2,
            actual: 3
        }
    ));
    Ok(())
}

#[test]
fn small_max_leafs_is_rejected() {
    let dir = TempDir::new().unwrap();
    for max_leafs in [0, 1] {
        let err = ClusterTree::open(dir.path(), 2, max_leafs).unwrap_err();
        assert!(matches!(err, ClustreeError::Config(_)));
    }
}

#[test]
fn insert_with_wrong_dimension_leaves_tree_untouched() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let mut tree = square_tree(&dir)?;
    let records = tree.record_count()?;

    let err = tree.insert(&[1.0, 2.0, 3.0]).unwrap_err();
    assert!(matches!(err, ClustreeError::DimensionMismatch { .. }));
    assert_eq!(tree.record_count()?, records);
    assert_eq!(tree.count()?, 4);
    Ok(())
}

#[test]
fn tree_survives_reopen() -> Result<()> {
    let dir = TempDir::new().unwrap();
    {
        let mut tree = square_tree(&dir)?;
        tree.insert(&[5.0, 5.0])?;
        tree.insert(&[10.0, 10.0])?;
        tree.flush()?;
    }

    let config = TreeConfig::new(2).with_max_leafs(4).with_cache_capacity(0);
    let tree = ClusterTree::with_config(
        StorageConfig::File(FileStorageConfig::new(dir.path())),
        config,
    )?;
    assert_eq!(tree.count()?, 6);
    assert_eq!(tree.record_count()?, 11);

    let all = tree.nearest(&[0.0, 0.0], 100)?.collect::<Result<Vec<_>>>()?;
    assert_eq!(
        positions(&all),
        vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![5.0, 5.0],
            vec![10.0, 10.0],
        ]
    );
    Ok(())
}

#[test]
fn synced_tree_survives_reopen() -> Result<()> {
    let dir = TempDir::new().unwrap();
    let storage =
        || StorageConfig::File(FileStorageConfig::new(dir.path()).with_sync_writes(true));
    {
        let mut tree = ClusterTree::with_config(storage(), TreeConfig::new(2).with_max_leafs(4))?;
        for point in SQUARE {
            tree.insert(&point)?;
        }
        tree.insert(&[5.0, 5.0])?;
        tree.flush()?;
    }

    let config = TreeConfig::new(2).with_max_leafs(4).with_cache_capacity(0);
    let tree = ClusterTree::with_config(storage(), config)?;
    assert_eq!(tree.count()?, 5);
    assert_eq!(tree.root()?.position, vec![1.0, 1.0]);

    let nearest = tree.nearest(&[5.0, 5.0], 2)?.collect::<Result<Vec<_>>>()?;
    assert_eq!(positions(&nearest), vec![vec![5.0, 5.0], vec![1.0, 1.0]]);
    assert!(tree.validate()?.is_valid());
    Ok(())
}

#[test]
fn inserted_point_is_in_located_leaf_layer() -> Result<()> {
    let config = TreeConfig::new(2).with_max_leafs(3);
    let mut tree = ClusterTree::with_config(StorageConfig::default(), config)?;

    for x in 0..6 {
        for y in 0..6 {
            let point = [x as f32, y as f32];
            tree.insert(&point)?;

            let path = tree.locate(&point)?;
            let leaves = path.last_layer().unwrap();
            assert!(leaves.iter().any(|n| n.position == point));
        }
    }
    Ok(())
}

#[test]
fn grid_enumeration_is_complete() -> Result<()> {
    let config = TreeConfig::new(2).with_max_leafs(4);
    let mut tree = ClusterTree::with_config(StorageConfig::default(), config)?;
    for x in 0..6 {
        for y in 0..6 {
            tree.insert(&[x as f32, y as f32])?;
        }
    }

    let all = tree
        .nearest(&[2.5, 2.5], usize::MAX)?
        .collect::<Result<Vec<_>>>()?;
    let ids: HashSet<_> = all.iter().map(|n| n.id).collect();
    assert_eq!(all.len(), 36);
    assert_eq!(ids.len(), 36);
    assert_eq!(tree.count()?, 36);
    Ok(())
}

#[test]
fn random_inserts_keep_invariants() -> Result<()> {
    for (seed, max_leafs) in [(1, 2), (2, 3), (3, 5), (4, 8), (5, 25)] {
        let tree = random_tree(seed, 200, max_leafs)?;

        let report = tree.validate()?;
        assert!(report.is_valid(), "violations: {:?}", report.violations);
        assert_eq!(tree.count()?, 200);

        let stats = tree.stats()?;
        assert_eq!(stats.leaf_count, 200);
        assert!(stats.max_fan_out <= max_leafs);
    }
    Ok(())
}

#[test]
fn nearest_is_bounded_and_unique() -> Result<()> {
    let tree = random_tree(42, 150, 4)?;

    for k in [1, 7, 150, 1000] {
        let results = tree
            .nearest(&[0.25, -0.5], k)?
            .collect::<Result<Vec<_>>>()?;
        let ids: HashSet<_> = results.iter().map(|n| n.id).collect();

        assert_eq!(results.len(), k.min(150));
        assert_eq!(ids.len(), results.len());
    }
    Ok(())
}

#[test]
fn enumeration_can_stop_early() -> Result<()> {
    let tree = random_tree(9, 50, 4)?;

    let mut nearest = tree.nearest(&[0.0, 0.0], 10)?;
    let first = nearest.next().unwrap()?;
    assert_eq!(nearest.remaining(), 9);
    drop(nearest);

    let again = tree.nearest(&[0.0, 0.0], 1)?.next().unwrap()?;
    assert_eq!(again.id, first.id);
    Ok(())
}
