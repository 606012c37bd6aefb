use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tara_core::{propagate, AttackTree, Kstu, Leaf, Node};

fn wide_tree(paths: usize, depth: usize, leaves: usize) -> AttackTree {
    fn branch(depth: usize, leaves: usize, seed: usize) -> Node {
        let mut node = Node::new(format!("n{seed}"));
        for i in 0..leaves {
            let v = f64::from(u32::try_from((seed + i) % 7).unwrap_or(0)) / 10.0;
            node = node.leaf(Leaf::new(format!("l{seed}_{i}")).likelihood(Kstu::from_values(v, 0.3, v, 0.1)));
        }
        if depth > 0 {
            node = node.child(branch(depth - 1, leaves, seed + 1));
        }
        node
    }
    let mut tree = AttackTree::new("R01", "bench");
    for p in 0..paths {
        tree = tree.path(branch(depth, leaves, p));
    }
    tree
}

fn bench_propagation(c: &mut Criterion) {
    let tree = wide_tree(16, 6, 8);
    c.bench_function("propagate_16x6x8", |b| {
        b.iter(|| {
            let mut t = tree.clone();
            propagate(black_box(&mut t));
            t
        });
    });
}

criterion_group!(benches, bench_propagation);
criterion_main!(benches);
