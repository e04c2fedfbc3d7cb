use super::*;

fn position(order: &[u32], v: u32) -> usize {
    order.iter().position(|&x| x == v).expect("vertex missing from order")
}

fn assert_valid_order(dag: &Dag<u32>, edges: &[(u32, u32)]) {
    let order = dag.topological_sort(false).unwrap();
    assert_eq!(order.len(), dag.len());
    for &(p, c) in edges {
        assert!(
            position(&order, p) < position(&order, c),
            "edge {} -> {} violated by {:?}",
            p,
            c,
            order
        );
    }
}

#[test]
fn test_add_edge_registers_vertices() {
    let mut dag = Dag::new();
    assert!(dag.is_empty());
    assert!(dag.add_edge(1u32, 2));
    assert_eq!(dag.vertices(), &[1, 2]);
    assert_eq!(dag.parents(2), &[1]);
    assert_eq!(dag.children(1), &[2]);
    assert!(dag.parents(1).is_empty());
    assert!(dag.contains(1) && dag.contains(2) && !dag.contains(3));
}

#[test]
fn test_duplicate_edge_is_ignored() {
    let mut dag = Dag::new();
    assert!(dag.add_edge(1u32, 2));
    assert!(!dag.add_edge(1, 2));
    assert_eq!(dag.edge_count(), 1);
    assert_eq!(dag.parents(2), &[1]);
}

#[test]
fn test_parents_keep_insertion_order() {
    let mut dag = Dag::new();
    dag.add_edge(7u32, 1);
    dag.add_edge(3, 1);
    dag.add_edge(5, 1);
    assert_eq!(dag.parents(1), &[7, 3, 5]);
}

#[test]
fn test_classify() {
    let mut dag = Dag::new();
    dag.add_edge(1u32, 3);
    dag.add_edge(2, 3);
    dag.add_edge(3, 4);
    let kinds: Vec<(VertexKind, u32)> = dag.classify().collect();
    assert_eq!(
        kinds,
        vec![
            (VertexKind::Source, 1),
            (VertexKind::Internal, 3),
            (VertexKind::Source, 2),
            (VertexKind::Sink, 4),
        ]
    );
    assert_eq!(dag.sources().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(dag.sinks().collect::<Vec<_>>(), vec![4]);
    assert_eq!(dag.internals().collect::<Vec<_>>(), vec![3]);
}

#[test]
fn test_topological_order_respects_edges() {
    let edges = [(1u32, 3), (2, 3), (3, 5), (4, 5), (5, 6), (2, 6), (1, 4)];
    let mut dag = Dag::new();
    for &(p, c) in &edges {
        dag.add_edge(p, c);
    }
    assert_valid_order(&dag, &edges);

    let forward = dag.topological_sort(false).unwrap();
    let mut backward = dag.topological_sort(true).unwrap();
    backward.reverse();
    assert_eq!(forward, backward);
}

#[test]
fn test_topological_order_is_deterministic() {
    let build = || {
        let mut dag = Dag::new();
        dag.add_edge(10u32, 30);
        dag.add_edge(20, 30);
        dag.add_edge(30, 40);
        dag
    };
    let a = build().topological_sort(false).unwrap();
    let b = build().topological_sort(false).unwrap();
    assert_eq!(a, b);
    // Searches start in insertion order, so the later source finishes last
    // and leads the reversed postorder.
    assert_eq!(a, vec![20, 10, 30, 40]);
}

#[test]
fn test_cache_invalidated_by_add_edge() {
    let mut dag = Dag::new();
    dag.add_edge(1u32, 2);
    assert_eq!(dag.topological_sort(false).unwrap(), vec![1, 2]);

    // A new vertex that must come before 1.
    dag.add_edge(0, 1);
    let order = dag.topological_sort(false).unwrap();
    assert_valid_order(&dag, &[(1, 2), (0, 1)]);
    assert_eq!(order.len(), 3);
}

#[test]
fn test_isolated_vertex_is_ordered() {
    let mut dag = Dag::new();
    dag.add_edge(1u32, 2);
    assert_eq!(dag.topological_sort(false).unwrap().len(), 2);
    assert!(dag.add_vertex(7));
    assert!(!dag.add_vertex(7));
    let order = dag.topological_sort(false).unwrap();
    assert_eq!(order.len(), 3);
    assert!(order.contains(&7));
    assert_eq!(dag.kind(7), VertexKind::Source);
}

#[test]
fn test_cycle_detected() {
    let mut dag = Dag::new();
    dag.add_edge(1u32, 2);
    dag.add_edge(2, 3);
    dag.add_edge(3, 1);
    assert_eq!(dag.topological_sort(false), Err(NervError::CycleDetected));
}

#[test]
fn test_self_loop_detected() {
    let mut dag = Dag::new();
    dag.add_edge(1u32, 1);
    assert_eq!(dag.topological_sort(false), Err(NervError::CycleDetected));
}

#[test]
fn test_deep_chain_does_not_recurse() {
    let mut dag = Dag::new();
    let depth = 200_000u32;
    for v in 0..depth {
        dag.add_edge(v, v + 1);
    }
    let order = dag.topological_sort(false).unwrap();
    assert_eq!(order.len(), depth as usize + 1);
    assert_eq!(order[0], 0);
    assert_eq!(order[depth as usize], depth);
}
