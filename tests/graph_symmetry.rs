//! Structural invariants of the conjugate graph: twin symmetry, paired
//! event firing, vertex split and palindromic path contraction.

use std::sync::Arc;

use debruijn_forge::core::{Kmer, Sequence};
use debruijn_forge::graph::{
    handler_ref, ConjugateGraph, DebruijnDataMaster, DebruijnGraph, EdgeId, GraphEvent,
    GraphHandler, VertexId,
};
use parking_lot::Mutex;

fn kmer(s: &str) -> Kmer {
    Kmer::from_str(s).unwrap()
}

fn seq(s: &str) -> Sequence {
    Sequence::from_str(s).unwrap()
}

#[derive(Clone, Default)]
struct EventLog {
    events: Arc<Mutex<Vec<GraphEvent>>>,
}

impl EventLog {
    fn take(&self) -> Vec<GraphEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl GraphHandler<DebruijnDataMaster> for EventLog {
    fn handle(&mut self, _graph: &ConjugateGraph<DebruijnDataMaster>, event: &GraphEvent) {
        self.events.lock().push(event.clone());
    }
}

#[test]
fn vertex_carries_conjugate_twin() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(2));
    let v = graph.add_vertex(kmer("AC"));
    assert_eq!(graph.vertex_count(), 2);

    let twin = graph.conjugate_vertex(v);
    assert_ne!(twin, v);
    assert_eq!(graph.conjugate_vertex(twin), v);
    assert_eq!(*graph.vertex_data(twin), kmer("GT"));

    graph.delete_vertex(v).unwrap();
    assert_eq!(graph.vertex_count(), 0);
}

#[test]
fn edge_symmetry_invariants() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let a = graph.add_vertex(kmer("A"));
    let c = graph.add_vertex(kmer("C"));
    let e = graph.add_edge(a, c, seq("AGGC")).unwrap();

    let twin = graph.conjugate_edge(e);
    assert_ne!(twin, e);
    assert_eq!(graph.conjugate_edge(twin), e);
    assert_eq!(graph.edge_start(twin), graph.conjugate_vertex(graph.edge_end(e)));
    assert_eq!(graph.edge_end(twin), graph.conjugate_vertex(graph.edge_start(e)));
    assert_eq!(*graph.edge_data(twin), seq("GCCT"));

    // incoming is the conjugate view of outgoing
    assert_eq!(graph.outgoing(a), vec![e]);
    assert_eq!(graph.incoming(c), vec![e]);
    assert_eq!(graph.in_degree(c), 1);
    assert_eq!(graph.out_degree(c), 0);
    assert_eq!(graph.edges_between(a, c), vec![e]);
}

#[test]
fn deleting_an_edge_deletes_its_twin() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let a = graph.add_vertex(kmer("A"));
    let c = graph.add_vertex(kmer("C"));
    let e = graph.add_edge(a, c, seq("AGGC")).unwrap();
    assert_eq!(graph.edge_count(), 2);

    graph.delete_edge(e).unwrap();
    assert_eq!(graph.edge_count(), 0);
    assert_eq!(graph.out_degree(a), 0);
    assert_eq!(graph.in_degree(c), 0);
}

#[test]
fn deleting_vertex_with_edges_is_rejected() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let a = graph.add_vertex(kmer("A"));
    let c = graph.add_vertex(kmer("C"));
    graph.add_edge(a, c, seq("AGGC")).unwrap();

    assert!(graph.delete_vertex(a).is_err());
    assert!(graph.delete_vertex(c).is_err());
}

#[test]
fn events_fire_on_both_strands_in_order() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let log = EventLog::default();
    graph.add_handler(handler_ref(log.clone()));

    let a = graph.add_vertex(kmer("A"));
    let events = log.take();
    assert_eq!(
        events,
        vec![
            GraphEvent::VertexAdded(a),
            GraphEvent::VertexAdded(graph.conjugate_vertex(a)),
        ]
    );

    let c = graph.add_vertex(kmer("C"));
    log.take();
    let e = graph.add_edge(a, c, seq("AGGC")).unwrap();
    let events = log.take();
    assert_eq!(
        events,
        vec![
            GraphEvent::EdgeAdded(e),
            GraphEvent::EdgeAdded(graph.conjugate_edge(e)),
        ]
    );

    graph.delete_edge(e).unwrap();
    let events = log.take();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], GraphEvent::EdgeRemoved(x) if x == e));
}

#[test]
fn self_conjugate_edge_fires_once() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let log = EventLog::default();
    graph.add_handler(handler_ref(log.clone()));

    let a = graph.add_vertex(kmer("A"));
    let twin = graph.conjugate_vertex(a);
    log.take();

    // palindromic label: the edge is its own conjugate
    let e = graph.add_edge(a, twin, seq("AT")).unwrap();
    assert!(graph.is_self_conjugate(e));
    assert_eq!(graph.edge_count(), 1);
    assert_eq!(log.take(), vec![GraphEvent::EdgeAdded(e)]);

    graph.delete_edge(e).unwrap();
    assert_eq!(log.take(), vec![GraphEvent::EdgeRemoved(e)]);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn split_vertex_reroutes_and_fires_split_first() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let a = graph.add_vertex(kmer("A"));
    let c = graph.add_vertex(kmer("C"));
    let g = graph.add_vertex(kmer("G"));
    let e1 = graph.add_edge(a, c, seq("AGGC")).unwrap();
    let e2 = graph.add_edge(c, g, seq("CAAG")).unwrap();

    let log = EventLog::default();
    graph.add_handler(handler_ref(log.clone()));

    let (clone_vertex, clones) = graph
        .split_vertex(c, &[e1, e2], Some(vec![0.5, 0.5]))
        .unwrap();
    assert_eq!(clones.len(), 2);
    assert_eq!(*graph.vertex_data(clone_vertex), kmer("C"));

    // clones are re-routed through the new vertex
    assert_eq!(graph.edge_end(clones[0].1), clone_vertex);
    assert_eq!(graph.edge_start(clones[1].1), clone_vertex);
    // originals still stand
    assert_eq!(graph.edge_end(e1), c);
    assert_eq!(graph.edge_start(e2), c);

    let events = log.take();
    assert!(matches!(
        events[0],
        GraphEvent::VertexSplit { new_vertex, old_vertex, .. }
            if new_vertex == clone_vertex && old_vertex == c
    ));
    assert_eq!(events[1], GraphEvent::VertexAdded(clone_vertex));
    assert_eq!(events[2], GraphEvent::EdgeAdded(clones[0].1));
    assert_eq!(events[3], GraphEvent::EdgeAdded(clones[1].1));
    // then the conjugate strand mirrors the same sequence
    assert!(matches!(
        events[4],
        GraphEvent::VertexSplit { new_vertex, .. }
            if new_vertex == graph.conjugate_vertex(clone_vertex)
    ));
}

#[test]
fn merge_path_contracts_chain() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let a = graph.add_vertex(kmer("A"));
    let c = graph.add_vertex(kmer("C"));
    let g = graph.add_vertex(kmer("G"));
    let e1 = graph.add_edge(a, c, seq("AGGC")).unwrap();
    let e2 = graph.add_edge(c, g, seq("CAAG")).unwrap();

    let merged = graph.merge_path(&[e1, e2]).unwrap();
    assert_eq!(*graph.edge_data(merged), seq("AGGCAAG"));
    assert_eq!(graph.edge_start(merged), a);
    assert_eq!(graph.edge_end(merged), g);
    // the interior vertex pair is gone
    assert!(!graph.contains_vertex(c));
    assert_eq!(graph.edge_count(), 2);
}

#[test]
fn merge_path_fires_new_edge_before_deletions() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let a = graph.add_vertex(kmer("A"));
    let c = graph.add_vertex(kmer("C"));
    let g = graph.add_vertex(kmer("G"));
    let e1 = graph.add_edge(a, c, seq("AGGC")).unwrap();
    let e2 = graph.add_edge(c, g, seq("CAAG")).unwrap();
    let conj_e1 = graph.conjugate_edge(e1);
    let conj_e2 = graph.conjugate_edge(e2);
    let conj_c = graph.conjugate_vertex(c);

    let log = EventLog::default();
    graph.add_handler(handler_ref(log.clone()));

    let merged = graph.merge_path(&[e1, e2]).unwrap();
    let events = log.take();

    // the merged edge is announced on both strands before anything on
    // the path goes away
    assert_eq!(
        events[0],
        GraphEvent::Merge {
            path: vec![e1, e2],
            new_edge: merged,
        }
    );
    assert_eq!(
        events[1],
        GraphEvent::Merge {
            path: vec![conj_e2, conj_e1],
            new_edge: graph.conjugate_edge(merged),
        }
    );
    assert_eq!(events[2], GraphEvent::EdgeAdded(merged));
    assert_eq!(
        events[3],
        GraphEvent::EdgeAdded(graph.conjugate_edge(merged))
    );
    assert_eq!(
        events[4..],
        [
            GraphEvent::EdgeRemoved(e1),
            GraphEvent::EdgeRemoved(conj_e1),
            GraphEvent::EdgeRemoved(e2),
            GraphEvent::EdgeRemoved(conj_e2),
            GraphEvent::VertexRemoved(c),
            GraphEvent::VertexRemoved(conj_c),
        ]
    );
}

#[test]
fn merge_path_folds_palindromic_middle() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let c = graph.add_vertex(kmer("C"));
    let a = graph.add_vertex(kmer("A"));
    let e1 = graph.add_edge(c, a, seq("CCA")).unwrap();
    // palindromic edge from a to conj(a)
    let p = graph
        .add_edge(a, graph.conjugate_vertex(a), seq("AT"))
        .unwrap();
    assert!(graph.is_self_conjugate(p));

    // the fold materialises the conjugate half: [e1, p] becomes
    // [e1, p, conj(e1)]
    let corrected = graph.correct_merge_path(&[e1, p]);
    assert_eq!(corrected, vec![e1, p, graph.conjugate_edge(e1)]);

    let merged = graph.merge_path(&[e1, p]).unwrap();
    assert_eq!(*graph.edge_data(merged), seq("CCATGG"));
    assert!(graph.is_self_conjugate(merged));
    assert_eq!(graph.edge_start(merged), c);
    assert_eq!(graph.edge_end(merged), graph.conjugate_vertex(c));
    assert!(!graph.contains_vertex(a));
}

#[test]
fn glueing_parallel_edges_transfers_weight() {
    use debruijn_forge::graph::CoverageIndex;

    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let coverage = CoverageIndex::new();
    graph.add_handler(handler_ref(coverage.clone()));

    let a = graph.add_vertex(kmer("A"));
    let c = graph.add_vertex(kmer("C"));
    let kept = graph.add_edge(a, c, seq("AGGC")).unwrap();
    let removed = graph.add_edge(a, c, seq("AGAC")).unwrap();
    coverage.set_weight(kept, 10.0);
    coverage.set_weight(removed, 4.0);

    graph.glue_parallel_edges(removed, kept).unwrap();
    assert!(!graph.contains_edge(removed));
    assert!(graph.contains_edge(kept));
    assert_eq!(coverage.weight(kept), 14.0);

    // gluing non-parallel edges is an invariant violation
    let g = graph.add_vertex(kmer("G"));
    let other = graph.add_edge(c, g, seq("CAAG")).unwrap();
    assert!(graph.glue_parallel_edges(other, kept).is_err());
}

#[test]
fn conjugate_involution_over_random_mutations() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let vertices: Vec<VertexId> = ["A", "C", "G", "T"]
        .iter()
        .map(|s| graph.add_vertex(kmer(s)))
        .collect();
    let mut edges: Vec<EdgeId> = Vec::new();
    edges.push(graph.add_edge(vertices[0], vertices[1], seq("AGGC")).unwrap());
    edges.push(graph.add_edge(vertices[1], vertices[2], seq("CAAG")).unwrap());
    edges.push(graph.add_edge(vertices[2], vertices[0], seq("GCCA")).unwrap());

    for &v in &vertices {
        assert_eq!(graph.conjugate_vertex(graph.conjugate_vertex(v)), v);
    }
    for &e in &edges {
        let twin = graph.conjugate_edge(e);
        assert_eq!(graph.conjugate_edge(twin), e);
        assert_eq!(graph.edge_start(twin), graph.conjugate_vertex(graph.edge_end(e)));
        assert_eq!(
            *graph.edge_data(twin),
            graph.edge_data(e).reverse_complement()
        );
    }
}
