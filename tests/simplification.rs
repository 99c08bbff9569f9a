//! End-to-end behaviour of the edge-removal policies, including the
//! canonical low-coverage bridge scenario, early-stop orders, topology
//! refinements and the paired-info criterion.

use debruijn_forge::core::{AssemblyError, Kmer, Sequence};
use debruijn_forge::graph::{
    handler_ref, CoverageIndex, DebruijnDataMaster, DebruijnGraph, EdgeId,
};
use debruijn_forge::simplify::{
    self,
    config::{ChimericConfig, LowCoverageConfig, PairInfoConfig, RelativeTopologyConfig, TopologyConfig},
    topology::{DegreeUniquePathFinder, LongestContinuationPathFinder},
    AdvancedTopologyChimericEdgeRemover, ChimericEdgesRemover, IterativeLowCoverageEdgeRemover,
    LowCoverageEdgeRemover, NewTopologyBasedChimericEdgeRemover, PairInfoAwareErroneousEdgeRemover,
    PairedInfoIndex, PairedInfoStore, TopologyBasedChimericEdgeRemover,
};

fn kmer(s: &str) -> Kmer {
    Kmer::from_str(s).unwrap()
}

fn seq(s: &str) -> Sequence {
    Sequence::from_str(s).unwrap()
}

/// Label of the given total length running from `start` to `end`.
fn label(start: char, end: char, len: usize) -> Sequence {
    assert!(len >= 3);
    let mut s = String::with_capacity(len);
    s.push(start);
    for _ in 0..len - 2 {
        s.push('G');
    }
    s.push(end);
    Sequence::from_str(&s).unwrap()
}

fn set_weight_both_strands(graph: &DebruijnGraph, coverage: &CoverageIndex, e: EdgeId, w: f64) {
    coverage.set_weight(e, w);
    let twin = graph.conjugate_edge(e);
    if twin != e {
        coverage.set_weight(twin, w);
    }
}

/// v1 --X(len 5, cov 50)--> v2 with a low-coverage loop Y at v2,
/// then v2 --Z(len 5, cov 50)--> v3.
fn bridge_graph() -> (DebruijnGraph, CoverageIndex, EdgeId, EdgeId, EdgeId) {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let coverage = CoverageIndex::new();
    graph.add_handler(handler_ref(coverage.clone()));

    let v1 = graph.add_vertex(kmer("A"));
    let v2 = graph.add_vertex(kmer("C"));
    let v3 = graph.add_vertex(kmer("T"));
    let x = graph.add_edge(v1, v2, seq("AAAAAC")).unwrap();
    let y = graph.add_edge(v2, v2, seq("CGGC")).unwrap();
    let z = graph.add_edge(v2, v3, seq("CTTTTT")).unwrap();

    set_weight_both_strands(&graph, &coverage, x, 250.0);
    set_weight_both_strands(&graph, &coverage, y, 3.0);
    set_weight_both_strands(&graph, &coverage, z, 250.0);
    (graph, coverage, x, y, z)
}

#[test]
fn low_coverage_bridge_is_removed_and_chain_compressed() {
    let (mut graph, coverage, _x, y, _z) = bridge_graph();
    assert_eq!(graph.edge_count(), 6);

    let policy = LowCoverageEdgeRemover::new(LowCoverageConfig {
        max_length: 4,
        max_coverage: 2.0,
    });
    let changed = simplify::run_policy(&mut graph, &coverage, &policy).unwrap();
    assert!(changed);
    assert!(!graph.contains_edge(y));

    // X and Z merged into a single edge of length 10 on each strand
    assert_eq!(graph.edge_count(), 2);
    let merged = graph.edges().next().unwrap();
    assert_eq!(graph.length(merged), 10);
    assert_eq!(coverage.coverage(&graph, merged), 50.0);
    let label = graph.edge_data(merged).to_string();
    assert!(label == "AAAAACTTTTT" || label == "AAAAAGTTTTT");
}

#[test]
fn removal_is_idempotent() {
    let (mut graph, coverage, _, _, _) = bridge_graph();
    let policy = LowCoverageEdgeRemover::new(LowCoverageConfig {
        max_length: 4,
        max_coverage: 2.0,
    });
    assert!(simplify::run_policy(&mut graph, &coverage, &policy).unwrap());
    let edges_after: Vec<EdgeId> = graph.edges().collect();

    assert!(!simplify::run_policy(&mut graph, &coverage, &policy).unwrap());
    let edges_again: Vec<EdgeId> = graph.edges().collect();
    assert_eq!(edges_after, edges_again);
}

#[test]
fn iterative_low_coverage_stops_at_coverage_bound() {
    let (mut graph, coverage, _x, y, _z) = bridge_graph();
    let policy = IterativeLowCoverageEdgeRemover::new(LowCoverageConfig {
        max_length: 4,
        max_coverage: 2.0,
    });
    assert!(simplify::run_policy(&mut graph, &coverage, &policy).unwrap());
    assert!(!graph.contains_edge(y));
    assert_eq!(graph.edge_count(), 2);
}

#[test]
fn chimeric_near_k_bridge_is_removed() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(2));
    let coverage = CoverageIndex::new();
    let v1 = graph.add_vertex(kmer("AA"));
    let v2 = graph.add_vertex(kmer("CA"));
    let v3 = graph.add_vertex(kmer("TC"));
    let v4 = graph.add_vertex(kmer("GG"));
    let x = graph.add_edge(v1, v2, seq("AAACCCA")).unwrap();
    let y = graph.add_edge(v2, v3, seq("CATC")).unwrap();
    let z = graph.add_edge(v3, v4, seq("TCGTGGG")).unwrap();

    let policy = ChimericEdgesRemover::new(2, ChimericConfig { max_overlap: 2 });
    assert!(simplify::run_policy(&mut graph, &coverage, &policy).unwrap());
    assert!(!graph.contains_edge(y));
    assert!(graph.contains_edge(x));
    assert!(graph.contains_edge(z));
    assert_eq!(graph.edge_count(), 4);
}

#[test]
fn topology_remover_trusts_strong_neighbours() {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let coverage = CoverageIndex::new();
    let v0 = graph.add_vertex(kmer("A"));
    let v1 = graph.add_vertex(kmer("C"));
    let v2 = graph.add_vertex(kmer("A"));
    let v3 = graph.add_vertex(kmer("T"));
    let long_in = graph.add_edge(v0, v1, label('A', 'C', 251)).unwrap();
    let e = graph.add_edge(v1, v2, seq("CGGA")).unwrap();
    let long_out = graph.add_edge(v2, v3, label('A', 'T', 251)).unwrap();

    let policy = TopologyBasedChimericEdgeRemover::new(TopologyConfig {
        max_length: 100,
        coverage_gap: 10.0,
        neighbour_length_threshold: 200,
    });
    assert!(simplify::run_policy(&mut graph, &coverage, &policy).unwrap());
    assert!(!graph.contains_edge(e));
    assert!(graph.contains_edge(long_in));
    assert!(graph.contains_edge(long_out));
}

/// U --u(60)--> S --e(3)--> T, with the plausible alternative
/// S --p(20)--> P.
fn unique_entry_graph(
    unique_split: bool,
) -> (DebruijnGraph, CoverageIndex, EdgeId, EdgeId, EdgeId) {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let coverage = CoverageIndex::new();
    let s = graph.add_vertex(kmer("C"));
    let t = graph.add_vertex(kmer("G"));
    let p = graph.add_vertex(kmer("T"));
    let e = graph.add_edge(s, t, seq("CAAG")).unwrap();
    let plausible = graph.add_edge(s, p, label('C', 'T', 21)).unwrap();
    let unique = if unique_split {
        // the unique entry is a chain u0 (30) + u1 (30); each half alone
        // stays below the uniqueness threshold
        let u0 = graph.add_vertex(kmer("A"));
        let u1 = graph.add_vertex(kmer("A"));
        graph.add_edge(u0, u1, label('A', 'A', 31)).unwrap();
        graph.add_edge(u1, s, label('A', 'C', 31)).unwrap()
    } else {
        let u = graph.add_vertex(kmer("A"));
        graph.add_edge(u, s, label('A', 'C', 61)).unwrap()
    };
    (graph, coverage, e, plausible, unique)
}

#[test]
fn unique_entry_with_plausible_alternative_removes_edge() {
    let (mut graph, coverage, e, _, _) = unique_entry_graph(false);
    let policy = NewTopologyBasedChimericEdgeRemover::new(RelativeTopologyConfig {
        max_length: 5,
        uniqueness_length: 50,
        plausibility_length: 10,
    })
    .unwrap();
    assert!(simplify::run_policy(&mut graph, &coverage, &policy).unwrap());
    assert!(!graph.contains_edge(e));
}

#[test]
fn relative_topology_config_is_range_checked() {
    let result = NewTopologyBasedChimericEdgeRemover::new(RelativeTopologyConfig {
        max_length: 20,
        uniqueness_length: 50,
        plausibility_length: 10,
    });
    let error = result.err().expect("max_length above plausibility_length");
    assert!(matches!(
        error.downcast_ref::<AssemblyError>(),
        Some(AssemblyError::ConfigOutOfRange { .. })
    ));
}

#[test]
fn advanced_remover_measures_walks_not_edges() {
    // single-edge uniqueness fails: the entry chain is split in two
    let (mut graph, coverage, e, _, _) = unique_entry_graph(true);
    let config = RelativeTopologyConfig {
        max_length: 5,
        uniqueness_length: 50,
        plausibility_length: 10,
    };
    let plain = NewTopologyBasedChimericEdgeRemover::new(config.clone()).unwrap();
    simplify::run_policy(&mut graph, &coverage, &plain).unwrap();
    assert!(graph.contains_edge(e), "length criterion must not fire");

    // the walk-based criterion accumulates 30 + 30 >= 50 and fires
    let (mut graph, coverage, e, _, _) = unique_entry_graph(true);
    let advanced = AdvancedTopologyChimericEdgeRemover::with_path_finders(
        config,
        DegreeUniquePathFinder,
        LongestContinuationPathFinder,
    )
    .unwrap();
    assert!(simplify::run_policy(&mut graph, &coverage, &advanced).unwrap());
    assert!(!graph.contains_edge(e));
}

/// v1 --I(120)--> v2 --e(3)--> v3 --O(120)--> v4.
fn pair_info_graph() -> (DebruijnGraph, CoverageIndex, EdgeId, EdgeId, EdgeId) {
    let mut graph = DebruijnGraph::new(DebruijnDataMaster::new(1));
    let coverage = CoverageIndex::new();
    let v1 = graph.add_vertex(kmer("A"));
    let v2 = graph.add_vertex(kmer("C"));
    let v3 = graph.add_vertex(kmer("A"));
    let v4 = graph.add_vertex(kmer("T"));
    let i = graph.add_edge(v1, v2, label('A', 'C', 121)).unwrap();
    let e = graph.add_edge(v2, v3, seq("CGGA")).unwrap();
    let o = graph.add_edge(v3, v4, label('A', 'T', 121)).unwrap();
    (graph, coverage, i, e, o)
}

fn pair_info_config() -> PairInfoConfig {
    PairInfoConfig {
        max_length: 5,
        min_neighbour_length: 100,
        insert_size: 400,
        read_length: 100,
    }
}

#[test]
fn missing_pair_info_condemns_short_edge() {
    let (mut graph, coverage, i, e, o) = pair_info_graph();
    let store = PairedInfoStore::new();
    let policy =
        PairInfoAwareErroneousEdgeRemover::new(store, 1, pair_info_config()).unwrap();
    assert!(simplify::run_policy(&mut graph, &coverage, &policy).unwrap());
    assert!(!graph.contains_edge(e));
    assert!(graph.contains_edge(i));
    assert!(graph.contains_edge(o));
}

#[test]
fn compatible_pair_info_saves_short_edge() {
    let (mut graph, coverage, i, e, o) = pair_info_graph();
    let store = PairedInfoStore::new();
    // predicted distance through e: length(I) + length(e) = 123; the
    // filling listener would mirror the observation onto the conjugate
    // strand, so the test does the same
    store.add_observation(i, o, 123.0, 4.0, 0.0);
    store.add_observation(
        graph.conjugate_edge(o),
        graph.conjugate_edge(i),
        123.0,
        4.0,
        0.0,
    );
    let policy =
        PairInfoAwareErroneousEdgeRemover::new(store, 1, pair_info_config()).unwrap();
    simplify::run_policy(&mut graph, &coverage, &policy).unwrap();
    // nothing removed; the whole chain compresses into one edge
    assert_eq!(graph.edge_count(), 2);
    let merged = graph.edges().next().unwrap();
    assert_eq!(graph.length(merged), 243);
    let _ = e;
}

#[test]
fn observation_beyond_library_bounds_is_inconsistent() {
    let (mut graph, coverage, i, _e, o) = pair_info_graph();
    let store = PairedInfoStore::new();
    store.add_observation(i, o, 600.0, 1.0, 0.0);
    let policy =
        PairInfoAwareErroneousEdgeRemover::new(store, 1, pair_info_config()).unwrap();
    let error = simplify::run_policy(&mut graph, &coverage, &policy).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<AssemblyError>(),
        Some(AssemblyError::InconsistentPairedInfo { .. })
    ));
}

#[test]
fn pair_info_constructor_enforces_insert_size() {
    let store = PairedInfoStore::new();
    let result = PairInfoAwareErroneousEdgeRemover::new(
        store,
        1,
        PairInfoConfig {
            max_length: 5,
            min_neighbour_length: 100,
            insert_size: 150,
            read_length: 100,
        },
    );
    let error = result.err().expect("insert size below twice read length");
    assert!(matches!(
        error.downcast_ref::<AssemblyError>(),
        Some(AssemblyError::ConfigOutOfRange { .. })
    ));
}

#[test]
fn paired_store_is_symmetric() {
    let store = PairedInfoStore::new();
    let e1 = EdgeId(3);
    let e2 = EdgeId(7);
    store.add_observation(e1, e2, 42.0, 1.0, 2.0);
    store.add_observation(e1, e2, 42.0, 2.0, 2.0);

    let forward = store.pair_info(e1, e2);
    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].d, 42.0);
    assert_eq!(forward[0].weight, 3.0);

    let backward = store.pair_info(e2, e1);
    assert_eq!(backward[0].d, -42.0);
}
