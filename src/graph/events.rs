//! Graph mutation events and handler machinery
//! ===========================================
//!
//! Every mutation primitive of the conjugate graph publishes a typed
//! [`GraphEvent`] to the registered [`GraphHandler`]s, in registration
//! order. Dispatch goes through the [`PairedHandlerApplier`], which
//! duplicates each single-strand event across the (entity, conjugate)
//! pair so handlers observe mutations consistently on both strands.
//! `VertexSplit` is the exception: the split primitive mirrors its whole
//! event sequence on the conjugate side explicitly, so the applier passes
//! it through untouched.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::graph::conjugate::{ConjugateGraph, DataMaster, EdgeId, VertexId};

/// Typed mutation event. Removal events fire while the entity is still
/// present so handlers can read its data.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    VertexAdded(VertexId),
    VertexRemoved(VertexId),
    EdgeAdded(EdgeId),
    EdgeRemoved(EdgeId),
    /// Fired before the `VertexAdded`/`EdgeAdded` events of the same
    /// split so handlers can distribute derived weight over the
    /// pre-mutation topology. `clones` pairs each splitting edge with
    /// its re-routed clone.
    VertexSplit {
        new_vertex: VertexId,
        clones: Vec<(EdgeId, EdgeId)>,
        coefficients: Vec<f64>,
        old_vertex: VertexId,
    },
    /// A path was contracted into `new_edge`; the path edges are still
    /// present and their removal events follow.
    Merge {
        path: Vec<EdgeId>,
        new_edge: EdgeId,
    },
    /// `removed` is about to be folded onto the parallel edge `kept`.
    Glue { removed: EdgeId, kept: EdgeId },
}

/// A stateful observer of graph mutations.
pub trait GraphHandler<M: DataMaster>: Send {
    fn handle(&mut self, graph: &ConjugateGraph<M>, event: &GraphEvent);
}

/// Shared, ordered handler registration.
pub type GraphHandlerRef<M> = Arc<Mutex<dyn GraphHandler<M>>>;

/// Wraps a handler reference for registration.
pub fn handler_ref<M: DataMaster, H: GraphHandler<M> + 'static>(handler: H) -> GraphHandlerRef<M> {
    Arc::new(Mutex::new(handler))
}

/// Dispatch strategy that re-fires each event on the conjugate strand.
pub struct PairedHandlerApplier;

impl PairedHandlerApplier {
    pub fn apply<M: DataMaster>(
        graph: &ConjugateGraph<M>,
        handler: &mut dyn GraphHandler<M>,
        event: &GraphEvent,
    ) {
        handler.handle(graph, event);
        if let Some(twin) = Self::conjugate_event(graph, event) {
            handler.handle(graph, &twin);
        }
    }

    /// The conjugate-strand image of `event`, or `None` when the event
    /// is its own image (self-conjugate entity, or an event the
    /// mutation primitive mirrors explicitly).
    fn conjugate_event<M: DataMaster>(
        graph: &ConjugateGraph<M>,
        event: &GraphEvent,
    ) -> Option<GraphEvent> {
        match event {
            GraphEvent::VertexAdded(v) => {
                let twin = graph.conjugate_vertex(*v);
                (twin != *v).then_some(GraphEvent::VertexAdded(twin))
            }
            GraphEvent::VertexRemoved(v) => {
                let twin = graph.conjugate_vertex(*v);
                (twin != *v).then_some(GraphEvent::VertexRemoved(twin))
            }
            GraphEvent::EdgeAdded(e) => {
                let twin = graph.conjugate_edge(*e);
                (twin != *e).then_some(GraphEvent::EdgeAdded(twin))
            }
            GraphEvent::EdgeRemoved(e) => {
                let twin = graph.conjugate_edge(*e);
                (twin != *e).then_some(GraphEvent::EdgeRemoved(twin))
            }
            GraphEvent::Merge { path, new_edge } => {
                let twin = graph.conjugate_edge(*new_edge);
                if twin == *new_edge {
                    return None;
                }
                let rc_path: Vec<EdgeId> = path
                    .iter()
                    .rev()
                    .map(|&e| graph.conjugate_edge(e))
                    .collect();
                Some(GraphEvent::Merge {
                    path: rc_path,
                    new_edge: twin,
                })
            }
            GraphEvent::Glue { removed, kept } => {
                let rc_removed = graph.conjugate_edge(*removed);
                (rc_removed != *removed).then_some(GraphEvent::Glue {
                    removed: rc_removed,
                    kept: graph.conjugate_edge(*kept),
                })
            }
            // the split primitive fires the conjugate sequence itself
            GraphEvent::VertexSplit { .. } => None,
        }
    }
}
