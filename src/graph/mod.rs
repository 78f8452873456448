use crate::error::{graph_error, DeltaSurgeError};
use ds_engine_api::{EdgeSlice, EdgeWeight, GraphAccess, VertexId};
use serde_derive::{Deserialize, Serialize};
use std::convert::TryFrom;

pub mod generate;
pub mod loader;
pub mod serde;

/// Compressed sparse-row adjacency storage: one offsets array of length
/// `vertex_count + 1` and parallel destination/weight arrays. Read-only for
/// the lifetime of a run, so workers share it by reference without
/// synchronization.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct CsrGraph {
    offsets: Vec<usize>,
    dsts: Vec<VertexId>,
    weights: Vec<EdgeWeight>,
}

impl CsrGraph {
    pub fn from_parts(
        offsets: Vec<usize>,
        dsts: Vec<VertexId>,
        weights: Vec<EdgeWeight>,
    ) -> Result<Self, DeltaSurgeError> {
        if offsets.is_empty() {
            return Err(graph_error("Offsets array cannot be empty".to_string()));
        }
        if offsets[0] != 0 || *offsets.last().expect("Non-empty") != dsts.len() {
            return Err(graph_error(format!(
                "Offsets array does not span the {} edges",
                dsts.len()
            )));
        }
        if offsets.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(graph_error("Offsets array is not monotone".to_string()));
        }
        if dsts.len() != weights.len() {
            return Err(graph_error(format!(
                "{} destinations but {} weights",
                dsts.len(),
                weights.len()
            )));
        }
        let vertex_count = offsets.len() - 1;
        if let Some(bad) = dsts.iter().find(|&&dst| dst as usize >= vertex_count) {
            return Err(graph_error(format!(
                "Edge destination {} is out of range for {} vertices",
                bad, vertex_count
            )));
        }
        Ok(Self { offsets, dsts, weights })
    }

    /// Builds a CSR graph from an unsorted edge list. Edges keep their input
    /// order within each source vertex.
    pub fn from_edges(
        vertex_count: VertexId,
        edges: &[(VertexId, VertexId, EdgeWeight)],
    ) -> Result<Self, DeltaSurgeError> {
        let n = vertex_count as usize;
        for &(src, dst, _) in edges {
            if src >= vertex_count || dst >= vertex_count {
                return Err(graph_error(format!(
                    "Edge ({} -> {}) is out of range for {} vertices",
                    src, dst, vertex_count
                )));
            }
        }

        let mut offsets = vec![0_usize; n + 1];
        for &(src, _, _) in edges {
            offsets[src as usize + 1] += 1;
        }
        for index in 1..=n {
            offsets[index] += offsets[index - 1];
        }

        let mut cursors = offsets.clone();
        let mut dsts = vec![0 as VertexId; edges.len()];
        let mut weights = vec![0 as EdgeWeight; edges.len()];
        for &(src, dst, weight) in edges {
            let slot = cursors[src as usize];
            dsts[slot] = dst;
            weights[slot] = weight;
            cursors[src as usize] = slot + 1;
        }

        Ok(Self { offsets, dsts, weights })
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }
}

impl GraphAccess for CsrGraph {
    fn vertex_count(&self) -> VertexId {
        VertexId::try_from(self.offsets.len() - 1).expect("Overflow")
    }

    fn edge_count(&self) -> usize {
        self.dsts.len()
    }

    #[inline(always)]
    fn out_edges(&self, vertex: VertexId) -> EdgeSlice<'_> {
        let start = self.offsets[vertex as usize];
        let end = self.offsets[vertex as usize + 1];
        EdgeSlice { dsts: &self.dsts[start..end], weights: &self.weights[start..end] }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::CsrGraph;
    use ds_engine_api::GraphAccess;

    #[test]
    fn build_from_edges() {
        let graph =
            CsrGraph::from_edges(4, &[(0, 1, 2), (1, 2, 3), (2, 3, 4), (0, 3, 9)]).expect("Valid");
        assert_eq!(graph.vertex_count(), 4);
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.out_edges(0).iter().collect::<Vec<_>>(), vec![(1, 2), (3, 9)]);
        assert_eq!(graph.out_edges(1).iter().collect::<Vec<_>>(), vec![(2, 3)]);
        assert_eq!(graph.out_edges(3).len(), 0);
    }

    #[test]
    fn reject_out_of_range_edges() {
        assert!(CsrGraph::from_edges(2, &[(0, 5, 1)]).is_err());
        assert!(CsrGraph::from_parts(vec![0, 1], vec![3], vec![1]).is_err());
    }

    #[test]
    fn reject_inconsistent_parts() {
        assert!(CsrGraph::from_parts(vec![0, 2], vec![0], vec![1]).is_err());
        assert!(CsrGraph::from_parts(vec![0, 1], vec![0], vec![1, 2]).is_err());
        assert!(CsrGraph::from_parts(vec![0, 2, 1], vec![0, 0], vec![1, 1]).is_err());
    }
}
