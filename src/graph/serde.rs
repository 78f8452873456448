//! Binary cache of a built CSR graph, so repeated benchmark runs skip the
//! text or `.gr` parsing step.

use crate::error::{serde_error, DeltaSurgeError};
use crate::graph::CsrGraph;
use crate::util::io::{create_writer, open_reader};
use crate::util::timer::PhaseTimer;
use log::info;

pub fn save_cache(graph: &CsrGraph, file_path: &str) -> Result<(), DeltaSurgeError> {
    info!("Serializing graph to '{}'", file_path);
    let timer = PhaseTimer::start();
    let writer = create_writer(file_path)?;
    bincode::serialize_into(writer, graph)
        .map_err(|e| serde_error(format!("Could not serialize graph to '{}': {}", file_path, e)))?;
    info!("Serialized graph in {}", timer.stop().seconds_string());
    Ok(())
}

pub fn load_cache(file_path: &str) -> Result<CsrGraph, DeltaSurgeError> {
    info!("Deserializing graph from '{}'", file_path);
    let timer = PhaseTimer::start();
    let reader = open_reader(file_path)?;
    let graph: CsrGraph = bincode::deserialize_from(reader).map_err(|e| {
        serde_error(format!("Could not deserialize graph from '{}': {}", file_path, e))
    })?;
    info!("Deserialized graph in {}", timer.stop().seconds_string());
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use crate::graph::serde::{load_cache, save_cache};
    use crate::graph::CsrGraph;
    use ds_engine_api::GraphAccess;

    #[test]
    fn cache_round_trip() {
        let graph =
            CsrGraph::from_edges(3, &[(0, 1, 4), (1, 2, 6), (0, 2, 11)]).expect("Valid graph");
        let mut path = std::env::temp_dir();
        path.push(format!("deltasurge_{}_cache.bin", std::process::id()));
        let path = path.to_str().expect("Valid path").to_string();

        save_cache(&graph, &path).expect("Save should succeed");
        let reloaded = load_cache(&path).expect("Load should succeed");
        assert_eq!(reloaded.vertex_count(), 3);
        assert_eq!(
            reloaded.out_edges(0).iter().collect::<Vec<_>>(),
            graph.out_edges(0).iter().collect::<Vec<_>>()
        );
        std::fs::remove_file(&path).expect("Cleanup");
    }
}
