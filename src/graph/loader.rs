//! Graph input: the binary CSR-with-inline-edge-data format and plain
//! CSV edge lists.
//!
//! The binary layout is: a header of four little-endian `u64` values
//! `(version, edge_data_size, num_nodes, num_edges)`, followed by
//! `num_nodes` `u64` out-degree prefix sums, `num_edges` `u32` edge
//! destinations, zero padding to the next 8-byte boundary, and `num_edges`
//! 32-bit edge weights.

use crate::config::GraphFormat;
use crate::error::{io_error, load_graph_error, DeltaSurgeError};
use crate::graph::CsrGraph;
use crate::util::io::{create_writer, open_reader, write_bytes};
use crate::util::timer::PhaseTimer;
use ds_engine_api::{EdgeWeight, GraphAccess, VertexId};
use log::info;
use std::convert::{TryFrom, TryInto};
use std::io::Read;

const GR_VERSION: u64 = 1;
const GR_EDGE_DATA_SIZE: u64 = 4;

pub fn load_graph(file_path: &str, format: GraphFormat) -> Result<CsrGraph, DeltaSurgeError> {
    let timer = PhaseTimer::start();
    let graph = match format {
        GraphFormat::Gr => load_gr(file_path),
        GraphFormat::Csv => load_csv(file_path),
        GraphFormat::Bin => crate::graph::serde::load_cache(file_path),
    }?;
    info!(
        "Loaded {} vertices and {} edges from '{}' in {}",
        graph.vertex_count(),
        graph.edge_count(),
        file_path,
        timer.stop().seconds_string()
    );
    Ok(graph)
}

pub fn load_gr(file_path: &str) -> Result<CsrGraph, DeltaSurgeError> {
    let mut reader = open_reader(file_path)?;

    let header = read_u64s(&mut reader, 4, file_path)?;
    let (version, edge_data_size) = (header[0], header[1]);
    if version != GR_VERSION {
        return Err(load_graph_error(format!(
            "Unsupported graph version {} in '{}' (expected {})",
            version, file_path, GR_VERSION
        )));
    }
    if edge_data_size != GR_EDGE_DATA_SIZE {
        return Err(load_graph_error(format!(
            "Unsupported edge data size {} in '{}' (expected {})",
            edge_data_size, file_path, GR_EDGE_DATA_SIZE
        )));
    }
    let num_nodes = usize::try_from(header[2]).expect("Overflow");
    let num_edges = usize::try_from(header[3]).expect("Overflow");

    // The file stores per-vertex end offsets; prepend the implicit zero.
    let ends = read_u64s(&mut reader, num_nodes, file_path)?;
    let mut offsets = Vec::with_capacity(num_nodes + 1);
    offsets.push(0_usize);
    for end in ends {
        offsets.push(usize::try_from(end).expect("Overflow"));
    }

    let dsts = read_u32s(&mut reader, num_edges, file_path)?;
    if num_edges % 2 == 1 {
        // Destinations are padded to an 8-byte boundary.
        let mut padding = [0_u8; 4];
        reader.read_exact(&mut padding).map_err(|e| {
            io_error(format!("Could not read edge padding from '{}': {}", file_path, e))
        })?;
    }
    let weights = read_u32s(&mut reader, num_edges, file_path)?;

    CsrGraph::from_parts(offsets, dsts, weights)
}

/// Writes a graph back out in the binary format; the inverse of `load_gr`.
pub fn write_gr(graph: &CsrGraph, file_path: &str) -> Result<(), DeltaSurgeError> {
    let mut writer = create_writer(file_path)?;
    let num_nodes = graph.vertex_count() as u64;
    let num_edges = graph.edge_count() as u64;
    for value in &[GR_VERSION, GR_EDGE_DATA_SIZE, num_nodes, num_edges] {
        write_bytes(&mut writer, file_path, &value.to_le_bytes())?;
    }
    for end in &graph.offsets()[1..] {
        write_bytes(&mut writer, file_path, &(*end as u64).to_le_bytes())?;
    }
    for vertex in 0..graph.vertex_count() {
        for (dst, _) in graph.out_edges(vertex).iter() {
            write_bytes(&mut writer, file_path, &dst.to_le_bytes())?;
        }
    }
    if num_edges % 2 == 1 {
        write_bytes(&mut writer, file_path, &[0_u8; 4])?;
    }
    for vertex in 0..graph.vertex_count() {
        for (_, weight) in graph.out_edges(vertex).iter() {
            write_bytes(&mut writer, file_path, &weight.to_le_bytes())?;
        }
    }
    Ok(())
}

pub fn load_csv(file_path: &str) -> Result<CsrGraph, DeltaSurgeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(file_path)
        .map_err(|e| io_error(format!("Could not open file '{}' for reading: {}", file_path, e)))?;

    let mut edges = Vec::new();
    let mut max_vertex: VertexId = 0;
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            load_graph_error(format!("Could not read row {} of '{}': {}", row, file_path, e))
        })?;
        if record.len() != 3 {
            return Err(load_graph_error(format!(
                "Expected 'src,dst,weight' but found {} fields at row {} of '{}'",
                record.len(),
                row,
                file_path
            )));
        }
        let src = parse_field::<VertexId>(&record[0], "source vertex", row, file_path)?;
        let dst = parse_field::<VertexId>(&record[1], "destination vertex", row, file_path)?;
        let weight = parse_field::<EdgeWeight>(&record[2], "edge weight", row, file_path)?;
        max_vertex = max_vertex.max(src).max(dst);
        edges.push((src, dst, weight));
    }

    let vertex_count = if edges.is_empty() { 0 } else { max_vertex + 1 };
    CsrGraph::from_edges(vertex_count, &edges)
}

fn parse_field<T: std::str::FromStr>(
    field: &str,
    what: &str,
    row: usize,
    file_path: &str,
) -> Result<T, DeltaSurgeError> {
    field.parse().map_err(|_| {
        load_graph_error(format!(
            "Could not parse {} '{}' at row {} of '{}'",
            what, field, row, file_path
        ))
    })
}

fn read_u64s(
    reader: &mut impl Read,
    count: usize,
    file_path: &str,
) -> Result<Vec<u64>, DeltaSurgeError> {
    let mut bytes = vec![0_u8; count * 8];
    reader.read_exact(&mut bytes).map_err(|e| {
        io_error(format!("Could not read {} u64 values from '{}': {}", count, file_path, e))
    })?;
    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| u64::from_le_bytes(chunk.try_into().expect("Exact chunk")))
        .collect())
}

fn read_u32s(
    reader: &mut impl Read,
    count: usize,
    file_path: &str,
) -> Result<Vec<u32>, DeltaSurgeError> {
    let mut bytes = vec![0_u8; count * 4];
    reader.read_exact(&mut bytes).map_err(|e| {
        io_error(format!("Could not read {} u32 values from '{}': {}", count, file_path, e))
    })?;
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes(chunk.try_into().expect("Exact chunk")))
        .collect())
}
