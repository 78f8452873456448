use crate::error::{config_error, DeltaSurgeError};
use clap::arg_enum;
use derive_new::new;
use ds_engine_api::{GraphAccess, VertexId};

arg_enum! {
    /// The full matrix of engine variants: (CAS vs lock-protected writes) x
    /// (OBIM vs plain chunked FIFO) x (plain vs marking/hash/ordered
    /// work-set) x (empty-work-discarding vs blind), plus the serial
    /// baseline and the push-pull operator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Algo {
        Serial,
        Async,
        AsyncFifo,
        AsyncBlindObim,
        AsyncBlindFifo,
        AsyncBlindFifoHSet,
        AsyncBlindFifoMSet,
        AsyncBlindFifoOSet,
        AsyncBlindObimHSet,
        AsyncBlindObimMSet,
        AsyncBlindObimOSet,
        AsyncWithCas,
        AsyncWithCasFifo,
        AsyncWithCasBlindObim,
        AsyncWithCasBlindFifo,
        AsyncWithCasBlindFifoHSet,
        AsyncWithCasBlindFifoMSet,
        AsyncWithCasBlindFifoOSet,
        AsyncWithCasBlindObimHSet,
        AsyncWithCasBlindObimMSet,
        AsyncWithCasBlindObimOSet,
        AsyncPP,
    }
}

arg_enum! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum GraphFormat {
        Gr,
        Csv,
        Bin,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    Obim,
    Fifo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkSetKind {
    None,
    Marking,
    Hash,
    Ordered,
}

impl Algo {
    /// Whether destination cells are updated with compare-and-swap. The
    /// remaining parallel variants serialize each update behind the
    /// destination's vertex lock instead.
    pub fn uses_cas(self) -> bool {
        use Algo::*;
        matches!(
            self,
            AsyncWithCas
                | AsyncWithCasFifo
                | AsyncWithCasBlindObim
                | AsyncWithCasBlindFifo
                | AsyncWithCasBlindFifoHSet
                | AsyncWithCasBlindFifoMSet
                | AsyncWithCasBlindFifoOSet
                | AsyncWithCasBlindObimHSet
                | AsyncWithCasBlindObimMSet
                | AsyncWithCasBlindObimOSet
                | AsyncPP
        )
    }

    /// Blind variants queue bare vertices and skip the empty-work gate.
    pub fn is_blind(self) -> bool {
        use Algo::*;
        matches!(
            self,
            AsyncBlindObim
                | AsyncBlindFifo
                | AsyncBlindFifoHSet
                | AsyncBlindFifoMSet
                | AsyncBlindFifoOSet
                | AsyncBlindObimHSet
                | AsyncBlindObimMSet
                | AsyncBlindObimOSet
                | AsyncWithCasBlindObim
                | AsyncWithCasBlindFifo
                | AsyncWithCasBlindFifoHSet
                | AsyncWithCasBlindFifoMSet
                | AsyncWithCasBlindFifoOSet
                | AsyncWithCasBlindObimHSet
                | AsyncWithCasBlindObimMSet
                | AsyncWithCasBlindObimOSet
        )
    }

    pub fn scheduler(self) -> SchedulerKind {
        use Algo::*;
        match self {
            AsyncFifo | AsyncBlindFifo | AsyncBlindFifoHSet | AsyncBlindFifoMSet
            | AsyncBlindFifoOSet | AsyncWithCasFifo | AsyncWithCasBlindFifo
            | AsyncWithCasBlindFifoHSet | AsyncWithCasBlindFifoMSet
            | AsyncWithCasBlindFifoOSet => SchedulerKind::Fifo,
            _ => SchedulerKind::Obim,
        }
    }

    pub fn work_set(self) -> WorkSetKind {
        use Algo::*;
        match self {
            AsyncBlindFifoHSet | AsyncBlindObimHSet | AsyncWithCasBlindFifoHSet
            | AsyncWithCasBlindObimHSet => WorkSetKind::Hash,
            AsyncBlindFifoMSet | AsyncBlindObimMSet | AsyncWithCasBlindFifoMSet
            | AsyncWithCasBlindObimMSet => WorkSetKind::Marking,
            AsyncBlindFifoOSet | AsyncBlindObimOSet | AsyncWithCasBlindFifoOSet
            | AsyncWithCasBlindObimOSet => WorkSetKind::Ordered,
            _ => WorkSetKind::None,
        }
    }
}

/// Everything the driver needs for one run, threaded explicitly through the
/// engine instead of living in process-wide globals.
#[derive(Debug, Clone, Copy, new)]
pub struct RunConfig {
    pub algo: Algo,
    pub start_vertex: VertexId,
    pub report_vertex: VertexId,
    pub delta_shift: u32,
    pub threads: usize,
    pub skip_verify: bool,
}

impl RunConfig {
    /// Fails fast, before any parallel work starts.
    pub fn validate(&self, graph: &impl GraphAccess) -> Result<(), DeltaSurgeError> {
        let vertex_count = graph.vertex_count();
        if self.start_vertex >= vertex_count {
            return Err(config_error(format!(
                "Start vertex {} is out of range for a graph with {} vertices",
                self.start_vertex, vertex_count
            )));
        }
        if self.report_vertex >= vertex_count {
            return Err(config_error(format!(
                "Report vertex {} is out of range for a graph with {} vertices",
                self.report_vertex, vertex_count
            )));
        }
        if self.delta_shift >= 32 {
            return Err(config_error(format!(
                "Delta shift {} must be smaller than the 32 distance bits",
                self.delta_shift
            )));
        }
        if self.threads == 0 {
            return Err(config_error("Thread count must be at least 1".to_string()));
        }
        Ok(())
    }
}
