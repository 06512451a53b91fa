use thiserror::Error;

/// Problems with the flow description handed to the renderer.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("invalid flow JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate node id `{0}`")]
    DuplicateNode(String),
    #[error("node `{id}` has an invalid machine count {count}")]
    InvalidUnitCount { id: String, count: f32 },
    #[error("link {source_id} -> {target_id} has an invalid throughput {value}")]
    InvalidThroughput {
        source_id: String,
        target_id: String,
        value: f32,
    },
}

/// Failures reported by a layout engine.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout engine failed: {0}")]
    Engine(String),
    #[error("node `{id}` asks for {count} machines, more than the limit of {max}")]
    TooManyUnits { id: String, count: f32, max: f32 },
    #[error("layout engine dropped the request before answering")]
    Cancelled,
    #[error("failed to read recorded layout: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid recorded layout JSON: {0}")]
    Json(#[from] serde_json::Error),
}
