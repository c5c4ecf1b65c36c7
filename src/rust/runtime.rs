use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::Result as OrtResult;
use std::sync::OnceLock;

static INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Execution settings for the ONNX Runtime session that hosts the classifier.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub inter_threads: usize,
    pub intra_threads: usize,
    pub optimization_level: GraphOptimizationLevel,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inter_threads: 0, // Let ONNX Runtime decide
            intra_threads: 1,
            optimization_level: GraphOptimizationLevel::Level3,
        }
    }
}

impl Clone for RuntimeConfig {
    fn clone(&self) -> Self {
        Self {
            inter_threads: self.inter_threads,
            intra_threads: self.intra_threads,
            optimization_level: copy_level(&self.optimization_level),
        }
    }
}

fn copy_level(level: &GraphOptimizationLevel) -> GraphOptimizationLevel {
    match level {
        GraphOptimizationLevel::Level1 => GraphOptimizationLevel::Level1,
        GraphOptimizationLevel::Level2 => GraphOptimizationLevel::Level2,
        GraphOptimizationLevel::Level3 => GraphOptimizationLevel::Level3,
        GraphOptimizationLevel::Disable => GraphOptimizationLevel::Disable,
    }
}

fn init_onnx_environment() -> OrtResult<()> {
    ort::init().with_name("phishshield").commit()?;
    Ok(())
}

/// Initializes the process-wide ONNX Runtime environment once.
///
/// Later calls return the outcome of the first one.
pub fn ensure_initialized() -> Result<(), String> {
    INIT.get_or_init(|| {
        init_onnx_environment().map_err(|e| {
            log::error!("Failed to initialize ONNX Runtime environment: {}", e);
            e.to_string()
        })
    })
    .clone()
}

pub fn create_session_builder(config: &RuntimeConfig) -> Result<SessionBuilder, crate::ClassifierError> {
    ensure_initialized().map_err(crate::ClassifierError::ModelError)?;
    let mut builder = Session::builder()?;

    if config.inter_threads > 0 {
        builder = builder.with_inter_threads(config.inter_threads)?;
    }
    if config.intra_threads > 0 {
        builder = builder.with_intra_threads(config.intra_threads)?;
    }

    builder = builder.with_optimization_level(copy_level(&config.optimization_level))?;

    Ok(builder)
}
