use std::sync::Arc;

use nd_core::{Error, InferenceModel, Result};

pub mod deepseek;
pub mod dummy;

pub use deepseek::DeepSeekModel;
pub use dummy::DummyModel;

/// Select an inference model by CLI name. An unknown name is a fatal
/// startup error.
pub fn create_model(name: &str, api_key: Option<String>) -> Result<Arc<dyn InferenceModel>> {
    match name {
        "deepseek" => Ok(Arc::new(DeepSeekModel::new(api_key)?)),
        "dummy" => Ok(Arc::new(DummyModel)),
        other => Err(Error::Inference(format!("unknown model: {}", other))),
    }
}
