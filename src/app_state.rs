use std::sync::Arc;

use crate::pipeline::AnalysisPipeline;
use crate::report::GeneratorFactory;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
    pub generators: Arc<dyn GeneratorFactory>,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline, generators: Arc<dyn GeneratorFactory>) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            generators,
        }
    }
}
