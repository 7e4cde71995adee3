//! Compiled pipeline objects and persisted pipeline cache data

pub mod pipeline_cache_data;
pub mod pipeline_state_cache;

pub use pipeline_cache_data::{
    validate_pipeline_cache_data, PipelineCacheHeader, PIPELINE_CACHE_HEADER_SIZE,
    PIPELINE_CACHE_HEADER_VERSION_ONE,
};
pub use pipeline_state_cache::PipelineStateCache;
