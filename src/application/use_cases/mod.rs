pub mod analyze;
pub mod export;
pub mod ingest;
pub mod mapping_oracle;
pub mod merge;
pub mod merge_engine;
