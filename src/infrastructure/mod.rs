pub mod bootstrap;
pub mod config;
pub mod csv;
pub mod excel;
pub mod llm_clients;
pub mod response;
