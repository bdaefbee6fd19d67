pub mod api;
pub mod chart;
pub mod domain;
pub mod error;
pub mod experiment;
pub mod output;
pub mod parser;
pub mod pipeline;
