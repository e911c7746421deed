pub mod cli;
pub mod collect;
pub mod pipeline;
pub mod report;
