mod batch;
mod clean;
mod markdown;
mod paths;
mod pipeline;
mod render;
mod worker;

pub use batch::Batch;
