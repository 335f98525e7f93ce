//! Statement assembly and the end-to-end parsing pipeline.

pub mod assemble;
pub mod clock;
pub mod pipeline;
