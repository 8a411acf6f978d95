//! Example construction: splitting, tensor layout, batching, corpora

pub mod batch;
pub mod boundaries;
pub mod builder;
pub mod conll;
pub mod example;
pub mod vocab;

pub use batch::*;
pub use boundaries::*;
pub use builder::*;
pub use conll::*;
pub use example::*;
pub use vocab::*;
