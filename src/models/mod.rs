//! Data models shared by the resolvers, the processing stage and the server.

mod media;

pub use media::{FormatOption, ProcessedFile, ResolveResult};
