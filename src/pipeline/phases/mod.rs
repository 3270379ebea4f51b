//! Pipeline phases, in execution order

pub mod bundle;
pub mod compile;
pub mod fanout;
pub mod manifest;

pub use bundle::BundlePhase;
pub use compile::CompilePhase;
pub use fanout::FanoutPhase;
pub use manifest::ManifestPhase;
