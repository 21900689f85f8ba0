pub mod metrics;
pub mod model;
pub mod providers;

pub use model::TextModel;
