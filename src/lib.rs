pub mod copy;
pub mod filename;
pub mod mapping;
pub mod telemetry;

pub use filename::normalize;
pub use mapping::NameMapping;
