pub mod params;
pub mod registry;

pub use params::ParamMap;
pub use registry::ComponentRegistry;
