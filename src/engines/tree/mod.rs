mod node;
#[allow(clippy::module_inception)]
mod tree;

pub use node::Node;
pub use tree::Tree;
