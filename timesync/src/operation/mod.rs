/// This module represents the main use cases of the tool, with a submodule
/// for each one of them.
pub mod sync;
