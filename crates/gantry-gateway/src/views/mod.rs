//! View projections returned to clients.
//!
//! The build view walks the component graph stored with a build and
//! flattens each supported component category into string records; the
//! changes view turns a diff graph into human-readable lines.

pub mod build;
pub mod changes;

pub use build::BuildView;
pub use changes::render_changes;
