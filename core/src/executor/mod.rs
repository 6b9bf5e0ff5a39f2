//! Fan-out primitives and output rendering seams used by the wave scheduler.
//!
//! ```text
//! wave tasks ─► map_with_concurrency (≤ C in flight) ─► results in input order
//!                     │
//!                     └─ WorkflowEvent ─► OutputRendererPlugin
//! ```

mod pool;
pub mod traits;

pub use pool::map_with_concurrency;
pub use traits::OutputRendererPlugin;
