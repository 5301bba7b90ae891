//! PhaseFlow core
//!
//! Data model shared by every PhaseFlow crate: the environment being deployed,
//! per-service contexts, the typed results each lifecycle phase produces, and
//! the dependency planner that turns declared dependencies into deploy levels.
//!
//! ```text
//!   Environment ──► DeployOrder::plan ──► [[level 0], [level 1], ...]
//!        │
//!        └── ServiceContext ──► PreDeployContext / BindContext / DeployContext / ...
//! ```

pub mod error;
pub mod model;
pub mod order;
pub mod tagging;

pub use error::{CoreError, Result};
pub use model::*;
pub use order::DeployOrder;
pub use tagging::{effective_tags, missing_required_tags};
