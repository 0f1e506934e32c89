pub mod evaluator;
pub mod registry;

pub use evaluator::{resolve, EffectivePermissions, PermissionOverride};
pub use registry::{hierarchy_defaults, Permission, Resource};
