//! Access policy for lesson/exercise mutation and grading.
//!
//! Pure functions over caller-supplied facts: the actor's id and role, and
//! the owning teacher id of the target resource. No database access happens
//! here; callers resolve the owner and translate `false` into a 403.

use crate::db::Role;

/// Whether `actor` may update or delete a resource owned by `owner_id`.
///
/// Admins may mutate anything; teachers only what they own; students nothing.
pub fn can_mutate(actor_id: i64, actor_role: Role, owner_id: i64) -> bool {
    match actor_role {
        Role::Admin => true,
        Role::Teacher => actor_id == owner_id,
        Role::Student => false,
    }
}

pub fn can_create_lesson(role: Role) -> bool {
    matches!(role, Role::Teacher | Role::Admin)
}

/// Teachers only. Admins can create lessons but not exercises; the
/// asymmetry is inherited product behavior and kept as-is.
pub fn can_create_exercise(role: Role) -> bool {
    matches!(role, Role::Teacher)
}

pub fn can_assign_points(role: Role) -> bool {
    matches!(role, Role::Teacher)
}
