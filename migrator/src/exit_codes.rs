//! Stable exit codes for migrator CLI commands.

/// Command succeeded; for `status`, the state is up to date.
pub const OK: i32 = 0;
/// Command failed due to unreadable state/config, an invalid registry or other errors.
pub const INVALID: i32 = 1;
/// `migrator migrate` stopped at a failing step; the partial state was kept.
pub const PARTIAL: i32 = 2;
/// `migrator status` found a state that needs migration.
pub const PENDING: i32 = 3;
/// The state is newer than every known migration; it was left unchanged.
pub const AHEAD: i32 = 4;
