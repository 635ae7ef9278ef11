/// Router Module Index
///
/// Routes are grouped by the access level they require. Each protected group
/// is wrapped in its middleware in `create_router`, so a handler can never be
/// mounted without its check.

/// Routes open to anonymous callers.
pub mod public;

/// Routes requiring a valid access token.
pub mod authenticated;

/// Routes requiring a token whose user has the moderator or admin role.
pub mod moderator;

/// Routes requiring a token whose user has the admin role.
pub mod admin;
