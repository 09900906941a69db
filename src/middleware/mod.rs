/// Middleware module
///
/// The role-gating access middleware and request logging.

mod auth_gate;
mod request_logger;

pub use auth_gate::ensure_owner_or_admin;
pub use auth_gate::role_permitted;
pub use auth_gate::RequireRoles;
pub use request_logger::RequestLogger;
