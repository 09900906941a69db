/// Credential store module
///
/// Owns every query against the `accounts` table plus the append-only
/// audit log. All mutations that must be atomic (email verification,
/// password reset, refresh rotation) are single conditional UPDATEs so no
/// partial state is ever observable.

mod accounts;
mod audit;

pub use accounts::Account;
pub use accounts::Role;
pub use accounts::create_account;
pub use accounts::current_token_version;
pub use accounts::find_by_email;
pub use accounts::find_by_id;
pub use accounts::record_last_login;
pub use accounts::reset_password_with_token;
pub use accounts::rotate_refresh_token;
pub use accounts::set_reset_token;
pub use accounts::set_verification_token;
pub use accounts::store_refresh_token;
pub use accounts::update_profile;
pub use accounts::verify_email_with_token;
pub use audit::record_audit;
