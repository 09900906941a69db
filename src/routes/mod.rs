mod accounts;
mod admin;
pub mod auth;
mod health_check;

pub use accounts::get_account;
pub use accounts::update_account;
pub use admin::admin_login;
pub use auth::{
    forgot_password, get_current_account, login, refresh_token, register, reset_password,
    verify_email,
};
pub use health_check::health_check;
