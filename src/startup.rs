use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;

use crate::configuration::JwtSettings;
use crate::dispatch::Dispatcher;
use crate::middleware::{RequestLogger, RequireRoles};
use crate::routes::{
    admin_login, forgot_password, get_account, get_current_account, health_check, login,
    refresh_token, register, reset_password, update_account, verify_email,
};

pub fn run(
    listener: TcpListener,
    connection: PgPool,
    jwt_config: JwtSettings,
    dispatcher: Dispatcher,
) -> Result<Server, std::io::Error> {
    let connection = web::Data::new(connection);
    let jwt_config_data = web::Data::new(jwt_config.clone());
    let dispatcher = web::Data::new(dispatcher);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)
            // Shared state
            .app_data(connection.clone())
            .app_data(jwt_config_data.clone())
            .app_data(dispatcher.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/register", web::post().to(register))
            .route("/auth/login", web::post().to(login))
            .route("/auth/forgot-password", web::post().to(forgot_password))
            .route("/auth/reset-password", web::post().to(reset_password))
            .route("/auth/verify-email", web::post().to(verify_email))
            .route("/auth/refresh-token", web::post().to(refresh_token))
            .route("/admin/login", web::post().to(admin_login))
            // Protected routes (role-gated)
            .service(
                web::resource("/auth/me")
                    .wrap(RequireRoles::any_authenticated(jwt_config.clone()))
                    .route(web::get().to(get_current_account)),
            )
            .service(
                web::resource("/accounts/{id}")
                    .wrap(RequireRoles::any_authenticated(jwt_config.clone()))
                    .route(web::get().to(get_account))
                    .route(web::put().to(update_account)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
