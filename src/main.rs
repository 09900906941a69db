use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;

use mentorhub::configuration::get_configuration;
use mentorhub::dispatch::Dispatcher;
use mentorhub::email_client::EmailClient;
use mentorhub::startup::run;
use mentorhub::telemetry::init_telemetry;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let connection_string = configuration.database.connection_string();
    tracing::info!("Attempting to connect to database");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&connection_string)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;

    tracing::info!("Database connection pool created successfully");

    // queue-backed dispatcher when a relay is configured, no-op otherwise
    let dispatcher = if configuration.email.enabled {
        let email_client = EmailClient::new(
            configuration.email.relay_url.clone(),
            configuration.email.sender.clone(),
            reqwest::Client::new(),
        );
        Dispatcher::spawn(email_client)
    } else {
        tracing::warn!("email dispatch disabled; using no-op dispatcher");
        Dispatcher::noop()
    };

    let address = format!("127.0.0.1:{}", configuration.application.port);
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let jwt_config = configuration.jwt.clone();

    let server = run(listener, pool, jwt_config, dispatcher)?;
    tracing::info!("Server started successfully");

    let _ = server.await;

    Ok(())
}
