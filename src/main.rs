#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_web::{middleware::Logger, web, App, HttpServer};
use passkey_provider::{
    handlers::configure_services,
    passkey::{LogAnnouncer, OnceAnnouncer, PasskeyProvider, ProviderAnnouncer},
    settings::PasskeySettings,
    utils::logging::LoggingHelper,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = PasskeySettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e}")))?;
    LoggingHelper::log_startup(&settings);

    let provider = PasskeyProvider::from_settings(&settings)
        .map_err(|e| std::io::Error::other(format!("Failed to initialize provider: {e}")))?;

    // The platform may forget the provider after an update; announce once per process
    let announcer = OnceAnnouncer::new(LogAnnouncer);
    if let Err(e) = announcer.announce(provider.provider_name()) {
        log::warn!("Continuing without provider announcement: {e}");
    }

    start_server(provider, &settings).await
}

/// Start the provider bridge
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(provider: PasskeyProvider, settings: &PasskeySettings) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address);

    let provider = web::Data::new(provider);
    HttpServer::new(move || {
        App::new()
            .app_data(provider.clone())
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(bind_address: &str) {
    println!("Starting passkey provider on http://{bind_address}");
    println!();
    println!("Provider endpoints:");
    println!("  POST /provider/get/begin    - List passkeys for a request");
    println!("  POST /provider/get          - Sign an assertion");
    println!("  POST /provider/create/begin - Describe the create entry");
    println!("  POST /provider/create       - Register a passkey");
    println!("  POST /provider/clear        - Clear credential state");
    println!("  (PIN in the X-Verification-Pin header)");
    println!();
    println!("System endpoints:");
    println!("  GET  /ping                  - Health check");
}
