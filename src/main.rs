#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use medscan::{
    authentication::{AuthenticationServiceFactory, AuthenticationServices},
    configure_services,
    settings::MedscanSettings,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = MedscanSettings::load()
        .map_err(|e| std::io::Error::other(format!("Failed to load settings: {e:#}")))?;

    let services = AuthenticationServiceFactory::create_services(&settings)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to initialize services: {e:#}")))?;

    start_server(services, settings).await
}

/// Start the server with stateless sessions
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    services: AuthenticationServices,
    settings: MedscanSettings,
) -> std::io::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, &settings, &services);

    // Credentialed CORS for the web client
    let cors_origins = settings.get_cors_origins();

    let session_manager = web::Data::new(services.session_manager);
    let notifier = web::Data::new(services.notifier);
    let identity = services.identity.map(web::Data::new);

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        let mut app = App::new()
            .app_data(session_manager.clone())
            .app_data(notifier.clone());
        if let Some(identity) = &identity {
            app = app.app_data(identity.clone());
        }

        app.wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn print_startup_info(
    bind_address: &str,
    settings: &MedscanSettings,
    services: &AuthenticationServices,
) {
    println!("Starting medscan {} on http://{bind_address}", medscan::VERSION);
    println!("Session lifetime: {}s", settings.session.session_ttl_seconds);
    println!();
    println!("Auth endpoints:");
    println!("  POST /api/auth/login          - Email/password login");
    println!("  POST /api/auth/logout         - Clear session cookie");
    println!("  GET  /api/auth/me             - Current user");
    if services.identity.is_some() {
        println!("  GET  /api/oauth/callback      - OAuth callback");
        println!(
            "  Identity service: {}",
            settings.identity.oauth_server_url
        );
    }
    println!();
    println!("System endpoints:");
    println!("  POST /api/system/health       - Health check");
    println!("  POST /api/system/notify-owner - Notify owner (admin only)");
}
