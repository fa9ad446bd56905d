use actix_cors::Cors;
use actix_web::middleware::{Compress, Logger};
use actix_web::{http::header, web, App, HttpServer};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod agreement;
pub mod assembler;
pub mod config;
pub mod pdf;
pub mod session;
pub mod state;

pub use crate::config::AppConfig;
pub use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::session::handlers::create_session,
        crate::session::handlers::get_session,
        crate::session::handlers::load_sample,
        crate::session::handlers::generate_agreement,
        crate::session::handlers::generate_agreement_form
    ),
    components(
        schemas(
            session::models::AgreementRequest,
            session::models::SignaturePayload,
            session::models::SessionResponse,
            session::models::AgreementFormUpload,
            agreement::SampleData,
            agreement::SignatureMethod,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Agreement Sessions", description = "Form session endpoints."),
        (name = "Agreements", description = "Agreement PDF generation endpoints.")
    ),
    servers(
        (url = "http://127.0.0.1:8080", description = "Localhost")
    )
)]
pub struct ApiDoc;

fn cors(config: &AppConfig) -> Cors {
    config
        .cors_allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .expose_headers(vec![
            header::CONTENT_DISPOSITION,
            header::HeaderName::from_static("x-agreement-filename"),
            header::HeaderName::from_static("x-agreement-id"),
            header::HeaderName::from_static("x-pdf-count"),
            header::HeaderName::from_static("x-agreement-warnings"),
        ])
        .max_age(3600)
}

pub async fn run() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let app_state = web::Data::new(AppState::from_config(&config));
    log::info!(
        "Writing agreements to {}",
        app_state.assembler.output_dir().display()
    );
    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let bind = (config.host.clone(), config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Compress::default())
            .wrap(Logger::default())
            .wrap(cors(&config))
            .app_data(app_state.clone())
            .service(web::scope("/api").configure(session::handlers::config))
            .configure(session::handlers::pages)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind(bind)?
    .run()
    .await
}
