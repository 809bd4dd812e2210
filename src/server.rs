//! HTTP dispatcher
//!
//! Routes:
//!   POST /tree                                   body = notation → tree id
//!   GET  /tree/{id}/common-ancestor/{v1}/{v2}   → ancestor value
//!   GET  /version                                → schema version
//!   GET  /test                                   → `OK`
//!
//! Replies are plain text. The controller is shared behind a mutex and
//! driven on the blocking pool, since every call touches SQLite.

use std::sync::Mutex;

use actix_web::http::header::ContentType;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, ResponseError};
use tracing::{error, info, warn};

use crate::config::ServiceConfig;
use crate::repository::{RepositoryError, SqliteRepository};
use crate::route::{IdCodec, RouteError, TreeController};
use crate::tree::TreeError;

/// Controller shared across workers
pub type SharedController = web::Data<Mutex<TreeController<SqliteRepository>>>;

/// Open the configured database and wrap it in a shared controller
pub fn shared_state(config: &ServiceConfig) -> Result<SharedController, RepositoryError> {
    let repo = SqliteRepository::open(&config.database)?;
    Ok(shared(repo, IdCodec::new(config.instance_prefix.as_str())))
}

/// Shared controller over an already opened repository
pub fn shared(repo: SqliteRepository, ids: IdCodec) -> SharedController {
    web::Data::new(Mutex::new(TreeController::new(repo, ids)))
}

/// Register the tree routes on an actix application
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/tree", web::post().to(post_tree))
        .route(
            "/tree/{id}/common-ancestor/{first}/{second}",
            web::get().to(common_ancestor),
        )
        .route("/version", web::get().to(version))
        .route("/test", web::get().to(health))
        .default_service(web::to(not_found));
}

/// Serve until shutdown
pub async fn run(config: ServiceConfig, state: SharedController) -> std::io::Result<()> {
    info!(
        address = %config.bind_address,
        port = config.port,
        database = %config.database.display(),
        instance = %config.instance_prefix,
        "starting tree service"
    );

    let mut server =
        HttpServer::new(move || App::new().app_data(state.clone()).configure(configure));
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }
    server.bind(config.socket_address())?.run().await
}

async fn with_controller<T, F>(state: SharedController, f: F) -> Result<T, RouteError>
where
    F: FnOnce(&mut TreeController<SqliteRepository>) -> Result<T, RouteError> + Send + 'static,
    T: Send + 'static,
{
    web::block(move || {
        let mut controller = state
            .lock()
            .map_err(|_| RouteError::Unavailable("controller lock poisoned".to_string()))?;
        f(&mut *controller)
    })
    .await
    .map_err(|err| RouteError::Unavailable(err.to_string()))?
}

fn text(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type(ContentType::plaintext())
        .body(body)
}

async fn post_tree(state: SharedController, body: String) -> Result<HttpResponse, RouteError> {
    let id = with_controller(state, move |controller| controller.post_tree(&body)).await?;
    Ok(text(id))
}

async fn common_ancestor(
    state: SharedController,
    req: HttpRequest,
) -> Result<HttpResponse, RouteError> {
    let path = req.path().to_string();
    let value = with_controller(state, move |controller| controller.common_ancestor(&path)).await?;
    Ok(text(value))
}

async fn version(state: SharedController) -> Result<HttpResponse, RouteError> {
    let version = with_controller(state, |controller| controller.version()).await?;
    Ok(text(version))
}

async fn health() -> HttpResponse {
    text("OK".to_string())
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type(ContentType::plaintext())
        .body("Not found")
}

impl ResponseError for RouteError {
    fn status_code(&self) -> StatusCode {
        match self {
            RouteError::Uri(_)
            | RouteError::Tree(TreeError::Notation(_))
            | RouteError::Tree(TreeError::Cycle { .. }) => StatusCode::BAD_REQUEST,
            RouteError::UnknownTree(_) | RouteError::Tree(TreeError::NoCommonAncestor { .. }) => {
                StatusCode::NOT_FOUND
            }
            RouteError::Tree(TreeError::Repository(err)) | RouteError::Repository(err)
                if err.is_not_found() =>
            {
                StatusCode::NOT_FOUND
            }
            RouteError::Tree(TreeError::Repository(_))
            | RouteError::Tree(TreeError::CorruptLinks { .. })
            | RouteError::Repository(_)
            | RouteError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "request rejected");
        }
        HttpResponse::build(status)
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let missing = RouteError::Repository(RepositoryError::MissingConfig("version"));
        assert_eq!(missing.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let absent = RouteError::Repository(RepositoryError::TreeNotFound("7".to_string()));
        assert_eq!(absent.status_code(), StatusCode::NOT_FOUND);

        let corrupt = RouteError::Tree(TreeError::CorruptLinks { value: 1 });
        assert_eq!(corrupt.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
