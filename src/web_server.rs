// src/web_server.rs

use crate::controller::{CommandOutcome, MediaSource, PlayerController};
use crate::error::PlayerError;
use actix_files::Files;
use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm, MultipartFormConfig};
use actix_web::{http::StatusCode, middleware::Logger, web, App, HttpResponse, HttpServer};
use log::error;
use serde::Deserialize;
use std::path::Path;

/// Shared controller handed to every handler.
pub type ControllerData = web::Data<PlayerController>;

const INDEX_HTML: &str = include_str!("index.html");
const STATIC_DIR: &str = "static";

#[derive(MultipartForm)]
struct PlayMediaForm {
    uploaded_file: Option<TempFile>,
    server_file_path: Option<Text<String>>,
}

#[derive(Deserialize)]
struct FolderForm {
    folder_path: Option<String>,
}

/// Runs a blocking controller call on actix's thread pool and renders its outcome.
async fn run_command<F>(command: F) -> HttpResponse
where
    F: FnOnce() -> Result<String, PlayerError> + Send + 'static,
{
    let result = match web::block(command).await {
        Ok(result) => result,
        Err(e) => {
            error!("Controller task failed: {}", e);
            return HttpResponse::InternalServerError().json(CommandOutcome {
                success: false,
                message: "Internal error while running the command.".into(),
            });
        }
    };

    let status = match &result {
        Ok(_) => StatusCode::OK,
        Err(e) => e.status_code(),
    };
    HttpResponse::build(status).json(CommandOutcome::from(result))
}

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

async fn status(controller: ControllerData) -> HttpResponse {
    HttpResponse::Ok().json(controller.status())
}

/// `POST /play_media`: an upload wins over a server path when both are sent.
async fn play_media(
    controller: ControllerData,
    MultipartForm(form): MultipartForm<PlayMediaForm>,
) -> HttpResponse {
    let upload = form
        .uploaded_file
        .filter(|f| f.file_name.as_deref().is_some_and(|n| !n.trim().is_empty()));

    let source = match (&upload, form.server_file_path) {
        (Some(file), _) => MediaSource::Upload {
            original_name: file.file_name.clone().unwrap_or_default(),
            temp_path: file.file.path().to_path_buf(),
        },
        (None, Some(path)) => MediaSource::ServerPath(path.into_inner()),
        (None, None) => MediaSource::ServerPath(String::new()),
    };

    run_command(move || {
        // The temp file is removed on drop, so it has to outlive the copy.
        let _upload = upload;
        controller.play_media(source)
    })
    .await
}

async fn play_folder_playlist(
    controller: ControllerData,
    form: web::Form<FolderForm>,
) -> HttpResponse {
    let folder = form.into_inner().folder_path.unwrap_or_default();
    run_command(move || controller.start_folder_playlist(&folder)).await
}

async fn next_playlist_item(controller: ControllerData) -> HttpResponse {
    run_command(move || controller.advance_playlist()).await
}

async fn stop_media(controller: ControllerData) -> HttpResponse {
    run_command(move || controller.stop()).await
}

/// Registers the command and status routes.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/status", web::get().to(status))
        .route("/play_media", web::post().to(play_media))
        .route("/play_folder_playlist", web::post().to(play_folder_playlist))
        .route("/next_playlist_item", web::post().to(next_playlist_item))
        .route("/command/stop", web::post().to(stop_media));
}

/// Configures and starts the Actix web server for the remote.
///
/// # Arguments
///
/// * `host` - The host address to bind the server to.
/// * `port` - The port number to bind the server to.
/// * `controller` - The shared player controller.
/// * `max_upload_bytes` - Upper bound on a multipart request body.
///
/// # Returns
///
/// A `std::io::Result` containing the Actix server instance if binding is successful.
pub fn run_server(
    host: String,
    port: u16,
    controller: ControllerData,
    max_upload_bytes: usize,
) -> std::io::Result<actix_web::dev::Server> {
    let serve_static = Path::new(STATIC_DIR).is_dir();

    let server = HttpServer::new(move || {
        let app = App::new()
            .wrap(Logger::default())
            .app_data(controller.clone())
            .app_data(
                MultipartFormConfig::default()
                    .total_limit(max_upload_bytes)
                    .memory_limit(64 * 1024),
            )
            .configure(routes);
        if serve_static {
            app.service(Files::new("/static", STATIC_DIR))
        } else {
            app
        }
    })
    .bind((host, port))?
    .run();

    Ok(server)
}
