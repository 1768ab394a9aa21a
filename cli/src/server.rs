//! The web form: `GET /`, `POST /generate`, `GET /health`.

use crate::config::Config;
use actix_web::error::{BlockingError, InternalError};
use actix_web::http::header::{
    Charset, ContentDisposition, DispositionParam, DispositionType, ExtendedValue,
};
use actix_web::{middleware, web, App, HttpResponse, HttpServer, ResponseError};
use askama::Template;
use serde::Deserialize;
use slidegen::package::content_type;
use slidegen::{assemble, DeckRequest, OutputStore, TemplateRegistry};
use std::fmt;

pub const PPTX_MIME: &str = content_type::PPTX_FILE;

const DEFAULT_SLIDES: i64 = 5;

/// Shared, read-only state of the server.
pub struct AppState {
    pub registry: TemplateRegistry,
    pub store: OutputStore,
    pub max_slides: i64,
}

impl AppState {
    /// Load templates and prepare the output directory.
    pub fn from_config(config: &Config) -> slidegen::Result<Self> {
        let registry =
            TemplateRegistry::from_dir(&config.template_dir, config.builtin_fallback)?;
        let store = OutputStore::new(&config.output_dir, config.retention);
        store.ensure_dir()?;
        store.sweep()?;
        Ok(Self {
            registry,
            store,
            max_slides: config.max_slides,
        })
    }
}

#[derive(Debug)]
pub enum AppError {
    InvalidTemplate,
    BadRequest(String),
    Generation(slidegen::Error),
    Blocking(BlockingError),
    Template(askama::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidTemplate => write!(f, "Invalid template selected"),
            AppError::BadRequest(msg) => write!(f, "{msg}"),
            AppError::Generation(e) => write!(f, "Generation error: {e}"),
            AppError::Blocking(e) => write!(f, "Worker error: {e}"),
            AppError::Template(e) => write!(f, "Template error: {e}"),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::InvalidTemplate | AppError::BadRequest(_) => HttpResponse::BadRequest()
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string()),
            _ => {
                log::error!("{self}");
                HttpResponse::InternalServerError()
                    .content_type("text/plain; charset=utf-8")
                    .body("Internal Server Error")
            }
        }
    }
}

impl From<slidegen::Error> for AppError {
    fn from(e: slidegen::Error) -> Self {
        if e.is_client_error() {
            AppError::InvalidTemplate
        } else {
            AppError::Generation(e)
        }
    }
}

impl From<BlockingError> for AppError {
    fn from(e: BlockingError) -> Self {
        AppError::Blocking(e)
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template(e)
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    styles: Vec<&'static str>,
    max_slides: i64,
    default_slides: i64,
}

#[derive(Debug, Deserialize)]
pub struct GenerateForm {
    pub title: String,
    pub author: String,
    pub content: String,
    pub num_slides: i64,
    pub template: String,
}

pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let page = IndexTemplate {
        styles: state.registry.styles().map(|s| s.as_str()).collect(),
        max_slides: state.max_slides,
        default_slides: DEFAULT_SLIDES.min(state.max_slides),
    };
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page.render()?))
}

pub async fn generate(
    state: web::Data<AppState>,
    form: web::Form<GenerateForm>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();

    let template = state.registry.resolve(&form.template)?;
    if form.num_slides > state.max_slides {
        return Err(AppError::BadRequest(format!(
            "num_slides must be at most {}",
            state.max_slides
        )));
    }

    let request =
        DeckRequest::from_form(&form.title, &form.author, &form.content, form.num_slides);
    let state = state.into_inner();
    let bytes = web::block(move || -> slidegen::Result<Vec<u8>> {
        let deck = assemble(&template, &request)?;
        let file = state.store.save_deck(&deck)?;
        state.store.take(&file)
    })
    .await??;

    Ok(HttpResponse::Ok()
        .content_type(PPTX_MIME)
        .insert_header(attachment(&form.title))
        .body(bytes))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().content_type("text/plain").body("ok")
}

/// `{title}.pptx` with path separators, quotes and control characters
/// replaced.
pub fn download_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | '"' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "presentation.pptx".to_string()
    } else {
        format!("{cleaned}.pptx")
    }
}

/// Attachment header for the deck. Non-ASCII titles get an RFC 5987
/// `filename*` next to an ASCII `filename` fallback.
fn attachment(title: &str) -> ContentDisposition {
    let name = download_name(title);
    if name.is_ascii() {
        return ContentDisposition::attachment(name);
    }
    let fallback: String = name
        .chars()
        .map(|c| if c.is_ascii() { c } else { '_' })
        .collect();
    ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![
            DispositionParam::Filename(fallback),
            DispositionParam::FilenameExt(ExtendedValue {
                charset: Charset::Ext("UTF-8".to_string()),
                language_tag: None,
                value: name.into_bytes(),
            }),
        ],
    }
}

/// Form extraction failures become 400 responses naming the problem.
fn form_config() -> web::FormConfig {
    web::FormConfig::default().error_handler(|err, _req| {
        let body = format!("Invalid form submission: {err}");
        InternalError::from_response(
            err,
            HttpResponse::BadRequest()
                .content_type("text/plain; charset=utf-8")
                .body(body),
        )
        .into()
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(form_config())
        .route("/", web::get().to(index))
        .route("/generate", web::post().to(generate))
        .route("/health", web::get().to(health));
}

pub async fn serve(config: Config) -> std::io::Result<()> {
    let state = AppState::from_config(&config).map_err(std::io::Error::other)?;
    let state = web::Data::new(state);

    log::info!(
        "Starting server at http://{} (output: {}, retention: {})",
        config.bind,
        config.output_dir.display(),
        config.retention
    );

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind(&config.bind)?
    .run()
    .await
}
