use std::io::ErrorKind;
use std::sync::Arc;
use std::{fs, io};

use ntex::http::StatusCode;
use ntex::web;
use ntex::web::{HttpRequest, HttpResponse};
use ntex_files::NamedFile;
use serde::Deserialize;
use serde_json::json;
use spdlog::{error, info, warn};

use crate::auth::AdminAuth;
use crate::config::{open_store, Config};
use crate::content::Frontmatter;
use crate::paginator::Paginator;
use crate::post_repository::{filter_by_tag, tag_counts, BlogPost, ListOptions, NewPost, PostError, PostRepository, SortOrder};
use crate::query_string::QueryString;
use crate::storage::{Committer, StoreError};
use crate::view::list_renderer::{ListRenderer, ListState};
use crate::view::post_renderer::PostRenderer;
use crate::view::seo::robots_txt;
use crate::view::sitemap_renderer::Sitemap;

pub struct AppState {
    pub config: Config,
    pub repository: PostRepository,
    pub auth: AdminAuth,
}

type State = web::types::State<Arc<AppState>>;

#[derive(Deserialize)]
struct UpdateBody {
    frontmatter: Frontmatter,
    #[serde(default)]
    content: String,
    #[serde(default)]
    sha: String,
}

#[derive(Deserialize)]
struct DeleteBody {
    #[serde(default)]
    sha: String,
}

pub fn status_of(err: &PostError) -> StatusCode {
    match err {
        PostError::Frontmatter(_) => StatusCode::NOT_FOUND,
        PostError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        PostError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
        PostError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
        PostError::Store(StoreError::Unauthorized) => StatusCode::UNAUTHORIZED,
        PostError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: &PostError) -> HttpResponse {
    let status = status_of(err);
    if status.is_server_error() {
        error!("Api request failed: {}", err);
    } else {
        warn!("Api request rejected: {}", err);
    }
    HttpResponse::build(status).json(&json!({ "message": err.to_string() }))
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(&json!({ "message": "Authentication required" }))
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn not_found_page() -> HttpResponse {
    HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body("<h1>Post not found</h1>")
}

fn committer_of(req: &HttpRequest, state: &AppState) -> Option<Committer> {
    let header = req.headers().get("authorization").and_then(|v| v.to_str().ok());
    state.auth.authorize(header)
}

fn read_template(config: &Config, name: &str) -> io::Result<String> {
    let template_path = config.paths.template_dir.join(name);
    fs::read_to_string(&template_path)
        .map_err(|e| io::Error::new(e.kind(), format!("Error reading template {}: {}", template_path.display(), e)))
}

async fn render_list(state: &AppState, qs: &QueryString, include_drafts: bool) -> io::Result<String> {
    let posts = state.repository
        .list_posts(ListOptions { include_drafts, sort: SortOrder::Desc })
        .await
        .map_err(io::Error::other)?;

    let tags = tag_counts(&posts);
    let tag = qs.get_tag();
    let posts = match tag {
        Some(tag) => filter_by_tag(posts, tag),
        None => posts,
    };

    let paginator = Paginator::from(&posts, state.config.defaults.page_size);
    let cur_page = paginator.clamp(qs.get_page());
    let page_posts: &[BlogPost] = if paginator.page_count() == 0 {
        &[]
    } else {
        paginator.get_page(cur_page).map_err(|e| io::Error::new(ErrorKind::InvalidInput, e))?
    };

    let template_src = read_template(&state.config, "postlist.tpl")?;
    let site = &state.config.site;
    let list_renderer = ListRenderer::new(&template_src, &site.title, &site.description)?;

    Ok(list_renderer.render(page_posts, &tags, &ListState {
        tag,
        show_drafts: include_drafts,
        cur_page,
        page_count: paginator.page_count(),
    }))
}

fn render_post(state: &AppState, post: &BlogPost) -> io::Result<String> {
    let template_src = read_template(&state.config, "view.tpl")?;
    let post_renderer = PostRenderer::new(&template_src)?;
    post_renderer.render(post, &state.config.site)
}

fn post_page(state: &AppState, slug: &str, res: Result<BlogPost, PostError>, allow_drafts: bool) -> HttpResponse {
    let post = match res {
        Ok(post) if allow_drafts || !post.frontmatter.draft => post,
        Ok(_) => return not_found_page(),
        Err(e) => {
            let status = status_of(&e);
            if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
                warn!("Post {} is not available: {}", slug, e);
                return not_found_page();
            }
            error!("Error loading post {}: {}", slug, e);
            return HttpResponse::InternalServerError()
                .body(format!("Error loading post {}", slug));
        }
    };

    match render_post(state, &post) {
        Ok(rendered) => html(rendered),
        Err(e) => {
            error!("Error rendering post {}: {}", slug, e);
            HttpResponse::InternalServerError()
                .body(format!("Error rendering post {}", slug))
        }
    }
}

#[web::get("/")]
async fn index(req: HttpRequest, state: State) -> HttpResponse {
    let qs = req.uri().query().map(QueryString::from).unwrap_or_default();
    let can_view_drafts = state.config.admin.show_drafts_to_admin && committer_of(&req, &state).is_some();
    let include_drafts = can_view_drafts && qs.show_drafts();

    match render_list(&state, &qs, include_drafts).await {
        Ok(post_list) => html(post_list),
        Err(e) => {
            error!("Error listing posts: {}", e);
            HttpResponse::InternalServerError()
                .body(format!("Error listing posts: {}", e))
        }
    }
}

#[web::get("/posts/{slug}")]
async fn view_post(slug: web::types::Path<String>, state: State) -> HttpResponse {
    let slug = slug.into_inner();
    let res = state.repository.get_post(&slug).await;
    post_page(&state, &slug, res, false)
}

#[web::get("/admin/drafts/{slug}")]
async fn preview_draft(req: HttpRequest, slug: web::types::Path<String>, state: State) -> HttpResponse {
    if committer_of(&req, &state).is_none() {
        return unauthorized();
    }
    let slug = slug.into_inner();
    let res = state.repository.get_post(&slug).await;
    post_page(&state, &slug, res, true)
}

#[web::get("/api/posts/{slug}")]
async fn get_post(slug: web::types::Path<String>, state: State) -> HttpResponse {
    let slug = slug.into_inner();
    match state.repository.get_post(&slug).await {
        Ok(post) => HttpResponse::Ok().json(&post),
        Err(e) => {
            warn!("Error fetching post {}: {}", slug, e);
            HttpResponse::NotFound().json(&json!({ "message": "Post not found" }))
        }
    }
}

#[web::post("/api/posts")]
async fn create_post(req: HttpRequest, body: web::types::Json<NewPost>, state: State) -> HttpResponse {
    let Some(committer) = committer_of(&req, &state) else {
        return unauthorized();
    };

    match state.repository.create_post(body.into_inner(), &committer).await {
        Ok(slug) => HttpResponse::Created().json(&json!({ "message": "Post created", "slug": slug })),
        Err(e) => api_error(&e),
    }
}

#[web::put("/api/posts/{slug}")]
async fn update_post(req: HttpRequest, slug: web::types::Path<String>, body: web::types::Json<UpdateBody>, state: State) -> HttpResponse {
    let Some(committer) = committer_of(&req, &state) else {
        return unauthorized();
    };

    let slug = slug.into_inner();
    let body = body.into_inner();
    match state.repository.update_post(&slug, &body.frontmatter, &body.content, &body.sha, &committer).await {
        Ok(sha) => HttpResponse::Ok().json(&json!({ "message": "Post updated", "sha": sha })),
        Err(e) => api_error(&e),
    }
}

#[web::delete("/api/posts/{slug}")]
async fn delete_post(req: HttpRequest, slug: web::types::Path<String>, body: web::types::Json<DeleteBody>, state: State) -> HttpResponse {
    let Some(committer) = committer_of(&req, &state) else {
        return unauthorized();
    };

    let slug = slug.into_inner();
    match state.repository.delete_post(&slug, &body.sha, &committer).await {
        Ok(()) => HttpResponse::Ok().json(&json!({ "message": "Post deleted" })),
        Err(e) => api_error(&e),
    }
}

#[web::post("/api/posts/{slug}/toggle-draft")]
async fn toggle_draft(req: HttpRequest, slug: web::types::Path<String>, state: State) -> HttpResponse {
    let Some(committer) = committer_of(&req, &state) else {
        return unauthorized();
    };

    let slug = slug.into_inner();
    match state.repository.toggle_draft(&slug, &committer).await {
        Ok(draft) => HttpResponse::Ok().json(&json!({ "message": "Draft status changed", "draft": draft })),
        Err(e) => api_error(&e),
    }
}

#[web::get("/sitemap.xml")]
async fn sitemap(state: State) -> HttpResponse {
    let posts = match state.repository.list_posts(ListOptions::default()).await {
        Ok(posts) => posts,
        Err(e) => {
            error!("Error listing posts for the sitemap: {}", e);
            return HttpResponse::InternalServerError().body("Error listing posts");
        }
    };

    let sitemap = Sitemap { site_url: &state.config.site.url };
    match sitemap.render(&posts) {
        Ok(xml) => HttpResponse::Ok()
            .content_type("application/xml; charset=utf-8")
            .body(xml),
        Err(e) => {
            error!("Error rendering sitemap: {}", e);
            HttpResponse::InternalServerError().body("Error rendering sitemap")
        }
    }
}

#[web::get("/robots.txt")]
async fn robots(state: State) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(robots_txt(&state.config.site.url))
}

#[web::get("/public/{file_name}")]
async fn public_files(path: web::types::Path<String>, state: State) -> Result<NamedFile, web::Error> {
    if path.contains("..") {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = state.config.paths.public_dir.join(path.into_inner());
    Ok(NamedFile::open(file_path)?)
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(view_post)
        .service(preview_draft)
        .service(get_post)
        .service(create_post)
        .service(update_post)
        .service(delete_post)
        .service(toggle_draft)
        .service(sitemap)
        .service(robots)
        .service(public_files);
}

pub fn app_state(config: Config) -> io::Result<AppState> {
    let store = open_store(&config.storage)?;
    let repository = PostRepository::new(store, &config.storage.posts_dir);
    let auth = AdminAuth::new(config.admin.users.clone());
    if config.admin.users.is_empty() {
        warn!("No admin users configured. Writing through the api is disabled");
    }

    Ok(AppState {
        config,
        repository,
        auth,
    })
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    let app_state = Arc::new(app_state(config)?);
    info!("Serving posts from {:?} storage", app_state.config.storage.backend);

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .configure(routes)
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await
}
