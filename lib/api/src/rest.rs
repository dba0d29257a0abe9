use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use schoolfinder_core::{
    CandidateFilters, Error, QueryFilters, Review, ReviewStats, SchoolId, SchoolMatcher,
    SearchCriteria,
};
use schoolfinder_storage::SchoolStore;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

/// Shared handler state
pub struct AppState {
    pub store: Arc<SchoolStore>,
    pub matcher: SchoolMatcher<SchoolStore>,
}

impl AppState {
    pub fn new(store: Arc<SchoolStore>) -> Self {
        let matcher = SchoolMatcher::new(store.clone());
        Self { store, matcher }
    }

    pub fn with_matcher(store: Arc<SchoolStore>, matcher: SchoolMatcher<SchoolStore>) -> Self {
        Self { store, matcher }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    /// Comma-separated; several cities mean any of them.
    city: Option<String>,
    board: Option<String>,
    featured: Option<bool>,
    public: Option<bool>,
    search: Option<String>,
    limit: Option<usize>,
    offset: Option<usize>,
}

#[derive(Deserialize)]
struct CompareRequest {
    ids: Vec<SchoolId>,
}

#[derive(Deserialize)]
struct StatsRequest {
    reviews: Vec<Review>,
}

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: String,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
        info!("REST API listening on 0.0.0.0:{}", port);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(RestApi::routes)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    pub fn routes(cfg: &mut web::ServiceConfig) {
        cfg.route("/schools", web::get().to(list_schools))
            .route("/schools", web::post().to(create_school))
            .route("/schools/search", web::post().to(search_schools))
            .route("/schools/compare", web::post().to(compare_schools))
            .route("/schools/{id}", web::get().to(get_school))
            .route("/schools/{id}", web::put().to(update_school))
            .route("/schools/{id}", web::delete().to(delete_school))
            .route("/schools/{id}/stats", web::put().to(update_stats))
            .route("/cities", web::get().to(list_cities))
            .route("/boards", web::get().to(list_boards))
            .route("/chat/search", web::post().to(chat_search));
    }
}

fn error_response(e: &Error) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        Error::SchoolNotFound(_) => HttpResponse::NotFound().json(body),
        Error::Serialization(_) => HttpResponse::BadRequest().json(body),
        _ => {
            error!("request failed: {}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

async fn list_schools(
    state: web::Data<Arc<AppState>>,
    query: web::Query<ListQuery>,
) -> ActixResult<HttpResponse> {
    let query = query.into_inner();
    let filters = CandidateFilters {
        cities: query
            .city
            .map(|c| {
                c.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        board: query.board.filter(|b| !b.is_empty()),
        featured: query.featured,
        is_public: query.public,
        search: query.search.filter(|s| !s.trim().is_empty()),
        limit: query.limit,
        offset: query.offset.unwrap_or(0),
    };

    let total = state.store.count(&filters);
    let schools = state.store.list(&filters);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "result": schools,
        "total": total,
    })))
}

async fn create_school(
    state: web::Data<Arc<AppState>>,
    body: web::Json<serde_json::Value>,
) -> ActixResult<HttpResponse> {
    match state.store.create(body.into_inner()) {
        Ok(school) => Ok(HttpResponse::Created().json(serde_json::json!({
            "result": school
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn get_school(
    state: web::Data<Arc<AppState>>,
    path: web::Path<SchoolId>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match state.matcher.school_details(id).await {
        Ok(Some(school)) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": school
        }))),
        Ok(None) => Ok(error_response(&Error::SchoolNotFound(id))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn update_school(
    state: web::Data<Arc<AppState>>,
    path: web::Path<SchoolId>,
    body: web::Json<serde_json::Value>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match state.store.update(id, &body) {
        Ok(Some(school)) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": school
        }))),
        Ok(None) => Ok(error_response(&Error::SchoolNotFound(id))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn delete_school(
    state: web::Data<Arc<AppState>>,
    path: web::Path<SchoolId>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match state.store.delete(id) {
        Ok(true) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": true
        }))),
        Ok(false) => Ok(error_response(&Error::SchoolNotFound(id))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn search_schools(
    state: web::Data<Arc<AppState>>,
    criteria: web::Json<SearchCriteria>,
) -> ActixResult<HttpResponse> {
    match state.matcher.search(&criteria).await {
        Ok(schools) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": schools
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn compare_schools(
    state: web::Data<Arc<AppState>>,
    req: web::Json<CompareRequest>,
) -> ActixResult<HttpResponse> {
    if req.ids.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "At least one school id is required"
        })));
    }

    match state.matcher.compare(&req.ids).await {
        Ok(schools) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": schools
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn update_stats(
    state: web::Data<Arc<AppState>>,
    path: web::Path<SchoolId>,
    req: web::Json<StatsRequest>,
) -> ActixResult<HttpResponse> {
    let stats = ReviewStats::from_reviews(&req.reviews);
    let id = path.into_inner();
    match state.store.apply_review_stats(id, stats) {
        Ok(Some(_)) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": stats
        }))),
        Ok(None) => Ok(error_response(&Error::SchoolNotFound(id))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn list_cities(state: web::Data<Arc<AppState>>) -> ActixResult<HttpResponse> {
    match state.matcher.cities_with_counts().await {
        Ok(cities) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": cities
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn list_boards(state: web::Data<Arc<AppState>>) -> ActixResult<HttpResponse> {
    match state.matcher.boards_with_counts().await {
        Ok(boards) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": boards
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn chat_search(
    state: web::Data<Arc<AppState>>,
    req: web::Json<ChatRequest>,
) -> ActixResult<HttpResponse> {
    let message = req.message.trim();
    if message.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Message is required"
        })));
    }

    let cities = match state.matcher.cities_with_counts().await {
        Ok(cities) => cities,
        Err(e) => return Ok(error_response(&e)),
    };
    let known: Vec<&str> = cities.iter().map(|c| c.city.as_str()).collect();

    let filters = QueryFilters::extract(message, &known);
    let criteria = filters.clone().into_criteria();

    match state.matcher.search(&criteria).await {
        Ok(schools) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "result": {
                "filters": filters,
                "schools": schools,
            }
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}
