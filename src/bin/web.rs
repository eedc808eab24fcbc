//! Single binary web server exposing the tournament engine as a JSON API.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080), TOURNAMENT_CONFIG (path to a JSON config).

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use doubles_tournament::logic::{
    apply_formation, clear_winner, create_pool, move_entrant, release_entrant, standings_table,
    PoolLayout,
};
use doubles_tournament::models::SetScore;
use doubles_tournament::{
    build_tournament_brackets, form_all_groups, record_bracket_winner, record_pool_result,
    schedule_bracket_day, schedule_group_stage, Entrant, EntrantId, FormationOptions, MatchResult,
    PoolId, Tournament, TournamentConfig, TournamentId,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Per-tournament entry: tournament data + last activity time (for auto-cleanup).
struct TournamentEntry {
    tournament: Tournament,
    last_activity: Instant,
}

/// In-memory state: many tournaments by ID. Entries are removed after 12h inactivity.
type AppState = Data<RwLock<HashMap<TournamentId, TournamentEntry>>>;

/// Inactivity threshold: tournaments not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

/// Formation search budget when the request does not name one.
const DEFAULT_FORMATION_SECS: u64 = 30;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    entrants: Vec<Entrant>,
}

#[derive(Deserialize)]
struct FormGroupsBody {
    time_limit_secs: Option<u64>,
}

#[derive(Deserialize)]
struct RecordResultBody {
    first: EntrantId,
    second: EntrantId,
    sets: [Option<SetScore>; 2],
    #[serde(default)]
    tiebreak: Option<SetScore>,
}

#[derive(Deserialize)]
struct BracketWinnerBody {
    match_id: String,
    entrant_id: EntrantId,
}

#[derive(Deserialize)]
struct CreatePoolBody {
    category: String,
}

#[derive(Deserialize)]
struct MoveEntrantBody {
    pool_id: PoolId,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and pool id
#[derive(Deserialize)]
struct TournamentPoolPath {
    id: TournamentId,
    pool_id: PoolId,
}

/// Path segments: tournament id and entrant id
#[derive(Deserialize)]
struct TournamentEntrantPath {
    id: TournamentId,
    entrant_id: EntrantId,
}

/// Path segments: tournament id and bracket category
#[derive(Deserialize)]
struct TournamentBracketPath {
    id: TournamentId,
    category: String,
}

/// Path segments: tournament id, bracket category and match id
#[derive(Deserialize)]
struct BracketMatchPath {
    id: TournamentId,
    category: String,
    match_id: String,
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "doubles-tournament",
    })
}

/// Create a tournament from intake entrants (returns it with id; client stores id for subsequent requests).
#[post("/api/tournaments")]
async fn api_create_tournament(
    state: AppState,
    config: Data<TournamentConfig>,
    body: Json<CreateTournamentBody>,
) -> HttpResponse {
    let tournament = match Tournament::new(config.get_ref().clone(), body.into_inner().entrants) {
        Ok(t) => t,
        Err(e) => return HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    };
    let id = tournament.id;
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    log::info!("Created tournament {} with {} entrants", id, tournament.entrants.len());
    let response = HttpResponse::Ok().json(&tournament);
    g.insert(
        id,
        TournamentEntry {
            tournament,
            last_activity: Instant::now(),
        },
    );
    response
}

/// Get a tournament by id (404 if not found). Touching it refreshes last_activity.
#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&path.id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            HttpResponse::Ok().json(&entry.tournament)
        }
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    }
}

/// Form pools for every category. The search runs off the async workers; the lock is not held meanwhile.
/// Pool edits made during the search turn the write-back into a 409.
#[post("/api/tournaments/{id}/groups")]
async fn api_form_groups(
    state: AppState,
    path: Path<TournamentPath>,
    body: Option<Json<FormGroupsBody>>,
) -> HttpResponse {
    let (entrants, config, started_from) = {
        let mut g = match state.write() {
            Ok(guard) => guard,
            Err(_) => return HttpResponse::InternalServerError().body("lock error"),
        };
        let entry = match g.get_mut(&path.id) {
            Some(e) => e,
            None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
        };
        entry.last_activity = Instant::now();
        (
            entry.tournament.entrants.clone(),
            entry.tournament.config.clone(),
            PoolLayout::of(&entry.tournament),
        )
    };

    let secs = body
        .and_then(|b| b.time_limit_secs)
        .unwrap_or(DEFAULT_FORMATION_SECS);
    let options = FormationOptions {
        deadline: Some(Instant::now() + Duration::from_secs(secs)),
    };
    let report =
        match tokio::task::spawn_blocking(move || form_all_groups(&entrants, &config, options)).await {
            Ok(report) => report,
            Err(e) => {
                log::error!("Formation task failed: {}", e);
                return HttpResponse::InternalServerError().body("formation failed");
            }
        };

    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    match apply_formation(&mut entry.tournament, report, &started_from) {
        Ok(()) => HttpResponse::Ok().json(&entry.tournament),
        Err(e) => HttpResponse::Conflict().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Open an empty pool in a category for manual placement.
#[post("/api/tournaments/{id}/pools")]
async fn api_create_pool(
    state: AppState,
    path: Path<TournamentPath>,
    body: Json<CreatePoolBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match create_pool(t, &body.category) {
        Ok(pool_id) => HttpResponse::Ok().json(serde_json::json!({ "pool_id": pool_id })),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Move an entrant (pooled or left over) into a pool.
#[put("/api/tournaments/{id}/entrants/{entrant_id}/pool")]
async fn api_move_entrant(
    state: AppState,
    path: Path<TournamentEntrantPath>,
    body: Json<MoveEntrantBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match move_entrant(t, path.entrant_id, body.pool_id) {
        Ok(()) => HttpResponse::Ok().json(t),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Take an entrant out of its pool and back to the leftover list.
#[delete("/api/tournaments/{id}/entrants/{entrant_id}/pool")]
async fn api_release_entrant(state: AppState, path: Path<TournamentEntrantPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    match release_entrant(t, path.entrant_id) {
        Ok(()) => HttpResponse::Ok().json(t),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Record a round-robin result; returns the pool's standings (empty until all three results are in).
#[put("/api/tournaments/{id}/pools/{pool_id}/results")]
async fn api_record_result(
    state: AppState,
    path: Path<TournamentPoolPath>,
    body: Json<RecordResultBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    if t.pool(path.pool_id).is_err() {
        return HttpResponse::NotFound().json(serde_json::json!({ "error": "No pool" }));
    }
    let body = body.into_inner();
    let result = MatchResult::from_sets(body.first, body.second, body.sets, body.tiebreak);
    match record_pool_result(t, path.pool_id, result) {
        Ok(standings) => HttpResponse::Ok().json(standings),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Current standings table of a pool.
#[get("/api/tournaments/{id}/pools/{pool_id}/standings")]
async fn api_pool_standings(state: AppState, path: Path<TournamentPoolPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    match entry.tournament.pool(path.pool_id) {
        Ok(pool) => HttpResponse::Ok().json(standings_table(pool)),
        Err(e) => HttpResponse::NotFound().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Generate missing brackets and refresh the seeding of existing ones.
#[post("/api/tournaments/{id}/brackets")]
async fn api_build_brackets(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    build_tournament_brackets(t);
    HttpResponse::Ok().json(&t.brackets)
}

/// Record the winner of a bracket match and advance them.
#[put("/api/tournaments/{id}/brackets/{category}/winner")]
async fn api_bracket_winner(
    state: AppState,
    path: Path<TournamentBracketPath>,
    body: Json<BracketWinnerBody>,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &mut entry.tournament;
    if !t.brackets.contains_key(&path.category) {
        return HttpResponse::NotFound().json(serde_json::json!({ "error": "No bracket" }));
    }
    match record_bracket_winner(t, &path.category, &body.match_id, body.entrant_id) {
        Ok(()) => HttpResponse::Ok().json(&t.brackets[&path.category]),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Withdraw a recorded bracket winner.
#[delete("/api/tournaments/{id}/brackets/{category}/matches/{match_id}/winner")]
async fn api_clear_bracket_winner(state: AppState, path: Path<BracketMatchPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let bracket = match entry.tournament.bracket_mut(&path.category) {
        Ok(b) => b,
        Err(e) => return HttpResponse::NotFound().json(serde_json::json!({ "error": e.to_string() })),
    };
    match clear_winner(bracket, &path.match_id) {
        Ok(()) => HttpResponse::Ok().json(&*bracket),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Group-stage calendar with any court conflicts and unplaced matches.
#[get("/api/tournaments/{id}/calendar/group-stage")]
async fn api_group_stage_calendar(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &entry.tournament;
    match schedule_group_stage(t.all_pools(), t.config.courts, &t.config) {
        Ok(schedule) => HttpResponse::Ok().json(schedule),
        Err(e) => HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() })),
    }
}

/// Bracket-day calendar for every generated bracket.
#[get("/api/tournaments/{id}/calendar/bracket-day")]
async fn api_bracket_day_calendar(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = match g.get_mut(&path.id) {
        Some(e) => e,
        None => return HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" })),
    };
    entry.last_activity = Instant::now();
    let t = &entry.tournament;
    HttpResponse::Ok().json(schedule_bracket_day(t.brackets.values(), &t.config))
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn load_config() -> std::io::Result<TournamentConfig> {
    match std::env::var("TOURNAMENT_CONFIG") {
        Ok(path) => {
            log::info!("Loading tournament config from {}", path);
            TournamentConfig::from_json_file(&path)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))
        }
        Err(_) => Ok(TournamentConfig::default()),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Data::new(load_config()?);
    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(HashMap::<TournamentId, TournamentEntry>::new()));

    // Background task: every 30 minutes, remove tournaments inactive for 12+ hours
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive tournament(s) (no activity for 12h)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(config.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_form_groups)
            .service(api_create_pool)
            .service(api_move_entrant)
            .service(api_release_entrant)
            .service(api_record_result)
            .service(api_pool_standings)
            .service(api_build_brackets)
            .service(api_bracket_winner)
            .service(api_clear_bracket_winner)
            .service(api_group_stage_calendar)
            .service(api_bracket_day_calendar)
    })
    .bind(bind)?
    .run()
    .await
}
