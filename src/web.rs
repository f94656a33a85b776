use actix_web::{http::StatusCode, middleware, web, App, HttpRequest, HttpResponse, HttpServer, ResponseError};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{FormError, GridError, SnapshotError};
use crate::form::{validate_reservation, ReservationRequest};
use crate::grid::{AvailabilityGrid, Booking, CellAction, CellCoord, CellState, ReservationDraft, Resource, TimeSlot};
use crate::parser::read_snapshot;

/// The calendar view: one grid instance, rows and columns fixed at startup
pub struct AppState {
    pub slots: Vec<TimeSlot>,
    pub resources: Vec<Resource>,
    pub grid: Mutex<AvailabilityGrid>,
    pub admin_password: Option<String>,
}

impl AppState {
    pub fn new(grid: AvailabilityGrid, admin_password: Option<String>) -> Self {
        AppState {
            slots: grid.slots().to_vec(),
            resources: grid.resources().to_vec(),
            grid: Mutex::new(grid),
            admin_password,
        }
    }

    fn grid(&self) -> Result<MutexGuard<'_, AvailabilityGrid>, ApiError> {
        self.grid.lock().map_err(|_| ApiError::Poisoned)
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0} is not part of this calendar")]
    UnknownCell(CellCoord),

    #[error("resource {0} is not part of this calendar")]
    UnknownResource(Resource),

    #[error("time slot {0} is not part of this calendar")]
    UnknownSlot(TimeSlot),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("calendar state is unavailable")]
    Poisoned,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::UnknownCell(_) | ApiError::UnknownResource(_) | ApiError::UnknownSlot(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Grid(_) | ApiError::Snapshot(_) | ApiError::Form(_) => StatusCode::BAD_REQUEST,
            ApiError::Poisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}

#[derive(Serialize)]
pub struct CellView {
    time: TimeSlot,
    resource: Resource,
    cell: CellState,
}

#[derive(Serialize)]
pub struct GridResponse {
    visible_slots: Vec<TimeSlot>,
    visible_resources: Vec<Resource>,
    cells: Vec<CellView>,
    active_cell: Option<CellCoord>,
}

impl From<&AvailabilityGrid> for GridResponse {
    fn from(grid: &AvailabilityGrid) -> Self {
        GridResponse {
            visible_slots: grid.visible_slots(),
            visible_resources: grid.visible_resources(),
            cells: grid
                .cells()
                .into_iter()
                .map(|(coord, cell)| CellView {
                    time: coord.time,
                    resource: coord.resource,
                    cell,
                })
                .collect(),
            active_cell: grid.active_cell().cloned(),
        }
    }
}

#[derive(Serialize)]
pub struct BookingEntry {
    time: TimeSlot,
    resource: Resource,
    #[serde(flatten)]
    booking: Booking,
}

#[derive(Deserialize)]
pub struct ActionRequest {
    action: CellAction,
}

#[derive(Serialize)]
pub struct ActionResponse {
    success: bool,
    draft: Option<ReservationDraft>,
}

/// Constant-time byte comparison for the admin password
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

fn require_known(grid: &AvailabilityGrid, coord: &CellCoord) -> Result<(), ApiError> {
    if grid.contains(coord) {
        Ok(())
    } else {
        Err(ApiError::UnknownCell(coord.clone()))
    }
}

async fn get_grid(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let grid = state.grid()?;
    Ok(HttpResponse::Ok().json(GridResponse::from(&*grid)))
}

async fn set_active(
    body: web::Json<Option<CellCoord>>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let mut grid = state.grid()?;
    let coord = body.into_inner();
    if let Some(ref coord) = coord {
        require_known(&grid, coord)?;
    }
    grid.set_active_cell(coord);
    Ok(HttpResponse::Ok().json(GridResponse::from(&*grid)))
}

async fn mark_unavailable(
    body: web::Json<CellCoord>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let mut grid = state.grid()?;
    require_known(&grid, &body)?;
    grid.mark_unavailable(&body);
    Ok(HttpResponse::Ok().json(GridResponse::from(&*grid)))
}

async fn choose_action(
    body: web::Json<ActionRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let mut grid = state.grid()?;
    let had_selection = grid.active_cell().is_some();
    let draft = grid.choose_action(body.action);
    Ok(HttpResponse::Ok().json(ActionResponse {
        success: had_selection,
        draft,
    }))
}

async fn toggle_resource(
    resource: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let resource = Resource::new(&resource)?;
    let mut grid = state.grid()?;
    if !grid.has_resource(&resource) {
        return Err(ApiError::UnknownResource(resource));
    }
    grid.toggle_resource_visibility(&resource);
    Ok(HttpResponse::Ok().json(GridResponse::from(&*grid)))
}

async fn toggle_slot(
    time: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let time = TimeSlot::parse(&time)?;
    let mut grid = state.grid()?;
    if !grid.has_slot(&time) {
        return Err(ApiError::UnknownSlot(time));
    }
    grid.toggle_time_slot_visibility(&time);
    Ok(HttpResponse::Ok().json(GridResponse::from(&*grid)))
}

async fn get_stats(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let grid = state.grid()?;
    Ok(HttpResponse::Ok().json(grid.occupancy()))
}

async fn get_bookings(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let grid = state.grid()?;
    let bookings: Vec<BookingEntry> = grid
        .bookings()
        .into_iter()
        .map(|(coord, booking)| BookingEntry {
            time: coord.time,
            resource: coord.resource,
            booking: booking.clone(),
        })
        .collect();
    Ok(HttpResponse::Ok().json(bookings))
}

async fn validate_reservation_request(
    body: web::Json<ReservationRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let grid = state.grid()?;
    let booking = validate_reservation(&body, &grid)?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "booking": booking,
    })))
}

// Admin snapshot upload: replaces the grid with the uploaded bookings listing
async fn upload_snapshot(
    req: HttpRequest,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let password = req
        .headers()
        .get("X-Admin-Password")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    match state.admin_password.as_deref() {
        Some(expected) if constant_time_eq(expected.as_bytes(), password.as_bytes()) => {}
        _ => {
            warn!("rejected snapshot upload");
            return Err(ApiError::Unauthorized);
        }
    }

    let cells = read_snapshot(body.as_ref())?;
    let fresh = AvailabilityGrid::new(state.slots.clone(), state.resources.clone(), cells)?;
    let mut grid = state.grid()?;
    *grid = fresh;
    info!("calendar rebuilt from uploaded snapshot");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Calendar updated",
    })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/grid", web::get().to(get_grid))
        .route("/api/grid/active", web::post().to(set_active))
        .route("/api/grid/unavailable", web::post().to(mark_unavailable))
        .route("/api/grid/action", web::post().to(choose_action))
        .route("/api/grid/resources/{resource}/toggle", web::post().to(toggle_resource))
        .route("/api/grid/slots/{time}/toggle", web::post().to(toggle_slot))
        .route("/api/grid/stats", web::get().to(get_stats))
        .route("/api/grid/bookings", web::get().to(get_bookings))
        .route("/api/reservations/validate", web::post().to(validate_reservation_request))
        .route("/api/snapshot", web::post().to(upload_snapshot));
}

pub async fn start_server(port: u16, state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(state);

    info!(port, "starting calendar server");
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    fn state() -> web::Data<AppState> {
        let slots = ["09:00", "09:30", "10:00"].iter().map(|s| TimeSlot::parse(s).unwrap()).collect();
        let resources = ["Engine 1", "Battery 1"].iter().map(|r| Resource::new(r).unwrap()).collect();
        let grid = AvailabilityGrid::new(
            slots,
            resources,
            vec![(
                CellCoord::parse("10:00", "Battery 1").unwrap(),
                CellState::Booked(Booking {
                    vehicle_label: "Ford Transit".into(),
                    plate_number: "VAN-1".into(),
                    service_type: "Battery swap".into(),
                }),
            )],
        )
        .unwrap();
        web::Data::new(AppState::new(grid, Some("secret".into())))
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(App::new().app_data($state.clone()).configure(configure)).await
        };
    }

    fn cell<'a>(body: &'a Value, time: &str, resource: &str) -> &'a Value {
        body["cells"]
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["time"] == time && c["resource"] == resource)
            .map(|c| &c["cell"])
            .unwrap()
    }

    #[actix_web::test]
    async fn select_then_block_through_the_api() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/grid/active")
            .set_json(json!({"time": "09:00", "resource": "Engine 1"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cell(&body, "09:00", "Engine 1")["state"], "selecting");
        assert_eq!(body["active_cell"], json!({"time": "09:00", "resource": "Engine 1"}));

        let req = test::TestRequest::post()
            .uri("/api/grid/unavailable")
            .set_json(json!({"time": "09:00", "resource": "Engine 1"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(cell(&body, "09:00", "Engine 1")["state"], "blocked");
        assert_eq!(body["active_cell"], Value::Null);
    }

    #[actix_web::test]
    async fn unknown_cells_are_not_found() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/grid/active")
            .set_json(json!({"time": "12:00", "resource": "Engine 1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
    }

    #[actix_web::test]
    async fn add_reservation_returns_a_draft() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/grid/active")
            .set_json(json!({"time": "09:30", "resource": "Battery 1"}))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/grid/action")
            .set_json(json!({"action": "add_reservation"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["draft"]["coord"], json!({"time": "09:30", "resource": "Battery 1"}));

        let grid = state.grid.lock().unwrap();
        assert_eq!(grid.active_cell(), None);
    }

    #[actix_web::test]
    async fn toggling_a_slot_hides_its_row() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::post().uri("/api/grid/slots/09:30/toggle").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["visible_slots"], json!(["09:00", "10:00"]));

        let req = test::TestRequest::post().uri("/api/grid/resources/Engine%201/toggle").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["visible_resources"], json!(["Battery 1"]));
    }

    #[actix_web::test]
    async fn toggling_names_outside_the_grid_is_not_found() {
        let state = state();
        let app = app!(state);

        for uri in [
            "/api/grid/resources/Paint%201/toggle",
            "/api/grid/resources/bogus/toggle",
            "/api/grid/slots/11:00/toggle",
        ] {
            let req = test::TestRequest::post().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{uri}");
        }

        let req = test::TestRequest::post().uri("/api/grid/slots/noon/toggle").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let grid = state.grid.lock().unwrap();
        assert!(grid.is_resource_visible(&Resource::new("bogus").unwrap()));
        assert!(grid.is_slot_visible(&TimeSlot::parse("11:00").unwrap()));
        assert_eq!(grid.visible_resources().len(), 2);
        assert_eq!(grid.visible_slots().len(), 3);
    }

    #[actix_web::test]
    async fn password_comparison_checks_length_and_bytes() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret!"));
        assert!(!constant_time_eq(b"", b"secret"));
    }

    #[actix_web::test]
    async fn lists_bookings_and_stats() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::get().uri("/api/grid/bookings").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body,
            json!([{
                "time": "10:00",
                "resource": "Battery 1",
                "vehicle_label": "Ford Transit",
                "plate_number": "VAN-1",
                "service_type": "Battery swap",
            }])
        );

        let req = test::TestRequest::get().uri("/api/grid/stats").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], json!({"booked": 1, "blocked": 0, "free": 5}));
    }

    #[actix_web::test]
    async fn validates_reservations_against_the_grid() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/reservations/validate")
            .set_json(json!({
                "time": "10:00",
                "resource": "Battery 1",
                "vehicle_label": "Audi A4",
                "plate_number": "A4-001",
                "service_type": "Inspection",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/reservations/validate")
            .set_json(json!({
                "time": "09:00",
                "resource": "Battery 1",
                "vehicle_label": "Audi A4",
                "plate_number": "a4-001",
                "service_type": "Inspection",
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["booking"]["plate_number"], "A4-001");
    }

    #[actix_web::test]
    async fn snapshot_upload_requires_the_admin_password() {
        let state = state();
        let app = app!(state);
        let csv = "time,resource,status\n09:00,Engine 1,blocked\n";

        let req = test::TestRequest::post()
            .uri("/api/snapshot")
            .insert_header(("X-Admin-Password", "guess"))
            .set_payload(csv)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/snapshot")
            .insert_header(("X-Admin-Password", "secret"))
            .set_payload(csv)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let grid = state.grid.lock().unwrap();
        assert!(grid.bookings().is_empty());
        assert_eq!(
            grid.cell_state(&CellCoord::parse("09:00", "Engine 1").unwrap()),
            Some(CellState::Blocked)
        );
    }

    #[actix_web::test]
    async fn snapshot_outside_the_grid_is_rejected() {
        let state = state();
        let app = app!(state);

        let req = test::TestRequest::post()
            .uri("/api/snapshot")
            .insert_header(("X-Admin-Password", "secret"))
            .set_payload("time,resource,status\n09:00,Paint 1,blocked\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
