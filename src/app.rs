use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::classify::RowType;
use crate::config::Config;
use crate::editor::CellEdit;
use crate::error::RemoteError;
use crate::export::{data_to_csv, data_to_xlsx};
use crate::index_map::{RowFilter, SortSpec};
use crate::header::compute_header_context;
use crate::mapping::{ColumnMapping, from_header_row};
use crate::remote::{CsvRemote, SheetRemote};
use crate::row::SheetRow;
use crate::selection::DragDelta;
use crate::session::SheetSession;
use crate::store::FileStore;
use crate::tracker::{ChangeSummary, ChangedCell};
use crate::user::UserContext;

/// One session and the remote it syncs with. Requests are serialised by the
/// mutex.
pub struct AppState {
    inner: Mutex<Inner>,
}

struct Inner {
    session: SheetSession,
    remote: CsvRemote,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GridRow<'a> {
    view_row: usize,
    clean_row: usize,
    absolute_row: usize,
    row_type: RowType,
    changed: bool,
    selected: bool,
    cells: &'a SheetRow,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GridResponse<'a> {
    sheet_id: &'a str,
    header_row_index: usize,
    total_offset: usize,
    mappings: &'a [ColumnMapping],
    filter: &'a RowFilter,
    sort: Option<&'a SortSpec>,
    rows: Vec<GridRow<'a>>,
    all_selected: bool,
    summary: ChangeSummary,
}

#[derive(Deserialize)]
struct EditRequest {
    row: usize,
    column: String,
    value: String,
    #[serde(default)]
    user: Option<UserContext>,
}

#[derive(Serialize)]
struct EditResponse {
    edits: Vec<CellEdit>,
    summary: ChangeSummary,
}

/// Filter fields arrive flat; `rowType` accepts loose names such as
/// "Laptops".
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterRequest {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    row_type: Option<String>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    sort: Option<SortSpec>,
}

#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum SelectRequest {
    Toggle {
        row: usize,
        checked: bool,
    },
    Shift {
        row: usize,
        checked: bool,
    },
    All { checked: bool },
    Clear,
    DragStart {
        row: usize,
        checked: bool,
    },
    DragMove { row: usize },
    DragEnd,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SelectResponse {
    selected: Vec<usize>,
    all_selected: bool,
    delta: Option<DragDelta>,
}

#[derive(Serialize)]
struct ChangesResponse {
    summary: ChangeSummary,
    changes: Vec<ChangedCell>,
    warning: Option<ChangeSummary>,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: String,
    message: String,
}

/// Opens the configured sheet and serves it over HTTP until shut down.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let remote = CsvRemote::new(&config.data_dir);
    let store = FileStore::open(&config.storage_dir)?;
    let mappings = mappings_from_header(&remote, &config.default_sheet)?;
    let session = SheetSession::open(
        &config.default_sheet,
        mappings,
        UserContext::new("", "technician"),
        config.editor_config(),
        &remote,
        Box::new(store),
    )?;

    let app_state = Arc::new(AppState {
        inner: Mutex::new(Inner { session, remote }),
    });

    let app = router(app_state);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/sheet", get(get_sheet))
        .route("/api/edit", post(edit_cell))
        .route("/api/filter", post(set_filter))
        .route("/api/select", post(select_rows))
        .route("/api/changes", get(get_changes))
        .route("/api/sync", post(sync_changes))
        .route("/api/discard", post(discard_changes))
        .route("/api/scan/:code", get(scan_code))
        .route("/api/export.csv", get(export_csv))
        .route("/api/export.xlsx", get(export_xlsx))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn mappings_from_header(
    remote: &CsvRemote,
    sheet_id: &str,
) -> Result<Vec<ColumnMapping>, RemoteError> {
    let raw = remote.pull(sheet_id)?;
    let header = compute_header_context(&raw, &[], Some(sheet_id));
    Ok(raw
        .get(header.header_row_index)
        .map(from_header_row)
        .unwrap_or_default())
}

fn grid(session: &SheetSession) -> GridResponse<'_> {
    let view = session.view();
    let clean = session.clean_rows();
    let rows = view
        .original_index_map()
        .iter()
        .enumerate()
        .filter_map(|(view_row, &clean_row)| {
            Some(GridRow {
                view_row,
                clean_row,
                absolute_row: view.clean_to_absolute(clean_row)?,
                row_type: session
                    .row_types()
                    .get(clean_row)
                    .copied()
                    .unwrap_or(RowType::Other),
                changed: session.tracker().is_row_changed(clean_row),
                selected: session.selection().contains(view_row),
                cells: clean.get(clean_row)?,
            })
        })
        .collect();

    let header = session.header();
    GridResponse {
        sheet_id: session.sheet_id(),
        header_row_index: header.header_row_index,
        total_offset: header.total_offset,
        mappings: session.mappings(),
        filter: session.filter(),
        sort: session.sort(),
        rows,
        all_selected: session.selection().select_all(),
        summary: session.summary(),
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            status: "error".to_string(),
            message,
        }),
    )
        .into_response()
}

async fn get_sheet(State(state): State<Arc<AppState>>) -> Response {
    let inner = state.inner.lock().await;
    Json(grid(&inner.session)).into_response()
}

async fn edit_cell(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EditRequest>,
) -> impl IntoResponse {
    let mut inner = state.inner.lock().await;
    if let Some(user) = payload.user {
        inner.session.set_user(user);
    }
    let edits = inner.session.edit(payload.row, &payload.column, &payload.value);
    Json(EditResponse {
        edits,
        summary: inner.session.summary(),
    })
}

async fn set_filter(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FilterRequest>,
) -> Response {
    let row_type = match payload.row_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => match RowType::from_str_loose(name) {
            Some(t) => Some(t),
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("unknown row type: {}", name),
                );
            }
        },
    };
    let filter = RowFilter {
        status: payload.status,
        row_type,
        query: payload.query,
    };

    let mut inner = state.inner.lock().await;
    inner.session.set_filter(filter);
    inner.session.set_sort(payload.sort);
    Json(grid(&inner.session)).into_response()
}

async fn select_rows(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SelectRequest>,
) -> impl IntoResponse {
    let mut inner = state.inner.lock().await;
    let session = &mut inner.session;
    let delta = match payload {
        SelectRequest::Toggle { row, checked } => {
            session.toggle_row(row, checked);
            None
        }
        SelectRequest::Shift { row, checked } => {
            session.shift_toggle(row, checked);
            None
        }
        SelectRequest::All { checked } => {
            session.toggle_all(checked);
            None
        }
        SelectRequest::Clear => {
            session.clear_selection();
            None
        }
        SelectRequest::DragStart { row, checked } => Some(session.begin_drag(row, checked)),
        SelectRequest::DragMove { row } => Some(session.drag_to(row)),
        SelectRequest::DragEnd => {
            session.end_drag();
            None
        }
    };
    Json(SelectResponse {
        selected: session.selection().selected_rows(),
        all_selected: session.selection().select_all(),
        delta,
    })
}

async fn get_changes(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut inner = state.inner.lock().await;
    let warning = inner.session.take_unsaved_warning();
    Json(ChangesResponse {
        summary: inner.session.summary(),
        changes: inner.session.tracker().to_persisted().changes,
        warning,
    })
}

async fn sync_changes(State(state): State<Arc<AppState>>) -> Response {
    let mut guard = state.inner.lock().await;
    let Inner { session, remote } = &mut *guard;
    match session.sync(remote) {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            error!("sync of {} failed: {}", session.sheet_id(), e);
            error_response(StatusCode::BAD_GATEWAY, e.to_string())
        }
    }
}

async fn discard_changes(State(state): State<Arc<AppState>>) -> Response {
    let mut inner = state.inner.lock().await;
    inner.session.discard();
    Json(grid(&inner.session)).into_response()
}

async fn scan_code(
    Path(code): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let inner = state.inner.lock().await;
    match inner.session.scan(&code) {
        Some(hit) => Json(hit).into_response(),
        None => error_response(StatusCode::NOT_FOUND, format!("no row matches {}", code)),
    }
}

async fn export_csv(State(state): State<Arc<AppState>>) -> Response {
    let inner = state.inner.lock().await;
    let csv = data_to_csv(inner.session.clean_rows(), inner.session.mappings());
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"inventory.csv\"",
            ),
        ],
        csv,
    )
        .into_response()
}

async fn export_xlsx(State(state): State<Arc<AppState>>) -> Response {
    let inner = state.inner.lock().await;
    match data_to_xlsx(inner.session.clean_rows(), inner.session.mappings()) {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (
                    header::CONTENT_TYPE,
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                ),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"inventory.xlsx\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
