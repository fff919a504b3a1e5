//! Log search endpoint.

use axum::Json;
use axum::extract::{Query, State};
use la_ingest::SearchCriteria;
use la_protocol::SearchPage;

use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/v1/logs/search: filtered, sorted, paginated search.
pub async fn search(
    State(state): State<AppState>,
    Query(criteria): Query<SearchCriteria>,
) -> ApiResult<Json<SearchPage>> {
    let page = state.query.search(&criteria).await?;
    Ok(Json(page))
}
