use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};

use chartreg_types::Metadata;

use crate::error::ApiResult;
use crate::handlers::helpers::{
    blocking, glue_space, page, paging, tenant_name, translate_error,
};
use crate::models::ListResponse;
use crate::state::AppState;

/// GET `/api/v1/spaces/{space}/metadata` — metadata of every version in the
/// space.
pub async fn list_metadata_in_space(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(space): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResponse<Metadata>>> {
    let (start, limit) = paging(&query)?;
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    let metadata = blocking(move || manager.space(&target)?.version_metadata())
        .await
        .map_err(|e| translate_error(e, &glued))?;
    let (total, items) = page(metadata, start, limit);
    Ok(Json(ListResponse::new(total, items)))
}

/// GET `/api/v1/spaces/{space}/metadata/latest` — per-chart latest metadata,
/// filterable by `type` and by `sub` (chart-name substring).
pub async fn list_latest_metadata_in_space(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(space): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResponse<Metadata>>> {
    let (start, limit) = paging(&query)?;
    let kind = query.get("type").cloned().unwrap_or_default();
    let sub = query.get("sub").cloned().unwrap_or_default();
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    let metadata = blocking(move || {
        let space = manager.space(&target)?;
        let mut all = Vec::new();
        for chart_name in space.list_charts()? {
            if !sub.is_empty() && !chart_name.contains(&sub) {
                continue;
            }
            let md = space.chart(&chart_name)?.latest_metadata()?;
            if !kind.is_empty() && md.kind.as_deref() != Some(kind.as_str()) {
                continue;
            }
            all.push(md);
        }
        Ok(all)
    })
    .await
    .map_err(|e| translate_error(e, &glued))?;
    let (total, items) = page(metadata, start, limit);
    Ok(Json(ListResponse::new(total, items)))
}

/// GET `…/charts/{chart}/metadata` — metadata of every version of a chart.
pub async fn list_metadata_in_chart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((space, chart)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResponse<Metadata>>> {
    let (start, limit) = paging(&query)?;
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    let metadata = blocking(move || manager.space(&target)?.chart(&chart)?.version_metadata())
        .await
        .map_err(|e| translate_error(e, &glued))?;
    let (total, items) = page(metadata, start, limit);
    Ok(Json(ListResponse::new(total, items)))
}

/// GET `…/charts/{chart}/metadata/latest` — metadata of the newest version.
pub async fn latest_metadata_in_chart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((space, chart)): Path<(String, String)>,
) -> ApiResult<Json<Metadata>> {
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    let metadata = blocking(move || manager.space(&target)?.chart(&chart)?.latest_metadata())
        .await
        .map_err(|e| translate_error(e, &glued))?;
    Ok(Json(metadata))
}

/// GET `…/versions/{version}/manifests/metadata` — the stored metadata tree.
pub async fn fetch_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((space, chart, version)): Path<(String, String, String)>,
) -> ApiResult<Json<Metadata>> {
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    let metadata = blocking(move || {
        manager
            .space(&target)?
            .chart(&chart)?
            .version(&version)?
            .metadata()
    })
    .await
    .map_err(|e| translate_error(e, &glued))?;
    Ok(Json(metadata))
}

/// PUT `…/versions/{version}/manifests/metadata` — replace the stored
/// metadata document.
pub async fn update_metadata(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((space, chart, version)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    blocking(move || {
        manager
            .space(&target)?
            .chart(&chart)?
            .version(&version)?
            .put_metadata(&body)
    })
    .await
    .map_err(|e| translate_error(e, &glued))?;
    Ok(StatusCode::OK)
}

/// GET `…/versions/{version}/manifests/values` — the coalesced values JSON.
pub async fn fetch_values(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((space, chart, version)): Path<(String, String, String)>,
) -> ApiResult<Response> {
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    let values = blocking(move || {
        manager
            .space(&target)?
            .chart(&chart)?
            .version(&version)?
            .values()
    })
    .await
    .map_err(|e| translate_error(e, &glued))?;
    Ok(([(header::CONTENT_TYPE, "application/json")], values).into_response())
}

/// PUT `…/versions/{version}/manifests/values` — replace the stored values
/// document.
pub async fn update_values(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((space, chart, version)): Path<(String, String, String)>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    blocking(move || {
        manager
            .space(&target)?
            .chart(&chart)?
            .version(&version)?
            .put_values(&body)
    })
    .await
    .map_err(|e| translate_error(e, &glued))?;
    Ok(StatusCode::OK)
}
