use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};

use chartreg_archive::unpack;
use chartreg_types::error::{ERROR_PARAM_TYPE, ERROR_PARAM_VALUE};

use crate::error::ApiResult;
use crate::handlers::helpers::{
    blocking, chart_file_data, glue_space, page, paging, tenant_name, translate_error,
};
use crate::models::{ChartLink, ListResponse};
use crate::state::AppState;

/// GET `…/charts/{chart}/versions` — list version numbers in order.
pub async fn list_versions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((space, chart)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResponse<String>>> {
    let (start, limit) = paging(&query)?;
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    let versions = blocking(move || manager.space(&target)?.chart(&chart)?.list_versions())
        .await
        .map_err(|e| translate_error(e, &glued))?;
    let (total, items) = page(versions, start, limit);
    Ok(Json(ListResponse::new(total, items)))
}

/// GET `…/versions/{version}` — download the archive bytes.
pub async fn download_version(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((space, chart, version)): Path<(String, String, String)>,
) -> ApiResult<Response> {
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    let data = blocking(move || {
        manager
            .space(&target)?
            .chart(&chart)?
            .version(&version)?
            .get_content()
    })
    .await
    .map_err(|e| translate_error(e, &glued))?;
    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    )
        .into_response())
}

/// PUT `…/versions/{version}` — upload or replace the archive.
///
/// The archive's descriptor must agree with the chart name and version in
/// the path.
pub async fn put_version(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((space, chart, version)): Path<(String, String, String)>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ChartLink>)> {
    let data = chart_file_data(multipart).await?;
    let bundle = unpack(&data).map_err(|_| {
        ERROR_PARAM_TYPE.with([
            ("name", "chartfile".into()),
            ("expected", "chart archive".into()),
            ("actual", "unknown".into()),
        ])
    })?;
    if bundle.descriptor.name != chart {
        return Err(ERROR_PARAM_VALUE
            .with([("name", "chart".into()), ("value", bundle.descriptor.name)])
            .into());
    }
    if bundle.descriptor.version != version {
        return Err(ERROR_PARAM_VALUE
            .with([("name", "version".into()), ("value", bundle.descriptor.version)])
            .into());
    }

    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let (target, chart_name, version_number) = (glued.clone(), chart.clone(), version.clone());
    blocking(move || {
        manager
            .space(&target)?
            .chart(&chart_name)?
            .version(&version_number)?
            .put_content(&data)
    })
    .await
    .map_err(|e| translate_error(e, &glued))?;

    let link = format!("/api/v1/spaces/{space}/charts/{chart}/versions/{version}");
    Ok((
        StatusCode::CREATED,
        Json(ChartLink::new(space, chart, version, link)),
    ))
}

/// DELETE `…/versions/{version}` — delete one version, cascading to the
/// chart when it was the last.
pub async fn delete_version(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((space, chart, version)): Path<(String, String, String)>,
) -> ApiResult<StatusCode> {
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    blocking(move || manager.space(&target)?.chart(&chart)?.delete_version(&version))
        .await
        .map_err(|e| translate_error(e, &glued))?;
    Ok(StatusCode::NO_CONTENT)
}
