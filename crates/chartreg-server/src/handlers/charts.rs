use std::collections::HashMap;

use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Json;
use axum::RequestExt;

use chartreg_archive::unpack;
use chartreg_compose::{Composer, OrchestrationConfig};
use chartreg_types::error::{
    ERROR_INVALID_PARAM, ERROR_PARAM_TYPE, ERROR_RESOURCE_EXIST,
};

use crate::error::ApiResult;
use crate::handlers::helpers::{
    blocking, chart_file_data, glue_config_spaces, glue_space, page, paging, tenant_name,
    translate_error,
};
use crate::models::{ChartLink, ListResponse};
use crate::state::AppState;

const MAX_CONFIG_BODY: usize = 4 * 1024 * 1024;

/// GET `/api/v1/spaces/{space}/charts` — list charts in a space.
pub async fn list_charts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(space): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResponse<String>>> {
    let (start, limit) = paging(&query)?;
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    let charts = blocking(move || manager.space(&target)?.list_charts())
        .await
        .map_err(|e| translate_error(e, &glued))?;
    let (total, items) = page(charts, start, limit);
    Ok(Json(ListResponse::new(total, items)))
}

/// POST `/api/v1/spaces/{space}/charts` — create a chart.
///
/// Dispatch is by Content-Type: a multipart body uploads an archive whose
/// identity comes from its descriptor; anything else is an orchestration
/// config.
pub async fn create_or_upload_chart(
    State(state): State<AppState>,
    Path(space): Path<String>,
    request: Request,
) -> ApiResult<(StatusCode, Json<ChartLink>)> {
    let headers = request.headers().clone();
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if content_type.contains("multipart/form-data") {
        let multipart: Multipart = request.extract().await.map_err(|_| {
            ERROR_INVALID_PARAM.with([
                ("name", "chartfile".into()),
                ("value", "unreadable multipart body".into()),
            ])
        })?;
        upload_chart(state, headers, space, multipart).await
    } else {
        let body = axum::body::to_bytes(request.into_body(), MAX_CONFIG_BODY)
            .await
            .map_err(|_| {
                ERROR_INVALID_PARAM
                    .with([("name", "config".into()), ("value", "unreadable body".into())])
            })?;
        create_chart(state, headers, space, &body).await
    }
}

/// Archive upload: chart name and version come from the descriptor; the
/// target version must not exist yet.
async fn upload_chart(
    state: AppState,
    headers: HeaderMap,
    space: String,
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
    let chart = bundle.descriptor.name.clone();
    let version = bundle.descriptor.version.clone();
    let glued = glue_space(&tenant_name(&headers), &space);

    let manager = state.manager.clone();
    let (target, chart_name, version_number) = (glued.clone(), chart.clone(), version.clone());
    blocking(move || {
        let handle = manager
            .space(&target)?
            .chart(&chart_name)?
            .version(&version_number)?;
        if handle.exists() {
            return Err(ERROR_RESOURCE_EXIST
                .with([("name", format!("{target}/{chart_name}/{version_number}"))]));
        }
        handle.put_content(&data)
    })
    .await
    .map_err(|e| translate_error(e, &glued))?;

    let link = format!("/api/v1/spaces/{space}/charts/{chart}/versions/{version}");
    Ok((
        StatusCode::CREATED,
        Json(ChartLink::new(space, chart, version, link)),
    ))
}

/// Orchestration: resolve the config tree and store the composed chart.
async fn create_chart(
    state: AppState,
    headers: HeaderMap,
    space: String,
    body: &[u8],
) -> ApiResult<(StatusCode, Json<ChartLink>)> {
    let tenant = tenant_name(&headers);
    let glued = glue_space(&tenant, &space);

    let mut config = OrchestrationConfig::from_json(body)?;
    config.save.space = glued.clone();
    glue_config_spaces(&mut config.configs, &tenant);

    let chart = config.save.chart.clone();
    let version = config.save.version.clone();
    let manager = state.manager.clone();
    blocking(move || Composer::new(&manager).create(&config))
        .await
        .map_err(|e| translate_error(e, &glued))?;

    let link = format!("/api/v1/spaces/{space}/charts/{chart}/versions/{version}");
    Ok((
        StatusCode::CREATED,
        Json(ChartLink::new(space, chart, version, link)),
    ))
}

/// DELETE `/api/v1/spaces/{space}/charts/{chart}` — delete a chart with all
/// of its versions.
pub async fn delete_chart(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((space, chart)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let glued = glue_space(&tenant_name(&headers), &space);
    let manager = state.manager.clone();
    let target = glued.clone();
    blocking(move || manager.space(&target)?.delete_chart(&chart))
        .await
        .map_err(|e| translate_error(e, &glued))?;
    Ok(StatusCode::NO_CONTENT)
}
