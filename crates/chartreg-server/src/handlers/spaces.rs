use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;

use chartreg_types::error::ERROR_INVALID_PARAM;
use chartreg_types::is_valid_name;

use crate::error::ApiResult;
use crate::handlers::helpers::{
    blocking, glue_space, page, paging, split_space, tenant_name, translate_error,
    SPECIAL_SPACE, SPECIAL_TENANT, SPECIAL_TENANT_SPACE,
};
use crate::models::{Link, ListResponse};
use crate::state::AppState;

/// GET `/api/v1/spaces` — list the tenant's spaces.
pub async fn list_spaces(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<ListResponse<String>>> {
    let (start, limit) = paging(&query)?;
    let tenant = tenant_name(&headers);
    let manager = state.manager.clone();
    let spaces = blocking(move || manager.list_spaces()).await?;

    let prefix = format!("{tenant}_");
    let visible: Vec<String> = spaces
        .into_iter()
        .filter(|space| space != SPECIAL_TENANT_SPACE)
        .filter(|space| space.starts_with(&prefix))
        .map(|space| split_space(&space).1.to_string())
        .collect();
    let (total, items) = page(visible, start, limit);
    Ok(Json(ListResponse::new(total, items)))
}

/// POST `/api/v1/spaces?space=X` — create a space.
pub async fn create_space(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<(StatusCode, Json<Link>)> {
    let Some(space) = query.get("space").filter(|s| !s.is_empty()).cloned() else {
        return Err(chartreg_types::error::ERROR_PARAM_NOT_FOUND
            .with([("name", "space".into())])
            .into());
    };
    // Validate the raw name: tenant gluing would otherwise mask a leading
    // `_` or `-` behind the prefix.
    if !is_valid_name(&space) {
        return Err(ERROR_INVALID_PARAM
            .with([("name", "space".into()), ("value", space)])
            .into());
    }
    let tenant = tenant_name(&headers);
    let glued = glue_space(&tenant, &space);
    if tenant != SPECIAL_TENANT && glued == SPECIAL_TENANT_SPACE {
        return Err(ERROR_INVALID_PARAM
            .with([
                ("name", "space".into()),
                ("value", format!("no permission to create space {SPECIAL_SPACE}")),
            ])
            .into());
    }
    let manager = state.manager.clone();
    let target = glued.clone();
    blocking(move || manager.create_space(&target).map(|_| ()))
        .await
        .map_err(|e| translate_error(e, &glued))?;
    let link = format!("/api/v1/spaces/{space}");
    Ok((StatusCode::CREATED, Json(Link::new(space, link))))
}

/// DELETE `/api/v1/spaces/{space}` — delete a space and its contents.
pub async fn delete_space(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(space): Path<String>,
) -> ApiResult<StatusCode> {
    let tenant = tenant_name(&headers);
    let glued = glue_space(&tenant, &space);
    if tenant != SPECIAL_TENANT && glued == SPECIAL_TENANT_SPACE {
        return Err(ERROR_INVALID_PARAM
            .with([
                ("name", "space".into()),
                ("value", format!("no permission to delete space {SPECIAL_SPACE}")),
            ])
            .into());
    }
    let manager = state.manager.clone();
    let target = glued.clone();
    blocking(move || manager.delete_space(&target))
        .await
        .map_err(|e| translate_error(e, &glued))?;
    Ok(StatusCode::NO_CONTENT)
}
