//! Request-side helpers: tenant multiplexing, pagination, multipart
//! extraction, and the bridge onto the blocking storage engine.

use std::collections::HashMap;

use axum::extract::Multipart;
use axum::http::HeaderMap;

use chartreg_compose::ConfigNode;
use chartreg_types::error::{
    RegistryResult, ERROR_INTERNAL_UNKNOWN, ERROR_INVALID_PARAM, ERROR_PARAM_NOT_FOUND,
    ERROR_PARAM_TYPE,
};
use chartreg_types::RegistryError;

pub const SPECIAL_SPACE: &str = "library";
pub const SPECIAL_TENANT: &str = "system-tenant";
pub const SPECIAL_TENANT_SPACE: &str = "system-tenant_library";

/// Multipart field carrying the chart archive.
pub const UPLOAD_FILE_NAME: &str = "chartfile";

/// Default page size.
pub const DEFAULT_PAGING_LIMIT: usize = 10;

/// Tenant from the `X-Tenant` header, defaulting to the system tenant.
pub fn tenant_name(headers: &HeaderMap) -> String {
    headers
        .get("X-Tenant")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .unwrap_or(SPECIAL_TENANT)
        .to_string()
}

/// Glue the tenant onto a space name. The shared `library` space always maps
/// to the system tenant's copy.
pub fn glue_space(tenant: &str, space: &str) -> String {
    if space == SPECIAL_SPACE {
        SPECIAL_TENANT_SPACE.to_string()
    } else {
        format!("{tenant}_{space}")
    }
}

/// Split a glued space back into tenant and original name.
pub fn split_space(space: &str) -> (&str, &str) {
    match space.find('_') {
        Some(index) => (&space[..index], &space[index + 1..]),
        None => (SPECIAL_TENANT, space),
    }
}

/// Rewrite a glued space name back to its original in error texts.
pub fn translate_error(mut err: RegistryError, glued: &str) -> RegistryError {
    let (_, origin) = split_space(glued);
    err.message = err.message.replace(glued, origin);
    err.detail = err.detail.replace(glued, origin);
    for value in err.data.values_mut() {
        *value = value.replace(glued, origin);
    }
    err
}

/// Glue the tenant onto every package reference in an orchestration tree.
pub fn glue_config_spaces(node: &mut ConfigNode, tenant: &str) {
    node.package.space = glue_space(tenant, &node.package.space);
    for child in node.children.values_mut() {
        glue_config_spaces(child, tenant);
    }
}

/// Parse `start` and `limit` query parameters with their defaults.
pub fn paging(query: &HashMap<String, String>) -> RegistryResult<(usize, usize)> {
    let start = match query.get("start") {
        None => 0,
        Some(raw) => raw.parse().map_err(|_| {
            ERROR_PARAM_TYPE.with([
                ("name", "start".into()),
                ("expected", "number".into()),
                ("actual", "string".into()),
            ])
        })?,
    };
    let limit = match query.get("limit") {
        None => DEFAULT_PAGING_LIMIT,
        Some(raw) => raw.parse().map_err(|_| {
            ERROR_PARAM_TYPE.with([
                ("name", "limit".into()),
                ("expected", "number".into()),
                ("actual", "string".into()),
            ])
        })?,
    };
    Ok((start, limit))
}

/// Clamp a page to `[0, total]`; out-of-range selections are empty.
pub fn standardize_range(total: usize, start: usize, limit: usize) -> (usize, usize) {
    if start >= total {
        return (0, 0);
    }
    (start, (start + limit).min(total))
}

/// Select one page out of `items`.
pub fn page<T>(items: Vec<T>, start: usize, limit: usize) -> (usize, Vec<T>) {
    let total = items.len();
    let (start, end) = standardize_range(total, start, limit);
    (total, items.into_iter().skip(start).take(end - start).collect())
}

/// Pull the chart archive out of a multipart upload.
pub async fn chart_file_data(mut multipart: Multipart) -> RegistryResult<Vec<u8>> {
    loop {
        let field = multipart.next_field().await.map_err(|_| {
            ERROR_INVALID_PARAM.with([
                ("name", UPLOAD_FILE_NAME.into()),
                ("value", "unreadable multipart body".into()),
            ])
        })?;
        let Some(field) = field else {
            return Err(ERROR_PARAM_NOT_FOUND.with([("name", UPLOAD_FILE_NAME.into())]));
        };
        if field.name() == Some(UPLOAD_FILE_NAME) {
            return field.bytes().await.map(|bytes| bytes.to_vec()).map_err(|_| {
                ERROR_INVALID_PARAM.with([
                    ("name", UPLOAD_FILE_NAME.into()),
                    ("value", "unreadable upload".into()),
                ])
            });
        }
    }
}

/// Run a blocking storage operation off the async runtime.
pub async fn blocking<T, F>(f: F) -> RegistryResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> RegistryResult<T> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result,
        Err(join_error) => Err(ERROR_INTERNAL_UNKNOWN.wrap(join_error)),
    }
}
