use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::{charts, manifests, spaces, versions};
use crate::state::AppState;

/// Largest accepted upload body. Chart archives are small, but well past
/// axum's 2 MiB default.
const MAX_BODY_BYTES: usize = 256 * 1024 * 1024;

/// Build the `/api/v1` router over one configured storage manager.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/spaces", get(spaces::list_spaces).post(spaces::create_space))
        .route("/api/v1/spaces/:space", delete(spaces::delete_space))
        .route(
            "/api/v1/spaces/:space/charts",
            get(charts::list_charts).post(charts::create_or_upload_chart),
        )
        .route(
            "/api/v1/spaces/:space/charts/:chart",
            delete(charts::delete_chart),
        )
        .route(
            "/api/v1/spaces/:space/charts/:chart/versions",
            get(versions::list_versions),
        )
        .route(
            "/api/v1/spaces/:space/charts/:chart/versions/:version",
            get(versions::download_version)
                .put(versions::put_version)
                .delete(versions::delete_version),
        )
        .route(
            "/api/v1/spaces/:space/charts/:chart/versions/:version/manifests/metadata",
            get(manifests::fetch_metadata).put(manifests::update_metadata),
        )
        .route(
            "/api/v1/spaces/:space/charts/:chart/versions/:version/manifests/values",
            get(manifests::fetch_values).put(manifests::update_values),
        )
        .route(
            "/api/v1/spaces/:space/metadata",
            get(manifests::list_metadata_in_space),
        )
        .route(
            "/api/v1/spaces/:space/metadata/latest",
            get(manifests::list_latest_metadata_in_space),
        )
        .route(
            "/api/v1/spaces/:space/charts/:chart/metadata",
            get(manifests::list_metadata_in_chart),
        )
        .route(
            "/api/v1/spaces/:space/charts/:chart/metadata/latest",
            get(manifests::latest_metadata_in_chart),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
