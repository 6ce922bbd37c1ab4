//! Categories API endpoints.

use api_types::category::{CategoryKind, CategoryQuery, CategoryView};
use axum::{
    Json,
    extract::{Query, State},
};
use axum_extra::extract::WithRejection;
use engine::RecordKind;

use crate::{ServerError, server::ServerState};

fn map_kind(kind: CategoryKind) -> RecordKind {
    match kind {
        CategoryKind::Income => RecordKind::Income,
        CategoryKind::Expense => RecordKind::Expense,
    }
}

fn map_record_kind(kind: RecordKind) -> CategoryKind {
    match kind {
        RecordKind::Income => CategoryKind::Income,
        RecordKind::Expense => CategoryKind::Expense,
    }
}

fn map_category(category: engine::Category) -> CategoryView {
    CategoryView {
        id: category.id,
        name: category.name,
        kind: map_record_kind(category.kind),
        created_at: category.created_at,
    }
}

/// `GET /categories?type=income|expense`
pub async fn list(
    State(state): State<ServerState>,
    WithRejection(Query(query), _): WithRejection<Query<CategoryQuery>, ServerError>,
) -> Result<Json<Vec<CategoryView>>, ServerError> {
    let categories = match query.kind {
        Some(kind) => state.engine.list_categories_by_kind(map_kind(kind)).await?,
        None => state.engine.list_categories().await?,
    };

    Ok(Json(categories.into_iter().map(map_category).collect()))
}
