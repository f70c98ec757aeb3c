use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::cache::cache_key;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ScoreParams {
    year: Option<i32>,
}

/// Pillar scores plus breakdown for a company. Year defaults to the most
/// recently scored one.
pub async fn company_scores(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(params): Query<ScoreParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let company = state
        .catalog
        .by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("company {id} not found")))?;

    let year = match params.year {
        Some(year) => year,
        None => state
            .scores
            .latest_year(&company.symbol)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("no scores for {}", company.symbol))
            })?,
    };

    let key = cache_key(&["scores", &id.to_string(), &year.to_string()]);
    if let Some(cached) = state.cache.get(&key).await {
        return Ok(Json(cached));
    }

    let rows = state.scores.for_company_year(&company.symbol, year).await?;
    if rows.is_empty() {
        return Err(ApiError::NotFound(format!(
            "no scores for {} in {year}",
            company.symbol
        )));
    }

    let overall = rows
        .iter()
        .find(|r| r.pillar == "OVERALL")
        .and_then(|r| r.overall_score);

    let body = serde_json::json!({
        "company": { "id": company.id, "symbol": company.symbol, "name": company.company_name },
        "year": year,
        "overall_score": overall,
        "scores": rows,
    });
    state.cache.set(&key, &body).await;
    Ok(Json(body))
}
