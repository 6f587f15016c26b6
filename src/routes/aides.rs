//! Aide endpoints
//!
//! - `GET /aides` - every visible aide, most recently updated first
//! - `GET /aides/{id}` - one aide
//! - `POST /aides/search` - territory-scoped search over a JSON filter object

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use super::{error_response, json_response};
use crate::search::RawFilters;
use crate::server::AppState;
use crate::types::AidesError;

/// Handle GET /aides
pub async fn list_aides(state: &AppState) -> Response<Full<Bytes>> {
    match state.aggregator.all_aides().await {
        Ok(aides) => json_response(StatusCode::OK, &aides),
        Err(e) => error_response(e),
    }
}

/// Handle GET /aides/{id}
pub async fn get_aide(state: &AppState, id: &str) -> Response<Full<Bytes>> {
    match state.aggregator.get_aide(id).await {
        Ok(Some(aide)) => json_response(StatusCode::OK, &aide),
        Ok(None) => error_response(AidesError::NotFound(format!("aide {id}"))),
        Err(e) => error_response(e),
    }
}

/// Handle POST /aides/search
pub async fn search_aides(state: &AppState, body: &[u8]) -> Response<Full<Bytes>> {
    let filters = match parse_filters(body) {
        Ok(filters) => filters,
        Err(e) => return error_response(e),
    };
    debug!(keys = filters.len(), "Search request");

    match state.aggregator.search(filters).await {
        Ok(response) => json_response(StatusCode::OK, &response),
        Err(e) => error_response(e),
    }
}

/// An empty body searches without filters; anything else must be an object
fn parse_filters(body: &[u8]) -> Result<RawFilters, AidesError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RawFilters::new());
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AidesError::BadRequest(
            "search filters must be a JSON object".to_string(),
        )),
        Err(e) => Err(AidesError::BadRequest(format!("invalid JSON body: {e}"))),
    }
}
