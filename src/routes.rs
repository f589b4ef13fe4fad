//! Search endpoint.
//!
//! The inbound operation the dropdown widget calls: free-text search over
//! a kind's records, gated on an edit capability the host's auth
//! middleware attaches to the request. Authorization is checked before
//! any remote call.

use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::kind::ObjectKind;
use crate::lookup::{LookupAdapter, ProviderClient};
use crate::record::{Page, SearchResultItem};

/// Marker extension proving the caller may edit content.
///
/// The embedding application inserts this after its own authentication;
/// requests without it are rejected with 401 before any provider call.
#[derive(Debug, Clone, Copy)]
pub struct EditCapability;

/// Extractor enforcing the edit capability.
struct RequireEdit;

impl<S: Send + Sync> FromRequestParts<S> for RequireEdit {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if parts.extensions.get::<EditCapability>().is_some() {
            Ok(RequireEdit)
        } else {
            Err(error_response(&LookupError::Unauthorized))
        }
    }
}

/// Shared state for the picker routes.
pub struct PickerState<C> {
    adapter: Arc<LookupAdapter<C>>,
}

impl<C> Clone for PickerState<C> {
    fn clone(&self) -> Self {
        Self {
            adapter: Arc::clone(&self.adapter),
        }
    }
}

/// Query parameters for the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Free-text term; empty or absent lists the first page.
    #[serde(default)]
    pub term: String,
}

/// JSON envelope for picker responses.
#[derive(Debug, Serialize)]
struct PickerResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

impl<T: Serialize> PickerResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

impl PickerResponse<()> {
    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
        }
    }
}

/// Build the picker router: `GET /stripe/{kind}/search?term=`.
///
/// Mount under the host's admin scope, behind middleware that attaches
/// [`EditCapability`] for authorized editors.
pub fn picker_routes<C>(adapter: LookupAdapter<C>) -> Router
where
    C: ProviderClient + 'static,
{
    Router::new()
        .route("/stripe/{kind}/search", get(search_handler::<C>))
        .with_state(PickerState {
            adapter: Arc::new(adapter),
        })
}

async fn search_handler<C>(
    _capability: RequireEdit,
    State(state): State<PickerState<C>>,
    Path(kind): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Response
where
    C: ProviderClient + 'static,
{
    let kind = match ObjectKind::from_str(&kind) {
        Ok(kind) => kind,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(PickerResponse::error(err.to_string())),
            )
                .into_response();
        }
    };

    match state.adapter.search(&query.term, kind).await {
        Ok(page) => success_response(page),
        Err(err) => {
            tracing::warn!(
                target: "stripe_picker::routes",
                kind = %kind,
                term = %query.term,
                error = %err,
                "Picker search failed"
            );
            error_response(&err)
        }
    }
}

fn success_response(page: Page<SearchResultItem>) -> Response {
    Json(PickerResponse::success(page)).into_response()
}

fn error_response(err: &LookupError) -> Response {
    (err.status_code(), Json(PickerResponse::error(err.to_string()))).into_response()
}
