//! Change feed over server-sent events

use std::convert::Infallible;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use serde::Deserialize;
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    Stream, StreamExt,
};
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::Principal,
    repository::{ChangeEvent, Collection},
    AppState,
};

use super::Authorized;

#[derive(Debug, Deserialize, IntoParams)]
pub struct EventsQuery {
    /// Only changes of this collection
    pub collection: Option<Collection>,
}

/// Whether a change belongs in the caller's feed.
///
/// Administrators follow every collection, other users only the operational ones.
fn forwards(principal: &Principal, requested: Option<Collection>, change: &ChangeEvent) -> bool {
    requested.map_or(true, |c| c == change.collection)
        && (principal.is_admin() || change.collection.is_operational())
}

/// Stream document changes
#[utoipa::path(
    get,
    path = "/events",
    tag = "events",
    security(("bearer_auth" = [])),
    params(EventsQuery),
    responses(
        (status = 200, description = "Stream of `change` events", content_type = "text/event-stream",
         body = crate::repository::ChangeEvent),
        (status = 403, description = "Collection restricted to administrators", body = crate::error::ErrorResponse)
    )
)]
pub async fn stream_events(
    State(state): State<AppState>,
    Authorized(principal): Authorized,
    Query(query): Query<EventsQuery>,
) -> AppResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if let Some(collection) = query.collection {
        if !principal.is_admin() && !collection.is_operational() {
            return Err(AppError::Authorization(format!(
                "Changes of {} are restricted to administrators",
                collection
            )));
        }
    }
    tracing::debug!(uid = %principal.uid, collection = ?query.collection, "Change feed opened");

    let changes = BroadcastStream::new(state.services.repository().subscribe());
    let stream = changes.filter_map(move |item| match item {
        Ok(change) if forwards(&principal, query.collection, &change) => Event::default()
            .event("change")
            .json_data(&change)
            .ok()
            .map(Ok),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!(skipped, "Change feed subscriber lagged");
            None
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::Role, repository::ChangeKind};

    fn change(collection: Collection) -> ChangeEvent {
        ChangeEvent { collection, id: "doc".to_string(), kind: ChangeKind::Put }
    }

    fn operator() -> Principal {
        Principal {
            uid: "uid-O1".to_string(),
            email: None,
            role: Role::Operator { operator_id: "O1".to_string() },
        }
    }

    #[test]
    fn test_operator_feed_skips_restricted_collections() {
        let principal = operator();
        for collection in [Collection::PushTokens, Collection::Admins, Collection::Users] {
            assert!(!forwards(&principal, None, &change(collection)));
        }
        assert!(forwards(&principal, None, &change(Collection::Assignments)));
        assert!(forwards(&principal, None, &change(Collection::Equipment)));
    }

    #[test]
    fn test_admin_feed_honors_collection_filter() {
        let admin = Principal { uid: "admin".to_string(), email: None, role: Role::Admin };
        assert!(forwards(&admin, None, &change(Collection::PushTokens)));
        assert!(forwards(&admin, Some(Collection::Admins), &change(Collection::Admins)));
        assert!(!forwards(&admin, Some(Collection::Admins), &change(Collection::Operators)));
    }
}
