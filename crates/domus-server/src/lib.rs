//! JSON HTTP service for the Domus directory.
//!
//! Exposes an axum [`Router`] over a [`SqliteStore`]: login/logout,
//! session-context switching, and identity/group/membership administration.
//! Authorization decisions go through [`domus_core::authz`] and fail closed.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod token;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use domus_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{groups, identities, members, sessions};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` with
/// `DOMUS_`-prefixed environment overrides.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:              String,
  pub port:              u16,
  pub store_path:        PathBuf,
  pub session_ttl_hours: i64,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState {
  pub store:  SqliteStore,
  pub config: Arc<ServerConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the Domus server.
pub fn router(state: AppState) -> Router {
  Router::new()
    // Authentication and session context
    .route("/auth/login",       post(sessions::login))
    .route("/auth/logout",      post(sessions::logout))
    .route("/session",          get(sessions::get_session))
    .route("/session/contexts", get(sessions::list_contexts))
    .route("/session/context",  put(sessions::set_context))
    // Identities
    .route("/identities",       post(identities::create).get(identities::list))
    .route("/identities/{id}",  get(identities::get_one).delete(identities::delete))
    // Groups
    .route("/groups",           post(groups::create).get(groups::list))
    .route("/groups/{id}",      get(groups::get_one).delete(groups::delete))
    // Members
    .route("/groups/{id}/members",
           get(members::list).post(members::add))
    .route("/groups/{id}/members/{identity_id}",
           put(members::change_role).delete(members::remove))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn make_state() -> AppState {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      store,
      config: Arc::new(ServerConfig {
        host:              "127.0.0.1".to_string(),
        port:              8080,
        store_path:        PathBuf::from(":memory:"),
        session_ttl_hours: 12,
      }),
    }
  }

  async fn oneshot_json(
    state:  AppState,
    method: &str,
    uri:    &str,
    bearer: Option<&str>,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(t) = bearer {
      builder = builder.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
      Some(v) => builder
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(v.to_string()))
        .unwrap(),
      None => builder.body(Body::empty()).unwrap(),
    };

    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  /// Register an identity and log it in; returns (identity_id, token).
  async fn register_and_login(state: &AppState, name: &str) -> (String, String) {
    let tax_id = domus_cpf::generate();
    let (status, body) = oneshot_json(
      state.clone(),
      "POST",
      "/identities",
      None,
      Some(json!({ "tax_id": tax_id, "display_name": name, "password": "segredo" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register: {body}");
    let identity_id = body["identity_id"].as_str().unwrap().to_string();

    let (status, body) = oneshot_json(
      state.clone(),
      "POST",
      "/auth/login",
      None,
      Some(json!({ "tax_id": tax_id, "password": "segredo" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "login: {body}");
    let token = body["token"].as_str().unwrap().to_string();

    (identity_id, token)
  }

  async fn create_group(state: &AppState, token: &str, name: &str) -> String {
    let (status, body) = oneshot_json(
      state.clone(),
      "POST",
      "/groups",
      Some(token),
      Some(json!({ "display_name": name, "kind": "household" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create group: {body}");
    body["group_id"].as_str().unwrap().to_string()
  }

  // ── Auth ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unauthenticated_requests_return_401() {
    let state = make_state().await;
    let (status, _) = oneshot_json(state, "GET", "/session", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn login_rejects_bad_credentials_uniformly() {
    let state = make_state().await;
    let tax_id = domus_cpf::generate();
    oneshot_json(
      state.clone(),
      "POST",
      "/identities",
      None,
      Some(json!({ "tax_id": tax_id, "display_name": "A", "password": "segredo" })),
    )
    .await;

    // Wrong password, unknown account, malformed CPF: same 401.
    for body in [
      json!({ "tax_id": tax_id, "password": "errado" }),
      json!({ "tax_id": domus_cpf::generate(), "password": "segredo" }),
      json!({ "tax_id": "not-a-cpf", "password": "segredo" }),
    ] {
      let (status, _) =
        oneshot_json(state.clone(), "POST", "/auth/login", None, Some(body)).await;
      assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
  }

  #[tokio::test]
  async fn session_summary_and_logout() {
    let state = make_state().await;
    let (identity_id, token) = register_and_login(&state, "Alice").await;

    let (status, body) =
      oneshot_json(state.clone(), "GET", "/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity_id"], identity_id.as_str());
    assert_eq!(body["display_name"], "Alice");
    assert!(body["active_context"].is_null());

    let (status, _) =
      oneshot_json(state.clone(), "POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // The revoked token no longer authenticates.
    let (status, _) =
      oneshot_json(state, "GET", "/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
  }

  // ── Identities ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn registration_validates_tax_id() {
    let state = make_state().await;
    let (status, _) = oneshot_json(
      state,
      "POST",
      "/identities",
      None,
      Some(json!({ "tax_id": "11111111111", "display_name": "X", "password": "p" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn duplicate_tax_id_registration_conflicts() {
    let state = make_state().await;
    let tax_id = domus_cpf::generate();
    let body = json!({ "tax_id": tax_id, "display_name": "A", "password": "p" });

    let (status, _) =
      oneshot_json(state.clone(), "POST", "/identities", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) =
      oneshot_json(state, "POST", "/identities", None, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn identity_may_only_deactivate_itself() {
    let state = make_state().await;
    let (alice_id, _) = register_and_login(&state, "Alice").await;
    let (_, bob_token) = register_and_login(&state, "Bob").await;

    let (status, _) = oneshot_json(
      state.clone(),
      "DELETE",
      &format!("/identities/{alice_id}"),
      Some(&bob_token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  // ── Groups and members ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn group_creator_becomes_first_admin() {
    let state = make_state().await;
    let (alice_id, token) = register_and_login(&state, "Alice").await;
    let group_id = create_group(&state, &token, "Casa Azul").await;

    let (status, body) = oneshot_json(
      state,
      "GET",
      &format!("/groups/{group_id}/members"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let members = body.as_array().unwrap();
    assert_eq!(members.len(), 1);
    assert_eq!(members[0]["identity_id"], alice_id.as_str());
    assert_eq!(members[0]["role"], "admin");
  }

  #[tokio::test]
  async fn non_admin_cannot_manage_members() {
    let state = make_state().await;
    let (_, admin_token) = register_and_login(&state, "Alice").await;
    let (bob_id, bob_token) = register_and_login(&state, "Bob").await;
    let (carol_id, _) = register_and_login(&state, "Carol").await;
    let group_id = create_group(&state, &admin_token, "Casa Azul").await;

    // Admin adds Bob as a plain member.
    let (status, _) = oneshot_json(
      state.clone(),
      "POST",
      &format!("/groups/{group_id}/members"),
      Some(&admin_token),
      Some(json!({ "identity_id": bob_id, "role": "member" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Bob cannot add Carol.
    let (status, _) = oneshot_json(
      state.clone(),
      "POST",
      &format!("/groups/{group_id}/members"),
      Some(&bob_token),
      Some(json!({ "identity_id": carol_id, "role": "member" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Bob can list, though — membership suffices for reads.
    let (status, _) = oneshot_json(
      state,
      "GET",
      &format!("/groups/{group_id}/members"),
      Some(&bob_token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn unknown_role_in_member_body_is_400() {
    let state = make_state().await;
    let (_, token) = register_and_login(&state, "Alice").await;
    let (bob_id, _) = register_and_login(&state, "Bob").await;
    let group_id = create_group(&state, &token, "Casa Azul").await;

    let (status, _) = oneshot_json(
      state,
      "POST",
      &format!("/groups/{group_id}/members"),
      Some(&token),
      Some(json!({ "identity_id": bob_id, "role": "overlord" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }

  #[tokio::test]
  async fn group_delete_blocked_while_members_remain() {
    let state = make_state().await;
    let (_, token) = register_and_login(&state, "Alice").await;
    let group_id = create_group(&state, &token, "Casa Azul").await;

    // The creator's own admin membership keeps the group occupied.
    let (status, _) = oneshot_json(
      state,
      "DELETE",
      &format!("/groups/{group_id}"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn emptied_group_can_be_deleted() {
    let state = make_state().await;
    let (alice_id, token) = register_and_login(&state, "Alice").await;
    let group_id = create_group(&state, &token, "Casa Azul").await;

    // Occupied: refused.
    let (status, _) = oneshot_json(
      state.clone(),
      "DELETE",
      &format!("/groups/{group_id}"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The admin departs, emptying the group.
    let (status, _) = oneshot_json(
      state.clone(),
      "DELETE",
      &format!("/groups/{group_id}/members/{alice_id}"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = oneshot_json(
      state.clone(),
      "DELETE",
      &format!("/groups/{group_id}"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    // Already inactive: a repeat delete is a 404.
    let (status, _) = oneshot_json(
      state,
      "DELETE",
      &format!("/groups/{group_id}"),
      Some(&token),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn duplicate_member_add_conflicts() {
    let state = make_state().await;
    let (_, token) = register_and_login(&state, "Alice").await;
    let (bob_id, _) = register_and_login(&state, "Bob").await;
    let group_id = create_group(&state, &token, "Casa Azul").await;

    let body = json!({ "identity_id": bob_id, "role": "member" });
    let uri = format!("/groups/{group_id}/members");
    let (status, _) =
      oneshot_json(state.clone(), "POST", &uri, Some(&token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) =
      oneshot_json(state, "POST", &uri, Some(&token), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  // ── Session contexts ───────────────────────────────────────────────────────

  #[tokio::test]
  async fn context_selection_requires_exact_role() {
    let state = make_state().await;
    let (_, token) = register_and_login(&state, "Alice").await;
    let group_id = create_group(&state, &token, "Casa Azul").await;

    // Alice holds admin; selecting member is a 422 even though the
    // hierarchy would satisfy it.
    let (status, _) = oneshot_json(
      state.clone(),
      "PUT",
      "/session/context",
      Some(&token),
      Some(json!({ "group_id": group_id, "role": "member" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = oneshot_json(
      state.clone(),
      "PUT",
      "/session/context",
      Some(&token),
      Some(json!({ "group_id": group_id, "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["group_id"], group_id.as_str());
    assert_eq!(body["role"], "admin");

    // The summary reflects the stored context.
    let (_, body) =
      oneshot_json(state, "GET", "/session", Some(&token), None).await;
    assert_eq!(body["active_context"]["group_id"], group_id.as_str());
  }

  #[tokio::test]
  async fn contexts_list_matches_memberships() {
    let state = make_state().await;
    let (_, token) = register_and_login(&state, "Alice").await;
    let g1 = create_group(&state, &token, "Casa Azul").await;
    let g2 = create_group(&state, &token, "Escritório").await;

    let (status, body) =
      oneshot_json(state, "GET", "/session/contexts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let contexts = body.as_array().unwrap();
    assert_eq!(contexts.len(), 2);
    assert_eq!(contexts[0]["group_id"], g1.as_str());
    assert_eq!(contexts[1]["group_id"], g2.as_str());
    assert!(contexts.iter().all(|c| c["role"] == "admin"));
  }
}
