#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::macros::date;
// self
use dashboard_client::{
	_preludet::*,
	auth::{CredentialPair, StorageKey},
	services::{
		Dashboard, LoginRequest, NewUser, RegisterRequest, Role, UserQuery, UserStatus,
		UserUpdate,
	},
	store::CredentialStore,
};

fn user_json(id: u64, name: &str) -> JsonValue {
	json!({
		"id": id,
		"name": name,
		"email": format!("{}@example.com", name.to_lowercase()),
		"role": "admin",
		"status": "active",
		"created_at": "2024-03-01T10:00:00.000000Z",
		"updated_at": "2024-03-02T10:00:00.000000Z",
		"deleted_at": null
	})
}

#[tokio::test]
async fn login_persists_pair_and_caches_user() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api"));
	let dashboard = Dashboard::new(&client);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/login")
				.json_body(json!({ "email": "ana@example.com", "password": "secret1" }));
			then.status(200).json_body(json!({
				"success": true,
				"message": "Logged in",
				"data": { "token": "T1", "user": user_json(1, "Ana") }
			}));
		})
		.await;
	let session = dashboard
		.auth
		.login(&LoginRequest::new("ana@example.com", "secret1"))
		.await
		.expect("Login should succeed.");

	mock.assert_async().await;

	assert_eq!(session.access_token.expose(), "T1");
	assert_eq!(session.user.as_ref().map(|user| user.name.as_str()), Some("Ana"));

	let snapshot = store.snapshot();

	assert_eq!(snapshot.get(&StorageKey::AccessToken).map(String::as_str), Some("T1"));
	assert_eq!(snapshot.get(&StorageKey::RefreshToken).map(String::as_str), Some("T1"));

	let cached = dashboard
		.auth
		.cached_user()
		.await
		.expect("Cached user should decode.")
		.expect("Login should cache the user.");

	assert_eq!(cached.id, 1);
	assert_eq!(cached.role, Some(Role::Admin));
	assert!(dashboard.auth.is_authenticated().await.expect("Store read should succeed."));
}

#[tokio::test]
async fn minimal_login_then_expiry_refreshes_and_replays() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api"));
	let dashboard = Dashboard::new(&client);
	let login = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/login")
				.json_body(json!({ "email": "a@b.com", "password": "x" }));
			then.status(200).json_body(json!({ "token": "T1", "user": { "id": 1 } }));
		})
		.await;
	let session = dashboard
		.auth
		.login(&LoginRequest::new("a@b.com", "x"))
		.await
		.expect("Minimal login should succeed.");

	login.assert_async().await;

	assert_eq!(session.access_token.expose(), "T1");
	assert_eq!(session.user.as_ref().map(|user| user.id), Some(1));
	assert_eq!(store.snapshot().get(&StorageKey::AccessToken).map(String::as_str), Some("T1"));
	assert_eq!(
		dashboard.auth.cached_user().await.expect("Cache should decode.").map(|user| user.id),
		Some(1)
	);

	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/users/1").header("authorization", "Bearer T1");
			then.status(401).json_body(json!({ "code": "token_expired" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/refresh").header("authorization", "Bearer T1");
			then.status(200).json_body(json!({ "token": "T2" }));
		})
		.await;
	let replay = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/users/1").header("authorization", "Bearer T2");
			then.status(200).json_body(user_json(1, "Ana"));
		})
		.await;
	let user = dashboard.users.get(1).await.expect("Replayed request should succeed.");

	expired.assert_async().await;
	refresh.assert_async().await;
	replay.assert_async().await;

	assert_eq!(user.name, "Ana");
	assert_eq!(store.snapshot().get(&StorageKey::AccessToken).map(String::as_str), Some("T2"));
}

#[tokio::test]
async fn register_stores_distinct_tokens() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api"));
	let dashboard = Dashboard::new(&client);

	server
		.mock_async(|when, then| {
			when.method(POST).path("/api/register");
			then.status(201).json_body(json!({
				"success": true,
				"data": { "accessToken": "A1", "refreshToken": "R1", "user": user_json(2, "Bo") }
			}));
		})
		.await;

	dashboard
		.auth
		.register(&RegisterRequest::new("Bo", "bo@example.com", "secret1"))
		.await
		.expect("Registration should succeed.");

	let snapshot = store.snapshot();

	assert_eq!(snapshot.get(&StorageKey::AccessToken).map(String::as_str), Some("A1"));
	assert_eq!(snapshot.get(&StorageKey::RefreshToken).map(String::as_str), Some("R1"));
}

#[tokio::test]
async fn invalid_payloads_never_reach_the_server() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api"));
	let dashboard = Dashboard::new(&client);
	let any = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(200);
		})
		.await;
	let err = dashboard
		.auth
		.login(&LoginRequest::new("ana", " "))
		.await
		.expect_err("Malformed credentials should be rejected locally.");

	match err {
		Error::Validation(errors) => {
			assert!(!errors.messages("email").is_empty());
			assert!(!errors.messages("password").is_empty());
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	let err = dashboard
		.users
		.create(&NewUser::new("Ana", "ana@example", "secret1"))
		.await
		.expect_err("Malformed email should be rejected locally.");

	assert!(matches!(err, Error::Validation(_)));

	any.assert_calls_async(0).await;

	assert!(store.is_empty());
}

#[tokio::test]
async fn logout_clears_store_even_when_server_fails() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api"));
	let dashboard = Dashboard::new(&client);

	store
		.save_pair(CredentialPair::new("T1", "R1"))
		.await
		.expect("Failed to seed the credential pair into the store.");

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/logout").header("authorization", "Bearer T1");
			then.status(500).body("Internal Server Error");
		})
		.await;

	dashboard.auth.logout().await.expect("Logout should succeed locally.");

	mock.assert_async().await;

	assert!(store.is_empty());
	assert!(!client.is_authenticated().await.expect("Store read should succeed."));
}

#[tokio::test]
async fn current_user_accepts_wrapped_payload_and_refreshes_cache() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.url("/api"));
	let dashboard = Dashboard::new(&client);

	store
		.save_pair(CredentialPair::new("T1", "R1"))
		.await
		.expect("Failed to seed the credential pair into the store.");
	server
		.mock_async(|when, then| {
			when.method(GET).path("/api/me");
			then.status(200)
				.json_body(json!({ "success": true, "data": { "user": user_json(5, "Cy") } }));
		})
		.await;

	let user = dashboard.auth.current_user().await.expect("Current user should load.");

	assert_eq!(user.id, 5);
	assert_eq!(
		dashboard.auth.cached_user().await.expect("Cache should decode.").map(|user| user.id),
		Some(5)
	);
}

#[tokio::test]
async fn users_list_decodes_paginator_with_filters() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_reqwest_test_client(&server.url("/api"));
	let dashboard = Dashboard::new(&client);
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/users")
				.query_param("page", "2")
				.query_param("per_page", "2")
				.query_param("status", "active")
				.query_param("with_trashed", "1");
			then.status(200).json_body(json!({
				"success": true,
				"data": {
					"data": [user_json(3, "Di"), user_json(4, "Ed")],
					"current_page": 2,
					"per_page": 2,
					"total": 5,
					"last_page": 3
				}
			}));
		})
		.await;
	let page = dashboard
		.users
		.list(&UserQuery::page(2, 2).status(UserStatus::Active).with_trashed())
		.await
		.expect("User listing should succeed.");

	mock.assert_async().await;

	assert_eq!(page.items.iter().map(|user| user.id).collect::<Vec<_>>(), vec![3, 4]);
	assert_eq!(page.total, 5);
	assert!(page.has_next());
}

#[tokio::test]
async fn user_lifecycle_hits_soft_and_hard_delete_routes() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_reqwest_test_client(&server.url("/api"));
	let dashboard = Dashboard::new(&client);
	let update = server
		.mock_async(|when, then| {
			when.method(PUT).path("/api/users/9").json_body(json!({ "name": "Flo" }));
			then.status(200).json_body(json!({ "success": true, "data": user_json(9, "Flo") }));
		})
		.await;
	let soft = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/users/9");
			then.status(200).json_body(json!({ "success": true, "message": "Deleted" }));
		})
		.await;
	let restore = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/users/9/restore");
			then.status(200).json_body(json!({ "success": true }));
		})
		.await;
	let force = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/users/9/force");
			then.status(204);
		})
		.await;
	let renamed = dashboard
		.users
		.update(9, &UserUpdate { name: Some("Flo".into()), ..Default::default() })
		.await
		.expect("Update should succeed.");

	assert_eq!(renamed.name, "Flo");

	dashboard.users.delete(9).await.expect("Soft delete should succeed.");

	assert_eq!(dashboard.users.restore(9).await.expect("Restore should succeed."), None);

	dashboard.users.force_delete(9).await.expect("Force delete should succeed.");

	update.assert_async().await;
	soft.assert_async().await;
	restore.assert_async().await;
	force.assert_async().await;
}

#[tokio::test]
async fn statistics_overview_fetches_every_view() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_reqwest_test_client(&server.url("/api"));
	let dashboard = Dashboard::new(&client);
	let monthly = json!([{ "month": 1, "month_name": "January", "total": 30 }]);

	for (route, body) in [
		("/api/statistics/daily", json!([{ "date": "2024-01-05", "total": 2 }])),
		("/api/statistics/weekly", json!({ "statistics": [{ "week": 1, "total": 9 }] })),
		("/api/statistics/monthly", monthly),
		("/api/statistics/summary", json!({ "total": 40, "active": 35, "deleted": 5 })),
	] {
		server
			.mock_async(|when, then| {
				when.method(GET).path(route);
				then.status(200).json_body(json!({ "success": true, "data": body.clone() }));
			})
			.await;
	}

	let overview = dashboard.statistics.all().await.expect("Overview should load.");

	assert_eq!(overview.daily.total(), 2);
	assert_eq!(overview.weekly.total(), 9);
	assert_eq!(overview.monthly.points[0].month_name.as_deref(), Some("January"));
	assert_eq!((overview.summary.total, overview.summary.deleted), (40, 5));
}

#[tokio::test]
async fn statistics_date_range_sends_formatted_days() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_reqwest_test_client(&server.url("/api"));
	let dashboard = Dashboard::new(&client);
	let ranged = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/statistics/daily")
				.query_param("start_date", "2024-01-05")
				.query_param("end_date", "2024-01-07");
			then.status(200).json_body(json!({
				"success": true,
				"data": { "statistics": [{ "date": "2024-01-05", "total": 2 }] }
			}));
		})
		.await;
	let series = dashboard
		.statistics
		.by_date_range(date!(2024 - 01 - 05), date!(2024 - 01 - 07))
		.await
		.expect("Date range should load.");

	ranged.assert_async().await;

	assert_eq!(series.points[0].day(), Some(date!(2024 - 01 - 05)));

	let err = dashboard
		.statistics
		.by_date_range(date!(2024 - 01 - 07), date!(2024 - 01 - 05))
		.await
		.expect_err("Reversed range should be rejected locally.");

	assert!(matches!(err, Error::Validation(_)));

	ranged.assert_calls_async(1).await;
}
