// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # API Integration Tests
//!
//! Integration tests for the HTTP surface of portal-api, driven through the
//! full router and middleware stack:
//!
//! - Session gate and permission checks
//! - Registration, login, self-activation and lookup
//! - Claim submission and administrative review
//! - Client audit events
//! - AI proxy and its rate limit
//!
//! ## Test Categories
//!
//! - `test_gate_*`: Session and permission gate tests
//! - `test_auth_*`: Account endpoint tests
//! - `test_lookup_*`: Public lookup tests
//! - `test_claims_*`: Claim endpoint tests
//! - `test_admin_*`: Administrative endpoint tests
//! - `test_audit_*`: Audit endpoint tests
//! - `test_ai_*`: AI proxy and rate limit tests

use std::net::SocketAddr;

use axum::http::{Method, StatusCode};
use portal_core::{AuditAction, Role};
use serde_json::json;
use tower::ServiceExt;

use portal_tests::prelude::*;

// =============================================================================
// Test Helpers
// =============================================================================

async fn app() -> TestApp {
    init_test_logging();
    TestApp::builder().with_seed_records().build().await
}

fn student_claim() -> serde_json::Value {
    json!({
        "type": "siswa",
        "target_id": MasterFixtures::STUDENT_ID,
        "secondary_id": MasterFixtures::STUDENT_CODE,
    })
}

fn peer(last_octet: u8) -> SocketAddr {
    SocketAddr::from(([10, 0, 0, last_octet], 50000))
}

// =============================================================================
// Gate Tests
// =============================================================================

#[tokio::test]
async fn test_gate_health_and_ready_are_public() {
    let app = app().await;

    let health = app.get("/health", None).await;
    assert_status(&health, 200);
    assert_eq!(health.body["status"], "ok");

    let ready = app.get("/ready", None).await;
    assert_status(&ready, 200);
    assert_eq!(ready.body["ready"], true);

    app.store.set_unavailable(true);
    let ready = app.get("/ready", None).await;
    assert_status(&ready, 503);
    assert_eq!(ready.body["ready"], false);
}

#[tokio::test]
async fn test_gate_protected_routes_require_session() {
    let app = app().await;

    for (method, uri) in [
        (Method::GET, "/api/auth/me"),
        (Method::GET, "/api/claims/me"),
        (Method::POST, "/api/claims"),
        (Method::GET, "/api/admin/claims"),
        (Method::POST, "/api/gemini"),
        (Method::POST, "/api/audit"),
    ] {
        let response = app.request(method.clone(), uri, None, Some(json!({}))).await;
        assert_error(&response, 401, "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_gate_rejects_foreign_tokens() {
    let app = app().await;
    let other = TestApp::builder()
        .with_config(|c| {
            c.security.jwt.secret = Some(portal_config::SecretValue::new(
                "a-completely-different-secret-of-decent-length",
            ))
        })
        .build()
        .await;
    let foreign = other.admin_token();

    let response = app.get("/api/admin/claims", Some(&foreign)).await;
    assert_error(&response, 401, "UNAUTHORIZED");

    let response = app.get("/api/admin/claims", Some("not-a-jwt")).await;
    assert_error(&response, 401, "UNAUTHORIZED");
}

#[tokio::test]
async fn test_gate_admin_routes_need_manage_users() {
    let app = app().await;

    for role in [Role::Guest, Role::Student, Role::Teacher, Role::Headmaster] {
        let token = app.token_for("someone", role);
        let response = app.get("/api/admin/claims", Some(&token)).await;
        assert_error(&response, 403, "FORBIDDEN");
    }

    for role in [Role::Admin, Role::Developer, Role::Operator] {
        let token = app.token_for("staff-admin", role);
        let response = app.get("/api/admin/claims", Some(&token)).await;
        assert_status(&response, 200);
    }
}

// =============================================================================
// Account Tests
// =============================================================================

#[tokio::test]
async fn test_auth_register_login_and_me() {
    let app = app().await;
    let email = unique_email("daftar");

    let (uid, token) = app.register(&email, "Dewi").await;
    wait_for_audit(&app.audit, AuditAction::Register).await;

    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_status(&me, 200);
    assert_eq!(me.body["profile"]["uid"], uid.as_str());
    assert_eq!(me.body["profile"]["display_name"], "Dewi");
    assert_eq!(me.body["role"], "GUEST");
    assert_eq!(me.body["permissions"], json!([]));

    let login = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": email.to_uppercase(), "password": TEST_PASSWORD }),
        )
        .await;
    assert_status(&login, 200);
    assert_eq!(login.str_field("uid"), uid);
    assert_eq!(login.body["expires_in"], 3600);
    wait_for_audit(&app.audit, AuditAction::Login).await;
}

#[tokio::test]
async fn test_auth_register_conflicts_and_validation() {
    let app = app().await;
    let email = unique_email("ganda");
    app.register(&email, "Satu").await;

    let duplicate = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": email, "password": TEST_PASSWORD }),
        )
        .await;
    assert_error(&duplicate, 409, "CONFLICT");

    let weak = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": unique_email("lemah"), "password": "123" }),
        )
        .await;
    assert_error(&weak, 422, "VALIDATION_ERROR");

    let bad_email = app
        .post(
            "/api/auth/register",
            None,
            json!({ "email": "bukan-email", "password": TEST_PASSWORD }),
        )
        .await;
    assert_error(&bad_email, 422, "VALIDATION_ERROR");
    assert_eq!(bad_email.body["error"]["details"]["fields"][0]["field"], "email");

    let malformed = app
        .request(Method::POST, "/api/auth/register", None, Some(json!("text")))
        .await;
    assert_error(&malformed, 400, "BAD_REQUEST");
}

#[tokio::test]
async fn test_auth_login_failure_is_audited() {
    let app = app().await;
    let email = unique_email("salah");
    app.register(&email, "Eko").await;

    let response = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": email, "password": "bukan-sandinya" }),
        )
        .await;
    assert_error(&response, 401, "UNAUTHORIZED");

    let entry = wait_for_audit(&app.audit, AuditAction::LoginFailed).await;
    assert_eq!(entry.user_id.as_deref(), Some(email.as_str()));
}

#[tokio::test]
async fn test_auth_activate_issues_linked_session() {
    let app = app().await;
    let email = unique_email("aktivasi");

    let response = app
        .post(
            "/api/auth/activate",
            None,
            json!({
                "email": email,
                "password": TEST_PASSWORD,
                "type": "siswa",
                "primary_id": MasterFixtures::STUDENT_ID,
                "secondary_id": MasterFixtures::STUDENT_CODE,
            }),
        )
        .await;
    assert_status(&response, 201);
    assert_eq!(response.body["master_id"], MasterFixtures::STUDENT_ID);
    assert_eq!(response.body["reclaimed"], false);
    assert_eq!(response.body["role"], "SISWA");
    assert_eq!(response.body["profile"]["linked_master_type"], "siswa");

    let token = response.str_field("token").to_string();
    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.body["role"], "SISWA");
    assert_eq!(me.body["permissions"], json!(["view-dashboard"]));

    wait_for_audit(&app.audit, AuditAction::Activate).await;
}

#[tokio::test]
async fn test_auth_activate_mismatch_is_not_found() {
    let app = app().await;

    let response = app
        .post(
            "/api/auth/activate",
            None,
            json!({
                "email": unique_email("keliru"),
                "password": TEST_PASSWORD,
                "type": "guru",
                "primary_id": MasterFixtures::STAFF_ID,
                "secondary_id": "Siti Aminah",
            }),
        )
        .await;
    assert_error(&response, 404, "NOT_FOUND");
    assert!(app.identity.is_empty());
}

#[tokio::test]
async fn test_auth_activate_store_outage_compensates() {
    let app = app().await;

    app.store.fail_next_commit();
    let response = app
        .post(
            "/api/auth/activate",
            None,
            json!({
                "email": unique_email("putus"),
                "password": TEST_PASSWORD,
                "type": "siswa",
                "primary_id": MasterFixtures::STUDENT_ID,
                "secondary_id": MasterFixtures::STUDENT_CODE,
            }),
        )
        .await;
    assert_error(&response, 503, "SERVICE_UNAVAILABLE");
    assert!(app.identity.is_empty());
}

#[tokio::test]
async fn test_auth_sso_disabled_is_unavailable() {
    let app = app().await;
    let response = app
        .post("/api/auth/login-sso", None, json!({ "id_token": "x" }))
        .await;
    assert_error(&response, 503, "SERVICE_UNAVAILABLE");
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[tokio::test]
async fn test_lookup_returns_public_view() {
    let app = app().await;

    let response = app
        .get(&format!("/api/lookup/siswa/{}", MasterFixtures::STUDENT_ID), None)
        .await;
    assert_status(&response, 200);
    assert_eq!(response.body["name"], "Budi Santoso");
    assert_eq!(response.body["type"], "siswa");
    assert!(response.body.get("verification_code").is_none());

    let staff = app
        .get(&format!("/api/lookup/staff/{}", MasterFixtures::STAFF_ID), None)
        .await;
    assert_status(&staff, 200);
    assert_eq!(staff.body["type"], "guru");
}

#[tokio::test]
async fn test_lookup_hides_short_absent_and_claimed() {
    let app = app().await;

    let short = app.get("/api/lookup/siswa/00123", None).await;
    let absent = app.get("/api/lookup/siswa/0000000000", None).await;
    assert_error(&short, 404, "NOT_FOUND");
    assert_error(&absent, 404, "NOT_FOUND");
    assert_eq!(short.body, absent.body);

    let unknown_type = app.get("/api/lookup/alumni/0012345678", None).await;
    assert_error(&unknown_type, 400, "BAD_REQUEST");

    app.post(
        "/api/auth/activate",
        None,
        json!({
            "email": unique_email("klaim"),
            "password": TEST_PASSWORD,
            "type": "siswa",
            "primary_id": MasterFixtures::STUDENT_ID,
            "secondary_id": MasterFixtures::STUDENT_CODE,
        }),
    )
    .await;
    let claimed = app
        .get(&format!("/api/lookup/siswa/{}", MasterFixtures::STUDENT_ID), None)
        .await;
    assert_eq!(claimed.body, absent.body);
}

// =============================================================================
// Claim Tests
// =============================================================================

#[tokio::test]
async fn test_claims_submit_uses_stored_profile() {
    let app = app().await;
    let email = unique_email("pengaju");
    let (uid, token) = app.register(&email, "Fajar").await;

    let response = app.post("/api/claims", Some(&token), student_claim()).await;
    assert_status(&response, 201);
    assert_eq!(response.body["user_id"], uid.as_str());
    assert_eq!(response.body["user_name"], "Fajar");
    assert_eq!(response.body["user_email"], email.as_str());
    assert_eq!(response.body["status"], "pending");
    assert_eq!(response.body["auto_match"], true);

    let again = app.post("/api/claims", Some(&token), student_claim()).await;
    assert_error(&again, 409, "CONFLICT");

    let mine = app.get("/api/claims/me", Some(&token)).await;
    assert_status(&mine, 200);
    assert_eq!(mine.body.as_array().map(Vec::len), Some(1));

    wait_for_audit(&app.audit, AuditAction::ClaimSubmit).await;
}

#[tokio::test]
async fn test_claims_submit_validation() {
    let app = app().await;
    let (_, token) = app.register(&unique_email("kosong"), "Gita").await;

    let response = app
        .post(
            "/api/claims",
            Some(&token),
            json!({ "type": "siswa", "target_id": " ", "secondary_id": "" }),
        )
        .await;
    assert_error(&response, 422, "VALIDATION_ERROR");
    assert_eq!(
        response.body["error"]["details"]["fields"].as_array().map(Vec::len),
        Some(2)
    );
}

#[tokio::test]
async fn test_claims_history_empty_when_read_denied() {
    let app = app().await;
    let (_, token) = app.register(&unique_email("tertutup"), "Hana").await;
    app.post("/api/claims", Some(&token), student_claim()).await;

    app.store.deny_reads(portal_core::store::Collection::ClaimRequests);
    let mine = app.get("/api/claims/me", Some(&token)).await;
    assert_status(&mine, 200);
    assert_eq!(mine.body, json!([]));
}

// =============================================================================
// Admin Tests
// =============================================================================

#[tokio::test]
async fn test_admin_review_and_approve_flow() {
    let app = app().await;
    let admin = app.admin_token();
    let (uid, token) = app.register(&unique_email("calon"), "Indra").await;

    let claim = app.post("/api/claims", Some(&token), student_claim()).await;
    let claim_id = claim.str_field("id").to_string();

    let pending = app.get("/api/admin/claims", Some(&admin)).await;
    assert_status(&pending, 200);
    assert_eq!(pending.body[0]["id"], claim_id.as_str());

    let review = app
        .post_empty(&format!("/api/admin/claims/{}/review", claim_id), Some(&admin))
        .await;
    assert_status(&review, 200);
    assert_eq!(review.body["claim"]["status"], "reviewing");
    assert_eq!(review.body["master"]["id"], MasterFixtures::STUDENT_ID);

    let reviewing = app.get("/api/admin/claims?status=reviewing", Some(&admin)).await;
    assert_eq!(reviewing.body.as_array().map(Vec::len), Some(1));

    let approve = app
        .post_empty(&format!("/api/admin/claims/{}/approve", claim_id), Some(&admin))
        .await;
    assert_status(&approve, 200);
    assert_eq!(approve.body["status"], "approved");
    assert_eq!(approve.body["processed_by"], "admin-test");

    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.body["profile"]["role"], "SISWA");
    assert_eq!(me.body["profile"]["claim_verified"], true);
    assert_eq!(me.body["role"], "GUEST", "permissions follow the session role");

    let twice = app
        .post_empty(&format!("/api/admin/claims/{}/approve", claim_id), Some(&admin))
        .await;
    assert_error(&twice, 409, "CONFLICT");

    let entry = wait_for_audit(&app.audit, AuditAction::ClaimApprove).await;
    assert_eq!(entry.user_id.as_deref(), Some("admin-test"));

    let login = app
        .post(
            "/api/auth/login",
            None,
            json!({ "email": me.body["profile"]["email"], "password": TEST_PASSWORD }),
        )
        .await;
    assert_eq!(login.body["role"], "SISWA");
    assert_eq!(login.str_field("uid"), uid);
}

#[tokio::test]
async fn test_admin_approve_requires_review_step() {
    let app = app().await;
    let admin = app.admin_token();
    let (_, token) = app.register(&unique_email("langsung"), "Lina").await;
    let claim = app.post("/api/claims", Some(&token), student_claim()).await;
    let claim_id = claim.str_field("id").to_string();
    let approve_uri = format!("/api/admin/claims/{}/approve", claim_id);

    let early = app.post_empty(&approve_uri, Some(&admin)).await;
    assert_error(&early, 409, "CONFLICT");

    let me = app.get("/api/auth/me", Some(&token)).await;
    assert_eq!(me.body["profile"]["role"], "GUEST");

    app.post_empty(&format!("/api/admin/claims/{}/review", claim_id), Some(&admin))
        .await;
    let approved = app.post_empty(&approve_uri, Some(&admin)).await;
    assert_status(&approved, 200);

    let again = app
        .post(
            "/api/claims",
            Some(&token),
            json!({
                "type": "siswa",
                "target_id": MasterFixtures::SECOND_STUDENT_ID,
                "secondary_id": "0000",
            }),
        )
        .await;
    assert_error(&again, 409, "CONFLICT");
}

#[tokio::test]
async fn test_admin_reject_requires_reason() {
    let app = app().await;
    let admin = app.admin_token();
    let (_, token) = app.register(&unique_email("ditolak"), "Joko").await;
    let claim = app.post("/api/claims", Some(&token), student_claim()).await;
    let uri = format!("/api/admin/claims/{}/reject", claim.str_field("id"));

    let missing = app.post(&uri, Some(&admin), json!({})).await;
    assert_error(&missing, 422, "VALIDATION_ERROR");

    let rejected = app
        .post(&uri, Some(&admin), json!({ "reason": "Data tidak sesuai" }))
        .await;
    assert_status(&rejected, 200);
    assert_eq!(rejected.body["status"], "rejected");
    assert_eq!(rejected.body["rejection_reason"], "Data tidak sesuai");

    let resubmit = app.post("/api/claims", Some(&token), student_claim()).await;
    assert_status(&resubmit, 201);
}

#[tokio::test]
async fn test_admin_unknown_claim_and_status() {
    let app = app().await;
    let admin = app.admin_token();

    let missing = app
        .post_empty("/api/admin/claims/tidak-ada/approve", Some(&admin))
        .await;
    assert_error(&missing, 404, "NOT_FOUND");

    let bad_filter = app.get("/api/admin/claims?status=lost", Some(&admin)).await;
    assert_error(&bad_filter, 400, "BAD_REQUEST");

    let all = app.get("/api/admin/claims?status=all", Some(&admin)).await;
    assert_status(&all, 200);
}

#[tokio::test]
async fn test_admin_assign_role() {
    let app = app().await;
    let admin = app.admin_token();
    let (uid, _) = app.register(&unique_email("naik"), "Kiki").await;
    let uri = format!("/api/admin/users/{}/role", uid);

    let unknown = app.put(&uri, Some(&admin), json!({ "role": "kepala-dinas" })).await;
    assert_error(&unknown, 422, "VALIDATION_ERROR");

    let assigned = app.put(&uri, Some(&admin), json!({ "role": "wali kelas" })).await;
    assert_status(&assigned, 200);
    assert_eq!(assigned.body["previous"], "GUEST");
    assert_eq!(assigned.body["role"], "WALI_KELAS");

    let entry = wait_for_audit(&app.audit, AuditAction::RoleChange).await;
    assert_eq!(entry.user_id.as_deref(), Some("admin-test"));

    let missing = app
        .put("/api/admin/users/tidak-ada/role", Some(&admin), json!({ "role": "SISWA" }))
        .await;
    assert_error(&missing, 404, "NOT_FOUND");
}

// =============================================================================
// Audit Tests
// =============================================================================

#[tokio::test]
async fn test_audit_event_recorded_for_session() {
    let app = app().await;
    let token = app.token_for("guru-1", Role::Teacher);

    let response = app
        .post(
            "/api/audit",
            Some(&token),
            json!({ "action": "open_report", "target": "rekap", "success": true }),
        )
        .await;
    assert_status(&response, 201);

    let entries = app.audit.entries_for_action(AuditAction::ClientEvent);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id.to_string(), response.str_field("id"));
    assert_eq!(entries[0].user_id.as_deref(), Some("guru-1"));
}

#[tokio::test]
async fn test_audit_anonymous_only_in_development() {
    let app = TestApp::builder().development().build().await;

    let response = app
        .post("/api/audit", None, json!({ "action": "page_view", "success": true }))
        .await;
    assert_status(&response, 201);

    let entries = app.audit.entries_for_action(AuditAction::ClientEvent);
    assert_eq!(entries[0].user_id.as_deref(), Some("anonymous"));

    let invalid = app
        .post("/api/audit", None, json!({ "action": " ", "success": true }))
        .await;
    assert_error(&invalid, 422, "VALIDATION_ERROR");
}

// =============================================================================
// AI Proxy Tests
// =============================================================================

#[tokio::test]
async fn test_ai_disabled_is_unavailable() {
    let app = app().await;
    let token = app.token_for("guru-1", Role::Teacher);

    let response = app
        .post("/api/gemini", Some(&token), json!({ "contents": [] }))
        .await;
    assert_error(&response, 503, "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn test_ai_forwards_body_and_relays_response() {
    let upstream = MockAiUpstream::start(StatusCode::OK, json!({ "candidates": ["halo"] })).await;
    let app = TestApp::builder()
        .with_ai(&upstream.base_url(), "kunci-ai")
        .build()
        .await;
    let token = app.token_for("guru-1", Role::Teacher);

    let prompt = json!({ "contents": [{ "parts": [{ "text": "Buat soal" }] }] });
    let response = app.post("/api/gemini", Some(&token), prompt.clone()).await;
    assert_status(&response, 200);
    assert_eq!(response.body, json!({ "candidates": ["halo"] }));

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].path, "/v1beta/models/gemini-1.5-flash:generateContent");
    assert_eq!(requests[0].api_key.as_deref(), Some("kunci-ai"));
    let forwarded: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(forwarded, prompt);

    let entry = wait_for_audit(&app.audit, AuditAction::AiRequest).await;
    assert_eq!(entry.user_id.as_deref(), Some("guru-1"));
}

#[tokio::test]
async fn test_ai_relays_upstream_errors() {
    let upstream = MockAiUpstream::start(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "quota" } }),
    )
    .await;
    let app = TestApp::builder()
        .with_ai(&upstream.base_url(), "kunci-ai")
        .build()
        .await;
    let token = app.token_for("guru-1", Role::Teacher);

    let response = app.post("/api/gemini", Some(&token), json!({})).await;
    assert_status(&response, 429);
    assert_eq!(response.body["error"]["message"], "quota");
}

#[tokio::test]
async fn test_ai_unreachable_upstream_is_bad_gateway() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let closed = listener.local_addr().unwrap();
    drop(listener);

    let app = TestApp::builder()
        .with_ai(&format!("http://{}", closed), "kunci-ai")
        .build()
        .await;
    let token = app.token_for("guru-1", Role::Teacher);

    let response = app.post("/api/gemini", Some(&token), json!({})).await;
    assert_error(&response, 502, "BAD_GATEWAY");
}

#[tokio::test]
async fn test_ai_requires_permission_in_production() {
    let upstream = MockAiUpstream::start(StatusCode::OK, json!({})).await;
    let app = TestApp::builder()
        .with_ai(&upstream.base_url(), "kunci-ai")
        .build()
        .await;
    let token = app.token_for("siswa-1", Role::Student);

    let response = app.post("/api/gemini", Some(&token), json!({})).await;
    assert_error(&response, 403, "FORBIDDEN");
    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn test_ai_anonymous_in_development() {
    let upstream = MockAiUpstream::start(StatusCode::OK, json!({ "ok": true })).await;
    let app = TestApp::builder()
        .development()
        .with_ai(&upstream.base_url(), "kunci-ai")
        .build()
        .await;

    let response = app.post("/api/gemini", None, json!({})).await;
    assert_status(&response, 200);

    let entry = wait_for_audit(&app.audit, AuditAction::AiRequest).await;
    assert_eq!(entry.user_id.as_deref(), Some("anonymous"));
}

#[tokio::test]
async fn test_ai_rate_limit_per_peer_and_user() {
    let upstream = MockAiUpstream::start(StatusCode::OK, json!({})).await;
    let app = TestApp::builder()
        .with_ai(&upstream.base_url(), "kunci-ai")
        .with_rate_limit(2, 60)
        .build()
        .await;
    let token = app.token_for("guru-1", Role::Teacher);
    let other = app.token_for("guru-2", Role::Teacher);

    for _ in 0..2 {
        let ok = app
            .request_from(peer(1), Method::POST, "/api/gemini", Some(&token), Some(json!({})))
            .await;
        assert_status(&ok, 200);
    }

    let limited = app
        .request_from(peer(1), Method::POST, "/api/gemini", Some(&token), Some(json!({})))
        .await;
    assert_error(&limited, 429, "RATE_LIMITED");
    assert_eq!(limited.body["error"]["details"]["window_secs"], 60);

    let other_peer = app
        .request_from(peer(2), Method::POST, "/api/gemini", Some(&token), Some(json!({})))
        .await;
    assert_status(&other_peer, 200);

    let other_user = app
        .request_from(peer(1), Method::POST, "/api/gemini", Some(&other), Some(json!({})))
        .await;
    assert_status(&other_user, 200);

    assert_eq!(upstream.requests().len(), 4);
}

#[tokio::test]
async fn test_ai_rate_limit_ignores_forwarded_header() {
    let upstream = MockAiUpstream::start(StatusCode::OK, json!({})).await;
    let app = TestApp::builder()
        .with_ai(&upstream.base_url(), "kunci-ai")
        .with_rate_limit(1, 60)
        .build()
        .await;
    let token = app.token_for("guru-1", Role::Teacher);

    let first = app.post("/api/gemini", Some(&token), json!({})).await;
    assert_status(&first, 200);

    let mut request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/gemini")
        .header("authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.77")
        .body(axum::body::Body::from("{}"))
        .unwrap();
    request
        .extensions_mut()
        .insert(axum::extract::ConnectInfo(SocketAddr::from(DEFAULT_PEER)));

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}
