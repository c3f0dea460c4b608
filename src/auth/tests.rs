//! Tests for auth module
//!
//! These tests drive the full router and verify:
//! - Local sign-up and sign-in
//! - Session cookie issuance, sliding renewal and sign-out
//! - Strict versus best-effort session middleware

#[cfg(test)]
mod tests {
    use axum::http::{Method, Request, StatusCode};
    use axum::body::Body;
    use chrono::{Duration, Utc};
    use tower::ServiceExt;

    use crate::common::testing::*;
    use crate::services::tokens::{format_timestamp, parse_timestamp};

    const SIGNUP_BODY: &str = "user=alice&email=Alice%40Example.com&password=password123&confirm_password=password123&date_of_birth=1990-01-01";

    #[tokio::test]
    async fn test_no_cookie_strict_is_401_best_effort_is_guest() {
        let state = test_state().await;

        let response = test_router(&state).oneshot(get("/profile", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = test_router(&state).oneshot(get("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_string(response).await;
        assert!(html.contains(r#"href="/signin""#));
        assert!(html.contains(r#"href="/oauth2_signin/google""#));
    }

    #[tokio::test]
    async fn test_signup_then_lookup() {
        let state = test_state().await;

        let response = test_router(&state)
            .oneshot(post_form("/signup", SIGNUP_BODY, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response).as_deref(), Some("/signin"));

        let user = state.users.find_by_name("alice").await.unwrap().unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_ne!(user.password_hash, "password123");
        assert!(state.passwords.verify("password123", &user.password_hash).unwrap());
        assert_eq!(user.birth_date.as_deref(), Some("1990-01-01"));
        assert!(user.session_token.is_none());
    }

    #[tokio::test]
    async fn test_signup_name_collision_is_409() {
        let state = test_state().await;
        create_user(&state, "alice", "password123").await;

        let body = "user=alice&email=other%40example.com&password=password123&confirm_password=password123&date_of_birth=1990-01-01";
        let response = test_router(&state)
            .oneshot(post_form("/signup", body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(body_string(response).await.contains("Name is already taken"));
        assert_eq!(state.users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_signup_email_collision_is_409() {
        let state = test_state().await;
        create_user(&state, "alice", "password123").await;

        let body = "user=alice2&email=ALICE%40example.com&password=password123&confirm_password=password123&date_of_birth=1990-01-01";
        let response = test_router(&state)
            .oneshot(post_form("/signup", body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(body_string(response).await.contains("Email is already registered"));
    }

    #[tokio::test]
    async fn test_signup_validation_rerenders_form() {
        let state = test_state().await;

        let body = "user=alice&email=alice%40example.com&password=short&confirm_password=short&date_of_birth=1990-01-01";
        let response = test_router(&state)
            .oneshot(post_form("/signup", body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_string(response).await;
        assert!(html.contains("Password must be at least 8 characters"));
        assert!(html.contains(r#"value="alice""#));
        assert!(state.users.find_by_name("alice").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signin_issues_session_cookie() {
        let state = test_state().await;
        let id = create_user(&state, "bob", "password123").await;

        let response = test_router(&state)
            .oneshot(post_form("/signin", "user=bob&password=password123", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response).as_deref(), Some("/"));

        let token = set_session_cookie(&response).unwrap();
        let user = state.users.find_by_token(&token).await.unwrap().unwrap();
        assert_eq!(user.id, id);
        let expiry = parse_timestamp(user.session_expiry.as_deref().unwrap()).unwrap();
        assert!(expiry > Utc::now() + Duration::minutes(29));
    }

    #[tokio::test]
    async fn test_signin_by_email() {
        let state = test_state().await;
        create_user(&state, "bob", "password123").await;

        let response = test_router(&state)
            .oneshot(post_form("/signin", "user=BOB%40example.com&password=password123", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert!(set_session_cookie(&response).is_some());
    }

    #[tokio::test]
    async fn test_signin_rejects_bad_credentials() {
        let state = test_state().await;
        create_user(&state, "bob", "password123").await;

        for body in [
            "user=bob&password=wrong-password",
            "user=nobody&password=password123",
        ] {
            let response = test_router(&state)
                .oneshot(post_form("/signin", body, None))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert!(set_session_cookie(&response).is_none());
            assert!(body_string(response).await.contains("Invalid name or password"));
        }
    }

    #[tokio::test]
    async fn test_signin_rejects_provider_only_account() {
        let state = test_state().await;
        state
            .users
            .create(&crate::auth::models::NewUser {
                name: "octo".to_string(),
                email: "octo@github.com".to_string(),
                password_hash: String::new(),
                birth_date: None,
            })
            .await
            .unwrap();

        let response = test_router(&state)
            .oneshot(post_form("/signin", "user=octo&password=anything", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_strict_route_slides_expiry_and_reissues_cookie() {
        let state = test_state().await;
        let (id, token) = signed_in_user(&state, "carol").await;
        let before = state.users.find_by_id(id).await.unwrap().unwrap().session_expiry.unwrap();

        let response = test_router(&state)
            .oneshot(get("/profile", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(set_session_cookie(&response).as_deref(), Some(token.as_str()));
        assert!(body_string(response).await.contains("carol@example.com"));

        let after = state.users.find_by_id(id).await.unwrap().unwrap().session_expiry.unwrap();
        assert!(parse_timestamp(&after).unwrap() > parse_timestamp(&before).unwrap());
    }

    #[tokio::test]
    async fn test_best_effort_route_recognizes_session() {
        let state = test_state().await;
        let (_, token) = signed_in_user(&state, "carol").await;

        let response = test_router(&state).oneshot(get("/", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_session_cookie(&response).is_some());
        let html = body_string(response).await;
        assert!(html.contains("Signed in as"));
        assert!(!html.contains("oauth2_signin"));
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected() {
        let state = test_state().await;
        let (id, token) = signed_in_user(&state, "dave").await;
        state
            .users
            .set_session(id, &token, &format_timestamp(Utc::now() - Duration::minutes(1)))
            .await
            .unwrap();

        let response = test_router(&state)
            .oneshot(get("/profile", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = test_router(&state).oneshot(get("/", Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_session_cookie(&response).is_none());
    }

    #[tokio::test]
    async fn test_malformed_cookie_treated_as_absent() {
        let state = test_state().await;
        signed_in_user(&state, "erin").await;

        let response = test_router(&state)
            .oneshot(get("/profile", Some("not-a-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = test_router(&state)
            .oneshot(get("/", Some("not-a-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_second_sign_in_invalidates_first_cookie() {
        let state = test_state().await;
        let id = create_user(&state, "frank", "password123").await;

        let first = set_session_cookie(
            &test_router(&state)
                .oneshot(post_form("/signin", "user=frank&password=password123", None))
                .await
                .unwrap(),
        )
        .unwrap();
        let second = set_session_cookie(
            &test_router(&state)
                .oneshot(post_form("/signin", "user=frank&password=password123", None))
                .await
                .unwrap(),
        )
        .unwrap();
        assert_ne!(first, second);

        let response = test_router(&state)
            .oneshot(get("/profile", Some(&first)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = test_router(&state)
            .oneshot(get("/profile", Some(&second)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let user = state.users.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(user.session_token.as_deref(), Some(second.as_str()));
    }

    #[tokio::test]
    async fn test_signout_clears_session() {
        let state = test_state().await;
        let (id, token) = signed_in_user(&state, "grace").await;

        let response = test_router(&state)
            .oneshot(get("/signout", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(location(&response).as_deref(), Some("/"));
        assert_eq!(set_session_cookie(&response).as_deref(), Some(""));

        let user = state.users.find_by_id(id).await.unwrap().unwrap();
        assert!(user.session_token.is_none());
        assert!(user.session_expiry.is_none());

        let response = test_router(&state)
            .oneshot(get("/profile", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_signout_requires_session() {
        let state = test_state().await;
        let response = test_router(&state).oneshot(get("/signout", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_page_is_admin_only() {
        let state = test_state().await;
        let (_, admin_token) = signed_in_user(&state, "root").await;
        let (_, user_token) = signed_in_user(&state, "henry").await;

        let response = test_router(&state)
            .oneshot(get("/admin/users", Some(&admin_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("henry@example.com"));

        let response = test_router(&state)
            .oneshot(get("/admin/users", Some(&user_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_wrong_method_is_405() {
        let state = test_state().await;
        let request = Request::builder()
            .method(Method::PUT)
            .uri("/signin")
            .body(Body::empty())
            .unwrap();

        let response = test_router(&state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(body_string(response).await.contains("405"));
    }

    #[tokio::test]
    async fn test_health() {
        let state = test_state().await;
        let response = test_router(&state).oneshot(get("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }
}
