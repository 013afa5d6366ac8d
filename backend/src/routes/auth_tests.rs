//! Property-based tests for authentication enforcement
//!
//! Protected endpoints answer 401 to every request without a valid
//! access token, whatever shape the Authorization header takes.

#[cfg(test)]
mod tests {
    use crate::auth::{SecretKind, TokenIssuer};
    use crate::config::AppConfig;
    use crate::repositories::Stores;
    use crate::routes::create_router;
    use crate::services::RequestMeta;
    use crate::state::AppState;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use pawcare_shared::models::Gender;
    use pawcare_shared::types::{ProfileInput, RegisterRequest};
    use proptest::prelude::*;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let mut config = AppConfig::default();
        config.security.bcrypt_cost = 4;
        AppState::new(Stores::in_memory(), config)
    }

    fn me_request(authorization: Option<String>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/v1/auth/me").method("GET");
        if let Some(header) = authorization {
            builder = builder.header("Authorization", header);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn register_user(state: &AppState) -> String {
        let outcome = state
            .auth()
            .register(
                RegisterRequest {
                    email: "route-tests@example.com".to_string(),
                    password: "Passw0rdOk".to_string(),
                    role: None,
                    profile: ProfileInput {
                        first_name: "Route".to_string(),
                        last_name: "Tester".to_string(),
                        phone_number: "+15551234567".to_string(),
                        date_of_birth: None,
                        gender: Some(Gender::Other),
                    },
                },
                &RequestMeta::default(),
            )
            .await
            .unwrap();
        outcome.tokens.access_token
    }

    /// Generate random invalid tokens
    fn invalid_token_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("".to_string()),
            // Not a JWT
            "[a-zA-Z0-9]{10,50}".prop_map(|s| s),
            // Wrong number of parts
            "[a-zA-Z0-9]{10}\\.[a-zA-Z0-9]{10}".prop_map(|s| s),
            // JWT-shaped with a bogus signature
            "[a-zA-Z0-9_-]{20}\\.[a-zA-Z0-9_-]{20}\\.[a-zA-Z0-9_-]{20}".prop_map(|s| s),
        ]
    }

    /// Generate random authorization header formats
    fn auth_header_strategy() -> impl Strategy<Value = Option<String>> {
        prop_oneof![
            Just(None),
            invalid_token_strategy().prop_map(Some),
            invalid_token_strategy().prop_map(|t| Some(format!("Basic {}", t))),
            invalid_token_strategy().prop_map(|t| Some(format!("Bearer {}", t))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_unauthenticated_requests_return_401(
            auth_header in auth_header_strategy(),
            path in prop::sample::select(vec![
                "/api/v1/auth/me",
                "/api/v1/pets",
                "/api/v1/bookings/my",
            ]),
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let app = create_router(test_state());

                let mut builder = Request::builder().uri(path).method("GET");
                if let Some(header) = auth_header {
                    builder = builder.header("Authorization", header);
                }
                let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();

                prop_assert_eq!(
                    response.status(),
                    StatusCode::UNAUTHORIZED,
                    "Expected 401 for unauthenticated request"
                );
                Ok(())
            })?;
        }
    }

    #[tokio::test]
    async fn test_missing_auth_header_returns_401() {
        let app = create_router(test_state());
        let response = app.oneshot(me_request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_auth_scheme_returns_401() {
        let app = create_router(test_state());
        let response = app
            .oneshot(me_request(Some("Basic dXNlcjpwYXNz".to_string())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_with_wrong_secret_returns_401() {
        let state = test_state();
        let forged = TokenIssuer::new("some-other-access-secret", "some-other-refresh-secret", 3600, 86400);
        let token = forged.issue_access_token(uuid::Uuid::new_v4()).unwrap();

        let app = create_router(state);
        let response = app
            .oneshot(me_request(Some(format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_refresh_token_is_not_an_access_token() {
        let state = test_state();
        register_user(&state).await;
        let user = state
            .auth()
            .credentials()
            .find_by_email("route-tests@example.com")
            .await
            .unwrap()
            .unwrap();
        let refresh = state
            .auth()
            .tokens()
            .issue_at(user.id, SecretKind::Refresh, chrono::Utc::now())
            .unwrap();

        let app = create_router(state);
        let response = app
            .oneshot(me_request(Some(format!("Bearer {}", refresh))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_token_for_unknown_user_returns_401() {
        let state = test_state();
        let token = state
            .auth()
            .tokens()
            .issue_access_token(uuid::Uuid::new_v4())
            .unwrap();

        let app = create_router(state);
        let response = app
            .oneshot(me_request(Some(format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_passes_auth() {
        let state = test_state();
        let token = register_user(&state).await;

        let app = create_router(state);
        let response = app
            .oneshot(me_request(Some(format!("Bearer {}", token))))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
