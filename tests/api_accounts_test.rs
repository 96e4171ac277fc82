//! Integration tests for the accounts API endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::Utc;
    use tower::util::ServiceExt;

    use unibox::accounts::GmailAccount;

    use crate::test_utils::{body_to_string, test_app, test_app_with_state, test_config};

    /// Tests the accounts endpoint returns an empty list initially
    #[tokio::test]
    async fn it_lists_no_accounts_initially() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/accounts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["accounts"].as_array().unwrap().len(), 0);
    }

    /// Tests connected accounts are listed with an activity status
    #[tokio::test]
    async fn it_lists_accounts_with_status() {
        let (app, state) = test_app_with_state(test_config()).await;

        let accounts = {
            let shared_state = state.read().unwrap();
            shared_state.accounts.clone()
        };
        let now = Utc::now().timestamp_millis();
        accounts
            .add_or_update(GmailAccount {
                id: "acct_live".to_string(),
                email: "live@x.com".to_string(),
                access_token: "token".to_string(),
                refresh_token: "refresh".to_string(),
                expires_at: now + 3_600_000,
            })
            .await;
        accounts
            .add_or_update(GmailAccount {
                id: "acct_stale".to_string(),
                email: "stale@x.com".to_string(),
                access_token: "token".to_string(),
                refresh_token: "refresh".to_string(),
                expires_at: now - 1_000,
            })
            .await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/accounts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = body_to_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        let listed = json["accounts"].as_array().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0]["email"], "live@x.com");
        assert_eq!(listed[0]["status"], "Active");
        assert_eq!(listed[1]["status"], "Inactive");
    }

    /// Tests removing an account returns 204 and drops it from the list
    #[tokio::test]
    async fn it_removes_an_account() {
        let (app, state) = test_app_with_state(test_config()).await;

        let accounts = {
            let shared_state = state.read().unwrap();
            shared_state.accounts.clone()
        };
        accounts
            .add_or_update(GmailAccount {
                id: "acct_a".to_string(),
                email: "a@x.com".to_string(),
                access_token: "token".to_string(),
                refresh_token: "refresh".to_string(),
                expires_at: Utc::now().timestamp_millis() + 3_600_000,
            })
            .await;

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/accounts?email=a@x.com")
                    .method("DELETE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/accounts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let body = body_to_string(response.into_body()).await;
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["accounts"].as_array().unwrap().len(), 0);
    }

    /// Tests removal without an email parameter returns 400
    #[tokio::test]
    async fn it_returns_400_for_missing_email() {
        let app = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/accounts")
                    .method("DELETE")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
