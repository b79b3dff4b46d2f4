//! Integration tests for the chat API endpoints

mod test_utils;

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, Response, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::util::ServiceExt;

    use finder::ai::chat::{DEFAULT_SESSION_ID, MAX_SESSION_ID_LEN};
    use finder::gemini::Role;

    use crate::test_utils::{
        FailingProvider, StubProvider, TEST_SEED, body_to_string, log_len,
        test_app_with_gemini, test_app_with_provider,
    };

    async fn post_chat(app: &Router, body: Body) -> Response<Body> {
        app.clone()
            .oneshot(
                Request::builder()
                    .uri("/chat")
                    .method("POST")
                    .header("content-type", "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let body = body_to_string(response.into_body()).await;
        serde_json::from_str(&body).unwrap()
    }

    /// Tests a successful chat appends a user and a model turn
    #[tokio::test]
    async fn it_relays_chat_message() {
        let (provider, _calls) = StubProvider::new("Building 4, open 8am-10pm.");
        let (app, state, _dir) = test_app_with_provider(Box::new(provider));

        let response = post_chat(
            &app,
            Body::from(json!({"userInput": "Where is the library?"}).to_string()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body, json!({"response": "Building 4, open 8am-10pm."}));

        let log = state.sessions.get(DEFAULT_SESSION_ID).unwrap();
        let turns = log.lock().await.snapshot();
        assert_eq!(turns.len(), 3);
        assert_eq!(turns[0].text(), TEST_SEED);
        assert_eq!(turns[1].role(), Role::User);
        assert_eq!(turns[1].text(), "Where is the library?");
        assert_eq!(turns[2].role(), Role::Model);
        assert_eq!(turns[2].text(), "Building 4, open 8am-10pm.");
    }

    /// Tests chat POST returns 400 for an empty message
    #[tokio::test]
    async fn it_returns_400_for_empty_user_input() {
        let (provider, calls) = StubProvider::new("unused");
        let (app, state, _dir) = test_app_with_provider(Box::new(provider));

        let response = post_chat(&app, Body::from(json!({"userInput": ""}).to_string())).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body, json!({"error": "Invalid request body"}));
        assert_eq!(log_len(&state, DEFAULT_SESSION_ID).await, 1);
        assert!(calls.lock().unwrap().is_empty());
    }

    /// Tests chat POST returns 400 for a missing message
    #[tokio::test]
    async fn it_returns_400_for_missing_user_input() {
        let (provider, calls) = StubProvider::new("unused");
        let (app, state, _dir) = test_app_with_provider(Box::new(provider));

        let response = post_chat(&app, Body::from(json!({"message": "hi"}).to_string())).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(log_len(&state, DEFAULT_SESSION_ID).await, 1);
        assert!(calls.lock().unwrap().is_empty());
    }

    /// Tests chat POST returns 400 for a body that isn't JSON
    #[tokio::test]
    async fn it_returns_400_for_invalid_json() {
        let (provider, _calls) = StubProvider::new("unused");
        let (app, _state, _dir) = test_app_with_provider(Box::new(provider));

        let response = post_chat(&app, Body::from("userInput=hi")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Invalid request body");
    }

    /// Tests a provider failure returns 500 and keeps the user turn
    #[tokio::test]
    async fn it_returns_500_when_provider_fails() {
        let (app, state, _dir) = test_app_with_provider(Box::new(FailingProvider));

        let response = post_chat(
            &app,
            Body::from(json!({"userInput": "Where is the gym?"}).to_string()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        assert_eq!(body, json!({"error": "Internal Server Error"}));
        assert!(body.get("response").is_none());
        assert_eq!(log_len(&state, DEFAULT_SESSION_ID).await, 2);
    }

    /// Tests each request sees every earlier turn in order
    #[tokio::test]
    async fn it_sends_full_history_each_request() {
        let (provider, calls) = StubProvider::new("ok");
        let (app, state, _dir) = test_app_with_provider(Box::new(provider));

        for input in ["first", "second", "third"] {
            let response =
                post_chat(&app, Body::from(json!({"userInput": input}).to_string())).await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        let texts: Vec<String> = calls[2].iter().map(|t| t.text()).collect();
        assert_eq!(
            texts,
            vec![TEST_SEED, "first", "ok", "second", "ok", "third"]
        );
        drop(calls);

        assert_eq!(log_len(&state, DEFAULT_SESSION_ID).await, 7);
    }

    /// Tests conversations with different session IDs don't share turns
    #[tokio::test]
    async fn it_isolates_sessions() {
        let (provider, calls) = StubProvider::new("ok");
        let (app, state, _dir) = test_app_with_provider(Box::new(provider));

        post_chat(
            &app,
            Body::from(json!({"userInput": "I'm Sam", "sessionId": "a"}).to_string()),
        )
        .await;
        post_chat(
            &app,
            Body::from(json!({"userInput": "Who am I?", "sessionId": "b"}).to_string()),
        )
        .await;

        assert_eq!(log_len(&state, "a").await, 3);
        assert_eq!(log_len(&state, "b").await, 3);
        assert_eq!(log_len(&state, DEFAULT_SESSION_ID).await, 1);

        let calls = calls.lock().unwrap();
        let texts: Vec<String> = calls[1].iter().map(|t| t.text()).collect();
        assert_eq!(texts, vec![TEST_SEED, "Who am I?"]);
    }

    /// Tests an oversized session ID is rejected without creating a session
    #[tokio::test]
    async fn it_returns_400_for_long_session_id() {
        let (provider, calls) = StubProvider::new("unused");
        let (app, state, _dir) = test_app_with_provider(Box::new(provider));

        let session_id = "s".repeat(MAX_SESSION_ID_LEN + 1);
        let response = post_chat(
            &app,
            Body::from(json!({"userInput": "hi", "sessionId": session_id}).to_string()),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body, json!({"error": "Invalid request body"}));
        assert_eq!(state.sessions.len(), 1);
        assert!(calls.lock().unwrap().is_empty());
    }

    /// Tests concurrent requests on one session never interleave turns
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn it_serializes_concurrent_requests() {
        let (provider, _calls) = StubProvider::new("ok");
        let (app, state, _dir) = test_app_with_provider(Box::new(provider));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let app = app.clone();
                tokio::spawn(async move {
                    post_chat(
                        &app,
                        Body::from(json!({"userInput": format!("question {}", i)}).to_string()),
                    )
                    .await
                    .status()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), StatusCode::OK);
        }

        let log = state.sessions.get(DEFAULT_SESSION_ID).unwrap();
        let turns = log.lock().await.snapshot();
        assert_eq!(turns.len(), 17);
        for pair in turns[1..].chunks(2) {
            assert_eq!(pair[0].role(), Role::User);
            assert_eq!(pair[1].role(), Role::Model);
        }
    }

    /// Tests getting the history of the default session
    #[tokio::test]
    async fn it_gets_chat_history() {
        let (provider, _calls) = StubProvider::new("Try the counseling center.");
        let (app, _state, _dir) = test_app_with_provider(Box::new(provider));

        post_chat(
            &app,
            Body::from(json!({"userInput": "I feel stressed"}).to_string()),
        )
        .await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/chat/history")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["sessionId"], DEFAULT_SESSION_ID);
        assert_eq!(body["turns"].as_array().unwrap().len(), 3);
        assert_eq!(body["turns"][2]["role"], "model");
        assert_eq!(body["turns"][2]["parts"][0]["text"], "Try the counseling center.");
    }

    /// Tests getting the history of an unknown session returns 404
    #[tokio::test]
    async fn it_returns_404_for_nonexistent_session() {
        let (provider, _calls) = StubProvider::new("unused");
        let (app, _state, _dir) = test_app_with_provider(Box::new(provider));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/chat/history?sessionId=nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("nonexistent"));
    }

    /// Tests the relay against a mocked Gemini API
    #[tokio::test]
    async fn it_relays_to_gemini() {
        let mut server = mockito::Server::new_async().await;

        let response_body = r#"{
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Financial aid is in the Student Center, room 110."}]
                },
                "finishReason": "STOP"
            }]
        }"#;

        let mock = server
            .mock("POST", "/v1beta/models/gemini-pro:generateContent")
            .match_header("x-goog-api-key", "test-api-key")
            .match_body(mockito::Matcher::PartialJson(json!({
                "safetySettings": [{
                    "category": "HARM_CATEGORY_HARASSMENT",
                    "threshold": "BLOCK_MEDIUM_AND_ABOVE"
                }]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(response_body)
            .create_async()
            .await;

        let (app, state, _dir) = test_app_with_gemini(&server.url());

        let response = post_chat(
            &app,
            Body::from(
                json!({"userInput": "How do I contact the financial aid office?"}).to_string(),
            ),
        )
        .await;

        mock.assert_async().await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body["response"],
            "Financial aid is in the Student Center, room 110."
        );
        assert_eq!(log_len(&state, DEFAULT_SESSION_ID).await, 3);
    }

    /// Tests a Gemini error status surfaces as a 500
    #[tokio::test]
    async fn it_returns_500_for_gemini_error() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/v1beta/models/gemini-pro:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(503)
            .with_body(r#"{"error": {"code": 503, "message": "overloaded"}}"#)
            .create_async()
            .await;

        let (app, state, _dir) = test_app_with_gemini(&server.url());

        let response =
            post_chat(&app, Body::from(json!({"userInput": "Hello"}).to_string())).await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_to_string(response.into_body()).await;
        assert!(!body.contains("test-api-key"));
        assert_eq!(log_len(&state, DEFAULT_SESSION_ID).await, 2);
    }
}
