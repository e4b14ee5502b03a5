//! End-to-end behavior of the request pipeline against a mock API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use serde_json::{json, Value};
use socialdesk_lib::client::RequestConfig;
use socialdesk_lib::error::ClientError;
use socialdesk_lib::response::JsonFormat;
use socialdesk_lib::{
    ApiClient, ApiConfig, ApiError, ApiRequest, AuthModel, FileSessionStore, MemorySessionStore,
    RequestBody, SessionOwner, SessionStore, Toaster, UnauthorizedEvents, UnauthorizedReason,
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct CollectingToaster(Mutex<Vec<String>>);

impl CollectingToaster {
    fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Toaster for CollectingToaster {
    fn error(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

struct Harness {
    server: MockServer,
    client: ApiClient,
    store: Arc<dyn SessionStore>,
    toaster: Arc<CollectingToaster>,
    emitted: Arc<Mutex<Vec<UnauthorizedReason>>>,
}

impl Harness {
    async fn start(session: Option<AuthModel>) -> Self {
        let server = MockServer::start().await;
        let store: Arc<dyn SessionStore> = Arc::new(match session {
            Some(session) => MemorySessionStore::with_session(session),
            None => MemorySessionStore::new(),
        });
        let toaster = Arc::new(CollectingToaster::default());

        let events = UnauthorizedEvents::new();
        let emitted = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&emitted);
        events.subscribe(move |event| sink.lock().unwrap().push(event.reason));

        let client = ApiClient::builder(ApiConfig::new(server.uri()).with_prefix("api"))
            .store(Arc::clone(&store))
            .events(events)
            .toaster(toaster.clone())
            .build()
            .unwrap();

        Self {
            server,
            client,
            store,
            toaster,
            emitted,
        }
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/{}", self.server.uri(), suffix)
    }

    async fn authorization_headers(&self) -> Vec<Option<String>> {
        self.server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| {
                r.headers
                    .get("authorization")
                    .map(|v| v.to_str().unwrap().to_string())
            })
            .collect()
    }

    fn emitted(&self) -> Vec<UnauthorizedReason> {
        self.emitted.lock().unwrap().clone()
    }
}

fn future_expiry() -> i64 {
    chrono::Utc::now().timestamp_millis() + 3_600_000
}

#[tokio::test]
async fn api_requests_carry_the_bearer_token() {
    let h = Harness::start(Some(AuthModel::new("tok").expiring_at(future_expiry()))).await;
    Mock::given(method("GET"))
        .and(path("/api/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&h.server)
        .await;

    h.client
        .get::<JsonFormat<Value>>("accounts", RequestConfig::new())
        .await
        .unwrap();

    assert_eq!(h.authorization_headers().await, vec![Some("Bearer tok".to_string())]);
}

#[tokio::test]
async fn login_requests_never_carry_authorization() {
    let h = Harness::start(Some(AuthModel::new("old"))).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/email/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "new" })))
        .mount(&h.server)
        .await;

    let request = ApiRequest::post(h.url("api/auth/email/login?next=%2F"))
        .json(&json!({ "email": "a@b.c", "password": "pw" }))
        .unwrap();
    h.client.send(request).await.unwrap();

    assert_eq!(h.authorization_headers().await, vec![None]);
    assert_eq!(h.store.get().unwrap().access_token, "new");
}

#[tokio::test]
async fn non_api_urls_never_carry_authorization() {
    let h = Harness::start(Some(AuthModel::new("tok"))).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&h.server)
        .await;

    h.client.send(ApiRequest::get(h.url("cdn/avatar.png"))).await.unwrap();
    h.client.send(ApiRequest::get(h.url("apix/accounts"))).await.unwrap();

    assert_eq!(h.authorization_headers().await, vec![None, None]);
}

#[tokio::test]
async fn expired_session_is_dropped_before_the_request() {
    let h = Harness::start(Some(AuthModel::new("stale").expiring_at(1))).await;
    Mock::given(method("GET"))
        .and(path("/api/accounts"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&h.server)
        .await;

    h.client
        .get::<JsonFormat<Value>>("accounts", RequestConfig::new())
        .await
        .unwrap();

    assert!(h.store.get().is_none());
    assert_eq!(h.emitted(), vec![UnauthorizedReason::Expired]);
    assert_eq!(h.authorization_headers().await, vec![None]);
}

#[tokio::test]
async fn login_expiry_accepts_numeric_strings_only() {
    let h = Harness::start(None).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/email/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "token": "t1", "tokenExpires": "4102444800000" })),
        )
        .up_to_n_times(1)
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/email/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "token": "t2", "tokenExpires": "soon" })),
        )
        .mount(&h.server)
        .await;

    let login = || ApiRequest::post(h.url("api/auth/email/login"));
    h.client.send(login()).await.unwrap();
    let first = h.store.get().unwrap();
    assert_eq!(first.access_token, "t1");
    assert_eq!(first.token_expires, Some(4_102_444_800_000));

    h.client.send(login()).await.unwrap();
    let second = h.store.get().unwrap();
    assert_eq!(second.access_token, "t2");
    assert_eq!(second.token_expires, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_rejections_sign_out_once() {
    let h = Harness::start(Some(AuthModel::new("tok"))).await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Token revoked" })),
        )
        .mount(&h.server)
        .await;

    let signed_out = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&signed_out);
    let owner = SessionOwner::with_sign_out_hook(h.client.clone(), move |event| {
        assert_eq!(event.message.as_deref(), Some("Token revoked"));
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let calls = (0..5).map(|i| {
        let client = h.client.clone();
        tokio::spawn(async move {
            client
                .get::<JsonFormat<Value>>(&format!("accounts/{i}"), RequestConfig::new())
                .await
        })
    });
    for call in calls.collect::<Vec<_>>() {
        let err = call.await.unwrap().unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.is_unauthorized());
    }

    assert_eq!(h.emitted().len(), 5);
    assert!(h.emitted().iter().all(|r| *r == UnauthorizedReason::Rejected));
    assert_eq!(owner.sign_out_count(), 1);
    assert_eq!(signed_out.load(Ordering::SeqCst), 1);
    assert!(h.store.get().is_none());
}

#[tokio::test]
async fn validation_map_is_toasted_without_failing_the_interceptor() {
    let h = Harness::start(None).await;
    Mock::given(method("POST"))
        .and(path("/api/accounts"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({ "errorMessages": { "email": ["already taken"] } })),
        )
        .mount(&h.server)
        .await;

    let response = h
        .client
        .send(ApiRequest::post(h.url("api/accounts")).json(&json!({ "email": "a@b.c" })).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status, 422);
    assert_eq!(h.toaster.messages(), vec!["already taken".to_string()]);
}

#[tokio::test]
async fn validation_map_is_toasted_once_on_the_generic_path() {
    let h = Harness::start(None).await;
    Mock::given(method("POST"))
        .and(path("/api/accounts"))
        .respond_with(
            ResponseTemplate::new(422)
                .set_body_json(json!({ "errors": { "username": "usernameAlreadyExists" } })),
        )
        .mount(&h.server)
        .await;

    let err = h
        .client
        .post::<JsonFormat<Value>>("accounts", RequestConfig::new().json(&json!({})).unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(422));
    assert_eq!(h.toaster.messages(), vec!["usernameAlreadyExists".to_string()]);
}

#[tokio::test]
async fn no_content_delete_yields_no_data() {
    let h = Harness::start(Some(AuthModel::new("tok"))).await;
    Mock::given(method("DELETE"))
        .and(path("/api/proxies/3"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    let response = h
        .client
        .delete::<JsonFormat<Value>>("proxies/3", RequestConfig::new())
        .await
        .unwrap();

    assert_eq!(response.status, 204);
    assert!(response.data.is_none());
}

#[tokio::test]
async fn server_errors_toast_the_fixed_notice() {
    let h = Harness::start(None).await;
    Mock::given(method("GET"))
        .and(path("/api/categories"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>down</html>"))
        .mount(&h.server)
        .await;

    let err = h
        .client
        .get::<JsonFormat<Value>>("categories", RequestConfig::new())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert_eq!(
        h.toaster.messages(),
        vec!["Server error. Please try again later.".to_string()]
    );
}

#[tokio::test]
async fn forbidden_maps_to_insufficient_permissions() {
    let h = Harness::start(Some(AuthModel::new("tok"))).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&h.server)
        .await;

    let err = h
        .client
        .delete::<JsonFormat<Value>>("accounts/1", RequestConfig::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Insufficient permissions: DELETE accounts/1");
    assert!(h.store.get().is_some());
}

#[tokio::test]
async fn cancelled_requests_stop_waiting() {
    let h = Harness::start(None).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&h.server)
        .await;

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = h
        .client
        .get::<JsonFormat<Value>>("accounts", RequestConfig::new().signal(token))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Client(ClientError::Cancelled)));
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let client = ApiClient::builder(ApiConfig::new(server.uri()))
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();

    let err = client
        .get::<JsonFormat<Value>>("accounts", RequestConfig::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApiError::Client(ClientError::Timeout { duration_ms: 100 })
    ));
}

#[tokio::test]
async fn file_store_survives_a_new_client() {
    let dir = tempfile::tempdir().unwrap();
    let session_path = dir.path().join("socialdesk-auth-v1.json");
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/email/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "persisted",
            "user": { "id": 1, "email": "a@b.c" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 1, "email": "a@b.c" })))
        .mount(&server)
        .await;

    let first = ApiClient::builder(ApiConfig::new(server.uri()))
        .store(Arc::new(FileSessionStore::new(session_path.clone())))
        .build()
        .unwrap();
    SessionOwner::new(first).login("a@b.c", "pw").await.unwrap();

    let second = ApiClient::builder(ApiConfig::new(server.uri()))
        .store(Arc::new(FileSessionStore::new(session_path)))
        .build()
        .unwrap();
    let owner = SessionOwner::new(second);
    assert!(owner.is_authenticated());
    let user = owner.verify().await.unwrap().unwrap();
    assert_eq!(user.email.as_deref(), Some("a@b.c"));

    let me = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.url.path() == "/auth/me")
        .unwrap();
    assert_eq!(me.headers.get("authorization").unwrap(), "Bearer persisted");
}

#[tokio::test]
async fn login_capture_ignores_an_unexpected_user_shape() {
    let h = Harness::start(None).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/email/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-1",
            "refreshToken": "r",
            "user": { "id": 1, "role": { "name": "Admin" } }
        })))
        .mount(&h.server)
        .await;

    let request = ApiRequest::post(h.url("api/auth/email/login"))
        .json(&json!({ "email": "a@b.c", "password": "pw" }))
        .unwrap();
    let response = h.client.send(request).await.unwrap();

    assert_eq!(response.status, 200);
    let session = h.store.get().unwrap();
    assert_eq!(session.access_token, "tok-1");
    assert_eq!(session.refresh_token.as_deref(), Some("r"));
}

#[tokio::test]
async fn interceptor_returns_a_rejected_response_and_signs_out() {
    let h = Harness::start(Some(AuthModel::new("tok").expiring_at(future_expiry()))).await;
    Mock::given(method("GET"))
        .and(path("/api/accounts"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Token revoked" })))
        .mount(&h.server)
        .await;

    let response = h.client.send(ApiRequest::get(h.url("api/accounts"))).await.unwrap();

    assert_eq!(response.status, 401);
    assert_eq!(h.emitted(), vec![UnauthorizedReason::Rejected]);
    assert!(h.store.get().is_none());
    assert!(h.toaster.messages().is_empty());
}

#[tokio::test]
async fn login_endpoint_rejection_keeps_the_session() {
    let h = Harness::start(Some(AuthModel::new("tok").expiring_at(future_expiry()))).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/email/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" })))
        .mount(&h.server)
        .await;

    let request = ApiRequest::post(h.url("api/auth/email/login"))
        .json(&json!({ "email": "a@b.c", "password": "wrong" }))
        .unwrap();
    let response = h.client.send(request).await.unwrap();

    assert_eq!(response.status, 401);
    assert!(h.emitted().is_empty());
    assert_eq!(h.store.get().unwrap().access_token, "tok");
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[tokio::test]
async fn multipart_bodies_pass_through_unencoded() {
    let h = Harness::start(Some(AuthModel::new("tok"))).await;
    Mock::given(method("POST"))
        .and(path("/api/files/upload"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "f-1" })))
        .mount(&h.server)
        .await;

    let image = vec![0x89, b'P', b'N', b'G', 0x00, 0xff];
    let part = reqwest::multipart::Part::bytes(image.clone())
        .file_name("avatar.png")
        .mime_str("image/png")
        .unwrap();
    let form = reqwest::multipart::Form::new()
        .text("caption", "hello")
        .part("file", part);

    let request = ApiRequest::post(h.url("api/files/upload")).body(RequestBody::Multipart(form));
    let response = h.client.send(request).await.unwrap();
    assert_eq!(response.status, 201);

    let received = h.server.received_requests().await.unwrap();
    let content_type = received[0].headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert!(contains(&received[0].body, &image));
    assert!(contains(&received[0].body, b"name=\"caption\""));
    assert!(!contains(&received[0].body, b"[137,"));
}

#[tokio::test]
async fn raw_bodies_keep_their_bytes_and_content_type() {
    let h = Harness::start(Some(AuthModel::new("tok"))).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    let blob = Bytes::from_static(&[0x00, 0x01, 0xfe, 0xff]);
    let request = ApiRequest::post(h.url("api/files/blob")).body(RequestBody::Raw {
        content_type: Some("application/octet-stream".to_string()),
        bytes: blob.clone(),
    });
    h.client.send(request).await.unwrap();

    let csv = Bytes::from_static(b"handle,platform\nada,instagram\n");
    let config = RequestConfig::new().body(RequestBody::Raw {
        content_type: Some("text/csv".to_string()),
        bytes: csv.clone(),
    });
    h.client
        .post::<JsonFormat<Value>>("accounts/import", config)
        .await
        .unwrap();

    let received = h.server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert_eq!(
        received[0].headers.get("content-type").unwrap().to_str().unwrap(),
        "application/octet-stream"
    );
    assert_eq!(received[0].body, blob.to_vec());
    assert_eq!(received[1].url.path(), "/api/accounts/import");
    assert_eq!(
        received[1].headers.get("content-type").unwrap().to_str().unwrap(),
        "text/csv"
    );
    assert_eq!(received[1].body, csv.to_vec());
}
