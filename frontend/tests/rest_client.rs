//! REST and media clients against a wiremock server, plus the students page
//! driven end to end over real HTTP.

use std::sync::Arc;

use eduflow_frontend::{
    api::{ListQuery, MediaApi, MediaClient, STUDENTS_PATH},
    pages::{
        exam_categories::exam_categories_api, groups::groups_api, students::students_api,
        NameInput, StudentForm, StudentsPage,
    },
    ApiClient, ApiError, AppContext, ClientConfig, CollectionApi, HistoryNavigator, Session,
    SessionStore,
};
use eduflow_shared::Role;
use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn admin() -> Session {
    Session {
        id: 1,
        roles: vec![Role::Admin],
        is_authenticated: true,
        access_token: "test-token".to_string(),
        refresh_token: "refresh".to_string(),
        name: Some("Admin".to_string()),
        phone_number: None,
    }
}

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        api_base: format!("{}/api", server.uri()),
        media_base: format!("{}/media", server.uri()),
        ..ClientConfig::default()
    }
}

fn client_for(server: &MockServer, session: &SessionStore) -> ApiClient {
    ApiClient::new(config_for(server), session.clone()).expect("client")
}

fn signed_in_client(server: &MockServer) -> (SessionStore, HistoryNavigator, ApiClient) {
    let session = SessionStore::with_session(admin());
    let client = client_for(server, &session);
    (session, HistoryNavigator::new(), client)
}

#[tokio::test]
async fn list_sends_bearer_and_search_without_whitespace() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/students"))
        .and(header("authorization", "Bearer test-token"))
        .and(query_param("page", "2"))
        .and(query_param("limit", "10"))
        .and(query_param("search", "alivali"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "data": [{"id": 4, "first_name": "Ali", "last_name": "Vali"}],
                "meta": {"pageCount": 2, "itemCount": 11}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionStore::with_session(admin());
    let api = students_api(client_for(&server, &session));
    let list = api
        .list(ListQuery::page(2, 10).with_search(" ali vali "))
        .await
        .expect("list");

    assert_eq!(list.data[0].full_name(), "Ali Vali");
    assert_eq!(list.item_count(), 11);
}

#[tokio::test]
async fn jwt_expired_body_maps_to_credential_expired() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/groups"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "JWT_EXPIRED"})))
        .mount(&server)
        .await;

    let session = SessionStore::with_session(admin());
    let err = groups_api(client_for(&server, &session))
        .list(ListQuery::default())
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::CredentialExpired);
}

#[tokio::test]
async fn server_message_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/groups"))
        .and(body_json(json!({"name": "N-12"})))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"error": "group already exists"})),
        )
        .mount(&server)
        .await;

    let session = SessionStore::with_session(admin());
    let err = groups_api(client_for(&server, &session))
        .create(NameInput::new("N-12").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "group already exists");
}

#[tokio::test]
async fn writes_without_credential_never_leave_the_client() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let session = SessionStore::new();
    let err = groups_api(client_for(&server, &session))
        .remove(3)
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::Unauthenticated);
}

#[tokio::test]
async fn exam_categories_list_is_public() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/exam-categories"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1, "name": "Ona tili"}],
            "meta": {"pageCount": 1, "itemCount": 1}
        })))
        .mount(&server)
        .await;

    let session = SessionStore::new();
    let list = exam_categories_api(client_for(&server, &session))
        .list(ListQuery::default())
        .await
        .expect("public list");

    assert_eq!(list.data[0].name, "Ona tili");
    let requests = server.received_requests().await.expect("recorded");
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn update_and_delete_address_the_entity() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/groups/7"))
        .and(body_json(json!({"name": "N-14"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7, "name": "N-14"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/groups/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": null})))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionStore::with_session(admin());
    let api = groups_api(client_for(&server, &session));
    let group = api.update(7, NameInput::new("N-14").unwrap()).await.expect("update");
    assert_eq!(group.name, "N-14");
    api.remove(7).await.expect("delete");
}

#[tokio::test]
async fn media_upload_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/media/upload"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "key": "students/abc.png",
            "url": "https://cdn.example/students/abc.png"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/media/upload/delete"))
        .and(body_json(json!({"key": "students/abc.png"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionStore::with_session(admin());
    let media = MediaClient::new(client_for(&server, &session));
    let image = media.upload("abc.png", vec![0x89, 0x50]).await.expect("upload");
    assert_eq!(image.key, "students/abc.png");

    let deleted = media.delete(&image.key).await.expect("delete");
    assert!(deleted.success);
}

#[tokio::test]
async fn students_page_signs_out_on_expired_credential() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/{STUDENTS_PATH}")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "JWT_EXPIRED"})))
        .expect(1)
        .mount(&server)
        .await;

    let (session, nav, client) = signed_in_client(&server);
    let ctx = AppContext::new(config_for(&server), session.clone(), Arc::new(nav.clone()));
    let page = StudentsPage::new(
        ctx,
        Arc::new(students_api(client.clone())),
        Arc::new(groups_api(client.clone())),
        Arc::new(MediaClient::new(client)),
    );

    page.mount().await.expect("gate passes");

    assert!(!session.is_authenticated());
    assert_eq!(session.access_token(), None);
    assert_eq!(nav.last_path().as_deref(), Some("/login"));
}

#[tokio::test]
async fn students_page_creates_and_refetches_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/students"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [], "meta": {"pageCount": 1, "itemCount": 0}
        })))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 3, "name": "N-12"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/students"))
        .and(body_json(json!({
            "first_name": "Vali",
            "phone_number": "+998937654321",
            "group_id": 3,
            "role": "student"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": {"id": 12, "first_name": "Vali", "phone_number": "+998937654321", "group_id": 3}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (session, nav, client) = signed_in_client(&server);
    let ctx = AppContext::new(config_for(&server), session, Arc::new(nav));
    let page = StudentsPage::new(
        ctx,
        Arc::new(students_api(client.clone())),
        Arc::new(groups_api(client.clone())),
        Arc::new(MediaClient::new(client)),
    );
    page.mount().await.expect("mount");

    page.open_create();
    let form = StudentForm {
        first_name: "Vali".to_string(),
        phone_number: "+(998) 93 765-43-21".to_string(),
        group_id: Some(3),
        ..StudentForm::default()
    };
    let created = page.submit(&form).await.expect("create");

    assert_eq!(created.id, 12);
    assert!(!page.list().editor().is_open());
}
