//! Integration tests for the resource services over real HTTP
//!
//! **Coverage:**
//! - Class listing with local filtering, sorting and paging
//! - Class create/delete round trips and their user-facing errors
//! - Export download with the local CSV fallback
//! - Teacher leave request listing and decisions
//!
//! **Infrastructure:**
//! - WireMock HTTP server standing in for the REST API
//! - `AppContext` with an authenticated in-memory session

use kinderhub_domain::{ClassPayload, Config, LeaveStatus, StorageBackend};
use kinderhub_infra::services::export::UTF8_BOM;
use kinderhub_infra::services::ClassFilter;
use kinderhub_infra::AppContext;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn context(server: &MockServer) -> AppContext {
    let mut config = Config::default();
    config.api.base_url = format!("{}/api/v1", server.uri());
    config.storage.backend = StorageBackend::Memory;
    let ctx = AppContext::new(config).expect("context");
    ctx.store.set_tokens("A1", "R1");
    ctx
}

fn envelope(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "status": 200, "message": "OK", "data": data }))
}

async fn mount_class_list(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/classes/all"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(envelope(json!([
            { "id": 1, "className": "Mầm Hoa Sen", "grade": "Mầm", "roomNumber": "P101",
              "academicYear": "2024-2025", "teacherName": "Cô Lan" },
            { "id": 2, "className": "Chồi Sơn Ca", "grade": "Chồi", "roomNumber": "P202",
              "academicYear": "2025-2026" },
            { "id": 3, "className": "Lá, Vàng Anh", "grade": "Lá", "roomNumber": "P103",
              "academicYear": "2025-2026", "teacherName": "Cô Mai" }
        ])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_classes_filters_and_pages_locally() {
    let server = MockServer::start().await;
    mount_class_list(&server).await;
    let ctx = context(&server).await;

    let filter = ClassFilter {
        year: Some("2025-2026".into()),
        sort: Some("roomNumber,desc".into()),
        ..ClassFilter::default()
    };
    let page = ctx.classes.fetch_classes(&filter).await.expect("classes");

    assert_eq!(page.total, 2);
    let ids: Vec<_> = page.items.iter().filter_map(|c| c.id).collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(page.items[0].teacher_name, "Chưa có giáo viên");

    let options = ctx.classes.fetch_class_options(Some("2024-2025")).await.expect("options");
    assert_eq!(options.len(), 1);
    assert_eq!(options[0].label, "Mầm Hoa Sen - Mầm (P101) • 2024-2025");

    let lite = ctx.classes.fetch_classes_lite().await;
    assert_eq!(lite.len(), 3);
}

#[tokio::test]
async fn test_create_and_delete_class() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/classes/create"))
        .and(body_json(json!({
            "className": "Lá 2",
            "grade": "Lá",
            "roomNumber": "P105",
            "academicYear": "2025-2026",
            "teacherId": 9
        })))
        .respond_with(envelope(json!({ "id": 12, "className": "Lá 2", "grade": "Lá" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/classes/delete/12"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "status": 200, "message": "" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let ctx = context(&server).await;

    let payload = ClassPayload {
        class_name: "  Lá 2 ".into(),
        grade: "Lá".into(),
        room_number: " P105".into(),
        academic_year: "2025-2026 ".into(),
        teacher_id: Some(9),
    };
    let created = ctx.classes.create_class(&payload).await.expect("created");
    assert_eq!(created.id, Some(12));

    let message = ctx.classes.delete_class(12).await.expect("deleted");
    assert_eq!(message, "Đã xoá lớp học");
}

#[tokio::test]
async fn test_delete_class_accepts_plain_text_reply() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/classes/delete/12"))
        .and(header("Authorization", "Bearer A1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/plain")
                .set_body_string("Deleted class 12"),
        )
        .expect(1)
        .mount(&server)
        .await;
    let ctx = context(&server).await;

    let message = ctx.classes.delete_class(12).await.expect("deleted");
    assert_eq!(message, "Đã xoá lớp học");
}

#[tokio::test]
async fn test_class_errors_carry_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/classes/update/4"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "status": 400, "message": "Phòng học đã được sử dụng" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/classes/find/5"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "Not Found" })))
        .mount(&server)
        .await;
    let ctx = context(&server).await;

    let err = ctx.classes.update_class(4, &ClassPayload::default()).await.unwrap_err();
    assert_eq!(err.message, "Phòng học đã được sử dụng");
    assert_eq!(err.status, Some(400));

    let err = ctx.classes.fetch_class_by_id(5).await.unwrap_err();
    assert_eq!(err.message, "Not Found");

    let err = ctx.classes.fetch_class_by_id(0).await.unwrap_err();
    assert_eq!(err.message, "Thiếu id lớp");
    assert_eq!(err.status, None);
}

#[tokio::test]
async fn test_export_falls_back_to_csv() {
    let server = MockServer::start().await;
    mount_class_list(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/classes/export"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let ctx = context(&server).await;

    let download = ctx.classes.export_classes().await.expect("fallback export");

    assert_eq!(download.filename, "classes.csv");
    assert!(download.content_type.starts_with("text/csv"));
    assert_eq!(&download.bytes[..3], &UTF8_BOM);
    let text = String::from_utf8(download.bytes[3..].to_vec()).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "id,className,classCode,grade,roomNumber,academicYear,teacherName");
    assert_eq!(lines.len(), 4);
    assert!(lines[3].starts_with("3,\"Lá, Vàng Anh\","));

    let dir = tempfile::tempdir().unwrap();
    let saved = download.save_to(dir.path()).unwrap();
    assert!(saved.ends_with("classes.csv"));
}

#[tokio::test]
async fn test_pending_leave_requests_normalise_dates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/leave-requests/teachers/classes/7/pending"))
        .respond_with(envelope(json!([
            { "id": 11, "studentName": "Bé Na", "fromDate": "2025-12-20T17:00:00.000Z",
              "toDate": "2025-12-22", "status": "PENDING", "reason": "Ốm" },
            { "id": 12, "studentName": "Bé Bin", "fromDate": "2025-12-23",
              "toDate": "2025-12-23", "status": "PENDING" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let ctx = context(&server).await;

    let requests = ctx.leave_requests.fetch_pending_by_class(7).await.expect("pending");

    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].from_date, "2025-12-20");
    assert_eq!(requests[0].status, LeaveStatus::Pending);
    assert_eq!(requests[1].student_name, "Bé Bin");

    let err = ctx.leave_requests.fetch_pending_by_class(0).await.unwrap_err();
    assert_eq!(err.message, "Thiếu classId");
}

#[tokio::test]
async fn test_pending_unauthorized_gets_dedicated_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/leave-requests/teachers/classes/7/pending"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let ctx = context(&server).await;
    ctx.store.set_tokens("A1", "");

    let err = ctx.leave_requests.fetch_pending_by_class(7).await.unwrap_err();

    assert_eq!(err.status, Some(401));
    assert!(err.message.contains("401"));
}

#[tokio::test]
async fn test_approve_and_reject_leave_request() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/leave-requests/teachers/11/approve"))
        .and(query_param("teacherName", "Cô Lan"))
        .and(body_json(json!({ "teacherNote": "Mau khỏe nhé" })))
        .respond_with(envelope(json!({
            "id": 11, "fromDate": "2025-12-20", "toDate": "2025-12-22",
            "status": "APPROVED", "teacherNote": "Mau khỏe nhé"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/leave-requests/teachers/12/reject"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({ "status": 409 })))
        .expect(1)
        .mount(&server)
        .await;
    let ctx = context(&server).await;

    let approved = ctx
        .leave_requests
        .approve(11, "Cô Lan", "Mau khỏe nhé")
        .await
        .expect("approved")
        .expect("request in response");
    assert_eq!(approved.status, LeaveStatus::Approved);
    assert_eq!(approved.teacher_note.as_deref(), Some("Mau khỏe nhé"));

    let err = ctx.leave_requests.reject(12, "Cô Lan", "").await.unwrap_err();
    assert_eq!(err.status, Some(409));
    assert_eq!(err.message, "Từ chối đơn xin nghỉ thất bại");

    let err = ctx.leave_requests.approve(0, "Cô Lan", "").await.unwrap_err();
    assert_eq!(err.message, "Thiếu requestId");
}
