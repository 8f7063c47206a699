use lms_client::{
    course::{CourseStatus, CourseUpdate, CoverImage},
    modules::Module,
    quiz::{quiz_targets, QuizKey},
    Client, Credentials, Error, Role, Session, DEFAULT_TIMEOUT,
};
use mockito::{Matcher, Server};
use pretty_assertions::assert_eq;

fn client_for(server: &Server, tenant: &str) -> Client {
    Client::new(
        &server.url(),
        DEFAULT_TIMEOUT,
        Session {
            token: Some("tok".to_string()),
            tenant_id: tenant.to_string(),
            role: Role::Instructor,
            user_name: None,
        },
    )
    .unwrap()
}

#[test]
fn course_page_sends_headers_and_reads_pagination() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/courses")
        .match_header("authorization", "Bearer tok")
        .match_header("x-tenant-id", "default")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("page".into(), "2".into()),
            Matcher::UrlEncoded("limit".into(), "9".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"success": true,
                "data": [{"_id": "c1", "title": "Maths", "subjectname": "Mathematics", "status": "published"}],
                "pagination": {"totalCount": 25, "totalPages": 3, "currentPage": 2,
                               "hasNextPage": true, "hasPrevPage": true, "limit": 9}}"#,
        )
        .create();

    let page = client_for(&server, "default").courses(2, 9).unwrap();

    mock.assert();
    assert_eq!(page.courses.len(), 1);
    assert_eq!(page.courses[0].name, "Mathematics");
    assert_eq!(page.pagination.current_page, 2);
    assert!(page.pagination.has_next_page && page.pagination.has_prev_page);
}

#[test]
fn modules_are_retried_once_on_server_error() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/courses/c1/modules")
        .with_status(500)
        .expect(2)
        .create();

    let err = client_for(&server, "default")
        .course_modules("c1")
        .unwrap_err();

    mock.assert();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
}

#[test]
fn other_endpoints_are_not_retried() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/courses/c1")
        .with_status(500)
        .expect(1)
        .create();

    let err = client_for(&server, "default").course("c1").unwrap_err();

    mock.assert();
    assert_eq!(err.user_message(), "Something went wrong. Please try again.");
}

#[test]
fn unauthorized_clears_token() {
    let mut server = Server::new();
    server.mock("GET", "/courses/c1").with_status(401).create();

    let client = client_for(&server, "acme");
    let err = client.course("c1").unwrap_err();

    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(client.session().token, None);
    assert_eq!(client.session().tenant_id, "acme");
}

#[test]
fn failed_login_keeps_session() {
    let mut server = Server::new();
    server
        .mock("POST", "/auth/login")
        .with_status(401)
        .with_body(r#"{"success": false, "message": "Invalid credentials"}"#)
        .create();

    let client = client_for(&server, "default");
    let err = client
        .login(&Credentials {
            email: "a@b.c".into(),
            password: "wrong".to_string().into(),
        })
        .unwrap_err();

    assert!(matches!(err, Error::Status { ref message, .. } if message == "Invalid credentials"));
    assert_eq!(client.session().token.as_deref(), Some("tok"));
}

#[test]
fn login_stores_session() {
    let mut server = Server::new();
    server
        .mock("POST", "/auth/login")
        .match_body(Matcher::PartialJsonString(r#"{"email": "t@school.in"}"#.into()))
        .with_status(200)
        .with_body(r#"{"token": "new", "user": {"role": "teacher", "tenantId": "acme", "name": "T"}}"#)
        .create();

    let client = client_for(&server, "default");
    let session = client
        .login(&Credentials {
            email: "t@school.in".into(),
            password: "pw".to_string().into(),
        })
        .unwrap();

    assert_eq!(session.role, Role::Instructor);
    assert_eq!(client.session().token.as_deref(), Some("new"));
    assert_eq!(client.tenant().id(), "acme");
}

#[test]
fn quiz_probe_treats_missing_as_absent() {
    let mut server = Server::new();
    // nested module route misses, query-string route hits
    server
        .mock("GET", "/vq/module/Fractions/course/Maths")
        .with_status(404)
        .create();
    let fallback = server
        .mock("GET", "/vq/module/Fractions")
        .match_query(Matcher::UrlEncoded("courseName".into(), "Maths".into()))
        .with_status(200)
        .with_body(
            r#"{"success": true, "data": {"_id": "q1", "questions": [
                {"question": "1/2 + 1/2?", "options": {"A": "1", "B": "2"}, "correctAnswer": "A", "explanation": "halves"}]}}"#,
        )
        .create();
    server
        .mock("GET", "/vq/title/Halves")
        .match_query(Matcher::Any)
        .with_status(404)
        .create();
    server
        .mock("GET", "/vq/title/Quarters")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"success": false, "message": "No quiz"}"#)
        .create();
    server
        .mock("GET", "/vq/title/Thirds")
        .match_query(Matcher::Any)
        .with_status(503)
        .create();

    let client = client_for(&server, "acme");
    let mut modules: Vec<Module> = vec![serde_json::from_value(serde_json::json!({
        "_id": "m1",
        "title": "Fractions",
        "videos": [
            {"_id": "v1", "url": "u1", "title": "Halves"},
            {"_id": "v2", "url": "u2", "title": "Quarters"},
            {"_id": "v3", "url": "u3", "title": "Thirds"},
        ]
    }))
    .unwrap()];
    modules[0].name = "Fractions".to_string();

    let targets = quiz_targets(&modules);
    assert_eq!(targets.len(), 4);

    let found = client
        .probe_quizzes("Maths", &targets, || false)
        .unwrap()
        .unwrap();

    fallback.assert();
    assert_eq!(found.len(), 1);
    assert!(found.contains_key(&QuizKey::Module("m1".into())));
    assert!(!found.contains_key(&QuizKey::Video("v1".into())));
}

#[test]
fn cancelled_sweep_returns_nothing() {
    let server = Server::new();
    let client = client_for(&server, "default");
    let modules: Vec<Module> =
        vec![serde_json::from_str(r#"{"_id": "m1", "title": "Fractions"}"#).unwrap()];

    let res = client
        .probe_quizzes("Maths", &quiz_targets(&modules), || true)
        .unwrap();
    assert!(res.is_none());
}

fn sample_update() -> CourseUpdate {
    CourseUpdate {
        title: Some("Algebra".to_string()),
        status: Some(CourseStatus::Published),
        grade: Some(8),
        board: Some("  ".to_string()),
        medium: vec!["English".to_string(), "Hindi".to_string()],
        cover: Some(CoverImage {
            file_name: "cover.png".to_string(),
            mime: "image/png".to_string(),
            bytes: b"PNGDATA".to_vec(),
        }),
    }
}

#[test]
fn course_update_is_sparse_multipart() {
    let mut server = Server::new();
    let mock = server
        .mock("PUT", "/courses/c1")
        .match_header("authorization", "Bearer tok")
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".into()),
        )
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="title"\r\n\r\nAlgebra\r\n"#.into()),
            Matcher::Regex(r#"name="status"\r\n\r\npublished\r\n"#.into()),
            Matcher::Regex(r#"name="grade"\r\n\r\n8\r\n"#.into()),
            Matcher::Regex(
                r#"(?s)name="medium\[\]"\r\n\r\nEnglish\r\n.*name="medium\[\]"\r\n\r\nHindi\r\n"#
                    .into(),
            ),
            Matcher::Regex(
                r#"name="coverImg"; filename="cover.png"\r\nContent-Type: image/png\r\n\r\nPNGDATA"#
                    .into(),
            ),
        ]))
        .with_status(200)
        .with_body(r#"{"success": true, "data": {"_id": "c1"}}"#)
        .expect(1)
        .create();

    client_for(&server, "default")
        .update_course("c1", sample_update())
        .unwrap();

    mock.assert();
}

#[test]
fn blank_board_is_left_out_of_update() {
    let fields = sample_update().text_fields();
    assert!(fields.iter().all(|(k, _)| *k != "board"));
    assert_eq!(
        fields.iter().filter(|(k, _)| *k == "medium[]").count(),
        2
    );
}

#[test]
fn failed_update_is_not_retried() {
    let mut server = Server::new();
    let mock = server
        .mock("PUT", "/courses/c1")
        .with_status(500)
        .expect(1)
        .create();

    let err = client_for(&server, "default")
        .update_course("c1", sample_update())
        .unwrap_err();

    mock.assert();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
}
