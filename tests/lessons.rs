mod common;
use axum::http::StatusCode;
use serde_json::{Value, json};

use crate::common::{
    Action, Flow, FlowContext, create_lesson_action, create_module_action, login_admin_action,
    mark_paid, setup_server, setup_test_db, sign_in_student,
};

fn parse(body: &str) -> Value {
    serde_json::from_str(body).expect("Invalid body format")
}

fn id_of(ctx: &FlowContext, key: &str) -> String {
    ctx.get(key)["id"].as_str().unwrap().to_string()
}

fn publish_lesson(key: &'static str, published: bool) -> Action {
    Action::new("publish_lesson", "PUT", "dynamic")
        .with_dyn_path(move |ctx| format!("/api/v1/lessons/{}/publish", id_of(ctx, key)))
        .with_body(json!({ "published": published }))
}

fn publish_module(key: &'static str, published: bool) -> Action {
    Action::new("publish_module", "PUT", "dynamic")
        .with_dyn_path(move |ctx| format!("/api/v1/modules/{}/publish", id_of(ctx, key)))
        .with_body(json!({ "published": published }))
}

#[tokio::test]
async fn route_lessons_create_validation() {
    let db = setup_test_db().await;
    let (mut server, _) = setup_server(&db).await;

    Flow::new()
        .step(login_admin_action())
        .step(create_module_action("Basics").with_save_as("module"))
        .step(create_lesson_action("module", "First").assert_body(|body| {
            let body = parse(body);
            assert_eq!(body["order_index"], 1);
            assert_eq!(body["published"], false);
            assert_eq!(body["learning_objectives"], json!(["one"]));
            assert!(body["video_embed"].is_null());
        }))
        .step(create_lesson_action("module", "Second").assert_body(|body| {
            assert_eq!(parse(body)["order_index"], 2);
        }))
        .step(
            Action::new("create_without_title", "POST", "/api/v1/lessons")
                .with_dyn_body(|ctx| json!({ "module_id": ctx.get("module")["id"], "title": "  " }))
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("Title is required"))),
        )
        .step(
            Action::new("create_without_module", "POST", "/api/v1/lessons")
                .with_body(json!({ "title": "Orphan" }))
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert!(body.contains("Module ID is required"))),
        )
        .step(
            Action::new("create_unknown_module", "POST", "/api/v1/lessons")
                .with_body(json!({ "title": "Orphan", "module_id": uuid::Uuid::new_v4() }))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("list_without_module", "GET", "/api/v1/lessons")
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("list", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons?module_id={}", id_of(ctx, "module")))
                .assert_body(|body| {
                    let lessons = parse(body);
                    assert_eq!(lessons[0]["title"], "First");
                    assert_eq!(lessons[1]["title"], "Second");
                }),
        )
        .run(&mut server, &db)
        .await;
}

#[tokio::test]
async fn route_lessons_publish_needs_published_module() {
    let db = setup_test_db().await;
    let (mut server, mailer) = setup_server(&db).await;

    Flow::new()
        .step(login_admin_action())
        .step(create_module_action("Basics").with_save_as("module"))
        .step(create_lesson_action("module", "Intro").with_save_as("intro"))
        .step(create_lesson_action("module", "Draft").with_save_as("draft"))
        .step(
            publish_lesson("intro", true)
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    assert!(body.contains("Cannot publish lesson when module is unpublished"));
                }),
        )
        // unpublishing is always allowed
        .step(publish_lesson("intro", false))
        .step(publish_module("module", true))
        .step(publish_lesson("draft", false).assert_body(|body| {
            assert_eq!(parse(body)["published"], false);
        }))
        .step(publish_lesson("intro", true).assert_body(|body| {
            assert_eq!(parse(body)["published"], true);
        }))
        .run(&mut server, &db)
        .await;

    let modules = server
        .get("/api/v1/modules")
        .add_query_param("include_unpublished", "true")
        .await
        .json::<Value>();
    let module_id = modules[0]["id"].as_str().unwrap().to_string();
    let lessons = modules[0]["lessons"].as_array().unwrap().clone();
    let draft_id = lessons
        .iter()
        .find(|l| l["title"] == "Draft")
        .and_then(|l| l["id"].as_str())
        .unwrap()
        .to_string();

    sign_in_student(&mut server, &mailer, "student@example.com").await;

    let list_path = format!("/api/v1/lessons?module_id={module_id}");
    let draft_path = format!("/api/v1/lessons/{draft_id}");

    Flow::new()
        .step(
            Action::new("student_list", "GET", "dynamic")
                .with_dyn_path(move |_| list_path.clone())
                .assert_body(|body| {
                    let lessons = parse(body);
                    assert_eq!(lessons.as_array().unwrap().len(), 1);
                    assert_eq!(lessons[0]["title"], "Intro");
                }),
        )
        .step(
            Action::new("student_get_draft", "GET", "dynamic")
                .with_dyn_path(move |_| draft_path.clone())
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, &db)
        .await;
}

#[tokio::test]
async fn route_lessons_update_and_embed() {
    let db = setup_test_db().await;
    let (mut server, _) = setup_server(&db).await;

    Flow::new()
        .step(login_admin_action())
        .step(create_module_action("Basics").with_save_as("module"))
        .step(create_lesson_action("module", "Video").with_save_as("lesson"))
        .step(
            Action::new("update", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", id_of(ctx, "lesson")))
                .with_body(json!({
                    "description": " Watch this ",
                    "duration": "12:00",
                    "video_url": "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42",
                    "resources": [{ "title": "Slides", "url": "https://example.com/slides.pdf" }],
                }))
                .assert_body(|body| {
                    let body = parse(body);
                    assert_eq!(body["title"], "Video");
                    assert_eq!(body["description"], "Watch this");
                    assert_eq!(body["duration"], "12:00");
                    assert_eq!(body["resources"][0]["title"], "Slides");
                    assert_eq!(body["video_embed"]["kind"], "youtube");
                    assert_eq!(
                        body["video_embed"]["url"],
                        "https://www.youtube.com/embed/dQw4w9WgXcQ?modestbranding=1&rel=0"
                    );
                }),
        )
        // empty strings clear optional text
        .step(
            Action::new("clear_video", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", id_of(ctx, "lesson")))
                .with_body(json!({ "video_url": "" }))
                .assert_body(|body| {
                    let body = parse(body);
                    assert!(body["video_url"].is_null());
                    assert!(body["video_embed"].is_null());
                    assert_eq!(body["description"], "Watch this");
                }),
        )
        .step(
            Action::new("blank_title", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", id_of(ctx, "lesson")))
                .with_body(json!({ "title": " " }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("delete", "DELETE", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", id_of(ctx, "lesson"))),
        )
        .step(
            Action::new("get_deleted", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", id_of(ctx, "lesson")))
                .with_expect(StatusCode::NOT_FOUND),
        )
        .run(&mut server, &db)
        .await;
}

#[tokio::test]
async fn route_lessons_reorder() {
    let db = setup_test_db().await;
    let (mut server, _) = setup_server(&db).await;

    Flow::new()
        .step(login_admin_action())
        .step(create_module_action("Basics").with_save_as("module"))
        .step(create_lesson_action("module", "One").with_save_as("one"))
        .step(create_lesson_action("module", "Two").with_save_as("two"))
        // a swap passes because the order constraint is checked on commit
        .step(
            Action::new("swap", "PUT", "/api/v1/lessons/reorder").with_dyn_body(|ctx| {
                json!({ "lessons": [
                    { "id": ctx.get("one")["id"], "order": 2 },
                    { "id": ctx.get("two")["id"], "order": 1 },
                ] })
            }),
        )
        .step(
            Action::new("list", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons?module_id={}", id_of(ctx, "module")))
                .assert_body(|body| {
                    let lessons = parse(body);
                    assert_eq!(lessons[0]["title"], "Two");
                    assert_eq!(lessons[1]["title"], "One");
                }),
        )
        .step(
            Action::new("clash", "PUT", "/api/v1/lessons/reorder")
                .with_dyn_body(|ctx| {
                    json!({ "lessons": [
                        { "id": ctx.get("one")["id"], "order": 5 },
                        { "id": ctx.get("two")["id"], "order": 5 },
                    ] })
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("unknown", "PUT", "/api/v1/lessons/reorder")
                .with_dyn_body(|ctx| {
                    json!({ "lessons": [
                        { "id": ctx.get("one")["id"], "order": 1 },
                        { "id": uuid::Uuid::new_v4(), "order": 2 },
                    ] })
                })
                .with_expect(StatusCode::NOT_FOUND),
        )
        .step(
            Action::new("list_unchanged", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons?module_id={}", id_of(ctx, "module")))
                .assert_body(|body| {
                    let lessons = parse(body);
                    assert_eq!(lessons[0]["title"], "Two");
                    assert_eq!(lessons[0]["order_index"], 1);
                    assert_eq!(lessons[1]["title"], "One");
                    assert_eq!(lessons[1]["order_index"], 2);
                }),
        )
        .run(&mut server, &db)
        .await;
}

#[tokio::test]
async fn route_lessons_order_conflicts() {
    let db = setup_test_db().await;
    let (mut server, _) = setup_server(&db).await;

    Flow::new()
        .step(login_admin_action())
        .step(create_module_action("Basics").with_save_as("module"))
        .step(create_lesson_action("module", "One").with_save_as("one"))
        .step(create_lesson_action("module", "Two").with_save_as("two"))
        // order 2 already belongs to "Two"
        .step(
            Action::new("update_taken_order", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", id_of(ctx, "one")))
                .with_body(json!({ "order": 2 }))
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("update_free_order", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", id_of(ctx, "one")))
                .with_body(json!({ "order": 3 }))
                .assert_body(|body| assert_eq!(parse(body)["order_index"], 3)),
        )
        // "Two" is left out of the request and keeps order 2
        .step(
            Action::new("module_reorder_clash", "PUT", "/api/v1/modules/reorder")
                .with_dyn_body(|ctx| {
                    json!({ "modules": [{
                        "id": ctx.get("module")["id"],
                        "order": 1,
                        "lessons": [{ "id": ctx.get("one")["id"], "order": 2 }],
                    }] })
                })
                .with_expect(StatusCode::BAD_REQUEST),
        )
        .step(
            Action::new("list_unchanged", "GET", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons?module_id={}", id_of(ctx, "module")))
                .assert_body(|body| {
                    let lessons = parse(body);
                    assert_eq!(lessons[0]["title"], "Two");
                    assert_eq!(lessons[0]["order_index"], 2);
                    assert_eq!(lessons[1]["title"], "One");
                    assert_eq!(lessons[1]["order_index"], 3);
                }),
        )
        .run(&mut server, &db)
        .await;
}

#[tokio::test]
async fn route_lessons_require_purchase() {
    let db = setup_test_db().await;
    let (mut server, mailer) = setup_server(&db).await;

    Flow::new()
        .step(login_admin_action())
        .step(create_module_action("Basics").with_save_as("module"))
        .step(create_lesson_action("module", "Paid").with_save_as("lesson"))
        .step(
            Action::new("fill", "PUT", "dynamic")
                .with_dyn_path(|ctx| format!("/api/v1/lessons/{}", id_of(ctx, "lesson")))
                .with_body(json!({
                    "content": "The whole lesson",
                    "duration": "05:00",
                    "video_url": "https://youtu.be/dQw4w9WgXcQ",
                })),
        )
        .step(publish_module("module", true))
        .run(&mut server, &db)
        .await;

    let modules = server.get("/api/v1/modules").await.json::<Value>();
    let module_id = modules[0]["id"].as_str().unwrap().to_string();
    let lesson_id = modules[0]["lessons"][0]["id"].as_str().unwrap().to_string();

    sign_in_student(&mut server, &mailer, "student@example.com").await;

    let list_path = format!("/api/v1/lessons?module_id={module_id}");
    let lesson_path = format!("/api/v1/lessons/{lesson_id}");

    let preview_list = list_path.clone();
    let preview_lesson = lesson_path.clone();
    Flow::new()
        .step(
            Action::new("preview_list", "GET", "dynamic")
                .with_dyn_path(move |_| preview_list.clone())
                .assert_body(|body| {
                    let lessons = parse(body);
                    assert_eq!(lessons[0]["title"], "Paid");
                    assert_eq!(lessons[0]["duration"], "05:00");
                    assert!(lessons[0]["content"].is_null());
                    assert!(lessons[0]["video_url"].is_null());
                    assert!(lessons[0]["video_embed"].is_null());
                }),
        )
        .step(
            Action::new("preview_tree", "GET", "/api/v1/modules").assert_body(|body| {
                let modules = parse(body);
                assert_eq!(modules[0]["lessons"][0]["title"], "Paid");
                assert!(modules[0]["lessons"][0]["content"].is_null());
            }),
        )
        .step(
            Action::new("lesson_locked", "GET", "dynamic")
                .with_dyn_path(move |_| preview_lesson.clone())
                .with_expect(StatusCode::FORBIDDEN),
        )
        .run(&mut server, &db)
        .await;

    mark_paid(&db, "student@example.com").await;

    Flow::new()
        .step(
            Action::new("lesson_unlocked", "GET", "dynamic")
                .with_dyn_path(move |_| lesson_path.clone())
                .assert_body(|body| {
                    let lesson = parse(body);
                    assert_eq!(lesson["content"], "The whole lesson");
                    assert_eq!(lesson["video_embed"]["kind"], "youtube");
                }),
        )
        .step(
            Action::new("full_list", "GET", "dynamic")
                .with_dyn_path(move |_| list_path.clone())
                .assert_body(|body| {
                    assert_eq!(parse(body)[0]["content"], "The whole lesson");
                }),
        )
        .run(&mut server, &db)
        .await;
}

#[tokio::test]
async fn route_lessons_bad_id() {
    let db = setup_test_db().await;
    let (mut server, _) = setup_server(&db).await;

    Flow::new()
        .step(login_admin_action())
        .step(
            Action::new("lesson_bad_id", "GET", "/api/v1/lessons/not-a-uuid")
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| {
                    let body = parse(body);
                    assert_eq!(body["status_code"], "400");
                    assert!(body["message"].as_str().unwrap().starts_with("Request error"));
                }),
        )
        .step(
            Action::new("list_bad_module_id", "GET", "/api/v1/lessons")
                .with_param("module_id", "42")
                .with_expect(StatusCode::BAD_REQUEST)
                .assert_body(|body| assert_eq!(parse(body)["status_code"], "400")),
        )
        .run(&mut server, &db)
        .await;
}
