mod common;

use async_graphql::{Request, Response, Value};
use common::{TestApp, TestDatabase};
use forum_api::auth::RequestContext;
use futures_util::StreamExt;
use serde_json::json;
use std::time::Duration;

async fn exec(app: &TestApp, query: &str, context: RequestContext) -> Response {
    app.schema.execute(Request::new(query).data(context)).await
}

fn data(response: &Response) -> serde_json::Value {
    assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
    response.data.clone().into_json().unwrap()
}

fn code(response: &Response) -> Option<Value> {
    response
        .errors
        .first()?
        .extensions
        .as_ref()?
        .get("code")
        .cloned()
}

async fn register(app: &TestApp, username: &str) -> (i64, String) {
    let response = exec(
        app,
        &format!(
            r#"mutation {{
                register(input: {{ username: "{username}", email: "{username}@example.com", password: "password123" }}) {{
                    token
                    user {{ id username }}
                }}
            }}"#
        ),
        RequestContext::anonymous(),
    )
    .await;
    let body = data(&response);
    (
        body["register"]["user"]["id"].as_i64().unwrap(),
        body["register"]["token"].as_str().unwrap().to_string(),
    )
}

async fn promote(db: &TestDatabase, id: i64, role: &str) {
    sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
        .bind(i32::try_from(id).unwrap())
        .bind(role)
        .execute(&db.pool)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_token_resolves_to_registered_user() {
    let Some(db) = TestDatabase::create().await else {
        return;
    };
    let app = TestApp::new(&db);

    let (id, token) = register(&app, "ada").await;
    let ctx = app.context_for(&token).await;
    assert_eq!(ctx.user.as_ref().map(|u| i64::from(u.id)), Some(id));

    let me = exec(&app, "{ me { id username email } }", ctx).await;
    assert_eq!(
        data(&me),
        json!({ "me": { "id": id, "username": "ada", "email": "ada@example.com" } })
    );

    let login = exec(
        &app,
        r#"mutation { login(login: "ada@example.com", password: "password123") { user { id } } }"#,
        RequestContext::anonymous(),
    )
    .await;
    assert_eq!(data(&login)["login"]["user"]["id"], json!(id));

    let bad_login = exec(
        &app,
        r#"mutation { login(login: "ada", password: "wrong-password") { token } }"#,
        RequestContext::anonymous(),
    )
    .await;
    assert_eq!(code(&bad_login), Some(Value::from("UNAUTHENTICATED")));

    // Deactivated accounts never come back from a token.
    sqlx::query("UPDATE users SET deactivated_at = NOW() WHERE id = $1")
        .bind(i32::try_from(id).unwrap())
        .execute(&db.pool)
        .await
        .unwrap();
    assert!(app.context_for(&token).await.user.is_none());

    db.close().await;
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let Some(db) = TestDatabase::create().await else {
        return;
    };
    let app = TestApp::new(&db);

    register(&app, "bob").await;
    let again = exec(
        &app,
        r#"mutation { register(input: { username: "bob", email: "other@example.com", password: "password123" }) { token } }"#,
        RequestContext::anonymous(),
    )
    .await;
    assert_eq!(code(&again), Some(Value::from("CONFLICT")));

    db.close().await;
}

#[tokio::test]
async fn test_discussion_lifecycle() {
    let Some(db) = TestDatabase::create().await else {
        return;
    };
    let app = TestApp::new(&db);

    let (admin_id, admin_token) = register(&app, "admin").await;
    promote(&db, admin_id, "admin").await;
    let (_, member_token) = register(&app, "member").await;
    let (_, other_token) = register(&app, "other").await;

    let admin = app.context_for(&admin_token).await;
    let member = app.context_for(&member_token).await;
    let other = app.context_for(&other_token).await;

    let category = exec(
        &app,
        r#"mutation { createCategory(input: { name: "General", slug: "general" }) { id } }"#,
        admin.clone(),
    )
    .await;
    let category_id = data(&category)["createCategory"]["id"].as_i64().unwrap();

    let missing_category = exec(
        &app,
        r#"mutation { createThread(input: { categoryId: 999999, title: "Lost", body: "nowhere" }) { id } }"#,
        member.clone(),
    )
    .await;
    assert_eq!(code(&missing_category), Some(Value::from("NOT_FOUND")));

    let thread = exec(
        &app,
        &format!(
            r#"mutation {{ createThread(input: {{ categoryId: {category_id}, title: "Hello", body: "First!" }}) {{ id postCount author {{ username }} }} }}"#
        ),
        member.clone(),
    )
    .await;
    let thread_body = data(&thread);
    let thread_id = thread_body["createThread"]["id"].as_i64().unwrap();
    assert_eq!(thread_body["createThread"]["postCount"], json!(1));
    assert_eq!(thread_body["createThread"]["author"]["username"], json!("member"));

    let reply = exec(
        &app,
        &format!(r#"mutation {{ createPost(input: {{ threadId: {thread_id}, body: "Second" }}) {{ id }} }}"#),
        other.clone(),
    )
    .await;
    let reply_id = data(&reply)["createPost"]["id"].as_i64().unwrap();

    let listing = exec(
        &app,
        &format!("{{ thread(id: {thread_id}) {{ posts {{ body }} category {{ slug }} }} }}"),
        RequestContext::anonymous(),
    )
    .await;
    assert_eq!(
        data(&listing),
        json!({ "thread": {
            "posts": [{ "body": "First!" }, { "body": "Second" }],
            "category": { "slug": "general" }
        } })
    );

    // Only the author (or a moderator) may edit.
    let hijack = exec(
        &app,
        &format!(r#"mutation {{ editPost(input: {{ id: {reply_id}, body: "mine now" }}) {{ id }} }}"#),
        member.clone(),
    )
    .await;
    assert_eq!(code(&hijack), Some(Value::from("FORBIDDEN")));

    let edit = exec(
        &app,
        &format!(r#"mutation {{ editPost(input: {{ id: {reply_id}, body: "Second, edited" }}) {{ body }} }}"#),
        other.clone(),
    )
    .await;
    assert_eq!(data(&edit)["editPost"]["body"], json!("Second, edited"));

    let delete = exec(
        &app,
        &format!("mutation {{ deletePost(id: {reply_id}) {{ deleted body }} }}"),
        admin.clone(),
    )
    .await;
    assert_eq!(data(&delete)["deletePost"], json!({ "deleted": true, "body": "" }));

    let edit_deleted = exec(
        &app,
        &format!(r#"mutation {{ editPost(input: {{ id: {reply_id}, body: "back" }}) {{ id }} }}"#),
        other.clone(),
    )
    .await;
    assert_eq!(code(&edit_deleted), Some(Value::from("FORBIDDEN")));

    // Locked threads only take moderator replies.
    promote(&db, admin_id, "moderator").await;
    let moderator = app.context_for(&admin_token).await;
    let lock = exec(
        &app,
        &format!("mutation {{ setThreadLocked(id: {thread_id}, locked: true) {{ locked }} }}"),
        moderator.clone(),
    )
    .await;
    assert_eq!(data(&lock)["setThreadLocked"]["locked"], json!(true));

    let locked_reply = exec(
        &app,
        &format!(r#"mutation {{ createPost(input: {{ threadId: {thread_id}, body: "too late" }}) {{ id }} }}"#),
        other,
    )
    .await;
    assert_eq!(code(&locked_reply), Some(Value::from("FORBIDDEN")));

    db.close().await;
}

#[tokio::test]
async fn test_post_added_subscription() {
    let Some(db) = TestDatabase::create().await else {
        return;
    };
    let app = TestApp::new(&db);

    let (admin_id, admin_token) = register(&app, "root").await;
    promote(&db, admin_id, "admin").await;
    let admin = app.context_for(&admin_token).await;

    let category = exec(
        &app,
        r#"mutation { createCategory(input: { name: "Live", slug: "live" }) { id } }"#,
        admin.clone(),
    )
    .await;
    let category_id = data(&category)["createCategory"]["id"].as_i64().unwrap();
    let thread = exec(
        &app,
        &format!(r#"mutation {{ createThread(input: {{ categoryId: {category_id}, title: "Live", body: "go" }}) {{ id }} }}"#),
        admin.clone(),
    )
    .await;
    let thread_id = data(&thread)["createThread"]["id"].as_i64().unwrap();

    let schema = app.schema.clone();
    let listener = tokio::spawn(async move {
        let request = Request::new(format!("subscription {{ postAdded(threadId: {thread_id}) {{ body }} }}"))
            .data(RequestContext::anonymous());
        let mut stream = schema.execute_stream(request);
        stream.next().await
    });

    // Let the subscription register before publishing.
    tokio::time::sleep(Duration::from_millis(200)).await;
    exec(
        &app,
        &format!(r#"mutation {{ createPost(input: {{ threadId: {thread_id}, body: "ping" }}) {{ id }} }}"#),
        admin,
    )
    .await;

    let event = tokio::time::timeout(Duration::from_secs(5), listener)
        .await
        .expect("subscription event in time")
        .unwrap()
        .expect("stream yielded");
    assert_eq!(data(&event), json!({ "postAdded": { "body": "ping" } }));

    db.close().await;
}

#[tokio::test]
async fn test_emails_differing_in_case_conflict() {
    let Some(db) = TestDatabase::create().await else {
        return;
    };
    let app = TestApp::new(&db);

    let first = exec(
        &app,
        r#"mutation { register(input: { username: "ada", email: "Ada@Example.com", password: "password123" }) { user { id email } } }"#,
        RequestContext::anonymous(),
    )
    .await;
    let first = data(&first);
    let ada_id = first["register"]["user"]["id"].clone();
    assert_eq!(first["register"]["user"]["email"], json!("ada@example.com"));

    let variant = exec(
        &app,
        r#"mutation { register(input: { username: "eve", email: "ada@example.com", password: "password456" }) { token } }"#,
        RequestContext::anonymous(),
    )
    .await;
    assert_eq!(code(&variant), Some(Value::from("CONFLICT")));

    let login = exec(
        &app,
        r#"mutation { login(login: "ADA@example.COM", password: "password123") { user { id } } }"#,
        RequestContext::anonymous(),
    )
    .await;
    assert_eq!(data(&login)["login"]["user"]["id"], ada_id);

    let unknown = exec(
        &app,
        r#"mutation { login(login: "nobody@example.com", password: "password123") { token } }"#,
        RequestContext::anonymous(),
    )
    .await;
    assert_eq!(code(&unknown), Some(Value::from("UNAUTHENTICATED")));

    db.close().await;
}
