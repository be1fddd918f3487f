//! End-to-end scenarios driven through the public surface.

use mockdb::{
    ErrorKind,
    core::{
        db::{ForeignId, HasMany},
        obs::{event_report, events_reset},
    },
    prelude::*,
};

const BLOG_JSON: &str = r#"{
    "classes": [
        {
            "name": "User",
            "attributes": [
                { "name": "id", "type": "integer" },
                { "name": "name", "type": "string" },
                { "name": "email", "type": "string" }
            ],
            "associations": [
                { "name": "posts", "kind": "has_many", "foreign_key": "user_id", "class_name": "Post" }
            ],
            "instance_methods": [ { "name": "display_name" } ]
        },
        {
            "name": "Post",
            "attributes": [
                { "name": "id", "type": "integer" },
                { "name": "title", "type": "string" },
                { "name": "user_id", "type": "integer" }
            ],
            "associations": [
                { "name": "user", "kind": "belongs_to", "foreign_key": "user_id", "class_name": "User" }
            ]
        },
        {
            "name": "WithArgs",
            "class_methods": [
                { "name": "fiz", "params": [ { "name": "arg" } ] }
            ]
        },
        {
            "name": "Comment",
            "attributes": [
                { "name": "id", "type": "integer" },
                { "name": "name", "type": "string" },
                { "name": "foreign_key", "type": "integer" }
            ]
        }
    ]
}"#;

fn blog() -> MockDb {
    let schema = Schema::from_json_str(BLOG_JSON).expect("fixture schema should decode");

    MockDb::new(schema).expect("fixture schema should validate")
}

fn install_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("mockdb=debug"))
        .with_test_writer()
        .try_init();
}

#[test]
fn user_has_many_posts_end_to_end() -> Result<()> {
    install_tracing();
    let db = blog();
    let users = db.class("User")?;

    let user = users.create(attrs! { "name" => "Ada" })?;
    let post = user.has_many("posts")?.create(attrs! { "title" => "First" })?;

    assert_eq!(post.get("user_id")?, user.id_value());
    assert_eq!(user.has_many("posts")?.count(), 1);
    assert_eq!(post.belongs_to("user")?, Some(user));

    Ok(())
}

#[test]
fn class_method_stub_returns_its_argument_until_cleared() -> Result<()> {
    let db = blog();
    let with_args = db.class("WithArgs")?;
    with_args.stub_class_method("fiz", |args| Ok(args[0].clone()));

    assert_eq!(with_args.call("fiz", &["pop".into()])?, Value::from("pop"));

    with_args.clear_mocked_methods();
    let err = Error::from(
        with_args
            .call("fiz", &["pop".into()])
            .expect_err("cleared stub should fail"),
    );

    assert_eq!(err.kind, ErrorKind::NotImplemented);
    assert_eq!(
        err.message,
        "::fiz for Class: WithArgs. To continue stub the method."
    );

    Ok(())
}

#[test]
fn unstubbed_instance_method_reports_the_test_line() -> Result<()> {
    let db = blog();
    let user = db.class("User")?.create(attrs! {})?;

    let (err, line) = (user.call("display_name", &[]).unwrap_err(), line!());
    let err = Error::from(err);

    assert_eq!(
        err.message,
        "#display_name for Class: User. To continue stub the method."
    );
    let location = err.location.expect("dispatch miss should carry a location");
    assert!(
        location.starts_with(&format!("{}:{line}:", file!())),
        "unexpected location {location}"
    );

    Ok(())
}

#[test]
fn has_many_build_with_a_fixed_foreign_id() -> Result<()> {
    let db = blog();
    let comments = db.class("Comment")?;
    let proxy = HasMany::new(Vec::new(), "foreign_key", ForeignId::from(1_i64), &comments)?;

    let mut yielded = None;
    let built = proxy.build_with(attrs! { "name" => "Name" }, |c| yielded = Some(c.clone()))?;

    assert_eq!(
        built.attributes(),
        attrs! { "id" => Value::Null, "name" => "Name", "foreign_key" => 1 }
    );
    assert_eq!(yielded, Some(built.clone()));
    assert_eq!(proxy.first(), Some(built));

    let created = proxy.create(attrs! { "name" => "Saved" })?;
    assert!(created.is_persisted());
    assert_eq!(proxy.count(), 2);
    assert_eq!(comments.count(), 1);

    Ok(())
}

#[test]
fn unknown_attribute_is_rejected() -> Result<()> {
    let db = blog();

    let err = Error::from(
        db.class("User")?
            .create(attrs! { "name" => "Ada", "nickname" => "A" })
            .expect_err("unknown key should fail"),
    );

    assert_eq!(err.kind, ErrorKind::UnknownAttribute);
    assert_eq!(err.message, "unknown attribute: nickname");
    assert_eq!(db.class("User")?.count(), 0);

    Ok(())
}

#[test]
fn find_or_create_by_creates_once() -> Result<()> {
    let db = blog();
    let users = db.class("User")?;

    let first = users.find_or_create_by(&attrs! { "email" => "ada@example.com" })?;
    let second = users.find_or_create_by(&attrs! { "email" => "ada@example.com" })?;

    assert_eq!(users.count(), 1);
    assert_eq!(first, second);
    assert!(
        users
            .find_by(&attrs! { "email" => "bob@example.com" })?
            .is_none()
    );

    Ok(())
}

#[test]
fn identities_survive_delete_all_unless_configured() -> Result<()> {
    let db = blog();
    let users = db.class("User")?;
    users.create(attrs! {})?;
    db.delete_all();
    assert_eq!(users.create(attrs! {})?.id(), Some(2));

    let config = MockConfig::from_toml_str("reset_ids_on_clear = true")?;
    let schema = Schema::from_json_str(BLOG_JSON)?;
    let fresh = MockDb::with_config(schema, config)?;
    let users = fresh.class("User")?;
    users.create(attrs! {})?;
    fresh.delete_all();
    assert_eq!(users.create(attrs! {})?.id(), Some(1));

    Ok(())
}

#[test]
fn events_are_observable_per_class() -> Result<()> {
    events_reset();
    let db = blog();
    let with_args = db.class("WithArgs")?;
    with_args.stub_class_method("fiz", |_| Ok(Value::Null));
    with_args.call("fiz", &[Value::Null])?;
    db.class("User")?.create(attrs! {})?;

    let report = event_report();

    assert_eq!(report.class("WithArgs").dispatch_hits, 1);
    assert_eq!(report.class("User").records_inserted, 1);

    Ok(())
}

#[test]
fn unknown_class_is_not_found() {
    let db = blog();

    let err = Error::from(db.class("Ghost").expect_err("Ghost is not declared"));

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.message, "uninitialized constant Ghost");
}
