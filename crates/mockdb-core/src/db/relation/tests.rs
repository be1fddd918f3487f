use crate::{
    db::{Direction, ForeignId, HasMany, MockClass, MockDb, Relation},
    error::ErrorClass,
    test_fixtures::blog_db,
    value::{RecordId, Value},
};
use proptest::prelude::*;

fn seeded() -> (MockDb, MockClass) {
    let db = blog_db();
    let users = db.class("User").expect("User should exist");
    for (name, age, admin) in [("Ada", 36, true), ("Bob", 25, false), ("Cy", 41, false)] {
        users
            .create(attrs! { "name" => name, "age" => age, "admin" => admin })
            .expect("seed should persist");
    }

    (db, users)
}

fn names(relation: &Relation) -> Vec<Value> {
    relation.pluck("name").expect("name should pluck")
}

// ----------------------------------------------------------------------
// Finders
// ----------------------------------------------------------------------

#[test]
fn find_by_matches_every_entry() {
    let (_db, users) = seeded();

    let bob = users
        .find_by(&attrs! { "name" => "Bob", "age" => 25 })
        .expect("find_by should run")
        .expect("Bob should match");
    let none = users
        .find_by(&attrs! { "name" => "Bob", "age" => 99 })
        .expect("find_by should run");

    assert_eq!(bob.get("name").expect("name is declared"), Value::from("Bob"));
    assert!(none.is_none());
}

#[test]
fn find_by_rejects_unknown_keys_even_when_empty() {
    let db = blog_db();
    let users = db.class("User").expect("User should exist");

    let err = users
        .find_by(&attrs! { "nickname" => "x" })
        .expect_err("unknown key should fail");

    assert_eq!(err.class, ErrorClass::UnknownAttribute);
    assert_eq!(err.message, "unknown attribute: nickname");
}

#[test]
fn find_by_strict_reports_the_class() {
    let (_db, users) = seeded();

    let err = users
        .find_by_strict(&attrs! { "name" => "Zed" })
        .expect_err("missing record should fail");

    assert!(err.is_not_found());
    assert_eq!(err.message, "Couldn't find User");
}

#[test]
fn find_or_create_by_is_idempotent() {
    let db = blog_db();
    let users = db.class("User").expect("User should exist");

    let first = users
        .find_or_create_by(&attrs! { "email" => "a@b.c" })
        .expect("first call should create");
    let second = users
        .find_or_create_by(&attrs! { "email" => "a@b.c" })
        .expect("second call should find");

    assert_eq!(users.count(), 1);
    assert_eq!(first, second);
}

#[test]
fn find_or_initialize_by_does_not_persist() {
    let db = blog_db();
    let users = db.class("User").expect("User should exist");

    let record = users
        .find_or_initialize_by(&attrs! { "email" => "new@b.c" })
        .expect("initialize should succeed");

    assert!(record.is_new_record());
    assert_eq!(users.count(), 0);
}

// ----------------------------------------------------------------------
// Filters and ordering
// ----------------------------------------------------------------------

#[test]
fn where_eq_with_a_list_means_membership() {
    let (_db, users) = seeded();

    let picked = users
        .where_eq(&attrs! { "name" => vec!["Ada", "Cy"] })
        .expect("where should run");
    let rest = users
        .where_not(&attrs! { "name" => vec!["Ada", "Cy"] })
        .expect("where_not should run");

    assert_eq!(names(&picked), vec![Value::from("Ada"), Value::from("Cy")]);
    assert_eq!(names(&rest), vec![Value::from("Bob")]);
}

#[test]
fn order_by_sorts_stably_in_both_directions() {
    let (_db, users) = seeded();
    let all = users.all();

    let asc = all.order_by("age", Direction::Asc).expect("ints should order");
    let desc = all.order_by("age", Direction::Desc).expect("ints should order");

    assert_eq!(
        names(&asc),
        vec![Value::from("Bob"), Value::from("Ada"), Value::from("Cy")]
    );
    assert_eq!(names(&desc.reverse_order()), names(&asc));
    assert_eq!(names(&asc.limit(1)), vec![Value::from("Bob")]);
}

#[test]
fn order_by_rejects_mixed_families() {
    let (_db, users) = seeded();
    users
        .find(1)
        .expect("Ada should exist")
        .set("name", 7)
        .expect("attributes are untyped at runtime");

    let err = users
        .all()
        .order_by("name", Direction::Asc)
        .expect_err("text and int do not compare");

    assert_eq!(err.class, ErrorClass::Argument);
}

#[test]
fn queries_skip_raw_values() {
    let (_db, users) = seeded();
    let mut relation = users.all();
    relation.push(42);

    assert_eq!(relation.len(), 4);
    assert_eq!(relation.ids(), vec![1, 2, 3]);
    assert_eq!(
        relation.last().and_then(|r| r.id()),
        Some(3),
        "last looks at records only"
    );
    assert_eq!(relation.get(3), Some(&Value::Int(42)));
}

// ----------------------------------------------------------------------
// Aggregates
// ----------------------------------------------------------------------

#[test]
fn aggregates_over_numeric_columns() {
    let (_db, users) = seeded();
    let all = users.all();

    assert_eq!(all.sum("age").expect("sum should run"), Value::Int(102));
    assert_eq!(all.average("age").expect("average should run"), Some(34.0));
    assert_eq!(all.minimum("age").expect("min should run"), Some(Value::Int(25)));
    assert_eq!(all.maximum("name").expect("max should run"), Some(Value::from("Cy")));
    assert_eq!(Relation::none(&users).average("age").expect("empty average"), None);
}

#[test]
fn sum_rejects_text() {
    let (_db, users) = seeded();

    let err = users.all().sum("name").expect_err("text should not sum");

    assert_eq!(err.message, "cannot sum non-numeric text value in 'name'");
}

// ----------------------------------------------------------------------
// Bulk mutation and scopes
// ----------------------------------------------------------------------

#[test]
fn update_all_checks_keys_before_writing() {
    let (_db, users) = seeded();
    let all = users.all();

    let err = all
        .update_all(&attrs! { "admin" => true, "bogus" => 1 })
        .expect_err("unknown key should fail");
    assert_eq!(err.message, "unknown attribute: bogus");
    assert_eq!(
        users.where_eq(&attrs! { "admin" => true }).expect("where should run").len(),
        1,
        "nothing was written"
    );

    assert_eq!(all.update_all(&attrs! { "admin" => true }).expect("update should run"), 3);
    assert_eq!(
        users.where_eq(&attrs! { "admin" => true }).expect("where should run").len(),
        3
    );
}

#[test]
fn update_all_checks_primary_key_before_writing() {
    let (_db, users) = seeded();

    let err = users
        .all()
        .update_all(&attrs! { "name" => "x", "id" => 1 })
        .expect_err("other records cannot take id 1");

    assert_eq!(err.message, "cannot change primary key 'id' of persisted User");
    assert_eq!(names(&users.all()), vec![Value::from("Ada"), "Bob".into(), "Cy".into()]);
}

#[test]
fn delete_all_removes_from_the_store() {
    let (_db, users) = seeded();
    let mut young = users
        .where_eq(&attrs! { "age" => vec![25, 36] })
        .expect("where should run");

    assert_eq!(young.delete_all(), 2);

    assert!(young.is_empty());
    assert_eq!(users.count(), 1);
}

#[test]
fn scopes_are_injected_query_functions() {
    let (_db, users) = seeded();
    users
        .define_scope("admins", |relation, _| relation.where_eq(&attrs! { "admin" => true }))
        .expect("admins is declared");
    users
        .define_scope("older_than", |relation, args| {
            let floor = args[0].as_int().unwrap_or_default();
            let mut out = Relation::none(relation.class().expect("scoped relations carry a class"));
            for record in relation.records() {
                if record.get("age")?.as_int().is_some_and(|age| age > floor) {
                    out.push(record);
                }
            }
            Ok(out)
        })
        .expect("older_than is declared");

    let admins = users.scope("admins", &[]).expect("scope should apply");
    let chained = users
        .all()
        .scope("older_than", &[30.into()])
        .and_then(|r| r.scope("admins", &[]))
        .expect("scopes should chain");

    assert_eq!(names(&admins), vec![Value::from("Ada")]);
    assert_eq!(names(&chained), vec![Value::from("Ada")]);
}

#[test]
fn declared_but_undefined_scope_is_not_implemented() {
    let (_db, users) = seeded();

    let err = users.scope("admins", &[]).expect_err("no definition yet");

    assert_eq!(
        err.message,
        "::admins for Class: User. To continue stub the method."
    );
}

#[test]
fn undeclared_scope_is_no_method() {
    let (_db, users) = seeded();

    let define = users
        .define_scope("recent", |r, _| Ok(r.clone()))
        .expect_err("undeclared scope cannot be defined");
    let call = users.scope("recent", &[]).expect_err("undeclared scope");
    let bare = Relation::new(Vec::new())
        .scope("admins", &[])
        .expect_err("bare relations have no scopes");

    assert_eq!(define.class, ErrorClass::NoMethod);
    assert_eq!(call.class, ErrorClass::NoMethod);
    assert_eq!(bare.message, "undefined method 'admins' for Relation");
}

// ----------------------------------------------------------------------
// Association proxies
// ----------------------------------------------------------------------

#[test]
fn has_many_build_merges_the_owner_binding() {
    let db = blog_db();
    let posts = db.class("Post").expect("Post should exist");
    let proxy = HasMany::new(Vec::new(), "user_id", 1_i64, &posts).expect("proxy should bind");

    let built = proxy
        .build(attrs! { "title" => "Name", "user_id" => 99 })
        .expect("build should succeed");

    assert_eq!(built.get("user_id").expect("declared"), Value::Int(1));
    assert_eq!(built.get("title").expect("declared"), Value::from("Name"));
    assert!(built.is_new_record());
    assert_eq!(proxy.first(), Some(built));
    assert_eq!(posts.count(), 0, "build never persists");
}

#[test]
fn has_many_writes_foreign_keys_on_the_initial_sequence_only() {
    let db = blog_db();
    let posts = db.class("Post").expect("Post should exist");
    let seeded = posts.create(attrs! { "title" => "a" }).expect("create should succeed");
    let pushed = posts.create(attrs! { "title" => "b" }).expect("create should succeed");

    let proxy = HasMany::new(
        vec![Value::from(&seeded)],
        "user_id",
        ForeignId::Fixed(Value::Int(5)),
        &posts,
    )
    .expect("proxy should bind");
    proxy.push(&pushed);
    proxy.push("raw");

    assert_eq!(seeded.get("user_id").expect("declared"), Value::Int(5));
    assert_eq!(pushed.get("user_id").expect("declared"), Value::Null);
    assert_eq!(proxy.count(), 3);
}

#[test]
fn has_many_create_persists_and_appends() {
    let db = blog_db();
    let users = db.class("User").expect("User should exist");
    let user = users.create(attrs! { "name" => "Ada" }).expect("create should succeed");

    let post = user
        .has_many("posts")
        .expect("posts is declared")
        .create(attrs! { "title" => "Hello" })
        .expect("create should succeed");

    assert!(post.is_persisted());
    assert_eq!(post.get("user_id").expect("declared"), user.id_value());
    assert_eq!(user.has_many("posts").expect("cached").count(), 1);
    assert_eq!(
        post.belongs_to("user").expect("user is declared"),
        Some(user)
    );
}

#[test]
fn has_many_is_seeded_from_the_target_store() {
    let db = blog_db();
    let users = db.class("User").expect("User should exist");
    let posts = db.class("Post").expect("Post should exist");
    let user = users.create(attrs! {}).expect("create should succeed");
    posts
        .create(attrs! { "title" => "mine", "user" => &user })
        .expect("create through belongs_to should succeed");
    posts
        .create(attrs! { "title" => "other" })
        .expect("create should succeed");

    let mine = user.has_many("posts").expect("posts is declared");

    assert_eq!(mine.count(), 1);
    assert_eq!(
        mine.first().and_then(|p| p.get("title").ok()),
        Some(Value::from("mine"))
    );
}

#[test]
fn has_many_delete_nulls_the_foreign_key() {
    let db = blog_db();
    let users = db.class("User").expect("User should exist");
    let user = users.create(attrs! {}).expect("create should succeed");
    let posts = user.has_many("posts").expect("posts is declared");
    let post = posts.create(attrs! {}).expect("create should succeed");

    assert!(posts.delete(&post).expect("delete should run"));

    assert_eq!(post.get("user_id").expect("declared"), Value::Null);
    assert!(post.is_persisted(), "the record itself stays stored");
    assert!(posts.is_empty());
}

#[test]
fn has_one_reassignment_detaches_the_previous_target() {
    let db = blog_db();
    let users = db.class("User").expect("User should exist");
    let user = users.create(attrs! {}).expect("create should succeed");
    let profile = user.has_one("profile").expect("profile is declared");

    let first = profile.create(attrs! { "bio" => "one" }).expect("create should succeed");
    let second = profile.create(attrs! { "bio" => "two" }).expect("create should succeed");

    assert_eq!(first.get("user_id").expect("declared"), Value::Null);
    assert_eq!(second.get("user_id").expect("declared"), user.id_value());
    assert_eq!(profile.get(), Some(second));
}

#[test]
fn association_kind_is_checked() {
    let db = blog_db();
    let users = db.class("User").expect("User should exist");
    let user = users.new_instance(attrs! {}).expect("build should succeed");

    let err = user.has_one("posts").expect_err("posts is has_many");

    assert_eq!(err.class, ErrorClass::Argument);
    assert_eq!(err.message, "association 'posts' on User is has_many, not has_one");
}

proptest! {
    #[test]
    fn where_eq_keeps_exactly_the_matching_records(ages in proptest::collection::vec(0i64..5, 0..20), wanted in 0i64..5) {
        let db = blog_db();
        let users = db.class("User").expect("User should exist");
        for age in &ages {
            users.create(attrs! { "age" => *age }).expect("create should succeed");
        }

        let hits = users.where_eq(&attrs! { "age" => wanted }).expect("where should run");
        let misses = users.where_not(&attrs! { "age" => wanted }).expect("where_not should run");

        let expected = ages.iter().filter(|a| **a == wanted).count();
        prop_assert_eq!(hits.len(), expected);
        prop_assert_eq!(hits.len() + misses.len(), ages.len());

        let mut ids: Vec<RecordId> = hits.ids();
        ids.extend(misses.ids());
        ids.sort_unstable();
        prop_assert_eq!(ids, users.ids());
    }
}
