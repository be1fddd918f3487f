use crate::db::MockDb;
use mockdb_schema::{
    node::{AssociationSpec, ClassDescriptor, MethodSignature, Schema},
    types::AttributeType,
};

///
/// blog_schema
///
/// Three related classes shared by the engine tests:
/// User has_many posts, has_one profile; Post and Profile belong to User.
///
pub(crate) fn blog_schema() -> Schema {
    let user = ClassDescriptor::new("User")
        .attribute("name", AttributeType::String)
        .attribute("email", AttributeType::String)
        .attribute("age", AttributeType::Integer)
        .attribute_with_default("admin", AttributeType::Boolean, false)
        .association(AssociationSpec::has_many("posts", "user_id", "Post").with_inverse("user"))
        .association(AssociationSpec::has_one("profile", "user_id", "Profile"))
        .instance_method(MethodSignature::new("full_name"))
        .instance_method(MethodSignature::new("greet").required("greeting"))
        .class_method(MethodSignature::new("fiz").required("arg"))
        .class_method(MethodSignature::new("search").required("query").optional("opts"))
        .scope(MethodSignature::new("admins"))
        .scope(MethodSignature::new("older_than").required("age"))
        .constant("ROLES", "admin,member");

    let post = ClassDescriptor::new("Post")
        .attribute("title", AttributeType::String)
        .attribute("user_id", AttributeType::Integer)
        .attribute_with_default("views", AttributeType::Integer, 0_i64)
        .attribute("rating", AttributeType::Float)
        .association(AssociationSpec::belongs_to("user", "user_id", "User"))
        .instance_method(MethodSignature::new("publish"))
        .scope(MethodSignature::new("popular"));

    let profile = ClassDescriptor::new("Profile")
        .attribute("bio", AttributeType::Text)
        .attribute("user_id", AttributeType::Integer)
        .association(AssociationSpec::belongs_to("user", "user_id", "User"));

    Schema::new()
        .with_class(user)
        .and_then(|s| s.with_class(post))
        .and_then(|s| s.with_class(profile))
        .expect("blog schema should assemble")
}

pub(crate) fn blog_db() -> MockDb {
    MockDb::new(blog_schema()).expect("blog schema should validate")
}
