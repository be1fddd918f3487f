use crate::{node::Schema, prelude::*};

// Resolve association targets and foreign-key columns against the schema.
pub fn validate_associations(schema: &Schema, class: &ClassDescriptor, errs: &mut ErrorTree) {
    for association in &class.associations {
        let Some(target) = schema.get(&association.class_name) else {
            err!(
                errs,
                "association '{}' targets unknown class '{}'",
                association.name,
                association.class_name
            );
            continue;
        };

        // Phase 1: the foreign key column must exist where the kind puts it.
        let (key_owner, key_class) = if association.kind.key_on_target() {
            (target, target.name.as_str())
        } else {
            (class, class.name.as_str())
        };
        if !key_owner.has_attribute(&association.foreign_key) {
            err!(
                errs,
                "{} '{}' expects foreign key '{}' on class '{key_class}'",
                association.kind,
                association.name,
                association.foreign_key
            );
        }

        // Phase 2: an inverse must name an association declared on the target.
        if let Some(inverse) = &association.inverse_of
            && target.get_association(inverse).is_none()
        {
            err!(
                errs,
                "association '{}' names inverse '{inverse}' which '{}' does not declare",
                association.name,
                target.name
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(schema: &Schema, class: &str) -> Vec<String> {
        let mut errs = ErrorTree::new();
        let class = schema.try_get(class).expect("class should exist");
        validate_associations(schema, class, &mut errs);
        errs.flatten()
    }

    #[test]
    fn has_many_requires_key_on_target() {
        let schema = Schema::new()
            .with_class(
                ClassDescriptor::new("User")
                    .association(AssociationSpec::has_many("posts", "user_id", "Post")),
            )
            .and_then(|s| s.with_class(ClassDescriptor::new("Post")))
            .expect("classes should register");

        assert_eq!(
            run(&schema, "User"),
            vec!["has_many 'posts' expects foreign key 'user_id' on class 'Post'".to_string()]
        );
    }

    #[test]
    fn belongs_to_requires_key_on_owner() {
        let schema = Schema::new()
            .with_class(
                ClassDescriptor::new("Post")
                    .association(AssociationSpec::belongs_to("user", "user_id", "User")),
            )
            .and_then(|s| s.with_class(ClassDescriptor::new("User")))
            .expect("classes should register");

        assert_eq!(
            run(&schema, "Post"),
            vec!["belongs_to 'user' expects foreign key 'user_id' on class 'Post'".to_string()]
        );
    }

    #[test]
    fn unknown_inverse_is_reported() {
        let schema = Schema::new()
            .with_class(
                ClassDescriptor::new("User").association(
                    AssociationSpec::has_one("profile", "user_id", "Profile")
                        .with_inverse("owner"),
                ),
            )
            .and_then(|s| {
                s.with_class(
                    ClassDescriptor::new("Profile").attribute("user_id", AttributeType::Integer),
                )
            })
            .expect("classes should register");

        assert_eq!(
            run(&schema, "User"),
            vec![
                "association 'profile' names inverse 'owner' which 'Profile' does not declare"
                    .to_string()
            ]
        );
    }
}
