use crate::{MAX_CLASS_NAME_LEN, MAX_MEMBER_NAME_LEN, prelude::*};
use std::collections::BTreeSet;

pub fn validate_class_naming(class: &ClassDescriptor, errs: &mut ErrorTree) {
    let name = class.name.as_str();
    if name.is_empty() {
        err!(errs, "class name must not be empty");
    } else if name.len() > MAX_CLASS_NAME_LEN {
        err!(
            errs,
            "class name '{name}' exceeds {MAX_CLASS_NAME_LEN} characters"
        );
    } else if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
        err!(errs, "class name '{name}' must start with an uppercase letter");
    }

    // attributes and associations share one mass-assignment namespace
    let mut members = BTreeSet::new();
    for attribute in &class.attributes {
        check_member_name("attribute", &attribute.name, errs);
        if !members.insert(attribute.name.as_str()) {
            err!(errs, "duplicate attribute '{}'", attribute.name);
        }
    }
    for association in &class.associations {
        check_member_name("association", &association.name, errs);
        if !members.insert(association.name.as_str()) {
            err!(
                errs,
                "association '{}' collides with another attribute or association",
                association.name
            );
        }
    }

    check_unique_methods("scope", &class.scopes, errs);
    check_unique_methods("instance method", &class.instance_methods, errs);
    check_unique_methods("class method", &class.class_methods, errs);

    // scopes are reached through the class surface too
    for scope in &class.scopes {
        if class.get_class_method(&scope.name).is_some() {
            err!(errs, "scope '{}' shadows a class method", scope.name);
        }
    }
}

fn check_member_name(label: &str, name: &str, errs: &mut ErrorTree) {
    if name.is_empty() {
        err!(errs, "{label} name must not be empty");
    } else if name.len() > MAX_MEMBER_NAME_LEN {
        err!(
            errs,
            "{label} name '{name}' exceeds {MAX_MEMBER_NAME_LEN} characters"
        );
    }
}

fn check_unique_methods(label: &str, methods: &[MethodSignature], errs: &mut ErrorTree) {
    let mut seen = BTreeSet::new();
    for method in methods {
        check_member_name(label, &method.name, errs);
        if !seen.insert(method.name.as_str()) {
            err!(errs, "duplicate {label} '{}'", method.name);
        }
    }
}
