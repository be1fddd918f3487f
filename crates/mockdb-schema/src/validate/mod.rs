mod association;
mod naming;

use crate::{node::Schema, prelude::*};

// Run every validation pass and collect failures per class.
pub(crate) fn validate_schema(schema: &Schema) -> Result<(), ErrorTree> {
    let mut errs = ErrorTree::new();

    for class in schema.classes() {
        let mut class_errs = ErrorTree::new();

        naming::validate_class_naming(class, &mut class_errs);
        validate_defaults(class, &mut class_errs);
        association::validate_associations(schema, class, &mut class_errs);

        errs.add_child(class.name.clone(), class_errs);
    }

    errs.result()
}

// Column defaults must fit the declared column type.
fn validate_defaults(class: &ClassDescriptor, errs: &mut ErrorTree) {
    for attribute in &class.attributes {
        let Some(default) = &attribute.default else {
            continue;
        };

        if !attribute.ty.accepts(default) {
            err!(
                errs,
                "default {default:?} does not fit {} column '{}'",
                attribute.ty,
                attribute.name
            );
        }
    }
}
