// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

enum Animal {
    Cat,
    Dog(bool),
}

crate::simple_display! {
    Animal {
        Cat => "cat",
        Dog(..) => "dog",
    }
}

#[test]
fn simple_display_maps_variants() {
    assert_eq!(Animal::Cat.to_string(), "cat");
    assert_eq!(Animal::Dog(true).to_string(), "dog");
}

struct Widget {
    name: String,
    label: Option<String>,
}

impl Widget {
    fn new() -> Self {
        Self { name: String::new(), label: None }
    }

    crate::setters! {
        into { name: String }
        option { label: String }
    }
}

#[test]
fn setters_chain() {
    let w = Widget::new().name("thing").label("tag");
    assert_eq!(w.name, "thing");
    assert_eq!(w.label.as_deref(), Some("tag"));
}
