//! The application's forms

use once_cell::sync::Lazy;
use regex::Regex;

use super::{CrossRule, FieldSpec, FormSpec, Rule};

/// Task node ids: start with a letter or digit, then alphanumerics, `-`, `_`
static NODE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("node id regex is valid"));

pub fn register() -> FormSpec {
    use Rule::*;
    FormSpec {
        name: "register",
        fields: vec![
            FieldSpec::new("firstname", vec![Required, MinLength(2)]),
            FieldSpec::new("lastname", vec![Required, MinLength(2)]),
            FieldSpec::new("username", vec![Required, MinLength(4)]),
            FieldSpec::new("email", vec![Required, Email]),
            FieldSpec::new("password", vec![Required, MinLength(8), StrongPassword]),
            FieldSpec::new("repeat_password", vec![Required]),
            FieldSpec::new("role", vec![Required]),
        ],
        cross: vec![CrossRule::FieldsMatch("password", "repeat_password")],
    }
}

pub fn login() -> FormSpec {
    use Rule::*;
    FormSpec {
        name: "login",
        fields: vec![
            FieldSpec::new("username", vec![Required, MinLength(4)]),
            FieldSpec::new("password", vec![Required, MinLength(4)]),
        ],
        cross: vec![],
    }
}

pub fn verify() -> FormSpec {
    use Rule::*;
    FormSpec {
        name: "verify",
        fields: vec![
            FieldSpec::new("username", vec![Required]),
            FieldSpec::new("code", vec![Required, MinLength(6), MaxLength(6)]),
        ],
        cross: vec![],
    }
}

pub fn recovery_request() -> FormSpec {
    FormSpec {
        name: "recovery request",
        fields: vec![FieldSpec::new("email", vec![Rule::Required, Rule::Email])],
        cross: vec![],
    }
}

pub fn password_recovery() -> FormSpec {
    use Rule::*;
    FormSpec {
        name: "password recovery",
        fields: vec![
            FieldSpec::new("username", vec![Required]),
            FieldSpec::new("new_password", vec![Required, MinLength(8), StrongPassword]),
            FieldSpec::new("confirm_new_password", vec![Required]),
        ],
        cross: vec![CrossRule::FieldsMatch("new_password", "confirm_new_password")],
    }
}

pub fn change_password() -> FormSpec {
    use Rule::*;
    FormSpec {
        name: "change password",
        fields: vec![
            FieldSpec::new("current_password", vec![Required]),
            FieldSpec::new("new_password", vec![Required, MinLength(8), StrongPassword]),
            FieldSpec::new("confirm_new_password", vec![Required]),
        ],
        cross: vec![CrossRule::FieldsMatch("new_password", "confirm_new_password")],
    }
}

pub fn project_create() -> FormSpec {
    use Rule::*;
    FormSpec {
        name: "project",
        fields: vec![
            FieldSpec::new("name", vec![Required, MinLength(3)]),
            FieldSpec::new("completion_date", vec![Required, FutureDate]),
            FieldSpec::new("min_members", vec![Required, MinValue(1.0)]),
            FieldSpec::new("max_members", vec![Required, MinValue(1.0)]),
        ],
        cross: vec![CrossRule::GreaterThan("max_members", "min_members")],
    }
}

pub fn task_create() -> FormSpec {
    use Rule::*;
    FormSpec {
        name: "task",
        fields: vec![
            FieldSpec::new("name", vec![Required, MinLength(3)]),
            FieldSpec::new("description", vec![Required, MinLength(10)]),
        ],
        cross: vec![],
    }
}

pub fn add_member() -> FormSpec {
    FormSpec {
        name: "member",
        fields: vec![FieldSpec::new("username", vec![Rule::Required, Rule::MinLength(3)])],
        cross: vec![],
    }
}

pub fn workflow_task() -> FormSpec {
    FormSpec {
        name: "workflow task",
        fields: vec![
            FieldSpec::new(
                "id",
                vec![
                    Rule::Required,
                    Rule::Pattern {
                        name: "task id",
                        regex: &NODE_ID,
                    },
                ],
            ),
            FieldSpec::new("name", vec![Rule::Required]),
        ],
        cross: vec![],
    }
}
