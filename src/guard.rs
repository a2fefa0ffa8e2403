//! Route guard
//!
//! Every CLI command corresponds to a route. Before a command runs, the
//! guard checks the session: protected routes need a live credential, some
//! also need a role.

use std::fmt;

use tracing::debug;

use crate::error::{Result, TaskflowError};
use crate::model::Role;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Verify,
    MagicLink,
    PasswordRecovery,
    Projects,
    ProjectDetails,
    CreateProject,
    ProjectMembers,
    Tasks,
    CreateTask,
    TaskDetails,
    TaskMembers,
    TaskFiles,
    Workflow,
    EditWorkflow,
    Notifications,
    Profile,
}

impl Route {
    pub fn is_public(self) -> bool {
        matches!(
            self,
            Route::Login | Route::Register | Route::Verify | Route::MagicLink | Route::PasswordRecovery
        )
    }

    /// Roles of which the user needs at least one; empty = any logged-in user
    pub fn required_roles(self) -> &'static [Role] {
        const MANAGER: &[Role] = &[Role::Manager];
        match self {
            Route::CreateProject
            | Route::ProjectMembers
            | Route::TaskMembers
            | Route::EditWorkflow => MANAGER,
            _ => &[],
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::Verify => "/verify",
            Route::MagicLink => "/magic-link",
            Route::PasswordRecovery => "/recover",
            Route::Projects => "/all-projects",
            Route::ProjectDetails => "/all-projects/:id",
            Route::CreateProject => "/add-project",
            Route::ProjectMembers => "/all-projects/:id/add-member",
            Route::Tasks => "/tasks/:projectId",
            Route::CreateTask => "/tasks/create/:projectId",
            Route::TaskDetails => "/task-details/:id",
            Route::TaskMembers => "/task-add-member/:taskId",
            Route::TaskFiles => "/task-files/:id",
            Route::Workflow => "/workflow/:projectId",
            Route::EditWorkflow => "/workflow/:projectId/edit",
            Route::Notifications => "/notifications",
            Route::Profile => "/profile",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToLogin,
    Unauthorized { required: Vec<Role> },
}

impl GuardDecision {
    pub fn into_result(self) -> Result<()> {
        match self {
            GuardDecision::Allow => Ok(()),
            GuardDecision::RedirectToLogin => Err(TaskflowError::NotLoggedIn),
            GuardDecision::Unauthorized { required } => Err(TaskflowError::AccessDenied {
                required: required.iter().map(|r| r.to_string()).collect(),
            }),
        }
    }
}

pub struct RouteGuard;

impl RouteGuard {
    pub fn check(session: &Session, route: Route) -> GuardDecision {
        if route.is_public() {
            return GuardDecision::Allow;
        }

        let Some(claims) = session.claims() else {
            debug!(route = %route, "no credential, redirecting to login");
            return GuardDecision::RedirectToLogin;
        };

        let required = route.required_roles();
        if required.is_empty() || required.iter().any(|r| claims.has_role(r)) {
            GuardDecision::Allow
        } else {
            debug!(route = %route, role = ?claims.role, "role not permitted");
            GuardDecision::Unauthorized {
                required: required.to_vec(),
            }
        }
    }

    /// `check` as a `Result`, for `?` at command entry
    pub fn enforce(session: &Session, route: Route) -> Result<()> {
        Self::check(session, route).into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::make_token;
    use serde_json::json;

    fn session_with(role: &str) -> Session {
        let mut session = Session::in_memory();
        session
            .login(&make_token(json!({"username": "ana", "user_role": role})))
            .unwrap();
        session
    }

    #[test]
    fn test_public_routes_allow_anonymous() {
        let session = Session::in_memory();
        assert_eq!(RouteGuard::check(&session, Route::Login), GuardDecision::Allow);
        assert_eq!(RouteGuard::check(&session, Route::MagicLink), GuardDecision::Allow);
    }

    #[test]
    fn test_protected_route_redirects_anonymous() {
        let session = Session::in_memory();
        assert_eq!(
            RouteGuard::check(&session, Route::Projects),
            GuardDecision::RedirectToLogin
        );
        assert!(matches!(
            RouteGuard::enforce(&session, Route::Projects),
            Err(TaskflowError::NotLoggedIn)
        ));
    }

    #[test]
    fn test_manager_only_routes() {
        let user = session_with("User");
        let manager = session_with("ROLE_MANAGER");

        assert_eq!(RouteGuard::check(&user, Route::Projects), GuardDecision::Allow);
        assert_eq!(
            RouteGuard::check(&user, Route::CreateProject),
            GuardDecision::Unauthorized {
                required: vec![Role::Manager]
            }
        );
        assert_eq!(RouteGuard::check(&manager, Route::CreateProject), GuardDecision::Allow);
    }

    #[test]
    fn test_missing_role_claim_is_unauthorized_for_role_routes() {
        let mut session = Session::in_memory();
        session.login(&make_token(json!({"username": "ana"}))).unwrap();
        assert_eq!(RouteGuard::check(&session, Route::Tasks), GuardDecision::Allow);
        assert!(matches!(
            RouteGuard::enforce(&session, Route::EditWorkflow),
            Err(TaskflowError::AccessDenied { .. })
        ));
    }
}
