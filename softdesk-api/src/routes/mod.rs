/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, token issuance/refresh, logout
/// - `projects`: Project CRUD
/// - `members`: Project membership management
/// - `issues`: Issues of a project
/// - `comments`: Comments of an issue
///
/// The path structs below are the typed form of each nested URL; handlers
/// turn them into a [`ParentChain`] and resolve it once per request.

use serde::Deserialize;
use softdesk_shared::scope::ParentChain;
use uuid::Uuid;

pub mod auth;
pub mod comments;
pub mod health;
pub mod issues;
pub mod members;
pub mod projects;

/// `/projects/:project_id`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ProjectPath {
    pub project_id: Uuid,
}

/// `/projects/:project_id/users/:user_id`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MemberPath {
    pub project_id: Uuid,
    pub user_id: Uuid,
}

/// `/projects/:project_id/issues/:issue_id`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IssuePath {
    pub project_id: Uuid,
    pub issue_id: Uuid,
}

/// `/projects/:project_id/issues/:issue_id/comments/:comment_id`
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CommentPath {
    pub project_id: Uuid,
    pub issue_id: Uuid,
    pub comment_id: Uuid,
}

impl ProjectPath {
    pub fn chain(&self) -> ParentChain {
        ParentChain::Project {
            project_id: self.project_id,
        }
    }
}

impl MemberPath {
    pub fn chain(&self) -> ParentChain {
        ParentChain::Project {
            project_id: self.project_id,
        }
    }
}

impl IssuePath {
    pub fn chain(&self) -> ParentChain {
        ParentChain::Issue {
            project_id: self.project_id,
            issue_id: self.issue_id,
        }
    }
}

impl CommentPath {
    pub fn chain(&self) -> ParentChain {
        ParentChain::Issue {
            project_id: self.project_id,
            issue_id: self.issue_id,
        }
    }
}
