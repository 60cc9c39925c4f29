/// Nested resource scoping
///
/// Every route below `/projects` is addressed through a chain of parent
/// ids taken from the path:
///
/// ```text
/// /projects                                  Root
/// /projects/{p}/issues, /projects/{p}        Project { p }
/// /projects/{p}/issues/{i}/comments          Issue { p, i }
/// ```
///
/// [`ParentChain::resolve`] walks the chain top-down:
///
/// 1. load the project (404 if missing)
/// 2. run the collection-level policy check (403 for non-contributors)
/// 3. load the issue and verify it belongs to the project (404 otherwise)
///
/// Deeper segments are only looked at after the caller passed the
/// membership gate, so outsiders cannot discover issue or comment ids.
///
/// # Example
///
/// ```no_run
/// use softdesk_shared::auth::authorization::Action;
/// use softdesk_shared::scope::ParentChain;
/// use softdesk_shared::store::{MemoryStore, Store};
/// use uuid::Uuid;
///
/// # async fn example(project_id: Uuid, user_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
///
/// let scope = ParentChain::Project { project_id }
///     .resolve(&store, user_id, Action::List)
///     .await?;
///
/// if let Some(project) = scope.project() {
///     let issues = store.list_issues(project.id).await?;
///     println!("{} issues in {}", issues.len(), project.title);
/// }
/// # Ok(())
/// # }
/// ```

use uuid::Uuid;

use crate::auth::authorization::{authorize, Action, Authored, AuthzError, ProjectAccess};
use crate::models::comment::Comment;
use crate::models::issue::Issue;
use crate::models::project::Project;
use crate::store::{Store, StoreError};

/// Error type for scope resolution
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// A path segment does not exist, or exists under another parent
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The caller failed the policy check
    #[error(transparent)]
    Forbidden(#[from] AuthzError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Typed parent ids of a request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentChain {
    /// The top-level project collection
    Root,

    /// Inside one project
    Project { project_id: Uuid },

    /// Inside one issue of one project
    Issue { project_id: Uuid, issue_id: Uuid },
}

/// A project with the membership facts needed by the policy
#[derive(Debug, Clone)]
pub struct ScopedProject {
    pub project: Project,
    pub access: ProjectAccess,
}

/// A fully resolved and gate-checked parent chain
#[derive(Debug, Clone)]
pub enum ResolvedScope {
    Root,
    Project(ScopedProject),
    Issue { project: ScopedProject, issue: Issue },
}

impl ParentChain {
    /// Resolves the chain for `user_id` about to perform `action`
    ///
    /// # Errors
    ///
    /// - [`ScopeError::NotFound`] when a segment is missing or mismatched
    /// - [`ScopeError::Forbidden`] when the caller is neither author nor
    ///   member of the owning project
    pub async fn resolve(
        &self,
        store: &dyn Store,
        user_id: Uuid,
        action: Action,
    ) -> Result<ResolvedScope, ScopeError> {
        match *self {
            ParentChain::Root => {
                authorize(user_id, action, None, None)?;
                Ok(ResolvedScope::Root)
            }
            ParentChain::Project { project_id } => {
                let project = resolve_project(store, project_id, user_id, action).await?;
                Ok(ResolvedScope::Project(project))
            }
            ParentChain::Issue {
                project_id,
                issue_id,
            } => {
                let project = resolve_project(store, project_id, user_id, action).await?;

                let issue = store
                    .find_issue(issue_id)
                    .await?
                    .filter(|issue| issue.project_id == project_id)
                    .ok_or(ScopeError::NotFound("Issue"))?;

                Ok(ResolvedScope::Issue { project, issue })
            }
        }
    }
}

async fn resolve_project(
    store: &dyn Store,
    project_id: Uuid,
    user_id: Uuid,
    action: Action,
) -> Result<ScopedProject, ScopeError> {
    let project = store
        .find_project(project_id)
        .await?
        .ok_or(ScopeError::NotFound("Project"))?;

    let member_ids = store.member_ids(project_id).await?;
    let access = ProjectAccess::from_project(&project, member_ids);

    if let Err(e) = authorize(user_id, action, Some(&access), None) {
        tracing::warn!(
            user_id = %user_id,
            project_id = %project_id,
            "Access denied: not a contributor"
        );
        return Err(e.into());
    }

    Ok(ScopedProject { project, access })
}

impl ResolvedScope {
    /// Owning project's policy facts, `None` at the root
    pub fn access(&self) -> Option<&ProjectAccess> {
        match self {
            ResolvedScope::Root => None,
            ResolvedScope::Project(scoped) => Some(&scoped.access),
            ResolvedScope::Issue { project, .. } => Some(&project.access),
        }
    }

    pub fn project(&self) -> Option<&Project> {
        match self {
            ResolvedScope::Root => None,
            ResolvedScope::Project(scoped) => Some(&scoped.project),
            ResolvedScope::Issue { project, .. } => Some(&project.project),
        }
    }

    pub fn project_id(&self) -> Option<Uuid> {
        self.project().map(|p| p.id)
    }

    pub fn issue(&self) -> Option<&Issue> {
        match self {
            ResolvedScope::Issue { issue, .. } => Some(issue),
            _ => None,
        }
    }

    /// Like [`project`](Self::project), but a missing project is an error
    pub fn require_project(&self) -> Result<&Project, ScopeError> {
        self.project().ok_or(ScopeError::NotFound("Project"))
    }

    pub fn require_issue(&self) -> Result<&Issue, ScopeError> {
        self.issue().ok_or(ScopeError::NotFound("Issue"))
    }

    /// Loads a comment that must belong to this scope's issue
    ///
    /// # Errors
    ///
    /// [`ScopeError::NotFound`] if the comment does not exist, belongs to
    /// another issue, or this scope has no issue.
    pub async fn find_comment(
        &self,
        store: &dyn Store,
        comment_id: Uuid,
    ) -> Result<Comment, ScopeError> {
        let issue = self.require_issue()?;

        store
            .find_comment(comment_id)
            .await?
            .filter(|comment| comment.issue_id == issue.id)
            .ok_or(ScopeError::NotFound("Comment"))
    }

    /// Instance-level check against an object of this scope
    pub fn authorize_object(
        &self,
        user_id: Uuid,
        action: Action,
        object: &dyn Authored,
    ) -> Result<(), AuthzError> {
        authorize(user_id, action, self.access(), Some(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::comment::CreateComment;
    use crate::models::issue::{CreateIssue, IssuePriority, IssueStatus, IssueTag};
    use crate::models::project::{CreateProject, ProjectType};
    use crate::models::user::{CreateUser, User};
    use crate::store::MemoryStore;

    async fn user(store: &MemoryStore, name: &str) -> User {
        store
            .create_user(CreateUser {
                email: format!("{name}@example.com"),
                username: name.to_string(),
                first_name: String::new(),
                last_name: String::new(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap()
    }

    async fn project(store: &MemoryStore, author: Uuid) -> Project {
        store
            .create_project(CreateProject {
                title: "Website".to_string(),
                description: String::new(),
                project_type: ProjectType::Backend,
                author_user_id: author,
            })
            .await
            .unwrap()
    }

    async fn issue(store: &MemoryStore, project_id: Uuid, author: Uuid) -> Issue {
        store
            .create_issue(CreateIssue {
                title: "Fix login".to_string(),
                description: String::new(),
                tag: IssueTag::Bug,
                priority: IssuePriority::High,
                status: IssueStatus::Todo,
                project_id,
                author_user_id: author,
                assignee_user_id: author,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;

        let result = ParentChain::Project {
            project_id: Uuid::new_v4(),
        }
        .resolve(&store, alice.id, Action::List)
        .await;

        assert!(matches!(result, Err(ScopeError::NotFound("Project"))));
    }

    #[tokio::test]
    async fn test_non_contributor_is_forbidden_before_issue_lookup() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let carol = user(&store, "carol").await;
        let website = project(&store, alice.id).await;

        // The issue id does not even exist; the membership gate answers first
        let result = ParentChain::Issue {
            project_id: website.id,
            issue_id: Uuid::new_v4(),
        }
        .resolve(&store, carol.id, Action::List)
        .await;

        assert!(matches!(
            result,
            Err(ScopeError::Forbidden(AuthzError::NotMember { .. }))
        ));
    }

    #[tokio::test]
    async fn test_issue_under_wrong_project_is_not_found() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let website = project(&store, alice.id).await;
        let mobile = project(&store, alice.id).await;
        let bug = issue(&store, mobile.id, alice.id).await;

        let result = ParentChain::Issue {
            project_id: website.id,
            issue_id: bug.id,
        }
        .resolve(&store, alice.id, Action::List)
        .await;

        assert!(matches!(result, Err(ScopeError::NotFound("Issue"))));
    }

    #[tokio::test]
    async fn test_member_resolves_issue_scope() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let bob = user(&store, "bob").await;
        let website = project(&store, alice.id).await;
        store.add_member(website.id, bob.id).await.unwrap();
        let bug = issue(&store, website.id, alice.id).await;

        let scope = ParentChain::Issue {
            project_id: website.id,
            issue_id: bug.id,
        }
        .resolve(&store, bob.id, Action::List)
        .await
        .unwrap();

        assert_eq!(scope.project_id(), Some(website.id));
        assert_eq!(scope.issue().map(|i| i.id), Some(bug.id));
        assert!(scope.access().unwrap().is_member(bob.id));

        // Bob can read Alice's issue but not delete it
        assert!(scope.authorize_object(bob.id, Action::Retrieve, &bug).is_ok());
        assert_eq!(
            scope.authorize_object(bob.id, Action::Delete, &bug),
            Err(AuthzError::NotAuthor)
        );
    }

    #[tokio::test]
    async fn test_comment_must_belong_to_scope_issue() {
        let store = MemoryStore::new();
        let alice = user(&store, "alice").await;
        let website = project(&store, alice.id).await;
        let first = issue(&store, website.id, alice.id).await;
        let second = issue(&store, website.id, alice.id).await;

        let comment = store
            .create_comment(CreateComment {
                description: "Repro attached".to_string(),
                issue_id: second.id,
                author_user_id: alice.id,
            })
            .await
            .unwrap();

        let scope = ParentChain::Issue {
            project_id: website.id,
            issue_id: first.id,
        }
        .resolve(&store, alice.id, Action::Retrieve)
        .await
        .unwrap();

        assert!(matches!(
            scope.find_comment(&store, comment.id).await,
            Err(ScopeError::NotFound("Comment"))
        ));
    }

    #[tokio::test]
    async fn test_root_resolves_for_anyone() {
        let store = MemoryStore::new();

        let scope = ParentChain::Root
            .resolve(&store, Uuid::new_v4(), Action::Create)
            .await
            .unwrap();

        assert!(scope.access().is_none());
        assert!(scope.project_id().is_none());
        assert!(matches!(
            scope.require_project(),
            Err(ScopeError::NotFound("Project"))
        ));
    }
}
