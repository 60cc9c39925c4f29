/// Project-scoped access policy
///
/// A single policy governs projects, issues and comments. It answers two
/// questions:
///
/// 1. **Collection level**, before any object is loaded: may the caller
///    act inside this project at all? Yes iff the caller is the project's
///    author or one of its members. The root project collection has no
///    owning project and is open to every authenticated user.
/// 2. **Instance level**, on a loaded object: safe actions (list,
///    retrieve) need nothing beyond the collection check. Writes (update,
///    partial update, delete) need the caller to be the object's author;
///    membership is not enough.
///
/// # Example
///
/// ```
/// use softdesk_shared::auth::authorization::{authorize, Action, ProjectAccess, AuthzError};
/// use uuid::Uuid;
///
/// let author = Uuid::new_v4();
/// let member = Uuid::new_v4();
/// let outsider = Uuid::new_v4();
/// let access = ProjectAccess::new(Uuid::new_v4(), author, vec![member]);
///
/// // Any member may list the project's issues
/// assert!(authorize(member, Action::List, Some(&access), None).is_ok());
///
/// // Outsiders are turned away before anything is loaded
/// assert!(matches!(
///     authorize(outsider, Action::List, Some(&access), None),
///     Err(AuthzError::NotMember { .. })
/// ));
///
/// // Only the author may modify the project itself
/// assert!(authorize(member, Action::Delete, Some(&access), Some(&access)).is_err());
/// assert!(authorize(author, Action::Delete, Some(&access), Some(&access)).is_ok());
/// ```

use axum::http::Method;
use uuid::Uuid;

use crate::models::comment::Comment;
use crate::models::issue::Issue;
use crate::models::project::Project;

/// Error type for authorization checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// Caller is neither author nor member of the owning project
    #[error("Not a member of project {project_id}")]
    NotMember { project_id: Uuid },

    /// Caller may read the object but did not author it
    #[error("Only the author can modify this resource")]
    NotAuthor,
}

/// What a request does to a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Create,
    Retrieve,
    Update,
    PartialUpdate,
    Delete,
}

impl Action {
    /// Read-only actions
    pub fn is_safe(&self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }

    /// Classifies an HTTP method
    ///
    /// `on_instance` tells a collection route (`/issues`) from an instance
    /// route (`/issues/{id}`). `HEAD` and `OPTIONS` read like `GET`.
    /// Returns `None` for methods with no meaning on these resources.
    pub fn from_method(method: &Method, on_instance: bool) -> Option<Self> {
        let action = match (method.as_str(), on_instance) {
            ("GET" | "HEAD" | "OPTIONS", false) => Action::List,
            ("GET" | "HEAD" | "OPTIONS", true) => Action::Retrieve,
            ("POST", false) => Action::Create,
            ("PUT", true) => Action::Update,
            ("PATCH", true) => Action::PartialUpdate,
            ("DELETE", true) => Action::Delete,
            _ => return None,
        };

        Some(action)
    }
}

/// Anything with a single, fixed author
pub trait Authored {
    fn author_user_id(&self) -> Uuid;
}

impl Authored for Project {
    fn author_user_id(&self) -> Uuid {
        self.author_user_id
    }
}

impl Authored for Issue {
    fn author_user_id(&self) -> Uuid {
        self.author_user_id
    }
}

impl Authored for Comment {
    fn author_user_id(&self) -> Uuid {
        self.author_user_id
    }
}

/// The facts about a project the policy needs: who wrote it, who may see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectAccess {
    pub project_id: Uuid,
    pub author_user_id: Uuid,
    pub member_ids: Vec<Uuid>,
}

impl ProjectAccess {
    pub fn new(project_id: Uuid, author_user_id: Uuid, member_ids: Vec<Uuid>) -> Self {
        Self {
            project_id,
            author_user_id,
            member_ids,
        }
    }

    pub fn from_project(project: &Project, member_ids: Vec<Uuid>) -> Self {
        Self::new(project.id, project.author_user_id, member_ids)
    }

    pub fn is_author(&self, user_id: Uuid) -> bool {
        self.author_user_id == user_id
    }

    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.member_ids.contains(&user_id)
    }

    /// Author or member
    pub fn is_contributor(&self, user_id: Uuid) -> bool {
        self.is_author(user_id) || self.is_member(user_id)
    }
}

impl Authored for ProjectAccess {
    fn author_user_id(&self) -> Uuid {
        self.author_user_id
    }
}

/// Decides whether `user_id` may perform `action`
///
/// - `owner`: the resolved owning project, `None` for the root project
///   collection
/// - `object`: the loaded target, `None` for collection-level checks
///
/// # Errors
///
/// - [`AuthzError::NotMember`] when the collection check fails
/// - [`AuthzError::NotAuthor`] when a non-author attempts a write on `object`
pub fn authorize(
    user_id: Uuid,
    action: Action,
    owner: Option<&ProjectAccess>,
    object: Option<&dyn Authored>,
) -> Result<(), AuthzError> {
    if let Some(project) = owner {
        if !project.is_contributor(user_id) {
            return Err(AuthzError::NotMember {
                project_id: project.project_id,
            });
        }
    }

    match object {
        Some(object) if !action.is_safe() && object.author_user_id() != user_id => {
            Err(AuthzError::NotAuthor)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Note {
        author: Uuid,
    }

    impl Authored for Note {
        fn author_user_id(&self) -> Uuid {
            self.author
        }
    }

    fn fixture() -> (Uuid, Uuid, Uuid, ProjectAccess) {
        let author = Uuid::new_v4();
        let member = Uuid::new_v4();
        let outsider = Uuid::new_v4();
        let access = ProjectAccess::new(Uuid::new_v4(), author, vec![member]);
        (author, member, outsider, access)
    }

    #[test]
    fn test_root_collection_is_open() {
        let anyone = Uuid::new_v4();

        assert!(authorize(anyone, Action::List, None, None).is_ok());
        assert!(authorize(anyone, Action::Create, None, None).is_ok());
    }

    #[test]
    fn test_collection_check_requires_contributor() {
        let (author, member, outsider, access) = fixture();

        for action in [Action::List, Action::Create] {
            assert!(authorize(author, action, Some(&access), None).is_ok());
            assert!(authorize(member, action, Some(&access), None).is_ok());
            assert_eq!(
                authorize(outsider, action, Some(&access), None),
                Err(AuthzError::NotMember {
                    project_id: access.project_id
                })
            );
        }
    }

    #[test]
    fn test_outsider_cannot_read_even_own_object() {
        let (_, _, outsider, access) = fixture();
        let note = Note { author: outsider };

        assert!(matches!(
            authorize(outsider, Action::Retrieve, Some(&access), Some(&note)),
            Err(AuthzError::NotMember { .. })
        ));
    }

    #[test]
    fn test_members_read_but_only_authors_write() {
        let (author, member, _, access) = fixture();
        let note = Note { author };

        assert!(authorize(member, Action::Retrieve, Some(&access), Some(&note)).is_ok());

        for action in [Action::Update, Action::PartialUpdate, Action::Delete] {
            assert_eq!(
                authorize(member, action, Some(&access), Some(&note)),
                Err(AuthzError::NotAuthor)
            );
            assert!(authorize(author, action, Some(&access), Some(&note)).is_ok());
        }
    }

    #[test]
    fn test_member_authored_object_is_writable_by_that_member() {
        let (author, member, _, access) = fixture();
        let note = Note { author: member };

        assert!(authorize(member, Action::Delete, Some(&access), Some(&note)).is_ok());
        assert_eq!(
            authorize(author, Action::Delete, Some(&access), Some(&note)),
            Err(AuthzError::NotAuthor)
        );
    }

    #[test]
    fn test_author_need_not_be_member() {
        let author = Uuid::new_v4();
        let access = ProjectAccess::new(Uuid::new_v4(), author, Vec::new());

        assert!(access.is_contributor(author));
        assert!(!access.is_member(author));
    }

    #[test]
    fn test_action_from_method() {
        assert_eq!(Action::from_method(&Method::GET, false), Some(Action::List));
        assert_eq!(Action::from_method(&Method::GET, true), Some(Action::Retrieve));
        assert_eq!(Action::from_method(&Method::HEAD, true), Some(Action::Retrieve));
        assert_eq!(Action::from_method(&Method::POST, false), Some(Action::Create));
        assert_eq!(Action::from_method(&Method::PUT, true), Some(Action::Update));
        assert_eq!(Action::from_method(&Method::PATCH, true), Some(Action::PartialUpdate));
        assert_eq!(Action::from_method(&Method::DELETE, true), Some(Action::Delete));
        assert_eq!(Action::from_method(&Method::POST, true), None);
        assert_eq!(Action::from_method(&Method::DELETE, false), None);
    }

    #[test]
    fn test_safe_actions() {
        assert!(Action::List.is_safe());
        assert!(Action::Retrieve.is_safe());
        assert!(!Action::Create.is_safe());
        assert!(!Action::Update.is_safe());
        assert!(!Action::PartialUpdate.is_safe());
        assert!(!Action::Delete.is_safe());
    }
}
