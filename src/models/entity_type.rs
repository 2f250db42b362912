//! The fixed set of Targetprocess resources this server talks to.

use std::fmt;
use std::str::FromStr;

use crate::error::TpError;

/// A Targetprocess resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    /// User story.
    UserStory,
    /// Task, usually belonging to a user story.
    Task,
    /// Bug.
    Bug,
    /// Project.
    Project,
    /// Iteration (sprint).
    Iteration,
    /// Comment attached to any general entity.
    Comment,
    /// Workflow state.
    EntityState,
    /// Any user (regular user or requester).
    GeneralUser,
    /// Link between a user and an assignable work item.
    Assignment,
}

impl EntityType {
    /// Every resource type.
    pub const ALL: [EntityType; 9] = [
        EntityType::UserStory,
        EntityType::Task,
        EntityType::Bug,
        EntityType::Project,
        EntityType::Iteration,
        EntityType::Comment,
        EntityType::EntityState,
        EntityType::GeneralUser,
        EntityType::Assignment,
    ];

    /// Work item types searched and assigned by default.
    pub const WORK_ITEMS: [EntityType; 3] =
        [EntityType::UserStory, EntityType::Task, EntityType::Bug];

    /// Singular type name, as used in `EntityType.Name` and `ResourceType`.
    pub fn name(self) -> &'static str {
        match self {
            EntityType::UserStory => "UserStory",
            EntityType::Task => "Task",
            EntityType::Bug => "Bug",
            EntityType::Project => "Project",
            EntityType::Iteration => "Iteration",
            EntityType::Comment => "Comment",
            EntityType::EntityState => "EntityState",
            EntityType::GeneralUser => "GeneralUser",
            EntityType::Assignment => "Assignment",
        }
    }

    /// Collection path segment under `/api/v1`.
    pub fn collection(self) -> &'static str {
        match self {
            EntityType::UserStory => "UserStories",
            EntityType::Task => "Tasks",
            EntityType::Bug => "Bugs",
            EntityType::Project => "Projects",
            EntityType::Iteration => "Iterations",
            EntityType::Comment => "Comments",
            EntityType::EntityState => "EntityStates",
            EntityType::GeneralUser => "GeneralUsers",
            EntityType::Assignment => "Assignments",
        }
    }

    /// Returns true for types that carry a workflow state and can be assigned.
    pub fn is_assignable(self) -> bool {
        matches!(
            self,
            EntityType::UserStory | EntityType::Task | EntityType::Bug
        )
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EntityType {
    type Err = TpError;

    /// Accepts the singular or collection name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        EntityType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s) || t.collection().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let known: Vec<&str> = EntityType::ALL.iter().map(|t| t.name()).collect();
                TpError::validation(format!(
                    "unknown entity type {:?}, expected one of: {}",
                    s.chars().take(50).collect::<String>(),
                    known.join(", ")
                ))
            })
    }
}
