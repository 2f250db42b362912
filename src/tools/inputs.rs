//! Tool input parameter structs for MCP tools.
//!
//! This module defines the input types for each MCP tool, with
//! JSON Schema derivation for MCP tool discovery.
//!
//! # Input Sanitization
//!
//! All input structs implement `sanitize()` which trims whitespace
//! from string fields. Blank optional strings become `None`. This should be
//! called before processing input.

use rmcp::schemars::{self, JsonSchema};
use serde::Deserialize;

/// Helper function to trim an optional string.
fn trim_option(s: &Option<String>) -> Option<String> {
    s.as_ref().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn trim_list(list: &Option<Vec<String>>) -> Option<Vec<String>> {
    list.as_ref()
        .map(|items| {
            items
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        })
        .filter(|items| !items.is_empty())
}

// ============================================================================
// User stories
// ============================================================================

/// Input parameters for the list_user_stories tool.
///
/// All fields are optional - use them to filter the results.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListUserStoriesInput {
    /// Only stories in this project.
    #[serde(default)]
    pub project_id: Option<i64>,

    /// Only stories in this iteration (sprint).
    #[serde(default)]
    pub iteration_id: Option<i64>,

    /// Workflow state name (e.g., "Open", "In Progress", "Done").
    #[serde(default)]
    pub state: Option<String>,

    /// Text the story name must contain.
    #[serde(default)]
    pub text: Option<String>,

    /// Only stories created on or after this date (YYYY-MM-DD).
    #[serde(default)]
    pub created_after: Option<String>,

    /// Only stories created on or before this date (YYYY-MM-DD).
    #[serde(default)]
    pub created_before: Option<String>,

    /// Extra raw Targetprocess where clause, e.g. "Effort gt 3".
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,

    /// Maximum number of stories to return (default: 50, max: 1000).
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ListUserStoriesInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            project_id: self.project_id,
            iteration_id: self.iteration_id,
            state: trim_option(&self.state),
            text: trim_option(&self.text),
            created_after: trim_option(&self.created_after),
            created_before: trim_option(&self.created_before),
            where_clause: trim_option(&self.where_clause),
            limit: self.limit,
        }
    }
}

/// Input parameters for the get_user_story tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetUserStoryInput {
    /// The ID of the user story to retrieve.
    pub story_id: i64,
}

/// Input parameters for the create_user_story tool.
///
/// Name and project are required.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateUserStoryInput {
    /// Story title.
    pub name: String,

    /// Project the story belongs to.
    pub project_id: i64,

    /// Story description (HTML or plain text).
    #[serde(default)]
    pub description: Option<String>,

    /// Iteration (sprint) to plan the story into.
    #[serde(default)]
    pub iteration_id: Option<i64>,

    /// Estimated effort in points or hours.
    #[serde(default)]
    pub effort: Option<f64>,
}

impl CreateUserStoryInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            project_id: self.project_id,
            description: trim_option(&self.description),
            iteration_id: self.iteration_id,
            effort: self.effort,
        }
    }
}

/// Input parameters for the update_user_story tool.
///
/// At least one field besides `story_id` must be set.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateUserStoryInput {
    /// The ID of the story to update.
    pub story_id: i64,

    /// New title.
    #[serde(default)]
    pub name: Option<String>,

    /// New description.
    #[serde(default)]
    pub description: Option<String>,

    /// New effort estimate.
    #[serde(default)]
    pub effort: Option<f64>,

    /// Move the story to this iteration.
    #[serde(default)]
    pub iteration_id: Option<i64>,
}

impl UpdateUserStoryInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    ///
    /// A blank description stays `Some("")` so it clears the field.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            story_id: self.story_id,
            name: trim_option(&self.name),
            description: self.description.map(|d| d.trim().to_string()),
            effort: self.effort,
            iteration_id: self.iteration_id,
        }
    }

    /// Returns true if at least one update field is provided.
    pub fn has_updates(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.effort.is_some()
            || self.iteration_id.is_some()
    }
}

// ============================================================================
// Tasks and bugs
// ============================================================================

/// Input parameters for the list_tasks tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListTasksInput {
    /// Only tasks of this user story.
    #[serde(default)]
    pub story_id: Option<i64>,

    /// Only tasks in this project.
    #[serde(default)]
    pub project_id: Option<i64>,

    /// Workflow state name.
    #[serde(default)]
    pub state: Option<String>,

    /// Text the task name must contain.
    #[serde(default)]
    pub text: Option<String>,

    /// Extra raw Targetprocess where clause.
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,

    /// Maximum number of tasks to return (default: 50, max: 1000).
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ListTasksInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            story_id: self.story_id,
            project_id: self.project_id,
            state: trim_option(&self.state),
            text: trim_option(&self.text),
            where_clause: trim_option(&self.where_clause),
            limit: self.limit,
        }
    }
}

/// Input parameters for the create_task tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateTaskInput {
    /// Task title.
    pub name: String,

    /// User story the task belongs to.
    pub story_id: i64,

    /// Task description.
    #[serde(default)]
    pub description: Option<String>,

    /// User to assign the task to.
    #[serde(default)]
    pub assigned_user_id: Option<i64>,

    /// Estimated effort in hours.
    #[serde(default)]
    pub effort: Option<f64>,
}

impl CreateTaskInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            story_id: self.story_id,
            description: trim_option(&self.description),
            assigned_user_id: self.assigned_user_id,
            effort: self.effort,
        }
    }
}

/// Input parameters for the list_bugs tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListBugsInput {
    /// Only bugs in this project.
    #[serde(default)]
    pub project_id: Option<i64>,

    /// Workflow state name.
    #[serde(default)]
    pub state: Option<String>,

    /// Severity name (e.g., "Critical", "Blocking", "Small").
    #[serde(default)]
    pub severity: Option<String>,

    /// Text the bug name must contain.
    #[serde(default)]
    pub text: Option<String>,

    /// Only bugs created on or after this date (YYYY-MM-DD).
    #[serde(default)]
    pub created_after: Option<String>,

    /// Only bugs created on or before this date (YYYY-MM-DD).
    #[serde(default)]
    pub created_before: Option<String>,

    /// Extra raw Targetprocess where clause.
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,

    /// Maximum number of bugs to return (default: 50, max: 1000).
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ListBugsInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            project_id: self.project_id,
            state: trim_option(&self.state),
            severity: trim_option(&self.severity),
            text: trim_option(&self.text),
            created_after: trim_option(&self.created_after),
            created_before: trim_option(&self.created_before),
            where_clause: trim_option(&self.where_clause),
            limit: self.limit,
        }
    }
}

// ============================================================================
// Generic entity access
// ============================================================================

/// Input parameters for the get_entity tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetEntityInput {
    /// Entity type, e.g. "UserStory", "Task", "Bug", "Project".
    pub entity_type: String,

    /// The ID of the entity.
    pub entity_id: i64,

    /// Include expression, e.g. "[Id,Name,EntityState[Name]]".
    #[serde(default)]
    pub include: Option<String>,
}

impl GetEntityInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            entity_type: self.entity_type.trim().to_string(),
            entity_id: self.entity_id,
            include: trim_option(&self.include),
        }
    }
}

/// Input parameters for the query_entities tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct QueryEntitiesInput {
    /// Entity type to query.
    pub entity_type: String,

    /// Raw Targetprocess where clause, e.g. "(Project.Id eq 12) and (Effort gt 3)".
    #[serde(default, rename = "where")]
    pub where_clause: Option<String>,

    /// Include expression.
    #[serde(default)]
    pub include: Option<String>,

    /// Maximum number of results (default: 50, max: 1000).
    #[serde(default)]
    pub limit: Option<u32>,
}

impl QueryEntitiesInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            entity_type: self.entity_type.trim().to_string(),
            where_clause: trim_option(&self.where_clause),
            include: trim_option(&self.include),
            limit: self.limit,
        }
    }
}

/// Input parameters for the list_projects tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListProjectsInput {
    /// Only active projects (default: true).
    #[serde(default)]
    pub active_only: Option<bool>,

    /// Maximum number of projects (default: 100, max: 1000).
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Input parameters for the list_iterations tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListIterationsInput {
    /// Only iterations of this project.
    #[serde(default)]
    pub project_id: Option<i64>,

    /// Only the current (true) or non-current (false) iterations.
    #[serde(default)]
    pub is_current: Option<bool>,

    /// Maximum number of iterations (default: 100, max: 1000).
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Input parameters for the search_entities tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchEntitiesInput {
    /// Text to find in names and descriptions.
    pub query: String,

    /// Types to search (default: UserStory, Task, Bug).
    #[serde(default)]
    pub entity_types: Option<Vec<String>>,

    /// Maximum results per type (default: 20, max: 1000).
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SearchEntitiesInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            query: self.query.trim().to_string(),
            entity_types: trim_list(&self.entity_types),
            limit: self.limit,
        }
    }
}

// ============================================================================
// Workflow and time tracking
// ============================================================================

/// Input parameters for the get_entity_states tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetEntityStatesInput {
    /// Entity type whose workflow to list, e.g. "Bug".
    pub entity_type: String,

    /// Only states of this process.
    #[serde(default)]
    pub process_id: Option<i64>,
}

impl GetEntityStatesInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            entity_type: self.entity_type.trim().to_string(),
            process_id: self.process_id,
        }
    }
}

/// Input parameters for the update_entity_state tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateEntityStateInput {
    /// Entity type: "UserStory", "Task" or "Bug".
    pub entity_type: String,

    /// The ID of the entity.
    pub entity_id: i64,

    /// Target state name, e.g. "In Progress".
    pub state_name: String,
}

impl UpdateEntityStateInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            entity_type: self.entity_type.trim().to_string(),
            entity_id: self.entity_id,
            state_name: self.state_name.trim().to_string(),
        }
    }
}

/// Input parameters for the mark_entity_done tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MarkEntityDoneInput {
    /// Entity type: "UserStory", "Task" or "Bug".
    pub entity_type: String,

    /// The ID of the entity.
    pub entity_id: i64,
}

impl MarkEntityDoneInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            entity_type: self.entity_type.trim().to_string(),
            entity_id: self.entity_id,
        }
    }
}

/// Input parameters for the add_comment tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddCommentInput {
    /// Type of the commented entity.
    pub entity_type: String,

    /// The ID of the commented entity.
    pub entity_id: i64,

    /// Comment text (HTML allowed).
    pub comment: String,
}

impl AddCommentInput {
    /// Sanitizes input by trimming the entity type.
    ///
    /// The comment is kept as written; leading indentation may be markup.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            entity_type: self.entity_type.trim().to_string(),
            entity_id: self.entity_id,
            comment: self.comment,
        }
    }
}

/// How update_time_spent applies its hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimeSpentMode {
    /// Add the hours to the recorded total.
    #[default]
    Add,
    /// Replace the recorded total.
    Set,
}

/// Input parameters for the update_time_spent tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UpdateTimeSpentInput {
    /// Entity type: "UserStory", "Task" or "Bug".
    pub entity_type: String,

    /// The ID of the entity.
    pub entity_id: i64,

    /// Hours to log.
    pub hours: f64,

    /// "add" (default) adds to the current total, "set" replaces it.
    #[serde(default)]
    pub mode: Option<TimeSpentMode>,
}

impl UpdateTimeSpentInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            entity_type: self.entity_type.trim().to_string(),
            ..self
        }
    }
}

// ============================================================================
// Users and assignments
// ============================================================================

/// Input parameters for the get_user tool.
///
/// With neither field set, the authenticated user is returned.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetUserInput {
    /// User ID.
    #[serde(default)]
    pub user_id: Option<i64>,

    /// User email address.
    #[serde(default)]
    pub email: Option<String>,
}

impl GetUserInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            user_id: self.user_id,
            email: trim_option(&self.email),
        }
    }
}

/// Input parameters for the list_assignments tool.
///
/// With neither `user_id` nor `email`, lists the authenticated user's work.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListAssignmentsInput {
    /// User ID.
    #[serde(default)]
    pub user_id: Option<i64>,

    /// User email address.
    #[serde(default)]
    pub email: Option<String>,

    /// Work item types to include (default: UserStory, Task, Bug).
    #[serde(default)]
    pub entity_types: Option<Vec<String>>,

    /// Only items in this workflow state.
    #[serde(default)]
    pub state: Option<String>,

    /// Only items in this project.
    #[serde(default)]
    pub project_id: Option<i64>,

    /// Maximum number of items (default: 50, max: 1000).
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ListAssignmentsInput {
    /// Sanitizes input by trimming whitespace from all string fields.
    #[must_use]
    pub fn sanitize(self) -> Self {
        Self {
            user_id: self.user_id,
            email: trim_option(&self.email),
            entity_types: trim_list(&self.entity_types),
            state: trim_option(&self.state),
            project_id: self.project_id,
            limit: self.limit,
        }
    }
}
