//! MCP server implementation for Targetprocess.
//!
//! This module defines the `TpServer` struct that implements the MCP
//! `ServerHandler` trait, exposing Targetprocess operations as tools.
//!
//! Every tool returns pretty-printed JSON. Failures come back as
//! `{"error": {"kind", "message", ...}}` with credentials redacted.

use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::error::TpError;
use crate::filter::{Constraint, Filter};
use crate::models::{Entity, EntityPage, EntityType};
use crate::tools::{
    optional_id, parse_date, parse_entity_type, parse_entity_types, require_assignable,
    require_id, require_non_negative, require_text, resolve_limit, user_ref, AddCommentInput,
    CreateTaskInput, CreateUserStoryInput, GetEntityInput, GetEntityStatesInput, GetUserInput,
    GetUserStoryInput, ListAssignmentsInput, ListBugsInput, ListIterationsInput,
    ListProjectsInput, ListTasksInput, ListUserStoriesInput, MarkEntityDoneInput,
    QueryEntitiesInput, SearchEntitiesInput, TimeSpentMode, UpdateEntityStateInput,
    UpdateTimeSpentInput, UpdateUserStoryInput,
};
use crate::tp_client::{AssignmentQuery, TpClient};

const USER_STORY_INCLUDE: &str = "[Id,Name,Description,EntityState,Project[Name],Iteration[Name],AssignedUser[FirstName,LastName,Email],Effort,TimeSpent,CreateDate,ModifyDate]";

const USER_STORY_DETAIL_INCLUDE: &str = "[Id,Name,Description,EntityState,Project[Name],Iteration[Name],Release[Name],AssignedUser[FirstName,LastName,Email],Effort,TimeSpent,CreateDate,ModifyDate,Comments[Description,Owner[FirstName,LastName],CreateDate]]";

const TASK_INCLUDE: &str = "[Id,Name,Description,EntityState,UserStory[Id,Name],AssignedUser[FirstName,LastName,Email],Effort,TimeSpent,CreateDate,ModifyDate]";

const BUG_INCLUDE: &str = "[Id,Name,Description,EntityState,Severity,Project[Name],AssignedUser[FirstName,LastName,Email],CreateDate,ModifyDate]";

const PROJECT_INCLUDE: &str = "[Id,Name,Description,IsActive,StartDate,EndDate,Process[Id,Name]]";

const ITERATION_INCLUDE: &str = "[Id,Name,StartDate,EndDate,IsCurrent,Project[Name]]";

const SEARCH_INCLUDE: &str = "[Id,Name,EntityState,Project[Name]]";

/// State name used by `mark_entity_done`.
const DONE_STATE: &str = "Done";

const DEFAULT_LIST_LIMIT: u32 = 50;
const DEFAULT_CATALOG_LIMIT: u32 = 100;
const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// The Targetprocess MCP server.
///
/// This server exposes Targetprocess operations as MCP tools.
#[derive(Clone)]
pub struct TpServer {
    /// Targetprocess client for API operations.
    client: TpClient,
    /// Tool router for MCP tool dispatch.
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl TpServer {
    /// Creates a new server instance around a client session.
    pub fn new(client: TpClient) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    /// A simple ping tool to verify the server is running.
    #[tool(description = "Test connectivity to the Targetprocess MCP server. Returns 'pong' if the server is running correctly.")]
    fn ping(&self) -> String {
        tracing::debug!("ping tool called");
        "pong".to_string()
    }

    /// List user stories with optional filters.
    ///
    /// Structured filters are combined with any raw `where` clause using `and`.
    #[tool(description = "List user stories. Filter by project, iteration, state name, text in the name, creation date range (YYYY-MM-DD) or a raw Targetprocess where clause. Returns Items, Count and HasMore.")]
    async fn list_user_stories(
        &self,
        Parameters(input): Parameters<ListUserStoriesInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(?input, "list_user_stories tool called");

        let result = async {
            let limit = resolve_limit(input.limit, DEFAULT_LIST_LIMIT)?;
            let filter = user_story_filter(&input)?;
            self.client
                .list(
                    EntityType::UserStory,
                    filter.render().as_deref(),
                    Some(USER_STORY_INCLUDE),
                    limit,
                )
                .await
        }
        .await;

        self.respond("list_user_stories", result)
    }

    /// Get a single user story with its comments.
    #[tool(description = "Get full details of a user story including description, effort, assignees and comments.")]
    async fn get_user_story(
        &self,
        Parameters(input): Parameters<GetUserStoryInput>,
    ) -> Result<String, String> {
        tracing::debug!(story_id = input.story_id, "get_user_story tool called");

        let result = async {
            let id = require_id(input.story_id, "story_id")?;
            self.client
                .get_by_id(EntityType::UserStory, id, Some(USER_STORY_DETAIL_INCLUDE))
                .await
        }
        .await;

        self.respond("get_user_story", result)
    }

    /// Create a user story in a project.
    #[tool(description = "Create a user story. Name and project_id are required; description, iteration_id and effort are optional. Returns the created story with its ID.")]
    async fn create_user_story(
        &self,
        Parameters(input): Parameters<CreateUserStoryInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(name = %input.name, project_id = input.project_id, "create_user_story tool called");

        let result = async {
            let fields = user_story_create_fields(&input)?;
            self.client.create(EntityType::UserStory, &fields).await
        }
        .await;

        self.respond("create_user_story", result)
    }

    /// Partially update a user story.
    ///
    /// Only supplied fields are sent.
    #[tool(description = "Update a user story's name, description, effort or iteration. Only the supplied fields change; at least one is required.")]
    async fn update_user_story(
        &self,
        Parameters(input): Parameters<UpdateUserStoryInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(story_id = input.story_id, "update_user_story tool called");

        let result = async {
            let id = require_id(input.story_id, "story_id")?;
            let fields = user_story_update_fields(&input)?;
            self.client.update(EntityType::UserStory, id, &fields).await
        }
        .await;

        self.respond("update_user_story", result)
    }

    /// List tasks with optional filters.
    #[tool(description = "List tasks. Filter by parent user story, project, state name, text in the name or a raw where clause.")]
    async fn list_tasks(
        &self,
        Parameters(input): Parameters<ListTasksInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(?input, "list_tasks tool called");

        let result = async {
            let limit = resolve_limit(input.limit, DEFAULT_LIST_LIMIT)?;
            let filter = task_filter(&input)?;
            self.client
                .list(
                    EntityType::Task,
                    filter.render().as_deref(),
                    Some(TASK_INCLUDE),
                    limit,
                )
                .await
        }
        .await;

        self.respond("list_tasks", result)
    }

    /// Create a task under a user story.
    #[tool(description = "Create a task under a user story. Name and story_id are required; description, assigned_user_id and effort (hours) are optional.")]
    async fn create_task(
        &self,
        Parameters(input): Parameters<CreateTaskInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(name = %input.name, story_id = input.story_id, "create_task tool called");

        let result = async {
            let fields = task_create_fields(&input)?;
            self.client.create(EntityType::Task, &fields).await
        }
        .await;

        self.respond("create_task", result)
    }

    /// List bugs with optional filters.
    #[tool(description = "List bugs. Filter by project, state name, severity, text in the name, creation date range (YYYY-MM-DD) or a raw where clause.")]
    async fn list_bugs(
        &self,
        Parameters(input): Parameters<ListBugsInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(?input, "list_bugs tool called");

        let result = async {
            let limit = resolve_limit(input.limit, DEFAULT_LIST_LIMIT)?;
            let filter = bug_filter(&input)?;
            self.client
                .list(
                    EntityType::Bug,
                    filter.render().as_deref(),
                    Some(BUG_INCLUDE),
                    limit,
                )
                .await
        }
        .await;

        self.respond("list_bugs", result)
    }

    /// Get any entity by type and ID.
    #[tool(description = "Get any entity by type and ID. Optionally pass an include expression such as [Id,Name,EntityState[Name]].")]
    async fn get_entity(
        &self,
        Parameters(input): Parameters<GetEntityInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(?input, "get_entity tool called");

        let result = async {
            let entity_type = parse_entity_type(&input.entity_type)?;
            let id = require_id(input.entity_id, "entity_id")?;
            self.client
                .get_by_id(entity_type, id, input.include.as_deref())
                .await
        }
        .await;

        self.respond("get_entity", result)
    }

    /// List any entity type with a raw where clause.
    #[tool(description = "Advanced query: list any entity type with a raw Targetprocess where clause, e.g. (Project.Id eq 12) and (Effort gt 3), and an optional include expression.")]
    async fn query_entities(
        &self,
        Parameters(input): Parameters<QueryEntitiesInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(?input, "query_entities tool called");

        let result = async {
            let entity_type = parse_entity_type(&input.entity_type)?;
            let limit = resolve_limit(input.limit, DEFAULT_LIST_LIMIT)?;
            let filter = Filter::new().and_raw(input.where_clause.as_deref());
            self.client
                .list(
                    entity_type,
                    filter.render().as_deref(),
                    input.include.as_deref(),
                    limit,
                )
                .await
        }
        .await;

        self.respond("query_entities", result)
    }

    /// List projects, active ones by default.
    #[tool(description = "List projects. Only active projects are returned unless active_only is false.")]
    async fn list_projects(
        &self,
        Parameters(input): Parameters<ListProjectsInput>,
    ) -> Result<String, String> {
        tracing::debug!(?input, "list_projects tool called");

        let result = async {
            let limit = resolve_limit(input.limit, DEFAULT_CATALOG_LIMIT)?;
            let filter = project_filter(&input);
            self.client
                .list(
                    EntityType::Project,
                    filter.render().as_deref(),
                    Some(PROJECT_INCLUDE),
                    limit,
                )
                .await
        }
        .await;

        self.respond("list_projects", result)
    }

    /// List iterations.
    #[tool(description = "List iterations (sprints). Filter by project and by whether the iteration is the current one.")]
    async fn list_iterations(
        &self,
        Parameters(input): Parameters<ListIterationsInput>,
    ) -> Result<String, String> {
        tracing::debug!(?input, "list_iterations tool called");

        let result = async {
            let limit = resolve_limit(input.limit, DEFAULT_CATALOG_LIMIT)?;
            let filter = iteration_filter(&input)?;
            self.client
                .list(
                    EntityType::Iteration,
                    filter.render().as_deref(),
                    Some(ITERATION_INCLUDE),
                    limit,
                )
                .await
        }
        .await;

        self.respond("list_iterations", result)
    }

    /// Text search across several entity types.
    ///
    /// Each type is queried separately; a failure for one type is reported
    /// under its key and does not fail the call.
    #[tool(description = "Search entities whose name or description contains the query text. Searches UserStory, Task and Bug unless entity_types is given. A failure for one type is reported under that type without failing the others.")]
    async fn search_entities(
        &self,
        Parameters(input): Parameters<SearchEntitiesInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(?input, "search_entities tool called");

        let result = async {
            let query = require_text(&input.query, "query")?;
            let limit = resolve_limit(input.limit, DEFAULT_SEARCH_LIMIT)?;
            let types = parse_entity_types(input.entity_types.as_deref(), &EntityType::WORK_ITEMS)?;
            let filter = search_filter(query);
            let filter = filter.render();

            let mut results = Map::new();
            for entity_type in types {
                let outcome = self
                    .client
                    .list(entity_type, filter.as_deref(), Some(SEARCH_INCLUDE), limit)
                    .await;
                let value = match outcome {
                    Ok(page) => serde_json::to_value(page)?,
                    Err(e) => {
                        let secrets = self.client.secrets();
                        tracing::warn!(
                            entity_type = %entity_type,
                            error = %e.sanitized_display(&secrets),
                            "Search failed for entity type"
                        );
                        e.to_tool_error(&secrets)
                    }
                };
                results.insert(entity_type.name().to_string(), value);
            }
            Ok::<_, TpError>(Value::Object(results))
        }
        .await;

        self.respond("search_entities", result)
    }

    /// List the workflow states of an entity type.
    #[tool(description = "List the workflow states of an entity type (e.g. Bug), ordered by priority. Optionally restrict to one process.")]
    async fn get_entity_states(
        &self,
        Parameters(input): Parameters<GetEntityStatesInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(?input, "get_entity_states tool called");

        let result = async {
            let entity_type = parse_entity_type(&input.entity_type)?;
            let process_id = optional_id(input.process_id, "process_id")?;
            let states = self.client.entity_states(entity_type, process_id).await?;
            Ok::<_, TpError>(EntityPage::new(states, false))
        }
        .await;

        self.respond("get_entity_states", result)
    }

    /// Move a work item to a named workflow state.
    #[tool(description = "Move a user story, task or bug to the named workflow state (e.g. 'In Progress'). The state is looked up in the entity's own process.")]
    async fn update_entity_state(
        &self,
        Parameters(input): Parameters<UpdateEntityStateInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(?input, "update_entity_state tool called");

        let result = async {
            let entity_type = require_assignable(parse_entity_type(&input.entity_type)?)?;
            let id = require_id(input.entity_id, "entity_id")?;
            let state_name = require_text(&input.state_name, "state_name")?;
            self.client.change_state(entity_type, id, state_name).await
        }
        .await;

        self.respond("update_entity_state", result)
    }

    /// Move a work item to the `Done` state.
    #[tool(description = "Mark a user story, task or bug as Done.")]
    async fn mark_entity_done(
        &self,
        Parameters(input): Parameters<MarkEntityDoneInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(?input, "mark_entity_done tool called");

        let result = async {
            let entity_type = require_assignable(parse_entity_type(&input.entity_type)?)?;
            let id = require_id(input.entity_id, "entity_id")?;
            self.client.change_state(entity_type, id, DONE_STATE).await
        }
        .await;

        self.respond("mark_entity_done", result)
    }

    /// Add a comment to an entity.
    #[tool(description = "Add a comment to any entity (user story, task, bug, project...). Returns the created comment.")]
    async fn add_comment(
        &self,
        Parameters(input): Parameters<AddCommentInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(entity_type = %input.entity_type, entity_id = input.entity_id, "add_comment tool called");

        let result = async {
            let entity_type = parse_entity_type(&input.entity_type)?;
            let id = require_id(input.entity_id, "entity_id")?;
            let comment = require_text(&input.comment, "comment")?;
            self.client.add_comment(entity_type, id, comment).await
        }
        .await;

        self.respond("add_comment", result)
    }

    /// Log time on a work item.
    ///
    /// In `add` mode the current `TimeSpent` is read first.
    #[tool(description = "Log time on a user story, task or bug. mode 'add' (default) adds hours to the recorded total; 'set' replaces it.")]
    async fn update_time_spent(
        &self,
        Parameters(input): Parameters<UpdateTimeSpentInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(?input, "update_time_spent tool called");

        let result = async {
            let entity_type = require_assignable(parse_entity_type(&input.entity_type)?)?;
            let id = require_id(input.entity_id, "entity_id")?;
            let hours = require_non_negative(input.hours, "hours")?;

            let total = match input.mode.unwrap_or_default() {
                TimeSpentMode::Set => hours,
                TimeSpentMode::Add => {
                    let current = self
                        .client
                        .get_by_id(entity_type, id, Some("[Id,TimeSpent]"))
                        .await?;
                    current.time_spent() + hours
                }
            };

            self.client.update_time_spent(entity_type, id, total).await
        }
        .await;

        self.respond("update_time_spent", result)
    }

    /// Look up a user, defaulting to the authenticated one.
    #[tool(description = "Look up a user by ID or email. With neither, returns the authenticated user.")]
    async fn get_user(
        &self,
        Parameters(input): Parameters<GetUserInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(user_id = ?input.user_id, "get_user tool called");

        let result = async {
            let user = user_ref(input.user_id, input.email.as_deref())?;
            self.client.resolve_user(&user).await
        }
        .await;

        self.respond("get_user", result)
    }

    /// List the work assigned to a user.
    ///
    /// Resolves the user first, then queries their assignments.
    #[tool(description = "List the work items assigned to a user (by user_id or email; the authenticated user if neither). Filter by entity types, state name and project.")]
    async fn list_assignments(
        &self,
        Parameters(input): Parameters<ListAssignmentsInput>,
    ) -> Result<String, String> {
        // Sanitize input
        let input = input.sanitize();
        tracing::debug!(user_id = ?input.user_id, state = ?input.state, "list_assignments tool called");

        let result = async {
            let user = user_ref(input.user_id, input.email.as_deref())?;
            let query = AssignmentQuery {
                entity_types: parse_entity_types(
                    input.entity_types.as_deref(),
                    &EntityType::WORK_ITEMS,
                )?,
                state: input.state.clone(),
                project_id: optional_id(input.project_id, "project_id")?,
                take: resolve_limit(input.limit, DEFAULT_LIST_LIMIT)?,
            };
            for entity_type in &query.entity_types {
                require_assignable(*entity_type)?;
            }

            let user = self.client.resolve_user(&user).await?;
            let user_id = user
                .id()
                .ok_or_else(|| TpError::not_found("user id"))?;
            let page = self.client.list_assignments(user_id, &query).await?;

            Ok::<_, TpError>(json!({
                "User": user_summary(&user),
                "Items": page.items,
                "Count": page.count,
                "HasMore": page.has_more,
            }))
        }
        .await;

        self.respond("list_assignments", result)
    }

    /// Serializes a successful result, or converts a failure into the tool error object.
    fn respond<T: Serialize>(&self, tool: &str, result: Result<T, TpError>) -> Result<String, String> {
        result
            .and_then(|value| serde_json::to_string_pretty(&value).map_err(TpError::from))
            .map_err(|e| {
                let secrets = self.client.secrets();
                tracing::error!(
                    tool,
                    kind = e.kind(),
                    error = %e.sanitized_display(&secrets),
                    "Tool call failed"
                );
                e.to_tool_error(&secrets).to_string()
            })
    }
}

#[tool_handler]
impl ServerHandler for TpServer {
    /// Returns server information for the MCP initialize handshake.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Targetprocess access for agile project management. \
                 Use list_projects and list_iterations to orient yourself, \
                 list_user_stories, list_tasks and list_bugs to find work, \
                 and get_user_story or get_entity for details. \
                 list_assignments shows a user's work (yours by default). \
                 Change workflow with update_entity_state or mark_entity_done, \
                 log time with update_time_spent and discuss with add_comment. \
                 query_entities accepts raw Targetprocess where clauses. \
                 Start with 'ping' to verify connectivity."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// ============================================================================
// Filter construction
// ============================================================================

fn created_between(filter: Filter, after: Option<&str>, before: Option<&str>) -> Result<Filter, TpError> {
    let after = parse_date(after, "created_after")?;
    let before = parse_date(before, "created_before")?;
    Ok(filter
        .and_opt(after.map(|d| Constraint::gte("CreateDate", d)))
        .and_opt(before.map(|d| Constraint::lte("CreateDate", d))))
}

fn user_story_filter(input: &ListUserStoriesInput) -> Result<Filter, TpError> {
    let filter = Filter::new()
        .and_opt(optional_id(input.project_id, "project_id")?.map(|id| Constraint::eq("Project.Id", id)))
        .and_opt(optional_id(input.iteration_id, "iteration_id")?.map(|id| Constraint::eq("Iteration.Id", id)))
        .and_opt(input.state.as_deref().map(|s| Constraint::eq("EntityState.Name", s)))
        .and_opt(input.text.as_deref().map(|t| Constraint::contains("Name", t)));

    Ok(created_between(filter, input.created_after.as_deref(), input.created_before.as_deref())?
        .and_raw(input.where_clause.as_deref()))
}

fn task_filter(input: &ListTasksInput) -> Result<Filter, TpError> {
    Ok(Filter::new()
        .and_opt(optional_id(input.story_id, "story_id")?.map(|id| Constraint::eq("UserStory.Id", id)))
        .and_opt(optional_id(input.project_id, "project_id")?.map(|id| Constraint::eq("Project.Id", id)))
        .and_opt(input.state.as_deref().map(|s| Constraint::eq("EntityState.Name", s)))
        .and_opt(input.text.as_deref().map(|t| Constraint::contains("Name", t)))
        .and_raw(input.where_clause.as_deref()))
}

fn bug_filter(input: &ListBugsInput) -> Result<Filter, TpError> {
    let filter = Filter::new()
        .and_opt(optional_id(input.project_id, "project_id")?.map(|id| Constraint::eq("Project.Id", id)))
        .and_opt(input.state.as_deref().map(|s| Constraint::eq("EntityState.Name", s)))
        .and_opt(input.severity.as_deref().map(|s| Constraint::eq("Severity.Name", s)))
        .and_opt(input.text.as_deref().map(|t| Constraint::contains("Name", t)));

    Ok(created_between(filter, input.created_after.as_deref(), input.created_before.as_deref())?
        .and_raw(input.where_clause.as_deref()))
}

fn project_filter(input: &ListProjectsInput) -> Filter {
    Filter::new().and_opt(
        input
            .active_only
            .unwrap_or(true)
            .then(|| Constraint::eq("IsActive", true)),
    )
}

fn iteration_filter(input: &ListIterationsInput) -> Result<Filter, TpError> {
    Ok(Filter::new()
        .and_opt(optional_id(input.project_id, "project_id")?.map(|id| Constraint::eq("Project.Id", id)))
        .and_opt(input.is_current.map(|current| Constraint::eq("IsCurrent", current))))
}

fn search_filter(query: &str) -> Filter {
    Filter::new().and_any(vec![
        Constraint::contains("Name", query),
        Constraint::contains("Description", query),
    ])
}

// ============================================================================
// Request bodies
// ============================================================================

fn reference(id: i64) -> Value {
    json!({ "Id": id })
}

fn user_story_create_fields(input: &CreateUserStoryInput) -> Result<Map<String, Value>, TpError> {
    let mut fields = Map::new();
    fields.insert("Name".to_string(), json!(require_text(&input.name, "name")?));
    fields.insert(
        "Project".to_string(),
        reference(require_id(input.project_id, "project_id")?),
    );
    if let Some(description) = &input.description {
        fields.insert("Description".to_string(), json!(description));
    }
    if let Some(id) = optional_id(input.iteration_id, "iteration_id")? {
        fields.insert("Iteration".to_string(), reference(id));
    }
    if let Some(effort) = input.effort {
        fields.insert("Effort".to_string(), json!(require_non_negative(effort, "effort")?));
    }
    Ok(fields)
}

fn user_story_update_fields(input: &UpdateUserStoryInput) -> Result<Map<String, Value>, TpError> {
    if !input.has_updates() {
        return Err(TpError::validation(
            "at least one of name, description, effort or iteration_id is required",
        ));
    }

    let mut fields = Map::new();
    if let Some(name) = &input.name {
        fields.insert("Name".to_string(), json!(name));
    }
    if let Some(description) = &input.description {
        fields.insert("Description".to_string(), json!(description));
    }
    if let Some(effort) = input.effort {
        fields.insert("Effort".to_string(), json!(require_non_negative(effort, "effort")?));
    }
    if let Some(id) = optional_id(input.iteration_id, "iteration_id")? {
        fields.insert("Iteration".to_string(), reference(id));
    }
    Ok(fields)
}

fn task_create_fields(input: &CreateTaskInput) -> Result<Map<String, Value>, TpError> {
    let mut fields = Map::new();
    fields.insert("Name".to_string(), json!(require_text(&input.name, "name")?));
    fields.insert(
        "UserStory".to_string(),
        reference(require_id(input.story_id, "story_id")?),
    );
    if let Some(description) = &input.description {
        fields.insert("Description".to_string(), json!(description));
    }
    if let Some(id) = optional_id(input.assigned_user_id, "assigned_user_id")? {
        fields.insert("AssignedUser".to_string(), reference(id));
    }
    if let Some(effort) = input.effort {
        fields.insert("Effort".to_string(), json!(require_non_negative(effort, "effort")?));
    }
    Ok(fields)
}

/// Identity fields echoed back with an assignment listing.
fn user_summary(user: &Entity) -> Value {
    let mut summary = Map::new();
    for key in ["Id", "FirstName", "LastName", "Email"] {
        if let Some(value) = user.get(key) {
            summary.insert(key.to_string(), value.clone());
        }
    }
    Value::Object(summary)
}
