//! HTTP client for the Targetprocess REST API (v1).
//!
//! This module provides the `TpClient` struct for making authenticated
//! requests against `{base_url}/api/v1`.
//!
//! Every operation is a single attempt: non-2xx responses come back as
//! `TpError::HttpStatus` (or `NotFound` for a missing entity) and are never
//! retried. Requests time out after [`DEFAULT_TIMEOUT_SECS`].
//!
//! Listing fetches one page only. `take` is clamped to `1..=MAX_TAKE` and
//! [`EntityPage::has_more`] reports whether the server cut the result short.
//!
//! # Security
//!
//! The token or password is never logged. Error bodies are sanitized
//! before they leave this module.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};

use crate::config::{Config, Credentials};
use crate::error::TpError;
use crate::filter::{Constraint, Filter};
use crate::models::{Entity, EntityPage, EntityType, ListResponse};

/// Request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Largest `take` Targetprocess accepts for a single page.
pub const MAX_TAKE: u32 = 1000;

/// REST API root below the instance URL.
const API_PATH: &str = "/api/v1";

/// Maximum length for HTTP error response bodies.
const MAX_ERROR_BODY_LEN: usize = 500;

/// Fields fetched for user identity lookups.
pub const USER_INCLUDE: &str = "[Id,FirstName,LastName,Email,Login,IsActive]";

/// Fields fetched for workflow states.
pub const STATE_INCLUDE: &str =
    "[Id,Name,NumericPriority,IsInitial,IsFinal,Process[Id,Name],EntityType[Name]]";

/// Fields fetched for each assigned work item.
const ASSIGNMENT_INCLUDE: &str = "[Id,Role[Name],Assignable[Id,Name,ResourceType,EntityState[Name],Project[Id,Name],Effort,TimeSpent,ModifyDate]]";

/// How to identify a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserRef {
    /// The user the session authenticates as.
    Me,
    /// A user id.
    Id(i64),
    /// A user email address.
    Email(String),
}

/// Narrowing options for an assignment lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentQuery {
    /// Work item types to include; empty means all.
    pub entity_types: Vec<EntityType>,
    /// Only items in this state.
    pub state: Option<String>,
    /// Only items in this project.
    pub project_id: Option<i64>,
    /// Maximum assignments fetched.
    pub take: u32,
}

impl Default for AssignmentQuery {
    fn default() -> Self {
        Self {
            entity_types: EntityType::WORK_ITEMS.to_vec(),
            state: None,
            project_id: None,
            take: 50,
        }
    }
}

impl AssignmentQuery {
    /// The `where` expression for the `Assignments` collection.
    pub fn to_filter(&self, user_id: i64) -> Filter {
        let types = (!self.entity_types.is_empty()).then(|| {
            Constraint::in_list(
                "Assignable.EntityType.Name",
                self.entity_types.iter().map(|t| t.name()),
            )
        });

        Filter::new()
            .and(Constraint::eq("GeneralUser.Id", user_id))
            .and_opt(types)
            .and_opt(
                self.state
                    .as_deref()
                    .map(|s| Constraint::eq("Assignable.EntityState.Name", s)),
            )
            .and_opt(
                self.project_id
                    .map(|id| Constraint::eq("Assignable.Project.Id", id)),
            )
    }
}

/// HTTP client for the Targetprocess API.
///
/// Cloning is cheap; clones share the connection pool. The session never
/// changes after construction.
///
/// # Example
///
/// ```ignore
/// let config = Config::load()?;
/// let client = TpClient::new(&config)?;
///
/// let filter = Filter::new().and(Constraint::eq("EntityState.Name", "Open"));
/// let page = client
///     .list(EntityType::Bug, filter.render().as_deref(), None, 20)
///     .await?;
/// ```
#[derive(Clone)]
pub struct TpClient {
    /// The underlying HTTP client (cloning is cheap).
    http: Client,

    /// API root, e.g. `https://acme.tpondemand.com/api/v1`.
    api_url: String,

    /// Credential attached to every request.
    /// SECURITY: Never log this value!
    credentials: Credentials,

    /// Per-request timeout.
    timeout: Duration,
}

impl TpClient {
    /// Creates a new client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `TpError::HttpClient` if the HTTP client fails to initialize.
    pub fn new(config: &Config) -> Result<Self, TpError> {
        Self::with_timeout(config, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client with a custom request timeout.
    pub(crate) fn with_timeout(config: &Config, timeout: Duration) -> Result<Self, TpError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TpError::HttpClient)?;

        Ok(Self {
            http,
            api_url: Self::normalize_api_url(&config.base_url),
            credentials: config.credentials.clone(),
            timeout,
        })
    }

    /// Appends `/api/v1` unless the URL already ends with it.
    fn normalize_api_url(url: &str) -> String {
        let url = url.trim_end_matches('/');
        if url.ends_with(API_PATH) {
            url.to_string()
        } else if url.ends_with("/api") {
            format!("{}/v1", url)
        } else {
            format!("{}{}", url, API_PATH)
        }
    }

    /// The API root this client talks to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Secrets to strip from any message derived from a response.
    ///
    /// This should ONLY be used for sanitizing error messages, never for logging.
    pub fn secrets(&self) -> Vec<&str> {
        self.credentials.secrets()
    }

    /// Rejects ids Targetprocess can never have.
    fn validate_id(id: i64, field_name: &str) -> Result<(), TpError> {
        if id <= 0 {
            return Err(TpError::validation(format!(
                "{} must be a positive integer, got {}",
                field_name, id
            )));
        }
        Ok(())
    }

    /// Verifies that the server is reachable and the credential is accepted.
    ///
    /// # Errors
    ///
    /// Returns the underlying error of a one-item project listing.
    pub async fn test_connection(&self) -> Result<(), TpError> {
        tracing::debug!("Testing connection to Targetprocess");
        self.list(EntityType::Project, None, Some("[Id]"), 1).await?;
        tracing::info!("Connection test successful");
        Ok(())
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Credentials::Token(token) => req.basic_auth("", Some(token)),
            Credentials::Basic { username, password } => req.basic_auth(username, Some(password)),
        }
    }

    /// Sends one request and decodes the JSON response.
    async fn send<T>(
        &self,
        method: Method,
        path: &str,
        mut query: Vec<(&'static str, String)>,
        body: Option<&Value>,
    ) -> Result<T, TpError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.api_url, path);
        query.insert(0, ("format", "json".to_string()));

        tracing::debug!(
            method = %method,
            path = %path,
            "Making Targetprocess API request"
        );

        let mut req = self
            .authorize(self.http.request(method.clone(), &url))
            .header("Accept", "application/json")
            .query(&query);

        if let Some(body) = body {
            req = req.json(body);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                return TpError::timeout(self.timeout, format!("{} {}", method, path));
            }
            TpError::Http(e)
        })?;
        let status = response.status();

        if !status.is_success() {
            return Err(self.handle_http_error(status, response).await);
        }

        let body = response.text().await.map_err(TpError::Http)?;

        tracing::trace!(body = %body, "Targetprocess API response");

        Ok(serde_json::from_str(&body)?)
    }

    /// Converts a non-success response into `TpError::HttpStatus`.
    async fn handle_http_error(&self, status: StatusCode, response: reqwest::Response) -> TpError {
        let body = response.text().await.unwrap_or_default();
        let body = TpError::sanitize_message(&body, &self.secrets());
        let body = if body.len() > MAX_ERROR_BODY_LEN {
            let mut end = MAX_ERROR_BODY_LEN;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}...[truncated]", &body[..end])
        } else {
            body
        };

        tracing::warn!(status = %status, "Targetprocess returned an error status");
        TpError::HttpStatus { status, body }
    }

    /// Lists entities of one type (first page only).
    ///
    /// `filter` and `include` are passed through verbatim; `take` is clamped
    /// to `1..=MAX_TAKE`.
    pub async fn list(
        &self,
        entity_type: EntityType,
        filter: Option<&str>,
        include: Option<&str>,
        take: u32,
    ) -> Result<EntityPage, TpError> {
        let mut query = vec![("take", take.clamp(1, MAX_TAKE).to_string())];
        if let Some(filter) = filter {
            query.push(("where", filter.to_string()));
        }
        if let Some(include) = include {
            query.push(("include", include.to_string()));
        }

        let response: ListResponse = self
            .send(Method::GET, entity_type.collection(), query, None)
            .await?;

        Ok(response.into())
    }

    /// Gets one entity by id.
    ///
    /// # Errors
    ///
    /// Returns `TpError::NotFound` if the server answers 404.
    pub async fn get_by_id(
        &self,
        entity_type: EntityType,
        id: i64,
        include: Option<&str>,
    ) -> Result<Entity, TpError> {
        Self::validate_id(id, "id")?;
        let path = format!("{}/{}", entity_type.collection(), id);
        let query = include
            .map(|i| vec![("include", i.to_string())])
            .unwrap_or_default();

        let entity: Entity = self
            .send(Method::GET, &path, query, None)
            .await
            .map_err(|e| not_found_on_404(e, || format!("{} {}", entity_type, id)))?;

        Ok(entity.normalized())
    }

    /// Creates an entity and returns it with its server-assigned id.
    pub async fn create(
        &self,
        entity_type: EntityType,
        fields: &Map<String, Value>,
    ) -> Result<Entity, TpError> {
        let body = Value::Object(fields.clone());
        let entity: Entity = self
            .send(Method::POST, entity_type.collection(), Vec::new(), Some(&body))
            .await?;

        tracing::debug!(entity_type = %entity_type, id = ?entity.id(), "Entity created");
        Ok(entity.normalized())
    }

    /// Updates the supplied fields of an entity, leaving the rest untouched.
    pub async fn update(
        &self,
        entity_type: EntityType,
        id: i64,
        fields: &Map<String, Value>,
    ) -> Result<Entity, TpError> {
        Self::validate_id(id, "id")?;
        if fields.is_empty() {
            return Err(TpError::validation("update requires at least one field"));
        }

        let path = format!("{}/{}", entity_type.collection(), id);
        let body = Value::Object(fields.clone());
        let entity: Entity = self
            .send(Method::POST, &path, Vec::new(), Some(&body))
            .await
            .map_err(|e| not_found_on_404(e, || format!("{} {}", entity_type, id)))?;

        Ok(entity.normalized())
    }

    /// Adds a comment to any general entity.
    pub async fn add_comment(
        &self,
        entity_type: EntityType,
        id: i64,
        text: &str,
    ) -> Result<Entity, TpError> {
        Self::validate_id(id, "id")?;
        tracing::debug!(entity_type = %entity_type, id, "Adding comment");

        let mut fields = Map::new();
        fields.insert("Description".to_string(), json!(text));
        fields.insert("General".to_string(), json!({ "Id": id }));

        self.create(EntityType::Comment, &fields)
            .await
            .map_err(|e| not_found_on_404(e, || format!("{} {}", entity_type, id)))
    }

    /// Sets the `TimeSpent` field.
    pub async fn update_time_spent(
        &self,
        entity_type: EntityType,
        id: i64,
        hours: f64,
    ) -> Result<Entity, TpError> {
        let mut fields = Map::new();
        fields.insert("TimeSpent".to_string(), json!(hours));
        self.update(entity_type, id, &fields).await
    }

    /// Lists the workflow states of an entity type, ordered by `NumericPriority`.
    pub async fn entity_states(
        &self,
        entity_type: EntityType,
        process_id: Option<i64>,
    ) -> Result<Vec<Entity>, TpError> {
        let filter = Filter::new()
            .and(Constraint::eq("EntityType.Name", entity_type.name()))
            .and_opt(process_id.map(|id| Constraint::eq("Process.Id", id)));

        let page = self
            .list(
                EntityType::EntityState,
                filter.render().as_deref(),
                Some(STATE_INCLUDE),
                100,
            )
            .await?;

        let mut states = page.items;
        states.sort_by(|a, b| {
            let priority = |e: &Entity| {
                e.get("NumericPriority")
                    .and_then(Value::as_f64)
                    .unwrap_or(f64::MAX)
            };
            priority(a).total_cmp(&priority(b))
        });
        Ok(states)
    }

    /// Moves an entity to the named workflow state.
    ///
    /// The name is resolved among the states of the entity's type within its
    /// project's process. Nothing is written when the name does not match.
    ///
    /// # Errors
    ///
    /// Returns `TpError::NotFound` if the entity or the state does not exist.
    pub async fn change_state(
        &self,
        entity_type: EntityType,
        id: i64,
        state_name: &str,
    ) -> Result<Entity, TpError> {
        let entity = self
            .get_by_id(
                entity_type,
                id,
                Some("[Id,Name,EntityState[Id,Name],Project[Id,Process[Id]]]"),
            )
            .await?;
        let process_id = entity.nested_id(&["Project", "Process"]);

        let filter = Filter::new()
            .and(Constraint::eq("EntityType.Name", entity_type.name()))
            .and_opt(process_id.map(|pid| Constraint::eq("Process.Id", pid)))
            .and(Constraint::eq("Name", state_name));

        let states = self
            .list(
                EntityType::EntityState,
                filter.render().as_deref(),
                Some("[Id,Name]"),
                1,
            )
            .await?;

        let state_id = states
            .items
            .first()
            .and_then(Entity::id)
            .ok_or_else(|| {
                TpError::not_found(format!(
                    "state '{}' for {} {}",
                    state_name, entity_type, id
                ))
            })?;

        tracing::debug!(entity_type = %entity_type, id, state_id, "Changing entity state");

        let mut fields = Map::new();
        fields.insert("EntityState".to_string(), json!({ "Id": state_id }));
        self.update(entity_type, id, &fields).await
    }

    /// Gets the user the session authenticates as.
    pub async fn logged_user(&self) -> Result<Entity, TpError> {
        let entity: Entity = self
            .send(
                Method::GET,
                "Users/LoggedUser",
                vec![("include", USER_INCLUDE.to_string())],
                None,
            )
            .await
            .map_err(|e| not_found_on_404(e, || "logged-in user".to_string()))?;
        Ok(entity.normalized())
    }

    /// Resolves a user reference to its identity record.
    ///
    /// # Errors
    ///
    /// Returns `TpError::NotFound` if no user matches.
    pub async fn resolve_user(&self, user: &UserRef) -> Result<Entity, TpError> {
        match user {
            UserRef::Me => self.logged_user().await,
            UserRef::Id(id) => {
                self.get_by_id(EntityType::GeneralUser, *id, Some(USER_INCLUDE))
                    .await
            }
            UserRef::Email(email) => {
                let filter = Filter::new().and(Constraint::eq("Email", email.as_str()));
                let page = self
                    .list(
                        EntityType::GeneralUser,
                        filter.render().as_deref(),
                        Some(USER_INCLUDE),
                        1,
                    )
                    .await?;
                page.items
                    .into_iter()
                    .next()
                    .ok_or_else(|| TpError::not_found(format!("user with email '{}'", email)))
            }
        }
    }

    /// Lists the work items assigned to a user, by resolved user id.
    ///
    /// Each returned item is the assignable record of one assignment; an item
    /// the user holds several roles on appears once.
    pub async fn list_assignments(
        &self,
        user_id: i64,
        query: &AssignmentQuery,
    ) -> Result<EntityPage, TpError> {
        Self::validate_id(user_id, "user_id")?;
        let filter = query.to_filter(user_id);

        let page = self
            .list(
                EntityType::Assignment,
                filter.render().as_deref(),
                Some(ASSIGNMENT_INCLUDE),
                query.take,
            )
            .await?;

        let mut seen = Vec::new();
        let mut items = Vec::new();
        for assignment in page.items {
            let Some(Value::Object(assignable)) = assignment.get("Assignable").cloned() else {
                continue;
            };
            let assignable = Entity::from_fields(assignable);
            if let Some(id) = assignable.id() {
                if seen.contains(&id) {
                    continue;
                }
                seen.push(id);
            }
            items.push(assignable);
        }

        Ok(EntityPage::new(items, page.has_more))
    }
}

/// Turns a 404 status into `NotFound` naming what was looked up.
fn not_found_on_404(err: TpError, what: impl FnOnce() -> String) -> TpError {
    match err {
        TpError::HttpStatus { status, .. } if status == StatusCode::NOT_FOUND => {
            TpError::not_found(what())
        }
        other => other,
    }
}
