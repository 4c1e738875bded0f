//! Google Calendar provider implementation

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeDelta, Utc};
use leadsync_common::auth::{OAuthError, TokenResponse, TokenSet};
use leadsync_core::CalendarProvider;
use leadsync_domain::constants::{EVENTS_PAGE_SIZE, TASKS_PAGE_SIZE};
use leadsync_domain::{
    GoogleConfig, ImportWindow, LeadSyncError, NewRemoteEvent, NewRemoteTask, RemoteEvent,
    RemoteTask, RemoteTaskStatus, Result,
};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use super::wire::{
    Created, EventDateTime, EventsPage, GoogleEvent, GoogleTask, InsertEvent, InsertTask,
    TasksPage,
};
use crate::http::HttpClient;

/// Error bodies are cut to this many characters in messages.
const ERROR_BODY_LIMIT: usize = 300;

/// Upper bound on pages fetched by one listing.
const MAX_PAGES: usize = 40;

/// Google Calendar + Tasks provider
pub struct GoogleCalendarProvider {
    http: HttpClient,
    config: GoogleConfig,
}

impl GoogleCalendarProvider {
    /// Build a provider whose requests time out after
    /// `config.request_timeout_secs`.
    ///
    /// # Errors
    /// Returns [`LeadSyncError::Config`] for unparsable endpoints.
    pub fn new(config: GoogleConfig) -> Result<Self> {
        Url::parse(&config.authorization_endpoint).map_err(|e| {
            LeadSyncError::Config(format!("invalid google.authorization_endpoint: {e}"))
        })?;

        // one retry for reads; creates are never retried
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .max_attempts(2)
            .user_agent(concat!("leadsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.config.calendar_api_base.trim_end_matches('/'),
            urlencoding::encode(&self.config.calendar_id)
        )
    }

    fn tasks_url(&self) -> String {
        format!(
            "{}/lists/{}/tasks",
            self.config.tasks_api_base.trim_end_matches('/'),
            urlencoding::encode(&self.config.task_list_id)
        )
    }

    async fn token_request(&self, grant: &[(&str, &str)]) -> Result<TokenSet> {
        let mut form: Vec<(&str, &str)> = vec![("client_id", self.config.client_id.as_str())];
        if let Some(secret) = self.config.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }
        form.extend_from_slice(grant);

        let response = self
            .http
            .send(self.http.request(Method::POST, &self.config.token_endpoint).form(&form))
            .await?;

        let status = response.status();
        if status.is_success() {
            let tokens: TokenResponse = parse_json(response, "token response").await?;
            return Ok(tokens.into());
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<OAuthError>(&body) {
            // rejected grants come back as 400/401 with an OAuth error body
            Ok(oauth) if status.is_client_error() => Err(LeadSyncError::Auth(oauth.to_string())),
            _ if status == StatusCode::UNAUTHORIZED => {
                Err(LeadSyncError::Auth(format!("token endpoint returned {status}")))
            }
            _ => Err(LeadSyncError::Provider(format!(
                "token endpoint returned {status}: {}",
                truncate(&body)
            ))),
        }
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    fn authorization_url(&self, state: &str, code_challenge: &str) -> Result<String> {
        let scope = self.config.scopes.join(" ");
        let url = Url::parse_with_params(
            &self.config.authorization_endpoint,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("include_granted_scopes", "true"),
                ("state", state),
                ("code_challenge", code_challenge),
                ("code_challenge_method", "S256"),
            ],
        )
        .map_err(|e| LeadSyncError::Config(format!("invalid authorization endpoint: {e}")))?;

        Ok(url.into())
    }

    #[instrument(skip_all)]
    async fn exchange_code(&self, code: &str, code_verifier: &str) -> Result<TokenSet> {
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ])
        .await
    }

    #[instrument(skip_all)]
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenSet> {
        self.token_request(&[("grant_type", "refresh_token"), ("refresh_token", refresh_token)])
            .await
    }

    #[instrument(skip_all)]
    async fn revoke_token(&self, token: &str) -> Result<()> {
        let response = self
            .http
            .send(
                self.http
                    .request(Method::POST, &self.config.revoke_endpoint)
                    .form(&[("token", token)]),
            )
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(LeadSyncError::Provider(format!("revoke returned {status}: {}", truncate(&body))))
    }

    #[instrument(skip(self, access_token), fields(start = %window.start, end = %window.end))]
    async fn list_events(
        &self,
        access_token: &str,
        window: &ImportWindow,
    ) -> Result<Vec<RemoteEvent>> {
        let url = self.events_url();
        // timeMin filters on event end and timeMax is exclusive; start is
        // checked below
        let time_min = window.start.to_rfc3339_opts(SecondsFormat::Secs, true);
        let time_max = window
            .end
            .checked_add_signed(TimeDelta::seconds(1))
            .unwrap_or(window.end)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let page_size = EVENTS_PAGE_SIZE.to_string();

        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        for page_number in 1.. {
            let mut query: Vec<(&str, &str)> = vec![
                ("timeMin", time_min.as_str()),
                ("timeMax", time_max.as_str()),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response = self
                .http
                .send(self.http.request(Method::GET, &url).bearer_auth(access_token).query(&query))
                .await?;
            let page: EventsPage =
                parse_json(check_status(response, "events.list").await?, "events page").await?;

            events.extend(
                page.items
                    .into_iter()
                    .filter_map(into_remote_event)
                    .filter(|event| event.start >= window.start && event.start <= window.end),
            );

            page_token = next_page(page_token, page.next_page_token, page_number, "events.list");
            if page_token.is_none() {
                break;
            }
        }

        debug!(count = events.len(), "events listed");
        Ok(events)
    }

    #[instrument(skip_all)]
    async fn create_event(&self, access_token: &str, event: &NewRemoteEvent) -> Result<String> {
        let body = InsertEvent {
            summary: &event.summary,
            description: event.description.as_deref(),
            start: EventDateTime {
                date_time: Some(event.start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                time_zone: Some(event.timezone.clone()),
                ..EventDateTime::default()
            },
            end: EventDateTime {
                date_time: Some(event.end.to_rfc3339_opts(SecondsFormat::Secs, true)),
                time_zone: Some(event.timezone.clone()),
                ..EventDateTime::default()
            },
        };

        let response = self
            .http
            .send(
                self.http
                    .request(Method::POST, self.events_url())
                    .bearer_auth(access_token)
                    .json(&body),
            )
            .await?;
        let created: Created =
            parse_json(check_status(response, "events.insert").await?, "created event").await?;

        debug!(event_id = %created.id, "event created");
        Ok(created.id)
    }

    #[instrument(skip_all)]
    async fn create_task(&self, access_token: &str, task: &NewRemoteTask) -> Result<String> {
        let body = InsertTask {
            title: &task.title,
            notes: task.notes.as_deref(),
            due: task.due.to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let response = self
            .http
            .send(
                self.http
                    .request(Method::POST, self.tasks_url())
                    .bearer_auth(access_token)
                    .json(&body),
            )
            .await?;
        let created: Created =
            parse_json(check_status(response, "tasks.insert").await?, "created task").await?;

        debug!(task_id = %created.id, "task created");
        Ok(created.id)
    }

    #[instrument(skip_all)]
    async fn list_tasks(&self, access_token: &str) -> Result<Vec<RemoteTask>> {
        let url = self.tasks_url();
        let page_size = TASKS_PAGE_SIZE.to_string();

        let mut tasks = Vec::new();
        let mut page_token: Option<String> = None;
        for page_number in 1.. {
            let mut query: Vec<(&str, &str)> = vec![
                ("showCompleted", "true"),
                ("showHidden", "true"),
                ("maxResults", page_size.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }

            let response = self
                .http
                .send(self.http.request(Method::GET, &url).bearer_auth(access_token).query(&query))
                .await?;
            let page: TasksPage =
                parse_json(check_status(response, "tasks.list").await?, "tasks page").await?;

            tasks.extend(page.items.into_iter().filter_map(into_remote_task));

            page_token = next_page(page_token, page.next_page_token, page_number, "tasks.list");
            if page_token.is_none() {
                break;
            }
        }

        debug!(count = tasks.len(), "tasks listed");
        Ok(tasks)
    }
}

/// Token for the next request, or `None` to stop paging.
///
/// Stops on a token that repeats the current one and after [`MAX_PAGES`].
fn next_page(
    current: Option<String>,
    next: Option<String>,
    page_number: usize,
    operation: &str,
) -> Option<String> {
    let next = next?;
    if current.as_deref() == Some(next.as_str()) {
        warn!(operation, page_token = %next, "provider repeated a page token; stopping");
        return None;
    }
    if page_number >= MAX_PAGES {
        warn!(operation, pages = page_number, "page limit reached; remaining pages skipped");
        return None;
    }
    Some(next)
}

/// 401 → `Auth`; any other non-2xx → `Provider`.
async fn check_status(response: Response, operation: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::UNAUTHORIZED {
        return Err(LeadSyncError::Auth(format!("{operation}: access token rejected")));
    }
    Err(LeadSyncError::Provider(format!("{operation} returned {status}: {}", truncate(&body))))
}

async fn parse_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| LeadSyncError::Provider(format!("failed to parse {what}: {e}")))
}

fn into_remote_event(event: GoogleEvent) -> Option<RemoteEvent> {
    if event.status.as_deref() == Some("cancelled") {
        return None;
    }

    let Some(start) = event.start.as_ref() else {
        warn!(event_id = %event.id, "event without start; ignored");
        return None;
    };

    let (start, all_day) = match (start.date_time.as_deref(), start.date.as_deref()) {
        (Some(raw), _) => match DateTime::parse_from_rfc3339(raw) {
            Ok(at) => (at.with_timezone(&Utc), false),
            Err(err) => {
                warn!(event_id = %event.id, error = %err, "unparsable event start; ignored");
                return None;
            }
        },
        (None, Some(raw)) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => (date.and_hms_opt(0, 0, 0)?.and_utc(), true),
            Err(err) => {
                warn!(event_id = %event.id, error = %err, "unparsable all-day date; ignored");
                return None;
            }
        },
        (None, None) => return None,
    };

    Some(RemoteEvent {
        id: event.id,
        summary: event.summary,
        description: event.description,
        start,
        all_day,
    })
}

fn into_remote_task(task: GoogleTask) -> Option<RemoteTask> {
    if task.deleted {
        return None;
    }

    let status = match task.status.as_deref() {
        Some("completed") => RemoteTaskStatus::Completed,
        _ => RemoteTaskStatus::NeedsAction,
    };
    let due = task
        .due
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|at| at.with_timezone(&Utc));

    Some(RemoteTask { id: task.id, title: task.title, notes: task.notes, status, due })
}

fn truncate(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}
