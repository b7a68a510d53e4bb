//! Flatastic Integration Adapter
//!
//! Pulls chores from the Flatastic household app and turns them into
//! taskwarrior tasks. Flatastic publishes no API documentation; the two
//! endpoints used here are the ones its web app calls.
//!
//! A run is strictly sequential: log in once, list chores once, then
//! normalize each chore as the caller iterates.

use crate::config::FlatasticConfig;
use crate::integrations::service::{Issue, IssueIter, IssueService, ServiceMetadata};
use crate::taskwarrior::{
    truncate_to_minute, TaskRecord, UdaDefinition, UdaType, UdaValue,
};
use crate::{ChoreSyncError, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::{Clock, DefaultClock};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Per-request timeout for the login call
const LOGIN_TIMEOUT: Duration = Duration::from_secs(15);
/// Per-request timeout for the chore list
const LIST_TIMEOUT: Duration = Duration::from_secs(30);

/// Header carrying the session key, both in the login reply and on requests
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Unauthenticated Flatastic client
pub struct FlatasticClient {
    client: Client,
    base_url: String,
}

/// Authenticated Flatastic session
///
/// Holds the API key as a default header for as long as it lives. The key is
/// never renewed.
pub struct FlatasticSession {
    client: Client,
    base_url: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "X-API-KEY", default)]
    api_key: Option<String>,
}

impl FlatasticClient {
    /// Create a client against the given API root
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Log in and open a session
    ///
    /// Rejected credentials and replies without an API key are
    /// [`ChoreSyncError::Auth`]; network trouble and server errors are
    /// transport failures.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<FlatasticSession> {
        let url = format!("{}/api/auth/login", self.base_url);

        debug!(email = %email, "Logging in to Flatastic");

        let response = self
            .client
            .post(&url)
            .form(&[("email", email), ("password", password)])
            .timeout(LOGIN_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ChoreSyncError::Transport(format!(
                "Flatastic login failed: HTTP {}: {}",
                status, error_body
            )));
        }
        if !status.is_success() {
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    ChoreSyncError::Auth("Flatastic rejected the credentials".to_string())
                }
                status => ChoreSyncError::Auth(format!("Flatastic login failed: HTTP {}", status)),
            });
        }

        let body = response.text().await?;
        let login: LoginResponse = serde_json::from_str(&body).map_err(|e| {
            ChoreSyncError::Auth(format!("Malformed Flatastic login response: {}", e))
        })?;
        let api_key = login
            .api_key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ChoreSyncError::Auth(format!(
                    "Flatastic login response did not contain {}",
                    API_KEY_HEADER
                ))
            })?;

        let mut key_value = HeaderValue::from_str(&api_key).map_err(|_| {
            ChoreSyncError::Auth("Flatastic returned an unusable API key".to_string())
        })?;
        key_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(HeaderName::from_static("x-api-key"), key_value);

        let client = Client::builder().default_headers(headers).build()?;

        info!(email = %email, "Authenticated with Flatastic");

        Ok(FlatasticSession {
            client,
            base_url: self.base_url.clone(),
            email: email.to_string(),
            password: password.to_string(),
        })
    }
}

impl FlatasticSession {
    /// Fetch every chore of the flat as raw JSON objects
    ///
    /// An empty or `null` reply is an empty list. Any error status, including
    /// a rejected API key, and anything that is not a JSON array is a
    /// transport failure.
    pub async fn list_chores(&self) -> Result<Vec<Value>> {
        let url = format!("{}/api/chores", self.base_url);

        debug!("Fetching Flatastic chores");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.email, Some(&self.password))
            .timeout(LIST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ChoreSyncError::Transport(format!(
                "Flatastic API error listing chores: HTTP {}: {}",
                status, error_body
            )));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }

        let chores: Option<Vec<Value>> = serde_json::from_str(&body).map_err(|e| {
            ChoreSyncError::Transport(format!("Flatastic returned an unreadable chore list: {}", e))
        })?;
        let chores = chores.unwrap_or_default();

        info!(count = chores.len(), "Fetched Flatastic chores");
        Ok(chores)
    }
}

/// A chore as Flatastic sends it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoreRecord {
    pub id: i64,
    pub title: String,
    pub details: String,
    pub current_user: i64,
    pub points: i64,
    /// Epoch seconds
    pub last_done_date: i64,
    /// Seconds from now until the chore is due; negative when overdue
    pub time_left_next: i64,
}

impl ChoreRecord {
    /// Read a chore out of a raw JSON object
    ///
    /// Numbers may come as JSON numbers or numeric strings.
    pub fn from_value(value: &Value) -> Result<Self> {
        Ok(Self {
            id: number_field(value, "id")?,
            title: string_field(value, "title")?,
            details: string_field(value, "details")?,
            current_user: number_field(value, "currentUser")?,
            points: number_field(value, "points")?,
            last_done_date: number_field(value, "lastDoneDate")?,
            time_left_next: number_field(value, "timeLeftNext")?,
        })
    }
}

fn present<'a>(value: &'a Value, field: &'static str) -> Result<&'a Value> {
    match value.get(field) {
        None | Some(Value::Null) => Err(ChoreSyncError::MissingField(field)),
        Some(v) => Ok(v),
    }
}

// i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
const I64_MIN_F64: f64 = i64::MIN as f64;
const I64_END_F64: f64 = -(i64::MIN as f64);

fn number_field(value: &Value, field: &'static str) -> Result<i64> {
    match present(value, field)? {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            if n.is_u64() {
                return Err(ChoreSyncError::invalid_field(
                    field,
                    format!("{} is out of range", n),
                ));
            }
            match n.as_f64() {
                Some(f) if f.fract() != 0.0 => Err(ChoreSyncError::invalid_field(
                    field,
                    format!("{} is not an integer", n),
                )),
                Some(f) if (I64_MIN_F64..I64_END_F64).contains(&f) => Ok(f as i64),
                _ => Err(ChoreSyncError::invalid_field(
                    field,
                    format!("{} is out of range", n),
                )),
            }
        }
        Value::String(s) => s.trim().parse().map_err(|_| {
            ChoreSyncError::invalid_field(field, format!("'{}' is not an integer", s))
        }),
        other => Err(ChoreSyncError::invalid_field(
            field,
            format!("expected a number, got {}", other),
        )),
    }
}

fn string_field(value: &Value, field: &'static str) -> Result<String> {
    match present(value, field)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(ChoreSyncError::invalid_field(
            field,
            format!("expected a string, got {}", other),
        )),
    }
}

/// A chore normalized against a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct FlatasticIssue {
    pub record: ChoreRecord,
    /// When the chore was last done
    pub entry: DateTime<Utc>,
    /// Fetch time plus the remaining offset, to the minute
    pub due: DateTime<Utc>,
    pub tags: Vec<String>,
    pub description: String,
    pub priority: crate::taskwarrior::Priority,
}

impl FlatasticIssue {
    pub const ID: &'static str = "flatasticid";
    pub const TITLE: &'static str = "flatastictitle";
    pub const DETAILS: &'static str = "flatasticdetails";
    pub const CURRENT_USER: &'static str = "flatasticcurrentuser";
    pub const POINTS: &'static str = "flatasticpoints";
    pub const LAST_DONE_DATE: &'static str = "flatasticlastdonedate";
    pub const NEXT_EXECUTION_TIME: &'static str = "flatasticnextexecution";

    /// Map a raw chore to an issue as of `now`
    ///
    /// Fails on the first missing or malformed field.
    pub fn normalize(record: &Value, now: DateTime<Utc>, metadata: &ServiceMetadata) -> Result<Self> {
        let record = ChoreRecord::from_value(record)?;

        let entry = DateTime::from_timestamp(record.last_done_date, 0).ok_or_else(|| {
            ChoreSyncError::invalid_field("lastDoneDate", "timestamp out of range")
        })?;
        let due = TimeDelta::try_seconds(record.time_left_next)
            .and_then(|offset| now.checked_add_signed(offset))
            .map(truncate_to_minute)
            .ok_or_else(|| ChoreSyncError::invalid_field("timeLeftNext", "offset out of range"))?;

        let tags = metadata.tags_from_labels(&[])?;
        let description = metadata.build_default_description(&record.title, "", "");

        Ok(Self {
            entry,
            due,
            tags,
            description,
            priority: metadata.default_priority,
            record,
        })
    }

    /// Same instant as `due`
    pub fn next_execution_time(&self) -> DateTime<Utc> {
        self.due
    }

    /// Flatastic user id the chore is currently assigned to
    pub fn owner(&self) -> String {
        self.record.current_user.to_string()
    }
}

const FLATASTIC_UDAS: &[UdaDefinition] = &[
    UdaDefinition {
        name: FlatasticIssue::ID,
        kind: UdaType::Numeric,
        label: "Flatastic Chore ID",
    },
    UdaDefinition {
        name: FlatasticIssue::TITLE,
        kind: UdaType::String,
        label: "Flatastic Title",
    },
    UdaDefinition {
        name: FlatasticIssue::DETAILS,
        kind: UdaType::String,
        label: "Flatastic Details",
    },
    UdaDefinition {
        name: FlatasticIssue::CURRENT_USER,
        kind: UdaType::Numeric,
        label: "Flatastic Current User",
    },
    UdaDefinition {
        name: FlatasticIssue::POINTS,
        kind: UdaType::Numeric,
        label: "Flatastic Points",
    },
    UdaDefinition {
        name: FlatasticIssue::LAST_DONE_DATE,
        kind: UdaType::Date,
        label: "Flatastic Last Done Date",
    },
    UdaDefinition {
        name: FlatasticIssue::NEXT_EXECUTION_TIME,
        kind: UdaType::Date,
        label: "Flatastic Next Execution Time",
    },
];

impl Issue for FlatasticIssue {
    const UNIQUE_KEY: &'static [&'static str] = &[FlatasticIssue::ID];

    fn udas() -> &'static [UdaDefinition] {
        FLATASTIC_UDAS
    }

    fn uda(&self, name: &str) -> Option<UdaValue> {
        let value = match name {
            Self::ID => UdaValue::Numeric(self.record.id),
            Self::TITLE => UdaValue::String(self.record.title.clone()),
            Self::DETAILS => UdaValue::String(self.record.details.clone()),
            Self::CURRENT_USER => UdaValue::Numeric(self.record.current_user),
            Self::POINTS => UdaValue::Numeric(self.record.points),
            Self::LAST_DONE_DATE => UdaValue::Date(self.entry),
            Self::NEXT_EXECUTION_TIME => UdaValue::Date(self.next_execution_time()),
            _ => return None,
        };
        Some(value)
    }

    fn to_taskwarrior(&self) -> TaskRecord {
        let udas: BTreeMap<String, UdaValue> = FLATASTIC_UDAS
            .iter()
            .filter_map(|def| Some((def.name.to_string(), self.uda(def.name)?)))
            .collect();

        TaskRecord {
            description: self.description.clone(),
            project: String::new(),
            priority: self.priority,
            tags: self.tags.clone(),
            entry: self.entry,
            due: self.due,
            udas,
        }
    }
}

/// Normalize raw chores one at a time and keep those the predicate accepts
///
/// The iterator is lazy and consumes `records`. A chore that fails to
/// normalize is yielded as an error; callers stop there.
pub fn filter_and_emit<P>(
    records: Vec<Value>,
    now: DateTime<Utc>,
    metadata: ServiceMetadata,
    mut predicate: P,
) -> impl Iterator<Item = Result<FlatasticIssue>>
where
    P: FnMut(&FlatasticIssue) -> bool,
{
    records
        .into_iter()
        .filter_map(move |record| match FlatasticIssue::normalize(&record, now, &metadata) {
            Ok(issue) => {
                if predicate(&issue) {
                    Some(Ok(issue))
                } else {
                    debug!(chore_id = issue.record.id, owner = %issue.owner(), "Skipping chore");
                    None
                }
            }
            Err(e) => Some(Err(e)),
        })
}

/// Flatastic as an issue service
pub struct FlatasticService<C = DefaultClock> {
    session: FlatasticSession,
    metadata: ServiceMetadata,
    clock: C,
}

impl FlatasticService<DefaultClock> {
    /// Log in with the configured credentials
    pub async fn connect(config: &FlatasticConfig) -> Result<Self> {
        Self::connect_with_clock(config, DefaultClock).await
    }
}

impl<C> FlatasticService<C>
where
    C: Clock + Send + Sync,
{
    /// Log in, reading the current time from `clock` when chores are normalized
    pub async fn connect_with_clock(config: &FlatasticConfig, clock: C) -> Result<Self> {
        if !config.include_board_ids.is_empty() || !config.exclude_board_ids.is_empty() {
            warn!(
                include = ?config.include_board_ids,
                exclude = ?config.exclude_board_ids,
                "Flatastic chores have no boards; board filters are ignored"
            );
        }

        let password = config.resolve_password()?;
        let client = FlatasticClient::new(config.api_root())?;
        let session = client.authenticate(&config.email, &password).await?;

        Ok(Self {
            session,
            metadata: ServiceMetadata::from(config),
            clock,
        })
    }
}

#[async_trait]
impl<C> IssueService for FlatasticService<C>
where
    C: Clock + Send + Sync,
{
    type Issue = FlatasticIssue;

    fn name(&self) -> &'static str {
        "Flatastic"
    }

    fn service_metadata(&self) -> &ServiceMetadata {
        &self.metadata
    }

    fn issue_owner(&self, issue: &FlatasticIssue) -> Option<String> {
        Some(issue.owner())
    }

    async fn produce_issues<'a>(&'a self) -> Result<IssueIter<'a, FlatasticIssue>> {
        let chores = self.session.list_chores().await?;
        let now = self.clock.utc();

        let issues = filter_and_emit(chores, now, self.metadata.clone(), move |issue| {
            self.include(issue)
        });

        Ok(Box::new(issues))
    }
}
