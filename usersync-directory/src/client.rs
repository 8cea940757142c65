//! Blocking Admin Directory client.

use std::time::Duration;

use usersync_core::{Config, DirectoryError, DirectorySource, Email, SourceUser};

use crate::credentials::Credentials;
use crate::users::{ApiUser, MessagingField, UsersPage};

/// Largest page `users.list` accepts.
pub const MAX_RESULTS: u32 = 500;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// What to ask the directory for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryOptions {
    pub domain: String,
    /// `None` lists users without any custom schema fields.
    pub custom_field_mask: Option<String>,
    pub messaging: MessagingField,
    pub api_url: String,
}

impl DirectoryOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            domain: config.google_domain.clone(),
            custom_field_mask: config.custom_field_mask.clone(),
            messaging: MessagingField {
                schema: config.messaging_schema.clone(),
                field: config.messaging_field.clone(),
            },
            api_url: config.directory_api_url.clone(),
        }
    }
}

/// Google Workspace directory, authenticated once per run.
pub struct GoogleDirectory {
    agent: ureq::Agent,
    options: DirectoryOptions,
    access_token: String,
}

pub(crate) fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(CONNECT_TIMEOUT)
        .timeout_read(READ_TIMEOUT)
        .build()
}

impl GoogleDirectory {
    /// Exchange `credentials` for an access token and return a ready client.
    pub fn connect(
        options: DirectoryOptions,
        credentials: &Credentials,
    ) -> Result<Self, DirectoryError> {
        let agent = agent();
        let access_token = credentials.access_token(&agent)?;
        tracing::info!("authenticated to directory for domain {}", options.domain);
        Ok(Self {
            agent,
            options,
            access_token,
        })
    }

    /// Build a client around an already issued access token.
    pub fn with_access_token(options: DirectoryOptions, access_token: impl Into<String>) -> Self {
        Self {
            agent: agent(),
            options,
            access_token: access_token.into(),
        }
    }

    pub fn options(&self) -> &DirectoryOptions {
        &self.options
    }

    fn users_url(&self) -> String {
        format!(
            "{}/admin/directory/v1/users",
            self.options.api_url.trim_end_matches('/')
        )
    }

    fn authorized(&self, request: ureq::Request) -> ureq::Request {
        request.set("Authorization", &format!("Bearer {}", self.access_token))
    }

    fn with_projection(&self, request: ureq::Request) -> ureq::Request {
        match &self.options.custom_field_mask {
            Some(mask) => request
                .query("projection", "custom")
                .query("customFieldMask", mask),
            None => request,
        }
    }

    fn list_page(&self, page_token: Option<&str>) -> Result<UsersPage, DirectoryError> {
        let url = self.users_url();
        let mut request = self
            .authorized(self.agent.get(&url))
            .query("domain", &self.options.domain)
            .query("orderBy", "email")
            .query("maxResults", &MAX_RESULTS.to_string());
        request = self.with_projection(request);
        if let Some(token) = page_token {
            request = request.query("pageToken", token);
        }
        let body = send(request, &url)?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl DirectorySource for GoogleDirectory {
    fn fetch_all_users(&self) -> Result<Vec<SourceUser>, DirectoryError> {
        let mut users = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self.list_page(page_token.as_deref())?;
            pages += 1;
            tracing::debug!("directory page {pages}: {} users", page.users.len());
            users.extend(
                page.users
                    .iter()
                    .map(|u| self.options.messaging.to_source_user(u)),
            );
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::info!(
            "fetched {} users from directory in {pages} page(s)",
            users.len()
        );
        Ok(users)
    }

    fn fetch_user(&self, email: &Email) -> Result<SourceUser, DirectoryError> {
        let url = format!("{}/{}", self.users_url(), email);
        let mut request = self.authorized(self.agent.get(&url));
        request = self.with_projection(request);
        let body = match send(request, &url) {
            Err(DirectoryError::Status { status: 404, .. }) => {
                return Err(DirectoryError::UserNotFound {
                    email: email.to_string(),
                })
            }
            other => other?,
        };
        let user: ApiUser = serde_json::from_str(&body)?;
        Ok(self.options.messaging.to_source_user(&user))
    }
}

fn send(request: ureq::Request, url: &str) -> Result<String, DirectoryError> {
    match request.call() {
        Ok(response) => response.into_string().map_err(|e| DirectoryError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        }),
        Err(ureq::Error::Status(status, response)) => Err(DirectoryError::Status {
            url: url.to_string(),
            status,
            body: response.into_string().unwrap_or_default(),
        }),
        Err(ureq::Error::Transport(t)) => Err(DirectoryError::Transport {
            url: url.to_string(),
            message: t.to_string(),
        }),
    }
}
