// Group Administration

use crate::application::endpoints::ApiOperation;
use crate::application::session::Session;
use crate::domain::{normalize_group_name, GroupSummary, GroupToken};
use crate::error::{CodexError, Result};
use crate::port::http_transport::RequestBody;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

pub struct AdminClient {
    session: Arc<Session>,
}

impl AdminClient {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    /// Groups visible to the logged-in user
    pub async fn list_groups(&self) -> Result<Vec<GroupSummary>> {
        let body = self.session.call_json(ApiOperation::ListGroups).await?;
        let results = body
            .get("Results")
            .cloned()
            .ok_or_else(|| CodexError::invalid_response("Results", "missing from group list"))?;
        Ok(serde_json::from_value(results)?)
    }

    /// Create a group and return its token (shown only once by the platform)
    pub async fn create_group(&self, name: &str, description: &str) -> Result<GroupToken> {
        let name = normalize_group_name(name);
        if name.is_empty() {
            return Err(CodexError::Input("Group name cannot be empty.".to_string()));
        }

        let body = RequestBody::Form(vec![
            ("name".to_string(), name.clone()),
            ("description".to_string(), description.to_string()),
        ]);
        let response = self
            .session
            .call_with(ApiOperation::CreateGroup, body, Vec::new())
            .await?
            .json()?;

        let token = group_token(&response)?;
        info!(group = %name, "Group created. Save its token, it will not be shown again");
        Ok(token)
    }

    /// New token for `name`; unchanged while still valid unless `force`
    pub async fn refresh_group_token(&self, name: &str, force: bool) -> Result<GroupToken> {
        let query = vec![("force".to_string(), force.to_string())];
        let response = self
            .session
            .call_with(
                ApiOperation::RefreshGroupToken { group: name },
                RequestBody::Empty,
                query,
            )
            .await?
            .json()?;

        let token = group_token(&response)?;
        info!(group = %name, force, "Group token refreshed");
        Ok(token)
    }

    /// Fail with a group error unless `group` is listed
    pub async fn ensure_group_exists(&self, group: &str) -> Result<()> {
        let groups = self.list_groups().await?;
        if groups.iter().any(|g| g.name == group) {
            return Ok(());
        }
        Err(CodexError::Group(format!(
            "Group '{group}' does not exist. Create a group first."
        )))
    }
}

fn group_token(response: &Value) -> Result<GroupToken> {
    response
        .get("Token")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CodexError::invalid_response("Token", "missing from group response"))
}
