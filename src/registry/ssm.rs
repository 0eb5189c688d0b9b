//! Durable registry backed by AWS SSM Parameter Store.
//!
//! Layout under the configured prefix:
//! - `installations/{owner}`: SecureString JSON [`WorkspaceInstallation`], overwritten on upsert
//! - `channels/{owner}/{channel}`: enrollment marker, created with `overwrite(false)`

use async_trait::async_trait;
use aws_sdk_ssm::{Client as SsmClient, types::Parameter, types::ParameterType};
use chrono::Utc;
use std::collections::HashMap;
use tracing::{info, warn};

use super::{DestinationRegistry, InstallationStore, require_ids};
use crate::core::models::{Destination, WorkspaceInstallation};
use crate::errors::BotError;

pub struct SsmStore {
    client: SsmClient,
    prefix: String,
}

fn normalize_prefix(prefix: &str) -> String {
    let mut p = prefix.to_string();
    if !p.starts_with('/') {
        p.insert(0, '/');
    }
    if !p.ends_with('/') {
        p.push('/');
    }
    p
}

impl SsmStore {
    #[must_use]
    pub fn new(client: SsmClient, prefix: &str) -> Self {
        Self {
            client,
            prefix: normalize_prefix(prefix),
        }
    }

    /// Build a store from the ambient AWS configuration.
    pub async fn from_env(prefix: &str) -> Self {
        let shared = aws_config::from_env().load().await;
        Self::new(SsmClient::new(&shared), prefix)
    }

    fn installation_key(&self, owner_id: &str) -> String {
        format!("{}installations/{owner_id}", self.prefix)
    }

    fn channels_path(&self) -> String {
        format!("{}channels/", self.prefix)
    }

    fn channel_key(&self, owner_id: &str, channel_id: &str) -> String {
        format!("{}{owner_id}/{channel_id}", self.channels_path())
    }

    /// Split `…/channels/{owner}/{channel}` back into its ids.
    fn parse_channel_key<'a>(&self, name: &'a str) -> Option<(&'a str, &'a str)> {
        let rest = name.strip_prefix(self.channels_path().as_str())?;
        let (owner, channel) = rest.split_once('/')?;
        if owner.is_empty() || channel.is_empty() || channel.contains('/') {
            return None;
        }
        Some((owner, channel))
    }

    async fn parameters_by_path(
        &self,
        path: &str,
        recursive: bool,
        decrypt: bool,
    ) -> Result<Vec<Parameter>, BotError> {
        let mut out = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let resp = self
                .client
                .get_parameters_by_path()
                .path(path)
                .recursive(recursive)
                .with_decryption(decrypt)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| BotError::AwsError(format!("ssm get_parameters_by_path: {e}")))?;

            out.extend(resp.parameters().iter().cloned());

            match resp.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(out)
    }
}

fn parse_installation(param: &Parameter) -> Option<WorkspaceInstallation> {
    let value = param.value()?;
    match serde_json::from_str(value) {
        Ok(installation) => Some(installation),
        Err(e) => {
            warn!(name = ?param.name(), "Skipping unreadable installation record: {}", e);
            None
        }
    }
}

/// Pair each enrolled channel with its workspace token, looking each owner up once.
///
/// Channels of an owner whose lookup fails are left out so the rest still run.
async fn attach_tokens<F, Fut>(enrolled: Vec<(String, String)>, mut lookup: F) -> Vec<Destination>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Option<WorkspaceInstallation>, BotError>>,
{
    let mut tokens: HashMap<String, Result<Option<String>, ()>> = HashMap::new();
    let mut destinations = Vec::with_capacity(enrolled.len());

    for (owner, channel) in enrolled {
        if !tokens.contains_key(&owner) {
            let token = match lookup(owner.clone()).await {
                Ok(installation) => Ok(installation.map(|i| i.access_token)),
                Err(e) => {
                    warn!(owner_id = %owner, "Skipping workspace, installation lookup failed: {}", e);
                    Err(())
                }
            };
            tokens.insert(owner.clone(), token);
        }
        if let Some(Ok(token)) = tokens.get(&owner) {
            destinations.push(Destination::new(owner, channel).with_access_token(token.clone()));
        }
    }

    destinations
}

#[async_trait]
impl InstallationStore for SsmStore {
    async fn upsert(&self, installation: &WorkspaceInstallation) -> Result<(), BotError> {
        let value = serde_json::to_string(installation)
            .map_err(|e| BotError::ParseError(format!("installation serialize: {e}")))?;

        self.client
            .put_parameter()
            .name(self.installation_key(&installation.owner_id))
            .value(value)
            .r#type(ParameterType::SecureString)
            .overwrite(true)
            .send()
            .await
            .map_err(|e| BotError::AwsError(format!("ssm put_parameter: {e}")))?;

        info!(owner_id = %installation.owner_id, "Stored workspace installation");
        Ok(())
    }

    async fn find(&self, owner_id: &str) -> Result<Option<WorkspaceInstallation>, BotError> {
        match self
            .client
            .get_parameter()
            .name(self.installation_key(owner_id))
            .with_decryption(true)
            .send()
            .await
        {
            Ok(resp) => Ok(resp.parameter().and_then(parse_installation)),
            Err(e) => {
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_parameter_not_found())
                {
                    Ok(None)
                } else {
                    Err(BotError::AwsError(format!("ssm get_parameter: {e}")))
                }
            }
        }
    }

    async fn list_all(&self) -> Result<Vec<WorkspaceInstallation>, BotError> {
        let path = format!("{}installations/", self.prefix);
        let params = self.parameters_by_path(&path, false, true).await?;
        Ok(params.iter().filter_map(parse_installation).collect())
    }
}

#[async_trait]
impl DestinationRegistry for SsmStore {
    async fn enroll(&self, owner_id: &str, channel_id: &str) -> Result<bool, BotError> {
        require_ids(owner_id, channel_id)?;

        let result = self
            .client
            .put_parameter()
            .name(self.channel_key(owner_id, channel_id))
            .value(Utc::now().to_rfc3339())
            .r#type(ParameterType::String)
            .overwrite(false)
            .send()
            .await;

        match result {
            Ok(_) => {
                info!(owner_id, channel_id, "Enrolled channel");
                Ok(true)
            }
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_parameter_already_exists()) =>
            {
                Ok(false)
            }
            Err(e) => Err(BotError::AwsError(format!("ssm put_parameter: {e}"))),
        }
    }

    async fn list_channels(&self, owner_id: &str) -> Result<Vec<String>, BotError> {
        let path = format!("{}{owner_id}/", self.channels_path());
        let params = self.parameters_by_path(&path, false, false).await?;
        Ok(params
            .iter()
            .filter_map(Parameter::name)
            .filter_map(|name| self.parse_channel_key(name))
            .map(|(_, channel)| channel.to_string())
            .collect())
    }

    async fn all_destinations(&self) -> Result<Vec<Destination>, BotError> {
        let params = self
            .parameters_by_path(&self.channels_path(), true, false)
            .await?;

        let mut enrolled = Vec::with_capacity(params.len());
        for name in params.iter().filter_map(Parameter::name) {
            match self.parse_channel_key(name) {
                Some((owner, channel)) => enrolled.push((owner.to_string(), channel.to_string())),
                None => warn!(name, "Ignoring malformed enrollment parameter"),
            }
        }

        Ok(attach_tokens(enrolled, |owner| async move { self.find(&owner).await }).await)
    }

    async fn remove(&self, owner_id: &str, channel_id: &str) -> Result<bool, BotError> {
        match self
            .client
            .delete_parameter()
            .name(self.channel_key(owner_id, channel_id))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e)
                if e
                    .as_service_error()
                    .is_some_and(|se| se.is_parameter_not_found()) =>
            {
                Ok(false)
            }
            Err(e) => Err(BotError::AwsError(format!("ssm delete_parameter: {e}"))),
        }
    }
}
