//! Application context shared by every command: configuration, session,
//! API client and the on-disk cache.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use shepherd_core::api::is_unauthorized;
use shepherd_core::auth::{CredentialStore, Session};
use shepherd_core::cache::CacheManager;
use shepherd_core::{ApiClient, Config};
use tracing::{debug, info, warn};

/// Maximum length for username input.
const MAX_USERNAME_LENGTH: usize = 100;

pub struct App {
    pub config: Config,
    pub session: Session,
    pub cache: CacheManager,
    pub offline: bool,
    client: ApiClient,
}

impl App {
    pub fn new(offline: bool) -> Result<Self> {
        let config = Config::load().context("Failed to load config")?;
        let client = ApiClient::new(&config.api_base_url())?;
        let mut session = Session::new(Config::state_dir()?);
        if let Err(e) = session.load() {
            warn!(error = %e, "Ignoring unreadable session file");
        }
        let cache = CacheManager::new(config.cache_dir()?)?;
        debug!(api = client.base_url(), offline, "App initialized");

        Ok(Self {
            config,
            session,
            cache,
            offline,
            client,
        })
    }

    /// An authenticated client, signing in again with the stored password
    /// when the session is missing or about to expire.
    pub async fn client(&mut self) -> Result<ApiClient> {
        if self.offline {
            bail!("This command needs the API; drop --offline");
        }
        if let Some(data) = self.session.data.as_ref() {
            if !data.needs_refresh() {
                return Ok(self.client.with_token(data.token.clone()));
            }
        }

        let username = self
            .session
            .username()
            .map(String::from)
            .or_else(|| self.config.last_username.clone());
        let Some(username) = username else {
            bail!("Not signed in. Run `shepherd login` first.");
        };
        let Ok(password) = CredentialStore::get_password(&username) else {
            bail!("Session expired. Run `shepherd login` to sign in again.");
        };

        info!(username = %username, "Renewing session with stored credentials");
        self.sign_in(&username, &password).await?;
        let token = self
            .session
            .token()
            .context("Session missing after sign-in")?
            .to_string();
        Ok(self.client.with_token(token))
    }

    pub async fn login(&mut self, username: Option<String>) -> Result<()> {
        let username = match username.or_else(|| self.config.last_username.clone()) {
            Some(u) => u,
            None => Self::prompt_username()?,
        };
        let password = rpassword::prompt_password(format!("Password for {}: ", username))
            .context("Failed to read password")?;

        self.sign_in(&username, &password).await?;
        if let Err(e) = CredentialStore::store(&username, &password) {
            warn!(error = %e, "Could not store password in keychain");
        }
        Ok(())
    }

    async fn sign_in(&mut self, username: &str, password: &str) -> Result<()> {
        let data = self
            .client
            .authenticate(username, password)
            .await
            .context("Sign-in failed")?;

        if data.church_id.is_some() && data.church_id != self.config.church_id {
            self.config.church_id = data.church_id;
            self.cache = CacheManager::new(self.config.cache_dir()?)?;
        }
        self.config.last_username = Some(username.to_string());
        self.config.save().context("Failed to save config")?;

        self.session.update(data);
        self.session.save().context("Failed to save session")?;
        info!(username = %username, "Signed in");
        Ok(())
    }

    pub fn logout(&mut self) -> Result<()> {
        if let Some(username) = self.session.username().map(String::from) {
            if let Err(e) = CredentialStore::delete(&username) {
                debug!(error = %e, "No stored credentials to delete");
            }
        }
        self.session.clear()
    }

    /// Clear the session on a 401. Returns true when it did.
    pub fn handle_unauthorized(&mut self, err: &anyhow::Error) -> bool {
        if !is_unauthorized(err) {
            return false;
        }
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session after 401");
        }
        true
    }

    fn prompt_username() -> Result<String> {
        print!("Email: ");
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let username = input.trim().to_string();
        if username.is_empty() || username.len() > MAX_USERNAME_LENGTH {
            bail!("Invalid username");
        }
        Ok(username)
    }
}

/// Ask a yes/no question on the terminal; anything but y/yes is no.
pub fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("n"));
        assert!(!is_yes("yep"));
    }
}
