//! Credential-acquisition orchestration.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use log::info;

use crate::cli::SessionOptions;
use crate::console;
use crate::credentials::SessionCredentials;
use crate::error::{Error, Result};
use crate::identity::IdentityService;
use crate::prompt::TokenPrompt;
use crate::store::ProfileStore;

/// How a run ended, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Credentials were acquired and delivered to the configured outputs.
    SessionAcquired,
    /// The profile/user has no MFA device; there is nothing to refresh.
    MfaNotRegistered,
}

/// Drives one credential-acquisition run: validate the file, resolve the MFA
/// device, obtain the OTP code, call the token service, persist the result.
/// Each step is a single call; failure at any step aborts the run and nothing
/// is retried.
pub struct CredentialBroker<S, P> {
    options: SessionOptions,
    service: S,
    prompt: P,
}

impl<S, P> CredentialBroker<S, P>
where
    S: IdentityService,
    P: TokenPrompt,
{
    pub fn new(options: SessionOptions, service: S, prompt: P) -> Self {
        Self {
            options,
            service,
            prompt,
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        validate_credentials_file(&self.options.credentials_file)?;

        let Some(serial) = self.resolve_mfa_device().await? else {
            return Ok(RunOutcome::MfaNotRegistered);
        };
        let code = self.obtain_code()?;
        let credentials = self.acquire_session(&serial, &code).await?;

        // The timestamp must render before any output side effect runs.
        let expiration = credentials.expiration_timestamp()?;
        self.persist(&credentials)?;

        info!("Session credentials expire at {expiration}");
        Ok(RunOutcome::SessionAcquired)
    }

    async fn resolve_mfa_device(&self) -> Result<Option<String>> {
        self.service
            .find_mfa_device(self.options.user.as_deref())
            .await
    }

    /// A preset token bypasses the prompt entirely.
    fn obtain_code(&self) -> Result<String> {
        match &self.options.token {
            Some(token) => Ok(token.clone()),
            None => self.prompt.read_code(&self.options.profile),
        }
    }

    async fn acquire_session(&self, serial: &str, code: &str) -> Result<SessionCredentials> {
        info!(
            "Requesting session credentials - duration: {}s",
            self.options.duration
        );
        self.service
            .issue_session(serial, code, self.options.duration)
            .await
    }

    /// Console lines and the profile write are not mutually exclusive; the
    /// CLI layer guarantees at least one output target is configured.
    fn persist(&self, credentials: &SessionCredentials) -> Result<()> {
        if self.options.console {
            console::write_exports(&mut io::stdout().lock(), credentials)?;
        }
        if let Some(session_profile) = &self.options.session_profile {
            ProfileStore::new(&self.options.credentials_file).write(session_profile, credentials)?;
            info!("Stored session credentials in profile {session_profile}");
        }
        Ok(())
    }
}

/// The file must exist and be writable before anything remote happens.
/// Both failures are fatal, with no prompt and no retry. The entry point
/// runs this check before constructing the service clients, and a run
/// repeats it first thing, so file errors take precedence over profile
/// errors.
pub fn validate_credentials_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::MissingCredentialsFile(path.to_path_buf()));
    }
    // An append-mode open checks effective permissions without touching
    // the contents.
    if OpenOptions::new().append(true).open(path).is_err() {
        return Err(Error::UnwritableCredentialsFile(path.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use aws_smithy_types::DateTime;
    use std::fs;
    use std::path::Path;
    use std::sync::Mutex;
    use tempfile::tempdir;

    const SOURCE_FILE: &str = "\
[stopp]
aws_access_key_id = OLDID
aws_secret_access_key = OLDKEY
";

    fn triple() -> SessionCredentials {
        SessionCredentials {
            access_key_id: "NEWID".to_string(),
            secret_access_key: "NEWKEY".to_string(),
            session_token: "NEWTOKEN".to_string(),
            expiration: DateTime::from_secs(1_720_000_000),
        }
    }

    fn options(path: &Path) -> SessionOptions {
        SessionOptions {
            credentials_file: path.to_path_buf(),
            profile: "stopp".to_string(),
            session_profile: Some("session_profile".to_string()),
            duration: 3600,
            user: None,
            token: None,
            console: false,
        }
    }

    struct SessionRequest {
        serial: String,
        code: String,
        duration: i32,
    }

    /// Scripted identity service that records every request it sees.
    #[derive(Default)]
    struct FakeService {
        device: Option<String>,
        deny_session: bool,
        lookups: Mutex<Vec<Option<String>>>,
        sessions: Mutex<Vec<SessionRequest>>,
    }

    impl FakeService {
        fn with_device(serial: &str) -> Self {
            Self {
                device: Some(serial.to_string()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl IdentityService for FakeService {
        async fn find_mfa_device(&self, user_name: Option<&str>) -> Result<Option<String>> {
            self.lookups
                .lock()
                .unwrap()
                .push(user_name.map(str::to_string));
            Ok(self.device.clone())
        }

        async fn issue_session(
            &self,
            serial: &str,
            code: &str,
            duration_seconds: i32,
        ) -> Result<SessionCredentials> {
            if self.deny_session {
                return Err(Error::service(io::Error::other("access denied")));
            }
            self.sessions.lock().unwrap().push(SessionRequest {
                serial: serial.to_string(),
                code: code.to_string(),
                duration: duration_seconds,
            });
            Ok(triple())
        }
    }

    struct FakePrompt(&'static str);

    impl TokenPrompt for FakePrompt {
        fn read_code(&self, _profile: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    /// Fails the test if the broker consults the prompt at all.
    struct NoPrompt;

    impl TokenPrompt for NoPrompt {
        fn read_code(&self, _profile: &str) -> Result<String> {
            panic!("the prompt must not be consulted");
        }
    }

    #[tokio::test]
    async fn a_full_run_stores_the_session_block() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, SOURCE_FILE).unwrap();

        let service = FakeService::with_device("arn:aws:iam::123456789012:mfa/stopp");
        let broker = CredentialBroker::new(options(&path), service, FakePrompt("123456"));

        assert_eq!(broker.run().await.unwrap(), RunOutcome::SessionAcquired);

        let rewritten = fs::read_to_string(&path).unwrap();
        assert_eq!(
            rewritten,
            "\
[stopp]
aws_access_key_id = OLDID
aws_secret_access_key = OLDKEY
[session_profile]
aws_access_key_id = NEWID
aws_secret_access_key = NEWKEY
aws_session_token = NEWTOKEN
"
        );

        let sessions = broker.service.sessions.lock().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].serial, "arn:aws:iam::123456789012:mfa/stopp");
        assert_eq!(sessions[0].code, "123456");
        assert_eq!(sessions[0].duration, 3600);
    }

    #[tokio::test]
    async fn a_preset_token_bypasses_the_prompt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, SOURCE_FILE).unwrap();

        let mut options = options(&path);
        options.token = Some("654321".to_string());
        let service = FakeService::with_device("serial");
        let broker = CredentialBroker::new(options, service, NoPrompt);

        assert_eq!(broker.run().await.unwrap(), RunOutcome::SessionAcquired);
        assert_eq!(broker.service.sessions.lock().unwrap()[0].code, "654321");
    }

    #[tokio::test]
    async fn the_user_name_reaches_the_device_lookup() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, SOURCE_FILE).unwrap();

        let mut options = options(&path);
        options.user = Some("stopp".to_string());
        let broker =
            CredentialBroker::new(options, FakeService::with_device("serial"), FakePrompt("1"));

        broker.run().await.unwrap();
        assert_eq!(
            *broker.service.lookups.lock().unwrap(),
            vec![Some("stopp".to_string())]
        );
    }

    #[tokio::test]
    async fn no_mfa_device_short_circuits_without_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, SOURCE_FILE).unwrap();

        let broker = CredentialBroker::new(options(&path), FakeService::default(), NoPrompt);

        assert_eq!(broker.run().await.unwrap(), RunOutcome::MfaNotRegistered);
        assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE_FILE);
        assert!(broker.service.sessions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn a_missing_file_fails_before_any_remote_call() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials");

        let broker = CredentialBroker::new(options(&path), FakeService::default(), NoPrompt);

        let err = broker.run().await.unwrap_err();
        assert!(matches!(err, Error::MissingCredentialsFile(_)));
        assert!(broker.service.lookups.lock().unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn an_unwritable_file_fails_before_any_remote_call() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, SOURCE_FILE).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o444)).unwrap();
        if OpenOptions::new().append(true).open(&path).is_ok() {
            // Root bypasses permission bits; the open cannot be made to
            // fail, so there is nothing to observe.
            return;
        }

        let broker = CredentialBroker::new(options(&path), FakeService::default(), NoPrompt);

        let err = broker.run().await.unwrap_err();
        assert!(matches!(err, Error::UnwritableCredentialsFile(_)));
        assert!(broker.service.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn a_remote_failure_aborts_without_touching_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, SOURCE_FILE).unwrap();

        let service = FakeService {
            device: Some("serial".to_string()),
            deny_session: true,
            ..FakeService::default()
        };
        let broker = CredentialBroker::new(options(&path), service, FakePrompt("123456"));

        let err = broker.run().await.unwrap_err();
        assert!(matches!(err, Error::Service(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE_FILE);
    }

    #[tokio::test]
    async fn a_console_only_run_leaves_the_file_alone() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("credentials");
        fs::write(&path, SOURCE_FILE).unwrap();

        let mut options = options(&path);
        options.session_profile = None;
        options.console = true;
        let broker =
            CredentialBroker::new(options, FakeService::with_device("serial"), FakePrompt("1"));

        assert_eq!(broker.run().await.unwrap(), RunOutcome::SessionAcquired);
        assert_eq!(fs::read_to_string(&path).unwrap(), SOURCE_FILE);
    }
}
