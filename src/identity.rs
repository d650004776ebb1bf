//! Remote identity-service boundary.

use async_trait::async_trait;
use aws_sdk_iam as iam;
use aws_sdk_sts as sts;

use crate::cli::SessionOptions;
use crate::credentials::{SessionCredentials, SourceCredentials};
use crate::error::{Error, Result};

/// The two remote operations a run needs. Both are single-shot and fallible;
/// failures propagate unmodified and are never retried.
#[async_trait]
pub trait IdentityService {
    /// At most one registered MFA device serial, optionally scoped to an IAM
    /// user name. `None` means the profile/user has no device.
    async fn find_mfa_device(&self, user_name: Option<&str>) -> Result<Option<String>>;

    /// Exchanges a device serial and OTP code for session credentials.
    async fn issue_session(
        &self,
        serial: &str,
        code: &str,
        duration_seconds: i32,
    ) -> Result<SessionCredentials>;
}

/// IAM and STS clients bound to the source profile's long-term keys.
pub struct AwsIdentity {
    iam: iam::Client,
    sts: sts::Client,
}

impl AwsIdentity {
    /// Builds the client handle from the run configuration. The source
    /// profile's keys come straight from the credentials file and are bound
    /// to an explicit provider; no process-global client state is involved.
    pub async fn configure(options: &SessionOptions) -> Result<Self> {
        let source = SourceCredentials::load(&options.credentials_file, &options.profile)?;
        let config = aws_config::from_env()
            .credentials_provider(source.into_provider())
            .load()
            .await;

        Ok(Self {
            iam: iam::Client::new(&config),
            sts: sts::Client::new(&config),
        })
    }
}

#[async_trait]
impl IdentityService for AwsIdentity {
    async fn find_mfa_device(&self, user_name: Option<&str>) -> Result<Option<String>> {
        let mut request = self.iam.list_mfa_devices().max_items(1);
        if let Some(user) = user_name {
            request = request.user_name(user);
        }
        let response = request.send().await.map_err(Error::service)?;

        Ok(response
            .mfa_devices()
            .first()
            .map(|device| device.serial_number().to_string()))
    }

    async fn issue_session(
        &self,
        serial: &str,
        code: &str,
        duration_seconds: i32,
    ) -> Result<SessionCredentials> {
        let response = self
            .sts
            .get_session_token()
            .duration_seconds(duration_seconds)
            .serial_number(serial)
            .token_code(code)
            .send()
            .await
            .map_err(Error::service)?;

        response
            .credentials()
            .map(SessionCredentials::from)
            .ok_or(Error::EmptySessionResponse)
    }
}
