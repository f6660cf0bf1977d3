use std::future::Future;
use std::time::Duration;

use tokio::time::timeout;

use super::{IdentityProvider, UserProfile};
use crate::config::IdentityConfig;
use crate::{FolioError, UserId};

/// Timeout-bounded access to an [`IdentityProvider`].
#[derive(Debug, Clone)]
pub struct IdentityClient<P> {
    provider: P,
    config: IdentityConfig,
}

impl<P: IdentityProvider> IdentityClient<P> {
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, IdentityConfig::default())
    }

    pub fn with_config(provider: P, config: IdentityConfig) -> Self {
        Self { provider, config }
    }

    /// Fetches one profile.
    ///
    /// - `Err(FolioError::NotFound)` - the provider reported the user absent
    /// - `Err(FolioError::DownstreamUnavailable)` - timeout or transport failure
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    pub async fn get_user(&self, id: UserId) -> Result<UserProfile, FolioError> {
        bounded(
            "get_user",
            self.config.single_timeout,
            self.provider.get_user(id),
        )
        .await?
        .ok_or(FolioError::NotFound)
    }

    /// Fetches several profiles at once. An empty request never calls out.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, ids), fields(count = ids.len()), err))]
    pub async fn get_users(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, FolioError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        bounded("get_users", self.config.bulk_timeout, self.provider.get_users(ids)).await
    }
}

async fn bounded<T, F>(operation: &str, limit: Duration, fut: F) -> Result<T, FolioError>
where
    F: Future<Output = Result<T, FolioError>>,
{
    match timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(FolioError::NotFound)) => Err(FolioError::NotFound),
        Ok(Err(FolioError::DownstreamUnavailable(msg))) => {
            log::error!(target: "folio", "msg=\"identity lookup failed\", operation=\"{operation}\", error=\"{msg}\"");
            Err(FolioError::DownstreamUnavailable(msg))
        }
        Ok(Err(e)) => {
            log::error!(target: "folio", "msg=\"identity lookup failed\", operation=\"{operation}\", error=\"{e}\"");
            Err(FolioError::DownstreamUnavailable(e.to_string()))
        }
        Err(_) => {
            log::error!(
                target: "folio",
                "msg=\"identity lookup timed out\", operation=\"{operation}\", timeout_ms={}",
                limit.as_millis()
            );
            Err(FolioError::DownstreamUnavailable(format!(
                "identity {operation} timed out after {}ms",
                limit.as_millis()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::identity::InMemoryIdentityProvider;

    struct SlowProvider;

    #[async_trait]
    impl IdentityProvider for SlowProvider {
        async fn get_user(&self, _id: UserId) -> Result<Option<UserProfile>, FolioError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn get_users(&self, _ids: &[UserId]) -> Result<Vec<UserProfile>, FolioError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    struct BrokenProvider;

    #[async_trait]
    impl IdentityProvider for BrokenProvider {
        async fn get_user(&self, _id: UserId) -> Result<Option<UserProfile>, FolioError> {
            Err(FolioError::Internal("bad gateway".into()))
        }

        async fn get_users(&self, _ids: &[UserId]) -> Result<Vec<UserProfile>, FolioError> {
            Err(FolioError::Internal("bad gateway".into()))
        }
    }

    #[tokio::test]
    async fn test_get_user_found() {
        let provider = InMemoryIdentityProvider::new();
        let profile = provider.register("alice", "alice@example.com", "MEMBER");
        let client = IdentityClient::new(provider);

        assert_eq!(client.get_user(profile.id).await.unwrap(), profile);
    }

    #[tokio::test]
    async fn test_get_user_absent_is_not_found() {
        let client = IdentityClient::new(InMemoryIdentityProvider::new());
        assert_eq!(
            client.get_user(UserId::new()).await.unwrap_err(),
            FolioError::NotFound
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_lookup_times_out() {
        let client = IdentityClient::new(SlowProvider);
        let err = client.get_user(UserId::new()).await.unwrap_err();

        assert!(matches!(err, FolioError::DownstreamUnavailable(msg) if msg.contains("5000ms")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bulk_lookup_times_out() {
        let client = IdentityClient::new(SlowProvider);
        let err = client.get_users(&[UserId::new()]).await.unwrap_err();

        assert!(matches!(err, FolioError::DownstreamUnavailable(msg) if msg.contains("10000ms")));
    }

    #[tokio::test]
    async fn test_transport_failure_is_downstream_unavailable() {
        let client = IdentityClient::new(BrokenProvider);
        let err = client.get_user(UserId::new()).await.unwrap_err();

        assert!(matches!(err, FolioError::DownstreamUnavailable(_)));
    }

    #[tokio::test]
    async fn test_empty_bulk_lookup_skips_provider() {
        let client = IdentityClient::new(BrokenProvider);
        assert!(client.get_users(&[]).await.unwrap().is_empty());
    }
}
