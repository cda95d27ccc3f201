use async_trait::async_trait;
use quiz_core::model::{AuthenticatedUser, UserId};
use reqwest::Method;

use super::HttpBackend;
use super::wire::{LoginBody, LoginDto, RefreshDto};
use crate::repository::{AuthGateway, BackendError};

#[async_trait]
impl AuthGateway for HttpBackend {
    async fn login(&self, email: &str, password: &str) -> Result<AuthenticatedUser, BackendError> {
        let request = self
            .request(Method::POST, "auth/login")?
            .json(&LoginBody { email, password });
        let dto: LoginDto = self.json(request).await?;
        Ok(dto.into_user())
    }

    async fn refresh(&self) -> Result<String, BackendError> {
        let request = self.request(Method::POST, "auth/refresh")?;
        let dto: RefreshDto = self.json(request).await?;
        Ok(dto.access_token)
    }

    async fn logout(&self, user_id: UserId) -> Result<(), BackendError> {
        let request = self.authorized(Method::POST, &format!("auth/logout/{user_id}"))?;
        self.send(request).await?;
        Ok(())
    }
}
