use crate::core::errors::{ServiceError, ServiceResult};
use crate::core::traits::SettingsService;
use crate::infrastructure::entities::{NewSettings, Settings, SettingsPatch};
use crate::infrastructure::traits::SettingsRepository;
use async_trait::async_trait;
use di::{Ref, injectable};

fn validate(patch: &SettingsPatch) -> ServiceResult<()> {
    if let Some(temperature) = patch.temperature {
        if !(0..=100).contains(&temperature) {
            return Err(ServiceError::Validation(
                "temperature must be between 0 and 100".to_owned(),
            ));
        }
    }
    if let Some(max_tokens) = patch.max_tokens {
        if max_tokens < 1 {
            return Err(ServiceError::Validation(
                "maxTokens must be at least 1".to_owned(),
            ));
        }
    }
    if patch.default_model.as_deref().is_some_and(|m| m.trim().is_empty()) {
        return Err(ServiceError::Validation(
            "defaultModel must not be empty".to_owned(),
        ));
    }
    Ok(())
}

#[injectable(SettingsService)]
pub struct DefaultSettingsService {
    repo: Ref<dyn SettingsRepository>,
}

impl DefaultSettingsService {
    pub fn new(repo: Ref<dyn SettingsRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl SettingsService for DefaultSettingsService {
    async fn get_settings(&self, user_id: i64) -> ServiceResult<Settings> {
        if let Some(settings) = self.repo.get_settings(user_id).await? {
            return Ok(settings);
        }
        if let Some(settings) = self
            .repo
            .create_settings(NewSettings::defaults_for(user_id))
            .await?
        {
            return Ok(settings);
        }
        // Another request created the row in the meantime.
        self.repo
            .get_settings(user_id)
            .await?
            .ok_or(ServiceError::Storage)
    }

    async fn update_settings(
        &self,
        user_id: i64,
        patch: SettingsPatch,
    ) -> ServiceResult<(Settings, bool)> {
        validate(&patch)?;

        let current = match self.repo.get_settings(user_id).await? {
            Some(current) => current,
            None => {
                let mut created = NewSettings::defaults_for(user_id);
                patch.clone().apply_to(&mut created);
                if let Some(settings) = self.repo.create_settings(created).await? {
                    return Ok((settings, true));
                }
                self.repo
                    .get_settings(user_id)
                    .await?
                    .ok_or(ServiceError::Storage)?
            }
        };

        let mut updated = NewSettings::from(&current);
        patch.apply_to(&mut updated);
        let settings = self
            .repo
            .replace_settings(updated)
            .await?
            .ok_or(ServiceError::Storage)?;
        Ok((settings, false))
    }
}
