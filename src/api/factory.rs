//! `/factories` endpoints

use serde::{Deserialize, Serialize};

use super::{ApiClient, NO_QUERY};
use crate::entity::Factory;
use crate::error::ApiError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub management_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FactoriesEnvelope {
    #[serde(default)]
    factories: Vec<Factory>,
}

#[derive(Debug, Deserialize)]
struct FactoryEnvelope {
    factory: Factory,
}

impl ApiClient {
    pub async fn list_factories(&self) -> Result<Vec<Factory>, ApiError> {
        let envelope: FactoriesEnvelope = self.get("/factories", NO_QUERY).await?;
        Ok(envelope.factories)
    }

    pub async fn get_factory(&self, id: &str) -> Result<Factory, ApiError> {
        let envelope: FactoryEnvelope = self.get(&format!("/factories/{}", id), NO_QUERY).await?;
        Ok(envelope.factory)
    }

    pub async fn create_factory(&self, params: &FactoryParams) -> Result<Factory, ApiError> {
        let envelope: FactoryEnvelope = self.post("/factories", params).await?;
        Ok(envelope.factory)
    }

    pub async fn update_factory(&self, id: &str, params: &FactoryParams) -> Result<Factory, ApiError> {
        let envelope: FactoryEnvelope = self.put(&format!("/factories/{}", id), params).await?;
        Ok(envelope.factory)
    }

    pub async fn delete_factory(&self, id: &str) -> Result<(), ApiError> {
        let _: serde_json::Value = self.delete(&format!("/factories/{}", id), NO_QUERY).await?;
        Ok(())
    }
}
