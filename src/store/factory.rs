//! Factory selection (`factory-storage`)

use serde::{Deserialize, Serialize};

use crate::entity::Factory;

pub const STORE_NAME: &str = "factory-storage";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactoryState {
    pub current_factory: Option<Factory>,
    #[serde(default)]
    pub factories: Vec<Factory>,
}

impl FactoryState {
    /// Replace the known factories. A current selection that no longer exists
    /// is dropped, and a lone factory is selected automatically.
    pub fn set_factories(&mut self, factories: Vec<Factory>) {
        if let Some(current) = self.current_factory.take() {
            self.current_factory = factories.iter().find(|f| f.id == current.id).cloned();
        }
        if self.current_factory.is_none() && factories.len() == 1 {
            self.current_factory = factories.first().cloned();
        }
        self.factories = factories;
    }

    /// Select a known factory by id
    pub fn select(&mut self, id: &str) -> Option<&Factory> {
        let factory = self.factories.iter().find(|f| f.id == id)?.clone();
        self.current_factory = Some(factory);
        self.current_factory.as_ref()
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_factory.as_ref().map(|f| f.id.as_str())
    }

    pub fn clear(&mut self) {
        *self = FactoryState::default();
    }
}
