//! Authenticated operator as described by `/auth/*`

use serde::{Deserialize, Serialize};

use super::id;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "id::required")]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    /// Backend role name, e.g. `ADMIN`, `super_admin`
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "id::optional")]
    pub factory_id: Option<String>,
    #[serde(default)]
    pub permissions: Vec<String>,
}
