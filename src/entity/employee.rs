//! Employee record as returned by `/employees`

use serde::{Deserialize, Deserializer, Serialize};

use super::{amount, id, normalize_ref};

/// Pay scheme. The backend writes it upper case, older records lower case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SalaryType {
    Piece,
    Time,
    Fixed,
    /// Anything else; kept so one odd record does not fail a whole listing
    Unknown,
}

impl<'de> Deserialize<'de> for SalaryType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.trim().to_ascii_uppercase().as_str() {
            "PIECE" => SalaryType::Piece,
            "TIME" => SalaryType::Time,
            "FIXED" => SalaryType::Fixed,
            _ => SalaryType::Unknown,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(deserialize_with = "id::required")]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Badge number printed on the work card
    #[serde(default, deserialize_with = "id::optional")]
    pub employee_id: Option<String>,

    #[serde(default, deserialize_with = "id::optional")]
    pub factory_id: Option<String>,

    #[serde(default, deserialize_with = "id::optional")]
    pub department_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary_type: Option<SalaryType>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "amount::optional")]
    pub base_salary: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "amount::optional")]
    pub piece_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Employee {
    /// Current department, `None` when unassigned
    pub fn department(&self) -> Option<&str> {
        normalize_ref(self.department_id.as_deref())
    }

    pub fn is_unassigned(&self) -> bool {
        self.department().is_none()
    }

    /// Case-insensitive match on name or badge number
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let kw = keyword.trim().to_lowercase();
        if kw.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&kw)
            || self
                .employee_id
                .as_deref()
                .is_some_and(|badge| badge.to_lowercase().contains(&kw))
    }
}
