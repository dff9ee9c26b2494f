// ── Automated action rules ──
//
// Declarative rules recorded alongside the monitor configuration. They are
// stored and listed but nothing executes them yet.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionCondition {
    Above,
    Below,
    Equals,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ActionKind {
    /// Send a notification.
    Notify,
    /// Scale slice resources.
    Scale,
    /// Restart the affected VNF.
    Restart,
    /// Call an external webhook.
    Webhook,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomatedActionRule {
    pub metric: String,
    pub condition: ActionCondition,
    pub threshold: f64,
    pub action: ActionKind,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, String>,
}
