//! Tab notifications delivered into member and strip windows.

use serde::{Deserialize, Serialize};

use crate::group::properties::TabProperties;
use crate::model::TabGroupId;
use crate::window::WindowId;

/// Every notification goes to both the affected member window and the
/// strip window of its group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum TabEvent {
    JoinTabGroup {
        group_id: TabGroupId,
        member_id: WindowId,
        display_properties: TabProperties,
        index: usize,
    },
    LeaveTabGroup {
        group_id: TabGroupId,
        member_id: WindowId,
    },
    TabActivated {
        group_id: TabGroupId,
        member_id: WindowId,
    },
    TabPropertiesUpdated {
        group_id: TabGroupId,
        member_id: WindowId,
        properties: TabProperties,
    },
}

impl TabEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            TabEvent::JoinTabGroup { .. } => "join-tab-group",
            TabEvent::LeaveTabGroup { .. } => "leave-tab-group",
            TabEvent::TabActivated { .. } => "tab-activated",
            TabEvent::TabPropertiesUpdated { .. } => "tab-properties-updated",
        }
    }
}
