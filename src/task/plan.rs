//! Task plan files
//!
//! A plan is a JSON file naming the device, the tap coordinate, and the
//! ordered task groups to run:
//!
//! ```json
//! {
//!   "device": { "serial": "b67c9d18", "input": { "x": 400, "y": 900 } },
//!   "log": { "file_path": "logs" },
//!   "tasks": {
//!     "warmup": [ { "volume_up": 3 }, { "relink": 1 } ]
//!   }
//! }
//! ```
//!
//! Task-group order and action order are execution order, so `tasks`
//! deserializes through a map visitor into a `Vec` instead of a `HashMap`.

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};
use crate::device::{ActionKind, DeviceTarget, TapPoint};

/// One `{ "action_name": repeat }` plan entry
///
/// The raw name is kept as written; unknown actions are reported by the
/// dispatcher at run time, not at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionSpec {
    pub action: String,
    /// Zero means skip
    pub repeat: u32,
}

impl<'de> Deserialize<'de> for ActionSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SpecVisitor;

        impl<'de> Visitor<'de> for SpecVisitor {
            type Value = ActionSpec;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a single-entry map of action name to repeat count")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let (action, repeat) = map
                    .next_entry::<String, u32>()?
                    .ok_or_else(|| serde::de::Error::custom("action entry is empty"))?;
                if map.next_key::<String>()?.is_some() {
                    return Err(serde::de::Error::custom(
                        "action entry must have exactly one key",
                    ));
                }
                Ok(ActionSpec { action, repeat })
            }
        }

        deserializer.deserialize_map(SpecVisitor)
    }
}

/// Named, ordered sequence of actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskGroup {
    pub name: String,
    pub actions: Vec<ActionSpec>,
}

/// Log section of the plan file
#[derive(Debug, Clone, Deserialize)]
pub struct LogSection {
    pub file_path: PathBuf,
}

/// A full task plan
#[derive(Debug, Clone)]
pub struct TaskPlan {
    pub device: DeviceTarget,
    pub log: Option<LogSection>,
    pub groups: Vec<TaskGroup>,
}

#[derive(Deserialize)]
struct RawDevice {
    serial: String,
    input: TapPoint,
}

#[derive(Deserialize)]
struct RawPlan {
    device: RawDevice,
    #[serde(default)]
    log: Option<LogSection>,
    #[serde(deserialize_with = "ordered_groups")]
    tasks: Vec<TaskGroup>,
}

fn ordered_groups<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<TaskGroup>, D::Error> {
    struct GroupsVisitor;

    impl<'de> Visitor<'de> for GroupsVisitor {
        type Value = Vec<TaskGroup>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of task-group name to action list")
        }

        fn visit_map<A: MapAccess<'de>>(
            self,
            mut map: A,
        ) -> std::result::Result<Self::Value, A::Error> {
            let mut groups = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, actions)) = map.next_entry::<String, Vec<ActionSpec>>()? {
                groups.push(TaskGroup { name, actions });
            }
            Ok(groups)
        }
    }

    deserializer.deserialize_map(GroupsVisitor)
}

impl<'de> Deserialize<'de> for TaskPlan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawPlan::deserialize(deserializer)?;
        Ok(TaskPlan {
            device: DeviceTarget {
                serial: raw.device.serial,
                tap: raw.device.input,
            },
            log: raw.log,
            groups: raw.tasks,
        })
    }
}

impl TaskPlan {
    /// Load a plan from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::from_json(&content)
    }

    /// Parse a plan from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::PlanInvalid(e.to_string()))
    }

    /// Lint the plan; returns human-readable problems, empty when clean
    ///
    /// Unknown action names are a problem here but only a warning at run
    /// time.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.device.serial.is_empty() {
            issues.push("device.serial is empty".to_string());
        }
        if self.groups.is_empty() {
            issues.push("no task groups defined".to_string());
        }
        for group in &self.groups {
            if group.actions.is_empty() {
                issues.push(format!("task group '{}' has no actions", group.name));
            }
            for spec in &group.actions {
                if ActionKind::from_name(&spec.action).is_none() {
                    issues.push(format!(
                        "task group '{}': unknown action type '{}'",
                        group.name, spec.action
                    ));
                }
            }
        }
        issues
    }

    /// Total number of repetitions the plan will attempt
    pub fn total_operations(&self) -> u64 {
        self.groups
            .iter()
            .flat_map(|g| &g.actions)
            .map(|a| u64::from(a.repeat))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"{
        "device": { "serial": "b67c9d18", "input": { "x": 400, "y": 900 } },
        "log": { "file_path": "logs" },
        "tasks": {
            "zulu": [ { "volume_up": 3 }, { "relink": 1 } ],
            "alpha": [ { "play_pause": 2 } ],
            "mike": [ { "next_track": 0 } ]
        }
    }"#;

    #[test]
    fn parses_plan_fields() {
        let plan = TaskPlan::from_json(PLAN).unwrap();
        assert_eq!(plan.device.serial, "b67c9d18");
        assert_eq!(plan.device.tap, TapPoint { x: 400, y: 900 });
        assert_eq!(plan.log.as_ref().unwrap().file_path, PathBuf::from("logs"));
        assert_eq!(plan.total_operations(), 6);
    }

    #[test]
    fn group_order_is_insertion_order_not_alphabetical() {
        let plan = TaskPlan::from_json(PLAN).unwrap();
        let names: Vec<_> = plan.groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["zulu", "alpha", "mike"]);
    }

    #[test]
    fn action_entries_keep_name_and_repeat() {
        let plan = TaskPlan::from_json(PLAN).unwrap();
        assert_eq!(
            plan.groups[0].actions,
            vec![
                ActionSpec {
                    action: "volume_up".into(),
                    repeat: 3
                },
                ActionSpec {
                    action: "relink".into(),
                    repeat: 1
                },
            ]
        );
    }

    #[test]
    fn multi_key_action_entry_is_rejected() {
        let json = r#"{
            "device": { "serial": "x", "input": { "x": 1, "y": 2 } },
            "tasks": { "t": [ { "volume_up": 1, "volume_down": 1 } ] }
        }"#;
        assert!(TaskPlan::from_json(json).is_err());
    }

    #[test]
    fn negative_repeat_is_rejected() {
        let json = r#"{
            "device": { "serial": "x", "input": { "x": 1, "y": 2 } },
            "tasks": { "t": [ { "volume_up": -1 } ] }
        }"#;
        assert!(TaskPlan::from_json(json).is_err());
    }

    #[test]
    fn validate_flags_unknown_actions_and_empty_groups() {
        let json = r#"{
            "device": { "serial": "x", "input": { "x": 1, "y": 2 } },
            "tasks": { "t": [ { "warp_speed": 1 } ], "empty": [] }
        }"#;
        let plan = TaskPlan::from_json(json).unwrap();
        let issues = plan.validate();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().any(|i| i.contains("warp_speed")));
        assert!(issues.iter().any(|i| i.contains("'empty' has no actions")));
    }

    #[test]
    fn clean_plan_validates() {
        let plan = TaskPlan::from_json(PLAN).unwrap();
        assert!(plan.validate().is_empty());
    }
}
