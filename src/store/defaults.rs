//! First-run sample project
//!
//! Returned by reads while no document has been saved yet. Never written to disk.

use serde_json::{json, Value};

/// Build the sample project: 9 weeks, 3 swimlanes and a chain of 6 tasks
pub fn default_document(created: &str) -> Value {
    json!({
        "weeks": 9,
        "swimlanes": [
            {"id": "marketing", "name": "Marketing"},
            {"id": "management", "name": "Management"},
            {"id": "webdesign", "name": "Web Design Team"}
        ],
        "tasks": [
            {
                "id": "suggest-changes",
                "name": "Suggest changes to website",
                "swimlane": "marketing",
                "start": 2,
                "duration": 1,
                "color": "#FF9800",
                "dependencies": []
            },
            {
                "id": "evaluate-changes",
                "name": "Evaluate changes",
                "swimlane": "management",
                "start": 3,
                "duration": 1,
                "color": "#2196F3",
                "dependencies": ["suggest-changes"]
            },
            {
                "id": "check-changes",
                "name": "Check suggested changes",
                "swimlane": "webdesign",
                "start": 4,
                "duration": 1,
                "color": "#2196F3",
                "dependencies": ["evaluate-changes"]
            },
            {
                "id": "reevaluate-changes",
                "name": "Re-evaluate changes",
                "swimlane": "management",
                "start": 6,
                "duration": 1,
                "color": "#2196F3",
                "dependencies": ["check-changes"]
            },
            {
                "id": "evaluate-new-changes",
                "name": "Evaluate new changes",
                "swimlane": "management",
                "start": 7,
                "duration": 1,
                "color": "#2196F3",
                "dependencies": ["reevaluate-changes"]
            },
            {
                "id": "implement-changes",
                "name": "Implement changes to website",
                "swimlane": "marketing",
                "start": 9,
                "duration": 2,
                "color": "#FF9800",
                "dependencies": ["evaluate-new-changes"]
            }
        ],
        "version": "1.0",
        "created": created
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        let doc = default_document("2026-01-01T00:00:00+00:00");
        assert_eq!(doc["weeks"], 9);
        assert_eq!(doc["swimlanes"].as_array().unwrap().len(), 3);
        assert_eq!(doc["tasks"].as_array().unwrap().len(), 6);
        assert_eq!(doc["created"], "2026-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_dependency_chain() {
        let doc = default_document("now");
        let tasks = doc["tasks"].as_array().unwrap();

        assert!(tasks[0]["dependencies"].as_array().unwrap().is_empty());
        for pair in tasks.windows(2) {
            assert_eq!(pair[1]["dependencies"], json!([pair[0]["id"].clone()]));
        }
    }

    #[test]
    fn test_tasks_reference_known_swimlanes() {
        let doc = default_document("now");
        let lanes: Vec<&str> = doc["swimlanes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|l| l["id"].as_str().unwrap())
            .collect();

        for task in doc["tasks"].as_array().unwrap() {
            assert!(lanes.contains(&task["swimlane"].as_str().unwrap()));
        }
    }
}
