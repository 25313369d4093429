//! Integration tests for filtered task listing.
//!
//! The unit tests on the compiler assert the generated SQL; these run
//! the compiled queries against a populated store and check which rows
//! actually come back, and in what order.

use serde_json::json;
use taskstore::db::Database;
use taskstore::db::query::TaskFilter;
use taskstore::types::{Task, TaskInput, TaskStatus};

fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create test database")
}

fn add_task(db: &Database, title: &str, input: TaskInput) -> Task {
    db.create_task(TaskInput {
        title: title.to_string(),
        ..input
    })
    .expect("Failed to create task")
}

fn titles(tasks: &[Task]) -> Vec<&str> {
    tasks.iter().map(|t| t.title.as_str()).collect()
}

mod filter_tests {
    use super::*;

    #[test]
    fn status_filter_selects_matching_rows() {
        let db = setup_db();
        add_task(&db, "open", TaskInput::default());
        add_task(
            &db,
            "started",
            TaskInput {
                status: Some(TaskStatus::InProgress),
                ..Default::default()
            },
        );
        add_task(
            &db,
            "closed",
            TaskInput {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        );

        let single = db
            .list_tasks(&TaskFilter {
                status: Some(vec![TaskStatus::Pending]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&single), ["open"]);

        let multi = db
            .list_tasks(&TaskFilter {
                status: Some(vec![TaskStatus::Pending, TaskStatus::InProgress]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(multi.len(), 2);
        assert!(multi.iter().all(|t| t.status != TaskStatus::Completed));
    }

    #[test]
    fn keys_combine_with_and() {
        let db = setup_db();
        add_task(
            &db,
            "deep work session",
            TaskInput {
                project_id: Some("work".to_string()),
                context: Some("deep".to_string()),
                ..Default::default()
            },
        );
        add_task(
            &db,
            "work errand",
            TaskInput {
                project_id: Some("work".to_string()),
                ..Default::default()
            },
        );
        add_task(
            &db,
            "personal deep work",
            TaskInput {
                project_id: Some("personal".to_string()),
                context: Some("deep".to_string()),
                ..Default::default()
            },
        );

        let found = db
            .list_tasks(&TaskFilter {
                project_id: Some("work".to_string()),
                context: Some("deep".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&found), ["deep work session"]);
    }

    #[test]
    fn parent_filter_distinguishes_roots_children_and_everything() {
        let db = setup_db();
        let root = add_task(&db, "root", TaskInput::default());
        add_task(
            &db,
            "child",
            TaskInput {
                parent_id: Some(root.id.clone()),
                ..Default::default()
            },
        );

        let roots = db
            .list_tasks(&TaskFilter {
                parent_id: Some(None),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&roots), ["root"]);

        let children = db
            .list_tasks(&TaskFilter {
                parent_id: Some(Some(root.id.clone())),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&children), ["child"]);

        let all = db.list_tasks(&TaskFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn due_range_is_inclusive_and_ignores_the_time_part() {
        let db = setup_db();
        for (title, due) in [
            ("first", "2026-03-01"),
            ("middle", "2026-03-05"),
            ("last", "2026-03-10T23:59:00Z"),
        ] {
            add_task(
                &db,
                title,
                TaskInput {
                    due_date: Some(due.to_string()),
                    ..Default::default()
                },
            );
        }
        add_task(&db, "undated", TaskInput::default());

        let whole = db
            .list_tasks(&TaskFilter {
                due_date_from: Some("2026-03-01".to_string()),
                due_date_to: Some("2026-03-10".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(whole.len(), 3, "both bounds and the timed row belong");

        let from_middle = db
            .list_tasks(&TaskFilter {
                due_date_from: Some("2026-03-05".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(from_middle.len(), 2);

        let up_to_middle = db
            .list_tasks(&TaskFilter {
                due_date_to: Some("2026-03-05".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(up_to_middle.len(), 2);
    }

    #[test]
    fn energy_and_focus_narrow_together() {
        let db = setup_db();
        add_task(
            &db,
            "morning focus block",
            TaskInput {
                energy_level: Some(3),
                focus_time: Some(true),
                ..Default::default()
            },
        );
        add_task(
            &db,
            "high energy errand",
            TaskInput {
                energy_level: Some(3),
                ..Default::default()
            },
        );
        add_task(
            &db,
            "low energy focus",
            TaskInput {
                energy_level: Some(1),
                focus_time: Some(true),
                ..Default::default()
            },
        );

        let found = db
            .list_tasks(&TaskFilter {
                energy_level: Some(3),
                focus_time: Some(true),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&found), ["morning focus block"]);
    }

    #[test]
    fn has_integration_selects_only_linked_tasks() {
        let db = setup_db();
        let linked = add_task(&db, "linked", TaskInput::default());
        add_task(&db, "local only", TaskInput::default());
        db.merge_task_integration(&linked.id, "todoist", &json!({"remote_id": "t-1"}))
            .unwrap();

        let found = db
            .list_tasks(&TaskFilter {
                has_integration: Some("todoist".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&found), ["linked"]);

        let none = db
            .list_tasks(&TaskFilter {
                has_integration: Some("googleTasks".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn search_combines_with_other_keys() {
        let db = setup_db();
        add_task(&db, "Write the quarterly report", TaskInput::default());
        add_task(
            &db,
            "Read last quarterly report",
            TaskInput {
                status: Some(TaskStatus::Completed),
                ..Default::default()
            },
        );

        let found = db
            .list_tasks(&TaskFilter {
                search: Some("quarterly".to_string()),
                status: Some(vec![TaskStatus::Pending]),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&found), ["Write the quarterly report"]);
    }
}

mod ordering_tests {
    use super::*;

    #[test]
    fn default_order_ranks_priority_then_dated_before_undated() {
        let db = setup_db();
        add_task(
            &db,
            "later",
            TaskInput {
                priority: Some(1),
                due_date: Some("2026-01-02".to_string()),
                ..Default::default()
            },
        );
        add_task(
            &db,
            "sooner",
            TaskInput {
                priority: Some(1),
                due_date: Some("2026-01-01".to_string()),
                ..Default::default()
            },
        );
        add_task(
            &db,
            "someday",
            TaskInput {
                priority: Some(1),
                ..Default::default()
            },
        );
        add_task(
            &db,
            "urgent",
            TaskInput {
                priority: Some(0),
                ..Default::default()
            },
        );

        let listed = db.list_tasks(&TaskFilter::default()).unwrap();
        assert_eq!(titles(&listed), ["urgent", "sooner", "later", "someday"]);
    }

    #[test]
    fn limit_and_offset_page_through_a_stable_order() {
        let db = setup_db();
        for (title, priority) in [("first", 0), ("second", 1), ("third", 2)] {
            add_task(
                &db,
                title,
                TaskInput {
                    priority: Some(priority),
                    ..Default::default()
                },
            );
        }

        let page_one = db
            .list_tasks(&TaskFilter {
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&page_one), ["first", "second"]);

        let page_two = db
            .list_tasks(&TaskFilter {
                limit: Some(2),
                offset: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&page_two), ["third"]);

        let skip_only = db
            .list_tasks(&TaskFilter {
                offset: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&skip_only), ["second", "third"]);
    }
}
