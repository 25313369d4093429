//! Tests for the statistics aggregation.

use chrono::{Days, Utc};
use taskstore::db::Database;
use taskstore::types::{TaskInput, TaskStatus};

fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

fn day_offset(days_back: u64) -> String {
    Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(days_back))
        .expect("date arithmetic")
        .format("%Y-%m-%d")
        .to_string()
}

fn add(db: &Database, title: &str, input: TaskInput) {
    db.create_task(TaskInput {
        title: title.to_string(),
        ..input
    })
    .expect("Failed to create task");
}

mod statistics_tests {
    use super::*;

    #[test]
    fn empty_store_reports_zeroes_with_every_status_present() {
        let db = setup_db();
        let stats = db.statistics().unwrap();

        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.overdue, 0);
        assert_eq!(stats.by_status.len(), 4);
        for status in TaskStatus::ALL {
            assert_eq!(stats.by_status[status.as_str()], 0);
        }
        assert!(stats.by_project.is_empty());
        assert!(stats.by_context.is_empty());
        assert!(stats.by_energy_level.is_empty());
    }

    #[test]
    fn counts_group_one_snapshot_of_the_store() {
        let db = setup_db();
        add(
            &db,
            "late",
            TaskInput {
                due_date: Some(day_offset(1)),
                project_id: Some("work".to_string()),
                energy_level: Some(3),
                ..Default::default()
            },
        );
        add(
            &db,
            "due today",
            TaskInput {
                due_date: Some(day_offset(0)),
                project_id: Some("work".to_string()),
                ..Default::default()
            },
        );
        add(
            &db,
            "underway",
            TaskInput {
                status: Some(TaskStatus::InProgress),
                context: Some("errands".to_string()),
                ..Default::default()
            },
        );
        add(
            &db,
            "already done",
            TaskInput {
                status: Some(TaskStatus::Completed),
                due_date: Some(day_offset(10)),
                ..Default::default()
            },
        );

        let stats = db.statistics().unwrap();

        assert_eq!(stats.total_tasks, 4);
        assert_eq!(stats.by_status["pending"], 2);
        assert_eq!(stats.by_status["in_progress"], 1);
        assert_eq!(stats.by_status["completed"], 1);
        assert_eq!(stats.by_status["cancelled"], 0);

        // the completed task and the one due today do not count as overdue
        assert_eq!(stats.overdue, 1);

        assert_eq!(stats.by_project.len(), 1);
        assert_eq!(stats.by_project["Work"], 2);

        assert_eq!(stats.by_context["work"], 3);
        assert_eq!(stats.by_context["errands"], 1);

        assert_eq!(stats.by_energy_level.len(), 1);
        assert_eq!(stats.by_energy_level[&3], 1);
    }

    #[test]
    fn single_overdue_task_scenario() {
        let db = setup_db();
        add(
            &db,
            "yesterday's errand",
            TaskInput {
                project_id: Some("work".to_string()),
                due_date: Some(day_offset(1)),
                ..Default::default()
            },
        );

        let stats = db.statistics().unwrap();
        assert_eq!(stats.total_tasks, 1);
        assert_eq!(stats.by_status["pending"], 1);
        assert_eq!(stats.overdue, 1);
        assert_eq!(stats.by_project["Work"], 1);
    }

    #[test]
    fn project_grouping_keys_by_name_not_id() {
        let db = setup_db();
        add(
            &db,
            "filed",
            TaskInput {
                project_id: Some("personal".to_string()),
                ..Default::default()
            },
        );
        add(&db, "loose", TaskInput::default());

        let stats = db.statistics().unwrap();
        assert_eq!(stats.by_project.len(), 1, "tasks without a project are omitted");
        assert_eq!(stats.by_project["Personal"], 1);
        assert!(!stats.by_project.contains_key("personal"));
    }
}
