//! Project CRUD.

use anyhow::Result;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::mapper::parse_project_row;
use super::{now, Database};
use crate::error::EngineError;
use crate::types::{Project, ProjectInput, ProjectPatch};

impl Database {
    pub fn create_project(&self, input: ProjectInput) -> Result<Project> {
        validate_name(&input.name)?;

        let id = input
            .id
            .unwrap_or_else(|| Uuid::now_v7().to_string());
        if input.parent_id.as_deref() == Some(id.as_str()) {
            return Err(
                EngineError::invalid_value("parent_id", "a project cannot be its own parent")
                    .into(),
            );
        }

        let ts = now();
        let integrations = input.integrations.unwrap_or_default();
        let integrations_json = if integrations.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&integrations)?)
        };

        let project = Project {
            id,
            name: input.name,
            description: input.description,
            color: input.color,
            icon: input.icon,
            parent_id: input.parent_id,
            sort_order: input.sort_order.unwrap_or(0),
            favorite: input.favorite.unwrap_or(false),
            archived: input.archived.unwrap_or(false),
            integrations,
            created_at: ts.clone(),
            updated_at: ts,
        };

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO projects (id, name, description, color, icon, parent_id,
                                       sort_order, favorite, archived, integrations,
                                       created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    project.id,
                    project.name,
                    project.description,
                    project.color,
                    project.icon,
                    project.parent_id,
                    project.sort_order,
                    project.favorite,
                    project.archived,
                    integrations_json,
                    project.created_at,
                    project.updated_at,
                ],
            )?;
            Ok(project)
        })
    }

    pub fn get_project(&self, project_id: &str) -> Result<Option<Project>> {
        self.with_conn(|conn| get_project_internal(conn, project_id))
    }

    /// List projects ordered by sort order then name. Archived projects
    /// are hidden unless asked for.
    pub fn list_projects(&self, include_archived: bool) -> Result<Vec<Project>> {
        self.with_conn(|conn| {
            let sql = if include_archived {
                "SELECT p.* FROM projects p ORDER BY p.sort_order, p.name"
            } else {
                "SELECT p.* FROM projects p WHERE p.archived = 0 ORDER BY p.sort_order, p.name"
            };
            let mut stmt = conn.prepare(sql)?;
            let projects = stmt
                .query_map([], parse_project_row)?
                .filter_map(|r| r.ok())
                .collect();
            Ok(projects)
        })
    }

    pub fn update_project(&self, project_id: &str, patch: &ProjectPatch) -> Result<Project> {
        if let Some(name) = &patch.name {
            validate_name(name)?;
        }
        if let Some(Some(parent_id)) = &patch.parent_id {
            if parent_id == project_id {
                return Err(EngineError::invalid_value(
                    "parent_id",
                    "a project cannot be its own parent",
                )
                .into());
            }
        }

        let ts = now();
        self.with_conn(|conn| {
            let project = get_project_internal(conn, project_id)?
                .ok_or_else(|| EngineError::not_found("Project", project_id))?;

            let updated = Project {
                id: project.id,
                name: patch.name.clone().unwrap_or(project.name),
                description: patch.description.clone().unwrap_or(project.description),
                color: patch.color.clone().unwrap_or(project.color),
                icon: patch.icon.clone().unwrap_or(project.icon),
                parent_id: patch.parent_id.clone().unwrap_or(project.parent_id),
                sort_order: patch.sort_order.unwrap_or(project.sort_order),
                favorite: patch.favorite.unwrap_or(project.favorite),
                archived: patch.archived.unwrap_or(project.archived),
                integrations: project.integrations,
                created_at: project.created_at,
                updated_at: ts.clone(),
            };

            conn.execute(
                "UPDATE projects
                 SET name = ?1, description = ?2, color = ?3, icon = ?4, parent_id = ?5,
                     sort_order = ?6, favorite = ?7, archived = ?8, updated_at = ?9
                 WHERE id = ?10",
                params![
                    updated.name,
                    updated.description,
                    updated.color,
                    updated.icon,
                    updated.parent_id,
                    updated.sort_order,
                    updated.favorite,
                    updated.archived,
                    updated.updated_at,
                    project_id,
                ],
            )?;
            Ok(updated)
        })
    }

    /// Delete a project. Member tasks and child projects survive with
    /// their references cleared.
    pub fn delete_project(&self, project_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            let deleted =
                conn.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
            if deleted == 0 {
                return Err(EngineError::not_found("Project", project_id).into());
            }
            Ok(())
        })
    }
}

pub(crate) fn get_project_internal(conn: &Connection, project_id: &str) -> Result<Option<Project>> {
    match conn.query_row(
        "SELECT p.* FROM projects p WHERE p.id = ?1",
        params![project_id],
        parse_project_row,
    ) {
        Ok(project) => Ok(Some(project)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn validate_name(name: &str) -> Result<(), EngineError> {
    if name.trim().is_empty() {
        return Err(EngineError::missing_field("name"));
    }
    Ok(())
}
