use anyhow::{anyhow, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{
    connection::Database,
    helpers::parse_project_status,
    models::{Client, ClientInput, Project, ProjectInput},
};

const CLIENT_COLUMNS: &str = "id, name, color, icon, order_index";
const PROJECT_COLUMNS: &str = "id, client_id, name, description, status, order_index";

fn row_to_client(row: &Row) -> Result<Client> {
    Ok(Client {
        id: row.get("id")?,
        name: row.get("name")?,
        color: row.get("color")?,
        icon: row.get("icon")?,
        order_index: row.get("order_index")?,
    })
}

fn row_to_project(row: &Row) -> Result<Project> {
    let status: String = row.get("status")?;

    Ok(Project {
        id: row.get("id")?,
        client_id: row.get("client_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        status: parse_project_status(&status)?,
        order_index: row.get("order_index")?,
    })
}

fn fetch_client(conn: &Connection, client_id: i64) -> Result<Option<Client>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![client_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_client(row)?)),
        None => Ok(None),
    }
}

fn fetch_project(conn: &Connection, project_id: i64) -> Result<Option<Project>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"
    ))?;
    let mut rows = stmt.query(params![project_id])?;
    match rows.next()? {
        Some(row) => Ok(Some(row_to_project(row)?)),
        None => Ok(None),
    }
}

/// Next free slot at the end of a sibling list.
pub(crate) fn next_order_index(conn: &Connection, table: &str, scope: Option<(&str, i64)>) -> Result<i64> {
    let next = match scope {
        Some((column, value)) => conn
            .query_row(
                &format!("SELECT COALESCE(MAX(order_index), -1) + 1 FROM {table} WHERE {column} = ?1"),
                params![value],
                |row| row.get(0),
            )
            .optional()?,
        None => conn
            .query_row(
                &format!("SELECT COALESCE(MAX(order_index), -1) + 1 FROM {table}"),
                [],
                |row| row.get(0),
            )
            .optional()?,
    };
    Ok(next.unwrap_or(0))
}

impl Database {
    pub async fn get_clients(&self) -> Result<Vec<Client>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY order_index ASC, id ASC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut clients = Vec::new();
            while let Some(row) = rows.next()? {
                clients.push(row_to_client(row)?);
            }

            Ok(clients)
        })
        .await
    }

    /// Create a client at the end of the list
    pub async fn insert_client(&self, input: ClientInput) -> Result<Client> {
        self.execute(move |conn| {
            let order_index = next_order_index(conn, "clients", None)?;

            conn.execute(
                "INSERT INTO clients (name, color, icon, order_index)
                 VALUES (?1, ?2, ?3, ?4)",
                params![input.name, input.color, input.icon, order_index],
            )?;

            let client_id = conn.last_insert_rowid();
            fetch_client(conn, client_id)?.ok_or_else(|| anyhow!("Client not found after insert"))
        })
        .await
    }

    pub async fn update_client_row(&self, client_id: i64, input: ClientInput) -> Result<Client> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE clients SET name = ?1, color = ?2, icon = ?3 WHERE id = ?4",
                params![input.name, input.color, input.icon, client_id],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("Client {client_id} not found"));
            }

            fetch_client(conn, client_id)?.ok_or_else(|| anyhow!("Client not found after update"))
        })
        .await
    }

    /// Projects and their milestones go with the client (foreign key cascade).
    pub async fn delete_client_row(&self, client_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM clients WHERE id = ?1", params![client_id])?;
            if rows_affected == 0 {
                return Err(anyhow!("Client {client_id} not found"));
            }
            Ok(())
        })
        .await
    }

    pub async fn get_projects(&self) -> Result<Vec<Project>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY client_id ASC, order_index ASC, id ASC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut projects = Vec::new();
            while let Some(row) = rows.next()? {
                projects.push(row_to_project(row)?);
            }

            Ok(projects)
        })
        .await
    }

    pub async fn insert_project(&self, input: ProjectInput) -> Result<Project> {
        self.execute(move |conn| {
            let order_index =
                next_order_index(conn, "projects", Some(("client_id", input.client_id)))?;

            conn.execute(
                "INSERT INTO projects (client_id, name, description, status, order_index)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    input.client_id,
                    input.name,
                    input.description,
                    input.status.as_str(),
                    order_index,
                ],
            )?;

            let project_id = conn.last_insert_rowid();
            fetch_project(conn, project_id)?
                .ok_or_else(|| anyhow!("Project not found after insert"))
        })
        .await
    }

    pub async fn update_project_row(&self, project_id: i64, input: ProjectInput) -> Result<Project> {
        self.execute(move |conn| {
            let rows_affected = conn.execute(
                "UPDATE projects
                 SET client_id = ?1, name = ?2, description = ?3, status = ?4
                 WHERE id = ?5",
                params![
                    input.client_id,
                    input.name,
                    input.description,
                    input.status.as_str(),
                    project_id,
                ],
            )?;

            if rows_affected == 0 {
                return Err(anyhow!("Project {project_id} not found"));
            }

            fetch_project(conn, project_id)?
                .ok_or_else(|| anyhow!("Project not found after update"))
        })
        .await
    }

    pub async fn delete_project_row(&self, project_id: i64) -> Result<()> {
        self.execute(move |conn| {
            let rows_affected =
                conn.execute("DELETE FROM projects WHERE id = ?1", params![project_id])?;
            if rows_affected == 0 {
                return Err(anyhow!("Project {project_id} not found"));
            }
            Ok(())
        })
        .await
    }
}
