//! Read-only board inspector.
//!
//! # Responsibility
//! - Open a Mrello database (migrating it if needed) and report its schema.
//! - Print every board a user can see, with columns and tasks in order,
//!   followed by the user's tasks due within the next three days.
//!
//! Exit codes: `0` on success, `2` when the request itself was rejected
//! (unknown user, invalid input, access denied), `1` for storage failures.
//!
//! Environment:
//! - `MRELLO_DB_PATH`: database file; in-memory when unset.
//! - `MRELLO_LOG_LEVEL`: `trace|debug|info|warn|error`.
//! - `MRELLO_LOG_DIR`: absolute log directory; logging is off when unset.
//!
//! Usage: `mrello_cli [username]`

use log::info;
use mrello_core::db::migrations::schema_version;
use mrello_core::{
    core_version, default_log_level, init_logging, open_db, open_db_in_memory, Actor,
    ColumnService, ServiceError, SqliteColumnRepository, SqliteHierarchyRepository,
    SqliteTaskRepository, TaskService, WorkspaceAccess, WorkspaceService,
};
use rusqlite::Connection;
use std::error::Error;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(exit_code(err.as_ref()))
        }
    }
}

fn exit_code(err: &(dyn Error + 'static)) -> u8 {
    match err.downcast_ref::<ServiceError>() {
        Some(err) if err.is_client_error() => 2,
        _ => 1,
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

fn run() -> Result<(), Box<dyn Error>> {
    if let Ok(log_dir) = std::env::var("MRELLO_LOG_DIR") {
        let level =
            std::env::var("MRELLO_LOG_LEVEL").unwrap_or_else(|_| default_log_level().to_string());
        init_logging(&level, &log_dir)?;
    }

    let conn = match std::env::var("MRELLO_DB_PATH") {
        Ok(path) => open_db(&path)?,
        Err(_) => open_db_in_memory()?,
    };
    println!("mrello_core version={}", core_version());
    println!("schema_version={}", schema_version(&conn)?);

    if let Some(username) = std::env::args().nth(1) {
        print_boards(&conn, &username)?;
    }
    Ok(())
}

fn print_boards(conn: &Connection, username: &str) -> Result<(), Box<dyn Error>> {
    let hierarchy = SqliteHierarchyRepository::try_new(conn)?;
    let access = WorkspaceAccess::new(hierarchy);
    let workspaces = WorkspaceService::new(hierarchy, access);
    let columns = ColumnService::new(SqliteColumnRepository::try_new(conn)?, access);
    let tasks = TaskService::new(SqliteTaskRepository::try_new(conn)?, access);

    let user = workspaces
        .find_user_by_username(username)?
        .ok_or_else(|| ServiceError::InvalidUsername(username.to_string()))?;
    info!(
        "event=cli_inspect module=cli status=start user={}",
        user.id
    );

    for workspace in workspaces.list_workspaces_for(Actor::new(user.id))? {
        println!("workspace {} [{}]", workspace.title, workspace.id);
        for board in workspaces.list_boards(workspace.id)? {
            println!("  board {} [{}]", board.title, board.id);
            for column in columns.list_columns(board.id)? {
                println!("    {:>3}. {}", column.position, column.title);
                for task in tasks.list_tasks(column.id)? {
                    println!(
                        "         {:>3}. {} ({})",
                        task.position,
                        task.title,
                        task.status.as_str()
                    );
                }
            }
        }
    }

    let due_soon = tasks.due_soon_tasks(Actor::new(user.id), now_millis())?;
    println!("due soon: {}", due_soon.len());
    for task in due_soon {
        println!("  {} (due_at={})", task.title, task.due_at.unwrap_or_default());
    }
    Ok(())
}
