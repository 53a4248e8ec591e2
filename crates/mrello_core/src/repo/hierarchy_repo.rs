//! Users, workspaces, memberships and boards.
//!
//! # Responsibility
//! - Persist the unordered upper levels of the hierarchy.
//! - Answer the membership questions access control asks.
//!
//! # Invariants
//! - A workspace owner is always also listed as a member.
//! - Boards carry no position; listing is ordered by creation time.
//! - Deleting a workspace or board cascades through foreign keys, so whole
//!   sibling sets disappear together and no shift is needed.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::actor::{AccessTarget, MemberRole};
use crate::model::board::{Board, BoardId, TaskId, User, UserId, Workspace, WorkspaceId};
use rusqlite::{
    params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use uuid::Uuid;

/// Repository interface for the non-ordered hierarchy levels.
pub trait HierarchyRepository {
    fn create_user(&self, username: &str) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;

    /// Creates a workspace owned by `owner` and enrolls the owner as member.
    fn create_workspace(
        &self,
        owner: UserId,
        title: &str,
        description: &str,
    ) -> RepoResult<Workspace>;
    fn get_workspace(&self, id: WorkspaceId) -> RepoResult<Option<Workspace>>;
    /// Workspaces `user` owns or belongs to.
    fn list_workspaces_for(&self, user: UserId) -> RepoResult<Vec<Workspace>>;
    fn update_workspace(
        &self,
        id: WorkspaceId,
        title: &str,
        description: &str,
    ) -> RepoResult<Workspace>;
    /// Deletes a workspace with its boards, columns and tasks.
    fn delete_workspace(&self, id: WorkspaceId) -> RepoResult<()>;
    fn add_member(&self, workspace: WorkspaceId, user: UserId) -> RepoResult<()>;
    /// Revokes membership and clears `user`'s task assignments in `workspace`.
    fn remove_member(&self, workspace: WorkspaceId, user: UserId) -> RepoResult<()>;

    fn create_board(
        &self,
        workspace: WorkspaceId,
        title: &str,
        description: &str,
    ) -> RepoResult<Board>;
    fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>>;
    fn list_boards(&self, workspace: WorkspaceId) -> RepoResult<Vec<Board>>;
    /// Boards of every workspace `user` owns or belongs to.
    fn list_boards_for(&self, user: UserId) -> RepoResult<Vec<Board>>;
    fn update_board(&self, id: BoardId, title: &str, description: &str) -> RepoResult<Board>;
    /// Deletes a board with its columns and tasks.
    fn delete_board(&self, id: BoardId) -> RepoResult<()>;

    /// Workspace that ultimately contains `target`, if the target exists.
    fn resolve_workspace(&self, target: AccessTarget) -> RepoResult<Option<WorkspaceId>>;
    /// `user`'s role inside `workspace`, `None` for outsiders.
    fn member_role(&self, workspace: WorkspaceId, user: UserId) -> RepoResult<Option<MemberRole>>;
    fn task_assignee(&self, task: TaskId) -> RepoResult<Option<UserId>>;
    /// Whether `user` and `other` are members of at least one common workspace.
    fn shares_workspace(&self, user: UserId, other: UserId) -> RepoResult<bool>;
}

/// SQLite-backed hierarchy repository.
#[derive(Clone, Copy)]
pub struct SqliteHierarchyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHierarchyRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl HierarchyRepository for SqliteHierarchyRepository<'_> {
    fn create_user(&self, username: &str) -> RepoResult<User> {
        let id = Uuid::new_v4();
        let inserted = self.conn.execute(
            "INSERT INTO users (uuid, username) VALUES (?1, ?2);",
            params![id.to_string(), username],
        );
        if let Err(err) = inserted {
            if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
                return Err(RepoError::Conflict(format!(
                    "username `{username}` is taken"
                )));
            }
            return Err(err.into());
        }
        Ok(User {
            id,
            username: username.to_string(),
        })
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT uuid, username FROM users WHERE uuid = ?1;",
                [id.to_string()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?
            .map(|(uuid, username)| {
                Ok(User {
                    id: parse_uuid(&uuid, "users.uuid")?,
                    username,
                })
            })
            .transpose()
    }

    fn find_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        self.conn
            .query_row(
                "SELECT uuid, username FROM users WHERE username = ?1;",
                [username],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?
            .map(|(uuid, username)| {
                Ok(User {
                    id: parse_uuid(&uuid, "users.uuid")?,
                    username,
                })
            })
            .transpose()
    }

    fn create_workspace(
        &self,
        owner: UserId,
        title: &str,
        description: &str,
    ) -> RepoResult<Workspace> {
        let id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_user(&tx, owner)?;
        tx.execute(
            "INSERT INTO workspaces (uuid, title, description, owner_uuid)
             VALUES (?1, ?2, ?3, ?4);",
            params![id.to_string(), title, description, owner.to_string()],
        )?;
        tx.execute(
            "INSERT INTO workspace_members (workspace_uuid, user_uuid) VALUES (?1, ?2);",
            params![id.to_string(), owner.to_string()],
        )?;
        tx.commit()?;

        Ok(Workspace {
            id,
            title: title.to_string(),
            description: description.to_string(),
            owner_id: owner,
        })
    }

    fn get_workspace(&self, id: WorkspaceId) -> RepoResult<Option<Workspace>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, title, description, owner_uuid
             FROM workspaces
             WHERE uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_workspace_row(row)?));
        }
        Ok(None)
    }

    fn list_workspaces_for(&self, user: UserId) -> RepoResult<Vec<Workspace>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT
                w.uuid AS uuid,
                w.title AS title,
                w.description AS description,
                w.owner_uuid AS owner_uuid,
                w.created_at AS created_at
             FROM workspaces w
             LEFT JOIN workspace_members m ON m.workspace_uuid = w.uuid
             WHERE w.owner_uuid = ?1 OR m.user_uuid = ?1
             ORDER BY w.created_at ASC, w.uuid ASC;",
        )?;
        let mut rows = stmt.query([user.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_workspace_row(row)?);
        }
        Ok(items)
    }

    fn update_workspace(
        &self,
        id: WorkspaceId,
        title: &str,
        description: &str,
    ) -> RepoResult<Workspace> {
        let changed = self.conn.execute(
            "UPDATE workspaces
             SET title = ?2,
                 description = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), title, description],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "workspace",
                id,
            });
        }
        self.get_workspace(id)?.ok_or(RepoError::NotFound {
            entity: "workspace",
            id,
        })
    }

    fn delete_workspace(&self, id: WorkspaceId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM workspaces WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "workspace",
                id,
            });
        }
        Ok(())
    }

    fn add_member(&self, workspace: WorkspaceId, user: UserId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_workspace(&tx, workspace)?;
        require_user(&tx, user)?;
        tx.execute(
            "INSERT OR IGNORE INTO workspace_members (workspace_uuid, user_uuid)
             VALUES (?1, ?2);",
            params![workspace.to_string(), user.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn remove_member(&self, workspace: WorkspaceId, user: UserId) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let removed = tx.execute(
            "DELETE FROM workspace_members
             WHERE workspace_uuid = ?1
               AND user_uuid = ?2
               AND user_uuid <> (SELECT owner_uuid FROM workspaces WHERE uuid = ?1);",
            params![workspace.to_string(), user.to_string()],
        )?;
        if removed > 0 {
            tx.execute(
                "UPDATE tasks
                 SET assignee_uuid = NULL,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE assignee_uuid = ?2
                   AND column_uuid IN (
                       SELECT c.uuid
                       FROM board_columns c
                       INNER JOIN boards b ON b.uuid = c.board_uuid
                       WHERE b.workspace_uuid = ?1
                   );",
                params![workspace.to_string(), user.to_string()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn create_board(
        &self,
        workspace: WorkspaceId,
        title: &str,
        description: &str,
    ) -> RepoResult<Board> {
        let id = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        require_workspace(&tx, workspace)?;
        tx.execute(
            "INSERT INTO boards (uuid, workspace_uuid, title, description)
             VALUES (?1, ?2, ?3, ?4);",
            params![id.to_string(), workspace.to_string(), title, description],
        )?;
        tx.commit()?;

        self.get_board(id)?.ok_or(RepoError::NotFound {
            entity: "board",
            id,
        })
    }

    fn get_board(&self, id: BoardId) -> RepoResult<Option<Board>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, workspace_uuid, title, description, created_at
             FROM boards
             WHERE uuid = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_board_row(row)?));
        }
        Ok(None)
    }

    fn list_boards(&self, workspace: WorkspaceId) -> RepoResult<Vec<Board>> {
        let mut stmt = self.conn.prepare(
            "SELECT uuid, workspace_uuid, title, description, created_at
             FROM boards
             WHERE workspace_uuid = ?1
             ORDER BY created_at ASC, uuid ASC;",
        )?;
        let mut rows = stmt.query([workspace.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_board_row(row)?);
        }
        Ok(items)
    }

    fn list_boards_for(&self, user: UserId) -> RepoResult<Vec<Board>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                b.uuid AS uuid,
                b.workspace_uuid AS workspace_uuid,
                b.title AS title,
                b.description AS description,
                b.created_at AS created_at
             FROM boards b
             INNER JOIN workspaces w ON w.uuid = b.workspace_uuid
             WHERE w.owner_uuid = ?1
                OR EXISTS(
                    SELECT 1 FROM workspace_members m
                    WHERE m.workspace_uuid = w.uuid AND m.user_uuid = ?1
                )
             ORDER BY b.created_at ASC, b.uuid ASC;",
        )?;
        let mut rows = stmt.query([user.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_board_row(row)?);
        }
        Ok(items)
    }

    fn update_board(&self, id: BoardId, title: &str, description: &str) -> RepoResult<Board> {
        let changed = self.conn.execute(
            "UPDATE boards
             SET title = ?2,
                 description = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), title, description],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "board", id });
        }
        self.get_board(id)?
            .ok_or(RepoError::NotFound { entity: "board", id })
    }

    fn delete_board(&self, id: BoardId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM boards WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound { entity: "board", id });
        }
        Ok(())
    }

    fn resolve_workspace(&self, target: AccessTarget) -> RepoResult<Option<WorkspaceId>> {
        let sql = match target {
            AccessTarget::Workspace(_) => "SELECT uuid FROM workspaces WHERE uuid = ?1;",
            AccessTarget::Board(_) => "SELECT workspace_uuid FROM boards WHERE uuid = ?1;",
            AccessTarget::Column(_) => {
                "SELECT b.workspace_uuid
                 FROM board_columns c
                 INNER JOIN boards b ON b.uuid = c.board_uuid
                 WHERE c.uuid = ?1;"
            }
            AccessTarget::Task(_) => {
                "SELECT b.workspace_uuid
                 FROM tasks t
                 INNER JOIN board_columns c ON c.uuid = t.column_uuid
                 INNER JOIN boards b ON b.uuid = c.board_uuid
                 WHERE t.uuid = ?1;"
            }
        };
        let value: Option<String> = self
            .conn
            .query_row(sql, [target.id().to_string()], |row| row.get(0))
            .optional()?;
        value
            .map(|value| parse_uuid(&value, "workspaces.uuid"))
            .transpose()
    }

    fn member_role(&self, workspace: WorkspaceId, user: UserId) -> RepoResult<Option<MemberRole>> {
        let row: Option<(i64, i64)> = self
            .conn
            .query_row(
                "SELECT
                    w.owner_uuid = ?2,
                    EXISTS(
                        SELECT 1 FROM workspace_members m
                        WHERE m.workspace_uuid = w.uuid AND m.user_uuid = ?2
                    )
                 FROM workspaces w
                 WHERE w.uuid = ?1;",
                params![workspace.to_string(), user.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(match row {
            Some((1, _)) => Some(MemberRole::Owner),
            Some((_, 1)) => Some(MemberRole::Member),
            _ => None,
        })
    }

    fn task_assignee(&self, task: TaskId) -> RepoResult<Option<UserId>> {
        let value: Option<Option<String>> = self
            .conn
            .query_row(
                "SELECT assignee_uuid FROM tasks WHERE uuid = ?1;",
                [task.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        value
            .flatten()
            .map(|value| parse_uuid(&value, "tasks.assignee_uuid"))
            .transpose()
    }

    fn shares_workspace(&self, user: UserId, other: UserId) -> RepoResult<bool> {
        require_user(self.conn, other)?;
        let shared: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM workspace_members a
                INNER JOIN workspace_members b ON b.workspace_uuid = a.workspace_uuid
                WHERE a.user_uuid = ?1 AND b.user_uuid = ?2
             );",
            params![user.to_string(), other.to_string()],
            |row| row.get(0),
        )?;
        Ok(shared == 1)
    }
}

fn require_user(conn: &Connection, user: UserId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE uuid = ?1);",
        [user.to_string()],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::NotFound {
            entity: "user",
            id: user,
        });
    }
    Ok(())
}

fn require_workspace(conn: &Connection, workspace: WorkspaceId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM workspaces WHERE uuid = ?1);",
        [workspace.to_string()],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::NotFound {
            entity: "workspace",
            id: workspace,
        });
    }
    Ok(())
}

fn parse_workspace_row(row: &Row<'_>) -> RepoResult<Workspace> {
    let uuid: String = row.get("uuid")?;
    let owner: String = row.get("owner_uuid")?;
    Ok(Workspace {
        id: parse_uuid(&uuid, "workspaces.uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        owner_id: parse_uuid(&owner, "workspaces.owner_uuid")?,
    })
}

fn parse_board_row(row: &Row<'_>) -> RepoResult<Board> {
    let uuid: String = row.get("uuid")?;
    let workspace: String = row.get("workspace_uuid")?;
    Ok(Board {
        id: parse_uuid(&uuid, "boards.uuid")?,
        workspace_id: parse_uuid(&workspace, "boards.workspace_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
    })
}
