use std::{fs, fs::File, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};

use self::{
    art_repo::ArtRepositoryRef,
    cascade_repo::CascadeRepositoryRef,
    invitation_repo::InvitationRepositoryRef,
    review_repo::ReviewRepositoryRef,
    sqlite::{
        art_repo::SqliteArtRepository, cascade_repo::SqliteCascadeRepository,
        connection as sqlite_connection, invitation_repo::SqliteInvitationRepository,
        review_repo::SqliteReviewRepository, task_repo::SqliteTaskRepository,
        user_repo::SqliteUserRepository, workspace_repo::SqliteWorkspaceRepository,
    },
    task_repo::TaskRepositoryRef,
    user_repo::UserRepositoryRef,
    workspace_repo::WorkspaceRepositoryRef,
};
use crate::config::AppConfig;

pub mod art_repo;
pub mod cascade_repo;
pub mod errors;
pub mod invitation_repo;
pub mod review_repo;
pub mod sqlite;
pub mod task_repo;
pub mod user_repo;
pub mod workspace_repo;

#[derive(Clone)]
pub struct RepositoryRegistry {
    workspace_repo: WorkspaceRepositoryRef,
    invitation_repo: InvitationRepositoryRef,
    task_repo: TaskRepositoryRef,
    art_repo: ArtRepositoryRef,
    review_repo: ReviewRepositoryRef,
    user_repo: UserRepositoryRef,
    cascade_repo: CascadeRepositoryRef,
}

impl RepositoryRegistry {
    pub fn workspace_repo(&self) -> WorkspaceRepositoryRef {
        self.workspace_repo.clone()
    }

    pub fn invitation_repo(&self) -> InvitationRepositoryRef {
        self.invitation_repo.clone()
    }

    pub fn task_repo(&self) -> TaskRepositoryRef {
        self.task_repo.clone()
    }

    pub fn art_repo(&self) -> ArtRepositoryRef {
        self.art_repo.clone()
    }

    pub fn review_repo(&self) -> ReviewRepositoryRef {
        self.review_repo.clone()
    }

    pub fn user_repo(&self) -> UserRepositoryRef {
        self.user_repo.clone()
    }

    pub fn cascade_repo(&self) -> CascadeRepositoryRef {
        self.cascade_repo.clone()
    }
}

#[derive(Clone)]
pub struct Database {
    pool: sqlite_connection::SqlitePool,
    path: PathBuf,
    repositories: Arc<RepositoryRegistry>,
}

impl Database {
    const SQLITE_FILE_NAME: &'static str = "atelier.db";

    pub async fn connect(config: &AppConfig) -> Result<Self> {
        let (data_dir, db_file) = Self::resolve_database_paths(config)?;
        fs::create_dir_all(&data_dir).with_context(|| {
            format!(
                "failed to create database directory: {}",
                data_dir.display()
            )
        })?;

        if !db_file.exists() {
            File::create(&db_file).with_context(|| {
                format!("failed to create database file: {}", db_file.display())
            })?;
        }

        let pool =
            sqlite_connection::create_pool(&db_file, config.database_max_connections).await?;
        sqlite_connection::run_migrations(&pool).await?;

        let repositories = Arc::new(RepositoryRegistry {
            workspace_repo: Arc::new(SqliteWorkspaceRepository::new(pool.clone())),
            invitation_repo: Arc::new(SqliteInvitationRepository::new(pool.clone())),
            task_repo: Arc::new(SqliteTaskRepository::new(pool.clone())),
            art_repo: Arc::new(SqliteArtRepository::new(pool.clone())),
            review_repo: Arc::new(SqliteReviewRepository::new(pool.clone())),
            user_repo: Arc::new(SqliteUserRepository::new(pool.clone())),
            cascade_repo: Arc::new(SqliteCascadeRepository::new(pool.clone())),
        });

        Ok(Self {
            pool,
            path: data_dir,
            repositories,
        })
    }

    pub fn pool(&self) -> &sqlite_connection::SqlitePool {
        &self.pool
    }

    pub fn database_path(&self) -> &PathBuf {
        &self.path
    }

    pub fn repositories(&self) -> Arc<RepositoryRegistry> {
        self.repositories.clone()
    }

    fn resolve_database_paths(config: &AppConfig) -> Result<(PathBuf, PathBuf)> {
        if config.database_path_is_file() {
            let db_file = Self::resolve_path(&config.database_path)?;
            let dir = if let Some(parent) = db_file.parent() {
                parent.to_path_buf()
            } else {
                std::env::current_dir().context("failed to obtain current directory")?
            };
            Ok((dir, db_file))
        } else {
            let data_dir = Self::resolve_path(&config.database_path)?;
            Ok((data_dir.clone(), data_dir.join(Self::SQLITE_FILE_NAME)))
        }
    }

    fn resolve_path(path: &str) -> Result<PathBuf> {
        let path = PathBuf::from(path);
        if path.is_absolute() {
            Ok(path)
        } else {
            let cwd = std::env::current_dir().context("failed to obtain current directory")?;
            Ok(cwd.join(path))
        }
    }
}
