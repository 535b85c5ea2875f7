use blivalley_core::model::{
    AuthProvider, BrowserTab, Email, EnvironmentSnapshot, MilestoneDraft, NewUser, NewWorkSession,
    Project, ProjectDraft, ProjectStatus, TaskDraft, TaskRef, Theme, UserId, UserSettingsDraft,
    WorkStatus,
};
use blivalley_core::time::fixed_now;
use chrono::{Duration, NaiveDate};
use storage::repository::{
    ProjectRepository, SessionQuery, StorageError, UserRepository, WorkSessionRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

async fn seed_user(repo: &SqliteRepository, email: &str) -> UserId {
    let user = NewUser::new(email, "Ada", None, AuthProvider::Google, None, fixed_now()).unwrap();
    repo.insert_user(&user).await.unwrap()
}

fn draft() -> ProjectDraft {
    ProjectDraft {
        name: "Garden shed".into(),
        description: Some("weekend build".into()),
        category: Some("diy".into()),
        deadline: NaiveDate::from_ymd_opt(2024, 5, 1),
        milestones: vec![MilestoneDraft {
            name: "Foundation".into(),
            due_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            tasks: vec![
                TaskDraft {
                    name: "Level ground".into(),
                    notes: Some("rent a compactor".into()),
                },
                TaskDraft {
                    name: "Pour slab".into(),
                    notes: None,
                },
            ],
            ..MilestoneDraft::default()
        }],
    }
}

fn first_task(project: &Project) -> TaskRef {
    let m = &project.milestones()[0];
    TaskRef {
        project_id: project.id(),
        milestone_id: m.id(),
        task_id: m.tasks()[0].id(),
    }
}

#[tokio::test]
async fn project_document_roundtrip() {
    let repo = connect("memdb_project_roundtrip").await;
    let owner = seed_user(&repo, "owner@example.com").await;
    let validated = draft().validate(owner, fixed_now()).unwrap();

    let id = repo.insert_project(&validated).await.unwrap();
    let stored = repo.get_project(id).await.unwrap().expect("project");

    assert_eq!(stored.owner_id(), owner);
    assert_eq!(stored.name(), "Garden shed");
    assert_eq!(stored.category(), Some("diy"));
    assert_eq!(stored.deadline(), NaiveDate::from_ymd_opt(2024, 5, 1));
    assert_eq!(stored.version(), 1);
    assert_eq!(stored.milestones(), validated.project().milestones());
    assert_eq!(stored.milestones()[0].tasks()[0].notes(), Some("rent a compactor"));
}

#[tokio::test]
async fn update_project_checks_version() {
    let repo = connect("memdb_project_version").await;
    let owner = seed_user(&repo, "owner@example.com").await;
    let id = repo
        .insert_project(&draft().validate(owner, fixed_now()).unwrap())
        .await
        .unwrap();

    let loaded = repo.get_project(id).await.unwrap().unwrap();
    let target = first_task(&loaded);
    let mut edited = loaded.clone();
    edited
        .update_task(target.milestone_id, target.task_id, |t| {
            t.set_status(WorkStatus::Completed);
            Ok(())
        })
        .unwrap();
    edited.touch(fixed_now() + Duration::minutes(1));

    assert_eq!(repo.update_project(&edited).await.unwrap(), 2);
    let err = repo.update_project(&loaded).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let stored = repo.get_project(id).await.unwrap().unwrap();
    assert_eq!(stored.version(), 2);
    assert_eq!(stored.progress(), 50);
    assert_eq!(stored.milestones()[0].status(), WorkStatus::InProgress);
}

#[tokio::test]
async fn list_projects_filters_by_status() {
    let repo = connect("memdb_project_list").await;
    let owner = seed_user(&repo, "owner@example.com").await;
    let other = seed_user(&repo, "other@example.com").await;

    let keep = repo
        .insert_project(&draft().validate(owner, fixed_now()).unwrap())
        .await
        .unwrap();
    let archive = repo
        .insert_project(&draft().validate(owner, fixed_now()).unwrap())
        .await
        .unwrap();
    repo.insert_project(&draft().validate(other, fixed_now()).unwrap())
        .await
        .unwrap();

    let mut archived = repo.get_project(archive).await.unwrap().unwrap();
    archived.set_status(ProjectStatus::Archived);
    repo.update_project(&archived).await.unwrap();

    let all = repo.list_projects(owner, None, 10).await.unwrap();
    assert_eq!(all.len(), 2);

    let active = repo
        .list_projects(owner, Some(ProjectStatus::Active), 10)
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id(), keep);
}

#[tokio::test]
async fn one_active_session_per_user() {
    let repo = connect("memdb_one_active").await;
    let owner = seed_user(&repo, "owner@example.com").await;
    let id = repo
        .insert_project(&draft().validate(owner, fixed_now()).unwrap())
        .await
        .unwrap();
    let project = repo.get_project(id).await.unwrap().unwrap();
    let env = EnvironmentSnapshot {
        open_apps: vec!["editor".into()],
        browser_tabs: vec![BrowserTab {
            title: "Concrete calculator".into(),
            url: "https://example.com/calc".into(),
        }],
    };
    let new = NewWorkSession::start(
        owner,
        first_task(&project),
        fixed_now(),
        Some("start digging".into()),
        Some(env.clone()),
    );

    let first = repo.insert_session(&new).await.unwrap();
    assert!(matches!(
        repo.insert_session(&new).await.unwrap_err(),
        StorageError::Conflict
    ));

    let mut active = repo.active_session(owner).await.unwrap().expect("active");
    assert_eq!(active.id(), first);
    assert_eq!(active.environment(), Some(&env));
    assert_eq!(active.target(), first_task(&project));

    active
        .stop(fixed_now() + Duration::minutes(30), Some("dug".into()))
        .unwrap();
    repo.update_session(&active).await.unwrap();
    assert!(repo.active_session(owner).await.unwrap().is_none());

    let later = NewWorkSession::start(
        owner,
        first_task(&project),
        fixed_now() + Duration::hours(1),
        None,
        None,
    );
    let second = repo.insert_session(&later).await.unwrap();

    let listed = repo
        .list_sessions(&SessionQuery::for_user(owner, 10))
        .await
        .unwrap();
    assert_eq!(
        listed.iter().map(|s| s.id()).collect::<Vec<_>>(),
        vec![second, first]
    );
    assert_eq!(listed[1].duration_secs(), Some(1800));
    assert_eq!(listed[1].note(), Some("dug"));
}

#[tokio::test]
async fn deleting_project_cascades_sessions() {
    let repo = connect("memdb_project_cascade").await;
    let owner = seed_user(&repo, "owner@example.com").await;
    let id = repo
        .insert_project(&draft().validate(owner, fixed_now()).unwrap())
        .await
        .unwrap();
    let project = repo.get_project(id).await.unwrap().unwrap();
    let new = NewWorkSession::start(owner, first_task(&project), fixed_now(), None, None);
    let session = repo.insert_session(&new).await.unwrap();

    repo.delete_project(id).await.unwrap();
    assert!(repo.get_session(session).await.unwrap().is_none());
    assert!(repo.project_sessions(id).await.unwrap().is_empty());
    assert!(matches!(
        repo.delete_project(id).await.unwrap_err(),
        StorageError::NotFound
    ));
}

#[tokio::test]
async fn users_unique_email_and_settings() {
    let repo = connect("memdb_users").await;
    let id = seed_user(&repo, "Ada@Example.com").await;

    let dup = NewUser::new(
        "ada@example.com",
        "Other",
        None,
        AuthProvider::Github,
        None,
        fixed_now(),
    )
    .unwrap();
    assert!(matches!(
        repo.insert_user(&dup).await.unwrap_err(),
        StorageError::Conflict
    ));

    let mut user = repo
        .find_by_email(&Email::parse("ada@example.com").unwrap())
        .await
        .unwrap()
        .expect("user");
    assert_eq!(user.id(), id);

    let settings = UserSettingsDraft {
        theme: Some("dark".into()),
        capture_enabled: Some(true),
        capture_browser_tabs: Some(true),
        ..UserSettingsDraft::new()
    }
    .apply_to(user.settings())
    .unwrap();
    user.set_settings(settings);
    user.set_display_name("Ada L.").unwrap();
    repo.update_user(&user).await.unwrap();

    let stored = repo.get_user(id).await.unwrap().unwrap();
    assert_eq!(stored.display_name(), "Ada L.");
    assert_eq!(stored.settings().theme(), Theme::Dark);
    assert!(stored.settings().session_capture().capture_browser_tabs);
    assert!(!stored.settings().session_capture().capture_open_apps);
}
