use anyhow::Context;
use blivalley_core::model::{MilestoneDraft, ProjectDraft, TaskDraft};
use chrono::Duration;
use services::{AppServices, AuthError};
use tracing::info;

fn task(name: &str) -> TaskDraft {
    TaskDraft {
        name: name.to_owned(),
        notes: None,
    }
}

fn demo_project(today: chrono::NaiveDate) -> ProjectDraft {
    ProjectDraft {
        name: "Launch personal site".into(),
        description: Some("Portfolio with a blog and project pages".into()),
        category: Some("web".into()),
        deadline: Some(today + Duration::days(30)),
        milestones: vec![
            MilestoneDraft {
                name: "Design".into(),
                due_date: Some(today + Duration::days(7)),
                tasks: vec![task("Pick a color palette"), task("Sketch page layouts")],
                ..MilestoneDraft::default()
            },
            MilestoneDraft {
                name: "Build".into(),
                due_date: Some(today + Duration::days(21)),
                tasks: vec![
                    task("Set up static site generator"),
                    task("Write about page"),
                    task("Deploy"),
                ],
                ..MilestoneDraft::default()
            },
        ],
    }
}

/// Registers the demo account (or logs into it) and adds a sample project.
pub async fn run(services: &AppServices, email: &str, password: &str) -> anyhow::Result<()> {
    let auth = services.auth();
    let session = match auth.register(email, "Demo User", password).await {
        Ok(session) => session,
        Err(AuthError::EmailTaken) => auth
            .login(email, password)
            .await
            .context("demo account exists with a different password")?,
        Err(e) => return Err(e).context("registering demo account"),
    };

    let today = chrono::Utc::now().date_naive();
    let project = services
        .projects()
        .create_project(session.user.id(), demo_project(today))
        .await
        .context("creating demo project")?;

    info!(user = %session.user.id(), project_id = %project.id(), "seeded demo data");
    println!("email:   {email}");
    println!("token:   {}", session.token);
    println!("project: {}", project.id());
    Ok(())
}
