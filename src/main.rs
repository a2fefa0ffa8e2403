//! taskflow CLI - projects, tasks and workflows from the terminal

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;

use taskflow::api::{FileUpload, Registration};
use taskflow::config::TaskflowConfig;
use taskflow::error::{FixSuggestion, Result, TaskflowError};
use taskflow::guard::{Route, RouteGuard};
use taskflow::model::{NewTask, Project, Role, Task, TaskNode, TaskStatus};
use taskflow::ops::{self, ProjectDraft, TaskChanges, WorkflowView};
use taskflow::session::{magic_link_token, FileCredentialStore, Session};
use taskflow::timestamp::parse_text;
use taskflow::validation::{forms, FormValues};
use taskflow::workflow::to_svg;
use taskflow::{logging, tui, ApiClient};

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(about = "Manage projects, tasks and task workflows")]
#[command(version)]
struct Cli {
    /// Override the API base URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        repeat_password: String,
        /// Manager or User
        #[arg(long, default_value = "User")]
        role: String,
        #[arg(long)]
        captcha: Option<String>,
    },

    /// Confirm an account with the emailed code
    Verify { username: String, code: String },

    /// Sign in and store the token
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the stored token
    Logout,

    /// Show who the stored token belongs to
    Whoami,

    /// Sign in with a magic link, or request one with --email
    MagicLink {
        /// Link from the email (or the bare token)
        #[arg(required_unless_present = "email")]
        link: Option<String>,
        #[arg(long, conflicts_with = "link")]
        email: Option<String>,
    },

    /// Password recovery
    Recover {
        #[command(subcommand)]
        action: RecoverAction,
    },

    /// Your account
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Projects
    Projects {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Project membership
    Members {
        #[command(subcommand)]
        action: MemberAction,
    },

    /// Tasks of a project
    Tasks {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Task membership
    TaskMembers {
        #[command(subcommand)]
        action: MemberAction,
    },

    /// Task dependency graphs
    Workflow {
        #[command(subcommand)]
        action: WorkflowAction,
    },

    /// Your notifications, newest first
    Notifications {
        /// Show the notifications of one project instead
        #[arg(long)]
        project: Option<String>,
    },

    /// Task attachments
    Files {
        #[command(subcommand)]
        action: FileAction,
    },

    /// Local configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum RecoverAction {
    /// Email a recovery link
    Request { email: String },
    /// Set a new password
    Reset {
        #[arg(long)]
        username: String,
        #[arg(long)]
        new_password: String,
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    /// Delete your account and log out
    Delete {
        #[arg(long)]
        yes: bool,
    },
    ChangePassword {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
        #[arg(long)]
        confirm: String,
    },
}

#[derive(Subcommand)]
enum ProjectAction {
    List,
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        /// YYYY-MM-DD, strictly after today
        #[arg(long)]
        completion_date: String,
        #[arg(long)]
        min_members: String,
        #[arg(long)]
        max_members: String,
    },
    Delete {
        id: String,
        /// Also delete every task of the project
        #[arg(long)]
        cascade: bool,
    },
}

#[derive(Subcommand)]
enum MemberAction {
    Add { target: String, username: String },
    Remove { target: String, username: String },
}

#[derive(Subcommand)]
enum TaskAction {
    List {
        project: String,
    },
    Show {
        id: String,
    },
    Create {
        project: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Pending, Working or Done
        #[arg(long)]
        status: Option<String>,
    },
    /// Delete every task of a project
    DeleteAll {
        project: String,
    },
}

#[derive(Subcommand)]
enum WorkflowAction {
    Create {
        project: String,
        #[arg(long)]
        name: String,
        /// JSON array of {id, name, description, dependencies}
        #[arg(long)]
        tasks: Option<PathBuf>,
    },
    AddTask {
        project: String,
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
    },
    Show {
        project: String,
        /// Write the graph as SVG
        #[arg(long)]
        svg: Option<PathBuf>,
        /// Open the interactive viewer
        #[arg(long)]
        tui: bool,
    },
}

#[derive(Subcommand)]
enum FileAction {
    Upload { task: String, path: PathBuf },
    List { task: String },
    Download {
        file: String,
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
    Delete { file: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    SetUrl { url: String },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli).await {
        report(&e);
        std::process::exit(1);
    }
}

fn report(e: &TaskflowError) {
    eprintln!("{} {}", "Error:".red().bold(), e);
    if let TaskflowError::Validation { report, .. } = e {
        for line in report.lines() {
            eprintln!("  {} {}", "-".red(), line);
        }
    }
    if e.is_conflict() {
        eprintln!(
            "  {} the server refused because the resource is still in use",
            "Conflict:".yellow()
        );
    }
    if let Some(suggestion) = e.fix_suggestion() {
        eprintln!("  {} {}", "Fix:".yellow(), suggestion);
    }
}

/// Loaded config and session for one command
struct App {
    config: TaskflowConfig,
    session: Session,
}

impl App {
    fn load(api_url: Option<String>) -> Result<Self> {
        let config = TaskflowConfig::load()?.with_env().with_api_url(api_url);
        let session = Session::open(Box::new(FileCredentialStore::default_location()))?;
        Ok(Self { config, session })
    }

    /// Guard check, then a client carrying the session token
    fn api_for(&self, route: Route) -> Result<ApiClient> {
        RouteGuard::enforce(&self.session, route)?;
        ApiClient::for_session(&self.config.api, &self.session)
    }

    fn username(&self) -> Result<String> {
        let credential = self.session.require()?;
        credential
            .claims
            .username
            .clone()
            .ok_or_else(|| TaskflowError::InvalidToken {
                reason: "token carries no username".into(),
            })
    }
}

fn today() -> chrono::NaiveDate {
    Utc::now().date_naive()
}

fn ok(message: impl std::fmt::Display) {
    println!("{} {}", "✓".green(), message);
}

async fn run(cli: Cli) -> Result<()> {
    let mut app = App::load(cli.api_url)?;

    match cli.command {
        Commands::Register {
            first_name,
            last_name,
            username,
            email,
            password,
            repeat_password,
            role,
            captcha,
        } => {
            forms::register().check(
                &FormValues::new()
                    .with("firstname", first_name.as_str())
                    .with("lastname", last_name.as_str())
                    .with("username", username.as_str())
                    .with("email", email.as_str())
                    .with("password", password.as_str())
                    .with("repeat_password", repeat_password.as_str())
                    .with("role", role.as_str()),
                today(),
            )?;
            let api = app.api_for(Route::Register)?;
            api.register(&Registration {
                first_name,
                last_name,
                username: username.clone(),
                email,
                password,
                role: Role::parse(&role),
                captcha_response: captcha,
            })
            .await?;
            ok(format!(
                "Registered '{}'. Check your email, then run 'taskflow verify {} <code>'",
                username, username
            ));
        }

        Commands::Verify { username, code } => {
            forms::verify().check(
                &FormValues::new()
                    .with("username", username.as_str())
                    .with("code", code.as_str()),
                today(),
            )?;
            app.api_for(Route::Verify)?.verify(&username, &code).await?;
            ok(format!("Account '{}' verified", username));
        }

        Commands::Login { username, password } => {
            forms::login().check(
                &FormValues::new()
                    .with("username", username.as_str())
                    .with("password", password.as_str()),
                today(),
            )?;
            let token = app.api_for(Route::Login)?.login(&username, &password).await?;
            let claims = app.session.login(&token)?;
            ok(format!(
                "Logged in as {} ({})",
                claims.username.as_deref().unwrap_or(&username),
                claims.role.as_ref().map_or("no role", |r| r.as_str())
            ));
        }

        Commands::Logout => {
            app.session.logout()?;
            ok("Logged out");
        }

        Commands::Whoami => {
            RouteGuard::enforce(&app.session, Route::Profile)?;
            let credential = app.session.require()?;
            let claims = &credential.claims;
            println!(
                "{} {}",
                "User:".cyan(),
                claims.username.as_deref().unwrap_or("?")
            );
            println!(
                "{} {}",
                "Role:".cyan(),
                claims.role.as_ref().map_or("none", |r| r.as_str())
            );
            if let Some(exp) = claims.expires_at {
                println!("{} {}", "Expires:".cyan(), exp.format("%Y-%m-%d %H:%M UTC"));
            }
        }

        Commands::MagicLink { link, email } => match (link, email) {
            (_, Some(email)) => {
                forms::recovery_request()
                    .check(&FormValues::new().with("email", email.as_str()), today())?;
                app.api_for(Route::MagicLink)?
                    .request_magic_link(&email)
                    .await?;
                ok(format!("Magic link sent to {}", email));
            }
            (Some(link), None) => {
                RouteGuard::enforce(&app.session, Route::MagicLink)?;
                let token = magic_link_token(&link)?;
                let claims = app.session.login(&token)?;
                ok(format!(
                    "Logged in as {}",
                    claims.username.as_deref().unwrap_or("?")
                ));
            }
            (None, None) => unreachable!("clap requires a link or --email"),
        },

        Commands::Recover { action } => recover(&app, action).await?,
        Commands::Profile { action } => profile(&mut app, action).await?,
        Commands::Projects { action } => projects(&app, action).await?,
        Commands::Members { action } => members(&app, action).await?,
        Commands::Tasks { action } => tasks(&app, action).await?,
        Commands::TaskMembers { action } => task_members(&app, action).await?,
        Commands::Workflow { action } => workflow(&app, action).await?,
        Commands::Notifications { project } => notifications(&app, project.as_deref()).await?,
        Commands::Files { action } => files(&app, action).await?,
        Commands::Config { action } => config(&app, action)?,
    }

    Ok(())
}

async fn recover(app: &App, action: RecoverAction) -> Result<()> {
    let api = app.api_for(Route::PasswordRecovery)?;
    match action {
        RecoverAction::Request { email } => {
            forms::recovery_request()
                .check(&FormValues::new().with("email", email.as_str()), today())?;
            api.request_password_recovery(&email).await?;
            ok(format!("Recovery email sent to {}", email));
        }
        RecoverAction::Reset {
            username,
            new_password,
            confirm,
        } => {
            forms::password_recovery().check(
                &FormValues::new()
                    .with("username", username.as_str())
                    .with("new_password", new_password.as_str())
                    .with("confirm_new_password", confirm.as_str()),
                today(),
            )?;
            api.recover_password(&username, &new_password).await?;
            ok("Password reset; log in with the new password");
        }
    }
    Ok(())
}

async fn profile(app: &mut App, action: ProfileAction) -> Result<()> {
    let api = app.api_for(Route::Profile)?;
    let username = app.username()?;
    match action {
        ProfileAction::Show => {
            let user = api.get_user(&username).await?;
            println!("{} {}", "Username:".cyan(), user.username);
            println!("{} {} {}", "Name:".cyan(), user.first_name, user.last_name);
            println!("{} {}", "Email:".cyan(), user.email);
            println!("{} {}", "Role:".cyan(), user.role);
        }
        ProfileAction::Delete { yes } => {
            if !yes {
                println!(
                    "{} this deletes account '{}'. Re-run with --yes to confirm.",
                    "!".yellow(),
                    username
                );
                return Ok(());
            }
            api.delete_user(&username).await?;
            app.session.logout()?;
            ok(format!("Account '{}' deleted", username));
        }
        ProfileAction::ChangePassword {
            current,
            new,
            confirm,
        } => {
            forms::change_password().check(
                &FormValues::new()
                    .with("current_password", current.as_str())
                    .with("new_password", new.as_str())
                    .with("confirm_new_password", confirm.as_str()),
                today(),
            )?;
            api.change_password(&username, &current, &new).await?;
            ok("Password changed");
        }
    }
    Ok(())
}

fn print_project_row(project: &Project) {
    println!(
        "{}  {}  due {}  members {}/{}",
        project.id.dimmed(),
        project.name.bold(),
        project.completion_date.format("%Y-%m-%d"),
        project.members.len(),
        project.max_members
    );
}

async fn projects(app: &App, action: ProjectAction) -> Result<()> {
    match action {
        ProjectAction::List => {
            let projects = app.api_for(Route::Projects)?.list_projects().await?;
            if projects.is_empty() {
                println!("No projects");
            }
            for project in &projects {
                print_project_row(project);
            }
        }
        ProjectAction::Show { id } => {
            let project = app.api_for(Route::ProjectDetails)?.get_project(&id).await?;
            println!("{} {}", "Project:".cyan(), project.name.bold());
            println!("{} {}", "Id:".cyan(), project.id);
            println!(
                "{} {}",
                "Completion:".cyan(),
                project.completion_date.format("%Y-%m-%d")
            );
            println!(
                "{} {} to {}",
                "Team size:".cyan(),
                project.min_members,
                project.max_members
            );
            println!("{} {}", "Manager:".cyan(), project.manager.username);
            println!("{}", "Members:".cyan());
            if project.members.is_empty() {
                println!("  none");
            }
            for member in &project.members {
                println!("  {} ({})", member.username, member.role);
            }
        }
        ProjectAction::Create {
            name,
            completion_date,
            min_members,
            max_members,
        } => {
            let values = FormValues::new()
                .with("name", name.as_str())
                .with("completion_date", completion_date.as_str())
                .with("min_members", min_members.as_str())
                .with("max_members", max_members.as_str());
            forms::project_create().check(&values, today())?;
            let api = app.api_for(Route::CreateProject)?;
            let draft = ProjectDraft {
                name,
                completion_date: parse_text(&completion_date)?,
                min_members: parse_count("min_members", &min_members)?,
                max_members: parse_count("max_members", &max_members)?,
            };
            let claims = &app.session.require()?.claims;
            let report = ops::create_project_as(&api, claims, draft).await?;
            ok(format!("Project '{}' created", report.value.name));
        }
        ProjectAction::Delete { id, cascade } => {
            let api = app.api_for(Route::ProjectDetails)?;
            if cascade {
                ops::delete_project_cascade(&api, &id).await?;
                ok(format!("Project {} and its tasks deleted", id));
            } else {
                api.delete_project(&id).await?;
                ok(format!("Project {} deleted", id));
            }
        }
    }
    Ok(())
}

/// Counts already passed form validation; this only converts them
fn parse_count(field: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse()
        .map_err(|_| TaskflowError::InvalidArgument {
            field: field.to_string(),
            reason: "must be a whole number".into(),
        })
}

fn check_member_form(username: &str) -> Result<()> {
    forms::add_member().check(&FormValues::new().with("username", username), today())
}

async fn members(app: &App, action: MemberAction) -> Result<()> {
    let api = app.api_for(Route::ProjectMembers)?;
    match action {
        MemberAction::Add { target, username } => {
            check_member_form(&username)?;
            let report = ops::add_project_member_by_username(&api, &target, &username).await?;
            ok(format!("{} added to project {}", report.value.username, target));
        }
        MemberAction::Remove { target, username } => {
            let report =
                ops::remove_project_member_by_username(&api, &target, &username).await?;
            ok(format!(
                "{} removed from project {}",
                report.value.username, target
            ));
        }
    }
    Ok(())
}

fn print_task_row(task: &Task) {
    let status = match task.status {
        TaskStatus::Done => task.status.as_str().green(),
        TaskStatus::Working => task.status.as_str().yellow(),
        TaskStatus::Pending => task.status.as_str().normal(),
    };
    println!(
        "{}  {:<8}  {}  ({} members)",
        task.id.dimmed(),
        status,
        task.name.bold(),
        task.members.len()
    );
}

async fn tasks(app: &App, action: TaskAction) -> Result<()> {
    match action {
        TaskAction::List { project } => {
            let tasks = app.api_for(Route::Tasks)?.list_tasks(&project).await?;
            if tasks.is_empty() {
                println!("No tasks");
            }
            for task in &tasks {
                print_task_row(task);
            }
        }
        TaskAction::Show { id } => {
            let task = app.api_for(Route::TaskDetails)?.get_task(&id).await?;
            println!("{} {}", "Task:".cyan(), task.name.bold());
            println!("{} {}", "Id:".cyan(), task.id);
            println!("{} {}", "Project:".cyan(), task.project_id);
            println!("{} {}", "Status:".cyan(), task.status);
            println!("{} {}", "Description:".cyan(), task.description);
            let names: Vec<&str> = task.members.iter().map(|m| m.username.as_str()).collect();
            println!(
                "{} {}",
                "Members:".cyan(),
                if names.is_empty() {
                    "none".to_string()
                } else {
                    names.join(", ")
                }
            );
        }
        TaskAction::Create {
            project,
            name,
            description,
        } => {
            forms::task_create().check(
                &FormValues::new()
                    .with("name", name.as_str())
                    .with("description", description.as_str()),
                today(),
            )?;
            let api = app.api_for(Route::CreateTask)?;
            let report = ops::create_task_and_refresh(
                &api,
                &NewTask {
                    name: name.clone(),
                    description,
                    project_id: project,
                },
            )
            .await?;
            ok(format!("Task '{}' created", name));
            for task in &report.value {
                print_task_row(task);
            }
        }
        TaskAction::Update {
            id,
            name,
            description,
            status,
        } => {
            let status = status
                .map(|s| {
                    TaskStatus::from_name(&s).ok_or_else(|| TaskflowError::InvalidArgument {
                        field: "status".into(),
                        reason: format!("unknown status '{}': use Pending, Working or Done", s),
                    })
                })
                .transpose()?;
            let changes = TaskChanges {
                name,
                description,
                status,
            };
            if changes.is_empty() {
                println!("Nothing to update");
                return Ok(());
            }
            let api = app.api_for(Route::TaskDetails)?;
            let report = ops::update_task(&api, &id, changes).await?;
            ok("Task updated");
            print_task_row(&report.value);
        }
        TaskAction::DeleteAll { project } => {
            app.api_for(Route::Tasks)?
                .delete_project_tasks(&project)
                .await?;
            ok(format!("All tasks of project {} deleted", project));
        }
    }
    Ok(())
}

async fn task_members(app: &App, action: MemberAction) -> Result<()> {
    let api = app.api_for(Route::TaskMembers)?;
    match action {
        MemberAction::Add { target, username } => {
            check_member_form(&username)?;
            let report = ops::add_task_member_by_username(&api, &target, &username).await?;
            ok(format!("{} added to task {}", report.value.username, target));
        }
        MemberAction::Remove { target, username } => {
            let report = ops::remove_task_member_by_username(&api, &target, &username).await?;
            ok(format!("{} removed from task {}", report.value.username, target));
        }
    }
    Ok(())
}

/// One entry of a `workflow create --tasks` file
#[derive(Deserialize)]
struct NodeSpec {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    dependencies: Vec<String>,
}

fn read_nodes(path: &Path) -> Result<Vec<TaskNode>> {
    let specs: Vec<NodeSpec> = serde_json::from_str(&fs::read_to_string(path)?)?;
    specs
        .into_iter()
        .map(|spec| {
            forms::workflow_task().check(
                &FormValues::new()
                    .with("id", spec.id.as_str())
                    .with("name", spec.name.as_str()),
                today(),
            )?;
            let mut node = TaskNode::new(spec.id, spec.name).depends_on(spec.dependencies);
            node.description = spec.description;
            Ok(node)
        })
        .collect()
}

async fn workflow(app: &App, action: WorkflowAction) -> Result<()> {
    match action {
        WorkflowAction::Create {
            project,
            name,
            tasks,
        } => {
            let api = app.api_for(Route::EditWorkflow)?;
            let nodes = match tasks {
                Some(path) => read_nodes(&path)?,
                None => Vec::new(),
            };
            let report = ops::create_workflow_with_tasks(&api, &project, &name, &nodes).await?;
            ok(format!(
                "Workflow for '{}' created with {} task(s)",
                name, report.value
            ));
        }
        WorkflowAction::AddTask {
            project,
            id,
            name,
            description,
            depends_on,
        } => {
            forms::workflow_task().check(
                &FormValues::new()
                    .with("id", id.as_str())
                    .with("name", name.as_str()),
                today(),
            )?;
            let api = app.api_for(Route::EditWorkflow)?;
            let mut node = TaskNode::new(id, name).depends_on(depends_on);
            node.description = description;
            let report = ops::add_workflow_task_checked(&api, &project, node).await?;
            ok(format!("Task node '{}' added", report.value.id));
        }
        WorkflowAction::Show { project, svg, tui } => {
            let api = app.api_for(Route::Workflow)?;
            let view = ops::load_workflow_view(&api, &project, &app.config.layout)
                .await?
                .value;
            if let Some(path) = svg {
                fs::write(&path, to_svg(&view.layout))?;
                ok(format!("Graph written to {}", path.display()));
            }
            if tui {
                tui::run(view).await.map_err(|e| {
                    TaskflowError::Io(std::io::Error::other(format!("viewer failed: {:#}", e)))
                })?;
            } else {
                print_workflow(&view);
            }
        }
    }
    Ok(())
}

/// Text rendering: one block per level, dependencies listed per node
fn print_workflow(view: &WorkflowView) {
    println!(
        "{} {}",
        "Workflow:".cyan(),
        view.workflow.project_name.bold()
    );
    if view.layout.is_empty() {
        println!("  no tasks yet");
        return;
    }
    let max_level = view.layout.nodes.iter().map(|n| n.level).max().unwrap_or(0);
    for level in 0..=max_level {
        println!("{}", format!("Level {}", level).dimmed());
        for node in view.layout.nodes.iter().filter(|n| n.level == level) {
            let deps: Vec<&str> = view
                .layout
                .edges
                .iter()
                .filter(|e| e.to == node.id)
                .map(|e| e.from.as_str())
                .collect();
            let mark = if node.blocked {
                "blocked".red().bold()
            } else {
                "ready".green()
            };
            print!("  {} {} [{}]", node.id.dimmed(), node.name.bold(), mark);
            if !deps.is_empty() {
                print!("  depends on {}", deps.join(", "));
            }
            println!();
        }
    }
}

async fn notifications(app: &App, project: Option<&str>) -> Result<()> {
    let api = app.api_for(Route::Notifications)?;
    let claims = &app.session.require()?.claims;
    // The service keys notifications by recipient, which is a user or a project
    let recipient = match project {
        Some(id) => id,
        None => claims
            .username
            .as_deref()
            .or(claims.user_id.as_deref())
            .ok_or_else(|| TaskflowError::InvalidToken {
                reason: "token carries no user".into(),
            })?,
    };
    let items = api.list_notifications(recipient).await?;
    if items.is_empty() {
        println!("No notifications");
    }
    for n in &items {
        let marker = if n.read { " ".normal() } else { "●".cyan() };
        println!(
            "{} {}  {}",
            marker,
            n.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            n.message
        );
    }
    Ok(())
}

async fn files(app: &App, action: FileAction) -> Result<()> {
    let api = app.api_for(Route::TaskFiles)?;
    match action {
        FileAction::Upload { task, path } => {
            let upload = FileUpload::from_path(&task, &path)?;
            api.upload_file(&upload).await?;
            ok(format!("Uploaded {} to task {}", upload.file_name, task));
        }
        FileAction::List { task } => {
            let files = api.list_files(&task).await?;
            if files.is_empty() {
                println!("No files");
            }
            for file in &files {
                let size = file.size.map(|s| format!("{} B", s)).unwrap_or_default();
                println!("{}  {}  {}", file.id.dimmed(), file.file_name, size);
            }
        }
        FileAction::Download { file, output } => {
            let download = api.download_file(&file).await?;
            fs::create_dir_all(&output)?;
            // Keep only the final component of a server-supplied name
            let name = Path::new(&download.file_name)
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| file.clone().into());
            let target = output.join(name);
            fs::write(&target, &download.content)?;
            ok(format!(
                "Saved {} ({} bytes)",
                target.display(),
                download.content.len()
            ));
        }
        FileAction::Delete { file } => {
            api.delete_file(&file).await?;
            ok(format!("File {} deleted", file));
        }
    }
    Ok(())
}

fn config(app: &App, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!(
                "{} {}",
                "Config file:".cyan(),
                TaskflowConfig::config_path().display()
            );
            let rendered =
                toml::to_string_pretty(&app.config).map_err(|e| TaskflowError::Config {
                    reason: e.to_string(),
                })?;
            println!("{}", rendered);
        }
        ConfigAction::SetUrl { url } => {
            let mut stored = TaskflowConfig::load()?;
            stored.set_api_url(&url)?;
            stored.save()?;
            ok(format!("API URL set to {}", stored.api.base_url));
        }
    }
    Ok(())
}
