use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use edumanager::core::config::Config;
use edumanager::core::navigation::Location;
use edumanager::core::routes::{Route, STUDENTS_PATH};
use edumanager::core::state::AppState;
use edumanager::handlers::login::LoginView;
use edumanager::handlers::navbar;
use edumanager::handlers::student_form::StudentFormView;
use edumanager::handlers::students::{StudentsView, ToastKind};
use edumanager::models::student::Student;
use edumanager::security::guards::{Guard, GuardDecision};
use std::path::PathBuf;
use tracing::{debug, info};

const DEFAULT_CONFIG: &str = "edumanager.toml";

/// EduManager command line client
#[derive(Parser, Debug)]
#[command(name = "edumanager")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (edumanager.toml is used when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Log in and remember the session
    Login {
        username: String,

        #[arg(allow_hyphen_values = true)]
        password: String,

        /// Page to continue at after logging in
        #[arg(long = "return", value_name = "PATH")]
        return_to: Option<String>,
    },

    /// End the current session
    Logout,

    /// Show who is logged in
    Whoami,

    /// List students, optionally filtered by name or email
    #[command(alias = "ls")]
    List { filter: Option<String> },

    /// Search students by name on the server
    Search { name: String },

    /// Show one student
    Show { id: i64 },

    /// Add a student (login required)
    Create {
        #[arg(long)]
        name: String,

        #[arg(long)]
        email: String,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Change a student (login required); omitted fields keep their value
    Edit {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        /// Empty string clears the phone number
        #[arg(long)]
        phone: Option<String>,
    },

    /// Delete a student (administrators only)
    Delete { id: i64 },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration
    let config = Config::load(cli.config.as_deref(), &PathBuf::from(DEFAULT_CONFIG))
        .context("Failed to load configuration")?;

    // Initialize tracing/logging
    edumanager::core::tracing_init::init_tracing(&config.logging);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(run(config, cli.command))
}

async fn run(config: Config, command: Command) -> Result<()> {
    info!(
        base_url = %config.api.base_url,
        storage = %config.storage.path.display(),
        "EduManager starting"
    );

    let state = AppState::new(config).context("Failed to initialize application state")?;

    match command {
        Command::Login {
            username,
            password,
            return_to,
        } => login(&state, &username, &password, return_to.as_deref()).await,
        Command::Logout => {
            let location = state.logout();
            debug!(location = %location, "Session cleared");
            println!("Logged out");
            Ok(())
        }
        Command::Whoami => {
            println!("{}", navbar::summary(&state.session));
            Ok(())
        }
        Command::List { filter } => list(&state, filter.as_deref()).await,
        Command::Search { name } => {
            let mut view = StudentsView::new(state.clone());
            view.search(&name).await;
            if let Some(error) = view.error {
                bail!(error);
            }
            print_students(view.students.iter());
            Ok(())
        }
        Command::Show { id } => {
            let student = state.students.get(id).await?;
            print_students(std::iter::once(&student));
            Ok(())
        }
        Command::Create { name, email, phone } => {
            let mut form = open_form(&state, &Route::StudentNew.path()).await?;
            form.draft.name = name;
            form.draft.email = email;
            form.draft.phone = phone;
            save(form).await
        }
        Command::Edit {
            id,
            name,
            email,
            phone,
        } => {
            let mut form = open_form(&state, &Route::StudentEdit(id).path()).await?;
            if let Some(name) = name {
                form.draft.name = name;
            }
            if let Some(email) = email {
                form.draft.email = email;
            }
            if let Some(phone) = phone {
                form.draft.phone = Some(phone).filter(|p| !p.is_empty());
            }
            save(form).await
        }
        Command::Delete { id } => delete(&state, id).await,
    }
}

async fn login(state: &AppState, username: &str, password: &str, return_to: Option<&str>) -> Result<()> {
    let target = Location::login_with_return(&Location::parse(return_to.unwrap_or(STUDENTS_PATH)));
    state.navigator.navigate(&target.to_string());

    let mut view = LoginView::open(state.clone());
    if let Some(location) = view.redirected {
        println!("Already logged in as {}; continuing to {}", state.session.username(), location);
        return Ok(());
    }

    match view.submit(username, password).await {
        Some(location) => {
            println!("Logged in as {}", navbar::summary(&state.session));
            println!("Continue at {}", location);
            Ok(())
        }
        None => bail!(view.error.unwrap_or_default()),
    }
}

async fn list(state: &AppState, filter: Option<&str>) -> Result<()> {
    let mut view = StudentsView::new(state.clone());
    view.load().await;

    if let Some(error) = view.error.take() {
        bail!(error);
    }

    let rows = view.filtered(filter.unwrap_or_default());
    let shown = rows.len();
    print_students(rows.into_iter());
    println!("{} of {} students", shown, view.students.len());
    Ok(())
}

async fn delete(state: &AppState, id: i64) -> Result<()> {
    let attempted = Location::new(STUDENTS_PATH);
    if let GuardDecision::Redirect(to) = Guard::Admin.check(&state.session, &attempted) {
        bail!("Only administrators can delete students (go to {})", to);
    }

    let mut view = StudentsView::new(state.clone());
    view.students = vec![state.students.get(id).await?];

    let target = view.students[0].clone();
    view.confirm_delete(&target);
    view.delete_confirmed().await;

    match view.toast {
        Some(toast) if toast.kind == ToastKind::Success => {
            println!("{}", toast.message);
            Ok(())
        }
        Some(toast) => bail!(toast.message),
        None => bail!("Nothing was deleted"),
    }
}

/// Visit a form route; a guard redirect ends the command with the login location
async fn open_form(state: &AppState, path: &str) -> Result<StudentFormView> {
    let reached = state.navigator.navigate(path);

    if reached.path != path {
        bail!("Login required: continue at {}", reached);
    }

    let mut form = StudentFormView::open(state.clone());
    if !form.load().await {
        bail!(form.error.unwrap_or_default());
    }

    Ok(form)
}

async fn save(mut form: StudentFormView) -> Result<()> {
    match form.submit().await {
        Some(location) => {
            println!("Student saved; continue at {}", location);
            Ok(())
        }
        None => bail!(form.error.unwrap_or_default()),
    }
}

fn print_students<'a>(students: impl Iterator<Item = &'a Student>) {
    for student in students {
        println!(
            "{:>5}  {:<30}  {:<32}  {}",
            student.id.map(|id| id.to_string()).unwrap_or_default(),
            student.name,
            student.email,
            student.phone.as_deref().unwrap_or("-"),
        );
    }
}
