use clap::{Parser, Subcommand};
use coursekit::Config;
use coursekit::model::entity::{Lesson, LessonCreate, Module, ModuleCreate, UserEntity};
use coursekit::model::{CrudRepository, DbConnection, ModelManager};
use coursekit::web::AuthenticatedUser;

#[derive(Parser, Debug)]
#[command(about = "CLI tool for seeding the course DB", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserCommands,
    },

    /// Manage modules
    Module {
        #[command(subcommand)]
        action: ModuleCommands,
    },

    /// Manage lessons
    Lesson {
        #[command(subcommand)]
        action: LessonCommands,
    },
}

/// User management
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Creates the administrator, or promotes and resets an existing account
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

/// Module management
#[derive(Subcommand, Debug)]
pub enum ModuleCommands {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    Publish {
        #[arg(long)]
        id: uuid::Uuid,
        /// Unpublish instead, hiding the module and its lessons
        #[arg(long, default_value_t = false)]
        unpublish: bool,
    },
}

/// Lesson management
#[derive(Subcommand, Debug)]
pub enum LessonCommands {
    Add {
        #[arg(long)]
        module_id: uuid::Uuid,
        #[arg(long)]
        title: String,
        /// Path to a Markdown file with lesson content
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        video_url: Option<String>,
        /// Repeat for every objective
        #[arg(long = "objective")]
        objectives: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> coursekit::error::AppResult<()> {
    let _ = dotenvy::dotenv();
    let args = Cli::parse();

    let config = Config::get_or_init(cfg!(debug_assertions)).await;
    let db_con = DbConnection::connect(config.app().database_uri())?;
    let mm = ModelManager::new(db_con);
    let actor = AuthenticatedUser::admin();

    match args.command {
        Commands::User { action } => match action {
            UserCommands::CreateAdmin { email, password } => {
                let hash = coursekit::auth::hash_password(&password)?;
                let user = UserEntity::upsert_admin(&mm, &actor, &email, &hash).await?;
                println!("Admin ready: {} ({})", user.email(), user.id());
            }
        },

        Commands::Module { action } => match action {
            ModuleCommands::Add { title, description } => {
                let module = Module::create(&mm, &actor, ModuleCreate { title, description }).await?;
                println!("Module created: {:?}", module);
            }
            ModuleCommands::Publish { id, unpublish } => {
                let module = Module::find_required(&mm, &actor, id)
                    .await?
                    .set_published(&mm, &actor, !unpublish)
                    .await?;
                println!("Module updated: {:?}", module);
            }
        },

        Commands::Lesson { action } => match action {
            LessonCommands::Add {
                module_id,
                title,
                file,
                description,
                duration,
                video_url,
                objectives,
            } => {
                let content = file.map(std::fs::read_to_string).transpose()?;
                let lesson = Lesson::create(
                    &mm,
                    &actor,
                    LessonCreate {
                        module_id,
                        title,
                        description,
                        content,
                        duration,
                        video_url,
                        resources: None,
                        learning_objectives: (!objectives.is_empty()).then_some(objectives),
                    },
                )
                .await?;
                println!("Lesson created: {:?}", lesson);
            }
        },
    }

    Ok(())
}
