use clap::{Parser, Subcommand};
use dialoguer::{Input, Password};
use dotenvy::dotenv;
use lectern::cli::{create_admin, sync_memberships};
use lectern::modules::role_groups::RoleGroupService;
use lectern_config::{LoggingConfig, database_url};
use lectern_db::{PgPool, init_db_pool, run_migrations};

#[derive(Parser)]
#[command(name = "lectern-cli")]
#[command(about = "Lectern CLI - Administrative tools for Lectern", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator account
    CreateAdmin {
        /// Email address
        #[arg(short = 'e', long)]
        email: Option<String>,

        /// Password (will be prompted securely if not provided)
        #[arg(short = 'p', long)]
        password: Option<String>,
    },
    /// Create any missing role groups
    EnsureRoleGroups,
    /// Mirror every user's roles into role group memberships
    SyncMemberships,
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("\n❌ {message}");
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let _guard = lectern_observability::init_logging(&LoggingConfig::from_env());

    let cli = Cli::parse();

    let url = database_url().unwrap_or_else(|e| fail(e));
    let pool = init_db_pool(&url)
        .await
        .unwrap_or_else(|e| fail(format!("Failed to connect to database: {e}")));
    if let Err(e) = run_migrations(&pool).await {
        fail(format!("Failed to run migrations: {e}"));
    }

    match cli.command {
        Commands::CreateAdmin { email, password } => {
            handle_create_admin(&pool, email, password).await
        }
        Commands::EnsureRoleGroups => match RoleGroupService::ensure_role_groups(&pool).await {
            Ok(()) => println!("✅ Role groups are in place"),
            Err(e) => fail(format!("Error ensuring role groups: {:#}", e.error)),
        },
        Commands::SyncMemberships => match sync_memberships(&pool).await {
            Ok(count) => println!("✅ Synced role group memberships for {count} users"),
            Err(e) => fail(format!("Error syncing memberships: {:#}", e.error)),
        },
    }
}

async fn handle_create_admin(pool: &PgPool, email: Option<String>, password: Option<String>) {
    let email = match email {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email address")
            .interact_text()
            .unwrap_or_else(|e| fail(format!("Failed to read email: {e}"))),
    };

    let password = match password {
        Some(password) => password,
        None => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords don't match")
            .interact()
            .unwrap_or_else(|e| fail(format!("Failed to read password: {e}"))),
    };

    match create_admin(pool, &email, &password).await {
        Ok(user_id) => {
            println!("\n✅ Admin created successfully!");
            println!("   Email: {}", email.trim().to_lowercase());
            println!("   ID: {user_id}");
        }
        Err(e) => fail(format!("Error creating admin: {:#}", e.error)),
    }
}
