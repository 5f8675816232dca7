//! Rolodex - local-first CRM for the command line
//!
//! Thin front-end over rolodex-core: argument parsing, logging setup, data
//! directory resolution, and table rendering. Domain logic lives in the
//! core crate.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use directories::ProjectDirs;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rolodex_core::{
    coerce_value, stats, Client, ClientDraft, ClientStatus, Database, Error, Lead, LeadDraft,
    LeadStatus, NewUser, ProfileUpdate, Result, SessionManager, User, UserRole, UserUpdate,
};

#[derive(Parser)]
#[command(name = "rolodex", version, about = "Clients, leads, and accounts in a local database")]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account and log in
    Register(RegisterArgs),
    /// Log in with email and password
    Login { email: String, password: String },
    /// Clear the current session
    Logout,
    /// Show the current session
    Whoami,
    /// Update the current profile
    Profile(ProfileArgs),
    /// Manage clients
    #[command(subcommand)]
    Client(ClientCommand),
    /// Manage sales leads
    #[command(subcommand)]
    Lead(LeadCommand),
    /// Manage accounts (administrators only)
    #[command(subcommand)]
    User(UserCommand),
    /// Dashboard overview numbers
    Stats,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long, default_value = "")]
    company: String,
    #[arg(long, default_value = "user")]
    role: UserRole,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    company: Option<String>,
}

#[derive(Args)]
struct ClientArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long)]
    company: String,
    #[arg(long, default_value = "active")]
    status: ClientStatus,
    /// Contract value; invalid or negative input becomes 0
    #[arg(long, default_value = "0")]
    value: String,
}

impl ClientArgs {
    fn into_draft(self) -> ClientDraft {
        ClientDraft {
            name: self.name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            status: self.status,
            value: coerce_value(&self.value),
        }
    }
}

#[derive(Subcommand)]
enum ClientCommand {
    /// Add a client
    Add(ClientArgs),
    /// List all clients
    List,
    /// Search by name or company
    Search { query: String },
    /// Replace a client's fields
    Update {
        id: String,
        #[command(flatten)]
        fields: ClientArgs,
    },
    /// Delete a client
    Rm { id: String },
}

#[derive(Args)]
struct LeadArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long)]
    company: String,
    #[arg(long, default_value = "website")]
    source: String,
    #[arg(long, default_value = "new")]
    status: LeadStatus,
    /// Projected value; invalid or negative input becomes 0
    #[arg(long, default_value = "0")]
    value: String,
}

impl LeadArgs {
    fn into_draft(self) -> LeadDraft {
        LeadDraft {
            name: self.name,
            email: self.email,
            phone: self.phone,
            company: self.company,
            source: self.source,
            status: self.status,
            value: coerce_value(&self.value),
        }
    }
}

#[derive(Subcommand)]
enum LeadCommand {
    /// Add a lead
    Add(LeadArgs),
    /// List all leads
    List,
    /// Search by name or company
    Search { query: String },
    /// Replace a lead's fields
    Update {
        id: String,
        #[command(flatten)]
        fields: LeadArgs,
    },
    /// Delete a lead
    Rm { id: String },
}

#[derive(Subcommand)]
enum UserCommand {
    /// Add an account
    Add(RegisterArgs),
    /// List all accounts
    List,
    /// Update an account's name, company, or role
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        role: Option<UserRole>,
    },
    /// Delete an account
    Rm { id: String },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let db_path = match cli.db {
        Some(path) => path,
        None => default_db_path()?,
    };
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::open(&db_path)?;
    tracing::debug!(path = %db_path.display(), "Opened database");
    let mut session = SessionManager::attach(&db)?;

    match cli.command {
        Command::Register(args) => {
            let user = session.register(NewUser {
                name: args.name,
                email: args.email,
                password: args.password,
                company: args.company,
                role: args.role,
            })?;
            println!("Registered and logged in as {} <{}>", user.name, user.email);
        }
        Command::Login { email, password } => {
            let user = session.login(&email, &password)?;
            println!("Logged in as {} <{}>", user.name, user.email);
        }
        Command::Logout => {
            session.logout()?;
            println!("Logged out");
        }
        Command::Whoami => match session.current() {
            Some(user) => {
                println!("{} <{}>", user.name, user.email);
                println!("Company: {}", user.company);
                println!("Role:    {}", user.role.display_name());
            }
            None => println!("Not logged in"),
        },
        Command::Profile(args) => {
            if args.name.is_none() && args.email.is_none() && args.company.is_none() {
                println!("Nothing to update");
                return Ok(());
            }
            let user = session.update_profile(ProfileUpdate {
                name: args.name,
                email: args.email,
                company: args.company,
            })?;
            println!("Profile updated: {} <{}>, {}", user.name, user.email, user.company);
        }
        Command::Client(cmd) => run_client(&db, cmd)?,
        Command::Lead(cmd) => run_lead(&db, cmd)?,
        Command::User(cmd) => {
            require_admin(&session)?;
            run_user(&db, cmd)?;
        }
        Command::Stats => {
            let overview = stats::gather(&db)?;
            println!("Clients:         {}", overview.total_clients);
            println!("Leads:           {}", overview.total_leads);
            println!("Converted leads: {}", overview.converted_leads);
            println!("Conversion rate: {:.1}%", overview.conversion_rate);
            println!("Revenue:         ${:.2}", overview.revenue);
        }
    }

    Ok(())
}

fn run_client(db: &Database, cmd: ClientCommand) -> Result<()> {
    let clients = db.clients();
    match cmd {
        ClientCommand::Add(args) => {
            let client = clients.create(args.into_draft())?;
            println!("Added client {} ({})", client.name, client.id);
        }
        ClientCommand::List => print_clients(&clients.list()?),
        ClientCommand::Search { query } => print_clients(&clients.search(&query)?),
        ClientCommand::Update { id, fields } => match clients.update(&id, fields.into_draft())? {
            Some(client) => println!("Updated client {} ({})", client.name, client.id),
            None => println!("No client with id {id}; nothing changed"),
        },
        ClientCommand::Rm { id } => {
            clients.delete(&id)?;
            println!("Deleted client {id}");
        }
    }
    Ok(())
}

fn run_lead(db: &Database, cmd: LeadCommand) -> Result<()> {
    let leads = db.leads();
    match cmd {
        LeadCommand::Add(args) => {
            let lead = leads.create(args.into_draft())?;
            println!("Added lead {} ({})", lead.name, lead.id);
        }
        LeadCommand::List => print_leads(&leads.list()?),
        LeadCommand::Search { query } => print_leads(&leads.search(&query)?),
        LeadCommand::Update { id, fields } => match leads.update(&id, fields.into_draft())? {
            Some(lead) => println!("Updated lead {} ({})", lead.name, lead.id),
            None => println!("No lead with id {id}; nothing changed"),
        },
        LeadCommand::Rm { id } => {
            leads.delete(&id)?;
            println!("Deleted lead {id}");
        }
    }
    Ok(())
}

fn run_user(db: &Database, cmd: UserCommand) -> Result<()> {
    let users = db.users();
    match cmd {
        UserCommand::Add(args) => {
            let user = users.create(NewUser {
                name: args.name,
                email: args.email,
                password: args.password,
                company: args.company,
                role: args.role,
            })?;
            println!("Added {} {} <{}>", user.role.display_name(), user.name, user.email);
        }
        UserCommand::List => print_users(&users.list()?),
        UserCommand::Update {
            id,
            name,
            company,
            role,
        } => match users.update(&id, UserUpdate { name, company, role })? {
            Some(user) => println!("Updated account {} ({})", user.name, user.id),
            None => println!("No account with id {id}; nothing changed"),
        },
        UserCommand::Rm { id } => {
            users.delete(&id)?;
            println!("Deleted account {id}");
        }
    }
    Ok(())
}

/// The user directory is gated on the session role. Render-time check only;
/// nothing deeper enforces it.
fn require_admin(session: &SessionManager) -> Result<()> {
    match session.current() {
        Some(user) if user.role.is_admin() => Ok(()),
        Some(_) => Err(Error::Authentication(
            "This section requires administrator privileges".to_string(),
        )),
        None => Err(Error::Authentication("Not logged in".to_string())),
    }
}

fn default_db_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("dev", "rolodex", "rolodex").ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        ))
    })?;
    Ok(dirs.data_dir().join("rolodex.db"))
}

fn print_clients(clients: &[Client]) {
    if clients.is_empty() {
        println!("No clients");
        return;
    }
    println!(
        "{:<14} {:<22} {:<22} {:<10} {:>12}",
        "ID", "NAME", "COMPANY", "STATUS", "VALUE"
    );
    for client in clients {
        println!(
            "{:<14} {:<22} {:<22} {:<10} {:>12.2}",
            client.id,
            client.name,
            client.company,
            client.status.to_string(),
            client.value
        );
    }
}

fn print_leads(leads: &[Lead]) {
    if leads.is_empty() {
        println!("No leads");
        return;
    }
    println!(
        "{:<14} {:<22} {:<22} {:<12} {:<18} {:>12}",
        "ID", "NAME", "COMPANY", "SOURCE", "STAGE", "VALUE"
    );
    for lead in leads {
        println!(
            "{:<14} {:<22} {:<22} {:<12} {:<18} {:>12.2}",
            lead.id,
            lead.name,
            lead.company,
            lead.source,
            lead.status.display_name(),
            lead.value
        );
    }
}

fn print_users(users: &[User]) {
    if users.is_empty() {
        println!("No accounts");
        return;
    }
    println!(
        "{:<14} {:<22} {:<28} {:<22} {:<14}",
        "ID", "NAME", "EMAIL", "COMPANY", "ROLE"
    );
    for user in users {
        println!(
            "{:<14} {:<22} {:<28} {:<22} {:<14}",
            user.id,
            user.name,
            user.email,
            user.company,
            user.role.display_name()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(role: UserRole) -> NewUser {
        NewUser {
            name: "Jo Doe".to_string(),
            email: "jo@acme.com".to_string(),
            password: "secret123".to_string(),
            company: "Acme Co".to_string(),
            role,
        }
    }

    #[test]
    fn test_require_admin_rejects_anonymous() {
        let db = Database::open_in_memory().unwrap();
        let session = SessionManager::attach(&db).unwrap();

        let err = require_admin(&session).unwrap_err();
        assert!(err.to_string().contains("Not logged in"));
    }

    #[test]
    fn test_require_admin_rejects_team_member() {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionManager::attach(&db).unwrap();
        session.register(new_user(UserRole::User)).unwrap();

        let err = require_admin(&session).unwrap_err();
        assert!(err.to_string().contains("administrator privileges"));
    }

    #[test]
    fn test_require_admin_allows_administrator() {
        let db = Database::open_in_memory().unwrap();
        let mut session = SessionManager::attach(&db).unwrap();
        session.register(new_user(UserRole::Admin)).unwrap();

        assert!(require_admin(&session).is_ok());
    }
}
