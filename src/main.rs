use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use uuid::Uuid;

use credit_desk::config::AppConfig;
use credit_desk::error::AppError;
use credit_desk::telemetry;
use credit_desk::workflows::credit::applications::memory::{
    MemoryCompanyDirectory, MemoryRoleDirectory, MemoryStore,
};
use credit_desk::workflows::credit::applications::{
    application_router, Company, CompanyId, CreditApplicationService, Role, UserId,
};

#[derive(Parser, Debug)]
#[command(
    name = "credit-desk",
    about = "Small-business credit application service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let mut config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let Command::Serve(args) = cli.command.unwrap_or(Command::Serve(ServeArgs::default()));
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    serve(config).await
}

async fn serve(config: AppConfig) -> Result<(), AppError> {
    let store = Arc::new(MemoryStore::default());
    let companies = Arc::new(MemoryCompanyDirectory::default());
    let roles = Arc::new(MemoryRoleDirectory::default());

    seed_demo_identities(&companies, &roles)?;

    let service = Arc::new(CreditApplicationService::new(
        store,
        companies,
        roles,
        config.workflow.policy(),
    ));
    let app = application_router(service);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "credit-desk listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// The in-memory backend starts empty, so give demos one of each identity to
/// act as via the principal header.
fn seed_demo_identities(
    companies: &MemoryCompanyDirectory,
    roles: &MemoryRoleDirectory,
) -> Result<(), AppError> {
    let applicant = UserId(Uuid::new_v4());
    let operator = UserId(Uuid::new_v4());
    let admin = UserId(Uuid::new_v4());

    roles.assign(applicant, Role::Applicant)?;
    roles.assign(operator, Role::Operator)?;
    roles.assign(admin, Role::Admin)?;
    companies.register(Company {
        id: CompanyId(Uuid::new_v4()),
        user_id: applicant,
        legal_name: "Acme Tooling LLC".to_string(),
    })?;

    info!(applicant = %applicant.0, operator = %operator.0, admin = %admin.0, "seeded demo identities");
    Ok(())
}
