use clap::Subcommand;
use todo5_core::integrations::{GoogleAuth, TodoistClient};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Google Calendar: login / logout / status
    Google {
        #[command(subcommand)]
        action: AuthOp,
    },
    /// Todoist: login / logout / status
    Todoist {
        #[command(subcommand)]
        action: AuthOp,
    },
}

#[derive(Subcommand)]
pub enum AuthOp {
    /// Authenticate with the service
    Login {
        /// API token (Todoist)
        #[arg(long)]
        token: Option<String>,
        /// OAuth client ID (Google)
        #[arg(long)]
        client_id: Option<String>,
        /// OAuth client secret (Google)
        #[arg(long)]
        client_secret: Option<String>,
    },
    /// Remove credentials
    Logout,
    /// Check authentication status
    Status,
}

pub async fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::Google { action: op } => handle_google(op).await,
        AuthAction::Todoist { action: op } => handle_todoist(op),
    }
}

async fn handle_google(op: AuthOp) -> Result<(), Box<dyn std::error::Error>> {
    match op {
        AuthOp::Login {
            client_id,
            client_secret,
            ..
        } => {
            if let (Some(cid), Some(csec)) = (&client_id, &client_secret) {
                GoogleAuth::set_credentials(cid, csec)?;
            } else if client_id.is_some() || client_secret.is_some() {
                return Err("--client-id and --client-secret must be given together".into());
            }
            GoogleAuth::new().authenticate().await?;
            println!("Google authenticated");
        }
        AuthOp::Logout => {
            GoogleAuth::new().disconnect()?;
            println!("Google disconnected");
        }
        AuthOp::Status => println!("{}", status_line(GoogleAuth::new().is_authenticated())),
    }
    Ok(())
}

fn handle_todoist(op: AuthOp) -> Result<(), Box<dyn std::error::Error>> {
    match op {
        AuthOp::Login { token, .. } => {
            let tok = token.ok_or("--token required for Todoist")?;
            TodoistClient::set_api_key(&tok)?;
            println!("Todoist authenticated");
        }
        AuthOp::Logout => {
            TodoistClient::clear_api_key()?;
            println!("Todoist disconnected");
        }
        AuthOp::Status => println!("{}", status_line(TodoistClient::stored_api_key().is_some())),
    }
    Ok(())
}

fn status_line(authenticated: bool) -> &'static str {
    if authenticated {
        "authenticated"
    } else {
        "not authenticated"
    }
}
