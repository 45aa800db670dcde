use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use flipgate_types::{
    AllowlistSummary, CheckEmailRequest, CheckEmailResponse, ErrorBody, FlipbookUrlResponse,
    GoogleAuthRequest, GoogleAuthResponse, LoginRequest, LoginResponse, VerifyResponse,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

#[derive(Parser)]
#[command(name = "flipgate-cli")]
#[command(about = "CLI for signing in to a flipgate server and fetching the flipbook URL")]
#[command(
    long_about = "A command-line interface for the flipgate authentication API.\n\n\
    Log in with a local account or a Google ID token, check addresses against\n\
    the allowlist, and use the returned session token to fetch the gated URL."
)]
struct Cli {
    /// Flipgate server URL to connect to.
    ///
    /// The CLI will make HTTP requests to this server's /api endpoints.
    #[arg(
        short,
        long,
        default_value = "http://localhost:3000",
        env = "FLIPGATE_API_URL"
    )]
    base_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with a local email and password
    ///
    /// Prints the session token on success so it can be exported as
    /// FLIPGATE_TOKEN for the protected commands.
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "FLIPGATE_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Exchange a Google ID token for a session token
    GoogleAuth {
        /// The ID token returned by Google Sign-In.
        id_token: String,
    },

    /// Check whether an email address is on the allowlist
    CheckEmail { email: String },

    /// Show how many addresses are allowlisted
    Allowlist,

    /// Fetch the gated flipbook URL
    FlipbookUrl {
        /// Session token from `login` or `google-auth`.
        #[arg(short, long, env = "FLIPGATE_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Show the identity carried by a session token
    Verify {
        #[arg(short, long, env = "FLIPGATE_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Hash a password for the LOCAL_USERS configuration
    ///
    /// Runs locally; nothing is sent to the server.
    HashPassword { password: String },
}

/// Send a request and decode the JSON body, turning error responses into
/// their server-side message.
async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> anyhow::Result<T> {
    let response = request.send().await.context("Request failed")?;
    let status = response.status();

    if !status.is_success() {
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => match body.email {
                Some(email) => format!("{} ({})", body.message, email),
                None => body.message,
            },
            Err(_) => "no error message".to_string(),
        };
        bail!("{}: {}", status, message);
    }

    response.json().await.context("Invalid response body")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let api = format!("{}/api", cli.base_url.trim_end_matches('/'));

    match cli.command {
        Commands::Login { email, password } => {
            let req = LoginRequest {
                email: Some(email),
                password: Some(password),
            };
            let resp: LoginResponse =
                send_json(client.post(format!("{}/login", api)).json(&req)).await?;
            println!("Logged in as {} <{}> (id {})", resp.user.name, resp.user.email, resp.user.id);
            println!("{}", resp.token);
        }
        Commands::GoogleAuth { id_token } => {
            let req = GoogleAuthRequest {
                id_token: Some(id_token),
            };
            let resp: GoogleAuthResponse =
                send_json(client.post(format!("{}/google-auth", api)).json(&req)).await?;
            println!(
                "Signed in as {} <{}>{}",
                resp.user.name.as_deref().unwrap_or("(no name)"),
                resp.user.email,
                if resp.user.verified { "" } else { " [unverified email]" }
            );
            println!("{}", resp.token);
        }
        Commands::CheckEmail { email } => {
            let req = CheckEmailRequest { email: Some(email) };
            let resp: CheckEmailResponse =
                send_json(client.post(format!("{}/check-email", api)).json(&req)).await?;
            if resp.allowed {
                println!(
                    "✓ {} is allowed ({})",
                    resp.email,
                    resp.name.as_deref().unwrap_or("")
                );
            } else {
                println!("✗ {} is not allowed", resp.email);
            }
        }
        Commands::Allowlist => {
            let resp: AllowlistSummary =
                send_json(client.get(format!("{}/check-email", api))).await?;
            println!("{} allowlisted address(es)", resp.total_allowed);
        }
        Commands::FlipbookUrl { token } => {
            let resp: FlipbookUrlResponse =
                send_json(client.get(format!("{}/flipbook-url", api)).bearer_auth(token)).await?;
            println!("{}", resp.url);
        }
        Commands::Verify { token } => {
            let resp: VerifyResponse =
                send_json(client.get(format!("{}/verify", api)).bearer_auth(token)).await?;
            println!(
                "{} <{}> via {}",
                resp.user.name.as_deref().unwrap_or("(no name)"),
                resp.user.email,
                resp.user.login_method.as_str()
            );
        }
        Commands::HashPassword { password } => {
            let hash = flipgate_backend::auth::hash_password(&password)
                .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
            println!("{}", hash);
        }
    }

    Ok(())
}
