use std::process::ExitCode;
use std::sync::Arc;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use ig_app::account::{Registration, Verification};
use ig_app::config::GenConfig;
use ig_app::generator::Generator;
use ig_app::generator::backend::GenBackend;
use ig_app::job::JobStatus;
use ig_app::state::FormState;
use ig_core::request::DEFAULT_DIMENSION;
use ig_core::{Session, SharedSession};

const EXIT_FAILED: u8 = 1;
const EXIT_LOGIN: u8 = 2;

/// Text-to-image client
#[derive(Debug, Parser)]
#[clap(author, version)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Generate images from a prompt and print their urls.
    Generate {
        prompt: String,
        /// Width in px, 256-1024 in steps of 64.
        #[clap(long, default_value_t = DEFAULT_DIMENSION)]
        width: u32,
        /// Height in px, 256-1024 in steps of 64.
        #[clap(long, default_value_t = DEFAULT_DIMENSION)]
        height: u32,
    },
    /// Check the current session against the backend.
    Whoami,
    /// Finish account setup by choosing a username.
    Register { username: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let conf = GenConfig::load()?;
    let sessions = SharedSession::new(conf.access_token.clone().map(Session::new));
    let backend = GenBackend::from_config(&conf)?;

    match cli.command {
        Command::Generate { prompt, width, height } => {
            let form = FormState {
                prompt,
                width,
                height,
                ..FormState::default()
            };
            generate(form, backend, sessions, &conf).await
        }
        Command::Whoami => Ok(match backend.verify_user(&sessions).await {
            Verification::Verified(user) => {
                println!("Welcome back, {}!", user.username);
                println!("Tier: {}", user.priority);
                println!("User id: {}", user.user_id);
                ExitCode::SUCCESS
            }
            Verification::Redirect(path) => {
                eprintln!("Account setup incomplete, continue at {}", path);
                ExitCode::from(EXIT_FAILED)
            }
            Verification::LoginRequired => {
                eprintln!("Not signed in. Set IMAGEGEN_ACCESS_TOKEN and try again.");
                ExitCode::from(EXIT_LOGIN)
            }
        }),
        Command::Register { username } => {
            Ok(match backend.register_username(&sessions, &username).await? {
                Registration::Registered => {
                    println!("Registered as {}", username.trim());
                    ExitCode::SUCCESS
                }
                Registration::Redirect(path) => {
                    eprintln!("Continue at {}", path);
                    ExitCode::from(EXIT_FAILED)
                }
                Registration::Rejected(message) => {
                    eprintln!("{}", message);
                    ExitCode::from(EXIT_FAILED)
                }
                Registration::LoginRequired => {
                    eprintln!("Not signed in. Set IMAGEGEN_ACCESS_TOKEN and try again.");
                    ExitCode::from(EXIT_LOGIN)
                }
            })
        }
    }
}

async fn generate(
    mut form: FormState,
    backend: GenBackend,
    sessions: SharedSession,
    conf: &GenConfig,
) -> anyhow::Result<ExitCode> {
    let request = form.request()?;
    let (mut generator, mut events) = Generator::new(Arc::new(backend), Arc::new(sessions), conf.schedule);

    // Failures are reported through the event stream as well
    let _ = generator.submit(request).await;

    let settled = form
        .drive(&mut generator, &mut events, tokio::signal::ctrl_c(), |form| {
            eprintln!("{} {}", form.status.icon(), form.status.label());
        })
        .await;
    if !settled {
        eprintln!("Cancelled");
        return Ok(ExitCode::from(EXIT_FAILED));
    }

    if let Some(message) = &form.message {
        eprintln!("{}", message);
    }
    for url in &form.images {
        println!("{}", url);
    }

    Ok(match form.status {
        JobStatus::Completed => ExitCode::SUCCESS,
        JobStatus::AuthExpired => ExitCode::from(EXIT_LOGIN),
        _ => ExitCode::from(EXIT_FAILED),
    })
}
