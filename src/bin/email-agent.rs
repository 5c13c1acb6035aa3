//! Email Agent CLI
//!
//! Run with: cargo run --bin email-agent -- --prompt "email mom about dinner"

use anyhow::Result;
use clap::Parser;
use email_agent::{
    agent::{AgentError, EmailAssistant},
    cli::{
        configure_user_settings, interruptible, mode_notices, render_panel, run_request,
        DisplayOptions, ReplInput, BLUE, BOLD, CYAN, RED, RESET, YELLOW,
    },
    config::ConfigStore,
    mailer::Mailer,
    provider::ProviderConfig,
    telemetry::{default_data_dir, Telemetry},
};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::error::Error as _;
use std::path::Path;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "email-agent")]
#[command(about = "Email Agent CLI - send emails from natural language", long_about = None)]
struct Cli {
    /// Email request prompt
    #[arg(short, long)]
    prompt: Option<String>,

    /// Enable privacy mode (censor email addresses)
    #[arg(long)]
    privacy: bool,

    /// Configure user settings
    #[arg(long)]
    configure: bool,

    /// Show detailed agent steps
    #[arg(short, long)]
    verbose: bool,

    /// LLM model to use
    #[arg(short, long, default_value = "o3-mini")]
    model: String,
}

impl Cli {
    fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            privacy: self.privacy,
            verbose: self.verbose,
        }
    }
}

/// Build a fresh assistant and run one request through it
async fn run_agent(
    store: &ConfigStore,
    model: &str,
    prompt: &str,
    options: &DisplayOptions,
) -> Result<(), AgentError> {
    let assistant = EmailAssistant::create(
        ProviderConfig::openai().with_model(model),
        store.clone(),
        Mailer::default(),
    )?;
    run_request(&assistant, prompt, options).await
}

fn report_failure(err: &AgentError, options: &DisplayOptions) {
    tracing::error!(error = %err, "Agent run failed");

    if err.is_environment() {
        eprintln!("{BOLD}{RED}Environment Error:{RESET} {}", err);
        eprintln!("Please check your .env file and ensure all required variables are set.");
        return;
    }

    eprintln!("{BOLD}{RED}Error:{RESET} {}", err);
    if options.verbose {
        let mut source = err.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
    }
}

/// Settings editor; Ctrl-C or Ctrl-D inside it only abandons the edit
fn edit_settings(
    store: &ConfigStore,
    editor: &mut DefaultEditor,
    options: &DisplayOptions,
) -> Result<()> {
    let mut stdout = std::io::stdout();
    match configure_user_settings(store, editor, &mut stdout, options) {
        Ok(()) => Ok(()),
        Err(e)
            if matches!(
                e.downcast_ref::<ReadlineError>(),
                Some(ReadlineError::Interrupted | ReadlineError::Eof)
            ) =>
        {
            println!("\n{YELLOW}Settings editor closed{RESET}");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

async fn repl(cli: &Cli, store: &ConfigStore, data_dir: &Path) -> Result<ExitCode> {
    let options = cli.display_options();

    println!(
        "{}",
        render_panel("Email Agent", "Welcome to the Email Agent CLI!", BLUE)
    );

    let mut rl = DefaultEditor::new()?;
    let history_path = data_dir.join("history.txt");
    let _ = rl.load_history(&history_path);

    let prompt = format!(
        "{BOLD}{CYAN}Enter your email request (or 'exit' to quit, 'config' to configure):{RESET} "
    );

    let mut code = ExitCode::SUCCESS;
    loop {
        println!();
        match rl.readline(&prompt) {
            Ok(line) => {
                let input = ReplInput::parse(&line);
                if input != ReplInput::Empty {
                    rl.add_history_entry(line.trim())?;
                }

                match input {
                    ReplInput::Exit => {
                        println!("{YELLOW}Goodbye!{RESET}");
                        break;
                    }
                    ReplInput::Configure => edit_settings(store, &mut rl, &options)?,
                    ReplInput::Empty => continue,
                    ReplInput::Request(request) => {
                        let run = run_agent(store, &cli.model, &request, &options);
                        match interruptible(run, tokio::signal::ctrl_c()).await {
                            Some(Ok(())) => {}
                            Some(Err(e)) => {
                                report_failure(&e, &options);
                                code = ExitCode::from(1);
                                break;
                            }
                            None => {
                                tracing::info!("Request interrupted");
                                println!("\n{YELLOW}Exiting...{RESET}");
                                break;
                            }
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\n{YELLOW}Exiting...{RESET}");
                break;
            }
            Err(e) => {
                let _ = rl.save_history(&history_path);
                return Err(e.into());
            }
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(code)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let options = cli.display_options();

    // GMAIL_* credentials are read at send time, so load .env up front
    let _ = dotenvy::dotenv();

    let data_dir = default_data_dir();
    let _telemetry = match Telemetry::init(data_dir.clone(), cli.verbose) {
        Ok(t) => Some(t),
        Err(e) => {
            eprintln!(
                "{YELLOW}Warning: file logging disabled ({}): {}{RESET}",
                data_dir.display(),
                e
            );
            None
        }
    };

    for notice in mode_notices(&options) {
        println!("{}", notice);
    }

    let store = ConfigStore::default_location()?;
    tracing::debug!(config = %store.path().display(), model = %cli.model, "Starting email agent");

    if cli.configure {
        let mut editor = DefaultEditor::new()?;
        edit_settings(&store, &mut editor, &options)?;
        return Ok(ExitCode::SUCCESS);
    }

    if let Some(prompt) = cli.prompt.as_deref() {
        return Ok(match run_agent(&store, &cli.model, prompt, &options).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                report_failure(&e, &options);
                ExitCode::from(1)
            }
        });
    }

    repl(&cli, &store, &data_dir).await
}
