use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use schematic_agent::agent::{AgentOutcome, AgentTool, AGENT_BATCH_MESSAGE};
use schematic_agent::chat::{ChatPanel, ChatView};
use schematic_agent::describe::{describe_schematic, describe_undo_state};
use schematic_agent::error::AppError;
use schematic_agent::interpreter::interpret;
use schematic_agent::model::Schematic;
use schematic_agent::ollama::{LanguageModel, OllamaClient};
use schematic_agent::paths;
use schematic_agent::project::{load_schematic, save_schematic};
use schematic_agent::session::DraftingSession;
use schematic_agent::settings::{self, AgentSettings};
use schematic_agent::state::EditorState;

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "schematic-agent",
    about = "Draft schematic primitives with a local Ollama model",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Ollama server URL (overrides settings and OLLAMA_HOST)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model name (overrides settings and OLLAMA_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty schematic with one sheet
    New {
        file: PathBuf,
        #[arg(long)]
        name: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Human-readable description of a schematic
    Describe { file: PathBuf },
    /// Parse reply text (from a file or stdin) and print the commands found
    Parse { file: Option<PathBuf> },
    /// Apply reply text to a schematic as one undo step and save it
    Apply {
        schematic: PathBuf,
        /// Reply text file; stdin when omitted
        #[arg(long)]
        reply: Option<PathBuf>,
        #[arg(long, default_value = AGENT_BATCH_MESSAGE)]
        message: String,
    },
    /// Ask the model for changes, apply them and save
    Ask {
        schematic: PathBuf,
        #[arg(required = true, trailing_var_arg = true)]
        request: Vec<String>,
    },
    /// Interactive chat session on a schematic
    Chat { schematic: PathBuf },
    /// Check whether the Ollama server answers
    Status,
}

// ── Output ───────────────────────────────────────────────────────

fn print_output<T: Serialize>(value: &T, text: &str, raw: bool) {
    if raw {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => fail(&AppError::from(e)),
        }
    } else {
        println!("{text}");
    }
}

fn fail(e: &AppError) -> ! {
    eprintln!("Error: {e}");
    process::exit(1);
}

// ── Helpers ──────────────────────────────────────────────────────

fn resolve_settings(cli: &Cli) -> AgentSettings {
    settings::load_settings(&paths::config_dir())
        .unwrap_or_default()
        .with_env_overrides()
        .with_overrides(cli.base_url.clone(), cli.model.clone())
}

fn read_input(file: Option<&Path>) -> Result<String, AppError> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn open_state(path: &Path, settings: AgentSettings) -> Result<Arc<EditorState>, AppError> {
    let schematic = load_schematic(path)?;
    let state = EditorState::new(settings);
    state.open(schematic, Some(path.to_path_buf()));
    Ok(Arc::new(state))
}

fn save_state(state: &EditorState) -> Result<(), AppError> {
    let Some(path) = state.document_path.lock().clone() else {
        return Err(AppError::Validation {
            message: "document has no file path".into(),
        });
    };
    state.with_schematic(|doc| save_schematic(doc, &path))?
}

#[derive(Serialize)]
struct ApplyReport {
    commands: usize,
    staged: usize,
    skipped: usize,
    items: usize,
}

// ── Commands ─────────────────────────────────────────────────────

fn cmd_new(file: &Path, name: Option<String>, force: bool, raw: bool) -> Result<(), AppError> {
    if file.exists() && !force {
        return Err(AppError::Validation {
            message: format!("{} already exists (use --force)", file.display()),
        });
    }
    let name = name.unwrap_or_else(|| {
        file.file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.trim_end_matches(&format!(".{}", paths::SCHEMATIC_EXTENSION)))
            .unwrap_or("untitled")
            .to_string()
    });
    let schematic = Schematic::new(name);
    save_schematic(&schematic, file)?;
    print_output(&schematic, &format!("Created {}", file.display()), raw);
    Ok(())
}

fn cmd_describe(file: &Path, raw: bool) -> Result<(), AppError> {
    let schematic = load_schematic(file)?;
    print_output(&schematic, &describe_schematic(&schematic), raw);
    Ok(())
}

fn cmd_parse(file: Option<&Path>, raw: bool) -> Result<(), AppError> {
    let text = read_input(file)?;
    let interpretation = interpret(&text);
    let mut lines: Vec<String> = interpretation
        .commands
        .iter()
        .map(ToString::to_string)
        .collect();
    for skipped in &interpretation.skipped {
        lines.push(format!(
            "# line {} skipped: {:?}",
            skipped.line_number, skipped.reason
        ));
    }
    print_output(&interpretation, &lines.join("\n"), raw);
    Ok(())
}

fn cmd_apply(
    schematic: &Path,
    reply: Option<&Path>,
    message: &str,
    settings: AgentSettings,
    raw: bool,
) -> Result<(), AppError> {
    let text = read_input(reply)?;
    let state = open_state(schematic, settings)?;
    let interpretation = interpret(&text);

    let mut session = DraftingSession::new(Arc::clone(&state));
    let (staged, _) = session.apply_batch(&interpretation.commands, message);
    save_state(&state)?;

    let report = ApplyReport {
        commands: interpretation.commands.len(),
        staged,
        skipped: interpretation.skipped.len(),
        items: state.with_schematic(Schematic::item_count)?,
    };
    print_output(
        &report,
        &format!(
            "Applied {} of {} command(s) as \"{message}\" ({} line(s) skipped, {} item(s) total)",
            report.staged, report.commands, report.skipped, report.items
        ),
        raw,
    );
    Ok(())
}

fn cmd_ask(
    schematic: &Path,
    request: &str,
    settings: AgentSettings,
    raw: bool,
) -> Result<(), AppError> {
    let state = open_state(schematic, settings)?;
    let mut tool = AgentTool::new(Arc::clone(&state));

    let outcome = tool.process_request(request);
    if let Some(message) = outcome.user_message() {
        eprintln!("{message}");
    }

    match outcome {
        AgentOutcome::Applied {
            commands,
            staged,
            commit,
        } => {
            save_state(&state)?;
            print_output(
                &commit,
                &format!(
                    "Applied {staged} of {commands} command(s); {}",
                    describe_undo_state(&state.undo_state())
                ),
                raw,
            );
            Ok(())
        }
        AgentOutcome::Failed(e) => Err(e),
        AgentOutcome::NothingUnderstood | AgentOutcome::Ignored => Ok(()),
    }
}

fn cmd_status(settings: &AgentSettings, raw: bool) -> Result<(), AppError> {
    #[derive(Serialize)]
    struct Status<'a> {
        base_url: &'a str,
        model: &'a str,
        available: bool,
    }

    let client = OllamaClient::from_settings(settings)?;
    let status = Status {
        base_url: client.base_url(),
        model: client.model(),
        available: client.is_available(),
    };
    let text = format!(
        "Ollama at {}: {} (model {})",
        status.base_url,
        if status.available {
            "available"
        } else {
            "not available"
        },
        status.model
    );
    print_output(&status, &text, raw);
    Ok(())
}

// ── Chat ─────────────────────────────────────────────────────────

/// Prints agent messages to stdout. The user's own lines are already on screen.
struct TerminalView;

impl ChatView for TerminalView {
    fn add_user_message(&mut self, _text: &str) {}

    fn add_agent_message(&mut self, text: &str) {
        println!("agent> {}", text.replace('\n', "\n       "));
    }

    fn clear(&mut self) {
        println!("────────────────────────────────────────");
    }
}

fn cmd_chat(schematic: &Path, settings: AgentSettings) -> Result<(), AppError> {
    let state = open_state(schematic, settings)?;
    let mut panel = ChatPanel::new(TerminalView, AgentTool::new(Arc::clone(&state)));

    // The model call runs on a blocking worker; replies are applied here.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    println!("Commands: /describe /undo /redo /clear /quit");
    let stdin = io::stdin();
    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => panel.clear(),
            "/describe" => {
                println!("{}", state.with_schematic(describe_schematic)?);
            }
            "/undo" | "/redo" => {
                let result = if line.trim() == "/undo" {
                    state.undo()
                } else {
                    state.redo()
                };
                match result {
                    Ok(description) => {
                        println!("{}: {description}", line.trim().trim_start_matches('/'));
                        save_state(&state)?;
                    }
                    Err(e) => eprintln!("{e}"),
                }
            }
            text => {
                let Some(pending) = panel.submit(text) else {
                    continue;
                };
                let result = runtime.block_on(pending.run_in_background());
                panel.complete(result);
                save_state(&state)?;
            }
        }
    }
    Ok(())
}

// ── Main ─────────────────────────────────────────────────────────

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = resolve_settings(&cli);
    let raw = cli.json;

    let result = match &cli.command {
        Commands::New { file, name, force } => cmd_new(file, name.clone(), *force, raw),
        Commands::Describe { file } => cmd_describe(file, raw),
        Commands::Parse { file } => cmd_parse(file.as_deref(), raw),
        Commands::Apply {
            schematic,
            reply,
            message,
        } => cmd_apply(schematic, reply.as_deref(), message, settings, raw),
        Commands::Ask { schematic, request } => {
            cmd_ask(schematic, &request.join(" "), settings, raw)
        }
        Commands::Chat { schematic } => cmd_chat(schematic, settings),
        Commands::Status => cmd_status(&settings, raw),
    };

    if let Err(e) = result {
        fail(&e);
    }
}
