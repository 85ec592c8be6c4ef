mod presenter;
mod session;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use discovery_core::{Catalog, Edit, ProgressResult, QuestionId, QuestionKind};
use discovery_store::{
    AnswerStore, DATABASE_FILE, DiscoveryConfig, DiscoverySession, SqliteStorage, Storage,
    SubmitOutcome,
};

use crate::presenter::{ConfirmMode, TerminalPresenter};

#[derive(Parser)]
#[command(name = "discovery", about = "Aro booking system discovery questionnaire")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check options for a choice question, replacing any previous choice
    Answer {
        /// Question number
        id: QuestionId,

        /// Option value(s)
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Set the answer to a free-text question
    Text {
        /// Question number
        id: QuestionId,

        /// Answer text
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },

    /// Clear the answer to a question
    Clear {
        /// Question number
        id: QuestionId,
    },

    /// List every question with its current answer
    Show,

    /// Show overall and per-category progress
    Progress,

    /// Save a draft
    Save,

    /// Build the answer summary and the WhatsApp link
    Submit {
        /// Send without asking
        #[arg(long)]
        yes: bool,
    },

    /// Interactive session reading commands from stdin
    Session {
        /// Send without asking when `submit` is entered
        #[arg(long)]
        yes: bool,
    },

    /// Export saved answers to a JSON file
    Export {
        /// Output file path
        path: PathBuf,
    },

    /// Replace saved answers with a JSON export
    Import {
        /// Input file path
        path: PathBuf,
    },
}

/// Data directory and the config found there.
struct Workspace {
    base_dir: PathBuf,
    config: DiscoveryConfig,
}

impl Workspace {
    fn open() -> Result<Self> {
        let base_dir = std::env::var("DISCOVERY_DATA_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(discovery_store::default_base_dir);
        std::fs::create_dir_all(&base_dir)
            .with_context(|| format!("failed to create {}", base_dir.display()))?;
        let config = DiscoveryConfig::load(&base_dir).context("failed to load config")?;
        Ok(Self { base_dir, config })
    }

    fn storage(&self) -> Result<SqliteStorage> {
        let path = self.base_dir.join(DATABASE_FILE);
        SqliteStorage::open(&path, &self.config.origin)
            .with_context(|| format!("failed to open {}", path.display()))
    }

    fn session(&self, presenter: &mut TerminalPresenter) -> Result<DiscoverySession<SqliteStorage>> {
        let catalog = Arc::new(Catalog::aro_discovery());
        DiscoverySession::open(self.storage()?, catalog, &self.config, presenter)
            .context("failed to load answers")
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let workspace = Workspace::open()?;

    match &cli.command {
        Commands::Answer { id, values } => cmd_edit(
            &workspace,
            Edit::Select {
                question: *id,
                values: values.clone(),
            },
        ),
        Commands::Text { id, words } => cmd_edit(
            &workspace,
            Edit::Text {
                question: *id,
                text: words.join(" "),
            },
        ),
        Commands::Clear { id } => cmd_edit(&workspace, Edit::Clear { question: *id }),
        Commands::Show => cmd_show(&workspace),
        Commands::Progress => cmd_progress(&workspace),
        Commands::Save => cmd_save(&workspace),
        Commands::Submit { yes } => cmd_submit(&workspace, *yes),
        Commands::Session { yes } => cmd_session(&workspace, *yes).await,
        Commands::Export { path } => cmd_export(&workspace, path),
        Commands::Import { path } => cmd_import(&workspace, path),
    }
}

pub(crate) fn progress_line(progress: &ProgressResult) -> String {
    format!(
        "{}/{} answered ({}%)",
        progress.answered_count, progress.total_questions, progress.percentage
    )
}

pub(crate) fn print_progress<S: Storage>(session: &DiscoverySession<S>) {
    let progress = session.progress();
    println!("{}", progress_line(&progress));
    for category in &progress.per_category {
        let mark = if category.is_complete() { " ✓" } else { "" };
        println!(
            "  {:<26} {}/{}{mark}",
            category.name, category.answered, category.total
        );
    }
}

fn cmd_edit(workspace: &Workspace, edit: Edit) -> Result<()> {
    let mut presenter = TerminalPresenter::new(ConfirmMode::Decline);
    let mut session = workspace.session(&mut presenter)?;
    let question = edit.question();

    let progress = session
        .apply(edit)
        .with_context(|| format!("failed to update question {question}"))?;
    session.save().context("failed to save answers")?;

    println!("q{question} saved. {}", progress_line(&progress));
    Ok(())
}

fn cmd_show(workspace: &Workspace) -> Result<()> {
    let mut presenter = TerminalPresenter::new(ConfirmMode::Decline);
    let session = workspace.session(&mut presenter)?;
    let form = session.form();
    let catalog = form.catalog();

    for category in catalog.categories() {
        println!("{}", category.name);
        for id in &category.questions {
            let Some(question) = catalog.question(*id) else {
                continue;
            };
            println!("  q{:<3} {}", question.id, question.prompt);

            let checked = form.checked(question.id).filter(|c| !c.is_empty());
            let text = form.text(question.id).filter(|t| !t.trim().is_empty());
            if let Some(checked) = checked {
                let values: Vec<&str> = checked.iter().map(String::as_str).collect();
                println!("        = {}", values.join(", "));
            } else if let Some(text) = text {
                println!("        = {}", text.trim());
            } else if question.kind == QuestionKind::FreeText {
                println!("        (free text)");
            } else {
                println!("        [{}] {}", question.kind, question.options.join(" | "));
            }
        }
    }
    Ok(())
}

fn cmd_progress(workspace: &Workspace) -> Result<()> {
    let mut presenter = TerminalPresenter::new(ConfirmMode::Decline);
    let session = workspace.session(&mut presenter)?;
    print_progress(&session);
    Ok(())
}

fn cmd_save(workspace: &Workspace) -> Result<()> {
    let mut presenter = TerminalPresenter::new(ConfirmMode::Decline);
    let mut session = workspace.session(&mut presenter)?;
    session
        .save_draft(&mut presenter)
        .context("failed to save draft")?;
    Ok(())
}

fn cmd_submit(workspace: &Workspace, yes: bool) -> Result<()> {
    let mut presenter = TerminalPresenter::with_yes(yes, ConfirmMode::Prompt);
    let mut session = workspace.session(&mut presenter)?;

    match session.submit(&mut presenter).context("failed to submit")? {
        SubmitOutcome::Accepted { link, .. } => println!("{link}"),
        SubmitOutcome::Cancelled => eprintln!("cancelled"),
        SubmitOutcome::Rejected(rejection) => {
            tracing::debug!(
                "submission rejected: {}/{} answered",
                rejection.answered,
                rejection.required
            );
        }
    }
    Ok(())
}

async fn cmd_session(workspace: &Workspace, yes: bool) -> Result<()> {
    let mut presenter = TerminalPresenter::with_yes(yes, ConfirmMode::Decline);
    let session = workspace.session(&mut presenter)?;
    session::run(session, &workspace.config, presenter).await
}

fn cmd_export(workspace: &Workspace, path: &Path) -> Result<()> {
    let store = AnswerStore::new(workspace.storage()?);
    store
        .export_json_file(path)
        .with_context(|| format!("failed to export to {}", path.display()))?;
    println!("exported to {}", path.display());
    Ok(())
}

fn cmd_import(workspace: &Workspace, path: &Path) -> Result<()> {
    let store = AnswerStore::new(workspace.storage()?);
    let snapshot = store
        .import_json_file(path)
        .context("failed to import JSON")?;
    println!(
        "imported {} answers from {}",
        snapshot.len(),
        path.display()
    );
    Ok(())
}
