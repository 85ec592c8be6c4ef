//! Interactive session: line commands on stdin, periodic autosave and a
//! debounced save after text edits.

use std::time::Instant;

use anyhow::{Context, Result};
use discovery_core::{CoalescePolicy, Coalescer, Edit, QuestionId};
use discovery_store::{DiscoveryConfig, DiscoverySession, Storage, SubmitOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use crate::presenter::TerminalPresenter;

const HELP: &str = "\
commands:
  answer <id> <option...>   replace the options checked for a question
  text <id> <text...>       replace the text of a free-text question
  clear <id>                clear a question
  progress                  show answered/total
  save                      save a draft now
  submit                    check the threshold and build the summary
  help                      this message
  quit                      save and leave";

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Edit(Edit),
    Progress,
    Save,
    Submit,
    Help,
    Quit,
    Empty,
}

fn parse_id(word: Option<&str>) -> Result<QuestionId, String> {
    let word = word.ok_or("missing question id")?;
    word.trim_start_matches('q')
        .parse()
        .map_err(|_| format!("not a question id: {word}"))
}

fn parse_line(line: &str) -> Result<Line, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Line::Empty);
    };

    match command {
        "answer" => {
            let question = parse_id(words.next())?;
            let values: Vec<String> = words.map(str::to_string).collect();
            if values.is_empty() {
                return Err("answer needs at least one option".to_string());
            }
            Ok(Line::Edit(Edit::Select { question, values }))
        }
        "text" => {
            let question = parse_id(words.next())?;
            let text = words.collect::<Vec<_>>().join(" ");
            Ok(Line::Edit(Edit::Text { question, text }))
        }
        "clear" => Ok(Line::Edit(Edit::Clear {
            question: parse_id(words.next())?,
        })),
        "progress" => Ok(Line::Progress),
        "save" => Ok(Line::Save),
        "submit" => Ok(Line::Submit),
        "help" | "?" => Ok(Line::Help),
        "quit" | "exit" => Ok(Line::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

pub async fn run<S: Storage>(
    mut session: DiscoverySession<S>,
    config: &DiscoveryConfig,
    mut presenter: TerminalPresenter,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let mut autosave = tokio::time::interval(config.autosave_interval());
    autosave.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    autosave.tick().await;

    let mut debounce = Coalescer::new(CoalescePolicy::new(config.debounce_window()));

    println!("{}", crate::progress_line(&session.progress()));

    loop {
        let deadline = debounce.deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                let line = match parse_line(&line) {
                    Ok(line) => line,
                    Err(msg) => {
                        eprintln!("error: {msg}");
                        continue;
                    }
                };
                match line {
                    Line::Edit(edit) => {
                        let is_text = matches!(edit, Edit::Text { .. });
                        match session.apply(edit) {
                            Ok(progress) => println!("{}", crate::progress_line(&progress)),
                            Err(e) => {
                                eprintln!("error: {e}");
                                continue;
                            }
                        }
                        if is_text {
                            debounce.touch(Instant::now());
                        } else {
                            session.save().context("failed to save answers")?;
                            debounce.cancel();
                        }
                    }
                    Line::Progress => crate::print_progress(&session),
                    Line::Save => {
                        session
                            .save_draft(&mut presenter)
                            .context("failed to save draft")?;
                        debounce.cancel();
                    }
                    Line::Submit => {
                        if let SubmitOutcome::Accepted { link, .. } = session
                            .submit(&mut presenter)
                            .context("failed to submit")?
                        {
                            println!("{link}");
                        }
                    }
                    Line::Help => println!("{HELP}"),
                    Line::Quit => break,
                    Line::Empty => {}
                }
            }
            _ = autosave.tick() => {
                if session.is_dirty() {
                    session.save().context("autosave failed")?;
                    debounce.cancel();
                    tracing::debug!("autosaved");
                }
            }
            _ = until(deadline) => {
                if debounce.fire(Instant::now()) && session.is_dirty() {
                    session.save().context("failed to save answers")?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    if session.is_dirty() {
        session.save().context("failed to save answers")?;
    }
    Ok(())
}
