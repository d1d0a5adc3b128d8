//! `ragchat chat`: the interactive conversation loop.

use std::io;

use anyhow::{Context, Result};
use ragchat_retrieval::{RagConfig, RetrievedDocument, Retriever};
use ragchat_runner::{ChatConfig, ChatSession, ContextualizeFallback, TurnOrchestrator};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, info, warn};

use crate::cli::ChatArgs;
use crate::display::{TerminalDisplay, write_references};

const PROMPT: &str = "you> ";

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input<'a> {
    Empty,
    Exit,
    Clear,
    Reload,
    References,
    Help,
    Question(&'a str),
}

pub fn parse_input(line: &str) -> Input<'_> {
    match line.trim() {
        "" => Input::Empty,
        "/exit" | "/quit" => Input::Exit,
        "/clear" => Input::Clear,
        "/reload" => Input::Reload,
        "/refs" => Input::References,
        "/help" => Input::Help,
        question => Input::Question(question),
    }
}

fn print_help() {
    println!(
        "Commands: /refs (passages behind the last answer), /clear (forget the conversation), \
         /reload (re-read the index), /exit"
    );
}

pub async fn run(args: ChatArgs) -> Result<()> {
    let rag = RagConfig::builder()
        .top_k(usize::from(args.top_k))
        .score_threshold(args.score_threshold)
        .index_path(&args.index.index_path)
        .build()?;
    let fallback = if args.strict_contextualize {
        ContextualizeFallback::Abort
    } else {
        ContextualizeFallback::FallbackToRaw
    };
    let chat = ChatConfig::builder()
        .message_limit(usize::from(args.message_limit))
        .contextualize_fallback(fallback)
        .call_timeout(args.generation.call_timeout()?)
        .build()?;

    // Both endpoints are validated before the first turn.
    let embedder = args.embedding.build().context("embedding endpoint is not configured")?;
    let generator = args.generation.build().context("chat model endpoint is not configured")?;

    let orchestrator = TurnOrchestrator::new(generator, Retriever::new(embedder, &rag), &chat);
    let mut session = ChatSession::new(&chat);
    attach_index(&mut session, &rag);
    info!(session.id = %session.id(), top_k = rag.top_k, score_threshold = rag.score_threshold, "chat session started");

    let mut last_documents: Vec<RetrievedDocument> = Vec::new();
    let mut editor = DefaultEditor::new()?;
    print_help();
    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        match parse_input(&line) {
            Input::Empty => {}
            Input::Exit => break,
            Input::Help => print_help(),
            Input::Clear => {
                session.clear_history();
                last_documents.clear();
                println!("Conversation cleared.");
            }
            Input::Reload => attach_index(&mut session, &rag),
            Input::References => {
                if let Err(e) = write_references(&mut io::stdout().lock(), &last_documents) {
                    warn!(error = %e, "failed to print references");
                }
            }
            Input::Question(question) => {
                if let Err(e) = editor.add_history_entry(question) {
                    debug!(error = %e, "failed to record line history");
                }
                let mut display = TerminalDisplay::new(io::stdout());
                match orchestrator.run_turn(&mut session, question, &mut display).await {
                    Ok(turn) => last_documents = turn.documents,
                    Err(e) if e.is_user_actionable() => println!("{e}"),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
        }
    }

    info!(session.id = %session.id(), "chat session ended");
    Ok(())
}

fn attach_index(session: &mut ChatSession, rag: &RagConfig) {
    match session.load_index(&rag.index_path) {
        Ok(index) => println!("Loaded {} indexed chunk(s) from {}.", index.len(), rag.index_path.display()),
        Err(e) if e.is_missing_index() => println!("{e}"),
        Err(e) => {
            warn!(error = %e, "failed to load index");
            eprintln!("error: {e}");
        }
    }
}
