use crate::cli::commands::{Cli, Commands, NotesCommands, ProfileCommands, ProsCommands};
use anyhow::{Context, Result, bail};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::app::status::{
    render_history, render_listings, render_note, render_notes, render_pending, render_profile,
    render_replay,
};
use moodwell::Config;
use moodwell::core::checkin::{
    CheckIn, CheckInSettings, DiagnosticForm, DiagnosticOutcome, NoteOutcome, daily_recommendation,
};
use moodwell::core::companion::{Conversation, GeminiClient, PhraseGenerator};
use moodwell::core::directory::{self, DirectoryFilter, ProfileChanges};
use moodwell::core::journal;
use moodwell::core::offline::{FileKeyValueStore, OfflineQueue, Replayer};
use moodwell::core::remote::{FirestoreClient, NoteDraft, RemoteWriter};
use moodwell::core::scoring::MoodInput;
use moodwell::core::session::SessionContext;
use moodwell::error::QueueError;

/// Everything a command needs, built once from config.
struct Services {
    session: SessionContext,
    store: Arc<FirestoreClient>,
    companion: Arc<GeminiClient>,
    queue: Arc<OfflineQueue>,
}

impl Services {
    fn from_config(config: &Config) -> Self {
        let session = config.session.to_context();
        let id_token = session.user().and_then(|user| user.id_token.as_deref());

        let mut store = FirestoreClient::new(
            config.remote.project_id.clone(),
            config.remote.api_key.as_deref(),
            config.remote.write_timeout_secs,
        )
        .with_id_token(id_token);
        if let Some(url) = config.remote.base_url.as_deref() {
            store = store.with_base_url(url);
        }

        let mut companion = GeminiClient::new(
            config.companion.api_key.as_deref(),
            Some(&config.companion.model),
            config.companion.timeout_secs,
        );
        if let Some(url) = config.companion.base_url.as_deref() {
            companion = companion.with_base_url(url);
        }

        let storage = FileKeyValueStore::new(config.storage_path());
        Self {
            session,
            store: Arc::new(store),
            companion: Arc::new(companion),
            queue: Arc::new(OfflineQueue::new(Arc::new(storage))),
        }
    }

    fn require_remote(config: &Config) -> Result<()> {
        if config.remote.project_id.trim().is_empty() {
            bail!("remote.project_id is not set; edit {}", config.config_path.display());
        }
        Ok(())
    }

    fn check_in(&self, config: &Config) -> CheckIn {
        let remote: Arc<dyn RemoteWriter> = self.store.clone();
        let flow = CheckIn::new(remote, self.queue.clone()).with_settings(CheckInSettings {
            write_timeout: Duration::from_secs(config.remote.write_timeout_secs),
            phrase_timeout: Duration::from_secs(config.companion.timeout_secs),
            phrase_max_chars: config.companion.phrase_max_chars,
        });
        if self.companion.has_api_key() {
            let phrases: Arc<dyn PhraseGenerator> = self.companion.clone();
            flow.with_phrases(phrases)
        } else {
            flow
        }
    }
}

pub async fn dispatch(cli: Cli, config: Arc<Config>) -> Result<()> {
    match cli.command {
        Commands::Score {
            mood,
            emotions,
            sleep,
        } => {
            let result = MoodInput::new(mood, emotions, sleep)?.score();
            println!("{} ({})", result.score, result.diagnosis);
            Ok(())
        }

        Commands::Diagnose {
            mood,
            emotions,
            day_tags,
            note,
            sleep,
        } => {
            Services::require_remote(&config)?;
            let services = Services::from_config(&config);
            let form = DiagnosticForm {
                mood,
                emotions,
                day_tags,
                note,
                sleep_hours: sleep,
            };
            match services
                .check_in(&config)
                .submit_diagnostic(&services.session, form)
                .await?
            {
                DiagnosticOutcome::Saved { id, result, phrase } => {
                    info!(diagnostic_id = %id, "check-in saved");
                    println!("{} ({})", result.score, result.diagnosis);
                    println!("{phrase}");
                }
                DiagnosticOutcome::QueuedOffline { result, reason } => {
                    println!("{} ({})", result.score, result.diagnosis);
                    println!("Guardado sin conexión ({reason}); se sincronizará más tarde.");
                }
            }
            Ok(())
        }

        Commands::Note { title, content } => {
            Services::require_remote(&config)?;
            let services = Services::from_config(&config);
            match services
                .check_in(&config)
                .save_note(&services.session, NoteDraft::new(title, content))
                .await?
            {
                NoteOutcome::Saved { id } => println!("Nota guardada ({id})."),
                NoteOutcome::QueuedOffline { reason } => {
                    println!("Nota guardada sin conexión ({reason}); se sincronizará más tarde.");
                }
            }
            Ok(())
        }

        Commands::Notes { notes_command } => {
            Services::require_remote(&config)?;
            let services = Services::from_config(&config);
            run_notes(&services, notes_command).await
        }

        Commands::History => {
            Services::require_remote(&config)?;
            let services = Services::from_config(&config);
            let diagnostics = journal::recent_diagnostics(&services.store, &services.session).await?;
            print!("{}", render_history(&diagnostics));
            Ok(())
        }

        Commands::Pros { pros_command } => {
            Services::require_remote(&config)?;
            let services = Services::from_config(&config);
            match pros_command {
                ProsCommands::List {
                    specialty,
                    state,
                    municipality,
                } => {
                    let filter = DirectoryFilter {
                        specialty,
                        state,
                        municipality,
                    };
                    let listings = directory::find_professionals(&services.store, &filter).await?;
                    print!("{}", render_listings(&listings));
                }
            }
            Ok(())
        }

        Commands::Profile { profile_command } => {
            Services::require_remote(&config)?;
            let services = Services::from_config(&config);
            run_profile(&services, profile_command).await
        }

        Commands::Pending => {
            let services = Services::from_config(&config);
            let pending = services.queue.peek_all()?;
            print!("{}", render_pending(&pending));
            Ok(())
        }

        Commands::Sync => {
            Services::require_remote(&config)?;
            let services = Services::from_config(&config);
            let replayer = Replayer::new(services.queue.clone()).with_action_timeout(
                Duration::from_secs(config.offline.action_timeout_secs),
            );
            let report = match replayer.replay(services.store.as_ref()).await {
                Ok(report) => report,
                Err(QueueError::Requeue { actions, source }) => {
                    // stdout is the only copy left once this process exits
                    println!("{}", serde_json::to_string_pretty(&actions)?);
                    bail!(
                        "{} action(s) could not be written back to {} ({source}); they are printed above",
                        actions.len(),
                        config.storage_path().display()
                    );
                }
                Err(e) => return Err(e.into()),
            };
            print!("{}", render_replay(&report));
            Ok(())
        }

        Commands::Recommend { refresh } => {
            Services::require_remote(&config)?;
            let services = Services::from_config(&config);
            let recommendation = daily_recommendation(
                &services.store,
                &services.companion,
                &services.session,
                refresh,
            )
            .await?;
            println!("{}", recommendation.text);
            Ok(())
        }

        Commands::Chat { message } => {
            let services = Services::from_config(&config);
            run_chat(&services.companion, message).await
        }
    }
}

async fn run_notes(services: &Services, command: NotesCommands) -> Result<()> {
    let (store, session) = (&services.store, &services.session);
    match command {
        NotesCommands::List => {
            print!("{}", render_notes(&journal::recent_notes(store, session).await?));
        }
        NotesCommands::Show { id } => match journal::note(store, session, &id).await? {
            Some(note) => print!("{}", render_note(&note)),
            None => bail!("there is no note {id}"),
        },
        NotesCommands::Edit { id, title, content } => {
            let Some(current) = journal::note(store, session, &id).await? else {
                bail!("there is no note {id}");
            };
            let draft = NoteDraft::new(
                title.unwrap_or(current.title),
                content.unwrap_or(current.content),
            );
            journal::edit_note(store, session, &id, &draft).await?;
            println!("Nota actualizada.");
        }
        NotesCommands::Delete { id } => {
            journal::delete_note(store, session, &id).await?;
            println!("Nota eliminada.");
        }
    }
    Ok(())
}

async fn run_profile(services: &Services, command: ProfileCommands) -> Result<()> {
    let (store, session) = (&services.store, &services.session);
    match command {
        ProfileCommands::Show => match directory::my_profile(store, session).await? {
            Some(profile) => print!("{}", render_profile(&profile)),
            None => println!("Aún no tienes un perfil en el directorio."),
        },
        ProfileCommands::Update {
            full_name,
            specialty,
            cedula,
            phone,
            purpose,
            level,
            state,
            municipality,
            photo_url,
        } => {
            let changes = ProfileChanges {
                full_name,
                specialty,
                cedula,
                phone,
                purpose,
                level,
                state,
                municipality,
                photo_url,
            };
            let profile = directory::update_my_profile(store, session, changes).await?;
            println!("Perfil actualizado.");
            print!("{}", render_profile(&profile));
        }
    }
    Ok(())
}

async fn run_chat(companion: &GeminiClient, message: Option<String>) -> Result<()> {
    let mut conversation = Conversation::with_greeting();

    if let Some(message) = message {
        println!("{}", conversation.send(companion, &message).await?);
        return Ok(());
    }

    if let Some(greeting) = conversation.history().first() {
        println!("{}", greeting.text);
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "/exit" | "/quit") {
            break;
        }
        println!("{}", conversation.send(companion, line).await?);
    }
    Ok(())
}
