use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use voice_chat_rs::{
    audio_sink::{AudioSink, FileSink},
    config::load_config,
    llm::{ConversationTemplates, GeminiLLM, LLMConfig},
    stt::GoogleSTT,
    tts::GoogleTTS,
    ChatError, ChatSession, ConversationController, Language, Outcome, PersonalityCatalog, Role,
};

#[derive(Parser, Debug)]
#[command(name = "voice-chat", about = "Chat with an AI personality by text or voice")]
struct Args {
    /// Personality to start with
    #[arg(long, short)]
    personality: Option<String>,

    /// Speech recognition language (name or code, e.g. "French" or "fr-FR")
    #[arg(long, short, default_value = "English")]
    language: String,

    /// Gemini model name
    #[arg(long, default_value = "gemini-2.5-flash")]
    model: String,

    /// Do not synthesize replies automatically
    #[arg(long)]
    no_tts: bool,

    /// Where synthesized replies are written
    #[arg(long, default_value = "voice-chat-audio")]
    audio_dir: PathBuf,

    /// Print the available personalities and exit
    #[arg(long)]
    list_personalities: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();
    let catalog = Arc::new(PersonalityCatalog::builtin());

    if args.list_personalities {
        for p in catalog.list() {
            println!("{} {} - {}", p.icon, p.name, p.description);
        }
        return Ok(());
    }

    log::info!("🚀 Initializing voice-chat");
    let api_config = load_config()?;

    let language = Language::parse(&args.language)
        .ok_or_else(|| anyhow::anyhow!("unknown language '{}'", args.language))?;

    let controller = match &args.personality {
        Some(id) => ConversationController::with_personality(Arc::clone(&catalog), id)?,
        None => ConversationController::new(Arc::clone(&catalog)),
    };

    let llm = GeminiLLM::with_config(
        api_config.gemini_key().to_string(),
        LLMConfig {
            model: args.model.clone(),
            ..LLMConfig::default()
        },
    )?;
    let stt = GoogleSTT::new(api_config.speech_key().to_string())?;
    let tts = GoogleTTS::new()?;

    let session = ChatSession::new(controller, Arc::new(llm), Arc::new(stt), Arc::new(tts));
    session.set_language(language);
    session.set_auto_play(!args.no_tts);

    let sink = FileSink::new(&args.audio_dir).await?;
    log::info!("🔊 Audio clips go to {}", sink.dir().display());

    print_banner(&session);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim() == ":quit" {
                    break;
                }

                // Ctrl+C while a request is running cancels the request, not the program
                let handling = handle_line(&session, &sink, &line);
                tokio::pin!(handling);
                loop {
                    tokio::select! {
                        _ = &mut handling => break,
                        _ = tokio::signal::ctrl_c() => {
                            println!("🛑 Cancelling the pending request...");
                            session.cancel_pending();
                        }
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                log::info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    println!("\n👋 Goodbye!");
    Ok(())
}

fn print_banner(session: &ChatSession) {
    let personality = session.personality();
    let settings = session.settings();
    println!("{}", personality.title());
    println!("{}", personality.description);
    println!(
        "🎤 Voice language: {} | 🔊 Auto-play: {}",
        settings.language,
        if settings.auto_play { "on" } else { "off" }
    );
    println!("Type a message, or:");
    println!("  :voice <file.wav>       send a recording");
    println!("  :personality <name>     switch personality");
    println!("  :language <name|code>   set voice language");
    println!("  :tts on|off             toggle auto-play");
    println!("  :play <index>           synthesize a reply");
    println!("  :clear                  clear chat history");
    println!("  :history                show the conversation");
    println!("  :quit                   exit");
}

async fn handle_line(session: &ChatSession, sink: &FileSink, line: &str) {
    let line = line.trim();
    let (head, rest) = match line.split_once(' ') {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };

    match head {
        ":voice" => match tokio::fs::read(rest).await {
            Ok(audio) => match session.submit_audio(&audio).await {
                Ok(Some(voice)) => {
                    println!("{}", ConversationTemplates::transcribed(&voice.transcript));
                    report(session, sink, Ok(voice.outcome)).await;
                }
                Ok(None) => println!("🔁 Same recording as before, ignored"),
                Err(e) => report(session, sink, Err(e)).await,
            },
            Err(e) => println!("❌ Could not read {}: {}", rest, e),
        },
        ":personality" => {
            let result = session.switch_personality(rest).map(Outcome::Switched);
            report(session, sink, result).await;
        }
        ":language" => match Language::parse(rest) {
            Some(language) => {
                session.set_language(language);
                println!("🌐 Voice language: {} ({})", language, language.code());
            }
            None => {
                let names: Vec<String> = Language::all().iter().map(|l| l.to_string()).collect();
                println!("Available languages: {}", names.join(", "));
            }
        },
        ":tts" => {
            session.set_auto_play(rest != "off");
            println!("🔊 Auto-play: {}", if rest == "off" { "off" } else { "on" });
        }
        ":play" => match rest.parse::<usize>() {
            Ok(index) => play(session, sink, index, false).await,
            Err(_) => println!("Usage: :play <index>"),
        },
        ":clear" => {
            session.clear_history();
            println!("{}", ConversationTemplates::history_cleared());
        }
        ":history" => print_history(session),
        _ => {
            let result = session.submit_text(line).await;
            report(session, sink, result).await;
        }
    }
}

async fn report(session: &ChatSession, sink: &FileSink, result: voice_chat_rs::Result<Outcome>) {
    match result {
        Ok(outcome) => {
            if let Some(status) = outcome.status() {
                println!("{}", status);
            }
            match &outcome {
                Outcome::Reply(message) => println!("🤖 {}", message.content),
                Outcome::Notice(message) => println!("ℹ️ {}", message.content),
                Outcome::Switched(personality) => println!("{}", personality.title()),
                _ => {}
            }
            if let Some(index) = session.autoplay_index() {
                play(session, sink, index, true).await;
            }
        }
        Err(ChatError::Transcription(e)) => {
            log::debug!("transcription error: {}", e);
            match e {
                voice_chat_rs::stt::STTError::Unintelligible(_) => {
                    println!("{}", ConversationTemplates::unintelligible())
                }
                voice_chat_rs::stt::STTError::ServiceUnavailable(_) => {
                    println!("{}", ConversationTemplates::service_unavailable())
                }
            }
        }
        Err(ChatError::Busy) => println!("{}", ConversationTemplates::busy()),
        Err(e) => println!("❌ Error: {}", e),
    }
}

async fn play(session: &ChatSession, sink: &FileSink, index: usize, autoplay: bool) {
    match session.audio_for(index).await {
        Ok(audio) => match sink.deliver(index, &audio, autoplay).await {
            Ok(path) => println!("🔊 {}", path.display()),
            Err(e) => println!("❌ {}", e),
        },
        Err(ChatError::Synthesis(_)) => println!("{}", ConversationTemplates::audio_failed()),
        Err(e) => println!("❌ {}", e),
    }
}

fn print_history(session: &ChatSession) {
    let state = session.current_state();
    println!("— {} —", state.active_personality_id);
    for message in &state.messages {
        let who = match message.role {
            Role::User => "🧑",
            Role::Assistant => "🤖",
        };
        println!("[{}] {} {}", message.index, who, message.content);
    }
}
