use clap::{Parser, Subcommand};

/// `Moodwell` - mood check-ins, journal notes and a gentle companion.
#[derive(Parser, Debug)]
#[command(name = "moodwell")]
#[command(version = "0.1.0")]
#[command(about = "Mood check-ins with offline-first sync.", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute a score and diagnosis locally, without saving anything
    Score {
        /// Mood rating from 1 (very bad) to 5 (very good)
        #[arg(short, long)]
        mood: i32,

        /// Emotion tags, e.g. "alegría", "ansiedad" (repeatable)
        #[arg(short, long = "emotion")]
        emotions: Vec<String>,

        /// Hours slept last night
        #[arg(short, long, default_value = "7")]
        sleep: i32,
    },

    /// Score and save a check-in; queued offline if the remote is unreachable
    Diagnose {
        #[arg(short, long)]
        mood: i32,

        #[arg(short, long = "emotion")]
        emotions: Vec<String>,

        /// What the day was about, e.g. "trabajo", "familia" (repeatable)
        #[arg(short = 't', long = "tag")]
        day_tags: Vec<String>,

        /// Short note (first 160 characters are kept)
        #[arg(short, long, default_value = "")]
        note: String,

        #[arg(short, long, default_value = "7")]
        sleep: i32,
    },

    /// Save a journal note; queued offline if the remote is unreachable
    Note {
        #[arg(long, default_value = "")]
        title: String,

        /// Note body
        content: String,
    },

    /// Read, edit or delete saved notes
    Notes {
        #[command(subcommand)]
        notes_command: NotesCommands,
    },

    /// Show recent check-ins
    History,

    /// Browse the professional help directory
    Pros {
        #[command(subcommand)]
        pros_command: ProsCommands,
    },

    /// Manage your directory profile (professional accounts only)
    Profile {
        #[command(subcommand)]
        profile_command: ProfileCommands,
    },

    /// List writes waiting in the offline queue
    Pending,

    /// Replay the offline queue against the remote store
    Sync,

    /// Show today's recommendation, generating it if needed
    Recommend {
        /// Generate a new one even if today's already exists
        #[arg(long)]
        refresh: bool,
    },

    /// Chat with the companion (reads lines from stdin)
    Chat {
        /// Send one message and exit
        #[arg(short, long)]
        message: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum NotesCommands {
    /// List notes, most recently edited first
    List,
    /// Print one note in full
    Show { id: String },
    /// Change a note's title and/or content
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        content: Option<String>,
    },
    /// Delete a note
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ProsCommands {
    /// List professionals, optionally narrowed down
    List {
        #[arg(long)]
        specialty: Option<String>,

        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        municipality: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Print your directory profile
    Show,
    /// Change fields of your directory profile; others are kept
    Update {
        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        specialty: Option<String>,

        /// Professional licence number (5 to 10 digits)
        #[arg(long)]
        cedula: Option<String>,

        /// 10-digit phone number
        #[arg(long)]
        phone: Option<String>,

        #[arg(long)]
        purpose: Option<String>,

        #[arg(long)]
        level: Option<String>,

        #[arg(long)]
        state: Option<String>,

        #[arg(long)]
        municipality: Option<String>,

        #[arg(long)]
        photo_url: Option<String>,
    },
}
