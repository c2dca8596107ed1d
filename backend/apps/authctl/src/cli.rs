use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "authctl")]
#[command(about = "Password and session maintenance for the auth core")]
#[command(version)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Hash a password read from stdin
    EncodePassword {
        /// argon2id, bcrypt or sha256 (defaults to AUTH_PASSWORD_ALGORITHM, then argon2id)
        #[arg(long)]
        algorithm: Option<String>,

        /// Explicit salt for codecs that do not embed one
        #[arg(long)]
        salt: Option<String>,
    },

    /// Check a password read from stdin against a stored hash
    VerifyPassword {
        /// Stored hash
        #[arg(long)]
        hash: String,

        #[arg(long)]
        algorithm: Option<String>,

        #[arg(long)]
        salt: Option<String>,
    },

    /// Apply database migrations
    Migrate,

    /// Authenticate against the user table with a password read from stdin
    CheckLogin {
        /// User name (or email, depending on AUTH_LOGIN_LOOKUP)
        identifier: String,
    },

    /// Delete expired rows from the session table
    CleanupSessions,
}
