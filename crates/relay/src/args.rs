use clap::{Parser, Subcommand};

#[derive(Debug, clap::Args)]
pub struct Globals {
    /// Path to a backend template JSON file; overrides --backend.
    #[clap(short, long, env = "RELAY_TEMPLATE")]
    pub template: Option<String>,

    /// Name of a bundled backend template.
    #[clap(short, long, env = "RELAY_BACKEND", default_value = "OpenAI Compatible")]
    pub backend: String,

    /// Path to the connection values JSON file.
    #[clap(short, long, env = "RELAY_CONNECTION")]
    pub connection: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build a request body and print it together with its auth headers.
    Build {
        /// Path to the sampler preset JSON file.
        #[clap(short, long, env = "RELAY_PRESET")]
        preset: String,

        /// Path to the conversation JSON file ([{"role", "message"}, ..]).
        #[clap(long)]
        chat: String,

        /// Comma-delimited stop sequence.
        #[clap(long, default_value = "")]
        stop: String,
    },
    /// Fetch the backend's model catalog and print the model names.
    Models,
}

#[derive(Debug, Parser)]
#[command(name = "relay")]
#[command(about = "Build LLM API requests from declarative backend templates")]
pub struct Args {
    #[clap(flatten)]
    pub globals: Globals,

    #[command(subcommand)]
    pub command: Command,
}
