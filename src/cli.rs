use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Path to config TOML
    #[arg(long, default_value = "mnemoscope.toml")]
    pub config: String,

    /// Path to the persisted session state TOML
    #[arg(long, default_value = "session_state.toml")]
    pub state: String,

    /// RNG seed for reproducible stimulus sequences
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Override the persisted task mode (orientation, color, spatial,
    /// numerosity, saccade)
    #[arg(long)]
    pub mode: Option<String>,

    /// Override the persisted numerosity sub-mode (enumerate, compare)
    #[arg(long)]
    pub submode: Option<String>,

    /// Stop after this many trials (0 = run until quit)
    #[arg(long, default_value_t = 0)]
    pub trials: u64,
}
