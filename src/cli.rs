use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ytnotes",
    about = "Web service turning YouTube subtitles into transcripts and Gemini notes",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Address to listen on [default: 0.0.0.0:5000]
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Directory for transcript and notes files [default: static/downloads]
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Gemini model used for notes
    #[arg(short, long)]
    pub model: Option<String>,

    /// Path to the yt-dlp executable
    #[arg(long)]
    pub yt_dlp: Option<PathBuf>,

    /// Print the effective configuration on startup
    #[arg(short, long)]
    pub verbose: bool,
}
