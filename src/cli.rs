use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "reel-relay")]
#[command(author, version, about = "Telegram group bot that relays short-form videos back into the chat", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Run the pipeline for a piece of text locally, without Telegram
    Fetch {
        /// Message text or a bare link
        text: String,

        /// Keep the downloaded file instead of deleting it
        #[arg(long)]
        keep: bool,
    },

    /// Print the installed yt-dlp version
    YtdlpVersion,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["reel-relay"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_fetch_subcommand() {
        let cli = Cli::try_parse_from(["reel-relay", "fetch", "https://youtube.com/shorts/abc", "--keep"]).unwrap();
        match cli.command {
            Some(Commands::Fetch { text, keep }) => {
                assert_eq!(text, "https://youtube.com/shorts/abc");
                assert!(keep);
            }
            _ => panic!("expected fetch"),
        }
    }
}
