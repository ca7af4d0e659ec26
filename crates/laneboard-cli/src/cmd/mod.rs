pub mod board;
pub mod config;
pub mod init;
pub mod moves;
pub mod serve;

use clap::Args;

/// Where the board server lives and who is asking.
#[derive(Args, Debug)]
pub struct RemoteArgs {
    /// Base URL of a running `laneboard serve`
    #[arg(long, env = "LANEBOARD_URL", default_value = "http://127.0.0.1:3141")]
    pub url: String,

    /// User id sent with every request
    #[arg(long, env = "LANEBOARD_USER")]
    pub user: String,
}
