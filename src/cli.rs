use clap::{Args, Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;
use crate::query::{GetArgs, DEFAULT_MIN_TIME};

const GET_EXAMPLES: &str = "\
EXAMPLES:
   swo logs get something
   swo logs get 1.2.3 Failure
   swo logs get -s ns1 \"connection refused\"
   swo logs get -f \"(www OR db) (nginx OR pgsql) -accepted\"
   swo logs get -f -g <SWO_GROUP_NAME> \"(nginx OR pgsql) -accepted\"
   swo logs get --min-time 'yesterday at noon' --max-time 'today at 4am' -g <SWO_GROUP_NAME>
   swo logs get -- -redis";

#[derive(Parser, Debug)]
#[command(name = "swo", version, about = "Command-line client for a log management service")]
pub struct Cli {
    /// Path to the YAML config file holding `api-url` and `token`
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// API base URL (SWO_API_URL takes precedence)
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Work with log events
    #[command(subcommand)]
    Logs(LogsCommand),
}

#[derive(Subcommand, Debug)]
pub enum LogsCommand {
    /// Command-line search for the log management service
    #[command(after_help = GET_EXAMPLES)]
    Get(GetCommand),
}

#[derive(Args, Debug, Clone)]
pub struct GetCommand {
    /// Group name to search
    #[arg(short = 'g', long)]
    pub group: Option<String>,

    /// Earliest time to search from
    #[arg(long = "min-time", default_value = DEFAULT_MIN_TIME)]
    pub min_time: String,

    /// Latest time to search from
    #[arg(long = "max-time")]
    pub max_time: Option<String>,

    /// System to search
    #[arg(short = 's', long)]
    pub system: Option<String>,

    /// Output raw JSON
    #[arg(short = 'j', long)]
    pub json: bool,

    /// Enable live tailing
    #[arg(short = 'f', long)]
    pub follow: bool,

    /// Search terms; put them after `--` when they start with a dash
    #[arg(value_name = "FILTER")]
    pub terms: Vec<String>,
}

impl From<GetCommand> for GetArgs {
    fn from(cmd: GetCommand) -> Self {
        GetArgs {
            terms: cmd.terms,
            group: cmd.group,
            system: cmd.system,
            min_time: Some(cmd.min_time),
            max_time: cmd.max_time,
            json: cmd.json,
            follow: cmd.follow,
        }
    }
}
