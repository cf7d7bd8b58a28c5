use crate::config_loader::SourceArgs;
use clap::Args;
use sb_types::ProfileId;

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Profiles to check (repeatable); every profile in the store when omitted
    #[arg(short = 'p', long = "profile")]
    pub profiles: Vec<ProfileId>,
    /// Output format: text | json
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,
}
