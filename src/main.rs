use clap::Parser;
use color_eyre::Result;
use mackerel_plugin_resque::{
    init_errors,
    init_logging,
    run,
    Args,
};
use resque_plugin_config::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_errors()?;
    let args = Args::parse();
    init_logging(args.verbose)?;
    run(Config::new(args)?).await
}
