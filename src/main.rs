use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;

use recast::bootstrap::setup::{check_encoder, initialize_folder, initialize_logger};
use recast::common::errors::handle_error;
use recast::config::{Cli, EncoderEnv, ExecutorConfig};
use recast::workflow::{self, executor::HandBrakeTranscoder};

fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    initialize_logger(cli.level_filter())?;

    let executor_config = ExecutorConfig::resolve(&EncoderEnv::from_env()?);
    let config = cli.into_run_config();

    if !config.dry_run {
        check_encoder(&executor_config).map_err(handle_error)?;
        initialize_folder(&config).map_err(handle_error)?;
    }

    let transcoder = HandBrakeTranscoder::new(executor_config);
    let summary =
        workflow::run(&config, &transcoder).map_err(|err| handle_error(err.into()))?;

    println!("{}", summary);
    Ok(())
}
