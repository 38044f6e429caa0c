use anyhow::Result;
use monthstat::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();
    cli.execute()
}
