use colored::Colorize;
use meraki_vlan_sync::cli::CommandLine;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Do as little as possible in main.rs as it can't contain any tests
    if let Err(e) = log4rs::init_file("log4rs.yml", Default::default()) {
        eprintln!("Warning: logging disabled, could not load log4rs.yml: {e}");
    }
    dotenv::dotenv().ok();
    log::info!("#Start main()");

    let cli = CommandLine::parse_args();
    match meraki_vlan_sync::run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("{} {e}", "Error:".on_red());
            ExitCode::FAILURE
        }
    }
}
