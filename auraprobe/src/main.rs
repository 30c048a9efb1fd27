use auraprobe::handlers::UNEXPECTED_ERROR_EXIT_CODE;
use auraprobe::{command_argument_builder, dispatch, init_tracing};
use auraprobe_core::print_banner;
use tracing::error;

#[tokio::main]
async fn main() {
    let chosen_command = command_argument_builder().get_matches();
    init_tracing(chosen_command.get_count("verbose"));

    // Show banner unless --quiet flag is set
    if !chosen_command.get_flag("quiet") {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    match dispatch(&chosen_command).await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            error!("An unexpected error occurred: {:#}", e);
            std::process::exit(UNEXPECTED_ERROR_EXIT_CODE);
        }
    }
}
