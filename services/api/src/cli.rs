use crate::demo::{
    run_control_numbers, run_conversion, run_demo, ControlNumberArgs, ConvertArgs, DemoArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use dmw_portal::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "DMW Direct Hire Portal",
    about = "Run the Direct Hire processing service and its operator tools",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk one application through the status checklist and document requirements
    Demo(DemoArgs),
    /// Preview control numbers issued from a given sequence position
    ControlNumber(ControlNumberArgs),
    /// Convert a declared salary between currencies
    Convert(ConvertArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Demo(args) => run_demo(args),
        Command::ControlNumber(args) => run_control_numbers(args),
        Command::Convert(args) => run_conversion(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["dmw-portal-api"]).expect("parses");
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["dmw-portal-api", "serve", "--port", "9090"])
            .expect("parses");
        assert!(matches!(
            cli.command,
            Some(Command::Serve(ServeArgs { port: Some(9090), .. }))
        ));
    }

    #[test]
    fn convert_requires_a_known_currency() {
        assert!(Cli::try_parse_from(["dmw-portal-api", "convert", "1500", "SAR", "--to", "USD"])
            .is_ok());
        assert!(Cli::try_parse_from(["dmw-portal-api", "convert", "1500", "XYZ"]).is_err());
    }
}
