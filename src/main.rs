use std::process;

use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;
use vanish::{
    application::{commands, error::AppError},
    config,
    infra::telemetry,
};

const PARTIAL_FAILURE_EXIT_CODE: i32 = 2;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => process::exit(code),
        Err(error) => {
            report_application_error(&error);
            process::exit(error.exit_code());
        }
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<i32, AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        config::Command::Ban(args) => run_ban(settings, *args).await,
        config::Command::Target(_) => {
            println!("{}", commands::target(&settings)?);
            Ok(0)
        }
        config::Command::Normalize(args) => {
            for path in commands::normalize_all(&args.urls)? {
                println!("{path}");
            }
            Ok(0)
        }
    }
}

async fn run_ban(settings: config::Settings, args: config::BanArgs) -> Result<i32, AppError> {
    let engine = commands::build_engine(&settings)?;

    info!(
        target = "vanish::ban",
        urls = args.urls.len(),
        regexes = args.regexes.len(),
        concurrency = settings.dispatch.concurrency.get(),
        "Starting ban"
    );

    let result = commands::ban(&engine, &args.urls, &args.regexes).await?;
    println!("{}", commands::render_flush(&result, args.json)?);

    if result.is_success() {
        Ok(0)
    } else {
        Ok(PARTIAL_FAILURE_EXIT_CODE)
    }
}
