// src/main.rs

use dagexec::{cli, logging, run};

#[tokio::main]
async fn main() {
    match run_main().await {
        Ok(true) => {}
        // Ran to the end (or was stopped) with failed or cancelled tasks.
        Ok(false) => std::process::exit(2),
        Err(err) => {
            eprintln!("dagexec error: {err:?}");
            std::process::exit(1);
        }
    }
}

async fn run_main() -> anyhow::Result<bool> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
