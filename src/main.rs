use ansi_term::Colour;
use clap::Parser;
use log::info;
use nocache_server::{HttpServer, ServerConfig, ServerError, banner, logger};

fn run() -> Result<(), ServerError> {
    let config = ServerConfig::parse();
    info!("Starting static server with config: {:?}", config);

    let server = HttpServer::bind(&config)?;
    let port = server.local_addr()?.port();

    let handle = server.shutdown_handle();
    ctrlc::set_handler(move || handle.shutdown())?;

    let mut stdout = std::io::stdout();
    banner::print_startup(&mut stdout, port, server.root())?;

    server.run()?;

    banner::print_shutdown(&mut stdout)?;
    Ok(())
}

fn main() {
    logger::init();

    if let Err(e) = run() {
        eprintln!("{}", Colour::Red.bold().paint(format!("Error: {}", e)));
        std::process::exit(1);
    }
}
