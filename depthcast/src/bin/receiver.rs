//! `depthcast-receiver <host> <port>`: pings a sender, then reassembles
//! and reports on the frames it streams.
//!
//! Only the sender has an interactive port prompt; the receiver needs the
//! sender's host and port up front, so two positional arguments are enough.

use std::process::ExitCode;

use depthcast::run_receiver_session;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(host), Some(port)) = (args.next(), args.next()) else {
        eprintln!("usage: depthcast-receiver <host> <port>");
        return ExitCode::FAILURE;
    };
    let Ok(port) = port.parse::<u16>() else {
        eprintln!("'{port}' is not a valid port number");
        return ExitCode::FAILURE;
    };

    match run_receiver_session((host.as_str(), port)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "receiver session aborted");
            ExitCode::FAILURE
        }
    }
}
