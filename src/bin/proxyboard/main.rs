//! proxyboard: terminal console for a reverse-proxy manager's REST API.
#![deny(clippy::all, clippy::pedantic)]

mod args;
mod client;
mod handlers;
mod io;
mod print;

#[cfg(test)]
mod tests;

use std::process;

use clap::Parser;
use proxyboard::config;
use proxyboard::infra::telemetry;
use proxyboard_api_types::ResourceKind;
use tracing::debug;

use args::{Cli, Commands, ProxyHostsCmd};
use client::{CliError, Ctx, build_ctx};
use handlers::{
    access_lists, audit, certificates, dashboard, resources, search, session, settings, transfer,
    users,
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report(&error);
        process::exit(1);
    }
}

fn report(error: &CliError) {
    match error {
        CliError::App(err) => {
            let report = err.report();
            debug!(
                source = report.source,
                summary = err.presentation_message(),
                "command failed"
            );
            eprintln!("error: {}", report.joined());
        }
        other => eprintln!("error: {other}"),
    }
    if let Some(hint) = error.hint() {
        eprintln!("hint: {hint}");
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let settings = config::load(&cli.global)?;
    telemetry::init(&settings.logging)?;
    let ctx = build_ctx(settings)?;
    dispatch(&ctx, cli.command).await
}

async fn dispatch(ctx: &Ctx, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Login(args) => session::login(ctx, args).await,
        Commands::Logout => session::logout(ctx),
        Commands::Whoami => session::whoami(ctx).await,
        Commands::Dashboard => dashboard::handle(ctx).await,
        Commands::ProxyHosts(cmd) => match cmd.action {
            ProxyHostsCmd::Common(cmd) => {
                resources::handle(ctx, ResourceKind::ProxyHosts, cmd).await
            }
            ProxyHostsCmd::Add(args) => resources::add_proxy_host(ctx, args).await,
        },
        Commands::RedirectionHosts(cmd) => {
            resources::handle(ctx, ResourceKind::RedirectionHosts, cmd.action).await
        }
        Commands::DeadHosts(cmd) => {
            resources::handle(ctx, ResourceKind::DeadHosts, cmd.action).await
        }
        Commands::Streams(cmd) => resources::handle(ctx, ResourceKind::Streams, cmd.action).await,
        Commands::AccessLists(cmd) => access_lists::handle(ctx, cmd.action).await,
        Commands::Certificates(cmd) => certificates::handle(ctx, cmd.action).await,
        Commands::Users(cmd) => users::handle(ctx, cmd.action).await,
        Commands::Settings(cmd) => settings::handle(ctx, cmd.action).await,
        Commands::Audit(cmd) => audit::handle(ctx, cmd.action).await,
        Commands::Search(args) => search::handle(ctx, args).await,
        Commands::Export(args) => transfer::export_cmd(ctx, args).await,
        Commands::Import(args) => transfer::import_cmd(ctx, args).await,
    }
}
