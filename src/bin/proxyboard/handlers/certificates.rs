#![deny(clippy::all, clippy::pedantic)]

use proxyboard::application::gateway::ResourceGateway;
use proxyboard::domain::certificates::expiry_status;
use proxyboard::domain::visibility::VisibilityFilter;
use proxyboard_api_types::{ResourceKind, ResourceRecord};
use tracing::info;

use super::resources;
use crate::args::CertificatesCmd;
use crate::client::{CliError, Ctx};

const KIND: ResourceKind = ResourceKind::Certificates;

pub async fn handle(ctx: &Ctx, cmd: CertificatesCmd) -> Result<(), CliError> {
    match cmd {
        CertificatesCmd::Common(cmd) => resources::handle(ctx, KIND, cmd).await,
        CertificatesCmd::Expiring { within_days } => expiring(ctx, within_days).await,
        CertificatesCmd::Renew { id } => renew(ctx, id).await,
    }
}

async fn expiring(ctx: &Ctx, within_days: i64) -> Result<(), CliError> {
    let policy = ctx.require_view(KIND).await?;
    let records = VisibilityFilter::new(&policy).filter(ctx.api.list(KIND, &ctx.scope()).await?);
    let now = Ctx::now();

    let mut due: Vec<(i64, String, &'static str)> = records
        .iter()
        .filter_map(|record| match record {
            ResourceRecord::Certificate(cert) => expiry_status(cert, now)
                .filter(|(days, _)| *days <= within_days)
                .map(|(days, band)| (days, cert.display_name(), band.as_str())),
            _ => None,
        })
        .collect();
    due.sort_by_key(|(days, _, _)| *days);

    if due.is_empty() {
        println!("No certificates expire within {within_days} days");
        return Ok(());
    }
    for (days, name, band) in due {
        println!("{days:>5}d  {band:<8}  {name}");
    }
    Ok(())
}

async fn renew(ctx: &Ctx, id: i64) -> Result<(), CliError> {
    ctx.require_manage(KIND).await?;
    ctx.api.renew_certificate(id, &ctx.scope()).await?;
    info!(id, "certificate renewal requested");
    println!("Renewal requested for certificate #{id}");
    Ok(())
}
