#![deny(clippy::all, clippy::pedantic)]

use proxyboard::domain::permissions::AccessPolicy;
use proxyboard_api_types::{ResourceKind, User};
use tracing::info;

use crate::args::LoginArgs;
use crate::client::{CliError, Ctx};
use crate::io::read_secret;

pub async fn login(ctx: &Ctx, args: LoginArgs) -> Result<(), CliError> {
    let secret = read_secret(args.secret_file, args.secret_env)?;
    ctx.api.login(&args.identity, &secret, &ctx.scope()).await?;
    info!(identity = %args.identity, "signed in");
    let user = ctx.api.me(&ctx.scope()).await?;
    println!("Signed in as {}", user.email);
    Ok(())
}

pub fn logout(ctx: &Ctx) -> Result<(), CliError> {
    ctx.api.logout()?;
    println!("Signed out");
    Ok(())
}

pub fn describe_user(user: &User) -> String {
    let policy = AccessPolicy::for_user(Some(user));
    let mut lines = vec![
        format!("{} <{}>", user.name, user.email),
        format!(
            "roles: {}",
            if user.roles.is_empty() {
                "-".to_string()
            } else {
                user.roles.join(", ")
            }
        ),
        format!("visibility: {}", policy.visibility()),
    ];
    for kind in ResourceKind::CORE {
        lines.push(format!("{:<18} {}", kind.display_name(), policy.level(kind)));
    }
    lines.join("\n")
}

pub async fn whoami(ctx: &Ctx) -> Result<(), CliError> {
    let user = ctx.api.me(&ctx.scope()).await?;
    println!("{}", describe_user(&user));
    Ok(())
}
