use notes_core::{FederatedIdentity, LoginAction, Session};

use crate::app::AppContext;
use crate::cli::LoginArgs;
use crate::helpers::{prompt_password, prompt_username};

pub async fn handle_login(ctx: &AppContext<'_>, args: &LoginArgs) -> anyhow::Result<()> {
    let local = ctx.open_local()?;

    let action = match (&args.federated, &args.subject) {
        (Some(email), Some(subject)) => LoginAction::Federated(FederatedIdentity {
            email: email.clone(),
            subject: subject.clone(),
        }),
        _ => {
            let username = match ctx.user_flag() {
                Some(user) => user.to_string(),
                None => prompt_username(ctx.interactive())?,
            };
            let password = prompt_password(ctx.interactive())?;
            LoginAction::password(username, password)
        }
    };

    let session = ctx.login(&action, &local).await?;
    let username = session.user().username().to_string();
    let count = session.notes().len();
    session.close().await?;

    if !ctx.quiet() {
        println!("Logged in as {} ({} notes)", username, count);
    }
    Ok(())
}

pub async fn handle_logout(ctx: &AppContext<'_>) -> anyhow::Result<()> {
    let local = ctx.open_local()?;
    // Nothing is pending between invocations, so there is no session to close
    let forgotten = Session::forget_last_user(&local)?;
    if !ctx.quiet() {
        match forgotten {
            Some(username) => println!("Logged out {}", username),
            None => println!("Not logged in"),
        }
    }
    Ok(())
}
