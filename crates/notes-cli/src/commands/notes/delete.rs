use dialoguer::Confirm;

use crate::app::AppContext;
use crate::cli::DeleteArgs;
use crate::errors::CliError;
use crate::helpers::resolve_note_id;

pub async fn handle_delete(ctx: &AppContext<'_>, args: &DeleteArgs) -> anyhow::Result<()> {
    let (mut session, _local) = ctx.open_session().await?;

    let id = resolve_note_id(session.notes(), &args.id)?;
    let title = session
        .notes()
        .get(&id)
        .map(|note| note.title.clone())
        .unwrap_or_default();

    if !args.force {
        if !ctx.interactive() {
            return Err(CliError::invalid_input(
                "Refusing to delete without confirmation. Use --force.",
            )
            .into());
        }
        let confirmed = Confirm::new()
            .with_prompt(format!("Delete note '{}'?", title))
            .default(false)
            .interact()?;

        if !confirmed {
            if !ctx.quiet() {
                println!("Cancelled");
            }
            session.close().await?;
            return Ok(());
        }
    }

    session
        .notes_mut()
        .delete_note(id)?
        .wait()
        .await
        .map_err(|e| CliError::sync_failed(format!("Failed to delete note {}: {}", id, e)))?;
    ctx.finish(session).await?;

    if !ctx.quiet() {
        println!("Deleted note {} ({})", id, title);
    }
    Ok(())
}
