use crate::app::AppContext;
use crate::cli::ShowArgs;
use crate::errors::CliError;
use crate::helpers::resolve_note_id;
use crate::output::{note_json, print_note};

pub async fn handle_show(ctx: &AppContext<'_>, args: &ShowArgs) -> anyhow::Result<()> {
    let (session, _local) = ctx.open_session().await?;

    let id = resolve_note_id(session.notes(), &args.id)?;
    let note = session
        .notes()
        .get(&id)
        .ok_or_else(|| CliError::not_found("Note not found", "Hint: Run `notes list`."))?;

    if args.json {
        let output = serde_json::to_string_pretty(&note_json(note))?;
        println!("{}", output);
    } else {
        print_note(note, ctx.quiet());
    }

    session.close().await?;
    Ok(())
}
