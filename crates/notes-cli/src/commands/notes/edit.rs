use notes_core::{Editor, TextEditor};

use crate::app::AppContext;
use crate::cli::EditArgs;
use crate::helpers::{read_note_content, resolve_note_id};

pub async fn handle_edit(ctx: &AppContext<'_>, args: &EditArgs) -> anyhow::Result<()> {
    let (mut session, _local) = ctx.open_session().await?;

    let id = resolve_note_id(session.notes(), &args.id)?;
    let content = read_note_content(args.text.clone(), args.file.as_deref())?;

    let mut editor = TextEditor::new();
    editor.load(&content);

    let notes = session.notes_mut();
    notes.set_active(id)?;
    let title = notes.apply(editor.update())?.title.clone();

    ctx.finish(session).await?;

    if !ctx.quiet() {
        println!("Updated note {} ({})", id, title);
    }
    Ok(())
}
